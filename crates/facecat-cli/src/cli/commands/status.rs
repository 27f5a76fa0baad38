//! `facecat status` – list catalogued files.

use anyhow::Result;
use facecat_core::catalog::Catalog;

pub async fn run_status(catalog: &Catalog) -> Result<()> {
    let files = catalog.list_files().await?;
    if files.is_empty() {
        println!("Catalogue is empty.");
        return Ok(());
    }
    println!("{:<14} {:<12} {:<6} {}", "STATE", "GROUP", "FACES", "PATH");
    for f in files {
        println!(
            "{:<14} {:<12} {:<6} {}",
            f.state.as_str(),
            f.group_id,
            f.face_count,
            f.path
        );
        if let Some(note) = f.note {
            println!("{:<14} {}", "", note);
        }
    }
    Ok(())
}
