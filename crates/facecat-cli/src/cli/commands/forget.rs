//! `facecat forget` – drop a file from the catalogue.

use anyhow::Result;
use facecat_core::catalog::Catalog;
use std::path::Path;

pub async fn run_forget(catalog: &Catalog, path: &str) -> Result<()> {
    // Catalogue keys are absolute; accept a relative path too.
    let key = Path::new(path)
        .canonicalize()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string());
    if catalog.remove_file(&key).await? {
        println!("Forgot {}.", key);
    } else {
        println!("{} is not catalogued.", key);
    }
    Ok(())
}
