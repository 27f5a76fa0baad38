//! Local picture catalogue (SQLite via sqlx).
//!
//! Records which files have been scanned, against which group, and how many
//! faces were found, so a folder scan can skip files it already handled.

mod db;
mod files;
mod types;

pub use db::Catalog;
pub use types::{FileRecord, FileState};
