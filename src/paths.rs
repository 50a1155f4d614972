//! Project path functions - single source of truth for all file paths.
//!
//! Everything the app writes lives under one data directory:
//!
//! ```text
//! {DATA_DIR}/Courses/
//! ├── courses.json          # catalog
//! ├── course_{stamp}.zip    # archive, only while a download is in flight
//! └── course_{stamp}/       # extracted course content
//! ```
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! This allows running isolated instances side by side:
//! ```bash
//! DATA_DIR=data/test PORT=3001 VIEWER_PORT=8081 cargo run
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Base data directory when neither config nor `DATA_DIR` name one
pub const DEFAULT_DATA_DIR: &str = "data";

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
    DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()))
}

/// Directory holding the catalog, archives and extracted courses
pub fn courses_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("Courses")
}

/// Catalog file inside a courses directory
pub fn catalog_path(courses_dir: &Path) -> PathBuf {
    courses_dir.join("courses.json")
}

/// Temporary archive location for a download started at `stamp` (unix millis)
pub fn archive_path(courses_dir: &Path, stamp: i64) -> PathBuf {
    courses_dir.join(format!("course_{stamp}.zip"))
}

/// Extraction target for an archive downloaded at `stamp`
pub fn course_dir(courses_dir: &Path, stamp: i64) -> PathBuf {
    courses_dir.join(format!("course_{stamp}"))
}

/// Create the courses directory if it does not exist yet and return it.
pub fn ensure_courses_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    let dir = courses_dir(data_dir);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

// ==================== Tests ====================
