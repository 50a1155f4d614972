//! Test utilities for course fixtures.
//!
//! Provides a scratch courses directory with its catalog, plus a zip
//! builder for archive fixtures.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use crate::catalog::{Catalog, CourseRecord};

/// Test environment with an empty courses directory and catalog.
///
/// Everything lives in one temporary directory, removed when dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for file persistence)
    pub temp: TempDir,
    /// `{temp}/Courses`
    pub courses_dir: PathBuf,
    pub catalog: Arc<Catalog>,
}

impl TestEnv {
    pub fn new() -> std::io::Result<Self> {
        let temp = TempDir::new()?;
        let courses_dir = crate::paths::ensure_courses_dir(temp.path())?;
        let catalog = Arc::new(Catalog::in_dir(&courses_dir));
        Ok(Self {
            temp,
            courses_dir,
            catalog,
        })
    }

    /// Create `{courses_dir}/{dir_name}/index.html` and register it in the catalog.
    pub fn add_course(&self, name: &str, dir_name: &str) -> CourseRecord {
        let dir = self.courses_dir.join(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(crate::extract::ENTRY_POINT), format!("<h1>{}</h1>", name)).unwrap();
        let course = CourseRecord::new(name, dir);
        self.catalog.save_course(course.clone()).unwrap();
        course
    }
}

/// Write a zip at `path`. Names ending in `/` become directory entries.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.trim_end_matches('/'), options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
    }
    zip.finish().unwrap();
}
