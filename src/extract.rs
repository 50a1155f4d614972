//! Course archive extraction and site layout.
//!
//! Archives are unpacked into `course_{stamp}` next to the catalog. A failed
//! extraction removes whatever it wrote, so the courses directory never holds
//! half a course.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::CourseError;
use crate::paths;

/// Entry point every course must ship
pub const ENTRY_POINT: &str = "index.html";

/// Top-level names that archivers add and courses never need
const IGNORED_TOP_LEVEL: &[&str] = &["__MACOSX"];

/// Extract `archive` into a fresh `course_{stamp}` directory under `courses_dir`.
///
/// Returns the directory that was created.
pub fn extract_course(archive: &Path, courses_dir: &Path, stamp: i64) -> Result<PathBuf, CourseError> {
    let output_dir = create_unique_dir(courses_dir, stamp)?;

    match extract_into(archive, &output_dir) {
        Ok(files) => {
            tracing::info!("Extracted {} files to {}", files, output_dir.display());
            Ok(output_dir)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_dir_all(&output_dir) {
                tracing::warn!(
                    "Failed to remove partial extraction {}: {}",
                    output_dir.display(),
                    cleanup
                );
            }
            Err(e)
        }
    }
}

/// Create `course_{stamp}`, or `course_{stamp}_2`, `_3`, ... if taken.
fn create_unique_dir(courses_dir: &Path, stamp: i64) -> Result<PathBuf, CourseError> {
    fs::create_dir_all(courses_dir).map_err(|e| CourseError::io(courses_dir, e))?;

    let mut candidate = paths::course_dir(courses_dir, stamp);
    let mut suffix = 2;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                candidate = courses_dir.join(format!("course_{stamp}_{suffix}"));
                suffix += 1;
            }
            Err(e) => return Err(CourseError::io(&candidate, e)),
        }
    }
}

/// Unpack every entry of `archive` below `dest`. Returns the number of files written.
pub fn extract_into(archive: &Path, dest: &Path) -> Result<usize, CourseError> {
    let file = File::open(archive).map_err(|e| CourseError::io(archive, e))?;
    let mut zip = ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping archive entry outside the course: {}", entry.name());
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| CourseError::io(&out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CourseError::io(parent, e))?;
        }

        tracing::debug!("Extracting {}", entry.name());
        let mut out = File::create(&out_path).map_err(|e| CourseError::io(&out_path, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| CourseError::io(&out_path, e))?;
        written += 1;
    }

    Ok(written)
}

/// Directory to serve for a course: the one holding `index.html`.
///
/// That is `course_dir` itself, or its single top-level folder when the
/// archive wrapped everything in one (`my-course/index.html`).
pub fn resolve_site_root(course_dir: &Path) -> Result<PathBuf, CourseError> {
    if course_dir.join(ENTRY_POINT).is_file() {
        return Ok(course_dir.to_path_buf());
    }

    let entries = fs::read_dir(course_dir).map_err(|e| CourseError::io(course_dir, e))?;
    let visible: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && !IGNORED_TOP_LEVEL.iter().any(|ignored| *ignored == name)
        })
        .map(|e| e.path())
        .collect();

    match visible.as_slice() {
        [only] if only.is_dir() && only.join(ENTRY_POINT).is_file() => Ok(only.clone()),
        _ => Err(CourseError::MissingEntryPoint(course_dir.to_path_buf())),
    }
}
