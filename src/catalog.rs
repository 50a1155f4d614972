//! Course catalog - the JSON index of downloaded courses.
//!
//! The catalog is one file (`courses.json`) holding a flat array of
//! [`CourseRecord`]s. `path` is the key: saving a record whose path is
//! already present replaces the old entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::CourseError;
use crate::paths;

/// One downloaded course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    /// Display name, derived from the download URL
    pub name: String,
    /// Absolute location of the extracted content (unique key)
    pub path: PathBuf,
    pub date_added: DateTime<Utc>,
    /// Where the archive came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Hex SHA-256 of the downloaded archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_sha256: Option<String>,
}

impl CourseRecord {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            date_added: Utc::now(),
            source_url: None,
            archive_sha256: None,
        }
    }
}

/// Handle on the catalog file.
///
/// Reads go straight to disk. Writes are serialized within the process and
/// replace the file atomically (temp file + rename).
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Catalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Catalog stored in the standard location inside `courses_dir`.
    pub fn in_dir(courses_dir: &Path) -> Self {
        Self::new(paths::catalog_path(courses_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record. A missing catalog file is an empty catalog.
    pub fn load(&self) -> Result<Vec<CourseRecord>, CourseError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CourseError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| CourseError::CatalogParse {
            path: self.path.clone(),
            source,
        })
    }

    /// Look up a record by its path.
    pub fn find(&self, course_path: &Path) -> Result<CourseRecord, CourseError> {
        self.load()?
            .into_iter()
            .find(|c| c.path == course_path)
            .ok_or_else(|| CourseError::CourseNotFound(course_path.to_path_buf()))
    }

    /// Insert or replace `course` (keyed by path) and return the new list.
    pub fn save_course(&self, course: CourseRecord) -> Result<Vec<CourseRecord>, CourseError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut courses = self.load()?;
        courses.retain(|c| c.path != course.path);
        tracing::debug!("Saving course '{}' at {}", course.name, course.path.display());
        courses.push(course);

        self.write_all(&courses)?;
        Ok(courses)
    }

    /// Delete the course directory and its catalog entry, returning the new list.
    ///
    /// `course_path` must be the key of a catalog record, otherwise nothing
    /// is touched and `CourseNotFound` is returned. The directory is only
    /// removed from disk when it lives inside the catalog's own directory.
    /// Entries pointing elsewhere are just dropped.
    pub fn delete_course(&self, course_path: &Path) -> Result<Vec<CourseRecord>, CourseError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut courses = self.load()?;
        let Some(index) = courses.iter().position(|c| c.path == course_path) else {
            return Err(CourseError::CourseNotFound(course_path.to_path_buf()));
        };

        if course_path.is_dir() {
            if self.owns(course_path) {
                fs::remove_dir_all(course_path).map_err(|e| CourseError::io(course_path, e))?;
                tracing::info!("Removed course files at {}", course_path.display());
            } else {
                tracing::warn!(
                    "Not removing {}: outside of {}",
                    course_path.display(),
                    self.path.display()
                );
            }
        } else if course_path.exists() {
            tracing::warn!("Not removing {}: not a course directory", course_path.display());
        }

        courses.remove(index);
        self.write_all(&courses)?;
        Ok(courses)
    }

    /// Whether `course_path` is strictly inside the catalog's directory.
    fn owns(&self, course_path: &Path) -> bool {
        let Some(root) = self.path.parent() else {
            return false;
        };
        match (root.canonicalize(), course_path.canonicalize()) {
            (Ok(root), Ok(target)) => target != root && target.starts_with(&root),
            _ => false,
        }
    }

    fn write_all(&self, courses: &[CourseRecord]) -> Result<(), CourseError> {
        let json = serde_json::to_string_pretty(courses).map_err(CourseError::CatalogWrite)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CourseError::io(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| CourseError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| CourseError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog_in(temp: &TempDir) -> Catalog {
        Catalog::in_dir(temp.path())
    }

    fn make_course_dir(temp: &TempDir, name: &str) -> PathBuf {
        let dir = temp.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.html"), "<h1>hi</h1>").unwrap();
        dir
    }

    #[test]
    fn test_load_missing_catalog_is_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        assert!(!catalog.path().exists());
        assert!(catalog.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_empty_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        fs::write(catalog.path(), "").unwrap();
        assert!(catalog.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_catalog_errors() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        fs::write(catalog.path(), "{not json").unwrap();

        let err = catalog.load().unwrap_err();
        assert!(matches!(err, CourseError::CatalogParse { .. }));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);

        let course = CourseRecord::new("intro.zip", temp.path().join("course_1"));
        let saved = catalog.save_course(course.clone()).unwrap();
        assert_eq!(saved, vec![course.clone()]);

        let loaded = catalog.load().unwrap();
        assert_eq!(loaded, vec![course]);
    }

    #[test]
    fn test_save_duplicate_path_replaces() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        let path = temp.path().join("course_1");

        catalog.save_course(CourseRecord::new("first", &path)).unwrap();
        catalog
            .save_course(CourseRecord::new("other", temp.path().join("course_2")))
            .unwrap();
        let courses = catalog.save_course(CourseRecord::new("second", &path)).unwrap();

        assert_eq!(courses.len(), 2);
        let matching: Vec<_> = courses.iter().filter(|c| c.path == path).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].name, "second");
        // Replaced entry moves to the end
        assert_eq!(courses.last().unwrap().name, "second");
    }

    #[test]
    fn test_delete_removes_entry_and_directory() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        let keep = make_course_dir(&temp, "course_1");
        let gone = make_course_dir(&temp, "course_2");

        catalog.save_course(CourseRecord::new("keep", &keep)).unwrap();
        catalog.save_course(CourseRecord::new("gone", &gone)).unwrap();

        let courses = catalog.delete_course(&gone).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].path, keep);
        assert!(!gone.exists());
        assert!(keep.exists());
        assert_eq!(catalog.load().unwrap(), courses);
    }

    #[test]
    fn test_delete_missing_directory_still_drops_entry() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        let path = temp.path().join("course_never_extracted");

        catalog.save_course(CourseRecord::new("ghost", &path)).unwrap();
        let courses = catalog.delete_course(&path).unwrap();
        assert!(courses.is_empty());
    }

    #[test]
    fn test_delete_leaves_foreign_directory_alone() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        fs::write(outside.path().join("index.html"), "x").unwrap();

        catalog.save_course(CourseRecord::new("foreign", outside.path())).unwrap();
        let courses = catalog.delete_course(outside.path()).unwrap();

        assert!(courses.is_empty());
        assert!(outside.path().join("index.html").exists());
    }

    #[test]
    fn test_find_missing_entry() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        let err = catalog.find(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, CourseError::CourseNotFound(_)));
    }

    #[test]
    fn test_reads_catalog_without_optional_fields() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        fs::write(
            catalog.path(),
            r#"[{"name":"course.zip","path":"/data/Courses/course_1700000000000","dateAdded":"2024-11-14T22:13:20.000Z"}]"#,
        )
        .unwrap();

        let courses = catalog.load().unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].name, "course.zip");
        assert!(courses[0].source_url.is_none());
        assert!(courses[0].archive_sha256.is_none());
    }

    #[test]
    fn test_writes_camel_case_fields() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        let mut course = CourseRecord::new("c", temp.path().join("course_1"));
        course.source_url = Some("http://example.com/c.zip".into());
        catalog.save_course(course).unwrap();

        let raw = fs::read_to_string(catalog.path()).unwrap();
        assert!(raw.contains("\"dateAdded\""));
        assert!(raw.contains("\"sourceUrl\""));
        assert!(!raw.contains("archiveSha256"));
        assert!(!temp.path().join("courses.json.tmp").exists());
    }

    #[test]
    fn test_delete_unknown_path_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        let dir = make_course_dir(&temp, "course_1");
        fs::create_dir_all(dir.join("css")).unwrap();
        fs::write(dir.join("css/site.css"), "body{}").unwrap();
        catalog.save_course(CourseRecord::new("intro", &dir)).unwrap();

        // A subdirectory of a course is not a course
        let err = catalog.delete_course(&dir.join("css")).unwrap_err();
        assert!(matches!(err, CourseError::CourseNotFound(_)));
        assert!(dir.join("css/site.css").is_file());

        // Neither is the catalog file itself
        let catalog_file = catalog.path().to_path_buf();
        let err = catalog.delete_course(&catalog_file).unwrap_err();
        assert!(matches!(err, CourseError::CourseNotFound(_)));
        assert!(catalog_file.is_file());

        assert_eq!(catalog.load().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_record_pointing_at_file_keeps_file() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog_in(&temp);
        let stray = temp.path().join("notes.txt");
        fs::write(&stray, "keep me").unwrap();
        catalog.save_course(CourseRecord::new("odd", &stray)).unwrap();

        let courses = catalog.delete_course(&stray).unwrap();
        assert!(courses.is_empty());
        assert!(stray.is_file());
    }
}
