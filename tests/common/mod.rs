//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::time::Duration;

use course_shelf::config::{self, AppConfig};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Zip archive bytes. Names ending in `/` become directory entries.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.trim_end_matches('/'), options)
                .expect("add directory");
        } else {
            zip.start_file(*name, options).expect("start file");
            zip.write_all(content.as_bytes()).expect("write entry");
        }
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Config rooted in `temp` with an OS-assigned viewer port.
pub fn test_config(temp: &TempDir) -> AppConfig {
    let mut config = config::from_sources(None, |_| None);
    config.data_dir = temp.path().to_path_buf();
    config.viewer.port = 0;
    config.viewer.shutdown_timeout = Duration::from_secs(2);
    config.download.timeout = Duration::from_secs(10);
    config
}
