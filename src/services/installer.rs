//! Course install pipeline: download → extract → catalog.
//!
//! One pipeline runs at a time. The settings page starts it in the
//! background with [`Installer::start`] and polls [`Installer::status`];
//! tests and other callers can run it inline with [`Installer::install`].

use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use crate::catalog::{Catalog, CourseRecord};
use crate::download::{course_name_from_url, Downloader};
use crate::error::{CourseError, LogOnError};
use crate::extract;
use crate::paths;

/// Where the current (or last) install stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstallStatus {
    Idle,
    Downloading { percent: Option<u8>, bytes: u64 },
    Extracting,
    Saving,
    Finished { name: String },
    Failed { message: String },
}

impl InstallStatus {
    /// Whether a pipeline is still running
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            InstallStatus::Downloading { .. } | InstallStatus::Extracting | InstallStatus::Saving
        )
    }

    /// Status line for the settings page
    pub fn describe(&self) -> String {
        match self {
            InstallStatus::Idle => String::new(),
            InstallStatus::Downloading {
                percent: Some(pct), ..
            } => format!("Downloading: {}%", pct),
            InstallStatus::Downloading { bytes, .. } => {
                format!("Downloading: {} KB", bytes / 1024)
            }
            InstallStatus::Extracting => "Extracting files...".to_string(),
            InstallStatus::Saving => "Saving course...".to_string(),
            InstallStatus::Finished { name } => format!("Course \"{}\" downloaded successfully", name),
            InstallStatus::Failed { message } => message.clone(),
        }
    }
}

pub struct Installer {
    downloader: Downloader,
    catalog: Arc<Catalog>,
    courses_dir: PathBuf,
    status: RwLock<InstallStatus>,
    running: Arc<Mutex<()>>,
}

impl Installer {
    pub fn new(downloader: Downloader, catalog: Arc<Catalog>, courses_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloader,
            catalog,
            courses_dir: courses_dir.into(),
            status: RwLock::new(InstallStatus::Idle),
            running: Arc::new(Mutex::new(())),
        }
    }

    pub fn courses_dir(&self) -> &Path {
        &self.courses_dir
    }

    pub fn status(&self) -> InstallStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_status(&self, status: InstallStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Run the whole pipeline and return the saved record.
    pub async fn install(&self, url: &str) -> Result<CourseRecord, CourseError> {
        let url = validate_url(url)?;
        let _running = self
            .running
            .try_lock()
            .map_err(|_| CourseError::InstallInProgress)?;
        self.run(&url).await
    }

    /// Validate `url` and run the pipeline on a background task.
    pub fn start(self: &Arc<Self>, url: &str) -> Result<(), CourseError> {
        let url = validate_url(url)?;
        let running = Arc::clone(&self.running)
            .try_lock_owned()
            .map_err(|_| CourseError::InstallInProgress)?;

        self.set_status(InstallStatus::Downloading {
            percent: Some(0),
            bytes: 0,
        });

        let installer = Arc::clone(self);
        tokio::spawn(async move {
            let _running = running;
            // Outcome is published through status()
            let _ = installer.run(&url).await;
        });
        Ok(())
    }

    async fn run(&self, url: &str) -> Result<CourseRecord, CourseError> {
        tracing::info!("Installing course from {}", url);
        let result = self.run_steps(url).await;
        match &result {
            Ok(course) => {
                tracing::info!("Installed course '{}' at {}", course.name, course.path.display());
                self.set_status(InstallStatus::Finished {
                    name: course.name.clone(),
                });
            }
            Err(e) => {
                tracing::warn!("Course install from {} failed: {}", url, e);
                self.set_status(InstallStatus::Failed {
                    message: e.user_message(),
                });
            }
        }
        result
    }

    async fn run_steps(&self, url: &str) -> Result<CourseRecord, CourseError> {
        tokio::fs::create_dir_all(&self.courses_dir)
            .await
            .map_err(|e| CourseError::io(&self.courses_dir, e))?;

        let stamp = Utc::now().timestamp_millis();
        let archive = paths::archive_path(&self.courses_dir, stamp);

        self.set_status(InstallStatus::Downloading {
            percent: Some(0),
            bytes: 0,
        });
        let outcome = self
            .downloader
            .download_to_file(url, &archive, |progress| {
                self.set_status(InstallStatus::Downloading {
                    percent: progress.percent(),
                    bytes: progress.bytes_written,
                });
            })
            .await?;

        self.set_status(InstallStatus::Extracting);
        let extracted = {
            let archive = archive.clone();
            let courses_dir = self.courses_dir.clone();
            tokio::task::spawn_blocking(move || extract::extract_course(&archive, &courses_dir, stamp)).await
        };

        // The archive is only needed for extraction, successful or not
        tokio::fs::remove_file(&archive)
            .await
            .log_warn("Failed to remove downloaded archive");

        let course_dir = match extracted {
            Ok(result) => result?,
            Err(join_error) => return Err(CourseError::io(&archive, std::io::Error::other(join_error))),
        };
        let course_dir = course_dir.canonicalize().unwrap_or(course_dir);

        self.set_status(InstallStatus::Saving);
        let course = CourseRecord {
            name: course_name_from_url(url),
            path: course_dir.clone(),
            date_added: Utc::now(),
            source_url: Some(url.to_string()),
            archive_sha256: Some(outcome.sha256),
        };

        if let Err(e) = self.catalog.save_course(course.clone()) {
            std::fs::remove_dir_all(&course_dir).log_warn("Failed to remove unsaved course files");
            return Err(e);
        }

        Ok(course)
    }
}

/// Trimmed, non-empty, parseable URL.
fn validate_url(url: &str) -> Result<String, CourseError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CourseError::MissingUrl);
    }
    Url::parse(url).map_err(|_| CourseError::InvalidUrl {
        url: url.to_string(),
    })?;
    Ok(url.to_string())
}
