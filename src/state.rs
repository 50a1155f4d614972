//! Application state shared by all handlers.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::download::Downloader;
use crate::services::course_host::CourseHost;
use crate::services::installer::Installer;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
  /// Course index (`courses.json`)
  pub catalog: Arc<Catalog>,

  /// Download → extract → catalog pipeline
  pub installer: Arc<Installer>,

  /// Local server for the course being viewed
  pub host: Arc<CourseHost>,
}

impl AppState {
  pub fn new(config: &AppConfig) -> Self {
    let courses_dir = config.courses_dir();
    let catalog = Arc::new(Catalog::in_dir(&courses_dir));
    let installer = Installer::new(
      Downloader::new(&config.download),
      Arc::clone(&catalog),
      courses_dir,
    );

    Self {
      catalog,
      installer: Arc::new(installer),
      host: Arc::new(CourseHost::new(&config.viewer)),
    }
  }
}
