//! Error type shared by the catalog, the install pipeline and the course host.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between a pasted URL and a rendered course.
#[derive(Debug, Error)]
pub enum CourseError {
    #[error("no URL was provided")]
    MissingUrl,

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("network error downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timeout downloading {url}")]
    Timeout { url: String },

    /// Anything other than 200 OK from the course URL.
    #[error("download failed with status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid course archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("parse error in catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    CatalogWrite(#[source] serde_json::Error),

    #[error("course not found in catalog: {0}")]
    CourseNotFound(PathBuf),

    #[error("course path is missing")]
    MissingCoursePath,

    #[error("course files not found at {0}")]
    CourseFilesMissing(PathBuf),

    #[error("no index.html entry point under {0}")]
    MissingEntryPoint(PathBuf),

    #[error("a course download is already in progress")]
    InstallInProgress,

    #[error("failed to start server: {source}")]
    Server {
        #[source]
        source: std::io::Error,
    },
}

impl CourseError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Message for the alert banner. Leaves out filesystem paths.
    pub fn user_message(&self) -> String {
        match self {
            CourseError::MissingUrl => "Please enter a URL".to_string(),
            CourseError::InvalidUrl { url } => format!("Invalid URL: {}", url),
            CourseError::Network { source, .. } => format!("Network error: {}", source),
            CourseError::Timeout { .. } => "The download timed out".to_string(),
            CourseError::HttpStatus { status, .. } => {
                format!("Download failed with status {}", status)
            }
            CourseError::Io { source, .. } => format!("File error: {}", source),
            CourseError::Archive(e) => format!("Failed to unzip file: {}", e),
            CourseError::CatalogParse { .. } => "Failed to load courses".to_string(),
            CourseError::CatalogWrite(_) => "Failed to save course".to_string(),
            CourseError::CourseNotFound(_) => "Course is not in the catalog".to_string(),
            CourseError::MissingCoursePath => "Course path is missing".to_string(),
            CourseError::CourseFilesMissing(_) => "Course files not found".to_string(),
            CourseError::MissingEntryPoint(_) => "Course has no index.html".to_string(),
            CourseError::InstallInProgress => "A download is already in progress".to_string(),
            CourseError::Server { source } => format!("Failed to start server: {}", source),
        }
    }
}

/// Log-and-continue for errors that must not abort the caller.
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}
