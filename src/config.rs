//! Application configuration.
//!
//! Values are resolved with priority: `config.toml` > environment (`.env`
//! is loaded first) > built-in default.
//!
//! ```toml
//! [server]
//! addr = "127.0.0.1"
//! port = 3000
//!
//! [courses]
//! data_dir = "data"
//!
//! [viewer]
//! port = 8080
//! shutdown_timeout_secs = 5
//!
//! [download]
//! connect_timeout_secs = 30
//! timeout_secs = 600
//! ```

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::paths;

// ==================== Defaults ====================

/// UI server address. Localhost only unless configured otherwise.
pub const SERVER_ADDR: &str = "127.0.0.1";

/// UI server port
pub const SERVER_PORT: u16 = 3000;

/// Course server port (the origin shown in the viewer frame)
pub const VIEWER_PORT: u16 = 8080;

/// How long to wait for the previous course server to shut down
pub const VIEWER_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

pub const DOWNLOAD_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Whole-request timeout; course archives can be large
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "config.toml";

// ==================== File format ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<ServerSection>,
    courses: Option<CoursesSection>,
    viewer: Option<ViewerSection>,
    download: Option<DownloadSection>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    addr: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct CoursesSection {
    data_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewerSection {
    port: Option<u16>,
    shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DownloadSection {
    connect_timeout_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

// ==================== Resolved config ====================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_addr: String,
    pub server_port: u16,
    /// Base data directory; courses live in `{data_dir}/Courses`
    pub data_dir: PathBuf,
    pub viewer: ViewerConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// 0 lets the OS pick a free port
    pub port: u16,
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            port: VIEWER_PORT,
            shutdown_timeout: Duration::from_secs(VIEWER_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DOWNLOAD_CONNECT_TIMEOUT_SECS),
            timeout: Duration::from_secs(DOWNLOAD_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Full address for the UI listener
    pub fn server_bind_addr(&self) -> String {
        format!("{}:{}", self.server_addr, self.server_port)
    }

    /// Directory holding the catalog and extracted courses
    pub fn courses_dir(&self) -> PathBuf {
        paths::courses_dir(&self.data_dir)
    }
}

/// Load configuration from config.toml, the environment and defaults.
pub fn load() -> AppConfig {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = match std::fs::read_to_string(CONFIG_FILE) {
        Ok(contents) => {
            tracing::info!("Using configuration from {}", CONFIG_FILE);
            Some(contents)
        }
        Err(_) => None,
    };

    from_sources(file.as_deref(), |key| std::env::var(key).ok())
}

/// Resolve configuration from optional TOML contents and an env lookup.
pub fn from_sources(toml_contents: Option<&str>, env: impl Fn(&str) -> Option<String>) -> AppConfig {
    let file = toml_contents
        .and_then(|contents| match toml::from_str::<FileConfig>(contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring invalid {}: {}", CONFIG_FILE, e);
                None
            }
        })
        .unwrap_or_default();

    let env_u16 = |key: &str| env(key).and_then(|v| v.trim().parse::<u16>().ok());

    let server_addr = file
        .server
        .as_ref()
        .and_then(|s| s.addr.clone())
        .or_else(|| env("SERVER_ADDR"))
        .unwrap_or_else(|| SERVER_ADDR.to_string());

    let server_port = file
        .server
        .as_ref()
        .and_then(|s| s.port)
        .or_else(|| env_u16("PORT"))
        .unwrap_or(SERVER_PORT);

    let data_dir = file
        .courses
        .as_ref()
        .and_then(|c| c.data_dir.clone())
        .or_else(|| env("DATA_DIR"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(paths::DEFAULT_DATA_DIR));

    let viewer_defaults = ViewerConfig::default();
    let viewer = ViewerConfig {
        port: file
            .viewer
            .as_ref()
            .and_then(|v| v.port)
            .or_else(|| env_u16("VIEWER_PORT"))
            .unwrap_or(viewer_defaults.port),
        shutdown_timeout: file
            .viewer
            .as_ref()
            .and_then(|v| v.shutdown_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(viewer_defaults.shutdown_timeout),
    };

    let download_defaults = DownloadConfig::default();
    let download = DownloadConfig {
        connect_timeout: file
            .download
            .as_ref()
            .and_then(|d| d.connect_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(download_defaults.connect_timeout),
        timeout: file
            .download
            .as_ref()
            .and_then(|d| d.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(download_defaults.timeout),
    };

    AppConfig {
        server_addr,
        server_port,
        data_dir,
        viewer,
        download,
    }
}
