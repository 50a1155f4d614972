//! Local static server for the course being viewed.
//!
//! At most one course is served at a time. The host is owned by the
//! application state; start and stop run under a single async lock, and the
//! previous server is always fully shut down (listener dropped) before the
//! next one binds the port.

use axum::Router;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::catalog::CourseRecord;
use crate::config::ViewerConfig;
use crate::error::CourseError;
use crate::extract::{self, ENTRY_POINT};

/// Course servers only ever listen on loopback
pub const VIEWER_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Snapshot of what is currently being served.
#[derive(Debug, Clone)]
pub struct ActiveSite {
    pub course: CourseRecord,
    /// `http://127.0.0.1:{port}`
    pub origin: String,
    pub root: PathBuf,
}

impl ActiveSite {
    /// URL the viewer frame should load
    pub fn entry_url(&self) -> String {
        entry_url(&self.origin)
    }
}

/// `<origin>/index.html`
pub fn entry_url(origin: &str) -> String {
    format!("{}/{}", origin.trim_end_matches('/'), ENTRY_POINT)
}

struct RunningSite {
    site: ActiveSite,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

pub struct CourseHost {
    port: u16,
    shutdown_timeout: Duration,
    active: Mutex<Option<RunningSite>>,
}

impl CourseHost {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            port: config.port,
            shutdown_timeout: config.shutdown_timeout,
            active: Mutex::new(None),
        }
    }

    /// Serve `course`, replacing whatever was served before. Returns the origin.
    pub async fn start(&self, course: &CourseRecord) -> Result<String, CourseError> {
        if course.path.as_os_str().is_empty() {
            return Err(CourseError::MissingCoursePath);
        }
        if !course.path.exists() {
            return Err(CourseError::CourseFilesMissing(course.path.clone()));
        }
        let root = extract::resolve_site_root(&course.path)?;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            self.shutdown(previous).await;
        }

        let listener = TcpListener::bind(SocketAddr::new(VIEWER_ADDR, self.port))
            .await
            .map_err(|source| CourseError::Server { source })?;
        let addr = listener.local_addr().map_err(|source| CourseError::Server { source })?;
        let origin = format!("http://{}", addr);

        let app = Router::new()
            .fallback_service(ServeDir::new(&root).append_index_html_on_directories(true))
            .layer(TraceLayer::new_for_http());

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // Fires on explicit stop and when the host is dropped
                    let _ = signal.await;
                })
                .await
        });

        tracing::info!("Serving '{}' from {} at {}", course.name, root.display(), origin);

        *active = Some(RunningSite {
            site: ActiveSite {
                course: course.clone(),
                origin: origin.clone(),
                root,
            },
            shutdown,
            task,
        });

        Ok(origin)
    }

    /// Stop the running server, if any. Errors are logged, never returned.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        if let Some(running) = active.take() {
            self.shutdown(running).await;
        }
    }

    /// What is being served right now
    pub async fn active(&self) -> Option<ActiveSite> {
        self.active.lock().await.as_ref().map(|r| r.site.clone())
    }

    async fn shutdown(&self, running: RunningSite) {
        let RunningSite {
            site,
            shutdown,
            mut task,
        } = running;

        let _ = shutdown.send(());
        match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
            Ok(Ok(Ok(()))) => tracing::info!("Stopped course server at {}", site.origin),
            Ok(Ok(Err(e))) => tracing::warn!("Course server at {} exited with error: {}", site.origin, e),
            Ok(Err(e)) => tracing::warn!("Course server task at {} failed: {}", site.origin, e),
            Err(_) => {
                tracing::warn!(
                    "Course server at {} did not stop within {:?}; aborting",
                    site.origin,
                    self.shutdown_timeout
                );
                task.abort();
                // Wait for the abort so the listener is released before a rebind
                let _ = task.await;
            }
        }
    }
}
