//! HTTP handlers for the course screens.

pub mod courses;
pub mod settings;

use askama::Template;
use axum::{
  response::{Html, Redirect},
  routing::{get, post},
  Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::error::CourseError;
use crate::state::AppState;

pub use courses::{close_course, courses_page, delete_course, view_course, viewer_page};
pub use settings::{install_status, settings_page, start_download};

/// All UI routes, ready to serve.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(index))
    .route("/courses", get(courses_page))
    .route("/courses/view", post(view_course))
    .route("/courses/viewer", get(viewer_page))
    .route("/courses/close", post(close_course))
    .route("/courses/delete", post(delete_course))
    .route("/settings", get(settings_page))
    .route("/settings/download", post(start_download))
    .route("/settings/status", get(install_status))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// The course list is the first tab
pub async fn index() -> Redirect {
  Redirect::to("/courses")
}

/// `?error=...` carried across a redirect
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
  pub error: Option<String>,
}

/// Redirect to `to` with the error's user message in the query string
pub(crate) fn error_redirect(to: &str, error: &CourseError) -> Redirect {
  let encoded = urlencoding::encode(&error.user_message()).into_owned();
  Redirect::to(&format!("{}?error={}", to, encoded))
}

pub(crate) fn render<T: Template>(template: &T) -> Html<String> {
  match template.render() {
    Ok(html) => Html(html),
    Err(e) => {
      tracing::error!("Template render failed: {}", e);
      Html(String::new())
    }
  }
}
