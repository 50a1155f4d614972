//! Settings tab: course download form and install progress.

use askama::Template;
use axum::{
  extract::{Query, State},
  response::{Html, Redirect},
  Form, Json,
};
use serde::Deserialize;

use super::{error_redirect, render, NoticeQuery};
use crate::services::installer::InstallStatus;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
  pub tab: &'static str,
  /// An install is running; the form is disabled and the page refreshes
  pub busy: bool,
  pub status_text: String,
  /// Download progress, when the size is known
  pub percent: Option<u8>,
  pub success: Option<String>,
  pub error: Option<String>,
  pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
  #[serde(default)]
  pub url: String,
}

pub async fn settings_page(State(state): State<AppState>, Query(notice): Query<NoticeQuery>) -> Html<String> {
  let status = state.installer.status();

  let percent = match &status {
    InstallStatus::Downloading { percent, .. } => *percent,
    InstallStatus::Extracting | InstallStatus::Saving => Some(100),
    _ => None,
  };

  let (success, failure) = match &status {
    InstallStatus::Finished { .. } => (Some(status.describe()), None),
    InstallStatus::Failed { .. } => (None, Some(status.describe())),
    _ => (None, None),
  };

  render(&SettingsTemplate {
    tab: "settings",
    busy: status.is_busy(),
    status_text: status.describe(),
    percent,
    success,
    // A rejected submit is more recent than the last pipeline outcome
    error: notice.error.or(failure),
    version: env!("CARGO_PKG_VERSION"),
  })
}

pub async fn start_download(State(state): State<AppState>, Form(form): Form<DownloadForm>) -> Redirect {
  match state.installer.start(&form.url) {
    Ok(()) => Redirect::to("/settings"),
    Err(e) => {
      tracing::warn!("Download not started: {}", e);
      error_redirect("/settings", &e)
    }
  }
}

pub async fn install_status(State(state): State<AppState>) -> Json<InstallStatus> {
  Json(state.installer.status())
}
