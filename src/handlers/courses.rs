//! My Courses tab: list, open, close and delete downloaded courses.

use askama::Template;
use axum::{
  extract::{Query, State},
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;

use super::{error_redirect, render, NoticeQuery};
use crate::catalog::CourseRecord;
use crate::error::CourseError;
use crate::filters;
use crate::state::AppState;

/// A catalog entry as shown in the list
pub struct CourseRow {
  pub name: String,
  pub path: String,
  pub date_added: DateTime<Utc>,
}

impl From<CourseRecord> for CourseRow {
  fn from(course: CourseRecord) -> Self {
    Self {
      name: course.name,
      path: course.path.display().to_string(),
      date_added: course.date_added,
    }
  }
}

#[derive(Template)]
#[template(path = "courses.html")]
pub struct CoursesTemplate {
  pub tab: &'static str,
  pub courses: Vec<CourseRow>,
  /// Catalog could not be read
  pub load_error: Option<String>,
  /// From a failed action, via redirect
  pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "viewer.html")]
pub struct ViewerTemplate {
  pub tab: &'static str,
  pub name: String,
  pub entry_url: String,
}

/// Form carrying a course's catalog key
#[derive(Debug, Deserialize)]
pub struct CoursePathForm {
  #[serde(default)]
  pub path: String,
}

impl CoursePathForm {
  fn course_path(&self) -> Result<PathBuf, CourseError> {
    let path = self.path.trim();
    if path.is_empty() {
      return Err(CourseError::MissingCoursePath);
    }
    Ok(PathBuf::from(path))
  }
}

pub async fn courses_page(State(state): State<AppState>, Query(notice): Query<NoticeQuery>) -> Html<String> {
  let (courses, load_error) = match state.catalog.load() {
    Ok(courses) => (courses.into_iter().map(CourseRow::from).collect(), None),
    Err(e) => {
      tracing::warn!("Failed to load courses: {}", e);
      (Vec::new(), Some("Failed to load courses".to_string()))
    }
  };

  render(&CoursesTemplate {
    tab: "courses",
    courses,
    load_error,
    error: notice.error,
  })
}

pub async fn view_course(State(state): State<AppState>, Form(form): Form<CoursePathForm>) -> Redirect {
  match open_course(&state, &form).await {
    Ok(origin) => {
      tracing::debug!("Viewer origin {}", origin);
      Redirect::to("/courses/viewer")
    }
    Err(e) => {
      tracing::warn!("Failed to open course {}: {}", form.path, e);
      error_redirect("/courses", &e)
    }
  }
}

async fn open_course(state: &AppState, form: &CoursePathForm) -> Result<String, CourseError> {
  let path = form.course_path()?;
  let course = state.catalog.find(&path)?;
  state.host.start(&course).await
}

pub async fn viewer_page(State(state): State<AppState>) -> Response {
  let Some(site) = state.host.active().await else {
    return Redirect::to("/courses").into_response();
  };

  render(&ViewerTemplate {
    tab: "courses",
    entry_url: site.entry_url(),
    name: site.course.name,
  })
  .into_response()
}

pub async fn close_course(State(state): State<AppState>) -> Redirect {
  state.host.stop().await;
  Redirect::to("/courses")
}

pub async fn delete_course(State(state): State<AppState>, Form(form): Form<CoursePathForm>) -> Redirect {
  let path = match form.course_path() {
    Ok(path) => path,
    Err(e) => return error_redirect("/courses", &e),
  };

  // Never delete files out from under a running server
  if let Some(site) = state.host.active().await
    && site.course.path == path
  {
    state.host.stop().await;
  }

  match state.catalog.delete_course(&path) {
    Ok(_) => {
      tracing::info!("Deleted course at {}", path.display());
      Redirect::to("/courses")
    }
    Err(e) => {
      tracing::warn!("Failed to delete course {}: {}", path.display(), e);
      error_redirect("/courses", &e)
    }
  }
}
