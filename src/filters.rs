//! Askama template filters

use std::borrow::Borrow;

use chrono::{DateTime, Utc};

/// Calendar date of a timestamp, `YYYY-MM-DD`.
///
/// Usage in templates:
/// ```html
/// <span>{{ course.date_added|short_date }}</span>
/// ```
#[askama::filter_fn]
pub fn short_date(value: impl Borrow<DateTime<Utc>>, _: &dyn askama::Values) -> askama::Result<String> {
  Ok(value.borrow().format("%Y-%m-%d").to_string())
}
