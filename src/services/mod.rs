//! Long-lived services owned by the application state.

pub mod course_host;
pub mod installer;
