pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod filters;
pub mod handlers;
pub mod paths;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
