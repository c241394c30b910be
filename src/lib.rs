//! Lending Server
//!
//! Tracks loans of finite-copy works to students, faculty and librarians,
//! enforcing per-role borrow limits, copy availability and overdue blocking,
//! behind a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
