//! Bibliotek Library Lending System
//!
//! A Rust REST API server for a library-lending backend: catalog of books,
//! user accounts, and the borrowing lifecycle that tracks inventory as
//! copies are lent and returned.

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
