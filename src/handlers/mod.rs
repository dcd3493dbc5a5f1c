//! HTTP handlers
//!
//! Fallible handlers return `Result<_, AppError>` so failures share the
//! `{"detail", "code"}` body.

pub mod costs;
pub mod health;
pub mod import;
pub mod metrics_handler;
pub mod reports;
pub mod static_files;

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::config::Config;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<Config>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Arc<ArcSwap<Config>>) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}
