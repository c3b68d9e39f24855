pub mod analysis;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod llm;
pub mod session;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;
use config::Config;
use error::Result;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Ok(AppState {
            config: Arc::new(config),
            http: fetcher::build_http_client()?,
        })
    }
}
