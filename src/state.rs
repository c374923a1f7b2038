use std::sync::Arc;

use crate::{config::Config, service::CommentService};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CommentService>,
    pub config: Config,
    /// Outbound client for the article search API.
    pub http: reqwest::Client,
}

impl FromRef<AppState> for Arc<CommentService> {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for reqwest::Client {
    fn from_ref(state: &AppState) -> Self {
        state.http.clone()
    }
}
