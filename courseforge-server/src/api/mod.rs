//! API Module
//!
//! HTTP API layer of the course layout service.

pub mod error;
pub mod health;
pub mod layout;

use axum::{Router, routing::get};
use courseforge_core::store::CourseStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::generator::TextGenerator;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CourseStore>,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(store: Arc<dyn CourseStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Layout endpoints
        .route(
            "/api/generate-course-layout",
            get(layout::list_processing).post(layout::generate_layout),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
