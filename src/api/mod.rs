//! HTTP API for Hagglz
//!
//! A thin axum adapter in front of the [`MasterOrchestrator`]: it decodes the
//! uploaded bill, runs one orchestration and remembers confident results.

pub mod handlers;
pub mod server;

use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::agents::orchestrator::MasterOrchestrator;
use crate::memory::NegotiationMemory;
use crate::ocr::OcrEngine;

pub use handlers::{ApiError, NegotiateRequest, NegotiateResponse};
pub use server::serve;

/// Shared, request-independent state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<MasterOrchestrator>,
    pub memory: Arc<dyn NegotiationMemory>,
    pub ocr: Arc<dyn OcrEngine>,
    /// Results scoring above this confidence are stored in memory
    pub store_threshold: f64,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<MasterOrchestrator>,
        memory: Arc<dyn NegotiationMemory>,
        ocr: Arc<dyn OcrEngine>,
        store_threshold: f64,
    ) -> Self {
        Self {
            orchestrator,
            memory,
            ocr,
            store_threshold,
        }
    }
}

/// Build the `/api/v1` router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/negotiate", post(handlers::start_negotiation))
        .route(
            "/api/v1/negotiation/{negotiation_id}",
            get(handlers::negotiation_status),
        )
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/stats", get(handlers::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
