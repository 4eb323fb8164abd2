//! API module for the VTN server

pub mod error;
pub mod service;
pub mod stats;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use vtn_core::{Fingerprint, IdentityContext, MessageCodec};
use vtn_handlers::{ExtensionPoint, HandlerRegistry, ServiceArea};

use service::ServiceEndpoint;
use stats::{DispatchStats, StatsSnapshot};

/// Shared application state, frozen once the router is built
pub struct AppState {
    pub vtn_id: String,
    pub fingerprint: Option<Fingerprint>,
    pub codec: MessageCodec,
    pub registry: HandlerRegistry,
    pub stats: DispatchStats,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(context: &IdentityContext, registry: HandlerRegistry) -> Self {
        Self {
            vtn_id: context.vtn_id().to_string(),
            fingerprint: context.fingerprint(),
            codec: MessageCodec::new(context),
            registry,
            stats: DispatchStats::new(),
            started_at: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub vtn_id: String,
    pub signing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    pub authenticating_senders: bool,
    pub bound_handlers: usize,
    pub unbound_handlers: usize,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    pub stats: StatsSnapshot,
}

/// Health check endpoint
///
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Readiness check endpoint
///
/// GET /ready
pub async fn ready(State(state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        vtn_id: state.vtn_id.clone(),
        signing: state.codec.signer().is_signing(),
        fingerprint: state.fingerprint,
        authenticating_senders: state.codec.verifier().has_resolver(),
        bound_handlers: state.registry.bound_names().len(),
        unbound_handlers: state.registry.unbound_names().len(),
        started_at: state.started_at,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        stats: state.stats.snapshot(),
    })
}

/// Extension-point catalogue
///
/// GET /handlers
pub async fn list_handlers(State(state): State<Arc<AppState>>) -> Json<Vec<ExtensionPoint>> {
    Json(state.registry.catalogue())
}

/// Create the API router
///
/// Mounts one POST endpoint per service area plus the operator endpoints.
pub fn create_router(state: Arc<AppState>, request_timeout: Option<Duration>) -> Router {
    let mut router = Router::new()
        // Operator endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/handlers", get(list_handlers))
        .with_state(state.clone());

    // Service endpoints
    for area in ServiceArea::ALL {
        let endpoint = Arc::new(ServiceEndpoint::new(area, state.clone()));
        router = router.merge(
            Router::new()
                .route(&area.path(), post(service::handle_message))
                .with_state(endpoint),
        );
    }

    let router = router.layer(TraceLayer::new_for_http());
    match request_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    }
}
