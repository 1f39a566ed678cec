//! cpm-gate library - gate service for the Car Park Manager
//!
//! Orchestrates vehicle entry and checkout over a cache-fronted vehicle
//! store, with OCR plate recognition and fee computation running on
//! background tasks that deliver their results to a single foreground
//! context.

use axum::Router;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use cpm_common::events::GateEvent;

pub mod api;
pub mod db;
pub mod foreground;
pub mod scanner;
pub mod tasks;
pub mod workflows;

use db::VehicleStore;
use foreground::GateView;
use scanner::PlateRecognizer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Cache-fronted vehicle storage
    pub store: Arc<VehicleStore>,
    /// Plate recognizer (OCR collaborator)
    pub scanner: Arc<dyn PlateRecognizer>,
    /// Sender half of the foreground event channel
    pub events: mpsc::UnboundedSender<GateEvent>,
    /// Presentation-visible state; written only by the foreground loop
    pub view: Arc<RwLock<GateView>>,
}

impl AppState {
    pub fn new(
        store: Arc<VehicleStore>,
        scanner: Arc<dyn PlateRecognizer>,
        events: mpsc::UnboundedSender<GateEvent>,
        view: Arc<RwLock<GateView>>,
    ) -> Self {
        Self {
            store,
            scanner,
            events,
            view,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::cors::CorsLayer;

    Router::new()
        .route("/api/entry", post(api::register_entry))
        .route("/api/checkout/fee", post(api::checkout_fee))
        .route("/api/checkout/exit", post(api::checkout_exit))
        .route("/api/vehicles", get(api::list_vehicles))
        .route("/api/view", get(api::gate_view))
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
