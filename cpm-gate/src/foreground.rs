//! Foreground result delivery
//!
//! Every background result (success or failure) is marshaled onto the
//! single task spawned here before it touches user-visible state: the
//! [`GateView`] has exactly one writer. Other tasks hold the shared handle
//! read-only.

use cpm_common::events::GateEvent;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

/// Presentation-visible gate state, mutated only by the foreground loop
#[derive(Debug, Clone, Default, Serialize)]
pub struct GateView {
    /// Most recently recognized plate
    pub last_plate: Option<String>,
    /// Most recently computed fee
    pub last_fee: Option<f64>,
    /// Most recently produced receipt
    pub last_receipt: Option<String>,
    /// Most recent background failure, cleared by the next success
    pub last_error: Option<String>,
    /// Vehicles registered since startup
    pub vehicles_registered: u64,
    /// Vehicles departed since startup
    pub vehicles_departed: u64,
}

/// Fold one event into the view
pub fn apply_event(view: &mut GateView, event: &GateEvent) {
    match event {
        GateEvent::PlateRecognized { plate, .. } => {
            view.last_plate = Some(plate.clone());
            view.last_error = None;
        }
        GateEvent::RecognitionFailed { error, .. } => {
            view.last_error = Some(error.clone());
        }
        GateEvent::FeeCalculated { plate, fee, .. } => {
            view.last_plate = Some(plate.clone());
            view.last_fee = Some(*fee);
            view.last_error = None;
        }
        GateEvent::FeeCalculationFailed { error, .. } => {
            view.last_error = Some(error.clone());
        }
        GateEvent::ReceiptReady { plate, summary, .. } => {
            view.last_plate = Some(plate.clone());
            view.last_receipt = Some(summary.clone());
            view.last_error = None;
        }
        GateEvent::VehicleRegistered { .. } => {
            view.vehicles_registered += 1;
        }
        GateEvent::VehicleDeparted { .. } => {
            view.vehicles_departed += 1;
        }
    }
}

/// Spawn the foreground loop: the single consumer of gate events and the
/// single writer of the shared view
pub fn spawn_foreground(
    mut rx: mpsc::UnboundedReceiver<GateEvent>,
    view: Arc<RwLock<GateView>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                GateEvent::RecognitionFailed { error, .. }
                | GateEvent::FeeCalculationFailed { error, .. } => {
                    warn!("Gate event: {} ({})", event.name(), error)
                }
                _ => info!("Gate event: {}", event.name()),
            }

            let mut view = view.write().await;
            apply_event(&mut view, &event);
        }
        debug!("Foreground loop stopped (all event senders dropped)");
    })
}
