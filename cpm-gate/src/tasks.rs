//! Background task wrappers with foreground result delivery
//!
//! The fee calculator and the OCR scanner are pure/blocking collaborators;
//! these wrappers run them off the caller's context and deliver the success
//! value or the captured failure as a [`GateEvent`] on the foreground
//! channel. They add no semantics of their own. Callers that also need the
//! value inline can await the returned handle.

use chrono::NaiveDateTime;
use cpm_common::events::GateEvent;
use cpm_common::{fee, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::scanner::{normalize_plate, PlateRecognizer};

/// Send an event to the foreground loop. A closed channel only happens
/// during shutdown; the event is dropped with a warning.
pub(crate) fn emit(events: &UnboundedSender<GateEvent>, event: GateEvent) {
    if events.send(event).is_err() {
        warn!("Foreground channel closed; gate event dropped");
    }
}

/// Compute a parking fee on a background task
pub fn spawn_calculate_fee(
    plate: String,
    entry: NaiveDateTime,
    exit: Option<NaiveDateTime>,
    departure: Option<NaiveDateTime>,
    events: UnboundedSender<GateEvent>,
) -> JoinHandle<Result<f64>> {
    tokio::spawn(async move {
        let result = fee::calculate_fee(entry, exit, departure);
        match &result {
            Ok(amount) => emit(
                &events,
                GateEvent::FeeCalculated {
                    plate,
                    fee: *amount,
                    timestamp: chrono::Utc::now(),
                },
            ),
            Err(e) => emit(
                &events,
                GateEvent::FeeCalculationFailed {
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                },
            ),
        }
        result
    })
}

/// Produce a receipt summary on a background task
pub fn spawn_exit_summary(
    plate: String,
    entry: NaiveDateTime,
    exit: Option<NaiveDateTime>,
    departure: Option<NaiveDateTime>,
    events: UnboundedSender<GateEvent>,
) -> JoinHandle<Result<String>> {
    tokio::spawn(async move {
        let result = fee::exit_summary(entry, exit, departure);
        match &result {
            Ok(summary) => emit(
                &events,
                GateEvent::ReceiptReady {
                    plate,
                    summary: summary.clone(),
                    timestamp: chrono::Utc::now(),
                },
            ),
            Err(e) => emit(
                &events,
                GateEvent::FeeCalculationFailed {
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                },
            ),
        }
        result
    })
}

/// Run OCR on a background task; delivers the normalized plate
pub fn spawn_scan(
    scanner: Arc<dyn PlateRecognizer>,
    image: PathBuf,
    events: UnboundedSender<GateEvent>,
) -> JoinHandle<Result<String>> {
    tokio::spawn(async move {
        let result = scanner
            .recognize(&image)
            .await
            .map(|raw| normalize_plate(&raw));
        match &result {
            Ok(plate) => emit(
                &events,
                GateEvent::PlateRecognized {
                    plate: plate.clone(),
                    timestamp: chrono::Utc::now(),
                },
            ),
            Err(e) => emit(
                &events,
                GateEvent::RecognitionFailed {
                    error: e.to_string(),
                    timestamp: chrono::Utc::now(),
                },
            ),
        }
        result
    })
}
