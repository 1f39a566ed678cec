//! Event types for the CPM gate event system
//!
//! Background tasks (plate recognition, fee computation, store mutations)
//! never touch presentation-visible state directly; they deliver one of
//! these events onto the foreground channel instead.

use serde::Serialize;

/// CPM gate event types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum GateEvent {
    /// OCR produced a normalized plate
    PlateRecognized {
        plate: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// OCR failed; operator may retry with a different image
    RecognitionFailed {
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Fee computation finished for a ticket
    FeeCalculated {
        plate: String,
        fee: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Fee computation failed (invalid interval or malformed input)
    FeeCalculationFailed {
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Receipt summary produced during checkout
    ReceiptReady {
        plate: String,
        summary: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new vehicle record was persisted by the entry workflow
    VehicleRegistered {
        id: i64,
        plate: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A vehicle record was deleted by the checkout workflow
    VehicleDeparted {
        id: i64,
        plate: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl GateEvent {
    /// Short event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            GateEvent::PlateRecognized { .. } => "PlateRecognized",
            GateEvent::RecognitionFailed { .. } => "RecognitionFailed",
            GateEvent::FeeCalculated { .. } => "FeeCalculated",
            GateEvent::FeeCalculationFailed { .. } => "FeeCalculationFailed",
            GateEvent::ReceiptReady { .. } => "ReceiptReady",
            GateEvent::VehicleRegistered { .. } => "VehicleRegistered",
            GateEvent::VehicleDeparted { .. } => "VehicleDeparted",
        }
    }
}
