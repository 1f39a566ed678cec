//! Shared domain models

use chrono::NaiveDateTime;
use serde::Serialize;

/// A vehicle currently known to the car park.
///
/// Created by the entry workflow, updated in place (keyed by `id`) when an
/// actual departure is recorded, and deleted once the vehicle has left.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRecord {
    /// Positive, unique, assigned by the store on creation
    pub id: i64,

    /// Normalized plate: uppercase alphanumeric plus hyphen.
    /// Lookups compare case-insensitively.
    pub plate_number: String,

    /// Set at creation, immutable thereafter
    pub entry_time: NaiveDateTime,

    /// Planned exit; `None` when no planned exit was recorded. Overwritten
    /// with the actual departure on checkout's update path.
    pub exit_time: Option<NaiveDateTime>,
}

impl VehicleRecord {
    /// Project this record into its read-only checkout view
    pub fn ticket(&self) -> ParkingTicket {
        ParkingTicket {
            id: self.id,
            plate_number: self.plate_number.clone(),
            entry_time: self.entry_time,
            exit_time: self.exit_time,
        }
    }
}

/// Read-only projection of a [`VehicleRecord`] used during checkout.
///
/// Structurally identical to the record; exists so the checkout workflow
/// never holds the persistence representation directly. Always projected
/// from a record at lookup time, no independent lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingTicket {
    pub id: i64,
    pub plate_number: String,
    pub entry_time: NaiveDateTime,
    pub exit_time: Option<NaiveDateTime>,
}
