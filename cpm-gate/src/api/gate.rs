//! Gate operation handlers
//!
//! Thin JSON layer over the entry and checkout workflows; all timestamps
//! on the wire use the fixed `%Y-%m-%d %H:%M:%S` format and default to the
//! current time where the spec allows.

use axum::{extract::State, Json};
use chrono::NaiveDateTime;
use cpm_common::db::models::{ParkingTicket, VehicleRecord};
use cpm_common::{time, Error};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use super::ApiError;
use crate::foreground::GateView;
use crate::scanner::normalize_plate;
use crate::tasks;
use crate::workflows::{CheckoutWorkflow, EntryWorkflow};
use crate::AppState;

fn parse_opt_ts(value: Option<&str>) -> Result<Option<NaiveDateTime>, ApiError> {
    value.map(time::parse_db).transpose().map_err(ApiError::from)
}

/// Resolve the plate for a request: use the given plate when present,
/// otherwise scan the given image on a background task
async fn resolve_plate(
    state: &AppState,
    plate: Option<&str>,
    image: Option<&str>,
) -> Result<String, ApiError> {
    if let Some(plate) = plate {
        return Ok(normalize_plate(plate));
    }

    let image = image.ok_or_else(|| {
        Error::InvalidInput("either plate or image is required".to_string())
    })?;

    let plate = tasks::spawn_scan(
        Arc::clone(&state.scanner),
        PathBuf::from(image),
        state.events.clone(),
    )
    .await
    .map_err(|e| Error::Internal(format!("scan task failed: {}", e)))??;

    Ok(plate)
}

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    /// Plate text; alternative to `image`
    pub plate: Option<String>,
    /// Image path to scan when no plate is given
    pub image: Option<String>,
    /// Entry time; defaults to now
    pub entry_time: Option<String>,
    /// Operator-entered planned exit, if any
    pub planned_exit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub vehicle: VehicleRecord,
}

/// POST /api/entry
///
/// Registers a vehicle entering the car park.
pub async fn register_entry(
    State(state): State<AppState>,
    Json(req): Json<EntryRequest>,
) -> Result<Json<EntryResponse>, ApiError> {
    let plate = resolve_plate(&state, req.plate.as_deref(), req.image.as_deref()).await?;
    let entry_time = parse_opt_ts(req.entry_time.as_deref())?;
    let planned_exit = parse_opt_ts(req.planned_exit.as_deref())?;

    let workflow = EntryWorkflow::new(Arc::clone(&state.store), state.events.clone());
    let vehicle = workflow.register(&plate, entry_time, planned_exit).await?;

    Ok(Json(EntryResponse { vehicle }))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Plate text; alternative to `image`
    pub plate: Option<String>,
    /// Image path to scan when no plate is given
    pub image: Option<String>,
    /// Actual departure; defaults to now
    pub departure: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeeResponse {
    pub ticket: ParkingTicket,
    pub fee: f64,
}

/// POST /api/checkout/fee
///
/// Looks the ticket up, computes the fee on a background task, and records
/// the actual departure on the stored record. The two halves are
/// independent; a failure in either surfaces explicitly.
pub async fn checkout_fee(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<FeeResponse>, ApiError> {
    let plate = resolve_plate(&state, req.plate.as_deref(), req.image.as_deref()).await?;
    let departure = parse_opt_ts(req.departure.as_deref())?.unwrap_or_else(time::now);

    let workflow = CheckoutWorkflow::new(Arc::clone(&state.store), state.events.clone());
    let ticket = workflow.lookup(&plate).await?;

    let fee_handle = workflow.compute_fee_async(&ticket, departure);
    let ticket = workflow.record_departure(&ticket, departure).await?;
    let fee = fee_handle
        .await
        .map_err(|e| Error::Internal(format!("fee task failed: {}", e)))??;

    Ok(Json(FeeResponse { ticket, fee }))
}

#[derive(Debug, Serialize)]
pub struct ExitResponse {
    pub plate: String,
    pub receipt: String,
}

/// POST /api/checkout/exit
///
/// Terminal transition: produces the receipt, then deletes the record.
pub async fn checkout_exit(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<ExitResponse>, ApiError> {
    let plate = resolve_plate(&state, req.plate.as_deref(), req.image.as_deref()).await?;
    let departure = parse_opt_ts(req.departure.as_deref())?.unwrap_or_else(time::now);

    let workflow = CheckoutWorkflow::new(Arc::clone(&state.store), state.events.clone());
    let ticket = workflow.lookup(&plate).await?;
    let receipt = workflow.finalize_exit(&ticket, departure).await?;

    Ok(Json(ExitResponse {
        plate: ticket.plate_number,
        receipt,
    }))
}

/// GET /api/vehicles
///
/// Snapshot of all vehicles currently in the car park.
pub async fn list_vehicles(State(state): State<AppState>) -> Json<Vec<VehicleRecord>> {
    Json(state.store.find_all().await)
}

/// GET /api/view
///
/// Snapshot of the foreground gate view.
pub async fn gate_view(State(state): State<AppState>) -> Json<GateView> {
    Json(state.view.read().await.clone())
}
