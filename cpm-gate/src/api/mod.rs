//! HTTP API handlers for cpm-gate

pub mod gate;
pub mod health;

pub use gate::{checkout_exit, checkout_fee, gate_view, list_vehicles, register_entry};
pub use health::health_routes;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cpm_common::Error;
use serde_json::json;

/// Wrapper mapping domain errors onto HTTP statuses for the JSON surface
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidInterval(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::TicketNotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateVehicle(_) => StatusCode::CONFLICT,
            Error::Recognition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
