//! Common error types for CPM

use thiserror::Error;

/// Common result type for CPM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the CPM modules
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or inverted time range given to the fee calculator
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Entry attempted for a plate that is already in the car park
    #[error("Vehicle already present: {0}")]
    DuplicateVehicle(String),

    /// Checkout attempted for a plate with no matching ticket
    #[error("No ticket found for plate: {0}")]
    TicketNotFound(String),

    /// Plate recognition (OCR) failure
    #[error("Plate recognition failed: {0}")]
    Recognition(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
