//! # CPM Common Library
//!
//! Shared code for the Car Park Manager modules including:
//! - Database models and initialization
//! - Event types (GateEvent enum)
//! - Parking fee calculation
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod fee;
pub mod time;


pub use error::{Error, Result};
