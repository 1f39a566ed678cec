//! Database access for the gate service

pub mod vehicles;

pub use vehicles::VehicleStore;
