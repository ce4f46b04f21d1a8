//! agrosense-common — Shared types, formulas, and the in-memory store used
//! across the AgroSense crates.

pub mod calibration;
pub mod error;
pub mod reading;
pub mod recommend;
pub mod store;

// Re-export commonly used types
pub use error::ApiError;
pub use reading::{NewReading, SensorReading, SoilVariables, StoredReading};
pub use store::HistoryStore;
