//! Sensor reading types.
//!
//! Wire field names (`pH`, `suhu`, `kelembaban`, `N`, `P`, `K`, `EC`) follow
//! the deployed station firmware and are what the dashboard reads; Rust field
//! names are English.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven soil variables a station reports per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilVariables {
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Soil temperature in °C.
    #[serde(rename = "suhu")]
    pub temperature: f64,
    /// Relative soil moisture in %.
    #[serde(rename = "kelembaban")]
    pub moisture: f64,
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    /// Electrical conductivity in mS/cm.
    #[serde(rename = "EC")]
    pub conductivity: f64,
}

/// A timestamped sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,
    pub variables: SoilVariables,
}

/// A reading as accepted over HTTP; the timestamp is optional and defaults
/// to the arrival time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReading {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub variables: SoilVariables,
}

/// A stored reading, addressable for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub variables: SoilVariables,
}

impl StoredReading {
    pub fn new(reading: SensorReading) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: reading.timestamp,
            variables: reading.variables,
        }
    }
}
