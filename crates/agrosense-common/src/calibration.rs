//! Per-variable calibration transform.
//!
//! Calibration is a fixed multiplicative factor per variable, matching the
//! bench calibration of the deployed sensor set. Outputs are rounded to two
//! decimal places, the precision the dashboard displays.

use crate::reading::SoilVariables;

pub const PH_FACTOR: f64 = 0.95;
pub const TEMPERATURE_FACTOR: f64 = 1.02;
pub const MOISTURE_FACTOR: f64 = 0.98;
pub const NITROGEN_FACTOR: f64 = 1.05;
pub const PHOSPHORUS_FACTOR: f64 = 1.03;
pub const POTASSIUM_FACTOR: f64 = 1.04;
pub const CONDUCTIVITY_FACTOR: f64 = 0.97;

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Apply the calibration factors to a raw sample.
pub fn calibrate(raw: &SoilVariables) -> SoilVariables {
    SoilVariables {
        ph: round2(raw.ph * PH_FACTOR),
        temperature: round2(raw.temperature * TEMPERATURE_FACTOR),
        moisture: round2(raw.moisture * MOISTURE_FACTOR),
        nitrogen: round2(raw.nitrogen * NITROGEN_FACTOR),
        phosphorus: round2(raw.phosphorus * PHOSPHORUS_FACTOR),
        potassium: round2(raw.potassium * POTASSIUM_FACTOR),
        conductivity: round2(raw.conductivity * CONDUCTIVITY_FACTOR),
    }
}
