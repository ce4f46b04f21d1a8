//! agrosense-web — HTTP API for the AgroSense soil monitor.
//! Serves:
//!   - Raw and calibrated sensor readings with in-memory history
//!   - Formula-based NPK dosage recommendations
//!   - Model-backed advisory recommendations and soil text analysis
//!   - Health and advisory audit endpoints

pub mod router;
pub mod handlers;
pub mod state;
pub mod config;
