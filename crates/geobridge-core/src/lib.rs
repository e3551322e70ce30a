//! geobridge core - Domain models, configuration, and port definitions
//!
//! This crate contains the data model of the sign-in / layer / migration
//! workflow and the ports its adapters implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{BridgeError, ResponseBody, Result};
