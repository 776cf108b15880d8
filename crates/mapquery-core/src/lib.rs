//! mapquery Core - Domain models, configuration, and ports
//!
//! This crate contains the domain types shared by the spatial query client:
//! layers, features, pagination, query results, and the traits the
//! orchestrator uses to reach the backend and the map.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{MapQueryError, Result};
