//! Hybrid decision engine pairing a deterministic rule pass with a
//! best-effort advisory model, plus the service plumbing around it.

pub mod config;
pub mod error;
pub mod screening;
pub mod telemetry;
