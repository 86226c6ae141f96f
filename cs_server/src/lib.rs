//! HTTP server library for the cue_stakes wagering platform.
//!
//! All business logic lives in the `cue_stakes` crate; this crate is thin
//! glue: JSON routing, configuration, and Prometheus metrics.

pub mod api;
pub mod config;
pub mod metrics;
