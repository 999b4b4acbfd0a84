//! # Observability
//!
//! Prometheus metrics for the controller. Logging is plain `tracing` and is
//! configured in `runtime::initialization`.

pub mod metrics;
