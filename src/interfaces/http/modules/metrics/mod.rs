//! `GET /metrics` for Prometheus and the per-request HTTP counters.
//!
//! Domain counters (`permission_checks_total`, `stage_completions_total`)
//! are recorded by the services themselves.

pub mod handlers;
pub mod middleware;

pub use handlers::{prometheus_metrics, MetricsState};
pub use middleware::http_metrics_middleware;
