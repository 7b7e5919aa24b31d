//! Observability: relation end-point telemetry (metrics) and sink abstractions.
//!
//! This module does not inspect end-point state; it only counts events that
//! end-points report through `EndPointContext`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, RelationCounters};
pub use sink::{MetricsSink, RelationEvent, metrics_report, metrics_reset_all, with_metrics_sink};
