//! ---
//! evt_section: "05-networking-external-interfaces"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Sink adapters that deliver generated telemetry."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
//! Delivery side of the seeder.
//!
//! ```text
//! TelemetryGenerator --> Vec<TelemetryRecord> --> PointSink::write_batch
//!                                                  |-- InfluxWriter (HTTP, line protocol)
//!                                                  `-- ExportSink   (stdout / file)
//! ```
//!
//! The whole batch is encoded up front and submitted in a single request;
//! failures come back as [`SinkError`] and never abort the process on their own.

pub mod error;
pub mod export;
pub mod influx;
pub mod line_protocol;
pub mod pipeline;

use std::time::Duration;

use async_trait::async_trait;
use r_evt_sim::TelemetryRecord;

pub use error::SinkError;
pub use export::{ExportFormat, ExportSink, ExportTarget};
pub use influx::InfluxWriter;
pub use line_protocol::LineProtocolWriter;
pub use pipeline::{seed, seed_influx, SeedSummary};

/// Outcome of a successful batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    pub points: usize,
    pub bytes: usize,
    pub elapsed: Duration,
}

/// Destination accepting one batch of records per call.
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Short human-readable label used in log lines.
    fn name(&self) -> &str;

    async fn write_batch(&self, records: &[TelemetryRecord]) -> Result<WriteReport, SinkError>;
}
