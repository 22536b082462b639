//! ---
//! evt_section: "05-networking-external-interfaces"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Sink adapters that deliver generated telemetry."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SinkError>;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid InfluxDB endpoint {url:?}: {reason}")]
    Endpoint { url: String, reason: String },
    #[error("record {measurement}/{vehicle_id} has no fields")]
    EmptyRecord {
        measurement: String,
        vehicle_id: String,
    },
    #[error("timestamp {0} cannot be expressed as nanoseconds since the epoch")]
    TimestampOutOfRange(DateTime<Utc>),
    #[error("failed to reach InfluxDB: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("InfluxDB rejected the write with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
