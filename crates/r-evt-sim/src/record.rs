//! ---
//! evt_section: "11-simulation"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Telemetry record model shared by generator and sinks."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Numeric field payload. Flags are carried as `0`/`1` integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    pub fn flag(raised: bool) -> Self {
        FieldValue::Integer(i64::from(raised))
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Integer(value) => *value as f64,
            FieldValue::Float(value) => *value,
        }
    }
}

/// One data point for a single (timestamp, vehicle, measurement group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub measurement: String,
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub fields: IndexMap<String, FieldValue>,
}

impl TelemetryRecord {
    /// Tag key under which the vehicle identifier is written.
    pub const VEHICLE_TAG: &'static str = "vehicle_id";

    pub fn new(measurement: &str, vehicle_id: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.to_owned(),
            vehicle_id: vehicle_id.to_owned(),
            timestamp,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.insert(name.to_owned(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).copied()
    }

    pub fn tags(&self) -> [(&str, &str); 1] {
        [(Self::VEHICLE_TAG, self.vehicle_id.as_str())]
    }

    /// Nanoseconds since the Unix epoch, `None` outside the i64 range.
    pub fn timestamp_nanos(&self) -> Option<i64> {
        self.timestamp.timestamp_nanos_opt()
    }
}
