//! ---
//! evt_section: "05-networking-external-interfaces"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "InfluxDB v2 line protocol encoding."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
//! InfluxDB v2 line protocol encoding for telemetry records.
//!
//! ```text
//! measurement,vehicle_id=vehicle_A battery_soc=42.1,weak_cell_fault=0i 1754352000000000000
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use r_evt_sim::{FieldValue, TelemetryRecord};

use crate::error::{Result, SinkError};

/// Accumulates encoded records into a newline-separated request body.
#[derive(Debug, Default)]
pub struct LineProtocolWriter {
    body: String,
    lines: usize,
}

impl LineProtocolWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(records: usize) -> Self {
        // measurement + tag + a handful of fields rarely exceeds this
        Self {
            body: String::with_capacity(records.saturating_mul(160)),
            lines: 0,
        }
    }

    pub fn write_record(&mut self, record: &TelemetryRecord) -> Result<()> {
        let line = encode_record(record)?;
        if self.lines > 0 {
            self.body.push('\n');
        }
        self.body.push_str(&line);
        self.lines += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// Encode a whole batch, failing on the first record that cannot be written.
pub fn encode_batch(records: &[TelemetryRecord]) -> Result<String> {
    let mut writer = LineProtocolWriter::with_capacity(records.len());
    for record in records {
        writer.write_record(record)?;
    }
    Ok(writer.into_body())
}

/// Encode one record as a single line without a trailing newline.
pub fn encode_record(record: &TelemetryRecord) -> Result<String> {
    if record.fields.is_empty() {
        return Err(SinkError::EmptyRecord {
            measurement: record.measurement.clone(),
            vehicle_id: record.vehicle_id.clone(),
        });
    }
    let timestamp = record
        .timestamp_nanos()
        .ok_or(SinkError::TimestampOutOfRange(record.timestamp))?;

    let mut line = escape_measurement(&record.measurement);
    for (key, value) in record.tags() {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    for (i, (key, value)) in record.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&format_field(value));
    }

    line.push(' ');
    line.push_str(&timestamp.to_string());
    Ok(line)
}

fn format_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{}", v),
        FieldValue::Integer(v) => format!("{}i", v),
    }
}

/// Measurement names escape commas and spaces.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values, and field keys escape commas, equals signs, and spaces.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record() -> TelemetryRecord {
        TelemetryRecord::new(
            "bms_cell_values",
            "vehicle_A",
            Utc.with_ymd_and_hms(2025, 8, 5, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn encodes_floats_integers_and_timestamp() {
        let record = record()
            .with_field("cell_voltage", FieldValue::Float(3312.25))
            .with_field("weak_cell_fault", FieldValue::Integer(0));
        assert_eq!(
            encode_record(&record).unwrap(),
            "bms_cell_values,vehicle_id=vehicle_A cell_voltage=3312.25,weak_cell_fault=0i 1754352000000000000"
        );
    }

    #[test]
    fn escapes_special_characters() {
        let record = TelemetryRecord::new(
            "my measurement,x",
            "veh A=1",
            Utc.timestamp_opt(1, 0).unwrap(),
        )
        .with_field("field key", FieldValue::Float(-0.5));
        assert_eq!(
            encode_record(&record).unwrap(),
            "my\\ measurement\\,x,vehicle_id=veh\\ A\\=1 field\\ key=-0.5 1000000000"
        );
    }

    #[test]
    fn whole_number_floats_stay_untyped() {
        let record = record().with_field("battery_soc", FieldValue::Float(0.0));
        let line = encode_record(&record).unwrap();
        assert!(line.contains(" battery_soc=0 "));
    }

    #[test]
    fn rejects_record_without_fields() {
        let err = encode_record(&record()).unwrap_err();
        assert!(matches!(err, SinkError::EmptyRecord { .. }));
    }

    #[test]
    fn rejects_timestamps_beyond_nanosecond_range() {
        let far_future = Utc.with_ymd_and_hms(2500, 1, 1, 0, 0, 0).unwrap();
        let record = TelemetryRecord::new("m", "v", far_future)
            .with_field("f", FieldValue::Float(1.0));
        assert!(matches!(
            encode_record(&record),
            Err(SinkError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn batch_is_newline_separated_without_trailing_newline() {
        let a = record().with_field("f", FieldValue::Float(1.5));
        let b = record().with_field("f", FieldValue::Integer(1));
        let body = encode_batch(&[a, b]).unwrap();
        let lines: Vec<_> = body.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("f=1i 1754352000000000000"));
        assert!(encode_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn writer_counts_lines() {
        let mut writer = LineProtocolWriter::new();
        assert!(writer.is_empty());
        writer
            .write_record(&record().with_field("f", FieldValue::Float(2.0)))
            .unwrap();
        assert_eq!(writer.len(), 1);
        assert!(!writer.into_body().contains('\n'));
    }
}
