//! ---
//! evt_section: "05-networking-external-interfaces"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Offline export of generated telemetry for dry runs."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use r_evt_sim::TelemetryRecord;

use crate::error::Result;
use crate::line_protocol::encode_batch;
use crate::{PointSink, WriteReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Exactly the body the InfluxDB writer would post.
    #[default]
    LineProtocol,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Stdout,
    File(PathBuf),
}

impl ExportTarget {
    /// `-` selects stdout, anything else is a file path.
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            ExportTarget::Stdout
        } else {
            ExportTarget::File(path.to_path_buf())
        }
    }

    fn open(&self) -> io::Result<Box<dyn Write>> {
        Ok(match self {
            ExportTarget::Stdout => Box::new(io::stdout().lock()),
            ExportTarget::File(path) => Box::new(BufWriter::new(File::create(path)?)),
        })
    }
}

/// Writes the batch to stdout or a file instead of a live server.
#[derive(Debug, Clone)]
pub struct ExportSink {
    target: ExportTarget,
    format: ExportFormat,
}

impl ExportSink {
    pub fn new(target: ExportTarget, format: ExportFormat) -> Self {
        Self { target, format }
    }

    fn render(&self, records: &[TelemetryRecord]) -> Result<Vec<u8>> {
        let mut payload = match self.format {
            ExportFormat::LineProtocol => encode_batch(records)?.into_bytes(),
            ExportFormat::Json => serde_json::to_vec_pretty(records)?,
        };
        if !payload.is_empty() {
            payload.push(b'\n');
        }
        Ok(payload)
    }
}

#[async_trait]
impl PointSink for ExportSink {
    fn name(&self) -> &str {
        match self.target {
            ExportTarget::Stdout => "stdout",
            ExportTarget::File(_) => "file",
        }
    }

    async fn write_batch(&self, records: &[TelemetryRecord]) -> Result<WriteReport> {
        let started = Instant::now();
        let payload = self.render(records)?;
        let mut writer = self.target.open()?;
        writer.write_all(&payload)?;
        writer.flush()?;
        Ok(WriteReport {
            points: records.len(),
            bytes: payload.len(),
            elapsed: started.elapsed(),
        })
    }
}
