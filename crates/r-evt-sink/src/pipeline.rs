//! ---
//! evt_section: "05-networking-external-interfaces"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Generate-then-write orchestration for one seeding run."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use r_evt_common::InfluxConfig;
use r_evt_sim::TelemetryGenerator;
use tracing::{error, info};

use crate::error::SinkError;
use crate::influx::InfluxWriter;
use crate::{PointSink, WriteReport};

/// What a seeding run produced and how the single write went.
#[derive(Debug)]
pub struct SeedSummary {
    pub generated: usize,
    pub result: Result<WriteReport, SinkError>,
}

impl SeedSummary {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Generate the full record set and hand it to `sink` in one batch.
///
/// Write failures are logged and returned in the summary; the run itself
/// always completes.
pub async fn seed<S>(generator: &mut TelemetryGenerator, sink: &S) -> SeedSummary
where
    S: PointSink + ?Sized,
{
    info!(
        vehicles = generator.plan().vehicles.len(),
        groups = generator.plan().catalog.len(),
        "generating telemetry"
    );
    let records = generator.generate();
    let generated = records.len();
    info!(sink = sink.name(), points = generated, "writing telemetry batch");

    let result = sink.write_batch(&records).await;
    match &result {
        Ok(report) => info!(
            sink = sink.name(),
            points = report.points,
            bytes = report.bytes,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "telemetry batch written"
        ),
        Err(err) => error!(sink = sink.name(), error = %err, "failed to write telemetry batch"),
    }
    info!("data push complete");
    SeedSummary { generated, result }
}

/// Convenience wrapper that builds an [`InfluxWriter`] for the run.
///
/// A writer that cannot be constructed is reported like any other write
/// failure, after generation has run.
pub async fn seed_influx(generator: &mut TelemetryGenerator, config: &InfluxConfig) -> SeedSummary {
    match InfluxWriter::new(config) {
        Ok(writer) => seed(generator, &writer).await,
        Err(err) => {
            let generated = generator.generate().len();
            error!(error = %err, "failed to prepare InfluxDB writer");
            info!("data push complete");
            SeedSummary {
                generated,
                result: Err(err),
            }
        }
    }
}
