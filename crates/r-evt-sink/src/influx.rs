//! ---
//! evt_section: "05-networking-external-interfaces"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "HTTP writer for the InfluxDB v2 write API."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::time::Instant;

use async_trait::async_trait;
use r_evt_common::InfluxConfig;
use r_evt_sim::TelemetryRecord;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{Result, SinkError};
use crate::line_protocol::encode_batch;
use crate::{PointSink, WriteReport};

const WRITE_PATH: &str = "api/v2/write";
const LINE_PROTOCOL_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Writes batches to `POST {url}/api/v2/write` with nanosecond precision.
#[derive(Debug, Clone)]
pub struct InfluxWriter {
    client: Client,
    endpoint: Url,
    token: String,
}

impl InfluxWriter {
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let endpoint = write_endpoint(config)?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            token: config.token.clone(),
        })
    }

    /// Fully qualified write URL including org, bucket, and precision.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn write_endpoint(config: &InfluxConfig) -> Result<Url> {
    let invalid = |reason: String| SinkError::Endpoint {
        url: config.url.clone(),
        reason,
    };
    let mut base = Url::parse(&config.url).map_err(|err| invalid(err.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path".into()));
    }
    // keep any path prefix (reverse proxies) when joining
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut endpoint = base
        .join(WRITE_PATH)
        .map_err(|err| invalid(err.to_string()))?;
    endpoint
        .query_pairs_mut()
        .clear()
        .append_pair("org", &config.org)
        .append_pair("bucket", &config.bucket)
        .append_pair("precision", "ns");
    Ok(endpoint)
}

#[async_trait]
impl PointSink for InfluxWriter {
    fn name(&self) -> &str {
        "influxdb"
    }

    async fn write_batch(&self, records: &[TelemetryRecord]) -> Result<WriteReport> {
        let started = Instant::now();
        if records.is_empty() {
            return Ok(WriteReport {
                points: 0,
                bytes: 0,
                elapsed: started.elapsed(),
            });
        }
        let body = encode_batch(records)?;
        let bytes = body.len();
        debug!(endpoint = %self.endpoint, points = records.len(), bytes, "posting line protocol");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, LINE_PROTOCOL_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(WriteReport {
            points: records.len(),
            bytes,
            elapsed: started.elapsed(),
        })
    }
}
