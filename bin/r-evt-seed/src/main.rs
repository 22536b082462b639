//! ---
//! evt_section: "11-simulation"
//! evt_subsection: "01-bootstrap"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Seeds an InfluxDB v2 bucket with generated EV telemetry."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use r_evt_common::{init_tracing, LoadedSeedConfig, SeedConfig};
use r_evt_sim::TelemetryGenerator;
use r_evt_sink::{seed, seed_influx, ExportFormat, ExportSink, ExportTarget, SeedSummary};
use tracing::info;

const SERVICE_NAME: &str = "r-evt-seed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    LineProtocol,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::LineProtocol => ExportFormat::LineProtocol,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Generate fake EV telemetry and write it to an InfluxDB v2 bucket",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to R_EVT_CONFIG, then ./r-evt-seed.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// InfluxDB base URL
    #[arg(long, env = "INFLUXDB_URL")]
    url: Option<String>,

    /// InfluxDB API token
    #[arg(long, env = "INFLUXDB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// InfluxDB organisation
    #[arg(long, env = "INFLUXDB_ORG")]
    org: Option<String>,

    /// Target bucket
    #[arg(long, env = "INFLUXDB_BUCKET")]
    bucket: Option<String>,

    /// Random seed; omit for a different payload on every run
    #[arg(long)]
    seed: Option<u64>,

    /// Skip InfluxDB and export the batch instead
    #[arg(long)]
    dry_run: bool,

    /// Dry-run output path. Use '-' for stdout.
    #[arg(long, default_value = "-", requires = "dry_run")]
    output: PathBuf,

    /// Dry-run output format
    #[arg(long, value_enum, default_value_t = OutputFormat::LineProtocol)]
    format: OutputFormat,

    /// Exit non-zero when the write fails
    #[arg(long)]
    fail_on_error: bool,

    /// Print version information and exit
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("{} {}", SERVICE_NAME, env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let LoadedSeedConfig { config, source } = prepare_config(&cli)?;
    let _log_guard =
        init_tracing(SERVICE_NAME, &config.logging).context("failed to initialise logging")?;
    match &source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; using built-in defaults"),
    }

    let mut generator = TelemetryGenerator::from_config(&config);
    let summary = if cli.dry_run {
        let sink = ExportSink::new(ExportTarget::from_arg(&cli.output), cli.format.into());
        seed(&mut generator, &sink).await
    } else {
        info!(url = %config.influxdb.url, bucket = %config.influxdb.bucket, "seeding InfluxDB");
        seed_influx(&mut generator, &config.influxdb).await
    };

    finish(&cli, summary)
}

/// Load the file config, layer CLI/env overrides on top, and validate.
fn prepare_config(cli: &Cli) -> Result<LoadedSeedConfig> {
    let LoadedSeedConfig { mut config, source } = match &cli.config {
        Some(path) => LoadedSeedConfig {
            config: SeedConfig::from_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            source: Some(path.clone()),
        },
        None => SeedConfig::load(&SeedConfig::DEFAULT_CANDIDATES)
            .context("failed to load configuration")?,
    };
    apply_overrides(cli, &mut config);
    config.validate().context("invalid configuration")?;
    if !cli.dry_run {
        config.influxdb.validate().context(
            "InfluxDB connection settings are missing or invalid; set url, token, org and bucket \
             in the config file or via INFLUXDB_URL, INFLUXDB_TOKEN, INFLUXDB_ORG and INFLUXDB_BUCKET",
        )?;
    }
    Ok(LoadedSeedConfig { config, source })
}

fn apply_overrides(cli: &Cli, config: &mut SeedConfig) {
    let influx = &mut config.influxdb;
    let overrides = [
        (&mut influx.url, &cli.url),
        (&mut influx.token, &cli.token),
        (&mut influx.org, &cli.org),
        (&mut influx.bucket, &cli.bucket),
    ];
    for (slot, value) in overrides {
        if let Some(value) = value {
            *slot = value.clone();
        }
    }
    if cli.seed.is_some() {
        config.generation.seed = cli.seed;
    }
}

fn finish(cli: &Cli, summary: SeedSummary) -> Result<()> {
    match summary.result {
        Ok(report) => {
            if cli.dry_run && cli.output.as_os_str() != "-" {
                eprintln!(
                    "exported {} records -> {}",
                    report.points,
                    cli.output.display()
                );
            }
            Ok(())
        }
        Err(err) if cli.fail_on_error => {
            Err(anyhow!(err).context(format!("failed to write {} records", summary.generated)))
        }
        // already logged by the pipeline
        Err(_) => Ok(()),
    }
}
