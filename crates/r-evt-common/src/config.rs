//! ---
//! evt_section: "01-core-functionality"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Shared primitives and utilities for the telemetry seeder."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::logging::LogFormat;
use crate::time::GenerationWindow;

/// Literal values shipped in templates that must be replaced before writing.
const PLACEHOLDER_VALUES: &[&str] = &["INFLUXDB_TOKEN", "INFLUXDB_ORG", "INFLUXDB_BUCKET"];
const PLACEHOLDER_MARKER: &str = "YOUR_INFLUXDB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(
        "influxdb.{field} still holds a placeholder value; update the config file or set INFLUXDB_{}",
        .field.to_uppercase()
    )]
    Placeholder { field: &'static str },
    #[error("influxdb.{field} is not set")]
    Missing { field: &'static str },
    #[error("influxdb.url {url:?} is not a valid URL: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("generation.step_secs must be greater than zero")]
    InvalidStep,
    #[error("generation.vehicles must list at least one vehicle")]
    EmptyVehicles,
    #[error("vehicle '{vehicle}' is listed more than once")]
    DuplicateVehicle { vehicle: String },
    #[error("vehicle id {vehicle:?} must be non-blank and free of control characters")]
    InvalidVehicleId { vehicle: String },
    #[error("generation.measurements must declare at least one measurement group")]
    EmptyCatalog,
    #[error("measurement group '{group}' declares no fields")]
    EmptyGroup { group: String },
    #[error("measurement group '{group}' is declared more than once")]
    DuplicateGroup { group: String },
    #[error("measurement group '{group}' declares field '{field}' more than once")]
    DuplicateField { group: String, field: String },
    #[error("invalid anomaly schedule: {0}")]
    InvalidAnomaly(String),
}

fn default_influx_url() -> String {
    "https://us-east-1-1.aws.cloud2.influxdata.com/".to_owned()
}

fn default_influx_token() -> String {
    "INFLUXDB_TOKEN".to_owned()
}

fn default_influx_org() -> String {
    "INFLUXDB_ORG".to_owned()
}

fn default_influx_bucket() -> String {
    "INFLUXDB_BUCKET".to_owned()
}

fn default_write_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_vehicles() -> Vec<String> {
    vec!["vehicle_A".to_owned(), "vehicle_B".to_owned()]
}

fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 5, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn default_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 5, 1, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn default_step() -> Duration {
    Duration::from_secs(300)
}

fn default_measurements() -> Vec<MeasurementGroupConfig> {
    let table: &[(&str, &[&str])] = &[
        (
            "bms_battery_weather",
            &[
                "battery_soc",
                "battery_highest_temp",
                "battery_lowest_temp",
                "auxilary_battery_voltage",
            ],
        ),
        (
            "bms_battery_health",
            &["battery_soh", "battery_adaptive_total_capacity"],
        ),
        (
            "bms_cell_values",
            &["cell_voltage", "cell_internal_resistance"],
        ),
        (
            "bms_fault_and_safety_state",
            &[
                "high_voltage_isolation_fault",
                "weak_cell_fault",
                "chrg_limit_enforcement_fault",
                "dischrg_limit_enforcement_fault",
                "input_power_supply_fault",
                "redundant_power_supply_fault",
            ],
        ),
        (
            "controller_motor_status_2_FRONT",
            &[
                "motorcontroller_2_controller_temp",
                "motorcontroller_2_motor_temp",
            ],
        ),
        (
            "controller_motor_status_1_REAR",
            &[
                "motorcontroller_1_controller_temp",
                "motorcontroller_1_motor_temp",
                "motorcontroller_1_distance_travelled",
            ],
        ),
        (
            "DC_DC_conv_temperature",
            &["DC_DC_converter_inner_temperature"],
        ),
        ("DC_DC_conv_workingstatus", &["working_status"]),
        ("DC_DC_Conv_OutputCurrent", &["12Vconv_Outputcurrent"]),
        (
            "DC_DC_Conv_fault_status",
            &[
                "Over_temperature_shutdown",
                "output_overcurrent_alarm",
                "output_overvoltage_alarm",
                "input_overvoltage_alarm",
                "input_undervoltage_alarm",
                "output_shortcircuit_protection",
                "internal_fault_alarm",
                "communication_fault_alarm",
            ],
        ),
        (
            "charger_state_limits",
            &[
                "chrgr_output_current",
                "chrgr_temp",
                "chrgr_hardware_error_status",
                "chrgr_input_voltage_error_status",
                "chrgr_communication_error_status",
            ],
        ),
        ("EPAS_oe_response_state_limits", &["ECUTemperature"]),
    ];
    table
        .iter()
        .map(|(name, fields)| MeasurementGroupConfig {
            name: (*name).to_owned(),
            fields: fields.iter().map(|field| (*field).to_owned()).collect(),
        })
        .collect()
}

fn default_low_soc_hour() -> u32 {
    10
}

fn default_rapid_drop_hour() -> u32 {
    12
}

fn default_rapid_drop_minute() -> u32 {
    30
}

fn default_high_temp_hour() -> u32 {
    14
}

fn default_low_temp_hour() -> u32 {
    2
}

fn default_low_cell_voltage_hour() -> u32 {
    8
}

fn default_anomaly_probability() -> f64 {
    0.2
}

fn default_fault_probability() -> f64 {
    0.005
}

fn default_logging_directory() -> Option<PathBuf> {
    None
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for a seeding run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub influxdb: InfluxConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub anomalies: AnomalyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where a [`SeedConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedSeedConfig {
    pub config: SeedConfig,
    /// `None` when no file was found and the built-in defaults apply.
    pub source: Option<PathBuf>,
}

impl SeedConfig {
    pub const ENV_CONFIG_PATH: &'static str = "R_EVT_CONFIG";
    pub const DEFAULT_CANDIDATES: [&'static str; 2] =
        ["r-evt-seed.toml", "configs/r-evt-seed.toml"];

    /// Load configuration, respecting the `R_EVT_CONFIG` override.
    ///
    /// Falls back to the built-in defaults when neither the override nor any
    /// candidate exists; the defaults carry placeholder credentials, so a run
    /// against InfluxDB still requires them to be supplied.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedSeedConfig, ConfigError> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedSeedConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedSeedConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!("no configuration file found; using built-in defaults");
        Ok(LoadedSeedConfig {
            config: Self::default(),
            source: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// Validate generation and anomaly invariants. Credentials are checked
    /// separately by [`InfluxConfig::validate`] since dry runs never use them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;
        self.anomalies.validate()
    }
}

impl std::str::FromStr for SeedConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: SeedConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Connection settings for the InfluxDB v2 write endpoint.
#[serde_as]
#[derive(Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    #[serde(default = "default_influx_url")]
    pub url: String,
    #[serde(default = "default_influx_token")]
    pub token: String,
    #[serde(default = "default_influx_org")]
    pub org: String,
    #[serde(default = "default_influx_bucket")]
    pub bucket: String,
    #[serde(default = "default_write_timeout", rename = "timeout_secs")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: default_influx_url(),
            token: default_influx_token(),
            org: default_influx_org(),
            bucket: default_influx_bucket(),
            timeout: default_write_timeout(),
        }
    }
}

impl fmt::Debug for InfluxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl InfluxConfig {
    /// Reject unset or template credentials before any work begins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("url", &self.url),
            ("token", &self.token),
            ("org", &self.org),
            ("bucket", &self.bucket),
        ];
        for (field, value) in fields {
            let value = value.trim();
            if value.is_empty() {
                return Err(ConfigError::Missing { field });
            }
            if is_placeholder(value) {
                return Err(ConfigError::Placeholder { field });
            }
        }
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason,
        };
        let url = Url::parse(self.url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".into()));
        }
        Ok(())
    }
}

fn is_placeholder(value: &str) -> bool {
    value.contains(PLACEHOLDER_MARKER) || PLACEHOLDER_VALUES.contains(&value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementGroupConfig {
    pub name: String,
    pub fields: Vec<String>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_vehicles")]
    pub vehicles: Vec<String>,
    #[serde(default = "default_start")]
    pub start: DateTime<Utc>,
    #[serde(default = "default_end")]
    pub end: DateTime<Utc>,
    #[serde(default = "default_step", rename = "step_secs")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub step: Duration,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_measurements")]
    pub measurements: Vec<MeasurementGroupConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            vehicles: default_vehicles(),
            start: default_start(),
            end: default_end(),
            step: default_step(),
            seed: None,
            measurements: default_measurements(),
        }
    }
}

impl GenerationConfig {
    pub fn window(&self) -> GenerationWindow {
        GenerationWindow::new(self.start, self.end, self.step)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step.is_zero() {
            return Err(ConfigError::InvalidStep);
        }
        if self.vehicles.is_empty() {
            return Err(ConfigError::EmptyVehicles);
        }
        for (index, vehicle) in self.vehicles.iter().enumerate() {
            if vehicle.trim().is_empty() || vehicle.chars().any(char::is_control) {
                return Err(ConfigError::InvalidVehicleId {
                    vehicle: vehicle.clone(),
                });
            }
            if self.vehicles[..index].contains(vehicle) {
                return Err(ConfigError::DuplicateVehicle {
                    vehicle: vehicle.clone(),
                });
            }
        }
        if self.measurements.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for (index, group) in self.measurements.iter().enumerate() {
            if group.fields.is_empty() {
                return Err(ConfigError::EmptyGroup {
                    group: group.name.clone(),
                });
            }
            if self.measurements[..index]
                .iter()
                .any(|earlier| earlier.name == group.name)
            {
                return Err(ConfigError::DuplicateGroup {
                    group: group.name.clone(),
                });
            }
            for (position, field) in group.fields.iter().enumerate() {
                if group.fields[..position].contains(field) {
                    return Err(ConfigError::DuplicateField {
                        group: group.name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Hours (UTC) and probabilities that drive anomaly injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default = "default_low_soc_hour")]
    pub low_soc_hour: u32,
    #[serde(default = "default_rapid_drop_hour")]
    pub rapid_drop_hour: u32,
    #[serde(default = "default_rapid_drop_minute")]
    pub rapid_drop_minute: u32,
    #[serde(default = "default_high_temp_hour")]
    pub high_temp_hour: u32,
    #[serde(default = "default_low_temp_hour")]
    pub low_temp_hour: u32,
    #[serde(default = "default_low_cell_voltage_hour")]
    pub low_cell_voltage_hour: u32,
    #[serde(default = "default_anomaly_probability")]
    pub anomaly_probability: f64,
    #[serde(default = "default_fault_probability")]
    pub fault_probability: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            low_soc_hour: default_low_soc_hour(),
            rapid_drop_hour: default_rapid_drop_hour(),
            rapid_drop_minute: default_rapid_drop_minute(),
            high_temp_hour: default_high_temp_hour(),
            low_temp_hour: default_low_temp_hour(),
            low_cell_voltage_hour: default_low_cell_voltage_hour(),
            anomaly_probability: default_anomaly_probability(),
            fault_probability: default_fault_probability(),
        }
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hours = [
            ("low_soc_hour", self.low_soc_hour),
            ("rapid_drop_hour", self.rapid_drop_hour),
            ("high_temp_hour", self.high_temp_hour),
            ("low_temp_hour", self.low_temp_hour),
            ("low_cell_voltage_hour", self.low_cell_voltage_hour),
        ];
        for (name, hour) in hours {
            if hour > 23 {
                return Err(ConfigError::InvalidAnomaly(format!(
                    "{name} must be within 0..=23, got {hour}"
                )));
            }
        }
        if self.rapid_drop_minute > 59 {
            return Err(ConfigError::InvalidAnomaly(format!(
                "rapid_drop_minute must be within 0..=59, got {}",
                self.rapid_drop_minute
            )));
        }
        let probabilities = [
            ("anomaly_probability", self.anomaly_probability),
            ("fault_probability", self.fault_probability),
        ];
        for (name, probability) in probabilities {
            if !(0.0..=1.0).contains(&probability) {
                return Err(ConfigError::InvalidAnomaly(format!(
                    "{name} must be within 0.0..=1.0, got {probability}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Optional directory for a daily rolling JSON log file.
    #[serde(default = "default_logging_directory")]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_influx() -> InfluxConfig {
        InfluxConfig {
            url: "http://localhost:8086".into(),
            token: "secret-token".into(),
            org: "fleet".into(),
            bucket: "telemetry".into(),
            ..InfluxConfig::default()
        }
    }

    #[test]
    fn defaults_match_reference_dataset() {
        let config = SeedConfig::default();
        config.validate().expect("defaults are valid");
        assert_eq!(config.generation.vehicles, vec!["vehicle_A", "vehicle_B"]);
        assert_eq!(config.generation.measurements.len(), 12);
        assert_eq!(config.generation.step, Duration::from_secs(300));
        assert_eq!(config.generation.window().tick_count(), 12);
        assert_eq!(config.generation.measurements[0].name, "bms_battery_weather");
    }

    #[test]
    fn default_credentials_are_placeholders() {
        let err = InfluxConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Placeholder { field: "token" }));
        assert!(err.to_string().contains("INFLUXDB_TOKEN"));
    }

    #[test]
    fn placeholder_url_is_rejected() {
        let influx = InfluxConfig {
            url: "https://YOUR_INFLUXDB_CLOUD_URL".into(),
            ..valid_influx()
        };
        assert!(matches!(
            influx.validate(),
            Err(ConfigError::Placeholder { field: "url" })
        ));
    }

    #[test]
    fn blank_credentials_are_missing() {
        let influx = InfluxConfig {
            bucket: "  ".into(),
            ..valid_influx()
        };
        assert!(matches!(
            influx.validate(),
            Err(ConfigError::Missing { field: "bucket" })
        ));
    }

    #[test]
    fn malformed_url_is_rejected() {
        let influx = InfluxConfig {
            url: "not a url".into(),
            ..valid_influx()
        };
        assert!(matches!(
            influx.validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", valid_influx());
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: SeedConfig = r#"
            [influxdb]
            url = "http://localhost:8086"
            token = "abc"
            org = "fleet"
            bucket = "ev"
            timeout_secs = 5

            [generation]
            vehicles = ["van-1"]
            start = "2025-08-05T10:00:00Z"
            end = "2025-08-05T11:00:00Z"
            step_secs = 60
            seed = 7

            [[generation.measurements]]
            name = "bms_battery_weather"
            fields = ["battery_soc", "battery_highest_temp"]

            [anomalies]
            fault_probability = 0.5
        "#
        .parse()
        .expect("valid toml");

        config.influxdb.validate().expect("credentials set");
        assert_eq!(config.influxdb.timeout, Duration::from_secs(5));
        assert_eq!(config.generation.vehicles, vec!["van-1"]);
        assert_eq!(config.generation.step, Duration::from_secs(60));
        assert_eq!(config.generation.seed, Some(7));
        assert_eq!(config.generation.measurements.len(), 1);
        assert_eq!(config.generation.window().tick_count(), 60);
        assert_eq!(config.anomalies.fault_probability, 0.5);
        assert_eq!(config.anomalies.low_soc_hour, 10);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn zero_step_is_rejected() {
        let err = "[generation]\nstep_secs = 0\n"
            .parse::<SeedConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStep));
    }

    #[test]
    fn empty_and_duplicate_groups_are_rejected() {
        let mut generation = GenerationConfig::default();
        generation.measurements[1].fields.clear();
        assert!(matches!(
            generation.validate(),
            Err(ConfigError::EmptyGroup { group }) if group == "bms_battery_health"
        ));

        let mut generation = GenerationConfig::default();
        let first = generation.measurements[0].clone();
        generation.measurements.push(first);
        assert!(matches!(
            generation.validate(),
            Err(ConfigError::DuplicateGroup { .. })
        ));
    }

    #[test]
    fn duplicate_and_blank_vehicles_are_rejected() {
        let mut generation = GenerationConfig::default();
        generation.vehicles = vec!["vehicle_A".into(), "vehicle_A".into()];
        assert!(matches!(
            generation.validate(),
            Err(ConfigError::DuplicateVehicle { vehicle }) if vehicle == "vehicle_A"
        ));

        for bad in ["", "   ", "vehicle\nB"] {
            let mut generation = GenerationConfig::default();
            generation.vehicles = vec!["vehicle_A".into(), bad.into()];
            assert!(
                matches!(
                    generation.validate(),
                    Err(ConfigError::InvalidVehicleId { .. })
                ),
                "{bad:?} accepted"
            );
        }
    }

    #[test]
    fn repeated_field_in_group_is_rejected() {
        let mut generation = GenerationConfig::default();
        generation.measurements[0]
            .fields
            .push("battery_soc".into());
        assert!(matches!(
            generation.validate(),
            Err(ConfigError::DuplicateField { group, field })
                if group == "bms_battery_weather" && field == "battery_soc"
        ));
    }

    #[test]
    fn non_http_urls_are_rejected() {
        for url in ["mailto:ops@example.com", "ftp://influx.example.com/"] {
            let influx = InfluxConfig {
                url: url.into(),
                ..valid_influx()
            };
            assert!(
                matches!(influx.validate(), Err(ConfigError::InvalidUrl { .. })),
                "{url} accepted"
            );
        }
        let influx = InfluxConfig {
            url: "https://influx.example.com/proxy".into(),
            ..valid_influx()
        };
        influx.validate().expect("https with path prefix");
    }

    #[test]
    fn anomaly_schedule_bounds_are_enforced() {
        let anomalies = AnomalyConfig {
            high_temp_hour: 24,
            ..AnomalyConfig::default()
        };
        assert!(matches!(
            anomalies.validate(),
            Err(ConfigError::InvalidAnomaly(_))
        ));

        let anomalies = AnomalyConfig {
            anomaly_probability: 1.5,
            ..AnomalyConfig::default()
        };
        assert!(anomalies.validate().is_err());
    }

    #[test]
    fn load_prefers_first_existing_candidate() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[generation]\nvehicles = [\"truck-9\"]").unwrap();
        file.flush().unwrap();

        let missing = PathBuf::from("definitely/not/here.toml");
        let loaded = SeedConfig::load(&[missing, file.path().to_path_buf()]).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.generation.vehicles, vec!["truck-9"]);
    }

    #[test]
    fn load_without_candidates_uses_defaults() {
        let loaded = SeedConfig::load::<PathBuf>(&[]).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.generation.measurements.len(), 12);
    }
}
