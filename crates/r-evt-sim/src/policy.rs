//! ---
//! evt_section: "11-simulation"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Field classification and value sampling rules."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use r_evt_common::AnomalyConfig;
use rand::Rng;

use crate::record::FieldValue;

const SOC_PATTERNS: &[&str] = &["soc"];
const HIGH_TEMP_PATTERNS: &[&str] = &["highest_temp", "bms_temp", "controller_temp"];
const LOW_TEMP_PATTERNS: &[&str] = &["lowest_temp", "motor_temp"];
const CELL_VOLTAGE_PATTERNS: &[&str] = &["cell_voltage"];
const FLAG_PATTERNS: &[&str] = &["fault", "error", "shutdown", "protection"];
const DISTANCE_PATTERNS: &[&str] = &["distance_travelled"];

/// Value family a field belongs to, decided once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    StateOfCharge,
    HighTemperature,
    LowTemperature,
    CellVoltage,
    Flag,
    CumulativeDistance,
    Generic,
}

impl FieldCategory {
    /// Case-insensitive substring match; the first category in declaration
    /// order wins, so `battery_soc_fault` is a state-of-charge field.
    pub fn classify(field_name: &str) -> Self {
        let name = field_name.to_ascii_lowercase();
        let rules: [(&[&str], FieldCategory); 6] = [
            (SOC_PATTERNS, FieldCategory::StateOfCharge),
            (HIGH_TEMP_PATTERNS, FieldCategory::HighTemperature),
            (LOW_TEMP_PATTERNS, FieldCategory::LowTemperature),
            (CELL_VOLTAGE_PATTERNS, FieldCategory::CellVoltage),
            (FLAG_PATTERNS, FieldCategory::Flag),
            (DISTANCE_PATTERNS, FieldCategory::CumulativeDistance),
        ];
        rules
            .iter()
            .find(|(patterns, _)| patterns.iter().any(|pattern| name.contains(pattern)))
            .map(|(_, category)| *category)
            .unwrap_or(FieldCategory::Generic)
    }
}

/// Per-record inputs the sampling rules depend on.
#[derive(Debug, Clone, Copy)]
pub struct SampleContext {
    pub timestamp: DateTime<Utc>,
    /// Offset of `timestamp` from the window start.
    pub elapsed: Duration,
    /// Last state-of-charge emitted for the same vehicle, if any.
    pub previous_soc: Option<f64>,
}

/// Baseline ranges plus the scheduled anomaly overrides.
#[derive(Debug, Clone, Default)]
pub struct FieldPolicy {
    anomalies: AnomalyConfig,
}

impl FieldPolicy {
    pub fn new(anomalies: AnomalyConfig) -> Self {
        Self { anomalies }
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        category: FieldCategory,
        ctx: &SampleContext,
        rng: &mut R,
    ) -> FieldValue {
        let hour = ctx.timestamp.hour();
        let schedule = &self.anomalies;
        match category {
            FieldCategory::StateOfCharge => FieldValue::Float(self.state_of_charge(ctx, rng)),
            FieldCategory::HighTemperature => FieldValue::Float(self.scheduled(
                rng,
                hour == schedule.high_temp_hour,
                (25.0, 40.0),
                (46.0, 55.0),
            )),
            FieldCategory::LowTemperature => FieldValue::Float(self.scheduled(
                rng,
                hour == schedule.low_temp_hour,
                (10.0, 35.0),
                (-5.0, -0.1),
            )),
            FieldCategory::CellVoltage => FieldValue::Float(self.scheduled(
                rng,
                hour == schedule.low_cell_voltage_hour,
                (3000.0, 3600.0),
                (2000.0, 2490.0),
            )),
            FieldCategory::Flag => FieldValue::flag(coin(rng, schedule.fault_probability)),
            FieldCategory::CumulativeDistance => {
                let base = ctx.elapsed.as_secs_f64() / 10.0;
                FieldValue::Float(base + rng.gen_range(0.0..5.0))
            }
            FieldCategory::Generic => FieldValue::Float(rng.gen_range(1.0..100.0)),
        }
    }

    /// Later rules override earlier ones when both fire.
    fn state_of_charge<R: Rng + ?Sized>(&self, ctx: &SampleContext, rng: &mut R) -> f64 {
        let schedule = &self.anomalies;
        let mut value = rng.gen_range(0.0..100.0);
        if ctx.timestamp.hour() == schedule.low_soc_hour
            && coin(rng, schedule.anomaly_probability)
        {
            value = rng.gen_range(5.0..9.9);
        }
        if ctx.timestamp.hour() == schedule.rapid_drop_hour
            && ctx.timestamp.minute() == schedule.rapid_drop_minute
            && coin(rng, schedule.anomaly_probability)
        {
            if let Some(previous) = ctx.previous_soc {
                value = (previous - rng.gen_range(2.0..5.0)).max(0.0);
            }
        }
        value
    }

    fn scheduled<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        in_window: bool,
        baseline: (f64, f64),
        anomaly: (f64, f64),
    ) -> f64 {
        let value = rng.gen_range(baseline.0..baseline.1);
        if in_window && coin(rng, self.anomalies.anomaly_probability) {
            return rng.gen_range(anomaly.0..anomaly.1);
        }
        value
    }
}

fn coin<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.gen::<f64>() < probability
}
