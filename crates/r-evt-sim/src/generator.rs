//! ---
//! evt_section: "11-simulation"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Telemetry generator walking the configured window."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use r_evt_common::{AnomalyConfig, GenerationConfig, GenerationWindow, SeedConfig};
use rand::prelude::*;
use tracing::debug;

use crate::catalog::MeasurementCatalog;
use crate::policy::{FieldCategory, FieldPolicy, SampleContext};
use crate::record::TelemetryRecord;

/// Vehicles, measurement groups, and the window to cover.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub vehicles: Vec<String>,
    pub catalog: MeasurementCatalog,
    pub window: GenerationWindow,
}

impl GenerationPlan {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            vehicles: config.vehicles.clone(),
            catalog: MeasurementCatalog::from_config(&config.measurements),
            window: config.window(),
        }
    }

    /// `ticks * vehicles * groups`, one record per combination.
    pub fn expected_records(&self) -> u64 {
        self.window
            .tick_count()
            .saturating_mul(self.vehicles.len() as u64)
            .saturating_mul(self.catalog.len() as u64)
    }
}

/// Last state-of-charge emitted per vehicle.
///
/// Lives for a single generation run; callers stepping tick by tick with
/// [`TelemetryGenerator::generate_tick`] hand the same carry to every call.
#[derive(Debug, Clone, Default)]
pub struct SocCarry {
    last: HashMap<String, f64>,
}

impl SocCarry {
    pub fn get(&self, vehicle_id: &str) -> Option<f64> {
        self.last.get(vehicle_id).copied()
    }

    pub fn record(&mut self, vehicle_id: &str, soc: f64) {
        self.last.insert(vehicle_id.to_owned(), soc);
    }
}

/// Produces the full record set for a [`GenerationPlan`].
#[derive(Debug)]
pub struct TelemetryGenerator {
    plan: GenerationPlan,
    policy: FieldPolicy,
    rng: StdRng,
}

impl TelemetryGenerator {
    /// Without a seed the generator draws from OS entropy, so reruns differ.
    pub fn new(plan: GenerationPlan, anomalies: AnomalyConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            plan,
            policy: FieldPolicy::new(anomalies),
            rng,
        }
    }

    pub fn from_config(config: &SeedConfig) -> Self {
        Self::new(
            GenerationPlan::from_config(&config.generation),
            config.anomalies.clone(),
            config.generation.seed,
        )
    }

    pub fn plan(&self) -> &GenerationPlan {
        &self.plan
    }

    /// Timestamps ascending, then vehicles, then measurement groups.
    pub fn generate(&mut self) -> Vec<TelemetryRecord> {
        let expected = self.plan.expected_records();
        debug!(
            expected_records = expected,
            vehicles = self.plan.vehicles.len(),
            groups = self.plan.catalog.len(),
            start = %self.plan.window.start,
            end = %self.plan.window.end,
            "generating telemetry"
        );
        let mut records = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
        let mut carry = SocCarry::default();
        let window = self.plan.window;
        for timestamp in window.timestamps() {
            records.extend(self.generate_tick(timestamp, &mut carry));
        }
        records
    }

    /// Records for every vehicle and group at one timestamp.
    pub fn generate_tick(
        &mut self,
        timestamp: DateTime<Utc>,
        carry: &mut SocCarry,
    ) -> Vec<TelemetryRecord> {
        let elapsed = self.plan.window.elapsed(timestamp);
        let mut records =
            Vec::with_capacity(self.plan.vehicles.len() * self.plan.catalog.len());
        for vehicle_id in &self.plan.vehicles {
            for group in self.plan.catalog.groups() {
                let mut record = TelemetryRecord::new(group.name(), vehicle_id, timestamp);
                for field in group.fields() {
                    let ctx = SampleContext {
                        timestamp,
                        elapsed,
                        previous_soc: carry.get(vehicle_id),
                    };
                    let value = self.policy.sample(field.category, &ctx, &mut self.rng);
                    if field.category == FieldCategory::StateOfCharge {
                        carry.record(vehicle_id, value.as_f64());
                    }
                    record.fields.insert(field.name.clone(), value);
                }
                records.push(record);
            }
        }
        records
    }
}
