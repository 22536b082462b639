//! ---
//! evt_section: "11-simulation"
//! evt_subsection: "01-bootstrap"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Telemetry generator module exports and shared types."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
//! Synthetic vehicle telemetry for seeding time-series stores.
//!
//! The generator walks a [`GenerationWindow`](r_evt_common::GenerationWindow)
//! and emits one [`TelemetryRecord`] per timestamp, vehicle, and measurement
//! group. Field values follow the category rules in [`policy`], including the
//! scheduled anomalies that downstream dashboards are expected to flag.

pub mod catalog;
pub mod generator;
pub mod policy;
pub mod record;

pub use catalog::{ClassifiedField, MeasurementCatalog, MeasurementGroup};
pub use generator::{GenerationPlan, SocCarry, TelemetryGenerator};
pub use policy::{FieldCategory, FieldPolicy, SampleContext};
pub use record::{FieldValue, TelemetryRecord};
