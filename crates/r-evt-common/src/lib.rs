//! ---
//! evt_section: "01-core-functionality"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Shared primitives and utilities for the telemetry seeder."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
//! Core shared primitives for the R-EVT seeder workspace.
//! This crate exposes configuration loading, tracing initialisation, and the
//! generation window consumed by the simulator and sink crates.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    AnomalyConfig, ConfigError, GenerationConfig, InfluxConfig, LoadedSeedConfig, LoggingConfig,
    MeasurementGroupConfig, SeedConfig,
};
pub use logging::{init_tracing, LogFormat, LogGuard};
pub use time::GenerationWindow;
