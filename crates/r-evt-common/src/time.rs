//! ---
//! evt_section: "01-core-functionality"
//! evt_subsection: "module"
//! evt_type: "source"
//! evt_scope: "code"
//! evt_description: "Shared primitives and utilities for the telemetry seeder."
//! evt_version: "v0.1.0"
//! evt_owner: "tbd"
//! ---
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Half-open `[start, end)` interval sampled every `step`.
///
/// A window whose start is not before its end yields no timestamps. A zero
/// step is rejected by configuration validation, but the window itself also
/// treats it as empty so iteration always terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: Duration,
}

impl GenerationWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Self {
        Self { start, end, step }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end || self.step.is_zero()
    }

    /// Number of timestamps in the window, `ceil((end - start) / step)`.
    pub fn tick_count(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let span = match (self.end - self.start).to_std() {
            Ok(span) => span.as_nanos(),
            Err(_) => return 0,
        };
        let ticks = span.div_ceil(self.step.as_nanos());
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Ascending timestamps `start + k * step` strictly before `end`.
    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> {
        let end = self.end;
        let step = TimeDelta::from_std(self.step).ok();
        let first = (!self.is_empty()).then_some(self.start);
        std::iter::successors(first, move |current| {
            step.and_then(|step| current.checked_add_signed(step))
        })
        .take_while(move |timestamp| *timestamp < end)
    }

    /// Time since the window start, saturating at zero for earlier instants.
    pub fn elapsed(&self, at: DateTime<Utc>) -> Duration {
        (at - self.start).to_std().unwrap_or_default()
    }
}
