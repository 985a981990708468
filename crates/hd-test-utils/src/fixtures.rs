//! Pre-configured desks for tests.
//!
//! Fixtures default to fixed durations so runs are fast and, under a paused
//! tokio clock, deterministic in virtual time.

use crate::recording_sink::RecordingSink;
use help_desk::config::{Config, DeskCounts};
use help_desk::desk::{
    DurationSource, FewestVisitsFirst, FixedDurations, HelpDesk, PriorityPolicy, SimulationReport,
};
use help_desk::errors::HelpDeskError;
use std::sync::Arc;
use std::time::Duration;

/// A validated configuration with a fixed run id and default tunables.
///
/// # Panics
///
/// If the counts are rejected by validation.
#[must_use]
pub fn test_config(students: u32, tutors: u32, chairs: u32, visits: u32) -> Config {
    let mut config = Config::from_counts(DeskCounts::new(
        i64::from(students),
        i64::from(tutors),
        i64::from(chairs),
        i64::from(visits),
    ))
    .expect("test counts should be valid");
    config.run_id = "hd-test".to_string();
    config
}

/// Builder for a desk under test.
pub struct TestDesk {
    config: Config,
    durations: Arc<dyn DurationSource>,
    policy: Arc<dyn PriorityPolicy>,
}

impl TestDesk {
    /// A desk with 1ms of work and 1ms of tutoring per cycle.
    #[must_use]
    pub fn new(students: u32, tutors: u32, chairs: u32, visits: u32) -> Self {
        Self {
            config: test_config(students, tutors, chairs, visits),
            durations: Arc::new(FixedDurations::new(
                Duration::from_millis(1),
                Duration::from_millis(1),
            )),
            policy: Arc::new(FewestVisitsFirst),
        }
    }

    #[must_use]
    pub fn with_durations(mut self, durations: impl DurationSource + 'static) -> Self {
        self.durations = Arc::new(durations);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: impl PriorityPolicy + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.config.run_deadline = Some(deadline);
        self
    }

    /// Build the desk, recording events into `sink`.
    #[must_use]
    pub fn build(&self, sink: RecordingSink) -> HelpDesk {
        HelpDesk::builder(self.config.clone())
            .durations(Arc::clone(&self.durations))
            .policy(Arc::clone(&self.policy))
            .sink(Arc::new(sink))
            .build()
    }

    /// Run to completion, recording events into `sink`.
    ///
    /// # Errors
    ///
    /// Whatever the run returns.
    pub async fn run_with(&self, sink: RecordingSink) -> Result<SimulationReport, HelpDeskError> {
        self.build(sink).run().await
    }
}
