//! Simulated work and tutoring periods.
//!
//! Durations are a policy injected into the actors, not part of the
//! coordination protocol. Any source works as long as it returns promptly.

use crate::config::Config;
use common::types::{StudentId, TutorId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Supplies how long each simulated phase lasts.
pub trait DurationSource: Send + Sync {
    /// Productive period before a student's `visit`-th help request.
    fn work_period(&self, student: StudentId, visit: u32) -> Duration;

    /// Length of a tutor's `session`-th session.
    fn tutoring_period(&self, tutor: TutorId, session: u64) -> Duration;
}

/// Uniformly random periods in `[0, max]`, at microsecond resolution.
///
/// With a seed, each draw depends only on the seed, the actor and the
/// iteration, so a run's periods do not depend on scheduling order.
#[derive(Debug, Clone)]
pub struct UniformDurations {
    max_work: Duration,
    max_tutoring: Duration,
    seed: Option<u64>,
}

/// Separates the tutor draw streams from the student ones.
const TUTOR_STREAM: u64 = 1 << 32;

impl UniformDurations {
    #[must_use]
    pub fn new(max_work: Duration, max_tutoring: Duration) -> Self {
        Self {
            max_work,
            max_tutoring,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bounds and seed taken from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let durations = Self::new(config.max_work_period, config.max_tutoring_period);
        match config.seed {
            Some(seed) => durations.with_seed(seed),
            None => durations,
        }
    }

    fn sample(&self, max: Duration, stream: u64, iteration: u64) -> Duration {
        let max_micros = u64::try_from(max.as_micros()).unwrap_or(u64::MAX);
        if max_micros == 0 {
            return Duration::ZERO;
        }
        let micros = match self.seed {
            Some(seed) => {
                StdRng::seed_from_u64(mix(seed, stream, iteration)).gen_range(0..=max_micros)
            }
            None => rand::thread_rng().gen_range(0..=max_micros),
        };
        Duration::from_micros(micros)
    }
}

impl DurationSource for UniformDurations {
    fn work_period(&self, student: StudentId, visit: u32) -> Duration {
        self.sample(self.max_work, u64::from(student.0), u64::from(visit))
    }

    fn tutoring_period(&self, tutor: TutorId, session: u64) -> Duration {
        self.sample(self.max_tutoring, TUTOR_STREAM | u64::from(tutor.0), session)
    }
}

fn mix(seed: u64, stream: u64, iteration: u64) -> u64 {
    seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ iteration.rotate_left(29)
}

/// The same periods every time. `FixedDurations::zero()` runs the protocol
/// as fast as the scheduler allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDurations {
    pub work: Duration,
    pub tutoring: Duration,
}

impl FixedDurations {
    #[must_use]
    pub fn new(work: Duration, tutoring: Duration) -> Self {
        Self { work, tutoring }
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }
}

impl DurationSource for FixedDurations {
    fn work_period(&self, _student: StudentId, _visit: u32) -> Duration {
        self.work
    }

    fn tutoring_period(&self, _tutor: TutorId, _session: u64) -> Duration {
        self.tutoring
    }
}
