//! Help desk configuration.
//!
//! The four run parameters (students, tutors, chairs, visits per student) come
//! from the host program, usually the command line. Tunables are loaded from
//! environment variables with sensible defaults. Validation happens here,
//! before any actor exists. Logging setup lives in
//! `common::config::ObservabilityConfig`.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// Default upper bound of a student's simulated work period (microseconds).
pub const DEFAULT_WORK_MAX_MICROS: u64 = 2_000;

/// Default upper bound of a simulated tutoring session (microseconds).
pub const DEFAULT_TUTORING_MAX_MICROS: u64 = 200;

/// Default run id prefix.
pub const DEFAULT_RUN_ID_PREFIX: &str = "hd";

/// The four required run parameters, as supplied by the host.
///
/// Signed so that negative input reaches validation instead of failing to
/// parse with a less helpful message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeskCounts {
    pub students: i64,
    pub tutors: i64,
    pub chairs: i64,
    pub visits_per_student: i64,
}

impl DeskCounts {
    #[must_use]
    pub fn new(students: i64, tutors: i64, chairs: i64, visits_per_student: i64) -> Self {
        Self {
            students,
            tutors,
            chairs,
            visits_per_student,
        }
    }
}

/// How desk events are rendered by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFormat {
    /// Structured `tracing` events.
    #[default]
    Text,
    /// One JSON object per line on stdout.
    Json,
    /// Events are discarded.
    None,
}

/// Help desk configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier attached to logs and the final report.
    pub run_id: String,

    /// Number of student actors.
    pub num_students: u32,

    /// Number of tutor actors (always > 0).
    pub num_tutors: u32,

    /// Waiting-room capacity (always > 0).
    pub num_chairs: u32,

    /// Tutoring sessions each student must complete.
    pub visits_per_student: u32,

    /// Upper bound of a simulated work period.
    pub max_work_period: Duration,

    /// Upper bound of a simulated tutoring session.
    pub max_tutoring_period: Duration,

    /// Seed for reproducible durations. `None` draws from the thread RNG.
    pub seed: Option<u64>,

    /// Abort the run if it has not finished within this bound.
    pub run_deadline: Option<Duration>,

    /// Event rendering used by the binary.
    pub event_format: EventFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Validate `counts` with every tunable at its default.
    pub fn from_counts(counts: DeskCounts) -> Result<Self, ConfigError> {
        Self::from_vars(counts, &HashMap::new())
    }

    /// Validate `counts` and load tunables from a variable map.
    ///
    /// Rejections are logged on `hd.config` before they are returned, so a
    /// host that only maps the error to an exit status still reports why.
    pub fn from_vars(
        counts: DeskCounts,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        Self::validate(counts, vars).map_err(|e| {
            error!(target: "hd.config", error = %e, "Rejected configuration; no actors started");
            e
        })
    }

    fn validate(counts: DeskCounts, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let num_tutors = positive(counts.tutors, "tutors")?;
        let num_chairs = positive(counts.chairs, "chairs")?;
        let num_students = non_negative(counts.students, "students")?;
        let visits_per_student = non_negative(counts.visits_per_student, "visits per student")?;

        if num_students == 0 {
            warn!(target: "hd.config", "No students configured; the desk will close immediately");
        }
        if visits_per_student == 0 {
            warn!(target: "hd.config", "Students need zero visits; no sessions will take place");
        }

        let max_work_period = Duration::from_micros(parse_or(
            vars,
            "HD_WORK_MAX_MICROS",
            DEFAULT_WORK_MAX_MICROS,
        )?);

        let max_tutoring_period = Duration::from_micros(parse_or(
            vars,
            "HD_TUTORING_MAX_MICROS",
            DEFAULT_TUTORING_MAX_MICROS,
        )?);

        let seed = parse_optional(vars, "HD_SEED")?;

        let run_deadline =
            parse_optional::<u64>(vars, "HD_RUN_DEADLINE_SECONDS")?.map(Duration::from_secs);

        let event_format = match vars.get("HD_EVENT_FORMAT").map(|s| s.trim().to_ascii_lowercase())
        {
            None => EventFormat::default(),
            Some(raw) => match raw.as_str() {
                "text" => EventFormat::Text,
                "json" => EventFormat::Json,
                "none" => EventFormat::None,
                other => {
                    return Err(ConfigError::InvalidValue(format!(
                        "HD_EVENT_FORMAT must be one of text, json, none; got '{other}'"
                    )))
                }
            },
        };

        let run_id = vars.get("HD_RUN_ID").cloned().unwrap_or_else(|| {
            let uuid_suffix = uuid::Uuid::new_v4().simple().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_RUN_ID_PREFIX}-{short_suffix}")
        });

        Ok(Config {
            run_id,
            num_students,
            num_tutors,
            num_chairs,
            visits_per_student,
            max_work_period,
            max_tutoring_period,
            seed,
            run_deadline,
            event_format,
        })
    }
}

fn positive(value: i64, name: &str) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::InvalidValue(format!(
            "number of {name} must be greater than 0, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| ConfigError::InvalidValue(format!("number of {name} is too large: {value}")))
}

fn non_negative(value: i64, name: &str) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::InvalidValue(format!(
            "number of {name} must not be negative, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| ConfigError::InvalidValue(format!("number of {name} is too large: {value}")))
}

fn parse_or<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_optional(vars, key)?.unwrap_or(default))
}

fn parse_optional<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    vars.get(key)
        .map(|raw| {
            raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue(format!("{key} is not a valid number: '{raw}'"))
            })
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn counts() -> DeskCounts {
        DeskCounts::new(10, 3, 4, 2)
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_counts(counts()).expect("Config should load successfully");

        assert_eq!(config.num_students, 10);
        assert_eq!(config.num_tutors, 3);
        assert_eq!(config.num_chairs, 4);
        assert_eq!(config.visits_per_student, 2);
        assert_eq!(
            config.max_work_period,
            Duration::from_micros(DEFAULT_WORK_MAX_MICROS)
        );
        assert_eq!(
            config.max_tutoring_period,
            Duration::from_micros(DEFAULT_TUTORING_MAX_MICROS)
        );
        assert_eq!(config.seed, None);
        assert_eq!(config.run_deadline, None);
        assert_eq!(config.event_format, EventFormat::Text);
        // Run id should be auto-generated
        assert!(config.run_id.starts_with("hd-"));
        assert_eq!(config.run_id.len(), "hd-".len() + 8);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("HD_WORK_MAX_MICROS".to_string(), "500".to_string()),
            ("HD_TUTORING_MAX_MICROS".to_string(), "50".to_string()),
            ("HD_SEED".to_string(), "263".to_string()),
            ("HD_RUN_DEADLINE_SECONDS".to_string(), "30".to_string()),
            ("HD_RUN_ID".to_string(), "hd-custom".to_string()),
            ("HD_EVENT_FORMAT".to_string(), "JSON".to_string()),
        ]);

        let config = Config::from_vars(counts(), &vars).expect("Config should load successfully");

        assert_eq!(config.max_work_period, Duration::from_micros(500));
        assert_eq!(config.max_tutoring_period, Duration::from_micros(50));
        assert_eq!(config.seed, Some(263));
        assert_eq!(config.run_deadline, Some(Duration::from_secs(30)));
        assert_eq!(config.run_id, "hd-custom");
        assert_eq!(config.event_format, EventFormat::Json);
    }

    #[test]
    fn test_zero_chairs_is_fatal() {
        let result = Config::from_counts(DeskCounts::new(3, 1, 0, 1));
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("chairs"))
        );
    }

    #[test]
    fn test_zero_or_negative_tutors_is_fatal() {
        for tutors in [0, -4] {
            let result = Config::from_counts(DeskCounts::new(3, tutors, 2, 1));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue(ref msg)) if msg.contains("tutors"))
            );
        }
    }

    #[test]
    fn test_negative_students_or_visits_is_fatal() {
        assert!(Config::from_counts(DeskCounts::new(-1, 1, 1, 1)).is_err());
        assert!(Config::from_counts(DeskCounts::new(1, 1, 1, -1)).is_err());
    }

    #[test]
    fn test_zero_students_and_visits_are_accepted() {
        let config = Config::from_counts(DeskCounts::new(0, 1, 1, 0)).unwrap();
        assert_eq!(config.num_students, 0);
        assert_eq!(config.visits_per_student, 0);
    }

    #[test]
    fn test_oversized_count_is_rejected() {
        let result = Config::from_counts(DeskCounts::new(i64::from(u32::MAX) + 1, 1, 1, 1));
        assert!(matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("too large")));
    }

    #[test]
    fn test_unparseable_tunable_is_rejected() {
        let vars = HashMap::from([("HD_SEED".to_string(), "abc".to_string())]);
        let result = Config::from_vars(counts(), &vars);
        assert!(matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("HD_SEED")));
    }

    #[test]
    fn test_unknown_event_format_is_rejected() {
        let vars = HashMap::from([("HD_EVENT_FORMAT".to_string(), "xml".to_string())]);
        assert!(Config::from_vars(counts(), &vars).is_err());
    }
}
