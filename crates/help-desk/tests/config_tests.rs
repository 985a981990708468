//! Tests for what configuration problems and a normal run leave in the log
//! under the default filter.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use common::config::ObservabilityConfig;
use hd_test_utils::CapturedLogs;
use help_desk::config::{Config, ConfigError, DeskCounts};
use help_desk::desk::{FixedDurations, HelpDesk};
use tracing_subscriber::EnvFilter;

fn default_logs() -> CapturedLogs {
    CapturedLogs::install(ObservabilityConfig::default().filter())
}

#[test]
fn test_zero_students_warns() {
    let logs = default_logs();

    let config = Config::from_counts(DeskCounts::new(0, 1, 1, 1)).unwrap();
    assert_eq!(config.num_students, 0);

    logs.assert_logged("WARN", "hd.config", "No students configured")
        .assert_not_logged("zero visits");
}

#[test]
fn test_zero_visits_warns() {
    let logs = default_logs();

    Config::from_counts(DeskCounts::new(3, 1, 1, 0)).unwrap();

    logs.assert_logged("WARN", "hd.config", "Students need zero visits")
        .assert_not_logged("No students configured");
}

#[test]
fn test_rejected_counts_are_logged() {
    let logs = default_logs();

    let result = Config::from_counts(DeskCounts::new(3, 1, 0, 1));
    assert!(matches!(result, Err(ConfigError::InvalidValue(msg)) if msg.contains("chairs")));

    logs.assert_logged("ERROR", "hd.config", "Rejected configuration");
    let rejected = logs.lines_with("Rejected configuration");
    assert!(rejected[0].contains("number of chairs must be greater than 0"));
}

#[test]
fn test_valid_counts_log_nothing() {
    let logs = default_logs();

    Config::from_counts(DeskCounts::new(3, 2, 2, 1)).unwrap();

    assert!(logs.lines_with("hd.config").is_empty(), "{}", logs.text());
}

#[test]
fn test_crate_only_filter_hides_desk_targets() {
    let logs = CapturedLogs::install(EnvFilter::new("help_desk=info"));

    Config::from_counts(DeskCounts::new(0, 1, 1, 1)).unwrap();

    logs.assert_not_logged("No students configured");
}

#[tokio::test(start_paused = true)]
async fn test_default_filter_shows_event_log() {
    let logs = default_logs();

    let config = Config::from_counts(DeskCounts::new(2, 1, 2, 1)).unwrap();
    let report = HelpDesk::builder(config)
        .durations(Arc::new(FixedDurations::zero()))
        .build()
        .run()
        .await
        .unwrap();
    assert_eq!(report.expected_sessions(), 2);

    logs.assert_logged("INFO", "hd.student", "Student takes a seat")
        .assert_logged("INFO", "hd.tutor", "Tutoring session started")
        .assert_logged("INFO", "hd.student", "Student finished all visits");
}
