//! Metric definitions for the help desk.
//!
//! All metrics follow Prometheus naming conventions:
//! - `hd_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! No labels carry student or tutor ids, keeping cardinality constant.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// ============================================================================
// Counters
// ============================================================================

/// A student was moved from the admission queue into the priority queue.
///
/// Metric: `hd_requests_total`
pub fn record_request() {
    counter!("hd_requests_total").increment(1);
}

/// A tutoring session completed.
///
/// Metric: `hd_sessions_total`
pub fn record_session_completed() {
    counter!("hd_sessions_total").increment(1);
}

/// A help request found every chair taken.
///
/// Metric: `hd_chair_misses_total`
pub fn record_chair_miss() {
    counter!("hd_chair_misses_total").increment(1);
}

// ============================================================================
// Gauges
// ============================================================================

/// Metric: `hd_free_chairs`
pub fn set_free_chairs(free: u32) {
    gauge!("hd_free_chairs").set(f64::from(free));
}

/// Metric: `hd_students_waiting`
pub fn set_students_waiting(waiting: usize) {
    // usize to f64 conversion is safe for realistic queue lengths (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("hd_students_waiting").set(waiting as f64);
}

/// Metric: `hd_sessions_active`
pub fn set_sessions_active(in_session: u32) {
    gauge!("hd_sessions_active").set(f64::from(in_session));
}

/// Metric: `hd_students_active`
pub fn set_students_active(active: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("hd_students_active").set(active as f64);
}

// ============================================================================
// Histograms
// ============================================================================

/// Time from a student's help request to a tutor picking it up.
///
/// Metric: `hd_wait_seconds`
pub fn record_wait_duration(waited: Duration) {
    histogram!("hd_wait_seconds").record(waited.as_secs_f64());
}

/// Length of one tutoring session.
///
/// Metric: `hd_session_seconds`
pub fn record_session_duration(duration: Duration) {
    histogram!("hd_session_seconds").record(duration.as_secs_f64());
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    // Without a recorder the facade is a no-op; these must never panic.
    #[test]
    fn test_recording_without_recorder() {
        record_request();
        record_session_completed();
        record_chair_miss();
        set_free_chairs(0);
        set_students_waiting(3);
        set_sessions_active(1);
        set_students_active(10);
        record_wait_duration(Duration::from_micros(250));
        record_session_duration(Duration::from_micros(200));
    }

    #[test]
    fn test_metric_names_with_local_recorder() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_request();
            record_request();
            record_session_completed();
            record_chair_miss();
            set_free_chairs(2);
            set_students_waiting(1);
            set_sessions_active(1);
            set_students_active(4);
            record_wait_duration(Duration::from_millis(3));
            record_session_duration(Duration::from_millis(1));
        });

        let recorded = snapshotter.snapshot().into_vec();
        let names: Vec<String> = recorded
            .iter()
            .map(|(key, _, _, _)| key.key().name().to_string())
            .collect();

        for expected in [
            "hd_requests_total",
            "hd_sessions_total",
            "hd_chair_misses_total",
            "hd_free_chairs",
            "hd_students_waiting",
            "hd_sessions_active",
            "hd_students_active",
            "hd_wait_seconds",
            "hd_session_seconds",
        ] {
            assert!(
                names.iter().any(|n| n == expected),
                "missing metric {expected}, got {names:?}"
            );
        }

        let requests = recorded
            .iter()
            .find(|(key, _, _, _)| key.key().name() == "hd_requests_total")
            .map(|(_, _, _, value)| value)
            .unwrap();
        assert!(matches!(requests, DebugValue::Counter(2)));
    }
}
