//! Observability for the help desk.
//!
//! Structured logging goes through `tracing`; counters and gauges go through
//! the `metrics` facade. No exporter is installed by this crate, so metrics
//! are no-ops unless the host installs a recorder.
//!
//! | Metric | Type | Purpose |
//! |--------|------|---------|
//! | `hd_requests_total` | Counter | Students admitted into the priority queue |
//! | `hd_sessions_total` | Counter | Completed tutoring sessions |
//! | `hd_chair_misses_total` | Counter | Help requests that found no free chair |
//! | `hd_free_chairs` | Gauge | Free waiting-room chairs |
//! | `hd_students_waiting` | Gauge | Priority queue length |
//! | `hd_sessions_active` | Gauge | Sessions in progress |
//! | `hd_students_active` | Gauge | Students that still need visits |
//! | `hd_wait_seconds` | Histogram | Request to dispatch latency |
//! | `hd_session_seconds` | Histogram | Tutoring session length |

pub mod metrics;

pub use metrics::{
    record_chair_miss, record_request, record_session_completed, record_session_duration,
    record_wait_duration, set_free_chairs, set_sessions_active, set_students_active,
    set_students_waiting,
};
