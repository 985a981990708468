//! # Help Desk Test Utilities
//!
//! Shared fixtures and assertions for help desk tests.
//!
//! ## Modules
//!
//! - `fixtures` - Pre-configured desks with deterministic durations
//! - `recording_sink` - Event sink that keeps every event for inspection
//! - `assertions` - Checks over a recorded event log
//! - `logs` - Captures formatted tracing output for a test
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hd_test_utils::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_example() {
//!     let sink = RecordingSink::new();
//!     let report = TestDesk::new(3, 1, 1, 1)
//!         .run_with(sink.clone())
//!         .await
//!         .unwrap();
//!
//!     sink.events()
//!         .assert_chairs_within(1)
//!         .assert_each_student_helped(3, 1);
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod logs;
pub mod recording_sink;

pub use assertions::EventLogAssertions;
pub use fixtures::{test_config, TestDesk};
pub use logs::CapturedLogs;
pub use recording_sink::RecordingSink;
