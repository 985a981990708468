//! Capture formatted tracing output for the duration of a test.
//!
//! The capture is installed as the thread-local default subscriber, so it
//! sees every event from a current-thread runtime (the `#[tokio::test]`
//! default), including events from spawned actors.

use std::io;
use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Plain-text log lines written while this value is alive.
pub struct CapturedLogs {
    buffer: SharedBuffer,
    _guard: DefaultGuard,
}

impl CapturedLogs {
    /// Start capturing everything `filter` lets through.
    #[must_use]
    pub fn install(filter: EnvFilter) -> Self {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let guard = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(move || writer.clone())
                    .with_ansi(false),
            )
            .set_default();

        Self {
            buffer,
            _guard: guard,
        }
    }

    /// Everything captured so far.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buffer.0.lock().unwrap()).into_owned()
    }

    /// Lines mentioning `needle`.
    #[must_use]
    pub fn lines_with(&self, needle: &str) -> Vec<String> {
        self.text()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_owned)
            .collect()
    }

    /// Assert that some line carries `level`, `target` and `message`.
    pub fn assert_logged(&self, level: &str, target: &str, message: &str) -> &Self {
        let found = self.lines_with(message).iter().any(|line| {
            line.contains(level) && line.contains(&format!("{target}:"))
        });
        assert!(
            found,
            "no {level} line on {target} containing {message:?}; captured:\n{}",
            self.text()
        );
        self
    }

    /// Assert that no line mentions `message`.
    pub fn assert_not_logged(&self, message: &str) -> &Self {
        let lines = self.lines_with(message);
        assert!(lines.is_empty(), "unexpected log lines: {lines:?}");
        self
    }
}
