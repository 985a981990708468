//! Event sink that records everything it is given.

use help_desk::desk::{DeskEvent, EventSink};
use std::sync::{Arc, Mutex};

/// Cloneable handle to a shared event log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DeskEvent>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<DeskEvent> {
        self.events.lock().unwrap().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DeskEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &DeskEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
