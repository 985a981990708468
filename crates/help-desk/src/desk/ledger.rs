//! `SessionLedger` - shared session counters.
//!
//! Reporting only: no actor ever blocks waiting for a ledger value. The
//! counters sit behind their own lock, separate from the waiting area. When
//! both are needed the waiting-area lock is taken first.

use crate::errors::{invariant, HelpDeskError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Point-in-time copy of the ledger counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    /// Students admitted into the priority queue.
    pub total_requests: u64,
    /// Tutoring sessions started.
    pub total_sessions: u64,
    /// Sessions in progress.
    pub in_session: u32,
    /// Highest `in_session` ever observed.
    pub peak_in_session: u32,
    /// Tutors currently parked waiting for a student.
    pub idle_tutors: u32,
}

#[derive(Debug, Default)]
struct LedgerCounters {
    total_requests: u64,
    total_sessions: u64,
    in_session: u32,
    peak_in_session: u32,
    idle_tutors: u32,
}

impl LedgerCounters {
    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total_requests: self.total_requests,
            total_sessions: self.total_sessions,
            in_session: self.in_session,
            peak_in_session: self.peak_in_session,
            idle_tutors: self.idle_tutors,
        }
    }
}

/// Monotonic request/session counters plus the in-session gauge.
#[derive(Debug)]
pub struct SessionLedger {
    num_tutors: u32,
    counters: Mutex<LedgerCounters>,
}

impl SessionLedger {
    /// A zeroed ledger for a desk with `num_tutors` tutors.
    #[must_use]
    pub fn new(num_tutors: u32) -> Arc<Self> {
        Arc::new(Self {
            num_tutors,
            counters: Mutex::new(LedgerCounters::default()),
        })
    }

    /// Count one admitted request; returns the new total.
    pub async fn record_request(&self) -> u64 {
        let mut counters = self.counters.lock().await;
        counters.total_requests += 1;
        counters.total_requests
    }

    /// Open a session.
    ///
    /// # Errors
    ///
    /// `InvariantViolated` if more sessions would run than there are tutors.
    pub async fn session_started(&self) -> Result<LedgerSnapshot, HelpDeskError> {
        let mut counters = self.counters.lock().await;
        if counters.in_session >= self.num_tutors {
            return Err(invariant(format!(
                "session started with {} of {} tutors already busy",
                counters.in_session, self.num_tutors
            )));
        }
        counters.in_session += 1;
        counters.total_sessions += 1;
        counters.peak_in_session = counters.peak_in_session.max(counters.in_session);
        Ok(counters.snapshot())
    }

    /// Close a session.
    ///
    /// # Errors
    ///
    /// `InvariantViolated` if no session is open.
    pub async fn session_ended(&self) -> Result<LedgerSnapshot, HelpDeskError> {
        let mut counters = self.counters.lock().await;
        counters.in_session = counters
            .in_session
            .checked_sub(1)
            .ok_or_else(|| invariant("session ended with none in progress"))?;
        Ok(counters.snapshot())
    }

    /// A tutor is about to park waiting for a student.
    pub async fn tutor_idle(&self) {
        let mut counters = self.counters.lock().await;
        counters.idle_tutors = counters.idle_tutors.saturating_add(1);
    }

    /// A parked tutor woke up.
    pub async fn tutor_busy(&self) {
        let mut counters = self.counters.lock().await;
        counters.idle_tutors = counters.idle_tutors.saturating_sub(1);
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.counters.lock().await.snapshot()
    }
}
