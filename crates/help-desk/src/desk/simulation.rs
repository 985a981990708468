//! `HelpDesk` - builds the shared state, launches every actor and collects
//! the outcome.
//!
//! Launch order is coordinator, tutors, then students. Each actor runs as
//! its own task; the first root-cause failure cancels the rest and is
//! returned. A run that completes normally is checked for residual state
//! (occupied chairs, queued students, open sessions) before its report is
//! handed back.

use super::area::{AreaSnapshot, WaitingArea};
use super::context::DeskContext;
use super::coordinator::{CoordinatorActor, CoordinatorSummary};
use super::durations::{DurationSource, UniformDurations};
use super::events::{EventSink, TracingEventSink};
use super::ledger::{LedgerSnapshot, SessionLedger};
use super::messages::Roster;
use super::queues::{FewestVisitsFirst, PriorityPolicy};
use super::shutdown::ActiveStudents;
use super::student::{StudentActor, StudentSummary};
use super::tutor::{TutorActor, TutorSummary};
use crate::config::Config;
use crate::errors::{invariant, HelpDeskError};

use chrono::{DateTime, Utc};
use common::types::{StudentId, TutorId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Everything observable about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub policy: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub num_students: u32,
    pub num_tutors: u32,
    pub num_chairs: u32,
    pub visits_per_student: u32,
    pub ledger: LedgerSnapshot,
    pub area: AreaSnapshot,
    pub coordinator: CoordinatorSummary,
    /// Ordered by tutor id.
    pub tutors: Vec<TutorSummary>,
    /// Ordered by student id.
    pub students: Vec<StudentSummary>,
}

impl SimulationReport {
    /// Sessions the run was required to deliver.
    #[must_use]
    pub fn expected_sessions(&self) -> u64 {
        u64::from(self.num_students) * u64::from(self.visits_per_student)
    }

    #[must_use]
    pub fn student(&self, id: StudentId) -> Option<&StudentSummary> {
        self.students.iter().find(|s| s.student == id)
    }

    #[must_use]
    pub fn tutor(&self, id: TutorId) -> Option<&TutorSummary> {
        self.tutors.iter().find(|t| t.tutor == id)
    }

    /// Check that nothing was left behind when every actor returned.
    ///
    /// # Errors
    ///
    /// `InvariantViolated` naming the first residual found.
    pub fn verify_quiescent(&self) -> Result<(), HelpDeskError> {
        if self.area.free_chairs != self.area.total_chairs {
            return Err(invariant(format!(
                "{} of {} chairs still occupied at exit",
                self.area.total_chairs - self.area.free_chairs,
                self.area.total_chairs
            )));
        }
        if self.area.admission_len != 0 || !self.area.waiting.is_empty() {
            return Err(invariant(format!(
                "students still queued at exit: {} admitted, {} waiting",
                self.area.admission_len,
                self.area.waiting.len()
            )));
        }
        if self.ledger.in_session != 0 {
            return Err(invariant(format!(
                "{} sessions still open at exit",
                self.ledger.in_session
            )));
        }
        if self.ledger.total_sessions != self.expected_sessions() {
            return Err(invariant(format!(
                "delivered {} sessions, expected {}",
                self.ledger.total_sessions,
                self.expected_sessions()
            )));
        }
        if let Some(short) = self
            .students
            .iter()
            .find(|s| s.sessions_completed != self.visits_per_student)
        {
            return Err(invariant(format!(
                "student {} completed {} of {} sessions",
                short.student, short.sessions_completed, self.visits_per_student
            )));
        }
        Ok(())
    }
}

/// Builder for [`HelpDesk`].
pub struct HelpDeskBuilder {
    config: Config,
    durations: Option<Arc<dyn DurationSource>>,
    policy: Arc<dyn PriorityPolicy>,
    sink: Arc<dyn EventSink>,
}

impl HelpDeskBuilder {
    /// Replace the random duration source.
    #[must_use]
    pub fn durations(mut self, durations: Arc<dyn DurationSource>) -> Self {
        self.durations = Some(durations);
        self
    }

    /// Replace the priority ordering.
    #[must_use]
    pub fn policy(mut self, policy: Arc<dyn PriorityPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the event sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn build(self) -> HelpDesk {
        let durations = self
            .durations
            .unwrap_or_else(|| Arc::new(UniformDurations::from_config(&self.config)));
        HelpDesk {
            config: self.config,
            durations,
            policy: self.policy,
            sink: self.sink,
        }
    }
}

/// A configured, not yet started, help desk.
pub struct HelpDesk {
    config: Config,
    durations: Arc<dyn DurationSource>,
    policy: Arc<dyn PriorityPolicy>,
    sink: Arc<dyn EventSink>,
}

enum ActorOutcome {
    Coordinator(CoordinatorSummary),
    Tutor(TutorSummary),
    Student(StudentSummary),
}

impl HelpDesk {
    /// Start building a desk with random durations, the fewest-visits-first
    /// policy and tracing output.
    #[must_use]
    pub fn builder(config: Config) -> HelpDeskBuilder {
        HelpDeskBuilder {
            config,
            durations: None,
            policy: Arc::new(FewestVisitsFirst),
            sink: Arc::new(TracingEventSink),
        }
    }

    /// Run the simulation to completion.
    ///
    /// # Errors
    ///
    /// The first root-cause error reported by any actor, `DeadlineExceeded`
    /// if the configured bound elapsed, or `InvariantViolated` if state was
    /// left behind after a normal finish.
    #[instrument(skip_all, name = "hd.run", fields(run_id = %self.config.run_id))]
    pub async fn run(self) -> Result<SimulationReport, HelpDeskError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let config = &self.config;

        info!(
            target: "hd.run",
            students = config.num_students,
            tutors = config.num_tutors,
            chairs = config.num_chairs,
            visits_per_student = config.visits_per_student,
            policy = self.policy.name(),
            "Help desk opening"
        );

        let cancel = CancellationToken::new();
        let area = WaitingArea::new(config.num_chairs, Arc::clone(&self.policy));
        let ledger = SessionLedger::new(config.num_tutors);
        let active = ActiveStudents::new(config.num_students as usize);
        let (roster, receivers) = Roster::new(config.num_students);

        let ctx = DeskContext {
            area: Arc::clone(&area),
            ledger: Arc::clone(&ledger),
            active,
            roster: Arc::new(roster),
            durations: Arc::clone(&self.durations),
            sink: Arc::clone(&self.sink),
            cancel: cancel.clone(),
            num_tutors: config.num_tutors,
        };

        let mut actors = JoinSet::new();
        let coordinator = CoordinatorActor::new(ctx.clone());
        actors.spawn(async move { coordinator.run().await.map(ActorOutcome::Coordinator) });
        for id in 0..config.num_tutors {
            let tutor = TutorActor::new(TutorId(id), ctx.clone());
            actors.spawn(async move { tutor.run().await.map(ActorOutcome::Tutor) });
        }
        for (id, notices) in (0..config.num_students).zip(receivers) {
            let student =
                StudentActor::new(StudentId(id), config.visits_per_student, ctx.clone(), notices);
            actors.spawn(async move { student.run().await.map(ActorOutcome::Student) });
        }
        drop(ctx);

        let mut coordinator = None;
        let mut tutors = Vec::with_capacity(config.num_tutors as usize);
        let mut students = Vec::with_capacity(config.num_students as usize);
        let mut failure: Option<HelpDeskError> = None;

        let deadline = config.run_deadline;
        let expiry = async {
            match deadline {
                Some(bound) => tokio::time::sleep(bound).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expiry);
        let mut expired = false;

        loop {
            tokio::select! {
                () = &mut expiry, if !expired => {
                    expired = true;
                    let bound = deadline.unwrap_or_default();
                    warn!(target: "hd.run", deadline = ?bound, "Run deadline elapsed, cancelling actors");
                    note_failure(&mut failure, HelpDeskError::DeadlineExceeded(bound));
                    cancel.cancel();
                }
                joined = actors.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok(Ok(ActorOutcome::Coordinator(summary))) => coordinator = Some(summary),
                        Ok(Ok(ActorOutcome::Tutor(summary))) => tutors.push(summary),
                        Ok(Ok(ActorOutcome::Student(summary))) => students.push(summary),
                        Ok(Err(e)) => {
                            if !e.is_secondary() {
                                error!(target: "hd.run", error = %e, "Actor failed, cancelling run");
                            }
                            note_failure(&mut failure, e);
                            cancel.cancel();
                        }
                        Err(join_error) => {
                            error!(target: "hd.run", error = %join_error, "Actor task failed, cancelling run");
                            note_failure(&mut failure, HelpDeskError::ActorPanicked(join_error.to_string()));
                            cancel.cancel();
                        }
                    }
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        let coordinator =
            coordinator.ok_or_else(|| invariant("coordinator exited without a summary"))?;
        tutors.sort_by_key(|t| t.tutor);
        students.sort_by_key(|s| s.student);

        let report = SimulationReport {
            run_id: config.run_id.clone(),
            policy: self.policy.name(),
            started_at,
            finished_at: Utc::now(),
            elapsed: clock.elapsed(),
            num_students: config.num_students,
            num_tutors: config.num_tutors,
            num_chairs: config.num_chairs,
            visits_per_student: config.visits_per_student,
            ledger: ledger.snapshot().await,
            area: area.snapshot().await,
            coordinator,
            tutors,
            students,
        };
        report.verify_quiescent()?;

        info!(
            target: "hd.run",
            total_requests = report.ledger.total_requests,
            total_sessions = report.ledger.total_sessions,
            elapsed = ?report.elapsed,
            "Help desk closed"
        );

        Ok(report)
    }
}

/// Keep the first root cause; cancellation only counts if nothing else did.
fn note_failure(slot: &mut Option<HelpDeskError>, error: HelpDeskError) {
    match slot {
        None => *slot = Some(error),
        Some(existing) if existing.is_secondary() && !error.is_secondary() => *slot = Some(error),
        Some(_) => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_note_failure_prefers_root_cause() {
        let mut slot = None;
        note_failure(&mut slot, HelpDeskError::Cancelled);
        note_failure(&mut slot, invariant("double dispatch"));
        note_failure(&mut slot, HelpDeskError::Cancelled);
        assert!(matches!(slot, Some(HelpDeskError::InvariantViolated(_))));
    }

    #[test]
    fn test_note_failure_keeps_first_root_cause() {
        let mut slot = None;
        note_failure(&mut slot, HelpDeskError::DeadlineExceeded(Duration::from_secs(1)));
        note_failure(&mut slot, invariant("late"));
        assert!(matches!(slot, Some(HelpDeskError::DeadlineExceeded(_))));
    }
}
