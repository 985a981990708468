//! `StudentActor` - alternates between working and asking for help.
//!
//! A student that finds every chair taken goes back to work and retries
//! later. A seated student waits on its private notice channel: first for a
//! tutor to start its session, then for that tutor to release it. After its last required session it decrements the
//! active count and nudges the coordinator so the shutdown check runs.

use super::area::SeatOutcome;
use super::context::DeskContext;
use super::events::DeskEvent;
use super::messages::{SessionNotice, SessionReceipt};
use super::queues::{HelpRequest, PriorityKey};
use crate::errors::{invariant, HelpDeskError};

use common::types::{StudentId, TutorId};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

/// Where a student is in its visit cycle. Traced on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StudentState {
    Working,
    RequestingHelp,
    /// Holding a chair, queued for a tutor.
    Waiting,
    /// Dispatched to a tutor, blocked until the session ends.
    BeingTutored,
    Finished,
}

/// What one student did over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub student: StudentId,
    pub sessions_completed: u32,
    /// Help requests made, including ones that found no chair.
    pub visits_attempted: u32,
    pub chair_misses: u32,
    /// Tutor of the most recent session.
    pub last_tutor: Option<TutorId>,
    /// Tutor of each session, in order.
    pub tutors: Vec<TutorId>,
}

/// One student actor.
pub struct StudentActor {
    id: StudentId,
    visits_required: u32,
    ctx: DeskContext,
    notices: mpsc::Receiver<SessionNotice>,
    state: StudentState,
    visit_count: u32,
    chair_misses: u32,
    assigned_tutor: Option<TutorId>,
    tutors: Vec<TutorId>,
}

impl StudentActor {
    #[must_use]
    pub fn new(
        id: StudentId,
        visits_required: u32,
        ctx: DeskContext,
        notices: mpsc::Receiver<SessionNotice>,
    ) -> Self {
        Self {
            id,
            visits_required,
            ctx,
            notices,
            state: StudentState::Working,
            visit_count: 0,
            chair_misses: 0,
            assigned_tutor: None,
            tutors: Vec::new(),
        }
    }

    fn sessions_completed(&self) -> u32 {
        u32::try_from(self.tutors.len()).unwrap_or(u32::MAX)
    }

    fn transition(&mut self, next: StudentState) {
        trace!(
            target: "hd.actor.student",
            student = %self.id,
            from = ?self.state,
            to = ?next,
            "State change"
        );
        self.state = next;
    }

    /// Run until the required number of sessions has been received.
    ///
    /// # Errors
    ///
    /// `Cancelled` if the run is aborted, or `InvariantViolated` if the
    /// waiting area misbehaves or session notices arrive out of order.
    #[instrument(skip_all, name = "hd.actor.student", fields(student = %self.id))]
    pub async fn run(mut self) -> Result<StudentSummary, HelpDeskError> {
        debug!(
            target: "hd.actor.student",
            student = %self.id,
            visits_required = self.visits_required,
            "Student started"
        );

        while self.sessions_completed() < self.visits_required {
            self.transition(StudentState::Working);
            let period = self
                .ctx
                .durations
                .work_period(self.id, self.visit_count + 1);
            self.ctx.pause(period).await?;

            self.transition(StudentState::RequestingHelp);
            self.visit_count += 1;
            let request = HelpRequest {
                student: self.id,
                key: PriorityKey {
                    visit_count: self.visit_count,
                    requested_at: Instant::now(),
                },
            };

            let outcome = self
                .ctx
                .area
                .request_seat(request, self.ctx.sink.as_ref())
                .await?;
            if outcome == SeatOutcome::NoChair {
                self.chair_misses += 1;
                continue;
            }

            self.transition(StudentState::Waiting);
            let tutor = self.await_dispatch().await?;
            self.assigned_tutor = Some(tutor);

            self.transition(StudentState::BeingTutored);
            let receipt = self.await_release(tutor).await?;
            self.tutors.push(receipt.tutor);
            self.ctx.sink.record(&DeskEvent::StudentHelped {
                student: self.id,
                tutor: receipt.tutor,
                visits_remaining: self.visits_required - self.sessions_completed(),
            });
        }

        self.finish()
    }

    async fn next_notice(&mut self) -> Result<SessionNotice, HelpDeskError> {
        let id = self.id;
        tokio::select! {
            () = self.ctx.cancel.cancelled() => Err(HelpDeskError::Cancelled),
            notice = self.notices.recv() => notice.ok_or_else(|| {
                invariant(format!("notice channel for student {id} closed"))
            }),
        }
    }

    /// Waiting -> BeingTutored: the tutor that took us off the queue.
    async fn await_dispatch(&mut self) -> Result<TutorId, HelpDeskError> {
        match self.next_notice().await? {
            SessionNotice::Started { tutor } => Ok(tutor),
            SessionNotice::Ended(receipt) => Err(invariant(format!(
                "student {} released by tutor {} before any session started",
                self.id, receipt.tutor
            ))),
        }
    }

    /// BeingTutored -> Working: the release from the tutor serving us.
    async fn await_release(&mut self, tutor: TutorId) -> Result<SessionReceipt, HelpDeskError> {
        match self.next_notice().await? {
            SessionNotice::Ended(receipt) if receipt.tutor == tutor => Ok(receipt),
            SessionNotice::Ended(receipt) => Err(invariant(format!(
                "student {} released by tutor {} while with tutor {tutor}",
                self.id, receipt.tutor
            ))),
            SessionNotice::Started { tutor: other } => Err(invariant(format!(
                "student {} dispatched to tutor {other} while with tutor {tutor}",
                self.id
            ))),
        }
    }

    fn finish(mut self) -> Result<StudentSummary, HelpDeskError> {
        self.transition(StudentState::Finished);

        let active_students = self.ctx.active.student_finished()?;
        self.ctx.sink.record(&DeskEvent::StudentFinished {
            student: self.id,
            active_students,
        });
        self.ctx.area.nudge_coordinator();

        debug!(
            target: "hd.actor.student",
            student = %self.id,
            visits_attempted = self.visit_count,
            chair_misses = self.chair_misses,
            "Student finished"
        );

        Ok(StudentSummary {
            student: self.id,
            sessions_completed: self.sessions_completed(),
            visits_attempted: self.visit_count,
            chair_misses: self.chair_misses,
            last_tutor: self.assigned_tutor,
            tutors: self.tutors,
        })
    }
}
