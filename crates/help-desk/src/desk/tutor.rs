//! `TutorActor` - serves the highest-priority waiting student.
//!
//! Each loop: park on the ready signal, take the head of the priority queue
//! (freeing its chair), tell that student its session started, tutor outside
//! every lock, then release the student through the same notice channel.

use super::context::DeskContext;
use super::events::DeskEvent;
use super::messages::{DeliveryFailure, SessionNotice, SessionReceipt};
use crate::errors::HelpDeskError;
use crate::observability::metrics;

use common::types::{StudentId, TutorId};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// What one tutor did over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorSummary {
    pub tutor: TutorId,
    /// Sessions completed.
    pub sessions: u64,
    /// Ready notifications that found the priority queue empty.
    pub spurious_wakeups: u64,
    /// Simulated time spent tutoring.
    pub busy_time: Duration,
}

/// One tutor actor.
pub struct TutorActor {
    ctx: DeskContext,
    summary: TutorSummary,
}

impl TutorActor {
    #[must_use]
    pub fn new(id: TutorId, ctx: DeskContext) -> Self {
        Self {
            ctx,
            summary: TutorSummary {
                tutor: id,
                sessions: 0,
                spurious_wakeups: 0,
                busy_time: Duration::ZERO,
            },
        }
    }

    /// Run until every student has finished.
    ///
    /// # Errors
    ///
    /// Propagates invariant violations (chair accounting, double dispatch),
    /// or `Cancelled` if the run is aborted.
    #[instrument(skip_all, name = "hd.actor.tutor", fields(tutor = %self.summary.tutor))]
    pub async fn run(mut self) -> Result<TutorSummary, HelpDeskError> {
        let id = self.summary.tutor;
        debug!(target: "hd.actor.tutor", tutor = %id, "Tutor started");

        loop {
            if self.ctx.active.all_finished() {
                break;
            }

            self.ctx.ledger.tutor_idle().await;
            let woke = self.ctx.area.wait_for_student(&self.ctx.cancel).await;
            self.ctx.ledger.tutor_busy().await;
            woke?;

            let Some(request) = self
                .ctx
                .area
                .dispatch_next(id, self.ctx.sink.as_ref())
                .await?
            else {
                self.summary.spurious_wakeups += 1;
                continue;
            };

            self.tutor(request.student).await?;
        }

        self.ctx.sink.record(&DeskEvent::TutorStopped {
            tutor: id,
            sessions: self.summary.sessions,
        });
        debug!(
            target: "hd.actor.tutor",
            tutor = %id,
            sessions = self.summary.sessions,
            spurious_wakeups = self.summary.spurious_wakeups,
            "Tutor stopped"
        );

        Ok(self.summary)
    }

    /// One session with `student`. No lock is held while tutoring.
    async fn tutor(&mut self, student: StudentId) -> Result<(), HelpDeskError> {
        let id = self.summary.tutor;

        let started = self.ctx.ledger.session_started().await?;
        metrics::set_sessions_active(started.in_session);
        self.ctx.sink.record(&DeskEvent::SessionStarted {
            tutor: id,
            student,
            in_session: started.in_session,
            total_sessions: started.total_sessions,
        });
        self.ctx
            .roster
            .deliver(student, SessionNotice::Started { tutor: id })
            .map_err(|failure| self.delivery_error(student, failure))?;

        let period = self
            .ctx
            .durations
            .tutoring_period(id, self.summary.sessions + 1);
        self.ctx.pause(period).await?;

        let receipt = SessionReceipt {
            tutor: id,
            session: started.total_sessions,
        };
        self.ctx
            .roster
            .deliver(student, SessionNotice::Ended(receipt))
            .map_err(|failure| self.delivery_error(student, failure))?;

        let ended = self.ctx.ledger.session_ended().await?;
        self.summary.sessions += 1;
        self.summary.busy_time += period;

        metrics::set_sessions_active(ended.in_session);
        metrics::record_session_completed();
        metrics::record_session_duration(period);
        self.ctx.sink.record(&DeskEvent::SessionEnded {
            tutor: id,
            student,
            in_session: ended.in_session,
            total_sessions: ended.total_sessions,
        });

        Ok(())
    }

    fn delivery_error(&self, student: StudentId, failure: DeliveryFailure) -> HelpDeskError {
        if failure == DeliveryFailure::StudentGone && self.ctx.cancel.is_cancelled() {
            return HelpDeskError::Cancelled;
        }
        info!(
            target: "hd.actor.tutor",
            tutor = %self.summary.tutor,
            student = %student,
            failure = ?failure,
            "Could not notify student"
        );
        failure.into_error(student)
    }
}
