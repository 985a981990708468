//! `CoordinatorActor` - triages seated students.
//!
//! The single coordinator waits for admission notifications and, on each
//! wake-up, drains every pending admission into the priority queue in one
//! locked pass. Once no students remain active it releases every tutor and
//! exits.

use super::context::DeskContext;
use super::events::DeskEvent;
use crate::errors::HelpDeskError;

use serde::Serialize;
use tracing::{debug, info, instrument};

/// What the coordinator did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorSummary {
    /// Admission notifications consumed.
    pub wakeups: u64,
    /// Wake-ups that moved at least one student.
    pub drains: u64,
    /// Wake-ups that found the admission queue already empty.
    pub empty_wakeups: u64,
    /// Students moved into the priority queue.
    pub requests_moved: u64,
}

/// The coordinator actor. There is exactly one per desk.
pub struct CoordinatorActor {
    ctx: DeskContext,
    summary: CoordinatorSummary,
}

impl CoordinatorActor {
    #[must_use]
    pub fn new(ctx: DeskContext) -> Self {
        Self {
            ctx,
            summary: CoordinatorSummary::default(),
        }
    }

    /// Run until every student has finished.
    ///
    /// # Errors
    ///
    /// Propagates invariant violations from the waiting area, or `Cancelled`
    /// if the run is aborted.
    #[instrument(skip_all, name = "hd.actor.coordinator")]
    pub async fn run(mut self) -> Result<CoordinatorSummary, HelpDeskError> {
        info!(target: "hd.actor.coordinator", "Coordinator started");

        loop {
            if self.ctx.active.all_finished() {
                self.ctx.area.release_tutors(self.ctx.num_tutors);
                self.ctx.sink.record(&DeskEvent::ShutdownBroadcast {
                    tutors: self.ctx.num_tutors,
                });
                break;
            }

            self.ctx.area.wait_for_admission(&self.ctx.cancel).await?;
            self.summary.wakeups += 1;

            let moved = self
                .ctx
                .area
                .drain_admissions(&self.ctx.ledger, self.ctx.sink.as_ref())
                .await?;

            if moved == 0 {
                // Raced with an earlier drain, or a finishing student's nudge.
                self.summary.empty_wakeups += 1;
                continue;
            }

            self.summary.drains += 1;
            self.summary.requests_moved += moved as u64;
            debug!(target: "hd.actor.coordinator", moved, "Drained admissions");
        }

        let total_requests = self.ctx.ledger.snapshot().await.total_requests;
        self.ctx.sink.record(&DeskEvent::CoordinatorStopped {
            drains: self.summary.drains,
            total_requests,
        });
        info!(
            target: "hd.actor.coordinator",
            wakeups = self.summary.wakeups,
            drains = self.summary.drains,
            requests_moved = self.summary.requests_moved,
            "Coordinator stopped"
        );

        Ok(self.summary)
    }
}
