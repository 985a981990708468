//! Shared handles passed to every actor.

use super::area::WaitingArea;
use super::durations::DurationSource;
use super::events::EventSink;
use super::ledger::SessionLedger;
use super::messages::Roster;
use super::shutdown::ActiveStudents;
use crate::errors::HelpDeskError;

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything an actor needs to reach the shared desk state.
///
/// Cloning is cheap: every field is reference-counted.
#[derive(Clone)]
pub struct DeskContext {
    pub area: Arc<WaitingArea>,
    pub ledger: Arc<SessionLedger>,
    pub active: Arc<ActiveStudents>,
    pub roster: Arc<Roster>,
    pub durations: Arc<dyn DurationSource>,
    pub sink: Arc<dyn EventSink>,
    /// Fires only when the run is being aborted.
    pub cancel: CancellationToken,
    pub num_tutors: u32,
}

impl DeskContext {
    /// Spend `period` doing simulated work, unless the run is aborted.
    ///
    /// A zero period still yields to the scheduler, so retry loops cannot
    /// starve other actors.
    pub(crate) async fn pause(&self, period: Duration) -> Result<(), HelpDeskError> {
        if period.is_zero() {
            tokio::task::yield_now().await;
            if self.cancel.is_cancelled() {
                return Err(HelpDeskError::Cancelled);
            }
            return Ok(());
        }

        tokio::select! {
            () = self.cancel.cancelled() => Err(HelpDeskError::Cancelled),
            () = tokio::time::sleep(period) => Ok(()),
        }
    }
}
