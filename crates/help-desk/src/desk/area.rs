//! `WaitingArea` - the chair pool and both queues behind one lock.
//!
//! Chair occupancy and queue membership change together: every occupied
//! chair corresponds to exactly one entry in either the admission queue or
//! the priority queue. That is checked after every mutation, while the lock
//! is still held.
//!
//! The area also owns the two counting signals of the protocol:
//!
//! ```text
//! student ──admitted──▶ coordinator ──ready──▶ tutor
//! ```
//!
//! Signals are posted after the lock is released and waited on without it.

use super::chairs::ChairPool;
use super::events::{DeskEvent, EventSink};
use super::ledger::SessionLedger;
use super::queues::{AdmissionQueue, HelpRequest, PriorityPolicy, PriorityQueue};
use super::signals::Signal;
use crate::errors::{invariant, HelpDeskError};
use crate::observability::metrics;

use common::types::{StudentId, TutorId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Result of a help request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOutcome {
    /// A chair was taken and the student is in the admission queue.
    Seated { free_chairs: u32 },
    /// Every chair was taken; nothing changed.
    NoChair,
}

/// Running totals kept alongside the area state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AreaStats {
    /// Help requests that got a chair.
    pub seated_total: u64,
    /// Help requests that found no chair.
    pub chair_misses: u64,
    /// Students handed to tutors.
    pub dispatched: u64,
    /// Most chairs ever occupied at once.
    pub peak_seated: u32,
    /// Longest the priority queue ever got.
    pub peak_waiting: usize,
}

/// Consistent view of the area at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaSnapshot {
    pub total_chairs: u32,
    pub free_chairs: u32,
    pub admission_len: usize,
    /// Priority queue contents in dispatch order.
    pub waiting: Vec<StudentId>,
    pub stats: AreaStats,
}

#[derive(Debug)]
struct AreaState {
    chairs: ChairPool,
    admission: AdmissionQueue,
    priority: PriorityQueue,
    stats: AreaStats,
}

impl AreaState {
    fn check_membership(&self) -> Result<(), HelpDeskError> {
        let queued = self.admission.len() + self.priority.len();
        let seated = self.chairs.seated() as usize;
        if seated != queued {
            return Err(invariant(format!(
                "{seated} chairs occupied but {queued} students queued ({} admission, {} priority)",
                self.admission.len(),
                self.priority.len()
            )));
        }
        Ok(())
    }

    fn is_waiting(&self, student: StudentId) -> bool {
        self.admission.contains(student) || self.priority.contains(student)
    }
}

/// Shared waiting room: chairs, admission queue, priority queue, signals.
#[derive(Debug)]
pub struct WaitingArea {
    state: Mutex<AreaState>,
    policy: Arc<dyn PriorityPolicy>,
    admitted: Signal,
    ready: Signal,
}

impl WaitingArea {
    /// An empty waiting room with `total_chairs` free chairs.
    #[must_use]
    pub fn new(total_chairs: u32, policy: Arc<dyn PriorityPolicy>) -> Arc<Self> {
        metrics::set_free_chairs(total_chairs);
        metrics::set_students_waiting(0);
        Arc::new(Self {
            state: Mutex::new(AreaState {
                chairs: ChairPool::new(total_chairs),
                admission: AdmissionQueue::new(),
                priority: PriorityQueue::new(),
                stats: AreaStats::default(),
            }),
            policy,
            admitted: Signal::new("admitted"),
            ready: Signal::new("ready"),
        })
    }

    /// Try to take a chair and join the admission queue.
    ///
    /// On success the coordinator is notified once, after the lock is
    /// released.
    ///
    /// # Errors
    ///
    /// `InvariantViolated` if the student is already waiting or the
    /// chair/queue accounting is broken.
    pub async fn request_seat(
        &self,
        request: HelpRequest,
        sink: &dyn EventSink,
    ) -> Result<SeatOutcome, HelpDeskError> {
        let outcome = {
            let mut state = self.state.lock().await;

            if state.is_waiting(request.student) {
                return Err(invariant(format!(
                    "student {} requested a seat while already waiting",
                    request.student
                )));
            }

            if state.chairs.try_acquire() {
                state.admission.push(request);
                state.stats.seated_total += 1;
                state.stats.peak_seated = state.stats.peak_seated.max(state.chairs.seated());
                state.check_membership()?;

                let free_chairs = state.chairs.free();
                sink.record(&DeskEvent::StudentSeated {
                    student: request.student,
                    visit_count: request.key.visit_count,
                    free_chairs,
                });
                metrics::set_free_chairs(free_chairs);
                SeatOutcome::Seated { free_chairs }
            } else {
                state.stats.chair_misses += 1;
                sink.record(&DeskEvent::NoChairAvailable {
                    student: request.student,
                    visit_count: request.key.visit_count,
                });
                metrics::record_chair_miss();
                SeatOutcome::NoChair
            }
        };

        if matches!(outcome, SeatOutcome::Seated { .. }) {
            self.admitted.post();
        }
        Ok(outcome)
    }

    /// Move every pending admission into the priority queue in one pass.
    ///
    /// Posts one ready notification per moved student. Returns how many were
    /// moved; zero is normal when an earlier drain already took them.
    ///
    /// # Errors
    ///
    /// `InvariantViolated` on queue corruption.
    pub async fn drain_admissions(
        &self,
        ledger: &SessionLedger,
        sink: &dyn EventSink,
    ) -> Result<usize, HelpDeskError> {
        let drained = {
            let mut state = self.state.lock().await;
            let mut drained = 0usize;

            while let Some(request) = state.admission.pop() {
                let position = state.priority.insert(request, self.policy.as_ref())?;
                let total_requests = ledger.record_request().await;
                let waiting = state.priority.len();
                state.stats.peak_waiting = state.stats.peak_waiting.max(waiting);
                drained += 1;

                sink.record(&DeskEvent::StudentQueued {
                    student: request.student,
                    visit_count: request.key.visit_count,
                    position,
                    waiting,
                    total_requests,
                });
                metrics::record_request();
            }

            state.check_membership()?;
            metrics::set_students_waiting(state.priority.len());
            drained
        };

        self.ready.post_many(drained);
        Ok(drained)
    }

    /// Take the highest-priority waiting student and free its chair.
    ///
    /// `Ok(None)` means the queue was empty, which a tutor treats as a
    /// spurious wake-up.
    ///
    /// # Errors
    ///
    /// `InvariantViolated` if the chair pool or queues are inconsistent.
    pub async fn dispatch_next(
        &self,
        tutor: TutorId,
        sink: &dyn EventSink,
    ) -> Result<Option<HelpRequest>, HelpDeskError> {
        let mut state = self.state.lock().await;

        let Some(request) = state.priority.pop() else {
            trace!(target: "hd.tutor", tutor = %tutor, "Priority queue empty on dispatch");
            return Ok(None);
        };

        state.chairs.release()?;
        state.stats.dispatched += 1;
        state.check_membership()?;

        let waiting = state.priority.len();
        let free_chairs = state.chairs.free();
        sink.record(&DeskEvent::StudentDispatched {
            tutor,
            student: request.student,
            waiting,
            free_chairs,
        });
        metrics::set_students_waiting(waiting);
        metrics::set_free_chairs(free_chairs);
        metrics::record_wait_duration(request.key.requested_at.elapsed());

        Ok(Some(request))
    }

    /// Coordinator side of the admitted signal.
    ///
    /// # Errors
    ///
    /// `Cancelled` or `SignalClosed`.
    pub async fn wait_for_admission(&self, cancel: &CancellationToken) -> Result<(), HelpDeskError> {
        self.admitted.wait(cancel).await
    }

    /// Tutor side of the ready signal.
    ///
    /// # Errors
    ///
    /// `Cancelled` or `SignalClosed`.
    pub async fn wait_for_student(&self, cancel: &CancellationToken) -> Result<(), HelpDeskError> {
        self.ready.wait(cancel).await
    }

    /// Wake the coordinator without admitting anyone, so it re-polls the
    /// active-student count.
    pub fn nudge_coordinator(&self) {
        self.admitted.post();
    }

    /// Post one ready notification per tutor so none stays parked.
    pub fn release_tutors(&self, tutors: u32) {
        self.ready.post_many(tutors as usize);
    }

    pub async fn snapshot(&self) -> AreaSnapshot {
        let state = self.state.lock().await;
        AreaSnapshot {
            total_chairs: state.chairs.total(),
            free_chairs: state.chairs.free(),
            admission_len: state.admission.len(),
            waiting: state.priority.students(),
            stats: state.stats,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::desk::events::NullSink;
    use crate::desk::queues::{FewestVisitsFirst, PriorityKey};
    use std::time::Duration;
    use tokio::time::Instant;

    fn area(chairs: u32) -> Arc<WaitingArea> {
        WaitingArea::new(chairs, Arc::new(FewestVisitsFirst))
    }

    fn request(student: u32, visit_count: u32, base: Instant, offset_ms: u64) -> HelpRequest {
        HelpRequest {
            student: StudentId(student),
            key: PriorityKey {
                visit_count,
                requested_at: base + Duration::from_millis(offset_ms),
            },
        }
    }

    #[tokio::test]
    async fn test_seat_until_full() {
        let area = area(2);
        let base = Instant::now();

        let first = area.request_seat(request(0, 1, base, 0), &NullSink).await.unwrap();
        let second = area.request_seat(request(1, 1, base, 1), &NullSink).await.unwrap();
        let third = area.request_seat(request(2, 1, base, 2), &NullSink).await.unwrap();

        assert_eq!(first, SeatOutcome::Seated { free_chairs: 1 });
        assert_eq!(second, SeatOutcome::Seated { free_chairs: 0 });
        assert_eq!(third, SeatOutcome::NoChair);

        let snapshot = area.snapshot().await;
        assert_eq!(snapshot.free_chairs, 0);
        assert_eq!(snapshot.admission_len, 2);
        assert_eq!(snapshot.stats.chair_misses, 1);
        assert_eq!(snapshot.stats.peak_seated, 2);
    }

    #[tokio::test]
    async fn test_seating_posts_admission_signal() {
        let area = area(1);
        let cancel = CancellationToken::new();

        area.request_seat(request(0, 1, Instant::now(), 0), &NullSink)
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), area.wait_for_admission(&cancel))
            .await
            .expect("admission signal should be pending")
            .unwrap();
    }

    #[tokio::test]
    async fn test_drain_moves_everything_in_priority_order() {
        let area = area(4);
        let ledger = SessionLedger::new(1);
        let base = Instant::now();

        area.request_seat(request(0, 3, base, 0), &NullSink).await.unwrap();
        area.request_seat(request(1, 1, base, 1), &NullSink).await.unwrap();
        area.request_seat(request(2, 2, base, 2), &NullSink).await.unwrap();

        let drained = area.drain_admissions(&ledger, &NullSink).await.unwrap();
        assert_eq!(drained, 3);
        assert_eq!(ledger.snapshot().await.total_requests, 3);

        let snapshot = area.snapshot().await;
        assert_eq!(snapshot.admission_len, 0);
        assert_eq!(
            snapshot.waiting,
            vec![StudentId(1), StudentId(2), StudentId(0)]
        );
        assert_eq!(snapshot.stats.peak_waiting, 3);
    }

    #[tokio::test]
    async fn test_empty_drain_is_not_an_error() {
        let area = area(1);
        let ledger = SessionLedger::new(1);

        assert_eq!(area.drain_admissions(&ledger, &NullSink).await.unwrap(), 0);
        assert_eq!(ledger.snapshot().await.total_requests, 0);
    }

    #[tokio::test]
    async fn test_dispatch_frees_chair_and_pops_head() {
        let area = area(2);
        let ledger = SessionLedger::new(1);
        let base = Instant::now();

        area.request_seat(request(0, 2, base, 0), &NullSink).await.unwrap();
        area.request_seat(request(1, 1, base, 1), &NullSink).await.unwrap();
        area.drain_admissions(&ledger, &NullSink).await.unwrap();

        let served = area.dispatch_next(TutorId(0), &NullSink).await.unwrap().unwrap();
        assert_eq!(served.student, StudentId(1));

        let snapshot = area.snapshot().await;
        assert_eq!(snapshot.free_chairs, 1);
        assert_eq!(snapshot.waiting, vec![StudentId(0)]);
        assert_eq!(snapshot.stats.dispatched, 1);
    }

    #[tokio::test]
    async fn test_dispatch_on_empty_queue_returns_none() {
        let area = area(1);
        let result = area.dispatch_next(TutorId(0), &NullSink).await.unwrap();
        assert!(result.is_none());
        assert_eq!(area.snapshot().await.free_chairs, 1);
    }

    #[tokio::test]
    async fn test_drain_posts_one_ready_per_student() {
        let area = area(3);
        let ledger = SessionLedger::new(1);
        let cancel = CancellationToken::new();
        let base = Instant::now();

        for student in 0..3 {
            area.request_seat(request(student, 1, base, u64::from(student)), &NullSink)
                .await
                .unwrap();
        }
        area.drain_admissions(&ledger, &NullSink).await.unwrap();

        for _ in 0..3 {
            tokio::time::timeout(Duration::from_secs(1), area.wait_for_student(&cancel))
                .await
                .expect("ready signal should be pending")
                .unwrap();
        }
        let extra =
            tokio::time::timeout(Duration::from_millis(20), area.wait_for_student(&cancel)).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_student_cannot_wait_twice() {
        let area = area(2);
        let base = Instant::now();

        area.request_seat(request(0, 1, base, 0), &NullSink).await.unwrap();
        let result = area.request_seat(request(0, 2, base, 1), &NullSink).await;

        assert!(matches!(result, Err(HelpDeskError::InvariantViolated(_))));
        assert_eq!(area.snapshot().await.free_chairs, 1);
    }

    #[tokio::test]
    async fn test_release_tutors_posts_one_per_tutor() {
        let area = area(1);
        let cancel = CancellationToken::new();

        area.release_tutors(2);
        area.wait_for_student(&cancel).await.unwrap();
        area.wait_for_student(&cancel).await.unwrap();
        assert!(area.dispatch_next(TutorId(1), &NullSink).await.unwrap().is_none());
    }
}
