//! Admission and priority queues.
//!
//! The admission queue holds seated students in arrival order until the
//! coordinator triages them. The priority queue holds triaged students in
//! dispatch order, as decided by a [`PriorityPolicy`].
//!
//! Neither queue synchronizes on its own: both live inside the waiting area
//! and are only touched while its lock is held.

use crate::errors::{invariant, HelpDeskError};
use common::types::StudentId;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use tokio::time::Instant;

/// Ordering key captured when a student asks for help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityKey {
    /// Help requests made by this student so far, this one included.
    pub visit_count: u32,
    /// When this request was made. Breaks ties between equal visit counts.
    pub requested_at: Instant,
}

/// A seated student's request, as it travels through both queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpRequest {
    pub student: StudentId,
    pub key: PriorityKey,
}

/// Decides which of two waiting students a tutor should see first.
///
/// Implementations must be a strict ordering: `outranks(a, a)` is false, and
/// at most one of `outranks(a, b)` / `outranks(b, a)` holds.
pub trait PriorityPolicy: Send + Sync + fmt::Debug {
    /// True if `candidate` must be served strictly before `incumbent`.
    fn outranks(&self, candidate: &PriorityKey, incumbent: &PriorityKey) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Students with fewer visits go first; equal visit counts are served in
/// request-time order.
///
/// Note this ranks infrequent visitors ahead of frequent ones. Whether the
/// intended policy is the reverse has never been settled, so the literal
/// rule is kept; inject a different policy to change it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestVisitsFirst;

impl PriorityPolicy for FewestVisitsFirst {
    fn outranks(&self, candidate: &PriorityKey, incumbent: &PriorityKey) -> bool {
        match candidate.visit_count.cmp(&incumbent.visit_count) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => candidate.requested_at < incumbent.requested_at,
        }
    }

    fn name(&self) -> &'static str {
        "fewest-visits-first"
    }
}

/// Arrival-ordered queue of seated students awaiting triage.
#[derive(Debug, Default)]
pub struct AdmissionQueue {
    entries: VecDeque<HelpRequest>,
}

impl AdmissionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail.
    pub fn push(&mut self, request: HelpRequest) {
        self.entries.push_back(request);
    }

    /// Remove from the head.
    pub fn pop(&mut self) -> Option<HelpRequest> {
        self.entries.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, student: StudentId) -> bool {
        self.entries.iter().any(|r| r.student == student)
    }
}

/// Dispatch-ordered queue of triaged students.
///
/// Kept insertion-sorted: the head is always the request the policy ranks
/// highest. Requests that compare equal keep their insertion order.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    entries: VecDeque<HelpRequest>,
}

impl PriorityQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `request` before the first entry it outranks.
    ///
    /// Returns the position it landed at (0 = next to be served).
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolated` if the student is already queued.
    pub fn insert(
        &mut self,
        request: HelpRequest,
        policy: &dyn PriorityPolicy,
    ) -> Result<usize, HelpDeskError> {
        if self.contains(request.student) {
            return Err(invariant(format!(
                "student {} inserted into the priority queue twice",
                request.student
            )));
        }

        let position = self
            .entries
            .iter()
            .position(|queued| policy.outranks(&request.key, &queued.key))
            .unwrap_or(self.entries.len());
        self.entries.insert(position, request);
        Ok(position)
    }

    /// Remove the highest-priority request.
    pub fn pop(&mut self) -> Option<HelpRequest> {
        self.entries.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, student: StudentId) -> bool {
        self.entries.iter().any(|r| r.student == student)
    }

    /// Students in dispatch order.
    #[must_use]
    pub fn students(&self) -> Vec<StudentId> {
        self.entries.iter().map(|r| r.student).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(student: u32, visit_count: u32, base: Instant, offset_ms: u64) -> HelpRequest {
        HelpRequest {
            student: StudentId(student),
            key: PriorityKey {
                visit_count,
                requested_at: base + Duration::from_millis(offset_ms),
            },
        }
    }

    #[test]
    fn test_fewer_visits_outrank_more() {
        let base = Instant::now();
        let policy = FewestVisitsFirst;
        let rare = request(0, 1, base, 50).key;
        let frequent = request(1, 4, base, 0).key;

        assert!(policy.outranks(&rare, &frequent));
        assert!(!policy.outranks(&frequent, &rare));
    }

    #[test]
    fn test_equal_visits_break_ties_by_request_time() {
        let base = Instant::now();
        let policy = FewestVisitsFirst;
        let early = request(0, 2, base, 0).key;
        let late = request(1, 2, base, 10).key;

        assert!(policy.outranks(&early, &late));
        assert!(!policy.outranks(&late, &early));
        assert!(!policy.outranks(&early, &early));
    }

    #[test]
    fn test_admission_queue_is_fifo() {
        let base = Instant::now();
        let mut queue = AdmissionQueue::new();
        queue.push(request(2, 9, base, 0));
        queue.push(request(0, 1, base, 1));
        queue.push(request(1, 5, base, 2));

        assert_eq!(queue.len(), 3);
        assert!(queue.contains(StudentId(0)));
        assert_eq!(queue.pop().unwrap().student, StudentId(2));
        assert_eq!(queue.pop().unwrap().student, StudentId(0));
        assert_eq!(queue.pop().unwrap().student, StudentId(1));
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_priority_queue_orders_by_policy() {
        let base = Instant::now();
        let mut queue = PriorityQueue::new();
        let policy = FewestVisitsFirst;

        queue.insert(request(0, 3, base, 0), &policy).unwrap();
        queue.insert(request(1, 1, base, 1), &policy).unwrap();
        queue.insert(request(2, 2, base, 2), &policy).unwrap();
        queue.insert(request(3, 1, base, 3), &policy).unwrap();

        assert_eq!(
            queue.students(),
            vec![StudentId(1), StudentId(3), StudentId(2), StudentId(0)]
        );
        assert_eq!(queue.pop().unwrap().student, StudentId(1));
    }

    #[test]
    fn test_insert_reports_position() {
        let base = Instant::now();
        let mut queue = PriorityQueue::new();
        let policy = FewestVisitsFirst;

        assert_eq!(queue.insert(request(0, 2, base, 0), &policy).unwrap(), 0);
        assert_eq!(queue.insert(request(1, 3, base, 1), &policy).unwrap(), 1);
        assert_eq!(queue.insert(request(2, 1, base, 2), &policy).unwrap(), 0);
        assert_eq!(queue.insert(request(3, 2, base, 3), &policy).unwrap(), 2);
    }

    #[test]
    fn test_identical_keys_keep_arrival_order() {
        let base = Instant::now();
        let mut queue = PriorityQueue::new();
        let policy = FewestVisitsFirst;

        for student in 0..4 {
            queue.insert(request(student, 1, base, 0), &policy).unwrap();
        }

        let popped: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|r| r.student).collect();
        assert_eq!(
            popped,
            vec![StudentId(0), StudentId(1), StudentId(2), StudentId(3)]
        );
    }

    #[test]
    fn test_pop_order_matches_comparator() {
        let base = Instant::now();
        let mut queue = PriorityQueue::new();
        let policy = FewestVisitsFirst;
        let visits = [5, 1, 4, 1, 3, 2, 2, 6];

        for (student, visit_count) in (0u32..).zip(visits) {
            queue
                .insert(request(student, visit_count, base, u64::from(student)), &policy)
                .unwrap();
        }

        let popped: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        for pair in popped.windows(2) {
            if let [first, second] = pair {
                assert!(!policy.outranks(&second.key, &first.key));
            }
        }
        assert_eq!(popped.len(), visits.len());
    }

    #[test]
    fn test_duplicate_insert_is_invariant_violation() {
        let base = Instant::now();
        let mut queue = PriorityQueue::new();
        let policy = FewestVisitsFirst;

        queue.insert(request(7, 1, base, 0), &policy).unwrap();
        let result = queue.insert(request(7, 2, base, 5), &policy);

        assert!(matches!(result, Err(HelpDeskError::InvariantViolated(_))));
        assert_eq!(queue.len(), 1);
    }

    #[derive(Debug)]
    struct MostVisitsFirst;

    impl PriorityPolicy for MostVisitsFirst {
        fn outranks(&self, candidate: &PriorityKey, incumbent: &PriorityKey) -> bool {
            candidate.visit_count > incumbent.visit_count
        }

        fn name(&self) -> &'static str {
            "most-visits-first"
        }
    }

    #[test]
    fn test_policy_is_replaceable() {
        let base = Instant::now();
        let mut queue = PriorityQueue::new();

        queue.insert(request(0, 1, base, 0), &MostVisitsFirst).unwrap();
        queue.insert(request(1, 4, base, 1), &MostVisitsFirst).unwrap();

        assert_eq!(queue.pop().unwrap().student, StudentId(1));
    }
}
