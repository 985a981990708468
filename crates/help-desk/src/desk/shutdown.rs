//! Termination detection.
//!
//! The coordinator and every tutor poll [`ActiveStudents`] before each
//! blocking wait and stop looping once it reads zero. The coordinator then
//! releases every tutor with one ready notification each.

use crate::errors::{invariant, HelpDeskError};
use crate::observability::metrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of students that still have visits left.
#[derive(Debug)]
pub struct ActiveStudents {
    remaining: AtomicUsize,
}

impl ActiveStudents {
    #[must_use]
    pub fn new(students: usize) -> Arc<Self> {
        metrics::set_students_active(students);
        Arc::new(Self {
            remaining: AtomicUsize::new(students),
        })
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    /// True once every student has finished.
    #[must_use]
    pub fn all_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Record that one student finished; returns how many remain.
    ///
    /// # Errors
    ///
    /// `InvariantViolated` if more students finish than were started.
    pub fn student_finished(&self) -> Result<usize, HelpDeskError> {
        let previous = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_err(|_| invariant("student finished with no active students left"))?;
        let remaining = previous - 1;
        metrics::set_students_active(remaining);
        Ok(remaining)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_down_to_zero() {
        let active = ActiveStudents::new(2);
        assert!(!active.all_finished());

        assert_eq!(active.student_finished().unwrap(), 1);
        assert_eq!(active.student_finished().unwrap(), 0);
        assert!(active.all_finished());
    }

    #[test]
    fn test_zero_students_is_finished_immediately() {
        let active = ActiveStudents::new(0);
        assert!(active.all_finished());
        assert_eq!(active.remaining(), 0);
    }

    #[test]
    fn test_extra_finish_is_rejected() {
        let active = ActiveStudents::new(1);
        active.student_finished().unwrap();

        let result = active.student_finished();
        assert!(matches!(result, Err(HelpDeskError::InvariantViolated(_))));
        assert_eq!(active.remaining(), 0);
    }
}
