//! Custom test assertions over a recorded event log.
//!
//! Waiting-area events are recorded under the waiting-area lock, so the log
//! order is the order in which chairs and queues actually changed.

use common::types::{StudentId, TutorId};
use help_desk::desk::DeskEvent;
use std::collections::HashMap;

/// Assertions over a desk event log.
///
/// # Example
/// ```rust,ignore
/// sink.events()
///     .assert_chairs_within(2)
///     .assert_sessions_within(1)
///     .assert_each_student_helped(3, 1);
/// ```
pub trait EventLogAssertions {
    /// Free-chair counts never exceed `chairs`, and seated students never
    /// outnumber them.
    fn assert_chairs_within(&self, chairs: u32) -> &Self;

    /// No more than `tutors` sessions are ever in progress.
    fn assert_sessions_within(&self, tutors: u32) -> &Self;

    /// Each of `students` was helped exactly `visits` times, and nobody else
    /// was helped.
    fn assert_each_student_helped(&self, students: u32, visits: u32) -> &Self;

    /// Every dispatched student had the lowest visit count among those
    /// waiting at that moment.
    fn assert_fewest_visits_dispatched_first(&self) -> &Self;

    /// A student is never dispatched again before being released.
    fn assert_no_double_dispatch(&self) -> &Self;

    /// Number of sessions each tutor completed.
    fn sessions_by_tutor(&self) -> HashMap<TutorId, u64>;
}

impl EventLogAssertions for [DeskEvent] {
    fn assert_chairs_within(&self, chairs: u32) -> &Self {
        let mut seated: i64 = 0;
        for event in self {
            match event {
                DeskEvent::StudentSeated { free_chairs, .. } => {
                    seated += 1;
                    assert!(
                        *free_chairs < chairs,
                        "seat taken but {free_chairs} of {chairs} chairs reported free"
                    );
                }
                DeskEvent::StudentDispatched { free_chairs, .. } => {
                    seated -= 1;
                    assert!(
                        *free_chairs <= chairs,
                        "{free_chairs} free chairs exceeds capacity {chairs}"
                    );
                }
                _ => {}
            }
            assert!(
                (0..=i64::from(chairs)).contains(&seated),
                "{seated} students seated with {chairs} chairs after {event:?}"
            );
        }
        assert_eq!(seated, 0, "students still seated at end of log");
        self
    }

    fn assert_sessions_within(&self, tutors: u32) -> &Self {
        for event in self {
            if let DeskEvent::SessionStarted { in_session, .. } = event {
                assert!(
                    *in_session <= tutors,
                    "{in_session} sessions in progress with {tutors} tutors"
                );
            }
        }
        self
    }

    fn assert_each_student_helped(&self, students: u32, visits: u32) -> &Self {
        let mut helped: HashMap<StudentId, u32> = HashMap::new();
        for event in self {
            if let DeskEvent::StudentHelped { student, .. } = event {
                *helped.entry(*student).or_default() += 1;
            }
        }
        for id in 0..students {
            let count = helped.remove(&StudentId(id)).unwrap_or(0);
            assert_eq!(count, visits, "student {id} helped {count} times");
        }
        assert!(helped.is_empty(), "unexpected students helped: {helped:?}");
        self
    }

    fn assert_fewest_visits_dispatched_first(&self) -> &Self {
        let mut waiting: HashMap<StudentId, u32> = HashMap::new();
        for event in self {
            match event {
                DeskEvent::StudentQueued {
                    student,
                    visit_count,
                    ..
                } => {
                    waiting.insert(*student, *visit_count);
                }
                DeskEvent::StudentDispatched { student, .. } => {
                    let chosen = waiting
                        .remove(student)
                        .unwrap_or_else(|| panic!("student {student} dispatched while not waiting"));
                    if let Some(lowest) = waiting.values().min() {
                        assert!(
                            chosen <= *lowest,
                            "student {student} with {chosen} visits dispatched ahead of a student with {lowest}"
                        );
                    }
                }
                _ => {}
            }
        }
        self
    }

    fn assert_no_double_dispatch(&self) -> &Self {
        let mut in_service: HashMap<StudentId, TutorId> = HashMap::new();
        for event in self {
            match event {
                DeskEvent::StudentDispatched { tutor, student, .. } => {
                    if let Some(previous) = in_service.insert(*student, *tutor) {
                        panic!("student {student} dispatched to {tutor} while still with {previous}");
                    }
                }
                DeskEvent::StudentHelped { student, .. } => {
                    assert!(
                        in_service.remove(student).is_some(),
                        "student {student} helped without being dispatched"
                    );
                }
                _ => {}
            }
        }
        self
    }

    fn sessions_by_tutor(&self) -> HashMap<TutorId, u64> {
        let mut sessions = HashMap::new();
        for event in self {
            if let DeskEvent::SessionEnded { tutor, .. } = event {
                *sessions.entry(*tutor).or_default() += 1;
            }
        }
        sessions
    }
}
