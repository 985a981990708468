//! Observable desk events and the sinks that render them.
//!
//! The core emits events; presentation is up to the sink. Events that
//! describe waiting-area membership are recorded while the waiting-area lock
//! is held, so a sink sees them in the same order the state changed.

use common::types::{StudentId, TutorId};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, warn};

/// Something that happened at the desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeskEvent {
    /// A student asked for help but every chair was taken.
    NoChairAvailable { student: StudentId, visit_count: u32 },

    /// A student took a chair and joined the admission queue.
    StudentSeated {
        student: StudentId,
        visit_count: u32,
        free_chairs: u32,
    },

    /// The coordinator moved a student into the priority queue.
    StudentQueued {
        student: StudentId,
        visit_count: u32,
        position: usize,
        waiting: usize,
        total_requests: u64,
    },

    /// A tutor took the head of the priority queue and freed its chair.
    StudentDispatched {
        tutor: TutorId,
        student: StudentId,
        waiting: usize,
        free_chairs: u32,
    },

    /// A tutoring session began.
    SessionStarted {
        tutor: TutorId,
        student: StudentId,
        in_session: u32,
        total_sessions: u64,
    },

    /// A tutoring session ended and the student was released.
    SessionEnded {
        tutor: TutorId,
        student: StudentId,
        in_session: u32,
        total_sessions: u64,
    },

    /// A student woke up after being tutored.
    StudentHelped {
        student: StudentId,
        tutor: TutorId,
        visits_remaining: u32,
    },

    /// A student completed all of its required visits.
    StudentFinished {
        student: StudentId,
        active_students: usize,
    },

    /// The coordinator released every tutor for shutdown.
    ShutdownBroadcast { tutors: u32 },

    /// The coordinator exited.
    CoordinatorStopped { drains: u64, total_requests: u64 },

    /// A tutor exited.
    TutorStopped { tutor: TutorId, sessions: u64 },
}

/// Receives desk events.
///
/// Called from inside short critical sections, so implementations must not
/// block for long and must never wait on desk signals.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &DeskEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &DeskEvent) {}
}

/// Renders events as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: &DeskEvent) {
        match *event {
            DeskEvent::NoChairAvailable {
                student,
                visit_count,
            } => {
                info!(
                    target: "hd.student",
                    student = %student,
                    visit_count,
                    "Student found no empty chair, will try again later"
                );
            }
            DeskEvent::StudentSeated {
                student,
                visit_count,
                free_chairs,
            } => {
                info!(
                    target: "hd.student",
                    student = %student,
                    visit_count,
                    free_chairs,
                    "Student takes a seat"
                );
            }
            DeskEvent::StudentQueued {
                student,
                visit_count,
                position,
                waiting,
                total_requests,
            } => {
                info!(
                    target: "hd.coordinator",
                    student = %student,
                    priority = visit_count,
                    position,
                    waiting,
                    total_requests,
                    "Student added to the priority queue"
                );
            }
            DeskEvent::StudentDispatched {
                tutor,
                student,
                waiting,
                free_chairs,
            } => {
                debug!(
                    target: "hd.tutor",
                    tutor = %tutor,
                    student = %student,
                    waiting,
                    free_chairs,
                    "Tutor picked up student"
                );
            }
            DeskEvent::SessionStarted {
                tutor,
                student,
                in_session,
                total_sessions,
            } => {
                debug!(
                    target: "hd.tutor",
                    tutor = %tutor,
                    student = %student,
                    in_session,
                    total_sessions,
                    "Tutoring session started"
                );
            }
            DeskEvent::SessionEnded {
                tutor,
                student,
                in_session,
                total_sessions,
            } => {
                info!(
                    target: "hd.tutor",
                    tutor = %tutor,
                    student = %student,
                    in_session,
                    total_sessions,
                    "Student tutored"
                );
            }
            DeskEvent::StudentHelped {
                student,
                tutor,
                visits_remaining,
            } => {
                info!(
                    target: "hd.student",
                    student = %student,
                    tutor = %tutor,
                    visits_remaining,
                    "Student received help"
                );
            }
            DeskEvent::StudentFinished {
                student,
                active_students,
            } => {
                info!(
                    target: "hd.student",
                    student = %student,
                    active_students,
                    "Student finished all visits"
                );
            }
            DeskEvent::ShutdownBroadcast { tutors } => {
                info!(
                    target: "hd.coordinator",
                    tutors,
                    "All students finished, releasing tutors"
                );
            }
            DeskEvent::CoordinatorStopped {
                drains,
                total_requests,
            } => {
                info!(
                    target: "hd.coordinator",
                    drains,
                    total_requests,
                    "Coordinator stopped"
                );
            }
            DeskEvent::TutorStopped { tutor, sessions } => {
                info!(target: "hd.tutor", tutor = %tutor, sessions, "Tutor stopped");
            }
        }
    }
}

/// Writes each event as one JSON object per line on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesSink;

impl EventSink for JsonLinesSink {
    fn record(&self, event: &DeskEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(target: "hd.events", error = %e, "Failed to serialize desk event");
                return;
            }
        };
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{line}") {
            warn!(target: "hd.events", error = %e, "Failed to write desk event");
        }
    }
}
