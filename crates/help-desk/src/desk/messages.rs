//! Per-student session notices.
//!
//! Each student owns the receiving half of a private channel; the tutor that
//! serves it sends [`SessionNotice::Started`] when the session begins and
//! [`SessionNotice::Ended`] when it releases the student. One session's
//! notices exactly fill the channel, so a second concurrent dispatch of the
//! same student is detected (by the tutor as a full channel, or by the
//! student as an out-of-order notice) instead of being silently queued.

use crate::errors::{invariant, HelpDeskError};
use common::types::{StudentId, TutorId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Notices one session can produce.
pub const NOTICES_PER_SESSION: usize = 2;

/// Delivered to a student when its tutoring session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReceipt {
    /// Tutor that ran the session.
    pub tutor: TutorId,
    /// Desk-wide session number (1-based).
    pub session: u64,
}

/// What a tutor tells the student it is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    /// A tutor took the student off the priority queue and started tutoring.
    Started { tutor: TutorId },
    /// The session is over; the student may leave.
    Ended(SessionReceipt),
}

/// Why a notice could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// No such student on the roster.
    UnknownStudent,
    /// The student already has a full session's worth of unread notices.
    AlreadySignalled,
    /// The student's actor is gone.
    StudentGone,
}

impl DeliveryFailure {
    /// Map to a desk error for `student`.
    #[must_use]
    pub fn into_error(self, student: StudentId) -> HelpDeskError {
        match self {
            DeliveryFailure::UnknownStudent => {
                invariant(format!("student {student} is not on the roster"))
            }
            DeliveryFailure::AlreadySignalled => invariant(format!(
                "student {student} dispatched while a session was still outstanding"
            )),
            DeliveryFailure::StudentGone => {
                invariant(format!("student {student} exited while queued for help"))
            }
        }
    }
}

/// Senders for every student's notice channel, indexed by student id.
#[derive(Debug)]
pub struct Roster {
    senders: Vec<mpsc::Sender<SessionNotice>>,
}

impl Roster {
    /// Create notice channels for `students` students.
    ///
    /// The receivers are returned in id order; receiver `i` belongs to
    /// `StudentId(i)`.
    #[must_use]
    pub fn new(students: u32) -> (Self, Vec<mpsc::Receiver<SessionNotice>>) {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..students)
            .map(|_| mpsc::channel::<SessionNotice>(NOTICES_PER_SESSION))
            .unzip();
        (Self { senders }, receivers)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Send `notice` to `student`. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns the reason delivery was impossible.
    pub fn deliver(&self, student: StudentId, notice: SessionNotice) -> Result<(), DeliveryFailure> {
        let sender = self
            .senders
            .get(student.index())
            .ok_or(DeliveryFailure::UnknownStudent)?;
        sender.try_send(notice).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryFailure::AlreadySignalled,
            TrySendError::Closed(_) => DeliveryFailure::StudentGone,
        })
    }
}
