//! Desk actors and the shared state they coordinate through.
//!
//! ```text
//! HelpDesk (driver)
//! ├── CoordinatorActor (one)   admission queue -> priority queue
//! ├── TutorActor (N)           priority queue -> session -> completion
//! └── StudentActor (M)         work -> chair or retry -> wait for completion
//!
//! WaitingArea   Mutex<{chairs, admission queue, priority queue}>
//!               admitted signal (students -> coordinator)
//!               ready signal    (coordinator -> tutors)
//! SessionLedger Mutex<{total requests, total sessions, in session}>
//! Roster        one notice channel per student (started, ended)
//! ```
//!
//! Lock order is waiting area, then ledger. No lock is held across a
//! simulated work or tutoring period, or while waiting on a signal.

pub mod area;
pub mod chairs;
pub mod context;
pub mod coordinator;
pub mod durations;
pub mod events;
pub mod ledger;
pub mod messages;
pub mod queues;
pub mod shutdown;
pub mod signals;
pub mod simulation;
pub mod student;
pub mod tutor;

pub use area::{AreaSnapshot, AreaStats, SeatOutcome, WaitingArea};
pub use coordinator::{CoordinatorActor, CoordinatorSummary};
pub use durations::{DurationSource, FixedDurations, UniformDurations};
pub use events::{DeskEvent, EventSink, JsonLinesSink, NullSink, TracingEventSink};
pub use ledger::{LedgerSnapshot, SessionLedger};
pub use messages::{SessionNotice, SessionReceipt};
pub use queues::{FewestVisitsFirst, HelpRequest, PriorityKey, PriorityPolicy};
pub use simulation::{HelpDesk, HelpDeskBuilder, SimulationReport};
pub use student::{StudentActor, StudentSummary};
pub use tutor::{TutorActor, TutorSummary};
