//! Help Desk Library
//!
//! A bounded-capacity help desk simulated with cooperating actors:
//!
//! - Students alternate between working and asking for help. A student that
//!   finds every chair taken goes back to work and retries later.
//! - A single coordinator moves seated students into a priority queue,
//!   favouring students with fewer visits so far.
//! - Tutors take the highest-priority student, free their chair, tutor
//!   them, and release them.
//!
//! The run ends once every student has completed its required visits; the
//! coordinator then releases every tutor and all actors exit.
//!
//! # Modules
//!
//! - [`config`] - Run parameters and environment tunables
//! - [`desk`] - Actors, shared state and the simulation driver
//! - [`errors`] - Error types and exit codes
//! - [`observability`] - Metrics recorded during a run

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod desk;
pub mod errors;
pub mod observability;
