//! Common utilities and types shared across the help desk crates.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;

/// Module for common configuration
pub mod config;

/// Module for common error types
pub mod error;
