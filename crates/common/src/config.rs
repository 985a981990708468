//! Common configuration types for help desk components.

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive when neither `RUST_LOG` nor `HD_LOG_LEVEL` is set.
///
/// Desk logs use `hd.*` targets; `help_desk` covers module-path targets.
pub const DEFAULT_LOG_FILTER: &str = "help_desk=info,hd=info";

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Filter directive (e.g. `help_desk=debug`)
    pub log_level: String,
    /// Enable JSON-formatted logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_FILTER.to_string(),
            json_logs: false,
        }
    }
}

impl ObservabilityConfig {
    /// Load from a variable map (`HD_LOG_LEVEL`, `HD_LOG_JSON`).
    ///
    /// # Errors
    ///
    /// Returns `CommonError::Configuration` if `HD_LOG_JSON` is not a boolean.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let log_level = vars
            .get("HD_LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let json_logs = match vars.get("HD_LOG_JSON") {
            None => false,
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                CommonError::Configuration(format!("HD_LOG_JSON must be a boolean, got '{raw}'"))
            })?,
        };

        Ok(Self {
            log_level,
            json_logs,
        })
    }

    /// Filter built from the configured level, ignoring `RUST_LOG`.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::new(self.log_level.as_str())
    }

    /// Install the global tracing subscriber, writing to stderr so stdout
    /// stays free for machine-readable output.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    ///
    /// # Errors
    ///
    /// Returns `CommonError::TracingInit` if a global subscriber is already set.
    pub fn init_tracing(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| self.filter());

        let registry = tracing_subscriber::registry().with(filter);
        let outcome = if self.json_logs {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };

        outcome.map_err(|e| CommonError::TracingInit(e.to_string()))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
