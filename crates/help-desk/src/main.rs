//! Help Desk
//!
//! Runs one help desk simulation and exits.
//!
//! ```text
//! help-desk <students> <tutors> <chairs> <visits-per-student>
//! ```
//!
//! # Startup Flow
//!
//! 1. Parse the four run parameters
//! 2. Initialize tracing on stderr (`HD_LOG_LEVEL`, `HD_LOG_JSON`, `RUST_LOG`)
//! 3. Validate configuration and load tunables from the environment
//! 4. Run the desk until every student has finished
//! 5. Report totals and exit
//!
//! Exit status is 0 on success, 2 for invalid arguments, 3 if the run
//! deadline elapsed and 1 for any other failure.

#![warn(clippy::pedantic)]

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use common::config::ObservabilityConfig;
use help_desk::config::{Config, ConfigError, DeskCounts, EventFormat};
use help_desk::desk::{
    EventSink, HelpDesk, JsonLinesSink, NullSink, SimulationReport, TracingEventSink,
    UniformDurations,
};
use help_desk::errors::HelpDeskError;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "help-desk", about = "Simulate a bounded-capacity tutoring help desk")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Number of students.
    students: i64,

    /// Number of tutors (must be greater than 0).
    tutors: i64,

    /// Number of waiting-room chairs (must be greater than 0).
    chairs: i64,

    /// Tutoring sessions each student needs.
    #[arg(value_name = "HELP")]
    visits: i64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let vars: HashMap<String, String> = env::vars().collect();

    // A rejected logging setting is reported through the default subscriber.
    let (observability, rejected) = match ObservabilityConfig::from_vars(&vars) {
        Ok(observability) => (observability, None),
        Err(e) => (ObservabilityConfig::default(), Some(e)),
    };
    if let Err(e) = observability.init_tracing() {
        eprintln!("Failed to initialize tracing: {e}");
    }
    if let Some(e) = rejected {
        error!(target: "hd.config", error = %e, "Rejected logging configuration; no actors started");
        let error = HelpDeskError::from(ConfigError::InvalidValue(e.to_string()));
        return ExitCode::from(error.exit_code());
    }

    let counts = DeskCounts::new(args.students, args.tutors, args.chairs, args.visits);
    // Rejections are logged by `Config::from_vars`.
    let config = match Config::from_vars(counts, &vars) {
        Ok(config) => config,
        Err(e) => return ExitCode::from(HelpDeskError::from(e).exit_code()),
    };

    info!(
        run_id = %config.run_id,
        students = config.num_students,
        tutors = config.num_tutors,
        chairs = config.num_chairs,
        visits_per_student = config.visits_per_student,
        max_work_period = ?config.max_work_period,
        max_tutoring_period = ?config.max_tutoring_period,
        seed = ?config.seed,
        run_deadline = ?config.run_deadline,
        "Configuration loaded successfully"
    );

    let sink: Arc<dyn EventSink> = match config.event_format {
        EventFormat::Text => Arc::new(TracingEventSink),
        EventFormat::Json => Arc::new(JsonLinesSink),
        EventFormat::None => Arc::new(NullSink),
    };
    let event_format = config.event_format;

    let desk = HelpDesk::builder(config.clone())
        .durations(Arc::new(UniformDurations::from_config(&config)))
        .sink(sink)
        .build();

    match desk.run().await {
        Ok(report) => {
            print_report(&report, event_format);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Help desk run failed");
            ExitCode::from(e.exit_code())
        }
    }
}

fn print_report(report: &SimulationReport, format: EventFormat) {
    if format == EventFormat::Json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(e) => error!(error = %e, "Failed to serialize report"),
        }
        return;
    }

    info!(
        run_id = %report.run_id,
        total_requests = report.ledger.total_requests,
        total_sessions = report.ledger.total_sessions,
        peak_in_session = report.ledger.peak_in_session,
        peak_seated = report.area.stats.peak_seated,
        peak_waiting = report.area.stats.peak_waiting,
        chair_misses = report.area.stats.chair_misses,
        elapsed = ?report.elapsed,
        "All students have been helped"
    );
}
