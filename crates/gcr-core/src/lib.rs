//! gcr core library
//!
//! Runs one command across every student checkout of an assignment and
//! reports the results, either one panel per target or as an aggregate
//! pass/fail table.

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod files;
pub mod obs;
pub mod report;
pub mod resolver;
pub mod telemetry;

pub use command::{color_rule, normalize, ColorRule, CommandSpec, COLOR_RULES};
pub use config::{expand_home, Config, APP_NAME, DEFAULT_WORKING_DIR};
pub use error::{GcrError, Result};
pub use executor::{
    BatchObserver, ExecSettings, FanOutExecutor, NoopObserver, RunFailure, RunResult,
    EXIT_SPAWN_FAILED, EXIT_TIMED_OUT,
};
pub use files::{show_file, update_file, UpdateSummary};
pub use obs::{
    emit_batch_finished, emit_batch_started, emit_target_finished, emit_task_lost, BatchSpan,
};
pub use report::{
    report_aggregate, report_interactive, run_interactive, Acknowledge, AggregateReport,
    AggregateRow, AggregateStats, FilterMode, InteractiveReporter, ProgressObserver,
    StdinAcknowledge, TimingStats, CONTINUE_PROMPT,
};
pub use resolver::{target_name, DirectoryResolver, TargetDirectory};
pub use telemetry::{init_tracing, level_for};

/// Crate version, shared by every workspace member.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
