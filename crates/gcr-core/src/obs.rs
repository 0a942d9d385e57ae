//! Structured observability hooks for batch lifecycle events.
//!
//! This module provides:
//! - Batch-scoped tracing spans via the `BatchSpan` RAII guard
//! - Emission functions for batch start, per-target completion and batch finish
//!
//! Events are emitted at `info!`/`debug!` level (filter with `RUST_LOG`).

use tracing::{debug, info, warn};

/// RAII guard that enters a batch-scoped span for the duration of a batch.
///
/// # Example
///
/// ```ignore
/// let _span = BatchSpan::enter("hw1");
/// // every tracing call is now tagged with assignment = "hw1"
/// ```
pub struct BatchSpan {
    _span: tracing::span::EnteredSpan,
}

impl BatchSpan {
    /// Create and enter a span tagged with the assignment name.
    pub fn enter(assignment: &str) -> Self {
        let span = tracing::info_span!("gcr.batch", assignment = %assignment);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: batch started.
pub fn emit_batch_started(command: &str, targets: usize, jobs: usize) {
    info!(event = "batch.started", command = %command, targets = targets, jobs = jobs);
}

/// Emit event: one target finished.
pub fn emit_target_finished(target: &str, exit_code: i32, elapsed_ms: u64, passed: bool) {
    debug!(
        event = "target.finished",
        target_dir = %target,
        exit_code = exit_code,
        elapsed_ms = elapsed_ms,
        passed = passed,
    );
}

/// Emit event: batch finished with pass/fail counts.
pub fn emit_batch_finished(total: usize, passed: usize, failed: usize, duration_ms: u64) {
    info!(
        event = "batch.finished",
        total = total,
        passed = passed,
        failed = failed,
        duration_ms = duration_ms,
    );
}

/// Emit event: a fan-out task ended without producing a result (warning level).
pub fn emit_task_lost(error: &dyn std::fmt::Display) {
    warn!(event = "batch.task_lost", error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_batch_span_create() {
        let _span = BatchSpan::enter("hw1");
    }

    #[traced_test]
    #[test]
    fn test_batch_events_carry_fields() {
        emit_batch_started("pytest --color=yes", 12, 4);
        emit_batch_finished(12, 10, 2, 900);

        assert!(logs_contain("batch.started"));
        assert!(logs_contain("targets=12"));
        assert!(logs_contain("jobs=4"));
        assert!(logs_contain("batch.finished"));
        assert!(logs_contain("failed=2"));
    }

    #[traced_test]
    #[test]
    fn test_target_finished_names_directory() {
        emit_target_finished("hw1-alice", 3, 15, false);
        assert!(logs_contain("target.finished"));
        assert!(logs_contain("hw1-alice"));
        assert!(logs_contain("exit_code=3"));
    }

    #[traced_test]
    #[test]
    fn test_task_lost_is_warning() {
        emit_task_lost(&"task panicked");
        assert!(logs_contain("WARN"));
        assert!(logs_contain("task panicked"));
    }
}
