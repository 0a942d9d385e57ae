//! Fan-out execution of one command across many target directories.
//!
//! A failing target never aborts the batch: missing directories, spawn
//! errors and timeouts are all folded into that target's [`RunResult`].

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::command::{normalize, CommandSpec};
use crate::error::{GcrError, Result};
use crate::obs::{emit_batch_finished, emit_batch_started, emit_target_finished, emit_task_lost};
use crate::resolver::TargetDirectory;

/// Exit status reported when the program never ran or died without a code.
pub const EXIT_SPAWN_FAILED: i32 = -1;

/// Exit status reported when the deadline passed and the process was killed.
pub const EXIT_TIMED_OUT: i32 = -2;

/// Why a target failed before producing an ordinary exit status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunFailure {
    /// The target directory does not exist.
    MissingDirectory,
    /// The program could not be started or waited on.
    SpawnFailed { reason: String },
    /// The program exceeded its deadline and was killed.
    TimedOut { limit_ms: u64 },
}

/// Outcome of running the command in one target.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Target the command ran in.
    pub target: TargetDirectory,

    /// Exit code (0 = success, negative = sentinel failure).
    pub exit_code: i32,

    /// Wall-clock time of the child process only.
    pub elapsed: Duration,

    /// Raw stdout bytes (empty when output was not captured).
    pub stdout: Vec<u8>,

    /// Raw stderr bytes, including gcr diagnostics for sentinel failures.
    pub stderr: Vec<u8>,

    /// Set when the program did not run to an ordinary exit.
    pub failure: Option<RunFailure>,
}

impl RunResult {
    /// Whether this target passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.exit_code == 0 && self.failure.is_none()
    }

    /// Elapsed time in fractional seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    fn failed(
        target: TargetDirectory,
        exit_code: i32,
        elapsed: Duration,
        failure: RunFailure,
        diagnostic: String,
    ) -> Self {
        Self {
            target,
            exit_code,
            elapsed,
            stdout: Vec::new(),
            stderr: diagnostic.into_bytes(),
            failure: Some(failure),
        }
    }
}

/// How commands are launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSettings {
    /// Capture stdout/stderr into memory instead of inheriting the terminal.
    pub capture: bool,

    /// Per-target deadline; `None` waits forever.
    pub timeout: Option<Duration>,

    /// Maximum targets running at once (1 = sequential).
    pub jobs: usize,
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            capture: true,
            timeout: None,
            jobs: 1,
        }
    }
}

impl ExecSettings {
    /// Reject combinations that cannot be honoured.
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(GcrError::ConfigConflict(
                "--jobs must be at least 1".to_string(),
            ));
        }
        if self.jobs > Semaphore::MAX_PERMITS {
            return Err(GcrError::ConfigConflict(format!(
                "--jobs must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if self.jobs > 1 && !self.capture {
            return Err(GcrError::ConfigConflict(
                "parallel jobs require captured output; drop --no-capture or use --jobs 1"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Receives progress callbacks from the task driving a batch.
pub trait BatchObserver {
    /// A target is about to run (sequential) or was queued (parallel).
    fn on_start(&mut self, _index: usize, _target: &TargetDirectory) {}

    /// A target finished; `index` is its position in the input.
    fn on_finish(&mut self, _index: usize, _result: &RunResult) {}
}

/// Observer that ignores every callback.
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Runs a command in each target directory.
#[derive(Debug, Clone)]
pub struct FanOutExecutor {
    settings: ExecSettings,
}

impl FanOutExecutor {
    pub fn new(settings: ExecSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &ExecSettings {
        &self.settings
    }

    /// Run `command` in a single target.
    pub async fn execute_one(&self, target: &TargetDirectory, command: &CommandSpec) -> RunResult {
        let command = normalize(command, self.settings.capture);
        let result = run_target(
            target.clone(),
            &command,
            self.settings.capture,
            self.settings.timeout,
        )
        .await;
        emit_finished(&result);
        result
    }

    /// Run `command` in every target; one result per target, input order.
    pub async fn execute_batch(
        &self,
        targets: &[TargetDirectory],
        command: &CommandSpec,
    ) -> Vec<RunResult> {
        self.execute_batch_observed(targets, command, &mut NoopObserver)
            .await
    }

    /// [`execute_batch`](Self::execute_batch) with progress callbacks.
    pub async fn execute_batch_observed<O>(
        &self,
        targets: &[TargetDirectory],
        command: &CommandSpec,
        observer: &mut O,
    ) -> Vec<RunResult>
    where
        O: BatchObserver + ?Sized,
    {
        let start = Instant::now();
        let command = normalize(command, self.settings.capture);
        emit_batch_started(&command.to_string(), targets.len(), self.settings.jobs);

        let results = if self.settings.jobs <= 1 {
            self.run_sequential(targets, &command, observer).await
        } else {
            self.run_parallel(targets, command, observer).await
        };

        let passed = results.iter().filter(|r| r.passed()).count();
        emit_batch_finished(
            results.len(),
            passed,
            results.len() - passed,
            start.elapsed().as_millis() as u64,
        );
        results
    }

    async fn run_sequential<O>(
        &self,
        targets: &[TargetDirectory],
        command: &CommandSpec,
        observer: &mut O,
    ) -> Vec<RunResult>
    where
        O: BatchObserver + ?Sized,
    {
        let mut results = Vec::with_capacity(targets.len());
        for (idx, target) in targets.iter().enumerate() {
            observer.on_start(idx, target);
            let result = run_target(
                target.clone(),
                command,
                self.settings.capture,
                self.settings.timeout,
            )
            .await;
            emit_finished(&result);
            observer.on_finish(idx, &result);
            results.push(result);
        }
        results
    }

    async fn run_parallel<O>(
        &self,
        targets: &[TargetDirectory],
        command: CommandSpec,
        observer: &mut O,
    ) -> Vec<RunResult>
    where
        O: BatchObserver + ?Sized,
    {
        let command = Arc::new(command);
        let semaphore = Arc::new(Semaphore::new(self.settings.jobs));
        let capture = self.settings.capture;
        let timeout = self.settings.timeout;

        let mut join_set = JoinSet::new();
        for (idx, target) in targets.iter().cloned().enumerate() {
            observer.on_start(idx, &target);
            let command = Arc::clone(&command);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                (idx, run_target(target, &command, capture, timeout).await)
            });
        }

        let mut slots: Vec<Option<RunResult>> = vec![None; targets.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, result)) => {
                    emit_finished(&result);
                    observer.on_finish(idx, &result);
                    slots[idx] = Some(result);
                }
                Err(e) => emit_task_lost(&e),
            }
        }

        // Join barrier passed; refill any slot whose task panicked.
        targets
            .iter()
            .zip(slots)
            .map(|(target, slot)| {
                slot.unwrap_or_else(|| {
                    let reason = "execution task aborted".to_string();
                    RunResult::failed(
                        target.clone(),
                        EXIT_SPAWN_FAILED,
                        Duration::ZERO,
                        RunFailure::SpawnFailed {
                            reason: reason.clone(),
                        },
                        format!("gcr: {reason}\n"),
                    )
                })
            })
            .collect()
    }
}

fn emit_finished(result: &RunResult) {
    emit_target_finished(
        &result.target.name,
        result.exit_code,
        result.elapsed.as_millis() as u64,
        result.passed(),
    );
}

/// Spawn `command` in `target` and wait for it.
async fn run_target(
    target: TargetDirectory,
    command: &CommandSpec,
    capture: bool,
    timeout: Option<Duration>,
) -> RunResult {
    if !target.exists() {
        let diagnostic = format!(
            "gcr: directory '{}' does not exist\n",
            target.path.display()
        );
        return RunResult::failed(
            target,
            EXIT_SPAWN_FAILED,
            Duration::ZERO,
            RunFailure::MissingDirectory,
            diagnostic,
        );
    }

    let mut cmd = Command::new(command.program());
    cmd.args(command.args())
        .current_dir(&target.path)
        .kill_on_drop(true);
    if capture {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
    } else {
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
    }

    debug!(target_dir = %target.name, program = %command.program(), "Spawning");
    let start = Instant::now();
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let reason = format!("failed to start '{}': {e}", command.program());
            let diagnostic = format!("gcr: {reason}\n");
            return RunResult::failed(
                target,
                EXIT_SPAWN_FAILED,
                start.elapsed(),
                RunFailure::SpawnFailed { reason },
                diagnostic,
            );
        }
    };

    let waited = match timeout {
        // Dropping the timed-out future drops the child, which kills it.
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited,
            Err(_) => {
                let diagnostic = format!(
                    "gcr: timed out after {:.2}s, process killed\n",
                    limit.as_secs_f64()
                );
                return RunResult::failed(
                    target,
                    EXIT_TIMED_OUT,
                    start.elapsed(),
                    RunFailure::TimedOut {
                        limit_ms: limit.as_millis() as u64,
                    },
                    diagnostic,
                );
            }
        },
        None => child.wait_with_output().await,
    };
    let elapsed = start.elapsed();

    match waited {
        Ok(output) => {
            let mut stderr = output.stderr;
            let exit_code = match output.status.code() {
                Some(code) => code,
                None => {
                    stderr.extend_from_slice(b"gcr: process terminated without an exit code\n");
                    EXIT_SPAWN_FAILED
                }
            };
            RunResult {
                target,
                exit_code,
                elapsed,
                stdout: output.stdout,
                stderr,
                failure: None,
            }
        }
        Err(e) => {
            let reason = format!("failed to wait for '{}': {e}", command.program());
            let diagnostic = format!("gcr: {reason}\n");
            RunResult::failed(
                target,
                EXIT_SPAWN_FAILED,
                elapsed,
                RunFailure::SpawnFailed { reason },
                diagnostic,
            )
        }
    }
}
