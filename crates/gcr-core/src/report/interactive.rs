//! Per-target interactive report: one panel per shown result.

use std::io::Write;
use std::time::Instant;

use colored::Colorize;

use crate::command::CommandSpec;
use crate::error::Result;
use crate::executor::{FanOutExecutor, RunResult};
use crate::obs::{emit_batch_finished, emit_batch_started};
use crate::report::panel::Panel;
use crate::report::{Acknowledge, FilterMode, CONTINUE_PROMPT};
use crate::resolver::TargetDirectory;

/// Renders results one at a time, optionally pausing after each.
pub struct InteractiveReporter<W: Write> {
    out: W,
    filter: FilterMode,
    capture: bool,
    pause: Option<Box<dyn Acknowledge>>,
    shown: usize,
}

impl<W: Write> InteractiveReporter<W> {
    /// `capture` must match the executor: streamed output was already
    /// printed, so only a status line is shown for it.
    pub fn new(out: W, filter: FilterMode, capture: bool) -> Self {
        Self {
            out,
            filter,
            capture,
            pause: None,
            shown: 0,
        }
    }

    /// Pause for acknowledgment after each shown result.
    pub fn with_pause(mut self, pause: Box<dyn Acknowledge>) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Number of results rendered so far.
    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Name the target before it runs so streamed output can be attributed.
    pub fn announce(&mut self, target: &TargetDirectory) -> Result<()> {
        if !self.capture {
            writeln!(self.out, "{}", target.name.bold().white())?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Render one result if the filter includes it. Returns whether it was shown.
    pub fn present(&mut self, result: &RunResult) -> Result<bool> {
        if !self.filter.includes(result) {
            return Ok(false);
        }

        if self.capture {
            let mut body = String::from_utf8_lossy(&result.stderr).into_owned();
            body.push_str(&String::from_utf8_lossy(&result.stdout));
            let subtitle = self.pause.as_ref().map(|_| CONTINUE_PROMPT);
            Panel::new(&result.target.name)
                .with_subtitle(subtitle)
                .render(&mut self.out, &body)?;
        } else {
            let status = if result.passed() {
                format!("✓ {} passed", result.target.name).green()
            } else {
                format!("✗ {} exited with {}", result.target.name, result.exit_code).red()
            };
            writeln!(self.out, "{status}")?;
            // Diagnostics from gcr itself are still captured in stream mode.
            if !result.stderr.is_empty() {
                self.out.write_all(&result.stderr)?;
            }
            if self.pause.is_some() {
                writeln!(self.out, "{}", CONTINUE_PROMPT.dimmed())?;
            }
        }
        self.out.flush()?;
        self.shown += 1;

        if let Some(pause) = self.pause.as_mut() {
            pause.acknowledge()?;
        }
        Ok(true)
    }

    /// Present a finished batch in order.
    pub fn report_all(&mut self, results: &[RunResult]) -> Result<usize> {
        let before = self.shown;
        for result in results {
            self.present(result)?;
        }
        Ok(self.shown - before)
    }
}

/// Present already-captured results with `filter`, pausing after each shown
/// one when `pause` is set. Returns the number shown.
pub fn report_interactive<W: Write>(
    out: W,
    results: &[RunResult],
    filter: FilterMode,
    pause: Option<Box<dyn Acknowledge>>,
) -> Result<usize> {
    let mut reporter = InteractiveReporter::new(out, filter, true);
    if let Some(pause) = pause {
        reporter = reporter.with_pause(pause);
    }
    reporter.report_all(results)
}

/// Run `command` over `targets`, presenting results through `reporter`.
///
/// Sequential executors present each result as soon as it finishes.
/// Parallel executors run the whole batch first, then present in order,
/// so pauses never overlap running children.
pub async fn run_interactive<W: Write>(
    executor: &FanOutExecutor,
    targets: &[TargetDirectory],
    command: &CommandSpec,
    reporter: &mut InteractiveReporter<W>,
) -> Result<Vec<RunResult>> {
    if executor.settings().jobs > 1 {
        let results = executor.execute_batch(targets, command).await;
        reporter.report_all(&results)?;
        return Ok(results);
    }

    let start = Instant::now();
    emit_batch_started(&command.to_string(), targets.len(), 1);
    let mut results = Vec::with_capacity(targets.len());
    for target in targets {
        reporter.announce(target)?;
        let result = executor.execute_one(target, command).await;
        reporter.present(&result)?;
        results.push(result);
    }

    let passed = results.iter().filter(|r| r.passed()).count();
    emit_batch_finished(
        results.len(),
        passed,
        results.len() - passed,
        start.elapsed().as_millis() as u64,
    );
    Ok(results)
}
