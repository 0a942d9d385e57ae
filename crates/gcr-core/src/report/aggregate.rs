//! Whole-batch pass/fail summary with timing statistics.
//!
//! [`report_aggregate`] builds an [`AggregateReport`] from the results of a
//! finished batch. The report renders as a table plus a statistics panel,
//! or serializes to JSON for scripting.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::executor::{BatchObserver, RunFailure, RunResult};
use crate::report::panel::{Align, Cell, Table};

/// Shown in place of timing figures when nothing ran.
pub const NO_DATA: &str = "no data";

/// One row of the aggregate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub name: String,
    pub passed: bool,
    pub exit_code: i32,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
}

/// Min/max/mean elapsed time over a non-empty batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingStats {
    pub min_secs: f64,
    pub max_secs: f64,
    pub mean_secs: f64,
}

/// Pass/fail counts and timing for a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub passed: usize,
    pub failed: usize,
    /// `None` when the batch is empty.
    pub timing: Option<TimingStats>,
}

impl AggregateStats {
    pub fn from_results(results: &[RunResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let failed = results.len() - passed;
        let times: Vec<f64> = results.iter().map(RunResult::elapsed_secs).collect();
        Self {
            passed,
            failed,
            timing: TimingStats::from_secs(&times),
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

impl TimingStats {
    /// `None` for an empty slice.
    pub fn from_secs(times: &[f64]) -> Option<Self> {
        if times.is_empty() {
            return None;
        }
        let min_secs = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max_secs = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_secs = times.iter().sum::<f64>() / times.len() as f64;
        Some(Self {
            min_secs,
            max_secs,
            mean_secs,
        })
    }
}

/// Aggregate report for one command over one batch.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub command: String,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<AggregateRow>,
    pub stats: AggregateStats,
}

/// Build the aggregate report for a finished batch.
pub fn report_aggregate(results: &[RunResult], command_label: &str) -> AggregateReport {
    let rows = results
        .iter()
        .map(|r| AggregateRow {
            name: r.target.name.clone(),
            passed: r.passed(),
            exit_code: r.exit_code,
            elapsed_secs: r.elapsed_secs(),
            failure: r.failure.clone(),
        })
        .collect();

    AggregateReport {
        command: command_label.to_string(),
        generated_at: Utc::now(),
        rows,
        stats: AggregateStats::from_results(results),
    }
}

/// Seconds with two decimals and a unit suffix.
pub fn format_secs(secs: f64) -> String {
    format!("{secs:.2}s")
}

impl AggregateReport {
    /// Whether any target failed.
    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }

    /// Names of the failing targets, in report order.
    pub fn failing(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Render the table followed by the statistics panel.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.rows.is_empty() {
            writeln!(out, "{}", "no targets matched".yellow())?;
        } else {
            let mut table = Table::new(&[
                ("student", Align::Left),
                ("success", Align::Center),
                ("time", Align::Right),
            ]);
            for row in &self.rows {
                if row.passed {
                    table.add_row(vec![
                        Cell::painted(row.name.clone(), |s| s.green()),
                        Cell::painted("✓", |s| s.green()),
                        Cell::plain(format_secs(row.elapsed_secs)),
                    ]);
                } else {
                    table.add_row(vec![
                        Cell::painted(row.name.clone(), |s| s.red()),
                        Cell::painted("✗", |s| s.red()),
                        Cell::plain(format_secs(row.elapsed_secs)),
                    ]);
                }
            }
            table.render(out)?;
        }

        self.render_statistics(out)
    }

    fn render_statistics<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let timing = |pick: fn(&TimingStats) -> f64| {
            self.stats
                .timing
                .as_ref()
                .map(|t| format_secs(pick(t)))
                .unwrap_or_else(|| NO_DATA.to_string())
        };

        let entries: Vec<(Cell, String)> = vec![
            (Cell::painted("Command", |s| s.blue()), self.command.clone()),
            (Cell::painted("Total Passing", |s| s.green()), self.stats.passed.to_string()),
            (Cell::painted("Total Failing", |s| s.red()), self.stats.failed.to_string()),
            (Cell::painted("Min Time", |s| s.bold()), timing(|t| t.min_secs)),
            (Cell::painted("Max Time", |s| s.bold()), timing(|t| t.max_secs)),
            (Cell::painted("Average Time", |s| s.bold()), timing(|t| t.mean_secs)),
        ];

        let label_width = entries.iter().map(|(l, _)| l.text.chars().count()).max().unwrap_or(0);
        let value_width = entries
            .iter()
            .map(|(_, v)| v.chars().count())
            .max()
            .unwrap_or(0)
            .max(8);
        let inner = label_width + value_width + 1;

        let title = "Statistics";
        let fill = "─".repeat((inner + 2).saturating_sub(title.chars().count() + 3));
        writeln!(out, "╭─ {} {fill}╮", title.bold().white())?;
        for (label, value) in &entries {
            let gap = label_width - label.text.chars().count();
            writeln!(
                out,
                "│ {}{} {:>value_width$} │",
                (label.paint)(&label.text),
                " ".repeat(gap),
                value
            )?;
        }
        writeln!(out, "╰{}╯", "─".repeat(inner + 2))
    }
}

/// Progress bar that advances as targets finish.
///
/// Drawn on stderr; indicatif hides it when stderr is not a terminal.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: usize, label: &str) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{prefix} [{bar:30.cyan/blue}] {pos}/{len} {elapsed} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar.set_prefix(format!("Running '{label}'..."));
        Self { bar }
    }

    /// Remove the bar once the batch is done.
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

impl BatchObserver for ProgressObserver {
    // Parallel batches call on_start for every target at queue time.
    fn on_finish(&mut self, _index: usize, result: &RunResult) {
        self.bar.set_message(result.target.name.clone());
        self.bar.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::TargetDirectory;
    use std::time::Duration;

    fn result(name: &str, exit_code: i32, secs: f64) -> RunResult {
        RunResult {
            target: TargetDirectory::new(name, format!("/work/{name}")),
            exit_code,
            elapsed: Duration::from_secs_f64(secs),
            stdout: Vec::new(),
            stderr: Vec::new(),
            failure: None,
        }
    }

    fn render(report: &AggregateReport) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        report.render(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_stats_over_one_two_three_seconds() {
        let results = vec![
            result("hw1-a", 0, 1.0),
            result("hw1-b", 1, 2.0),
            result("hw1-c", 0, 3.0),
        ];
        let stats = AggregateStats::from_results(&results);

        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed, 1);
        let timing = stats.timing.unwrap();
        assert_eq!(format_secs(timing.min_secs), "1.00s");
        assert_eq!(format_secs(timing.max_secs), "3.00s");
        assert_eq!(format_secs(timing.mean_secs), "2.00s");
    }

    #[test]
    fn test_empty_batch_has_no_timing() {
        let report = report_aggregate(&[], "pytest");
        assert_eq!(report.stats.passed, 0);
        assert_eq!(report.stats.failed, 0);
        assert!(report.stats.timing.is_none());
        assert!(!report.has_failures());

        let text = render(&report);
        assert!(text.contains("no targets matched"));
        assert_eq!(text.matches(NO_DATA).count(), 3);
    }

    #[test]
    fn test_render_rows_and_statistics() {
        let report = report_aggregate(
            &[result("hw1-alice", 0, 0.5), result("hw1-bob", 1, 1.5)],
            "make test",
        );
        let text = render(&report);

        assert!(text.contains("│ hw1-alice │    ✓    │ 0.50s │"));
        assert!(text.contains("│ hw1-bob   │    ✗    │ 1.50s │"));
        assert!(text.contains("Statistics"));
        assert!(text.contains("make test"));
        assert!(text.contains("Average Time"));
        assert!(text.contains("1.00s"));
        // Table comes before the summary block.
        assert!(text.find("hw1-bob").unwrap() < text.find("Statistics").unwrap());
    }

    #[test]
    fn test_failing_names() {
        let report = report_aggregate(
            &[result("hw1-a", 2, 0.1), result("hw1-b", 0, 0.1), result("hw1-c", -2, 0.1)],
            "true",
        );
        assert!(report.has_failures());
        assert_eq!(report.failing(), vec!["hw1-a", "hw1-c"]);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = report_aggregate(&[result("hw1-a", 0, 1.0)], "true");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["command"], "true");
        assert_eq!(json["rows"][0]["name"], "hw1-a");
        assert_eq!(json["stats"]["passed"], 1);
        assert_eq!(json["stats"]["timing"]["max_secs"], 1.0);
    }

    #[test]
    fn test_progress_observer_counts() {
        let mut progress = ProgressObserver::new(2, "true");
        let r = result("hw1-a", 0, 0.1);
        let later = result("hw1-b", 0, 0.1);
        progress.on_start(0, &r.target);
        progress.on_start(1, &later.target);
        assert_eq!(progress.bar.message(), "");

        progress.on_finish(0, &r);
        assert_eq!(progress.bar.position(), 1);
        assert_eq!(progress.bar.message(), "hw1-a");
        progress.finish();
    }
}
