//! Reporters for fan-out results.
//!
//! Provides:
//! - [`interactive::InteractiveReporter`]: per-target panels with filtering and pausing
//! - [`aggregate::AggregateReport`]: pass/fail table plus timing statistics
//! - [`panel`]: the box-drawing primitives both reporters share

pub mod aggregate;
pub mod interactive;
pub mod panel;

use std::io::{self, BufRead};

use crate::error::{GcrError, Result};
use crate::executor::RunResult;

pub use aggregate::{report_aggregate, AggregateReport, AggregateRow, AggregateStats, ProgressObserver, TimingStats};
pub use interactive::{report_interactive, run_interactive, InteractiveReporter};
pub use panel::{Panel, Table};

/// Subtitle shown under a panel when the reporter pauses after it.
pub const CONTINUE_PROMPT: &str = "press <Enter> to continue";

/// Which results the interactive reporter shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    All,
    ErrorsOnly,
    SuccessOnly,
}

impl FilterMode {
    /// Build from the two CLI flags; both at once is a conflict.
    pub fn from_flags(errors_only: bool, success_only: bool) -> Result<Self> {
        match (errors_only, success_only) {
            (true, true) => Err(GcrError::ConfigConflict(
                "--errors-only and --success-only are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(FilterMode::ErrorsOnly),
            (false, true) => Ok(FilterMode::SuccessOnly),
            (false, false) => Ok(FilterMode::All),
        }
    }

    /// Whether `result` is shown under this mode.
    pub fn includes(&self, result: &RunResult) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::ErrorsOnly => result.exit_code != 0,
            FilterMode::SuccessOnly => result.exit_code == 0,
        }
    }

    /// Keep only the results this mode shows, preserving order.
    pub fn filter<'a, I>(&self, results: I) -> Vec<&'a RunResult>
    where
        I: IntoIterator<Item = &'a RunResult>,
    {
        results.into_iter().filter(|r| self.includes(r)).collect()
    }
}

/// A blocking operator acknowledgment between presented results.
pub trait Acknowledge {
    /// Block until the operator continues.
    fn acknowledge(&mut self) -> io::Result<()>;
}

/// Waits for a line on stdin. Any input, including EOF, continues.
pub struct StdinAcknowledge;

impl Acknowledge for StdinAcknowledge {
    fn acknowledge(&mut self) -> io::Result<()> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::TargetDirectory;
    use std::time::Duration;

    fn result(name: &str, exit_code: i32) -> RunResult {
        RunResult {
            target: TargetDirectory::new(name, format!("/work/{name}")),
            exit_code,
            elapsed: Duration::from_millis(10),
            stdout: Vec::new(),
            stderr: Vec::new(),
            failure: None,
        }
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(FilterMode::from_flags(false, false).unwrap(), FilterMode::All);
        assert_eq!(FilterMode::from_flags(true, false).unwrap(), FilterMode::ErrorsOnly);
        assert_eq!(FilterMode::from_flags(false, true).unwrap(), FilterMode::SuccessOnly);
        assert!(matches!(
            FilterMode::from_flags(true, true),
            Err(GcrError::ConfigConflict(_))
        ));
    }

    #[test]
    fn test_includes() {
        let pass = result("hw1-a", 0);
        let fail = result("hw1-b", 2);
        let sentinel = result("hw1-c", -1);

        assert!(FilterMode::All.includes(&pass) && FilterMode::All.includes(&fail));
        assert!(!FilterMode::ErrorsOnly.includes(&pass));
        assert!(FilterMode::ErrorsOnly.includes(&fail));
        assert!(FilterMode::ErrorsOnly.includes(&sentinel));
        assert!(FilterMode::SuccessOnly.includes(&pass));
        assert!(!FilterMode::SuccessOnly.includes(&fail));
    }

    #[test]
    fn test_errors_only_filter_is_idempotent() {
        let results = vec![
            result("hw1-a", 1),
            result("hw1-b", 0),
            result("hw1-c", 127),
            result("hw1-d", 0),
        ];
        let once = FilterMode::ErrorsOnly.filter(&results);
        let twice = FilterMode::ErrorsOnly.filter(once.iter().copied());

        let names = |rs: &[&RunResult]| rs.iter().map(|r| r.target.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&once), vec!["hw1-a", "hw1-c"]);
        assert_eq!(names(&once), names(&twice));
    }
}
