//! File verbs: view or overwrite one file across every target directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::report::panel::Panel;
use crate::report::{Acknowledge, CONTINUE_PROMPT};
use crate::resolver::TargetDirectory;

/// Render `filename` from each target in its own panel.
///
/// A file that cannot be read shows the error inside its panel; the loop
/// moves on to the next target. Returns the number of panels drawn.
pub fn show_file<W: Write>(
    out: &mut W,
    targets: &[TargetDirectory],
    filename: &str,
    mut pause: Option<&mut dyn Acknowledge>,
) -> Result<usize> {
    for target in targets {
        let path = target.path.join(filename);
        let body = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "show_file: unreadable");
                format!("could not read {}: {e}", path.display())
                    .red()
                    .to_string()
            }
        };

        let title = format!("{}/{}", target.name, filename);
        let subtitle = pause.as_ref().map(|_| CONTINUE_PROMPT);
        Panel::new(&title)
            .with_subtitle(subtitle)
            .render(out, &body)?;
        out.flush()?;

        if let Some(ack) = pause.as_mut() {
            ack.acknowledge()?;
        }
    }
    Ok(targets.len())
}

/// Outcome of copying one file into every target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    /// Destinations written.
    pub updated: Vec<PathBuf>,
    /// Destinations that already are the source file.
    pub skipped: Vec<PathBuf>,
    /// Destinations that could not be written, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl UpdateSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Copy `source` to `target/relative_path` for every target.
///
/// Copy errors are collected per target rather than returned.
pub fn update_file(targets: &[TargetDirectory], source: &Path, relative_path: &Path) -> UpdateSummary {
    let mut summary = UpdateSummary::default();

    for target in targets {
        let dest = target.path.join(relative_path);
        if is_same_file(source, &dest) {
            summary.skipped.push(dest);
            continue;
        }
        match fs::copy(source, &dest) {
            Ok(_) => {
                debug!(dest = %dest.display(), "update_file: copied");
                summary.updated.push(dest);
            }
            Err(e) => {
                warn!(dest = %dest.display(), error = %e, "update_file: copy failed");
                summary.failed.push((dest, e.to_string()));
            }
        }
    }
    summary
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
