//! Maps an assignment (and optional student) to checkout directories.
//!
//! Matching policy: a directory belongs to assignment `A` when its name
//! starts with `A-`. The separator is part of the prefix, so `hw10-carol`
//! is not a `hw1` checkout, while `hw1-extra-credit-alice` is.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{GcrError, Result};

/// Separator between assignment and student in checkout names.
pub const SEPARATOR: &str = "-";

/// One student's checkout of an assignment. May not exist on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TargetDirectory {
    /// Directory name, `{assignment}-{student}`.
    pub name: String,
    /// Full path under the working root.
    pub path: PathBuf,
}

impl TargetDirectory {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Whether the checkout is present as a directory.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

/// Checkout name for a student's copy of an assignment.
pub fn target_name(assignment: &str, student: &str) -> String {
    format!("{assignment}{SEPARATOR}{student}")
}

/// Resolves target directories under a working root.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve targets for `assignment`.
    ///
    /// With a student, returns exactly that checkout whether or not it
    /// exists. Without one, returns every child directory whose name starts
    /// with `{assignment}-`, sorted by name.
    pub fn resolve(&self, assignment: &str, student: Option<&str>) -> Result<Vec<TargetDirectory>> {
        if let Some(student) = student {
            let name = target_name(assignment, student);
            let path = self.root.join(&name);
            return Ok(vec![TargetDirectory::new(name, path)]);
        }

        let prefix = format!("{assignment}{SEPARATOR}");
        let entries = std::fs::read_dir(&self.root).map_err(|source| self.root_error(source))?;

        let mut targets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| self.root_error(source))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) {
                continue;
            }
            // Follows symlinks so linked checkouts still count.
            if !entry.path().is_dir() {
                continue;
            }
            targets.push(TargetDirectory::new(name, entry.path()));
        }

        targets.sort();
        Ok(targets)
    }

    /// Like [`resolve`](Self::resolve), but a requested student whose
    /// checkout is absent is an error.
    pub fn resolve_strict(
        &self,
        assignment: &str,
        student: Option<&str>,
    ) -> Result<Vec<TargetDirectory>> {
        let targets = self.resolve(assignment, student)?;
        if student.is_some() {
            if let Some(missing) = targets.iter().find(|t| !t.exists()) {
                return Err(GcrError::TargetNotFound {
                    name: missing.name.clone(),
                    path: missing.path.clone(),
                });
            }
        }
        Ok(targets)
    }

    fn root_error(&self, source: std::io::Error) -> GcrError {
        GcrError::WorkingRoot {
            path: self.root.clone(),
            source,
        }
    }
}
