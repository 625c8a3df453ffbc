//! Pre-install validation.
//!
//! The [`Validator`] runs every declared package file through a
//! kind-specific checker and collects *all* findings into a single
//! [`ValidationReport`]. It never short-circuits on the first invalid file
//! and never mutates the filesystem, so it is always safe to call
//! repeatedly.
//!
//! Checkers are pluggable: the validator holds a table mapping
//! [`FileKind`] to a boxed [`FileChecker`] built at construction.
//! Replacing a checker ([`Validator::with_checker`]) changes behavior for
//! that kind without touching dispatch.

mod checkers;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::package::{FileKind, Package, PlayerKind};

pub use checkers::{
    ConfigChecker, PluginJsChecker, PluginLuaChecker, ScriptOptChecker, ShaderChecker,
};

/// Severity of a single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One finding produced by a checker, not yet tied to a file path.
#[derive(Debug, Clone)]
pub struct Finding {
    pub severity: Severity,
    /// 1-based line number, when the underlying format allows one.
    pub line: Option<usize>,
    pub message: String,
}

impl Finding {
    /// A file-level error finding.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            line: None,
            message: message.into(),
        }
    }

    /// A line-numbered error finding.
    pub fn error_at(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            line: Some(line),
            message: message.into(),
        }
    }

    /// A file-level warning finding.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            line: None,
            message: message.into(),
        }
    }

    /// A line-numbered warning finding.
    pub fn warning_at(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            line: Some(line),
            message: message.into(),
        }
    }
}

/// A finding tied to the package file it was produced for.
#[derive(Debug, Clone)]
pub struct Issue {
    /// Package-relative path of the offending file.
    pub file: PathBuf,
    /// 1-based line number, when available.
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.file.display(), line, self.message),
            None => write!(f, "{}: {}", self.file.display(), self.message),
        }
    }
}

/// Outcome of validating a whole package.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Errors, in declaration order of the files that produced them.
    pub errors: Vec<Issue>,
    /// Warnings, same ordering.
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    /// True when no errors were found (warnings do not fail validation).
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, file: &Path, finding: Finding) {
        let issue = Issue {
            file: file.to_path_buf(),
            line: finding.line,
            message: finding.message,
        };
        match finding.severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// A kind-specific file checker.
///
/// Checkers return line-numbered findings whenever the underlying text
/// format makes that possible; opaque formats fall back to file-level
/// findings.
pub trait FileChecker: Send + Sync {
    fn check(&self, path: &Path, player: PlayerKind) -> Vec<Finding>;
}

/// Package validator with per-kind checker dispatch.
pub struct Validator {
    checkers: HashMap<FileKind, Box<dyn FileChecker>>,
}

impl Validator {
    /// Create a validator with the default checker table.
    pub fn new() -> Self {
        let mut checkers: HashMap<FileKind, Box<dyn FileChecker>> = HashMap::new();
        checkers.insert(FileKind::Config, Box::new(ConfigChecker));
        checkers.insert(FileKind::PluginLua, Box::new(PluginLuaChecker));
        checkers.insert(FileKind::PluginJs, Box::new(PluginJsChecker));
        checkers.insert(FileKind::Shader, Box::new(ShaderChecker));
        checkers.insert(FileKind::ScriptOpt, Box::new(ScriptOptChecker));
        Self { checkers }
    }

    /// Replace the checker for one file kind (builder pattern).
    pub fn with_checker(mut self, kind: FileKind, checker: Box<dyn FileChecker>) -> Self {
        self.checkers.insert(kind, checker);
        self
    }

    /// Validate every declared file of `package` against `source_root`.
    ///
    /// Runs to completion and collects all findings: a report with `m`
    /// invalid required files carries `m` file-level errors, never fewer.
    pub fn validate(&self, package: &Package, source_root: &Path) -> ValidationReport {
        let mut report = ValidationReport::default();

        for file in &package.files {
            if !file.has_safe_target() {
                report.push(
                    &file.source,
                    Finding::error(format!(
                        "target path escapes the target directory: {}",
                        file.target.display()
                    )),
                );
            }

            let source = source_root.join(&file.source);
            if !source.exists() {
                let finding = if file.required {
                    Finding::error("required file is missing from the package")
                } else {
                    Finding::warning("optional file is missing from the package")
                };
                report.push(&file.source, finding);
                continue;
            }

            if let Some(checker) = self.checkers.get(&file.kind) {
                for finding in checker.check(&source, package.player) {
                    report.push(&file.source, finding);
                }
            }
        }

        debug!(
            package = package.name,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validated package"
        );
        report
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
