use std::fmt;

use crate::base::{FileId, Span};
use crate::core::IStr;
use crate::model::NodeId;

/// Severity of a diagnostic. `lintMode` downgrades some errors to warnings;
/// see [`crate::CompileOptions::lint_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Candidate names offered to an editor on an unresolved reference, so the
/// completion surface (§6 `complete`) can show `expectedTokens`/`validNames`
/// without re-running resolution.
#[derive(Debug, Clone, Default)]
pub struct ValidNames {
    pub names: Vec<IStr>,
}

/// One diagnostic: severity, location, stable message id, rendered text,
/// and an optional "home" artifact for secondary context.
#[derive(Debug, Clone)]
pub struct Message {
    pub severity: Severity,
    pub code: &'static str,
    pub file: FileId,
    pub span: Span,
    pub text: String,
    pub home: Option<NodeId>,
    pub valid_names: Option<ValidNames>,
}

impl Message {
    pub fn new(
        severity: Severity,
        code: &'static str,
        file: FileId,
        span: Span,
        text: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            file,
            span,
            text: text.into(),
            home: None,
            valid_names: None,
        }
    }

    pub fn error(code: &'static str, file: FileId, span: Span, text: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, file, span, text)
    }

    pub fn warning(code: &'static str, file: FileId, span: Span, text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, file, span, text)
    }

    pub fn info(code: &'static str, file: FileId, span: Span, text: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, file, span, text)
    }

    pub fn with_home(mut self, home: NodeId) -> Self {
        self.home = Some(home);
        self
    }

    pub fn with_valid_names(mut self, names: Vec<IStr>) -> Self {
        self.valid_names = Some(ValidNames { names });
        self
    }

    /// Render as `‹file›:‹line›:‹col›: ‹severity›: ‹text› [‹id›]`.
    /// `file_name` is resolved by the caller from `self.file`
    /// via the compile-time [`crate::base::FileTable`].
    pub fn render(&self, file_name: &str) -> String {
        format!(
            "{}:{}:{}: {}: {} [{}]",
            file_name,
            self.span.start.line + 1,
            self.span.start.column + 1,
            self.severity,
            self.text,
            self.code
        )
    }
}

/// Dedup key: same location, same code is the same diagnostic even if the
/// substituted text differs slightly across repeated passes.
pub(super) type DedupKey = (FileId, usize, usize, &'static str);

impl Message {
    pub(super) fn dedup_key(&self) -> DedupKey {
        (
            self.file,
            self.span.start.line,
            self.span.start.column,
            self.code,
        )
    }
}
