//! Diagnostics: the error taxonomy of a generation run and the shared sink
//! every stage reports into.
//!
//! A diagnostic never aborts the run. It excludes the offending descriptor
//! (or warns about one) and the pipeline carries on with the rest.

use std::fmt;

use colored::Colorize;
use parking_lot::Mutex;
use serde::Serialize;

// ------------------------------- Taxonomy --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Tag applied to something that is not a record.
    InvalidTargetKind,
    /// Tagged type does not declare its `Source` contract.
    MissingContract,
    /// A component's field type cannot be resolved to something emittable.
    UnresolvedEffectiveType,
    /// Component name is not a usable snake_case identifier.
    InvalidComponentName,
    /// A second type claims a sealed `Source` contract.
    SealedContractViolation,
    /// Two roots of one namespace derive the same companion name.
    DuplicateCompanion,
    /// Nested tagged type whose tagged enclosing type produced no companion.
    SkippedNested,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::SkippedNested => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::InvalidTargetKind => "invalid-target-kind",
            DiagnosticKind::MissingContract => "missing-contract",
            DiagnosticKind::UnresolvedEffectiveType => "unresolved-effective-type",
            DiagnosticKind::InvalidComponentName => "invalid-component-name",
            DiagnosticKind::SealedContractViolation => "sealed-contract-violation",
            DiagnosticKind::DuplicateCompanion => "duplicate-companion",
            DiagnosticKind::SkippedNested => "skipped-nested",
        }
    }
}

// ------------------------------- Location --------------------------------- //

/// Where a diagnostic points: graph document, qualified type, and optionally
/// one of the type's components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub source: String,
    pub item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl Location {
    pub fn item(source: impl Into<String>, item: impl Into<String>) -> Self {
        Self { source: source.into(), item: item.into(), component: None }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.item)?;
        if let Some(component) = &self.component {
            write!(f, ".{component}")?;
        }
        Ok(())
    }
}

// ------------------------------ Diagnostic -------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Terminal rendering (colors honor `NO_COLOR` via `colored`).
    pub fn render(&self) -> String {
        let head = match self.severity() {
            Severity::Error => format!("error[{}]", self.kind.code()).red().bold(),
            Severity::Warning => format!("warning[{}]", self.kind.code()).yellow().bold(),
        };
        format!(
            "{head}: {}\n  {} {}",
            self.message,
            "-->".blue().bold(),
            self.location
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}[{}] {}: {}", self.kind.code(), self.location, self.message)
    }
}

// --------------------------------- Sink ----------------------------------- //

/// Append-only, shareable across threads. Report order is not meaningful;
/// [`DiagnosticSink::into_sorted`] gives the stable view.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, kind: DiagnosticKind, location: Location, message: impl Into<String>) {
        let diagnostic = Diagnostic { kind, location, message: message.into() };
        tracing::debug!(code = kind.code(), location = %diagnostic.location, "{}", diagnostic.message);
        self.entries.lock().push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.entries.lock().iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut entries = self.entries.into_inner();
        entries.sort_by(|a, b| {
            a.location
                .cmp(&b.location)
                .then(a.kind.cmp(&b.kind))
                .then(a.message.cmp(&b.message))
        });
        entries
    }
}

// ------------------------------- Tests ------------------------------------ //
