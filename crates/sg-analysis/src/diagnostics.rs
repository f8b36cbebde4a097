//! Diagnostics engine: diagnostic records, the collection scope that gathers
//! them, mapping of generated-query offsets back to host source locations,
//! and user-configured severity overrides.

use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use sg_core::{ConfigSeverity, SourceLocation};
use sg_sql::QuerySourceMapSpan;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Potential issue worth reviewing; never fails a run
    Warning,
    /// The query does not match the declared schemas
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// SQL syntax error in the generated query
    SG001,
    /// Reference to a table that has not been declared
    SG002,
    /// Column that does not exist on its table, or on any table in scope
    SG003,
    /// Unqualified column matching more than one table in scope
    SG004,
    /// `*` selector that cannot be pinned to exactly one table
    SG005,
    /// Table declared more than once
    SG006,
    /// INSERT missing a column without default value
    SG007,
    /// Result rows do not match the declared result type
    SG008,
    /// Malformed column reference
    SG009,
    /// Spread or type argument that could not be inferred
    SG010,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::SG001 => "SG001",
            DiagnosticCode::SG002 => "SG002",
            DiagnosticCode::SG003 => "SG003",
            DiagnosticCode::SG004 => "SG004",
            DiagnosticCode::SG005 => "SG005",
            DiagnosticCode::SG006 => "SG006",
            DiagnosticCode::SG007 => "SG007",
            DiagnosticCode::SG008 => "SG008",
            DiagnosticCode::SG009 => "SG009",
            DiagnosticCode::SG010 => "SG010",
        }
    }

    /// Severity used unless overridden in the configuration
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::SG010 => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finding about a checked query or table declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Host source file the finding points into
    pub source_file: PathBuf,
    pub location: Option<SourceLocation>,
    /// Route to the offending node, e.g. `SelectStmt > targetList > ResTarget`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_path: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the code's default severity
    pub fn new(
        code: DiagnosticCode,
        message: impl Into<String>,
        source_file: impl Into<PathBuf>,
        location: Option<SourceLocation>,
    ) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            source_file: source_file.into(),
            location,
            query_path: None,
        }
    }

    pub fn with_query_path(mut self, query_path: impl Into<String>) -> Self {
        self.query_path = Some(query_path.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}:{}", self.source_file.display(), location)?,
            None => write!(f, "{}", self.source_file.display())?,
        }
        write!(f, " {}[{}]: {}", self.severity, self.code, self.message)
    }
}

/// Gathers diagnostics reported while a collection scope is active.
///
/// Only one scope may be active per collector; entering a second one is a
/// programming error. Every reported diagnostic must be drained by a scope
/// before the collector goes away.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    active: Cell<bool>,
    reported: RefCell<Vec<Diagnostic>>,
}

/// Resets the active flag even if the scope body unwinds
struct ScopeGuard<'c>(&'c Cell<bool>);

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` inside a collection scope and return its result together with
    /// every diagnostic reported in the meantime.
    pub fn collect<T>(&self, f: impl FnOnce(&Self) -> T) -> AnalysisResult<(T, Vec<Diagnostic>)> {
        if self.active.replace(true) {
            return Err(AnalysisError::NestedCollection);
        }
        let _guard = ScopeGuard(&self.active);
        let value = f(self);
        let diagnostics = self.reported.take();
        Ok((value, diagnostics))
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        if !self.active.get() {
            log::warn!(
                "Diagnostic {} reported outside of a collection scope",
                diagnostic.code
            );
        }
        self.reported.borrow_mut().push(diagnostic);
    }

    /// Whether a collection scope is currently active
    pub fn is_collecting(&self) -> bool {
        self.active.get()
    }

    /// Number of reported diagnostics not yet drained
    pub fn pending(&self) -> usize {
        self.reported.borrow().len()
    }

    /// Consume the collector, failing if diagnostics were left undrained
    pub fn finish(self) -> AnalysisResult<()> {
        let count = self.reported.take().len();
        if count > 0 {
            return Err(AnalysisError::UndrainedDiagnostics { count });
        }
        Ok(())
    }
}

impl Drop for DiagnosticCollector {
    fn drop(&mut self) {
        let count = self.reported.get_mut().len();
        if count > 0 && !std::thread::panicking() {
            panic!("{}", AnalysisError::UndrainedDiagnostics { count });
        }
    }
}

/// Map a byte offset of a generated query back to the host source file.
///
/// Inside literal text the newlines before `offset` are counted from the
/// span's recorded start; inside a substituted expression the location is the
/// expression's start point. Returns `None` when no span covers `offset`.
pub fn map_to_source_location(
    query: &str,
    source_map: &[QuerySourceMapSpan],
    offset: usize,
) -> Option<SourceLocation> {
    let span = source_map.iter().find(|span| span.contains(offset))?;
    let start = span.source_location.start;
    if span.is_template_expression {
        return Some(SourceLocation::point(start.line, start.column));
    }

    let before = query.get(span.query_start_index..offset)?;
    let location = match before.rfind('\n') {
        Some(last_newline) => SourceLocation::point(
            start.line + before.matches('\n').count(),
            before[last_newline + 1..].chars().count(),
        ),
        None => SourceLocation::point(start.line, start.column + before.chars().count()),
    };
    Some(location)
}

/// Location covering a whole generated query
pub fn overall_location(source_map: &[QuerySourceMapSpan]) -> Option<SourceLocation> {
    SourceLocation::overall(source_map.iter().map(|span| &span.source_location))
}

/// Effective severity after applying an override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverriddenSeverity {
    Level(Severity),
    /// Drop the diagnostic
    Off,
}

/// Per-code severity overrides from `analysis.severity_overrides`
#[derive(Debug, Clone, Default)]
pub struct SeverityOverrides {
    overrides: HashMap<String, OverriddenSeverity>,
}

impl SeverityOverrides {
    pub fn from_config(config: &HashMap<String, ConfigSeverity>) -> Self {
        let overrides = config
            .iter()
            .map(|(code, severity)| {
                let severity = match severity {
                    ConfigSeverity::Info => OverriddenSeverity::Level(Severity::Info),
                    ConfigSeverity::Warning => OverriddenSeverity::Level(Severity::Warning),
                    ConfigSeverity::Error => OverriddenSeverity::Level(Severity::Error),
                    ConfigSeverity::Off => OverriddenSeverity::Off,
                };
                (code.clone(), severity)
            })
            .collect();
        Self { overrides }
    }

    pub fn get_for_code(&self, code: DiagnosticCode) -> Option<OverriddenSeverity> {
        self.overrides.get(code.as_str()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Apply the overrides to `diagnostics`, preserving order
    pub fn apply(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        apply_severity_overrides(diagnostics, self)
    }
}

/// Re-level or drop diagnostics according to `overrides`
pub fn apply_severity_overrides(
    diagnostics: Vec<Diagnostic>,
    overrides: &SeverityOverrides,
) -> Vec<Diagnostic> {
    if overrides.is_empty() {
        return diagnostics;
    }
    diagnostics
        .into_iter()
        .filter_map(|mut diagnostic| match overrides.get_for_code(diagnostic.code) {
            Some(OverriddenSeverity::Off) => None,
            Some(OverriddenSeverity::Level(severity)) => {
                diagnostic.severity = severity;
                Some(diagnostic)
            }
            None => Some(diagnostic),
        })
        .collect()
}

#[cfg(test)]
#[path = "diagnostics_test.rs"]
mod tests;

#[cfg(test)]
#[path = "severity_override_test.rs"]
mod severity_override_tests;
