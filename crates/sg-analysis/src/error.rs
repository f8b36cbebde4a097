//! Error types for sg-analysis

use thiserror::Error;

/// Analysis error type
///
/// Findings about the checked SQL are never errors; they are reported as
/// [`Diagnostic`](crate::Diagnostic)s. These variants cover misuse of the
/// diagnostic collector and failures bubbling up from the lower layers.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// AE001: A collection scope was entered while another one is active
    #[error("[AE001] A diagnostic collection scope is already active")]
    NestedCollection,

    /// AE002: Diagnostics were reported but never drained
    #[error("[AE002] {count} diagnostic(s) were reported outside of a collection scope and never drained")]
    UndrainedDiagnostics { count: usize },

    /// AE003: Core error propagation
    #[error("[AE003] Core error: {0}")]
    Core(#[from] sg_core::CoreError),

    /// AE004: SQL crate error propagation
    #[error("[AE004] SQL error: {0}")]
    Sql(#[from] sg_sql::SqlError),
}

/// Result type alias for AnalysisError
pub type AnalysisResult<T> = Result<T, AnalysisError>;
