//! sg-analysis: static checking of SQL templates against declared tables
//!
//! This crate extracts table and column references from lowered SQL
//! statements, resolves them against the declared table schemas, validates
//! INSERT completeness and declared result shapes, and maps every finding
//! back to the host source file.

pub(crate) mod diagnostics;
pub(crate) mod error;
pub(crate) mod extractor;
pub(crate) mod file;
pub(crate) mod inference;
pub(crate) mod query;
pub(crate) mod resolver;
pub(crate) mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use diagnostics::{
    apply_severity_overrides, map_to_source_location, overall_location, Diagnostic,
    DiagnosticCode, DiagnosticCollector, OverriddenSeverity, Severity, SeverityOverrides,
};
pub use error::{AnalysisError, AnalysisResult};
pub use extractor::{
    extract_query, is_placeholder_select, is_subquery, returns_into_parent_query,
    ExtractionContext,
};
pub use file::{
    check_files, collect_schemas, validate_file, validate_file_with, CheckOptions, CheckReport,
};
pub use inference::{DeclaredTypes, TypeInference};
pub use query::{
    ColumnReference, QualifiedColumn, Query, QueryInvocation, QuerySource, ResultTypeAssertion,
    StatementKind, TableReference, UnqualifiedColumn, WildcardColumn, WildcardTarget,
};
pub use resolver::{
    resolve_table_name, resolve_to_concrete, resolve_unqualified, resolve_wildcard,
    ResolveError, SchemaSet,
};
pub use validator::{check_schemas_for_duplicates, synthetic_schema, validate_query};
