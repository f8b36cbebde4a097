//! Per-file and workspace drivers tying compilation, parsing, extraction and
//! validation together.

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector, SeverityOverrides};
use crate::error::AnalysisResult;
use crate::extractor::{extract_query, ExtractionContext};
use crate::inference::{DeclaredTypes, TypeInference};
use crate::query::{QueryInvocation, QuerySource, ResultTypeAssertion};
use crate::resolver::SchemaSet;
use crate::validator::{check_schemas_for_duplicates, validate_query};
use serde::Serialize;
use sg_core::{Config, Dialect, SourceFile, TableSchema, TemplateDescriptor};
use sg_sql::{compile_template, QueryNodePath, SqlParser};
use std::collections::HashMap;
use std::rc::Rc;

/// Settings shared by every checked file
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub dialect: Dialect,
    pub spread_update_column: String,
    pub severity_overrides: SeverityOverrides,
}

impl CheckOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dialect: config.dialect,
            spread_update_column: config.spread_update_column.clone(),
            severity_overrides: SeverityOverrides::from_config(
                &config.analysis.severity_overrides,
            ),
        }
    }
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of checking a set of files
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Diagnostics after severity overrides, in reporting order
    pub diagnostics: Vec<Diagnostic>,
    pub query_count: usize,
    pub table_count: usize,
}

impl CheckReport {
    /// Whether any remaining diagnostic is an error
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}

/// Every table declared in `files`, in file and declaration order
pub fn collect_schemas(files: &[SourceFile]) -> Vec<TableSchema> {
    files
        .iter()
        .flat_map(|file| {
            file.tables
                .iter()
                .map(|declaration| TableSchema::from_declaration(declaration, &file.path))
        })
        .collect()
}

/// Check every file against the tables declared across all of them
pub fn check_files(files: &[SourceFile], options: &CheckOptions) -> AnalysisResult<CheckReport> {
    let schemas = collect_schemas(files);
    for schema in &schemas {
        log::debug!("Table {} ({})", schema.table_name, schema.declaration_site());
        for column in &schema.columns {
            log::debug!("  {}: {}", column.name, column.descriptor);
        }
    }

    let collector = DiagnosticCollector::new();
    let ((), mut diagnostics) = collector.collect(|c| check_schemas_for_duplicates(&schemas, c))?;

    let mut query_count = 0;
    for file in files {
        let (count, file_diagnostics) =
            collector.collect(|c| validate_file(file, &schemas, options, c))?;
        query_count += count;
        diagnostics.extend(file_diagnostics);
    }
    collector.finish()?;

    Ok(CheckReport {
        diagnostics: options.severity_overrides.apply(diagnostics),
        query_count,
        table_count: schemas.len(),
    })
}

/// Validate every template of `file` using the manifest's recorded types.
///
/// Returns the number of templates checked.
pub fn validate_file(
    file: &SourceFile,
    schemas: &[TableSchema],
    options: &CheckOptions,
    collector: &DiagnosticCollector,
) -> usize {
    validate_file_with(file, schemas, options, &DeclaredTypes, collector)
}

/// [`validate_file`] with a custom type inference
pub fn validate_file_with(
    file: &SourceFile,
    schemas: &[TableSchema],
    options: &CheckOptions,
    inference: &dyn TypeInference,
    collector: &DiagnosticCollector,
) -> usize {
    let parser = SqlParser::from_dialect(options.dialect);
    let schema_set = SchemaSet::new(schemas);
    for template in &file.templates {
        validate_template(file, template, &parser, &schema_set, options, inference, collector);
    }
    file.templates.len()
}

fn validate_template(
    file: &SourceFile,
    template: &TemplateDescriptor,
    parser: &SqlParser,
    schemas: &SchemaSet<'_>,
    options: &CheckOptions,
    inference: &dyn TypeInference,
    collector: &DiagnosticCollector,
) {
    let compiled = compile_template(template, &options.spread_update_column);
    let source = Rc::new(QuerySource {
        text: compiled.text,
        source_map: compiled.source_map,
        source_file: file.path.clone(),
        template_location: template.location,
    });

    let statement = match parser.parse_query(&source.text) {
        Ok(statement) => statement,
        Err(failure) => {
            log::debug!("Parse failure: {}", failure.message);
            collector.report(source.diagnostic(
                DiagnosticCode::SG001,
                format!(
                    "Syntax error in SQL query.\nSubstituted query: {}",
                    source.text.trim()
                ),
                failure.cursor_offset,
            ));
            return;
        }
    };

    let spread_properties: HashMap<u32, Option<Vec<String>>> = compiled
        .params
        .iter()
        .filter(|param| param.spread.is_some())
        .filter_map(|param| {
            let expression = template.expressions.get(param.expression_index)?;
            Some((param.ordinal, inference.infer_spread_properties(expression)))
        })
        .collect();
    let context = ExtractionContext {
        spread_properties: &spread_properties,
        spread_update_column: &options.spread_update_column,
        source: Rc::clone(&source),
    };

    let root = QueryNodePath::root(&statement);
    let query = extract_query(&root, &context, collector);
    log::debug!(
        "Parsed query in {}:\n{}\nReferenced columns: {}",
        file.path.display(),
        source.text,
        query
            .referenced_columns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let result_type = template.result_type.as_ref().and_then(|type_argument| {
        match inference.infer_asserted_result_shape(type_argument) {
            Some(columns) => Some(ResultTypeAssertion {
                text: type_argument.text.clone(),
                location: type_argument.location,
                columns,
            }),
            None => {
                collector.report(Diagnostic::new(
                    DiagnosticCode::SG010,
                    format!(
                        "Cannot infer type of type parameter. Skipping type checking of this expression.\n  Type parameter: {}",
                        type_argument.text
                    ),
                    file.path.clone(),
                    Some(type_argument.location),
                ));
                None
            }
        }
    });

    validate_query(&QueryInvocation { query, result_type }, schemas, collector);
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
