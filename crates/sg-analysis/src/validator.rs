//! Schema validator: checks extracted queries against the declared table
//! schemas and reports every mismatch to the diagnostic collector.

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector};
use crate::query::{ColumnReference, Query, QueryInvocation, ResultTypeAssertion, StatementKind};
use crate::resolver::{
    quote_list, resolve_unqualified, resolve_wildcard, ResolveError, SchemaSet,
};
use sg_core::{ColumnDescriptor, SchemaColumn, TableName, TableSchema};
use sg_sql::QueryNodePath;
use std::collections::HashSet;
use std::rc::Rc;

/// Validate a query and all of its nested statements.
///
/// Statements exposed as tables (CTE bodies, aliased derived tables) are
/// turned into synthetic schemas first, so the rest of the query can select
/// from them.
pub fn validate_query(
    invocation: &QueryInvocation<'_>,
    schemas: &SchemaSet<'_>,
    collector: &DiagnosticCollector,
) {
    let query = &invocation.query;
    let mut schemas = schemas.clone();
    for subquery in query.all_subqueries() {
        if let Some(schema) = synthetic_schema(subquery, &schemas) {
            log::debug!(
                "Synthetic table {} ({})",
                schema.table_name,
                schema.column_names().collect::<Vec<_>>().join(", ")
            );
            schemas.add_synthetic(schema);
        }
    }

    let unknown_tables = check_table_existence(query, &schemas, collector);
    validate_level(query, &schemas, &unknown_tables, collector);

    if let Some(assertion) = &invocation.result_type {
        check_result_shape(query, assertion, &schemas, collector);
    }
}

/// Schema of the rows a statement exposed as a table yields
pub fn synthetic_schema(query: &Query<'_>, schemas: &SchemaSet<'_>) -> Option<TableSchema> {
    let table_name = TableName::try_new(query.exposed_as_table.clone()?)?;

    let mut columns: Vec<SchemaColumn> = Vec::new();
    let mut add = |name: &str, descriptor: ColumnDescriptor| {
        if !columns.iter().any(|column| column.name == name) {
            columns.push(SchemaColumn {
                name: name.to_string(),
                descriptor,
            });
        }
    };
    let descriptor_of = |table: &str, column_name: &str| {
        schemas
            .get(table)
            .and_then(|schema| schema.column(column_name))
            .map(|column| column.descriptor.clone())
            .unwrap_or_else(ColumnDescriptor::any)
    };

    for column in &query.returned_columns {
        match column {
            ColumnReference::Wildcard(wildcard) => {
                // unresolvable selectors are reported when the statement itself is validated
                for expanded in resolve_wildcard(wildcard, schemas).unwrap_or_default() {
                    add(
                        &expanded.column_name,
                        descriptor_of(&expanded.table_name, &expanded.column_name),
                    );
                }
            }
            ColumnReference::Qualified(qualified) => add(
                &qualified.column_name,
                descriptor_of(&qualified.table_name, &qualified.column_name),
            ),
            ColumnReference::Unqualified(unqualified) if !unqualified.unresolvable => {
                add(&unqualified.column_name, ColumnDescriptor::any())
            }
            ColumnReference::Unqualified(_) => {}
        }
    }

    Some(TableSchema {
        table_name,
        columns,
        source_file: query.source.source_file.clone(),
        location: query.location(),
    })
}

/// Report every table that is referenced but not declared, once per table at
/// its earliest reference. Returns the names of the unknown tables.
fn check_table_existence(
    query: &Query<'_>,
    schemas: &SchemaSet<'_>,
    collector: &DiagnosticCollector,
) -> HashSet<String> {
    struct Unknown<'q, 'a> {
        table_name: &'q str,
        path: &'q Rc<QueryNodePath<'a>>,
        /// Reached through `table.column` rather than a FROM item
        via_column: bool,
    }

    let mut candidates: Vec<Unknown<'_, '_>> = query
        .referenced_tables
        .iter()
        .filter(|table| !schemas.contains(&table.table_name))
        .map(|table| Unknown {
            table_name: &table.table_name,
            path: &table.path,
            via_column: false,
        })
        .collect();

    let levels = std::iter::once(query).chain(query.all_subqueries());
    for level in levels {
        for column in &level.referenced_columns {
            if let ColumnReference::Qualified(qualified) = column {
                if !schemas.contains(&qualified.table_name) {
                    candidates.push(Unknown {
                        table_name: &qualified.table_name,
                        path: &qualified.path,
                        via_column: true,
                    });
                }
            }
        }
    }
    candidates.sort_by_key(|candidate| candidate.path.location().unwrap_or(usize::MAX));

    let mut unknown = HashSet::new();
    for candidate in candidates {
        if !unknown.insert(candidate.table_name.to_string()) {
            continue;
        }
        let message = if candidate.via_column {
            format!("No table named {} has been defined.", candidate.table_name)
        } else {
            format!(
                "No table with name \"{}\" has been defined.",
                candidate.table_name
            )
        };
        collector.report(
            query
                .source
                .diagnostic(DiagnosticCode::SG002, message, candidate.path.location())
                .with_query_path(candidate.path.describe()),
        );
    }
    unknown
}

fn validate_level(
    query: &Query<'_>,
    schemas: &SchemaSet<'_>,
    unknown_tables: &HashSet<String>,
    collector: &DiagnosticCollector,
) {
    for column in &query.referenced_columns {
        check_column(query, column, schemas, unknown_tables, collector);
    }
    if query.kind == StatementKind::Insert {
        check_insert_completeness(query, schemas, unknown_tables, collector);
    }
    for subquery in &query.subqueries {
        validate_level(subquery, schemas, unknown_tables, collector);
    }
}

fn check_column(
    query: &Query<'_>,
    column: &ColumnReference<'_>,
    schemas: &SchemaSet<'_>,
    unknown_tables: &HashSet<String>,
    collector: &DiagnosticCollector,
) {
    let result = match column {
        ColumnReference::Qualified(qualified) => {
            if unknown_tables.contains(&qualified.table_name) {
                return;
            }
            match schemas.get(&qualified.table_name) {
                Some(schema) if !schema.has_column(&qualified.column_name) => Err((
                    DiagnosticCode::SG003,
                    format!(
                        "Table \"{}\" does not have a column named \"{}\".",
                        qualified.table_name, qualified.column_name
                    ),
                )),
                _ => Ok(()),
            }
        }
        ColumnReference::Unqualified(unqualified) => {
            match resolve_unqualified(unqualified, schemas) {
                Ok(_) | Err(ResolveError::Unresolvable) => Ok(()),
                // the column may well live in the table that was never declared
                Err(ResolveError::NotInScope { .. })
                    if unqualified
                        .table_refs_in_scope
                        .iter()
                        .any(|table| unknown_tables.contains(&table.table_name)) =>
                {
                    Ok(())
                }
                Err(err) => Err((err.code(), err.to_string())),
            }
        }
        ColumnReference::Wildcard(wildcard) => match resolve_wildcard(wildcard, schemas) {
            Ok(_) => Ok(()),
            Err(ResolveError::WildcardUnknownTable { table, .. })
                if unknown_tables.contains(&table) =>
            {
                Ok(())
            }
            Err(err) => Err((err.code(), err.to_string())),
        },
    };

    if let Err((code, message)) = result {
        let path = column.path();
        collector.report(
            query
                .source
                .diagnostic(code, message, path.location())
                .with_query_path(path.describe()),
        );
    }
}

/// Names of the columns `columns` stand for, wildcards expanded; selectors
/// that do not resolve contribute nothing
fn column_names(columns: &[ColumnReference<'_>], schemas: &SchemaSet<'_>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut add = |name: &str| {
        if !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    };
    for column in columns {
        match column {
            ColumnReference::Wildcard(wildcard) => {
                for expanded in resolve_wildcard(wildcard, schemas).unwrap_or_default() {
                    add(&expanded.column_name);
                }
            }
            other => add(other.column_name()),
        }
    }
    names
}

/// Every column without a default value must be provided by an INSERT
fn check_insert_completeness(
    query: &Query<'_>,
    schemas: &SchemaSet<'_>,
    unknown_tables: &HashSet<String>,
    collector: &DiagnosticCollector,
) {
    if query.has_unresolvable_columns() {
        log::debug!("Skipping INSERT completeness check: spread columns were not inferred");
        return;
    }
    let Some(target) = query
        .tables_in_scope
        .iter()
        .find(|table| table.path.parent_prop_key() == Some("relation"))
    else {
        return;
    };
    if unknown_tables.contains(&target.table_name) {
        return;
    }
    let Some(schema) = schemas.get(&target.table_name) else {
        return;
    };

    // RETURNING and ON CONFLICT only read the inserted row
    let inserted: Vec<ColumnReference<'_>> = query
        .referenced_columns
        .iter()
        .filter(|column| {
            !matches!(
                column.path().statement_clause(),
                Some("returningList" | "onConflictInfer" | "onConflictSet" | "onConflictWhere")
            )
        })
        .cloned()
        .collect();
    let mut provided = column_names(&inserted, schemas);
    for source in query
        .subqueries
        .iter()
        .filter(|subquery| subquery.returns_into_parent_query)
    {
        provided.extend(column_names(&source.returned_columns, schemas));
    }

    for column in schema.mandatory_columns() {
        if provided.iter().any(|name| *name == column.name) {
            continue;
        }
        collector.report(query.source.diagnostic(
            DiagnosticCode::SG007,
            format!("Column \"{}\" is missing from INSERT statement.", column.name),
            query.offset(),
        ));
    }
}

/// Every property of the asserted result type must be a column of the rows
/// the query yields
fn check_result_shape(
    query: &Query<'_>,
    assertion: &ResultTypeAssertion,
    schemas: &SchemaSet<'_>,
    collector: &DiagnosticCollector,
) {
    if query
        .returned_columns
        .iter()
        .any(ColumnReference::is_unresolvable)
    {
        return;
    }

    let actual = column_names(&query.returned_columns, schemas);
    let missing: Vec<&str> = assertion
        .columns
        .iter()
        .filter(|expected| !actual.contains(expected))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        return;
    }

    let actual: Vec<&str> = actual.iter().map(String::as_str).collect();
    let message = format!(
        "Query's result does not match the expected result type.\n  Missing columns in result rows: {}\n  Actual columns in result rows: {}",
        quote_list(&missing),
        quote_list(&actual)
    );
    collector.report(Diagnostic::new(
        DiagnosticCode::SG008,
        message,
        query.source.source_file.clone(),
        Some(assertion.location),
    ));
}

/// Report every table declared more than once, at each of its declarations
pub fn check_schemas_for_duplicates(schemas: &[TableSchema], collector: &DiagnosticCollector) {
    let mut groups: Vec<(&TableName, Vec<&TableSchema>)> = Vec::new();
    for schema in schemas {
        match groups.iter_mut().find(|(name, _)| **name == schema.table_name) {
            Some((_, group)) => group.push(schema),
            None => groups.push((&schema.table_name, vec![schema])),
        }
    }

    for (table_name, group) in groups.iter().filter(|(_, group)| group.len() > 1) {
        let sites: Vec<String> = group
            .iter()
            .map(|schema| format!("  - {}", schema.declaration_site()))
            .collect();
        let message = format!(
            "Table \"{table_name}\" has been defined more than once:\n{}",
            sites.join("\n")
        );
        for schema in group {
            collector.report(Diagnostic::new(
                DiagnosticCode::SG006,
                message.clone(),
                schema.source_file.clone(),
                schema.location,
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
