//! Name resolver: pins table aliases and unqualified or wildcard column
//! references to concrete tables.

use crate::diagnostics::DiagnosticCode;
use crate::query::{
    ColumnReference, QualifiedColumn, TableReference, UnqualifiedColumn, WildcardColumn,
    WildcardTarget,
};
use sg_core::TableSchema;
use thiserror::Error;

/// Schemas visible while validating a statement.
///
/// Synthetic schemas (CTE bodies and derived tables) shadow declared schemas
/// of the same name; the most recently added synthetic schema wins.
#[derive(Debug, Clone)]
pub struct SchemaSet<'s> {
    synthetic: Vec<TableSchema>,
    declared: &'s [TableSchema],
}

impl<'s> SchemaSet<'s> {
    pub fn new(declared: &'s [TableSchema]) -> Self {
        Self {
            synthetic: Vec::new(),
            declared,
        }
    }

    pub fn add_synthetic(&mut self, schema: TableSchema) {
        self.synthetic.push(schema);
    }

    /// Look up a schema by table name
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.synthetic
            .iter()
            .rev()
            .chain(self.declared.iter())
            .find(|schema| schema.table_name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of every visible table, synthetic ones first
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for schema in self.synthetic.iter().rev().chain(self.declared.iter()) {
            if !names.contains(&schema.table_name.as_str()) {
                names.push(schema.table_name.as_str());
            }
        }
        names
    }

    pub fn declared(&self) -> &'s [TableSchema] {
        self.declared
    }
}

/// Why a column reference could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The reference stands for columns that were never inferred; callers
    /// skip it instead of reporting
    #[error("Column reference cannot be resolved statically")]
    Unresolvable,

    #[error("No table in the query's scope has a column \"{column}\".\nTables in scope: {tables}")]
    NotInScope { column: String, tables: String },

    #[error("Unqualified column reference \"{column}\" matches more than one referenced table: {tables}")]
    Ambiguous { column: String, tables: String },

    #[error("Cannot resolve unqualified \"*\" column selector: No known tables.")]
    WildcardWithoutTables,

    #[error("Cannot resolve unqualified \"*\" column selector. More than one table in scope: {tables}")]
    WildcardAmbiguous { tables: String },

    #[error("No table named \"{table}\" found. Known tables in scope: {known}")]
    WildcardUnknownTable { table: String, known: String },
}

impl ResolveError {
    /// Diagnostic code used when reporting this error
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ResolveError::Unresolvable => DiagnosticCode::SG010,
            ResolveError::NotInScope { .. } => DiagnosticCode::SG003,
            ResolveError::Ambiguous { .. } => DiagnosticCode::SG004,
            ResolveError::WildcardWithoutTables
            | ResolveError::WildcardAmbiguous { .. }
            | ResolveError::WildcardUnknownTable { .. } => DiagnosticCode::SG005,
        }
    }
}

pub(crate) fn quote_list(names: &[&str]) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Distinct table names of `tables`, first use wins
fn distinct_names<'r>(tables: &'r [TableReference<'_>]) -> Vec<&'r str> {
    let mut names: Vec<&str> = Vec::new();
    for table in tables {
        if !names.contains(&table.table_name.as_str()) {
            names.push(&table.table_name);
        }
    }
    names
}

/// Find the table reference `name` points to: an alias match wins over a
/// table name match
pub fn resolve_table_name<'r, 'a>(
    name: &str,
    tables: &'r [TableReference<'a>],
) -> Option<&'r TableReference<'a>> {
    tables
        .iter()
        .find(|table| table.alias.as_deref() == Some(name))
        .or_else(|| tables.iter().find(|table| table.table_name == name))
}

/// Resolve a bare column name to the single table in scope declaring it
pub fn resolve_unqualified<'a>(
    column: &UnqualifiedColumn<'a>,
    schemas: &SchemaSet<'_>,
) -> Result<QualifiedColumn<'a>, ResolveError> {
    if column.unresolvable {
        return Err(ResolveError::Unresolvable);
    }

    let in_scope = distinct_names(&column.table_refs_in_scope);
    let matching: Vec<&str> = in_scope
        .iter()
        .copied()
        .filter(|name| {
            schemas
                .get(name)
                .is_some_and(|schema| schema.has_column(&column.column_name))
        })
        .collect();

    match matching.as_slice() {
        [table_name] => Ok(QualifiedColumn {
            table_name: table_name.to_string(),
            column_name: column.column_name.clone(),
            path: column.path.clone(),
        }),
        [] => {
            let declared: Vec<&str> = in_scope
                .iter()
                .copied()
                .filter(|name| schemas.contains(name))
                .collect();
            Err(ResolveError::NotInScope {
                column: column.column_name.clone(),
                tables: quote_list(&declared),
            })
        }
        _ => Err(ResolveError::Ambiguous {
            column: column.column_name.clone(),
            tables: matching.join(", "),
        }),
    }
}

/// Expand a `*` or `table.*` selector into one qualified reference per
/// column of the single table it selects from
pub fn resolve_wildcard<'a>(
    wildcard: &WildcardColumn<'a>,
    schemas: &SchemaSet<'_>,
) -> Result<Vec<QualifiedColumn<'a>>, ResolveError> {
    let table_name = match &wildcard.target {
        WildcardTarget::Table(table_name) => table_name.as_str(),
        WildcardTarget::InScope(tables) => match distinct_names(tables).as_slice() {
            [] => return Err(ResolveError::WildcardWithoutTables),
            [table_name] => *table_name,
            many => {
                return Err(ResolveError::WildcardAmbiguous {
                    tables: quote_list(many),
                })
            }
        },
    };

    let schema = schemas
        .get(table_name)
        .ok_or_else(|| ResolveError::WildcardUnknownTable {
            table: table_name.to_string(),
            known: quote_list(&schemas.names()),
        })?;

    Ok(schema
        .column_names()
        .map(|column_name| QualifiedColumn {
            table_name: schema.table_name.to_string(),
            column_name: column_name.to_string(),
            path: wildcard.path.clone(),
        })
        .collect())
}

/// Resolve any column reference to the qualified columns it stands for
pub fn resolve_to_concrete<'a>(
    column: &ColumnReference<'a>,
    schemas: &SchemaSet<'_>,
) -> Result<Vec<QualifiedColumn<'a>>, ResolveError> {
    match column {
        ColumnReference::Qualified(qualified) => Ok(vec![qualified.clone()]),
        ColumnReference::Unqualified(unqualified) => {
            resolve_unqualified(unqualified, schemas).map(|qualified| vec![qualified])
        }
        ColumnReference::Wildcard(wildcard) => resolve_wildcard(wildcard, schemas),
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
