//! Records produced by the reference extractor

use crate::diagnostics::{map_to_source_location, overall_location, Diagnostic, DiagnosticCode};
use sg_core::SourceLocation;
use sg_sql::{QueryNodePath, QuerySourceMapSpan};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Generated query text together with the way back to the host source
#[derive(Debug, Clone)]
pub struct QuerySource {
    pub text: String,
    pub source_map: Vec<QuerySourceMapSpan>,
    pub source_file: PathBuf,
    /// Location of the whole template, used when the source map is empty
    pub template_location: Option<SourceLocation>,
}

impl QuerySource {
    /// Host source location of a generated-query offset, falling back to the
    /// location of the whole statement
    pub fn locate(&self, offset: Option<usize>) -> Option<SourceLocation> {
        offset
            .and_then(|offset| map_to_source_location(&self.text, &self.source_map, offset))
            .or_else(|| self.overall_location())
    }

    pub fn overall_location(&self) -> Option<SourceLocation> {
        overall_location(&self.source_map).or(self.template_location)
    }

    /// Diagnostic located at a generated-query offset
    pub fn diagnostic(
        &self,
        code: DiagnosticCode,
        message: impl Into<String>,
        offset: Option<usize>,
    ) -> Diagnostic {
        Diagnostic::new(code, message, self.source_file.clone(), self.locate(offset))
    }
}

/// Kind of an extracted statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Any non-DML statement
    Utility,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Select => write!(f, "SELECT"),
            StatementKind::Insert => write!(f, "INSERT"),
            StatementKind::Update => write!(f, "UPDATE"),
            StatementKind::Delete => write!(f, "DELETE"),
            StatementKind::Utility => write!(f, "utility"),
        }
    }
}

/// Use of a table in a FROM / JOIN / INTO position
#[derive(Debug, Clone)]
pub struct TableReference<'a> {
    pub table_name: String,
    pub alias: Option<String>,
    pub path: Rc<QueryNodePath<'a>>,
}

impl TableReference<'_> {
    /// Whether this reference is the same table use as `other`
    pub fn same_use(&self, other: &TableReference<'_>) -> bool {
        self.table_name == other.table_name && self.alias == other.alias
    }
}

/// `table.column`, with the table already resolved from any alias
#[derive(Debug, Clone)]
pub struct QualifiedColumn<'a> {
    pub table_name: String,
    pub column_name: String,
    pub path: Rc<QueryNodePath<'a>>,
}

/// A bare column name, resolved against the tables in scope on demand
#[derive(Debug, Clone)]
pub struct UnqualifiedColumn<'a> {
    pub table_refs_in_scope: Vec<TableReference<'a>>,
    pub column_name: String,
    pub path: Rc<QueryNodePath<'a>>,
    /// Stands for columns that could not be inferred statically
    pub unresolvable: bool,
}

/// Table a `*` selector expands from
#[derive(Debug, Clone)]
pub enum WildcardTarget<'a> {
    /// `table.*`
    Table(String),
    /// `*`
    InScope(Vec<TableReference<'a>>),
}

#[derive(Debug, Clone)]
pub struct WildcardColumn<'a> {
    pub target: WildcardTarget<'a>,
    pub path: Rc<QueryNodePath<'a>>,
}

/// Column mentioned by a statement
#[derive(Debug, Clone)]
pub enum ColumnReference<'a> {
    Qualified(QualifiedColumn<'a>),
    Unqualified(UnqualifiedColumn<'a>),
    Wildcard(WildcardColumn<'a>),
}

impl<'a> ColumnReference<'a> {
    pub fn path(&self) -> &Rc<QueryNodePath<'a>> {
        match self {
            ColumnReference::Qualified(c) => &c.path,
            ColumnReference::Unqualified(c) => &c.path,
            ColumnReference::Wildcard(c) => &c.path,
        }
    }

    /// Column name, `*` for wildcards
    pub fn column_name(&self) -> &str {
        match self {
            ColumnReference::Qualified(c) => &c.column_name,
            ColumnReference::Unqualified(c) => &c.column_name,
            ColumnReference::Wildcard(_) => "*",
        }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self, ColumnReference::Unqualified(c) if c.unresolvable)
    }
}

impl fmt::Display for ColumnReference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnReference::Qualified(c) => write!(f, "{}.{}", c.table_name, c.column_name),
            ColumnReference::Unqualified(c) if c.unresolvable => write!(f, "<unresolvable>"),
            ColumnReference::Unqualified(c) => write!(f, "{}", c.column_name),
            ColumnReference::Wildcard(WildcardColumn {
                target: WildcardTarget::Table(table),
                ..
            }) => write!(f, "{table}.*"),
            ColumnReference::Wildcard(_) => write!(f, "*"),
        }
    }
}

/// An extracted statement and everything it references
#[derive(Debug, Clone)]
pub struct Query<'a> {
    pub kind: StatementKind,
    pub path: Rc<QueryNodePath<'a>>,
    /// CTE name or derived-table alias this statement is exposed under
    pub exposed_as_table: Option<String>,
    /// Tables referenced anywhere below this statement, nested ones included
    pub referenced_tables: Vec<TableReference<'a>>,
    /// Tables in this statement's own scope
    pub tables_in_scope: Vec<TableReference<'a>>,
    pub referenced_columns: Vec<ColumnReference<'a>>,
    /// Columns of the rows this statement yields
    pub returned_columns: Vec<ColumnReference<'a>>,
    /// Reached through a set-operation branch or an INSERT source
    pub returns_into_parent_query: bool,
    pub subqueries: Vec<Query<'a>>,
    pub source: Rc<QuerySource>,
}

impl<'a> Query<'a> {
    /// Every nested statement below this one, deepest first
    pub fn all_subqueries(&self) -> Vec<&Query<'a>> {
        let mut all = Vec::new();
        for subquery in &self.subqueries {
            all.extend(subquery.all_subqueries());
            all.push(subquery);
        }
        all
    }

    /// Byte offset of the statement in the generated query
    pub fn offset(&self) -> Option<usize> {
        self.path.location()
    }

    /// Host source location of the statement
    pub fn location(&self) -> Option<SourceLocation> {
        self.source.locate(self.offset())
    }

    /// Whether any referenced column could not be inferred
    pub fn has_unresolvable_columns(&self) -> bool {
        self.referenced_columns
            .iter()
            .any(ColumnReference::is_unresolvable)
    }
}

/// Expected shape of a query's result rows, declared by the caller
#[derive(Debug, Clone)]
pub struct ResultTypeAssertion {
    /// Source text of the type argument
    pub text: String,
    pub location: SourceLocation,
    pub columns: Vec<String>,
}

/// A query paired with its optional result type assertion
#[derive(Debug, Clone)]
pub struct QueryInvocation<'a> {
    pub query: Query<'a>,
    pub result_type: Option<ResultTypeAssertion>,
}
