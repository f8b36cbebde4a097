//! Reference extractor: turns a lowered statement tree into [`Query`]
//! records listing the tables and columns each statement level references.

use crate::diagnostics::{DiagnosticCode, DiagnosticCollector};
use crate::query::{
    ColumnReference, QualifiedColumn, Query, QuerySource, StatementKind, TableReference,
    UnqualifiedColumn, WildcardColumn, WildcardTarget,
};
use crate::resolver::resolve_table_name;
use sg_sql::node::{ColumnRef, ResTarget};
use sg_sql::{traverse, ColumnField, QueryNode, QueryNodePath, Traversal};
use std::collections::HashMap;
use std::rc::Rc;

/// Inputs of an extraction besides the statement tree
#[derive(Debug, Clone)]
pub struct ExtractionContext<'c> {
    /// Inferred property names per spread parameter ordinal; `None` when
    /// inference gave up on the spread value
    pub spread_properties: &'c HashMap<u32, Option<Vec<String>>>,
    /// Sentinel column assigned by update-spread placeholders
    pub spread_update_column: &'c str,
    pub source: Rc<QuerySource>,
}

const SPREAD_NOT_INFERRED: &str = "Cannot infer properties of spread expression in SQL template.";

/// Extract the statement at `path` and, recursively, every statement nested
/// in it.
///
/// Structural problems with column references and qualifiers that match no
/// table are reported to `collector`; the offending reference is left out.
pub fn extract_query<'a>(
    path: &Rc<QueryNodePath<'a>>,
    context: &ExtractionContext<'_>,
    collector: &DiagnosticCollector,
) -> Query<'a> {
    extract_level(path, context, &[], collector)
}

fn extract_level<'a>(
    path: &Rc<QueryNodePath<'a>>,
    context: &ExtractionContext<'_>,
    outer_tables: &[TableReference<'a>],
    collector: &DiagnosticCollector,
) -> Query<'a> {
    let tables_in_scope = scoped_table_references(path);
    let referenced_tables = all_table_references(path);

    // qualifiers may also name tables of enclosing statements
    let mut visible = tables_in_scope.clone();
    visible.extend(excluded_pseudo_table(path, &tables_in_scope));
    visible.extend(outer_tables.iter().cloned());

    let scope = Scope {
        tables: &tables_in_scope,
        visible: &visible,
    };
    let referenced_columns = referenced_columns(path, &scope, context, collector);

    let subqueries: Vec<Query<'a>> = nested_statements(path)
        .iter()
        .map(|subquery| extract_level(subquery, context, &visible, collector))
        .collect();
    let returned_columns = returned_columns(path, &scope, &subqueries);

    let query = Query {
        kind: statement_kind(path.node()),
        path: Rc::clone(path),
        exposed_as_table: exposed_as_table(path),
        referenced_tables,
        tables_in_scope,
        referenced_columns,
        returned_columns,
        returns_into_parent_query: returns_into_parent_query(path),
        subqueries,
        source: Rc::clone(&context.source),
    };
    log::debug!(
        "Extracted {} statement at {}: {} table(s) in scope, columns [{}]",
        query.kind,
        path.describe(),
        query.tables_in_scope.len(),
        query
            .referenced_columns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    query
}

/// Tables a column reference may be resolved against
struct Scope<'s, 'a> {
    /// Tables of the statement itself
    tables: &'s [TableReference<'a>],
    /// Own tables followed by those of enclosing statements
    visible: &'s [TableReference<'a>],
}

/// Whether `node` is the `SELECT $n` statement an insert spread compiles to
pub fn is_placeholder_select(node: &QueryNode) -> bool {
    match node {
        QueryNode::SelectStmt(select) => {
            select.from_clause.is_empty()
                && select.set_operation.is_none()
                && select.values_lists.is_empty()
                && matches!(
                    select.target_list.as_slice(),
                    [QueryNode::ResTarget(ResTarget { val: Some(val), .. })]
                        if matches!(&**val, QueryNode::ParamRef(_))
                )
        }
        _ => false,
    }
}

/// Whether `node` is a statement of its own rather than part of its parent
pub fn is_subquery(node: &QueryNode) -> bool {
    node.is_statement() && !is_placeholder_select(node)
}

/// Whether the rows of the statement at `path` flow into its parent: set
/// operation branches and INSERT sources
pub fn returns_into_parent_query(path: &QueryNodePath<'_>) -> bool {
    let parent_is_statement = path
        .parent()
        .is_some_and(|parent| parent.node().is_statement());
    parent_is_statement
        && matches!(
            path.parent_prop_key(),
            Some("larg") | Some("rarg") | Some("selectStmt")
        )
}

/// Table name under which the statement at `path` can be selected from
fn exposed_as_table(path: &QueryNodePath<'_>) -> Option<String> {
    match path.parent().map(|parent| parent.node()) {
        Some(QueryNode::CommonTableExpr(cte)) => Some(cte.ctename.clone()),
        Some(QueryNode::RangeSubselect(derived)) => derived.alias.clone(),
        _ => None,
    }
}

fn statement_kind(node: &QueryNode) -> StatementKind {
    match node {
        QueryNode::SelectStmt(_) => StatementKind::Select,
        QueryNode::InsertStmt(_) => StatementKind::Insert,
        QueryNode::UpdateStmt(_) => StatementKind::Update,
        QueryNode::DeleteStmt(_) => StatementKind::Delete,
        _ => StatementKind::Utility,
    }
}

/// Visit every node of the statement at `path` without entering nested
/// statements
fn walk_scope<'a>(path: &Rc<QueryNodePath<'a>>, mut visit: impl FnMut(&Rc<QueryNodePath<'a>>)) {
    let _ = traverse(path, &mut |current| {
        if !Rc::ptr_eq(current, path) && is_subquery(current.node()) {
            return Traversal::SkipChildren;
        }
        visit(current);
        Traversal::Continue
    });
}

/// First nested statement on every path below `path`
fn nested_statements<'a>(path: &Rc<QueryNodePath<'a>>) -> Vec<Rc<QueryNodePath<'a>>> {
    let mut found = Vec::new();
    let _ = traverse(path, &mut |current| {
        if Rc::ptr_eq(current, path) || !is_subquery(current.node()) {
            return Traversal::Continue;
        }
        found.push(Rc::clone(current));
        Traversal::SkipChildren
    });
    found
}

fn scoped_table_references<'a>(path: &Rc<QueryNodePath<'a>>) -> Vec<TableReference<'a>> {
    let mut tables: Vec<TableReference<'a>> = Vec::new();
    walk_scope(path, |current| {
        let table = match current.node() {
            QueryNode::RangeVar(range_var) => TableReference {
                table_name: range_var.relname.clone(),
                alias: range_var.alias.clone(),
                path: Rc::clone(current),
            },
            QueryNode::RangeSubselect(derived) => match &derived.alias {
                Some(alias) => TableReference {
                    table_name: alias.clone(),
                    alias: None,
                    path: Rc::clone(current),
                },
                None => return,
            },
            _ => return,
        };
        if !tables.iter().any(|known| known.same_use(&table)) {
            tables.push(table);
        }
    });
    tables
}

/// `EXCLUDED` row of an `INSERT ... ON CONFLICT`, shaped like the target table
fn excluded_pseudo_table<'a>(
    path: &QueryNodePath<'a>,
    tables_in_scope: &[TableReference<'a>],
) -> Option<TableReference<'a>> {
    let QueryNode::InsertStmt(insert) = path.node() else {
        return None;
    };
    if insert.on_conflict.is_none() {
        return None;
    }
    let target = (*target_tables(tables_in_scope).first()?).clone();
    Some(TableReference {
        alias: Some("excluded".to_string()),
        ..target
    })
}

/// Tables an UPDATE SET or INSERT column list assigns to: the statement's
/// own relation, not tables joined in through FROM or USING
fn target_tables<'s, 'a>(
    tables_in_scope: &'s [TableReference<'a>],
) -> Vec<&'s TableReference<'a>> {
    let relation: Vec<&TableReference<'a>> = tables_in_scope
        .iter()
        .filter(|table| table.path.parent_prop_key() == Some("relation"))
        .collect();
    if relation.is_empty() {
        tables_in_scope.iter().collect()
    } else {
        relation
    }
}

/// Output column names of a SELECT, which ORDER BY may refer to in place of
/// table columns
fn output_names(node: &QueryNode) -> Vec<&str> {
    let QueryNode::SelectStmt(select) = node else {
        return Vec::new();
    };
    if let Some(set_operation) = &select.set_operation {
        return output_names(&set_operation.larg);
    }
    select
        .target_list
        .iter()
        .filter_map(|target| match target {
            QueryNode::ResTarget(ResTarget {
                name: Some(name), ..
            }) => Some(name.as_str()),
            QueryNode::ResTarget(ResTarget { val: Some(val), .. }) => match &**val {
                QueryNode::ColumnRef(column_ref) => match column_ref.fields.last() {
                    Some(ColumnField::Name(name)) => Some(name.as_str()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn all_table_references<'a>(path: &Rc<QueryNodePath<'a>>) -> Vec<TableReference<'a>> {
    let mut tables = Vec::new();
    let _ = traverse(path, &mut |current| {
        if let QueryNode::RangeVar(range_var) = current.node() {
            tables.push(TableReference {
                table_name: range_var.relname.clone(),
                alias: range_var.alias.clone(),
                path: Rc::clone(current),
            });
        }
        Traversal::Continue
    });
    tables
}

fn referenced_columns<'a>(
    path: &Rc<QueryNodePath<'a>>,
    scope: &Scope<'_, 'a>,
    context: &ExtractionContext<'_>,
    collector: &DiagnosticCollector,
) -> Vec<ColumnReference<'a>> {
    let mut columns = Vec::new();
    // assignment targets and spread properties name columns of the target table
    let assignment_tables: Vec<TableReference<'a>> =
        target_tables(scope.tables).into_iter().cloned().collect();
    let target_column = |column_name: &str, path: &Rc<QueryNodePath<'a>>, unresolvable: bool| {
        ColumnReference::Unqualified(UnqualifiedColumn {
            table_refs_in_scope: assignment_tables.clone(),
            column_name: column_name.to_string(),
            path: Rc::clone(path),
            unresolvable,
        })
    };
    let output_names = output_names(path.node());
    let is_output_alias = |current: &Rc<QueryNodePath<'a>>, fields: &[ColumnField]| {
        current.statement_clause() == Some("sortClause")
            && matches!(fields, [ColumnField::Name(name)] if output_names.contains(&name.as_str()))
    };

    walk_scope(path, |current| match current.node() {
        QueryNode::ColumnRef(ColumnRef { fields, .. })
            if is_output_alias(current, fields.as_slice()) => {}
        QueryNode::ColumnRef(column_ref) => match column_reference(column_ref, current, scope) {
            Ok(column) => columns.push(column),
            Err(issue) => {
                // structural problems point at the statement, not the reference
                let offset = match issue.code {
                    DiagnosticCode::SG009 => path.location(),
                    _ => current.location(),
                };
                collector.report(
                    context
                        .source
                        .diagnostic(issue.code, issue.message, offset)
                        .with_query_path(current.describe()),
                );
            }
        },
        QueryNode::Assignment(assignment) if assignment.name != context.spread_update_column => {
            columns.push(target_column(&assignment.name, current, false));
        }
        QueryNode::ParamRef(param) => match context.spread_properties.get(&param.number) {
            Some(Some(properties)) => {
                columns.extend(
                    properties
                        .iter()
                        .map(|property| target_column(property, current, false)),
                );
            }
            Some(None) => {
                columns.push(target_column("", current, true));
                collector.report(context.source.diagnostic(
                    DiagnosticCode::SG010,
                    SPREAD_NOT_INFERRED,
                    current.location(),
                ));
            }
            None => {}
        },
        _ => {}
    });
    columns
}

/// Why a column reference could not be turned into a [`ColumnReference`]
struct ReferenceIssue {
    code: DiagnosticCode,
    message: String,
}

impl ReferenceIssue {
    fn structural(message: String) -> Self {
        Self {
            code: DiagnosticCode::SG009,
            message,
        }
    }
}

fn column_reference<'a>(
    column_ref: &ColumnRef,
    path: &Rc<QueryNodePath<'a>>,
    scope: &Scope<'_, 'a>,
) -> Result<ColumnReference<'a>, ReferenceIssue> {
    let bad_format = || {
        ReferenceIssue::structural(format!(
            "Expected column reference to be of format <table>.<column> or <column>. Got: {}",
            column_ref.dotted()
        ))
    };
    let bad_qualifier = |field: &ColumnField| {
        ReferenceIssue::structural(format!(
            "Expected first identifier in column reference to be a plain name. Got: {field}"
        ))
    };

    match column_ref.fields.as_slice() {
        [ColumnField::Name(name)] => Ok(ColumnReference::Unqualified(UnqualifiedColumn {
            table_refs_in_scope: scope.tables.to_vec(),
            column_name: name.clone(),
            path: Rc::clone(path),
            unresolvable: false,
        })),
        [ColumnField::Star] => Ok(ColumnReference::Wildcard(WildcardColumn {
            target: WildcardTarget::InScope(scope.tables.to_vec()),
            path: Rc::clone(path),
        })),
        [field] => Err(bad_qualifier(field)),
        [qualifier, field] => {
            let ColumnField::Name(qualifier) = qualifier else {
                return Err(bad_qualifier(qualifier));
            };
            let table = resolve_table_name(qualifier, scope.visible).ok_or_else(|| {
                ReferenceIssue {
                    code: DiagnosticCode::SG002,
                    message: format!("No matching table reference found for \"{qualifier}\"."),
                }
            })?;
            match field {
                ColumnField::Name(column_name) => {
                    Ok(ColumnReference::Qualified(QualifiedColumn {
                        table_name: table.table_name.clone(),
                        column_name: column_name.clone(),
                        path: Rc::clone(path),
                    }))
                }
                ColumnField::Star => Ok(ColumnReference::Wildcard(WildcardColumn {
                    target: WildcardTarget::Table(table.table_name.clone()),
                    path: Rc::clone(path),
                })),
                ColumnField::Expr(_) => Err(bad_format()),
            }
        }
        _ => Err(bad_format()),
    }
}

/// Columns of the rows the statement at `path` yields.
///
/// Named targets count by their output name, unnamed column references as
/// the column they select. A set operation yields the rows of its left-most
/// branch.
fn returned_columns<'a>(
    path: &Rc<QueryNodePath<'a>>,
    scope: &Scope<'_, 'a>,
    subqueries: &[Query<'a>],
) -> Vec<ColumnReference<'a>> {
    let (key, targets) = match path.node() {
        QueryNode::SelectStmt(select) if select.set_operation.is_some() => {
            return subqueries
                .iter()
                .find(|subquery| subquery.path.parent_prop_key() == Some("larg"))
                .map(|larg| larg.returned_columns.clone())
                .unwrap_or_default();
        }
        QueryNode::SelectStmt(select) => ("targetList", &select.target_list),
        QueryNode::InsertStmt(insert) => ("returningList", &insert.returning_list),
        QueryNode::UpdateStmt(update) => ("returningList", &update.returning_list),
        QueryNode::DeleteStmt(delete) => ("returningList", &delete.returning_list),
        _ => return Vec::new(),
    };

    targets
        .iter()
        .filter_map(|node| {
            let QueryNode::ResTarget(target) = node else {
                return None;
            };
            let target_path = path.child(node, key);
            match (&target.name, target.val.as_deref()) {
                (Some(name), _) => Some(ColumnReference::Unqualified(UnqualifiedColumn {
                    table_refs_in_scope: scope.tables.to_vec(),
                    column_name: name.clone(),
                    path: target_path,
                    unresolvable: false,
                })),
                (None, Some(val)) => match val {
                    QueryNode::ColumnRef(column_ref) => {
                        column_reference(column_ref, &target_path.child(val, "val"), scope).ok()
                    }
                    _ => None,
                },
                (None, None) => None,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
