//! Statement-level lowering: queries, set operations, FROM items and DML

use super::Lowerer;
use crate::node::{
    Assignment, ColumnField, ColumnRef, CommonTableExpr, DeleteStmt, ExprNode, InsertStmt,
    JoinExpr, OnConflictClause, QueryNode, RangeSubselect, RangeVar, ResTarget, SelectStmt,
    SetOperation, SetOperator, UpdateStmt, UtilityStmt, WithClause,
};
use sqlparser::ast::{
    self, AssignmentTarget, ConflictTarget, Delete, Distinct, FromTable, Ident, Insert,
    OnConflictAction, OnInsert, Query, Select, SelectItem, SelectItemQualifiedWildcardKind,
    SetExpr, Spanned, Statement, TableFactor, TableObject, TableWithJoins, Update,
    UpdateTableFromKind, With,
};

impl Lowerer<'_> {
    pub(crate) fn lower_statement(&self, stmt: &Statement) -> QueryNode {
        let location = self.offset(stmt.span());
        match stmt {
            Statement::Query(query) => self.lower_query(query),
            Statement::Insert(insert) => self.lower_insert(insert, location),
            Statement::Update(update) => self.lower_update(update, location),
            Statement::Delete(delete) => self.lower_delete(delete, location),
            other => self.lower_utility(other, location),
        }
    }

    pub(crate) fn lower_query(&self, query: &Query) -> QueryNode {
        let mut node = self.lower_set_expr(&query.body);
        let with_clause = query.with.as_ref().map(|with| self.lower_with(with));

        match &mut node {
            QueryNode::SelectStmt(select) => {
                if select.with_clause.is_none() {
                    select.with_clause = with_clause.map(Box::new);
                }
                if let Some(order_by) = &query.order_by {
                    select.sort_clause.extend(self.collect_references(order_by));
                }
                select
                    .limit_clause
                    .extend(self.collect_references(&query.limit_clause));
                select
                    .limit_clause
                    .extend(self.collect_references(&query.fetch));
            }
            QueryNode::InsertStmt(insert) => insert.with_clause = with_clause.map(Box::new),
            QueryNode::UpdateStmt(update) => update.with_clause = with_clause.map(Box::new),
            QueryNode::DeleteStmt(delete) => delete.with_clause = with_clause.map(Box::new),
            _ => {}
        }
        node
    }

    fn lower_with(&self, with: &With) -> QueryNode {
        let ctes = with
            .cte_tables
            .iter()
            .map(|cte| {
                QueryNode::CommonTableExpr(CommonTableExpr {
                    ctename: self.ident_name(&cte.alias.name),
                    ctequery: Box::new(self.lower_query(&cte.query)),
                    location: self.offset(cte.alias.name.span),
                })
            })
            .collect();
        QueryNode::WithClause(WithClause {
            ctes,
            location: self.offset(with.span()),
        })
    }

    fn lower_set_expr(&self, set_expr: &SetExpr) -> QueryNode {
        let location = self.offset(set_expr.span());
        match set_expr {
            SetExpr::Select(select) => self.lower_select(select, location),
            SetExpr::Query(query) => self.lower_query(query),
            SetExpr::SetOperation {
                op, left, right, ..
            } => {
                let op = match op {
                    ast::SetOperator::Union => SetOperator::Union,
                    ast::SetOperator::Intersect => SetOperator::Intersect,
                    ast::SetOperator::Except => SetOperator::Except,
                    _ => SetOperator::Other,
                };
                QueryNode::SelectStmt(SelectStmt {
                    set_operation: Some(SetOperation {
                        op,
                        larg: Box::new(self.lower_set_expr(left)),
                        rarg: Box::new(self.lower_set_expr(right)),
                    }),
                    location,
                    ..Default::default()
                })
            }
            SetExpr::Values(values) => QueryNode::SelectStmt(SelectStmt {
                values_lists: values
                    .rows
                    .iter()
                    .map(|row| {
                        QueryNode::Expr(ExprNode {
                            args: self.collect_references(row),
                            location: row.first().and_then(|e| self.offset(e.span())),
                        })
                    })
                    .collect(),
                location,
                ..Default::default()
            }),
            SetExpr::Insert(stmt) | SetExpr::Update(stmt) => self.lower_statement(stmt),
            other => {
                log::warn!("Lowering unsupported query body generically: {}", other);
                QueryNode::SelectStmt(SelectStmt {
                    target_list: self.collect_references(other),
                    location,
                    ..Default::default()
                })
            }
        }
    }

    fn lower_select(&self, select: &Select, location: Option<usize>) -> QueryNode {
        QueryNode::SelectStmt(SelectStmt {
            distinct_clause: match &select.distinct {
                Some(Distinct::On(exprs)) => self.collect_references(exprs),
                _ => Vec::new(),
            },
            target_list: select
                .projection
                .iter()
                .map(|item| self.lower_select_item(item))
                .collect(),
            from_clause: select
                .from
                .iter()
                .map(|table| self.lower_table_with_joins(table))
                .collect(),
            where_clause: select
                .selection
                .as_ref()
                .map(|expr| Box::new(self.lower_expr(expr))),
            group_clause: self.collect_references(&select.group_by),
            having_clause: select
                .having
                .as_ref()
                .map(|expr| Box::new(self.lower_expr(expr))),
            location,
            ..Default::default()
        })
    }

    pub(crate) fn lower_select_item(&self, item: &SelectItem) -> QueryNode {
        let location = self.offset(item.span());
        let (name, val) = match item {
            SelectItem::UnnamedExpr(expr) => (None, self.lower_expr(expr)),
            SelectItem::ExprWithAlias { expr, alias } => {
                (Some(self.ident_name(alias)), self.lower_expr(expr))
            }
            SelectItem::Wildcard(_) => (
                None,
                QueryNode::ColumnRef(ColumnRef {
                    fields: vec![ColumnField::Star],
                    location,
                }),
            ),
            SelectItem::QualifiedWildcard(kind, _) => {
                let mut fields: Vec<ColumnField> = match kind {
                    SelectItemQualifiedWildcardKind::ObjectName(name) => name
                        .0
                        .iter()
                        .map(|part| match part.as_ident() {
                            Some(ident) => ColumnField::Name(self.ident_name(ident)),
                            None => ColumnField::Expr(part.to_string()),
                        })
                        .collect(),
                    SelectItemQualifiedWildcardKind::Expr(expr) => {
                        vec![ColumnField::Expr(expr.to_string())]
                    }
                };
                fields.push(ColumnField::Star);
                (None, QueryNode::ColumnRef(ColumnRef { fields, location }))
            }
            #[allow(unreachable_patterns)]
            other => {
                log::warn!("Lowering unsupported select item generically: {}", other);
                (None, self.expression_node(other, location))
            }
        };
        QueryNode::ResTarget(ResTarget {
            name,
            val: Some(Box::new(val)),
            location,
        })
    }

    fn lower_table_with_joins(&self, table: &TableWithJoins) -> QueryNode {
        let mut node = self.lower_table_factor(&table.relation);
        for join in &table.joins {
            let rarg = self.lower_table_factor(&join.relation);
            let location = rarg.location();
            let conditions = self.collect_references(&join.join_operator);
            node = QueryNode::JoinExpr(JoinExpr {
                larg: Box::new(node),
                rarg: Box::new(rarg),
                quals: (!conditions.is_empty()).then(|| {
                    Box::new(QueryNode::Expr(ExprNode {
                        args: conditions,
                        location,
                    }))
                }),
                location,
            });
        }
        node
    }

    fn lower_table_factor(&self, factor: &TableFactor) -> QueryNode {
        match factor {
            TableFactor::Table { name, alias, .. } => QueryNode::RangeVar(RangeVar {
                relname: self.relation_name(name),
                alias: alias.as_ref().map(|alias| self.ident_name(&alias.name)),
                location: self.offset(name.span()),
            }),
            TableFactor::Derived {
                subquery, alias, ..
            } => QueryNode::RangeSubselect(RangeSubselect {
                subquery: Box::new(self.lower_query(subquery)),
                alias: alias.as_ref().map(|alias| self.ident_name(&alias.name)),
                location: self.offset(factor.span()),
            }),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.lower_table_with_joins(table_with_joins),
            other => {
                log::warn!("Lowering unsupported table factor generically: {}", other);
                self.expression_node(other, self.offset(other.span()))
            }
        }
    }

    fn lower_insert(&self, insert: &Insert, location: Option<usize>) -> QueryNode {
        let relation = match &insert.table {
            TableObject::TableName(name) => RangeVar {
                relname: self.relation_name(name),
                alias: None,
                location: self.offset(name.span()),
            },
            other => RangeVar {
                relname: other.to_string(),
                alias: None,
                location,
            },
        };

        QueryNode::InsertStmt(InsertStmt {
            relation: Box::new(QueryNode::RangeVar(relation)),
            cols: insert
                .columns
                .iter()
                .map(|column| self.target_column(column))
                .collect(),
            select_stmt: insert
                .source
                .as_ref()
                .map(|source| Box::new(self.lower_query(source))),
            on_conflict: insert.on.as_ref().and_then(|on| self.lower_on_insert(on)),
            returning_list: self.lower_returning(insert.returning.as_deref()),
            with_clause: None,
            location,
        })
    }

    /// Column of the statement's target table, without a value
    fn target_column(&self, column: &Ident) -> QueryNode {
        QueryNode::Assignment(Assignment {
            name: self.ident_name(column),
            val: None,
            location: self.offset(column.span),
        })
    }

    fn lower_on_insert(&self, on: &OnInsert) -> Option<OnConflictClause> {
        match on {
            OnInsert::OnConflict(on_conflict) => {
                let infer_elems = match &on_conflict.conflict_target {
                    Some(ConflictTarget::Columns(columns)) => columns
                        .iter()
                        .map(|column| self.target_column(column))
                        .collect(),
                    _ => Vec::new(),
                };
                let (target_list, where_clause) = match &on_conflict.action {
                    OnConflictAction::DoUpdate(update) => (
                        self.lower_assignments(&update.assignments),
                        update
                            .selection
                            .as_ref()
                            .map(|expr| Box::new(self.lower_expr(expr))),
                    ),
                    OnConflictAction::DoNothing => (Vec::new(), None),
                };
                Some(OnConflictClause {
                    infer_elems,
                    target_list,
                    where_clause,
                })
            }
            OnInsert::DuplicateKeyUpdate(assignments) => Some(OnConflictClause {
                target_list: self.lower_assignments(assignments),
                ..Default::default()
            }),
            #[allow(unreachable_patterns)]
            other => {
                log::warn!("Ignoring unsupported INSERT conflict clause: {}", other);
                None
            }
        }
    }

    /// One `Assignment` per target column; a tuple target shares its value
    /// with the first column
    fn lower_assignments(&self, assignments: &[ast::Assignment]) -> Vec<QueryNode> {
        let mut target_list = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let names: Vec<&ast::ObjectName> = match &assignment.target {
                AssignmentTarget::ColumnName(name) => vec![name],
                AssignmentTarget::Tuple(names) => names.iter().collect(),
            };
            let mut val = Some(Box::new(self.lower_expr(&assignment.value)));
            for name in names {
                target_list.push(QueryNode::Assignment(Assignment {
                    name: self.relation_name(name),
                    val: val.take(),
                    location: self.offset(name.span()),
                }));
            }
        }
        target_list
    }

    fn lower_update(&self, update: &Update, location: Option<usize>) -> QueryNode {
        let target_list = self.lower_assignments(&update.assignments);

        let from_clause = match &update.from {
            Some(UpdateTableFromKind::BeforeSet(tables))
            | Some(UpdateTableFromKind::AfterSet(tables)) => tables
                .iter()
                .map(|table| self.lower_table_with_joins(table))
                .collect(),
            None => Vec::new(),
        };

        QueryNode::UpdateStmt(UpdateStmt {
            relation: Box::new(self.lower_table_with_joins(&update.table)),
            target_list,
            from_clause,
            where_clause: update
                .selection
                .as_ref()
                .map(|expr| Box::new(self.lower_expr(expr))),
            returning_list: self.lower_returning(update.returning.as_deref()),
            with_clause: None,
            location,
        })
    }

    fn lower_delete(&self, delete: &Delete, location: Option<usize>) -> QueryNode {
        let tables = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };
        let mut tables = tables.iter().map(|table| self.lower_table_with_joins(table));
        let relation = tables.next().unwrap_or_else(|| {
            QueryNode::Expr(ExprNode {
                args: Vec::new(),
                location,
            })
        });
        let mut using_clause: Vec<QueryNode> = tables.collect();
        using_clause.extend(
            delete
                .using
                .iter()
                .flatten()
                .map(|table| self.lower_table_with_joins(table)),
        );

        QueryNode::DeleteStmt(DeleteStmt {
            relation: Box::new(relation),
            using_clause,
            where_clause: delete
                .selection
                .as_ref()
                .map(|expr| Box::new(self.lower_expr(expr))),
            returning_list: self.lower_returning(delete.returning.as_deref()),
            with_clause: None,
            location,
        })
    }

    fn lower_returning(&self, returning: Option<&[SelectItem]>) -> Vec<QueryNode> {
        returning
            .unwrap_or_default()
            .iter()
            .map(|item| self.lower_select_item(item))
            .collect()
    }

    fn lower_utility(&self, stmt: &Statement, location: Option<usize>) -> QueryNode {
        let kind = stmt
            .to_string()
            .split_whitespace()
            .take(2)
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        log::debug!("Lowering {} statement without table references", kind);
        let children = self
            .collect_references(stmt)
            .into_iter()
            .filter(QueryNode::is_statement)
            .collect();
        QueryNode::UtilityStmt(UtilityStmt {
            kind,
            children,
            location,
        })
    }
}
