//! Query node tree: a closed sum type over the statement and expression
//! shapes the reference extractor cares about.
//!
//! Nodes are lowered from the sqlparser AST (see [`crate::lowering`]). Every
//! node records the byte offset of its first token in the generated query
//! string, when the parser reported one.

use std::fmt;

/// Node in a lowered statement tree
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    SelectStmt(SelectStmt),
    InsertStmt(InsertStmt),
    UpdateStmt(UpdateStmt),
    DeleteStmt(DeleteStmt),
    /// Any other statement; only nested queries are kept
    UtilityStmt(UtilityStmt),
    WithClause(WithClause),
    CommonTableExpr(CommonTableExpr),
    /// Table reference in a FROM / JOIN / INTO position
    RangeVar(RangeVar),
    /// Derived table `(SELECT ...) AS alias`
    RangeSubselect(RangeSubselect),
    JoinExpr(JoinExpr),
    /// Entry of a select target list or RETURNING list
    ResTarget(ResTarget),
    /// Column target of an UPDATE SET or INSERT column list
    Assignment(Assignment),
    ColumnRef(ColumnRef),
    /// Positional parameter `$n`
    ParamRef(ParamRef),
    /// Any other expression; children are the references found inside it
    Expr(ExprNode),
}

/// Set operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
    Other,
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetOperator::Union => write!(f, "UNION"),
            SetOperator::Intersect => write!(f, "INTERSECT"),
            SetOperator::Except => write!(f, "EXCEPT"),
            SetOperator::Other => write!(f, "SET OPERATION"),
        }
    }
}

/// Branches of a set operation
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub op: SetOperator,
    pub larg: Box<QueryNode>,
    pub rarg: Box<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt {
    /// `DISTINCT ON (...)` expressions
    pub distinct_clause: Vec<QueryNode>,
    pub target_list: Vec<QueryNode>,
    pub from_clause: Vec<QueryNode>,
    pub where_clause: Option<Box<QueryNode>>,
    pub group_clause: Vec<QueryNode>,
    pub having_clause: Option<Box<QueryNode>>,
    /// One `Expr` node per VALUES row
    pub values_lists: Vec<QueryNode>,
    pub sort_clause: Vec<QueryNode>,
    /// References inside LIMIT / OFFSET / FETCH
    pub limit_clause: Vec<QueryNode>,
    pub set_operation: Option<SetOperation>,
    pub with_clause: Option<Box<QueryNode>>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub relation: Box<QueryNode>,
    pub cols: Vec<QueryNode>,
    pub select_stmt: Option<Box<QueryNode>>,
    pub on_conflict: Option<OnConflictClause>,
    pub returning_list: Vec<QueryNode>,
    pub with_clause: Option<Box<QueryNode>>,
    pub location: Option<usize>,
}

/// `ON CONFLICT` of an INSERT; columns of both lists belong to the target table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnConflictClause {
    /// Conflict target columns
    pub infer_elems: Vec<QueryNode>,
    /// `DO UPDATE SET` assignments
    pub target_list: Vec<QueryNode>,
    pub where_clause: Option<Box<QueryNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub relation: Box<QueryNode>,
    pub target_list: Vec<QueryNode>,
    pub from_clause: Vec<QueryNode>,
    pub where_clause: Option<Box<QueryNode>>,
    pub returning_list: Vec<QueryNode>,
    pub with_clause: Option<Box<QueryNode>>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub relation: Box<QueryNode>,
    pub using_clause: Vec<QueryNode>,
    pub where_clause: Option<Box<QueryNode>>,
    pub returning_list: Vec<QueryNode>,
    pub with_clause: Option<Box<QueryNode>>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UtilityStmt {
    /// Statement keyword(s), e.g. "CREATE TABLE"
    pub kind: String,
    pub children: Vec<QueryNode>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithClause {
    pub ctes: Vec<QueryNode>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpr {
    pub ctename: String,
    pub ctequery: Box<QueryNode>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeVar {
    /// Unqualified relation name (last part of a dotted name)
    pub relname: String,
    pub alias: Option<String>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeSubselect {
    pub subquery: Box<QueryNode>,
    pub alias: Option<String>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpr {
    pub larg: Box<QueryNode>,
    pub rarg: Box<QueryNode>,
    pub quals: Option<Box<QueryNode>>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResTarget {
    /// Output name given with `AS`
    pub name: Option<String>,
    pub val: Option<Box<QueryNode>>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Target column name
    pub name: String,
    pub val: Option<Box<QueryNode>>,
    pub location: Option<usize>,
}

/// One dotted part of a column reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnField {
    Name(String),
    Star,
    /// Anything that is not a plain identifier, rendered as SQL
    Expr(String),
}

impl fmt::Display for ColumnField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnField::Name(name) => write!(f, "{name}"),
            ColumnField::Star => write!(f, "*"),
            ColumnField::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub fields: Vec<ColumnField>,
    pub location: Option<usize>,
}

impl ColumnRef {
    /// Fields joined with dots, as written
    pub fn dotted(&self) -> String {
        self.fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamRef {
    pub number: u32,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub args: Vec<QueryNode>,
    pub location: Option<usize>,
}

fn push_opt<'a>(
    children: &mut Vec<(&'static str, &'a QueryNode)>,
    key: &'static str,
    node: &'a Option<Box<QueryNode>>,
) {
    if let Some(node) = node {
        children.push((key, &**node));
    }
}

fn push_all<'a>(
    children: &mut Vec<(&'static str, &'a QueryNode)>,
    key: &'static str,
    nodes: &'a [QueryNode],
) {
    children.extend(nodes.iter().map(|node| (key, node)));
}

impl QueryNode {
    /// Node type name, e.g. `SelectStmt` or `ColumnRef`
    pub fn kind_name(&self) -> &'static str {
        match self {
            QueryNode::SelectStmt(_) => "SelectStmt",
            QueryNode::InsertStmt(_) => "InsertStmt",
            QueryNode::UpdateStmt(_) => "UpdateStmt",
            QueryNode::DeleteStmt(_) => "DeleteStmt",
            QueryNode::UtilityStmt(_) => "UtilityStmt",
            QueryNode::WithClause(_) => "WithClause",
            QueryNode::CommonTableExpr(_) => "CommonTableExpr",
            QueryNode::RangeVar(_) => "RangeVar",
            QueryNode::RangeSubselect(_) => "RangeSubselect",
            QueryNode::JoinExpr(_) => "JoinExpr",
            QueryNode::ResTarget(_) => "ResTarget",
            QueryNode::Assignment(_) => "Assignment",
            QueryNode::ColumnRef(_) => "ColumnRef",
            QueryNode::ParamRef(_) => "ParamRef",
            QueryNode::Expr(_) => "Expr",
        }
    }

    /// Byte offset of the node in the generated query string
    pub fn location(&self) -> Option<usize> {
        match self {
            QueryNode::SelectStmt(n) => n.location,
            QueryNode::InsertStmt(n) => n.location,
            QueryNode::UpdateStmt(n) => n.location,
            QueryNode::DeleteStmt(n) => n.location,
            QueryNode::UtilityStmt(n) => n.location,
            QueryNode::WithClause(n) => n.location,
            QueryNode::CommonTableExpr(n) => n.location,
            QueryNode::RangeVar(n) => n.location,
            QueryNode::RangeSubselect(n) => n.location,
            QueryNode::JoinExpr(n) => n.location,
            QueryNode::ResTarget(n) => n.location,
            QueryNode::Assignment(n) => n.location,
            QueryNode::ColumnRef(n) => n.location,
            QueryNode::ParamRef(n) => n.location,
            QueryNode::Expr(n) => n.location,
        }
    }

    /// Whether this node is a full statement
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            QueryNode::SelectStmt(_)
                | QueryNode::InsertStmt(_)
                | QueryNode::UpdateStmt(_)
                | QueryNode::DeleteStmt(_)
                | QueryNode::UtilityStmt(_)
        )
    }

    /// Child nodes with the property key they hang off, in traversal order
    pub fn children(&self) -> Vec<(&'static str, &QueryNode)> {
        let mut children = Vec::new();
        match self {
            QueryNode::SelectStmt(n) => {
                push_all(&mut children, "distinctClause", &n.distinct_clause);
                push_all(&mut children, "targetList", &n.target_list);
                push_all(&mut children, "fromClause", &n.from_clause);
                push_opt(&mut children, "whereClause", &n.where_clause);
                push_all(&mut children, "groupClause", &n.group_clause);
                push_opt(&mut children, "havingClause", &n.having_clause);
                push_all(&mut children, "valuesLists", &n.values_lists);
                push_all(&mut children, "sortClause", &n.sort_clause);
                push_all(&mut children, "limitClause", &n.limit_clause);
                if let Some(set_op) = &n.set_operation {
                    children.push(("larg", &*set_op.larg));
                    children.push(("rarg", &*set_op.rarg));
                }
                push_opt(&mut children, "withClause", &n.with_clause);
            }
            QueryNode::InsertStmt(n) => {
                children.push(("relation", &*n.relation));
                push_all(&mut children, "cols", &n.cols);
                push_opt(&mut children, "selectStmt", &n.select_stmt);
                if let Some(on_conflict) = &n.on_conflict {
                    push_all(&mut children, "onConflictInfer", &on_conflict.infer_elems);
                    push_all(&mut children, "onConflictSet", &on_conflict.target_list);
                    push_opt(&mut children, "onConflictWhere", &on_conflict.where_clause);
                }
                push_all(&mut children, "returningList", &n.returning_list);
                push_opt(&mut children, "withClause", &n.with_clause);
            }
            QueryNode::UpdateStmt(n) => {
                children.push(("relation", &*n.relation));
                push_all(&mut children, "targetList", &n.target_list);
                push_all(&mut children, "fromClause", &n.from_clause);
                push_opt(&mut children, "whereClause", &n.where_clause);
                push_all(&mut children, "returningList", &n.returning_list);
                push_opt(&mut children, "withClause", &n.with_clause);
            }
            QueryNode::DeleteStmt(n) => {
                children.push(("relation", &*n.relation));
                push_all(&mut children, "usingClause", &n.using_clause);
                push_opt(&mut children, "whereClause", &n.where_clause);
                push_all(&mut children, "returningList", &n.returning_list);
                push_opt(&mut children, "withClause", &n.with_clause);
            }
            QueryNode::UtilityStmt(n) => push_all(&mut children, "children", &n.children),
            QueryNode::WithClause(n) => push_all(&mut children, "ctes", &n.ctes),
            QueryNode::CommonTableExpr(n) => children.push(("ctequery", &*n.ctequery)),
            QueryNode::RangeSubselect(n) => children.push(("subquery", &*n.subquery)),
            QueryNode::JoinExpr(n) => {
                children.push(("larg", &*n.larg));
                children.push(("rarg", &*n.rarg));
                push_opt(&mut children, "quals", &n.quals);
            }
            QueryNode::ResTarget(n) => push_opt(&mut children, "val", &n.val),
            QueryNode::Assignment(n) => push_opt(&mut children, "val", &n.val),
            QueryNode::Expr(n) => push_all(&mut children, "args", &n.args),
            QueryNode::RangeVar(_) | QueryNode::ColumnRef(_) | QueryNode::ParamRef(_) => {}
        }
        children
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod tests;
