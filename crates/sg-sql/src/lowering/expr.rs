//! Expression lowering
//!
//! Expressions are not modelled node by node. An expression lowers to the
//! column references, parameters and nested statements it contains, in
//! source order. Nested statements are lowered on their own, so references
//! inside them never leak into the enclosing expression.

use super::Lowerer;
use crate::node::{ColumnField, ColumnRef, ExprNode, ParamRef, QueryNode};
use sqlparser::ast::{Expr, Query, Spanned, Value, Visit, Visitor};
use std::ops::ControlFlow;

impl Lowerer<'_> {
    pub(crate) fn lower_expr(&self, expr: &Expr) -> QueryNode {
        match expr {
            Expr::Nested(inner) => self.lower_expr(inner),
            Expr::Subquery(query) => self.lower_query(query),
            other => match self.lower_leaf(other) {
                Some(node) => node,
                None => self.expression_node(other, self.offset(other.span())),
            },
        }
    }

    /// Generic node holding the references found in `value`
    pub(crate) fn expression_node<V: Visit>(
        &self,
        value: &V,
        location: Option<usize>,
    ) -> QueryNode {
        QueryNode::Expr(ExprNode {
            args: self.collect_references(value),
            location,
        })
    }

    /// Column references, parameters and nested statements inside `value`
    pub(crate) fn collect_references<V: Visit>(&self, value: &V) -> Vec<QueryNode> {
        let mut collector = ReferenceCollector {
            lowerer: self,
            depth: 0,
            nodes: Vec::new(),
        };
        let _ = value.visit(&mut collector);
        collector.nodes
    }

    fn lower_leaf(&self, expr: &Expr) -> Option<QueryNode> {
        match expr {
            // `DEFAULT` in VALUES lists parses as a bare identifier
            Expr::Identifier(ident)
                if ident.quote_style.is_none() && ident.value.eq_ignore_ascii_case("default") =>
            {
                None
            }
            Expr::Identifier(ident) => Some(QueryNode::ColumnRef(ColumnRef {
                fields: vec![ColumnField::Name(self.ident_name(ident))],
                location: self.offset(ident.span),
            })),
            Expr::CompoundIdentifier(idents) => Some(QueryNode::ColumnRef(ColumnRef {
                fields: idents
                    .iter()
                    .map(|ident| ColumnField::Name(self.ident_name(ident)))
                    .collect(),
                location: idents.first().and_then(|ident| self.offset(ident.span)),
            })),
            Expr::Value(value) => match &value.value {
                Value::Placeholder(placeholder) => {
                    let number = placeholder.strip_prefix('$')?.parse::<u32>().ok()?;
                    Some(QueryNode::ParamRef(ParamRef {
                        number,
                        location: self.offset(value.span),
                    }))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Collects references at nesting depth zero; every top-level nested query is
/// lowered as a statement node instead of being descended into.
struct ReferenceCollector<'l, 't> {
    lowerer: &'l Lowerer<'t>,
    depth: usize,
    nodes: Vec<QueryNode>,
}

impl Visitor for ReferenceCollector<'_, '_> {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if self.depth == 0 {
            self.nodes.push(self.lowerer.lower_query(query));
        }
        self.depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.depth = self.depth.saturating_sub(1);
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if self.depth == 0 {
            if let Some(node) = self.lowerer.lower_leaf(expr) {
                self.nodes.push(node);
            }
        }
        ControlFlow::Continue(())
    }
}
