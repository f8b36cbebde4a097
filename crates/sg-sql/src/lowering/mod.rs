//! AST-to-node lowering: converts the sqlparser AST into [`QueryNode`] trees
//!
//! Lowering never fails. Constructs without a dedicated node shape are kept
//! as generic nodes holding only the references and nested statements found
//! inside them.

mod expr;
mod statement;

use crate::node::QueryNode;
use crate::offset::LineIndex;
use sqlparser::ast::{Ident, ObjectName, Statement};
use sqlparser::tokenizer::Span;

/// Options controlling how identifiers are lowered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoweringOptions {
    /// Fold unquoted identifiers to lower case
    pub fold_identifiers: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            fold_identifiers: true,
        }
    }
}

/// Lower a parsed statement of `text` into a query node tree
pub fn lower_statement(stmt: &Statement, text: &str, options: &LoweringOptions) -> QueryNode {
    let lowerer = Lowerer {
        index: LineIndex::new(text),
        fold_identifiers: options.fold_identifiers,
    };
    lowerer.lower_statement(stmt)
}

pub(crate) struct Lowerer<'t> {
    index: LineIndex<'t>,
    fold_identifiers: bool,
}

impl Lowerer<'_> {
    /// Byte offset of the start of `span`
    pub(crate) fn offset(&self, span: Span) -> Option<usize> {
        self.index
            .offset(span.start.line as usize, span.start.column as usize)
    }

    /// Identifier as matched against schemas
    pub(crate) fn ident_name(&self, ident: &Ident) -> String {
        if self.fold_identifiers && ident.quote_style.is_none() {
            ident.value.to_lowercase()
        } else {
            ident.value.clone()
        }
    }

    /// Last part of a possibly schema-qualified name
    pub(crate) fn relation_name(&self, name: &ObjectName) -> String {
        name.0
            .last()
            .and_then(|part| part.as_ident())
            .map(|ident| self.ident_name(ident))
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
#[path = "lowering_test.rs"]
mod tests;
