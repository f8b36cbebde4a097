//! SQL parser wrapper

use crate::dialect::{GenericDialect, PostgresDialect, SqlDialect};
use crate::error::{SqlError, SqlResult};
use crate::lowering::{lower_statement, LoweringOptions};
use crate::node::QueryNode;
use crate::offset::LineIndex;
use sg_core::Dialect;
use sqlparser::ast::Statement;

/// Parse failure located in the generated query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxFailure {
    pub message: String,
    /// 0-based byte offset of the parser cursor, if it reported one
    pub cursor_offset: Option<usize>,
}

impl SyntaxFailure {
    fn from_error(error: &SqlError, sql: &str) -> Self {
        let cursor_offset = match error {
            SqlError::ParseError {
                message,
                line,
                column,
            } => LineIndex::new(sql)
                .offset(*line, *column)
                .or_else(|| end_of_input_offset(message, sql)),
            SqlError::EmptySql => None,
        };
        Self {
            message: error.to_string(),
            cursor_offset,
        }
    }
}

/// sqlparser reports no position when it runs out of input; point at the
/// last character of the query instead
fn end_of_input_offset(message: &str, sql: &str) -> Option<usize> {
    if !message.contains("found: EOF") {
        return None;
    }
    sql.trim_end().char_indices().next_back().map(|(offset, _)| offset)
}

/// SQL parser that wraps sqlparser-rs with dialect support
pub struct SqlParser {
    dialect: Box<dyn SqlDialect>,
}

impl SqlParser {
    /// Create a new parser with the PostgreSQL dialect
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgresDialect::new()),
        }
    }

    /// Create a new parser with the generic dialect
    pub fn generic() -> Self {
        Self {
            dialect: Box::new(GenericDialect::new()),
        }
    }

    /// Create a parser for a configured dialect
    pub fn from_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Postgres => Self::postgres(),
            Dialect::Generic => Self::generic(),
        }
    }

    /// Parse SQL into AST statements.
    ///
    /// The text is handed to the parser untouched so that reported locations
    /// line up with the generated query string.
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        if sql.trim().is_empty() {
            return Err(SqlError::EmptySql);
        }

        self.dialect.parse(sql)
    }

    /// Parse a generated query and lower its first statement.
    ///
    /// Further statements are logged and ignored.
    pub fn parse_query(&self, sql: &str) -> Result<QueryNode, SyntaxFailure> {
        let stmts = self
            .parse(sql)
            .map_err(|e| SyntaxFailure::from_error(&e, sql))?;

        let mut stmts = stmts.into_iter();
        let Some(first) = stmts.next() else {
            return Err(SyntaxFailure::from_error(&SqlError::EmptySql, sql));
        };
        let ignored = stmts.count();
        if ignored > 0 {
            log::warn!(
                "Query contains {} additional statement(s), only the first one is checked",
                ignored
            );
        }

        Ok(lower_statement(&first, sql, &self.lowering_options()))
    }

    /// Identifier handling for this parser's dialect
    pub fn lowering_options(&self) -> LoweringOptions {
        LoweringOptions {
            fold_identifiers: self.dialect.folds_unquoted_identifiers(),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::postgres()
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
