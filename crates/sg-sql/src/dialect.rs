//! SQL dialect abstraction

use sqlparser::ast::Statement;
use sqlparser::dialect::{
    Dialect, GenericDialect as SqlParserGeneric, PostgreSqlDialect as SqlParserPostgres,
};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| {
            let msg = e.to_string();
            let (line, column) = parse_location_from_error(&msg);
            SqlError::ParseError {
                message: msg,
                line,
                column,
            }
        })
    }

    /// Whether unquoted identifiers are case-folded to lower case
    fn folds_unquoted_identifiers(&self) -> bool;
}

/// Parse line and column from sqlparser error message.
///
/// sqlparser's `ParserError` is a simple string wrapper with no structured
/// location data, so we extract "Line: N, Column: M" from the error message text.
/// Both values are 1-based; `(0, 0)` means the message carried no location.
pub fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let Some(line_idx) = msg.find("Line: ") else {
        return (0, 0);
    };
    let line_start = line_idx + 6;
    let Some(comma_idx) = msg[line_start..].find(',') else {
        return (0, 0);
    };
    let Ok(line) = msg[line_start..line_start + comma_idx]
        .trim()
        .parse::<usize>()
    else {
        return (0, 0);
    };
    let Some(col_idx) = msg.find("Column: ") else {
        return (0, 0);
    };
    let col_start = col_idx + 8;
    let col_end = msg[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| col_start + i)
        .unwrap_or(msg.len());
    let Ok(column) = msg[col_start..col_end].trim().parse::<usize>() else {
        return (0, 0);
    };
    (line, column)
}

/// PostgreSQL dialect
pub struct PostgresDialect {
    dialect: SqlParserPostgres,
}

impl PostgresDialect {
    /// Create a new PostgreSQL dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserPostgres {},
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn folds_unquoted_identifiers(&self) -> bool {
        true
    }
}

/// Generic SQL dialect
pub struct GenericDialect {
    dialect: SqlParserGeneric,
}

impl GenericDialect {
    /// Create a new generic dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserGeneric {},
        }
    }
}

impl Default for GenericDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for GenericDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn folds_unquoted_identifiers(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
