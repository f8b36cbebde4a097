//! sg-sql - SQL layer for sqlguard
//!
//! This crate compiles SQL templates into query strings with a source map,
//! parses them with sqlparser-rs, and lowers the parser AST into a closed
//! [`QueryNode`] tree that can be walked with ancestry tracking.

pub mod dialect;
pub mod error;
pub mod lowering;
pub mod node;
pub mod offset;
pub mod parser;
pub mod path;
pub mod template;

pub use dialect::{parse_location_from_error, GenericDialect, PostgresDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use lowering::{lower_statement, LoweringOptions};
pub use node::{ColumnField, QueryNode};
pub use offset::LineIndex;
pub use parser::{SqlParser, SyntaxFailure};
pub use path::{traverse, QueryNodePath, Traversal};
pub use template::{
    compile_template, placeholder_for, CompiledTemplate, QuerySourceMapSpan, TemplateParam,
};
