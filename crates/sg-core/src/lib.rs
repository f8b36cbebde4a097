//! sg-core - Core library for sqlguard
//!
//! This crate provides the shared data model used across all sqlguard
//! components: source locations, column descriptors and table schemas,
//! the records produced by host-source extraction, and configuration.

pub mod config;
pub mod error;
pub mod location;
pub mod schema;
pub mod source;
pub mod table_name;

pub use config::{AnalysisConfig, Config, ConfigSeverity, Dialect};
pub use error::{CoreError, CoreResult};
pub use location::{Position, SourceLocation};
pub use schema::{ColumnDescriptor, SchemaColumn, TableSchema};
pub use source::{
    ColumnDeclaration, SourceFile, SpreadKind, TableDeclaration, TemplateDescriptor,
    TemplateExpression, TextFragment, TypeArgument,
};
pub use table_name::TableName;
