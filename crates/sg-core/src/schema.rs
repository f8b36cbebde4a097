//! Declared table schemas and their column descriptors

use crate::location::SourceLocation;
use crate::source::TableDeclaration;
use crate::table_name::TableName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Column type name used for columns of synthetic schemas whose type is not
/// tracked (e.g. explicitly named CTE output columns).
pub const ANY_COLUMN_TYPE: &str = "any";

/// Descriptor of a single declared column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Host-level type name (e.g. "number", "string", "enum")
    #[serde(rename = "type")]
    pub column_type: String,

    /// Element type for container types (e.g. arrays)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Allowed values for enum columns
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// Whether the column accepts NULL
    #[serde(default)]
    pub nullable: bool,

    /// Whether the column has a default value (may be omitted on INSERT)
    #[serde(default)]
    pub has_default: bool,
}

impl ColumnDescriptor {
    /// Descriptor for a column of unknown type
    pub fn any() -> Self {
        Self {
            column_type: ANY_COLUMN_TYPE.to_string(),
            subtype: None,
            enum_values: None,
            nullable: false,
            has_default: false,
        }
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let props: Vec<&str> = [
            self.has_default.then_some("default value"),
            self.nullable.then_some("nullable"),
        ]
        .into_iter()
        .flatten()
        .collect();
        let props = if props.is_empty() {
            String::new()
        } else {
            format!(" ({})", props.join(", "))
        };

        match (&self.enum_values, self.column_type.as_str()) {
            (Some(values), "enum") => {
                let values: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
                write!(f, "enum{props} [{}]", values.join(", "))
            }
            _ => match &self.subtype {
                Some(subtype) => write!(f, "{}[{subtype}]{props}", self.column_type),
                None => write!(f, "{}{props}", self.column_type),
            },
        }
    }
}

/// A named column within a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(flatten)]
    pub descriptor: ColumnDescriptor,
}

/// A table schema: declared through a `defineTable`-like call in host source,
/// or synthesized from a sub-statement exposed as a table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub table_name: TableName,
    /// Columns in declaration order
    pub columns: Vec<SchemaColumn>,
    pub source_file: PathBuf,
    pub location: Option<SourceLocation>,
}

impl TableSchema {
    /// Build the schema for a table declaration found in `source_file`
    pub fn from_declaration(declaration: &TableDeclaration, source_file: &Path) -> Self {
        Self {
            table_name: declaration.name.clone(),
            columns: declaration
                .columns
                .iter()
                .map(|c| SchemaColumn {
                    name: c.name.clone(),
                    descriptor: c.descriptor.clone(),
                })
                .collect(),
            source_file: source_file.to_path_buf(),
            location: declaration.location,
        }
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Whether the schema declares a column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns without a default value, which every INSERT must provide
    pub fn mandatory_columns(&self) -> impl Iterator<Item = &SchemaColumn> {
        self.columns.iter().filter(|c| !c.descriptor.has_default)
    }

    /// `file:line` reference to the declaration site
    pub fn declaration_site(&self) -> String {
        match &self.location {
            Some(loc) => format!("{}:{}", self.source_file.display(), loc.start.line),
            None => self.source_file.display().to_string(),
        }
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
