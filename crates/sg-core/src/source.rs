//! Records produced by host-source extraction.
//!
//! The host extractor walks application source code, finds SQL templates and
//! table declarations, and hands them over as one manifest per source file.
//! Manifests are JSON, or YAML when the file ends in `.yml`/`.yaml`.

use crate::error::{CoreError, CoreResult};
use crate::location::SourceLocation;
use crate::schema::ColumnDescriptor;
use crate::table_name::TableName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything extracted from one host source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path of the original source file, as shown in diagnostics
    pub path: PathBuf,

    /// Table declarations in source order
    #[serde(default)]
    pub tables: Vec<TableDeclaration>,

    /// SQL templates in source order
    #[serde(default)]
    pub templates: Vec<TemplateDescriptor>,
}

/// A `defineTable`-like declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDeclaration {
    pub name: TableName,
    #[serde(default)]
    pub location: Option<SourceLocation>,
    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<ColumnDeclaration>,
}

/// A column within a table declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDeclaration {
    pub name: String,
    #[serde(flatten)]
    pub descriptor: ColumnDescriptor,
}

/// A tagged SQL template: literal text fragments interleaved with expressions.
///
/// `fragments` always holds one more entry than `expressions`; expression `i`
/// sits between fragment `i` and fragment `i + 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Location of the whole template literal
    #[serde(default)]
    pub location: Option<SourceLocation>,

    pub fragments: Vec<TextFragment>,

    #[serde(default)]
    pub expressions: Vec<TemplateExpression>,

    /// Type argument of the surrounding query call, if any
    #[serde(default)]
    pub result_type: Option<TypeArgument>,
}

/// A literal text segment of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub location: SourceLocation,
}

/// Kind of spread marker wrapping a template expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadKind {
    /// Expands an object into INSERT columns and values
    Insert,
    /// Expands an object into UPDATE assignments
    Update,
}

/// An interpolated expression of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateExpression {
    pub location: SourceLocation,

    /// Spread marker, if the expression is wrapped in one
    #[serde(default)]
    pub spread: Option<SpreadKind>,

    /// Property names of the spread value as inferred by the host type
    /// checker; `None` when inference gave up
    #[serde(default)]
    pub properties: Option<Vec<String>>,

    /// Source text of the expression
    #[serde(default)]
    pub text: Option<String>,
}

/// Type argument of a query call, declaring the expected result row shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeArgument {
    /// Source text of the type argument
    pub text: String,
    pub location: SourceLocation,
    /// Property names of the asserted row type; `None` when inference gave up
    #[serde(default)]
    pub properties: Option<Vec<String>>,
}

impl SourceFile {
    /// Load an extraction manifest from disk
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let file: SourceFile = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("yml") | Some("yaml") => serde_yaml::from_str(&content)?,
            _ => {
                return Err(CoreError::UnsupportedManifestFormat {
                    path: path.display().to_string(),
                })
            }
        };

        file.validate(path)?;
        log::debug!(
            "Loaded manifest {} ({} tables, {} templates)",
            path.display(),
            file.tables.len(),
            file.templates.len()
        );
        Ok(file)
    }

    /// Check the structural invariants the extractor guarantees
    pub fn validate(&self, manifest_path: &Path) -> CoreResult<()> {
        for (index, template) in self.templates.iter().enumerate() {
            if template.fragments.len() != template.expressions.len() + 1 {
                return Err(CoreError::ManifestInvalid {
                    path: manifest_path.display().to_string(),
                    message: format!(
                        "template #{} has {} fragments for {} expressions (expected {})",
                        index + 1,
                        template.fragments.len(),
                        template.expressions.len(),
                        template.expressions.len() + 1
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
