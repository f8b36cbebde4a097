//! Shared test utilities for sg-analysis
//!
//! Templates built here are laid out as if written in host source as
//! ``sql`...` `` starting at line [`TEMPLATE_LINE`], with the first literal
//! character at column [`TEMPLATE_COLUMN`] and every expression written as
//! `${text}`.

use crate::file::{check_files, CheckOptions, CheckReport};
use sg_core::{
    ColumnDeclaration, ColumnDescriptor, Position, SourceFile, SourceLocation, SpreadKind,
    TableDeclaration, TableName, TableSchema, TemplateDescriptor, TemplateExpression,
    TextFragment, TypeArgument,
};
use std::path::PathBuf;

/// Host source line the template literal starts on
pub const TEMPLATE_LINE: usize = 10;
/// Column of the first literal character, right after ``sql` ``
pub const TEMPLATE_COLUMN: usize = 4;
/// Host source file of test templates
pub const SOURCE_PATH: &str = "src/app.ts";

/// Column of type `string` without default value
pub fn column(name: &str) -> ColumnDeclaration {
    ColumnDeclaration {
        name: name.to_string(),
        descriptor: ColumnDescriptor {
            column_type: "string".to_string(),
            subtype: None,
            enum_values: None,
            nullable: false,
            has_default: false,
        },
    }
}

/// Column that may be omitted on INSERT
pub fn column_with_default(name: &str) -> ColumnDeclaration {
    let mut column = column(name);
    column.descriptor.has_default = true;
    column
}

/// Table declaration at `line` of the host source
pub fn table(name: &str, columns: Vec<ColumnDeclaration>, line: usize) -> TableDeclaration {
    TableDeclaration {
        name: TableName::new(name),
        location: Some(SourceLocation::point(line, 0)),
        columns,
    }
}

/// Schema with the given columns, none of which has a default
pub fn make_schema(name: &str, columns: &[&str]) -> TableSchema {
    let declaration = table(name, columns.iter().map(|c| column(c)).collect(), 1);
    TableSchema::from_declaration(&declaration, &PathBuf::from("src/schema.ts"))
}

fn properties(names: Option<&[&str]>) -> Option<Vec<String>> {
    names.map(|names| names.iter().map(|name| name.to_string()).collect())
}

/// Plain interpolated value
pub fn expression(text: &str) -> TemplateExpression {
    TemplateExpression {
        location: SourceLocation::point(1, 0),
        spread: None,
        properties: None,
        text: Some(text.to_string()),
    }
}

/// `spreadInsert(value)`; `None` properties mean inference gave up
pub fn insert_spread(names: Option<&[&str]>) -> TemplateExpression {
    TemplateExpression {
        spread: Some(SpreadKind::Insert),
        properties: properties(names),
        ..expression("spreadInsert(value)")
    }
}

/// `spreadUpdate(value)`; `None` properties mean inference gave up
pub fn update_spread(names: Option<&[&str]>) -> TemplateExpression {
    TemplateExpression {
        spread: Some(SpreadKind::Update),
        properties: properties(names),
        ..expression("spreadUpdate(value)")
    }
}

fn advance(position: &mut Position, text: &str) {
    for c in text.chars() {
        if c == '\n' {
            position.line += 1;
            position.column = 0;
        } else {
            position.column += 1;
        }
    }
}

/// Template whose fragments and expressions are located one after another
pub fn template(fragments: &[&str], mut expressions: Vec<TemplateExpression>) -> TemplateDescriptor {
    assert_eq!(
        fragments.len(),
        expressions.len() + 1,
        "a template needs one more fragment than expressions"
    );

    let start = Position::new(TEMPLATE_LINE, TEMPLATE_COLUMN);
    let mut position = start;
    let mut text_fragments = Vec::with_capacity(fragments.len());
    for (index, fragment) in fragments.iter().enumerate() {
        let fragment_start = position;
        advance(&mut position, fragment);
        text_fragments.push(TextFragment {
            text: fragment.to_string(),
            location: SourceLocation::span(fragment_start, position),
        });

        if let Some(expression) = expressions.get_mut(index) {
            advance(&mut position, "${");
            let expression_start = position;
            advance(&mut position, expression.text.as_deref().unwrap_or("value"));
            expression.location = SourceLocation::span(expression_start, position);
            advance(&mut position, "}");
        }
    }

    TemplateDescriptor {
        location: Some(SourceLocation::span(
            Position::new(TEMPLATE_LINE, TEMPLATE_COLUMN - 4),
            Position::new(position.line, position.column + 1),
        )),
        fragments: text_fragments,
        expressions,
        result_type: None,
    }
}

/// Template without interpolations
pub fn sql_template(sql: &str) -> TemplateDescriptor {
    template(&[sql], Vec::new())
}

/// Attach a result type argument `Row`; `None` properties mean inference gave up
pub fn with_result_type(
    mut template: TemplateDescriptor,
    names: Option<&[&str]>,
) -> TemplateDescriptor {
    template.result_type = Some(TypeArgument {
        text: "Row".to_string(),
        location: SourceLocation::point(TEMPLATE_LINE - 1, 20),
        properties: properties(names),
    });
    template
}

pub fn source_file(
    path: &str,
    tables: Vec<TableDeclaration>,
    templates: Vec<TemplateDescriptor>,
) -> SourceFile {
    SourceFile {
        path: PathBuf::from(path),
        tables,
        templates,
    }
}

/// Check one template against `tables`, all declared in [`SOURCE_PATH`]
pub fn check_template(tables: Vec<TableDeclaration>, template: TemplateDescriptor) -> CheckReport {
    let file = source_file(SOURCE_PATH, tables, vec![template]);
    check_files(&[file], &CheckOptions::default()).expect("collector protocol violated")
}

/// Host location of byte `offset` within a single-line template
pub fn location_at(offset: usize) -> SourceLocation {
    SourceLocation::point(TEMPLATE_LINE, TEMPLATE_COLUMN + offset)
}
