//! Template compiler: merges literal fragments and interpolated expressions
//! into one SQL string plus a source map back to the host source file.

use serde::Serialize;
use sg_core::{SourceLocation, SpreadKind, TemplateDescriptor};

/// Maps the half-open byte range `query_start_index..query_end_index` of a
/// generated query string to a location in the original source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySourceMapSpan {
    pub source_location: SourceLocation,
    pub query_start_index: usize,
    pub query_end_index: usize,
    /// Span produced by an interpolated expression rather than literal text
    pub is_template_expression: bool,
}

impl QuerySourceMapSpan {
    /// Whether `offset` falls inside this span
    pub fn contains(&self, offset: usize) -> bool {
        self.query_start_index <= offset && offset < self.query_end_index
    }
}

/// A positional parameter substituted for a template expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateParam {
    /// 1-based parameter number (`$1`, `$2`, ...)
    pub ordinal: u32,
    /// Index of the expression in the template descriptor
    pub expression_index: usize,
    pub spread: Option<SpreadKind>,
}

/// Output of [`compile_template`]
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    /// Generated SQL text
    pub text: String,
    /// Spans ordered by `query_start_index`, contiguous and covering `text`
    pub source_map: Vec<QuerySourceMapSpan>,
    /// One entry per expression, in template order
    pub params: Vec<TemplateParam>,
}

impl CompiledTemplate {
    /// The span covering `offset`, if any
    pub fn span_at(&self, offset: usize) -> Option<&QuerySourceMapSpan> {
        self.source_map.iter().find(|span| span.contains(offset))
    }
}

/// Placeholder text substituted for an expression.
///
/// Insert spreads become a single-parameter sub-select so the generated
/// statement still parses as `INSERT INTO t SELECT $n`; update spreads become
/// an assignment to the sentinel column.
pub fn placeholder_for(
    ordinal: u32,
    spread: Option<SpreadKind>,
    spread_update_column: &str,
) -> String {
    match spread {
        None => format!("${ordinal}"),
        Some(SpreadKind::Insert) => format!("SELECT ${ordinal}"),
        Some(SpreadKind::Update) => format!("\"{spread_update_column}\" = ${ordinal}"),
    }
}

/// Concatenate the fragments of `descriptor`, substituting each expression
/// with its positional placeholder.
pub fn compile_template(
    descriptor: &TemplateDescriptor,
    spread_update_column: &str,
) -> CompiledTemplate {
    let mut text = String::new();
    let mut source_map = Vec::with_capacity(descriptor.fragments.len() * 2);
    let mut params = Vec::with_capacity(descriptor.expressions.len());

    let mut append = |text: &mut String, partial: &str, location: SourceLocation, is_expr: bool| {
        let start = text.len();
        text.push_str(partial);
        source_map.push(QuerySourceMapSpan {
            source_location: location,
            query_start_index: start,
            query_end_index: text.len(),
            is_template_expression: is_expr,
        });
    };

    for (index, fragment) in descriptor.fragments.iter().enumerate() {
        append(&mut text, &fragment.text, fragment.location, false);

        let Some(expression) = descriptor.expressions.get(index) else {
            continue;
        };
        let ordinal = (index + 1) as u32;
        let placeholder = placeholder_for(ordinal, expression.spread, spread_update_column);
        append(&mut text, &placeholder, expression.location, true);
        params.push(TemplateParam {
            ordinal,
            expression_index: index,
            spread: expression.spread,
        });
    }

    CompiledTemplate {
        text,
        source_map,
        params,
    }
}

#[cfg(test)]
#[path = "template_test.rs"]
mod tests;
