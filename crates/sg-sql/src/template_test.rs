use super::*;
use sg_core::{Position, TemplateExpression, TextFragment};

const SENTINEL: &str = "__spread__";

fn fragment(text: &str, line: usize, column: usize) -> TextFragment {
    TextFragment {
        text: text.to_string(),
        location: SourceLocation::point(line, column),
    }
}

fn expression(line: usize, column: usize, spread: Option<SpreadKind>) -> TemplateExpression {
    TemplateExpression {
        location: SourceLocation::span(Position::new(line, column), Position::new(line, column + 8)),
        spread,
        properties: None,
        text: None,
    }
}

fn descriptor(fragments: Vec<TextFragment>, expressions: Vec<TemplateExpression>) -> TemplateDescriptor {
    TemplateDescriptor {
        location: None,
        fragments,
        expressions,
        result_type: None,
    }
}

#[test]
fn test_compile_without_expressions() {
    let compiled = compile_template(
        &descriptor(vec![fragment("SELECT * FROM users", 3, 10)], vec![]),
        SENTINEL,
    );
    assert_eq!(compiled.text, "SELECT * FROM users");
    assert_eq!(compiled.source_map.len(), 1);
    assert_eq!(compiled.source_map[0].query_end_index, compiled.text.len());
    assert!(compiled.params.is_empty());
}

#[test]
fn test_compile_plain_parameters() {
    let compiled = compile_template(
        &descriptor(
            vec![
                fragment("SELECT * FROM users WHERE id = ", 1, 0),
                fragment(" AND name = ", 1, 40),
                fragment("", 1, 60),
            ],
            vec![expression(1, 31, None), expression(1, 52, None)],
        ),
        SENTINEL,
    );
    assert_eq!(
        compiled.text,
        "SELECT * FROM users WHERE id = $1 AND name = $2"
    );
    assert_eq!(compiled.params.len(), 2);
    assert_eq!(compiled.params[1].ordinal, 2);
    assert_eq!(compiled.params[1].expression_index, 1);

    let flags: Vec<bool> = compiled
        .source_map
        .iter()
        .map(|span| span.is_template_expression)
        .collect();
    assert_eq!(flags, vec![false, true, false, true, false]);
}

#[test]
fn test_compile_spread_placeholders() {
    let insert = compile_template(
        &descriptor(
            vec![fragment("INSERT INTO users ", 1, 0), fragment("", 1, 30)],
            vec![expression(1, 18, Some(SpreadKind::Insert))],
        ),
        SENTINEL,
    );
    assert_eq!(insert.text, "INSERT INTO users SELECT $1");

    let update = compile_template(
        &descriptor(
            vec![fragment("UPDATE users SET ", 1, 0), fragment(" WHERE id = 1", 1, 30)],
            vec![expression(1, 17, Some(SpreadKind::Update))],
        ),
        SENTINEL,
    );
    assert_eq!(
        update.text,
        "UPDATE users SET \"__spread__\" = $1 WHERE id = 1"
    );
    assert_eq!(update.params[0].spread, Some(SpreadKind::Update));
}

#[test]
fn test_source_map_is_contiguous() {
    let compiled = compile_template(
        &descriptor(
            vec![
                fragment("\n  SELECT *\n  FROM users\n  WHERE id = ", 2, 20),
                fragment(" OR email = ", 5, 20),
                fragment("\n", 5, 40),
            ],
            vec![expression(5, 13, None), expression(5, 32, None)],
        ),
        SENTINEL,
    );

    let mut expected_start = 0;
    for span in &compiled.source_map {
        assert_eq!(span.query_start_index, expected_start);
        assert!(span.query_end_index >= span.query_start_index);
        expected_start = span.query_end_index;
    }
    assert_eq!(expected_start, compiled.text.len());
}

#[test]
fn test_span_at() {
    let compiled = compile_template(
        &descriptor(
            vec![fragment("SELECT ", 1, 0), fragment("", 1, 20)],
            vec![expression(1, 7, None)],
        ),
        SENTINEL,
    );
    assert!(!compiled.span_at(0).unwrap().is_template_expression);
    assert!(compiled.span_at(7).unwrap().is_template_expression);
    assert!(compiled.span_at(9).is_none());
}
