use super::*;

#[test]
fn test_postgres_parse() {
    let dialect = PostgresDialect::new();
    let stmts = dialect.parse("SELECT * FROM users WHERE id = $1").unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_generic_parse() {
    let dialect = GenericDialect::new();
    let stmts = dialect.parse("SELECT * FROM users").unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_identifier_folding() {
    assert!(PostgresDialect::new().folds_unquoted_identifiers());
    assert!(!GenericDialect::new().folds_unquoted_identifiers());
}

#[test]
fn test_parse_error_location() {
    let dialect = PostgresDialect::new();
    let result = dialect.parse("SELECT *\nFROM users WHERE )");
    let Err(SqlError::ParseError {
        line,
        column,
        message,
    }) = result
    else {
        panic!("expected parse error");
    };
    assert_eq!(
        line, 2,
        "Expected line 2, got line {} (message: {})",
        line, message
    );
    assert!(column > 0, "Expected non-zero column (message: {})", message);
}

#[test]
fn test_parse_location_extraction() {
    let (line, col) =
        super::parse_location_from_error("Expected: something at Line: 5, Column: 10");
    assert_eq!(line, 5);
    assert_eq!(col, 10);

    let (line, col) = super::parse_location_from_error("Some error without location");
    assert_eq!(line, 0);
    assert_eq!(col, 0);
}
