//! End-to-end checks of SQL templates against declared tables

use sg_analysis::test_utils::{
    check_template, column, column_with_default, expression, location_at, sql_template, table,
    template, update_spread, with_result_type, TEMPLATE_COLUMN, TEMPLATE_LINE,
};
use sg_analysis::{check_files, CheckOptions, CheckReport, DiagnosticCode, Severity};
use sg_core::{SourceFile, SourceLocation, TableDeclaration};
use std::io::Write;

fn users() -> TableDeclaration {
    table(
        "users",
        vec![column_with_default("id"), column("name"), column("email")],
        1,
    )
}

fn employees() -> TableDeclaration {
    table(
        "employees",
        vec![column_with_default("id"), column("name"), column("salary")],
        10,
    )
}

fn employers() -> TableDeclaration {
    table(
        "employers",
        vec![column_with_default("id"), column("name"), column("salary")],
        20,
    )
}

fn codes(report: &CheckReport) -> Vec<DiagnosticCode> {
    report.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn test_column_of_undeclared_table() {
    let sql = "SELECT users.name, projects.email FROM users, projects \
               WHERE users.id = projects.owner_id";
    let report = check_template(vec![users()], sql_template(sql));

    assert_eq!(codes(&report), vec![DiagnosticCode::SG002]);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.message, "No table named projects has been defined.");
    assert_eq!(
        diagnostic.location,
        Some(location_at(sql.find("projects.email").unwrap()))
    );
}

#[test]
fn test_insert_missing_mandatory_column() {
    let report = check_template(
        vec![users()],
        sql_template("INSERT INTO users (name) VALUES ($1)"),
    );

    assert_eq!(codes(&report), vec![DiagnosticCode::SG007]);
    assert_eq!(
        report.diagnostics[0].message,
        "Column \"email\" is missing from INSERT statement."
    );
}

#[test]
fn test_insert_from_cte() {
    let report = check_template(
        vec![employees(), employers()],
        sql_template(
            "WITH some_employers AS (SELECT * FROM employers WHERE id < 5)\n\
             INSERT INTO employees SELECT * FROM some_employers",
        ),
    );
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_unqualified_column_single_owner() {
    let sessions = table("sessions", vec![column("token"), column("user_id")], 30);
    let accounts = table(
        "accounts",
        vec![column("id"), column("login"), column("password")],
        31,
    );
    let report = check_template(
        vec![accounts, sessions],
        sql_template(
            "SELECT password FROM accounts JOIN sessions ON sessions.user_id = accounts.id",
        ),
    );
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_unqualified_column_ambiguous() {
    let report = check_template(
        vec![employees(), employers()],
        sql_template("SELECT id FROM employees, employers"),
    );

    assert_eq!(codes(&report), vec![DiagnosticCode::SG004]);
    assert_eq!(
        report.diagnostics[0].message,
        "Unqualified column reference \"id\" matches more than one referenced table: employees, employers"
    );
}

#[test]
fn test_syntax_error_in_literal() {
    let report = check_template(vec![users()], sql_template("SELEC id FROM users"));

    assert_eq!(codes(&report), vec![DiagnosticCode::SG001]);
    assert_eq!(report.diagnostics[0].location, Some(location_at(0)));
    assert!(report.has_errors());
}

#[test]
fn test_syntax_error_at_interpolation() {
    let report = check_template(
        vec![users()],
        template(
            &["SELECT * FROM users WHERE id = ", " ", ""],
            vec![expression("userId"), expression("userId")],
        ),
    );

    assert_eq!(codes(&report), vec![DiagnosticCode::SG001]);
    assert_eq!(
        report.diagnostics[0].message,
        "Syntax error in SQL query.\nSubstituted query: SELECT * FROM users WHERE id = $1 $2"
    );
    let second_expression = "SELECT * FROM users WHERE id = ${userId} ${".len();
    assert_eq!(
        report.diagnostics[0].location,
        Some(SourceLocation::point(
            TEMPLATE_LINE,
            TEMPLATE_COLUMN + second_expression
        ))
    );
}

#[test]
fn test_select_with_subqueries() {
    let posts = table("posts", vec![column("id"), column("user_id")], 40);
    let report = check_template(
        vec![users(), posts],
        with_result_type(
            sql_template(
                "SELECT id, (SELECT count(*) FROM posts WHERE posts.user_id = users.id) AS post_count \
                 FROM users WHERE id IN (SELECT user_id FROM posts)",
            ),
            Some(&["id", "post_count"]),
        ),
    );
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_outer_column_not_in_subquery_scope() {
    let report = check_template(
        vec![employees(), table("employers", vec![column("id"), column("name")], 20)],
        sql_template("SELECT * FROM employees WHERE salary > (SELECT salary FROM employers)"),
    );

    assert_eq!(codes(&report), vec![DiagnosticCode::SG003]);
    assert_eq!(
        report.diagnostics[0].message,
        "No table in the query's scope has a column \"salary\".\nTables in scope: \"employers\""
    );
}

#[test]
fn test_broken_column_reference() {
    let sql = "SELECT foo FROM users";
    let report = check_template(vec![users()], sql_template(sql));

    assert_eq!(codes(&report), vec![DiagnosticCode::SG003]);
    assert_eq!(report.diagnostics[0].location, Some(location_at(7)));
}

#[test]
fn test_every_broken_column_is_reported() {
    let report = check_template(
        vec![users()],
        sql_template("SELECT foo, bar FROM users WHERE u.id = 1"),
    );
    assert_eq!(
        codes(&report),
        vec![
            DiagnosticCode::SG002,
            DiagnosticCode::SG003,
            DiagnosticCode::SG003
        ]
    );
}

#[test]
fn test_update_spread_returning() {
    let report = check_template(
        vec![users()],
        with_result_type(
            template(
                &["UPDATE users SET ", " WHERE id = ", " RETURNING *"],
                vec![update_spread(Some(&["name", "email"])), expression("id")],
            ),
            Some(&["id", "name", "email"]),
        ),
    );
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_update_spread_unknown_property() {
    let report = check_template(
        vec![users()],
        template(
            &["UPDATE users SET ", " WHERE id = ", ""],
            vec![update_spread(Some(&["name", "phone"])), expression("id")],
        ),
    );

    assert_eq!(codes(&report), vec![DiagnosticCode::SG003]);
    // reported at the spread expression
    assert_eq!(
        report.diagnostics[0].location,
        Some(SourceLocation::point(
            TEMPLATE_LINE,
            TEMPLATE_COLUMN + "UPDATE users SET ${".len()
        ))
    );
}

#[test]
fn test_update_spread_not_inferred() {
    let report = check_template(
        vec![users()],
        template(
            &["UPDATE users SET ", " WHERE id = ", ""],
            vec![update_spread(None), expression("id")],
        ),
    );

    assert_eq!(codes(&report), vec![DiagnosticCode::SG010]);
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);
    assert!(!report.has_errors());
}

#[test]
fn test_set_operation_result_shape() {
    let report = check_template(
        vec![employees(), employers()],
        with_result_type(
            sql_template("SELECT name FROM employees UNION SELECT name FROM employers"),
            Some(&["name", "salary"]),
        ),
    );

    assert_eq!(codes(&report), vec![DiagnosticCode::SG008]);
    assert!(report.diagnostics[0]
        .message
        .contains("Missing columns in result rows: \"salary\""));
}

#[test]
fn test_delete_using() {
    let report = check_template(
        vec![employees(), employers()],
        sql_template(
            "DELETE FROM employees USING employers \
             WHERE employees.name = employers.name AND employers.salary < 0",
        ),
    );
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
}

#[test]
fn test_manifest_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("users.yml");
    let mut manifest = std::fs::File::create(&manifest_path).unwrap();
    write!(
        manifest,
        r#"
path: src/users.ts
tables:
  - name: users
    location: {{ start: {{ line: 4, column: 0 }} }}
    columns:
      - {{ name: id, type: number, has_default: true }}
      - {{ name: name, type: string }}
templates:
  - location: {{ start: {{ line: 12, column: 2 }} }}
    fragments:
      - text: "SELECT nam FROM users"
        location: {{ start: {{ line: 12, column: 6 }}, end: {{ line: 12, column: 27 }} }}
"#
    )
    .unwrap();
    drop(manifest);

    let file = SourceFile::load(&manifest_path).unwrap();
    let report = check_files(&[file], &CheckOptions::default()).unwrap();

    assert_eq!(report.query_count, 1);
    assert_eq!(report.table_count, 1);
    assert_eq!(codes(&report), vec![DiagnosticCode::SG003]);
    assert_eq!(
        report.diagnostics[0].to_string(),
        "src/users.ts:12:14 error[SG003]: No table in the query's scope has a column \"nam\".\nTables in scope: \"users\""
    );
}
