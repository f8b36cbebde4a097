use super::*;
use crate::test_utils::make_schema;
use sg_sql::{QueryNode, QueryNodePath, SqlParser};
use std::rc::Rc;

fn statement() -> QueryNode {
    SqlParser::postgres().parse_query("SELECT 1").unwrap()
}

fn table_ref<'a>(
    path: &Rc<QueryNodePath<'a>>,
    table_name: &str,
    alias: Option<&str>,
) -> TableReference<'a> {
    TableReference {
        table_name: table_name.to_string(),
        alias: alias.map(str::to_string),
        path: Rc::clone(path),
    }
}

fn unqualified<'a>(
    path: &Rc<QueryNodePath<'a>>,
    column_name: &str,
    table_refs_in_scope: Vec<TableReference<'a>>,
) -> UnqualifiedColumn<'a> {
    UnqualifiedColumn {
        table_refs_in_scope,
        column_name: column_name.to_string(),
        path: Rc::clone(path),
        unresolvable: false,
    }
}

fn schemas() -> Vec<TableSchema> {
    vec![
        make_schema("users", &["id", "name"]),
        make_schema("posts", &["id", "title"]),
    ]
}

#[test]
fn test_resolve_table_name_prefers_alias() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let tables = vec![
        table_ref(&path, "orders", None),
        table_ref(&path, "users", Some("orders")),
    ];

    let by_alias = resolve_table_name("orders", &tables).unwrap();
    assert_eq!(by_alias.table_name, "users");
    let by_name = resolve_table_name("users", &tables).unwrap();
    assert_eq!(by_name.table_name, "users");
    assert!(resolve_table_name("missing", &tables).is_none());
}

#[test]
fn test_unqualified_single_match() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let column = unqualified(
        &path,
        "title",
        vec![table_ref(&path, "users", None), table_ref(&path, "posts", Some("p"))],
    );

    let resolved = resolve_unqualified(&column, &schemas).unwrap();
    assert_eq!(resolved.table_name, "posts");
    assert_eq!(resolved.column_name, "title");
}

#[test]
fn test_unqualified_same_table_twice() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let column = unqualified(
        &path,
        "name",
        vec![table_ref(&path, "users", None), table_ref(&path, "users", Some("u"))],
    );

    let resolved = resolve_unqualified(&column, &schemas).unwrap();
    assert_eq!(resolved.table_name, "users");
}

#[test]
fn test_unqualified_ambiguous() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let column = unqualified(
        &path,
        "id",
        vec![table_ref(&path, "users", None), table_ref(&path, "posts", None)],
    );

    let err = resolve_unqualified(&column, &schemas).unwrap_err();
    assert_eq!(err.code(), DiagnosticCode::SG004);
    assert_eq!(
        err.to_string(),
        "Unqualified column reference \"id\" matches more than one referenced table: users, posts"
    );
}

#[test]
fn test_unqualified_not_in_scope() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let column = unqualified(
        &path,
        "email",
        vec![table_ref(&path, "users", None), table_ref(&path, "posts", None)],
    );

    let err = resolve_unqualified(&column, &schemas).unwrap_err();
    assert_eq!(err.code(), DiagnosticCode::SG003);
    assert_eq!(
        err.to_string(),
        "No table in the query's scope has a column \"email\".\nTables in scope: \"users\", \"posts\""
    );
}

#[test]
fn test_not_in_scope_lists_declared_tables_only() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let column = unqualified(
        &path,
        "email",
        vec![table_ref(&path, "ghosts", None), table_ref(&path, "posts", None)],
    );

    assert_eq!(
        resolve_unqualified(&column, &schemas).unwrap_err(),
        ResolveError::NotInScope {
            column: "email".to_string(),
            tables: "\"posts\"".to_string(),
        }
    );
}

#[test]
fn test_unqualified_without_tables() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let column = unqualified(&path, "id", Vec::new());

    assert_eq!(
        resolve_unqualified(&column, &schemas).unwrap_err(),
        ResolveError::NotInScope {
            column: "id".to_string(),
            tables: "(none)".to_string(),
        }
    );
}

#[test]
fn test_unresolvable_column_is_skipped() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let mut column = unqualified(&path, "", vec![table_ref(&path, "users", None)]);
    column.unresolvable = true;

    assert_eq!(
        resolve_unqualified(&column, &schemas).unwrap_err(),
        ResolveError::Unresolvable
    );
}

#[test]
fn test_wildcard_expands_single_table() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let wildcard = WildcardColumn {
        target: WildcardTarget::InScope(vec![table_ref(&path, "users", Some("u"))]),
        path: Rc::clone(&path),
    };

    let expanded: Vec<String> = resolve_wildcard(&wildcard, &schemas)
        .unwrap()
        .iter()
        .map(|column| format!("{}.{}", column.table_name, column.column_name))
        .collect();
    assert_eq!(expanded, vec!["users.id", "users.name"]);
}

#[test]
fn test_wildcard_errors() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);
    let wildcard = |target| WildcardColumn {
        target,
        path: Rc::clone(&path),
    };

    let err = resolve_wildcard(&wildcard(WildcardTarget::InScope(Vec::new())), &schemas)
        .unwrap_err();
    assert_eq!(err, ResolveError::WildcardWithoutTables);
    assert_eq!(
        err.to_string(),
        "Cannot resolve unqualified \"*\" column selector: No known tables."
    );

    let err = resolve_wildcard(
        &wildcard(WildcardTarget::InScope(vec![
            table_ref(&path, "users", None),
            table_ref(&path, "posts", None),
        ])),
        &schemas,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot resolve unqualified \"*\" column selector. More than one table in scope: \"users\", \"posts\""
    );

    let err = resolve_wildcard(&wildcard(WildcardTarget::Table("ghosts".to_string())), &schemas)
        .unwrap_err();
    assert_eq!(err.code(), DiagnosticCode::SG005);
    assert_eq!(
        err.to_string(),
        "No table named \"ghosts\" found. Known tables in scope: \"users\", \"posts\""
    );
}

#[test]
fn test_synthetic_schemas_shadow_declared() {
    let declared = schemas();
    let mut schemas = SchemaSet::new(&declared);
    schemas.add_synthetic(make_schema("users", &["id"]));
    assert_eq!(schemas.get("users").unwrap().columns.len(), 1);
    assert_eq!(schemas.names(), vec!["users", "posts"]);

    schemas.add_synthetic(make_schema("users", &["email"]));
    assert!(schemas.get("users").unwrap().has_column("email"));
    assert!(!schemas.contains("ghosts"));
    assert_eq!(schemas.declared().len(), 2);
}

#[test]
fn test_resolve_to_concrete() {
    let node = statement();
    let path = QueryNodePath::root(&node);
    let declared = schemas();
    let schemas = SchemaSet::new(&declared);

    let qualified = ColumnReference::Qualified(QualifiedColumn {
        table_name: "ghosts".to_string(),
        column_name: "boo".to_string(),
        path: Rc::clone(&path),
    });
    let resolved = resolve_to_concrete(&qualified, &schemas).unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].table_name, "ghosts");

    let column = ColumnReference::Unqualified(unqualified(
        &path,
        "title",
        vec![table_ref(&path, "posts", None)],
    ));
    let resolved = resolve_to_concrete(&column, &schemas).unwrap();
    assert_eq!(resolved[0].table_name, "posts");
}

#[test]
fn test_quote_list() {
    assert_eq!(quote_list(&[]), "(none)");
    assert_eq!(quote_list(&["a", "b"]), "\"a\", \"b\"");
}
