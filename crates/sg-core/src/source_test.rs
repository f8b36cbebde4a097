use super::*;
use std::io::Write;

const USERS_JSON: &str = r#"{
  "path": "src/users.ts",
  "tables": [
    {
      "name": "users",
      "location": { "start": { "line": 4, "column": 0 } },
      "columns": [
        { "name": "id", "type": "number", "has_default": true },
        { "name": "name", "type": "string" }
      ]
    }
  ],
  "templates": [
    {
      "fragments": [
        { "text": "INSERT INTO users ", "location": { "start": { "line": 10, "column": 4 } } },
        { "text": "", "location": { "start": { "line": 10, "column": 45 } } }
      ],
      "expressions": [
        {
          "location": { "start": { "line": 10, "column": 24 } },
          "spread": "insert",
          "properties": ["name"]
        }
      ]
    }
  ]
}"#;

fn write_manifest(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_json_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(&dir, "users.json", USERS_JSON);

    let file = SourceFile::load(&path).unwrap();
    assert_eq!(file.path, PathBuf::from("src/users.ts"));
    assert_eq!(file.tables.len(), 1);
    assert_eq!(file.tables[0].columns.len(), 2);
    assert!(file.tables[0].columns[0].descriptor.has_default);

    let expr = &file.templates[0].expressions[0];
    assert_eq!(expr.spread, Some(SpreadKind::Insert));
    assert_eq!(expr.properties.as_deref(), Some(&["name".to_string()][..]));
}

#[test]
fn test_load_yaml_manifest() {
    let yaml = r#"
path: src/projects.ts
tables:
  - name: projects
    columns:
      - { name: id, type: number }
      - { name: owner_id, type: number }
templates:
  - fragments:
      - text: "SELECT * FROM projects"
        location: { start: { line: 3, column: 4 } }
"#;
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(&dir, "projects.yml", yaml);

    let file = SourceFile::load(&path).unwrap();
    assert_eq!(file.tables[0].name, "projects");
    assert!(file.templates[0].expressions.is_empty());
    assert!(file.templates[0].result_type.is_none());
}

#[test]
fn test_load_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(&dir, "users.txt", USERS_JSON);

    let result = SourceFile::load(&path);
    assert!(matches!(
        result,
        Err(CoreError::UnsupportedManifestFormat { .. })
    ));
}

#[test]
fn test_load_missing_file() {
    let result = SourceFile::load(Path::new("/nonexistent/manifest.json"));
    assert!(matches!(result, Err(CoreError::IoWithPath { .. })));
}

#[test]
fn test_validate_fragment_count() {
    let json = r#"{
  "path": "src/broken.ts",
  "templates": [
    {
      "fragments": [
        { "text": "SELECT ", "location": { "start": { "line": 1, "column": 0 } } }
      ],
      "expressions": [
        { "location": { "start": { "line": 1, "column": 9 } } }
      ]
    }
  ]
}"#;
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(&dir, "broken.json", json);

    let result = SourceFile::load(&path);
    match result {
        Err(CoreError::ManifestInvalid { message, .. }) => {
            assert!(message.contains("1 fragments for 1 expressions"));
        }
        other => panic!("expected ManifestInvalid, got {:?}", other.map(|f| f.path)),
    }
}
