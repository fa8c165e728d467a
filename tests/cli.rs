use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const BOUTIQUE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/boutique.merisio");

const KEYLESS: &str = r#"{
    "name": "Sans cle",
    "dictionary": [
        {"name": "nom", "data_type": "VARCHAR", "size": 50},
        {"name": "libelle", "data_type": "TEXT"}
    ],
    "entities": [
        {"id": "e1", "name": "Client", "attributes": ["nom"]},
        {"id": "e2", "name": "Produit", "attributes": ["libelle"]}
    ],
    "associations": [{"id": "a1", "name": "Acheter"}],
    "links": [
        {"entity_id": "e1", "association_id": "a1", "cardinality_min": "0", "cardinality_max": "N"},
        {"entity_id": "e2", "association_id": "a1", "cardinality_min": "0", "cardinality_max": "N"}
    ]
}"#;

const ORPHAN_ONLY: &str = r#"{
    "name": "Orphelin",
    "dictionary": [{"name": "id", "data_type": "INT", "is_primary_key": true}],
    "entities": [{"id": "e1", "name": "Orphelin", "attributes": ["id"]}]
}"#;

fn merisio_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_merisio"))
}

fn run_cli(file: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(merisio_bin());
    cmd.arg(file).args(args);
    cmd.env_remove("MERISIO_ORPHAN_POLICY").env_remove("MERISIO_DIALECT");
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to execute merisio CLI")
}

fn write_project(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write project file");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn validate_valid_project_exits_zero() {
    let output = run_cli(Path::new(BOUTIQUE), &["validate"], &[]);
    assert_eq!(output.status.code(), Some(0), "stderr:\n{}", stderr(&output));
    assert!(stdout(&output).contains("Validation passed. No errors found."));
}

#[test]
fn sql_on_valid_project_writes_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("boutique.sql");
    let output = run_cli(Path::new(BOUTIQUE), &["sql", "-o", target.to_str().unwrap()], &[]);
    assert_eq!(output.status.code(), Some(0), "stderr:\n{}", stderr(&output));
    let sql = fs::read_to_string(&target).unwrap();
    assert!(sql.starts_with("-- Generated by merisio (PostgreSQL)\n"));
    assert!(sql.contains("CREATE TABLE Contenir ("));
}

#[test]
fn validate_keyless_entities_exits_one_with_every_finding() {
    let dir = TempDir::new().unwrap();
    let file = write_project(&dir, "keyless.merisio", KEYLESS);

    let output = run_cli(&file, &["validate"], &[]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("Validation failed with 2 error(s):"));
    assert!(out.contains("  - error: Entity 'Client' has no primary key attribute."));
    assert!(out.contains("  - error: Entity 'Produit' has no primary key attribute."));
}

#[test]
fn sql_refused_on_keyless_entities() {
    let dir = TempDir::new().unwrap();
    let file = write_project(&dir, "keyless.merisio", KEYLESS);

    let output = run_cli(&file, &["sql"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!stdout(&output).contains("CREATE TABLE"));
    let err = stderr(&output);
    assert!(err.contains("Entity 'Client' has no primary key attribute."));
    assert!(err.contains("Entity 'Produit' has no primary key attribute."));

    let output = run_cli(&file, &["mld"], &[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn validate_reports_empty_dictionary() {
    let dir = TempDir::new().unwrap();
    let file = write_project(&dir, "empty.merisio", r#"{"name": "Vide"}"#);

    let output = run_cli(&file, &["validate"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("  - error: Dictionary is empty. Add attributes first."));
}

#[test]
fn missing_input_exits_two() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(&dir.path().join("absent.merisio"), &["validate"], &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Error: failed to read"));
}

#[test]
fn malformed_input_exits_two() {
    let dir = TempDir::new().unwrap();
    let file = write_project(&dir, "broken.merisio", "{ not json");
    let output = run_cli(&file, &["info"], &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Error: failed to load project"));
}

#[test]
fn unwritable_output_exits_two() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("missing").join("out.sql");
    let output = run_cli(Path::new(BOUTIQUE), &["sql", "-o", target.to_str().unwrap()], &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Error: failed to write"));
    assert!(!target.exists());
}

#[test]
fn strict_orphans_turns_warning_into_error() {
    let dir = TempDir::new().unwrap();
    let file = write_project(&dir, "orphan.merisio", ORPHAN_ONLY);

    let output = run_cli(&file, &["validate"], &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Validation passed with 1 warning(s):"));

    let output = run_cli(&file, &["--strict-orphans", "validate"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains(
        "  - error: Entity 'Orphelin' is not connected to any association."
    ));

    let output = run_cli(&file, &["sql"], &[("MERISIO_ORPHAN_POLICY", "error")]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_configuration_exits_two() {
    let output = run_cli(Path::new(BOUTIQUE), &["--dialect", "mysql", "sql"], &[]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_cli(Path::new(BOUTIQUE), &["validate"], &[("MERISIO_ORPHAN_POLICY", "loud")]);
    assert_eq!(output.status.code(), Some(2));
}
