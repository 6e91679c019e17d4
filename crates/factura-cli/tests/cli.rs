use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const RESPONSE: &str = r#"{
  "document": {
    "text": "FACTURA F-2024-001\nCONCEPTO Servicios de consultoría BASE IMPONIBLE 100,00 IVA (21%) 21,00 TOTAL 121,00",
    "entities": [
      {"type": "supplier_name", "mentionText": "ACME SL"},
      {"type": "invoice_id", "mentionText": "F-2024-001"},
      {"type": "total_amount", "mentionText": "121,00"},
      {"type": "currency", "mentionText": "EUR"}
    ]
  }
}"#;

fn factura() -> Command {
    Command::cargo_bin("factura").unwrap()
}

fn write_config(dir: &Path, store: &Path, output: &Path) -> String {
    let path = dir.join("config.json");
    let config = serde_json::json!({
        "service": {"project_id": "p", "processor_id": "proc"},
        "storage": {"root": store},
        "output": {"dir": output, "format": "csv"}
    });
    fs::write(&path, config.to_string()).unwrap();
    path.display().to_string()
}

#[test]
fn test_help_lists_commands() {
    factura()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_reconcile_json_fills_from_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("respuesta.json");
    fs::write(&input, RESPONSE).unwrap();

    let output = factura()
        .args(["reconcile", "--format", "json", "--name", "f1.pdf"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["filename"], "f1.pdf");
    assert_eq!(record["supplier_name"], "ACME SL");
    assert_eq!(record["invoice_number"], "F-2024-001");
    assert_eq!(record["total_amount"], "121,00");
    assert_eq!(record["tax_base"], "100,00");
    assert_eq!(record["vat_amount"], "21,00");
    assert_eq!(record["concept"], "Servicios de consultoría");

    let report = String::from_utf8_lossy(&output.stderr);
    assert!(report.contains("currency"));
}

#[test]
fn test_reconcile_text_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("f1.json");
    fs::write(&input, RESPONSE).unwrap();

    factura()
        .arg("reconcile")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Base Imponible"))
        .stdout(predicate::str::contains("100,00"))
        .stdout(predicate::str::contains("21,00"));
}

#[test]
fn test_reconcile_missing_file() {
    factura()
        .args(["reconcile", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_list_clients_and_projects() {
    let dir = tempfile::tempdir().unwrap();
    for file in ["acme/obra-1/a.pdf", "acme/obra-2/b.pdf", "globex/c.pdf", "suelta.pdf"] {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"%PDF").unwrap();
    }

    factura()
        .arg("list")
        .arg("--root")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("acme"))
        .stdout(predicate::str::contains("  - obra-1"))
        .stdout(predicate::str::contains("  - obra-2"))
        .stdout(predicate::str::contains("globex"))
        .stdout(predicate::str::contains("  - General"))
        .stdout(predicate::str::contains("suelta").not());
}

#[test]
fn test_config_show_merges_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("store"), &dir.path().join("out"));

    factura()
        .args(["--config", &config, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"processor_id\": \"proc\""))
        .stdout(predicate::str::contains("errores_procesamiento.csv"));
}

#[test]
fn test_config_path_reports_override() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("store"), &dir.path().join("out"));
    let missing = dir.path().join("otro.json").display().to_string();

    factura()
        .args(["--config", &config, "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config.as_str()))
        .stdout(predicate::str::contains("exists"));

    factura()
        .args(["--config", &missing, "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(missing.as_str()))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn test_batch_records_empty_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    let output = dir.path().join("out");
    fs::create_dir_all(store.join("acme/obra")).unwrap();
    fs::write(store.join("acme/obra/vacia.pdf"), b"").unwrap();
    fs::write(store.join("acme/obra/notas.txt"), b"x").unwrap();
    let config = write_config(dir.path(), &store, &output);

    factura()
        .args(["--config", &config, "batch"])
        .env("FACTURA_ACCESS_TOKEN", "test-token")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 documents"));

    let log = fs::read_to_string(output.join("errores_procesamiento.csv")).unwrap();
    assert!(log.starts_with("Archivo,Error\n"));
    assert!(log.contains("acme/obra/vacia.pdf"));
    assert!(log.contains("document is empty"));
    assert!(!output.join("acme_obra.csv").exists());
}

#[test]
fn test_batch_requires_access_token() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    fs::create_dir_all(store.join("acme/obra")).unwrap();
    fs::write(store.join("acme/obra/f.pdf"), b"%PDF").unwrap();
    let config = write_config(dir.path(), &store, &dir.path().join("out"));

    factura()
        .args(["--config", &config, "batch"])
        .env_remove("FACTURA_ACCESS_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing access token"));
}

#[test]
fn test_batch_filter_without_matches() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    fs::create_dir_all(store.join("acme/obra")).unwrap();
    fs::write(store.join("acme/obra/f.pdf"), b"%PDF").unwrap();
    let config = write_config(dir.path(), &store, &dir.path().join("out"));

    factura()
        .args(["--config", &config, "batch", "--client", "globex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No documents to process"));
}
