//! Integration tests for `plume brand` and `plume providers`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn plume(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("plume").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("OPENAI_API_KEY")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("TAVILY_API_KEY");
    cmd
}

#[test]
fn test_ingest_then_search() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("about.txt"),
        "Acme Tea sources single-estate oolong from Alishan growers.",
    )
    .unwrap();

    plume(&home)
        .args(["brand", "ingest", "about.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingested"))
        .stdout(predicate::str::contains("brand_knowledge"));
    assert!(home.path().join(".plume").join("knowledge.json").exists());

    let output = plume(&home).args(["brand", "search", "oolong", "--json"]).output().unwrap();
    assert!(output.status.success());
    let hits: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(hits[0]["source"], "about.txt");
}

#[test]
fn test_search_empty_store() {
    let home = TempDir::new().unwrap();
    plume(&home)
        .args(["brand", "search", "anything"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching brand knowledge"));
}

#[test]
fn test_ingest_rejects_unsupported_extension() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("deck.docx"), "binary").unwrap();

    plume(&home)
        .args(["brand", "ingest", "deck.docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported input format"));
}

#[test]
fn test_providers_reflect_environment() {
    let home = TempDir::new().unwrap();
    let output = plume(&home)
        .env("GEMINI_API_KEY", "g-test")
        .args(["providers", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["providers"][0]["provider"], "openai");
    assert_eq!(report["providers"][0]["configured"], false);
    assert_eq!(report["providers"][1]["provider"], "google");
    assert_eq!(report["providers"][1]["configured"], true);
    assert_eq!(report["search_configured"], false);
}

#[test]
fn test_providers_human_output() {
    let home = TempDir::new().unwrap();
    plume(&home)
        .arg("providers")
        .assert()
        .success()
        .stdout(predicate::str::contains("OpenAI: not configured"))
        .stdout(predicate::str::contains("Tavily: not configured"));
}
