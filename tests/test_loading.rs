//! Loader suite: file-level error classes and the `from_file` happy path.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use dectree::{load_config, Error, LoadError, Selectors, SolutionTree};
use serde_json::{json, Value};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("dectree-test-{}-{name}", std::process::id()));
    path
}

#[test]
fn test_missing_file() {
    let path = temp_path("does-not-exist.json");
    match load_config(&path) {
        Err(LoadError::Missing(reported)) => assert_eq!(reported, path),
        other => panic!("expected Missing, got {other:?}"),
    }
}

#[test]
fn test_directory_is_not_a_file() {
    // The system temp directory exists but is no file.
    match load_config(&std::env::temp_dir()) {
        Err(LoadError::NotAFile(_)) => {}
        other => panic!("expected NotAFile, got {other:?}"),
    }
}

#[test]
fn test_wrong_extension() -> Result<()> {
    let path = temp_path("config.yaml");
    fs::write(&path, "{}")?;
    let result = load_config(&path);
    fs::remove_file(&path)?;
    match result {
        Err(LoadError::WrongExtension(reported)) => assert_eq!(reported, path),
        other => panic!("expected WrongExtension, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_invalid_json() -> Result<()> {
    let path = temp_path("broken.json");
    fs::write(&path, "{ not json")?;
    let result = load_config(&path);
    fs::remove_file(&path)?;
    match result {
        Err(LoadError::InvalidJson { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected InvalidJson, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_from_file_compiles_and_evaluates() -> Result<()> {
    let config = json!({
        "schema": {
            "selectors": { "color": ["red", "blue"] },
            "output": { "warm": "bool" }
        },
        "apply first": [
            { "when": { "color": "red" }, "set": { "warm": true } },
            { "when": {}, "set": { "warm": false } }
        ]
    });
    let path = temp_path("apples.json");
    fs::write(&path, serde_json::to_string_pretty(&config)?)?;

    let selectors = Selectors::new().with("color", |color: &String| color.clone());
    let tree = SolutionTree::from_file(&path, selectors);
    fs::remove_file(&path)?;
    let tree = tree?;

    assert_eq!(
        Value::Object(tree.match_update(&"red".to_string())),
        json!({"warm": true})
    );
    assert_eq!(
        Value::Object(tree.match_update(&"blue".to_string())),
        json!({"warm": false})
    );
    Ok(())
}

#[test]
fn test_from_file_reports_load_errors_through_the_aggregate() {
    let selectors = Selectors::new().with("color", |color: &String| color.clone());
    match SolutionTree::from_file(temp_path("nowhere.json"), selectors) {
        Err(Error::Load(LoadError::Missing(_))) => {}
        other => panic!("expected a load error, got {other:?}"),
    }
}
