//! Integration tests for the onnxport CLI
//!
//! These run the real binary against directories on disk. Commands that
//! would need the Python toolchain are run with the runtime stage disabled
//! or against inputs that fail before any child process starts.

use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create an onnxport command
fn onnxport() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(cargo::cargo_bin!("onnxport"));
    // Keep user config out of the way
    cmd.env("XDG_CONFIG_HOME", "/nonexistent-onnxport-config");
    cmd
}

/// Helper to lay out a model directory with a sparse graph
fn model_dir(root: &Path, name: &str, graph_bytes: u64, tokenizer: bool) -> std::path::PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    File::create(dir.join("model.onnx")).unwrap().set_len(graph_bytes).unwrap();
    if tokenizer {
        fs::write(dir.join("tokenizer.json"), "{}").unwrap();
    }
    dir
}

// =============================================================================
// BASICS
// =============================================================================

#[test]
fn test_version() {
    onnxport()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_json() {
    onnxport()
        .args(["--json", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\""));
}

#[test]
fn test_help_lists_commands() {
    onnxport()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("doctor"));
}

// =============================================================================
// VALIDATE
// =============================================================================

#[test]
fn test_validate_missing_tokenizer_fails() {
    let temp = TempDir::new().unwrap();
    let dir = model_dir(temp.path(), "bge-base-zh", 500 * 1024 * 1024, false);

    onnxport()
        .args(["--json", "validate", "--no-runtime"])
        .arg(&dir)
        .current_dir(temp.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("missing-required-file"))
        .stdout(predicate::str::contains("\"passed\": false"));
}

#[test]
fn test_validate_tiny_graph_is_implausible() {
    let temp = TempDir::new().unwrap();
    let dir = model_dir(temp.path(), "bge-base-zh", 5 * 1024 * 1024, true);

    onnxport()
        .args(["validate", "--no-runtime"])
        .arg(&dir)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("size-implausible"))
        .stdout(predicate::str::contains("FAILED"));
}

#[test]
fn test_validate_complete_dir_passes_with_skip_warning() {
    let temp = TempDir::new().unwrap();
    let dir = model_dir(temp.path(), "bge-base-zh", 400 * 1024 * 1024, true);

    onnxport()
        .args(["validate", "--no-runtime"])
        .arg(&dir)
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("runtime-skipped"))
        .stdout(predicate::str::contains("PASSED"));
}

#[test]
fn test_validate_uses_generative_table() {
    let temp = TempDir::new().unwrap();
    // Fine for an embedding model, far too small for qwen2-7b
    let dir = model_dir(temp.path(), "qwen2-7b", 400 * 1024 * 1024, true);

    onnxport()
        .args(["validate", "--no-runtime", "--family", "generative"])
        .arg(&dir)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("qwen2-7b"));
}

// =============================================================================
// PLAN AND CONFIG
// =============================================================================

#[test]
fn test_plan_lists_opsets_in_order() {
    let temp = TempDir::new().unwrap();

    let output = onnxport().arg("plan").current_dir(temp.path()).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    let managed = stdout.find("managed-export").unwrap();
    let opset17 = stdout.find("raw-export (opset 17)").unwrap();
    let opset11 = stdout.find("raw-export (opset 11)").unwrap();
    assert!(managed < opset17 && opset17 < opset11);
}

#[test]
fn test_plan_reads_project_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("onnxport.toml"),
        "[export]\nstrategies = [\"raw-export\"]\nopset_candidates = [13]\n",
    )
    .unwrap();

    onnxport()
        .args(["--json", "plan"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("raw-export (opset 13)"))
        .stdout(predicate::str::contains("managed-export").not());
}

#[test]
fn test_bad_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("broken.toml");
    fs::write(&config, "[export]\nstrategies = [\"teleport\"]\n").unwrap();

    onnxport()
        .args(["plan", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.toml"));
}

// =============================================================================
// CONVERT AND MERGE
// =============================================================================

#[test]
fn test_convert_missing_checkpoint_fails() {
    let temp = TempDir::new().unwrap();

    onnxport()
        .args(["convert", "--no-runtime"])
        .arg(temp.path().join("absent"))
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("checkpoint directory does not exist"));
}

#[test]
fn test_merge_above_ceiling_keeps_split() {
    let temp = TempDir::new().unwrap();
    let dir = model_dir(temp.path(), "big", 1024 * 1024, true);
    File::create(dir.join("model.onnx_data")).unwrap().set_len(8 * 1024 * 1024).unwrap();
    fs::write(temp.path().join("onnxport.toml"), "[merge]\nceiling_mib = 4\n").unwrap();

    onnxport()
        .args(["--json", "merge"])
        .arg(dir.join("model.onnx"))
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped-too-large"));
    assert!(!dir.join("merged").exists());
}

#[test]
fn test_merge_missing_graph_fails() {
    let temp = TempDir::new().unwrap();

    onnxport()
        .arg("merge")
        .arg(temp.path().join("model.onnx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("graph file not found"));
}
