//! Integrity validator tests against real directories

use onnxport::core::models::{DiagnosticKind, ModelFamily, SizeTable};
use onnxport::core::services::IntegrityValidator;
use tempfile::TempDir;

use crate::common::fixtures::{ModelDirBuilder, tiny_expectation};
use crate::common::mocks::MockRuntime;

#[test]
fn test_missing_tokenizer_fails_regardless_of_size() {
    let temp = TempDir::new().unwrap();
    let runtime = MockRuntime::loading();

    for mib in [1, 500] {
        let dir = ModelDirBuilder::new(&temp.path().join(format!("m{mib}")))
            .graph_mib(mib)
            .no_tokenizer()
            .build();
        let expectation = SizeTable::builtin().lookup(Some("bge-base-zh"), ModelFamily::Embedding);
        let report = IntegrityValidator::new(&runtime).validate(&dir, &expectation);

        assert!(!report.passed());
        assert!(report.has_error(DiagnosticKind::MissingRequiredFile));
    }
    // Structural errors skip the runtime stage
    assert_eq!(runtime.calls(), 0);
}

#[test]
fn test_five_megabyte_graph_is_implausible_for_embedding() {
    let temp = TempDir::new().unwrap();
    let dir = ModelDirBuilder::new(&temp.path().join("bge-base-zh")).graph_mib(5).build();
    let expectation = SizeTable::builtin().lookup(Some("bge-base-zh"), ModelFamily::Embedding);
    assert!(expectation.expected_mib >= 400);

    let report = IntegrityValidator::without_runtime().validate(&dir, &expectation);
    assert!(!report.passed());
    assert!(report.has_error(DiagnosticKind::SizeImplausible));
}

#[test]
fn test_dangling_reference_detected_in_graph_head() {
    let temp = TempDir::new().unwrap();
    let dir = ModelDirBuilder::new(&temp.path().join("m"))
        .graph_head(b"\x08\x07\x12\x07pytorch location model.onnx_data offset")
        .graph_mib(4)
        .build();

    let report = IntegrityValidator::without_runtime().validate(&dir, &tiny_expectation());
    assert!(report.has_error(DiagnosticKind::DanglingExternalReference));
}

#[test]
fn test_reference_with_blob_present_is_fine() {
    let temp = TempDir::new().unwrap();
    let dir = ModelDirBuilder::new(&temp.path().join("m"))
        .graph_head(b"location model.onnx_data")
        .graph_mib(1)
        .external_mib(3)
        .build();

    let report = IntegrityValidator::without_runtime().validate(&dir, &tiny_expectation());
    assert!(report.passed(), "{:?}", report.errors());
}

#[test]
fn test_marker_beyond_scan_window_is_not_seen() {
    let temp = TempDir::new().unwrap();
    let mut head = vec![0u8; 2048];
    head.extend_from_slice(b"model.onnx_data");
    let dir = ModelDirBuilder::new(&temp.path().join("m")).graph_head(&head).graph_mib(4).build();

    let report = IntegrityValidator::without_runtime()
        .with_scan_window(1024)
        .validate(&dir, &tiny_expectation());
    assert!(!report.has_error(DiagnosticKind::DanglingExternalReference));
}

#[test]
fn test_runtime_version_mismatch_is_an_error() {
    let temp = TempDir::new().unwrap();
    let dir = ModelDirBuilder::new(&temp.path().join("m")).graph_mib(4).build();
    let runtime = MockRuntime::failing(
        "[ONNXRuntimeError] : 1 : FAIL : Unsupported model IR version: 10, max supported IR version: 9",
    );

    let report = IntegrityValidator::new(&runtime).validate(&dir, &tiny_expectation());
    assert!(!report.passed());
    assert!(report.has_error(DiagnosticKind::VersionIncompatible));
}

#[test]
fn test_generic_runtime_failure_is_a_warning() {
    let temp = TempDir::new().unwrap();
    let dir = ModelDirBuilder::new(&temp.path().join("m")).graph_mib(4).build();
    let runtime = MockRuntime::failing("CUDA provider is not available");

    let report = IntegrityValidator::new(&runtime).validate(&dir, &tiny_expectation());
    assert!(report.passed());
    assert!(report.has_warning(DiagnosticKind::RuntimeLoadFailure));
}

#[test]
fn test_long_runtime_message_is_bounded() {
    let temp = TempDir::new().unwrap();
    let dir = ModelDirBuilder::new(&temp.path().join("m")).graph_mib(4).build();
    let runtime = MockRuntime::failing(&"x".repeat(5000));

    let report = IntegrityValidator::new(&runtime)
        .with_diagnostic_limit(50)
        .validate(&dir, &tiny_expectation());
    let warning = &report.warnings()[0];
    assert!(warning.message.chars().count() < 120);
}
