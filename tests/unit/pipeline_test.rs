//! End-to-end pipeline tests over scripted ports

use std::fs;
use std::path::Path;

use onnxport::core::PipelineError;
use onnxport::core::models::{
    DiagnosticKind, ExportAttempt, ExportMethod, MIB, ModelFamily, SourceCheckpoint,
    expand_attempts,
};
use onnxport::core::services::{
    ConversionPipeline, DEFAULT_OPSET_CANDIDATES, MergeOutcome, PipelineRequest, PipelineSettings,
};
use tempfile::TempDir;

use crate::common::fixtures::{ModelDirBuilder, tiny_expectation};
use crate::common::mocks::{MockExporter, MockInliner, MockRuntime};

fn settings() -> PipelineSettings {
    PipelineSettings {
        attempts: expand_attempts(&ExportMethod::DEFAULT_ORDER, &DEFAULT_OPSET_CANDIDATES),
        min_artifact_bytes: Some(MIB),
        ..PipelineSettings::default()
    }
}

/// Checkpoint directory that doubles as the live directory
fn checkpoint_dir(root: &Path) -> std::path::PathBuf {
    ModelDirBuilder::new(&root.join("bge-base-zh")).no_graph().build()
}

fn request(dir: &Path) -> PipelineRequest {
    PipelineRequest {
        checkpoint: SourceCheckpoint::new(dir, ModelFamily::Embedding),
        dest: dir.to_path_buf(),
        expectation: tiny_expectation(),
    }
}

#[test]
fn test_merge_then_validate_round_trip() {
    let temp = TempDir::new().unwrap();
    let dir = checkpoint_dir(temp.path());
    let exporter =
        MockExporter::succeeding_on(&[ExportAttempt::managed()], 2 * MIB).with_external(3 * MIB);
    let inliner = MockInliner::new();
    let runtime = MockRuntime::loading();

    let pipeline = ConversionPipeline::new(&exporter, &inliner, Some(&runtime), settings());
    let report = pipeline.run(&request(&dir)).unwrap();

    assert!(matches!(report.merge, Some(MergeOutcome::Merged { bytes, .. }) if bytes == 5 * MIB));
    assert!(report.published.merged);
    assert!(report.published.external.is_none());
    assert!(report.validation.passed(), "{:?}", report.validation.errors());
    assert!(!report.validation.has_error(DiagnosticKind::MissingExternalData));
    assert!(!report.validation.has_error(DiagnosticKind::DanglingExternalReference));
    assert_eq!(report.validation.inputs().len(), 2);

    // Inlined once, never split again
    assert_eq!(inliner.calls(), 1);
    assert!(!dir.join("model.onnx_data").exists());
    assert_eq!(fs::metadata(dir.join("model.onnx")).unwrap().len(), 5 * MIB);
    // Scratch directory is gone
    assert!(!temp.path().join("bge-base-zh-onnx").exists());
}

#[test]
fn test_single_file_export_skips_merge() {
    let temp = TempDir::new().unwrap();
    let dir = checkpoint_dir(temp.path());
    let exporter = MockExporter::succeeding_on(&[ExportAttempt::cli()], 3 * MIB);
    let inliner = MockInliner::new();

    let pipeline = ConversionPipeline::new(&exporter, &inliner, None, settings());
    let report = pipeline.run(&request(&dir)).unwrap();

    assert!(report.merge.is_none());
    assert_eq!(inliner.calls(), 0);
    assert_eq!(report.accepted, ExportAttempt::cli());
    assert!(report.validation.passed());
    assert!(report.validation.has_warning(DiagnosticKind::RuntimeSkipped));
}

#[test]
fn test_merge_above_ceiling_publishes_split_form() {
    let temp = TempDir::new().unwrap();
    let dir = checkpoint_dir(temp.path());
    let exporter =
        MockExporter::succeeding_on(&[ExportAttempt::managed()], 2 * MIB).with_external(3 * MIB);
    let inliner = MockInliner::new();
    let runtime = MockRuntime::loading();
    let settings = PipelineSettings {
        merge_ceiling_bytes: 4 * MIB,
        ..settings()
    };

    let pipeline = ConversionPipeline::new(&exporter, &inliner, Some(&runtime), settings);
    let report = pipeline.run(&request(&dir)).unwrap();

    assert!(matches!(report.merge, Some(MergeOutcome::SkippedTooLarge { .. })));
    assert_eq!(inliner.calls(), 0);
    assert!(!report.published.merged);
    assert_eq!(report.published.external.as_ref().map(|f| f.bytes), Some(3 * MIB));
    assert!(dir.join("model.onnx_data").exists());
    assert!(report.validation.passed());
}

#[test]
fn test_merge_failure_falls_back_to_split_form() {
    let temp = TempDir::new().unwrap();
    let dir = checkpoint_dir(temp.path());
    let exporter =
        MockExporter::succeeding_on(&[ExportAttempt::managed()], 2 * MIB).with_external(3 * MIB);
    let inliner = MockInliner::failing("ValueError: Message onnx.ModelProto exceeds maximum protobuf size of 2GB");

    let pipeline = ConversionPipeline::new(&exporter, &inliner, None, settings());
    let report = pipeline.run(&request(&dir)).unwrap();

    assert!(matches!(report.merge, Some(MergeOutcome::TooLarge { .. })));
    assert!(!report.published.merged);
    assert!(dir.join("model.onnx_data").exists());
}

#[test]
fn test_nested_export_output_is_found() {
    let temp = TempDir::new().unwrap();
    let dir = checkpoint_dir(temp.path());
    let exporter = MockExporter::succeeding_on(&[ExportAttempt::managed()], 3 * MIB).nested();

    let inliner = MockInliner::new();
    let pipeline = ConversionPipeline::new(&exporter, &inliner, None, settings());
    let report = pipeline.run(&request(&dir)).unwrap();

    assert_eq!(report.published.graph.bytes, 3 * MIB);
}

#[test]
fn test_exhaustion_is_fatal_and_leaves_live_dir_alone() {
    let temp = TempDir::new().unwrap();
    let dir = ModelDirBuilder::new(&temp.path().join("bge-base-zh")).graph_mib(4).build();
    let exporter = MockExporter::failing();

    let inliner = MockInliner::new();
    let pipeline = ConversionPipeline::new(&exporter, &inliner, None, settings());
    let err = pipeline.run(&request(&dir)).unwrap_err();

    assert!(matches!(err, PipelineError::StrategiesExhausted { .. }));
    assert_eq!(err.attempts().len(), 2 + DEFAULT_OPSET_CANDIDATES.len());
    assert_eq!(exporter.calls().len(), err.attempts().len());
    assert_eq!(fs::metadata(dir.join("model.onnx")).unwrap().len(), 4 * MIB);
    assert!(!dir.join("model.onnx.bak").exists());
    assert!(!temp.path().join("bge-base-zh-onnx").exists());
}

#[test]
fn test_truncated_export_forces_next_attempt() {
    let temp = TempDir::new().unwrap();
    let dir = checkpoint_dir(temp.path());
    // Every attempt "succeeds" but writes half a megabyte
    let exporter = MockExporter::succeeding_on(
        &[ExportAttempt::managed(), ExportAttempt::cli(), ExportAttempt::raw(17)],
        MIB / 2,
    );
    let settings = PipelineSettings {
        attempts: vec![ExportAttempt::managed(), ExportAttempt::cli(), ExportAttempt::raw(17)],
        ..settings()
    };

    let inliner = MockInliner::new();
    let pipeline = ConversionPipeline::new(&exporter, &inliner, None, settings);
    let err = pipeline.run(&request(&dir)).unwrap_err();

    assert_eq!(exporter.calls().len(), 3);
    assert!(err.attempts().iter().all(|r| r.message.contains("too small")));
}

#[test]
fn test_second_run_keeps_single_backup() {
    let temp = TempDir::new().unwrap();
    let dir = checkpoint_dir(temp.path());
    let pipeline_settings = settings();

    let first = MockExporter::succeeding_on(&[ExportAttempt::managed()], 2 * MIB);
    ConversionPipeline::new(&first, &MockInliner::new(), None, pipeline_settings.clone())
        .run(&request(&dir))
        .unwrap();

    let second = MockExporter::succeeding_on(&[ExportAttempt::managed()], 3 * MIB);
    let report = ConversionPipeline::new(&second, &MockInliner::new(), None, pipeline_settings)
        .run(&request(&dir))
        .unwrap();

    assert_eq!(report.published.backup.map(|b| b.bytes), Some(2 * MIB));
    let backups = fs::read_dir(&dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".bak"))
        .count();
    assert_eq!(backups, 1);
}

#[test]
fn test_missing_checkpoint() {
    let temp = TempDir::new().unwrap();
    let exporter = MockExporter::failing();
    let inliner = MockInliner::new();
    let pipeline = ConversionPipeline::new(&exporter, &inliner, None, settings());

    let err = pipeline.run(&request(&temp.path().join("absent"))).unwrap_err();
    assert!(matches!(err, PipelineError::CheckpointNotFound(_)));
    assert!(exporter.calls().is_empty());
}

#[test]
fn test_separate_dest_receives_tokenizer() {
    let temp = TempDir::new().unwrap();
    let checkpoint = checkpoint_dir(temp.path());
    let dest = temp.path().join("live");
    let exporter =
        MockExporter::succeeding_on(&[ExportAttempt::managed()], 2 * MIB).with_external(3 * MIB);
    let inliner = MockInliner::new();
    let runtime = MockRuntime::loading();

    let pipeline = ConversionPipeline::new(&exporter, &inliner, Some(&runtime), settings());
    let report = pipeline
        .run(&PipelineRequest {
            dest: dest.clone(),
            ..request(&checkpoint)
        })
        .unwrap();

    assert!(report.validation.passed(), "{:?}", report.validation.errors());
    assert!(dest.join("model.onnx").exists());
    assert!(dest.join("tokenizer.json").exists());
    // Checkpoint keeps its own files and gets no graph
    assert!(checkpoint.join("tokenizer.json").exists());
    assert!(!checkpoint.join("model.onnx").exists());
    assert!(!temp.path().join("live-onnx").exists());
}

#[test]
fn test_failed_publish_removes_scratch_dir() {
    let temp = TempDir::new().unwrap();
    let checkpoint = checkpoint_dir(temp.path());
    // A plain file where the live directory should be
    let dest = temp.path().join("live");
    fs::write(&dest, b"not a directory").unwrap();
    let exporter = MockExporter::succeeding_on(&[ExportAttempt::managed()], 2 * MIB);
    let inliner = MockInliner::new();

    let pipeline = ConversionPipeline::new(&exporter, &inliner, None, settings());
    let err = pipeline
        .run(&PipelineRequest {
            dest,
            ..request(&checkpoint)
        })
        .unwrap_err();

    assert!(matches!(err, PipelineError::Publish(_)));
    assert!(!temp.path().join("live-onnx").exists());
}
