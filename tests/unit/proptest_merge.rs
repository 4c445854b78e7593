//! Property-based tests for the merge ceiling
//!
//! Uses proptest to verify the merger's size precondition for all inputs.

use onnxport::core::services::{
    DEFAULT_MERGE_CEILING_BYTES, ExternalDataMerger, MergeOutcome, within_ceiling,
};
use proptest::prelude::*;
use tempfile::TempDir;

use crate::common::fixtures::sparse_file;
use crate::common::mocks::MockInliner;

const MAX_BYTES: u64 = 4 * DEFAULT_MERGE_CEILING_BYTES;

proptest! {
    /// The ceiling is inclusive and depends only on the combined size
    #[test]
    fn ceiling_is_combined_and_inclusive(graph in 0..MAX_BYTES, external in 0..MAX_BYTES) {
        prop_assert_eq!(
            within_ceiling(graph, external, DEFAULT_MERGE_CEILING_BYTES),
            graph + external <= DEFAULT_MERGE_CEILING_BYTES
        );
    }

    /// Sizes never overflow into acceptance
    #[test]
    fn huge_sizes_are_never_within_ceiling(graph in (u64::MAX / 2)..u64::MAX, external in (u64::MAX / 2)..u64::MAX) {
        prop_assert!(!within_ceiling(graph, external, DEFAULT_MERGE_CEILING_BYTES));
    }

    /// Under the ceiling the inliner is always invoked; above it, never
    #[test]
    fn inliner_invoked_only_within_ceiling(
        graph in 1u64..4096,
        external in 0u64..4096,
        ceiling in 1u64..8192,
    ) {
        let temp = TempDir::new().unwrap();
        let graph_path = temp.path().join("model.onnx");
        let external_path = temp.path().join("model.onnx_data");
        sparse_file(&graph_path, graph);
        sparse_file(&external_path, external);

        let inliner = MockInliner::new();
        let outcome = ExternalDataMerger::new(&inliner)
            .with_ceiling(ceiling)
            .merge(&graph_path, Some(&external_path), &temp.path().join("merged/model.onnx"));

        if graph + external <= ceiling {
            prop_assert_eq!(inliner.calls(), 1);
            let merged = matches!(outcome, MergeOutcome::Merged { bytes, .. } if bytes == graph + external);
            prop_assert!(merged);
        } else {
            prop_assert_eq!(inliner.calls(), 0);
            let skipped = matches!(outcome, MergeOutcome::SkippedTooLarge { .. });
            prop_assert!(skipped);
        }
    }
}

#[test]
fn test_boundary_at_exactly_1900_mib() {
    let mib = 1024 * 1024;
    assert!(within_ceiling(900 * mib, 1000 * mib, DEFAULT_MERGE_CEILING_BYTES));
    assert!(!within_ceiling(900 * mib, 1000 * mib + 1, DEFAULT_MERGE_CEILING_BYTES));
}

#[test]
fn test_failed_merge_leaves_no_output() {
    let temp = TempDir::new().unwrap();
    let graph_path = temp.path().join("model.onnx");
    sparse_file(&graph_path, 2048);
    sparse_file(&temp.path().join("model.onnx_data"), 2048);
    let target = temp.path().join("merged/model.onnx");

    let inliner = MockInliner::failing("onnx.onnx_cpp2py_export.checker.ValidationError: bad graph");
    let outcome = ExternalDataMerger::new(&inliner).merge(
        &graph_path,
        Some(&temp.path().join("model.onnx_data")),
        &target,
    );

    assert!(matches!(outcome, MergeOutcome::Failed { .. }));
    assert!(!target.exists());
    assert!(!temp.path().join("merged/model.onnx.partial").exists());
}
