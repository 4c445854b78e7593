//! Mock implementations of port traits for testing
//!
//! These mocks write sparse files where the real toolchain would write
//! models, and record every call.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use onnxport::core::models::{
    Dim, ExportAttempt, SessionSignature, SourceCheckpoint, TensorSignature,
};
use onnxport::core::ports::{Exporter, GraphInliner, RuntimeLoader};

use super::fixtures::sparse_file;

/// Exporter that succeeds only for chosen attempts
pub struct MockExporter {
    succeed_on: Vec<ExportAttempt>,
    graph_bytes: u64,
    external_bytes: Option<u64>,
    nested: bool,
    calls: RefCell<Vec<ExportAttempt>>,
}

impl MockExporter {
    pub fn succeeding_on(attempts: &[ExportAttempt], graph_bytes: u64) -> Self {
        Self {
            succeed_on: attempts.to_vec(),
            graph_bytes,
            external_bytes: None,
            nested: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::succeeding_on(&[], 0)
    }

    /// Also write an external data blob
    pub fn with_external(mut self, bytes: u64) -> Self {
        self.external_bytes = Some(bytes);
        self
    }

    /// Write into a subdirectory, the way some exporters do
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn calls(&self) -> Vec<ExportAttempt> {
        self.calls.borrow().clone()
    }
}

impl Exporter for MockExporter {
    fn export(
        &self,
        _checkpoint: &SourceCheckpoint,
        attempt: &ExportAttempt,
        out_dir: &Path,
    ) -> anyhow::Result<()> {
        self.calls.borrow_mut().push(*attempt);
        if !self.succeed_on.contains(attempt) {
            fs::write(out_dir.join("model.onnx"), b"partial")?;
            anyhow::bail!("RuntimeError: {attempt} failed");
        }

        let dir = if self.nested { out_dir.join("onnx") } else { out_dir.to_path_buf() };
        sparse_file(&dir.join("model.onnx"), self.graph_bytes);
        if let Some(bytes) = self.external_bytes {
            sparse_file(&dir.join("model.onnx_data"), bytes);
        }
        Ok(())
    }
}

/// Inliner that writes graph + external size into the target
#[derive(Default)]
pub struct MockInliner {
    fail_with: Option<String>,
    calls: Cell<usize>,
    targets: RefCell<Vec<PathBuf>>,
}

impl MockInliner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl GraphInliner for MockInliner {
    fn inline(&self, graph: &Path, target: &Path) -> anyhow::Result<()> {
        self.calls.set(self.calls.get() + 1);
        self.targets.borrow_mut().push(target.to_path_buf());
        if let Some(message) = &self.fail_with {
            // Partial output the merger must clean up
            fs::write(target, b"half")?;
            anyhow::bail!("{message}");
        }

        let external = graph.with_file_name("model.onnx_data");
        let external_bytes = fs::metadata(&external).map(|m| m.len()).unwrap_or(0);
        sparse_file(target, fs::metadata(graph)?.len() + external_bytes);
        Ok(())
    }
}

/// Runtime that returns a fixed signature or a fixed error
pub struct MockRuntime {
    error: Option<String>,
    calls: Cell<usize>,
}

impl MockRuntime {
    pub fn loading() -> Self {
        Self {
            error: None,
            calls: Cell::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl RuntimeLoader for MockRuntime {
    fn load(&self, _graph: &Path) -> anyhow::Result<SessionSignature> {
        self.calls.set(self.calls.get() + 1);
        if let Some(message) = &self.error {
            anyhow::bail!("{message}");
        }
        let dynamic = vec![Dim::Symbolic("batch".into()), Dim::Symbolic("sequence".into())];
        Ok(SessionSignature {
            inputs: vec![
                TensorSignature {
                    name: "input_ids".into(),
                    shape: dynamic.clone(),
                    element_type: Some("tensor(int64)".into()),
                },
                TensorSignature {
                    name: "attention_mask".into(),
                    shape: dynamic.clone(),
                    element_type: Some("tensor(int64)".into()),
                },
            ],
            outputs: vec![TensorSignature {
                name: "last_hidden_state".into(),
                shape: [dynamic, vec![Dim::Fixed(768)]].concat(),
                element_type: Some("tensor(float)".into()),
            }],
        })
    }
}
