//! Exporter backed by the Python toolchain

use std::ffi::{OsStr, OsString};
use std::path::Path;

use log::debug;

use super::{PythonRunner, scripts};
use crate::core::models::{ExportAttempt, ExportMethod, SourceCheckpoint};
use crate::core::ports::Exporter;

/// Module path of the optimum command-line exporter
pub const OPTIMUM_CLI_MODULE: &str = "optimum.exporters.onnx";

/// Dispatches each attempt to the matching Python entry point
#[derive(Debug, Clone, Default)]
pub struct PythonExporter {
    runner: PythonRunner,
}

impl PythonExporter {
    /// Create an exporter that runs through `runner`
    #[must_use]
    pub const fn new(runner: PythonRunner) -> Self {
        Self { runner }
    }
}

impl Exporter for PythonExporter {
    fn export(
        &self,
        checkpoint: &SourceCheckpoint,
        attempt: &ExportAttempt,
        out_dir: &Path,
    ) -> anyhow::Result<()> {
        let family = checkpoint.family.to_string();
        match attempt.method {
            ExportMethod::ManagedExport => {
                let args = [checkpoint.dir.as_os_str(), out_dir.as_os_str(), OsStr::new(&family)];
                self.runner.run_script(scripts::MANAGED_EXPORT, &args)?;
            },
            ExportMethod::CliExport => {
                let args = cli_args(checkpoint, out_dir);
                self.runner.run_module(OPTIMUM_CLI_MODULE, &args)?;
            },
            ExportMethod::RawExport => {
                let Some(opset) = attempt.opset else {
                    anyhow::bail!("raw export needs an opset");
                };
                let opset = opset.to_string();
                let args = [
                    checkpoint.dir.as_os_str(),
                    out_dir.as_os_str(),
                    OsStr::new(&family),
                    OsStr::new(&opset),
                ];
                self.runner.run_script(scripts::RAW_EXPORT, &args)?;
            },
        }
        debug!("{attempt} finished writing to {}", out_dir.display());
        Ok(())
    }
}

/// Arguments for `python -m optimum.exporters.onnx`
fn cli_args(checkpoint: &SourceCheckpoint, out_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--model".into(), checkpoint.dir.clone().into_os_string()];
    if let Some(task) = checkpoint.family.optimum_task() {
        args.push("--task".into());
        args.push(task.into());
    }
    args.push(out_dir.as_os_str().to_os_string());
    args
}
