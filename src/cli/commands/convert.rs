//! Full conversion: export, merge, publish, validate

use std::path::{Path, PathBuf};

use onnxport::adapters::{PythonExporter, PythonInliner, PythonRuntimeLoader};
use onnxport::config::PipelineConfig;
use onnxport::core::PipelineError;
use onnxport::core::models::{ModelFamily, SourceCheckpoint};
use onnxport::core::ports::RuntimeLoader;
use onnxport::core::services::{ConversionPipeline, PipelineRequest};
use onnxport::output::{ConvertResult, OutputMode};

/// Arguments for `onnxport convert`
#[derive(Debug)]
pub struct ConvertArgs {
    /// Checkpoint directory
    pub checkpoint: PathBuf,
    /// Live model directory; the checkpoint directory when unset
    pub dest: Option<PathBuf>,
    /// Model family
    pub family: ModelFamily,
    /// Size table variant
    pub variant: Option<String>,
    /// Skip the runtime load check
    pub no_runtime: bool,
}

/// Run the whole pipeline for one checkpoint
pub fn convert(args: &ConvertArgs, config_path: Option<&Path>, mode: OutputMode) -> anyhow::Result<()> {
    let config = PipelineConfig::load(config_path)?;
    let dest = args.dest.clone().unwrap_or_else(|| args.checkpoint.clone());

    let runner = config.runner();
    let exporter = PythonExporter::new(runner.clone());
    let inliner = PythonInliner::new(runner.clone());
    let loader = PythonRuntimeLoader::new(runner);
    let runtime: Option<&dyn RuntimeLoader> =
        if config.validation.runtime_check && !args.no_runtime { Some(&loader) } else { None };

    let pipeline = ConversionPipeline::new(&exporter, &inliner, runtime, config.settings());
    let request = PipelineRequest {
        checkpoint: SourceCheckpoint::new(&args.checkpoint, args.family),
        expectation: super::expectation_for(
            &config,
            &args.checkpoint,
            args.family,
            args.variant.as_deref(),
        ),
        dest,
    };

    let result = match pipeline.run(&request) {
        Ok(report) => ConvertResult::completed(&args.checkpoint, &report),
        Err(e @ (PipelineError::StrategiesExhausted { .. } | PipelineError::NoAttempts)) => {
            ConvertResult::aborted(&args.checkpoint, &request.dest, e.attempts(), e.to_string())
        },
        Err(e) => return Err(e.into()),
    };
    result.render(mode);

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}
