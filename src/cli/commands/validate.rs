//! Validate a published model directory

use std::path::Path;

use onnxport::adapters::PythonRuntimeLoader;
use onnxport::config::PipelineConfig;
use onnxport::core::models::ModelFamily;
use onnxport::core::services::IntegrityValidator;
use onnxport::output::{OutputMode, ValidationResult};

/// Run the four validation stages against `dir`
pub fn validate(
    dir: &Path,
    family: ModelFamily,
    variant: Option<&str>,
    no_runtime: bool,
    config_path: Option<&Path>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let config = PipelineConfig::load(config_path)?;
    let expectation = super::expectation_for(&config, dir, family, variant);

    let loader = PythonRuntimeLoader::new(config.runner());
    let validator = if config.validation.runtime_check && !no_runtime {
        IntegrityValidator::new(&loader)
    } else {
        IntegrityValidator::without_runtime()
    };
    let report = validator
        .with_scan_window(config.validation.scan_window_bytes)
        .with_diagnostic_limit(config.validation.diagnostic_prefix)
        .validate(dir, &expectation);

    let result = ValidationResult::new(dir, &report);
    result.render(mode);

    if !result.passed {
        std::process::exit(1);
    }
    Ok(())
}
