//! Probe the Python toolchain

use std::path::Path;

use onnxport::config::PipelineConfig;
use onnxport::output::{DoctorResult, OutputMode};

/// Report interpreter and module availability
pub fn doctor(config_path: Option<&Path>, mode: OutputMode) -> anyhow::Result<()> {
    let config = PipelineConfig::load(config_path)?;
    let runner = config.runner();

    let python_version = runner.version().ok();
    // Module probes are pointless without an interpreter
    let modules = if python_version.is_some() { runner.probe() } else { Vec::new() };

    let result = DoctorResult {
        interpreter: runner.interpreter().to_string(),
        python_version,
        mirror_endpoint: runner.mirror_endpoint().map(String::from),
        modules,
    };
    result.render(mode);

    if !result.healthy() {
        std::process::exit(1);
    }
    Ok(())
}
