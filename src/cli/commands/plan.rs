//! Show the configured attempt order

use std::path::Path;

use onnxport::config::PipelineConfig;
use onnxport::output::{OutputMode, PlanResult};

/// Print attempts and thresholds from the effective configuration
pub fn plan(config_path: Option<&Path>, mode: OutputMode) -> anyhow::Result<()> {
    let config = PipelineConfig::load(config_path)?;

    PlanResult {
        config: config.source.clone(),
        attempts: config.attempts().iter().map(ToString::to_string).collect(),
        min_artifact_mib: config.export.min_artifact_mib,
        merge_ceiling_mib: config.merge.ceiling_mib,
        sizes: config.size_table().entries().to_vec(),
    }
    .render(mode);
    Ok(())
}
