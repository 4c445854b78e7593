//! Inline a split graph into one file

use std::path::Path;

use onnxport::adapters::PythonInliner;
use onnxport::config::PipelineConfig;
use onnxport::core::services::ExternalDataMerger;
use onnxport::output::{MergeResult, OutputMode};
use onnxport::paths;

/// Merge `graph` with the external data next to it
pub fn merge(
    graph: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    if !graph.is_file() {
        anyhow::bail!("graph file not found: {}", graph.display());
    }
    let config = PipelineConfig::load(config_path)?;
    let settings = config.settings();

    let dir = graph.parent().unwrap_or_else(|| Path::new("."));
    let external = paths::external_data(dir);
    let external = external.is_file().then_some(external);
    let target = output.map_or_else(|| paths::graph(&paths::merged_dir(dir)), Path::to_path_buf);

    let inliner = PythonInliner::new(config.runner());
    let outcome = ExternalDataMerger::new(&inliner)
        .with_ceiling(settings.merge_ceiling_bytes)
        .with_diagnostic_limit(settings.diagnostic_limit)
        .merge(graph, external.as_deref(), &target);

    MergeResult {
        graph: graph.to_path_buf(),
        external,
        outcome,
    }
    .render(mode);
    Ok(())
}
