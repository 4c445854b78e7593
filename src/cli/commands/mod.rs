//! Command implementations

mod convert;
mod doctor;
mod merge;
mod plan;
mod validate;

use std::path::Path;

use onnxport::config::PipelineConfig;
use onnxport::core::models::{ModelFamily, SizeExpectation};

pub use convert::{ConvertArgs, convert};
pub use doctor::doctor;
pub use merge::merge;
pub use plan::plan;
pub use validate::validate;

/// Size expectation for `dir`, keyed by `variant` or else the directory name
fn expectation_for(
    config: &PipelineConfig,
    dir: &Path,
    family: ModelFamily,
    variant: Option<&str>,
) -> SizeExpectation {
    let dir_name = dir.file_name().and_then(|n| n.to_str());
    config.size_table().lookup(variant.or(dir_name), family)
}
