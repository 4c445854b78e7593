//! Pipeline services
//!
//! Each service owns one stage and talks to the outside world only through
//! the traits in [`crate::core::ports`].
//!
//! - [`selector`] - Try export attempts in order until one is accepted
//! - [`merger`] - Inline external weights when the result fits
//! - [`publisher`] - Install an artifact into the live directory
//! - [`validator`] - Certify a published directory
//! - [`pipeline`] - Run all four in sequence

pub mod merger;
pub mod pipeline;
pub mod publisher;
pub mod selector;
pub mod validator;

pub use merger::{DEFAULT_MERGE_CEILING_BYTES, ExternalDataMerger, MergeOutcome, within_ceiling};
pub use pipeline::{
    AttemptSummary, ConversionPipeline, DEFAULT_OPSET_CANDIDATES, PipelineReport, PipelineRequest,
    PipelineSettings,
};
pub use publisher::ArtifactPublisher;
pub use selector::{ExportStrategySelector, Selection};
pub use validator::{DEFAULT_SCAN_WINDOW_BYTES, IntegrityValidator, classify_load_failure};
