//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between the pipeline logic and the
//! model toolchain (exporters, the ONNX serializer, the inference runtime).
//!
//! Implementations live in the `adapters` module.
//!
//! ## Design Principle
//!
//! Services depend only on these traits, never on concrete implementations,
//! so every stage can be driven by scripted fakes in tests.

mod exporter;
mod inliner;
mod runtime;

pub use exporter::Exporter;
pub use inliner::GraphInliner;
pub use runtime::RuntimeLoader;
