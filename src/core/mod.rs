//! Core domain logic for onnxport
//!
//! All interaction with the Python toolchain is abstracted through port
//! traits; services only touch the filesystem for the artifact files they
//! own.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (ModelArtifact, ExportAttempt, ValidationReport)
//! - `services/` - Selector, merger, publisher, validator and the pipeline
//! - `ports/` - Trait definitions for exporters, inliners and runtimes
//! - `error` - Typed pipeline errors

pub mod error;
pub mod models;
pub mod ports;
pub mod services;

pub use error::PipelineError;
