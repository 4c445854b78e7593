//! Adapter implementations for port traits
//!
//! - `python/` - Export, inline and runtime load through the Python toolchain

pub mod python;

pub use python::{ModuleProbe, PythonExporter, PythonInliner, PythonRunner, PythonRuntimeLoader};
