//! Inference runtime port
//!
//! Defines the interface for the runtime-load validation stage.

use std::path::Path;

use crate::core::models::SessionSignature;

/// Instantiates an inference session to prove an artifact loads
pub trait RuntimeLoader {
    /// Create a session from `graph` with graph optimizations disabled and
    /// report its declared inputs and outputs.
    ///
    /// The error text is classified by the validator, so implementations
    /// should pass the runtime's own message through.
    fn load(&self, graph: &Path) -> anyhow::Result<SessionSignature>;
}
