//! Common test utilities shared across unit tests
//!
//! - `fixtures.rs` - Model directory builders
//! - `mocks.rs` - Scripted port implementations

pub mod mocks;
