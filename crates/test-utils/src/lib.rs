//! Shared test utilities for the weather-dap workspace.
//!
//! This crate provides common testing infrastructure including:
//! - In-memory sample datasets
//! - Instrumented array sources
//! - On-disk Zarr V3 store writers
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{sample_dataset, write_sample_store};
//! ```

pub mod fixtures;
pub mod generators;
pub mod zarr;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use zarr::*;

/// Decode a big-endian `f32` payload, as found after a DODS array header.
pub fn be_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
