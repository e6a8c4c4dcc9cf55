//! DAP API Service Library
//!
//! This crate provides the HTTP server for the DAP2 (OPeNDAP) protocol:
//! `.das`, `.dds` and `.dods` responses for Zarr datasets below a data root.

pub mod config;
pub mod etag;
pub mod handlers;
pub mod router;
pub mod state;
pub mod streaming;
pub mod transport;
