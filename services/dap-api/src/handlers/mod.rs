//! HTTP request handlers for the DAP API.

pub mod dap;
pub mod health;
