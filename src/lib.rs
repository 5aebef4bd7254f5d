// ABOUTME: Library root for slipway - exposes public types for testing.
// ABOUTME: The daemon binary is in main.rs.

pub mod config;
pub mod error;
pub mod exec;
pub mod gateway;
pub mod pipeline;
pub mod runtime;
pub mod sinks;
pub mod types;
