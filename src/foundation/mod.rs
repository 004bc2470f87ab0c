//! Shared types: error taxonomy, pixel buffers and configuration.

pub mod config;
pub mod core;
pub mod error;
