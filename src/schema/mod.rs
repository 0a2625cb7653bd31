//! Schema module - Configuration and manifest document types.

mod config;
mod manifest;

pub use config::*;
pub use manifest::*;
