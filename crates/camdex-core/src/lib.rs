//! camdex-core - Core types and configuration for camdex
//!
//! This crate provides the camera record model, field extraction, the
//! per-tenant index path resolver, configuration/profile handling and the
//! error type shared by the rest of the workspace.

pub mod config;
pub mod error;
pub mod paths;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{IndexError, Result};
pub use paths::{index_path, index_path_in, sanitize_path_component};
pub use traits::*;
pub use types::*;
