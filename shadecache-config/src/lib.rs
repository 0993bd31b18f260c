//! Configuration system for the shadecache shader cache.
//!
//! This crate provides configuration loading, saving, and default values:
//!
//! - Shader root directory resolution and traversal-safe shader paths
//! - Auto-reload (mtime polling) switch with a build-profile default
//! - Watcher debounce delay
//! - Debug log level

pub mod config;
pub mod defaults;
pub mod error;
mod types;

pub use config::{Config, validate_shader_name};
pub use error::ConfigError;
pub use types::LogLevel;
