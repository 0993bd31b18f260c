//! Shader program cache for shadecache.
//!
//! This crate turns shader source files into linked GPU programs and keeps
//! them cached:
//!
//! - Source preprocessing (`#include` resolution, define injection after
//!   `#version`, `#line` markers for accurate diagnostics)
//! - Per-stage compilation and program linking through a [`ShaderBackend`]
//! - A keyed program cache with mtime-based hot reload
//! - A naga-powered backend that validates GLSL and emits WGSL

pub mod backend;
pub mod error;
pub mod naga_backend;
pub mod preprocessor;
pub mod shader_key;
pub mod shader_manager;
pub mod shader_program;
pub mod shader_unit;
pub mod text_utils;

// Re-export main public types
pub use backend::{
    BackendOutput, ProgramHandle, ShaderBackend, ShaderStage, SharedBackend, StageHandle, share,
};
pub use error::{Result, ShaderError};
pub use naga_backend::NagaBackend;
pub use preprocessor::{PreprocessedSource, Preprocessor};
pub use shader_key::ShaderKey;
pub use shader_manager::{CacheEntry, CacheStats, ShaderManager, SharedShaderManager};
pub use shader_program::{ShaderProgram, SmartShaderProgram};
pub use shader_unit::ShaderUnit;
