// Library exports for testing and potential library use
//
// The cache itself lives in `shadecache-render`; configuration in
// `shadecache-config`. This crate adds the CLI, the log bridge and the
// file watcher, and re-exports the sub-crates so callers need one
// dependency.

/// Application version (root crate version, for use by sub-crates).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod debug;
pub mod shader_watcher;

pub use shadecache_config as config;
pub use shadecache_render as render;

pub use shader_watcher::{ShaderReloadEvent, ShaderWatcher, ShaderWatcherBuilder};
pub use shadecache_render::{
    NagaBackend, ShaderError, ShaderKey, ShaderManager, SharedShaderManager, SmartShaderProgram,
};
