//! Typed error types for shadecache-render.
//!
//! Every variant is recoverable at the `ShaderManager` boundary: a failed
//! build leaves the cache untouched and the caller reports the message.
//! Loading a key twice is a programming error and panics instead.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for preprocessing, compiling, linking and caching shaders.
#[derive(Debug, Error)]
pub enum ShaderError {
    // -----------------------------------------------------------------------
    // Source files
    // -----------------------------------------------------------------------
    /// The source path does not exist or is not a regular file.
    #[error("Path \"{}\" is not a valid file", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file extension does not name a shader stage.
    #[error("File \"{file}\" does not have a valid shader file extension")]
    InvalidStageKind {
        /// Basename of the offending file.
        file: String,
    },

    /// The source file exists but could not be read.
    #[error("Shader file read failed for '{}': {source}", path.display())]
    Io {
        /// Path to the shader file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // -----------------------------------------------------------------------
    // Preprocessing
    // -----------------------------------------------------------------------
    /// A directive was malformed, or an include cycle was found.
    #[error("Parse error in '{}' at line {line}: {message}", path.display())]
    Parse {
        /// File containing the directive.
        path: PathBuf,
        /// 1-based line of the directive.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    // -----------------------------------------------------------------------
    // Compile / link
    // -----------------------------------------------------------------------
    /// A stage failed to compile.
    #[error("Shader \"{file}\" failed to compile:\n{log}")]
    Compile {
        /// Basename of the stage source file.
        file: String,
        /// Compiler diagnostic output.
        log: String,
    },

    /// The program failed to link.
    #[error("Failed to link shader \"{name}\":\n{log}")]
    Link {
        /// Shader name from the cache key.
        name: String,
        /// Linker diagnostic output.
        log: String,
    },

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------
    /// The shader name could not be resolved under the shader root.
    #[error("Shader path error: {0}")]
    Config(#[from] shadecache_config::ConfigError),
}

impl ShaderError {
    /// Diagnostic log from the compiler or linker, if this error carries one.
    pub fn diagnostic_log(&self) -> Option<&str> {
        match self {
            ShaderError::Compile { log, .. } | ShaderError::Link { log, .. } => Some(log),
            _ => None,
        }
    }
}

/// Alias for `Result<T, ShaderError>`.
pub type Result<T> = std::result::Result<T, ShaderError>;
