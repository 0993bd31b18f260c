//! Typed error variants for the shadecache-config crate.
//!
//! Provides structured error types for config I/O, validation and shader
//! path resolution, so callers can match on specific failure modes.

use std::fmt;

/// Errors that can occur when loading, saving or resolving configuration.
///
/// # Example
///
/// ```rust,no_run
/// use shadecache_config::ConfigError;
///
/// fn report(e: &ConfigError) {
///     match e {
///         ConfigError::Io(io) => eprintln!("I/O error: {io}"),
///         ConfigError::Parse(p) => eprintln!("YAML parse error: {p}"),
///         ConfigError::Validation(msg) => eprintln!("Validation: {msg}"),
///         ConfigError::PathTraversal(msg) => eprintln!("Path traversal: {msg}"),
///     }
/// }
/// ```
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the config file.
    Io(std::io::Error),

    /// The config file contained invalid YAML that could not be parsed.
    Parse(serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string describes which field is invalid and why.
    Validation(String),

    /// A shader name would resolve outside the shaders directory.
    ///
    /// The inner string includes the offending name.
    PathTraversal(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error reading config: {e}"),
            ConfigError::Parse(e) => write!(f, "YAML parse error in config: {e}"),
            ConfigError::Validation(msg) => write!(f, "Config validation error: {msg}"),
            ConfigError::PathTraversal(msg) => write!(f, "Path traversal detected: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) | ConfigError::PathTraversal(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        ConfigError::Parse(e)
    }
}
