//! Default values for configuration fields.

/// Mtime polling is on in debug builds and compiled out of the default in
/// optimized builds.
pub fn auto_reload() -> bool {
    cfg!(debug_assertions)
}

pub fn hot_reload_delay_ms() -> u64 {
    100 // Debounce delay in milliseconds
}

pub fn shaders_dir_name() -> &'static str {
    "shaders"
}

pub fn app_dir_name() -> &'static str {
    "shadecache"
}

pub fn config_file_name() -> &'static str {
    "config.yaml"
}
