//! Shared integration test helpers for shadecache.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::TestContext;
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a
//! subset of helpers is used per file.

#![allow(dead_code)]

use shadecache::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const QUAD_VERT: &str = "#version 450
layout(location = 0) in vec2 a_position;
layout(location = 0) out vec2 v_uv;
void main() {
    v_uv = a_position * 0.5 + 0.5;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

pub const QUAD_FRAG: &str = "#version 450
#include lib/tint.glsl
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 o_color;
void main() {
    o_color = vec4(tint(v_uv), 1.0);
}
";

pub const TINT: &str = "vec3 tint(vec2 uv) {
    return vec3(uv, 0.5);
}
";

/// A temp directory laid out as:
///
/// ```text
/// <tmp>/
///   config.yaml          # written on demand
///   shaders/
///     quad.vert
///     quad.frag          # includes lib/tint.glsl
///     lib/tint.glsl
/// ```
pub struct TestContext {
    /// Kept alive for the lifetime of the context.
    pub dir: TempDir,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let shaders = dir.path().join("shaders");
        write_file(&shaders, "quad.vert", QUAD_VERT);
        write_file(&shaders, "quad.frag", QUAD_FRAG);
        write_file(&shaders, "lib/tint.glsl", TINT);

        let config = Config::new()
            .with_shaders_dir(shaders.to_string_lossy())
            .with_auto_reload(false);
        Self { dir, config }
    }

    pub fn shaders_dir(&self) -> PathBuf {
        self.dir.path().join("shaders")
    }

    pub fn shader(&self, name: &str, contents: &str) -> PathBuf {
        write_file(&self.shaders_dir(), name, contents)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create dir");
    }
    fs::write(&path, contents).expect("Failed to write file");
    path
}
