//! Shared integration test helpers for shadecache-render.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` attribute suppresses warnings when only a subset of
//! helpers is used per file.

#![allow(dead_code)]

use parking_lot::Mutex;
use shadecache_render::{
    BackendOutput, ProgramHandle, ShaderBackend, ShaderManager, ShaderStage, SharedBackend,
    StageHandle, share,
};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Marker that makes [`RecordingBackend`] fail to compile a stage.
pub const COMPILE_ERROR: &str = "COMPILE_ERROR";
/// Marker that makes [`RecordingBackend`] fail to link a program.
pub const LINK_ERROR: &str = "LINK_ERROR";

pub const BASIC_VERT: &str = "#version 450\nvoid main() {\n    gl_Position = vec4(0.0);\n}\n";
pub const BASIC_FRAG: &str = "#version 450\nout vec4 color;\nvoid main() {\n    color = vec4(1.0);\n}\n";

/// Backend that records every call and never touches a GPU.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    /// `(stage, label, source)` for every compile attempt.
    pub compiles: Vec<(ShaderStage, String, String)>,
    /// Number of link attempts.
    pub links: usize,
    pub live_stages: HashSet<u32>,
    pub live_programs: HashSet<u32>,
    stage_sources: HashMap<u32, String>,
}

impl RecordingBackend {
    pub fn compile_count(&self) -> usize {
        self.compiles.len()
    }

    pub fn last_source_for(&self, label: &str) -> Option<&str> {
        self.compiles
            .iter()
            .rev()
            .find(|(_, l, _)| l == label)
            .map(|(_, _, source)| source.as_str())
    }
}

impl ShaderBackend for RecordingBackend {
    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        source: &str,
        label: &str,
    ) -> Result<BackendOutput<StageHandle>, String> {
        self.compiles
            .push((stage, label.to_string(), source.to_string()));
        if source.contains(COMPILE_ERROR) {
            return Err(format!("{label}:1: error: {COMPILE_ERROR}"));
        }
        self.next_id += 1;
        self.live_stages.insert(self.next_id);
        self.stage_sources.insert(self.next_id, source.to_string());
        Ok(BackendOutput::new(StageHandle(self.next_id)))
    }

    fn delete_stage(&mut self, handle: StageHandle) {
        self.live_stages.remove(&handle.0);
        self.stage_sources.remove(&handle.0);
    }

    fn link_program(
        &mut self,
        stages: &[StageHandle],
        label: &str,
    ) -> Result<BackendOutput<ProgramHandle>, String> {
        self.links += 1;
        for handle in stages {
            match self.stage_sources.get(&handle.0) {
                None => return Err(format!("{label}: stage {} is not live", handle.0)),
                Some(source) if source.contains(LINK_ERROR) => {
                    return Err(format!("{label}: error: {LINK_ERROR}"));
                }
                Some(_) => {}
            }
        }
        self.next_id += 1;
        self.live_programs.insert(self.next_id);
        Ok(BackendOutput::new(ProgramHandle(self.next_id)))
    }

    fn delete_program(&mut self, handle: ProgramHandle) {
        self.live_programs.remove(&handle.0);
    }
}

/// A temp shader root, a recording backend and a manager over both.
pub struct TestContext {
    pub dir: TempDir,
    pub backend: Arc<Mutex<RecordingBackend>>,
    pub manager: ShaderManager,
}

impl TestContext {
    pub fn new(auto_reload: bool) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let backend = share(RecordingBackend::default());
        let shared: SharedBackend = backend.clone();
        let mut manager = ShaderManager::with_root(shared, dir.path());
        manager.set_auto_reload(auto_reload);
        Self {
            dir,
            backend,
            manager,
        }
    }

    /// Context with `basic.vert` / `basic.frag` already written.
    pub fn with_basic(auto_reload: bool) -> Self {
        let ctx = Self::new(auto_reload);
        ctx.write("basic.vert", BASIC_VERT);
        ctx.write("basic.frag", BASIC_FRAG);
        ctx
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        write_file(self.dir.path(), name, contents)
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

/// Push a file's modification time forward so the change is visible even on
/// filesystems with coarse timestamps.
pub fn touch(path: &Path) {
    touch_ahead(path, 60);
}

/// Set a file's modification time `secs` seconds into the future.
pub fn touch_ahead(path: &Path, secs: u64) {
    let file = fs::File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file for touch");
    file.set_modified(SystemTime::now() + Duration::from_secs(secs))
        .expect("Failed to set mtime");
}
