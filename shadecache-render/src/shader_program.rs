//! Linked shader programs and the shared handle handed to callers.

use crate::backend::{ProgramHandle, ShaderStage, SharedBackend};
use crate::error::{Result, ShaderError};
use crate::shader_unit::ShaderUnit;
use std::fmt;
use std::sync::Arc;

/// Reference-counted program handle.
///
/// The cache keeps one reference; callers get clones. The GPU program is
/// deleted when the last clone is dropped, so a handle obtained before an
/// eviction stays valid.
pub type SmartShaderProgram = Arc<ShaderProgram>;

/// A set of compiled stages and, once linked, the program built from them.
pub struct ShaderProgram {
    name: String,
    units: Vec<ShaderUnit>,
    stages: Vec<ShaderStage>,
    handle: Option<ProgramHandle>,
    linked: bool,
    log: String,
    backend: SharedBackend,
}

impl fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("handle", &self.handle)
            .field("linked", &self.linked)
            .finish_non_exhaustive()
    }
}

impl ShaderProgram {
    /// Create an empty, unlinked program. `name` is used in diagnostics.
    pub fn new(backend: &SharedBackend, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
            stages: Vec::new(),
            handle: None,
            linked: false,
            log: String::new(),
            backend: SharedBackend::clone(backend),
        }
    }

    /// Queue a compiled stage for the next [`Self::link`].
    pub fn add_shader(&mut self, unit: ShaderUnit) {
        self.units.push(unit);
    }

    /// Link every queued stage.
    ///
    /// Requires at least one vertex and one fragment stage. On success the
    /// stage objects are released; the linked program does not need them.
    pub fn link(&mut self) -> Result<()> {
        let kinds: Vec<ShaderStage> = self.units.iter().map(ShaderUnit::stage).collect();
        for required in [ShaderStage::Vertex, ShaderStage::Fragment] {
            if !kinds.contains(&required) {
                return Err(self.link_failed(format!("program has no {required} stage")));
            }
        }

        let handles: Vec<_> = self.units.iter().map(ShaderUnit::handle).collect();
        let result = self.backend.lock().link_program(&handles, &self.name);

        match result {
            Ok(output) => {
                if let Some(previous) = self.handle.replace(output.handle) {
                    self.backend.lock().delete_program(previous);
                }
                self.linked = true;
                self.log = output.log;
                self.stages = kinds;
                self.units.clear();
                if !self.log.is_empty() {
                    log::warn!("Shader \"{}\" linked with warnings:\n{}", self.name, self.log);
                }
                Ok(())
            }
            Err(log) => Err(self.link_failed(log)),
        }
    }

    fn link_failed(&mut self, log: String) -> ShaderError {
        self.linked = false;
        self.log = log.clone();
        ShaderError::Link {
            name: self.name.clone(),
            log,
        }
    }

    pub fn was_linking_successful(&self) -> bool {
        self.linked
    }

    /// Linker output from the last [`Self::link`].
    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program object, present once linked.
    pub fn handle(&self) -> Option<ProgramHandle> {
        self.handle
    }

    /// Stage kinds the program was linked from.
    pub fn stages(&self) -> &[ShaderStage] {
        &self.stages
    }

    /// Stages queued but not yet linked.
    pub fn pending_stage_count(&self) -> usize {
        self.units.len()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.units.clear();
        if let Some(handle) = self.handle.take() {
            self.backend.lock().delete_program(handle);
        }
    }
}
