//! A single compiled shader stage.

use crate::backend::{ShaderStage, SharedBackend, StageHandle};
use crate::error::{Result, ShaderError};
use crate::preprocessor::Preprocessor;
use crate::text_utils::{basename, extension, is_regular_file};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Owns one compiled stage object; the object is released on drop.
///
/// Consumed by [`crate::ShaderProgram::add_shader`], which keeps it until the
/// program is linked.
pub struct ShaderUnit {
    stage: ShaderStage,
    handle: StageHandle,
    label: String,
    log: String,
    backend: SharedBackend,
}

impl fmt::Debug for ShaderUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderUnit")
            .field("stage", &self.stage)
            .field("handle", &self.handle)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl ShaderUnit {
    /// Compile `source` as a `stage` shader.
    ///
    /// `label` names the source in diagnostics, normally the file basename.
    pub fn compile(
        backend: &SharedBackend,
        stage: ShaderStage,
        source: &str,
        label: &str,
    ) -> Result<Self> {
        let output = backend
            .lock()
            .compile_stage(stage, source, label)
            .map_err(|log| ShaderError::Compile {
                file: label.to_string(),
                log,
            })?;

        if !output.log.is_empty() {
            log::warn!("Shader \"{label}\" compiled with warnings:\n{}", output.log);
        }

        Ok(Self {
            stage,
            handle: output.handle,
            label: label.to_string(),
            log: output.log,
            backend: SharedBackend::clone(backend),
        })
    }

    /// Infer the stage from `path`, preprocess it and compile the result.
    ///
    /// Returns the unit plus the modification time of every file read to
    /// build it, taken before each read (for staleness tracking).
    pub fn compile_from_file(
        backend: &SharedBackend,
        preprocessor: &Preprocessor,
        path: &Path,
        defines: &[String],
    ) -> Result<(Self, HashMap<PathBuf, SystemTime>)> {
        let file = basename(path);
        let stage = ShaderStage::from_extension(&extension(path))
            .ok_or_else(|| ShaderError::InvalidStageKind { file: file.clone() })?;

        if !is_regular_file(path) {
            return Err(ShaderError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let source = preprocessor.preprocess(path, defines)?;
        log::debug!("Preprocessed {stage} shader {file}:\n{}", source.text);

        let unit = Self::compile(backend, stage, &source.text, &file)?;
        Ok((unit, source.mod_times))
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn handle(&self) -> StageHandle {
        self.handle
    }

    /// Name used in diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Compiler output; may contain warnings.
    pub fn log(&self) -> &str {
        &self.log
    }
}

impl Drop for ShaderUnit {
    fn drop(&mut self) {
        self.backend.lock().delete_stage(self.handle);
    }
}
