//! Seam between the shader cache and the graphics driver.
//!
//! A backend owns GPU shader-stage and program objects, addressed by small
//! integer handles in the style of GL object names. The cache never touches
//! the objects directly: it compiles, links and deletes through this trait.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Kind of a single compilable shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
}

impl ShaderStage {
    /// Infer the stage from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "vert" => Some(ShaderStage::Vertex),
            "frag" => Some(ShaderStage::Fragment),
            "geom" => Some(ShaderStage::Geometry),
            _ => None,
        }
    }

    /// File extension used for this stage.
    pub fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::Fragment => "frag",
            ShaderStage::Geometry => "geom",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

/// Opaque handle to a compiled stage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageHandle(pub u32);

/// Opaque handle to a linked program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Successful compile or link: the handle plus any non-fatal log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOutput<H> {
    pub handle: H,
    /// Warnings; empty when the driver had nothing to say.
    pub log: String,
}

impl<H> BackendOutput<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            log: String::new(),
        }
    }
}

/// Graphics compiler/linker with a generate/delete object lifecycle.
///
/// Errors are returned as the driver's diagnostic log text.
pub trait ShaderBackend: Send {
    /// Compile one stage from final (preprocessed) source.
    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        source: &str,
        label: &str,
    ) -> Result<BackendOutput<StageHandle>, String>;

    /// Release a stage object. Deleting a stage after linking does not
    /// invalidate programs it was linked into.
    fn delete_stage(&mut self, handle: StageHandle);

    /// Link compiled stages into a program.
    fn link_program(
        &mut self,
        stages: &[StageHandle],
        label: &str,
    ) -> Result<BackendOutput<ProgramHandle>, String>;

    /// Release a program object.
    fn delete_program(&mut self, handle: ProgramHandle);
}

/// Backend shared between the manager and every live stage/program, so the
/// last owner can release its GPU object on drop.
pub type SharedBackend = Arc<Mutex<dyn ShaderBackend>>;

/// Wrap a concrete backend for use by the cache.
pub fn share<B: ShaderBackend + 'static>(backend: B) -> Arc<Mutex<B>> {
    Arc::new(Mutex::new(backend))
}
