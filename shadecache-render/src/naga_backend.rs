//! [`ShaderBackend`] implemented with naga's GLSL front end.
//!
//! "Compiling" parses and validates a stage into a naga module; "linking"
//! checks that the stages are exactly one vertex and one fragment stage and
//! that every fragment input location is written by the vertex stage. Linked programs can be
//! emitted as WGSL for wgpu.

use crate::backend::{
    BackendOutput, ProgramHandle, ShaderBackend, ShaderStage, StageHandle,
};
use std::collections::{BTreeSet, HashMap};

struct CompiledStage {
    stage: ShaderStage,
    label: String,
    module: naga::Module,
}

struct LinkedProgram {
    stages: Vec<(ShaderStage, naga::Module)>,
}

/// Software backend: no GPU, full GLSL parsing and validation.
#[derive(Default)]
pub struct NagaBackend {
    next_id: u32,
    stages: HashMap<u32, CompiledStage>,
    programs: HashMap<u32, LinkedProgram>,
}

impl std::fmt::Debug for NagaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NagaBackend")
            .field("live_stages", &self.stages.len())
            .field("live_programs", &self.programs.len())
            .finish()
    }
}

impl NagaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// WGSL for one stage of a linked program.
    pub fn program_wgsl(&self, program: ProgramHandle, stage: ShaderStage) -> Result<String, String> {
        let linked = self
            .programs
            .get(&program.0)
            .ok_or_else(|| format!("no program with handle {}", program.0))?;
        let (_, module) = linked
            .stages
            .iter()
            .find(|(s, _)| *s == stage)
            .ok_or_else(|| format!("program {} has no {stage} stage", program.0))?;

        let info = validate(module)?;
        naga::back::wgsl::write_string(module, &info, naga::back::wgsl::WriterFlags::empty())
            .map_err(|e| format!("WGSL generation failed: {e}"))
    }
}

fn naga_stage(stage: ShaderStage) -> Option<naga::ShaderStage> {
    match stage {
        ShaderStage::Vertex => Some(naga::ShaderStage::Vertex),
        ShaderStage::Fragment => Some(naga::ShaderStage::Fragment),
        ShaderStage::Geometry => None,
    }
}

impl ShaderBackend for NagaBackend {
    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        source: &str,
        label: &str,
    ) -> Result<BackendOutput<StageHandle>, String> {
        let naga_stage = naga_stage(stage)
            .ok_or_else(|| format!("{label}: {stage} shaders are not supported by naga"))?;

        let mut frontend = naga::front::glsl::Frontend::default();
        let options = naga::front::glsl::Options::from(naga_stage);
        let module = frontend.parse(&options, source).map_err(|errors| {
            let messages: Vec<String> = errors
                .errors
                .iter()
                .map(|e| format!("{label}: {}", e.kind))
                .collect();
            messages.join("\n")
        })?;
        validate(&module).map_err(|e| format!("{label}: {e}"))?;

        let id = self.allocate();
        self.stages.insert(
            id,
            CompiledStage {
                stage,
                label: label.to_string(),
                module,
            },
        );
        log::debug!("naga: compiled {stage} stage {label} as #{id}");
        Ok(BackendOutput::new(StageHandle(id)))
    }

    fn delete_stage(&mut self, handle: StageHandle) {
        self.stages.remove(&handle.0);
    }

    fn link_program(
        &mut self,
        stages: &[StageHandle],
        label: &str,
    ) -> Result<BackendOutput<ProgramHandle>, String> {
        let mut compiled = Vec::with_capacity(stages.len());
        for handle in stages {
            let stage = self
                .stages
                .get(&handle.0)
                .ok_or_else(|| format!("{label}: stage #{} was deleted or never compiled", handle.0))?;
            compiled.push(stage);
        }

        let vertex: Vec<_> = compiled
            .iter()
            .filter(|s| s.stage == ShaderStage::Vertex)
            .collect();
        let fragment: Vec<_> = compiled
            .iter()
            .filter(|s| s.stage == ShaderStage::Fragment)
            .collect();
        if vertex.len() != 1 || fragment.len() != 1 {
            return Err(format!(
                "{label}: expected one vertex and one fragment stage, got {} and {}",
                vertex.len(),
                fragment.len()
            ));
        }

        let written = io_locations(&vertex[0].module, naga::ShaderStage::Vertex, Direction::Output);
        let read = io_locations(&fragment[0].module, naga::ShaderStage::Fragment, Direction::Input);
        let missing: Vec<String> = read.difference(&written).map(u32::to_string).collect();
        if !missing.is_empty() {
            return Err(format!(
                "{label}: fragment input location(s) {} not written by vertex stage {}",
                missing.join(", "),
                vertex[0].label
            ));
        }

        let linked = LinkedProgram {
            stages: compiled
                .iter()
                .map(|s| (s.stage, s.module.clone()))
                .collect(),
        };
        let id = self.allocate();
        self.programs.insert(id, linked);
        log::debug!("naga: linked program {label} as #{id}");
        Ok(BackendOutput::new(ProgramHandle(id)))
    }

    fn delete_program(&mut self, handle: ProgramHandle) {
        self.programs.remove(&handle.0);
    }
}

fn validate(module: &naga::Module) -> Result<naga::valid::ModuleInfo, String> {
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(module)
    .map_err(|e| format!("validation failed: {e}"))
}

#[derive(Clone, Copy)]
enum Direction {
    Input,
    Output,
}

/// User-defined `location` bindings on the stage's entry point.
fn io_locations(module: &naga::Module, stage: naga::ShaderStage, dir: Direction) -> BTreeSet<u32> {
    let mut locations = BTreeSet::new();
    let Some(entry) = module.entry_points.iter().find(|ep| ep.stage == stage) else {
        return locations;
    };

    match dir {
        Direction::Input => {
            for arg in &entry.function.arguments {
                collect_locations(module, arg.ty, arg.binding.as_ref(), &mut locations);
            }
        }
        Direction::Output => {
            if let Some(result) = &entry.function.result {
                collect_locations(module, result.ty, result.binding.as_ref(), &mut locations);
            }
        }
    }
    locations
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeSet<u32>,
) {
    if let Some(naga::Binding::Location { location, .. }) = binding {
        out.insert(*location);
        return;
    }
    if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
        for member in members {
            collect_locations(module, member.ty, member.binding.as_ref(), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERT: &str = "#version 450
layout(location = 0) in vec3 a_position;
layout(location = 0) out vec3 v_color;
void main() {
    v_color = a_position;
    gl_Position = vec4(a_position, 1.0);
}
";

    const FRAG: &str = "#version 450
layout(location = 0) in vec3 v_color;
layout(location = 0) out vec4 o_color;
void main() {
    o_color = vec4(v_color, 1.0);
}
";

    #[test]
    fn test_compile_and_link() {
        let mut backend = NagaBackend::new();
        let v = backend
            .compile_stage(ShaderStage::Vertex, VERT, "basic.vert")
            .expect("vertex should compile");
        let f = backend
            .compile_stage(ShaderStage::Fragment, FRAG, "basic.frag")
            .expect("fragment should compile");
        let program = backend
            .link_program(&[v.handle, f.handle], "basic:")
            .expect("program should link");

        assert_eq!(backend.live_program_count(), 1);
        backend.delete_stage(v.handle);
        backend.delete_stage(f.handle);
        assert_eq!(backend.live_stage_count(), 0);

        let wgsl = backend
            .program_wgsl(program.handle, ShaderStage::Fragment)
            .expect("wgsl output");
        assert!(wgsl.contains("@fragment"));

        backend.delete_program(program.handle);
        assert_eq!(backend.live_program_count(), 0);
    }

    #[test]
    fn test_syntax_error_reports_log() {
        let mut backend = NagaBackend::new();
        let log = backend
            .compile_stage(
                ShaderStage::Fragment,
                "#version 450\nvoid main() { this is not glsl }\n",
                "broken.frag",
            )
            .expect_err("should fail to compile");
        assert!(!log.is_empty());
        assert_eq!(backend.live_stage_count(), 0);
    }

    #[test]
    fn test_geometry_unsupported() {
        let mut backend = NagaBackend::new();
        let log = backend
            .compile_stage(ShaderStage::Geometry, "#version 450\nvoid main(){}", "g.geom")
            .expect_err("geometry is not supported");
        assert!(log.contains("geometry"));
    }

    #[test]
    fn test_link_rejects_missing_fragment() {
        let mut backend = NagaBackend::new();
        let v = backend
            .compile_stage(ShaderStage::Vertex, VERT, "basic.vert")
            .expect("vertex should compile");
        let log = backend
            .link_program(&[v.handle], "basic:")
            .expect_err("link should fail");
        assert!(log.contains("expected one vertex and one fragment"));
    }

    #[test]
    fn test_link_rejects_second_fragment_stage() {
        let mut backend = NagaBackend::new();
        let v = backend
            .compile_stage(ShaderStage::Vertex, VERT, "basic.vert")
            .expect("vertex should compile");
        let f1 = backend
            .compile_stage(ShaderStage::Fragment, FRAG, "a.frag")
            .expect("fragment should compile");
        let f2 = backend
            .compile_stage(ShaderStage::Fragment, FRAG, "b.frag")
            .expect("fragment should compile");
        let log = backend
            .link_program(&[v.handle, f1.handle, f2.handle], "double:")
            .expect_err("link should fail");
        assert!(log.contains("got 1 and 2"));
        assert_eq!(backend.live_program_count(), 0);
    }

    #[test]
    fn test_link_rejects_unwritten_varying() {
        let frag = "#version 450
layout(location = 3) in vec3 v_other;
layout(location = 0) out vec4 o_color;
void main() {
    o_color = vec4(v_other, 1.0);
}
";
        let mut backend = NagaBackend::new();
        let v = backend
            .compile_stage(ShaderStage::Vertex, VERT, "basic.vert")
            .expect("vertex should compile");
        let f = backend
            .compile_stage(ShaderStage::Fragment, frag, "other.frag")
            .expect("fragment should compile");
        let log = backend
            .link_program(&[v.handle, f.handle], "mismatch:")
            .expect_err("link should fail");
        assert!(log.contains('3'));
    }

    #[test]
    fn test_link_rejects_deleted_stage() {
        let mut backend = NagaBackend::new();
        let v = backend
            .compile_stage(ShaderStage::Vertex, VERT, "basic.vert")
            .expect("vertex should compile");
        backend.delete_stage(v.handle);
        assert!(backend.link_program(&[v.handle], "gone:").is_err());
    }
}
