//! Shader compilation and reflection.
//!
//! Each stage is GLSL 450 with Vulkan-style layout qualifiers. A stage is
//! parsed and validated with naga, then translated to WGSL for the backend.
//! "Linking" merges what both stages declare:
//! - the uniform block (one per program, in descriptor set 0)
//! - sampled 2D textures and the samplers they are read through
//! - the vertex entry point's located inputs
//!
//! Plain (non-block) uniforms are not valid in Vulkan GLSL; uniforms live in
//! a block such as `layout(set = 0, binding = 0) uniform Globals { ... };`.
//! Block members WGSL cannot lay out are lowered first (see `lowering`), and
//! the emitted WGSL is parsed and validated again before it reaches wgpu.

use std::collections::BTreeMap;

use super::error::{PipelineError, ShaderStage};
use super::lowering::{prepare_stage, LoweredMember};

/// Scalar type of a reflected uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScalarType {
    Float,
    Int,
    Uint,
    /// Stored as a 32-bit `uint`; nonzero is true.
    Bool,
}

/// Shape of one element of a reflected uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Shape {
    Scalar,
    Vector(u8),
    Matrix { columns: u8, rows: u8 },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformType {
    pub scalar: ScalarType,
    pub shape: Shape,
}

impl UniformType {
    /// Scalar components of one element.
    pub fn components(&self) -> usize {
        match self.shape {
            Shape::Scalar => 1,
            Shape::Vector(n) => n as usize,
            Shape::Matrix { columns, rows } => columns as usize * rows as usize,
        }
    }

    /// Byte distance between matrix columns. Every column takes a `vec4`
    /// slot, two-row ones included once lowered.
    pub fn column_stride(&self) -> u32 {
        16
    }
}

/// Element count and byte stride of an array uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ArrayLayout {
    pub len: u32,
    pub stride: u32,
}

/// One member of the uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub ty: UniformType,
    pub offset: u32,
    pub array: Option<ArrayLayout>,
}

/// The program's uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub binding: u32,
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    pub fn member(&self, name: &str) -> Option<&UniformMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A sampled 2D texture and the sampler it is read through.
///
/// The texture's name doubles as the sampler uniform holding its unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub name: String,
    pub texture_binding: u32,
    pub sampler_binding: u32,
}

/// A located vertex shader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexInput {
    pub name: String,
    pub location: u32,
    pub components: u32,
}

/// Everything the pipeline needs to know about a linked program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reflection {
    pub uniform_block: Option<UniformBlock>,
    pub textures: Vec<TextureSlot>,
    pub vertex_inputs: Vec<VertexInput>,
}

impl Reflection {
    pub fn vertex_input(&self, name: &str) -> Option<&VertexInput> {
        self.vertex_inputs.iter().find(|v| v.name == name)
    }
}

/// A compiled and linked program, ready for the backend.
///
/// `offscreen_vertex_wgsl` is the vertex stage with clip-space `y` negated.
/// Drawing offscreen through it stores rows bottom-up, so a target samples
/// the way a GL framebuffer texture does. The flip also reverses winding.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub label: String,
    pub vertex_wgsl: String,
    pub offscreen_vertex_wgsl: String,
    pub fragment_wgsl: String,
    pub reflection: Reflection,
}

/// Strips a trailing `[N]` from a uniform name (`weights[0]` → `weights`).
pub fn strip_array_suffix(name: &str) -> &str {
    if let Some(open) = name.rfind('[')
        && name.ends_with(']')
        && name[open + 1..name.len() - 1].bytes().all(|b| b.is_ascii_digit())
    {
        return &name[..open];
    }
    name
}

/// Compiles both stages and links them into a program.
pub fn compile_program(
    pass: &str,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<CompiledProgram, PipelineError> {
    let prepare = |stage: ShaderStage, source: &str, flip_y: bool| {
        prepare_stage(source, flip_y).map_err(|log| PipelineError::ShaderCompile {
            pass: pass.to_string(),
            stage,
            log,
        })
    };
    let vertex_stage = prepare(ShaderStage::Vertex, vertex_source, false)?;
    let offscreen_stage = prepare(ShaderStage::Vertex, vertex_source, true)?;
    let fragment_stage = prepare(ShaderStage::Fragment, fragment_source, false)?;

    let (vertex, vertex_wgsl) = compile_stage(pass, ShaderStage::Vertex, &vertex_stage.source)?;
    let (fragment, fragment_wgsl) =
        compile_stage(pass, ShaderStage::Fragment, &fragment_stage.source)?;
    let (_, offscreen_vertex_wgsl) =
        compile_stage(pass, ShaderStage::Vertex, &offscreen_stage.source)?;

    let lowered: BTreeMap<String, LoweredMember> = vertex_stage
        .lowered
        .into_iter()
        .chain(fragment_stage.lowered)
        .map(|m| (m.storage_name(), m))
        .collect();

    let reflection = link(pass, &vertex, &fragment, &lowered)?;
    log::debug!(
        "pass '{pass}': linked program ({} uniforms, {} textures, {} vertex inputs)",
        reflection.uniform_block.as_ref().map_or(0, |b| b.members.len()),
        reflection.textures.len(),
        reflection.vertex_inputs.len(),
    );

    Ok(CompiledProgram {
        label: pass.to_string(),
        vertex_wgsl,
        offscreen_vertex_wgsl,
        fragment_wgsl,
        reflection,
    })
}

fn compile_stage(
    pass: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<(naga::Module, String), PipelineError> {
    let compile_error = |log: String| PipelineError::ShaderCompile {
        pass: pass.to_string(),
        stage,
        log,
    };

    let options = naga::front::glsl::Options {
        stage: match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        },
        defines: Default::default(),
    };

    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| compile_error(errors.to_string()))?;

    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| compile_error(format!("validation error: {e}")))?;

    let wgsl = naga::back::wgsl::write_string(&module, &info, naga::back::wgsl::WriterFlags::empty())
        .map_err(|e| compile_error(format!("translation error: {e}")))?;

    // wgpu parses and validates the WGSL again under its own layout rules.
    let reparsed = naga::front::wgsl::parse_str(&wgsl)
        .map_err(|e| compile_error(format!("translation error: {}", e.emit_to_string(&wgsl))))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&reparsed)
    .map_err(|e| compile_error(format!("translation error: emitted WGSL is invalid: {e}")))?;

    Ok((module, wgsl))
}

// ── linking ───────────────────────────────────────────────────────────────

fn link(
    pass: &str,
    vertex: &naga::Module,
    fragment: &naga::Module,
    lowered: &BTreeMap<String, LoweredMember>,
) -> Result<Reflection, PipelineError> {
    let link_error = |log: String| PipelineError::ShaderLink {
        pass: pass.to_string(),
        log,
    };

    let mut blocks: BTreeMap<u32, UniformBlock> = BTreeMap::new();
    let mut images: BTreeMap<String, u32> = BTreeMap::new();
    let mut samplers: BTreeMap<String, u32> = BTreeMap::new();

    for module in [vertex, fragment] {
        for (_, global) in module.global_variables.iter() {
            let Some(binding) = &global.binding else {
                continue;
            };
            if binding.group != 0 {
                return Err(link_error(format!(
                    "resource at set {} binding {}: only set 0 is supported",
                    binding.group, binding.binding
                )));
            }
            let name = global.name.clone().unwrap_or_default();

            match global.space {
                naga::AddressSpace::Uniform => {
                    let block = reflect_block(module, global.ty, &name, binding.binding, lowered)
                        .map_err(&link_error)?;
                    match blocks.get_mut(&binding.binding) {
                        Some(existing) => merge_block(existing, block).map_err(&link_error)?,
                        None => {
                            blocks.insert(binding.binding, block);
                        }
                    }
                }
                naga::AddressSpace::Handle => match &module.types[global.ty].inner {
                    naga::TypeInner::Image {
                        dim: naga::ImageDimension::D2,
                        arrayed: false,
                        class:
                            naga::ImageClass::Sampled {
                                kind: naga::ScalarKind::Float,
                                multi: false,
                            },
                    } => {
                        insert_resource(&mut images, name, binding.binding).map_err(&link_error)?;
                    }
                    naga::TypeInner::Sampler { comparison: false } => {
                        insert_resource(&mut samplers, name, binding.binding)
                            .map_err(&link_error)?;
                    }
                    other => {
                        return Err(link_error(format!(
                            "unsupported resource '{name}' ({other:?}); only texture2D and sampler are supported"
                        )));
                    }
                },
                other => {
                    return Err(link_error(format!(
                        "unsupported resource '{name}' in address space {other:?}"
                    )));
                }
            }
        }
    }

    if blocks.len() > 1 {
        let bindings: Vec<_> = blocks.keys().collect();
        return Err(link_error(format!(
            "a program supports one uniform block, found bindings {bindings:?}"
        )));
    }
    let uniform_block = blocks.into_values().next();

    let mut used: BTreeMap<u32, String> = BTreeMap::new();
    if let Some(block) = &uniform_block {
        used.insert(block.binding, "uniform block".to_string());
    }
    for (name, binding) in images.iter().chain(samplers.iter()) {
        if let Some(other) = used.insert(*binding, name.clone()) {
            return Err(link_error(format!(
                "'{name}' and '{other}' share binding {binding}"
            )));
        }
    }

    let textures = images
        .iter()
        .map(|(name, binding)| {
            pair_sampler(name, *binding, &samplers)
                .map(|sampler_binding| TextureSlot {
                    name: name.clone(),
                    texture_binding: *binding,
                    sampler_binding,
                })
                .ok_or_else(|| link_error(format!("texture '{name}' has no sampler")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let vertex_inputs = reflect_vertex_inputs(vertex).map_err(&link_error)?;

    Ok(Reflection {
        uniform_block,
        textures,
        vertex_inputs,
    })
}

fn insert_resource(set: &mut BTreeMap<String, u32>, name: String, binding: u32) -> Result<(), String> {
    match set.get(&name) {
        Some(existing) if *existing != binding => Err(format!(
            "'{name}' is bound at {existing} in one stage and {binding} in the other"
        )),
        _ => {
            set.insert(name, binding);
            Ok(())
        }
    }
}

/// `<name>_sampler` wins, then the sampler right after the texture, then a lone sampler.
fn pair_sampler(texture: &str, binding: u32, samplers: &BTreeMap<String, u32>) -> Option<u32> {
    if let Some(b) = samplers.get(&format!("{texture}_sampler")) {
        return Some(*b);
    }
    if let Some(b) = samplers.values().find(|b| **b == binding + 1) {
        return Some(*b);
    }
    if samplers.len() == 1 {
        return samplers.values().next().copied();
    }
    None
}

fn reflect_block(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    name: &str,
    binding: u32,
    lowered: &BTreeMap<String, LoweredMember>,
) -> Result<UniformBlock, String> {
    let inner = &module.types[ty].inner;
    let (members, size) = match inner {
        naga::TypeInner::Struct { members, span } => {
            let members = members
                .iter()
                .map(|m| {
                    let member_name = m.name.as_deref().unwrap_or_default();
                    match lowered.get(member_name) {
                        Some(logical) => Ok(UniformMember {
                            name: logical.name.clone(),
                            ty: logical.ty,
                            offset: m.offset,
                            array: logical.array,
                        }),
                        None => reflect_member(module, m.ty, member_name, m.offset),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            (members, *span)
        }
        _ => {
            let member = reflect_member(module, ty, name, 0)?;
            (vec![member], inner.size(module.to_ctx()))
        }
    };

    Ok(UniformBlock {
        binding,
        size,
        members,
    })
}

fn reflect_member(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    name: &str,
    offset: u32,
) -> Result<UniformMember, String> {
    let name = strip_array_suffix(name).to_string();

    let (ty, array) = match &module.types[ty].inner {
        naga::TypeInner::Array {
            base,
            size: naga::ArraySize::Constant(len),
            stride,
        } => {
            let element = element_type(&module.types[*base].inner)
                .ok_or_else(|| format!("uniform '{name}' has an unsupported element type"))?;
            (
                element,
                Some(ArrayLayout {
                    len: len.get(),
                    stride: *stride,
                }),
            )
        }
        other => (
            element_type(other).ok_or_else(|| format!("uniform '{name}' has an unsupported type"))?,
            None,
        ),
    };

    Ok(UniformMember {
        name,
        ty,
        offset,
        array,
    })
}

fn element_type(inner: &naga::TypeInner) -> Option<UniformType> {
    let (scalar, shape) = match inner {
        naga::TypeInner::Scalar(s) => (*s, Shape::Scalar),
        naga::TypeInner::Vector { size, scalar } => (*scalar, Shape::Vector(*size as u8)),
        naga::TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => (
            *scalar,
            Shape::Matrix {
                columns: *columns as u8,
                rows: *rows as u8,
            },
        ),
        _ => return None,
    };

    let scalar = match scalar.kind {
        naga::ScalarKind::Float => ScalarType::Float,
        naga::ScalarKind::Sint => ScalarType::Int,
        naga::ScalarKind::Uint => ScalarType::Uint,
        naga::ScalarKind::Bool => ScalarType::Bool,
        _ => return None,
    };

    Some(UniformType { scalar, shape })
}

fn merge_block(existing: &mut UniformBlock, incoming: UniformBlock) -> Result<(), String> {
    for member in incoming.members {
        match existing.member(&member.name) {
            Some(known) if *known != member => {
                return Err(format!(
                    "uniform '{}' is declared differently by the two stages (offset {} vs {})",
                    member.name, known.offset, member.offset
                ));
            }
            Some(_) => {}
            None => existing.members.push(member),
        }
    }
    existing.size = existing.size.max(incoming.size);
    Ok(())
}

fn reflect_vertex_inputs(module: &naga::Module) -> Result<Vec<VertexInput>, String> {
    let Some(entry) = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga::ShaderStage::Vertex)
    else {
        return Err("vertex shader has no entry point".to_string());
    };

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        let Some(naga::Binding::Location { location, .. }) = arg.binding else {
            continue;
        };
        let Some(name) = arg.name.clone() else {
            log::debug!("vertex input at location {location} has no name; skipped");
            continue;
        };

        let components = match &module.types[arg.ty].inner {
            naga::TypeInner::Scalar(s) if s.kind == naga::ScalarKind::Float => 1,
            naga::TypeInner::Vector { size, scalar } if scalar.kind == naga::ScalarKind::Float => {
                *size as u32
            }
            other => {
                return Err(format!(
                    "vertex input '{name}' has type {other:?}; only float scalars and vectors are supported"
                ));
            }
        };

        inputs.push(VertexInput {
            name,
            location,
            components,
        });
    }
    inputs.sort_by_key(|v| v.location);
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};

    const TEXTURED_FS: &str = r#"#version 450
layout(location = 0) in vec2 vtex;
layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform Params {
    mat4 rot;
    mat3 tint;
    float weights[4];
    int mode;
};
layout(set = 0, binding = 1) uniform texture2D photo;
layout(set = 0, binding = 2) uniform sampler photo_sampler;

void main() {
    vec2 uv = (rot * vec4(vtex, 0.0, 1.0)).xy;
    vec3 c = tint * texture(sampler2D(photo, photo_sampler), uv).rgb;
    frag_color = vec4(c * weights[mode], 1.0);
}
"#;

    /// Every uniform kind that needs lowering, shared by both stages.
    const KINDS_VS: &str = r#"#version 450
layout(location = 0) in vec2 position;
layout(set = 0, binding = 0) uniform Params {
    bool enabled;
    float scale;
    int modes[3];
    float weights[3];
    mat2 rot;
    vec2 offsets[2];
    bvec2 mask;
};
void main() {
    vec2 p = rot * position * scale + offsets[modes[0]];
    gl_Position = vec4(enabled ? p : vec2(0.0), 0.0, 1.0);
}
"#;

    const KINDS_FS: &str = r#"#version 450
layout(location = 0) out vec4 frag_color;
layout(set = 0, binding = 0) uniform Params {
    bool enabled;
    float scale;
    int modes[3];
    float weights[3];
    mat2 rot;
    vec2 offsets[2];
    bvec2 mask;
};
void main() {
    float w = weights[0] + weights[1] + weights[2];
    frag_color = vec4(rot[0], mask.x ? w : 0.0, enabled ? 1.0 : 0.5);
}
"#;

    fn default_program() -> CompiledProgram {
        compile_program("default", DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER).unwrap()
    }

    // ── names ─────────────────────────────────────────────────────────────

    #[test]
    fn array_suffix_is_stripped() {
        assert_eq!(strip_array_suffix("weights[0]"), "weights");
        assert_eq!(strip_array_suffix("weights[12]"), "weights");
        assert_eq!(strip_array_suffix("weights"), "weights");
        assert_eq!(strip_array_suffix("odd[x]"), "odd[x]");
    }

    // ── reflection ────────────────────────────────────────────────────────

    #[test]
    fn default_program_reflects_reserved_uniforms() {
        let program = default_program();
        let block = program.reflection.uniform_block.as_ref().unwrap();

        let resolution = block.member("resolution").unwrap();
        assert_eq!(resolution.offset, 0);
        assert_eq!(resolution.ty.shape, Shape::Vector(2));

        assert_eq!(block.member("mouse").unwrap().offset, 8);

        let time = block.member("time").unwrap();
        assert_eq!(time.offset, 16);
        assert_eq!(time.ty.scalar, ScalarType::Float);
        assert!(block.size >= 20);
    }

    #[test]
    fn default_program_reflects_vertex_inputs() {
        let program = default_program();
        let inputs = &program.reflection.vertex_inputs;
        assert_eq!(inputs.len(), 3);
        assert_eq!(program.reflection.vertex_input("position").unwrap().components, 2);
        assert_eq!(program.reflection.vertex_input("texcoord").unwrap().location, 1);
        assert_eq!(program.reflection.vertex_input("color").unwrap().components, 3);
        assert!(!program.vertex_wgsl.is_empty());
    }

    #[test]
    fn textures_pair_with_named_samplers() {
        let program = compile_program("textured", DEFAULT_VERTEX_SHADER, TEXTURED_FS).unwrap();
        assert_eq!(
            program.reflection.textures,
            vec![TextureSlot {
                name: "photo".to_string(),
                texture_binding: 1,
                sampler_binding: 2,
            }]
        );
    }

    #[test]
    fn matrices_and_arrays_follow_block_layout() {
        let program = compile_program("textured", DEFAULT_VERTEX_SHADER, TEXTURED_FS).unwrap();
        let block = program.reflection.uniform_block.unwrap();

        let rot = block.member("rot").unwrap();
        assert_eq!(rot.ty.shape, Shape::Matrix { columns: 4, rows: 4 });
        assert_eq!(rot.ty.components(), 16);
        let tint = block.member("tint").unwrap();
        assert_eq!(tint.ty.column_stride(), 16);
        assert!(tint.offset >= 64);

        let weights = block.member("weights").unwrap();
        assert_eq!(weights.array, Some(ArrayLayout { len: 4, stride: 16 }));
        assert_eq!(weights.ty.scalar, ScalarType::Float);

        assert_eq!(block.member("mode").unwrap().ty.scalar, ScalarType::Int);
    }

    // ── offscreen variant ─────────────────────────────────────────────────

    #[test]
    fn offscreen_vertex_stage_compiles_separately() {
        let program = default_program();
        assert_ne!(program.offscreen_vertex_wgsl, program.vertex_wgsl);
        assert!(program.offscreen_vertex_wgsl.contains("glint_user_main"));
    }

    // ── lowered members ───────────────────────────────────────────────────

    #[test]
    fn lowered_members_reflect_their_declared_types() {
        let program = compile_program("kinds", KINDS_VS, KINDS_FS).unwrap();
        let block = program.reflection.uniform_block.unwrap();

        let enabled = block.member("enabled").unwrap();
        assert_eq!(enabled.ty.scalar, ScalarType::Bool);
        assert_eq!(enabled.array, None);

        let modes = block.member("modes").unwrap();
        assert_eq!(modes.ty.scalar, ScalarType::Int);
        assert_eq!(modes.array, Some(ArrayLayout { len: 3, stride: 16 }));

        let rot = block.member("rot").unwrap();
        assert_eq!(rot.ty.shape, Shape::Matrix { columns: 2, rows: 2 });
        assert_eq!(rot.offset % 16, 0);

        let offsets = block.member("offsets").unwrap();
        assert_eq!(offsets.ty.shape, Shape::Vector(2));
        assert_eq!(offsets.array, Some(ArrayLayout { len: 2, stride: 16 }));

        assert!(block.member("glint_rot").is_none());
        assert_eq!(block.member("scale").unwrap().ty.scalar, ScalarType::Float);
    }

    #[test]
    fn emitted_wgsl_passes_naga_validation() {
        let programs = [
            default_program(),
            compile_program("textured", DEFAULT_VERTEX_SHADER, TEXTURED_FS).unwrap(),
            compile_program("kinds", KINDS_VS, KINDS_FS).unwrap(),
        ];
        for program in &programs {
            for wgsl in [
                &program.vertex_wgsl,
                &program.offscreen_vertex_wgsl,
                &program.fragment_wgsl,
            ] {
                let module = naga::front::wgsl::parse_str(wgsl)
                    .unwrap_or_else(|e| panic!("{}: {}", program.label, e.emit_to_string(wgsl)));
                naga::valid::Validator::new(
                    naga::valid::ValidationFlags::all(),
                    naga::valid::Capabilities::default(),
                )
                .validate(&module)
                .unwrap_or_else(|e| panic!("{}: {e:?}\n{wgsl}", program.label));
            }
        }
    }

    #[test]
    fn lowering_errors_name_the_stage() {
        let fs = "#version 450\nlayout(location = 0) out vec4 c;\n\
                  layout(set = 0, binding = 0) uniform G { bool on; } g;\n\
                  void main() { c = vec4(g.on ? 1.0 : 0.0); }\n";
        let err = compile_program("named", DEFAULT_VERTEX_SHADER, fs).unwrap_err();
        assert_eq!(err.stage(), Some(ShaderStage::Fragment));
    }

    // ── errors ────────────────────────────────────────────────────────────

    #[test]
    fn compile_errors_name_the_stage() {
        let broken = "#version 450\nvoid main() { undefined_call(); }\n";
        let err = compile_program("broken", DEFAULT_VERTEX_SHADER, broken).unwrap_err();
        assert_eq!(err.stage(), Some(ShaderStage::Fragment));
        assert!(matches!(err, PipelineError::ShaderCompile { ref pass, .. } if pass == "broken"));

        let err = compile_program("broken", broken, DEFAULT_FRAGMENT_SHADER).unwrap_err();
        assert_eq!(err.stage(), Some(ShaderStage::Vertex));
    }

    #[test]
    fn conflicting_block_layouts_fail_to_link() {
        let vs = r#"#version 450
layout(location = 0) in vec2 position;
layout(set = 0, binding = 0) uniform Globals {
    float scale;
    float time;
};
void main() {
    gl_Position = vec4(position * scale * time, 0.0, 1.0);
}
"#;
        let err = compile_program("conflict", vs, DEFAULT_FRAGMENT_SHADER).unwrap_err();
        assert!(matches!(err, PipelineError::ShaderLink { .. }));
    }
}
