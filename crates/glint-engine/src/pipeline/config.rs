//! Declarative pass configuration.
//!
//! A [`PassConfig`] is partial: every field is optional. Before a pass is
//! provisioned it goes through two explicit steps:
//!
//! 1. [`PassConfig::with_defaults`] fills the fields the caller left empty
//!    from a template and never touches the ones the caller set. Applying it
//!    twice yields the same configuration.
//! 2. [`PassConfig::build`] turns the filled configuration into an immutable
//!    [`PassDesc`].
//!
//! Programs are a two-level tree: [`ProgramDesc`] owns one main pass and a
//! flat chain of dependent passes. Deeper nesting is rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use super::error::PipelineError;
use super::panel::PanelSpec;
use super::pass::PassState;
use super::texture::TextureConfig;
use super::uniform::{UniformSet, UniformValue};

/// Reserved attribute name holding 16-bit element indices.
pub const INDICES: &str = "indices";

/// Attribute whose length determines the vertex count of non-indexed draws.
pub const POSITION: &str = "position";

/// Passthrough vertex shader used when a pass supplies none.
pub const DEFAULT_VERTEX_SHADER: &str = r#"#version 450
layout(location = 0) in vec2 position;
layout(location = 1) in vec2 texcoord;
layout(location = 2) in vec3 color;

layout(location = 0) out vec2 vtex;
layout(location = 1) out vec3 vcolor;

void main() {
    vcolor = color;
    vtex = texcoord;
    gl_Position = vec4(position, 0.0, 1.0);
}
"#;

/// Animated gradient fragment shader used when a pass supplies none.
pub const DEFAULT_FRAGMENT_SHADER: &str = r#"#version 450
layout(location = 0) in vec2 vtex;
layout(location = 1) in vec3 vcolor;

layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform Globals {
    vec2 resolution;
    vec2 mouse;
    float time;
};

void main() {
    vec2 uv = (2.0 * gl_FragCoord.xy - resolution) / resolution.y;
    vec3 c = uv.xyx * cos(time + vec3(0.0, 1.0, 3.0)) * 0.5 + 0.5;
    frag_color = vec4(c, 1.0);
}
"#;

/// Callback invoked with the pass state (once at setup, or once per frame before draw).
pub type PassCallback = Rc<dyn Fn(&mut PassState)>;

// ── draw mode ─────────────────────────────────────────────────────────────

/// Primitive topology.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    #[default]
    TriangleStrip,
}

impl DrawMode {
    pub fn name(self) -> &'static str {
        match self {
            DrawMode::Points => "POINTS",
            DrawMode::Lines => "LINES",
            DrawMode::LineStrip => "LINE_STRIP",
            DrawMode::Triangles => "TRIANGLES",
            DrawMode::TriangleStrip => "TRIANGLE_STRIP",
        }
    }

    pub fn is_strip(self) -> bool {
        matches!(self, DrawMode::LineStrip | DrawMode::TriangleStrip)
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DrawMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POINTS" => Ok(DrawMode::Points),
            "LINES" => Ok(DrawMode::Lines),
            "LINE_STRIP" => Ok(DrawMode::LineStrip),
            "TRIANGLES" => Ok(DrawMode::Triangles),
            "TRIANGLE_STRIP" => Ok(DrawMode::TriangleStrip),
            _ => Err(PipelineError::UnsupportedDrawMode(s.to_string())),
        }
    }
}

// ── attributes ────────────────────────────────────────────────────────────

/// Source of an attribute's data.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// Flat `f32` data uploaded into a buffer of its own.
    Values(Vec<f32>),
    /// Name of another attribute whose buffer is shared.
    Shared(String),
}

/// One named vertex attribute.
///
/// `stride` and `offset` count `f32` elements; a zero stride means tightly packed.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeConfig {
    pub components: u32,
    pub data: AttributeData,
    pub stride: u32,
    pub offset: u32,
}

impl AttributeConfig {
    pub fn new(components: u32, data: impl Into<Vec<f32>>) -> Self {
        Self {
            components,
            data: AttributeData::Values(data.into()),
            stride: 0,
            offset: 0,
        }
    }

    /// Attribute reading from the buffer of attribute `source`.
    pub fn shared(components: u32, source: impl Into<String>) -> Self {
        Self {
            components,
            data: AttributeData::Shared(source.into()),
            stride: 0,
            offset: 0,
        }
    }

    /// The reserved `indices` attribute.
    pub fn indices(indices: impl IntoIterator<Item = u16>) -> Self {
        Self::new(1, indices.into_iter().map(f32::from).collect::<Vec<_>>())
    }

    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Elements per vertex: the stride, or the component count when tightly packed.
    pub fn step(&self) -> u32 {
        if self.stride > 0 { self.stride } else { self.components }
    }

    pub fn values(&self) -> Option<&[f32]> {
        match &self.data {
            AttributeData::Values(v) => Some(v),
            AttributeData::Shared(_) => None,
        }
    }
}

/// Full-screen quad drawn as a triangle strip.
pub fn default_attributes() -> BTreeMap<String, AttributeConfig> {
    let mut arrays = BTreeMap::new();
    arrays.insert(
        POSITION.to_string(),
        AttributeConfig::new(2, [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0]),
    );
    arrays.insert(
        "texcoord".to_string(),
        AttributeConfig::new(2, [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]),
    );
    arrays.insert(
        "color".to_string(),
        AttributeConfig::new(3, [0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]),
    );
    arrays
}

// ── targets ───────────────────────────────────────────────────────────────

/// Offscreen destinations of a pass.
///
/// `Resolve` always comes with a texture target: the multisampled buffer is
/// resolved into it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum TargetKind {
    #[default]
    None,
    Texture,
    Resolve,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetConfig {
    pub kind: TargetKind,
    /// Sampler uniform pre-bound to the texture target's unit at setup.
    pub texture_uniform: Option<String>,
}

impl TargetConfig {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn texture() -> Self {
        Self {
            kind: TargetKind::Texture,
            texture_uniform: None,
        }
    }

    pub fn resolve() -> Self {
        Self {
            kind: TargetKind::Resolve,
            texture_uniform: None,
        }
    }

    pub fn sampled_as(mut self, uniform: impl Into<String>) -> Self {
        self.texture_uniform = Some(uniform.into());
        self
    }

    pub fn has_texture(&self) -> bool {
        self.kind != TargetKind::None
    }
}

// ── pass config ───────────────────────────────────────────────────────────

/// Role a pass plays inside a program; selects the default template.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassRole {
    Program,
    Chained,
}

/// Partial, caller-supplied description of a pass.
#[derive(Clone, Default)]
pub struct PassConfig {
    pub name: Option<String>,
    pub attributes: Option<BTreeMap<String, AttributeConfig>>,
    pub uniforms: Option<UniformSet>,
    pub vertex_shader: Option<String>,
    pub fragment_shader: Option<String>,
    pub draw_mode: Option<DrawMode>,
    pub textures: Option<Vec<TextureConfig>>,
    pub target: Option<TargetConfig>,
    /// Sampler names of earlier passes' texture targets this pass reads.
    pub sampled_targets: Option<Vec<String>>,
    pub chain: Option<Vec<PassConfig>>,
    pub clear: Option<bool>,
    pub clear_color: Option<[f32; 4]>,
    pub enabled: Option<bool>,
    pub setup: Option<PassCallback>,
    pub on_frame: Option<PassCallback>,
    pub panel: Option<PanelSpec>,
}

impl PassConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template filled into programs and chained passes.
    ///
    /// Chained passes do not clear by default so they composite over the
    /// program's output.
    pub fn defaults(role: PassRole) -> Self {
        let noop: PassCallback = Rc::new(|_: &mut PassState| {});
        Self {
            name: None,
            attributes: Some(default_attributes()),
            uniforms: Some(UniformSet::reserved()),
            vertex_shader: Some(DEFAULT_VERTEX_SHADER.to_string()),
            fragment_shader: Some(DEFAULT_FRAGMENT_SHADER.to_string()),
            draw_mode: Some(DrawMode::TriangleStrip),
            textures: Some(Vec::new()),
            target: Some(TargetConfig::none()),
            sampled_targets: Some(Vec::new()),
            chain: Some(Vec::new()),
            clear: Some(role == PassRole::Program),
            clear_color: Some([0.0, 0.0, 0.0, 0.0]),
            enabled: Some(true),
            setup: Some(noop.clone()),
            on_frame: Some(noop),
            panel: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an attribute. The first call replaces the default quad entirely.
    pub fn attribute(mut self, name: impl Into<String>, attribute: AttributeConfig) -> Self {
        self.attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), attribute);
        self
    }

    /// Adds a uniform. The first call replaces the default uniform set; the
    /// reserved uniforms are written by the controller regardless.
    pub fn uniform(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.uniforms
            .get_or_insert_with(UniformSet::new)
            .set(name, value);
        self
    }

    pub fn vertex_shader(mut self, source: impl Into<String>) -> Self {
        self.vertex_shader = Some(source.into());
        self
    }

    pub fn fragment_shader(mut self, source: impl Into<String>) -> Self {
        self.fragment_shader = Some(source.into());
        self
    }

    pub fn draw_mode(mut self, mode: DrawMode) -> Self {
        self.draw_mode = Some(mode);
        self
    }

    pub fn texture(mut self, texture: TextureConfig) -> Self {
        self.textures.get_or_insert_with(Vec::new).push(texture);
        self
    }

    pub fn target(mut self, target: TargetConfig) -> Self {
        self.target = Some(target);
        self
    }

    /// Reads the texture target an earlier pass exposes as `uniform`; the
    /// uniform of the same name in this pass is set to its unit.
    pub fn sample_target(mut self, uniform: impl Into<String>) -> Self {
        self.sampled_targets.get_or_insert_with(Vec::new).push(uniform.into());
        self
    }

    pub fn chain_pass(mut self, pass: PassConfig) -> Self {
        self.chain.get_or_insert_with(Vec::new).push(pass);
        self
    }

    pub fn clear(mut self, clear: bool) -> Self {
        self.clear = Some(clear);
        self
    }

    pub fn clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = Some(color);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn on_setup(mut self, f: impl Fn(&mut PassState) + 'static) -> Self {
        self.setup = Some(Rc::new(f));
        self
    }

    pub fn on_frame(mut self, f: impl Fn(&mut PassState) + 'static) -> Self {
        self.on_frame = Some(Rc::new(f));
        self
    }

    pub fn panel(mut self, panel: PanelSpec) -> Self {
        self.panel = Some(panel);
        self
    }

    /// Fills every field left empty by the caller from `template`.
    ///
    /// Fields the caller set are never overwritten, which also makes the
    /// operation idempotent.
    pub fn with_defaults(mut self, template: &PassConfig) -> Self {
        fn fill<T: Clone>(slot: &mut Option<T>, template: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(template);
            }
        }

        fill(&mut self.name, &template.name);
        fill(&mut self.attributes, &template.attributes);
        fill(&mut self.uniforms, &template.uniforms);
        fill(&mut self.vertex_shader, &template.vertex_shader);
        fill(&mut self.fragment_shader, &template.fragment_shader);
        fill(&mut self.draw_mode, &template.draw_mode);
        fill(&mut self.textures, &template.textures);
        fill(&mut self.target, &template.target);
        fill(&mut self.sampled_targets, &template.sampled_targets);
        fill(&mut self.chain, &template.chain);
        fill(&mut self.clear, &template.clear);
        fill(&mut self.clear_color, &template.clear_color);
        fill(&mut self.enabled, &template.enabled);
        fill(&mut self.setup, &template.setup);
        fill(&mut self.on_frame, &template.on_frame);
        fill(&mut self.panel, &template.panel);
        self
    }

    /// Produces the immutable description of a single pass.
    ///
    /// Fields still empty fall back to the built-in defaults for `role`; the
    /// chain is not part of a pass description (see [`ProgramDesc`]).
    pub fn build(self, role: PassRole, fallback_name: &str) -> Result<PassDesc, PipelineError> {
        let PassConfig {
            name,
            attributes,
            uniforms,
            vertex_shader,
            fragment_shader,
            draw_mode,
            textures,
            target,
            sampled_targets,
            chain: _,
            clear,
            clear_color,
            enabled,
            setup,
            on_frame,
            panel,
        } = self.with_defaults(&PassConfig::defaults(role));

        let name = name.unwrap_or_else(|| fallback_name.to_string());
        let attributes = attributes.unwrap_or_default();

        for (attr_name, attr) in &attributes {
            if attr_name != INDICES && !(1..=4).contains(&attr.components) {
                return Err(PipelineError::InvalidConfig {
                    pass: name,
                    reason: format!(
                        "attribute '{attr_name}' has {} components (expected 1 to 4)",
                        attr.components
                    ),
                });
            }
        }

        let noop = || -> PassCallback { Rc::new(|_: &mut PassState| {}) };

        Ok(PassDesc {
            name,
            attributes,
            uniforms: uniforms.unwrap_or_default(),
            vertex_shader: vertex_shader.unwrap_or_else(|| DEFAULT_VERTEX_SHADER.to_string()),
            fragment_shader: fragment_shader
                .unwrap_or_else(|| DEFAULT_FRAGMENT_SHADER.to_string()),
            draw_mode: draw_mode.unwrap_or_default(),
            textures: textures.unwrap_or_default(),
            target: target.unwrap_or_default(),
            sampled_targets: sampled_targets.unwrap_or_default(),
            clear: clear.unwrap_or(role == PassRole::Program),
            clear_color: clear_color.unwrap_or([0.0; 4]),
            enabled: enabled.unwrap_or(true),
            setup: setup.unwrap_or_else(noop),
            on_frame: on_frame.unwrap_or_else(noop),
            panel,
        })
    }
}

impl fmt::Debug for PassConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassConfig")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("uniforms", &self.uniforms)
            .field("vertex_shader", &self.vertex_shader.as_ref().map(String::len))
            .field("fragment_shader", &self.fragment_shader.as_ref().map(String::len))
            .field("draw_mode", &self.draw_mode)
            .field("textures", &self.textures)
            .field("target", &self.target)
            .field("sampled_targets", &self.sampled_targets)
            .field("chain", &self.chain)
            .field("clear", &self.clear)
            .field("clear_color", &self.clear_color)
            .field("enabled", &self.enabled)
            .field("setup", &self.setup.is_some())
            .field("on_frame", &self.on_frame.is_some())
            .field("panel", &self.panel)
            .finish()
    }
}

/// Complete, immutable description of one pass.
#[derive(Clone)]
pub struct PassDesc {
    pub name: String,
    pub attributes: BTreeMap<String, AttributeConfig>,
    pub uniforms: UniformSet,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub draw_mode: DrawMode,
    pub textures: Vec<TextureConfig>,
    pub target: TargetConfig,
    pub sampled_targets: Vec<String>,
    pub clear: bool,
    pub clear_color: [f32; 4],
    pub enabled: bool,
    pub setup: PassCallback,
    pub on_frame: PassCallback,
    pub panel: Option<PanelSpec>,
}

impl fmt::Debug for PassDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassDesc")
            .field("name", &self.name)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("draw_mode", &self.draw_mode)
            .field("target", &self.target)
            .field("clear", &self.clear)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// A switchable program: a main pass followed by its chain.
#[derive(Debug, Clone)]
pub struct ProgramDesc {
    pub main: PassDesc,
    pub chain: Vec<PassDesc>,
}

impl ProgramDesc {
    /// Builds the two-level program tree from a top-level configuration.
    pub fn build(config: PassConfig, index: usize) -> Result<Self, PipelineError> {
        let mut config = config.with_defaults(&PassConfig::defaults(PassRole::Program));
        let chain = config.chain.take().unwrap_or_default();
        let main = config.build(PassRole::Program, &format!("program {index}"))?;

        let chain = chain
            .into_iter()
            .enumerate()
            .map(|(i, pass)| {
                let fallback = format!("{}/chain {i}", main.name);
                if pass.chain.as_ref().is_some_and(|c| !c.is_empty()) {
                    return Err(PipelineError::NestedChain {
                        pass: pass.name.clone().unwrap_or(fallback),
                    });
                }
                pass.build(PassRole::Chained, &fallback)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { main, chain })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial() -> PassConfig {
        PassConfig::new()
            .name("partial")
            .attribute(POSITION, AttributeConfig::new(3, vec![0.0; 9]))
            .uniform("zdist", 2.8)
            .draw_mode(DrawMode::Triangles)
            .clear(false)
    }

    // ── merge ─────────────────────────────────────────────────────────────

    #[test]
    fn defaults_never_overwrite_caller_fields() {
        let merged = partial().with_defaults(&PassConfig::defaults(PassRole::Program));

        assert_eq!(merged.name.as_deref(), Some("partial"));
        assert_eq!(merged.draw_mode, Some(DrawMode::Triangles));
        assert_eq!(merged.clear, Some(false));

        let attrs = merged.attributes.as_ref().unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[POSITION].components, 3);

        let uniforms = merged.uniforms.as_ref().unwrap();
        assert!(uniforms.contains("zdist"));
        assert!(!uniforms.contains("mouse"));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let merged = partial().with_defaults(&PassConfig::defaults(PassRole::Program));
        assert_eq!(merged.vertex_shader.as_deref(), Some(DEFAULT_VERTEX_SHADER));
        assert_eq!(merged.target, Some(TargetConfig::none()));
        assert_eq!(merged.enabled, Some(true));
        assert!(merged.setup.is_some());
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let template = PassConfig::defaults(PassRole::Chained);
        let once = partial().with_defaults(&template);
        let twice = once.clone().with_defaults(&template);
        assert_eq!(format!("{once:?}"), format!("{twice:?}"));
    }

    #[test]
    fn chained_passes_do_not_clear_by_default() {
        let desc = PassConfig::new().build(PassRole::Chained, "c").unwrap();
        assert!(!desc.clear);
        let desc = PassConfig::new().build(PassRole::Program, "p").unwrap();
        assert!(desc.clear);
        assert_eq!(desc.attributes.len(), 3);
    }

    // ── programs ──────────────────────────────────────────────────────────

    #[test]
    fn program_splits_main_and_chain() {
        let config = PassConfig::new()
            .chain_pass(PassConfig::new().name("blur"))
            .chain_pass(PassConfig::new());
        let program = ProgramDesc::build(config, 3).unwrap();

        assert_eq!(program.main.name, "program 3");
        assert_eq!(program.chain.len(), 2);
        assert_eq!(program.chain[0].name, "blur");
        assert_eq!(program.chain[1].name, "program 3/chain 1");
    }

    #[test]
    fn nested_chains_are_rejected() {
        let nested = PassConfig::new().name("inner").chain_pass(PassConfig::new());
        let config = PassConfig::new().chain_pass(nested);
        let err = ProgramDesc::build(config, 0).unwrap_err();
        assert!(matches!(err, PipelineError::NestedChain { pass } if pass == "inner"));
    }

    #[test]
    fn attribute_component_counts_are_validated() {
        let config = PassConfig::new().attribute("weird", AttributeConfig::new(5, vec![0.0; 5]));
        assert!(matches!(
            config.build(PassRole::Program, "p"),
            Err(PipelineError::InvalidConfig { .. })
        ));
    }

    // ── draw mode ─────────────────────────────────────────────────────────

    #[test]
    fn draw_modes_parse_by_name() {
        assert_eq!("TRIANGLES".parse::<DrawMode>().unwrap(), DrawMode::Triangles);
        assert_eq!("line_strip".parse::<DrawMode>().unwrap(), DrawMode::LineStrip);
        assert!("TRIANGLE_FAN".parse::<DrawMode>().is_err());
    }

    #[test]
    fn attribute_step_prefers_stride() {
        assert_eq!(AttributeConfig::new(3, vec![]).step(), 3);
        assert_eq!(AttributeConfig::new(3, vec![]).with_stride(6).step(), 6);
    }
}
