//! Provisioned passes.

use std::collections::{BTreeMap, BTreeSet};

use crate::backend::{BackendError, DrawCall, ProgramHandle, ProgramSource, RenderBackend, TextureHandle};

use super::attributes::AttributeBinder;
use super::config::{AttributeConfig, AttributeData, DrawMode, PassCallback, PassDesc};
use super::dispatch::UniformDispatchTable;
use super::error::PipelineError;
use super::panel::{PanelSpec, PassId};
use super::shader::compile_program;
use super::target::{DrawStrategy, RenderTargets, TextureUnits};
use super::texture::TextureLoader;
use super::uniform::{MOUSE, RESOLUTION, TIME, UniformSet, UniformValue};

/// The mutable side of a pass, handed to its callbacks.
///
/// During setup the attributes may be replaced freely; they are provisioned
/// right after. Later changes are re-uploaded into the existing buffers at
/// the start of the next frame.
#[derive(Debug, Clone)]
pub struct PassState {
    name: String,
    uniforms: UniformSet,
    attributes: BTreeMap<String, AttributeConfig>,
    changed: BTreeSet<String>,
    enabled: bool,
    resolution: [u32; 2],
}

impl PassState {
    fn new(desc: &PassDesc, resolution: [u32; 2]) -> Self {
        let mut uniforms = desc.uniforms.clone();
        uniforms.set(RESOLUTION, [resolution[0] as f32, resolution[1] as f32]);
        uniforms.set(TIME, 0.0);

        Self {
            name: desc.name.clone(),
            uniforms,
            attributes: desc.attributes.clone(),
            changed: BTreeSet::new(),
            enabled: desc.enabled,
            resolution,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resolution(&self) -> [u32; 2] {
        self.resolution
    }

    /// Current value of the `time` uniform, in seconds.
    pub fn time(&self) -> f32 {
        self.uniforms.get(TIME).and_then(UniformValue::as_float).unwrap_or(0.0)
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn set_uniform(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.uniforms.set(name, value);
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeConfig> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeConfig> {
        self.attributes.get(name)
    }

    /// Inserts or replaces an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: AttributeConfig) {
        let name = name.into();
        self.changed.insert(name.clone());
        self.attributes.insert(name, attribute);
    }

    /// Replaces the data of an existing attribute, keeping its layout.
    pub fn set_attribute_data(&mut self, name: &str, data: Vec<f32>) -> bool {
        let Some(attribute) = self.attributes.get_mut(name) else {
            return false;
        };
        attribute.data = AttributeData::Values(data);
        self.changed.insert(name.to_string());
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn take_changed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.changed).into_iter().collect()
    }
}

/// A pass with its GPU resources.
pub struct Pass {
    id: PassId,
    state: PassState,
    draw_mode: DrawMode,
    clear_color: [f32; 4],
    on_frame: PassCallback,
    panel: Option<PanelSpec>,
    dispatch: UniformDispatchTable,
    binder: AttributeBinder,
    targets: RenderTargets,
    strategy: DrawStrategy,
    program: ProgramHandle,
}

impl Pass {
    /// Compiles, provisions and links one pass.
    ///
    /// Steps run in a fixed order: uniforms receive the resolution, the
    /// program is compiled, earlier targets it samples are looked up, its
    /// own targets are created and the strategy chosen,
    /// textures are queued, the setup callback runs, attributes are
    /// provisioned and finally the backend pipeline is built.
    pub fn provision<B: RenderBackend>(
        id: PassId,
        desc: PassDesc,
        resolution: [u32; 2],
        backend: &mut B,
        units: &mut TextureUnits,
        loader: &mut TextureLoader,
    ) -> Result<Self, PipelineError> {
        let mut state = PassState::new(&desc, resolution);
        let name = desc.name.clone();

        let compiled = compile_program(&name, &desc.vertex_shader, &desc.fragment_shader)?;

        for uniform in &desc.sampled_targets {
            let unit = units.target_unit(uniform).ok_or_else(|| PipelineError::InvalidConfig {
                pass: name.clone(),
                reason: format!("no earlier pass exposes a texture target as '{uniform}'"),
            })?;
            state.uniforms.set(uniform.clone(), UniformValue::Int(unit as i32));
        }

        let targets =
            RenderTargets::provision(&name, &desc.target, resolution, backend, units, &mut state.uniforms)?;
        let strategy = DrawStrategy::select(&targets, desc.clear);

        for texture in &desc.textures {
            let unit = units.allocate();
            state.uniforms.set(texture.uniform.clone(), UniformValue::Int(unit as i32));
            loader.queue(&name, unit, texture);
        }

        (desc.setup)(&mut state);

        let binder = AttributeBinder::provision(
            &name,
            &state.attributes,
            &compiled.reflection.vertex_inputs,
            backend,
        )?;
        state.changed.clear();

        let program = backend
            .create_program(&ProgramSource {
                label: &name,
                compiled: &compiled,
                layout: binder.layout(),
                draw_mode: desc.draw_mode,
                destinations: strategy.destinations(),
            })
            .map_err(|source| PipelineError::Backend {
                pass: name.clone(),
                source,
            })?;

        log::debug!(
            "pass '{name}': provisioned ({:?}, {} vertices, {})",
            strategy,
            binder.count(),
            desc.draw_mode
        );

        Ok(Self {
            id,
            state,
            draw_mode: desc.draw_mode,
            clear_color: desc.clear_color,
            on_frame: desc.on_frame,
            panel: desc.panel,
            dispatch: UniformDispatchTable::new(&compiled.reflection),
            binder,
            targets,
            strategy,
            program,
        })
    }

    /// Draws one frame of this pass.
    ///
    /// Writes `time` (seconds) and `mouse`, binds the attributes, runs the
    /// per-frame callback, pushes the uniforms and executes the strategy.
    pub fn render<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        units: &TextureUnits,
        time: f32,
        mouse: [f32; 2],
    ) -> Result<(), BackendError> {
        self.state.uniforms.set(TIME, time);
        self.state.uniforms.set(MOUSE, mouse);

        let changed = self.state.take_changed();
        if !changed.is_empty() {
            self.binder
                .sync(&self.state.name, &self.state.attributes, changed, backend);
        }

        (self.on_frame)(&mut self.state);

        self.dispatch.apply(&self.state.uniforms);
        let textures: Vec<Option<TextureHandle>> = self
            .dispatch
            .texture_units()
            .iter()
            .map(|unit| unit.and_then(|u| units.texture(u)))
            .collect();

        let call = DrawCall {
            program: self.program,
            layout: self.binder.layout(),
            index_buffer: self.binder.index_buffer(),
            count: self.binder.count(),
            uniforms: self.dispatch.block(),
            textures: &textures,
            viewport: self.state.resolution,
        };
        self.strategy.execute(backend, &call)
    }

    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn state(&self) -> &PassState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn strategy(&self) -> DrawStrategy {
        self.strategy
    }

    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    pub fn panel(&self) -> Option<&PanelSpec> {
        self.panel.as_ref()
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn count(&self) -> u32 {
        self.binder.count()
    }

    pub fn dispatch(&self) -> &UniformDispatchTable {
        &self.dispatch
    }
}

impl std::fmt::Debug for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pass")
            .field("id", &self.id)
            .field("name", &self.state.name)
            .field("strategy", &self.strategy)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::backend::{Destination, HeadlessBackend, Recorded};
    use crate::pipeline::config::{PassConfig, PassRole, TargetConfig, POSITION};
    use crate::pipeline::texture::TextureConfig;

    const FEEDBACK_FS: &str = r#"#version 450
layout(location = 0) in vec2 vtex;
layout(location = 0) out vec4 frag_color;

layout(set = 0, binding = 0) uniform Globals {
    vec2 resolution;
    vec2 mouse;
    float time;
    float fade;
};
layout(set = 0, binding = 1) uniform texture2D previous;
layout(set = 0, binding = 2) uniform sampler previous_sampler;

void main() {
    vec4 last = texture(sampler2D(previous, previous_sampler), vtex);
    frag_color = last * fade + vec4(mouse, sin(time), 1.0) * (1.0 - fade);
}
"#;

    const TIME_OFFSET: usize = 16;

    struct Fixture {
        backend: HeadlessBackend,
        units: TextureUnits,
        loader: TextureLoader,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: HeadlessBackend::new(),
                units: TextureUnits::new(),
                loader: TextureLoader::new(),
            }
        }

        fn provision(&mut self, config: PassConfig) -> Result<Pass, PipelineError> {
            let desc = config.build(PassRole::Program, "test")?;
            Pass::provision(
                PassId::main(0),
                desc,
                [400, 300],
                &mut self.backend,
                &mut self.units,
                &mut self.loader,
            )
        }
    }

    // ── provisioning ──────────────────────────────────────────────────────

    #[test]
    fn resolution_is_written_before_setup() {
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let mut fx = Fixture::new();
        fx.provision(PassConfig::new().on_setup(move |state| {
            *sink.borrow_mut() = state.uniform(RESOLUTION).cloned();
        }))
        .unwrap();

        assert_eq!(*seen.borrow(), Some(UniformValue::Vec2([400.0, 300.0])));
    }

    #[test]
    fn setup_can_replace_geometry_before_upload() {
        let mut fx = Fixture::new();
        let pass = fx
            .provision(PassConfig::new().on_setup(|state| {
                state.set_attribute(POSITION, AttributeConfig::new(2, vec![0.0; 12]));
                state.set_attribute("texcoord", AttributeConfig::new(2, vec![0.0; 12]));
                state.set_attribute("color", AttributeConfig::new(3, vec![1.0; 18]));
            }))
            .unwrap();

        assert_eq!(pass.count(), 6);
        let writes = fx
            .backend
            .commands()
            .iter()
            .filter(|c| matches!(c, Recorded::WriteVertexBuffer { .. }))
            .count();
        assert_eq!(writes, 0);
    }

    #[test]
    fn textures_take_units_in_declaration_order() {
        let mut fx = Fixture::new();
        let image = image::RgbaImage::new(1, 1);
        let pass = fx
            .provision(
                PassConfig::new()
                    .fragment_shader(FEEDBACK_FS)
                    .target(TargetConfig::texture().sampled_as("previous"))
                    .texture(TextureConfig::from_image(image, "unused")),
            )
            .unwrap();

        assert_eq!(pass.state().uniform("previous"), Some(&UniformValue::Int(0)));
        assert_eq!(pass.state().uniform("unused"), Some(&UniformValue::Int(1)));
        assert_eq!(fx.loader.pending(), 1);
    }

    #[test]
    fn shader_errors_stop_provisioning() {
        let mut fx = Fixture::new();
        let err = fx
            .provision(PassConfig::new().fragment_shader("#version 450\nvoid main() { oops }"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ShaderCompile { .. }));
        assert!(fx.backend.commands().is_empty());
    }

    #[test]
    fn sampled_targets_resolve_to_the_exposing_unit() {
        let mut fx = Fixture::new();
        let image = image::RgbaImage::new(1, 1);
        fx.provision(PassConfig::new().texture(TextureConfig::from_image(image, "photo")))
            .unwrap();
        fx.provision(PassConfig::new().target(TargetConfig::texture().sampled_as("previous")))
            .unwrap();

        let reader = fx
            .provision(PassConfig::new().fragment_shader(FEEDBACK_FS).sample_target("previous"))
            .unwrap();
        assert_eq!(reader.state().uniform("previous"), Some(&UniformValue::Int(1)));
        assert_eq!(fx.units.target_unit("previous"), Some(1));
    }

    #[test]
    fn sampling_an_unexposed_target_fails() {
        let mut fx = Fixture::new();
        let err = fx
            .provision(PassConfig::new().fragment_shader(FEEDBACK_FS).sample_target("previous"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig { ref reason, .. } if reason.contains("'previous'")));
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn render_writes_time_and_mouse() {
        let mut fx = Fixture::new();
        let mut pass = fx.provision(PassConfig::new()).unwrap();
        pass.render(&mut fx.backend, &fx.units, 2.5, [0.25, 0.75]).unwrap();

        let draw = fx.backend.draws().last().unwrap();
        assert_eq!(draw.destination, Destination::Screen { clear: true });
        assert_eq!(draw.count, 4);
        assert_eq!(draw.viewport, [400, 300]);
        assert_eq!(draw.uniform_f32(0), Some(400.0));
        assert_eq!(draw.uniform_f32(8), Some(0.25));
        assert_eq!(draw.uniform_f32(12), Some(0.75));
        assert_eq!(draw.uniform_f32(TIME_OFFSET), Some(2.5));
    }

    #[test]
    fn frame_callback_runs_before_uniform_push() {
        let mut fx = Fixture::new();
        let mut pass = fx
            .provision(
                PassConfig::new()
                    .fragment_shader(FEEDBACK_FS)
                    .on_frame(|state| state.set_uniform("fade", state.time() * 0.5)),
            )
            .unwrap();
        pass.render(&mut fx.backend, &fx.units, 1.0, [0.0, 0.0]).unwrap();

        let draw = fx.backend.draws().last().unwrap();
        assert_eq!(draw.uniform_f32(TIME_OFFSET + 4), Some(0.5));
    }

    #[test]
    fn texture_target_is_sampled_through_its_unit() {
        let mut fx = Fixture::new();
        let mut pass = fx
            .provision(
                PassConfig::new()
                    .fragment_shader(FEEDBACK_FS)
                    .target(TargetConfig::texture().sampled_as("previous")),
            )
            .unwrap();
        pass.render(&mut fx.backend, &fx.units, 0.0, [0.0, 0.0]).unwrap();

        let target = pass.targets().texture.unwrap().texture;
        let draws: Vec<_> = fx.backend.draws().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].destination, Destination::Texture(target));
        assert_eq!(draws[0].textures, vec![Some(target)]);
    }

    #[test]
    fn changed_attributes_upload_on_next_frame() {
        let mut fx = Fixture::new();
        let mut pass = fx.provision(PassConfig::new()).unwrap();

        assert!(pass.state_mut().set_attribute_data(POSITION, vec![0.0; 6]));
        assert!(!pass.state_mut().set_attribute_data("missing", vec![]));
        pass.render(&mut fx.backend, &fx.units, 0.0, [0.0, 0.0]).unwrap();

        assert!(fx
            .backend
            .commands()
            .iter()
            .any(|c| matches!(c, Recorded::WriteVertexBuffer { len: 6, .. })));
        assert_eq!(fx.backend.draws().last().unwrap().count, 3);
    }
}
