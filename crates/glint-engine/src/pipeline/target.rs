//! Offscreen targets and the draw strategy built on them.

use std::collections::BTreeMap;

use crate::backend::{
    BackendError, Destination, DestinationKind, DrawCall, RenderBackend, ResolveHandle, TextureHandle,
};

use super::config::{TargetConfig, TargetKind};
use super::error::PipelineError;
use super::uniform::{UniformSet, UniformValue};

/// Texture unit allocator and the textures currently bound to each unit.
///
/// Owned by a controller, so separate controllers number their units
/// independently.
#[derive(Debug, Default)]
pub struct TextureUnits {
    next: u32,
    bound: BTreeMap<u32, TextureHandle>,
    /// Unit of the latest texture target exposed under each sampler name.
    targets: BTreeMap<String, u32>,
}

impl TextureUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next unused unit.
    pub fn allocate(&mut self) -> u32 {
        let unit = self.next;
        self.next += 1;
        unit
    }

    pub fn bind(&mut self, unit: u32, texture: TextureHandle) {
        self.bound.insert(unit, texture);
    }

    pub fn texture(&self, unit: u32) -> Option<TextureHandle> {
        self.bound.get(&unit).copied()
    }

    /// Records that the target on `unit` is sampled as `uniform`.
    pub fn expose_target(&mut self, uniform: impl Into<String>, unit: u32) {
        self.targets.insert(uniform.into(), unit);
    }

    /// Unit of the texture target most recently exposed as `uniform`.
    pub fn target_unit(&self, uniform: &str) -> Option<u32> {
        self.targets.get(uniform).copied()
    }

    /// Number of units handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureTarget {
    pub texture: TextureHandle,
    pub unit: u32,
}

/// Offscreen targets of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTargets {
    pub texture: Option<TextureTarget>,
    pub resolve: Option<ResolveHandle>,
}

impl RenderTargets {
    /// Creates the targets `config` asks for at `size`.
    ///
    /// The texture target takes the next texture unit; when the config names
    /// a sampler uniform, that uniform is pointed at the unit.
    pub fn provision<B: RenderBackend>(
        pass: &str,
        config: &TargetConfig,
        size: [u32; 2],
        backend: &mut B,
        units: &mut TextureUnits,
        uniforms: &mut UniformSet,
    ) -> Result<Self, PipelineError> {
        if !config.has_texture() {
            return Ok(Self::default());
        }

        let backend_error = |source| PipelineError::Backend {
            pass: pass.to_string(),
            source,
        };

        let texture = backend
            .create_texture_target(&format!("{pass}/texture target"), size)
            .map_err(backend_error)?;
        let unit = units.allocate();
        units.bind(unit, texture);

        if let Some(uniform) = &config.texture_uniform {
            uniforms.set(uniform.clone(), UniformValue::Int(unit as i32));
            units.expose_target(uniform.clone(), unit);
        }

        let resolve = match config.kind {
            TargetKind::Resolve => Some(
                backend
                    .create_resolve_target(&format!("{pass}/resolve target"), size)
                    .map_err(backend_error)?,
            ),
            _ => None,
        };

        log::debug!(
            "pass '{pass}': {:?} target {}x{} on texture unit {unit}",
            config.kind,
            size[0],
            size[1]
        );

        Ok(Self {
            texture: Some(TextureTarget { texture, unit }),
            resolve,
        })
    }
}

/// How a pass turns one draw call into backend draws.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawStrategy {
    /// Draw to the screen, clearing first only when `clear`.
    Direct { clear: bool },
    /// Draw into the texture target, then clear the screen and draw again.
    ToTexture { texture: TextureHandle },
    /// Draw into the resolve target, clear the screen and draw again, then
    /// resolve into the texture target.
    ToResolveThenTexture {
        resolve: ResolveHandle,
        texture: TextureHandle,
    },
}

impl DrawStrategy {
    pub fn select(targets: &RenderTargets, clear: bool) -> Self {
        match (targets.resolve, targets.texture) {
            (Some(resolve), Some(target)) => DrawStrategy::ToResolveThenTexture {
                resolve,
                texture: target.texture,
            },
            (None, Some(target)) => DrawStrategy::ToTexture {
                texture: target.texture,
            },
            _ => DrawStrategy::Direct { clear },
        }
    }

    /// Destinations this strategy draws into.
    pub fn destinations(&self) -> &'static [DestinationKind] {
        match self {
            DrawStrategy::Direct { .. } => &[DestinationKind::Screen],
            DrawStrategy::ToTexture { .. } => &[DestinationKind::Texture, DestinationKind::Screen],
            DrawStrategy::ToResolveThenTexture { .. } => &[DestinationKind::Resolve, DestinationKind::Screen],
        }
    }

    pub fn execute<B: RenderBackend>(&self, backend: &mut B, call: &DrawCall<'_>) -> Result<(), BackendError> {
        match *self {
            DrawStrategy::Direct { clear } => backend.draw(Destination::Screen { clear }, call),
            DrawStrategy::ToTexture { texture } => {
                backend.draw(Destination::Texture(texture), call)?;
                backend.draw(Destination::Screen { clear: true }, call)
            }
            DrawStrategy::ToResolveThenTexture { resolve, texture } => {
                backend.draw(Destination::Resolve(resolve), call)?;
                backend.draw(Destination::Screen { clear: true }, call)?;
                backend.resolve(resolve, texture)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessBackend, ProgramHandle, Recorded};
    use crate::pipeline::attributes::VertexLayout;

    fn provision(config: &TargetConfig, backend: &mut HeadlessBackend, units: &mut TextureUnits) -> (RenderTargets, UniformSet) {
        let mut uniforms = UniformSet::new();
        let targets =
            RenderTargets::provision("p", config, [320, 200], backend, units, &mut uniforms).unwrap();
        (targets, uniforms)
    }

    fn destinations(backend: &HeadlessBackend) -> Vec<Recorded> {
        backend
            .commands()
            .iter()
            .filter(|c| matches!(c, Recorded::Draw { .. } | Recorded::Resolve { .. }))
            .cloned()
            .collect()
    }

    // ── units ─────────────────────────────────────────────────────────────

    #[test]
    fn units_are_handed_out_in_order() {
        let mut units = TextureUnits::new();
        assert_eq!(units.allocate(), 0);
        assert_eq!(units.allocate(), 1);
        assert_eq!(units.allocated(), 2);
        assert!(units.texture(0).is_none());
    }

    #[test]
    fn separate_allocators_do_not_share_numbering() {
        let mut a = TextureUnits::new();
        let mut b = TextureUnits::new();
        a.allocate();
        a.allocate();
        assert_eq!(b.allocate(), 0);
    }

    // ── provisioning ──────────────────────────────────────────────────────

    #[test]
    fn no_target_creates_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut units = TextureUnits::new();
        let (targets, _) = provision(&TargetConfig::none(), &mut backend, &mut units);
        assert_eq!(targets, RenderTargets::default());
        assert!(backend.commands().is_empty());
        assert_eq!(units.allocated(), 0);
    }

    #[test]
    fn texture_target_binds_its_unit_and_uniform() {
        let mut backend = HeadlessBackend::new();
        let mut units = TextureUnits::new();
        units.allocate();

        let config = TargetConfig::texture().sampled_as("previous");
        let (targets, uniforms) = provision(&config, &mut backend, &mut units);

        let target = targets.texture.unwrap();
        assert_eq!(target.unit, 1);
        assert_eq!(units.texture(1), Some(target.texture));
        assert_eq!(uniforms.get("previous"), Some(&UniformValue::Int(1)));
        assert!(targets.resolve.is_none());
        assert!(matches!(
            backend.commands()[0],
            Recorded::CreateTextureTarget { size: [320, 200], .. }
        ));
    }

    #[test]
    fn resolve_target_implies_texture_target() {
        let mut backend = HeadlessBackend::new();
        let mut units = TextureUnits::new();
        let (targets, _) = provision(&TargetConfig::resolve(), &mut backend, &mut units);
        assert!(targets.texture.is_some());
        assert!(targets.resolve.is_some());
    }

    // ── strategy ──────────────────────────────────────────────────────────

    fn run(strategy: DrawStrategy, backend: &mut HeadlessBackend) {
        let layout = VertexLayout::default();
        let call = DrawCall {
            program: ProgramHandle(0),
            layout: &layout,
            index_buffer: None,
            count: 4,
            uniforms: &[],
            textures: &[],
            viewport: [320, 200],
        };
        strategy.execute(backend, &call).unwrap();
    }

    #[test]
    fn strategy_follows_targets() {
        let mut backend = HeadlessBackend::new();
        let mut units = TextureUnits::new();

        let (none, _) = provision(&TargetConfig::none(), &mut backend, &mut units);
        assert_eq!(DrawStrategy::select(&none, false), DrawStrategy::Direct { clear: false });

        let (texture, _) = provision(&TargetConfig::texture(), &mut backend, &mut units);
        assert!(matches!(DrawStrategy::select(&texture, true), DrawStrategy::ToTexture { .. }));

        let (resolve, _) = provision(&TargetConfig::resolve(), &mut backend, &mut units);
        assert!(matches!(
            DrawStrategy::select(&resolve, true),
            DrawStrategy::ToResolveThenTexture { .. }
        ));
    }

    #[test]
    fn direct_draw_clears_only_when_asked() {
        let mut backend = HeadlessBackend::new();
        run(DrawStrategy::Direct { clear: false }, &mut backend);
        run(DrawStrategy::Direct { clear: true }, &mut backend);

        let draws: Vec<_> = backend.draws().map(|d| d.destination).collect();
        assert_eq!(
            draws,
            vec![Destination::Screen { clear: false }, Destination::Screen { clear: true }]
        );
    }

    #[test]
    fn texture_strategy_draws_offscreen_then_screen() {
        let mut backend = HeadlessBackend::new();
        let texture = backend.create_texture_target("t", [8, 8]).unwrap();
        backend.take_commands();

        run(DrawStrategy::ToTexture { texture }, &mut backend);
        let draws: Vec<_> = backend.draws().map(|d| d.destination).collect();
        assert_eq!(
            draws,
            vec![Destination::Texture(texture), Destination::Screen { clear: true }]
        );
    }

    #[test]
    fn resolve_strategy_resolves_after_screen_draw() {
        let mut backend = HeadlessBackend::new();
        let texture = backend.create_texture_target("t", [8, 8]).unwrap();
        let resolve = backend.create_resolve_target("r", [8, 8]).unwrap();
        backend.take_commands();

        run(DrawStrategy::ToResolveThenTexture { resolve, texture }, &mut backend);
        let recorded = destinations(&backend);
        assert_eq!(recorded.len(), 3);
        assert!(matches!(&recorded[0], Recorded::Draw(d) if d.destination == Destination::Resolve(resolve)));
        assert!(matches!(&recorded[1], Recorded::Draw(d) if d.destination == Destination::Screen { clear: true }));
        assert_eq!(recorded[2], Recorded::Resolve { source: resolve, target: texture });
    }
}
