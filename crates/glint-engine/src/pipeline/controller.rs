//! Program ownership, frame scheduling and program switching.

use std::time::Duration;

use crate::backend::RenderBackend;
use crate::time::{FrameRate, FrameScheduler};

use super::config::{PassConfig, ProgramDesc};
use super::error::PipelineError;
use super::panel::{PanelEntry, ParamChange, ParameterPanel, PassId};
use super::pass::Pass;
use super::target::TextureUnits;
use super::texture::TextureLoader;
use super::uniform::UniformValue;

/// Lifecycle of a [`PipelineController`].
///
/// `Uninitialized -> Ready -> Running <-> Stopped`, or
/// `Uninitialized -> Failed`, which is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ControllerState {
    Uninitialized,
    Ready,
    Running,
    Stopped,
    Failed,
}

/// A provisioned program: the main pass and its chain.
#[derive(Debug)]
pub struct Program {
    pub main: Pass,
    pub chain: Vec<Pass>,
}

impl Program {
    pub fn name(&self) -> &str {
        self.main.name()
    }

    /// Every pass in draw order.
    pub fn passes(&self) -> impl Iterator<Item = &Pass> {
        std::iter::once(&self.main).chain(self.chain.iter())
    }
}

/// Owns every program and drives the active one.
///
/// The host calls [`tick`](Self::tick) from its refresh callback with a
/// monotonic timestamp in milliseconds. Pointer position and the last frame
/// time are shared by all passes of the active program.
pub struct PipelineController<B: RenderBackend> {
    backend: B,
    configs: Vec<PassConfig>,
    programs: Vec<Program>,
    active: usize,
    resolution: [u32; 2],
    scheduler: FrameScheduler,
    state: ControllerState,
    failure: Option<String>,
    units: TextureUnits,
    loader: TextureLoader,
    pointer: [f32; 2],
    last_time_ms: f64,
    panel: Option<Box<dyn ParameterPanel>>,
}

impl<B: RenderBackend> PipelineController<B> {
    pub fn new(backend: B, programs: Vec<PassConfig>, resolution: [u32; 2], frame_rate: FrameRate) -> Self {
        Self {
            backend,
            configs: programs,
            programs: Vec::new(),
            active: 0,
            resolution,
            scheduler: FrameScheduler::new(frame_rate),
            state: ControllerState::Uninitialized,
            failure: None,
            units: TextureUnits::new(),
            loader: TextureLoader::new(),
            pointer: [0.0, 0.0],
            last_time_ms: 0.0,
            panel: None,
        }
    }

    pub fn with_panel(mut self, panel: impl ParameterPanel + 'static) -> Self {
        self.panel = Some(Box::new(panel));
        self
    }

    /// Provisions every program, main pass first and then its chain.
    ///
    /// Calling it again after it ran is a no-op. On error the controller
    /// becomes inert: every later `start`, `tick`, `render_once` and
    /// `switch_program` does nothing.
    pub fn initialize(&mut self) -> Result<(), PipelineError> {
        if self.state != ControllerState::Uninitialized {
            return Ok(());
        }

        match self.provision_all() {
            Ok(programs) => {
                self.programs = programs;
                self.active = 0;
                self.backend.set_clear_color(self.programs[0].main.clear_color());
                self.state = ControllerState::Ready;

                if let Some(panel) = self.panel.as_mut() {
                    let names: Vec<String> = self.programs.iter().map(|p| p.name().to_string()).collect();
                    panel.programs(&names, 0);
                }
                self.show_panels(0);

                log::info!(
                    "pipeline initialized: {} program(s) at {}x{}, {:?}",
                    self.programs.len(),
                    self.resolution[0],
                    self.resolution[1],
                    self.scheduler.rate()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("pipeline initialization failed: {e}");
                self.failure = Some(e.to_string());
                self.state = ControllerState::Failed;
                Err(e)
            }
        }
    }

    fn provision_all(&mut self) -> Result<Vec<Program>, PipelineError> {
        let configs = std::mem::take(&mut self.configs);
        if configs.is_empty() {
            return Err(PipelineError::InvalidConfig {
                pass: String::from("pipeline"),
                reason: String::from("no programs to run"),
            });
        }

        let mut programs = Vec::with_capacity(configs.len());
        for (index, config) in configs.into_iter().enumerate() {
            let desc = ProgramDesc::build(config, index)?;

            let main = Pass::provision(
                PassId::main(index),
                desc.main,
                self.resolution,
                &mut self.backend,
                &mut self.units,
                &mut self.loader,
            )?;

            let mut chain = Vec::with_capacity(desc.chain.len());
            for (i, pass) in desc.chain.into_iter().enumerate() {
                chain.push(Pass::provision(
                    PassId::chained(index, i),
                    pass,
                    self.resolution,
                    &mut self.backend,
                    &mut self.units,
                    &mut self.loader,
                )?);
            }

            programs.push(Program { main, chain });
        }
        Ok(programs)
    }

    /// Starts the frame loop. Idempotent while running.
    pub fn start(&mut self) {
        match self.state {
            ControllerState::Ready | ControllerState::Stopped => {
                if let Some(program) = self.programs.get(self.active) {
                    self.backend.set_clear_color(program.main.clear_color());
                }
                self.scheduler.restart();
                self.state = ControllerState::Running;
                log::info!("pipeline started");
            }
            ControllerState::Uninitialized => log::warn!("start ignored: pipeline is not initialized"),
            ControllerState::Running | ControllerState::Failed => {}
        }
    }

    pub fn stop(&mut self) {
        if self.state == ControllerState::Running {
            self.state = ControllerState::Stopped;
            log::info!("pipeline stopped");
        }
    }

    /// Host refresh callback. Renders when running and the frame rate allows.
    ///
    /// Returns whether a frame was drawn.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.state != ControllerState::Running || !self.scheduler.due(now_ms) {
            return false;
        }
        self.render(now_ms);
        true
    }

    /// Renders one frame of the active program at `time_ms`.
    ///
    /// Finished texture loads are uploaded first. The main pass always
    /// draws; chained passes draw in order when enabled.
    pub fn render(&mut self, time_ms: f64) {
        if !matches!(
            self.state,
            ControllerState::Ready | ControllerState::Running | ControllerState::Stopped
        ) {
            return;
        }

        self.loader.poll(&mut self.backend, &mut self.units);
        self.last_time_ms = time_ms;

        if !self.backend.begin_frame() {
            log::trace!("frame skipped: no surface");
            return;
        }

        let time = (time_ms * 0.001) as f32;
        let Some(program) = self.programs.get_mut(self.active) else {
            self.backend.end_frame();
            return;
        };

        if let Err(e) = program.main.render(&mut self.backend, &self.units, time, self.pointer) {
            log::error!("pass '{}': {e}", program.main.name());
        }
        for pass in program.chain.iter_mut().filter(|p| p.is_enabled()) {
            if let Err(e) = pass.render(&mut self.backend, &self.units, time, self.pointer) {
                log::error!("pass '{}': {e}", pass.name());
            }
        }

        self.backend.end_frame();
    }

    /// Renders a single frame unless the loop is running.
    pub fn render_once(&mut self, time_ms: f64) {
        if self.state != ControllerState::Running {
            self.render(time_ms);
        }
    }

    /// Makes program `index` active. Out-of-range indices are ignored.
    ///
    /// Panels of the previous program are hidden, the clear colour changes,
    /// one frame is rendered (unless the loop is running) and then the new
    /// program's panels are shown.
    pub fn switch_program(&mut self, index: usize) {
        if self.state == ControllerState::Failed || index >= self.programs.len() {
            return;
        }

        self.hide_panels(self.active);
        self.active = index;
        self.backend.set_clear_color(self.programs[index].main.clear_color());
        self.render_once(self.last_time_ms);
        self.show_panels(index);

        log::info!("switched to program {index} '{}'", self.programs[index].name());
    }

    /// Enables or disables a chained pass, re-rendering once when stopped.
    ///
    /// Main passes always draw; returns `false` for them and for unknown ids.
    pub fn set_pass_enabled(&mut self, id: PassId, enabled: bool) -> bool {
        if id.chain.is_none() {
            return false;
        }
        let Some(pass) = self.pass_mut(id) else {
            return false;
        };
        pass.set_enabled(enabled);
        log::debug!("pass '{}' {}", pass.name(), if enabled { "enabled" } else { "disabled" });

        if id.program == self.active {
            self.render_once(self.last_time_ms);
        }
        true
    }

    pub fn uniform(&self, id: PassId, name: &str) -> Option<&UniformValue> {
        self.pass(id)?.state().uniform(name)
    }

    /// Writes a uniform of one pass. Returns `false` for unknown passes.
    ///
    /// With [`ParamChange::Redraw`] a stopped pipeline renders one frame so
    /// the edit becomes visible.
    pub fn set_uniform(
        &mut self,
        id: PassId,
        name: &str,
        value: impl Into<UniformValue>,
        change: ParamChange,
    ) -> bool {
        let Some(pass) = self.pass_mut(id) else {
            return false;
        };
        pass.state_mut().set_uniform(name, value);

        if change == ParamChange::Redraw && id.program == self.active {
            self.render_once(self.last_time_ms);
        }
        true
    }

    /// Sets the pointer in normalised coordinates, origin at the bottom left.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = [x, y];
    }

    pub fn pointer(&self) -> [f32; 2] {
        self.pointer
    }

    /// Whether every queued texture has been uploaded.
    pub fn textures_ready(&self) -> bool {
        self.loader.pending() == 0
    }

    /// Blocks until queued textures are uploaded or `timeout` passes.
    pub fn wait_for_textures(&mut self, timeout: Duration) -> bool {
        self.loader.wait(&mut self.backend, &mut self.units, timeout)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Running
    }

    /// Clock time at which the next frame may draw under a capped rate.
    /// `None` when every refresh draws.
    pub fn next_frame_ms(&self) -> Option<f64> {
        self.scheduler.next_due_ms()
    }

    /// Texture unit of the target most recently exposed as `uniform`.
    pub fn target_unit(&self, uniform: &str) -> Option<u32> {
        self.units.target_unit(uniform)
    }

    /// The initialization error, once the controller has failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn program(&self, index: usize) -> Option<&Program> {
        self.programs.get(index)
    }

    pub fn resolution(&self) -> [u32; 2] {
        self.resolution
    }

    pub fn pass(&self, id: PassId) -> Option<&Pass> {
        let program = self.programs.get(id.program)?;
        match id.chain {
            None => Some(&program.main),
            Some(i) => program.chain.get(i),
        }
    }

    fn pass_mut(&mut self, id: PassId) -> Option<&mut Pass> {
        let program = self.programs.get_mut(id.program)?;
        match id.chain {
            None => Some(&mut program.main),
            Some(i) => program.chain.get_mut(i),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn show_panels(&mut self, index: usize) {
        let (Some(panel), Some(program)) = (self.panel.as_mut(), self.programs.get(index)) else {
            return;
        };
        for pass in program.passes() {
            if let Some(spec) = pass.panel() {
                panel.show(&PanelEntry {
                    pass: pass.id(),
                    name: pass.name(),
                    spec,
                    uniforms: pass.state().uniforms(),
                    enabled: pass.is_enabled(),
                });
            }
        }
    }

    fn hide_panels(&mut self, index: usize) {
        let (Some(panel), Some(program)) = (self.panel.as_mut(), self.programs.get(index)) else {
            return;
        };
        for pass in program.passes().filter(|p| p.panel().is_some()) {
            panel.hide(pass.id());
        }
    }
}

impl<B: RenderBackend> std::fmt::Debug for PipelineController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineController")
            .field("state", &self.state)
            .field("active", &self.active)
            .field("programs", &self.programs.len())
            .field("resolution", &self.resolution)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::backend::{Destination, HeadlessBackend, Recorded};
    use crate::pipeline::config::TargetConfig;
    use crate::pipeline::panel::PanelSpec;
    use crate::pipeline::texture::TextureConfig;
    use crate::pipeline::uniform::MOUSE;

    const TIME_OFFSET: usize = 16;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Programs(Vec<String>),
        Show(PassId),
        Hide(PassId),
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Event>>>);

    impl ParameterPanel for Recorder {
        fn programs(&mut self, names: &[String], _active: usize) {
            self.0.borrow_mut().push(Event::Programs(names.to_vec()));
        }

        fn show(&mut self, entry: &PanelEntry<'_>) {
            self.0.borrow_mut().push(Event::Show(entry.pass));
        }

        fn hide(&mut self, pass: PassId) {
            self.0.borrow_mut().push(Event::Hide(pass));
        }
    }

    fn controller(programs: Vec<PassConfig>, rate: FrameRate) -> PipelineController<HeadlessBackend> {
        PipelineController::new(HeadlessBackend::new(), programs, [64, 32], rate)
    }

    fn ready(programs: Vec<PassConfig>) -> PipelineController<HeadlessBackend> {
        let mut c = controller(programs, FrameRate::Uncapped);
        c.initialize().unwrap();
        c.backend_mut().take_commands();
        c
    }

    fn labelled(name: &str) -> PassConfig {
        PassConfig::new().name(name).panel(PanelSpec::new().title(name))
    }

    fn broken() -> PassConfig {
        PassConfig::new().fragment_shader("#version 450\nvoid main() { nope(); }")
    }

    // ── initialization ────────────────────────────────────────────────────

    #[test]
    fn passes_are_provisioned_main_first_then_chain() {
        let mut c = controller(
            vec![
                PassConfig::new().chain_pass(PassConfig::new()).chain_pass(PassConfig::new()),
                PassConfig::new(),
            ],
            FrameRate::Uncapped,
        );
        c.initialize().unwrap();

        let labels: Vec<_> = c
            .backend()
            .commands()
            .iter()
            .filter_map(|cmd| match cmd {
                Recorded::CreateProgram { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            labels,
            vec!["program 0", "program 0/chain 0", "program 0/chain 1", "program 1"]
        );
        assert_eq!(c.state(), ControllerState::Ready);
        assert_eq!(c.active(), 0);
    }

    #[test]
    fn initialize_sets_the_first_programs_clear_color() {
        let mut c = controller(
            vec![
                PassConfig::new().clear_color([0.1, 0.2, 0.3, 1.0]),
                PassConfig::new().clear_color([1.0, 0.0, 0.0, 1.0]),
            ],
            FrameRate::Uncapped,
        );
        c.initialize().unwrap();
        assert_eq!(c.backend().clear_color(), [0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn no_programs_is_a_config_error() {
        let mut c = controller(vec![], FrameRate::Uncapped);
        assert!(matches!(c.initialize(), Err(PipelineError::InvalidConfig { .. })));
        assert_eq!(c.state(), ControllerState::Failed);
    }

    #[test]
    fn initialize_runs_once() {
        let mut c = ready(vec![PassConfig::new()]);
        c.initialize().unwrap();
        assert!(c.backend().commands().is_empty());
    }

    #[test]
    fn failed_controller_is_inert() {
        let mut c = controller(vec![PassConfig::new(), broken()], FrameRate::Uncapped);
        let err = c.initialize().unwrap_err();
        assert!(matches!(err, PipelineError::ShaderCompile { .. }));
        assert_eq!(c.state(), ControllerState::Failed);
        assert!(c.failure().unwrap().contains("program 1"));

        c.backend_mut().take_commands();
        c.start();
        assert!(!c.tick(0.0));
        assert!(!c.tick(100.0));
        c.render_once(0.0);
        c.switch_program(0);
        assert_eq!(c.state(), ControllerState::Failed);
        assert!(c.backend().commands().is_empty());
    }

    #[test]
    fn failure_in_a_chain_pass_fails_the_pipeline() {
        let mut c = controller(vec![PassConfig::new().chain_pass(broken())], FrameRate::Uncapped);
        assert!(c.initialize().is_err());
        assert_eq!(c.program_count(), 0);
    }

    #[test]
    fn controllers_allocate_texture_units_independently() {
        let config = || PassConfig::new().target(TargetConfig::texture().sampled_as("previous"));
        let a = ready(vec![config(), config()]);
        let b = ready(vec![config()]);

        assert_eq!(a.uniform(PassId::main(1), "previous"), Some(&UniformValue::Int(1)));
        assert_eq!(b.uniform(PassId::main(0), "previous"), Some(&UniformValue::Int(0)));
        assert_eq!(a.target_unit("previous"), Some(1));
        assert_eq!(b.target_unit("previous"), Some(0));
        assert_eq!(b.target_unit("missing"), None);
    }

    // ── frames ────────────────────────────────────────────────────────────

    #[test]
    fn render_draws_main_then_enabled_chain() {
        let mut c = ready(vec![
            PassConfig::new()
                .chain_pass(PassConfig::new())
                .chain_pass(PassConfig::new().enabled(false))
                .chain_pass(PassConfig::new()),
        ]);
        c.render(1500.0);

        let program = c.program(0).unwrap();
        let expected = vec![
            program.main.program(),
            program.chain[0].program(),
            program.chain[2].program(),
        ];
        let drawn: Vec<_> = c.backend().draws().map(|d| d.program).collect();
        assert_eq!(drawn, expected);

        let draws: Vec<_> = c.backend().draws().collect();
        assert_eq!(draws[0].destination, Destination::Screen { clear: true });
        assert_eq!(draws[1].destination, Destination::Screen { clear: false });
        assert!(draws.iter().all(|d| d.uniform_f32(TIME_OFFSET) == Some(1.5)));
        assert_eq!(c.backend().frames(), 1);
    }

    #[test]
    fn pointer_reaches_every_drawn_pass() {
        let mut c = ready(vec![PassConfig::new().chain_pass(PassConfig::new())]);
        c.set_pointer(0.25, 0.5);
        c.render(0.0);

        assert!(c.backend().draws().all(|d| d.uniform_f32(8) == Some(0.25) && d.uniform_f32(12) == Some(0.5)));
        assert_eq!(
            c.uniform(PassId::chained(0, 0), MOUSE),
            Some(&UniformValue::Vec2([0.25, 0.5]))
        );
    }

    #[test]
    fn lost_surface_skips_the_frame() {
        let mut c = ready(vec![PassConfig::new()]);
        c.backend_mut().set_frame_unavailable(true);
        c.render(0.0);
        assert!(c.backend().commands().is_empty());
    }

    #[test]
    fn tick_only_draws_while_running() {
        let mut c = ready(vec![PassConfig::new()]);
        assert!(!c.tick(0.0));

        c.start();
        c.start();
        assert!(c.is_running());
        assert!(c.tick(16.0));
        assert!(c.tick(32.0));

        c.stop();
        assert!(!c.tick(48.0));
        assert_eq!(c.backend().frames(), 2);
    }

    #[test]
    fn capped_rate_skips_early_refreshes() {
        let mut c = controller(vec![PassConfig::new()], FrameRate::Capped(20));
        c.initialize().unwrap();
        c.start();

        let drawn: Vec<bool> = [0.0, 20.0, 51.0, 80.0, 101.0].into_iter().map(|t| c.tick(t)).collect();
        assert_eq!(drawn, vec![false, false, true, false, true]);
        assert_eq!(c.next_frame_ms(), Some(150.0));

        let uncapped = ready(vec![PassConfig::new()]);
        assert_eq!(uncapped.next_frame_ms(), None);
    }

    #[test]
    fn render_once_is_ignored_while_running() {
        let mut c = ready(vec![PassConfig::new()]);
        c.start();
        c.render_once(0.0);
        assert_eq!(c.backend().frames(), 0);

        c.stop();
        c.render_once(0.0);
        assert_eq!(c.backend().frames(), 1);
    }

    #[test]
    fn texture_loads_upload_at_the_next_frame() {
        let image = image::RgbaImage::new(2, 2);
        let mut c = ready(vec![PassConfig::new().texture(TextureConfig::from_image(image, "photo"))]);
        assert!(!c.textures_ready());

        c.render(0.0);
        assert!(c.textures_ready());
        assert!(matches!(c.backend().commands()[0], Recorded::CreateTexture { size: [2, 2], .. }));
    }

    #[test]
    fn wait_for_textures_reports_a_missing_file() {
        let mut c = ready(vec![PassConfig::new().texture(TextureConfig::from_path("/nonexistent/x.png", "photo"))]);
        assert!(c.wait_for_textures(Duration::from_secs(5)));
        assert!(!c
            .backend()
            .commands()
            .iter()
            .any(|cmd| matches!(cmd, Recorded::CreateTexture { .. })));
    }

    // ── switching ─────────────────────────────────────────────────────────

    #[test]
    fn switch_hides_renders_then_shows() {
        let events = Recorder::default();
        let mut c = controller(
            vec![
                labelled("a").chain_pass(labelled("a2")).chain_pass(PassConfig::new()),
                labelled("b").clear_color([0.0, 0.0, 1.0, 1.0]),
            ],
            FrameRate::Uncapped,
        )
        .with_panel(events.clone());
        c.initialize().unwrap();

        assert_eq!(
            *events.0.borrow(),
            vec![
                Event::Programs(vec!["a".to_string(), "b".to_string()]),
                Event::Show(PassId::main(0)),
                Event::Show(PassId::chained(0, 0)),
            ]
        );
        events.0.borrow_mut().clear();
        c.backend_mut().take_commands();

        c.switch_program(1);
        assert_eq!(
            *events.0.borrow(),
            vec![
                Event::Hide(PassId::main(0)),
                Event::Hide(PassId::chained(0, 0)),
                Event::Show(PassId::main(1)),
            ]
        );
        assert_eq!(c.active(), 1);
        assert_eq!(c.backend().clear_color(), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(c.backend().frames(), 1);
        assert_eq!(
            c.backend().draws().next().map(|d| d.program),
            Some(c.program(1).unwrap().main.program())
        );
    }

    #[test]
    fn switch_out_of_range_is_ignored() {
        let events = Recorder::default();
        let mut c = controller(vec![labelled("a")], FrameRate::Uncapped).with_panel(events.clone());
        c.initialize().unwrap();
        events.0.borrow_mut().clear();
        c.backend_mut().take_commands();

        c.switch_program(3);
        assert_eq!(c.active(), 0);
        assert!(events.0.borrow().is_empty());
        assert!(c.backend().commands().is_empty());
    }

    #[test]
    fn switch_while_running_does_not_draw() {
        let mut c = ready(vec![PassConfig::new(), PassConfig::new()]);
        c.start();
        c.switch_program(1);
        assert_eq!(c.active(), 1);
        assert_eq!(c.backend().frames(), 0);
    }

    // ── parameters ────────────────────────────────────────────────────────

    #[test]
    fn redraw_edits_render_when_stopped() {
        let mut c = ready(vec![PassConfig::new()]);
        assert!(c.set_uniform(PassId::main(0), "gain", 2.0, ParamChange::Quiet));
        assert_eq!(c.backend().frames(), 0);

        assert!(c.set_uniform(PassId::main(0), "gain", 3.0, ParamChange::Redraw));
        assert_eq!(c.backend().frames(), 1);
        assert_eq!(c.uniform(PassId::main(0), "gain"), Some(&UniformValue::Float(3.0)));

        assert!(!c.set_uniform(PassId::chained(0, 4), "gain", 1.0, ParamChange::Redraw));
    }

    #[test]
    fn toggling_a_chain_pass_redraws() {
        let mut c = ready(vec![PassConfig::new().chain_pass(PassConfig::new())]);

        assert!(!c.set_pass_enabled(PassId::main(0), false));
        assert!(c.set_pass_enabled(PassId::chained(0, 0), false));
        assert_eq!(c.backend().frames(), 1);
        assert_eq!(c.backend().draws().count(), 1);
        assert!(!c.pass(PassId::chained(0, 0)).unwrap().is_enabled());
    }
}
