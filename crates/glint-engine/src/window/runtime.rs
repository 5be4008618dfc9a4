use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::backend::{RenderBackend, WgpuBackend};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::translate_window_event;
use crate::input::{normalize_pointer, InputEvent, InputState, Key, KeyState, Modifiers};
use crate::pipeline::{ParameterPanel, PassConfig, PipelineController};
use crate::time::{FrameClock, FrameRate};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Drawable size in physical pixels. Also the pipeline resolution, fixed
    /// for the lifetime of the window.
    pub resolution: [u32; 2],
    pub frame_rate: FrameRate,
    pub gpu: GpuInit,
    /// Close the window on Escape.
    pub exit_on_escape: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "glint".to_string(),
            resolution: [800, 600],
            frame_rate: FrameRate::Uncapped,
            gpu: GpuInit::default(),
            exit_on_escape: true,
        }
    }
}

/// Returned by hooks to keep the loop going or leave it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RuntimeControl {
    Continue,
    Exit,
}

/// Application callbacks driven by the runtime.
pub trait RuntimeHooks {
    /// Panel handed to the controller before initialization.
    fn panel(&mut self) -> Option<Box<dyn ParameterPanel>> {
        None
    }

    /// Called once the pipeline is initialized and started.
    fn on_ready(&mut self, _pipeline: &mut PipelineController<WgpuBackend>) {}

    /// Fresh key presses, after the runtime's own bindings.
    fn on_key(
        &mut self,
        _pipeline: &mut PipelineController<WgpuBackend>,
        _key: Key,
        _modifiers: Modifiers,
    ) -> RuntimeControl {
        RuntimeControl::Continue
    }
}

impl RuntimeHooks for () {}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens a window and runs `programs` in it until the window closes.
    ///
    /// Fails if the window or the GPU cannot be initialized. A pipeline that
    /// fails to initialize is logged and left inert; the window stays up
    /// and the hooks still receive keys.
    pub fn run<H>(config: RuntimeConfig, programs: Vec<PassConfig>, hooks: H) -> Result<()>
    where
        H: RuntimeHooks + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, programs, hooks);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct Session {
    window: Arc<Window>,
    pipeline: PipelineController<WgpuBackend>,
    input: InputState,
    clock: FrameClock,
    last_frame_ms: f64,
}

struct AppState<H: RuntimeHooks> {
    config: RuntimeConfig,
    /// Taken when the window is created.
    programs: Option<Vec<PassConfig>>,
    hooks: H,

    session: Option<Session>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<H: RuntimeHooks> AppState<H> {
    fn new(config: RuntimeConfig, programs: Vec<PassConfig>, hooks: H) -> Self {
        Self {
            config,
            programs: Some(programs),
            hooks,
            session: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn create_session(&mut self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let [width, height] = self.config.resolution;
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(window.clone(), self.config.gpu.clone()))
            .context("GPU initialization failed for window")?;

        let programs = self.programs.take().unwrap_or_default();
        let mut pipeline = PipelineController::new(
            WgpuBackend::new(gpu),
            programs,
            self.config.resolution,
            self.config.frame_rate,
        );
        if let Some(panel) = self.hooks.panel() {
            pipeline = pipeline.with_panel(panel);
        }

        if start_pipeline(&mut pipeline) {
            self.hooks.on_ready(&mut pipeline);
        }

        Ok(Session {
            window,
            pipeline,
            input: InputState::default(),
            clock: FrameClock::default(),
            last_frame_ms: 0.0,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        self.exit_requested = true;
        event_loop.exit();
    }

    /// Runtime key bindings, then the hooks. Returns whether to exit.
    fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if key == Key::Escape && self.config.exit_on_escape {
            return true;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        self.hooks.on_key(&mut session.pipeline, key, modifiers) == RuntimeControl::Exit
    }
}

/// Initializes and starts the pipeline. On failure the controller stays
/// inert in its failed state and `false` is returned.
fn start_pipeline<B: RenderBackend>(pipeline: &mut PipelineController<B>) -> bool {
    match pipeline.initialize() {
        Ok(()) => {
            pipeline.start();
            true
        }
        Err(e) => {
            log::error!("failed to initialize the shader pipeline: {e}");
            false
        }
    }
}

impl<H: RuntimeHooks> ApplicationHandler for AppState<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() || self.exit_requested {
            return;
        }

        match self.create_session(event_loop) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // A stopped pipeline idles; a capped one sleeps until its next frame.
        let Some(session) = &self.session else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };
        if !session.pipeline.is_running() {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        match session.pipeline.next_frame_ms() {
            Some(due_ms) if due_ms > session.clock.elapsed_ms() => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(session.clock.instant_at(due_ms)));
            }
            _ => {
                event_loop.set_control_flow(ControlFlow::Wait);
                session.window.request_redraw();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.window.id() != window_id {
            return;
        }

        let mut pressed = None;
        if let Some(ev) = translate_window_event(&event, session.input.modifiers) {
            let fresh = session.input.apply_event(&ev);
            match ev {
                InputEvent::PointerMoved { x, y } => {
                    let size = session.window.inner_size();
                    let [px, py] = normalize_pointer((x, y), (size.width, size.height));
                    session.pipeline.set_pointer(px, py);
                }
                InputEvent::Key {
                    key,
                    state: KeyState::Pressed,
                    modifiers,
                    ..
                } if fresh => pressed = Some((key, modifiers)),
                _ => {}
            }
        }

        if let Some((key, modifiers)) = pressed
            && self.handle_key(key, modifiers)
        {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested => {
                session.pipeline.stop();
                self.session = None;
                self.exit_requested = true;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                session.pipeline.backend_mut().resize(*new_size);
                session.pipeline.render_once(session.last_frame_ms);
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = session.window.inner_size();
                session.pipeline.backend_mut().resize(new_size);
                session.pipeline.render_once(session.last_frame_ms);
            }

            WindowEvent::RedrawRequested => {
                let now_ms = session.clock.tick().now_ms;
                if session.pipeline.tick(now_ms) {
                    session.last_frame_ms = now_ms;
                } else if !session.pipeline.is_running() {
                    // Exposed while stopped: show the last frame again.
                    session.pipeline.render_once(session.last_frame_ms);
                }

                if session.pipeline.backend().is_lost() {
                    self.fail(event_loop, anyhow::anyhow!("GPU surface lost"));
                }
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::pipeline::ControllerState;

    #[test]
    fn default_config_runs_uncapped_with_escape_to_exit() {
        let config = RuntimeConfig::default();
        assert_eq!(config.frame_rate, FrameRate::Uncapped);
        assert!(config.exit_on_escape);
        assert!(!config.gpu.prefer_srgb);
    }

    #[test]
    fn failed_initialization_leaves_an_inert_pipeline() {
        let broken = PassConfig::new().fragment_shader("#version 450\nvoid main() { nope(); }");
        let mut pipeline =
            PipelineController::new(HeadlessBackend::new(), vec![broken], [32, 32], FrameRate::Uncapped);

        assert!(!start_pipeline(&mut pipeline));
        assert_eq!(pipeline.state(), ControllerState::Failed);
        assert!(!pipeline.is_running());
        assert!(!pipeline.tick(16.0));
    }

    #[test]
    fn initialized_pipelines_start_running() {
        let mut pipeline = PipelineController::new(
            HeadlessBackend::new(),
            vec![PassConfig::new()],
            [32, 32],
            FrameRate::Capped(30),
        );
        assert!(start_pipeline(&mut pipeline));
        assert!(pipeline.is_running());
        assert_eq!(pipeline.next_frame_ms(), Some(0.0));
    }

    #[test]
    fn unit_hooks_offer_no_panel() {
        let mut hooks = ();
        assert!(RuntimeHooks::panel(&mut hooks).is_none());
    }
}
