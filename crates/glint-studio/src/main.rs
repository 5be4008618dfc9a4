mod panel;
mod programs;

use anyhow::Result;
use glint_engine::backend::WgpuBackend;
use glint_engine::input::{Key, Modifiers};
use glint_engine::logging::{init_logging, LoggingConfig};
use glint_engine::pipeline::{ParamChange, ParameterPanel, PassId, PipelineController};
use glint_engine::time::FrameRate;
use glint_engine::window::{Runtime, RuntimeConfig, RuntimeControl, RuntimeHooks};

use crate::panel::LogPanel;

const FEEDBACK: usize = 1;
const ECHO: PassId = PassId { program: FEEDBACK, chain: Some(0) };
const BLUR: PassId = PassId { program: FEEDBACK, chain: Some(1) };

/// Keyboard bindings:
/// - `1`..`9` switch program
/// - `Space` starts or stops the loop
/// - `Tab` toggles the blur pass
/// - arrows up/down change the echo zoom
struct Studio;

impl RuntimeHooks for Studio {
    fn panel(&mut self) -> Option<Box<dyn ParameterPanel>> {
        Some(Box::new(LogPanel::new()))
    }

    fn on_ready(&mut self, pipeline: &mut PipelineController<WgpuBackend>) {
        log::info!(
            "{} programs ready; 1-{} switch, space pauses, tab toggles blur",
            pipeline.program_count(),
            pipeline.program_count().min(9)
        );
    }

    fn on_key(
        &mut self,
        pipeline: &mut PipelineController<WgpuBackend>,
        key: Key,
        _modifiers: Modifiers,
    ) -> RuntimeControl {
        if let Some(digit) = key.digit()
            && digit > 0
        {
            pipeline.switch_program(usize::from(digit) - 1);
            return RuntimeControl::Continue;
        }

        match key {
            Key::Space if pipeline.is_running() => pipeline.stop(),
            Key::Space => pipeline.start(),
            Key::Tab => {
                let enabled = pipeline.pass(BLUR).is_some_and(|p| p.is_enabled());
                pipeline.set_pass_enabled(BLUR, !enabled);
            }
            Key::ArrowUp | Key::ArrowDown => {
                let step = if key == Key::ArrowUp { 0.05 } else { -0.05 };
                let zoom = pipeline
                    .uniform(ECHO, "zoom")
                    .and_then(|v| v.as_float())
                    .unwrap_or(1.0);
                let zoom = (zoom + step).clamp(1.0, 2.0);
                if pipeline.set_uniform(ECHO, "zoom", zoom, ParamChange::Redraw) {
                    log::info!("echo zoom = {zoom:.2}");
                }
            }
            _ => {}
        }
        RuntimeControl::Continue
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Glint Studio".to_string(),
        resolution: [960, 540],
        frame_rate: FrameRate::Capped(60),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, vec![programs::gradient(), programs::feedback()], Studio)
}
