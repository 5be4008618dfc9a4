//! Glint engine crate.
//!
//! A multi-pass shader pipeline: programs of GLSL passes rendering to the
//! window or to offscreen targets, with chained passes composited after the
//! main pass and a frame loop that can be capped, stopped and switched.
//!
//! Layers, bottom-up:
//! - `backend`: GPU command surface (`WgpuBackend`, `HeadlessBackend`)
//! - `pipeline`: configuration, shader reflection, passes, controller
//! - `device`, `input`, `time`, `window`: the `winit` + `wgpu` runtime

pub mod backend;
pub mod device;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod time;
pub mod window;

pub use pipeline::{
    ControllerState, DrawMode, PanelSpec, ParamChange, ParameterPanel, PassConfig, PassId,
    PipelineController, PipelineError, TargetConfig, TextureConfig,
};
pub use time::FrameRate;
