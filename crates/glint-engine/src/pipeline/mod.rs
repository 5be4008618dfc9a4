//! The multi-pass shader pipeline.
//!
//! A pipeline is a list of programs. Each program is a main pass plus a flat
//! chain of passes drawn after it, and exactly one program is active at a
//! time. The layering, bottom-up:
//! - `uniform`, `config`: values and declarative pass configuration
//! - `shader`, `lowering`: GLSL compile, validation and reflection through naga
//! - `dispatch`, `attributes`, `target`, `texture`: per-pass GPU state
//! - `pass`: a provisioned pass and its draw
//! - `controller`: program ownership, frame loop and switching

mod attributes;
mod config;
mod controller;
mod dispatch;
mod error;
mod lowering;
mod panel;
mod pass;
mod shader;
mod target;
mod texture;
mod uniform;

pub use attributes::{draw_count, VertexBinding, VertexLayout};
pub use config::{
    default_attributes, AttributeConfig, AttributeData, DrawMode, PassCallback, PassConfig, PassDesc,
    PassRole, ProgramDesc, TargetConfig, TargetKind, DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER,
    INDICES, POSITION,
};
pub use controller::{ControllerState, PipelineController, Program};
pub use dispatch::{UniformDispatchTable, UniformSetter};
pub use error::{PipelineError, ShaderStage};
pub use panel::{PanelEntry, PanelSpec, ParamChange, ParamSpec, ParameterPanel, PassId};
pub use pass::{Pass, PassState};
pub use shader::{
    compile_program, strip_array_suffix, ArrayLayout, CompiledProgram, Reflection, ScalarType, Shape,
    TextureSlot, UniformBlock, UniformMember, UniformType, VertexInput,
};
pub use target::{DrawStrategy, RenderTargets, TextureTarget, TextureUnits};
pub use texture::{Filter, Sampling, TextureConfig, TextureLoader, TextureSource, Wrap};
pub use uniform::{UniformSet, UniformValue, MOUSE, RESOLUTION, TIME};
