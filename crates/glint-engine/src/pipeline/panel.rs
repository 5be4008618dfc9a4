//! Parameter panel collaborator.
//!
//! The engine does not draw any UI. It tells a [`ParameterPanel`] which
//! passes are visible and the panel edits them back through
//! `PipelineController::set_uniform` and `set_pass_enabled`.

use super::uniform::UniformSet;

/// A tunable uniform: slider range and step.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub uniform: String,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamSpec {
    pub fn new(uniform: impl Into<String>, min: f32, max: f32, step: f32) -> Self {
        Self {
            uniform: uniform.into(),
            min,
            max,
            step,
        }
    }
}

/// Panel section of a pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelSpec {
    pub title: Option<String>,
    pub open: bool,
    /// Offer an on/off switch for the pass.
    pub switch: bool,
    pub params: Vec<ParamSpec>,
}

impl PanelSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    pub fn with_switch(mut self) -> Self {
        self.switch = true;
        self
    }

    pub fn param(mut self, uniform: impl Into<String>, min: f32, max: f32, step: f32) -> Self {
        self.params.push(ParamSpec::new(uniform, min, max, step));
        self
    }
}

/// Identifies a pass: its program and, for chained passes, the chain index.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PassId {
    pub program: usize,
    pub chain: Option<usize>,
}

impl PassId {
    pub fn main(program: usize) -> Self {
        Self { program, chain: None }
    }

    pub fn chained(program: usize, index: usize) -> Self {
        Self {
            program,
            chain: Some(index),
        }
    }
}

/// What a panel sees of a pass when it is shown.
#[derive(Debug)]
pub struct PanelEntry<'a> {
    pub pass: PassId,
    pub name: &'a str,
    pub spec: &'a PanelSpec,
    pub uniforms: &'a UniformSet,
    pub enabled: bool,
}

/// Whether a parameter edit re-renders a stopped pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ParamChange {
    #[default]
    Quiet,
    Redraw,
}

pub trait ParameterPanel {
    /// Program names for the program selector, after initialization.
    fn programs(&mut self, _names: &[String], _active: usize) {}

    fn show(&mut self, entry: &PanelEntry<'_>);

    fn hide(&mut self, pass: PassId);
}

impl<P: ParameterPanel + ?Sized> ParameterPanel for Box<P> {
    fn programs(&mut self, names: &[String], active: usize) {
        (**self).programs(names, active);
    }

    fn show(&mut self, entry: &PanelEntry<'_>) {
        (**self).show(entry);
    }

    fn hide(&mut self, pass: PassId) {
        (**self).hide(pass);
    }
}
