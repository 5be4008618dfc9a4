use std::fmt;

use crate::backend::BackendError;

/// Shader pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building or initializing a pipeline.
///
/// Everything except `TextureLoad` is fatal to initialization: the controller
/// logs it and goes inert. Missing attribute locations and unknown uniform
/// names are not errors at all; they are skipped silently.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("pass '{pass}': error compiling {stage} shader:\n{log}")]
    ShaderCompile {
        pass: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("pass '{pass}': error linking program: {log}")]
    ShaderLink { pass: String, log: String },

    #[error("pass '{pass}': chained passes cannot declare a chain of their own")]
    NestedChain { pass: String },

    #[error("pass '{pass}': attribute '{attribute}' shares data with unknown attribute '{source_name}'")]
    UnknownAttributeSource {
        pass: String,
        attribute: String,
        source_name: String,
    },

    #[error("pass '{pass}': index {value} is not a valid 16-bit index")]
    InvalidIndices { pass: String, value: f32 },

    #[error("pass '{pass}': attribute '{attribute}' holds {available} vertices, the draw reads {required}")]
    AttributeLength {
        pass: String,
        attribute: String,
        available: u32,
        required: u32,
    },

    #[error("unsupported draw mode '{0}'")]
    UnsupportedDrawMode(String),

    #[error("pass '{pass}': {reason}")]
    InvalidConfig { pass: String, reason: String },

    #[error("texture '{source_name}' failed to load: {reason}")]
    TextureLoad { source_name: String, reason: String },

    #[error("pass '{pass}': {source}")]
    Backend {
        pass: String,
        #[source]
        source: BackendError,
    },
}

impl PipelineError {
    /// The failing shader stage, for compile errors.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            PipelineError::ShaderCompile { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
