//! Rendering backends.
//!
//! The pipeline layer never talks to wgpu directly. Everything it needs from
//! the GPU goes through [`RenderBackend`], which deals in opaque handles and
//! self-contained draw calls:
//! - [`WgpuBackend`] renders to a window surface
//! - [`HeadlessBackend`] records commands and is used by tests

mod headless;
mod wgpu_backend;

use image::RgbaImage;

use crate::pipeline::{CompiledProgram, DrawMode, Sampling, VertexLayout};

pub use headless::{HeadlessBackend, Recorded, RecordedDraw};
pub use wgpu_backend::WgpuBackend;

/// Sample count of resolve targets.
pub const RESOLVE_SAMPLES: u32 = 4;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn id(self) -> u32 {
                self.0
            }
        }
    };
}

handle!(
    /// A linked program with its render pipelines.
    ProgramHandle
);
handle!(
    /// A vertex or index buffer.
    BufferHandle
);
handle!(
    /// A sampleable texture (loaded image or texture target).
    TextureHandle
);
handle!(
    /// A multisampled color attachment that resolves into a texture.
    ResolveHandle
);

/// Backend failures.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to create render pipeline '{label}': {reason}")]
    Pipeline { label: String, reason: String },

    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("cannot create texture '{label}': {reason}")]
    Texture { label: String, reason: String },

    #[error("buffer {id} holds {capacity} bytes, cannot write {len}")]
    BufferOverflow { id: u32, capacity: u64, len: u64 },

    #[error("surface error: {0}")]
    Surface(String),
}

/// Where a draw lands.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Destination {
    /// The default framebuffer, cleared to the backend clear color first when `clear`.
    Screen { clear: bool },
    /// A texture target, drawn over without clearing.
    Texture(TextureHandle),
    /// A resolve target, drawn over without clearing.
    Resolve(ResolveHandle),
}

impl Destination {
    pub fn kind(self) -> DestinationKind {
        match self {
            Destination::Screen { .. } => DestinationKind::Screen,
            Destination::Texture(_) => DestinationKind::Texture,
            Destination::Resolve(_) => DestinationKind::Resolve,
        }
    }
}

/// Attachment formats a program may be drawn into.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DestinationKind {
    Screen,
    Texture,
    Resolve,
}

/// Everything a backend needs to build a program.
#[derive(Debug)]
pub struct ProgramSource<'a> {
    pub label: &'a str,
    pub compiled: &'a CompiledProgram,
    pub layout: &'a VertexLayout,
    pub draw_mode: DrawMode,
    /// Destinations the program will be drawn into.
    pub destinations: &'a [DestinationKind],
}

/// One self-contained draw.
///
/// No attachment, vertex or texture state survives the call.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub program: ProgramHandle,
    pub layout: &'a VertexLayout,
    pub index_buffer: Option<BufferHandle>,
    pub count: u32,
    /// Contents of the program's uniform block, empty when it has none.
    pub uniforms: &'a [u8],
    /// Texture bound to each reflected texture slot; `None` samples the placeholder.
    pub textures: &'a [Option<TextureHandle>],
    pub viewport: [u32; 2],
}

/// GPU operations used by the pipeline.
pub trait RenderBackend {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramHandle, BackendError>;

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Result<BufferHandle, BackendError>;

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> Result<BufferHandle, BackendError>;

    /// Overwrites a vertex buffer from its start.
    fn write_vertex_buffer(&mut self, buffer: BufferHandle, data: &[f32]) -> Result<(), BackendError>;

    /// Overwrites an index buffer from its start.
    fn write_index_buffer(&mut self, buffer: BufferHandle, data: &[u16]) -> Result<(), BackendError>;

    /// Color texture usable both as attachment and sampled texture, nearest filtering.
    fn create_texture_target(&mut self, label: &str, size: [u32; 2]) -> Result<TextureHandle, BackendError>;

    /// Multisampled color attachment of [`RESOLVE_SAMPLES`] samples.
    fn create_resolve_target(&mut self, label: &str, size: [u32; 2]) -> Result<ResolveHandle, BackendError>;

    fn create_texture(
        &mut self,
        label: &str,
        image: &RgbaImage,
        sampling: Sampling,
    ) -> Result<TextureHandle, BackendError>;

    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Starts a frame. Returns `false` when nothing can be drawn this frame.
    fn begin_frame(&mut self) -> bool;

    fn draw(&mut self, destination: Destination, call: &DrawCall<'_>) -> Result<(), BackendError>;

    /// Resolves the multisampled attachment into the texture.
    fn resolve(&mut self, source: ResolveHandle, target: TextureHandle) -> Result<(), BackendError>;

    /// Submits and presents the frame.
    fn end_frame(&mut self);
}
