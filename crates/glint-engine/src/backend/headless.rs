use std::collections::HashMap;

use image::RgbaImage;

use crate::pipeline::{DrawMode, Sampling};

use super::{
    BackendError, BufferHandle, Destination, DestinationKind, DrawCall, ProgramHandle, ProgramSource,
    RenderBackend, ResolveHandle, TextureHandle,
};

/// A draw as the headless backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub destination: Destination,
    pub program: ProgramHandle,
    pub count: u32,
    pub indexed: bool,
    pub uniforms: Vec<u8>,
    pub textures: Vec<Option<TextureHandle>>,
    pub viewport: [u32; 2],
}

impl RecordedDraw {
    /// Reads an `f32` from the recorded uniform block.
    pub fn uniform_f32(&self, offset: usize) -> Option<f32> {
        let bytes = self.uniforms.get(offset..offset + 4)?;
        Some(f32::from_ne_bytes(bytes.try_into().ok()?))
    }
}

/// Every command issued to a [`HeadlessBackend`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    CreateProgram {
        handle: ProgramHandle,
        label: String,
        draw_mode: DrawMode,
        destinations: Vec<DestinationKind>,
    },
    CreateVertexBuffer {
        handle: BufferHandle,
        label: String,
        len: usize,
    },
    CreateIndexBuffer {
        handle: BufferHandle,
        label: String,
        len: usize,
    },
    WriteVertexBuffer {
        handle: BufferHandle,
        len: usize,
    },
    WriteIndexBuffer {
        handle: BufferHandle,
        len: usize,
    },
    CreateTextureTarget {
        handle: TextureHandle,
        label: String,
        size: [u32; 2],
    },
    CreateResolveTarget {
        handle: ResolveHandle,
        label: String,
        size: [u32; 2],
    },
    CreateTexture {
        handle: TextureHandle,
        label: String,
        size: [u32; 2],
        sampling: Sampling,
    },
    SetClearColor([f32; 4]),
    BeginFrame,
    Draw(RecordedDraw),
    Resolve {
        source: ResolveHandle,
        target: TextureHandle,
    },
    EndFrame,
}

#[derive(Debug, Clone)]
enum BufferData {
    Vertex(Vec<f32>),
    Index(Vec<u16>),
}

/// Backend without a GPU.
///
/// Hands out handles, keeps buffer contents, and records every command so
/// draw ordering and pass behavior can be asserted directly.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u32,
    commands: Vec<Recorded>,
    buffers: HashMap<BufferHandle, BufferData>,
    programs: HashMap<ProgramHandle, String>,
    clear_color: [f32; 4],
    frame_unavailable: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Recorded] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Recorded> {
        std::mem::take(&mut self.commands)
    }

    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.commands.iter().filter_map(|c| match c {
            Recorded::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// Number of `BeginFrame`/`EndFrame` pairs recorded.
    pub fn frames(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Recorded::EndFrame))
            .count()
    }

    pub fn program_label(&self, program: ProgramHandle) -> Option<&str> {
        self.programs.get(&program).map(String::as_str)
    }

    pub fn vertex_data(&self, buffer: BufferHandle) -> Option<&[f32]> {
        match self.buffers.get(&buffer)? {
            BufferData::Vertex(v) => Some(v),
            BufferData::Index(_) => None,
        }
    }

    pub fn index_data(&self, buffer: BufferHandle) -> Option<&[u16]> {
        match self.buffers.get(&buffer)? {
            BufferData::Index(v) => Some(v),
            BufferData::Vertex(_) => None,
        }
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Makes `begin_frame` report that no frame can be drawn, like a lost surface.
    pub fn set_frame_unavailable(&mut self, unavailable: bool) {
        self.frame_unavailable = unavailable;
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn buffer_mut(&mut self, buffer: BufferHandle) -> Result<&mut BufferData, BackendError> {
        self.buffers.get_mut(&buffer).ok_or(BackendError::UnknownHandle {
            kind: "buffer",
            id: buffer.0,
        })
    }
}

fn overwrite<T: Copy>(id: u32, dst: &mut [T], src: &[T]) -> Result<(), BackendError> {
    let size = std::mem::size_of::<T>() as u64;
    let Some(prefix) = dst.get_mut(..src.len()) else {
        return Err(BackendError::BufferOverflow {
            id,
            capacity: dst.len() as u64 * size,
            len: src.len() as u64 * size,
        });
    };
    prefix.copy_from_slice(src);
    Ok(())
}

impl RenderBackend for HeadlessBackend {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramHandle, BackendError> {
        let handle = ProgramHandle(self.next());
        self.programs.insert(handle, source.label.to_string());
        self.commands.push(Recorded::CreateProgram {
            handle,
            label: source.label.to_string(),
            draw_mode: source.draw_mode,
            destinations: source.destinations.to_vec(),
        });
        Ok(handle)
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Result<BufferHandle, BackendError> {
        let handle = BufferHandle(self.next());
        self.buffers.insert(handle, BufferData::Vertex(data.to_vec()));
        self.commands.push(Recorded::CreateVertexBuffer {
            handle,
            label: label.to_string(),
            len: data.len(),
        });
        Ok(handle)
    }

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> Result<BufferHandle, BackendError> {
        let handle = BufferHandle(self.next());
        self.buffers.insert(handle, BufferData::Index(data.to_vec()));
        self.commands.push(Recorded::CreateIndexBuffer {
            handle,
            label: label.to_string(),
            len: data.len(),
        });
        Ok(handle)
    }

    fn write_vertex_buffer(&mut self, buffer: BufferHandle, data: &[f32]) -> Result<(), BackendError> {
        match self.buffer_mut(buffer)? {
            BufferData::Vertex(v) => overwrite(buffer.0, v, data)?,
            BufferData::Index(_) => {
                return Err(BackendError::UnknownHandle {
                    kind: "vertex buffer",
                    id: buffer.0,
                });
            }
        }
        self.commands.push(Recorded::WriteVertexBuffer {
            handle: buffer,
            len: data.len(),
        });
        Ok(())
    }

    fn write_index_buffer(&mut self, buffer: BufferHandle, data: &[u16]) -> Result<(), BackendError> {
        match self.buffer_mut(buffer)? {
            BufferData::Index(v) => overwrite(buffer.0, v, data)?,
            BufferData::Vertex(_) => {
                return Err(BackendError::UnknownHandle {
                    kind: "index buffer",
                    id: buffer.0,
                });
            }
        }
        self.commands.push(Recorded::WriteIndexBuffer {
            handle: buffer,
            len: data.len(),
        });
        Ok(())
    }

    fn create_texture_target(&mut self, label: &str, size: [u32; 2]) -> Result<TextureHandle, BackendError> {
        non_empty(label, size)?;
        let handle = TextureHandle(self.next());
        self.commands.push(Recorded::CreateTextureTarget {
            handle,
            label: label.to_string(),
            size,
        });
        Ok(handle)
    }

    fn create_resolve_target(&mut self, label: &str, size: [u32; 2]) -> Result<ResolveHandle, BackendError> {
        non_empty(label, size)?;
        let handle = ResolveHandle(self.next());
        self.commands.push(Recorded::CreateResolveTarget {
            handle,
            label: label.to_string(),
            size,
        });
        Ok(handle)
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &RgbaImage,
        sampling: Sampling,
    ) -> Result<TextureHandle, BackendError> {
        non_empty(label, [image.width(), image.height()])?;
        let handle = TextureHandle(self.next());
        self.commands.push(Recorded::CreateTexture {
            handle,
            label: label.to_string(),
            size: [image.width(), image.height()],
            sampling,
        });
        Ok(handle)
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.commands.push(Recorded::SetClearColor(color));
    }

    fn begin_frame(&mut self) -> bool {
        if self.frame_unavailable {
            return false;
        }
        self.commands.push(Recorded::BeginFrame);
        true
    }

    fn draw(&mut self, destination: Destination, call: &DrawCall<'_>) -> Result<(), BackendError> {
        self.commands.push(Recorded::Draw(RecordedDraw {
            destination,
            program: call.program,
            count: call.count,
            indexed: call.index_buffer.is_some(),
            uniforms: call.uniforms.to_vec(),
            textures: call.textures.to_vec(),
            viewport: call.viewport,
        }));
        Ok(())
    }

    fn resolve(&mut self, source: ResolveHandle, target: TextureHandle) -> Result<(), BackendError> {
        self.commands.push(Recorded::Resolve { source, target });
        Ok(())
    }

    fn end_frame(&mut self) {
        self.commands.push(Recorded::EndFrame);
    }
}

/// Zero-sized textures are rejected, as on the GPU.
fn non_empty(label: &str, size: [u32; 2]) -> Result<(), BackendError> {
    if size[0] == 0 || size[1] == 0 {
        return Err(BackendError::Texture {
            label: label.to_string(),
            reason: format!("size {}x{} is empty", size[0], size[1]),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_textures_are_rejected() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.create_texture_target("t", [0, 4]).is_err());
        assert!(backend.create_resolve_target("r", [4, 0]).is_err());
        assert!(backend.commands().is_empty());
        assert!(backend.create_texture_target("t", [4, 4]).is_ok());
    }
}
