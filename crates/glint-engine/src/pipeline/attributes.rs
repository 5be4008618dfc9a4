//! Vertex attribute provisioning.
//!
//! Attributes are matched to the vertex shader's located inputs by name.
//! The resulting [`VertexLayout`] is captured once and baked into the
//! backend pipeline; every later frame binds the same buffers.

use std::collections::BTreeMap;

use crate::backend::{BufferHandle, RenderBackend};

use super::config::{AttributeConfig, AttributeData, INDICES, POSITION};
use super::error::PipelineError;
use super::shader::VertexInput;

/// Value fed to shader inputs that no attribute provides.
const DEFAULT_ATTRIBUTE: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// One shader input bound to a buffer. `stride` and `offset` are in bytes;
/// a zero stride repeats the first element for every vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBinding {
    pub name: String,
    pub buffer: BufferHandle,
    pub location: u32,
    pub components: u32,
    pub stride: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
}

impl VertexLayout {
    pub fn binding(&self, name: &str) -> Option<&VertexBinding> {
        self.bindings.iter().find(|b| b.name == name)
    }
}

/// Buffers and layout of a provisioned pass.
#[derive(Debug, Clone)]
pub struct AttributeBinder {
    buffers: BTreeMap<String, BufferHandle>,
    index_buffer: Option<BufferHandle>,
    layout: VertexLayout,
    count: u32,
}

impl AttributeBinder {
    pub fn provision<B: RenderBackend>(
        pass: &str,
        attributes: &BTreeMap<String, AttributeConfig>,
        inputs: &[VertexInput],
        backend: &mut B,
    ) -> Result<Self, PipelineError> {
        let backend_error = |source| PipelineError::Backend {
            pass: pass.to_string(),
            source,
        };

        for (name, attr) in attributes {
            if let AttributeData::Shared(source_name) = &attr.data {
                let valid = name != INDICES
                    && attributes
                        .get(source_name)
                        .is_some_and(|src| src.values().is_some());
                if !valid {
                    return Err(PipelineError::UnknownAttributeSource {
                        pass: pass.to_string(),
                        attribute: name.clone(),
                        source_name: source_name.clone(),
                    });
                }
            }
        }

        let indices = attributes
            .get(INDICES)
            .map(|attr| index_values(pass, attr))
            .transpose()?;
        let located = inputs.iter().map(|i| i.name.as_str());
        check_lengths(pass, attributes, located, indices.as_deref())?;

        let index_buffer = match &indices {
            Some(indices) => {
                let buffer = backend
                    .create_index_buffer(&format!("{pass}/{INDICES}"), indices)
                    .map_err(backend_error)?;
                Some(buffer)
            }
            None => None,
        };

        let mut buffers = BTreeMap::new();
        for (name, attr) in attributes {
            if name == INDICES {
                continue;
            }
            let Some(values) = attr.values() else {
                continue;
            };

            let located = inputs.iter().any(|i| &i.name == name);
            let shared = attributes
                .values()
                .any(|a| matches!(&a.data, AttributeData::Shared(src) if src == name));
            if !located && !shared {
                log::debug!("pass '{pass}': attribute '{name}' has no location in the program; skipped");
                continue;
            }

            let buffer = backend
                .create_vertex_buffer(&format!("{pass}/{name}"), values)
                .map_err(backend_error)?;
            buffers.insert(name.clone(), buffer);
        }

        let mut default_buffer = None;
        let mut bindings = Vec::with_capacity(inputs.len());
        for input in inputs {
            let binding = match attributes.get(&input.name) {
                Some(attr) if input.name != INDICES => {
                    let owner = match &attr.data {
                        AttributeData::Values(_) => &input.name,
                        AttributeData::Shared(source_name) => source_name,
                    };
                    let Some(buffer) = buffers.get(owner).copied() else {
                        continue;
                    };
                    VertexBinding {
                        name: input.name.clone(),
                        buffer,
                        location: input.location,
                        components: attr.components,
                        stride: u64::from(attr.step()) * 4,
                        offset: u64::from(attr.offset) * 4,
                    }
                }
                _ => {
                    let buffer = match default_buffer {
                        Some(buffer) => buffer,
                        None => {
                            let buffer = backend
                                .create_vertex_buffer(&format!("{pass}/default attribute"), &DEFAULT_ATTRIBUTE)
                                .map_err(backend_error)?;
                            default_buffer = Some(buffer);
                            buffer
                        }
                    };
                    log::debug!(
                        "pass '{pass}': shader input '{}' has no attribute; using (0, 0, 0, 1)",
                        input.name
                    );
                    VertexBinding {
                        name: input.name.clone(),
                        buffer,
                        location: input.location,
                        components: DEFAULT_ATTRIBUTE.len() as u32,
                        stride: 0,
                        offset: 0,
                    }
                }
            };
            bindings.push(binding);
        }

        Ok(Self {
            buffers,
            index_buffer,
            layout: VertexLayout { bindings },
            count: draw_count(attributes),
        })
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Re-uploads changed attribute data into the existing buffers.
    ///
    /// Data that no longer fits the buffer it was provisioned into, or that
    /// leaves a bound attribute shorter than the draw, is dropped with a
    /// warning and the draw count is left as it was; otherwise the count is
    /// recomputed.
    pub fn sync<B: RenderBackend>(
        &mut self,
        pass: &str,
        attributes: &BTreeMap<String, AttributeConfig>,
        changed: impl IntoIterator<Item = String>,
        backend: &mut B,
    ) {
        let indices = match attributes.get(INDICES).map(|attr| index_values(pass, attr)).transpose() {
            Ok(indices) => indices,
            Err(e) => {
                log::warn!("{e}; update ignored");
                return;
            }
        };
        let bound = self.layout.bindings.iter().map(|b| b.name.as_str());
        if let Err(e) = check_lengths(pass, attributes, bound, indices.as_deref()) {
            log::warn!("{e}; update ignored");
            return;
        }

        let mut complete = true;
        for name in changed {
            let Some(attr) = attributes.get(&name) else {
                continue;
            };

            let result = if name == INDICES {
                let (Some(buffer), Some(indices)) = (self.index_buffer, indices.as_deref()) else {
                    continue;
                };
                backend.write_index_buffer(buffer, indices)
            } else {
                let (Some(buffer), Some(values)) = (self.buffers.get(&name), attr.values()) else {
                    log::debug!("pass '{pass}': attribute '{name}' was not provisioned; update ignored");
                    continue;
                };
                backend.write_vertex_buffer(*buffer, values)
            };

            match result {
                Ok(()) => log::trace!("pass '{pass}': re-uploaded attribute '{name}'"),
                Err(e) => {
                    log::warn!("pass '{pass}': attribute '{name}' not updated: {e}");
                    complete = false;
                }
            }
        }

        if complete {
            self.count = draw_count(attributes);
        }
    }
}

/// Index count when indexed, otherwise the number of positions.
pub fn draw_count(attributes: &BTreeMap<String, AttributeConfig>) -> u32 {
    if let Some(indices) = attributes.get(INDICES) {
        return indices.values().map_or(0, |v| v.len() as u32);
    }

    let Some(position) = attributes.get(POSITION) else {
        return 0;
    };

    let step = position.step();
    match source_values(position, attributes) {
        Some(v) if step > 0 => (v.len() / step as usize) as u32,
        _ => 0,
    }
}

/// The values an attribute reads, following a shared source.
fn source_values<'a>(attr: &'a AttributeConfig, attributes: &'a BTreeMap<String, AttributeConfig>) -> Option<&'a [f32]> {
    match &attr.data {
        AttributeData::Values(v) => Some(v),
        AttributeData::Shared(source) => attributes.get(source)?.values(),
    }
}

/// Vertices an attribute can feed before reading past its data. `None` for
/// attributes without data of their own.
fn vertices_available(attr: &AttributeConfig, attributes: &BTreeMap<String, AttributeConfig>) -> Option<u32> {
    let data = source_values(attr, attributes)?;
    let step = attr.step() as usize;
    if step == 0 {
        return None;
    }
    let first = attr.offset as usize + attr.components as usize;
    Some(data.len().checked_sub(first).map_or(0, |rest| rest / step + 1) as u32)
}

/// Every bound attribute must cover the vertices the draw reads: the draw
/// count, or one past the largest index of an indexed draw.
fn check_lengths<'a>(
    pass: &str,
    attributes: &BTreeMap<String, AttributeConfig>,
    bound: impl IntoIterator<Item = &'a str>,
    indices: Option<&[u16]>,
) -> Result<(), PipelineError> {
    let required = match indices {
        Some(indices) => indices.iter().max().map_or(0, |max| u32::from(*max) + 1),
        None => draw_count(attributes),
    };
    if required == 0 {
        return Ok(());
    }

    for name in bound {
        if name == INDICES {
            continue;
        }
        let Some(available) = attributes.get(name).and_then(|attr| vertices_available(attr, attributes)) else {
            continue;
        };
        if available < required {
            return Err(PipelineError::AttributeLength {
                pass: pass.to_string(),
                attribute: name.to_string(),
                available,
                required,
            });
        }
    }
    Ok(())
}

fn index_values(pass: &str, attr: &AttributeConfig) -> Result<Vec<u16>, PipelineError> {
    let Some(values) = attr.values() else {
        return Err(PipelineError::InvalidConfig {
            pass: pass.to_string(),
            reason: format!("'{INDICES}' must hold index values"),
        });
    };

    values
        .iter()
        .map(|v| {
            if v.fract() == 0.0 && (0.0..=f32::from(u16::MAX)).contains(v) {
                Ok(*v as u16)
            } else {
                Err(PipelineError::InvalidIndices {
                    pass: pass.to_string(),
                    value: *v,
                })
            }
        })
        .collect()
}
