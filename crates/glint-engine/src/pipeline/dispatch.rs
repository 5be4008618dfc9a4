//! Uniform dispatch.
//!
//! Maps uniform names to setters built once from the program's reflection.
//! Setters write into a CPU-side copy of the uniform block; the pass hands the
//! block to the backend at draw time. Texture slots are addressable by name
//! as well and hold the texture unit they sample.

use std::borrow::Cow;
use std::collections::BTreeMap;

use super::shader::{Reflection, ScalarType, Shape, UniformType};
use super::uniform::{UniformSet, UniformValue};

/// How a single uniform name is written.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformSetter {
    /// One element at `offset`.
    Components { offset: u32, ty: UniformType },
    /// `len` elements starting at `offset`, `stride` bytes apart.
    Vector {
        offset: u32,
        ty: UniformType,
        len: u32,
        stride: u32,
    },
    /// Texture slot; the value is a texture unit.
    TextureUnit { slot: usize },
}

#[derive(Debug, Clone, Default)]
pub struct UniformDispatchTable {
    setters: BTreeMap<String, UniformSetter>,
    block: Vec<u8>,
    texture_units: Vec<Option<u32>>,
}

impl UniformDispatchTable {
    pub fn new(reflection: &Reflection) -> Self {
        let mut setters = BTreeMap::new();
        let mut block = Vec::new();

        if let Some(uniform_block) = &reflection.uniform_block {
            block = vec![0u8; uniform_block.size as usize];
            for member in &uniform_block.members {
                let setter = match member.array {
                    Some(array) => UniformSetter::Vector {
                        offset: member.offset,
                        ty: member.ty,
                        len: array.len,
                        stride: array.stride,
                    },
                    None => UniformSetter::Components {
                        offset: member.offset,
                        ty: member.ty,
                    },
                };
                setters.insert(member.name.clone(), setter);
            }
        }

        for (slot, texture) in reflection.textures.iter().enumerate() {
            setters.insert(texture.name.clone(), UniformSetter::TextureUnit { slot });
        }

        Self {
            setters,
            block,
            texture_units: vec![None; reflection.textures.len()],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.setters.contains_key(name)
    }

    pub fn setter(&self, name: &str) -> Option<&UniformSetter> {
        self.setters.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.setters.keys().map(String::as_str)
    }

    /// Writes one value. Unknown names are ignored and return `false`.
    pub fn set(&mut self, name: &str, value: &UniformValue) -> bool {
        let Some(setter) = self.setters.get(name).copied() else {
            log::trace!("uniform '{name}' is not used by the program");
            return false;
        };

        match setter {
            UniformSetter::Components { offset, ty } => {
                write_elements(&mut self.block, offset, ty, 1, 0, value);
            }
            UniformSetter::Vector {
                offset,
                ty,
                len,
                stride,
            } => {
                write_elements(&mut self.block, offset, ty, len, stride, value);
            }
            UniformSetter::TextureUnit { slot } => {
                self.texture_units[slot] = value.as_int().and_then(|u| u32::try_from(u).ok());
            }
        }
        true
    }

    /// Writes every value of the set.
    pub fn apply(&mut self, uniforms: &UniformSet) {
        for (name, value) in uniforms.iter() {
            self.set(name, value);
        }
    }

    /// Current contents of the uniform block.
    pub fn block(&self) -> &[u8] {
        &self.block
    }

    /// Texture unit per reflected texture slot.
    pub fn texture_units(&self) -> &[Option<u32>] {
        &self.texture_units
    }
}

fn write_elements(block: &mut [u8], offset: u32, ty: UniformType, len: u32, stride: u32, value: &UniformValue) {
    let per_element = ty.components();
    match ty.scalar {
        ScalarType::Float => {
            let values = float_values(value);
            for (i, chunk) in values.chunks(per_element).take(len as usize).enumerate() {
                write_element(block, offset + i as u32 * stride, ty, chunk);
            }
        }
        ScalarType::Int => {
            let values = int_values(value);
            for (i, chunk) in values.chunks(per_element).take(len as usize).enumerate() {
                write_element(block, offset + i as u32 * stride, ty, chunk);
            }
        }
        ScalarType::Uint => {
            let values: Vec<u32> = int_values(value).iter().map(|v| *v as u32).collect();
            for (i, chunk) in values.chunks(per_element).take(len as usize).enumerate() {
                write_element(block, offset + i as u32 * stride, ty, chunk);
            }
        }
        ScalarType::Bool => {
            let values = bool_values(value);
            for (i, chunk) in values.chunks(per_element).take(len as usize).enumerate() {
                write_element(block, offset + i as u32 * stride, ty, chunk);
            }
        }
    }
}

fn write_element<T: bytemuck::Pod>(block: &mut [u8], offset: u32, ty: UniformType, components: &[T]) {
    match ty.shape {
        Shape::Scalar | Shape::Vector(_) => {
            for (i, c) in components.iter().enumerate() {
                write_scalar(block, offset + 4 * i as u32, c);
            }
        }
        Shape::Matrix { rows, .. } => {
            let column_stride = ty.column_stride();
            for (i, c) in components.iter().enumerate() {
                let column = i as u32 / rows as u32;
                let row = i as u32 % rows as u32;
                write_scalar(block, offset + column * column_stride + row * 4, c);
            }
        }
    }
}

fn write_scalar<T: bytemuck::Pod>(block: &mut [u8], offset: u32, value: &T) {
    let bytes = bytemuck::bytes_of(value);
    let start = offset as usize;
    if let Some(dst) = block.get_mut(start..start + bytes.len()) {
        dst.copy_from_slice(bytes);
    }
}

fn float_values(value: &UniformValue) -> Cow<'_, [f32]> {
    match value {
        UniformValue::Bool(b) => Cow::Owned(vec![if *b { 1.0 } else { 0.0 }]),
        v if !v.float_components().is_empty() => Cow::Borrowed(v.float_components()),
        v => Cow::Owned(v.int_components().iter().map(|i| *i as f32).collect()),
    }
}

/// Booleans as stored in the block: 1 for any nonzero component.
fn bool_values(value: &UniformValue) -> Vec<u32> {
    match value {
        UniformValue::Bool(b) => vec![u32::from(*b)],
        v if !v.float_components().is_empty() => {
            v.float_components().iter().map(|f| u32::from(*f != 0.0)).collect()
        }
        v => v.int_components().iter().map(|i| u32::from(*i != 0)).collect(),
    }
}

fn int_values(value: &UniformValue) -> Cow<'_, [i32]> {
    match value {
        UniformValue::Bool(b) => Cow::Owned(vec![i32::from(*b)]),
        v if !v.int_components().is_empty() => Cow::Borrowed(v.int_components()),
        v => Cow::Owned(v.float_components().iter().map(|f| *f as i32).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::shader::{
        compile_program, ArrayLayout, TextureSlot, UniformBlock, UniformMember,
    };
    use crate::pipeline::DEFAULT_VERTEX_SHADER;

    fn float_at(block: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(block[offset..offset + 4].try_into().unwrap())
    }

    fn int_at(block: &[u8], offset: usize) -> i32 {
        i32::from_ne_bytes(block[offset..offset + 4].try_into().unwrap())
    }

    fn uint_at(block: &[u8], offset: usize) -> u32 {
        u32::from_ne_bytes(block[offset..offset + 4].try_into().unwrap())
    }

    fn member(name: &str, scalar: ScalarType, shape: Shape, offset: u32) -> UniformMember {
        UniformMember {
            name: name.to_string(),
            ty: UniformType { scalar, shape },
            offset,
            array: None,
        }
    }

    fn reflection() -> Reflection {
        let mut weights = member("weights", ScalarType::Float, Shape::Scalar, 32);
        weights.array = Some(ArrayLayout { len: 3, stride: 16 });

        Reflection {
            uniform_block: Some(UniformBlock {
                binding: 0,
                size: 160,
                members: vec![
                    member("resolution", ScalarType::Float, Shape::Vector(2), 0),
                    member("time", ScalarType::Float, Shape::Scalar, 8),
                    member("mode", ScalarType::Int, Shape::Scalar, 12),
                    member("offset", ScalarType::Float, Shape::Vector(3), 16),
                    weights,
                    member("tint", ScalarType::Float, Shape::Matrix { columns: 3, rows: 3 }, 80),
                    member("rot", ScalarType::Float, Shape::Matrix { columns: 2, rows: 2 }, 128),
                    member("enabled", ScalarType::Bool, Shape::Scalar, 156),
                ],
            }),
            textures: vec![TextureSlot {
                name: "feedback".to_string(),
                texture_binding: 1,
                sampler_binding: 2,
            }],
            vertex_inputs: Vec::new(),
        }
    }

    // ── setters ───────────────────────────────────────────────────────────

    #[test]
    fn arrays_get_vector_setters() {
        let table = UniformDispatchTable::new(&reflection());
        assert!(matches!(
            table.setter("weights"),
            Some(UniformSetter::Vector { len: 3, stride: 16, .. })
        ));
        assert!(matches!(table.setter("time"), Some(UniformSetter::Components { .. })));
        assert!(matches!(table.setter("feedback"), Some(UniformSetter::TextureUnit { slot: 0 })));
    }

    #[test]
    fn unknown_names_are_a_no_op() {
        let mut table = UniformDispatchTable::new(&reflection());
        let before = table.block().to_vec();
        assert!(!table.set("nope", &UniformValue::Float(1.0)));
        assert_eq!(table.block(), &before[..]);
    }

    // ── writes ────────────────────────────────────────────────────────────

    #[test]
    fn scalars_and_vectors_land_at_their_offsets() {
        let mut table = UniformDispatchTable::new(&reflection());
        assert!(table.set("resolution", &UniformValue::Vec2([640.0, 480.0])));
        assert!(table.set("time", &UniformValue::Float(1.5)));
        assert!(table.set("mode", &UniformValue::Int(3)));

        let block = table.block();
        assert_eq!(float_at(block, 0), 640.0);
        assert_eq!(float_at(block, 4), 480.0);
        assert_eq!(float_at(block, 8), 1.5);
        assert_eq!(int_at(block, 12), 3);
    }

    #[test]
    fn values_convert_to_the_declared_scalar() {
        let mut table = UniformDispatchTable::new(&reflection());
        table.set("mode", &UniformValue::Float(2.0));
        table.set("time", &UniformValue::Int(4));
        assert_eq!(int_at(table.block(), 12), 2);
        assert_eq!(float_at(table.block(), 8), 4.0);
    }

    #[test]
    fn array_elements_follow_the_stride() {
        let mut table = UniformDispatchTable::new(&reflection());
        table.set("weights", &UniformValue::FloatArray(vec![0.25, 0.5, 0.75, 9.0]));

        let block = table.block();
        assert_eq!(float_at(block, 32), 0.25);
        assert_eq!(float_at(block, 48), 0.5);
        assert_eq!(float_at(block, 64), 0.75);
        // fourth value exceeds the declared length
        assert_eq!(float_at(block, 80), 0.0);
    }

    #[test]
    fn matrix_columns_are_padded() {
        let mut table = UniformDispatchTable::new(&reflection());
        let m: Vec<f32> = (1..=9).map(|v| v as f32).collect();
        table.set("tint", &UniformValue::Mat3(m.try_into().unwrap()));
        table.set("rot", &UniformValue::Mat2([1.0, 2.0, 3.0, 4.0]));

        let block = table.block();
        assert_eq!(float_at(block, 80), 1.0);
        assert_eq!(float_at(block, 88), 3.0);
        assert_eq!(float_at(block, 92), 0.0);
        assert_eq!(float_at(block, 96), 4.0);
        assert_eq!(float_at(block, 112), 7.0);

        assert_eq!(float_at(block, 128), 1.0);
        assert_eq!(float_at(block, 132), 2.0);
        assert_eq!(float_at(block, 144), 3.0);
        assert_eq!(float_at(block, 148), 4.0);
    }

    #[test]
    fn booleans_are_written_as_words() {
        let mut table = UniformDispatchTable::new(&reflection());
        table.set("enabled", &UniformValue::Bool(true));
        assert_eq!(uint_at(table.block(), 156), 1);
        table.set("enabled", &UniformValue::Float(0.25));
        assert_eq!(uint_at(table.block(), 156), 1);
        table.set("enabled", &UniformValue::Int(0));
        assert_eq!(uint_at(table.block(), 156), 0);
    }

    // ── compiled programs ─────────────────────────────────────────────────

    const LOWERED_FS: &str = r#"#version 450
layout(location = 0) out vec4 frag_color;
layout(set = 0, binding = 0) uniform Globals {
    vec2 resolution;
    vec2 mouse;
    float time;
    bool enabled;
    mat2 rot;
    float weights[3];
    int modes[2];
};
void main() {
    vec2 v = rot * vec2(weights[modes[1]], 1.0);
    frag_color = enabled ? vec4(v, 0.0, 1.0) : vec4(0.0);
}
"#;

    #[test]
    fn lowered_members_dispatch_to_reflected_offsets() {
        let program = compile_program("lowered", DEFAULT_VERTEX_SHADER, LOWERED_FS).unwrap();
        let uniforms = program.reflection.uniform_block.clone().unwrap();
        let at = |name: &str| uniforms.member(name).unwrap().offset as usize;

        let mut table = UniformDispatchTable::new(&program.reflection);
        assert!(table.set("enabled", &UniformValue::Bool(true)));
        assert!(table.set("rot", &UniformValue::Mat2([1.0, 2.0, 3.0, 4.0])));
        assert!(table.set("weights", &UniformValue::FloatArray(vec![0.5, 1.5, 2.5])));
        assert!(table.set("modes", &UniformValue::IntArray(vec![7, 9])));

        let block = table.block();
        assert_eq!(uint_at(block, at("enabled")), 1);

        let rot = at("rot");
        assert_eq!(float_at(block, rot), 1.0);
        assert_eq!(float_at(block, rot + 4), 2.0);
        assert_eq!(float_at(block, rot + 16), 3.0);
        assert_eq!(float_at(block, rot + 20), 4.0);

        let weights = at("weights");
        assert_eq!(float_at(block, weights + 16), 1.5);
        assert_eq!(float_at(block, weights + 32), 2.5);
        assert_eq!(int_at(block, at("modes") + 16), 9);
    }

    #[test]
    fn texture_slots_take_units() {
        let mut table = UniformDispatchTable::new(&reflection());
        assert_eq!(table.texture_units(), &[None]);
        table.set("feedback", &UniformValue::Int(2));
        assert_eq!(table.texture_units(), &[Some(2)]);
        table.set("feedback", &UniformValue::Int(-1));
        assert_eq!(table.texture_units(), &[None]);
    }

    #[test]
    fn apply_writes_the_whole_set() {
        let mut table = UniformDispatchTable::new(&reflection());
        let set = UniformSet::new()
            .with("offset", [1.0, 2.0, 3.0])
            .with("unused", 7.0);
        table.apply(&set);
        assert_eq!(float_at(table.block(), 24), 3.0);
    }
}
