use std::collections::BTreeMap;

/// Uniform written by the controller with the pipeline resolution in pixels.
pub const RESOLUTION: &str = "resolution";

/// Uniform written every frame with the pointer position in `[0, 1]²`, origin bottom-left.
pub const MOUSE: &str = "mouse";

/// Uniform written every frame with the frame time in seconds.
pub const TIME: &str = "time";

/// A value held in a pass's uniform set.
///
/// Matrices are column-major, as uploaded by `glUniformMatrix*fv` with
/// `transpose = false`. Sampler uniforms hold texture unit indices as `Int`.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
}

impl UniformValue {
    /// Float components in declaration order, or an empty slice for integer values.
    pub fn float_components(&self) -> &[f32] {
        match self {
            UniformValue::Float(v) => std::slice::from_ref(v),
            UniformValue::Vec2(v) => v,
            UniformValue::Vec3(v) => v,
            UniformValue::Vec4(v) => v,
            UniformValue::Mat2(v) => v,
            UniformValue::Mat3(v) => v,
            UniformValue::Mat4(v) => v,
            UniformValue::FloatArray(v) => v,
            _ => &[],
        }
    }

    /// Integer components in declaration order, or an empty slice for float values.
    ///
    /// `Bool` has no backing integer storage; see [`UniformValue::as_int`].
    pub fn int_components(&self) -> &[i32] {
        match self {
            UniformValue::Int(v) => std::slice::from_ref(v),
            UniformValue::IVec2(v) => v,
            UniformValue::IVec3(v) => v,
            UniformValue::IVec4(v) => v,
            UniformValue::IntArray(v) => v,
            _ => &[],
        }
    }

    /// Number of scalar components carried by the value.
    pub fn len(&self) -> usize {
        match self {
            UniformValue::Bool(_) => 1,
            other => other.float_components().len() + other.int_components().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the value as a single integer (texture units, flags).
    pub fn as_int(&self) -> Option<i32> {
        match self {
            UniformValue::Int(v) => Some(*v),
            UniformValue::Bool(b) => Some(i32::from(*b)),
            UniformValue::Float(f) if f.fract() == 0.0 => Some(*f as i32),
            _ => None,
        }
    }

    /// Reads the value as a single float.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(v) => Some(*v),
            UniformValue::Int(v) => Some(*v as f32),
            UniformValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<[i32; 2]> for UniformValue {
    fn from(v: [i32; 2]) -> Self {
        UniformValue::IVec2(v)
    }
}

impl From<[i32; 3]> for UniformValue {
    fn from(v: [i32; 3]) -> Self {
        UniformValue::IVec3(v)
    }
}

impl From<[i32; 4]> for UniformValue {
    fn from(v: [i32; 4]) -> Self {
        UniformValue::IVec4(v)
    }
}

impl From<[f32; 9]> for UniformValue {
    fn from(v: [f32; 9]) -> Self {
        UniformValue::Mat3(v)
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(v: [f32; 16]) -> Self {
        UniformValue::Mat4(v)
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(v: Vec<f32>) -> Self {
        UniformValue::FloatArray(v)
    }
}

impl From<Vec<i32>> for UniformValue {
    fn from(v: Vec<i32>) -> Self {
        UniformValue::IntArray(v)
    }
}

/// Named uniform values owned by a pass.
///
/// Names that the compiled shader does not declare are kept and simply never
/// reach the GPU, so one set can be shared across shader variants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    values: BTreeMap<String, UniformValue>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reserved uniforms with their initial values.
    pub fn reserved() -> Self {
        let mut set = Self::new();
        set.set(RESOLUTION, [500.0, 500.0]);
        set.set(MOUSE, [0.0, 0.0]);
        set.set(TIME, 0.0);
        set
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<UniformValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<UniformValue>> FromIterator<(K, V)> for UniformSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = UniformSet::new();
        for (k, v) in iter {
            set.set(k, v);
        }
        set
    }
}
