//! Named shader parameters
//!
//! Effects bind their parameters by name into a [`ParamBlock`]; backends read
//! the block when they run the effect's pass.

use glam::{Vec2, Vec3, Vec4};
use std::collections::BTreeMap;

/// Opaque handle to a texture registered with a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// A single shader parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Scalar.
    Float(f32),
    /// Two-component vector.
    Vec2(Vec2),
    /// Three-component vector (positions).
    Vec3(Vec3),
    /// Four-component vector (colors are stored as linear RGBA).
    Vec4(Vec4),
    /// Texture binding; `None` binds the backend's default texture.
    Texture(Option<TextureId>),
}

impl ParamValue {
    /// Expand the value into a single `vec4<f32>` uniform slot.
    ///
    /// Textures occupy no uniform data and expand to zero.
    pub fn to_slot(self) -> [f32; 4] {
        match self {
            ParamValue::Float(v) => [v, 0.0, 0.0, 0.0],
            ParamValue::Vec2(v) => [v.x, v.y, 0.0, 0.0],
            ParamValue::Vec3(v) => [v.x, v.y, v.z, 0.0],
            ParamValue::Vec4(v) => v.to_array(),
            ParamValue::Texture(_) => [0.0; 4],
        }
    }
}

/// Parameters bound to one effect instance, keyed by uniform name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBlock {
    values: BTreeMap<&'static str, ParamValue>,
}

impl ParamBlock {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value, replacing any previous binding of the same name.
    pub fn set(&mut self, name: &'static str, value: ParamValue) {
        self.values.insert(name, value);
    }

    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.set(name, ParamValue::Float(value));
    }

    pub fn set_vec2(&mut self, name: &'static str, value: Vec2) {
        self.set(name, ParamValue::Vec2(value));
    }

    pub fn set_vec3(&mut self, name: &'static str, value: Vec3) {
        self.set(name, ParamValue::Vec3(value));
    }

    pub fn set_color(&mut self, name: &'static str, rgba: Vec4) {
        self.set(name, ParamValue::Vec4(rgba));
    }

    pub fn set_texture(&mut self, name: &'static str, texture: Option<TextureId>) {
        self.set(name, ParamValue::Texture(texture));
    }

    /// Look up a bound value.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    /// Look up a scalar; `None` if unbound or not a scalar.
    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<Vec2> {
        match self.get(name)? {
            ParamValue::Vec2(v) => Some(v),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            ParamValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn color(&self, name: &str) -> Option<Vec4> {
        match self.get(name)? {
            ParamValue::Vec4(v) => Some(v),
            _ => None,
        }
    }

    /// Texture bound under `name`. Unbound and explicitly cleared both give `None`.
    pub fn texture(&self, name: &str) -> Option<TextureId> {
        match self.get(name)? {
            ParamValue::Texture(id) => id,
            _ => None,
        }
    }

    /// Pack the named values into consecutive `vec4<f32>` slots, in `layout` order.
    ///
    /// Unbound names pack as zero.
    pub fn pack_slots(&self, layout: &[&str]) -> Vec<[f32; 4]> {
        layout
            .iter()
            .map(|name| self.get(name).map(ParamValue::to_slot).unwrap_or([0.0; 4]))
            .collect()
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParamValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}
