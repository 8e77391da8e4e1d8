//! Depth circle scan effect
//!
//! Draws a ring on the scene geometry whose squared distance to `origin`
//! falls inside `[min_sqr_distance, max_sqr_distance]`. Animating the window
//! outwards produces an expanding scan wave.

use super::params::{ParamBlock, TextureId};
use glam::{Vec3, Vec4};

/// Uniform names bound by this effect.
pub const ORIGIN: &str = "origin";
pub const COLOR: &str = "color";
pub const TEXTURE: &str = "texture";
pub const TEXTURE_SCALE: &str = "texture_scale";
pub const MIN_SQR_DISTANCE: &str = "min_sqr_distance";
pub const MAX_SQR_DISTANCE: &str = "max_sqr_distance";

/// Texture scale used until [`DepthCircleScan::set_texture`] is called.
pub const DEFAULT_TEXTURE_SCALE: f32 = 15.0;

/// Parameter state of the scan effect.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthCircleScan {
    params: ParamBlock,
}

impl Default for DepthCircleScan {
    fn default() -> Self {
        let mut params = ParamBlock::new();
        params.set_vec3(ORIGIN, Vec3::ZERO);
        params.set_color(COLOR, Vec4::ONE);
        params.set_texture(TEXTURE, None);
        params.set_float(TEXTURE_SCALE, DEFAULT_TEXTURE_SCALE);
        params.set_float(MIN_SQR_DISTANCE, 0.0);
        params.set_float(MAX_SQR_DISTANCE, 0.0);
        Self { params }
    }
}

impl DepthCircleScan {
    /// Place the ring's trailing edge `width` behind its leading edge at `elapse`.
    pub fn set_elapse(&mut self, elapse: f32, width: f32) {
        let min_distance = elapse - width;
        let max_distance = elapse;
        self.params
            .set_float(MIN_SQR_DISTANCE, min_distance * min_distance);
        self.params
            .set_float(MAX_SQR_DISTANCE, max_distance * max_distance);
    }

    /// Set the scan centre and tint.
    pub fn set_effect(&mut self, origin: Vec3, color: Vec4) -> &mut Self {
        self.params.set_vec3(ORIGIN, origin);
        self.params.set_color(COLOR, color);
        self
    }

    /// Set the ring texture and its world-space tiling scale.
    pub fn set_texture(&mut self, texture: Option<TextureId>, scale: f32) -> &mut Self {
        self.params.set_texture(TEXTURE, texture);
        self.params.set_float(TEXTURE_SCALE, scale);
        self
    }

    pub fn origin(&self) -> Vec3 {
        self.params.vec3(ORIGIN).unwrap_or(Vec3::ZERO)
    }

    pub fn color(&self) -> Vec4 {
        self.params.color(COLOR).unwrap_or(Vec4::ONE)
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.params.texture(TEXTURE)
    }

    pub fn texture_scale(&self) -> f32 {
        self.params
            .float(TEXTURE_SCALE)
            .unwrap_or(DEFAULT_TEXTURE_SCALE)
    }

    pub fn min_sqr_distance(&self) -> f32 {
        self.params.float(MIN_SQR_DISTANCE).unwrap_or(0.0)
    }

    pub fn max_sqr_distance(&self) -> f32 {
        self.params.float(MAX_SQR_DISTANCE).unwrap_or(0.0)
    }

    pub fn params(&self) -> &ParamBlock {
        &self.params
    }
}
