//! Depth circle area effect
//!
//! Fills the scene geometry within `sqrt(sqr_edge_max)` of `origin`, drawing
//! the band between the edge bounds in the edge color.

use super::params::{ParamBlock, TextureId};
use glam::{Vec2, Vec3, Vec4};

/// Uniform names bound by this effect.
pub const ORIGIN: &str = "origin";
pub const FILL_COLOR: &str = "fill_color";
pub const EDGE_COLOR: &str = "edge_color";
pub const FILL_TEXTURE: &str = "fill_texture";
pub const TEXTURE_SCALE: &str = "texture_scale";
pub const TEXTURE_FLOW: &str = "texture_flow";
pub const SQR_EDGE_MIN: &str = "sqr_edge_min";
pub const SQR_EDGE_MAX: &str = "sqr_edge_max";

/// Parameter state of the area effect.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthCircleArea {
    params: ParamBlock,
}

impl Default for DepthCircleArea {
    fn default() -> Self {
        let mut params = ParamBlock::new();
        params.set_vec3(ORIGIN, Vec3::ZERO);
        params.set_color(FILL_COLOR, Vec4::new(0.5, 0.5, 0.5, 1.0));
        params.set_color(EDGE_COLOR, Vec4::new(0.0, 0.0, 1.0, 1.0));
        params.set_texture(FILL_TEXTURE, None);
        params.set_float(TEXTURE_SCALE, 1.0);
        params.set_vec2(TEXTURE_FLOW, Vec2::ZERO);
        params.set_float(SQR_EDGE_MIN, 0.0);
        params.set_float(SQR_EDGE_MAX, 0.0);
        Self { params }
    }
}

impl DepthCircleArea {
    /// Set the disc radius; the edge band spans `[radius - edge, radius]`.
    pub fn set_radius(&mut self, radius: f32, edge: f32) {
        let edge_max = radius;
        let edge_min = radius - edge;
        self.params.set_float(SQR_EDGE_MAX, edge_max * edge_max);
        self.params.set_float(SQR_EDGE_MIN, edge_min * edge_min);
    }

    pub fn set_origin(&mut self, origin: Vec3) -> &mut Self {
        self.params.set_vec3(ORIGIN, origin);
        self
    }

    pub fn set_color(&mut self, fill: Vec4, edge: Vec4) -> &mut Self {
        self.params.set_color(FILL_COLOR, fill);
        self.params.set_color(EDGE_COLOR, edge);
        self
    }

    /// Set the fill texture, its tiling scale, and its scroll velocity.
    pub fn set_texture(&mut self, texture: Option<TextureId>, scale: f32, flow: Vec2) -> &mut Self {
        self.params.set_texture(FILL_TEXTURE, texture);
        self.params.set_float(TEXTURE_SCALE, scale);
        self.params.set_vec2(TEXTURE_FLOW, flow);
        self
    }

    pub fn origin(&self) -> Vec3 {
        self.params.vec3(ORIGIN).unwrap_or(Vec3::ZERO)
    }

    pub fn fill_color(&self) -> Vec4 {
        self.params.color(FILL_COLOR).unwrap_or(Vec4::ONE)
    }

    pub fn edge_color(&self) -> Vec4 {
        self.params.color(EDGE_COLOR).unwrap_or(Vec4::ONE)
    }

    pub fn fill_texture(&self) -> Option<TextureId> {
        self.params.texture(FILL_TEXTURE)
    }

    pub fn texture_scale(&self) -> f32 {
        self.params.float(TEXTURE_SCALE).unwrap_or(1.0)
    }

    pub fn texture_flow(&self) -> Vec2 {
        self.params.vec2(TEXTURE_FLOW).unwrap_or(Vec2::ZERO)
    }

    pub fn sqr_edge_min(&self) -> f32 {
        self.params.float(SQR_EDGE_MIN).unwrap_or(0.0)
    }

    pub fn sqr_edge_max(&self) -> f32 {
        self.params.float(SQR_EDGE_MAX).unwrap_or(0.0)
    }

    pub fn params(&self) -> &ParamBlock {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_radius_squares_band() {
        let mut area = DepthCircleArea::default();
        area.set_radius(10.0, 0.5);

        assert_eq!(area.sqr_edge_max(), 100.0);
        assert_eq!(area.sqr_edge_min(), 90.25);
    }

    #[test]
    fn test_zero_radius_collapses() {
        let mut area = DepthCircleArea::default();
        area.set_radius(0.0, 1.0);

        assert_eq!(area.sqr_edge_max(), 0.0);
        assert_eq!(area.sqr_edge_min(), 1.0);
    }

    #[test]
    fn test_chained_setters() {
        let mut area = DepthCircleArea::default();
        area.set_origin(Vec3::new(4.0, 0.0, -2.0))
            .set_color(Vec4::splat(0.2), Vec4::new(1.0, 0.0, 0.0, 1.0))
            .set_texture(Some(TextureId(1)), 3.0, Vec2::ONE);

        assert_eq!(area.origin(), Vec3::new(4.0, 0.0, -2.0));
        assert_eq!(area.fill_color(), Vec4::splat(0.2));
        assert_eq!(area.edge_color(), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(area.fill_texture(), Some(TextureId(1)));
        assert_eq!(area.texture_scale(), 3.0);
        assert_eq!(area.texture_flow(), Vec2::ONE);
    }
}
