//! Per-frame state shared by every effect pass

use crate::viewer::{FrustumRays, ViewGeometry};
use glam::Vec3;

/// Values published once per frame and handed to every pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Reconstruction rays; only refreshed on frames where an effect needs them.
    pub rays: FrustumRays,
    /// Eye position in world space.
    pub eye: Vec3,
    pub near: f32,
    pub far: f32,
    /// Whether the viewport is the primary view; depth-reading shaders flip v when set.
    pub primary_view: bool,
    /// Seconds driving animated texture offsets.
    pub time: f32,
}

impl Default for FrameContext {
    fn default() -> Self {
        let geometry = ViewGeometry::default();
        Self {
            rays: FrustumRays::default(),
            eye: geometry.eye,
            near: geometry.near,
            far: geometry.far,
            primary_view: false,
            time: 0.0,
        }
    }
}

impl FrameContext {
    /// Refresh the rays and clip values from `geometry`.
    pub fn publish_rays(&mut self, geometry: &ViewGeometry) {
        self.rays = geometry.frustum_rays();
        self.eye = geometry.eye;
        self.near = geometry.near;
        self.far = geometry.far;
    }

    /// The primary view flag in the integer form shaders consume.
    pub fn primary_view_flag(&self) -> u32 {
        u32::from(self.primary_view)
    }

    /// Convert a raw `[0, 1]` depth-buffer sample into linear eye depth.
    pub fn linear_eye_depth(&self, depth: f32) -> f32 {
        self.near * self.far / (self.far - depth * (self.far - self.near))
    }

    /// World position of a depth-buffer sample at screen coordinate `uv`.
    pub fn reconstruct(&self, uv: glam::Vec2, depth: f32) -> Vec3 {
        self.rays
            .world_position(self.eye, uv, self.linear_eye_depth(depth))
    }
}
