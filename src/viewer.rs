//! Camera and view geometry
//!
//! Provides the camera type the pipeline reads and the depth-to-world
//! reconstruction rays derived from it.

use glam::{Vec2, Vec3};

/// A perspective camera looking from `position` towards `target`.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// World up vector.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera.
    pub fn new_perspective(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Get the forward direction (from camera to target).
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Get the right direction.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    /// Get the camera's own up direction, orthogonal to forward and right.
    pub fn camera_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Snapshot the values the post-effect pipeline reads each frame.
    pub fn geometry(&self) -> ViewGeometry {
        ViewGeometry {
            fov_degrees: self.fov_degrees,
            near: self.near,
            far: self.far,
            aspect: self.aspect,
            eye: self.position,
            forward: self.forward(),
            right: self.right(),
            up: self.camera_up(),
        }
    }
}

/// Read-only view description consumed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewGeometry {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    /// Eye position in world space.
    pub eye: Vec3,
    /// Orthonormal basis of the view orientation.
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Default for ViewGeometry {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.3,
            far: 1000.0,
            aspect: 16.0 / 9.0,
            eye: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        }
    }
}

impl ViewGeometry {
    /// Whether rays can be derived from this geometry.
    pub fn is_valid(&self) -> bool {
        self.near > 0.0
            && self.far > self.near
            && self.aspect > 0.0
            && self.fov_degrees > 0.0
            && self.fov_degrees < 180.0
    }

    /// Depth of `point` along the view direction, normalized by the clip range.
    pub fn linear01_depth(&self, point: Vec3) -> f32 {
        (point - self.eye).dot(self.forward) / (self.far - self.near)
    }

    /// A world-space length expressed in normalized clip-range units.
    pub fn linear01_depth_length(&self, length: f32) -> f32 {
        length / (self.far - self.near)
    }

    /// Compute the depth-to-world reconstruction rays for the four corners.
    pub fn frustum_rays(&self) -> FrustumRays {
        let half_height = self.near * (self.fov_degrees * 0.5).to_radians().tan();
        let to_right = self.right * half_height * self.aspect;
        let to_top = self.up * half_height;
        let center = self.forward * self.near;

        let top_left = center + to_top - to_right;
        let scale = top_left.length() / self.near;
        let ray = |corner: Vec3| corner.normalize() * scale;

        FrustumRays {
            bottom_left: ray(center - to_top - to_right),
            bottom_right: ray(center - to_top + to_right),
            top_left: ray(top_left),
            top_right: ray(center + to_top + to_right),
        }
    }
}

/// Per-corner rays from the eye through the near plane.
///
/// Each ray has unit length along the view direction, so
/// `eye + linear_eye_depth * ray` is the world position of a depth sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumRays {
    pub bottom_left: Vec3,
    pub bottom_right: Vec3,
    pub top_left: Vec3,
    pub top_right: Vec3,
}

impl Default for FrustumRays {
    fn default() -> Self {
        Self {
            bottom_left: Vec3::NEG_Z,
            bottom_right: Vec3::NEG_Z,
            top_left: Vec3::NEG_Z,
            top_right: Vec3::NEG_Z,
        }
    }
}

impl FrustumRays {
    /// Bilinearly interpolate the ray for a screen coordinate (`uv` in 0..1, origin bottom-left).
    pub fn ray_at(&self, uv: Vec2) -> Vec3 {
        let bottom = self.bottom_left.lerp(self.bottom_right, uv.x);
        let top = self.top_left.lerp(self.top_right, uv.x);
        bottom.lerp(top, uv.y)
    }

    /// Reconstruct a world position from a screen coordinate and linear eye depth.
    pub fn world_position(&self, eye: Vec3, uv: Vec2, eye_depth: f32) -> Vec3 {
        eye + self.ray_at(uv) * eye_depth
    }

    /// Rays in bottom-left, bottom-right, top-left, top-right order.
    pub fn to_array(&self) -> [Vec3; 4] {
        [
            self.bottom_left,
            self.bottom_right,
            self.top_left,
            self.top_right,
        ]
    }
}
