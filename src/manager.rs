//! Effect pipeline manager
//!
//! Runs the registered effects once per frame, ping-ponging between two
//! offscreen buffers, and falls back to a single copy when no effect needs a
//! shader pass.

use crate::backend::Blitter;
use crate::effect::{EffectKind, EffectType};
use crate::frame::FrameContext;
use crate::registry::{AggregatedFlags, EffectRegistry};
use crate::settings::PostFxSettings;
use crate::viewer::{Camera, ViewGeometry};
use glam::Vec3;

/// Per-viewport post-effect pipeline.
pub struct PostFxManager<B: Blitter> {
    blitter: B,
    registry: EffectRegistry<B::Program>,
    buffers: Option<(B::Target, B::Target)>,
    settings: PostFxSettings,
    view: ViewGeometry,
    frame: FrameContext,
}

impl<B: Blitter> PostFxManager<B> {
    /// Create a pipeline, allocating its ping-pong buffers on `blitter`.
    pub fn new(mut blitter: B, settings: PostFxSettings) -> Self {
        let buffers = Self::create_buffers(&mut blitter, settings.size);
        let frame = FrameContext {
            primary_view: settings.primary_view,
            ..Default::default()
        };

        Self {
            blitter,
            registry: EffectRegistry::new(settings.aggregation),
            buffers: Some(buffers),
            settings,
            view: ViewGeometry::default(),
            frame,
        }
    }

    fn create_buffers(blitter: &mut B, (width, height): (u32, u32)) -> (B::Target, B::Target) {
        (
            blitter.create_target(width, height, "post effect buffer a"),
            blitter.create_target(width, height, "post effect buffer b"),
        )
    }

    /// Composite one frame from `source` into `destination`.
    ///
    /// Channel updates must be applied before this is called so the passes
    /// observe this frame's parameter values.
    pub fn tick(&mut self, source: &B::Target, destination: &mut B::Target) {
        if self.registry.any_requires_reconstruction_rays() {
            self.refresh_rays();
        }

        self.blitter.begin_frame(&self.frame);

        match self.buffers.as_mut() {
            Some((a, b)) if self.registry.any_requires_shader_pass() => {
                tracing::trace!(passes = self.registry.enabled().count(), "post effect chain");
                self.blitter.copy(source, a);
                for effect in self.registry.enabled() {
                    effect.apply_pass(&mut self.blitter, a, b, &self.frame);
                    self.blitter.copy(b, a);
                }
                self.blitter.copy(a, destination);
            }
            _ => self.blitter.copy(source, destination),
        }

        self.blitter.end_frame();
    }

    fn refresh_rays(&mut self) {
        if !self.view.is_valid() {
            tracing::warn!(view = ?self.view, "skipping reconstruction rays for invalid view");
            return;
        }
        self.frame.publish_rays(&self.view);
    }

    /// Republish the per-viewport flag after the registry changes.
    fn sync_frame_flags(&mut self) {
        self.frame.primary_view = self.settings.primary_view;
    }

    /// Recreate the ping-pong buffers at a new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.settings.size == (width, height) && self.buffers.is_some() {
            return;
        }
        if let Some((a, b)) = self.buffers.take() {
            self.blitter.release_target(a);
            self.blitter.release_target(b);
        }
        self.settings.size = (width, height);
        self.buffers = Some(Self::create_buffers(&mut self.blitter, (width, height)));
    }

    /// Release the buffers and every effect.
    ///
    /// The manager composites as a plain copy afterwards; buffers are
    /// allocated again when an effect is next created.
    pub fn shutdown(&mut self) {
        if let Some((a, b)) = self.buffers.take() {
            self.blitter.release_target(a);
            self.blitter.release_target(b);
        }
        self.remove_all();
    }

    fn ensure_buffers(&mut self) {
        if self.buffers.is_none() {
            tracing::debug!(size = ?self.settings.size, "reallocating post effect buffers");
            self.buffers = Some(Self::create_buffers(&mut self.blitter, self.settings.size));
        }
    }

    /// Update the view the reconstruction rays derive from.
    pub fn set_view(&mut self, view: ViewGeometry) {
        self.view = view;
    }

    pub fn set_camera(&mut self, camera: &Camera) {
        self.view = camera.geometry();
    }

    pub fn view(&self) -> &ViewGeometry {
        &self.view
    }

    /// Values published to the passes of the last frame.
    pub fn frame_context(&self) -> &FrameContext {
        &self.frame
    }

    /// Set the time value published to the passes.
    pub fn set_time(&mut self, seconds: f32) {
        self.frame.time = seconds;
    }

    pub fn set_primary_view(&mut self, primary: bool) {
        self.settings.primary_view = primary;
        self.sync_frame_flags();
    }

    pub fn settings(&self) -> &PostFxSettings {
        &self.settings
    }

    pub fn blitter(&self) -> &B {
        &self.blitter
    }

    pub fn blitter_mut(&mut self) -> &mut B {
        &mut self.blitter
    }

    pub fn registry(&self) -> &EffectRegistry<B::Program> {
        &self.registry
    }

    pub fn flags(&self) -> AggregatedFlags {
        self.registry.flags()
    }

    /// Return the effect of type `T`, creating it on first request.
    pub fn get_or_create<T: EffectType>(&mut self) -> Option<&mut T> {
        self.registry
            .get_or_create_kind(T::KIND, &mut self.blitter)?;
        self.ensure_buffers();
        self.sync_frame_flags();
        self.registry.get_mut::<T>()
    }

    pub fn get<T: EffectType>(&self) -> Option<&T> {
        self.registry.get::<T>()
    }

    pub fn get_mut<T: EffectType>(&mut self) -> Option<&mut T> {
        self.registry.get_mut::<T>()
    }

    pub fn contains<T: EffectType>(&self) -> bool {
        self.registry.contains(T::KIND)
    }

    pub fn set_enabled<T: EffectType>(&mut self, enabled: bool) -> bool {
        self.set_kind_enabled(T::KIND, enabled)
    }

    pub fn set_kind_enabled(&mut self, kind: EffectKind, enabled: bool) -> bool {
        let found = self.registry.set_enabled(kind, enabled);
        self.sync_frame_flags();
        found
    }

    pub fn remove<T: EffectType>(&mut self) {
        self.remove_kind(T::KIND);
    }

    pub fn remove_kind(&mut self, kind: EffectKind) -> bool {
        let removed = self.registry.remove_kind(kind, &mut self.blitter);
        self.sync_frame_flags();
        removed
    }

    pub fn remove_all(&mut self) {
        self.registry.remove_all(&mut self.blitter);
        self.sync_frame_flags();
    }

    /// Depth of `point` along the view direction over the clip range.
    pub fn linear01_depth(&self, point: Vec3) -> f32 {
        self.view.linear01_depth(point)
    }

    pub fn linear01_depth_length(&self, length: f32) -> f32 {
        self.view.linear01_depth_length(length)
    }
}

impl<B: Blitter> Drop for PostFxManager<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
