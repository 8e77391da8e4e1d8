//! Depth circle effect controller
//!
//! Drives the scan and area effects of a [`PostFxManager`] with a
//! [`Tweener`]: the scan ring expands once and removes itself, the area disc
//! reveals and later conceals, removing itself once fully concealed.

use crate::backend::Blitter;
use crate::effect::{DepthCircleArea, DepthCircleScan, TextureId};
use crate::manager::PostFxManager;
use crate::tween::{TimeStep, Tween, Tweener};
use glam::{Vec2, Vec3, Vec4};

/// Channel key of the scan animation.
pub const SCAN_CHANNEL: &str = "scan";
/// Channel key of the area animation.
pub const AREA_CHANNEL: &str = "area";

/// Scan ring settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    /// Ring thickness in world units.
    pub width: f32,
    /// Final ring radius.
    pub radius: f32,
    /// Seconds to expand from zero to `radius`.
    pub duration: f32,
    pub texture: Option<TextureId>,
    pub texture_scale: f32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            width: 1.0,
            radius: 20.0,
            duration: 1.5,
            texture: None,
            texture_scale: 1.0,
        }
    }
}

impl ScanSettings {
    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn texture(mut self, texture: Option<TextureId>, scale: f32) -> Self {
        self.texture = texture;
        self.texture_scale = scale;
        self
    }
}

/// Area disc settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSettings {
    pub fill_color: Vec4,
    pub edge_color: Vec4,
    /// Fully revealed radius.
    pub radius: f32,
    /// Width of the edge band.
    pub edge_width: f32,
    /// Seconds for a reveal or a conceal.
    pub duration: f32,
    pub texture: Option<TextureId>,
    pub texture_scale: f32,
    pub texture_flow: Vec2,
}

impl Default for AreaSettings {
    fn default() -> Self {
        Self {
            fill_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            edge_color: Vec4::new(0.0, 0.0, 1.0, 1.0),
            radius: 10.0,
            edge_width: 1.0,
            duration: 2.0,
            texture: None,
            texture_scale: 1.0,
            texture_flow: Vec2::ONE,
        }
    }
}

impl AreaSettings {
    pub fn colors(mut self, fill: Vec4, edge: Vec4) -> Self {
        self.fill_color = fill;
        self.edge_color = edge;
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn edge_width(mut self, edge_width: f32) -> Self {
        self.edge_width = edge_width;
        self
    }

    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn texture(mut self, texture: Option<TextureId>, scale: f32, flow: Vec2) -> Self {
        self.texture = texture;
        self.texture_scale = scale;
        self.texture_flow = flow;
        self
    }
}

/// Starts and animates the depth circle effects.
pub struct DepthCircleController<B: Blitter> {
    tweener: Tweener<PostFxManager<B>>,
    scan: ScanSettings,
    area: AreaSettings,
    area_revealed: bool,
}

impl<B: Blitter + 'static> Default for DepthCircleController<B> {
    fn default() -> Self {
        Self::new(ScanSettings::default(), AreaSettings::default())
    }
}

impl<B: Blitter + 'static> DepthCircleController<B> {
    pub fn new(scan: ScanSettings, area: AreaSettings) -> Self {
        Self {
            tweener: Tweener::new(),
            scan,
            area,
            area_revealed: false,
        }
    }

    pub fn scan_settings(&self) -> &ScanSettings {
        &self.scan
    }

    pub fn set_scan_settings(&mut self, settings: ScanSettings) {
        self.scan = settings;
    }

    pub fn area_settings(&self) -> &AreaSettings {
        &self.area
    }

    pub fn set_area_settings(&mut self, settings: AreaSettings) {
        self.area = settings;
    }

    /// Start an expanding scan ring at `origin`, restarting any scan in flight.
    ///
    /// Returns `false` if the scan effect is unsupported.
    pub fn start_scan(&mut self, fx: &mut PostFxManager<B>, origin: Vec3, color: Vec4) -> bool {
        self.tweener.cancel(SCAN_CHANNEL);

        let Some(scan) = fx.get_or_create::<DepthCircleScan>() else {
            return false;
        };
        scan.set_effect(origin, color)
            .set_texture(self.scan.texture, self.scan.texture_scale);

        let ScanSettings {
            width,
            radius,
            duration,
            ..
        } = self.scan;
        let tween = Tween::new(0.0, 1.0, duration, move |fx: &mut PostFxManager<B>, value| {
            if let Some(scan) = fx.get_mut::<DepthCircleScan>() {
                scan.set_elapse(radius * value, width);
            }
        })
        .on_finished(|fx: &mut PostFxManager<B>| fx.remove::<DepthCircleScan>());

        self.tweener.start(SCAN_CHANNEL, tween);
        true
    }

    /// Reveal (`begin = true`) or conceal the area disc at `origin`.
    ///
    /// A conceal removes the effect once it reaches zero radius. Returns
    /// `false` if the area effect is unsupported.
    pub fn set_area(&mut self, fx: &mut PostFxManager<B>, begin: bool, origin: Vec3) -> bool {
        self.tweener.cancel(AREA_CHANNEL);

        let Some(area) = fx.get_or_create::<DepthCircleArea>() else {
            self.area_revealed = false;
            return false;
        };
        area.set_origin(origin)
            .set_color(self.area.fill_color, self.area.edge_color)
            .set_texture(
                self.area.texture,
                self.area.texture_scale,
                self.area.texture_flow,
            );

        let (start, end) = if begin { (0.0, 1.0) } else { (1.0, 0.0) };
        let radius = self.area.radius;
        let edge_width = self.area.edge_width;
        let tween = Tween::new(start, end, self.area.duration, move |fx: &mut PostFxManager<B>, value| {
            if let Some(area) = fx.get_mut::<DepthCircleArea>() {
                area.set_radius(radius * value, edge_width);
            }
        })
        .on_finished(move |fx: &mut PostFxManager<B>| {
            if !begin {
                fx.remove::<DepthCircleArea>();
            }
        });

        self.tweener.start(AREA_CHANNEL, tween);
        self.area_revealed = begin;
        true
    }

    /// Flip the area disc between revealed and concealed.
    pub fn toggle_area(&mut self, fx: &mut PostFxManager<B>, origin: Vec3) -> bool {
        let begin = !self.area_revealed;
        self.set_area(fx, begin, origin)
    }

    pub fn is_area_revealed(&self) -> bool {
        self.area_revealed
    }

    pub fn is_animating(&self) -> bool {
        !self.tweener.is_empty()
    }

    pub fn is_channel_running(&self, key: &str) -> bool {
        self.tweener.is_running(key)
    }

    /// Advance the animations. Call before [`PostFxManager::tick`] each frame.
    pub fn update(&mut self, fx: &mut PostFxManager<B>, time: TimeStep) {
        self.tweener.step(fx, time);
    }

    /// Stop every animation, leaving the effects in their current state.
    pub fn cancel_all(&mut self) {
        self.tweener.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CpuBlitter, Image};
    use crate::effect::EffectKind;
    use crate::settings::PostFxSettings;

    fn fx() -> PostFxManager<CpuBlitter> {
        let mut blitter = CpuBlitter::new();
        for kind in [EffectKind::DepthCircleScan, EffectKind::DepthCircleArea] {
            blitter.register(kind.lookup_name(), |src, dst, _, _| {
                dst.pixels_mut().copy_from_slice(src.pixels());
            });
        }
        PostFxManager::new(blitter, PostFxSettings::new().size(2, 2))
    }

    #[test]
    fn test_scan_expands_then_removes_itself() {
        let mut fx = fx();
        let mut controller = DepthCircleController::new(
            ScanSettings::default().radius(10.0).width(2.0).duration(1.0),
            AreaSettings::default(),
        );

        assert!(controller.start_scan(&mut fx, Vec3::ZERO, Vec4::ONE));
        assert!(fx.contains::<DepthCircleScan>());

        controller.update(&mut fx, TimeStep::new(0.5));
        let scan = fx.get::<DepthCircleScan>().unwrap();
        assert_eq!(scan.max_sqr_distance(), 25.0);
        assert_eq!(scan.min_sqr_distance(), 9.0);

        controller.update(&mut fx, TimeStep::new(0.6));
        assert!(!fx.contains::<DepthCircleScan>());
        assert!(!controller.is_animating());
        assert_eq!(fx.blitter().live_programs(), 0);
    }

    #[test]
    fn test_restarting_scan_keeps_effect() {
        let mut fx = fx();
        let mut controller = DepthCircleController::default();
        controller.start_scan(&mut fx, Vec3::ZERO, Vec4::ONE);
        controller.update(&mut fx, TimeStep::new(1.0));

        // Retrigger near the end; the first animation must not remove the effect
        controller.start_scan(&mut fx, Vec3::X, Vec4::ONE);
        controller.update(&mut fx, TimeStep::new(0.75));

        let scan = fx.get::<DepthCircleScan>().unwrap();
        assert_eq!(scan.origin(), Vec3::X);
        assert_eq!(scan.max_sqr_distance(), 100.0);
        assert_eq!(fx.registry().len(), 1);
    }

    #[test]
    fn test_area_reveal_stays_resident() {
        let mut fx = fx();
        let mut controller = DepthCircleController::new(
            ScanSettings::default(),
            AreaSettings::default().radius(10.0).duration(1.0),
        );

        assert!(controller.toggle_area(&mut fx, Vec3::ZERO));
        assert!(controller.is_area_revealed());
        for _ in 0..3 {
            controller.update(&mut fx, TimeStep::new(0.5));
        }

        let area = fx.get::<DepthCircleArea>().unwrap();
        assert_eq!(area.sqr_edge_max(), 100.0);
        assert!(!controller.is_channel_running(AREA_CHANNEL));
    }

    #[test]
    fn test_area_conceal_to_zero_removes_effect() {
        let mut fx = fx();
        let mut controller = DepthCircleController::new(
            ScanSettings::default(),
            AreaSettings::default().radius(10.0).duration(1.0),
        );
        controller.set_area(&mut fx, true, Vec3::ZERO);
        controller.update(&mut fx, TimeStep::new(2.0));

        controller.set_area(&mut fx, false, Vec3::ZERO);
        controller.update(&mut fx, TimeStep::new(0.0));
        assert_eq!(fx.get::<DepthCircleArea>().unwrap().sqr_edge_max(), 100.0);

        controller.update(&mut fx, TimeStep::new(1.0));
        // remaining == 0 is not finished yet; the radius has reached zero
        assert_eq!(fx.get::<DepthCircleArea>().unwrap().sqr_edge_max(), 0.0);

        controller.update(&mut fx, TimeStep::new(0.016));
        assert!(!fx.contains::<DepthCircleArea>());
    }

    #[test]
    fn test_reveal_during_conceal_cancels_removal() {
        let mut fx = fx();
        let mut controller = DepthCircleController::default();
        controller.set_area(&mut fx, true, Vec3::ZERO);
        controller.update(&mut fx, TimeStep::new(3.0));

        controller.toggle_area(&mut fx, Vec3::ZERO);
        controller.update(&mut fx, TimeStep::new(0.5));
        controller.toggle_area(&mut fx, Vec3::ZERO);
        controller.update(&mut fx, TimeStep::new(5.0));

        assert!(fx.contains::<DepthCircleArea>());
        assert!(controller.is_area_revealed());
    }

    #[test]
    fn test_unsupported_effects_do_not_animate() {
        let mut fx = PostFxManager::new(CpuBlitter::new(), PostFxSettings::new().size(1, 1));
        let mut controller = DepthCircleController::default();

        assert!(!controller.start_scan(&mut fx, Vec3::ZERO, Vec4::ONE));
        assert!(!controller.toggle_area(&mut fx, Vec3::ZERO));
        assert!(!controller.is_animating());
        assert!(!controller.is_area_revealed());
    }

    #[test]
    fn test_frame_loop() {
        let mut fx = fx();
        let mut controller = DepthCircleController::default();
        controller.start_scan(&mut fx, Vec3::ZERO, Vec4::ONE);

        let source = Image::filled(2, 2, [0.1, 0.2, 0.3, 1.0]);
        let mut destination = Image::new(2, 2);
        for _ in 0..200 {
            controller.update(&mut fx, TimeStep::new(1.0 / 60.0));
            fx.tick(&source, &mut destination);
        }

        assert!(!fx.contains::<DepthCircleScan>());
        assert_eq!(destination, source);
    }
}
