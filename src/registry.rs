//! Effect lifecycle registry
//!
//! Owns the ordered effect instances, keeps at most one per kind, and
//! recomputes the aggregated capability flags on every mutation.

use crate::backend::Blitter;
use crate::effect::{EffectKind, EffectType, PostEffect};

/// How disabled instances affect flag aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// OR over every enabled instance.
    #[default]
    FullScan,
    /// Stop inspecting at the first disabled instance in sequence order.
    StopAtFirstDisabled,
}

/// Flags derived from the registry contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatedFlags {
    pub any_requires_shader_pass: bool,
    pub any_requires_reconstruction_rays: bool,
}

/// Ordered set of effect instances, one per kind.
pub struct EffectRegistry<P> {
    effects: Vec<PostEffect<P>>,
    flags: AggregatedFlags,
    policy: AggregationPolicy,
}

impl<P> Default for EffectRegistry<P> {
    fn default() -> Self {
        Self::new(AggregationPolicy::default())
    }
}

impl<P> EffectRegistry<P> {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self {
            effects: Vec::new(),
            flags: AggregatedFlags::default(),
            policy,
        }
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: AggregationPolicy) {
        self.policy = policy;
        self.recompute();
    }

    pub fn flags(&self) -> AggregatedFlags {
        self.flags
    }

    pub fn any_requires_shader_pass(&self) -> bool {
        self.flags.any_requires_shader_pass
    }

    pub fn any_requires_reconstruction_rays(&self) -> bool {
        self.flags.any_requires_reconstruction_rays
    }

    /// Return the instance of `T`, creating it on first request.
    ///
    /// `None` means the effect is unsupported on `blitter`; the registry is unchanged.
    pub fn get_or_create<T, B>(&mut self, blitter: &mut B) -> Option<&mut T>
    where
        T: EffectType,
        B: Blitter<Program = P>,
    {
        let index = self.get_or_create_kind(T::KIND, blitter)?;
        self.effects[index].downcast_mut::<T>()
    }

    /// Untyped form of [`EffectRegistry::get_or_create`]; returns the instance index.
    pub fn get_or_create_kind<B>(&mut self, kind: EffectKind, blitter: &mut B) -> Option<usize>
    where
        B: Blitter<Program = P>,
    {
        if let Some(index) = self.position(kind) {
            return Some(index);
        }

        let effect = PostEffect::create(kind, blitter)?;
        self.effects.push(effect);
        self.recompute();
        tracing::debug!(effect = %kind, count = self.effects.len(), "added post effect");
        Some(self.effects.len() - 1)
    }

    pub fn get<T: EffectType>(&self) -> Option<&T> {
        self.instance(T::KIND)?.downcast::<T>()
    }

    pub fn get_mut<T: EffectType>(&mut self) -> Option<&mut T> {
        self.instance_mut(T::KIND)?.downcast_mut::<T>()
    }

    pub fn instance(&self, kind: EffectKind) -> Option<&PostEffect<P>> {
        self.effects.iter().find(|effect| effect.kind() == kind)
    }

    pub fn instance_mut(&mut self, kind: EffectKind) -> Option<&mut PostEffect<P>> {
        self.effects.iter_mut().find(|effect| effect.kind() == kind)
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.position(kind).is_some()
    }

    /// Enable or disable an instance. Returns `false` if the kind is absent.
    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) -> bool {
        let Some(effect) = self.instance_mut(kind) else {
            return false;
        };
        effect.set_enabled(enabled);
        self.recompute();
        true
    }

    /// Dispose and remove the instance of `T`, if any.
    pub fn remove<T, B>(&mut self, blitter: &mut B)
    where
        T: EffectType,
        B: Blitter<Program = P>,
    {
        self.remove_kind(T::KIND, blitter);
    }

    /// Dispose and remove the instance of `kind`. Returns whether one was present.
    pub fn remove_kind<B>(&mut self, kind: EffectKind, blitter: &mut B) -> bool
    where
        B: Blitter<Program = P>,
    {
        let Some(index) = self.position(kind) else {
            return false;
        };

        let mut effect = self.effects.remove(index);
        effect.dispose(blitter);
        self.recompute();
        tracing::debug!(effect = %kind, count = self.effects.len(), "removed post effect");
        true
    }

    /// Dispose and remove every instance.
    pub fn remove_all<B>(&mut self, blitter: &mut B)
    where
        B: Blitter<Program = P>,
    {
        for mut effect in self.effects.drain(..) {
            effect.dispose(blitter);
        }
        self.recompute();
    }

    /// Instances in composition order.
    pub fn iter(&self) -> impl Iterator<Item = &PostEffect<P>> {
        self.effects.iter()
    }

    /// Enabled instances in composition order.
    pub fn enabled(&self) -> impl Iterator<Item = &PostEffect<P>> {
        self.effects.iter().filter(|effect| effect.is_enabled())
    }

    pub fn kinds(&self) -> Vec<EffectKind> {
        self.effects.iter().map(PostEffect::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn position(&self, kind: EffectKind) -> Option<usize> {
        self.effects.iter().position(|effect| effect.kind() == kind)
    }

    fn recompute(&mut self) {
        let mut flags = AggregatedFlags::default();
        for effect in &self.effects {
            if !effect.is_enabled() {
                match self.policy {
                    AggregationPolicy::FullScan => continue,
                    AggregationPolicy::StopAtFirstDisabled => break,
                }
            }
            flags.any_requires_shader_pass |= effect.requires_shader_pass();
            flags.any_requires_reconstruction_rays |= effect.requires_reconstruction_rays();
        }
        self.flags = flags;
    }
}

impl<P> std::fmt::Debug for EffectRegistry<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.effects)
            .field("flags", &self.flags)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CpuBlitter, CpuProgram};
    use crate::effect::{CopyEffect, DepthCircleArea, DepthCircleScan};

    fn blitter() -> CpuBlitter {
        let mut blitter = CpuBlitter::new();
        for kind in [EffectKind::DepthCircleScan, EffectKind::DepthCircleArea] {
            blitter.register(kind.lookup_name(), |src, dst, _, _| {
                dst.pixels_mut().copy_from_slice(src.pixels());
            });
        }
        blitter
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut blitter = blitter();
        let mut registry = EffectRegistry::<CpuProgram>::default();

        registry
            .get_or_create::<DepthCircleScan, _>(&mut blitter)
            .unwrap()
            .set_elapse(5.0, 1.0);
        assert_eq!(registry.len(), 1);

        // Second request returns the same instance, parameters intact
        let scan = registry
            .get_or_create::<DepthCircleScan, _>(&mut blitter)
            .unwrap();
        assert_eq!(scan.max_sqr_distance(), 25.0);
        assert_eq!(registry.len(), 1);
        assert_eq!(blitter.live_programs(), 1);
    }

    #[test]
    fn test_unsupported_leaves_registry_untouched() {
        let mut blitter = CpuBlitter::new();
        blitter.register_unsupported(EffectKind::DepthCircleArea.lookup_name(), "no depth");
        let mut registry = EffectRegistry::<CpuProgram>::default();

        assert!(registry
            .get_or_create::<DepthCircleArea, _>(&mut blitter)
            .is_none());
        assert!(registry.is_empty());
        assert_eq!(registry.flags(), AggregatedFlags::default());
    }

    #[test]
    fn test_insertion_order_is_composition_order() {
        let mut blitter = blitter();
        let mut registry = EffectRegistry::<CpuProgram>::default();

        registry.get_or_create::<DepthCircleArea, _>(&mut blitter);
        registry.get_or_create::<CopyEffect, _>(&mut blitter);
        registry.get_or_create::<DepthCircleScan, _>(&mut blitter);

        assert_eq!(
            registry.kinds(),
            vec![
                EffectKind::DepthCircleArea,
                EffectKind::Copy,
                EffectKind::DepthCircleScan
            ]
        );
    }

    #[test]
    fn test_remove_then_get_is_absent() {
        let mut blitter = blitter();
        let mut registry = EffectRegistry::<CpuProgram>::default();

        registry.get_or_create::<DepthCircleScan, _>(&mut blitter);
        registry.get_or_create::<CopyEffect, _>(&mut blitter);
        assert!(registry.any_requires_shader_pass());

        registry.remove::<DepthCircleScan, _>(&mut blitter);
        assert!(registry.get::<DepthCircleScan>().is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(blitter.live_programs(), 0);

        // Only the marker effect remains
        assert!(!registry.any_requires_shader_pass());
        assert!(!registry.any_requires_reconstruction_rays());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut blitter = blitter();
        let mut registry = EffectRegistry::<CpuProgram>::default();
        registry.get_or_create::<CopyEffect, _>(&mut blitter);

        assert!(!registry.remove_kind(EffectKind::DepthCircleArea, &mut blitter));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_all_disposes_everything() {
        let mut blitter = blitter();
        let mut registry = EffectRegistry::<CpuProgram>::default();
        registry.get_or_create::<DepthCircleScan, _>(&mut blitter);
        registry.get_or_create::<DepthCircleArea, _>(&mut blitter);
        assert_eq!(blitter.live_programs(), 2);

        registry.remove_all(&mut blitter);

        assert!(registry.is_empty());
        assert_eq!(blitter.live_programs(), 0);
        assert_eq!(registry.flags(), AggregatedFlags::default());
    }

    #[test]
    fn test_flags_follow_enabled_state() {
        let mut blitter = blitter();
        let mut registry = EffectRegistry::<CpuProgram>::default();
        registry.get_or_create::<DepthCircleScan, _>(&mut blitter);
        registry.get_or_create::<DepthCircleArea, _>(&mut blitter);

        registry.set_enabled(EffectKind::DepthCircleScan, false);
        assert!(registry.any_requires_shader_pass());

        registry.set_enabled(EffectKind::DepthCircleArea, false);
        assert!(!registry.any_requires_shader_pass());
        assert!(!registry.any_requires_reconstruction_rays());
        assert_eq!(registry.enabled().count(), 0);

        registry.set_enabled(EffectKind::DepthCircleScan, true);
        assert!(registry.any_requires_reconstruction_rays());
        assert!(!registry.set_enabled(EffectKind::Copy, true));
    }

    #[test]
    fn test_stop_at_first_disabled_policy() {
        let mut blitter = blitter();
        let mut registry = EffectRegistry::<CpuProgram>::new(AggregationPolicy::StopAtFirstDisabled);
        registry.get_or_create::<CopyEffect, _>(&mut blitter);
        registry.get_or_create::<DepthCircleScan, _>(&mut blitter);
        assert!(registry.any_requires_shader_pass());

        // A disabled marker ahead of the scan hides the scan from aggregation
        registry.set_enabled(EffectKind::Copy, false);
        assert!(!registry.any_requires_shader_pass());

        registry.set_policy(AggregationPolicy::FullScan);
        assert!(registry.any_requires_shader_pass());
    }
}
