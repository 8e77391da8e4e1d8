//! Post-processing effects
//!
//! Effects form a closed set of kinds. Each kind has a fixed capability entry
//! and at most one live instance per registry; [`PostEffect`] owns the
//! instance's program handle and parameter state.

pub mod area;
pub mod copy;
mod params;
pub mod scan;

pub use area::DepthCircleArea;
pub use copy::CopyEffect;
pub use params::{ParamBlock, ParamValue, TextureId};
pub use scan::DepthCircleScan;

use crate::backend::Blitter;
use crate::frame::FrameContext;

/// Namespace prefix of every effect program lookup name.
pub const PROGRAM_NAMESPACE: &str = "Hidden/PostEffect/";

/// The kinds of effect the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    /// Marker effect without a program; composes as a plain copy.
    Copy,
    /// Expanding depth-windowed ring.
    DepthCircleScan,
    /// Filled depth-windowed disc with an edge band.
    DepthCircleArea,
}

/// Capabilities of an effect kind. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectCaps {
    /// The pass reconstructs world positions from depth and needs the frame's rays.
    pub requires_reconstruction_rays: bool,
    /// The effect contributes a shader-bound full-screen pass.
    pub requires_shader_pass: bool,
    /// The effect acquires a program on creation.
    pub uses_program: bool,
}

impl EffectCaps {
    const MARKER: Self = Self {
        requires_reconstruction_rays: false,
        requires_shader_pass: false,
        uses_program: false,
    };

    const DEPTH_PASS: Self = Self {
        requires_reconstruction_rays: true,
        requires_shader_pass: true,
        uses_program: true,
    };
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [
        EffectKind::Copy,
        EffectKind::DepthCircleScan,
        EffectKind::DepthCircleArea,
    ];

    /// Stable identifier of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            EffectKind::Copy => "Copy",
            EffectKind::DepthCircleScan => "DepthCircleScan",
            EffectKind::DepthCircleArea => "DepthCircleArea",
        }
    }

    pub const fn caps(self) -> EffectCaps {
        match self {
            EffectKind::Copy => EffectCaps::MARKER,
            EffectKind::DepthCircleScan | EffectKind::DepthCircleArea => EffectCaps::DEPTH_PASS,
        }
    }

    /// Program lookup name derived from the kind, whether or not it uses one.
    pub fn lookup_name(self) -> String {
        format!("{PROGRAM_NAMESPACE}{}", self.name())
    }

    /// Program lookup name, for kinds that acquire a program.
    pub fn program_name(self) -> Option<String> {
        self.caps().uses_program.then(|| self.lookup_name())
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameter state of an instance, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectState {
    Copy(CopyEffect),
    DepthCircleScan(DepthCircleScan),
    DepthCircleArea(DepthCircleArea),
}

impl EffectState {
    /// Default state for `kind`.
    pub fn new(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Copy => EffectState::Copy(CopyEffect::default()),
            EffectKind::DepthCircleScan => EffectState::DepthCircleScan(DepthCircleScan::default()),
            EffectKind::DepthCircleArea => EffectState::DepthCircleArea(DepthCircleArea::default()),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            EffectState::Copy(_) => EffectKind::Copy,
            EffectState::DepthCircleScan(_) => EffectKind::DepthCircleScan,
            EffectState::DepthCircleArea(_) => EffectKind::DepthCircleArea,
        }
    }

    /// The parameters bound to the program.
    pub fn params(&self) -> &ParamBlock {
        match self {
            EffectState::Copy(effect) => effect.params(),
            EffectState::DepthCircleScan(effect) => effect.params(),
            EffectState::DepthCircleArea(effect) => effect.params(),
        }
    }
}

/// Typed access to one kind's state.
pub trait EffectType: Sized + 'static {
    const KIND: EffectKind;

    fn from_state(state: &EffectState) -> Option<&Self>;

    fn from_state_mut(state: &mut EffectState) -> Option<&mut Self>;
}

macro_rules! impl_effect_type {
    ($ty:ident) => {
        impl EffectType for $ty {
            const KIND: EffectKind = EffectKind::$ty;

            fn from_state(state: &EffectState) -> Option<&Self> {
                match state {
                    EffectState::$ty(effect) => Some(effect),
                    _ => None,
                }
            }

            fn from_state_mut(state: &mut EffectState) -> Option<&mut Self> {
                match state {
                    EffectState::$ty(effect) => Some(effect),
                    _ => None,
                }
            }
        }
    };
}

impl_effect_type!(DepthCircleScan);
impl_effect_type!(DepthCircleArea);

impl EffectType for CopyEffect {
    const KIND: EffectKind = EffectKind::Copy;

    fn from_state(state: &EffectState) -> Option<&Self> {
        match state {
            EffectState::Copy(effect) => Some(effect),
            _ => None,
        }
    }

    fn from_state_mut(state: &mut EffectState) -> Option<&mut Self> {
        match state {
            EffectState::Copy(effect) => Some(effect),
            _ => None,
        }
    }
}

/// A live effect instance bound to a backend program of type `P`.
pub struct PostEffect<P> {
    kind: EffectKind,
    enabled: bool,
    program: Option<P>,
    state: EffectState,
}

impl<P> PostEffect<P> {
    /// Create an instance of `kind`, acquiring its program from `blitter`.
    ///
    /// Returns `None` when the program is missing or unsupported on the backend.
    pub fn create<B>(kind: EffectKind, blitter: &mut B) -> Option<Self>
    where
        B: Blitter<Program = P>,
    {
        let program = match kind.program_name() {
            Some(name) => match blitter.find_program(&name) {
                Ok(program) => Some(program),
                Err(err) => {
                    tracing::error!(effect = %kind, "post effect unsupported: {err}");
                    return None;
                }
            },
            None => None,
        };

        Some(Self {
            kind,
            enabled: true,
            program,
            state: EffectState::new(kind),
        })
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn caps(&self) -> EffectCaps {
        self.kind.caps()
    }

    pub fn requires_reconstruction_rays(&self) -> bool {
        self.kind.caps().requires_reconstruction_rays
    }

    pub fn requires_shader_pass(&self) -> bool {
        self.kind.caps().requires_shader_pass
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle participation. Aggregates live in the registry, so this stays crate-private.
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn state(&self) -> &EffectState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EffectState {
        &mut self.state
    }

    pub fn params(&self) -> &ParamBlock {
        self.state.params()
    }

    /// Typed view of the state.
    pub fn downcast<T: EffectType>(&self) -> Option<&T> {
        T::from_state(&self.state)
    }

    pub fn downcast_mut<T: EffectType>(&mut self) -> Option<&mut T> {
        T::from_state_mut(&mut self.state)
    }

    /// Whether the instance still holds its program.
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// Run this effect's single pass from `source` into `destination`.
    ///
    /// Without a program the pass is a raw copy.
    pub fn apply_pass<B>(
        &self,
        blitter: &mut B,
        source: &B::Target,
        destination: &mut B::Target,
        frame: &FrameContext,
    ) where
        B: Blitter<Program = P>,
    {
        match &self.program {
            Some(program) => blitter.draw(source, destination, program, self.params(), frame),
            None => blitter.copy(source, destination),
        }
    }

    /// Release the program. Safe to call more than once.
    pub fn dispose<B>(&mut self, blitter: &mut B)
    where
        B: Blitter<Program = P>,
    {
        if let Some(program) = self.program.take() {
            tracing::debug!(effect = %self.kind, "releasing post effect program");
            blitter.release_program(program);
        }
    }
}

impl<P> std::fmt::Debug for PostEffect<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostEffect")
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .field("has_program", &self.program.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BlitRecord, CpuBlitter, Image};

    fn blitter_with_scan() -> CpuBlitter {
        let mut blitter = CpuBlitter::new();
        blitter.register(EffectKind::DepthCircleScan.lookup_name(), |_, dst, _, _| {
            dst.pixels_mut().fill([1.0, 0.0, 0.0, 1.0]);
        });
        blitter
    }

    #[test]
    fn test_capability_table() {
        assert!(!EffectKind::Copy.caps().requires_shader_pass);
        assert!(!EffectKind::Copy.caps().requires_reconstruction_rays);
        assert!(EffectKind::DepthCircleScan.caps().requires_reconstruction_rays);
        assert!(EffectKind::DepthCircleArea.caps().requires_shader_pass);
    }

    #[test]
    fn test_program_names_use_namespace() {
        assert_eq!(
            EffectKind::DepthCircleScan.program_name().as_deref(),
            Some("Hidden/PostEffect/DepthCircleScan")
        );
        assert_eq!(EffectKind::Copy.program_name(), None);
    }

    #[test]
    fn test_create_unsupported_returns_none() {
        let mut blitter = CpuBlitter::new();
        assert!(PostEffect::create(EffectKind::DepthCircleArea, &mut blitter).is_none());

        blitter.register_unsupported(EffectKind::DepthCircleArea.lookup_name(), "no depth");
        assert!(PostEffect::create(EffectKind::DepthCircleArea, &mut blitter).is_none());
        assert_eq!(blitter.live_programs(), 0);
    }

    #[test]
    fn test_marker_effect_needs_no_program() {
        let mut blitter = CpuBlitter::new();
        let effect = PostEffect::create(EffectKind::Copy, &mut blitter).unwrap();

        assert!(effect.is_enabled());
        assert!(!effect.has_program());

        let source = Image::filled(2, 2, [0.5; 4]);
        let mut destination = Image::new(2, 2);
        effect.apply_pass(&mut blitter, &source, &mut destination, &FrameContext::default());
        assert_eq!(destination, source);
        assert_eq!(blitter.history(), &[BlitRecord::Copy]);
    }

    #[test]
    fn test_apply_pass_draws_program() {
        let mut blitter = blitter_with_scan();
        let effect = PostEffect::create(EffectKind::DepthCircleScan, &mut blitter).unwrap();

        let source = Image::new(1, 1);
        let mut destination = Image::new(1, 1);
        effect.apply_pass(&mut blitter, &source, &mut destination, &FrameContext::default());

        assert_eq!(destination.get(0, 0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            blitter.drawn_programs(),
            vec!["Hidden/PostEffect/DepthCircleScan"]
        );
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut blitter = blitter_with_scan();
        let mut effect = PostEffect::create(EffectKind::DepthCircleScan, &mut blitter).unwrap();
        assert_eq!(blitter.live_programs(), 1);

        effect.dispose(&mut blitter);
        effect.dispose(&mut blitter);
        assert_eq!(blitter.live_programs(), 0);
        assert!(!effect.has_program());
    }

    #[test]
    fn test_downcast_matches_kind() {
        let mut blitter = blitter_with_scan();
        let mut effect = PostEffect::create(EffectKind::DepthCircleScan, &mut blitter).unwrap();

        assert!(effect.downcast::<DepthCircleScan>().is_some());
        assert!(effect.downcast::<DepthCircleArea>().is_none());

        effect
            .downcast_mut::<DepthCircleScan>()
            .unwrap()
            .set_elapse(3.0, 1.0);
        assert_eq!(effect.params().float(scan::MAX_SQR_DISTANCE), Some(9.0));
    }
}
