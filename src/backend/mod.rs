//! Blit backends
//!
//! A backend runs full-screen passes from one image buffer to another. The
//! pipeline is generic over [`Blitter`]; [`WgpuBlitter`] renders on the GPU and
//! [`CpuBlitter`] runs Rust closures over in-memory images.

mod cpu;
mod gpu;
mod library;

pub use self::cpu::{BlitRecord, CpuBlitter, CpuProgram, CpuShader, Image};
pub use self::gpu::{pack_params, FrameUniform, GpuProgram, ParamSlots, WgpuBlitter};
pub use self::library::{ProgramSource, ShaderLibrary, MAX_UNIFORM_SLOTS};

use crate::effect::ParamBlock;
use crate::frame::FrameContext;

/// Failure to acquire a shader program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    /// No program is registered under the name.
    #[error("shader `{name}` not found")]
    NotFound { name: String },
    /// The program exists but cannot run on this backend.
    #[error("shader `{name}` is not supported: {reason}")]
    Unsupported { name: String, reason: String },
}

/// Runs full-screen passes between image buffers.
pub trait Blitter {
    /// An image buffer that can be read by a pass and written by another.
    type Target;
    /// A compiled shader program.
    type Program;

    /// Allocate an offscreen image buffer.
    fn create_target(&mut self, width: u32, height: u32, label: &str) -> Self::Target;

    /// Release an image buffer allocated by [`Blitter::create_target`].
    fn release_target(&mut self, target: Self::Target) {
        drop(target);
    }

    /// Resolve a program by its lookup name.
    fn find_program(&mut self, name: &str) -> Result<Self::Program, ProgramError>;

    /// Release a program returned by [`Blitter::find_program`].
    fn release_program(&mut self, program: Self::Program) {
        drop(program);
    }

    /// Called once before the passes of a frame are recorded.
    fn begin_frame(&mut self, _frame: &FrameContext) {}

    /// Called once after the last pass of a frame.
    fn end_frame(&mut self) {}

    /// Raw copy of `source` into `destination`.
    fn copy(&mut self, source: &Self::Target, destination: &mut Self::Target);

    /// Run `program` over `source`, writing `destination`.
    fn draw(
        &mut self,
        source: &Self::Target,
        destination: &mut Self::Target,
        program: &Self::Program,
        params: &ParamBlock,
        frame: &FrameContext,
    );
}
