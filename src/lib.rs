//! Rein post effects
//!
//! A per-viewport post-processing pipeline built on wgpu, with depth-based
//! circle effects and a tween driver for animating them.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **context** - Core wgpu wrapper (Device, Queue)
//! 2. **core** - GPU primitives (buffers, textures, full-screen pipelines)
//! 3. **backend** - The [`Blitter`] seam: [`WgpuBlitter`] on the GPU, [`CpuBlitter`] in memory
//! 4. **effect** - Effect kinds, their capabilities and parameters
//! 5. **registry** / **manager** - Effect lifecycle and per-frame composition
//! 6. **tween** / **controller** - Time-based animation of effect parameters
//!
//! # Frame order
//!
//! ```text
//! controller.update(&mut fx, step)   // channel callbacks write parameters
//! fx.tick(&source, &mut destination) // passes see this frame's values
//! ```

pub mod backend;
pub mod context;
pub mod controller;
pub mod core;
pub mod effect;
pub mod frame;
pub mod manager;
pub mod registry;
pub mod settings;
pub mod tween;
pub mod viewer;

// Re-export commonly used types
pub use context::WgpuContext;

pub use core::{DepthTexture, PipelineBuilder, RawUniformBuffer, RenderTexture, Texture2D, UniformBuffer};

pub use backend::{
    BlitRecord, Blitter, CpuBlitter, CpuProgram, GpuProgram, Image, ProgramError, ProgramSource,
    ShaderLibrary, WgpuBlitter,
};

pub use effect::{
    CopyEffect, DepthCircleArea, DepthCircleScan, EffectCaps, EffectKind, EffectType, ParamBlock,
    ParamValue, PostEffect, TextureId,
};

pub use controller::{AreaSettings, DepthCircleController, ScanSettings};
pub use frame::FrameContext;
pub use manager::PostFxManager;
pub use registry::{AggregatedFlags, AggregationPolicy, EffectRegistry};
pub use settings::PostFxSettings;
pub use tween::{FrameClock, TimeMode, TimeStep, Tween, Tweener};
pub use viewer::{Camera, FrustumRays, ViewGeometry};

// Re-export glam for convenience
pub use glam;
