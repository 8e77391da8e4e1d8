//! Core rendering abstractions
//!
//! This module provides mid-level abstractions over wgpu primitives used by
//! the GPU backend.

pub mod buffer;
pub mod pipeline;
pub mod texture;

pub use buffer::{RawUniformBuffer, UniformBuffer};
pub use pipeline::PipelineBuilder;
pub use texture::{DepthTexture, RenderTexture, Texture2D};
