//! Shader library for the GPU backend
//!
//! Maps program lookup names to WGSL sources and their uniform layouts.

use crate::effect::{area, scan, EffectKind};
use std::borrow::Cow;
use std::collections::HashMap;

/// Maximum number of `vec4<f32>` parameter slots a program may declare.
pub const MAX_UNIFORM_SLOTS: usize = 8;

/// Bindings, frame uniform and `vs_main` shared by every program.
pub const COMMON_WGSL: &str = include_str!("../shaders/effects/common.wgsl");

/// Program used for copies that change size or format.
pub(crate) const COPY_WGSL: &str = include_str!("../shaders/effects/copy.wgsl");

/// A registered program.
#[derive(Debug, Clone)]
pub struct ProgramSource {
    /// WGSL fragment source defining `fs_main` and the `params` uniform.
    /// Compiled after [`COMMON_WGSL`].
    pub wgsl: Cow<'static, str>,
    /// Parameter names packed into the params uniform, one slot each.
    pub uniforms: Vec<&'static str>,
    /// Parameter name of the optional effect texture.
    pub texture: Option<&'static str>,
}

impl ProgramSource {
    pub fn new(wgsl: impl Into<Cow<'static, str>>) -> Self {
        Self {
            wgsl: wgsl.into(),
            uniforms: Vec::new(),
            texture: None,
        }
    }

    /// Set the uniform slot layout.
    pub fn uniforms(mut self, names: &[&'static str]) -> Self {
        self.uniforms = names.to_vec();
        self
    }

    /// Bind a texture parameter.
    pub fn texture(mut self, name: &'static str) -> Self {
        self.texture = Some(name);
        self
    }

    /// Full module source, shared prelude first.
    pub fn module_source(&self) -> String {
        format!("{COMMON_WGSL}\n{}", self.wgsl)
    }
}

/// Name → program table.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    sources: HashMap<String, ProgramSource>,
}

impl ShaderLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library holding the programs of the built-in effects.
    pub fn with_builtin() -> Self {
        let mut library = Self::new();
        library.insert(
            EffectKind::DepthCircleScan.lookup_name(),
            ProgramSource::new(include_str!("../shaders/effects/depth_circle_scan.wgsl"))
                .uniforms(&[
                    scan::ORIGIN,
                    scan::COLOR,
                    scan::TEXTURE_SCALE,
                    scan::MIN_SQR_DISTANCE,
                    scan::MAX_SQR_DISTANCE,
                ])
                .texture(scan::TEXTURE),
        );
        library.insert(
            EffectKind::DepthCircleArea.lookup_name(),
            ProgramSource::new(include_str!("../shaders/effects/depth_circle_area.wgsl"))
                .uniforms(&[
                    area::ORIGIN,
                    area::FILL_COLOR,
                    area::EDGE_COLOR,
                    area::TEXTURE_SCALE,
                    area::TEXTURE_FLOW,
                    area::SQR_EDGE_MIN,
                    area::SQR_EDGE_MAX,
                ])
                .texture(area::FILL_TEXTURE),
        );
        library
    }

    /// Register or replace a program.
    pub fn insert(&mut self, name: impl Into<String>, source: ProgramSource) {
        self.sources.insert(name.into(), source);
    }

    pub fn get(&self, name: &str) -> Option<&ProgramSource> {
        self.sources.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ProgramSource> {
        self.sources.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
