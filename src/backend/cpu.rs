//! Software blit backend
//!
//! Images live in memory as linear RGBA floats and programs are Rust closures
//! registered by name. Every copy and draw is recorded so callers can inspect
//! the pass sequence of a frame.

use super::{Blitter, ProgramError};
use crate::effect::ParamBlock;
use crate::frame::FrameContext;
use std::collections::HashMap;
use std::sync::Arc;

/// An RGBA image stored row by row, bottom row first.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 4]>,
}

impl Image {
    /// Create a transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; 4])
    }

    /// Create an image with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: [f32; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; pixel_count(width, height)],
        }
    }

    /// Create an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let mut pixels = Vec::with_capacity(pixel_count(width, height));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Nearest-neighbour sample at normalized coordinates.
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        if self.width == 0 || self.height == 0 {
            return [0.0; 4];
        }
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.get(x, y)
    }

    /// Normalized coordinate of the centre of pixel `(x, y)`.
    pub fn uv(&self, x: u32, y: u32) -> (f32, f32) {
        (
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }

    fn copy_from(&mut self, source: &Image) {
        if self.size() == source.size() {
            self.pixels.copy_from_slice(&source.pixels);
            return;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let (u, v) = self.uv(x, y);
                self.set(x, y, source.sample(u, v));
            }
        }
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// A full-screen pass implemented on the CPU.
pub type CpuShader = Arc<dyn Fn(&Image, &mut Image, &ParamBlock, &FrameContext) + Send + Sync>;

/// A program handed out by [`CpuBlitter::find_program`].
#[derive(Clone)]
pub struct CpuProgram {
    name: String,
    shader: CpuShader,
}

impl CpuProgram {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CpuProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuProgram")
            .field("name", &self.name)
            .finish()
    }
}

/// One operation performed by the blitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlitRecord {
    BeginFrame,
    Copy,
    Draw { program: String },
    EndFrame,
}

enum Registration {
    Supported(CpuShader),
    Unsupported(String),
}

/// Software [`Blitter`].
#[derive(Default)]
pub struct CpuBlitter {
    programs: HashMap<String, Registration>,
    history: Vec<BlitRecord>,
    live_programs: usize,
    live_targets: usize,
}

impl CpuBlitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, shader: F)
    where
        F: Fn(&Image, &mut Image, &ParamBlock, &FrameContext) + Send + Sync + 'static,
    {
        self.programs
            .insert(name.into(), Registration::Supported(Arc::new(shader)));
    }

    /// Register a program that exists but refuses to run here.
    pub fn register_unsupported(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.programs
            .insert(name.into(), Registration::Unsupported(reason.into()));
    }

    /// Operations recorded since the last [`CpuBlitter::clear_history`].
    pub fn history(&self) -> &[BlitRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Names of the programs drawn, in order.
    pub fn drawn_programs(&self) -> Vec<&str> {
        self.history
            .iter()
            .filter_map(|record| match record {
                BlitRecord::Draw { program } => Some(program.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Programs handed out and not yet released.
    pub fn live_programs(&self) -> usize {
        self.live_programs
    }

    /// Targets created and not yet released.
    pub fn live_targets(&self) -> usize {
        self.live_targets
    }
}

impl Blitter for CpuBlitter {
    type Target = Image;
    type Program = CpuProgram;

    fn create_target(&mut self, width: u32, height: u32, _label: &str) -> Image {
        self.live_targets += 1;
        Image::new(width, height)
    }

    fn release_target(&mut self, _target: Image) {
        self.live_targets = self.live_targets.saturating_sub(1);
    }

    fn find_program(&mut self, name: &str) -> Result<CpuProgram, ProgramError> {
        match self.programs.get(name) {
            Some(Registration::Supported(shader)) => {
                self.live_programs += 1;
                Ok(CpuProgram {
                    name: name.to_string(),
                    shader: Arc::clone(shader),
                })
            }
            Some(Registration::Unsupported(reason)) => Err(ProgramError::Unsupported {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(ProgramError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    fn release_program(&mut self, _program: CpuProgram) {
        self.live_programs = self.live_programs.saturating_sub(1);
    }

    fn begin_frame(&mut self, _frame: &FrameContext) {
        self.history.push(BlitRecord::BeginFrame);
    }

    fn end_frame(&mut self) {
        self.history.push(BlitRecord::EndFrame);
    }

    fn copy(&mut self, source: &Image, destination: &mut Image) {
        destination.copy_from(source);
        self.history.push(BlitRecord::Copy);
    }

    fn draw(
        &mut self,
        source: &Image,
        destination: &mut Image,
        program: &CpuProgram,
        params: &ParamBlock,
        frame: &FrameContext,
    ) {
        (program.shader)(source, destination, params, frame);
        self.history.push(BlitRecord::Draw {
            program: program.name.clone(),
        });
    }
}
