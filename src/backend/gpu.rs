//! wgpu backend
//!
//! Every program shares one bind group layout:
//!
//! | binding | resource                                  |
//! |---------|-------------------------------------------|
//! | 0       | source color texture                      |
//! | 1       | source sampler (clamped, linear)          |
//! | 2       | depth texture                             |
//! | 3       | effect texture (1x1 white when unset)     |
//! | 4       | effect sampler (repeating)                |
//! | 5       | parameter slots, `MAX_UNIFORM_SLOTS` vec4 |
//! | 6       | [`FrameUniform`]                          |
//!
//! Passes of one frame are recorded into a single encoder opened by
//! `begin_frame` and submitted by `end_frame`.

use super::library::{ProgramSource, ShaderLibrary, COPY_WGSL, MAX_UNIFORM_SLOTS};
use super::{Blitter, ProgramError};
use crate::context::WgpuContext;
use crate::core::{
    DepthTexture, PipelineBuilder, RawUniformBuffer, RenderTexture, Texture2D, UniformBuffer,
};
use crate::effect::{ParamBlock, TextureId};
use crate::frame::FrameContext;
use std::collections::HashMap;

/// Packed parameter uniform.
pub type ParamSlots = [[f32; 4]; MAX_UNIFORM_SLOTS];

const PARAM_BYTES: u64 = std::mem::size_of::<ParamSlots>() as u64;
const COPY_PROGRAM_ID: u64 = 0;

/// Per-frame values in the layout shaders read them.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub ray_bl: [f32; 4],
    pub ray_br: [f32; 4],
    pub ray_tl: [f32; 4],
    pub ray_tr: [f32; 4],
    pub eye: [f32; 4],
    pub near: f32,
    pub far: f32,
    pub time: f32,
    pub primary_view: u32,
}

impl From<&FrameContext> for FrameUniform {
    fn from(frame: &FrameContext) -> Self {
        let rays = &frame.rays;
        Self {
            ray_bl: rays.bottom_left.extend(0.0).to_array(),
            ray_br: rays.bottom_right.extend(0.0).to_array(),
            ray_tl: rays.top_left.extend(0.0).to_array(),
            ray_tr: rays.top_right.extend(0.0).to_array(),
            eye: frame.eye.extend(1.0).to_array(),
            near: frame.near,
            far: frame.far,
            time: frame.time,
            primary_view: frame.primary_view_flag(),
        }
    }
}

/// Pack `params` into uniform slots following `layout`.
///
/// Slots past the layout are zero.
pub fn pack_params(params: &ParamBlock, layout: &[&str]) -> ParamSlots {
    let mut slots = [[0.0; 4]; MAX_UNIFORM_SLOTS];
    for (slot, value) in slots.iter_mut().zip(params.pack_slots(layout)) {
        *slot = value;
    }
    slots
}

/// A compiled program.
#[derive(Debug, Clone)]
pub struct GpuProgram {
    id: u64,
    name: String,
    module: wgpu::ShaderModule,
    uniforms: Vec<&'static str>,
    texture: Option<&'static str>,
}

impl GpuProgram {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Runs post-effect passes with wgpu.
pub struct WgpuBlitter {
    ctx: WgpuContext,
    library: ShaderLibrary,
    format: wgpu::TextureFormat,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(u64, wgpu::TextureFormat), wgpu::RenderPipeline>,
    copy_program: GpuProgram,
    next_program_id: u64,
    live_programs: usize,
    source_sampler: wgpu::Sampler,
    frame_uniform: UniformBuffer<FrameUniform>,
    param_buffers: Vec<RawUniformBuffer>,
    next_param_buffer: usize,
    white: Texture2D,
    textures: Vec<Texture2D>,
    default_depth: DepthTexture,
    depth_view: Option<wgpu::TextureView>,
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuBlitter {
    /// Create a backend rendering offscreen buffers in `format`.
    pub fn new(
        ctx: WgpuContext,
        library: ShaderLibrary,
        format: wgpu::TextureFormat,
    ) -> anyhow::Result<Self> {
        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("post effect bind group layout"),
                    entries: &[
                        // Source color
                        texture_entry(0, wgpu::TextureSampleType::Float { filterable: true }),
                        sampler_entry(1),
                        // Depth, read with textureLoad as an unfilterable float
                        texture_entry(2, wgpu::TextureSampleType::Float { filterable: false }),
                        // Effect pattern
                        texture_entry(3, wgpu::TextureSampleType::Float { filterable: true }),
                        sampler_entry(4),
                        uniform_entry(5, wgpu::ShaderStages::FRAGMENT),
                        uniform_entry(6, wgpu::ShaderStages::VERTEX_FRAGMENT),
                    ],
                });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("post effect pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let copy_source = ProgramSource::new(COPY_WGSL);
        let copy_module = compile(&ctx, "post effect copy", &copy_source)
            .map_err(|err| anyhow::anyhow!("copy shader failed to compile: {err}"))?;

        let source_sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post effect source sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let frame_uniform = UniformBuffer::new(
            &ctx,
            &FrameUniform::from(&FrameContext::default()),
            Some("post effect frame uniform"),
        );
        let white = Texture2D::solid(&ctx, [255; 4], Some("post effect white"));
        let default_depth = DepthTexture::far_plane(&ctx, 1, 1, Some("post effect default depth"));

        tracing::debug!(?format, programs = library.len(), "created wgpu blitter");

        Ok(Self {
            ctx,
            library,
            format,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            copy_program: GpuProgram {
                id: COPY_PROGRAM_ID,
                name: "post effect copy".to_string(),
                module: copy_module,
                uniforms: Vec::new(),
                texture: None,
            },
            next_program_id: COPY_PROGRAM_ID + 1,
            live_programs: 0,
            source_sampler,
            frame_uniform,
            param_buffers: Vec::new(),
            next_param_buffer: 0,
            white,
            textures: Vec::new(),
            default_depth,
            depth_view: None,
            encoder: None,
        })
    }

    /// Create a backend with the built-in effect programs.
    pub fn with_builtin(ctx: WgpuContext, format: wgpu::TextureFormat) -> anyhow::Result<Self> {
        Self::new(ctx, ShaderLibrary::with_builtin(), format)
    }

    pub fn context(&self) -> &WgpuContext {
        &self.ctx
    }

    /// Format of buffers created by [`Blitter::create_target`].
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn library(&self) -> &ShaderLibrary {
        &self.library
    }

    /// Programs registered later are found by subsequent lookups.
    pub fn library_mut(&mut self) -> &mut ShaderLibrary {
        &mut self.library
    }

    /// Bind the scene depth buffer read by depth-reconstructing effects.
    ///
    /// `None` restores a depth buffer at the far plane.
    pub fn set_depth_view(&mut self, view: Option<wgpu::TextureView>) {
        self.depth_view = view;
    }

    pub fn set_depth(&mut self, depth: &DepthTexture) {
        self.set_depth_view(Some(depth.view().clone()));
    }

    /// Make `texture` available to effect parameters.
    pub fn register_texture(&mut self, texture: Texture2D) -> TextureId {
        self.textures.push(texture);
        TextureId((self.textures.len() - 1) as u32)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture2D> {
        self.textures.get(id.0 as usize)
    }

    /// Number of programs found and not yet released.
    pub fn live_programs(&self) -> usize {
        self.live_programs
    }

    /// Submit recorded passes without waiting for the end of the frame.
    pub fn flush(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.ctx.submit(std::iter::once(encoder.finish()));
        }
    }

    /// Record into the frame encoder, or into a one-off encoder submitted immediately.
    fn record(&mut self, f: impl FnOnce(&mut Self, &mut wgpu::CommandEncoder)) {
        let in_frame = self.encoder.is_some();
        let mut encoder = self
            .encoder
            .take()
            .unwrap_or_else(|| self.ctx.create_encoder(Some("post effect encoder")));

        f(self, &mut encoder);

        if in_frame {
            self.encoder = Some(encoder);
        } else {
            self.ctx.submit(std::iter::once(encoder.finish()));
        }
    }

    fn ensure_pipeline(&mut self, program: &GpuProgram, format: wgpu::TextureFormat) -> bool {
        let key = (program.id, format);
        if self.pipelines.contains_key(&key) {
            return true;
        }

        let label = format!("{} pipeline", program.name);
        let built = self
            .ctx
            .validated(|_| {
                PipelineBuilder::new(&self.ctx)
                    .label(&label)
                    .module(&program.module)
                    .layout(&self.pipeline_layout)
                    .color_format(format)
                    .build()
            })
            .map_err(anyhow::Error::from)
            .and_then(|pipeline| pipeline);

        match built {
            Ok(pipeline) => {
                self.pipelines.insert(key, pipeline);
                true
            }
            Err(err) => {
                tracing::warn!(program = %program.name, ?format, "pipeline creation failed: {err}");
                false
            }
        }
    }

    fn param_buffer(&mut self) -> usize {
        let index = self.next_param_buffer;
        self.next_param_buffer += 1;
        if index == self.param_buffers.len() {
            self.param_buffers.push(RawUniformBuffer::new(
                &self.ctx,
                PARAM_BYTES,
                Some("post effect params"),
            ));
        }
        index
    }

    fn encode_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        program: &GpuProgram,
        source: &RenderTexture,
        destination: &RenderTexture,
        params: &ParamBlock,
    ) {
        if !self.ensure_pipeline(program, destination.format()) {
            return;
        }

        // Each pass of a frame needs its own buffer; writes land before the submit
        let params_index = self.param_buffer();
        self.param_buffers[params_index]
            .write_slice(&self.ctx, &pack_params(params, &program.uniforms));

        let Some(pipeline) = self.pipelines.get(&(program.id, destination.format())) else {
            return;
        };
        let effect = program
            .texture
            .and_then(|name| params.texture(name))
            .and_then(|id| self.textures.get(id.0 as usize))
            .unwrap_or(&self.white);
        let depth = self
            .depth_view
            .as_ref()
            .unwrap_or_else(|| self.default_depth.view());

        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("post effect bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.source_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(depth),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(effect.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(effect.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: self.param_buffers[params_index]
                        .buffer()
                        .as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: self.frame_uniform.buffer().as_entire_binding(),
                },
            ],
        });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(program.name.as_str()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: destination.view(),
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

impl Blitter for WgpuBlitter {
    type Target = RenderTexture;
    type Program = GpuProgram;

    fn create_target(&mut self, width: u32, height: u32, label: &str) -> RenderTexture {
        RenderTexture::new(&self.ctx, width, height, self.format, Some(label))
    }

    fn find_program(&mut self, name: &str) -> Result<GpuProgram, ProgramError> {
        let source = self.library.get(name).ok_or_else(|| ProgramError::NotFound {
            name: name.to_string(),
        })?;

        if source.uniforms.len() > MAX_UNIFORM_SLOTS {
            return Err(ProgramError::Unsupported {
                name: name.to_string(),
                reason: format!(
                    "{} parameter slots exceed the limit of {MAX_UNIFORM_SLOTS}",
                    source.uniforms.len()
                ),
            });
        }

        let module = compile(&self.ctx, name, source).map_err(|err| ProgramError::Unsupported {
            name: name.to_string(),
            reason: err.to_string(),
        })?;

        let program = GpuProgram {
            id: self.next_program_id,
            name: name.to_string(),
            module,
            uniforms: source.uniforms.clone(),
            texture: source.texture,
        };
        self.next_program_id += 1;

        // Binding mismatches surface when the pipeline is built
        if !self.ensure_pipeline(&program, self.format) {
            return Err(ProgramError::Unsupported {
                name: name.to_string(),
                reason: "pipeline creation failed".to_string(),
            });
        }

        self.live_programs += 1;
        Ok(program)
    }

    fn release_program(&mut self, program: GpuProgram) {
        self.pipelines.retain(|(id, _), _| *id != program.id);
        self.live_programs = self.live_programs.saturating_sub(1);
    }

    fn begin_frame(&mut self, frame: &FrameContext) {
        // Passes left over from a frame that never ended go out first
        self.flush();
        self.frame_uniform
            .update(&self.ctx, &FrameUniform::from(frame));
        self.next_param_buffer = 0;
        self.encoder = Some(self.ctx.create_encoder(Some("post effect frame encoder")));
    }

    fn end_frame(&mut self) {
        self.flush();
    }

    fn copy(&mut self, source: &RenderTexture, destination: &mut RenderTexture) {
        match (source.texture(), destination.texture()) {
            (Some(src), Some(dst)) if source.can_copy_to(destination) => {
                self.record(|_, encoder| {
                    encoder.copy_texture_to_texture(
                        src.as_image_copy(),
                        dst.as_image_copy(),
                        src.size(),
                    );
                });
            }
            _ => {
                let copy = self.copy_program.clone();
                let params = ParamBlock::new();
                self.record(|this, encoder| {
                    this.encode_pass(encoder, &copy, source, destination, &params)
                });
            }
        }
    }

    fn draw(
        &mut self,
        source: &RenderTexture,
        destination: &mut RenderTexture,
        program: &GpuProgram,
        params: &ParamBlock,
        _frame: &FrameContext,
    ) {
        self.record(|this, encoder| this.encode_pass(encoder, program, source, destination, params));
    }
}

impl std::fmt::Debug for WgpuBlitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBlitter")
            .field("format", &self.format)
            .field("programs", &self.library.len())
            .field("live_programs", &self.live_programs)
            .field("pipelines", &self.pipelines.len())
            .field("textures", &self.textures.len())
            .finish()
    }
}

fn compile(
    ctx: &WgpuContext,
    label: &str,
    source: &ProgramSource,
) -> Result<wgpu::ShaderModule, wgpu::Error> {
    let wgsl = source.module_source();
    ctx.validated(|device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        })
    })
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{scan, DepthCircleScan, EffectKind};
    use crate::manager::PostFxManager;
    use crate::settings::PostFxSettings;
    use glam::{Vec3, Vec4};

    const SIZE: u32 = 8;

    /// Fails to parse.
    const SYNTAX_ERROR_WGSL: &str = "@fragment fn fs_main(in: VertexOutput -> @location(0) {";

    /// Parses, but reads a binding outside the shared layout.
    const UNBOUND_WGSL: &str = r#"
@group(0) @binding(7) var<uniform> extra: vec4<f32>;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return extra;
}
"#;

    fn fill(ctx: &WgpuContext, target: &RenderTexture, rgba: [u8; 4]) {
        let texture = target.texture().unwrap();
        let (width, height) = target.size();
        let data: Vec<u8> = rgba.repeat((width * height) as usize);
        ctx.queue.write_texture(
            texture.as_image_copy(),
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            texture.size(),
        );
    }

    /// Read an Rgba8 target back as one `[u8; 4]` per pixel.
    fn read_pixels(ctx: &WgpuContext, target: &RenderTexture) -> Vec<[u8; 4]> {
        let texture = target.texture().unwrap();
        let (width, height) = target.size();
        let padded_row = (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("test readback"),
            size: (padded_row * height) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx.create_encoder(Some("test readback"));
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            texture.size(),
        );
        ctx.submit([encoder.finish()]);

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });
        let _ = ctx.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv().unwrap().expect("Failed to map staging buffer");

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for row in data.chunks(padded_row as usize) {
            for px in row[..(width * 4) as usize].chunks_exact(4) {
                pixels.push([px[0], px[1], px[2], px[3]]);
            }
        }
        drop(data);
        staging.unmap();
        pixels
    }

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 1)
    }

    #[test]
    fn test_frame_uniform_layout() {
        // Four rays, eye, then four scalars
        assert_eq!(std::mem::size_of::<FrameUniform>(), 96);
        assert_eq!(PARAM_BYTES, 128);
    }

    #[test]
    fn test_frame_uniform_from_context() {
        let frame = FrameContext {
            eye: Vec3::new(1.0, 2.0, 3.0),
            near: 0.5,
            far: 100.0,
            time: 4.0,
            primary_view: true,
            ..Default::default()
        };

        let uniform = FrameUniform::from(&frame);
        assert_eq!(uniform.eye, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.near, 0.5);
        assert_eq!(uniform.far, 100.0);
        assert_eq!(uniform.time, 4.0);
        assert_eq!(uniform.primary_view, 1);
        assert_eq!(uniform.ray_tr[3], 0.0);
    }

    #[test]
    fn test_pack_params_follows_layout() {
        let mut params = ParamBlock::new();
        params.set_vec3(scan::ORIGIN, Vec3::new(1.0, 2.0, 3.0));
        params.set_color(scan::COLOR, Vec4::new(0.1, 0.2, 0.3, 0.4));
        params.set_float(scan::MAX_SQR_DISTANCE, 25.0);

        let slots = pack_params(&params, &[scan::COLOR, scan::MAX_SQR_DISTANCE, scan::ORIGIN]);

        assert_eq!(slots[0], [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(slots[1][0], 25.0);
        assert_eq!(&slots[2][..3], &[1.0, 2.0, 3.0]);
        assert_eq!(slots[3], [0.0; 4]);
        assert_eq!(slots[MAX_UNIFORM_SLOTS - 1], [0.0; 4]);
    }

    #[test]
    fn test_missing_program_not_found() {
        // Needs an adapter; skipped on machines without one
        let Ok(ctx) = WgpuContext::new_headless() else {
            return;
        };
        let mut blitter =
            WgpuBlitter::new(ctx, ShaderLibrary::new(), wgpu::TextureFormat::Rgba8Unorm).unwrap();

        let err = blitter.find_program("Hidden/PostEffect/Missing").unwrap_err();
        assert!(matches!(err, ProgramError::NotFound { .. }));
        assert_eq!(blitter.live_programs(), 0);
    }

    #[test]
    fn test_broken_programs_are_unsupported() {
        let Ok(ctx) = WgpuContext::new_headless() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        library.insert("Test/SyntaxError", ProgramSource::new(SYNTAX_ERROR_WGSL));
        library.insert("Test/Unbound", ProgramSource::new(UNBOUND_WGSL));
        let mut blitter = WgpuBlitter::new(ctx, library, wgpu::TextureFormat::Rgba8Unorm).unwrap();

        for name in ["Test/SyntaxError", "Test/Unbound"] {
            let err = blitter.find_program(name).unwrap_err();
            assert!(
                matches!(err, ProgramError::Unsupported { .. }),
                "{name}: {err:?}"
            );
        }
        assert_eq!(blitter.live_programs(), 0);
    }

    #[test]
    fn test_unsupported_effect_is_skipped_by_manager() {
        let Ok(ctx) = WgpuContext::new_headless() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        library.insert(
            EffectKind::DepthCircleScan.lookup_name(),
            ProgramSource::new(UNBOUND_WGSL),
        );
        let blitter =
            WgpuBlitter::new(ctx.clone(), library, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        let mut fx = PostFxManager::new(blitter, PostFxSettings::new().size(SIZE, SIZE));

        assert!(fx.get_or_create::<DepthCircleScan>().is_none());
        assert!(fx.registry().is_empty());

        let source = fx.blitter_mut().create_target(SIZE, SIZE, "source");
        let mut destination = fx.blitter_mut().create_target(SIZE, SIZE, "destination");
        fill(&ctx, &source, [40, 80, 120, 255]);

        fx.tick(&source, &mut destination);

        assert!(read_pixels(&ctx, &destination)
            .iter()
            .all(|px| *px == [40, 80, 120, 255]));
    }

    #[test]
    fn test_tick_with_and_without_effects() {
        let Ok(ctx) = WgpuContext::new_headless() else {
            return;
        };
        let blitter =
            WgpuBlitter::with_builtin(ctx.clone(), wgpu::TextureFormat::Rgba8Unorm).unwrap();
        let mut fx = PostFxManager::new(blitter, PostFxSettings::new().size(SIZE, SIZE));

        let source = fx.blitter_mut().create_target(SIZE, SIZE, "source");
        let mut destination = fx.blitter_mut().create_target(SIZE, SIZE, "destination");
        fill(&ctx, &source, [40, 80, 120, 255]);

        // No effects: a straight copy
        fx.tick(&source, &mut destination);
        assert!(read_pixels(&ctx, &destination)
            .iter()
            .all(|px| *px == [40, 80, 120, 255]));

        // Ring outside the far plane leaves every pixel as it was
        fx.get_or_create::<DepthCircleScan>().unwrap();
        fx.tick(&source, &mut destination);
        assert!(read_pixels(&ctx, &destination)
            .iter()
            .all(|px| close(*px, [40, 80, 120, 255])));

        // Ring covering the far plane tints towards white
        fx.get_mut::<DepthCircleScan>()
            .unwrap()
            .set_elapse(2000.0, 2000.0);
        fx.tick(&source, &mut destination);
        let pixels = read_pixels(&ctx, &destination);
        assert_eq!(pixels.len(), (SIZE * SIZE) as usize);
        assert!(pixels.iter().all(|px| px[0] > 40 && px[3] == 255));
    }
}
