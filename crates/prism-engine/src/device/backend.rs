use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::plugin::{ProgramDesc, TextureDimension};
use crate::render::std140;
use crate::render::{
    Backend, BufferHandle, BufferUsage, ClearState, DrawCall, ProgramHandle, TextureHandle, TextureUpload, Topology,
};
use crate::resource::{Filter, Wrap};

use super::{Gpu, GpuFrame, SurfaceErrorAction};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const WHITE: [u8; 4] = [255, 255, 255, 255];

/// [`Backend`] on a wgpu window surface.
///
/// Frame lifecycle: the first `clear` or `draw` acquires the surface texture
/// and opens a command encoder; every call records its own render pass;
/// `present` submits and presents.
///
/// Bindings per program:
/// - group 0, binding 0: uniform block (one buffer per draw in a frame)
/// - group 1, bindings `2i` / `2i + 1`: texture `i` and its sampler
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    /// Open frame, from the first `clear`/`draw` until `present`.
    frame: Option<GpuFrame>,
    /// Depth buffer matching the surface size.
    depth: Option<DepthTarget>,

    next_handle: u64,
    programs: HashMap<ProgramHandle, GpuProgram>,
    buffers: HashMap<BufferHandle, GpuBuffer>,
    textures: HashMap<TextureHandle, GpuTexture>,

    /// White 1x1 textures bound for declared samplers nobody provides.
    fallback_2d: GpuTexture,
    fallback_cube: GpuTexture,

    /// Set by the device-lost callback.
    lost: Arc<AtomicBool>,
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    usage: BufferUsage,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

struct UniformSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    shadow: Vec<u8>,
}

struct GpuProgram {
    label: String,
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    components: Vec<u32>,
    pipelines: HashMap<Topology, wgpu::RenderPipeline>,

    uniform_layout: wgpu::BindGroupLayout,
    uniform_size: usize,
    uniform_slots: Vec<UniformSlot>,
    next_slot: usize,

    texture_layout: Option<wgpu::BindGroupLayout>,
    texture_dims: Vec<TextureDimension>,
    texture_groups: HashMap<Vec<Option<TextureHandle>>, wgpu::BindGroup>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        gpu.device().set_device_lost_callback(move |reason, message| {
            log::error!("wgpu device lost ({reason:?}): {message}");
            flag.store(true, Ordering::Release);
        });

        let white: &[u8] = &WHITE;
        let fallback_2d = create_texture(&gpu, "prism fallback 2d", 1, 1, TextureDimension::D2, &[white], Filter::Nearest, Wrap::Clamp);
        let fallback_cube = create_texture(
            &gpu,
            "prism fallback cube",
            1,
            1,
            TextureDimension::Cube,
            &[white; 6],
            Filter::Nearest,
            Wrap::Clamp,
        );

        Self {
            gpu,
            frame: None,
            depth: None,
            next_handle: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            fallback_2d,
            fallback_cube,
            lost,
        }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    fn alloc(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check(&self) -> Result<()> {
        if self.lost.load(Ordering::Acquire) { Err(Error::ContextLost) } else { Ok(()) }
    }

    /// Acquires the surface texture for a new frame if none is open.
    ///
    /// Returns `false` when the surface is temporarily unavailable and the
    /// frame should be skipped.
    fn ensure_frame(&mut self) -> Result<bool> {
        if self.frame.is_some() {
            return Ok(true);
        }

        let frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(Error::Backend("surface out of memory".to_string())),
                    action => {
                        log::debug!("skipping frame: {action:?}");
                        Ok(false)
                    }
                };
            }
        };

        let size = self.gpu.size();
        let size = (size.width.max(1), size.height.max(1));
        if self.depth.as_ref().map(|d| d.size) != Some(size) {
            self.depth = Some(create_depth(&self.gpu, size));
        }

        for program in self.programs.values_mut() {
            program.next_slot = 0;
        }
        self.frame = Some(frame);
        Ok(true)
    }

    fn pipeline(&mut self, handle: ProgramHandle, topology: Topology) -> Result<()> {
        let format = self.gpu.surface_format();
        let Some(program) = self.programs.get_mut(&handle) else {
            return Err(Error::Backend(format!("unknown program {}", handle.raw())));
        };
        if !program.pipelines.contains_key(&topology) {
            let pipeline = build_pipeline(self.gpu.device(), program, format, topology);
            program.pipelines.insert(topology, pipeline);
        }
        Ok(())
    }
}

impl Backend for WgpuBackend<'_> {
    fn clear(&mut self, state: ClearState) -> Result<()> {
        self.check()?;
        if !self.ensure_frame()? {
            return Ok(());
        }
        let (Some(frame), Some(depth)) = (self.frame.as_mut(), self.depth.as_ref()) else {
            return Ok(());
        };

        let [r, g, b, a] = state.color;
        let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(state.depth),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle> {
        self.check()?;
        let device = self.gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.shader.clone()),
        });

        let uniform_size = std140::layout(&desc.uniforms).size;
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(uniform_size as u64),
                },
                count: None,
            }],
        });

        let texture_layout = (!desc.textures.is_empty()).then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = desc
                .textures
                .iter()
                .enumerate()
                .flat_map(|(i, decl)| {
                    let binding = 2 * i as u32;
                    [
                        wgpu::BindGroupLayoutEntry {
                            binding,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: view_dimension(decl.dimension),
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: binding + 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ]
                })
                .collect();
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("prism texture bgl"),
                entries: &entries,
            })
        });

        let mut group_layouts = vec![&uniform_layout];
        group_layouts.extend(texture_layout.as_ref());
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&desc.label),
            bind_group_layouts: &group_layouts,
            immediate_size: 0,
        });

        let mut program = GpuProgram {
            label: desc.label.clone(),
            shader,
            layout,
            components: desc.attributes.iter().map(|a| a.components).collect(),
            pipelines: HashMap::new(),
            uniform_layout,
            uniform_size,
            uniform_slots: Vec::new(),
            next_slot: 0,
            texture_layout,
            texture_dims: desc.textures.iter().map(|t| t.dimension).collect(),
            texture_groups: HashMap::new(),
        };
        let pipeline = build_pipeline(device, &program, self.gpu.surface_format(), Topology::TriangleList);
        program.pipelines.insert(Topology::TriangleList, pipeline);

        let handle = ProgramHandle::new(self.alloc());
        self.programs.insert(handle, program);
        Ok(handle)
    }

    fn create_buffer(&mut self, usage: BufferUsage, label: Option<&str>, contents: &[u8]) -> Result<BufferHandle> {
        self.check()?;
        let buffer = create_gpu_buffer(self.gpu.device(), usage, label, contents.len());
        self.gpu.queue().write_buffer(&buffer, 0, contents);

        let handle = BufferHandle::new(self.alloc());
        self.buffers.insert(handle, GpuBuffer { buffer, usage });
        Ok(handle)
    }

    fn write_buffer(&mut self, handle: BufferHandle, contents: &[u8]) -> Result<()> {
        self.check()?;
        let Some(entry) = self.buffers.get_mut(&handle) else {
            return Err(Error::Backend(format!("unknown buffer {}", handle.raw())));
        };
        if (contents.len() as u64) > entry.buffer.size() {
            entry.buffer = create_gpu_buffer(self.gpu.device(), entry.usage, None, contents.len());
        }
        self.gpu.queue().write_buffer(&entry.buffer, 0, contents);
        Ok(())
    }

    fn release_buffer(&mut self, handle: BufferHandle) {
        if let Some(entry) = self.buffers.remove(&handle) {
            entry.buffer.destroy();
        }
    }

    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> Result<TextureHandle> {
        self.check()?;
        upload.validate(self.gpu.device().limits().max_texture_dimension_2d)?;

        let texture = create_texture(
            &self.gpu,
            upload.label.unwrap_or("prism texture"),
            upload.width,
            upload.height,
            upload.dimension,
            &upload.layers,
            upload.filter,
            upload.wrap,
        );
        let handle = TextureHandle::new(self.alloc());
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.textures.remove(&handle) {
            texture.texture.destroy();
            for program in self.programs.values_mut() {
                program.texture_groups.retain(|key, _| !key.contains(&Some(handle)));
            }
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        self.check()?;
        if !self.ensure_frame()? {
            return Ok(());
        }
        self.pipeline(call.program, call.topology)?;

        let device = self.gpu.device();
        let queue = self.gpu.queue();
        let Some(program) = self.programs.get_mut(&call.program) else {
            return Err(Error::Backend(format!("unknown program {}", call.program.raw())));
        };

        if call.uniforms.len() != program.uniform_size {
            return Err(Error::Backend(format!(
                "program `{}` expects a {}-byte uniform block, got {}",
                program.label,
                program.uniform_size,
                call.uniforms.len()
            )));
        }

        // One uniform buffer per draw in the frame; queue writes land before
        // the frame's single submit.
        let slot_index = program.next_slot;
        program.next_slot += 1;
        if slot_index == program.uniform_slots.len() {
            let slot = create_uniform_slot(device, &program.uniform_layout, program.uniform_size);
            program.uniform_slots.push(slot);
        }
        let slot = &mut program.uniform_slots[slot_index];
        if slot.shadow != call.uniforms {
            queue.write_buffer(&slot.buffer, 0, call.uniforms);
            slot.shadow.clear();
            slot.shadow.extend_from_slice(call.uniforms);
        }

        if let Some(layout) = program.texture_layout.as_ref() {
            if !program.texture_groups.contains_key(&call.textures) {
                let mut entries = Vec::with_capacity(call.textures.len() * 2);
                for (i, dim) in program.texture_dims.iter().enumerate() {
                    let texture = call
                        .textures
                        .get(i)
                        .copied()
                        .flatten()
                        .and_then(|h| self.textures.get(&h))
                        .unwrap_or(match dim {
                            TextureDimension::D2 => &self.fallback_2d,
                            TextureDimension::Cube => &self.fallback_cube,
                        });
                    entries.push(wgpu::BindGroupEntry {
                        binding: 2 * i as u32,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    });
                    entries.push(wgpu::BindGroupEntry {
                        binding: 2 * i as u32 + 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    });
                }
                let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("prism texture bind group"),
                    layout,
                    entries: &entries,
                });
                program.texture_groups.insert(call.textures.clone(), group);
            }
        }

        let mut vertex_buffers = Vec::with_capacity(call.vertex_buffers.len());
        for handle in &call.vertex_buffers {
            let Some(entry) = self.buffers.get(handle) else {
                return Err(Error::Backend(format!("unknown vertex buffer {}", handle.raw())));
            };
            vertex_buffers.push(&entry.buffer);
        }
        let index = match call.index {
            Some(range) => match self.buffers.get(&range.buffer) {
                Some(entry) => Some((&entry.buffer, range.count)),
                None => return Err(Error::Backend(format!("unknown index buffer {}", range.buffer.raw()))),
            },
            None => None,
        };

        let (Some(frame), Some(depth)) = (self.frame.as_mut(), self.depth.as_ref()) else {
            return Ok(());
        };
        let Some(pipeline) = program.pipelines.get(&call.topology) else {
            return Ok(());
        };
        let slot = &program.uniform_slots[slot_index];

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &slot.bind_group, &[]);
        if let Some(group) = program.texture_groups.get(&call.textures) {
            pass.set_bind_group(1, group, &[]);
        }
        for (i, buffer) in vertex_buffers.into_iter().enumerate() {
            pass.set_vertex_buffer(i as u32, buffer.slice(..));
        }
        match index {
            Some((buffer, count)) => {
                pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..count, 0, 0..1);
            }
            None => pass.draw(0..call.vertex_count, 0..1),
        }
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.check()?;
        if let Some(frame) = self.frame.take() {
            self.gpu.present(frame);
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(winit::dpi::PhysicalSize::new(width, height));
    }

    fn is_context_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    fn shutdown(&mut self) {
        self.lost.store(true, Ordering::Release);
        self.frame = None;
        self.depth = None;
        self.programs.clear();
        for (_, entry) in self.buffers.drain() {
            entry.buffer.destroy();
        }
        for (_, entry) in self.textures.drain() {
            entry.texture.destroy();
        }
        self.gpu.release_surface();
    }
}

fn view_dimension(dimension: TextureDimension) -> wgpu::TextureViewDimension {
    match dimension {
        TextureDimension::D2 => wgpu::TextureViewDimension::D2,
        TextureDimension::Cube => wgpu::TextureViewDimension::Cube,
    }
}

fn topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Topology::LineList => wgpu::PrimitiveTopology::LineList,
        Topology::PointList => wgpu::PrimitiveTopology::PointList,
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    program: &GpuProgram,
    format: wgpu::TextureFormat,
    primitive: Topology,
) -> wgpu::RenderPipeline {
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = program
        .components
        .iter()
        .enumerate()
        .map(|(i, &components)| {
            [wgpu::VertexAttribute {
                format: vertex_format(components),
                offset: 0,
                shader_location: i as u32,
            }]
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
        .iter()
        .zip(&program.components)
        .map(|(attrs, &components)| wgpu::VertexBufferLayout {
            array_stride: u64::from(components.clamp(1, 4)) * 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attrs,
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&program.label),
        layout: Some(&program.layout),
        vertex: wgpu::VertexState {
            module: &program.shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: topology(primitive),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn create_gpu_buffer(device: &wgpu::Device, usage: BufferUsage, label: Option<&str>, len: usize) -> wgpu::Buffer {
    let usage = match usage {
        BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
        BufferUsage::Index => wgpu::BufferUsages::INDEX,
    };
    // Bound slices must be non-empty; copies must be 4-byte aligned.
    let size = (len.max(4) as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
    device.create_buffer(&wgpu::BufferDescriptor {
        label,
        size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_uniform_slot(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, size: usize) -> UniformSlot {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("prism uniform block"),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("prism uniform bind group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    UniformSlot {
        buffer,
        bind_group,
        shadow: Vec::new(),
    }
}

fn create_depth(gpu: &Gpu<'_>, (width, height): (u32, u32)) -> DepthTarget {
    let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("prism depth"),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    DepthTarget {
        _texture: texture,
        view,
        size: (width, height),
    }
}

#[allow(clippy::too_many_arguments)]
fn create_texture(
    gpu: &Gpu<'_>,
    label: &str,
    width: u32,
    height: u32,
    dimension: TextureDimension,
    layers: &[&[u8]],
    filter: Filter,
    wrap: Wrap,
) -> GpuTexture {
    let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: layers.len() as u32,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (layer, pixels) in layers.iter().enumerate() {
        gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer as u32 },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(view_dimension(dimension)),
        ..Default::default()
    });

    let (filter, mipmap_filter) = match filter {
        Filter::Linear => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear),
        Filter::Nearest => (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Nearest),
    };
    let address_mode = match wrap {
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::Clamp => wgpu::AddressMode::ClampToEdge,
        Wrap::Mirror => wgpu::AddressMode::MirrorRepeat,
    };
    let sampler = gpu.device().create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter,
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        sampler,
    }
}
