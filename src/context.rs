//! wgpu implementation of [`RenderBackend`] for one viewport.
//!
//! A [`Context`] owns the device, queue and render target of a single
//! viewport, so every resource it hands out is created and destroyed under
//! the same context. The target is either a window surface
//! ([`Context::new`]) or an offscreen texture ([`Context::new_headless`])
//! whose pixels can be read back with [`Context::read_pixels`].
//!
//! Draw calls are recorded between [`RenderBackend::begin_frame`]
//! and [`RenderBackend::end_frame`]; uniforms are snapshotted per draw into a
//! per-shader buffer addressed with dynamic offsets and uploaded once per
//! frame, then the recorded commands are replayed into a single render pass.

use std::{
    collections::HashMap,
    iter,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    backend::{
        BufferHandle, GpuError, MeshHandle, RenderBackend, ShaderDescriptor, ShaderError,
        ShaderHandle,
        uniform::{UniformBlock, UniformValue, align_up},
    },
    config::ViewerConfig,
    pipelines::basic::{DEPTH_FORMAT, PipelineTargets, mk_render_pipeline, uniform_layout},
};

/// Uniform snapshots a shader's buffer holds before it has to grow.
const INITIAL_UNIFORM_SLOTS: u64 = 64;
const VERTEX_SIZE: u64 = std::mem::size_of::<[f32; 3]>() as u64;
/// Colour format of headless targets.
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const READBACK_TIMEOUT: Duration = Duration::from_secs(3);

struct GpuShader {
    label: String,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    block: UniformBlock,
    stride: u64,
    ring: wgpu::Buffer,
    ring_slots: u64,
    bind_group: wgpu::BindGroup,
    /// This frame's per-draw snapshots, `stride` bytes apart.
    staged: Vec<u8>,
}

impl GpuShader {
    /// Appends the current uniform values and returns their dynamic offset.
    fn snapshot(&mut self) -> u32 {
        let offset = self.staged.len();
        self.staged.extend_from_slice(self.block.bytes());
        self.staged.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.staged.is_empty() {
            return;
        }
        let needed = self.staged.len() as u64 / self.stride;
        if needed > self.ring_slots {
            let slots = needed.next_power_of_two();
            log::debug!(
                "growing uniform buffer of `{}` from {} to {} slots",
                self.label,
                self.ring_slots,
                slots
            );
            self.ring.destroy();
            let (ring, bind_group) = create_uniform_ring(
                device,
                &self.bind_group_layout,
                &self.label,
                self.block.layout().size() as u64,
                self.stride,
                slots,
            );
            self.ring = ring;
            self.bind_group = bind_group;
            self.ring_slots = slots;
        }
        queue.write_buffer(&self.ring, 0, &self.staged);
    }
}

struct GpuMesh {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

struct LineBuffer {
    label: String,
    buffer: wgpu::Buffer,
    capacity: usize,
}

enum DrawCommand {
    Mesh {
        shader: ShaderHandle,
        offset: u32,
        mesh: MeshHandle,
    },
    Lines {
        shader: ShaderHandle,
        offset: u32,
        buffer: BufferHandle,
        count: u32,
    },
}

enum Target {
    /// Presented to a window after every frame.
    Window(wgpu::Surface<'static>),
    /// Rendered into a texture that stays on the GPU until read back.
    Offscreen(wgpu::Texture),
}

struct Frame {
    /// `None` for offscreen targets, which have nothing to present.
    surface_texture: Option<wgpu::SurfaceTexture>,
    view: wgpu::TextureView,
    clear: wgpu::Color,
    commands: Vec<DrawCommand>,
}

/// The wgpu device of one viewport, together with everything created on it.
///
/// # Key fields
///
/// - `target`: window surface or offscreen texture frames are drawn into
/// - `config`: size and colour format of the target, kept even offscreen
/// - `shaders`, `meshes`, `buffers`: live resources keyed by the handles
///   given out through [`RenderBackend`]
/// - `frame`: draw commands recorded since the last `begin_frame`
pub struct Context {
    target: Target,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    uniform_alignment: u64,
    shaders: HashMap<ShaderHandle, GpuShader>,
    meshes: HashMap<MeshHandle, GpuMesh>,
    buffers: HashMap<BufferHandle, LineBuffer>,
    next_id: u32,
    bound: Option<ShaderHandle>,
    frame: Option<Frame>,
    debug_stream: Arc<AtomicBool>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("offscreen", &matches!(self.target, Target::Offscreen(_)))
            .field("format", &self.config.format)
            .field("size", &(self.config.width, self.config.height))
            .field("sample_count", &self.sample_count)
            .field("shaders", &self.shaders.len())
            .field("meshes", &self.meshes.len())
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

impl Context {
    /// Creates a context presenting to `window`.
    pub async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = create_instance();

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self::assemble(
            &adapter,
            device,
            queue,
            config,
            Target::Window(surface),
            viewer,
        ))
    }

    /// Creates a context without a window, rendering into a `width` x `height`
    /// texture.
    pub async fn new_headless(width: u32, height: u32, viewer: &ViewerConfig) -> anyhow::Result<Self> {
        let instance = create_instance();
        let (adapter, device, queue) = request_device(&instance, None).await?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: OFFSCREEN_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let texture = create_offscreen_texture(&device, &config);

        Ok(Self::assemble(
            &adapter,
            device,
            queue,
            config,
            Target::Offscreen(texture),
            viewer,
        ))
    }

    fn assemble(
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        target: Target,
        viewer: &ViewerConfig,
    ) -> Self {
        // Replaces wgpu's default handler, which panics.
        let debug_stream = Arc::new(AtomicBool::new(false));
        let stream = debug_stream.clone();
        device.on_uncaptured_error(Arc::new(move |error: wgpu::Error| {
            if stream.load(Ordering::Relaxed) {
                log::error!("[GPU debug] {}", error);
            } else {
                log::debug!("uncaptured GPU error: {}", error);
            }
        }));

        let format_features = adapter.get_texture_format_features(config.format);
        let sample_count = if viewer.msaa_samples > 1
            && format_features
                .flags
                .sample_count_supported(viewer.msaa_samples)
        {
            viewer.msaa_samples
        } else {
            if viewer.msaa_samples > 1 {
                log::warn!(
                    "{}x MSAA is not supported for {:?}, rendering without multisampling",
                    viewer.msaa_samples,
                    config.format
                );
            }
            1
        };

        let depth_view = create_depth_view(&device, &config, sample_count);
        let msaa_view = create_msaa_view(&device, &config, sample_count);
        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment as u64;

        Self {
            target,
            device,
            queue,
            config,
            sample_count,
            depth_view,
            msaa_view,
            uniform_alignment,
            shaders: HashMap::new(),
            meshes: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 1,
            bound: None,
            frame: None,
            debug_stream,
        }
    }

    /// MSAA sample count actually in use, after falling back from the requested one.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Copies the last finished frame of a headless context into tightly
    /// packed RGBA8 rows, top row first.
    pub fn read_pixels(&self) -> anyhow::Result<Vec<u8>> {
        let Target::Offscreen(texture) = &self.target else {
            anyhow::bail!("only headless contexts can be read back");
        };
        let (width, height) = (self.config.width, self.config.height);
        let row_bytes = width as usize * 4;
        let padded_row_bytes = align_up(row_bytes, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize);

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: (padded_row_bytes * height as usize) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes as u32),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures::channel::oneshot::channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // the receiver only goes away if we already gave up
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(READBACK_TIMEOUT),
            })
            .context("GPU did not finish the readback")?;
        futures::executor::block_on(rx)
            .context("readback was cancelled")?
            .context("failed to map the readback buffer")?;

        let pixels: Vec<u8> = {
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded_row_bytes)
                .flat_map(|row| &row[..row_bytes])
                .copied()
                .collect()
        };
        output_buffer.unmap();
        Ok(pixels)
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn compile_module(&self, label: &str, source: &str) -> Result<wgpu::ShaderModule, ShaderError> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        let info = futures::executor::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|message| matches!(message.message_type, wgpu::CompilationMessageType::Error))
            .map(|message| match message.location {
                Some(location) => format!(
                    "{}:{}: {}",
                    location.line_number, location.line_position, message.message
                ),
                None => message.message.clone(),
            })
            .collect();
        if errors.is_empty() {
            Ok(module)
        } else {
            Err(ShaderError::Compile {
                label: label.to_string(),
                message: errors.join("\n"),
            })
        }
    }

    fn record(&mut self, command: impl FnOnce(ShaderHandle, u32) -> DrawCommand) -> Result<(), GpuError> {
        if self.frame.is_none() {
            return Err(GpuError::FrameNotStarted);
        }
        let handle = self.bound.ok_or(GpuError::NoShaderBound)?;
        let shader = self
            .shaders
            .get_mut(&handle)
            .ok_or(GpuError::UnknownShader(handle))?;
        let offset = shader.snapshot();
        if let Some(frame) = self.frame.as_mut() {
            frame.commands.push(command(handle, offset));
        }
        Ok(())
    }
}

impl RenderBackend for Context {
    fn create_shader(
        &mut self,
        descriptor: &ShaderDescriptor,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        let label = &descriptor.label;
        let vertex = self.compile_module(&format!("{} vertex", label), vertex_source)?;
        let fragment = self.compile_module(&format!("{} fragment", label), fragment_source)?;

        let block_size = descriptor.layout.size() as u64;
        let bind_group_layout = uniform_layout(&self.device, &format!("{} uniforms", label), block_size);
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });
        let pipeline = mk_render_pipeline(
            &self.device,
            label,
            &pipeline_layout,
            &vertex,
            &fragment,
            descriptor.state,
            &PipelineTargets {
                color_format: self.config.format,
                sample_count: self.sample_count,
            },
        );

        let stride = align_up(block_size as usize, self.uniform_alignment as usize) as u64;
        let (ring, bind_group) = create_uniform_ring(
            &self.device,
            &bind_group_layout,
            label,
            block_size,
            stride,
            INITIAL_UNIFORM_SLOTS,
        );

        let handle = ShaderHandle(self.next_id());
        self.shaders.insert(
            handle,
            GpuShader {
                label: label.clone(),
                pipeline,
                bind_group_layout,
                block: UniformBlock::new(descriptor.layout.clone()),
                stride,
                ring,
                ring_slots: INITIAL_UNIFORM_SLOTS,
                bind_group,
                staged: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) -> Result<(), GpuError> {
        let removed = self
            .shaders
            .remove(&shader)
            .ok_or(GpuError::UnknownShader(shader))?;
        removed.ring.destroy();
        if self.bound == Some(shader) {
            self.bound = None;
        }
        Ok(())
    }

    fn create_mesh(&mut self, label: &str, positions: &[f32]) -> Result<MeshHandle, GpuError> {
        if positions.len() % 3 != 0 {
            return Err(GpuError::MalformedVertices(positions.len()));
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let handle = MeshHandle(self.next_id());
        self.meshes.insert(
            handle,
            GpuMesh {
                buffer,
                vertex_count: (positions.len() / 3) as u32,
            },
        );
        Ok(handle)
    }

    fn delete_mesh(&mut self, mesh: MeshHandle) -> Result<(), GpuError> {
        let removed = self.meshes.remove(&mesh).ok_or(GpuError::UnknownMesh(mesh))?;
        removed.buffer.destroy();
        Ok(())
    }

    fn create_line_buffer(&mut self, label: &str, capacity: usize) -> Result<BufferHandle, GpuError> {
        let capacity = capacity.max(1);
        let buffer = create_line_vertex_buffer(&self.device, label, capacity);
        let handle = BufferHandle(self.next_id());
        self.buffers.insert(
            handle,
            LineBuffer {
                label: label.to_string(),
                buffer,
                capacity,
            },
        );
        Ok(handle)
    }

    fn write_line_buffer(&mut self, buffer: BufferHandle, vertices: &[[f32; 3]]) -> Result<(), GpuError> {
        let lines = self
            .buffers
            .get_mut(&buffer)
            .ok_or(GpuError::UnknownBuffer(buffer))?;
        if vertices.is_empty() {
            return Ok(());
        }
        if vertices.len() > lines.capacity {
            let capacity = vertices.len().next_power_of_two();
            log::debug!(
                "growing line buffer `{}` from {} to {} vertices",
                lines.label,
                lines.capacity,
                capacity
            );
            lines.buffer.destroy();
            lines.buffer = create_line_vertex_buffer(&self.device, &lines.label, capacity);
            lines.capacity = capacity;
        }
        self.queue
            .write_buffer(&lines.buffer, 0, bytemuck::cast_slice(vertices));
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) -> Result<(), GpuError> {
        let removed = self
            .buffers
            .remove(&buffer)
            .ok_or(GpuError::UnknownBuffer(buffer))?;
        removed.buffer.destroy();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        match &mut self.target {
            Target::Window(surface) => surface.configure(&self.device, &self.config),
            Target::Offscreen(texture) => {
                texture.destroy();
                *texture = create_offscreen_texture(&self.device, &self.config);
            }
        }
        self.depth_view = create_depth_view(&self.device, &self.config, self.sample_count);
        self.msaa_view = create_msaa_view(&self.device, &self.config, self.sample_count);
    }

    fn begin_frame(&mut self, clear_colour: [f32; 4]) -> Result<bool, GpuError> {
        if self.frame.take().is_some() {
            log::warn!("previous frame was never finished, discarding it");
        }
        for shader in self.shaders.values_mut() {
            shader.staged.clear();
        }
        self.bound = None;

        let (surface_texture, view) = match &self.target {
            Target::Window(surface) => {
                let texture = match surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        log::debug!("surface lost or outdated, reconfiguring");
                        surface.configure(&self.device, &self.config);
                        return Ok(false);
                    }
                    Err(e @ wgpu::SurfaceError::OutOfMemory) => {
                        return Err(GpuError::Surface(e.to_string()));
                    }
                    Err(e) => {
                        log::warn!("skipping frame: {}", e);
                        return Ok(false);
                    }
                };
                let view = texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                (Some(texture), view)
            }
            Target::Offscreen(texture) => (
                None,
                texture.create_view(&wgpu::TextureViewDescriptor::default()),
            ),
        };
        let [r, g, b, a] = clear_colour.map(f64::from);
        self.frame = Some(Frame {
            surface_texture,
            view,
            clear: wgpu::Color { r, g, b, a },
            commands: Vec::new(),
        });
        Ok(true)
    }

    fn use_shader(&mut self, shader: ShaderHandle) -> Result<(), GpuError> {
        if !self.shaders.contains_key(&shader) {
            return Err(GpuError::UnknownShader(shader));
        }
        self.bound = Some(shader);
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), GpuError> {
        let handle = self.bound.ok_or(GpuError::NoShaderBound)?;
        let shader = self
            .shaders
            .get_mut(&handle)
            .ok_or(GpuError::UnknownShader(handle))?;
        shader.block.set(name, value)?;
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) -> Result<(), GpuError> {
        if !self.meshes.contains_key(&mesh) {
            return Err(GpuError::UnknownMesh(mesh));
        }
        self.record(|shader, offset| DrawCommand::Mesh { shader, offset, mesh })
    }

    fn draw_lines(&mut self, buffer: BufferHandle, vertex_count: u32) -> Result<(), GpuError> {
        if !self.buffers.contains_key(&buffer) {
            return Err(GpuError::UnknownBuffer(buffer));
        }
        self.record(|shader, offset| DrawCommand::Lines {
            shader,
            offset,
            buffer,
            count: vertex_count,
        })
    }

    fn end_frame(&mut self) -> Result<(), GpuError> {
        let frame = self.frame.take().ok_or(GpuError::FrameNotStarted)?;
        for shader in self.shaders.values_mut() {
            shader.upload(&self.device, &self.queue);
        }

        let (target, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&frame.view)),
            None => (&frame.view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewport Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewport Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            for command in &frame.commands {
                match *command {
                    DrawCommand::Mesh { shader, offset, mesh } => {
                        let (Some(shader), Some(mesh)) =
                            (self.shaders.get(&shader), self.meshes.get(&mesh))
                        else {
                            continue;
                        };
                        if mesh.vertex_count == 0 {
                            continue;
                        }
                        render_pass.set_pipeline(&shader.pipeline);
                        render_pass.set_bind_group(0, &shader.bind_group, &[offset]);
                        render_pass.set_vertex_buffer(0, mesh.buffer.slice(..));
                        render_pass.draw(0..mesh.vertex_count, 0..1);
                    }
                    DrawCommand::Lines {
                        shader,
                        offset,
                        buffer,
                        count,
                    } => {
                        let (Some(shader), Some(lines)) =
                            (self.shaders.get(&shader), self.buffers.get(&buffer))
                        else {
                            continue;
                        };
                        let count = count.min(lines.capacity as u32);
                        if count == 0 {
                            continue;
                        }
                        render_pass.set_pipeline(&shader.pipeline);
                        render_pass.set_bind_group(0, &shader.bind_group, &[offset]);
                        render_pass.set_vertex_buffer(0, lines.buffer.slice(..));
                        render_pass.draw(0..count, 0..1);
                    }
                }
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        if let Some(surface_texture) = frame.surface_texture {
            surface_texture.present();
        }
        Ok(())
    }

    fn start_debug_logging(&mut self) {
        if !self.debug_stream.swap(true, Ordering::Relaxed) {
            log::info!("GPU debug logging started");
        }
    }

    fn stop_debug_logging(&mut self) {
        if self.debug_stream.swap(false, Ordering::Relaxed) {
            log::info!("GPU debug logging stopped");
        }
    }

    fn is_debug_logging(&self) -> bool {
        self.debug_stream.load(Ordering::Relaxed)
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

async fn request_device(
    instance: &wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'static>>,
) -> anyhow::Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;
    let info = adapter.get_info();
    log::info!("using adapter \"{}\" ({:?})", info.name, info.backend);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("flow-viewer device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;
    Ok((adapter, device, queue))
}

fn create_offscreen_texture(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen_target"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: config.usage,
        view_formats: &[],
    })
}

fn create_uniform_ring(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    block_size: u64,
    stride: u64,
    slots: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let ring = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: stride * slots,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &ring,
                offset: 0,
                size: wgpu::BufferSize::new(block_size),
            }),
        }],
    });
    (ring, bind_group)
}

fn create_line_vertex_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: capacity as u64 * VERTEX_SIZE,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}
