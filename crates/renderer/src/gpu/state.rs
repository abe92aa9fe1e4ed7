use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::compile::{compile_stages, ShaderInterface, FRAGMENT_SHADER, VERTEX_SHADER};
use crate::geometry::cube_mesh;
use crate::orbit::RotationController;
use crate::runtime::TimeSample;
use crate::types::RendererConfig;

use super::context::GpuContext;
use super::mesh::GeometryBuffers;
use super::pipeline::{CubePipeline, DEPTH_FORMAT};
use super::texture::CubeTexture;
use super::uniforms::{FrameTiming, SceneUniforms};

/// Everything needed to draw the cube, built once at start-up.
///
/// Shader compilation, interface reflection and the pipeline link all happen
/// in [`new`](Self::new); any failure there aborts initialisation, so by the
/// time a frame is rendered every resource is known-good.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: CubePipeline,
    geometry: GeometryBuffers,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture: CubeTexture,
    timing: FrameTiming,
    multisample_target: Option<MultisampleTarget>,
    depth_target: DepthTarget,
    last_fps_update: Instant,
    frames_since_last_update: u32,
}

/// Multisampled color target resolved into the surface frame each pass.
struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, size: PhysicalSize<u32>, sample_count: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth target"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

impl GpuState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let context = GpuContext::new(window, size, config.antialiasing)?;

        // A compile failure short-circuits here; the link below is never
        // attempted with a broken stage.
        let (vertex, fragment) = compile_stages(VERTEX_SHADER, FRAGMENT_SHADER)?;
        let interface = ShaderInterface::resolve(&vertex, &fragment)?;
        let pipeline = CubePipeline::link(
            &context.device,
            context.surface_format,
            context.sample_count,
            interface,
            &vertex,
            &fragment,
        )?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene uniform buffer"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("scene uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: interface.scene_binding,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let geometry = GeometryBuffers::upload(&context.device, &cube_mesh());

        let mut texture = CubeTexture::placeholder(
            &context.device,
            &context.queue,
            &pipeline.texture_layout,
            &interface,
        );
        if let Some(source) = &config.texture {
            texture.begin_load(source.clone());
        }

        let multisample_target = (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });
        let depth_target = DepthTarget::new(&context.device, context.size, context.sample_count);

        Ok(Self {
            context,
            pipeline,
            geometry,
            uniform_buffer,
            uniform_bind_group,
            texture,
            timing: FrameTiming::default(),
            multisample_target,
            depth_target,
            last_fps_update: Instant::now(),
            frames_since_last_update: 0,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.multisample_target = (self.context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &self.context.device,
                self.context.surface_format,
                self.context.size,
                self.context.sample_count,
            )
        });
        self.depth_target = DepthTarget::new(
            &self.context.device,
            self.context.size,
            self.context.sample_count,
        );
    }

    /// Renders one frame: poll the texture load, advance the rotation,
    /// write the matrices and issue the indexed draw.
    pub(crate) fn render(
        &mut self,
        sample: TimeSample,
        controller: &mut RotationController,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;

        let delta = self.timing.advance(sample);
        self.log_frame_rate(sample, delta);

        self.texture.poll(
            &self.context.device,
            &self.context.queue,
            &self.pipeline.texture_layout,
            &self.pipeline.interface,
        );

        // No-op while a drag is active; pointer events own the angles then.
        controller.advance_frame();

        let uniforms =
            SceneUniforms::for_orientation(controller.orientation(), self.context.aspect_ratio());
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&surface_view)),
            None => (&surface_view, None),
        };

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("cube encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cube pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let interface = &self.pipeline.interface;
            pass.set_pipeline(self.pipeline.pipeline());
            pass.set_bind_group(interface.scene_group, &self.uniform_bind_group, &[]);
            pass.set_bind_group(interface.texture_group, self.texture.bind_group(), &[]);
            self.geometry.bind(&mut pass);
            pass.draw_indexed(0..self.geometry.index_count(), 0, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Once-per-second debug log; the only consumer of the frame delta.
    fn log_frame_rate(&mut self, sample: TimeSample, delta: f32) {
        self.frames_since_last_update += 1;
        let elapsed = self.last_fps_update.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            debug!(
                fps = fps.round(),
                frame_index = sample.frame_index,
                delta_ms = (delta * 1000.0).round(),
                "render stats"
            );
            self.frames_since_last_update = 0;
            self.last_fps_update = Instant::now();
        }
    }
}
