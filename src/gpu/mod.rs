//! wgpu renderer for the plane field.
//!
//! Resources are split by lifetime:
//!
//! - group 0: the camera uniform, one per renderer
//! - group 1: a uniform buffer per live plane, keyed by render priority,
//!   created the first time the plane is drawn and dropped when it retires
//! - group 2: a texture per [`TextureId`], uploaded on first use and shared by
//!   every plane drawing that image
//!
//! Planes are drawn back to front by render priority with alpha blending and
//! no depth buffer, so overlapping petals composite in spawn order.

mod texture;

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::OrbitCamera;
use crate::config::RenderConfig;
use crate::error::{GpuError, RenderError};
use crate::plane::{PlaneUniforms, RetiredPlane};
use crate::surface::{FrameSnapshot, RenderSurface};
use crate::textures::TextureId;
use texture::GpuTexture;

/// WGSL source of the plane shader.
pub const PLANE_SHADER: &str = include_str!("plane.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
}

struct PlaneBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Draws [`FrameSnapshot`]s into a window.
pub struct PlaneRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    plane_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: HashMap<TextureId, GpuTexture>,
    planes: HashMap<i32, PlaneBinding>,
    clear_color: wgpu::Color,
}

impl PlaneRenderer {
    /// Create the device and swapchain for `window` and build the plane
    /// pipeline.
    ///
    /// Fails with [`GpuError`] if no adapter or device is available or the
    /// surface cannot be created.
    pub async fn new(window: Arc<Window>, render: &RenderConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::bytes_of(&CameraUniforms {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = uniform_layout(&device, "Camera Bind Group Layout", wgpu::ShaderStages::VERTEX);
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // The fragment stage reads opacity and alpha_cutoff
        let plane_layout = uniform_layout(
            &device,
            "Plane Bind Group Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let texture_layout = texture::texture_layout(&device);
        let sampler = texture::create_sampler(&device);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Plane Shader"),
            source: wgpu::ShaderSource::Wgsl(PLANE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Plane Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &plane_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Plane Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Visible from above and below
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let [r, g, b] = render.clear_color;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            camera_buffer,
            camera_bind_group,
            plane_layout,
            texture_layout,
            sampler,
            textures: HashMap::new(),
            planes: HashMap::new(),
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        })
    }

    /// Reconfigure the swapchain for a new window size. Zero-sized
    /// (minimised) windows are ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Make sure every plane in `frame` has its texture and uniform buffer,
    /// and write this frame's uniforms.
    fn prepare(&mut self, frame: &FrameSnapshot) {
        for view in &frame.planes {
            let id = view.texture.id();
            if !self.textures.contains_key(&id) {
                let uploaded = GpuTexture::upload(
                    &self.device,
                    &self.queue,
                    &self.texture_layout,
                    &self.sampler,
                    view.texture.image(),
                );
                log::debug!("Uploaded texture {} ({})", id.0, view.texture.image().label);
                self.textures.insert(id, uploaded);
            }

            match self.planes.get(&view.render_priority) {
                Some(binding) => {
                    self.queue.write_buffer(&binding.buffer, 0, bytemuck::bytes_of(&view.uniforms));
                }
                None => {
                    let binding = self.create_plane_binding(&view.uniforms);
                    self.planes.insert(view.render_priority, binding);
                }
            }
        }
    }

    fn create_plane_binding(&self, uniforms: &PlaneUniforms) -> PlaneBinding {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Plane Uniform Buffer"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Plane Bind Group"),
            layout: &self.plane_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        PlaneBinding { buffer, bind_group }
    }
}

impl RenderSurface for PlaneRenderer {
    fn release(&mut self, retired: &[RetiredPlane]) {
        for plane in retired {
            if self.planes.remove(&plane.render_priority).is_none() {
                log::trace!("Plane {} retired before it was drawn", plane.render_priority);
            }
        }
    }

    fn present(&mut self, frame: &FrameSnapshot, camera: &OrbitCamera) -> Result<(), RenderError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.prepare(frame);
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniforms {
                view_proj: camera.view_proj().to_cols_array_2d(),
            }),
        );

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Plane Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for plane in frame.draw_order() {
                let (Some(binding), Some(texture)) = (
                    self.planes.get(&plane.render_priority),
                    self.textures.get(&plane.texture.id()),
                ) else {
                    continue;
                };
                render_pass.set_bind_group(1, &binding.bind_group, &[]);
                render_pass.set_bind_group(2, &texture.bind_group, &[]);
                render_pass.draw(0..6, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}
