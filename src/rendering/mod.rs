//! Rendering system with wgpu pipeline and shader management.
//!
//! Frame layout:
//! 1. Scene pass: instanced bars + bolt ribbons into color and emissive targets
//! 2. Glow: blur the emissive target, composite over color onto the swapchain

mod glow;
mod mesh;

pub use glow::{half_size, GlowLayer, Target, HDR_FORMAT};
pub use mesh::{
    tessellate_bolt, unit_box, BarInstance, BoltVertex, MeshVertex, VERTICES_PER_SEGMENT,
};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::{info, warn};
use std::sync::Arc;
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::params::RenderConfig;
use crate::scene::ReactiveScene;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform buffer shared by the bar and bolt pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = direction toward the light, w = intensity
    pub light: [f32; 4],
    /// x = bar albedo
    pub material: [f32; 4],
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    render_config: RenderConfig,

    bar_pipeline: wgpu::RenderPipeline,
    bolt_pipeline: wgpu::RenderPipeline,

    box_vertex_buffer: wgpu::Buffer,
    box_index_buffer: wgpu::Buffer,
    box_index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    instance_count: u32,

    bolt_buffer: wgpu::Buffer,
    bolt_capacity: usize,
    bolt_vertex_count: u32,
    bolt_scratch: Vec<BoltVertex>,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    scene_target: Target,
    emissive_target: Target,
    depth_view: wgpu::TextureView,
    glow: GlowLayer,
}

impl RenderSystem {
    /// Create new rendering system
    ///
    /// `bar_count` and `bolt_segments` size the instance and ribbon buffers.
    pub async fn new(
        window: Arc<winit::window::Window>,
        render_config: RenderConfig,
        bar_count: usize,
        bolt_segments: usize,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        info!("GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("no supported surface formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        });

        // Shared bar geometry
        let (box_vertices, box_indices) = unit_box();
        let box_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bar Box Vertex Buffer"),
            contents: bytemuck::cast_slice(&box_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let box_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Bar Box Index Buffer"),
            contents: bytemuck::cast_slice(&box_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_capacity = bar_count.max(1);
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bar Instance Buffer"),
            size: (instance_capacity * std::mem::size_of::<BarInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bolt_capacity =
            (render_config.max_drawn_bolts * bolt_segments * VERTICES_PER_SEGMENT).max(1);
        let bolt_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bolt Vertex Buffer"),
            size: (bolt_capacity * std::mem::size_of::<BoltVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = SceneUniforms {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light: [0.0, 1.0, 0.0, render_config.light_intensity],
            material: [render_config.bar_albedo, 0.0, 0.0, 0.0],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let bar_pipeline = scene_pipeline(
            &device,
            "Bar Pipeline",
            &pipeline_layout,
            &shader,
            ("vs_bar", "fs_bar"),
            &[MeshVertex::desc(), BarInstance::desc()],
            Some(wgpu::Face::Back),
        );

        // Ribbons are two-sided
        let bolt_pipeline = scene_pipeline(
            &device,
            "Bolt Pipeline",
            &pipeline_layout,
            &shader,
            ("vs_bolt", "fs_bolt"),
            &[BoltVertex::desc()],
            None,
        );

        let (scene_target, emissive_target, depth_view) =
            create_scene_targets(&device, width, height);

        let glow = GlowLayer::new(
            &device,
            surface_format,
            &scene_target.view,
            &emissive_target.view,
            width,
            height,
            render_config.glow_radius,
        );

        info!(
            "Renderer ready: {}x{} {:?}, {} bar instance(s), {} bolt vertices",
            width, height, surface_format, instance_capacity, bolt_capacity
        );

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            render_config,
            bar_pipeline,
            bolt_pipeline,
            box_vertex_buffer,
            box_index_buffer,
            box_index_count: box_indices.len() as u32,
            instance_buffer,
            instance_capacity,
            instance_count: 0,
            bolt_buffer,
            bolt_capacity,
            bolt_vertex_count: 0,
            bolt_scratch: Vec::with_capacity(bolt_capacity),
            uniform_buffer,
            uniform_bind_group,
            scene_target,
            emissive_target,
            depth_view,
            glow,
        })
    }

    /// Resize the surface and every size-dependent target (zero sizes ignored)
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.surface_config.width = width;
        self.surface_config.height = height;
        self.render_config.window_width = width;
        self.render_config.window_height = height;
        self.surface.configure(&self.device, &self.surface_config);

        let (scene_target, emissive_target, depth_view) =
            create_scene_targets(&self.device, width, height);
        self.scene_target = scene_target;
        self.emissive_target = emissive_target;
        self.depth_view = depth_view;

        self.glow.resize(
            &self.device,
            &self.scene_target.view,
            &self.emissive_target.view,
            width,
            height,
        );
    }

    /// Reconfigure the surface at its current size (after Lost/Outdated)
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Upload the scene's current state for the next [`RenderSystem::render`]
    pub fn prepare(&mut self, scene: &ReactiveScene) {
        let (view_proj, eye) = scene.camera().create_view_proj_matrix(&self.render_config);

        let uniforms = SceneUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            light: [0.0, 1.0, 0.0, self.render_config.light_intensity],
            material: [self.render_config.bar_albedo, 0.0, 0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let width = scene.ring().params().bar_width;
        let instances: Vec<BarInstance> = scene
            .bars()
            .iter()
            .take(self.instance_capacity)
            .map(|bar| BarInstance::from_bar(bar, width))
            .collect();
        self.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        self.instance_count = instances.len() as u32;

        self.bolt_scratch.clear();
        for bolt in scene.bolts().iter() {
            let needed = bolt.path.len().saturating_sub(1) * VERTICES_PER_SEGMENT;
            if self.bolt_scratch.len() + needed > self.bolt_capacity {
                warn!("Bolt buffer full, skipping remaining bolts this frame");
                break;
            }
            tessellate_bolt(&bolt.path, bolt.width, bolt.color, eye, &mut self.bolt_scratch);
        }
        if !self.bolt_scratch.is_empty() {
            self.queue.write_buffer(
                &self.bolt_buffer,
                0,
                bytemuck::cast_slice(&self.bolt_scratch),
            );
        }
        self.bolt_vertex_count = self.bolt_scratch.len() as u32;

        self.glow.prepare(&self.queue, scene.glow_intensity());
    }

    /// Render a frame
    pub fn render(&self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let clear = wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.scene_target.view,
                        resolve_target: None,
                        ops: clear,
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.emissive_target.view,
                        resolve_target: None,
                        ops: clear,
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if self.instance_count > 0 {
                render_pass.set_pipeline(&self.bar_pipeline);
                render_pass.set_vertex_buffer(0, self.box_vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                render_pass
                    .set_index_buffer(self.box_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..self.box_index_count, 0, 0..self.instance_count);
            }

            if self.bolt_vertex_count > 0 {
                render_pass.set_pipeline(&self.bolt_pipeline);
                render_pass.set_vertex_buffer(0, self.bolt_buffer.slice(..));
                render_pass.draw(0..self.bolt_vertex_count, 0..1);
            }
        }

        self.glow.encode(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_scene_targets(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (Target, Target, wgpu::TextureView) {
    let scene = Target::new(device, HDR_FORMAT, width, height, "Scene Color Target");
    let emissive = Target::new(device, HDR_FORMAT, width, height, "Scene Emissive Target");

    let depth = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

    (scene, emissive, depth_view)
}

fn scene_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    (vs_entry, fs_entry): (&str, &str),
    buffers: &[wgpu::VertexBufferLayout<'_>],
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let target = Some(wgpu::ColorTargetState {
        format: HDR_FORMAT,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs_entry),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[target.clone(), target],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
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
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_uniforms_layout() {
        // mat4 + two vec4s, matching scene.wgsl
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 64 + 16 + 16);
    }

    #[test]
    fn test_instance_stride_matches_attributes() {
        let desc = BarInstance::desc();
        assert_eq!(desc.array_stride, 80);
        assert_eq!(desc.attributes.len(), 5);
    }
}
