//! Glow post-effect.
//!
//! 1. Horizontal blur of the emissive target into a half-resolution texture
//! 2. Vertical blur back into a second half-resolution texture
//! 3. Composite: scene color + blurred emissive * intensity, to the swapchain

use bytemuck::{Pod, Zeroable};

/// Format of the offscreen scene and glow targets
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BlurUniforms {
    direction_texel: [f32; 4], // xy = direction, zw = texel size
    radius: [f32; 4],          // x = radius in texels
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct CompositeUniforms {
    intensity: [f32; 4],
}

/// Render target texture + view pair
pub struct Target {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Target {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Multi-pass glow over an emissive target
pub struct GlowLayer {
    half_a: Target,
    half_b: Target,

    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    texture_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,

    horizontal_uniforms: wgpu::Buffer,
    vertical_uniforms: wgpu::Buffer,
    composite_uniforms: wgpu::Buffer,
    horizontal_uniform_group: wgpu::BindGroup,
    vertical_uniform_group: wgpu::BindGroup,
    composite_uniform_group: wgpu::BindGroup,

    /// emissive -> half_a
    horizontal_source: wgpu::BindGroup,
    /// half_a -> half_b
    vertical_source: wgpu::BindGroup,
    /// scene + half_b -> output
    composite_source: wgpu::BindGroup,

    sampler: wgpu::Sampler,
    radius: f32,
}

impl GlowLayer {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        scene_view: &wgpu::TextureView,
        emissive_view: &wgpu::TextureView,
        width: u32,
        height: u32,
        radius: f32,
    ) -> Self {
        let (half_width, half_height) = half_size(width, height);
        let half_a = Target::new(device, HDR_FORMAT, half_width, half_height, "Glow A");
        let half_b = Target::new(device, HDR_FORMAT, half_width, half_height, "Glow B");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Glow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glow Texture Layout"),
            entries: &[texture_entry(0), sampler_entry],
        });

        let composite_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Glow Composite Layout"),
                entries: &[texture_entry(0), sampler_entry, texture_entry(2)],
            });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Glow Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let blur_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glow Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("glow_blur.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Glow Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("glow_composite.wgsl").into()),
        });

        let blur_pipeline = fullscreen_pipeline(
            device,
            "Glow Blur Pipeline",
            &blur_shader,
            "fs_blur",
            &[&texture_layout, &uniform_layout],
            HDR_FORMAT,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "Glow Composite Pipeline",
            &composite_shader,
            "fs_composite",
            &[&composite_layout, &uniform_layout],
            output_format,
        );

        let uniform_buffer = |label, size| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let blur_size = std::mem::size_of::<BlurUniforms>() as u64;
        let horizontal_uniforms = uniform_buffer("Glow Horizontal Uniforms", blur_size);
        let vertical_uniforms = uniform_buffer("Glow Vertical Uniforms", blur_size);
        let composite_uniforms = uniform_buffer(
            "Glow Composite Uniforms",
            std::mem::size_of::<CompositeUniforms>() as u64,
        );

        let uniform_group = |label, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };
        let horizontal_uniform_group =
            uniform_group("Glow Horizontal Uniform Group", &horizontal_uniforms);
        let vertical_uniform_group =
            uniform_group("Glow Vertical Uniform Group", &vertical_uniforms);
        let composite_uniform_group =
            uniform_group("Glow Composite Uniform Group", &composite_uniforms);

        let (horizontal_source, vertical_source, composite_source) = Self::create_sources(
            device,
            &texture_layout,
            &composite_layout,
            &sampler,
            scene_view,
            emissive_view,
            &half_a,
            &half_b,
        );

        Self {
            half_a,
            half_b,
            blur_pipeline,
            composite_pipeline,
            texture_layout,
            composite_layout,
            horizontal_uniforms,
            vertical_uniforms,
            composite_uniforms,
            horizontal_uniform_group,
            vertical_uniform_group,
            composite_uniform_group,
            horizontal_source,
            vertical_source,
            composite_source,
            sampler,
            radius,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_sources(
        device: &wgpu::Device,
        texture_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        scene_view: &wgpu::TextureView,
        emissive_view: &wgpu::TextureView,
        half_a: &Target,
        half_b: &Target,
    ) -> (wgpu::BindGroup, wgpu::BindGroup, wgpu::BindGroup) {
        let single = |label, view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        };

        let horizontal = single("Glow Horizontal Source", emissive_view);
        let vertical = single("Glow Vertical Source", &half_a.view);
        let composite = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Glow Composite Source"),
            layout: composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&half_b.view),
                },
            ],
        });

        (horizontal, vertical, composite)
    }

    /// Recreate size-dependent textures after the scene targets changed
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        scene_view: &wgpu::TextureView,
        emissive_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let (half_width, half_height) = half_size(width, height);
        self.half_a = Target::new(device, HDR_FORMAT, half_width, half_height, "Glow A");
        self.half_b = Target::new(device, HDR_FORMAT, half_width, half_height, "Glow B");

        let (horizontal, vertical, composite) = Self::create_sources(
            device,
            &self.texture_layout,
            &self.composite_layout,
            &self.sampler,
            scene_view,
            emissive_view,
            &self.half_a,
            &self.half_b,
        );
        self.horizontal_source = horizontal;
        self.vertical_source = vertical;
        self.composite_source = composite;
    }

    /// Upload this frame's intensity and blur parameters
    pub fn prepare(&self, queue: &wgpu::Queue, intensity: f32) {
        let size = self.half_a.texture.size();
        let texel = [1.0 / size.width as f32, 1.0 / size.height as f32];
        let blur = |direction: [f32; 2]| BlurUniforms {
            direction_texel: [direction[0], direction[1], texel[0], texel[1]],
            radius: [self.radius, 0.0, 0.0, 0.0],
        };

        queue.write_buffer(
            &self.horizontal_uniforms,
            0,
            bytemuck::cast_slice(&[blur([1.0, 0.0])]),
        );
        queue.write_buffer(
            &self.vertical_uniforms,
            0,
            bytemuck::cast_slice(&[blur([0.0, 1.0])]),
        );
        queue.write_buffer(
            &self.composite_uniforms,
            0,
            bytemuck::cast_slice(&[CompositeUniforms {
                intensity: [intensity, 0.0, 0.0, 0.0],
            }]),
        );
    }

    /// Record blur and composite passes; the composite lands in `output`
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        self.fullscreen_pass(
            encoder,
            "Glow Horizontal Pass",
            &self.half_a.view,
            &self.blur_pipeline,
            &self.horizontal_source,
            &self.horizontal_uniform_group,
        );
        self.fullscreen_pass(
            encoder,
            "Glow Vertical Pass",
            &self.half_b.view,
            &self.blur_pipeline,
            &self.vertical_source,
            &self.vertical_uniform_group,
        );
        self.fullscreen_pass(
            encoder,
            "Glow Composite Pass",
            output,
            &self.composite_pipeline,
            &self.composite_source,
            &self.composite_uniform_group,
        );
    }

    fn fullscreen_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        source: &wgpu::BindGroup,
        uniforms: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, source, &[]);
        pass.set_bind_group(1, uniforms, &[]);
        pass.draw(0..3, 0..1); // Fullscreen triangle
    }
}

/// Half-resolution size, never zero
pub fn half_size(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_size_never_zero() {
        assert_eq!(half_size(1280, 720), (640, 360));
        assert_eq!(half_size(1, 1), (1, 1));
        assert_eq!(half_size(0, 3), (1, 1));
    }

    #[test]
    fn test_uniform_layouts_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<BlurUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<CompositeUniforms>() % 16, 0);
    }
}
