//! The per-frame instanced draw of every record cube.

use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::gpu::buffer::{BufferView, DeviceBuffer};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, CUBE_SHADER};
use crate::renderer::mesh::{unit_cube, CubeVertex, CUBE_VERTEX_COUNT};

/// Depth format of the cube pass. Cleared to 1.0, compared with `Less`,
/// matching the camera's `[0, 1]` clip depth.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Background color behind the cubes.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.035,
    a: 1.0,
};

/// Pipeline, mesh, depth target and the instance/selection bind group.
///
/// Bind group layout:
/// - group(0): camera uniform
/// - group(1): instance attributes (binding 0) + selection words (binding 1)
pub struct CubeRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    storage_layout: wgpu::BindGroupLayout,
    storage_bind_group: Option<wgpu::BindGroup>,
    /// Generations of the instance and selection buffers the bind group
    /// was built against.
    bound: Option<(u64, u64)>,
    instance_count: u32,
    depth_view: wgpu::TextureView,
}

impl CubeRenderer {
    /// Build the pipeline against `camera_layout`.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Shader`] if the cube shader fails to compose.
    pub fn new(
        context: &RenderContext,
        camera_layout: &wgpu::BindGroupLayout,
        composer: &mut ShaderComposer,
    ) -> Result<Self, GpuError> {
        let device = &context.device;
        let shader = composer.compose(device, "Cube Shader", CUBE_SHADER)?;

        let storage_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Cube Storage Layout"),
                entries: &[storage_entry(0), storage_entry(1)],
            });

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Cube Pipeline Layout"),
                bind_group_layouts: &[camera_layout, &storage_layout],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Cube Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[CubeVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: context.format(),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
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
            });

        let vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Vertex Buffer"),
                contents: bytemuck::cast_slice(&unit_cube()),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let (width, height) = context.size();
        Ok(Self {
            pipeline,
            vertex_buffer,
            storage_layout,
            storage_bind_group: None,
            bound: None,
            instance_count: 0,
            depth_view: create_depth_view(device, width, height),
        })
    }

    /// Recreate the depth target. Call together with
    /// [`RenderContext::resize`] so color and depth sizes never diverge.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = create_depth_view(device, width, height);
    }

    /// Track the current instance and selection buffers, rebuilding the
    /// bind group when either was reallocated.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        instances: BufferView<'_, DeviceBuffer>,
        selection: BufferView<'_, DeviceBuffer>,
    ) {
        let generations = (instances.generation, selection.generation);
        if self.bound != Some(generations) || self.storage_bind_group.is_none()
        {
            self.storage_bind_group =
                Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Cube Storage Bind Group"),
                    layout: &self.storage_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: instances.buffer.handle().as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: selection.buffer.handle().as_entire_binding(),
                        },
                    ],
                }));
            self.bound = Some(generations);
        }
        self.instance_count = instances.count.min(selection.count);
    }

    /// Record the cube pass into `encoder`, clearing `target`.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        camera_bind_group: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Cube Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(
                wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                },
            ),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(storage) = self.storage_bind_group.as_ref() else {
            return;
        };
        if self.instance_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera_bind_group, &[]);
        pass.set_bind_group(1, storage, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..CUBE_VERTEX_COUNT, 0..self.instance_count);
    }

    /// Instances drawn by the next [`CubeRenderer::render`].
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Cube Depth Texture"),
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
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
