//! Compute-shader picking: same nearest-hit rule as the CPU path, run
//! over the instance buffer already resident on the GPU.

use bytemuck::{Pod, Zeroable};

use crate::error::GpuError;
use crate::gpu::buffer::{map_and_copy, BufferView, DeviceBuffer};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, PICK_SHADER};
use crate::math::Ray;
use crate::scene::PickHit;

const WORKGROUP_SIZE: u32 = 64;
const NO_HIT: u32 = u32::MAX;

/// Must match `PickParams` in `compute/pick.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PickParams {
    origin: [f32; 3],
    radius_scale: f32,
    direction: [f32; 3],
    count: u32,
}

/// Must match `PickResult` in `compute/pick.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PickResult {
    distance_bits: u32,
    slot: u32,
}

impl PickResult {
    const EMPTY: Self = Self {
        distance_bits: NO_HIT,
        slot: NO_HIT,
    };

    fn hit(self) -> Option<PickHit> {
        (self.slot != NO_HIT).then(|| PickHit {
            slot: self.slot,
            distance: f32::from_bits(self.distance_bits),
        })
    }
}

/// Two-pass nearest-hit picking: an atomic-min over the distance bits,
/// then an atomic-min over the slots sharing that distance.
pub struct GpuPicker {
    find_pipeline: wgpu::ComputePipeline,
    resolve_pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    bound_generation: Option<u64>,
    params_buffer: wgpu::Buffer,
    result_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
}

impl GpuPicker {
    /// Compile the pick shader and allocate its small fixed buffers.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Shader`] if the shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
    ) -> Result<Self, GpuError> {
        let device = &context.device;
        let shader = composer.compose(device, "Pick Shader", PICK_SHADER)?;

        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Pick Layout"),
                entries: &[
                    compute_entry(
                        0,
                        wgpu::BufferBindingType::Storage { read_only: true },
                    ),
                    compute_entry(1, wgpu::BufferBindingType::Uniform),
                    compute_entry(
                        2,
                        wgpu::BufferBindingType::Storage { read_only: false },
                    ),
                ],
            });
        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Pick Pipeline Layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
        let pipeline = |entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let small_buffer = |label: &str, size: usize, usage| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage,
                mapped_at_creation: false,
            })
        };

        Ok(Self {
            find_pipeline: pipeline("find_nearest"),
            resolve_pipeline: pipeline("resolve_slot"),
            layout,
            bind_group: None,
            bound_generation: None,
            params_buffer: small_buffer(
                "Pick Params Buffer",
                size_of::<PickParams>(),
                wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            ),
            result_buffer: small_buffer(
                "Pick Result Buffer",
                size_of::<PickResult>(),
                wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            ),
            staging_buffer: small_buffer(
                "Pick Staging Buffer",
                size_of::<PickResult>(),
                wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            ),
        })
    }

    /// Nearest instance hit by `ray`. Blocks until the GPU result is
    /// read back.
    ///
    /// # Errors
    ///
    /// Returns [`GpuError::Readback`] if the result cannot be read back.
    pub fn pick(
        &mut self,
        context: &RenderContext,
        instances: BufferView<'_, DeviceBuffer>,
        ray: &Ray,
        radius_scale: f32,
    ) -> Result<Option<PickHit>, GpuError> {
        if instances.count == 0 {
            return Ok(None);
        }
        let bind_group = self.bind_group_for(&context.device, instances);

        let params = PickParams {
            origin: ray.origin.to_array(),
            radius_scale,
            direction: ray.direction.to_array(),
            count: instances.count,
        };
        context
            .queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
        context.queue.write_buffer(
            &self.result_buffer,
            0,
            bytemuck::bytes_of(&PickResult::EMPTY),
        );

        let workgroups = instances.count.div_ceil(WORKGROUP_SIZE);
        let mut encoder = context.create_encoder("Pick Encoder");
        for pipeline in [&self.find_pipeline, &self.resolve_pipeline] {
            let mut pass =
                encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Pick Pass"),
                    timestamp_writes: None,
                });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(
            &self.result_buffer,
            0,
            &self.staging_buffer,
            0,
            size_of::<PickResult>() as u64,
        );
        context.submit(encoder);

        let bytes = map_and_copy(
            &context.device,
            &self.staging_buffer,
            size_of::<PickResult>() as u64,
        )?;
        let result: PickResult = bytemuck::pod_read_unaligned(&bytes);
        Ok(result.hit())
    }

    fn bind_group_for(
        &mut self,
        device: &wgpu::Device,
        instances: BufferView<'_, DeviceBuffer>,
    ) -> wgpu::BindGroup {
        if let (Some(group), Some(generation)) =
            (&self.bind_group, self.bound_generation)
        {
            if generation == instances.generation {
                return group.clone();
            }
        }
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Pick Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: instances.buffer.handle().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.result_buffer.as_entire_binding(),
                },
            ],
        });
        self.bind_group = Some(group.clone());
        self.bound_generation = Some(instances.generation);
        group
    }
}

fn compute_entry(
    binding: u32,
    ty: wgpu::BufferBindingType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_wgsl() {
        assert_eq!(size_of::<PickParams>(), 32);
        assert_eq!(size_of::<PickResult>(), 8);
    }

    #[test]
    fn empty_result_is_no_hit() {
        assert_eq!(PickResult::EMPTY.hit(), None);
        let hit = PickResult {
            distance_bits: 2.5f32.to_bits(),
            slot: 3,
        }
        .hit()
        .unwrap();
        assert_eq!(hit.slot, 3);
        assert_eq!(hit.distance, 2.5);
    }
}
