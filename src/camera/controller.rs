use wgpu::util::DeviceExt;

use crate::camera::core::{Camera, Pose, Projection};
use crate::gpu::render_context::RenderContext;
use crate::options::CameraOptions;

/// Owns the camera and the uniform buffer + bind group it is mirrored into.
pub struct CameraController {
    /// CPU-side camera state.
    pub camera: Camera,
    buffer: wgpu::Buffer,
    /// Bind group layout shared by every pipeline reading the camera.
    pub layout: wgpu::BindGroupLayout,
    /// Bind group referencing the camera uniform buffer.
    pub bind_group: wgpu::BindGroup,
    move_speed: f32,
    look_sensitivity: f32,
}

impl CameraController {
    /// Create the camera from options and allocate its uniform buffer.
    pub fn new(context: &RenderContext, options: &CameraOptions) -> Self {
        let projection = Projection {
            fov_y: options.fovy.to_radians(),
            aspect: context.config.width.max(1) as f32
                / context.config.height.max(1) as f32,
            near: options.znear,
            far: options.zfar,
        };
        let mut camera =
            Camera::new(Pose::default(), projection, options.time_step);
        camera.set_uniform_alignment(u64::from(
            context.device.limits().min_uniform_buffer_offset_alignment,
        ));

        let buffer =
            context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Camera Buffer"),
                    contents: camera.uniform_bytes(),
                    usage: wgpu::BufferUsages::UNIFORM
                        | wgpu::BufferUsages::COPY_DST,
                });

        let layout = context.device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT
                        | wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            },
        );

        let bind_group =
            context
                .device
                .create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                    label: Some("Camera Bind Group"),
                });

        Self {
            camera,
            buffer,
            layout,
            bind_group,
            move_speed: options.move_speed,
            look_sensitivity: options.look_sensitivity,
        }
    }

    /// Copy the camera's serialized uniform block to the GPU.
    ///
    /// Queue writes are ordered before any later submission on the same
    /// queue, so the next draw observes this block.
    pub fn update_gpu(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, self.camera.uniform_bytes());
    }

    /// Apply new control speeds and projection parameters.
    pub fn apply_options(&mut self, options: &CameraOptions) {
        self.move_speed = options.move_speed;
        self.look_sensitivity = options.look_sensitivity;
        let projection = self.camera.projection();
        self.camera.set_projection(Projection {
            fov_y: options.fovy.to_radians(),
            near: options.znear,
            far: options.zfar,
            ..projection
        });
    }

    /// Fly along the view plane. `forward`/`right` are unit-less axis
    /// inputs in `[-1, 1]`, scaled by move speed and `dt` seconds.
    pub fn fly(&mut self, forward: f32, right: f32, dt: f32) {
        let step = self.move_speed * dt;
        if forward != 0.0 {
            self.camera.move_forward(forward * step);
        }
        if right != 0.0 {
            self.camera.move_right(right * step);
        }
    }

    /// Mouse-look from a cursor delta in pixels.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.camera.rotate(
            -dx * self.look_sensitivity,
            -dy * self.look_sensitivity,
        );
    }

    /// Recompute aspect after a viewport resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
    }
}
