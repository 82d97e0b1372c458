//! The engine: owns the GPU context, camera, scene and renderers, and
//! executes [`Command`]s against them.

/// The command vocabulary.
pub mod command;
mod execute;

use glam::Vec3;

pub use self::command::Command;
use crate::camera::controller::CameraController;
use crate::camera::core::Pose;
use crate::error::CubefieldError;
use crate::gpu::buffer::DeviceBuffer;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::input::{InputEvent, InputProcessor};
use crate::layout::InstanceAttributes;
use crate::options::Options;
use crate::renderer::cube::CubeRenderer;
use crate::renderer::gpu_pick::GpuPicker;
use crate::scene::record::Record;
use crate::scene::Scene;

/// Interactive record explorer.
///
/// Frame loop: [`handle_input`](Self::handle_input) for each window
/// event, then [`update`](Self::update) and [`render`](Self::render) once
/// per tick. All mutation happens on the caller's thread.
pub struct CubeEngine {
    /// wgpu device, queue and surface.
    pub context: RenderContext,
    /// Camera and its uniform buffer.
    pub camera: CameraController,
    scene: Scene<DeviceBuffer>,
    renderer: CubeRenderer,
    picker: Option<GpuPicker>,
    composer: ShaderComposer,
    input: InputProcessor,
    options: Options,
}

impl CubeEngine {
    /// Create an engine rendering into `window`.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError`] if the GPU context, shaders or buffers
    /// cannot be created.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
    ) -> Result<Self, CubefieldError> {
        let context = RenderContext::new(window, size).await?;
        Self::with_context(context, options)
    }

    /// Create an engine over an existing context (windowed or headless).
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError`] if shaders or buffers cannot be created.
    pub fn with_context(
        context: RenderContext,
        options: Options,
    ) -> Result<Self, CubefieldError> {
        let mut composer = ShaderComposer::new()?;
        let camera = CameraController::new(&context, &options.camera);
        let renderer =
            CubeRenderer::new(&context, &camera.layout, &mut composer)?;
        let picker = if options.selection.gpu_picking {
            Some(GpuPicker::new(&context, &mut composer)?)
        } else {
            None
        };
        let buffer = |label: &str| {
            DeviceBuffer::new(&context.device, &context.queue, label)
        };
        let scene = Scene::new(
            buffer("Instance Buffer")?,
            buffer("Selection Buffer")?,
            options.layout.strategy,
            options.layout.params(),
            options.selection.pick_radius_scale,
        );
        let input =
            InputProcessor::with_key_bindings(options.keybindings.clone());

        Ok(Self {
            context,
            camera,
            scene,
            renderer,
            picker,
            composer,
            input,
            options,
        })
    }

    /// Replace the record set, reset the selection and frame the camera
    /// on the new layout.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError::Gpu`] if the buffers cannot grow; the
    /// previous records stay loaded.
    pub fn load_records(
        &mut self,
        records: Vec<Record>,
    ) -> Result<(), CubefieldError> {
        self.scene.load(records)?;
        self.frame_scene();
        Ok(())
    }

    /// Apply new options. Layout tunables trigger a full re-layout.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError::Gpu`] if enabling GPU picking fails to
    /// compile its shader.
    pub fn apply_options(
        &mut self,
        options: Options,
    ) -> Result<(), CubefieldError> {
        self.camera.apply_options(&options.camera);
        let params = options.layout.params();
        if params != *self.scene.store().params() {
            self.scene.set_layout_params(params);
        }
        if options.layout.strategy != self.scene.strategy() {
            self.scene.set_strategy(options.layout.strategy);
        }
        self.scene
            .set_pick_radius_scale(options.selection.pick_radius_scale);
        match (options.selection.gpu_picking, self.picker.is_some()) {
            (true, false) => {
                self.picker =
                    Some(GpuPicker::new(&self.context, &mut self.composer)?);
            }
            (false, true) => self.picker = None,
            _ => {}
        }
        self.input.set_key_bindings(options.keybindings.clone());
        self.options = options;
        Ok(())
    }

    /// Resize the surface, depth target and camera aspect together.
    /// Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.context.resize(width, height) {
            self.renderer.resize(&self.context.device, width, height);
            self.camera.resize(width, height);
        }
    }

    /// Feed a window event through the input processor and execute the
    /// resulting command, if any.
    ///
    /// # Errors
    ///
    /// See [`CubeEngine::execute`].
    pub fn handle_input(
        &mut self,
        event: InputEvent,
    ) -> Result<(), CubefieldError> {
        match self.input.handle_event(event) {
            Some(command) => self.execute(command),
            None => Ok(()),
        }
    }

    /// Integrate held movement keys over `dt` seconds and flush the
    /// camera uniform.
    pub fn update(&mut self, dt: f32) {
        let (forward, right) = self.input.fly_axes();
        self.camera.fly(forward, right, dt);
        self.camera.update_gpu(&self.context.queue);
    }

    /// Draw one frame to the surface and present it.
    ///
    /// # Errors
    ///
    /// Returns the surface error if no frame could be acquired.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.render_to(&view);
        frame.present();
        Ok(())
    }

    /// Draw one frame into `target`, which must match the context's
    /// format and size.
    pub fn render_to(&mut self, target: &wgpu::TextureView) {
        self.renderer.prepare(
            &self.context.device,
            self.scene.attributes_view(),
            self.scene.selection_view(),
        );
        let mut encoder = self.context.create_encoder("Frame Encoder");
        self.renderer
            .render(&mut encoder, target, &self.camera.bind_group);
        self.context.submit(encoder);
    }

    /// The record scene.
    #[must_use]
    pub fn scene(&self) -> &Scene<DeviceBuffer> {
        &self.scene
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Point the camera at the middle of the laid-out records from far
    /// enough back to see all of them.
    pub fn frame_scene(&mut self) {
        let centers = self.scene.store().attributes().iter().map(InstanceAttributes::center);
        let Some((min, max)) = bounds(centers) else {
            return;
        };
        let center = (min + max) * 0.5;
        let radius = (max - min).length().max(1.0) * 0.5;
        let distance =
            radius / (self.options.camera.fovy.to_radians() * 0.5).tan();
        self.camera.camera.set_pose(Pose {
            position: center + Vec3::new(0.0, radius * 0.4, distance + radius),
            target: center,
            up: Vec3::Y,
        });
    }
}

/// Axis-aligned bounds of `points`, or `None` when empty.
fn bounds(points: impl Iterator<Item = Vec3>) -> Option<(Vec3, Vec3)> {
    points.fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_every_point() {
        assert_eq!(bounds(std::iter::empty()), None);
        let (min, max) = bounds(
            [Vec3::new(1.0, -2.0, 0.0), Vec3::new(-3.0, 4.0, 5.0)].into_iter(),
        )
        .unwrap();
        assert_eq!(min, Vec3::new(-3.0, -2.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 4.0, 5.0));
    }
}
