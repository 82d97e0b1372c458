//! Standalone exploration window backed by winit.
//!
//! ```no_run
//! # use cubefield::Viewer;
//! # use cubefield::scene::record::demo_records;
//! Viewer::builder()
//!     .with_records(demo_records(500))
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::{
    engine::CubeEngine, error::CubefieldError, options::Options,
    scene::record::Record, util::frame_timing::FrameTiming, InputEvent,
    MouseButton,
};

/// Frame cap for the redraw loop.
const TARGET_FPS: u32 = 240;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    records: Vec<Record>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            options: None,
            title: "Cubefield".into(),
        }
    }

    /// Records to show once the window opens.
    #[must_use]
    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            records: self.records,
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window showing a record set as cubes.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    records: Vec<Record>,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError::Viewer`] if the event loop cannot start.
    pub fn run(self) -> Result<(), CubefieldError> {
        let event_loop = EventLoop::new()
            .map_err(|e| CubefieldError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            engine: None,
            timing: FrameTiming::new(TARGET_FPS),
            records: Some(self.records),
            options: Some(self.options),
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| CubefieldError::Viewer(e.to_string()))
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

struct ViewerApp {
    window: Option<Arc<Window>>,
    engine: Option<CubeEngine>,
    timing: FrameTiming,
    /// Handed to the engine on first resume.
    records: Option<Vec<Record>>,
    options: Option<Options>,
    title: String,
}

fn viewport_size(inner: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
    (inner.width.max(1), inner.height.max(1))
}

impl ViewerApp {
    fn create_engine(
        &mut self,
        window: &Arc<Window>,
    ) -> Result<CubeEngine, CubefieldError> {
        let size = viewport_size(window.inner_size());
        let options = self.options.take().unwrap_or_default();
        let mut engine = pollster::block_on(CubeEngine::new(
            Arc::clone(window),
            size,
            options,
        ))?;
        engine.load_records(self.records.take().unwrap_or_default())?;
        Ok(engine)
    }

    fn forward(&mut self, event: InputEvent) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        if let Err(e) = engine.handle_input(event) {
            log::error!("input handling failed: {e}");
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(engine)) = (&self.window, &mut self.engine)
        else {
            return;
        };
        if self.timing.should_render() {
            let dt = self.timing.end_frame();
            engine.update(dt);
            match engine.render() {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                    let (w, h) = viewport_size(window.inner_size());
                    engine.resize(w, h);
                }
                Err(e) => log::error!("render error: {e:?}"),
            }
        }
        window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match self.create_engine(&window) {
            Ok(engine) => self.engine = Some(engine),
            Err(e) => {
                log::error!("Failed to initialize engine: {e}");
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let (w, h) = viewport_size(size);
                if let Some(engine) = &mut self.engine {
                    engine.resize(w, h);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::Focused(false) => self.forward(InputEvent::FocusLost),
            WindowEvent::MouseInput { button, state, .. } => {
                self.forward(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.forward(InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.forward(InputEvent::ModifiersChanged {
                    shift: modifiers.state().shift_key(),
                });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if event.repeat {
                    return;
                }
                self.forward(InputEvent::Key {
                    code: format!("{code:?}"),
                    pressed: event.state == ElementState::Pressed,
                });
            }
            _ => (),
        }
    }
}
