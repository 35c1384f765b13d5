//! Application event loop.
//!
//! [`run`] opens one window per camera entity, each backed by its own wgpu
//! [`Context`] and [`ViewportSurface`], and drives them from winit:
//!
//! 1. `resumed` creates the windows and initializes the surfaces
//! 2. window events are translated into resizes, input and redraws
//! 3. `about_to_wait` advances every surface's redraw timer and sleeps until
//!    the earliest next deadline
//! 4. `suspended`, `Destroyed` and `CloseRequested` tear the surfaces down
//!    while their contexts are still alive

use std::{cell::RefCell, collections::HashMap, rc::Rc, sync::Arc};

use anyhow::Context as _;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::{components::Tag, registry::Entity, scene::Scene},
    input::translate_window_event,
    viewport::ViewportSurface,
};

struct Viewport {
    window: Arc<Window>,
    surface: ViewportSurface<Context>,
}

impl Viewport {
    fn flush_redraw(&mut self) {
        if self.surface.take_redraw_request() {
            self.window.request_redraw();
        }
    }
}

struct App {
    scene: Rc<RefCell<Scene>>,
    cameras: Vec<Entity>,
    config: ViewerConfig,
    viewports: HashMap<WindowId, Viewport>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(scene: Rc<RefCell<Scene>>, cameras: Vec<Entity>, config: ViewerConfig) -> Self {
        Self {
            scene,
            cameras,
            config,
            viewports: HashMap::new(),
            error: None,
        }
    }

    fn open_viewport(&self, event_loop: &ActiveEventLoop, camera: Entity) -> anyhow::Result<Viewport> {
        let title = self
            .scene
            .borrow()
            .registry()
            .get::<Tag>(camera)
            .map(|tag| format!("flow-viewer: {}", tag.0))
            .unwrap_or_else(|| "flow-viewer".to_string());
        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title(title))
                .context("failed to create window")?,
        );

        let mut surface = ViewportSurface::new(self.scene.clone(), camera, self.config.clone());
        let size = window.inner_size();
        surface.resize(size.width, size.height);

        let gpu = futures::executor::block_on(Context::new(window.clone(), &self.config))?;
        log::debug!("viewport {:?} renders with {}x MSAA", camera, gpu.sample_count());
        surface.initialize(gpu);

        let mut viewport = Viewport { window, surface };
        viewport.flush_redraw();
        Ok(viewport)
    }

    fn tear_down(&mut self, id: WindowId) {
        if let Some(mut viewport) = self.viewports.remove(&id) {
            viewport.surface.context_about_to_be_destroyed();
        }
    }

    fn tear_down_all(&mut self) {
        for (_, mut viewport) in self.viewports.drain() {
            viewport.surface.context_about_to_be_destroyed();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.viewports.is_empty() {
            return;
        }
        for camera in self.cameras.clone() {
            match self.open_viewport(event_loop, camera) {
                Ok(viewport) => {
                    log::info!("opened viewport for camera {:?}", camera);
                    self.viewports.insert(viewport.window.id(), viewport);
                }
                Err(e) => {
                    self.error = Some(e);
                    self.tear_down_all();
                    event_loop.exit();
                    return;
                }
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        // surfaces are recreated on the next `resumed`
        self.tear_down_all();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(mut viewport) = self.viewports.remove(&id) {
                    viewport.surface.close();
                }
                if self.viewports.is_empty() {
                    event_loop.exit();
                }
                return;
            }
            WindowEvent::Destroyed => {
                self.tear_down(id);
                return;
            }
            _ => {}
        }

        let Some(viewport) = self.viewports.get_mut(&id) else {
            return;
        };
        match event {
            WindowEvent::Resized(size) => viewport.surface.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if let Some(stats) = viewport.surface.paint() {
                    log::trace!("{:?} drew {:?}", viewport.surface.camera_entity(), stats);
                }
            }
            other => {
                if let Some(input) = translate_window_event(&other) {
                    viewport.surface.handle_input(input);
                }
            }
        }
        viewport.flush_redraw();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let mut next_deadline: Option<Instant> = None;
        for viewport in self.viewports.values_mut() {
            viewport.surface.on_timer(now);
            viewport.flush_redraw();
            if let Some(deadline) = viewport.surface.next_frame_deadline() {
                next_deadline = Some(next_deadline.map_or(deadline, |d| d.min(deadline)));
            }
        }
        event_loop.set_control_flow(match next_deadline {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        });
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.tear_down_all();
    }
}

/// Opens a window per entry of `cameras` and runs until every window is closed.
pub fn run(scene: Rc<RefCell<Scene>>, cameras: Vec<Entity>, config: ViewerConfig) -> anyhow::Result<()> {
    anyhow::ensure!(!cameras.is_empty(), "no camera entities to open viewports for");
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);
    let mut app = App::new(scene, cameras, config);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
