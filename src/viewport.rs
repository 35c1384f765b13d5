//! The viewport surface: one camera's view of the shared scene.
//!
//! A [`ViewportSurface`] goes through `Uninitialized -> Initialized ->
//! CleanedUp`. [`ViewportSurface::initialize`] takes ownership of the backend
//! for the surface's graphics context and builds the pass resources on it.
//! Every exit path ([`ViewportSurface::cleanup`], [`ViewportSurface::close`],
//! [`ViewportSurface::context_about_to_be_destroyed`] and `Drop`) funnels into
//! the same transition, which releases those resources through that same
//! backend exactly once and only then drops it.

use std::{
    cell::{Ref, RefCell, RefMut},
    mem,
    rc::Rc,
};

use instant::{Duration, Instant};

use crate::{
    backend::RenderBackend,
    camera::Camera,
    config::ViewerConfig,
    data_structures::{components::CameraComponent, registry::Entity, scene::Scene},
    input::{ButtonState, InputEvent, Key, MouseButton},
    intersection::{AabbIntersection, IntersectionSystem},
    render::{FrameParams, FrameStats, RenderingContext, RenderingSystem},
};

/// Observable lifecycle state of a [`ViewportSurface`].
///
/// # Variants
///
/// - `Uninitialized`: created, no graphics context yet; paints do nothing
/// - `Initialized`: owns a backend and the pass resources built on it
/// - `CleanedUp`: resources released and backend dropped; terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Initialized,
    CleanedUp,
}

/// Fixed-period redraw timer.
#[derive(Clone, Copy, Debug)]
pub struct FrameTimer {
    interval: Duration,
    next: Instant,
}

impl FrameTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next: now + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    /// Whether a tick is due at `now`. Missed ticks are not replayed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.interval;
        true
    }
}

struct Live<B> {
    gpu: B,
    rendering: RenderingContext,
    timer: FrameTimer,
}

enum Lifecycle<B> {
    Uninitialized,
    Initialized(Live<B>),
    CleanedUp,
}

pub struct ViewportSurface<B: RenderBackend> {
    scene: Rc<RefCell<Scene>>,
    camera_entity: Entity,
    config: ViewerConfig,
    lifecycle: Lifecycle<B>,
    intersection: Box<dyn IntersectionSystem>,
    renderer: RenderingSystem,
    width: u32,
    height: u32,
    cursor: Option<(f64, f64)>,
    orbiting: bool,
    panning: bool,
    redraw_requested: bool,
    last_stats: Option<FrameStats>,
}

impl<B: RenderBackend> std::fmt::Debug for ViewportSurface<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportSurface")
            .field("camera_entity", &self.camera_entity)
            .field("state", &self.state())
            .field("size", &(self.width, self.height))
            .finish()
    }
}

impl<B: RenderBackend> ViewportSurface<B> {
    /// # Panics
    ///
    /// If `camera_entity` carries no [`CameraComponent`].
    pub fn new(scene: Rc<RefCell<Scene>>, camera_entity: Entity, config: ViewerConfig) -> Self {
        assert!(
            scene.borrow().registry().has::<CameraComponent>(camera_entity),
            "viewport camera {:?} has no CameraComponent",
            camera_entity
        );
        Self {
            scene,
            camera_entity,
            config,
            lifecycle: Lifecycle::Uninitialized,
            intersection: Box::new(AabbIntersection),
            renderer: RenderingSystem::new(),
            width: 0,
            height: 0,
            cursor: None,
            orbiting: false,
            panning: false,
            redraw_requested: false,
            last_stats: None,
        }
    }

    pub fn with_intersection_system(mut self, system: Box<dyn IntersectionSystem>) -> Self {
        self.intersection = system;
        self
    }

    pub fn state(&self) -> SurfaceState {
        match self.lifecycle {
            Lifecycle::Uninitialized => SurfaceState::Uninitialized,
            Lifecycle::Initialized(_) => SurfaceState::Initialized,
            Lifecycle::CleanedUp => SurfaceState::CleanedUp,
        }
    }

    pub fn camera_entity(&self) -> Entity {
        self.camera_entity
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Runs once, when the surface's graphics context first becomes current.
    ///
    /// Returns `false` (dropping `gpu` unused) if the surface was already
    /// initialized or has been cleaned up.
    pub fn initialize(&mut self, mut gpu: B) -> bool {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Initialized(_) => {
                log::warn!("{:?} is already initialized", self.camera_entity);
                return false;
            }
            Lifecycle::CleanedUp => {
                log::warn!("{:?} was cleaned up and cannot be reinitialized", self.camera_entity);
                return false;
            }
        }

        if self.config.debug_logging {
            gpu.start_debug_logging();
        }
        if self.width > 0 && self.height > 0 {
            gpu.resize(self.width, self.height);
        }
        let rendering = RenderingContext::initialize(&mut gpu, &self.config.resource_root);
        let timer = FrameTimer::new(self.config.frame_interval, Instant::now());
        self.lifecycle = Lifecycle::Initialized(Live {
            gpu,
            rendering,
            timer,
        });
        self.redraw_requested = true;
        log::debug!("viewport {:?} initialized", self.camera_entity);
        true
    }

    /// Releases every GPU resource this surface owns. Idempotent.
    pub fn cleanup(&mut self) {
        match mem::replace(&mut self.lifecycle, Lifecycle::CleanedUp) {
            Lifecycle::Uninitialized => {
                log::debug!("viewport {:?} closed before initialization", self.camera_entity);
            }
            Lifecycle::Initialized(live) => {
                let Live {
                    mut gpu,
                    mut rendering,
                    ..
                } = live;
                if gpu.is_debug_logging() {
                    gpu.stop_debug_logging();
                }
                let failures = rendering.shutdown(&mut gpu);
                if failures > 0 {
                    log::error!(
                        "viewport {:?} cleaned up with {} release failure(s)",
                        self.camera_entity,
                        failures
                    );
                } else {
                    log::debug!("viewport {:?} cleaned up", self.camera_entity);
                }
                // the context goes away only after everything on it was released
                drop(gpu);
            }
            Lifecycle::CleanedUp => {
                log::trace!("viewport {:?} already cleaned up", self.camera_entity);
            }
        }
        self.redraw_requested = false;
    }

    /// Notification that the graphics context is about to be destroyed.
    /// Cleanup has finished when this returns.
    pub fn context_about_to_be_destroyed(&mut self) {
        self.cleanup();
    }

    pub fn close(&mut self) {
        self.cleanup();
    }

    /// Zero sizes are ignored and keep the last valid dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::trace!("ignoring resize of {:?} to {}x{}", self.camera_entity, width, height);
            return;
        }
        self.width = width;
        self.height = height;
        if let Lifecycle::Initialized(live) = &mut self.lifecycle {
            live.gpu.resize(width, height);
        }
        self.request_redraw();
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// `width / height`, or `1.0` while the height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// # Panics
    ///
    /// If the camera entity lost its [`CameraComponent`].
    pub fn camera(&self) -> Ref<'_, Camera> {
        let entity = self.camera_entity;
        Ref::map(self.scene.borrow(), |scene| {
            &scene
                .registry()
                .get::<CameraComponent>(entity)
                .unwrap_or_else(|| panic!("viewport camera {:?} has no CameraComponent", entity))
                .camera
        })
    }

    /// # Panics
    ///
    /// If the camera entity lost its [`CameraComponent`].
    pub fn camera_mut(&self) -> RefMut<'_, Camera> {
        let entity = self.camera_entity;
        RefMut::map(self.scene.borrow_mut(), |scene| {
            &mut scene
                .registry_mut()
                .get_mut::<CameraComponent>(entity)
                .unwrap_or_else(|| panic!("viewport camera {:?} has no CameraComponent", entity))
                .camera
        })
    }

    pub fn backend(&self) -> Option<&B> {
        match &self.lifecycle {
            Lifecycle::Initialized(live) => Some(&live.gpu),
            _ => None,
        }
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        match &mut self.lifecycle {
            Lifecycle::Initialized(live) => Some(&mut live.gpu),
            _ => None,
        }
    }

    pub fn rendering_context(&self) -> Option<&RenderingContext> {
        match &self.lifecycle {
            Lifecycle::Initialized(live) => Some(&live.rendering),
            _ => None,
        }
    }

    pub fn request_redraw(&mut self) {
        if !matches!(self.lifecycle, Lifecycle::CleanedUp) {
            self.redraw_requested = true;
        }
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        mem::take(&mut self.redraw_requested)
    }

    /// Advances the redraw timer, requesting a redraw when a tick is due.
    pub fn on_timer(&mut self, now: Instant) -> bool {
        let due = match &mut self.lifecycle {
            Lifecycle::Initialized(live) => live.timer.tick(now),
            _ => false,
        };
        if due {
            self.redraw_requested = true;
        }
        due
    }

    pub fn next_frame_deadline(&self) -> Option<Instant> {
        match &self.lifecycle {
            Lifecycle::Initialized(live) => Some(live.timer.next_deadline()),
            _ => None,
        }
    }

    pub fn last_frame_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    /// Runs one frame: intersection update, clear, the three passes, present.
    ///
    /// Does nothing outside the `Initialized` state.
    pub fn paint(&mut self) -> Option<FrameStats> {
        let Lifecycle::Initialized(live) = &mut self.lifecycle else {
            log::trace!("paint on {:?} outside of its initialized state", self.camera_entity);
            return None;
        };
        self.redraw_requested = false;

        let scene = Rc::clone(&self.scene);
        let outline = self.intersection.update(&scene.borrow());

        let aspect_ratio = if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        };
        let frame = {
            let mut scene = scene.borrow_mut();
            let camera = &mut scene
                .registry_mut()
                .get_mut::<CameraComponent>(self.camera_entity)
                .unwrap_or_else(|| {
                    panic!("viewport camera {:?} has no CameraComponent", self.camera_entity)
                })
                .camera;
            if camera.is_degenerate() {
                log::warn!("camera of {:?} degenerated, resetting view", self.camera_entity);
                camera.set_to_known_good_view();
            }
            FrameParams {
                view: camera.view_matrix(),
                projection: camera.projection_matrix(aspect_ratio),
                camera_position: camera.position(),
                camera_distance: camera.distance,
            }
        };

        match live.gpu.begin_frame(self.config.clear_colour) {
            Ok(true) => {}
            Ok(false) => {
                self.redraw_requested = true;
                return None;
            }
            Err(e) => {
                log::error!("could not start frame: {}", e);
                return None;
            }
        }
        let stats = self.renderer.render(
            &mut live.gpu,
            &live.rendering,
            &scene.borrow(),
            &frame,
            &outline,
        );
        if let Err(e) = live.gpu.end_frame() {
            log::error!("could not present frame: {}", e);
        }
        self.last_stats = Some(stats);
        Some(stats)
    }

    /// Applies one input event to the bound camera.
    ///
    /// Returns whether the camera changed (a redraw is then requested).
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if matches!(self.lifecycle, Lifecycle::CleanedUp) {
            return false;
        }
        let changed = match event {
            InputEvent::PointerButton { button, state } => {
                let pressed = state == ButtonState::Pressed;
                match button {
                    MouseButton::Left => self.orbiting = pressed,
                    MouseButton::Middle => self.panning = pressed,
                    _ => {}
                }
                false
            }
            InputEvent::PointerMoved { x, y } => {
                let previous = self.cursor.replace((x, y));
                match previous {
                    Some((last_x, last_y)) if self.orbiting || self.panning => {
                        let dx = (x - last_x) as f32;
                        let dy = (y - last_y) as f32;
                        // screen y grows downwards
                        self.camera_mut().process_mouse_movement(dx, -dy, self.panning);
                        true
                    }
                    _ => false,
                }
            }
            InputEvent::MouseWheel(delta) => {
                let notches = delta.notches(self.config.wheel_pixels_per_notch);
                self.camera_mut().process_mouse_scroll(notches);
                notches != 0.0
            }
            InputEvent::Key {
                key,
                state: ButtonState::Pressed,
                repeat: false,
            } => match key {
                Key::P => {
                    self.camera_mut().toggle_projection();
                    true
                }
                Key::R => {
                    self.camera_mut().set_to_known_good_view();
                    true
                }
                Key::Other => false,
            },
            InputEvent::Key { .. } => false,
        };
        if changed {
            self.request_redraw();
        }
        changed
    }
}

impl<B: RenderBackend> Drop for ViewportSurface<B> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
