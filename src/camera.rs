//! Orbit camera with perspective and orthographic projection.
//!
//! The camera orbits a look-at `target` at `distance`, oriented by `yaw`
//! (around +Y) and `pitch` (elevation). Every operation is synchronous and
//! only mutates the camera itself.

use cgmath::{Angle, Deg, InnerSpace, Matrix4, Point3, Rad, Vector3};

/// wgpu clip space has z in `0..1` where cgmath (OpenGL) produces `-1..1`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch stays short of the poles so `look_at` never degenerates.
const MAX_PITCH: Deg<f32> = Deg(89.0);

/// How the view volume is projected onto the viewport.
///
/// # Variants
///
/// - `Perspective`: frustum with vertical field of view `fovy`
/// - `Orthographic`: box whose height follows `distance`, so zooming still
///   changes the apparent size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionMode {
    Perspective,
    Orthographic,
}

/// Orbit camera state. Plain data, owned by a
/// [`CameraComponent`](crate::data_structures::components::CameraComponent).
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// Point the camera looks at and orbits around.
    pub target: Point3<f32>,
    /// Eye distance from `target`, kept within `min_distance..=max_distance`.
    pub distance: f32,
    /// Rotation around +Y. At zero the eye sits on the +X side of `target`.
    pub yaw: Rad<f32>,
    /// Elevation above the XZ plane, clamped short of the poles.
    pub pitch: Rad<f32>,
    /// Vertical field of view in perspective mode.
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub mode: ProjectionMode,
    /// Degrees of orbit per pixel of mouse movement.
    pub orbit_sensitivity: f32,
    /// Target translation per pixel, as a fraction of `distance`.
    pub pan_sensitivity: f32,
    /// Distance multiplier applied per positive wheel notch.
    pub zoom_factor: f32,
    /// Zoom floor.
    pub min_distance: f32,
    /// Zoom ceiling.
    pub max_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            target: Point3::new(0.0, 0.0, 0.0),
            distance: 0.0,
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            fovy: Deg(45.0).into(),
            znear: 0.1,
            zfar: 5000.0,
            mode: ProjectionMode::Perspective,
            orbit_sensitivity: 0.3,
            pan_sensitivity: 0.0015,
            zoom_factor: 0.9,
            min_distance: 0.1,
            max_distance: 2000.0,
        };
        camera.set_to_known_good_view();
        camera
    }
}

impl Camera {
    /// Eye position derived from target, distance, yaw and pitch.
    pub fn position(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw) * self.distance
    }

    /// Right-handed look-at from [`Self::position`] towards `target`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }

    /// Projection for the given aspect ratio (`width / height`).
    ///
    /// Non-finite or non-positive ratios fall back to `1.0`.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Matrix4<f32> {
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            1.0
        };
        match self.mode {
            ProjectionMode::Perspective => {
                OPENGL_TO_WGPU_MATRIX
                    * cgmath::perspective(self.fovy, aspect, self.znear, self.zfar)
            }
            ProjectionMode::Orthographic => {
                // Sized so the target plane keeps its apparent size when toggling.
                let half_height = self.distance * (self.fovy / 2.0).tan();
                let half_width = half_height * aspect;
                OPENGL_TO_WGPU_MATRIX
                    * cgmath::ortho(
                        -half_width,
                        half_width,
                        -half_height,
                        half_height,
                        -self.zfar,
                        self.zfar,
                    )
            }
        }
    }

    /// Orbits by `(x_offset, y_offset)` pixels, or pans the target in the
    /// camera's right/up plane when `is_panning` is set.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, is_panning: bool) {
        if !x_offset.is_finite() || !y_offset.is_finite() {
            return;
        }
        if is_panning {
            let forward = (self.target - self.position()).normalize();
            let right = forward.cross(Vector3::unit_y()).normalize();
            let up = right.cross(forward);
            let scale = self.distance * self.pan_sensitivity;
            self.target = self.target - right * (x_offset * scale) - up * (y_offset * scale);
        } else {
            self.yaw += Rad::from(Deg(x_offset * self.orbit_sensitivity));
            self.yaw = self.yaw.normalize();
            let pitch = Deg::from(self.pitch).0 + y_offset * self.orbit_sensitivity;
            self.pitch = Deg(pitch.clamp(-MAX_PITCH.0, MAX_PITCH.0)).into();
        }
    }

    /// Zooms by `delta` wheel notches. Positive values move closer.
    pub fn process_mouse_scroll(&mut self, delta: f32) {
        if !delta.is_finite() || delta == 0.0 {
            return;
        }
        self.distance =
            (self.distance * self.zoom_factor.powf(delta)).clamp(self.min_distance, self.max_distance);
    }

    pub fn toggle_projection(&mut self) {
        self.mode = match self.mode {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
    }

    /// Resets target, distance and orientation to a fixed overview of the
    /// origin. The projection mode is kept.
    pub fn set_to_known_good_view(&mut self) {
        self.target = Point3::new(0.0, 0.0, 0.0);
        self.distance = 10.0;
        self.yaw = Deg(45.0).into();
        self.pitch = Deg(30.0).into();
    }

    /// True when the orientation state can no longer produce a usable view.
    pub fn is_degenerate(&self) -> bool {
        let finite = self.target.x.is_finite()
            && self.target.y.is_finite()
            && self.target.z.is_finite()
            && self.yaw.0.is_finite()
            && self.pitch.0.is_finite()
            && self.distance.is_finite();
        !finite || self.distance <= 0.0
    }
}
