//! Component records attached to scene entities.

use cgmath::{One, Zero};

use crate::{
    camera::Camera,
    data_structures::registry::{Component, Entity},
};

/// Local translation, rotation (as quaternion) and scale relative to the
/// parent entity, or to the world origin when there is none.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn identity() -> Self {
        Self {
            translation: cgmath::Vector3::zero(),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: impl Into<cgmath::Vector3<f32>>) -> Self {
        Self {
            translation: translation.into(),
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: cgmath::Quaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: impl Into<cgmath::Vector3<f32>>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Local 4x4 matrix in `Translate * Rotate * Scale` order.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.translation)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Component for Transform {}

/// Weak link to the parent entity. The handle is not owned; a destroyed
/// parent simply stops the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

impl Component for Parent {}

/// Debug label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag(pub String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

impl Component for Tag {}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CameraComponent {
    pub camera: Camera,
}

impl Component for CameraComponent {}

/// One level of a multi-resolution grid. Lines of this level fade out
/// between `fade_start` and `fade_end` (distance from the camera).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLevel {
    pub spacing: f32,
    pub color: [f32; 4],
    pub fade_start: f32,
    pub fade_end: f32,
}

/// Parameters for the procedural grid drawn by the grid pass.
#[derive(Clone, Debug, PartialEq)]
pub struct GridComponent {
    /// Ordered from finest to coarsest.
    pub levels: Vec<GridLevel>,
    pub axis_x_color: [f32; 4],
    pub axis_z_color: [f32; 4],
    /// Line width in pixels.
    pub line_width: f32,
    pub axis_line_width: f32,
    pub visible: bool,
}

impl Default for GridComponent {
    fn default() -> Self {
        Self {
            levels: vec![
                GridLevel {
                    spacing: 1.0,
                    color: [0.35, 0.35, 0.35, 0.6],
                    fade_start: 15.0,
                    fade_end: 40.0,
                },
                GridLevel {
                    spacing: 10.0,
                    color: [0.5, 0.5, 0.5, 0.8],
                    fade_start: 60.0,
                    fade_end: 250.0,
                },
                GridLevel {
                    spacing: 100.0,
                    color: [0.65, 0.65, 0.65, 0.9],
                    fade_start: 400.0,
                    fade_end: 1500.0,
                },
            ],
            axis_x_color: [0.85, 0.2, 0.2, 1.0],
            axis_z_color: [0.2, 0.35, 0.85, 1.0],
            line_width: 1.0,
            axis_line_width: 2.0,
            visible: true,
        }
    }
}

impl Component for GridComponent {}

/// Marks an entity as drawn with the default mesh (a unit cube centred on
/// the origin) in the mesh pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderableMesh {
    pub color: [f32; 3],
}

impl Default for RenderableMesh {
    fn default() -> Self {
        Self {
            color: [0.7, 0.7, 0.72],
        }
    }
}

impl Component for RenderableMesh {}
