use std::{cell::RefCell, rc::Rc};

use cgmath::{Deg, Rotation3};
use flow_viewer::{
    camera::Camera,
    config::ViewerConfig,
    data_structures::{
        components::{GridComponent, RenderableMesh, Transform},
        scene::Scene,
    },
    flow,
    logging::{LoggingConfig, init_logging},
};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let mut scene = Scene::new();

    let grid = scene.spawn("grid");
    scene.registry_mut().insert(grid, GridComponent::default());

    let root = scene.spawn("root cube");
    scene.registry_mut().insert(root, RenderableMesh::default());

    // follows the root cube, offset along +X
    let child = scene.spawn("child cube");
    scene
        .registry_mut()
        .insert(child, Transform::from_translation([2.0f32, 0.0, 0.0]).with_scale([0.5f32, 0.5, 0.5]));
    scene.registry_mut().insert(
        child,
        RenderableMesh {
            color: [0.3, 0.6, 0.9],
        },
    );
    scene.set_parent(child, root)?;

    let overlapping = scene.spawn("overlapping cube");
    scene.registry_mut().insert(
        overlapping,
        Transform::from_translation([0.4f32, 0.3, 0.3])
            .with_rotation(cgmath::Quaternion::from_angle_y(Deg(30.0f32))),
    );
    scene.registry_mut().insert(
        overlapping,
        RenderableMesh {
            color: [0.9, 0.4, 0.3],
        },
    );

    let main_camera = scene.spawn_camera("main camera", Camera::default());
    let mut side = Camera::default();
    side.yaw = Deg(135.0f32).into();
    let side_camera = scene.spawn_camera("side camera", side);

    let config = ViewerConfig::from_env();
    log::info!("loading shaders from {}", config.resource_root.display());

    flow::run(
        Rc::new(RefCell::new(scene)),
        vec![main_camera, side_camera],
        config,
    )
}
