use flow_viewer::{
    backend::RenderBackend,
    camera::Camera,
    data_structures::{
        components::{Parent, RenderableMesh, Transform},
        scene::Scene,
        scene_graph::HierarchyError,
    },
    intersection::OutlineGeometry,
    render::{FrameParams, FrameStats, RenderingContext, RenderingSystem},
};

use crate::common::test_utils::{RecordingBackend, asset_root};

mod common;

fn frame() -> FrameParams {
    let camera = Camera::default();
    FrameParams {
        view: camera.view_matrix(),
        projection: camera.projection_matrix(1.0),
        camera_position: camera.position(),
        camera_distance: camera.distance,
    }
}

fn render_once(
    system: &mut RenderingSystem,
    gpu: &mut RecordingBackend,
    context: &RenderingContext,
    scene: &Scene,
) -> FrameStats {
    gpu.begin_frame([0.0; 4]).unwrap();
    let stats = system.render(gpu, context, scene, &frame(), &OutlineGeometry::default());
    gpu.end_frame().unwrap();
    stats
}

#[test]
fn should_report_each_distinct_error_of_an_entity() {
    let mut gpu = RecordingBackend::new();
    let context = RenderingContext::initialize(&mut gpu, &asset_root());
    let mut system = RenderingSystem::new();
    let mut scene = Scene::new();
    let cube = scene.spawn("cube");
    let other = scene.spawn("other");
    scene.registry_mut().insert(cube, RenderableMesh::default());
    scene.registry_mut().remove::<Transform>(cube);

    render_once(&mut system, &mut gpu, &context, &scene);
    render_once(&mut system, &mut gpu, &context, &scene);
    assert_eq!(
        system.reported_errors(cube),
        vec![HierarchyError::MissingTransform(cube)]
    );

    scene.registry_mut().insert(cube, Transform::identity());
    scene.registry_mut().insert(cube, Parent(other));
    scene.registry_mut().insert(other, Parent(cube));
    let stats = render_once(&mut system, &mut gpu, &context, &scene);

    assert_eq!(stats.mesh_draws, 0);
    let errors = system.reported_errors(cube);
    assert_eq!(errors.len(), 2);
    assert!(errors.contains(&HierarchyError::MissingTransform(cube)));
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, HierarchyError::CyclicParent(_)))
    );
}

#[test]
fn should_forget_reports_of_destroyed_entities() {
    let mut gpu = RecordingBackend::new();
    let context = RenderingContext::initialize(&mut gpu, &asset_root());
    let mut system = RenderingSystem::new();
    let mut scene = Scene::new();
    let cube = scene.spawn("cube");
    scene.registry_mut().insert(cube, RenderableMesh::default());
    scene.registry_mut().remove::<Transform>(cube);

    render_once(&mut system, &mut gpu, &context, &scene);
    assert_eq!(system.reported_errors(cube).len(), 1);

    scene.destroy(cube);
    let recycled = scene.spawn("recycled");
    scene.registry_mut().insert(recycled, RenderableMesh::default());
    let stats = render_once(&mut system, &mut gpu, &context, &scene);

    assert!(system.reported_errors(cube).is_empty());
    assert!(system.reported_errors(recycled).is_empty());
    assert_eq!(recycled.index(), cube.index());
    assert_eq!(recycled.generation(), cube.generation() + 1);
    assert_eq!(stats.mesh_draws, 1);
}
