use cgmath::{InnerSpace, Vector3};
use flow_viewer::{
    backend::{GpuError, RenderBackend, ShaderError},
    pipelines::{grid, phong},
    resources::{
        load_string,
        mesh::{Mesh, cube_positions, plane_positions},
        shader::Shader,
    },
};

use crate::common::test_utils::{Call, RecordingBackend, asset_root};

mod common;

#[test]
fn should_wind_cube_faces_outwards() {
    let positions = cube_positions();
    assert_eq!(positions.len(), 36 * 3);

    for triangle in positions.chunks(9) {
        let v = |i: usize| Vector3::new(triangle[i * 3], triangle[i * 3 + 1], triangle[i * 3 + 2]);
        let (a, b, c) = (v(0), v(1), v(2));
        let normal = (b - a).cross(c - a);
        let centre = (a + b + c) / 3.0;
        assert!(normal.dot(centre) > 0.0, "inward triangle {:?}", triangle);
        assert!(triangle.iter().all(|p| p.abs() == 0.5));
    }
}

#[test]
fn should_face_the_plane_upwards() {
    let positions = plane_positions();
    assert_eq!(positions.len(), 6 * 3);

    for triangle in positions.chunks(9) {
        let v = |i: usize| Vector3::new(triangle[i * 3], triangle[i * 3 + 1], triangle[i * 3 + 2]);
        let normal = (v(1) - v(0)).cross(v(2) - v(0));
        assert!(normal.normalize().y > 0.99);
    }
}

#[test]
fn should_reject_partial_vertices() {
    let mut gpu = RecordingBackend::new();

    let result = Mesh::new(&mut gpu, "broken", &[0.0, 1.0, 2.0, 3.0]);

    assert_eq!(result.unwrap_err(), GpuError::MalformedVertices(4));
    assert!(gpu.log().borrow().is_empty());
}

#[test]
fn should_draw_and_release_meshes() {
    let mut gpu = RecordingBackend::new();
    let shader = Shader::new(
        &mut gpu,
        &asset_root(),
        &phong::descriptor(),
        phong::VERTEX_SHADER,
        phong::FRAGMENT_SHADER,
    )
    .unwrap();
    let mesh = Mesh::new(&mut gpu, "cube", &cube_positions()).unwrap();
    let handle = mesh.handle();
    assert_eq!(mesh.vertex_count(), 36);

    gpu.begin_frame([0.0; 4]).unwrap();
    shader.bind(&mut gpu).unwrap();
    mesh.draw(&mut gpu).unwrap();
    gpu.end_frame().unwrap();
    mesh.release(&mut gpu).unwrap();

    assert!(gpu.log().borrow().contains(&Call::DrawMesh(handle)));
    assert_eq!(gpu.delete_mesh(handle), Err(GpuError::UnknownMesh(handle)));
}

#[test]
fn should_report_missing_shader_files_with_their_path() {
    let mut gpu = RecordingBackend::new();
    let root = asset_root().join("missing");

    let err = Shader::new(
        &mut gpu,
        &root,
        &grid::descriptor(),
        grid::VERTEX_SHADER,
        grid::FRAGMENT_SHADER,
    )
    .unwrap_err();

    match err {
        ShaderError::Io { path, .. } => assert_eq!(path, root.join(grid::VERTEX_SHADER)),
        other => panic!("expected an io error, got {}", other),
    }
    assert!(gpu.log().borrow().is_empty());
}

#[test]
fn should_ship_every_pass_shader() {
    let root = asset_root();
    for file in [
        grid::VERTEX_SHADER,
        grid::FRAGMENT_SHADER,
        phong::VERTEX_SHADER,
        phong::FRAGMENT_SHADER,
    ] {
        let source = load_string(&root, file).unwrap();
        assert!(source.contains("@group(0) @binding(0)"), "{} has no uniform binding", file);
    }
}

#[test]
fn should_set_uniforms_only_on_a_bound_shader() {
    let mut gpu = RecordingBackend::new();
    let shader = Shader::new(
        &mut gpu,
        &asset_root(),
        &grid::descriptor(),
        grid::VERTEX_SHADER,
        grid::FRAGMENT_SHADER,
    )
    .unwrap();

    assert_eq!(
        shader.set_float(&mut gpu, "u_fog_start", 1.0),
        Err(GpuError::NoShaderBound)
    );
    shader.bind(&mut gpu).unwrap();
    shader
        .set_float(&mut gpu, "u_levels[2].fade_end", 9.0)
        .unwrap();
    assert!(shader.set_int(&mut gpu, "u_fog_start", 1).is_err());
    assert_eq!(shader.label(), "grid");

    shader.release(&mut gpu).unwrap();
    assert_eq!(gpu.live_resources(), 0);
}
