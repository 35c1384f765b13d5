use flow_viewer::{
    backend::uniform::{UniformKind, UniformLayout},
    pipelines::{grid, outline, phong},
    resources::load_string,
};
use naga::{
    AddressSpace, ArraySize, Handle, Module, ResourceBinding, ScalarKind, Type, TypeInner,
    VectorSize,
    valid::{Capabilities, ValidationFlags, Validator},
};

use crate::common::test_utils::asset_root;

mod common;

fn parse_and_validate(file: &str) -> Module {
    let source = load_string(&asset_root(), file).unwrap();
    let module = naga::front::wgsl::parse_str(&source)
        .unwrap_or_else(|e| panic!("{} does not parse:\n{}", file, e.emit_to_string(&source)));
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{} does not validate: {:?}", file, e));
    module
}

/// Type of the struct bound at `@group(0) @binding(0)` in the uniform address space.
fn uniform_struct(module: &Module, file: &str) -> Handle<Type> {
    module
        .global_variables
        .iter()
        .find(|(_, var)| {
            var.space == AddressSpace::Uniform
                && var.binding == Some(ResourceBinding { group: 0, binding: 0 })
        })
        .map(|(_, var)| var.ty)
        .unwrap_or_else(|| panic!("{} has no uniform at group 0 binding 0", file))
}

fn kind_of(inner: &TypeInner) -> Option<UniformKind> {
    match *inner {
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => Some(UniformKind::Mat4),
        TypeInner::Vector {
            size: VectorSize::Quad,
            scalar,
        } if scalar.kind == ScalarKind::Float => Some(UniformKind::Vec4),
        TypeInner::Vector {
            size: VectorSize::Tri,
            scalar,
        } if scalar.kind == ScalarKind::Float => Some(UniformKind::Vec3),
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Float => Some(UniformKind::Float),
            ScalarKind::Sint => Some(UniformKind::Int),
            // booleans travel as u32
            ScalarKind::Uint => Some(UniformKind::Bool),
            _ => None,
        },
        _ => None,
    }
}

/// Flattens the uniform struct into `(name, offset, kind)` the way
/// [`UniformLayout`] names its slots, plus the struct's span.
fn flatten(module: &Module, ty: Handle<Type>) -> (Vec<(String, usize, Option<UniformKind>)>, usize) {
    let TypeInner::Struct { members, span } = &module.types[ty].inner else {
        panic!("uniform is not a struct");
    };
    let mut slots = Vec::new();
    for member in members {
        let name = format!("u_{}", member.name.as_deref().unwrap());
        let offset = member.offset as usize;
        match &module.types[member.ty].inner {
            TypeInner::Array {
                base,
                size: ArraySize::Constant(len),
                stride,
            } => {
                let TypeInner::Struct { members: fields, .. } = &module.types[*base].inner else {
                    panic!("{} is not an array of structs", name);
                };
                for i in 0..len.get() as usize {
                    for field in fields {
                        slots.push((
                            format!("{}[{}].{}", name, i, field.name.as_deref().unwrap()),
                            offset + i * *stride as usize + field.offset as usize,
                            kind_of(&module.types[field.ty].inner),
                        ));
                    }
                }
            }
            inner => slots.push((name, offset, kind_of(inner))),
        }
    }
    (slots, *span as usize)
}

fn assert_layout_matches(layout: &UniformLayout, file: &str) {
    let module = parse_and_validate(file);
    let (slots, span) = flatten(&module, uniform_struct(&module, file));

    assert_eq!(slots.len(), layout.len(), "member count of {}", file);
    for (name, offset, kind) in slots {
        let slot = layout
            .slot(&name)
            .unwrap_or_else(|| panic!("{} declares {} but the layout does not", file, name));
        assert_eq!(slot.offset, offset, "offset of {} in {}", name, file);
        assert_eq!(Some(slot.kind), kind, "type of {} in {}", name, file);
    }
    assert_eq!(layout.size(), span, "size of the uniform struct in {}", file);
}

#[test]
fn should_match_grid_layout_to_both_grid_shaders() {
    let layout = grid::layout();
    assert_layout_matches(&layout, grid::VERTEX_SHADER);
    assert_layout_matches(&layout, grid::FRAGMENT_SHADER);
}

#[test]
fn should_match_phong_layout_to_both_phong_shaders() {
    let layout = phong::layout();
    assert_layout_matches(&layout, phong::VERTEX_SHADER);
    assert_layout_matches(&layout, phong::FRAGMENT_SHADER);
}

#[test]
fn should_match_outline_layout_to_both_outline_shaders() {
    let layout = outline::layout();
    assert_layout_matches(&layout, outline::VERTEX_SHADER);
    assert_layout_matches(&layout, outline::FRAGMENT_SHADER);
}

#[test]
fn should_expose_the_entry_points_pipelines_use() {
    for (file, stage) in [
        (grid::VERTEX_SHADER, naga::ShaderStage::Vertex),
        (grid::FRAGMENT_SHADER, naga::ShaderStage::Fragment),
        (phong::VERTEX_SHADER, naga::ShaderStage::Vertex),
        (phong::FRAGMENT_SHADER, naga::ShaderStage::Fragment),
        (outline::VERTEX_SHADER, naga::ShaderStage::Vertex),
        (outline::FRAGMENT_SHADER, naga::ShaderStage::Fragment),
    ] {
        let module = parse_and_validate(file);
        let name = match stage {
            naga::ShaderStage::Vertex => "vs_main",
            _ => "fs_main",
        };
        assert!(
            module
                .entry_points
                .iter()
                .any(|entry| entry.name == name && entry.stage == stage),
            "{} has no {} entry point",
            file,
            name
        );
    }
}
