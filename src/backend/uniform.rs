//! Named uniform blocks.
//!
//! Shaders address their uniforms by name (`u_view`, `u_levels[2].spacing`),
//! while the GPU sees a single uniform buffer per draw. A [`UniformLayout`]
//! maps each name to a byte offset following WGSL's uniform address space
//! rules, and a [`UniformBlock`] is the CPU-side staging copy that setters
//! write into before each draw snapshots it.

use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec4,
    Vec3,
    Float,
    Int,
    /// Stored as `u32` since WGSL booleans are not host-shareable.
    Bool,
}

impl UniformKind {
    fn align(self) -> usize {
        match self {
            UniformKind::Mat4 | UniformKind::Vec4 | UniformKind::Vec3 => 16,
            UniformKind::Float | UniformKind::Int | UniformKind::Bool => 4,
        }
    }

    fn size(self) -> usize {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec4 => 16,
            UniformKind::Vec3 => 12,
            UniformKind::Float | UniformKind::Int | UniformKind::Bool => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Mat4(cgmath::Matrix4<f32>),
    Vec4([f32; 4]),
    Vec3(cgmath::Vector3<f32>),
    Float(f32),
    Int(i32),
    Bool(bool),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Bool(_) => UniformKind::Bool,
        }
    }

    fn write(&self, dst: &mut [u8]) {
        match *self {
            UniformValue::Mat4(matrix) => {
                // cgmath is column-major like WGSL's mat4x4
                let columns: [[f32; 4]; 4] = matrix.into();
                dst.copy_from_slice(bytemuck::cast_slice(&columns));
            }
            UniformValue::Vec4(v) => dst.copy_from_slice(bytemuck::cast_slice(&v)),
            UniformValue::Vec3(v) => {
                let v: [f32; 3] = v.into();
                dst.copy_from_slice(bytemuck::cast_slice(&v));
            }
            UniformValue::Float(v) => dst.copy_from_slice(bytemuck::bytes_of(&v)),
            UniformValue::Int(v) => dst.copy_from_slice(bytemuck::bytes_of(&v)),
            UniformValue::Bool(v) => dst.copy_from_slice(bytemuck::bytes_of(&(v as u32))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: usize,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniformError {
    #[error("no uniform named `{0}`")]
    UnknownName(String),
    #[error("uniform `{name}` is a {expected:?}, got a {found:?}")]
    TypeMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
}

/// Byte layout of one shader's uniform struct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformLayout {
    slots: HashMap<String, UniformSlot>,
    size: usize,
}

impl UniformLayout {
    pub fn builder() -> UniformLayoutBuilder {
        UniformLayoutBuilder::default()
    }

    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }

    /// Size in bytes of the whole struct, padded to 16.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Declares struct members in the order the WGSL struct lists them.
#[derive(Debug, Default)]
pub struct UniformLayoutBuilder {
    slots: HashMap<String, UniformSlot>,
    cursor: usize,
}

impl UniformLayoutBuilder {
    pub fn field(mut self, name: &str, kind: UniformKind) -> Self {
        let offset = align_up(self.cursor, kind.align());
        self.slots.insert(name.to_string(), UniformSlot { offset, kind });
        self.cursor = offset + kind.size();
        self
    }

    /// A fixed-size array of structs, addressed as `name[i].member`.
    pub fn array(mut self, name: &str, len: usize, members: &[(&str, UniformKind)]) -> Self {
        let mut member_offsets = Vec::with_capacity(members.len());
        let mut cursor = 0;
        let mut struct_align = 16;
        for (member, kind) in members {
            let offset = align_up(cursor, kind.align());
            member_offsets.push((*member, offset, *kind));
            cursor = offset + kind.size();
            struct_align = struct_align.max(kind.align());
        }
        // uniform arrays need a 16-byte element stride
        let stride = align_up(align_up(cursor, struct_align), 16);
        let base = align_up(self.cursor, 16);
        for i in 0..len {
            for (member, offset, kind) in &member_offsets {
                self.slots.insert(
                    format!("{}[{}].{}", name, i, member),
                    UniformSlot {
                        offset: base + i * stride + offset,
                        kind: *kind,
                    },
                );
            }
        }
        self.cursor = base + len * stride;
        self
    }

    pub fn build(self) -> UniformLayout {
        UniformLayout {
            slots: self.slots,
            size: align_up(self.cursor.max(16), 16),
        }
    }
}

/// CPU-side staging copy of one shader's uniforms.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    layout: UniformLayout,
    data: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let data = vec![0; layout.size()];
        Self { layout, data }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let slot = self
            .layout
            .slot(name)
            .ok_or_else(|| UniformError::UnknownName(name.to_string()))?;
        if slot.kind != value.kind() {
            return Err(UniformError::TypeMismatch {
                name: name.to_string(),
                expected: slot.kind,
                found: value.kind(),
            });
        }
        value.write(&mut self.data[slot.offset..slot.offset + slot.kind.size()]);
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

pub(crate) fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}
