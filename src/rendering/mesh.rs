//! GPU vertex layouts, the shared bar box, and bolt ribbon tessellation.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::scene::BarState;

/// Box vertex (position + face normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-bar instance data (model matrix columns + emissive color)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BarInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl BarInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4
    ];

    pub fn from_bar(bar: &BarState, width: f32) -> Self {
        let [r, g, b] = bar.color;
        Self {
            model: bar.model_matrix(width).to_cols_array_2d(),
            color: [r, g, b, 1.0],
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BarInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Bolt ribbon vertex
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BoltVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl BoltVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BoltVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Vertices emitted per path segment (two triangles)
pub const VERTICES_PER_SEGMENT: usize = 6;

/// Unit box centered on the origin (24 vertices, 36 indices, CCW outward)
pub fn unit_box() -> (Vec<MeshVertex>, Vec<u16>) {
    // (normal, tangent u, tangent v) per face; u x v = normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = (normal + u * su + v * sv) * 0.5;
            vertices.push(MeshVertex {
                position: position.to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

/// Append a camera-facing ribbon along `path` to `out`
///
/// Each segment becomes a quad `width` wide, turned toward `eye`.
pub fn tessellate_bolt(
    path: &[Vec3],
    width: f32,
    color: [f32; 3],
    eye: Vec3,
    out: &mut Vec<BoltVertex>,
) {
    let half = width / 2.0;
    for pair in path.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        let to_eye = eye - (p0 + p1) * 0.5;
        let side = (p1 - p0).cross(to_eye).normalize_or_zero() * half;

        let corners = [p0 - side, p0 + side, p1 + side, p1 - side];
        for i in [0, 1, 2, 0, 2, 3] {
            out.push(BoltVertex {
                position: corners[i].to_array(),
                color,
            });
        }
    }
}
