//! The fixed unit-cube mesh every instance is drawn with.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Number of vertices in [`unit_cube`]: 6 faces × 2 triangles × 3.
pub const CUBE_VERTEX_COUNT: u32 = 36;

/// One cube vertex. Must match `VertexInput` in `raster/cube.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CubeVertex {
    /// Object-space position, each component ±0.5.
    pub position: [f32; 3],
    /// Outward face normal.
    pub normal: [f32; 3],
}

impl CubeVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout for pipeline creation.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Face normal with two in-plane axes satisfying `u × v = normal`, which
/// makes the emitted triangles counter-clockwise seen from outside.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

const CORNERS: [(f32, f32); 6] = [
    (-1.0, -1.0),
    (1.0, -1.0),
    (1.0, 1.0),
    (-1.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
];

/// Unit cube centered on the origin as a non-indexed triangle list.
#[must_use]
pub fn unit_cube() -> Vec<CubeVertex> {
    FACES
        .iter()
        .flat_map(|&(normal, u, v)| {
            CORNERS.iter().map(move |&(s, t)| CubeVertex {
                position: ((normal + u * s + v * t) * 0.5).to_array(),
                normal: normal.to_array(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_36_outward_ccw_vertices() {
        let mesh = unit_cube();
        assert_eq!(mesh.len(), CUBE_VERTEX_COUNT as usize);
        for tri in mesh.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vec3::from(v.position));
            let normal = Vec3::from(tri[0].normal);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
            assert!(tri.iter().all(|v| v.normal == tri[0].normal));
        }
        for v in &mesh {
            assert!(v.position.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn vertex_matches_shader_stride() {
        assert_eq!(size_of::<CubeVertex>(), 24);
        assert_eq!(CubeVertex::layout().attributes.len(), 2);
    }
}
