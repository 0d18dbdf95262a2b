//! Procedural shape generation
//!
//! Stateless generators for the box, grid and pyramid meshes. All shapes are
//! centered on the origin in x/z. Degenerate dimensions are not validated.

use super::mesh::{MeshData, MeshVertex};
use crate::foundation::math::Vec3;

/// Generator for the sample's procedural shapes
pub struct ShapeBuilder;

impl ShapeBuilder {
    /// Axis-aligned box centered on the origin
    ///
    /// Every face owns four vertices so normals stay flat: 24 vertices and
    /// 36 indices.
    pub fn create_box(width: f32, height: f32, depth: f32) -> MeshData {
        let w2 = 0.5 * width;
        let h2 = 0.5 * height;
        let d2 = 0.5 * depth;

        #[rustfmt::skip]
        let vertices = vec![
            // -Z
            MeshVertex::new(-w2, -h2, -d2, 0.0, 0.0, -1.0),
            MeshVertex::new(-w2, h2, -d2, 0.0, 0.0, -1.0),
            MeshVertex::new(w2, h2, -d2, 0.0, 0.0, -1.0),
            MeshVertex::new(w2, -h2, -d2, 0.0, 0.0, -1.0),
            // +Z
            MeshVertex::new(-w2, -h2, d2, 0.0, 0.0, 1.0),
            MeshVertex::new(w2, -h2, d2, 0.0, 0.0, 1.0),
            MeshVertex::new(w2, h2, d2, 0.0, 0.0, 1.0),
            MeshVertex::new(-w2, h2, d2, 0.0, 0.0, 1.0),
            // +Y
            MeshVertex::new(-w2, h2, -d2, 0.0, 1.0, 0.0),
            MeshVertex::new(-w2, h2, d2, 0.0, 1.0, 0.0),
            MeshVertex::new(w2, h2, d2, 0.0, 1.0, 0.0),
            MeshVertex::new(w2, h2, -d2, 0.0, 1.0, 0.0),
            // -Y
            MeshVertex::new(-w2, -h2, -d2, 0.0, -1.0, 0.0),
            MeshVertex::new(w2, -h2, -d2, 0.0, -1.0, 0.0),
            MeshVertex::new(w2, -h2, d2, 0.0, -1.0, 0.0),
            MeshVertex::new(-w2, -h2, d2, 0.0, -1.0, 0.0),
            // -X
            MeshVertex::new(-w2, -h2, d2, -1.0, 0.0, 0.0),
            MeshVertex::new(-w2, h2, d2, -1.0, 0.0, 0.0),
            MeshVertex::new(-w2, h2, -d2, -1.0, 0.0, 0.0),
            MeshVertex::new(-w2, -h2, -d2, -1.0, 0.0, 0.0),
            // +X
            MeshVertex::new(w2, -h2, -d2, 1.0, 0.0, 0.0),
            MeshVertex::new(w2, h2, -d2, 1.0, 0.0, 0.0),
            MeshVertex::new(w2, h2, d2, 1.0, 0.0, 0.0),
            MeshVertex::new(w2, -h2, d2, 1.0, 0.0, 0.0),
        ];

        let indices = (0..6u32)
            .flat_map(|face| {
                let base = face * 4;
                [base, base + 1, base + 2, base, base + 2, base + 3]
            })
            .collect();

        MeshData::new(vertices, indices)
    }

    /// Flat grid in the xz-plane with `m` rows along z and `n` columns along x
    ///
    /// Row 0 sits at `+depth/2` and column 0 at `-width/2`. Produces `m * n`
    /// vertices with +Y normals and `2 (m-1)(n-1)` triangles. Requires
    /// `m >= 2` and `n >= 2`.
    pub fn create_grid(width: f32, depth: f32, m: u32, n: u32) -> MeshData {
        debug_assert!(m >= 2 && n >= 2, "grid needs at least 2x2 vertices");

        let half_width = 0.5 * width;
        let half_depth = 0.5 * depth;
        let dx = width / (n - 1) as f32;
        let dz = depth / (m - 1) as f32;

        let mut vertices = Vec::with_capacity((m * n) as usize);
        for i in 0..m {
            let z = half_depth - i as f32 * dz;
            for j in 0..n {
                let x = -half_width + j as f32 * dx;
                vertices.push(MeshVertex::new(x, 0.0, z, 0.0, 1.0, 0.0));
            }
        }

        let mut indices = Vec::with_capacity(((m - 1) * (n - 1) * 6) as usize);
        for i in 0..m - 1 {
            for j in 0..n - 1 {
                let top = i * n + j;
                let bottom = (i + 1) * n + j;
                indices.extend_from_slice(&[top, top + 1, bottom, bottom, top + 1, bottom + 1]);
            }
        }

        MeshData::new(vertices, indices)
    }

    /// Square-based pyramid standing on the xz-plane with its apex at `+height`
    ///
    /// Each slanted face gets its own three vertices and a normal computed from
    /// the cross product of its two apex edges. The base is a quad facing -Y.
    /// 16 vertices, 18 indices.
    pub fn create_pyramid(width: f32, depth: f32, height: f32) -> MeshData {
        let w2 = 0.5 * width;
        let d2 = 0.5 * depth;

        let apex = Vec3::new(0.0, height, 0.0);
        let corners = [
            Vec3::new(w2, 0.0, d2),
            Vec3::new(w2, 0.0, -d2),
            Vec3::new(-w2, 0.0, -d2),
            Vec3::new(-w2, 0.0, d2),
        ];

        let mut vertices = Vec::with_capacity(16);
        let mut indices = Vec::with_capacity(18);

        // Faces +X, -Z, -X, +Z; consecutive corners wind clockwise seen from outside
        for k in 0..4 {
            let a = corners[k];
            let b = corners[(k + 1) % 4];
            let normal = face_normal(apex, a, b);

            let base = vertices.len() as u32;
            vertices.push(MeshVertex::from_vectors(apex, normal));
            vertices.push(MeshVertex::from_vectors(a, normal));
            vertices.push(MeshVertex::from_vectors(b, normal));
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        let down = -Vec3::y();
        let base = vertices.len() as u32;
        vertices.push(MeshVertex::from_vectors(Vec3::new(-w2, 0.0, -d2), down));
        vertices.push(MeshVertex::from_vectors(Vec3::new(-w2, 0.0, d2), down));
        vertices.push(MeshVertex::from_vectors(Vec3::new(w2, 0.0, d2), down));
        vertices.push(MeshVertex::from_vectors(Vec3::new(w2, 0.0, -d2), down));
        indices.extend_from_slice(&[base, base + 3, base + 2, base, base + 2, base + 1]);

        MeshData::new(vertices, indices)
    }
}

/// Unit normal of the triangle `(apex, a, b)` from its two apex edges
fn face_normal(apex: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    (a - apex).cross(&(b - apex)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Normal implied by the winding of a triangle
    fn winding_normal(mesh: &MeshData, tri: usize) -> Vec3 {
        let [a, b, c] = mesh.triangles().nth(tri).expect("triangle exists");
        (b.position - a.position)
            .cross(&(c.position - a.position))
            .normalize()
    }

    #[test]
    fn test_box_counts_and_flat_faces() {
        let mesh = ShapeBuilder::create_box(1.5, 1.5, 1.5);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.triangle_count(), 12);

        for face in mesh.vertices.chunks_exact(4) {
            assert!(face.iter().all(|v| v.normal == face[0].normal));
        }
    }

    #[test]
    fn test_box_winding_agrees_with_normals() {
        let mesh = ShapeBuilder::create_box(1.0, 2.0, 3.0);
        for (tri, [a, _, _]) in mesh.triangles().enumerate() {
            assert_relative_eq!(winding_normal(&mesh, tri), a.normal, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_grid_10x10() {
        let mesh = ShapeBuilder::create_grid(50.0, 50.0, 10, 10);
        assert_eq!(mesh.vertices.len(), 100);
        assert_eq!(mesh.triangle_count(), 2 * 9 * 9);
        assert_eq!(mesh.indices.len(), 486);
        assert!(mesh.vertices.iter().all(|v| v.normal == Vec3::y()));
        assert!(mesh.indices.iter().all(|&i| i < 100));
    }

    #[test]
    fn test_grid_spans_requested_extent() {
        let mesh = ShapeBuilder::create_grid(20.0, 30.0, 4, 3);
        let first = mesh.vertices[0].position;
        let last = mesh.vertices[11].position;
        assert_relative_eq!(first, Vec3::new(-10.0, 0.0, 15.0));
        assert_relative_eq!(last, Vec3::new(10.0, 0.0, -15.0));

        for tri in 0..mesh.triangle_count() {
            assert_relative_eq!(winding_normal(&mesh, tri), Vec3::y(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_pyramid_counts() {
        let mesh = ShapeBuilder::create_pyramid(2.0, 2.0, 4.0);
        assert_eq!(mesh.vertices.len(), 16);
        assert_eq!(mesh.indices.len(), 18);
    }

    #[test]
    fn test_pyramid_normals_are_unit_and_outward() {
        let mesh = ShapeBuilder::create_pyramid(2.0, 3.0, 4.0);
        let centroid = Vec3::new(0.0, 1.0, 0.0);

        for (tri, [a, b, c]) in mesh.triangles().enumerate() {
            assert_relative_eq!(a.normal.norm(), 1.0, epsilon = 1e-6);
            assert_eq!(a.normal, b.normal);
            assert_eq!(a.normal, c.normal);

            let face_center = (a.position + b.position + c.position) / 3.0;
            assert!(a.normal.dot(&(face_center - centroid)) > 0.0);
            assert_relative_eq!(winding_normal(&mesh, tri), a.normal, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_pyramid_base_faces_down() {
        let mesh = ShapeBuilder::create_pyramid(2.0, 2.0, 4.0);
        assert!(mesh.vertices[12..].iter().all(|v| v.normal == -Vec3::y()));
    }
}
