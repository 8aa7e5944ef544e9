use std::f32::consts::TAU;

use glam::Vec3;

/// Flat triangle mesh: xyz position triples plus triangle indices.
///
/// Every index references a position triple; the index count is a multiple
/// of three.
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

#[derive(Clone, Copy)]
pub struct TorusParams {
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Segments around the main ring. Must be >= 1.
    pub ring_segments: u32,
    /// Segments around the tube. Must be >= 1.
    pub tube_segments: u32,
}

/// The fixed tetrahedron: four corners, four faces.
pub fn tetrahedron() -> Mesh {
    Mesh {
        vertices: vec![
            1.0, 1.0, 1.0, //
            -1.0, -1.0, 1.0, //
            -1.0, 1.0, -1.0, //
            1.0, -1.0, -1.0,
        ],
        indices: vec![
            0, 1, 2, //
            0, 3, 1, //
            0, 2, 3, //
            1, 3, 2,
        ],
    }
}

/// Closed torus as a row-major `(ring_segments+1) x (tube_segments+1)` vertex
/// grid; the last ring and tube duplicate the first so the surface wraps.
pub fn torus(params: &TorusParams) -> Mesh {
    let TorusParams {
        inner_radius,
        outer_radius,
        ring_segments: numc,
        tube_segments: numt,
    } = *params;

    let mut vertices = Vec::with_capacity(((numc + 1) * (numt + 1) * 3) as usize);

    for i in 0..=numc {
        for j in 0..=numt {
            let s = i as f32 / numc as f32 * TAU;
            let t = j as f32 / numt as f32 * TAU;

            vertices.push((outer_radius + inner_radius * t.cos()) * s.cos());
            vertices.push((outer_radius + inner_radius * t.cos()) * s.sin());
            vertices.push(inner_radius * t.sin());
        }
    }

    let mut indices = Vec::with_capacity((numc * numt * 6) as usize);

    for i in 0..numc {
        for j in 0..numt {
            let first = i * (numt + 1) + j;
            let second = first + numt + 1;

            indices.extend_from_slice(&[first, second, first + 1]);
            indices.extend_from_slice(&[second, second + 1, first + 1]);
        }
    }

    Mesh { vertices, indices }
}

/// Circle disc in the z = center.z plane, fan-shaped around the first
/// perimeter point, expressed as an indexed triangle list.
pub fn circle_fan(center: Vec3, radius: f32, segments: u32) -> Mesh {
    let mut vertices = Vec::with_capacity(((segments + 1) * 3) as usize);
    fan_points_into(&mut vertices, center, radius, segments);

    Mesh {
        vertices,
        indices: fan_indices(segments),
    }
}

/// Appends the `segments + 1` perimeter points of a circle; the last point
/// duplicates the first so the fan closes through the seam.
pub fn fan_points_into(out: &mut Vec<f32>, center: Vec3, radius: f32, segments: u32) {
    for k in 0..=segments {
        let angle = TAU * k as f32 / segments as f32;
        out.push(center.x + radius * angle.cos());
        out.push(center.y + radius * angle.sin());
        out.push(center.z);
    }
}

/// Fan triangles with the first perimeter point as apex: `(0, k, k+1)` for
/// `k in 1..segments`.
pub fn fan_indices(segments: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity((segments.saturating_sub(1) * 3) as usize);
    for k in 1..segments {
        indices.extend_from_slice(&[0, k, k + 1]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(mesh: &Mesh) {
        let vertex_count = mesh.vertex_count() as u32;
        for &index in &mesh.indices {
            assert!(index < vertex_count, "index {index} >= {vertex_count}");
        }
    }

    #[test]
    fn test_tetrahedron_shape() {
        let mesh = tetrahedron();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 12);
        assert_indices_in_range(&mesh);

        for face in mesh.indices.chunks(3) {
            assert_ne!(face[0], face[1]);
            assert_ne!(face[1], face[2]);
            assert_ne!(face[0], face[2]);
        }
    }

    #[test]
    fn test_torus_grid_counts() {
        for (numc, numt) in [(1, 1), (3, 7), (30, 30), (12, 48)] {
            let mesh = torus(&TorusParams {
                inner_radius: 0.3,
                outer_radius: 0.8,
                ring_segments: numc,
                tube_segments: numt,
            });

            assert_eq!(mesh.vertex_count() as u32, (numc + 1) * (numt + 1));
            assert_eq!(mesh.index_count() as u32, numc * numt * 6);
            assert_indices_in_range(&mesh);
        }
    }

    #[test]
    fn test_torus_reference_dimensions() {
        let mesh = torus(&TorusParams {
            inner_radius: 0.3,
            outer_radius: 0.8,
            ring_segments: 30,
            tube_segments: 30,
        });

        assert_eq!(mesh.vertex_count(), 961);
        assert_eq!(mesh.index_count(), 5400);
    }

    #[test]
    fn test_torus_seam_wraps() {
        let mesh = torus(&TorusParams {
            inner_radius: 0.3,
            outer_radius: 0.8,
            ring_segments: 8,
            tube_segments: 8,
        });

        // Row i = 8 duplicates row i = 0, point for point.
        let last_row = 8 * 9 * 3;
        for k in 0..9 * 3 {
            assert!((mesh.vertices[k] - mesh.vertices[last_row + k]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_circle_fan_point_count_and_seam() {
        let mesh = circle_fan(Vec3::ZERO, 0.2, 100);
        assert_eq!(mesh.vertex_count(), 101);

        // k = 0 and k = 100 land on the same angle.
        let first = &mesh.vertices[0..3];
        let last = &mesh.vertices[100 * 3..100 * 3 + 3];
        for k in 0..3 {
            assert!((first[k] - last[k]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_circle_fan_indices() {
        let mesh = circle_fan(Vec3::new(1.0, -1.0, 0.5), 0.2, 100);
        assert_eq!(mesh.index_count(), 99 * 3);
        assert_indices_in_range(&mesh);

        // Every triangle shares the apex.
        for triangle in mesh.indices.chunks(3) {
            assert_eq!(triangle[0], 0);
        }
    }

    #[test]
    fn test_circle_fan_offset_by_center() {
        let center = Vec3::new(1.0, 1.0, 1.0);
        let mesh = circle_fan(center, 0.2, 4);

        for point in mesh.vertices.chunks(3) {
            let dx = point[0] - center.x;
            let dy = point[1] - center.y;
            assert!(((dx * dx + dy * dy).sqrt() - 0.2).abs() < 1e-5);
            assert_eq!(point[2], center.z);
        }
    }
}
