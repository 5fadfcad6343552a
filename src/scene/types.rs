use glam::{Vec2, Vec3};
use std::fmt::{Debug, Formatter};

#[derive(Clone, Default)]
pub struct Mesh {
    pub vertex_buffers: VertexBuffers,
    pub index_buffer: Vec<u32>,
}

impl Debug for Mesh {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ vertex_buffers: {:?}, ", self.vertex_buffers)?;
        write!(f, "index_buffer: [{}] }}", self.index_buffer.len())
    }
}

#[derive(Clone, Default)]
pub struct VertexBuffers {
    pub position_buffer: Vec<Vec3>,
    pub normals_buffer: Vec<Vec3>,
    pub texcoord_buffer_0: Vec<Vec2>,
}

impl Debug for VertexBuffers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ position_buffer: [{}], ", self.position_buffer.len())?;
        write!(f, "normals_buffer: [{}], ", self.normals_buffer.len())?;
        write!(f, "texcoord_buffer_0: [{}] }}", self.texcoord_buffer_0.len())
    }
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertex_buffers.position_buffer.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.index_buffer.len() / 3
    }

    /// A flat strip of `width` following `centerline` on the XZ plane, facing up.
    pub fn ribbon(centerline: &[Vec3], width: f32) -> Self {
        if centerline.len() < 2 {
            return Mesh::default();
        }

        let mut mesh = Mesh::default();
        let half_width = width * 0.5;
        let mut travelled = 0.0;

        for (index, point) in centerline.iter().enumerate() {
            let previous = centerline[index.saturating_sub(1)];
            let next = centerline[(index + 1).min(centerline.len() - 1)];
            let direction = (next - previous).normalize_or_zero();
            // left of the travel direction, see util::yaw_rotation
            let side = Vec3::new(direction.z, 0.0, -direction.x);

            if index > 0 {
                travelled += point.distance(previous);
            }

            let buffers = &mut mesh.vertex_buffers;
            buffers.position_buffer.push(*point - side * half_width);
            buffers.position_buffer.push(*point + side * half_width);
            buffers.normals_buffer.extend([Vec3::Y, Vec3::Y]);
            buffers
                .texcoord_buffer_0
                .extend([Vec2::new(0.0, travelled), Vec2::new(1.0, travelled)]);
        }

        for quad in 0..(centerline.len() as u32 - 1) {
            let base = quad * 2;
            mesh.index_buffer
                .extend([base, base + 2, base + 1, base + 1, base + 2, base + 3]);
        }

        mesh
    }

    /// An axis aligned box standing on the XZ plane, centered on the origin.
    pub fn cuboid(width: f32, depth: f32, height: f32) -> Self {
        let (hx, hz) = (width * 0.5, depth * 0.5);
        let faces: [(Vec3, [Vec3; 4]); 5] = [
            (
                Vec3::Y,
                [
                    Vec3::new(-hx, height, -hz),
                    Vec3::new(-hx, height, hz),
                    Vec3::new(hx, height, hz),
                    Vec3::new(hx, height, -hz),
                ],
            ),
            (
                Vec3::X,
                [
                    Vec3::new(hx, 0.0, -hz),
                    Vec3::new(hx, height, -hz),
                    Vec3::new(hx, height, hz),
                    Vec3::new(hx, 0.0, hz),
                ],
            ),
            (
                Vec3::NEG_X,
                [
                    Vec3::new(-hx, 0.0, hz),
                    Vec3::new(-hx, height, hz),
                    Vec3::new(-hx, height, -hz),
                    Vec3::new(-hx, 0.0, -hz),
                ],
            ),
            (
                Vec3::Z,
                [
                    Vec3::new(hx, 0.0, hz),
                    Vec3::new(hx, height, hz),
                    Vec3::new(-hx, height, hz),
                    Vec3::new(-hx, 0.0, hz),
                ],
            ),
            (
                Vec3::NEG_Z,
                [
                    Vec3::new(-hx, 0.0, -hz),
                    Vec3::new(-hx, height, -hz),
                    Vec3::new(hx, height, -hz),
                    Vec3::new(hx, 0.0, -hz),
                ],
            ),
        ];

        let mut mesh = Mesh::default();
        for (normal, corners) in faces {
            let base = mesh.vertex_buffers.position_buffer.len() as u32;
            mesh.vertex_buffers.position_buffer.extend(corners);
            mesh.vertex_buffers.normals_buffer.extend([normal; 4]);
            mesh.vertex_buffers.texcoord_buffer_0.extend([
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
            ]);
            mesh.index_buffer
                .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ribbon_has_two_vertices_per_centerline_point() {
        let centerline = [Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, 10.0)];
        let mesh = Mesh::ribbon(&centerline, 8.0);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 4);
        // left edge of a road driving along +Z lies on +X
        assert_eq!(mesh.vertex_buffers.position_buffer[1], Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn ribbon_of_a_single_point_is_empty() {
        assert_eq!(Mesh::ribbon(&[Vec3::ONE], 4.0).vertex_count(), 0);
    }

    #[test]
    fn cuboid_has_five_faces() {
        let mesh = Mesh::cuboid(2.0, 2.0, 3.0);
        assert_eq!(mesh.vertex_count(), 20);
        assert_eq!(mesh.triangle_count(), 10);
    }
}
