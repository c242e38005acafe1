//! Static unit-cube geometry: interleaved position + color vertices and the
//! triangle index list. Immutable for the process lifetime once uploaded.

/// 8 cube corners, interleaved as position(x, y, z) + color(r, g, b).
pub const CUBE_VERTICES: [f32; 48] = [
    0.5, 0.5, -0.5, 1.0, 1.0, 1.0, // 0
    0.5, -0.5, -0.5, 1.0, 0.0, 0.0, // 1
    -0.5, 0.5, -0.5, 1.0, 1.0, 0.0, // 2
    -0.5, -0.5, -0.5, 1.0, 0.0, 1.0, // 3
    -0.5, 0.5, 0.5, 0.0, 1.0, 1.0, // 4
    -0.5, -0.5, 0.5, 0.0, 1.0, 0.0, // 5
    0.5, 0.5, 0.5, 0.0, 0.0, 1.0, // 6
    0.5, -0.5, 0.5, 0.5, 1.0, 0.5, // 7
];

/// 12 triangles, two per face.
pub const CUBE_INDICES: [u16; 36] = [
    0, 2, 3, 0, 3, 1, // front
    2, 4, 5, 2, 5, 3, // left
    4, 6, 7, 4, 7, 5, // back
    6, 0, 1, 6, 1, 7, // right
    0, 6, 4, 0, 4, 2, // top
    1, 3, 5, 1, 5, 7, // bottom
];

/// Floats per vertex attribute (both position and color are vec3).
pub const ATTRIBUTE_COMPONENTS: i32 = 3;
/// Bytes between consecutive vertices.
pub const VERTEX_STRIDE: i32 = 6 * std::mem::size_of::<f32>() as i32;
/// Byte offset of the position attribute within a vertex.
pub const POSITION_OFFSET: i32 = 0;
/// Byte offset of the color attribute within a vertex.
pub const COLOR_OFFSET: i32 = 3 * std::mem::size_of::<f32>() as i32;

/// Attribute slots plus the interleaved layout constants, in the form the
/// draw call needs them.
#[derive(Debug, Clone, Copy)]
pub struct VertexLayout {
    pub position_slot: u32,
    pub color_slot: u32,
    pub components: i32,
    pub stride: i32,
    pub position_offset: i32,
    pub color_offset: i32,
}

impl VertexLayout {
    pub fn interleaved(position_slot: u32, color_slot: u32) -> VertexLayout {
        VertexLayout {
            position_slot,
            color_slot,
            components: ATTRIBUTE_COMPONENTS,
            stride: VERTEX_STRIDE,
            position_offset: POSITION_OFFSET,
            color_offset: COLOR_OFFSET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix4;
    use crate::transform::TransformPipeline;

    #[test]
    fn cube_has_eight_interleaved_vertices() {
        assert_eq!(CUBE_VERTICES.len(), 8 * 6);
    }

    #[test]
    fn cube_has_twelve_triangles_over_existing_vertices() {
        assert_eq!(CUBE_INDICES.len(), 36);
        assert!(CUBE_INDICES.iter().all(|&index| index < 8));
        // Every corner participates in at least one triangle.
        for corner in 0..8u16 {
            assert!(CUBE_INDICES.contains(&corner));
        }
    }

    /// Screen-space position of vertex `index` under the row-vector product
    /// `v · mvp`, after perspective division.
    fn project(mvp: &Matrix4, index: u16) -> (f32, f32) {
        let base = index as usize * 6;
        let v = [
            CUBE_VERTICES[base],
            CUBE_VERTICES[base + 1],
            CUBE_VERTICES[base + 2],
            1.0,
        ];
        let mut out = [0.0f32; 4];
        for (j, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|k| v[k] * mvp.m[k][j]).sum();
        }
        (out[0] / out[3], out[1] / out[3])
    }

    fn signed_area(mvp: &Matrix4, triangle: &[u16]) -> f32 {
        let (x0, y0) = project(mvp, triangle[0]);
        let (x1, y1) = project(mvp, triangle[1]);
        let (x2, y2) = project(mvp, triangle[2]);
        (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0)
    }

    #[test]
    fn camera_facing_triangles_wind_clockwise() {
        let mut pipeline = TransformPipeline::new(1280, 720);
        let mvp = *pipeline.advance();
        // At angle 0 the +Z face is nearest the camera, the -Z face farthest.
        // Back-face culling with a clockwise front face must keep the near
        // face (negative screen-space area) and drop the far one.
        let near = signed_area(&mvp, &CUBE_INDICES[12..15]);
        let far = signed_area(&mvp, &CUBE_INDICES[0..3]);
        assert!(near < 0.0, "near face winds counter-clockwise: {near}");
        assert!(far > 0.0, "far face winds clockwise: {far}");
    }

    #[test]
    fn layout_matches_the_interleaved_vertex_format() {
        let layout = VertexLayout::interleaved(4, 9);
        assert_eq!(layout.position_slot, 4);
        assert_eq!(layout.color_slot, 9);
        assert_eq!(layout.stride, 24);
        assert_eq!(layout.position_offset, 0);
        assert_eq!(layout.color_offset, 12);
    }
}
