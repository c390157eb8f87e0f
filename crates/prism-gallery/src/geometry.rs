use std::f32::consts::PI;

use prism_engine::Value;

/// Vertex data and indices of a mesh, in the shape the resource kinds take.
pub struct Mesh {
    pub data: Value,
    pub index: Value,
}

/// UV sphere centered at the origin.
///
/// Attributes: `a_Position` (3), `a_Normal` (3), `a_UV` (2).
pub fn create_ball(radius: f32, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * PI;
        let (sin_t, cos_t) = theta.sin_cos();

        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let phi = u * 2.0 * PI;
            let (sin_p, cos_p) = phi.sin_cos();

            let normal = [sin_t * cos_p, cos_t, sin_t * sin_p];
            positions.extend(normal.map(|n| n * radius));
            normals.extend(normal);
            uvs.extend([u, v]);
        }
    }

    let stride = segments + 1;
    let mut index = Vec::with_capacity((rings * segments * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            index.extend([a, a + 1, b, b, a + 1, b + 1]);
        }
    }

    Mesh {
        data: Value::object([
            ("a_Position", Value::from(positions)),
            ("a_Normal", Value::from(normals)),
            ("a_UV", Value::from(uvs)),
        ]),
        index: Value::from(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ball_attributes_agree_on_vertex_count() {
        let ball = create_ball(2.0, 16, 8);
        let vertices = 17 * 9;

        let attr = |name: &str| ball.data.get(name).ok().and_then(Value::to_f32_vec).map(|v| v.len());
        assert_eq!(attr("a_Position"), Some(vertices * 3));
        assert_eq!(attr("a_Normal"), Some(vertices * 3));
        assert_eq!(attr("a_UV"), Some(vertices * 2));
    }

    #[test]
    fn indices_stay_in_range() {
        let ball = create_ball(1.0, 12, 6);
        let index = ball.index.to_f32_vec().unwrap();
        assert_eq!(index.len(), 12 * 6 * 6);
        assert!(index.iter().all(|&i| (i as usize) < 13 * 7));
    }

    #[test]
    fn positions_lie_on_the_sphere() {
        let ball = create_ball(2.0, 8, 4);
        let positions = ball.data.get("a_Position").ok().and_then(Value::to_f32_vec).unwrap();
        for p in positions.chunks(3) {
            let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((len - 2.0).abs() < 1e-4);
        }
    }
}
