use glam::{Mat4, Vec3};

const FOV_Y_DEGREES: f32 = 30.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

/// Model matrix from rotations in degrees, applied X then Y then Z.
pub fn compute_model_mat(rx: f32, ry: f32, rz: f32) -> [f32; 16] {
    let m = Mat4::from_rotation_z(rz.to_radians()) * Mat4::from_rotation_y(ry.to_radians()) * Mat4::from_rotation_x(rx.to_radians());
    m.to_cols_array()
}

/// `base` orbited around the Y axis by `degrees`.
pub fn compute_eye(base: [f32; 3], degrees: f32) -> [f32; 3] {
    Mat4::from_rotation_y(degrees.to_radians())
        .transform_point3(Vec3::from(base))
        .to_array()
}

pub fn compute_mvp_mat(model: &[f32; 16], eye: [f32; 3], center: [f32; 3], aspect: f32) -> [f32; 16] {
    let view = Mat4::look_at_rh(Vec3::from(eye), Vec3::from(center), Vec3::Y);
    let proj = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, NEAR, FAR);
    (proj * view * Mat4::from_cols_array(model)).to_cols_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn zero_rotation_is_identity() {
        assert!(close(&compute_model_mat(0.0, 0.0, 0.0), &Mat4::IDENTITY.to_cols_array()));
    }

    #[test]
    fn eye_orbits_around_y() {
        assert!(close(&compute_eye([0.0, 0.0, 10.0], 90.0), &[10.0, 0.0, 0.0]));
        assert!(close(&compute_eye([0.0, 3.0, 10.0], 0.0), &[0.0, 3.0, 10.0]));
    }

    #[test]
    fn center_projects_to_the_middle_of_the_screen() {
        let model = compute_model_mat(0.0, 0.0, 0.0);
        let mvp = Mat4::from_cols_array(&compute_mvp_mat(&model, [0.0, 0.0, 10.0], [0.0; 3], 16.0 / 9.0));
        let clip = mvp.project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        assert!((0.0..1.0).contains(&clip.z));
    }
}
