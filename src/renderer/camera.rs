use glam::{Mat4, Vec3};

use crate::config::DemoConfig;

/// Fixed camera: a straight pull-back along +Z with a perspective projection
/// locked to the startup aspect ratio.
pub struct Camera {
    pub distance: f32,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &DemoConfig) -> Self {
        Self {
            distance: config.camera_distance,
            fov_y: config.fov_y_deg.to_radians(),
            aspect: config.aspect(),
            near: config.near,
            far: config.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_is_a_pull_back() {
        let camera = Camera::from_config(&DemoConfig::default());
        let view = camera.view_matrix();
        assert_eq!(view.w_axis.z, -5.0);
        assert_eq!(view.w_axis.x, 0.0);
        assert_eq!(view.w_axis.y, 0.0);
    }

    #[test]
    fn test_projection_is_finite() {
        let camera = Camera::from_config(&DemoConfig::default());
        let proj = camera.projection_matrix();
        assert!(proj.to_cols_array().iter().all(|v| v.is_finite()));
        assert!((camera.aspect - 800.0 / 600.0).abs() < f32::EPSILON);
    }
}
