use crate::scene::mesh::TorusParams;

/// Every fixed parameter of the demo in one place, so geometry and color
/// variants can be swapped without touching the sequencing code.
pub struct DemoConfig {
    pub window_title: &'static str,
    pub window_width: u32,
    pub window_height: u32,

    pub clear_color: [f64; 4],

    pub rotation_rate_deg: f32,
    pub rotation_axis: [f32; 3],

    pub torus: TorusParams,

    /// One hole per tetrahedron corner.
    pub hole_centers: [[f32; 3]; 4],
    pub hole_radius: f32,
    pub hole_segments: u32,

    pub silhouette_color: [f32; 4],
    pub hole_color: [f32; 4],
    pub overlay_color: [f32; 4],

    pub camera_distance: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window_title: "Stencil Tetrahedron",
            window_width: 800,
            window_height: 600,

            clear_color: [0.1, 0.1, 0.1, 1.0],

            rotation_rate_deg: 50.0,
            rotation_axis: [0.5, 1.0, 0.0],

            torus: TorusParams {
                inner_radius: 0.3,
                outer_radius: 0.8,
                ring_segments: 30,
                tube_segments: 30,
            },

            hole_centers: [
                [1.0, 1.0, 1.0],
                [-1.0, -1.0, 1.0],
                [-1.0, 1.0, -1.0],
                [1.0, -1.0, -1.0],
            ],
            hole_radius: 0.2,
            hole_segments: 100,

            silhouette_color: [0.0, 1.0, 0.0, 1.0],
            hole_color: [1.0, 0.0, 0.0, 1.0],
            overlay_color: [0.0, 0.0, 1.0, 0.5],

            camera_distance: 5.0,
            fov_y_deg: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl DemoConfig {
    pub fn aspect(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DemoConfig::default();
        assert!(config.torus.ring_segments >= 1);
        assert!(config.torus.tube_segments >= 1);
        assert!(config.torus.inner_radius > 0.0);
        assert!(config.torus.outer_radius > 0.0);
        assert!(config.hole_segments >= 2);
        assert!(config.hole_radius > 0.0);
    }

    #[test]
    fn test_aspect_matches_window() {
        let config = DemoConfig::default();
        assert!((config.aspect() - 800.0 / 600.0).abs() < f32::EPSILON);
    }
}
