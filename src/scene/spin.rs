use glam::{Mat4, Vec3};

/// Wall-clock-driven model rotation. The angle advances by `rate * dt`
/// degrees and always stays in `[0, 360)`.
pub struct Spin {
    angle_deg: f32,
    rate_deg_per_sec: f32,
    axis: Vec3,
}

impl Spin {
    pub fn new(rate_deg_per_sec: f32, axis: Vec3) -> Self {
        Self {
            angle_deg: 0.0,
            rate_deg_per_sec,
            axis: axis.normalize(),
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.angle_deg = (self.angle_deg + self.rate_deg_per_sec * dt).rem_euclid(360.0);
    }

    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_axis_angle(self.axis, self.angle_deg.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates() {
        let mut spin = Spin::new(50.0, Vec3::new(0.5, 1.0, 0.0));
        spin.advance(0.1);
        assert!((spin.angle_deg() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_angle_stays_in_range() {
        let mut spin = Spin::new(50.0, Vec3::Y);
        for _ in 0..5000 {
            spin.advance(0.037);
            assert!(spin.angle_deg() >= 0.0);
            assert!(spin.angle_deg() < 360.0);
        }
    }

    #[test]
    fn test_wraps_past_full_turn() {
        let mut spin = Spin::new(50.0, Vec3::Y);
        spin.advance(7.3);
        assert!((spin.angle_deg() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_model_matrix_identity_at_zero() {
        let spin = Spin::new(50.0, Vec3::new(0.5, 1.0, 0.0));
        let diff = (spin.model_matrix() - Mat4::IDENTITY).abs();
        assert!(diff.to_cols_array().iter().all(|&v| v < 1e-6));
    }
}
