use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::orbit::OrientationState;
use crate::runtime::TimeSample;

/// Vertical field of view of the cube camera.
const FIELD_OF_VIEW: f32 = 45.0 * std::f32::consts::PI / 180.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;
/// The cube sits this far down the -Z axis.
const CUBE_DISTANCE: f32 = -6.0;

/// Uniform block shared by both shader stages, std140 layout.
///
/// Three column-major mat4s back to back; `normal_matrix` carries the
/// inverse-transpose of `model_view` so normals survive the rotation.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct SceneUniforms {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

unsafe impl Zeroable for SceneUniforms {}
unsafe impl Pod for SceneUniforms {}

impl SceneUniforms {
    /// Builds the per-frame matrices from the cube orientation and the
    /// current surface aspect ratio.
    pub(crate) fn for_orientation(orientation: &OrientationState, aspect: f32) -> Self {
        let projection = Mat4::perspective_rh(FIELD_OF_VIEW, aspect.max(f32::EPSILON), NEAR_PLANE, FAR_PLANE);
        let model_view = Mat4::from_translation(Vec3::new(0.0, 0.0, CUBE_DISTANCE))
            * Mat4::from_rotation_x(orientation.pitch)
            * Mat4::from_rotation_y(orientation.yaw);
        let normal_matrix = model_view.inverse().transpose();

        Self {
            projection: projection.to_cols_array_2d(),
            model_view: model_view.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
        }
    }
}

/// Tracks the time delta between render ticks.
///
/// The delta only feeds the frame-rate debug log; rotation integration is
/// per-tick on purpose, so spin speed follows the display refresh rate.
#[derive(Debug, Default)]
pub(crate) struct FrameTiming {
    last_seconds: Option<f32>,
}

impl FrameTiming {
    /// Advances to the given sample and returns the delta in seconds.
    ///
    /// The first tick has no predecessor and reports zero; a time source
    /// that jumps backwards is clamped to zero rather than going negative.
    pub(crate) fn advance(&mut self, sample: TimeSample) -> f32 {
        let delta = match self.last_seconds {
            Some(last) => (sample.seconds - last).max(0.0),
            None => 0.0,
        };
        self.last_seconds = Some(sample.seconds);
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(matrix: &[[f32; 4]; 4]) -> impl Iterator<Item = f32> + '_ {
        matrix.iter().flatten().copied()
    }

    #[test]
    fn matrices_are_finite_for_arbitrary_angles() {
        let angles = [0.0, 0.5, -3.2, 12.7, 1234.5, -0.001];
        for &pitch in &angles {
            for &yaw in &angles {
                let orientation = OrientationState {
                    pitch,
                    yaw,
                    ..Default::default()
                };
                let uniforms = SceneUniforms::for_orientation(&orientation, 4.0 / 3.0);
                assert!(columns(&uniforms.projection).all(f32::is_finite));
                assert!(columns(&uniforms.model_view).all(f32::is_finite));
                assert!(columns(&uniforms.normal_matrix).all(f32::is_finite));
            }
        }
    }

    #[test]
    fn model_view_places_the_cube_six_units_back() {
        let orientation = OrientationState {
            pitch: 0.7,
            yaw: -2.3,
            ..Default::default()
        };
        let uniforms = SceneUniforms::for_orientation(&orientation, 1.0);
        // Rotation happens before the translation, so the fourth column is
        // the fixed camera offset regardless of the angles.
        assert_eq!(uniforms.model_view[3], [0.0, 0.0, -6.0, 1.0]);
    }

    #[test]
    fn normal_matrix_matches_rotation_for_pure_rotations() {
        let orientation = OrientationState {
            pitch: 0.4,
            yaw: 1.1,
            ..Default::default()
        };
        let uniforms = SceneUniforms::for_orientation(&orientation, 1.0);
        let rotation = Mat4::from_rotation_x(0.4) * Mat4::from_rotation_y(1.1);
        let expected = rotation.to_cols_array_2d();

        // Translation does not affect the inverse-transpose of a rigid
        // transform's rotational part.
        for column in 0..3 {
            for row in 0..3 {
                let actual = uniforms.normal_matrix[column][row];
                assert!(
                    (actual - expected[column][row]).abs() < 1e-5,
                    "normal[{column}][{row}] = {actual}, expected {}",
                    expected[column][row]
                );
            }
        }
    }

    #[test]
    fn aspect_ratio_scales_the_projection() {
        let orientation = OrientationState::default();
        let wide = SceneUniforms::for_orientation(&orientation, 2.0);
        let square = SceneUniforms::for_orientation(&orientation, 1.0);
        assert!((wide.projection[0][0] - square.projection[0][0] / 2.0).abs() < 1e-6);
        assert_eq!(wide.projection[1][1], square.projection[1][1]);
    }

    #[test]
    fn first_tick_reports_zero_delta() {
        let mut timing = FrameTiming::default();
        assert_eq!(timing.advance(TimeSample::new(3.5, 0)), 0.0);
        let delta = timing.advance(TimeSample::new(3.75, 1));
        assert!((delta - 0.25).abs() < 1e-6);
    }

    #[test]
    fn deltas_never_go_negative() {
        let mut timing = FrameTiming::default();
        timing.advance(TimeSample::new(10.0, 0));
        assert_eq!(timing.advance(TimeSample::new(9.0, 1)), 0.0);
        let delta = timing.advance(TimeSample::new(9.5, 2));
        assert!((delta - 0.5).abs() < 1e-6);
    }
}
