//! Per-frame model-view-projection composition.

use crate::matrix::Matrix4;

/// Vertical field of view of the projection, in degrees.
pub const PROJECTION_FOVY: f32 = 30.0;
/// Near clip plane distance.
pub const PROJECTION_NEAR: f32 = 0.1;
/// Far clip plane distance.
pub const PROJECTION_FAR: f32 = 30.0;
/// Fixed camera-back offset pushing the cube into the visible frustum.
pub const CAMERA_OFFSET_Z: f32 = -4.0;
/// Diagonal rotation axis of the cube.
pub const ROTATION_AXIS: (f32, f32, f32) = (1.0, 1.0, 0.0);
/// Per-frame rotation increment, in degrees.
pub const ANGLE_STEP: f32 = 0.3;
/// Frames per full turn: 360° divided by [`ANGLE_STEP`].
const STEPS_PER_TURN: u32 = 1200;

/// The matrices and rotation angle recomputed once per frame.
///
/// Owned exclusively by [`TransformPipeline`]; never ambient global state.
#[derive(Debug, Clone, Copy)]
pub struct RenderState {
    pub projection: Matrix4,
    pub model_view: Matrix4,
    pub mvp: Matrix4,
    /// Always within `[0, 360)`.
    pub angle_degrees: f32,
}

/// Owns the [`RenderState`] and advances it deterministically each frame.
#[derive(Debug)]
pub struct TransformPipeline {
    state: RenderState,
    aspect: f32,
    step: u32,
}

impl TransformPipeline {
    /// The projection is computed once from the initial viewport aspect ratio
    /// and only changes on [`TransformPipeline::set_viewport`].
    pub fn new(width: u32, height: u32) -> TransformPipeline {
        let aspect = width as f32 / height as f32;
        TransformPipeline {
            state: RenderState {
                projection: Matrix4::identity().with_perspective(
                    PROJECTION_FOVY,
                    aspect,
                    PROJECTION_NEAR,
                    PROJECTION_FAR,
                ),
                model_view: Matrix4::identity(),
                mvp: Matrix4::identity(),
                angle_degrees: 0.0,
            },
            aspect,
            step: 0,
        }
    }

    /// Recomputes the model-view and MVP matrices for the current frame and
    /// steps the rotation angle, wrapping it to `[0, 360)`.
    pub fn advance(&mut self) -> &Matrix4 {
        self.state.model_view = Matrix4::identity()
            .translated(0.0, 0.0, CAMERA_OFFSET_Z)
            .rotated(
                self.state.angle_degrees,
                ROTATION_AXIS.0,
                ROTATION_AXIS.1,
                ROTATION_AXIS.2,
            );
        // The angle is derived from the frame count rather than accumulated,
        // so it returns to exactly 0 after every full turn.
        self.step = (self.step + 1) % STEPS_PER_TURN;
        self.state.angle_degrees = self.step as f32 * ANGLE_STEP;
        self.state.mvp = self.state.model_view.multiply(&self.state.projection);
        &self.state.mvp
    }

    /// Recomputes the aspect ratio and projection for a resized drawable.
    /// The rotation angle is untouched.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
        self.state.projection = Matrix4::identity().with_perspective(
            PROJECTION_FOVY,
            self.aspect,
            PROJECTION_NEAR,
            PROJECTION_FAR,
        );
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn angle_degrees(&self) -> f32 {
        self.state.angle_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_wraps_into_range() {
        let mut pipeline = TransformPipeline::new(1280, 720);
        for step in 1..=2000u32 {
            pipeline.advance();
            let angle = pipeline.angle_degrees();
            assert!((0.0..360.0).contains(&angle), "step {step}: angle {angle}");
        }
    }

    #[test]
    fn twelve_hundred_steps_wrap_back_to_zero() {
        let mut pipeline = TransformPipeline::new(1280, 720);
        for _ in 0..1200 {
            pipeline.advance();
        }
        // 1200 × 0.3 = 360, one exact wrap.
        assert_eq!(pipeline.angle_degrees(), 0.0);
    }

    #[test]
    fn angle_does_not_drift_across_turns() {
        let mut pipeline = TransformPipeline::new(1280, 720);
        for _ in 0..(3 * 1200 + 5) {
            pipeline.advance();
        }
        assert!((pipeline.angle_degrees() - 5.0 * ANGLE_STEP).abs() < 1e-5);
    }

    #[test]
    fn advance_is_deterministic_for_a_given_angle() {
        let mut a = TransformPipeline::new(1280, 720);
        let mut b = TransformPipeline::new(1280, 720);
        for _ in 0..7 {
            a.advance();
            b.advance();
        }
        assert_eq!(a.state().mvp, b.state().mvp);
    }

    #[test]
    fn mvp_is_model_view_times_projection() {
        let mut pipeline = TransformPipeline::new(1280, 720);
        pipeline.advance();
        let state = pipeline.state();
        assert_eq!(state.mvp, state.model_view.multiply(&state.projection));
    }

    #[test]
    fn resize_updates_aspect_without_touching_the_angle() {
        let mut pipeline = TransformPipeline::new(1280, 720);
        for _ in 0..10 {
            pipeline.advance();
        }
        let angle_before = pipeline.angle_degrees();

        pipeline.set_viewport(640, 480);

        assert_eq!(pipeline.aspect(), 640.0 / 480.0);
        assert_eq!(pipeline.angle_degrees(), angle_before);
        // The new projection reflects the new aspect ratio.
        let expected = Matrix4::identity().with_perspective(
            PROJECTION_FOVY,
            640.0 / 480.0,
            PROJECTION_NEAR,
            PROJECTION_FAR,
        );
        assert_eq!(pipeline.state().projection, expected);
    }

    #[test]
    fn model_view_places_the_cube_behind_the_camera_offset() {
        let mut pipeline = TransformPipeline::new(1280, 720);
        pipeline.advance();
        // Angle 0 on the first frame: the model-view is the bare translation.
        let expected = Matrix4::identity().translated(0.0, 0.0, CAMERA_OFFSET_Z);
        assert_eq!(pipeline.state().model_view, expected);
    }
}
