use glam::{Mat4, Quat, Vec2, Vec3};
use shaderlab_shared::math::{compose_left, perspective_gl, quat_from_axis_degrees, rotate_by_inverse, view_from_pose};

use crate::input::MotionState;
use crate::options::ViewerOptions;

/// Free-flying camera. Orientation maps world space into camera space, so
/// incremental rotations left-multiplied into it turn about the camera's own axes.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    pub viewport_aspect_ratio: f32,
    /// Degrees.
    pub field_of_view_y: f32,
    pub clip_near: f32,
    pub clip_far: f32,

    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Camera {
    pub fn new(options: &ViewerOptions) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            viewport_aspect_ratio: 1.0,
            field_of_view_y: options.field_of_view_y,
            clip_near: options.clip_near,
            clip_far: options.clip_far,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
        };
        camera.recompute_matrices();
        camera
    }

    /// Move `distance` along a camera-local `direction`. A zero direction is a no-op.
    pub fn translate(&mut self, direction: Vec3, distance: f32) {
        let world = rotate_by_inverse(self.orientation, direction).normalize_or_zero();
        if world == Vec3::ZERO {
            return;
        }
        self.position += world * distance;
    }

    /// Roll about the view axis by `roll_direction * degrees`.
    pub fn apply_roll(&mut self, roll_direction: f32, degrees: f32) {
        let angle = roll_direction * degrees;
        if angle == 0.0 {
            return;
        }
        self.orientation = compose_left(quat_from_axis_degrees(Vec3::Z, angle), self.orientation);
    }

    /// Yaw from horizontal and pitch from vertical pixel deltas.
    pub fn apply_look(&mut self, delta: Vec2, degrees_per_pixel: f32) {
        if delta == Vec2::ZERO {
            return;
        }
        let pitch = quat_from_axis_degrees(Vec3::X, delta.y * degrees_per_pixel);
        let yaw = quat_from_axis_degrees(Vec3::Y, delta.x * degrees_per_pixel);
        self.orientation = compose_left(pitch * yaw, self.orientation);
    }

    /// Apply one frame of held-key motion.
    pub fn integrate(&mut self, motion: &MotionState, dt: f32, options: &ViewerOptions) {
        self.translate(motion.movement_direction, options.move_speed * dt);
        self.apply_roll(motion.roll_direction, options.roll_speed * dt);
    }

    /// Rebuild view and projection from the current pose and frustum.
    pub fn recompute_matrices(&mut self) {
        self.view_matrix = view_from_pose(self.position, self.orientation);
        self.projection_matrix = perspective_gl(
            self.field_of_view_y,
            self.viewport_aspect_ratio,
            self.clip_near,
            self.clip_far,
        );
    }

    /// Back to the origin, looking down -Z. Frustum settings are kept.
    pub fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.orientation = Quat::IDENTITY;
    }

    /// Ignores non-finite or non-positive ratios (zero-sized canvas).
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.viewport_aspect_ratio = aspect;
        }
    }

    /// As of the last [`Camera::recompute_matrices`].
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&ViewerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;
    use crate::options::KeyBindings;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    // ── translate ──

    #[test]
    fn test_translate_zero_vector_is_noop() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(1.0, 2.0, 3.0);
        camera.orientation = Quat::from_rotation_y(0.7);
        for d in [0.0, 1.0, -5.0, 1e9, f32::MAX] {
            camera.translate(Vec3::ZERO, d);
            assert_eq!(camera.position, Vec3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn test_translate_follows_view_direction() {
        let mut camera = Camera::default();
        // Turn right 90 degrees; forward (-Z local) now points along +X in world.
        camera.apply_look(Vec2::new(360.0, 0.0), 0.25);
        camera.translate(Vec3::NEG_Z, 2.0);
        assert!(vec_approx_eq(camera.position, Vec3::new(2.0, 0.0, 0.0)), "{:?}", camera.position);
    }

    #[test]
    fn test_translate_normalizes_direction() {
        let mut camera = Camera::default();
        camera.translate(Vec3::new(3.0, 0.0, 4.0), 1.0);
        assert!(approx_eq(camera.position.length(), 1.0));
    }

    // ── rotation ──

    #[test]
    fn test_roll_keeps_unit_length_over_many_iterations() {
        let mut camera = Camera::default();
        for _ in 0..10_000 {
            camera.apply_roll(1.0, 1.37);
        }
        assert!(approx_eq(camera.orientation.length(), 1.0));
    }

    #[test]
    fn test_roll_turns_about_view_axis() {
        let mut camera = Camera::default();
        camera.apply_roll(1.0, 90.0);
        camera.recompute_matrices();
        // The view axis is unchanged by a roll.
        let forward = rotate_by_inverse(camera.orientation, Vec3::NEG_Z);
        assert!(vec_approx_eq(forward, Vec3::NEG_Z));
        let up = rotate_by_inverse(camera.orientation, Vec3::Y);
        assert!(approx_eq(up.y.abs(), 0.0));
    }

    #[test]
    fn test_zero_roll_is_noop() {
        let mut camera = Camera::default();
        camera.orientation = Quat::from_rotation_x(0.3);
        let before = camera.orientation;
        camera.apply_roll(0.0, 90.0);
        assert_eq!(camera.orientation, before);
    }

    #[test]
    fn test_look_down_with_positive_dy() {
        let mut camera = Camera::default();
        camera.apply_look(Vec2::new(0.0, 40.0), 0.25);
        let forward = rotate_by_inverse(camera.orientation, Vec3::NEG_Z);
        assert!(forward.y < 0.0);
    }

    // ── matrices ──

    #[test]
    fn test_view_matrix_is_inverse_pose() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(1.0, -2.0, 5.0);
        camera.apply_look(Vec2::new(30.0, -12.0), 0.25);
        camera.recompute_matrices();
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(vec_approx_eq(eye, Vec3::ZERO));
    }

    #[test]
    fn test_matrices_only_change_on_recompute() {
        let mut camera = Camera::default();
        let before = camera.view_matrix();
        camera.translate(Vec3::X, 1.0);
        assert_eq!(camera.view_matrix(), before);
        camera.recompute_matrices();
        assert_ne!(camera.view_matrix(), before);
    }

    #[test]
    fn test_projection_uses_frustum() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(2.0);
        camera.recompute_matrices();
        let expected = Mat4::perspective_rh_gl(60f32.to_radians(), 2.0, 0.01, 1000.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, EPSILON));
    }

    #[test]
    fn test_bad_aspect_ratio_ignored() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(f32::NAN);
        camera.set_aspect_ratio(0.0);
        assert_eq!(camera.viewport_aspect_ratio, 1.0);
    }

    #[test]
    fn test_reset_keeps_frustum() {
        let mut camera = Camera::default();
        camera.field_of_view_y = 90.0;
        camera.position = Vec3::ONE;
        camera.apply_roll(1.0, 45.0);
        camera.reset();
        assert_eq!(camera.position, Vec3::ZERO);
        assert_eq!(camera.orientation, Quat::IDENTITY);
        assert_eq!(camera.field_of_view_y, 90.0);
    }

    // ── integrate ──

    #[test]
    fn test_integrate_uses_speed_and_dt() {
        let options = ViewerOptions::default();
        let keys = KeyBindings::default();
        let motion = MotionState::default()
            .reduce(&InputEvent::PointerDown, &keys)
            .reduce(&InputEvent::KeyDown { code: "KeyW".into() }, &keys);
        let mut camera = Camera::new(&options);
        camera.integrate(&motion, 0.5, &options);
        assert!(vec_approx_eq(camera.position, Vec3::new(0.0, 0.0, -options.move_speed * 0.5)));
    }
}
