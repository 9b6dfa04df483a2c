use glam::{Mat4, Quat, Vec3};

/// Number of floats in a serialized 4x4 matrix.
pub const MAT4_FLOATS: usize = 16;

/// Rotation of `degrees` about `axis`. A zero axis yields the identity.
pub fn quat_from_axis_degrees(axis: Vec3, degrees: f32) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, degrees.to_radians())
}

/// Left-multiply an incremental rotation into an orientation and re-normalize.
///
/// Orientations are stored world-to-camera, so left-multiplication applies the
/// increment about the camera's own axes.
pub fn compose_left(increment: Quat, orientation: Quat) -> Quat {
    (increment * orientation).normalize()
}

/// Re-express a camera-local vector in world space for a world-to-camera orientation.
pub fn rotate_by_inverse(orientation: Quat, v: Vec3) -> Vec3 {
    orientation.inverse() * v
}

/// World-to-camera matrix for a camera at `position` with world-to-camera `orientation`.
///
/// Equal to the inverse of `translate(position) * rotate(orientation⁻¹)`.
pub fn view_from_pose(position: Vec3, orientation: Quat) -> Mat4 {
    Mat4::from_quat(orientation) * Mat4::from_translation(-position)
}

/// OpenGL-convention perspective projection (clip z in [-1, 1]).
pub fn perspective_gl(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh_gl(fovy_degrees.to_radians(), aspect, near, far)
}

/// Model transform of a tracked pose: `translate(position) * rotate(orientation)`.
pub fn pose_transform(position: Vec3, orientation: Quat) -> Mat4 {
    Mat4::from_rotation_translation(orientation, position)
}

/// Flatten a matrix into the column-major layout expected across the native boundary.
pub fn to_column_major(m: &Mat4) -> [f32; MAT4_FLOATS] {
    m.to_cols_array()
}

/// Rebuild a matrix from a column-major slice. Returns `None` when fewer than 16 values.
pub fn from_column_major(values: &[f32]) -> Option<Mat4> {
    let cols: &[f32; MAT4_FLOATS] = values.get(..MAT4_FLOATS)?.try_into().ok()?;
    Some(Mat4::from_cols_array(cols))
}
