//! Helper functions

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// Build a pose from a translation and roll/pitch/yaw Euler angles
/// (radians). Convenient for assembling frame origins and IK targets.
pub fn pose_xyz_rpy(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

/// Build a pure translation pose.
pub fn pose_xyz(x: f64, y: f64, z: f64) -> Isometry3<f64> {
    Isometry3::from(Translation3::new(x, y, z))
}

/// Compare two poses within the given translational and angular tolerances.
pub fn compare_poses(
    ta: &Isometry3<f64>,
    tb: &Isometry3<f64>,
    tol_trans: f64,
    tol_angle: f64,
) -> bool {
    let translation_distance = (ta.translation.vector - tb.translation.vector).norm();
    let angular_distance = ta.rotation.angle_to(&tb.rotation);
    translation_distance.abs() <= tol_trans && angular_distance.abs() <= tol_angle
}

/// Angular distance between a pose's orientation and a plain axis-angle
/// rotation, useful in tests.
pub fn angle_about(pose: &Isometry3<f64>, axis: &Vector3<f64>, angle: f64) -> f64 {
    let rot = UnitQuaternion::from_scaled_axis(axis.normalize() * angle);
    pose.rotation.angle_to(&rot)
}
