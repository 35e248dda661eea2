//! Geometric Jacobian of a kinematic chain.
//!
//! The Jacobian maps chain joint velocities to the Cartesian velocity of
//! the chain's tip. Throughout this crate velocity 6-vectors are packed as
//! `[linear; angular]`: rows 0..3 are translational, rows 3..6 rotational.
//!
//! Column `i` belongs to chain configuration `i`. For a revolute joint
//! whose axis, rotated into the world by *that joint frame's* absolute
//! orientation, is `a` and whose world position is `p`: the angular part is
//! `a` and the linear part is `a × (p_tip − p)`. For a prismatic joint the
//! angular part is zero and the linear part is the world-rotated axis.

use nalgebra::{DMatrix, Isometry3};

use crate::chain::SubSceneGraph;
use crate::errors::SolveError;
use crate::scene_graph::JointKind;

/// Compute the 6×n chain Jacobian into a caller-provided matrix.
///
/// `tf_abs` is the absolute-pose array for the *whole* scene graph,
/// indexed by frame id (as produced by forward kinematics). `j` must be
/// 6 × `ssg.config_count()`; this keeps the IK hot path allocation-free.
pub fn chain_jacobian_into(
    ssg: &SubSceneGraph,
    tf_abs: &[Isometry3<f64>],
    j: &mut DMatrix<f64>,
) -> Result<(), SolveError> {
    let n = ssg.config_count();
    if j.nrows() != 6 || j.ncols() != n {
        return Err(SolveError::INVALID_PARAMETER);
    }
    if tf_abs.len() != ssg.scene_graph().frame_count() {
        return Err(SolveError::INVALID_PARAMETER);
    }
    let tip = match ssg.tip() {
        Some(t) => t,
        None => return Err(SolveError::INVALID_FRAME),
    };
    let p_tip = tf_abs[tip].translation.vector;

    let mut col = 0;
    for &frame_id in ssg.frames() {
        let frame = match ssg.scene_graph().frame(frame_id) {
            Some(f) => f,
            None => return Err(SolveError::INVALID_FRAME),
        };
        let tf = &tf_abs[frame_id];
        match frame.joint {
            JointKind::Fixed => continue,
            JointKind::Revolute { axis, .. } => {
                let a = tf.rotation * axis.into_inner();
                let lin = a.cross(&(p_tip - tf.translation.vector));
                j.fixed_view_mut::<3, 1>(0, col).copy_from(&lin);
                j.fixed_view_mut::<3, 1>(3, col).copy_from(&a);
            }
            JointKind::Prismatic { axis, .. } => {
                let a = tf.rotation * axis.into_inner();
                j.fixed_view_mut::<3, 1>(0, col).copy_from(&a);
                j.fixed_view_mut::<3, 1>(3, col).fill(0.0);
            }
        }
        col += 1;
    }
    debug_assert_eq!(col, n);
    Ok(())
}

/// Compute the 6×n chain Jacobian, allocating the result.
pub fn chain_jacobian(
    ssg: &SubSceneGraph,
    tf_abs: &[Isometry3<f64>],
) -> Result<DMatrix<f64>, SolveError> {
    let mut j = DMatrix::zeros(6, ssg.config_count());
    chain_jacobian_into(ssg, tf_abs, &mut j)?;
    Ok(j)
}
