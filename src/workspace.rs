//! Workspace (Cartesian) velocity control.
//!
//! Maps a desired tip velocity to chain joint velocities through a damped
//! least-squares pseudoinverse of the chain Jacobian, optionally projecting
//! a secondary joint-velocity objective into the Jacobian's null space.
//! Velocity 6-vectors are packed `[linear; angular]`, matching
//! [`crate::jacobian`].

use nalgebra::{DMatrix, DVector, Isometry3, Vector6};

use crate::chain::SubSceneGraph;
use crate::errors::SolveError;

/// Workspace-control options.
#[derive(Clone, Debug)]
pub struct WorkspaceOpts {
    /// Proportional gain on the rotational pose error.
    pub gain_angle: f64,
    /// Proportional gain on the translational pose error.
    pub gain_trans: f64,
    /// Singular values below this threshold switch from the plain
    /// reciprocal `1/s` to the damped reciprocal `s/(s² + k_dls)`.
    pub s2min: f64,
    /// Damping factor of the least-squares pseudoinverse. Larger values
    /// keep joint velocities bounded closer to singularities at the cost
    /// of tracking accuracy.
    pub k_dls: f64,
}

impl Default for WorkspaceOpts {
    fn default() -> Self {
        WorkspaceOpts {
            gain_angle: 1.0,
            gain_trans: 1.0,
            s2min: 5e-3,
            k_dls: 5e-5,
        }
    }
}

/// Proportional control on pose error.
///
/// Computes the 6-vector error of `e_act` relative to `e_ref` — the
/// rotation-vector logarithm of `ref ⊖ act` for the angular part (the
/// shortest-arc axis-angle, which stays well-defined as the angle
/// approaches π) and the direct difference for translation — scales it by
/// the configured gains and **adds** it into `dx`, so it composes with any
/// feed-forward reference velocity already there.
pub fn dx_pos(
    opts: &WorkspaceOpts,
    e_act: &Isometry3<f64>,
    e_ref: &Isometry3<f64>,
    dx: &mut Vector6<f64>,
) {
    let rel = e_ref.rotation * e_act.rotation.inverse();
    let w = rel.scaled_axis();
    let v = e_ref.translation.vector - e_act.translation.vector;
    for i in 0..3 {
        dx[i] += opts.gain_trans * v[i];
        dx[i + 3] += opts.gain_angle * w[i];
    }
}

/// Damped least-squares pseudoinverse of a Jacobian.
pub(crate) struct DampedPinv {
    /// `J⁺`, n×6.
    pub pinv: DMatrix<f64>,
    /// Smallest singular value of the Jacobian, before damping. The IK
    /// solver uses it to tell a genuinely rank-deficient failure apart
    /// from plain non-convergence.
    pub s_min: f64,
}

/// Build `J⁺` from the SVD `J = U Σ Vᵗ`, replacing `1/s` by
/// `s/(s² + k_dls)` for singular values under `s2min`. The damped
/// reciprocal is bounded for any `s ≥ 0` when `k_dls > 0`, which keeps the
/// solution norm finite near kinematic singularities.
pub(crate) fn damped_pinv(j: &DMatrix<f64>, opts: &WorkspaceOpts) -> Result<DampedPinv, SolveError> {
    let svd = j.clone().svd(true, true);
    let u = svd.u.as_ref().ok_or(SolveError::NO_INVERSE_KINEMATICS)?;
    let v_t = svd.v_t.as_ref().ok_or(SolveError::NO_INVERSE_KINEMATICS)?;

    let s_min = svd.singular_values.min();
    let mut s_inv = svd.singular_values.clone();
    for s in s_inv.iter_mut() {
        if *s >= opts.s2min {
            *s = 1.0 / *s;
        } else {
            *s = *s / (*s * *s + opts.k_dls);
        }
    }

    let pinv = v_t.transpose() * DMatrix::from_diagonal(&s_inv) * u.transpose();
    Ok(DampedPinv { pinv, s_min })
}

fn check_shapes(ssg: &SubSceneGraph, j: &DMatrix<f64>) -> Result<(), SolveError> {
    if j.nrows() != 6 || j.ncols() != ssg.config_count() {
        return Err(SolveError::INVALID_PARAMETER);
    }
    Ok(())
}

/// Convert a workspace velocity to chain joint velocities: `dq = J⁺ dx`.
pub fn dx_to_dq(
    ssg: &SubSceneGraph,
    opts: &WorkspaceOpts,
    j: &DMatrix<f64>,
    dx: &Vector6<f64>,
) -> Result<DVector<f64>, SolveError> {
    check_shapes(ssg, j)?;
    let dp = damped_pinv(j, opts)?;
    Ok(&dp.pinv * dx)
}

/// As [`dx_to_dq`], plus the nullspace projection of a secondary
/// joint-velocity objective: `dq = J⁺ dx + (I − J⁺J) dq_r`.
///
/// The projection keeps `dq_r` from disturbing the primary Cartesian
/// tracking; with `dq_r = 0` the result equals [`dx_to_dq`] exactly.
pub fn dx_to_dq_np(
    ssg: &SubSceneGraph,
    opts: &WorkspaceOpts,
    j: &DMatrix<f64>,
    dx: &Vector6<f64>,
    dq_r: &DVector<f64>,
) -> Result<DVector<f64>, SolveError> {
    check_shapes(ssg, j)?;
    if dq_r.len() != ssg.config_count() {
        return Err(SolveError::INVALID_PARAMETER);
    }
    let dp = damped_pinv(j, opts)?;
    let n = ssg.config_count();
    let nullspace = DMatrix::identity(n, n) - &dp.pinv * j;
    Ok(&dp.pinv * dx + nullspace * dq_r)
}

/// Joint-centering velocities: `dq_r[i] = gain[i] · (q_ref[i] − q[i])`.
///
/// Intended as the secondary objective for [`dx_to_dq_np`]. Gain and
/// reference vectors are supplied by the caller (see
/// [`crate::ik::IkParams::center_configs`], which derives them from joint
/// limits and zeroes the gain of unlimited joints).
pub fn dq_center(
    ssg: &SubSceneGraph,
    gain: &DVector<f64>,
    q_ref: &DVector<f64>,
    q: &DVector<f64>,
) -> Result<DVector<f64>, SolveError> {
    let n = ssg.config_count();
    if gain.len() != n || q_ref.len() != n || q.len() != n {
        return Err(SolveError::INVALID_PARAMETER);
    }
    Ok((q_ref - q).component_mul(gain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_dx_pos_adds_scaled_error() {
        let opts = WorkspaceOpts {
            gain_angle: 2.0,
            gain_trans: 0.5,
            ..Default::default()
        };
        let act = Isometry3::identity();
        let reference = Isometry3::from_parts(
            Translation3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        );
        // Seed with a feed-forward term to check it is preserved.
        let mut dx = Vector6::repeat(0.25);
        dx_pos(&opts, &act, &reference, &mut dx);

        assert!((dx[0] - (0.25 + 0.5)).abs() < 1e-12);
        assert!((dx[1] - 0.25).abs() < 1e-12);
        assert!((dx[5] - (0.25 + 2.0 * FRAC_PI_2)).abs() < 1e-12);
    }

    #[test]
    fn test_damped_reciprocal_is_bounded() {
        let opts = WorkspaceOpts::default();
        // Diagonal Jacobians with one vanishing singular value.
        for s in [1e-3, 1e-4, 1e-8, 0.0] {
            let mut j = DMatrix::zeros(6, 2);
            j[(0, 0)] = 1.0;
            j[(1, 1)] = s;
            let dp = damped_pinv(&j, &opts).unwrap();
            assert!((dp.s_min - s).abs() < 1e-12);
            // The damped reciprocal peaks at 1/(2·sqrt(k_dls)).
            let bound = 0.5 / opts.k_dls.sqrt() + 1e-9;
            assert!(dp.pinv[(1, 1)].abs() <= bound, "s = {}", s);
        }
    }

    #[test]
    fn test_nullspace_zero_secondary_matches_plain() {
        use crate::chain::SubSceneGraph;
        use crate::fk::compute_fk;
        use crate::scene_graph::SceneGraphBuilder;

        let mut b = SceneGraphBuilder::new();
        let i = Isometry3::identity();
        b.add_revolute(SceneGraphBuilder::ROOT, "j0", i, "q0", Vector3::z_axis(), 0.0)
            .unwrap();
        b.add_revolute(
            "j0",
            "j1",
            Isometry3::from(Translation3::new(1.0, 0.0, 0.0)),
            "q1",
            Vector3::y_axis(),
            0.0,
        )
        .unwrap();
        b.add_fixed("j1", "tip", Isometry3::from(Translation3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let sg = b.build().unwrap();
        let root = sg.frame_id("j0").unwrap();
        let tip = sg.frame_id("tip").unwrap();
        let ssg = SubSceneGraph::chain(&sg, root, tip).unwrap();
        let tf = compute_fk(&sg, &[0.2, -0.4]).unwrap();
        let j = crate::jacobian::chain_jacobian(&ssg, &tf).unwrap();

        let opts = WorkspaceOpts::default();
        let dx = Vector6::new(0.1, -0.2, 0.05, 0.0, 0.03, -0.01);
        let plain = dx_to_dq(&ssg, &opts, &j, &dx).unwrap();
        let zero = DVector::zeros(ssg.config_count());
        let with_null = dx_to_dq_np(&ssg, &opts, &j, &dx, &zero).unwrap();
        assert!((plain - with_null).norm() < 1e-12);
    }

    #[test]
    fn test_dq_center_pulls_toward_reference() {
        use crate::chain::SubSceneGraph;
        use crate::scene_graph::SceneGraphBuilder;

        let mut b2 = SceneGraphBuilder::new();
        b2.add_fixed(SceneGraphBuilder::ROOT, "base", Isometry3::identity()).unwrap();
        b2.add_revolute("base", "j0", Isometry3::identity(), "q0", Vector3::z_axis(), 0.0)
            .unwrap();
        let sg2 = b2.build().unwrap();
        let ssg2 = SubSceneGraph::chain(&sg2, 0, 1).unwrap();

        let gain = DVector::from_element(1, 2.0);
        let q_ref = DVector::from_element(1, 0.5);
        let q = DVector::from_element(1, 1.5);
        let dq = dq_center(&ssg2, &gain, &q_ref, &q).unwrap();
        assert!((dq[0] + 2.0).abs() < 1e-12);
    }
}
