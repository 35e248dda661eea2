//! Iterative inverse kinematics over a kinematic chain.
//!
//! The solver repeats a damped least-squares velocity step: forward
//! kinematics on the working configuration, pose error at the target
//! frame, conversion of the error to a reference workspace velocity,
//! conversion of that to joint velocities through the damped pseudoinverse
//! (with optional joint-centering projected into the Jacobian's null
//! space), and an explicit Euler integration `q += dq·dt`. It terminates
//! when both error components drop under their tolerances, or when the
//! iteration budget runs out or an enabled stall check fires. Failures
//! are classified by the Jacobian's conditioning: if a singular value
//! sat below the SVD tolerances when the solve gave up, the error is
//! `NO_INVERSE_KINEMATICS` (rank-deficient chain, target off the
//! reachable manifold), otherwise `NO_SOLUTION` (plain non-convergence).

use nalgebra::{DMatrix, DVector, Isometry3, Vector6};
use tracing::{debug, trace};

use crate::chain::SubSceneGraph;
use crate::errors::SolveError;
use crate::fk::ForwardKinematics;
use crate::jacobian::chain_jacobian_into;
use crate::scene_graph::FrameId;
use crate::workspace::{WorkspaceOpts, damped_pinv, dq_center, dx_pos};

use std::f64::consts::PI;

/// Inverse-kinematics solver parameters.
///
/// Create with [`Default`], adjust through the `with_*` setters. The two
/// SVD tolerances are independent of the damping knobs in
/// [`WorkspaceOpts`]: `s2min`/`k_dls` decide *how* small singular values
/// are damped inside the pseudoinverse (damped steps are always taken,
/// so a solve can move off a singular seed), while `tol_angle_svd`/
/// `tol_trans_svd` classify a *failed* solve — if the Jacobian kept a
/// singular value under either threshold when the solve gave up, the
/// failure is `NO_INVERSE_KINEMATICS` rather than `NO_SOLUTION`.
#[derive(Clone, Debug)]
pub struct IkParams {
    /// Integration timestep for the Euler update.
    pub dt: f64,
    /// Rotational convergence tolerance, radians.
    pub tol_angle: f64,
    /// Translational convergence tolerance.
    pub tol_trans: f64,
    /// Singular-value floor for the rotational task; see `tol_trans_svd`.
    pub tol_angle_svd: f64,
    /// Singular-value floor for the translational task. A failed solve
    /// whose Jacobian kept a singular value under this or
    /// `tol_angle_svd` reports `NO_INVERSE_KINEMATICS`. Zero (both)
    /// disables the classification.
    pub tol_trans_svd: f64,
    /// Minimum joint-space step size `‖dq‖·dt`; below it the solve is
    /// considered stalled. Zero disables the check.
    pub tol_dq: f64,
    /// Absolute tolerance on the workspace-error objective decrease;
    /// a smaller per-iteration decrease counts as a stall. Zero
    /// disables the check.
    pub tol_obj_abs: f64,
    /// Relative tolerance on the workspace-error objective decrease.
    /// Zero disables the check.
    pub tol_obj_rel: f64,
    /// Iteration budget.
    pub max_iterations: usize,
    /// Workspace-control gains and damping.
    pub wk: WorkspaceOpts,
    /// Joint-centering reference configuration (chain order).
    pub q_ref: Option<DVector<f64>>,
    /// Joint-centering gains (chain order); centering is active when both
    /// this and `q_ref` are set.
    pub dq_gain: Option<DVector<f64>>,
    /// Full-configuration seed; takes precedence over the configuration
    /// passed to [`IkSolver::solve`].
    pub seed: Option<DVector<f64>>,
    /// Target chain frame; defaults to the chain's tip.
    pub frame: Option<FrameId>,
}

impl Default for IkParams {
    fn default() -> Self {
        let tol_angle = 0.1 * PI / 180.0;
        let tol_trans = 1e-4;
        IkParams {
            dt: 1.0,
            tol_angle,
            tol_trans,
            tol_angle_svd: 10.0 * tol_angle,
            tol_trans_svd: 10.0 * tol_trans,
            tol_dq: 0.0,
            tol_obj_abs: 0.0,
            tol_obj_rel: 0.0,
            max_iterations: 1000,
            wk: WorkspaceOpts::default(),
            q_ref: None,
            dq_gain: None,
            seed: None,
            frame: None,
        }
    }
}

impl IkParams {
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_tolerances(mut self, tol_angle: f64, tol_trans: f64) -> Self {
        self.tol_angle = tol_angle;
        self.tol_trans = tol_trans;
        self
    }

    pub fn with_svd_tolerances(mut self, tol_angle_svd: f64, tol_trans_svd: f64) -> Self {
        self.tol_angle_svd = tol_angle_svd;
        self.tol_trans_svd = tol_trans_svd;
        self
    }

    pub fn with_tol_dq(mut self, tol_dq: f64) -> Self {
        self.tol_dq = tol_dq;
        self
    }

    pub fn with_objective_tolerances(mut self, tol_obj_abs: f64, tol_obj_rel: f64) -> Self {
        self.tol_obj_abs = tol_obj_abs;
        self.tol_obj_rel = tol_obj_rel;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_workspace(mut self, wk: WorkspaceOpts) -> Self {
        self.wk = wk;
        self
    }

    pub fn with_frame(mut self, frame: FrameId) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_seed(mut self, seed: DVector<f64>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_centering(mut self, q_ref: DVector<f64>, dq_gain: DVector<f64>) -> Self {
        self.q_ref = Some(q_ref);
        self.dq_gain = Some(dq_gain);
        self
    }

    /// Configure joint centering from the chain's position limits: the
    /// reference is each limit midpoint and the gain is `gain·2π/(max−min)`
    /// so that wide joints feel proportionally less centering pressure.
    /// Joints without limits get zero gain.
    pub fn center_configs(mut self, ssg: &SubSceneGraph, gain: f64) -> Self {
        let sg = ssg.scene_graph();
        let n = ssg.config_count();
        let mut q_ref = DVector::zeros(n);
        let mut dq_gain = DVector::zeros(n);
        for (i, &cid) in ssg.configs().iter().enumerate() {
            if let Some((min, max)) = sg.limit_pos(cid) {
                q_ref[i] = 0.5 * (min + max);
                // Zero-width limits stay at zero gain, like no limits.
                if max > min {
                    dq_gain[i] = gain * (2.0 * PI) / (max - min);
                }
            }
        }
        self.q_ref = Some(q_ref);
        self.dq_gain = Some(dq_gain);
        self
    }

    /// Seed the solve from the chain's limit midpoints (zero elsewhere).
    pub fn center_seed(mut self, ssg: &SubSceneGraph) -> Result<Self, SolveError> {
        let centers = ssg.center_configs();
        let mut q_all = DVector::zeros(ssg.scene_graph().config_count());
        ssg.config_set(centers.as_slice(), q_all.as_mut_slice())?;
        self.seed = Some(q_all);
        Ok(self)
    }
}

/// Iterative damped least-squares IK solver.
#[derive(Clone, Debug, Default)]
pub struct IkSolver {
    pub params: IkParams,
}

impl IkSolver {
    pub fn new(params: IkParams) -> Self {
        IkSolver { params }
    }

    /// Drive the chain's tip (or the configured target frame) to `target`.
    ///
    /// The working configuration starts from the parameter seed if set,
    /// else from `q_init`, which must be a full configuration vector for
    /// the chain's scene graph. On success the returned vector is the full
    /// configuration with the converged chain values written in; `q_init`
    /// itself is never modified, and on failure no partial result is
    /// exposed.
    pub fn solve(
        &self,
        ssg: &SubSceneGraph,
        q_init: &[f64],
        target: &Isometry3<f64>,
    ) -> Result<DVector<f64>, SolveError> {
        let p = &self.params;
        let sg = ssg.scene_graph();

        // Resolve the controlled frame. A mid-chain target narrows the
        // solve to the sub-chain ending there; frames outside the chain
        // are unreachable by definition.
        let narrowed;
        let work: &SubSceneGraph = match p.frame {
            None => ssg,
            Some(f) if ssg.tip() == Some(f) => ssg,
            Some(f) => {
                if !ssg.contains_frame(f) {
                    return Err(SolveError::INVALID_FRAME);
                }
                let root = sg
                    .parent(ssg.frames()[0])
                    .ok_or(SolveError::INVALID_FRAME)?;
                narrowed = SubSceneGraph::chain(sg, root, f)?;
                &narrowed
            }
        };
        let tip = work.tip().ok_or(SolveError::INVALID_FRAME)?;

        let n_all = sg.config_count();
        let n_sub = work.config_count();
        if n_sub == 0 {
            return Err(SolveError::INVALID_PARAMETER);
        }
        if let Some(q_ref) = &p.q_ref {
            if q_ref.len() != n_sub {
                return Err(SolveError::INVALID_PARAMETER);
            }
        }
        if let Some(dq_gain) = &p.dq_gain {
            if dq_gain.len() != n_sub {
                return Err(SolveError::INVALID_PARAMETER);
            }
        }

        // The solve owns a copy of the configuration; the caller's state
        // is untouched whatever the outcome.
        let mut q_all: DVector<f64> = match &p.seed {
            Some(seed) => {
                if seed.len() != n_all {
                    return Err(SolveError::INVALID_PARAMETER);
                }
                seed.clone()
            }
            None => {
                if q_init.len() != n_all {
                    return Err(SolveError::INVALID_PARAMETER);
                }
                DVector::from_column_slice(q_init)
            }
        };

        // Per-solve scratch; nothing below allocates per iteration except
        // inside the SVD.
        let mut fk = ForwardKinematics::new(sg);
        let mut jac = DMatrix::zeros(6, n_sub);
        let mut q_sub = DVector::zeros(n_sub);
        let mut obj_prev = f64::INFINITY;
        let mut s_min = f64::INFINITY;

        for iteration in 0..p.max_iterations {
            fk.update(sg, q_all.as_slice())?;
            let e_act = fk.abs(tip);
            let angle = e_act.rotation.angle_to(&target.rotation);
            let trans = (target.translation.vector - e_act.translation.vector).norm();
            debug!(iteration, angle, trans, "ik iteration");

            if angle <= p.tol_angle && trans <= p.tol_trans {
                debug!(iteration, "ik converged");
                return Ok(q_all);
            }

            let mut dx = Vector6::zeros();
            dx_pos(&p.wk, e_act, target, &mut dx);

            chain_jacobian_into(work, fk.abs_all(), &mut jac)?;
            let dp = damped_pinv(&jac, &p.wk)?;
            s_min = dp.s_min;

            work.config_get(q_all.as_slice(), q_sub.as_mut_slice())?;
            let dq = match (&p.dq_gain, &p.q_ref) {
                (Some(dq_gain), Some(q_ref)) => {
                    let dq_r = dq_center(work, dq_gain, q_ref, &q_sub)?;
                    let nullspace = DMatrix::identity(n_sub, n_sub) - &dp.pinv * &jac;
                    &dp.pinv * &dx + nullspace * dq_r
                }
                _ => &dp.pinv * &dx,
            };

            let step = dq.norm() * p.dt;
            if p.tol_dq > 0.0 && step < p.tol_dq {
                debug!(iteration, step, "step under tol_dq, stalled");
                return Err(self.failure(s_min));
            }

            // Workspace-error objective; a vanishing decrease means the
            // iteration has flatlined short of the tolerances. Both
            // checks are opt-in.
            let obj = 0.5 * dx.norm_squared();
            let decrease = obj_prev - obj;
            if iteration > 0
                && ((p.tol_obj_abs > 0.0 && decrease.abs() < p.tol_obj_abs)
                    || (p.tol_obj_rel > 0.0 && decrease.abs() < p.tol_obj_rel * obj_prev))
            {
                debug!(iteration, obj, "objective stalled");
                return Err(self.failure(s_min));
            }
            obj_prev = obj;

            trace!(iteration, step, "euler step");
            q_sub.axpy(p.dt, &dq, 1.0);
            work.config_set(q_sub.as_slice(), q_all.as_mut_slice())?;
        }

        debug!(max_iterations = p.max_iterations, "iteration budget exhausted");
        Err(self.failure(s_min))
    }

    /// Classify a solve that gave up short of the tolerances: a Jacobian
    /// singular value under either SVD tolerance means the chain was
    /// effectively rank-deficient at the last iterate.
    fn failure(&self, s_min: f64) -> SolveError {
        if s_min < self.params.tol_angle_svd || s_min < self.params.tol_trans_svd {
            SolveError::NO_INVERSE_KINEMATICS
        } else {
            SolveError::NO_SOLUTION
        }
    }
}
