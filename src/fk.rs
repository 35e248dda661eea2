//! Forward kinematics: configuration vector in, world poses out.
//!
//! Evaluation is a single pass over the frame array in topological order.
//! Each frame's pose relative to its parent is computed from the joint kind
//! and the configuration vector, then chained onto the parent's absolute
//! pose (roots copy their relative pose). This is the hot path of the IK
//! loop, so [`ForwardKinematics`] keeps its transform arrays between calls
//! and never allocates inside [`update`](ForwardKinematics::update).

use nalgebra::{Isometry3, Translation3, UnitQuaternion};

use crate::errors::SolveError;
use crate::scene_graph::{Frame, FrameId, JointKind, SceneGraph};

/// Pose of a frame relative to its parent at configuration `q`.
///
/// Fails with `INVALID_PARAMETER` if `q` is too short to hold the joint's
/// configuration variable.
pub fn relative_pose(frame: &Frame, q: &[f64]) -> Result<Isometry3<f64>, SolveError> {
    match frame.joint {
        JointKind::Fixed => Ok(frame.origin),
        JointKind::Revolute { axis, offset, config } => {
            let angle = q.get(config).ok_or(SolveError::INVALID_PARAMETER)?;
            Ok(frame.origin * UnitQuaternion::from_axis_angle(&axis, offset + angle))
        }
        JointKind::Prismatic { axis, offset, config } => {
            let shift = q.get(config).ok_or(SolveError::INVALID_PARAMETER)?;
            Ok(frame.origin * Translation3::from(axis.into_inner() * (offset + shift)))
        }
    }
}

/// Reusable forward-kinematics evaluator.
///
/// Holds the relative and absolute transform arrays, both indexed by frame
/// id and sized once from the scene graph. A `ForwardKinematics` belongs to
/// one evaluation at a time; concurrent solves each own their own instance.
#[derive(Clone, Debug)]
pub struct ForwardKinematics {
    tf_rel: Vec<Isometry3<f64>>,
    tf_abs: Vec<Isometry3<f64>>,
}

impl ForwardKinematics {
    /// Allocate transform buffers for `sg`.
    pub fn new(sg: &SceneGraph) -> Self {
        ForwardKinematics {
            tf_rel: vec![Isometry3::identity(); sg.frame_count()],
            tf_abs: vec![Isometry3::identity(); sg.frame_count()],
        }
    }

    /// Recompute all poses for the configuration `q`.
    ///
    /// Pure in its inputs: identical `(sg, q)` yield bit-identical
    /// transform arrays. Fails with `INVALID_PARAMETER` if `q` does not
    /// match the graph's configuration count or the buffers were sized for
    /// a different graph.
    pub fn update(&mut self, sg: &SceneGraph, q: &[f64]) -> Result<(), SolveError> {
        if q.len() != sg.config_count() || self.tf_abs.len() != sg.frame_count() {
            return Err(SolveError::INVALID_PARAMETER);
        }
        for (id, frame) in sg.frames().iter().enumerate() {
            let rel = relative_pose(frame, q)?;
            self.tf_rel[id] = rel;
            self.tf_abs[id] = match frame.parent {
                // Topological order guarantees the parent pose is final.
                Some(p) => self.tf_abs[p] * rel,
                None => rel,
            };
        }
        Ok(())
    }

    /// Absolute (world) pose of a frame.
    pub fn abs(&self, id: FrameId) -> &Isometry3<f64> {
        &self.tf_abs[id]
    }

    /// Pose of a frame relative to its parent.
    pub fn rel(&self, id: FrameId) -> &Isometry3<f64> {
        &self.tf_rel[id]
    }

    /// All absolute poses, indexed by frame id.
    pub fn abs_all(&self) -> &[Isometry3<f64>] {
        &self.tf_abs
    }
}

/// One-shot forward kinematics, allocating a fresh absolute-pose array.
pub fn compute_fk(sg: &SceneGraph, q: &[f64]) -> Result<Vec<Isometry3<f64>>, SolveError> {
    let mut fk = ForwardKinematics::new(sg);
    fk.update(sg, q)?;
    Ok(fk.tf_abs)
}
