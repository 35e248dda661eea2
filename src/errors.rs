//! Error handling for scene-graph construction and kinematic solving.
//!
//! Construction problems (bad parent name, duplicate frame) are fatal and
//! reported as [`SceneError`] while the model is being built; a graph that
//! failed to build is never handed to the solvers. Solver-side failures are
//! recoverable and reported as [`SolveError`], a composable bitmask so that
//! multiple conditions can travel in one status value.

use std::fmt;

use bitflags::bitflags;

/// Failure while building or querying a scene graph.
#[derive(Debug)]
pub enum SceneError {
    /// The named parent frame was not added before its child.
    UnknownParent { frame: String, parent: String },
    /// A frame with this name has already been added.
    DuplicateFrame(String),
    /// A configuration variable with this name is already owned by another joint.
    DuplicateConfig(String),
    /// A frame name lookup failed.
    UnknownFrame(String),
    /// A configuration variable name lookup failed.
    UnknownConfig(String),
    /// The parent chain of a frame never reaches a root frame.
    CycleDetected(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SceneError::UnknownParent { ref frame, ref parent } =>
                write!(f, "Unknown parent '{}' for frame '{}'", parent, frame),
            SceneError::DuplicateFrame(ref name) =>
                write!(f, "Duplicate frame '{}'", name),
            SceneError::DuplicateConfig(ref name) =>
                write!(f, "Duplicate configuration variable '{}'", name),
            SceneError::UnknownFrame(ref name) =>
                write!(f, "Unknown frame '{}'", name),
            SceneError::UnknownConfig(ref name) =>
                write!(f, "Unknown configuration variable '{}'", name),
            SceneError::CycleDetected(ref name) =>
                write!(f, "Parent chain of frame '{}' never reaches a root", name),
        }
    }
}

impl std::error::Error for SceneError {}

bitflags! {
    /// Composable status flags for kinematic solvers.
    ///
    /// Flags can be combined with `|`, so one status value can carry
    /// several conditions at once. The shared vocabulary also includes
    /// `NO_MOTION_PLAN`, which downstream motion planners report; the
    /// kinematic core itself never raises it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SolveError: u32 {
        /// Iteration or tolerance budget exhausted without convergence.
        const NO_SOLUTION             = 1 << 0;
        /// The Jacobian is too ill-conditioned to step safely.
        const NO_INVERSE_KINEMATICS   = 1 << 1;
        /// Reserved for downstream motion-planning consumers.
        const NO_MOTION_PLAN          = 1 << 2;
        /// A frame or chain id was not found or is unreachable.
        const INVALID_FRAME           = 1 << 3;
        /// Malformed solver options or input vectors.
        const INVALID_PARAMETER       = 1 << 4;
    }
}

impl fmt::Display for SolveError {
    /// Renders set flags joined by `:` (for example
    /// `no_solution:invalid_frame`), or `OK` for the empty mask.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        const NAMES: [(SolveError, &str); 5] = [
            (SolveError::NO_SOLUTION, "no_solution"),
            (SolveError::NO_INVERSE_KINEMATICS, "no_inverse_kinematics"),
            (SolveError::NO_MOTION_PLAN, "no_motion_plan"),
            (SolveError::INVALID_FRAME, "invalid_frame"),
            (SolveError::INVALID_PARAMETER, "invalid_parameter"),
        ];
        if self.is_empty() {
            return write!(f, "OK");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, ":")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SolveError {}
