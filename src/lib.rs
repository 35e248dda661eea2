//! Forward and inverse kinematics for tree-structured robot models.
//!
//! A robot is described as a *scene graph*: a tree of rigid-body frames,
//! each attached to its parent through a fixed, revolute or prismatic
//! joint. Frames live in a dense array addressed by integer id, stored in
//! topological order (every parent before its children), which lets
//! forward kinematics run as one pass over the array. All poses are
//! [`nalgebra::Isometry3`] values (unit quaternion plus translation).
//!
//! # Features
//!
//! - Validated model construction: adding a frame with an unknown parent
//!   or a duplicated name fails immediately, so an indexed
//!   [`SceneGraph`](scene_graph::SceneGraph) is structurally sound by the
//!   time solvers see it.
//! - Single-pass forward kinematics with reusable transform buffers, safe
//!   to call from a control loop without per-call allocation.
//! - Chain extraction: scope Jacobian and IK work to the path between any
//!   root and tip frame of a larger model (one arm of a humanoid).
//! - Geometric chain Jacobians, packed `[linear; angular]`.
//! - Workspace-velocity control through a damped least-squares
//!   pseudoinverse, with a nullspace projection for secondary objectives
//!   such as joint centering.
//! - An iterative IK solver with explicit convergence and failure
//!   semantics, reported as composable [`SolveError`](errors::SolveError)
//!   status flags.
//!
//! An indexed scene graph is immutable, so it can be shared by any number
//! of concurrent solves; every solve owns its scratch buffers.
//!
//! ## Examples
//!
//! The demo programs under `demos/` walk through the main entry points:
//!
//! - **basic.rs**: building a model, forward kinematics, a first IK solve.
//! - **jacobian.rs**: chain Jacobians and workspace-velocity control.
//! - **nullspace_ik.rs**: joint centering projected into the null space of
//!   a redundant arm.

pub mod errors;
pub mod scene_graph;

pub mod fk;

pub mod chain;
pub mod jacobian;

pub mod workspace;

pub mod ik;

pub mod utils;

#[cfg(test)]
mod tests;
