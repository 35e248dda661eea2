//! Kinematic chains: the ordered path of frames between a root and a tip.
//!
//! A [`SubSceneGraph`] scopes Jacobian and IK computation to one chain of a
//! larger model (one arm of a humanoid, for example). It borrows the scene
//! graph and stores two ordered id lists: the chain's frames, root-exclusive
//! and tip-inclusive in topological order, and the configuration variables
//! those frames introduce, in the same order.

use nalgebra::DVector;

use crate::errors::SolveError;
use crate::scene_graph::{ConfigId, FrameId, SceneGraph};

/// A non-owning view of one kinematic chain within a scene graph.
#[derive(Clone, Debug)]
pub struct SubSceneGraph<'g> {
    sg: &'g SceneGraph,
    frames: Vec<FrameId>,
    configs: Vec<ConfigId>,
}

impl<'g> SubSceneGraph<'g> {
    /// Extract the chain from `root` to `tip`.
    ///
    /// Walks tip-to-root over parent ids and reverses, so the stored order
    /// is ascending. Fails with `INVALID_FRAME` if either id is out of
    /// range or if the walk reaches a global root without passing through
    /// `root` (tip not in root's subtree, or root and tip swapped).
    pub fn chain(sg: &'g SceneGraph, root: FrameId, tip: FrameId) -> Result<Self, SolveError> {
        if root >= sg.frame_count() || tip >= sg.frame_count() {
            return Err(SolveError::INVALID_FRAME);
        }
        let mut frames = Vec::new();
        let mut cursor = tip;
        while cursor != root {
            frames.push(cursor);
            match sg.parent(cursor) {
                Some(p) => cursor = p,
                None => return Err(SolveError::INVALID_FRAME),
            }
        }
        frames.reverse();

        let configs = frames
            .iter()
            .filter_map(|&f| sg.joint_kind(f).and_then(|j| j.config()))
            .collect();

        Ok(SubSceneGraph { sg, frames, configs })
    }

    /// The underlying scene graph.
    pub fn scene_graph(&self) -> &'g SceneGraph {
        self.sg
    }

    /// Number of frames on the chain (root excluded).
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of configuration variables moved by the chain.
    pub fn config_count(&self) -> usize {
        self.configs.len()
    }

    /// Chain frame ids, root-exclusive and tip-inclusive, ascending.
    pub fn frames(&self) -> &[FrameId] {
        &self.frames
    }

    /// Chain configuration ids, in the order their frames appear.
    pub fn configs(&self) -> &[ConfigId] {
        &self.configs
    }

    /// The tip frame, if the chain is non-empty.
    pub fn tip(&self) -> Option<FrameId> {
        self.frames.last().copied()
    }

    /// True if `id` is one of the chain's frames.
    pub fn contains_frame(&self, id: FrameId) -> bool {
        self.frames.contains(&id)
    }

    /// Gather the chain's configuration out of a full configuration vector.
    pub fn config_get(&self, q_all: &[f64], q_sub: &mut [f64]) -> Result<(), SolveError> {
        if q_all.len() != self.sg.config_count() || q_sub.len() != self.configs.len() {
            return Err(SolveError::INVALID_PARAMETER);
        }
        for (dst, &cid) in q_sub.iter_mut().zip(self.configs.iter()) {
            *dst = q_all[cid];
        }
        Ok(())
    }

    /// Scatter the chain's configuration into a full configuration vector,
    /// leaving unrelated entries untouched.
    pub fn config_set(&self, q_sub: &[f64], q_all: &mut [f64]) -> Result<(), SolveError> {
        if q_all.len() != self.sg.config_count() || q_sub.len() != self.configs.len() {
            return Err(SolveError::INVALID_PARAMETER);
        }
        for (&src, &cid) in q_sub.iter().zip(self.configs.iter()) {
            q_all[cid] = src;
        }
        Ok(())
    }

    /// Limit midpoints for the chain's joints, in chain order; joints
    /// without limits contribute zero. Used to seed and to center IK.
    pub fn center_configs(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.configs.len(),
            self.configs
                .iter()
                .map(|&cid| self.sg.center_config(cid).unwrap_or(0.0)),
        )
    }
}
