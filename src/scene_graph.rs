//! Tree-structured model of rigid-body frames ("scene graph").
//!
//! Frames are values in a dense array addressed by integer id, with the
//! parent of every non-root frame stored at a smaller id. That ordering is
//! what lets forward kinematics run as a single pass over the array: by the
//! time a child is visited, its parent's world pose is already computed.
//!
//! A model is assembled through [`SceneGraphBuilder`], which validates every
//! addition against the frames already present, and then *indexed* by
//! [`SceneGraphBuilder::build`], which assigns the dense frame and
//! configuration ids. The resulting [`SceneGraph`] is immutable and can be
//! shared freely between concurrent solvers; to extend a model, add to the
//! (cloneable) builder and build again, which invalidates previously
//! obtained ids.

use std::collections::HashMap;

use nalgebra::{Isometry3, Unit, Vector3};
use tracing::debug;

use crate::errors::SceneError;

/// Dense index of a frame within an indexed scene graph.
pub type FrameId = usize;

/// Dense index of a configuration variable (one scalar degree of freedom).
pub type ConfigId = usize;

/// How a frame moves relative to its parent.
///
/// The set of joint kinds is closed, so this is a tagged variant rather
/// than a trait object; forward kinematics matches on it in a tight loop.
#[derive(Clone, Debug)]
pub enum JointKind {
    /// Rigid attachment; the frame's pose relative to its parent is the
    /// fixed origin alone.
    Fixed,
    /// Rotation about `axis` by `offset + q[config]` radians, applied after
    /// the fixed origin.
    Revolute {
        axis: Unit<Vector3<f64>>,
        offset: f64,
        config: ConfigId,
    },
    /// Translation along `axis` by `offset + q[config]`, applied after the
    /// fixed origin.
    Prismatic {
        axis: Unit<Vector3<f64>>,
        offset: f64,
        config: ConfigId,
    },
}

impl JointKind {
    /// Configuration variable driving this joint, if it has one.
    pub fn config(&self) -> Option<ConfigId> {
        match *self {
            JointKind::Fixed => None,
            JointKind::Revolute { config, .. } | JointKind::Prismatic { config, .. } => {
                Some(config)
            }
        }
    }

    /// True for revolute and prismatic joints.
    pub fn is_movable(&self) -> bool {
        !matches!(*self, JointKind::Fixed)
    }
}

/// One rigid-body coordinate frame in the kinematic tree.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Unique name within the scene graph.
    pub name: String,
    /// Parent frame id; `None` for frames attached to the global root.
    pub parent: Option<FrameId>,
    /// Fixed offset pose relative to the parent, composed before any joint
    /// motion.
    pub origin: Isometry3<f64>,
    /// Joint connecting this frame to its parent.
    pub joint: JointKind,
}

#[derive(Clone, Debug)]
enum JointSpec {
    Fixed,
    Revolute {
        axis: Unit<Vector3<f64>>,
        offset: f64,
        config: String,
    },
    Prismatic {
        axis: Unit<Vector3<f64>>,
        offset: f64,
        config: String,
    },
}

#[derive(Clone, Debug)]
struct FrameSpec {
    name: String,
    parent: String,
    origin: Isometry3<f64>,
    joint: JointSpec,
}

/// Staged scene-graph model, validated as it is assembled.
///
/// Frames are added by naming their parent; the parent must already be
/// present (or be [`SceneGraphBuilder::ROOT`]), which keeps the staged
/// order topological by construction and makes cycles impossible to enter
/// through this API. [`build`](SceneGraphBuilder::build) still re-verifies
/// the invariant before handing out an indexed graph.
#[derive(Clone, Debug, Default)]
pub struct SceneGraphBuilder {
    frames: Vec<FrameSpec>,
    frame_names: HashMap<String, usize>,
    config_names: HashMap<String, usize>,
    limits: HashMap<String, (f64, f64)>,
}

impl SceneGraphBuilder {
    /// Parent name designating the global root.
    pub const ROOT: &'static str = "";

    pub fn new() -> Self {
        Self::default()
    }

    fn check_new_frame(&self, parent: &str, name: &str) -> Result<(), SceneError> {
        if self.frame_names.contains_key(name) {
            return Err(SceneError::DuplicateFrame(name.to_owned()));
        }
        if parent != Self::ROOT && !self.frame_names.contains_key(parent) {
            return Err(SceneError::UnknownParent {
                frame: name.to_owned(),
                parent: parent.to_owned(),
            });
        }
        Ok(())
    }

    fn check_new_config(&self, config: &str) -> Result<(), SceneError> {
        if self.config_names.contains_key(config) {
            return Err(SceneError::DuplicateConfig(config.to_owned()));
        }
        Ok(())
    }

    fn push(&mut self, spec: FrameSpec) {
        self.frame_names.insert(spec.name.clone(), self.frames.len());
        self.frames.push(spec);
    }

    /// Add a rigidly attached frame.
    pub fn add_fixed(
        &mut self,
        parent: &str,
        name: &str,
        origin: Isometry3<f64>,
    ) -> Result<(), SceneError> {
        self.check_new_frame(parent, name)?;
        self.push(FrameSpec {
            name: name.to_owned(),
            parent: parent.to_owned(),
            origin,
            joint: JointSpec::Fixed,
        });
        Ok(())
    }

    /// Add a frame rotating about `axis`, driven by the configuration
    /// variable `config` with the constant angle `offset` added.
    pub fn add_revolute(
        &mut self,
        parent: &str,
        name: &str,
        origin: Isometry3<f64>,
        config: &str,
        axis: Unit<Vector3<f64>>,
        offset: f64,
    ) -> Result<(), SceneError> {
        self.check_new_frame(parent, name)?;
        self.check_new_config(config)?;
        self.config_names.insert(config.to_owned(), self.frames.len());
        self.push(FrameSpec {
            name: name.to_owned(),
            parent: parent.to_owned(),
            origin,
            joint: JointSpec::Revolute {
                axis,
                offset,
                config: config.to_owned(),
            },
        });
        Ok(())
    }

    /// Add a frame translating along `axis`, driven by the configuration
    /// variable `config` with the constant displacement `offset` added.
    pub fn add_prismatic(
        &mut self,
        parent: &str,
        name: &str,
        origin: Isometry3<f64>,
        config: &str,
        axis: Unit<Vector3<f64>>,
        offset: f64,
    ) -> Result<(), SceneError> {
        self.check_new_frame(parent, name)?;
        self.check_new_config(config)?;
        self.config_names.insert(config.to_owned(), self.frames.len());
        self.push(FrameSpec {
            name: name.to_owned(),
            parent: parent.to_owned(),
            origin,
            joint: JointSpec::Prismatic {
                axis,
                offset,
                config: config.to_owned(),
            },
        });
        Ok(())
    }

    /// Set position limits for a configuration variable. The joint owning
    /// `config` must already be present. Limits feed the joint-centering
    /// secondary objective; joints without limits get no centering
    /// pressure.
    pub fn set_limit_pos(&mut self, config: &str, min: f64, max: f64) -> Result<(), SceneError> {
        if !self.config_names.contains_key(config) {
            return Err(SceneError::UnknownConfig(config.to_owned()));
        }
        self.limits.insert(config.to_owned(), (min, max));
        Ok(())
    }

    /// Index the staged model: assign dense frame ids in topological order
    /// and dense configuration ids in frame order, and freeze the result.
    ///
    /// Building the same builder twice yields identical ids. Ids obtained
    /// from an earlier build are invalidated by adding frames and building
    /// again.
    pub fn build(&self) -> Result<SceneGraph, SceneError> {
        let mut frames = Vec::with_capacity(self.frames.len());
        let mut frame_ids = HashMap::with_capacity(self.frames.len());
        let mut config_ids = HashMap::new();
        let mut config_names = Vec::new();
        let mut limits = Vec::new();

        for (id, spec) in self.frames.iter().enumerate() {
            let parent = if spec.parent == Self::ROOT {
                None
            } else {
                match self.frame_names.get(&spec.parent) {
                    Some(&p) => Some(p),
                    None => {
                        return Err(SceneError::UnknownParent {
                            frame: spec.name.clone(),
                            parent: spec.parent.clone(),
                        });
                    }
                }
            };
            // Parent-before-child is the invariant single-pass FK relies
            // on. It holds by construction; a violation here means the
            // staged order no longer reaches a root.
            if let Some(p) = parent {
                if p >= id {
                    return Err(SceneError::CycleDetected(spec.name.clone()));
                }
            }
            let joint = match &spec.joint {
                JointSpec::Fixed => JointKind::Fixed,
                JointSpec::Revolute { axis, offset, config } => {
                    let cid = config_names.len();
                    config_ids.insert(config.clone(), cid);
                    config_names.push(config.clone());
                    limits.push(self.limits.get(config).copied());
                    JointKind::Revolute { axis: *axis, offset: *offset, config: cid }
                }
                JointSpec::Prismatic { axis, offset, config } => {
                    let cid = config_names.len();
                    config_ids.insert(config.clone(), cid);
                    config_names.push(config.clone());
                    limits.push(self.limits.get(config).copied());
                    JointKind::Prismatic { axis: *axis, offset: *offset, config: cid }
                }
            };
            frame_ids.insert(spec.name.clone(), id);
            frames.push(Frame {
                name: spec.name.clone(),
                parent,
                origin: spec.origin,
                joint,
            });
        }

        debug!(
            frames = frames.len(),
            configs = config_names.len(),
            "indexed scene graph"
        );

        Ok(SceneGraph {
            frames,
            frame_ids,
            config_ids,
            config_names,
            limits,
        })
    }
}

/// An indexed, immutable scene graph.
///
/// Owns the frame array and the name/id maps for frames and configuration
/// variables. All accessors are read-only, so a `&SceneGraph` can be shared
/// by any number of concurrent FK or IK evaluations.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    frames: Vec<Frame>,
    frame_ids: HashMap<String, FrameId>,
    config_ids: HashMap<String, ConfigId>,
    config_names: Vec<String>,
    limits: Vec<Option<(f64, f64)>>,
}

impl SceneGraph {
    /// Number of frames in the graph.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of configuration variables; this is the length a
    /// configuration vector must have.
    pub fn config_count(&self) -> usize {
        self.config_names.len()
    }

    /// All frames, in topological (id) order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id)
    }

    pub fn frame_id(&self, name: &str) -> Result<FrameId, SceneError> {
        self.frame_ids
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownFrame(name.to_owned()))
    }

    pub fn frame_name(&self, id: FrameId) -> Option<&str> {
        self.frames.get(id).map(|f| f.name.as_str())
    }

    pub fn config_id(&self, name: &str) -> Result<ConfigId, SceneError> {
        self.config_ids
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownConfig(name.to_owned()))
    }

    pub fn config_name(&self, id: ConfigId) -> Option<&str> {
        self.config_names.get(id).map(|s| s.as_str())
    }

    /// Parent id of a frame; `None` for root frames and out-of-range ids.
    pub fn parent(&self, id: FrameId) -> Option<FrameId> {
        self.frames.get(id).and_then(|f| f.parent)
    }

    pub fn joint_kind(&self, id: FrameId) -> Option<&JointKind> {
        self.frames.get(id).map(|f| &f.joint)
    }

    /// Position limits of a configuration variable, if configured.
    pub fn limit_pos(&self, id: ConfigId) -> Option<(f64, f64)> {
        self.limits.get(id).copied().flatten()
    }

    /// Midpoint of the position limits, if configured.
    pub fn center_config(&self, id: ConfigId) -> Option<f64> {
        self.limit_pos(id).map(|(min, max)| 0.5 * (min + max))
    }
}
