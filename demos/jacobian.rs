//! Chain Jacobians and workspace-velocity control.

use anyhow::Result;
use nalgebra::{Vector3, Vector6};
use rs_tree_kinematics::chain::SubSceneGraph;
use rs_tree_kinematics::fk::compute_fk;
use rs_tree_kinematics::jacobian::chain_jacobian;
use rs_tree_kinematics::scene_graph::SceneGraphBuilder;
use rs_tree_kinematics::utils::pose_xyz;
use rs_tree_kinematics::workspace::{WorkspaceOpts, dx_to_dq};

fn main() -> Result<()> {
    let mut b = SceneGraphBuilder::new();
    b.add_fixed(SceneGraphBuilder::ROOT, "base", pose_xyz(0.0, 0.0, 0.0))?;
    b.add_revolute("base", "j0", pose_xyz(0.0, 0.0, 0.2), "q0", Vector3::z_axis(), 0.0)?;
    b.add_revolute("j0", "j1", pose_xyz(0.0, 0.0, 0.1), "q1", Vector3::y_axis(), 0.0)?;
    b.add_prismatic("j1", "ext", pose_xyz(0.3, 0.0, 0.0), "d0", Vector3::x_axis(), 0.0)?;
    b.add_fixed("ext", "tip", pose_xyz(0.2, 0.0, 0.0))?;
    let sg = b.build()?;

    let base = sg.frame_id("base")?;
    let tip = sg.frame_id("tip")?;
    let ssg = SubSceneGraph::chain(&sg, base, tip)?;

    let q = [0.3, -0.5, 0.1];
    let tf = compute_fk(&sg, &q)?;
    let j = chain_jacobian(&ssg, &tf)?;
    println!("jacobian ({}x{}):", j.nrows(), j.ncols());
    println!("{:.4}", j);

    // Joint velocities for a pure 0.1 m/s slide along world x.
    let opts = WorkspaceOpts::default();
    let dx = Vector6::new(0.1, 0.0, 0.0, 0.0, 0.0, 0.0);
    let dq = dx_to_dq(&ssg, &opts, &j, &dx)?;
    println!("dq for dx = {}: {:.4}", dx.transpose(), dq.transpose());
    Ok(())
}
