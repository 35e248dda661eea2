//! Build a small arm, run forward kinematics and solve an IK target.

use anyhow::Result;
use nalgebra::Vector3;
use rs_tree_kinematics::chain::SubSceneGraph;
use rs_tree_kinematics::fk::compute_fk;
use rs_tree_kinematics::ik::{IkParams, IkSolver};
use rs_tree_kinematics::scene_graph::SceneGraphBuilder;
use rs_tree_kinematics::utils::pose_xyz;

fn main() -> Result<()> {
    let mut b = SceneGraphBuilder::new();
    b.add_fixed(SceneGraphBuilder::ROOT, "base", pose_xyz(0.0, 0.0, 0.0))?;
    b.add_revolute("base", "shoulder", pose_xyz(0.0, 0.0, 0.3), "pan", Vector3::z_axis(), 0.0)?;
    b.add_revolute("shoulder", "upper", pose_xyz(0.0, 0.0, 0.0), "lift", Vector3::y_axis(), 0.0)?;
    b.add_revolute("upper", "elbow", pose_xyz(0.4, 0.0, 0.0), "bend", Vector3::y_axis(), 0.0)?;
    b.add_fixed("elbow", "hand", pose_xyz(0.3, 0.0, 0.0))?;
    let sg = b.build()?;

    let hand = sg.frame_id("hand")?;
    println!(
        "{} frames, {} configuration variables",
        sg.frame_count(),
        sg.config_count()
    );

    // Forward kinematics at a nominal configuration.
    let q = [0.2, 0.4, -0.6];
    let tf = compute_fk(&sg, &q)?;
    println!("hand at {:.4}", tf[hand].translation.vector.transpose());

    // Drive the hand back to the pose of another configuration.
    let target = compute_fk(&sg, &[0.5, 0.2, -0.3])?[hand];
    let base = sg.frame_id("base")?;
    let ssg = SubSceneGraph::chain(&sg, base, hand)?;
    let solver = IkSolver::new(IkParams::default());
    let solution = solver.solve(&ssg, &q, &target)?;
    println!("ik solution: {:.4}", solution.transpose());

    let reached = compute_fk(&sg, solution.as_slice())?[hand];
    println!("reached    {:.4}", reached.translation.vector.transpose());
    println!("target     {:.4}", target.translation.vector.transpose());
    Ok(())
}
