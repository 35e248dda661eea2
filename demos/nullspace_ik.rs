//! Joint centering on a redundant arm, projected into the Jacobian's
//! null space so it cannot disturb the tracked tip pose.

use anyhow::Result;
use nalgebra::Vector3;
use rs_tree_kinematics::chain::SubSceneGraph;
use rs_tree_kinematics::fk::compute_fk;
use rs_tree_kinematics::ik::{IkParams, IkSolver};
use rs_tree_kinematics::scene_graph::SceneGraphBuilder;
use rs_tree_kinematics::utils::pose_xyz;

fn main() -> Result<()> {
    // A 7-DOF arm with position limits on every joint.
    let mut b = SceneGraphBuilder::new();
    b.add_fixed(SceneGraphBuilder::ROOT, "base", pose_xyz(0.0, 0.0, 0.0))?;
    let axes = [
        Vector3::z_axis(),
        Vector3::y_axis(),
        Vector3::x_axis(),
        Vector3::y_axis(),
        Vector3::x_axis(),
        Vector3::y_axis(),
        Vector3::z_axis(),
    ];
    let mut parent = "base".to_owned();
    for (i, axis) in axes.iter().enumerate() {
        let name = format!("j{i}");
        let config = format!("q{i}");
        let origin = if i == 0 { pose_xyz(0.0, 0.0, 0.2) } else { pose_xyz(0.2, 0.0, 0.0) };
        b.add_revolute(&parent, &name, origin, &config, *axis, 0.0)?;
        b.set_limit_pos(&config, -2.5, 2.5)?;
        parent = name;
    }
    b.add_fixed(&parent, "tool", pose_xyz(0.1, 0.0, 0.0))?;
    let sg = b.build()?;

    let base = sg.frame_id("base")?;
    let tool = sg.frame_id("tool")?;
    let ssg = SubSceneGraph::chain(&sg, base, tool)?;

    let target = compute_fk(&sg, &[0.2, 0.5, -0.3, 0.6, 0.2, -0.4, 0.1])?[tool];
    let q_init = vec![0.6; 7];

    let plain = IkSolver::new(IkParams::default());
    let centered = IkSolver::new(IkParams::default().center_configs(&ssg, 0.1));

    let q_plain = plain.solve(&ssg, &q_init, &target)?;
    let q_centered = centered.solve(&ssg, &q_init, &target)?;

    println!("plain:    {:.4} (norm {:.4})", q_plain.transpose(), q_plain.norm());
    println!("centered: {:.4} (norm {:.4})", q_centered.transpose(), q_centered.norm());
    Ok(())
}
