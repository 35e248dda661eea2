#[cfg(test)]
mod tests {
    use crate::chain::SubSceneGraph;
    use crate::errors::SolveError;
    use crate::fk::compute_fk;
    use crate::ik::{IkParams, IkSolver};
    use crate::scene_graph::{SceneGraph, SceneGraphBuilder};
    use crate::utils::{compare_poses, pose_xyz};
    use crate::workspace::WorkspaceOpts;
    use nalgebra::{DVector, Vector3};

    /// Spatial 7-DOF arm (full-rank Jacobian almost everywhere), with
    /// symmetric position limits on every joint.
    fn redundant_arm() -> SceneGraph {
        let mut b = SceneGraphBuilder::new();
        b.add_fixed(SceneGraphBuilder::ROOT, "base", pose_xyz(0.0, 0.0, 0.0)).unwrap();
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
            let origin = if i == 0 {
                pose_xyz(0.0, 0.0, 0.2)
            } else {
                pose_xyz(0.2, 0.0, 0.0)
            };
            b.add_revolute(&parent, &name, origin, &config, *axis, 0.0).unwrap();
            b.set_limit_pos(&config, -2.0, 2.0).unwrap();
            parent = name;
        }
        b.add_fixed(&parent, "tool", pose_xyz(0.15, 0.0, 0.0)).unwrap();
        b.build().unwrap()
    }

    fn arm_chain(sg: &SceneGraph) -> SubSceneGraph<'_> {
        let base = sg.frame_id("base").unwrap();
        let tool = sg.frame_id("tool").unwrap();
        SubSceneGraph::chain(sg, base, tool).unwrap()
    }

    #[test]
    fn test_centering_prefers_limit_midpoints() {
        let sg = redundant_arm();
        let ssg = arm_chain(&sg);
        let tool = sg.frame_id("tool").unwrap();

        let q_goal: Vec<f64> = vec![0.2, 0.5, -0.3, 0.6, 0.2, -0.4, 0.1];
        let target = compute_fk(&sg, &q_goal).unwrap()[tool];
        let q_init: Vec<f64> = vec![0.5, 0.6, 0.1, 0.8, 0.4, -0.1, 0.4];

        let plain = IkSolver::new(IkParams::default());
        let centered = IkSolver::new(IkParams::default().center_configs(&ssg, 0.1));

        let q_plain = plain.solve(&ssg, &q_init, &target).unwrap();
        let q_centered = centered.solve(&ssg, &q_init, &target).unwrap();

        // Both track the target; centering only spends the arm's
        // redundancy, it must not cost tracking accuracy.
        for q in [&q_plain, &q_centered] {
            let tf = compute_fk(&sg, q.as_slice()).unwrap();
            assert!(compare_poses(&tf[tool], &target, 1e-3, 1e-2));
        }
    }

    #[test]
    fn test_nullspace_preserves_primary_velocity() {
        use crate::jacobian::chain_jacobian;
        use crate::workspace::{dx_to_dq, dx_to_dq_np};
        use nalgebra::Vector6;

        let sg = redundant_arm();
        let ssg = arm_chain(&sg);
        let q = [0.3, 0.2, 0.1, -0.4, 0.2, 0.3, 0.1];
        let tf = compute_fk(&sg, &q).unwrap();
        let j = chain_jacobian(&ssg, &tf).unwrap();

        let opts = WorkspaceOpts::default();
        let dx = Vector6::new(0.05, -0.02, 0.01, 0.02, 0.0, -0.03);
        let secondary = DVector::from_row_slice(&[0.3, -0.3, 0.3, -0.3, 0.3, -0.3, 0.3]);

        let dq = dx_to_dq(&ssg, &opts, &j, &dx).unwrap();
        let dq_np = dx_to_dq_np(&ssg, &opts, &j, &dx, &secondary).unwrap();

        // The secondary objective changes the joint motion but lives in
        // the Jacobian's null space: the tip velocity is identical.
        assert!((&dq - &dq_np).norm() > 1e-6);
        assert!((&j * &dq - &j * &dq_np).norm() < 1e-8);
    }

    #[test]
    fn test_nullspace_does_not_break_tracking() {
        let sg = redundant_arm();
        let ssg = arm_chain(&sg);
        let tool = sg.frame_id("tool").unwrap();

        let q_goal: Vec<f64> = vec![0.1, 0.4, 0.2, -0.5, 0.3, 0.2, -0.2];
        let target = compute_fk(&sg, &q_goal).unwrap()[tool];
        let q_init: Vec<f64> = vec![0.0; 7];

        let params = IkParams::default()
            .with_centering(DVector::zeros(7), DVector::from_element(7, 0.2));
        let solver = IkSolver::new(params);
        let q = solver.solve(&ssg, &q_init, &target).unwrap();
        let tf = compute_fk(&sg, q.as_slice()).unwrap();
        assert!(compare_poses(
            &tf[tool],
            &target,
            10.0 * solver.params.tol_trans,
            10.0 * solver.params.tol_angle
        ));
    }

    #[test]
    fn test_converges_from_singular_seed() {
        let sg = redundant_arm();
        let ssg = arm_chain(&sg);
        let tool = sg.frame_id("tool").unwrap();

        // Fully extended along x, the two x-axis wrist joints produce
        // identical Jacobian columns: the seed is singular. Damping must
        // carry the solve off it, not abort.
        let q_goal: Vec<f64> = vec![0.1, 0.4, 0.2, -0.5, 0.3, 0.2, -0.2];
        let target = compute_fk(&sg, &q_goal).unwrap()[tool];

        let solver = IkSolver::new(IkParams::default());
        let q = solver.solve(&ssg, &[0.0; 7], &target).unwrap();
        let tf = compute_fk(&sg, q.as_slice()).unwrap();
        assert!(compare_poses(
            &tf[tool],
            &target,
            10.0 * solver.params.tol_trans,
            10.0 * solver.params.tol_angle
        ));
    }

    #[test]
    fn test_ill_conditioned_jacobian_reported() {
        // Two coincident z-axis joints: the Jacobian columns are always
        // identical, so the chain is rank-deficient everywhere and the
        // tip is confined to the unit circle.
        let mut b = SceneGraphBuilder::new();
        b.add_fixed(SceneGraphBuilder::ROOT, "base", pose_xyz(0.0, 0.0, 0.0)).unwrap();
        b.add_revolute("base", "j0", pose_xyz(0.0, 0.0, 0.0), "q0", Vector3::z_axis(), 0.0)
            .unwrap();
        b.add_revolute("j0", "j1", pose_xyz(0.0, 0.0, 0.0), "q1", Vector3::z_axis(), 0.0)
            .unwrap();
        b.add_fixed("j1", "tip", pose_xyz(1.0, 0.0, 0.0)).unwrap();
        let sg = b.build().unwrap();
        let base = sg.frame_id("base").unwrap();
        let tip = sg.frame_id("tip").unwrap();
        let ssg = SubSceneGraph::chain(&sg, base, tip).unwrap();

        // A target inside the circle is off the reachable manifold; the
        // residual lies in the lost rank, so the failure is reported as
        // ill-conditioning rather than plain non-convergence.
        let target = pose_xyz(0.5, 0.0, 0.0);
        let solver = IkSolver::new(IkParams::default());
        let err = solver.solve(&ssg, &[0.4, 0.3], &target).unwrap_err();
        assert_eq!(err, SolveError::NO_INVERSE_KINEMATICS);
    }

    #[test]
    fn test_seed_takes_precedence() {
        let sg = redundant_arm();
        let ssg = arm_chain(&sg);
        let tool = sg.frame_id("tool").unwrap();

        let q_goal = [0.2, 0.5, -0.3, 0.6, 0.2, -0.4, 0.1];
        let target = compute_fk(&sg, &q_goal).unwrap()[tool];

        // The seed is already the solution; the passed-in configuration
        // is far away and must be ignored.
        let seed = DVector::from_row_slice(&q_goal);
        let solver = IkSolver::new(IkParams::default().with_seed(seed));
        let q = solver.solve(&ssg, &[1.5; 7], &target).unwrap();
        for (a, b) in q.iter().zip(q_goal.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mid_chain_target_frame() {
        let sg = redundant_arm();
        let ssg = arm_chain(&sg);
        let j3 = sg.frame_id("j3").unwrap();

        // Reach a pose with the elbow; wrist joints must not move.
        let q_goal = [0.3, 0.4, -0.2, 0.5, 0.0, 0.0, 0.0];
        let target = compute_fk(&sg, &q_goal).unwrap()[j3];

        let solver = IkSolver::new(IkParams::default().with_frame(j3));
        let q_init = [0.1, 0.2, 0.0, 0.3, 0.9, -0.9, 0.9];
        let q = solver.solve(&ssg, &q_init, &target).unwrap();

        let tf = compute_fk(&sg, q.as_slice()).unwrap();
        assert!(compare_poses(
            &tf[j3],
            &target,
            10.0 * solver.params.tol_trans,
            10.0 * solver.params.tol_angle
        ));
        for i in 4..7 {
            assert_eq!(q[i], q_init[i], "wrist joint q{i} moved");
        }
    }

    #[test]
    fn test_center_seed_starts_at_midpoints() {
        let mut b = SceneGraphBuilder::new();
        b.add_fixed(SceneGraphBuilder::ROOT, "base", pose_xyz(0.0, 0.0, 0.0)).unwrap();
        b.add_revolute("base", "j0", pose_xyz(0.0, 0.0, 0.1), "q0", Vector3::z_axis(), 0.0)
            .unwrap();
        b.set_limit_pos("q0", 0.5, 1.5).unwrap();
        let sg = b.build().unwrap();
        let base = sg.frame_id("base").unwrap();
        let j0 = sg.frame_id("j0").unwrap();
        let ssg = SubSceneGraph::chain(&sg, base, j0).unwrap();

        let params = IkParams::default().center_seed(&ssg).unwrap();
        let seed = params.seed.as_ref().unwrap();
        assert_eq!(seed.len(), 1);
        assert!((seed[0] - 1.0).abs() < 1e-12);
    }
}
