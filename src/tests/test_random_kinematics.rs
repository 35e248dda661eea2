#[cfg(test)]
mod tests {
    use crate::chain::SubSceneGraph;
    use crate::fk::compute_fk;
    use crate::jacobian::chain_jacobian;
    use crate::scene_graph::{SceneGraph, SceneGraphBuilder};
    use crate::utils::pose_xyz;
    use nalgebra::{Vector3, Vector6};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn spatial_3r() -> SceneGraph {
        let mut b = SceneGraphBuilder::new();
        b.add_fixed(SceneGraphBuilder::ROOT, "base", pose_xyz(0.0, 0.0, 0.0)).unwrap();
        b.add_revolute("base", "j0", pose_xyz(0.0, 0.0, 0.2), "q0", Vector3::z_axis(), 0.0)
            .unwrap();
        b.add_revolute("j0", "j1", pose_xyz(0.0, 0.0, 0.1), "q1", Vector3::y_axis(), 0.0)
            .unwrap();
        b.add_revolute("j1", "j2", pose_xyz(0.4, 0.0, 0.0), "q2", Vector3::y_axis(), 0.0)
            .unwrap();
        b.add_fixed("j2", "tip", pose_xyz(0.3, 0.0, 0.0)).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_fk_determinism_random_configs() {
        let sg = spatial_3r();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let q: Vec<f64> = (0..3).map(|_| rng.gen_range(-PI..PI)).collect();
            let a = compute_fk(&sg, &q).unwrap();
            let b = compute_fk(&sg, &q).unwrap();
            for (ta, tb) in a.iter().zip(b.iter()) {
                // Bit-identical, not merely close.
                assert_eq!(ta.translation.vector, tb.translation.vector);
                assert_eq!(ta.rotation.coords, tb.rotation.coords);
            }
        }
    }

    /// Cross-check the geometric Jacobian against finite differences of
    /// the tip pose over randomized configurations.
    #[test]
    fn test_jacobian_matches_finite_differences() {
        let sg = spatial_3r();
        let base = sg.frame_id("base").unwrap();
        let tip = sg.frame_id("tip").unwrap();
        let ssg = SubSceneGraph::chain(&sg, base, tip).unwrap();

        let h = 1e-7;
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let q: Vec<f64> = (0..3).map(|_| rng.gen_range(-1.5..1.5)).collect();
            let tf = compute_fk(&sg, &q).unwrap();
            let j = chain_jacobian(&ssg, &tf).unwrap();

            for col in 0..3 {
                let mut q_h = q.clone();
                q_h[col] += h;
                let tf_h = compute_fk(&sg, &q_h).unwrap();

                let dv = (tf_h[tip].translation.vector - tf[tip].translation.vector) / h;
                let dw = (tf_h[tip].rotation * tf[tip].rotation.inverse()).scaled_axis() / h;
                let numeric = Vector6::new(dv[0], dv[1], dv[2], dw[0], dw[1], dw[2]);

                let analytic = j.column(col);
                for row in 0..6 {
                    assert!(
                        (numeric[row] - analytic[row]).abs() < 1e-5,
                        "col {} row {}: {} vs {}",
                        col,
                        row,
                        numeric[row],
                        analytic[row]
                    );
                }
            }
        }
    }
}
