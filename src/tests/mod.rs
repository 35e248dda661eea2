mod test_ik_scenarios;
mod test_random_kinematics;
