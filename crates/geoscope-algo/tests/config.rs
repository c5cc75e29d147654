//! Configuration files drive the analyses

use geoscope_algo::{
    solve_lscp, solve_vrp, AnalysisConfig, MilpBackend, MoranTest, SubtourStrategy, VrpProblem,
};
use geoscope_core::{Contiguity, CostMatrix, SpatialWeights};
use tempfile::TempDir;

#[test]
fn settings_round_trip_through_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("geoscope.toml");

    let mut config = AnalysisConfig::default();
    config.inference.permutations = 49;
    config.inference.seed = 2024;
    config.routing.subtour_strategy = SubtourStrategy::Exhaustive;
    config.routing.max_vehicles = 2;
    config.location.service_radius = 1.5;
    config.save_to(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("[inference]"));
    assert!(contents.contains("subtour_strategy = \"exhaustive\""));

    let loaded = AnalysisConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn loaded_settings_feed_every_analysis() {
    let config = AnalysisConfig::from_toml_str(
        r#"
        [inference]
        permutations = 99
        seed = 7

        [routing]
        max_vehicles = 1
        backend = "microlp"

        [location]
        service_radius = 2.0
        "#,
    )
    .unwrap();
    assert_eq!(config.routing.backend, MilpBackend::Microlp);

    let w = SpatialWeights::lattice(4, 4, Contiguity::Rook).unwrap();
    let y: Vec<f64> = (0..16).map(|i| (i % 4) as f64).collect();
    let first = MoranTest::run(&y, &w, &config.inference).unwrap();
    let again = MoranTest::run(&y, &w, &config.inference).unwrap();
    assert_eq!(first.permutations, 99);
    assert_eq!(first.p_sim, again.p_sim);

    let costs = CostMatrix::new(vec![
        vec![0.0, 1.0, 1.0],
        vec![1.0, 0.0, 1.0],
        vec![1.0, 1.0, 0.0],
    ])
    .unwrap();
    let tour = solve_vrp(&VrpProblem::tsp(costs).unwrap(), &config.routing).unwrap();
    assert!((tour.total_cost - 3.0).abs() < 1e-9);

    let cover = solve_lscp(&[vec![1.0, 3.0], vec![2.0, 3.0]], &config.location).unwrap();
    assert_eq!(cover.selected, vec![0]);
}

#[test]
fn malformed_file_reports_context() {
    let err = AnalysisConfig::from_toml_str("[routing]\nmax_vehicles = \"many\"").unwrap_err();
    assert!(format!("{err:#}").contains("invalid analysis configuration"));
}
