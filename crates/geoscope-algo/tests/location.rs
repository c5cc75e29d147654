//! Location set covering tests

use geoscope_algo::{solve_lscp, LocationConfig, LocationError, Lscp, MilpBackend};

/// Clients on a line at 0, 1, ..., 9; facilities at 1, 5 and 8.
fn line_costs() -> Vec<Vec<f64>> {
    let facilities = [1.0, 5.0, 8.0];
    (0..10)
        .map(|c| facilities.iter().map(|f: &f64| (c as f64 - f).abs()).collect())
        .collect()
}

#[test]
fn smallest_cover_is_chosen() {
    // Radius 3: facility 0 covers 0..=4, facility 1 covers 2..=8, facility 2 covers 5..=9
    let lscp = Lscp::from_cost_matrix(&line_costs(), 3.0).unwrap();
    assert_eq!(lscp.candidates(3), &[0, 1]);

    let solution = lscp.solve(MilpBackend::default()).unwrap();
    assert_eq!(solution.selected, vec![0, 2]);
    assert!(!solution.is_selected(1));
    assert!(solution.fac2cli[1].is_empty());
    assert_eq!(solution.fac2cli[0], vec![0, 1, 2, 3, 4]);
    assert_eq!(solution.fac2cli[2], vec![5, 6, 7, 8, 9]);
    assert!(solution.cli2fac.iter().all(|f| f.len() == 1));
}

#[test]
fn larger_radius_needs_one_facility() {
    let config = LocationConfig {
        service_radius: 5.0,
        ..LocationConfig::default()
    };
    let solution = solve_lscp(&line_costs(), &config).unwrap();
    assert_eq!(solution.selected, vec![1]);
    assert!(solution.cli2fac.iter().all(|f| f == &vec![1]));
}

#[test]
fn client_out_of_range_is_named() {
    let config = LocationConfig {
        service_radius: 0.5,
        ..LocationConfig::default()
    };
    assert_eq!(
        solve_lscp(&line_costs(), &config).unwrap_err(),
        LocationError::UncoverableClient { client: 0 }
    );
}
