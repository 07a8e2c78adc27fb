//! Tests for `params` module

use super::params::*;

#[test]
fn test_build_params_defaults() {
    let params = HnswBuildParams::default();
    assert_eq!(params.m, 16);
    assert_eq!(params.m0, 32);
    assert_eq!(params.ef_construction, 64);
}

#[test]
fn test_build_params_rejects_m_out_of_range() {
    assert!(HnswBuildParams::new(1, 64).is_err());
    assert!(HnswBuildParams::new(101, 64).is_err());
}

#[test]
fn test_build_params_rejects_ef_construction_out_of_range() {
    assert!(HnswBuildParams::new(16, 3).is_err());
    assert!(HnswBuildParams::new(16, 1001).is_err());
}

#[test]
fn test_level_multiplier_matches_1_over_ln_m() {
    let params = HnswBuildParams::new(16, 64).unwrap();
    let expected = 1.0 / 16.0_f64.ln();
    assert!((params.level_multiplier() - expected).abs() < 1e-12);
}

#[test]
fn test_search_params_defaults() {
    assert_eq!(SearchParams::default().ef_search, 40);
}

#[test]
fn test_search_params_rejects_out_of_range() {
    assert!(SearchParams::new(0).is_err());
    assert!(SearchParams::new(1001).is_err());
    assert!(SearchParams::new(1).is_ok());
    assert!(SearchParams::new(1000).is_ok());
}
