//! Integration tests for full workflow scenarios
//!
//! These tests run the validation engine end to end on seeded synthetic
//! panels: batch comparison, report rendering, causality, the robustness
//! suite and category permutation tests working together.

use assert_approx_eq::assert_approx_eq;
use par2_validation::{
    compare_batch, compare_series, generators::*, granger_bidirectional, permutation_test_by_category,
    render_report, run_robustness_suite, AgreementClass, EngineConfig, GeneSetCatalog,
    RobustnessTestKind, SeriesPanel, SuiteInput,
};
use std::collections::BTreeMap;

fn sampling_grid() -> Vec<f64> {
    regular_timepoints(48, 2.0)
}

fn rhythmic(peak_phase: f64, seed: u64) -> Vec<f64> {
    let rhythm = CosineRhythm {
        peak_phase,
        amplitude: 1.0,
        baseline: 5.0,
        ..CosineRhythm::default()
    };
    generate_cosine_rhythm(&sampling_grid(), &rhythm, 0.1, Some(seed))
        .expect("cosine generation should succeed")
}

fn persistent(seed: u64) -> Vec<f64> {
    let config = GeneratorConfig {
        length: 48,
        seed: Some(seed),
        noise_std: 1.0,
    };
    generate_ar2(&config, &Ar2Config::default()).expect("AR(2) generation should succeed")
}

fn mixed_panel() -> SeriesPanel {
    let mut series = BTreeMap::new();
    series.insert("Arntl".to_string(), rhythmic(0.0, 1));
    series.insert("Nr1d1".to_string(), rhythmic(8.0, 2));
    series.insert("Per2".to_string(), rhythmic(14.0, 3));
    series.insert("Abcb1".to_string(), persistent(4));
    series.insert("Gstp1".to_string(), persistent(5));
    series.insert("Top2a".to_string(), persistent(6));
    series.insert(
        "Flat".to_string(),
        vec![2.5; 48],
    );
    SeriesPanel::new(sampling_grid(), series).expect("panel should be valid")
}

/// Test scenario: analyst compares a mixed panel and reads the report
///
/// 1. Build a panel of rhythmic, persistent and flat genes
/// 2. Run the batch comparison
/// 3. Check the detector calls on the known rhythmic genes
/// 4. Render the text report
#[test]
fn test_complete_batch_comparison_workflow() {
    let panel = mixed_panel();
    let config = EngineConfig::standard().with_seed(42);

    let report = compare_batch(&panel, &config).expect("batch comparison should succeed");
    assert_eq!(report.results.len(), 7);
    assert_eq!(report.summary.total, 7);

    for gene in ["Arntl", "Nr1d1", "Per2"] {
        let result = report.result(gene).expect("gene should be present");
        assert!(result.jtk.is_rhythmic, "{} should be JTK rhythmic", gene);
        assert!(result.rain.is_rhythmic, "{} should be RAIN rhythmic", gene);
        assert!(result.ar2.root.is_complex, "{} should oscillate", gene);
        // A clean 24h cosine sampled every 2h is close to undamped
        assert!(result.modulus() > 0.8, "{} modulus {}", gene, result.modulus());
        assert_eq!(result.agreement, AgreementClass::RhythmOnlyOutsideBand);
    }

    let flat = report.result("Flat").expect("flat gene should be present");
    assert!(flat.ar2.degenerate.is_some());
    assert_eq!(flat.modulus(), 0.0);
    assert!(!flat.jtk.is_rhythmic && !flat.rain.is_rhythmic);
    assert_eq!(report.summary.degenerate_fits.count, 1);

    let class_total: usize = AgreementClass::ALL
        .iter()
        .map(|&class| report.summary.count(class))
        .sum();
    assert_eq!(class_total, 7);
    let rate_total: f64 = AgreementClass::ALL
        .iter()
        .map(|&class| report.summary.rate(class))
        .sum();
    assert_approx_eq!(rate_total, 1.0, 1e-12);
    // The flat gene's AR(2) fit is degenerate and does not rank
    assert_eq!(report.summary.ar2_rank_distribution.values().sum::<usize>(), 6);
    assert_ne!(flat.agreement, AgreementClass::FullAgreement);

    let text = render_report(&report);
    assert!(text.contains("Genes analysed: 7"));
    assert!(text.contains("Rhythmic, outside band"));
}

/// Batch output does not depend on scheduling.
#[test]
fn test_batch_comparison_is_deterministic() {
    let panel = mixed_panel();
    let config = EngineConfig::light();
    let first = compare_batch(&panel, &config).expect("first run should succeed");
    let second = compare_batch(&panel, &config).expect("second run should succeed");
    assert_eq!(first, second);
}

/// Single-series and batch comparison agree on the uncorrected parts.
#[test]
fn test_single_and_batch_agree_on_fits() {
    let panel = mixed_panel();
    let config = EngineConfig::light();
    let report = compare_batch(&panel, &config).expect("batch should succeed");

    for (gene, values) in panel.iter() {
        let single = compare_series(gene, panel.timepoints(), values, &config)
            .expect("single comparison should succeed");
        let batched = report.result(gene).expect("gene should be present");
        assert_eq!(single.ar2, batched.ar2);
        assert_eq!(single.ar2_rank, batched.ar2_rank);
        assert_eq!(single.jtk.p_value, batched.jtk.p_value);
        assert!(batched.jtk.q_value >= single.jtk.p_value - 1e-15);
    }
}

/// Test scenario: driver/response pair through causality and robustness
#[test]
fn test_causality_and_robustness_workflow() {
    let gen_config = GeneratorConfig {
        length: 120,
        seed: Some(17),
        noise_std: 0.3,
    };
    let pair = DrivenPairConfig {
        lag: 1,
        coupling: 0.9,
        response_dynamics: (0.5, -0.2),
    };
    let (driver, response) = generate_driven_pair(&gen_config, &pair).expect("pair generation");

    let granger = granger_bidirectional(&driver, &response, 2).expect("Granger should run");
    assert!(granger.forward.causality);
    assert!(granger.forward.p_value < granger.reverse.p_value);

    let timepoints = regular_timepoints(120, 1.0);
    let group_a = [0.72, 0.69, 0.75, 0.70, 0.74];
    let group_b = [0.41, 0.45, 0.39, 0.44, 0.40];
    let input = SuiteInput {
        timepoints: &timepoints,
        driver: &driver,
        response: &response,
        groups: Some((&group_a, &group_b)),
    };
    let config = EngineConfig::light().with_seed(99);
    let report = run_robustness_suite(&input, &config).expect("suite should run");

    assert_eq!(report.of_kind(RobustnessTestKind::Permutation).count(), 1);
    assert_eq!(report.of_kind(RobustnessTestKind::Bootstrap).count(), 1);
    assert_eq!(report.of_kind(RobustnessTestKind::Sparsity).count(), 1);
    assert_eq!(
        report.of_kind(RobustnessTestKind::PhaseShift).count(),
        config.robustness.phase_shift_hours.len()
    );
    // Fully separated groups of five: 2 of 252 splits are as extreme
    assert!(report
        .of_kind(RobustnessTestKind::Permutation)
        .all(|r| r.passed()));

    let repeat = run_robustness_suite(&input, &config).expect("suite should run again");
    assert_eq!(report, repeat);
}

/// Test scenario: gene-set permutation on moduli from a batch run
#[test]
fn test_category_permutation_on_batch_moduli() {
    let report = compare_batch(&mixed_panel(), &EngineConfig::light()).expect("batch");
    let moduli: BTreeMap<String, f64> = report
        .results
        .iter()
        .map(|r| (r.gene.clone(), r.modulus()))
        .collect();

    let catalog = GeneSetCatalog::new()
        .with_set("clock", ["Arntl", "Nr1d1", "Per2"])
        .with_set("target", ["Abcb1", "Gstp1", "Top2a"]);

    let result = permutation_test_by_category(&moduli, &catalog, "clock", "target", 500, Some(3))
        .expect("permutation should run");
    assert!(result.observed_difference > 0.0);
    assert!(result.p_value > 0.0 && result.p_value <= 1.0);
    assert_eq!(result.permutations, 500);
}

#[cfg(feature = "serde")]
#[test]
fn test_report_serialises_to_json() {
    let report = compare_batch(&mixed_panel(), &EngineConfig::light()).expect("batch");
    let json = serde_json::to_string(&report).expect("report should serialise");
    assert!(json.contains("\"gene\":\"Arntl\""));
    assert!(json.contains("FullAgreement"));

    let config = EngineConfig::deep().with_seed(5);
    let encoded = serde_json::to_string(&config).expect("config should serialise");
    let decoded: EngineConfig = serde_json::from_str(&encoded).expect("config should parse");
    assert_eq!(config, decoded);
}
