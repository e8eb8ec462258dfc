//! # Benchmark Comparison Orchestrator
//!
//! Runs the AR(2) persistence analysis and the independent benchmarks on the
//! same series and classifies how they agree:
//!
//! 1. AR(2) fit and characteristic-root analysis, band membership
//! 2. JTK-like and RAIN-like rhythm detection
//! 3. AR/ARMA model comparison to rank AR(2)
//! 4. Agreement classification
//!
//! A batch is a pure map over genes (parallel under the `parallel` feature)
//! followed by Benjamini-Hochberg correction of both detectors across the batch,
//! reclassification with the corrected calls, and aggregation into a
//! [`BatchSummary`]. Results are always in gene order.

use crate::autoregressive::{compare_models, fit_ar, ArFit, ModelComparison};
use crate::config::EngineConfig;
use crate::errors::{validate_all_finite, ValidationError, ValidationResult};
use crate::results::{classify_agreement, AgreementClass, Ar2Summary, BatchSummary, BenchmarkResult};
use crate::rhythm_jtk::{self, jtk_test};
use crate::rhythm_rain::{self, rain_test};
use crate::roots::analyze_ar2_roots;
use crate::series::{infer_sampling_interval, validate_timepoints, SeriesPanel};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Batch comparison output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchReport {
    /// Per-gene results in gene order
    pub results: Vec<BenchmarkResult>,
    /// Aggregated counts and rates
    pub summary: BatchSummary,
}

impl BatchReport {
    /// Result for one gene.
    pub fn result(&self, gene: &str) -> Option<&BenchmarkResult> {
        self.results
            .binary_search_by(|r| r.gene.as_str().cmp(gene))
            .ok()
            .map(|i| &self.results[i])
    }

    /// Genes of one agreement class.
    pub fn genes_in(&self, class: AgreementClass) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.agreement == class)
            .map(|r| r.gene.as_str())
            .collect()
    }
}

fn ar2_summary(values: &[f64], sampling_interval: f64, config: &EngineConfig) -> ValidationResult<Ar2Summary> {
    let outcome = fit_ar(values, 2)?;
    let degenerate = outcome.degenerate_reason();
    let fit = outcome.fit_or_else(|_| ArFit::sentinel(2));
    let (phi1, phi2) = (fit.coefficients[0], fit.coefficients[1]);
    let root = analyze_ar2_roots(phi1, phi2, sampling_interval);
    let in_band = degenerate.is_none() && root.in_band(&config.eigen_band);
    Ok(Ar2Summary {
        phi1,
        phi2,
        residual_variance: fit.residual_variance,
        degenerate,
        root,
        in_band,
    })
}

fn analyze_gene(
    gene: &str,
    timepoints: &[f64],
    values: &[f64],
    sampling_interval: f64,
    config: &EngineConfig,
) -> ValidationResult<BenchmarkResult> {
    let ar2 = ar2_summary(values, sampling_interval, config)?;
    let jtk = jtk_test(timepoints, values, &config.rhythm, config.fdr_threshold)?;
    let rain = rain_test(timepoints, values, &config.rhythm, config.fdr_threshold)?;
    let model_comparison: ModelComparison = compare_models(
        values,
        config.model.max_p,
        config.model.max_q,
        config.model.criterion,
    )?;
    let ar2_rank = model_comparison.ar2_rank;
    let agreement = classify_agreement(
        ar2.in_band,
        jtk.is_rhythmic,
        rain.is_rhythmic,
        ar2_rank,
        config.max_supporting_rank,
    );

    Ok(BenchmarkResult {
        gene: gene.to_string(),
        ar2,
        jtk,
        rain,
        model_comparison,
        ar2_rank,
        agreement,
    })
}

/// Compare the three methods on a single series.
///
/// Detector calls use the single-test p-values (no batch correction). The
/// sampling interval comes from `config.sampling_interval` or is inferred
/// from the timepoints.
pub fn compare_series(
    gene: &str,
    timepoints: &[f64],
    values: &[f64],
    config: &EngineConfig,
) -> ValidationResult<BenchmarkResult> {
    config.validate()?;
    validate_timepoints(timepoints)?;
    if values.len() != timepoints.len() {
        return Err(ValidationError::LengthMismatch {
            name: gene.to_string(),
            expected: timepoints.len(),
            actual: values.len(),
        });
    }
    validate_all_finite(values, gene)?;

    let interval = config
        .sampling_interval
        .unwrap_or_else(|| infer_sampling_interval(timepoints));
    analyze_gene(gene, timepoints, values, interval, config)
}

/// Panel-specific settings: the panel's nominal period drives rhythm
/// detection and its sampling interval scales the roots.
fn panel_config(panel: &SeriesPanel, config: &EngineConfig) -> EngineConfig {
    let mut effective = config.clone();
    effective.rhythm.nominal_period = panel.nominal_period();
    effective.sampling_interval = Some(panel.sampling_interval());
    effective
}

/// BH-correct both detectors across the batch, reclassify and summarise.
fn finish_batch(mut results: Vec<BenchmarkResult>, config: &EngineConfig) -> BatchReport {
    results.sort_by(|a, b| a.gene.cmp(&b.gene));

    let mut jtk: Vec<_> = results.iter().map(|r| r.jtk.clone()).collect();
    let mut rain: Vec<_> = results.iter().map(|r| r.rain.clone()).collect();
    rhythm_jtk::apply_batch_correction(&mut jtk, config.fdr_threshold);
    rhythm_rain::apply_batch_correction(&mut rain, config.fdr_threshold);

    for ((result, jtk), rain) in results.iter_mut().zip(jtk).zip(rain) {
        result.jtk = jtk;
        result.rain = rain;
        result.agreement = classify_agreement(
            result.ar2.in_band,
            result.jtk.is_rhythmic,
            result.rain.is_rhythmic,
            result.ar2_rank,
            config.max_supporting_rank,
        );
    }

    let summary = BatchSummary::from_results(&results);
    log::debug!(
        "batch complete: {} genes, {} full agreement",
        summary.total,
        summary.count(AgreementClass::FullAgreement)
    );
    BatchReport { results, summary }
}

/// Compare every series of a panel.
pub fn compare_batch(panel: &SeriesPanel, config: &EngineConfig) -> ValidationResult<BatchReport> {
    let never = AtomicBool::new(false);
    compare_batch_cancellable(panel, config, &never)
}

/// [`compare_batch`] with cooperative cancellation.
///
/// `cancel` is checked before each gene starts. Once it is set the remaining
/// genes are skipped and the call returns [`ValidationError::Cancelled`] with
/// the number of genes that finished.
pub fn compare_batch_cancellable(
    panel: &SeriesPanel,
    config: &EngineConfig,
    cancel: &AtomicBool,
) -> ValidationResult<BatchReport> {
    config.validate()?;
    let effective = panel_config(panel, config);
    let interval = panel.sampling_interval();
    let timepoints = panel.timepoints();
    let entries: Vec<(&str, &[f64])> = panel.iter().collect();
    let completed = AtomicUsize::new(0);

    log::debug!("comparing {} genes", entries.len());

    let run = |(gene, values): &(&str, &[f64])| -> Option<ValidationResult<BenchmarkResult>> {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        let result = analyze_gene(gene, timepoints, values, interval, &effective);
        completed.fetch_add(1, Ordering::Relaxed);
        Some(result)
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Option<ValidationResult<BenchmarkResult>>> = {
        use rayon::prelude::*;
        entries.par_iter().map(run).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Option<ValidationResult<BenchmarkResult>>> = entries.iter().map(run).collect();

    if outcomes.iter().any(Option::is_none) {
        let completed = completed.load(Ordering::Relaxed);
        log::warn!(
            "batch cancelled after {} of {} genes",
            completed,
            entries.len()
        );
        return Err(ValidationError::Cancelled { completed });
    }

    let results = outcomes
        .into_iter()
        .flatten()
        .collect::<ValidationResult<Vec<_>>>()?;
    Ok(finish_batch(results, &effective))
}

/// Render the fixed-template text report of a batch.
pub fn render_report(report: &BatchReport) -> String {
    let summary = &report.summary;
    let mut details = String::new();

    details.push_str("PAR(2) BENCHMARK COMPARISON\n");
    details.push_str("===========================\n");
    details.push_str(&format!("Genes analysed: {}\n\n", summary.total));

    details.push_str("Agreement\n");
    for class in AgreementClass::ALL {
        details.push_str(&format!(
            "  {:<24}{:>6}  ({:>5.1}%)\n",
            class.label(),
            summary.count(class),
            summary.rate(class) * 100.0
        ));
    }

    details.push_str("\nDetector calls\n");
    for (label, entry) in [
        ("JTK rhythmic", summary.jtk_rhythmic),
        ("RAIN rhythmic", summary.rain_rhythmic),
        ("Eigenvalue band", summary.in_band),
        ("Degenerate AR(2) fits", summary.degenerate_fits),
    ] {
        details.push_str(&format!(
            "  {:<24}{:>6}  ({:>5.1}%)\n",
            label,
            entry.count,
            entry.rate * 100.0
        ));
    }

    details.push_str("\nAR(2) rank distribution\n");
    if summary.ar2_rank_distribution.is_empty() {
        details.push_str("  (none)\n");
    }
    for (rank, count) in &summary.ar2_rank_distribution {
        details.push_str(&format!("  rank {:<19}{:>6}\n", rank, count));
    }

    details.push_str(&format!(
        "\nMean eigenvalue modulus: {:.4}\n",
        summary.mean_modulus
    ));
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{generate_ar2, generate_cosine_rhythm, Ar2Config, CosineRhythm, GeneratorConfig};
    use std::collections::BTreeMap;

    fn timepoints() -> Vec<f64> {
        (0..48).map(|i| i as f64 * 2.0).collect()
    }

    fn panel() -> SeriesPanel {
        let t = timepoints();
        let mut series = BTreeMap::new();
        series.insert(
            "Arntl".to_string(),
            generate_cosine_rhythm(&t, &CosineRhythm::default(), 0.05, Some(1)).unwrap(),
        );
        series.insert(
            "Per2".to_string(),
            generate_cosine_rhythm(
                &t,
                &CosineRhythm {
                    peak_phase: 12.0,
                    ..CosineRhythm::default()
                },
                0.05,
                Some(2),
            )
            .unwrap(),
        );
        series.insert(
            "Actb".to_string(),
            generate_ar2(
                &GeneratorConfig {
                    length: 48,
                    seed: Some(3),
                    noise_std: 1.0,
                },
                &Ar2Config::default(),
            )
            .unwrap(),
        );
        series.insert("Flat".to_string(), vec![1.0; 48]);
        SeriesPanel::new(t, series).unwrap()
    }

    #[test]
    fn test_compare_series_rhythmic_gene() {
        let t = timepoints();
        let values = generate_cosine_rhythm(&t, &CosineRhythm::default(), 0.05, Some(7)).unwrap();
        let result = compare_series("Arntl", &t, &values, &EngineConfig::light()).unwrap();
        assert!(result.jtk.is_rhythmic);
        assert!(result.rain.is_rhythmic);
        assert!(result.ar2.degenerate.is_none());
        assert!(result.ar2.root.is_complex);
        assert!(result.ar2_rank.is_some());
    }

    #[test]
    fn test_compare_series_contract() {
        let t = timepoints();
        assert!(matches!(
            compare_series("short", &t, &[1.0; 10], &EngineConfig::light()),
            Err(ValidationError::LengthMismatch { .. })
        ));
        let mut bad = vec![0.5; 48];
        bad[4] = f64::INFINITY;
        assert!(compare_series("bad", &t, &bad, &EngineConfig::light()).is_err());
    }

    #[test]
    fn test_flat_gene_degrades_to_sentinel() {
        let t = timepoints();
        let result = compare_series("Flat", &t, &[2.0; 48], &EngineConfig::light()).unwrap();
        assert!(result.ar2.degenerate.is_some());
        assert_eq!(result.modulus(), 0.0);
        assert!(!result.ar2.in_band);
        assert!(!result.jtk.is_rhythmic);
        assert!(!result.rain.is_rhythmic);
    }

    #[test]
    fn test_flat_gene_never_counts_as_full_agreement() {
        let t: Vec<f64> = (0..24).map(|i| i as f64 * 2.0).collect();
        let mut config = EngineConfig::light();
        config.model.max_p = 2;
        config.model.max_q = 0;
        let result = compare_series("Flat", &t, &[3.0; 24], &config).unwrap();
        assert!(result.ar2.degenerate.is_some());
        assert_eq!(result.ar2_rank, None);
        assert_ne!(result.agreement, AgreementClass::FullAgreement);
        assert_eq!(result.agreement, AgreementClass::RhythmAgreementOnly);
    }

    #[test]
    fn test_batch_is_sorted_and_summarised() {
        let report = compare_batch(&panel(), &EngineConfig::light()).unwrap();
        let genes: Vec<&str> = report.results.iter().map(|r| r.gene.as_str()).collect();
        assert_eq!(genes, vec!["Actb", "Arntl", "Flat", "Per2"]);
        assert_eq!(report.summary.total, 4);
        let class_total: usize = AgreementClass::ALL
            .iter()
            .map(|&c| report.summary.count(c))
            .sum();
        assert_eq!(class_total, 4);
        assert_eq!(report.summary.degenerate_fits.count, 1);
        assert_eq!(report.summary.ar2_rank_distribution.values().sum::<usize>(), 3);
        assert_ne!(
            report.result("Flat").map(|r| r.agreement),
            Some(AgreementClass::FullAgreement)
        );
        assert!(report.result("Per2").map_or(false, |r| r.jtk.is_rhythmic));
        assert!(report.result("Missing").is_none());

        for result in &report.results {
            assert!(result.jtk.q_value >= result.jtk.p_value - 1e-15);
            assert!(result.rain.q_value >= result.rain.p_value - 1e-15);
        }
    }

    #[test]
    fn test_cancelled_batch() {
        let cancel = AtomicBool::new(true);
        let result = compare_batch_cancellable(&panel(), &EngineConfig::light(), &cancel);
        assert!(matches!(result, Err(ValidationError::Cancelled { completed: 0 })));
    }

    #[test]
    fn test_report_template() {
        let report = compare_batch(&panel(), &EngineConfig::light()).unwrap();
        let text = render_report(&report);
        assert!(text.starts_with("PAR(2) BENCHMARK COMPARISON\n"));
        assert!(text.contains("Genes analysed: 4"));
        for class in AgreementClass::ALL {
            assert!(text.contains(class.label()));
        }
        assert!(text.contains("Mean eigenvalue modulus:"));
    }
}
