//! # Benchmark Result Structures
//!
//! Output records of the comparison orchestrator: the per-gene
//! [`BenchmarkResult`], its [`AgreementClass`], and the corpus-level
//! [`BatchSummary`]. All records are plain values intended for JSON encoding
//! at the API boundary.

use crate::autoregressive::ModelComparison;
use crate::errors::DegenerateReason;
use crate::rhythm_jtk::JtkResult;
use crate::rhythm_rain::RainResult;
use crate::roots::RootPoint;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the persistence metric and the two rhythm detectors relate on one gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AgreementClass {
    /// All three methods give the same call and AR(2) ranks among the best models
    FullAgreement,
    /// JTK and RAIN agree, but the band disagrees or AR(2) is not among the
    /// best-ranked models
    RhythmAgreementOnly,
    /// Only the eigenvalue band flags the gene
    PAR2Unique,
    /// Both rhythm detectors flag the gene; the modulus is outside the band
    RhythmOnlyOutsideBand,
    /// Any other combination
    Partial,
}

impl AgreementClass {
    /// Every class in report order.
    pub const ALL: [AgreementClass; 5] = [
        AgreementClass::FullAgreement,
        AgreementClass::RhythmAgreementOnly,
        AgreementClass::PAR2Unique,
        AgreementClass::RhythmOnlyOutsideBand,
        AgreementClass::Partial,
    ];

    /// Report label.
    pub fn label(&self) -> &'static str {
        match self {
            AgreementClass::FullAgreement => "Full agreement",
            AgreementClass::RhythmAgreementOnly => "Rhythm agreement only",
            AgreementClass::PAR2Unique => "PAR(2) unique",
            AgreementClass::RhythmOnlyOutsideBand => "Rhythmic, outside band",
            AgreementClass::Partial => "Partial",
        }
    }
}

/// AR(2) side of one comparison.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ar2Summary {
    /// Lag-1 coefficient (0 when degenerate)
    pub phi1: f64,
    /// Lag-2 coefficient (0 when degenerate)
    pub phi2: f64,
    /// Residual variance of the fit
    pub residual_variance: f64,
    /// Why the fit fell back to the sentinel, if it did
    pub degenerate: Option<DegenerateReason>,
    /// Characteristic-root analysis of `(phi1, phi2)`
    pub root: RootPoint,
    /// Modulus inside the persistence band
    pub in_band: bool,
}

/// Per-gene comparison record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BenchmarkResult {
    /// Series identifier
    pub gene: String,
    /// AR(2) fit and eigenvalue analysis
    pub ar2: Ar2Summary,
    /// JTK-like detector output (batch-corrected in a batch run)
    pub jtk: JtkResult,
    /// RAIN-like detector output (batch-corrected in a batch run)
    pub rain: RainResult,
    /// Full AR/ARMA model ranking
    pub model_comparison: ModelComparison,
    /// Rank of AR(2) among the candidates
    pub ar2_rank: Option<usize>,
    /// Derived classification
    pub agreement: AgreementClass,
}

impl BenchmarkResult {
    /// Modulus of the dominant root.
    pub fn modulus(&self) -> f64 {
        self.ar2.root.modulus
    }
}

/// Classify one gene from the three binary calls and the AR(2) rank.
///
/// Rules are applied in order:
/// 1. all three calls equal and AR(2) rank `<= max_supporting_rank` → full
/// 2. only the band flags the gene → PAR(2) unique
/// 3. both detectors flag it, band does not → rhythmic outside band
/// 4. detectors agree with each other → rhythm agreement only
/// 5. otherwise partial
pub fn classify_agreement(
    in_band: bool,
    jtk_rhythmic: bool,
    rain_rhythmic: bool,
    ar2_rank: Option<usize>,
    max_supporting_rank: usize,
) -> AgreementClass {
    let ar2_supported = ar2_rank.map_or(false, |rank| rank <= max_supporting_rank);
    if in_band == jtk_rhythmic && jtk_rhythmic == rain_rhythmic && ar2_supported {
        AgreementClass::FullAgreement
    } else if in_band && !jtk_rhythmic && !rain_rhythmic {
        AgreementClass::PAR2Unique
    } else if !in_band && jtk_rhythmic && rain_rhythmic {
        AgreementClass::RhythmOnlyOutsideBand
    } else if jtk_rhythmic == rain_rhythmic {
        AgreementClass::RhythmAgreementOnly
    } else {
        AgreementClass::Partial
    }
}

/// Count and share of one category.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CategoryCount {
    /// Number of genes
    pub count: usize,
    /// `count / total`, 0 for an empty batch
    pub rate: f64,
}

impl CategoryCount {
    fn new(count: usize, total: usize) -> Self {
        let rate = if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        };
        Self { count, rate }
    }
}

fn count_where<F>(results: &[BenchmarkResult], predicate: F) -> CategoryCount
where
    F: Fn(&BenchmarkResult) -> bool,
{
    CategoryCount::new(results.iter().filter(|r| predicate(r)).count(), results.len())
}

/// Corpus-level aggregation of a batch.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BatchSummary {
    /// Genes compared
    pub total: usize,
    /// Count and rate per agreement class (every class present)
    pub agreement: BTreeMap<AgreementClass, CategoryCount>,
    /// Genes called rhythmic by the JTK-like detector
    pub jtk_rhythmic: CategoryCount,
    /// Genes called rhythmic by the RAIN-like detector
    pub rain_rhythmic: CategoryCount,
    /// Genes whose modulus lies in the persistence band
    pub in_band: CategoryCount,
    /// Genes whose AR(2) fit was degenerate
    pub degenerate_fits: CategoryCount,
    /// Number of genes per AR(2) rank
    pub ar2_rank_distribution: BTreeMap<usize, usize>,
    /// Mean modulus over non-degenerate fits (0 when none)
    pub mean_modulus: f64,
}

impl BatchSummary {
    /// Aggregate already-classified results.
    pub fn from_results(results: &[BenchmarkResult]) -> Self {
        let total = results.len();
        let agreement = AgreementClass::ALL
            .iter()
            .map(|&class| (class, count_where(results, |r| r.agreement == class)))
            .collect();

        let mut ar2_rank_distribution = BTreeMap::new();
        for rank in results.iter().filter_map(|r| r.ar2_rank) {
            *ar2_rank_distribution.entry(rank).or_insert(0) += 1;
        }

        let moduli: Vec<f64> = results
            .iter()
            .filter(|r| r.ar2.degenerate.is_none())
            .map(|r| r.modulus())
            .collect();
        let mean_modulus = if moduli.is_empty() {
            0.0
        } else {
            moduli.iter().sum::<f64>() / moduli.len() as f64
        };

        Self {
            total,
            agreement,
            jtk_rhythmic: count_where(results, |r| r.jtk.is_rhythmic),
            rain_rhythmic: count_where(results, |r| r.rain.is_rhythmic),
            in_band: count_where(results, |r| r.ar2.in_band),
            degenerate_fits: count_where(results, |r| r.ar2.degenerate.is_some()),
            ar2_rank_distribution,
            mean_modulus,
        }
    }

    /// Count for one class.
    pub fn count(&self, class: AgreementClass) -> usize {
        self.agreement.get(&class).map_or(0, |c| c.count)
    }

    /// Rate for one class.
    pub fn rate(&self, class: AgreementClass) -> f64 {
        self.agreement.get(&class).map_or(0.0, |c| c.rate)
    }
}
