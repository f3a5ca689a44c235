//! Counting tumor samples that deviate from a normal baseline.
//!
//! For each requested feature the counter reports how many tumor samples lie beyond
//! `stddev` standard deviations from the normal reference, in the requested direction.
//!
//! * **Paired**: per matched sample, `delta = tumor - normal`. A sample is affected when
//!   `delta - stddev * sd(delta)` is beyond zero. The relative fraction is taken over the
//!   number of matched samples.
//! * **Unpaired**: the baseline is `mean(normal) + stddev * sd(normal)` over all normal
//!   columns. A tumor sample is affected when its value is beyond that baseline. The
//!   relative fraction is taken over the number of tumor columns.
//!
//! For `Regulation::Down` the multiplier is negated and "beyond" means strictly less
//! than; for `Regulation::Up` it means strictly greater than. Means and standard
//! deviations ignore missing values, and the standard deviation uses `n - 1`.
//!
//! Features missing from either matrix keep their position in the output and are
//! reported as missing rather than zero.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use ndarray::{Array2, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::align;
use crate::matrix::{FeatureMap, LabeledMatrix, MatrixInput};
use crate::testing::utils::{nan_mean, nan_std};

/// Direction of the deviation being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Regulation {
    #[default]
    Up,
    Down,
}

impl Regulation {
    /// Multiplier with the sign that points the deviation band in this direction.
    pub fn signed_multiplier(self, stddev: f64) -> f64 {
        match self {
            Regulation::Up => stddev,
            Regulation::Down => -stddev,
        }
    }

    /// Whether `value` lies strictly beyond `bound` in this direction.
    pub fn exceeds(self, value: f64, bound: f64) -> bool {
        match self {
            Regulation::Up => value > bound,
            Regulation::Down => value < bound,
        }
    }
}

impl FromStr for Regulation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Regulation::Up),
            "down" => Ok(Regulation::Down),
            other => bail!("Unrecognized regulation '{}', expected 'up' or 'down'", other),
        }
    }
}

impl fmt::Display for Regulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regulation::Up => write!(f, "up"),
            Regulation::Down => write!(f, "down"),
        }
    }
}

/// Comparison mode actually used for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    Paired,
    Unpaired,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountAffectedOptions {
    pub regulation: Regulation,
    /// Number of standard deviations a sample must lie beyond, at least zero
    pub stddev: f64,
    /// Compare tumor samples against normals with the same identifier
    pub paired: bool,
}

impl Default for CountAffectedOptions {
    fn default() -> Self {
        CountAffectedOptions {
            regulation: Regulation::Up,
            stddev: 1.0,
            paired: true,
        }
    }
}

impl CountAffectedOptions {
    pub fn new(regulation: Regulation, stddev: f64, paired: bool) -> Self {
        CountAffectedOptions {
            regulation,
            stddev,
            paired,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.stddev.is_finite() || self.stddev < 0.0 {
            bail!(
                "Standard deviation multiplier must be a finite number >= 0, got {}",
                self.stddev
            );
        }
        Ok(())
    }
}

/// Non-fatal conditions met while aligning the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentWarning {
    /// Paired mode was requested but tumors and normals share no sample identifier.
    PairedFallback {
        tumor_samples: usize,
        normal_samples: usize,
    },
}

impl fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentWarning::PairedFallback {
                tumor_samples,
                normal_samples,
            } => write!(
                f,
                "no matched samples between {} tumor and {} normal columns, using unpaired comparison",
                tumor_samples, normal_samples
            ),
        }
    }
}

/// Count of affected samples for one feature. Both fields are `None` for missing features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffectedSummary {
    pub absolute: Option<usize>,
    /// `absolute` over the branch denominator; `None` when the denominator is zero
    pub relative: Option<f64>,
}

impl AffectedSummary {
    pub fn missing() -> Self {
        AffectedSummary {
            absolute: None,
            relative: None,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.absolute.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffectedCounts {
    /// One entry per requested feature, in request order
    pub summary: FeatureMap<AffectedSummary>,
    /// Affected sample identifiers per requested feature, in request order
    pub samples: FeatureMap<Option<BTreeSet<String>>>,
    pub mode: ComparisonMode,
    /// Matched samples when paired, tumor columns when unpaired
    pub denominator: usize,
    pub warnings: Vec<AlignmentWarning>,
}

impl AffectedCounts {
    fn empty(mode: ComparisonMode) -> Self {
        AffectedCounts {
            summary: FeatureMap::new(),
            samples: FeatureMap::new(),
            mode,
            denominator: 0,
            warnings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.summary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    pub fn get(&self, feature: &str) -> Option<&AffectedSummary> {
        self.summary.get(feature)
    }

    pub fn affected_samples(&self, feature: &str) -> Option<&BTreeSet<String>> {
        self.samples.get(feature).and_then(Option::as_ref)
    }

    /// Features with at least one affected sample.
    pub fn affected_features(&self) -> Vec<&str> {
        self.summary
            .iter()
            .filter(|(_, s)| s.absolute.is_some_and(|n| n > 0))
            .map(|(f, _)| f)
            .collect()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Sample identifiers flagged for each row of `values` by `is_affected(row, value)`.
fn flag_samples<F>(
    values: &Array2<f64>,
    samples: &[String],
    is_affected: F,
) -> Vec<BTreeSet<String>>
where
    F: Fn(usize, f64) -> bool + Sync,
{
    (0..values.nrows())
        .into_par_iter()
        .map(|row| {
            values
                .index_axis(Axis(0), row)
                .iter()
                .zip(samples)
                .filter(|&(&v, _)| is_affected(row, v))
                .map(|(_, s)| s.clone())
                .collect()
        })
        .collect()
}

fn paired_affected(
    features: &[String],
    matched: &[String],
    tumors: &LabeledMatrix,
    normals: &LabeledMatrix,
    regulation: Regulation,
    multiplier: f64,
) -> anyhow::Result<Vec<BTreeSet<String>>> {
    let tumor = tumors.select(features, matched)?;
    let normal = normals.select(features, matched)?;
    let deltas = tumor.data() - normal.data();

    let spread: Vec<f64> = deltas
        .rows()
        .into_iter()
        .map(|row| nan_std(row.iter().copied()))
        .collect();

    Ok(flag_samples(&deltas, matched, |row, delta| {
        regulation.exceeds(delta - multiplier * spread[row], 0.0)
    }))
}

fn unpaired_affected(
    features: &[String],
    tumors: &LabeledMatrix,
    normals: &LabeledMatrix,
    regulation: Regulation,
    multiplier: f64,
) -> anyhow::Result<Vec<BTreeSet<String>>> {
    let tumor = tumors.select_features(features)?;
    let normal = normals.select_features(features)?;

    let baseline: Vec<f64> = normal
        .data()
        .rows()
        .into_iter()
        .map(|row| nan_mean(row.iter().copied()) + multiplier * nan_std(row.iter().copied()))
        .collect();

    Ok(flag_samples(tumor.data(), tumor.samples(), |row, value| {
        regulation.exceeds(value, baseline[row])
    }))
}

/// Count affected tumor samples for each requested feature.
///
/// `tumors` and `normals` may each be a matrix or, when exactly one feature is requested,
/// a bare vector of that feature's values.
///
/// # Errors
///
/// Invalid options or inputs are rejected before any row is processed. Missing features
/// and the paired-to-unpaired fallback are not errors.
pub fn count_affected<'a, F, T, N>(
    features: &[F],
    tumors: T,
    normals: N,
    options: &CountAffectedOptions,
) -> anyhow::Result<AffectedCounts>
where
    F: AsRef<str>,
    T: Into<MatrixInput<'a>>,
    N: Into<MatrixInput<'a>>,
{
    options.validate()?;

    let requested_mode = if options.paired {
        ComparisonMode::Paired
    } else {
        ComparisonMode::Unpaired
    };
    if features.is_empty() {
        return Ok(AffectedCounts::empty(requested_mode));
    }

    let regulation = options.regulation;
    let multiplier = regulation.signed_multiplier(options.stddev);

    let features: Vec<String> = features.iter().map(|f| f.as_ref().to_string()).collect();
    let tumors: MatrixInput<'a> = tumors.into();
    let normals: MatrixInput<'a> = normals.into();
    let tumors = tumors.into_matrix(&features)?;
    let normals = normals.into_matrix(&features)?;

    let common = align::common_features(&features, &[&*tumors, &*normals]);
    let missing = align::difference(&features, &common);
    let matched = align::matched_samples(&tumors, &normals);

    let mut warnings = Vec::new();
    let mode = if options.paired && matched.is_empty() {
        let warning = AlignmentWarning::PairedFallback {
            tumor_samples: tumors.ncols(),
            normal_samples: normals.ncols(),
        };
        log::warn!("{}", warning);
        warnings.push(warning);
        ComparisonMode::Unpaired
    } else {
        requested_mode
    };

    log::debug!(
        "Counting {}-regulated samples for {} features ({} missing), mode {:?}",
        regulation,
        common.len(),
        missing.len(),
        mode
    );

    let (affected, denominator) = match mode {
        ComparisonMode::Paired => (
            paired_affected(&common, &matched, &tumors, &normals, regulation, multiplier)?,
            matched.len(),
        ),
        ComparisonMode::Unpaired => (
            unpaired_affected(&common, &tumors, &normals, regulation, multiplier)?,
            tumors.ncols(),
        ),
    };

    let by_feature: HashMap<&str, BTreeSet<String>> = common
        .iter()
        .map(String::as_str)
        .zip(affected)
        .collect();

    let mut summary = FeatureMap::with_capacity(features.len());
    let mut samples = FeatureMap::with_capacity(features.len());
    for feature in &features {
        match by_feature.get(feature.as_str()) {
            Some(set) => {
                let absolute = set.len();
                let relative = (denominator > 0).then(|| absolute as f64 / denominator as f64);
                summary.push(
                    feature.clone(),
                    AffectedSummary {
                        absolute: Some(absolute),
                        relative,
                    },
                );
                samples.push(feature.clone(), Some(set.clone()));
            }
            None => {
                summary.push(feature.clone(), AffectedSummary::missing());
                samples.push(feature.clone(), None);
            }
        }
    }

    Ok(AffectedCounts {
        summary,
        samples,
        mode,
        denominator,
        warnings,
    })
}
