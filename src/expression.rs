//! Per-feature expressed / not-expressed calls.
//!
//! A feature is expressed when the fraction of samples whose value is strictly above
//! `threshold` reaches `cutoff`. Missing values count as samples that do not exceed the
//! threshold. A matrix without samples yields `false` for every feature.

use anyhow::{anyhow, bail};
use ndarray::ArrayView1;

use crate::matrix::{FeatureMap, LabeledMatrix};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionOptions {
    /// Value a sample must strictly exceed
    pub threshold: f64,
    /// Minimum fraction of exceeding samples, in [0, 1]
    pub cutoff: f64,
}

impl Default for ExpressionOptions {
    fn default() -> Self {
        ExpressionOptions {
            threshold: 0.0,
            cutoff: 0.5,
        }
    }
}

impl ExpressionOptions {
    pub fn new(threshold: f64, cutoff: f64) -> Self {
        ExpressionOptions { threshold, cutoff }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threshold.is_nan() {
            bail!("Expression threshold must be a number");
        }
        if !(0.0..=1.0).contains(&self.cutoff) {
            bail!("Expression cutoff must lie in [0, 1], got {}", self.cutoff);
        }
        Ok(())
    }
}

/// Fraction of values strictly above `threshold`; `None` for an empty row.
pub fn expressed_fraction(values: ArrayView1<'_, f64>, threshold: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let above = values.iter().filter(|&&v| v > threshold).count();
    Some(above as f64 / values.len() as f64)
}

fn is_expressed(values: ArrayView1<'_, f64>, options: &ExpressionOptions) -> bool {
    expressed_fraction(values, options.threshold).is_some_and(|fraction| fraction >= options.cutoff)
}

/// Expression call for a single feature.
///
/// # Errors
///
/// Fails on invalid options or when `feature` is not a row of `matrix`.
pub fn gene_expressed(
    matrix: &LabeledMatrix,
    feature: &str,
    options: &ExpressionOptions,
) -> anyhow::Result<bool> {
    options.validate()?;
    let row = matrix
        .row(feature)
        .ok_or_else(|| anyhow!("Feature not found in matrix: {}", feature))?;
    Ok(is_expressed(row, options))
}

/// Expression calls for each feature, in the order given.
///
/// Every feature is checked before any call is made, so an unknown feature fails the
/// whole request.
pub fn genes_expressed<F: AsRef<str>>(
    matrix: &LabeledMatrix,
    features: &[F],
    options: &ExpressionOptions,
) -> anyhow::Result<FeatureMap<bool>> {
    options.validate()?;
    let rows = matrix.feature_positions(features)?;

    Ok(features
        .iter()
        .zip(rows)
        .map(|(feature, row)| {
            let call = is_expressed(matrix.data().row(row), options);
            (feature.as_ref().to_string(), call)
        })
        .collect())
}
