//! Row-wise application of two-sample and variance tests over labeled matrices.
//!
//! Each row is tested independently. A failing row yields `None` for that feature
//! and never aborts the run.

use std::hash::Hash;

use anyhow::bail;
use ndarray::{Array2, Axis};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::align;
use crate::matrix::LabeledMatrix;
use crate::testing::inference::variance::{Bartlett, Center, Levene};
use crate::testing::utils::{extract_unique_groups, get_group_indices};
use crate::testing::{RowPValues, TwoSampleTest, VarianceTest};

/// How the columns of one matrix are split into the two compared groups.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupAssignment {
    /// Two independent groups of sample identifiers.
    Unpaired { group1: Vec<String>, group2: Vec<String> },
    /// Matched samples: each pair is (group 1 sample, group 2 sample).
    Paired { pairs: Vec<(String, String)> },
}

impl GroupAssignment {
    pub fn unpaired<A: Into<String>, B: Into<String>>(group1: Vec<A>, group2: Vec<B>) -> Self {
        GroupAssignment::Unpaired {
            group1: group1.into_iter().map(Into::into).collect(),
            group2: group2.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paired<A: Into<String>, B: Into<String>>(pairs: Vec<(A, B)>) -> Self {
        GroupAssignment::Paired {
            pairs: pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect(),
        }
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, GroupAssignment::Paired { .. })
    }
}

/// Run `test_row` over every row, turning errors into missing values.
fn run_rows<F>(features: &[String], test_row: F) -> RowPValues
where
    F: Fn(usize) -> anyhow::Result<f64> + Sync,
{
    let values: Vec<Option<f64>> = (0..features.len())
        .into_par_iter()
        .map(|row| match test_row(row) {
            Ok(p) if p.is_finite() => Some(p),
            Ok(p) => {
                log::trace!("Row {} produced a non-finite p-value ({})", features[row], p);
                None
            }
            Err(e) => {
                log::trace!("Row {} could not be tested: {}", features[row], e);
                None
            }
        })
        .collect();

    let failed = values.iter().filter(|p| p.is_none()).count();
    log::debug!("Tested {} rows, {} without a result", features.len(), failed);

    features.iter().cloned().zip(values).collect()
}

fn row_vec(data: &Array2<f64>, row: usize) -> Vec<f64> {
    data.index_axis(Axis(0), row).to_vec()
}

/// Compare every shared feature of two matrices.
///
/// Unpaired: all columns of each matrix form the two groups. Paired: both matrices are
/// restricted to their shared sample identifiers, in `matrix1` column order. Output keys
/// are the features present in both matrices, in `matrix1` row order.
pub fn pairwise_test<T: TwoSampleTest + ?Sized>(
    matrix1: &LabeledMatrix,
    matrix2: &LabeledMatrix,
    paired: bool,
    test: &T,
) -> anyhow::Result<RowPValues> {
    let features = align::shared_features(matrix1, matrix2);

    let (x, y) = if paired {
        let samples = align::matched_samples(matrix1, matrix2);
        if samples.is_empty() {
            log::warn!("Paired test requested but the matrices share no sample identifiers");
        }
        (
            matrix1.select(&features, &samples)?,
            matrix2.select(&features, &samples)?,
        )
    } else {
        (
            matrix1.select_features(&features)?,
            matrix2.select_features(&features)?,
        )
    };

    let (x, y) = (x.data(), y.data());
    Ok(run_rows(&features, |row| {
        test.p_value(&row_vec(x, row), &row_vec(y, row), paired)
    }))
}

/// Compare two groups of columns within one matrix, for every row.
///
/// Sample identifiers absent from the matrix are ignored; for paired assignments a pair is
/// kept only when both of its samples are present.
pub fn wilcox_by_groups<T: TwoSampleTest + ?Sized>(
    matrix: &LabeledMatrix,
    groups: &GroupAssignment,
    test: &T,
) -> anyhow::Result<RowPValues> {
    let present = |ids: &Vec<String>| -> Vec<usize> {
        ids.iter().filter_map(|s| matrix.sample_position(s)).collect()
    };

    let (cols1, cols2): (Vec<usize>, Vec<usize>) = match groups {
        GroupAssignment::Unpaired { group1, group2 } => (present(group1), present(group2)),
        GroupAssignment::Paired { pairs } => pairs
            .iter()
            .filter_map(|(a, b)| Some((matrix.sample_position(a)?, matrix.sample_position(b)?)))
            .unzip(),
    };

    let paired = groups.is_paired();
    let x = matrix.data().select(Axis(1), &cols1);
    let y = matrix.data().select(Axis(1), &cols2);

    Ok(run_rows(matrix.features(), |row| {
        test.p_value(&row_vec(&x, row), &row_vec(&y, row), paired)
    }))
}

/// Run a variance-equality test for every row, grouping columns by `labels`.
///
/// # Errors
///
/// Fails if `labels` does not have one entry per matrix column.
pub fn variance_by_labels<L, T>(
    matrix: &LabeledMatrix,
    labels: &[L],
    test: &T,
) -> anyhow::Result<RowPValues>
where
    L: Eq + Hash + Clone,
    T: VarianceTest + ?Sized,
{
    if labels.len() != matrix.ncols() {
        bail!(
            "Group labels ({}) do not match matrix columns ({})",
            labels.len(),
            matrix.ncols()
        );
    }

    let unique = extract_unique_groups(labels);
    let indices = get_group_indices(labels, &unique);
    let data = matrix.data();

    Ok(run_rows(matrix.features(), |row| {
        let values = data.index_axis(Axis(0), row);
        let groups: Vec<Vec<f64>> = indices
            .iter()
            .map(|cols| cols.iter().map(|&c| values[c]).collect())
            .collect();
        test.p_value(&groups)
    }))
}

/// Bartlett's test for every row.
pub fn bartlett_by_labels<L>(matrix: &LabeledMatrix, labels: &[L]) -> anyhow::Result<RowPValues>
where
    L: Eq + Hash + Clone,
{
    variance_by_labels(matrix, labels, &Bartlett)
}

/// Levene's test for every row.
pub fn levene_by_labels<L>(
    matrix: &LabeledMatrix,
    labels: &[L],
    center: Center,
) -> anyhow::Result<RowPValues>
where
    L: Eq + Hash + Clone,
{
    variance_by_labels(matrix, labels, &Levene { center })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::inference::nonparametric::Wilcoxon;

    #[test]
    fn failures_stay_local_to_their_row() {
        let m = LabeledMatrix::from_rows(
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 5.0, 5.0, 5.0]],
            vec!["ok", "flat"],
            vec!["a", "b", "c", "d"],
        )
        .unwrap();
        let groups = GroupAssignment::unpaired(vec!["a", "b"], vec!["c", "d"]);
        let result = wilcox_by_groups(&m, &groups, &Wilcoxon).unwrap();
        assert_eq!(result.features(), m.features());
        assert!(result.get("ok").unwrap().is_some());
        assert_eq!(result.get("flat"), Some(&None));
    }

    #[test]
    fn label_length_must_match_columns() {
        let m = LabeledMatrix::from_rows(vec![vec![1.0, 2.0]], vec!["g"], vec!["a", "b"]).unwrap();
        assert!(variance_by_labels(&m, &[1, 2, 3], &Bartlett).is_err());
    }
}
