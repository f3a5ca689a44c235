//! Handling of missing values before row-wise testing.
//!
//! Imputation itself is pluggable through [`Imputer`]. Without an imputer, every row
//! that contains any missing value is dropped; with one, the imputer decides using the
//! caller's per-row limit. [`Prepared::policy`] records which of the two happened.

use crate::matrix::LabeledMatrix;
use crate::testing::utils::nan_mean;

pub trait Imputer {
    /// Fill missing values, removing rows with more than `max_missing_per_row` gaps.
    fn impute(&self, matrix: &LabeledMatrix, max_missing_per_row: usize)
    -> anyhow::Result<LabeledMatrix>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputationPolicy {
    /// The imputer ran with the caller's limit.
    Imputed { max_missing_per_row: usize },
    /// No imputer: rows with any missing value were dropped.
    DroppedIncomplete,
}

#[derive(Debug, Clone)]
pub struct Prepared {
    pub matrix: LabeledMatrix,
    pub policy: ImputationPolicy,
    /// Features present in the input but not in `matrix`
    pub dropped: Vec<String>,
}

/// Keep only rows whose missing-value count is at most `max_missing`.
pub fn drop_rows_with_missing(
    matrix: &LabeledMatrix,
    max_missing: usize,
) -> anyhow::Result<LabeledMatrix> {
    let keep: Vec<&String> = matrix
        .features()
        .iter()
        .zip(matrix.missing_per_row())
        .filter(|&(_, n)| n <= max_missing)
        .map(|(f, _)| f)
        .collect();
    matrix.select_features(&keep)
}

/// Apply `imputer` if given, otherwise drop every incomplete row.
pub fn prepare_matrix(
    matrix: &LabeledMatrix,
    imputer: Option<&dyn Imputer>,
    max_missing_per_row: usize,
) -> anyhow::Result<Prepared> {
    let (prepared, policy) = match imputer {
        Some(imputer) => (
            imputer.impute(matrix, max_missing_per_row)?,
            ImputationPolicy::Imputed { max_missing_per_row },
        ),
        None => {
            log::debug!("No imputer supplied, dropping rows with any missing value");
            (drop_rows_with_missing(matrix, 0)?, ImputationPolicy::DroppedIncomplete)
        }
    };

    let dropped = crate::align::difference(matrix.features(), prepared.features());
    if !dropped.is_empty() {
        log::debug!("{} of {} rows removed before testing", dropped.len(), matrix.nrows());
    }

    Ok(Prepared {
        matrix: prepared,
        policy,
        dropped,
    })
}

/// Fills gaps with the mean of the observed values in the same row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowMeanImputer;

impl Imputer for RowMeanImputer {
    fn impute(
        &self,
        matrix: &LabeledMatrix,
        max_missing_per_row: usize,
    ) -> anyhow::Result<LabeledMatrix> {
        let kept = drop_rows_with_missing(matrix, max_missing_per_row)?;
        let mut data = kept.data().clone();
        for mut row in data.rows_mut() {
            let mean = nan_mean(row.iter().copied());
            row.mapv_inplace(|v| if v.is_nan() { mean } else { v });
        }
        LabeledMatrix::new(data, kept.features().to_vec(), kept.samples().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gappy() -> LabeledMatrix {
        LabeledMatrix::from_rows(
            vec![
                vec![1.0, 2.0, 3.0],
                vec![1.0, f64::NAN, 3.0],
                vec![f64::NAN, f64::NAN, 3.0],
            ],
            vec!["full", "one_gap", "two_gaps"],
            vec!["a", "b", "c"],
        )
        .unwrap()
    }

    #[test]
    fn fallback_drops_any_incomplete_row() {
        let prepared = prepare_matrix(&gappy(), None, 5).unwrap();
        assert_eq!(prepared.policy, ImputationPolicy::DroppedIncomplete);
        assert_eq!(prepared.matrix.features(), &["full".to_string()]);
        assert_eq!(prepared.dropped, vec!["one_gap", "two_gaps"]);
    }

    #[test]
    fn imputer_respects_row_limit() {
        let prepared = prepare_matrix(&gappy(), Some(&RowMeanImputer), 1).unwrap();
        assert_eq!(
            prepared.policy,
            ImputationPolicy::Imputed { max_missing_per_row: 1 }
        );
        assert_eq!(prepared.matrix.nrows(), 2);
        assert_eq!(prepared.matrix.value("one_gap", "b"), Some(2.0));
    }
}
