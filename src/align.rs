//! Set operations over feature and sample identifiers.
//!
//! All functions keep the order of their first argument and drop duplicates, so the
//! same inputs always produce the same column and row order downstream.

use std::collections::HashSet;

use crate::matrix::LabeledMatrix;

/// Items of `left` that also occur in `right`, in `left` order.
pub fn intersect<A, B>(left: &[A], right: &[B]) -> Vec<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let right: HashSet<&str> = right.iter().map(AsRef::as_ref).collect();
    let mut seen = HashSet::with_capacity(left.len());
    left.iter()
        .map(AsRef::as_ref)
        .filter(|item| right.contains(item) && seen.insert(*item))
        .map(str::to_string)
        .collect()
}

/// Items of `left` that do not occur in `right`, in `left` order.
pub fn difference<A, B>(left: &[A], right: &[B]) -> Vec<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let right: HashSet<&str> = right.iter().map(AsRef::as_ref).collect();
    let mut seen = HashSet::with_capacity(left.len());
    left.iter()
        .map(AsRef::as_ref)
        .filter(|item| !right.contains(item) && seen.insert(*item))
        .map(str::to_string)
        .collect()
}

/// Requested features present as rows in every matrix.
pub fn common_features<F: AsRef<str>>(features: &[F], matrices: &[&LabeledMatrix]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(features.len());
    features
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| matrices.iter().all(|m| m.has_feature(f)) && seen.insert(*f))
        .map(str::to_string)
        .collect()
}

/// Features shared by the row labels of both matrices, in `left` row order.
pub fn shared_features(left: &LabeledMatrix, right: &LabeledMatrix) -> Vec<String> {
    intersect(left.features(), right.features())
}

/// Sample identifiers present as columns in both matrices, in `left` column order.
pub fn matched_samples(left: &LabeledMatrix, right: &LabeledMatrix) -> Vec<String> {
    intersect(left.samples(), right.samples())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_keeps_left_order() {
        assert_eq!(intersect(&["c", "a", "b"], &["b", "c"]), vec!["c", "b"]);
    }

    #[test]
    fn difference_drops_duplicates() {
        assert_eq!(difference(&["x", "a", "x"], &["a"]), vec!["x"]);
    }

    #[test]
    fn common_features_requires_every_matrix() {
        let a = LabeledMatrix::from_rows(vec![vec![1.0], vec![2.0]], vec!["g1", "g2"], vec!["s"])
            .unwrap();
        let b = LabeledMatrix::from_rows(vec![vec![1.0]], vec!["g2"], vec!["s"]).unwrap();
        assert_eq!(common_features(&["g1", "g2", "g3"], &[&a, &b]), vec!["g2"]);
        assert_eq!(matched_samples(&a, &b), vec!["s"]);
    }
}
