use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use num_traits::Float;

/// Unique labels in order of first appearance.
pub fn extract_unique_groups<L>(labels: &[L]) -> Vec<L>
where
    L: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(labels.len());
    let mut unique = Vec::new();
    for label in labels {
        if seen.insert(label) {
            unique.push(label.clone());
        }
    }
    unique
}

/// Column indices for each group, aligned with `unique_groups`.
pub fn get_group_indices<L>(labels: &[L], unique_groups: &[L]) -> Vec<Vec<usize>>
where
    L: Eq + Hash,
{
    let slot: HashMap<&L, usize> = unique_groups.iter().enumerate().map(|(i, g)| (g, i)).collect();
    let mut indices = vec![Vec::new(); unique_groups.len()];
    for (col, label) in labels.iter().enumerate() {
        if let Some(&i) = slot.get(label) {
            indices[i].push(col);
        }
    }
    indices
}

/// Mean of the non-missing values, NaN when none are observed.
pub fn nan_mean<T: Float>(values: impl IntoIterator<Item = T>) -> T {
    let (sum, n) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((T::zero(), 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return T::nan();
    }
    sum / T::from(n).unwrap_or_else(T::nan)
}

/// Sample standard deviation (n - 1) of the non-missing values.
///
/// NaN when fewer than two values are observed.
pub fn nan_std<T: Float>(values: impl IntoIterator<Item = T>) -> T {
    let observed: Vec<T> = values.into_iter().filter(|v| !v.is_nan()).collect();
    let n = observed.len();
    if n < 2 {
        return T::nan();
    }
    let n_t = T::from(n).unwrap_or_else(T::nan);
    let mean = observed.iter().fold(T::zero(), |acc, &v| acc + v) / n_t;
    let ss = observed
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - mean) * (v - mean));
    (ss / (n_t - T::one())).sqrt()
}

pub fn finite_values(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values.into_iter().filter(|v| v.is_finite()).collect()
}

/// Average ranks (1-based, ties share the mean rank) and the tie group sizes.
pub fn average_ranks(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut ties = Vec::new();
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }

        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }
        if j - i > 1 {
            ties.push(j - i);
        }
        i = j;
    }

    (ranks, ties)
}

/// Σ (t³ − t) over tie group sizes.
pub fn tie_term(ties: &[usize]) -> f64 {
    ties.iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
