use anyhow::{Result, anyhow};
use std::cmp::Ordering;

use crate::testing::RowPValues;

/// Multiple testing correction methods for row-wise p-value maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    Bonferroni,
    BenjaminiHochberg,
}

fn validate(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

/// Apply Bonferroni correction to p-values
///
/// Multiplies each p-value by the number of tests, capped at 1.
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Apply the Benjamini-Hochberg step-up procedure (false discovery rate).
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();

    let mut indexed_p_values: Vec<(usize, f64)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed_p_values.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min = 1.0;

    // Largest to smallest, carrying the running minimum
    for i in (0..n).rev() {
        let (orig_idx, p_val) = indexed_p_values[i];
        let rank = i + 1;
        let adjustment = (p_val * n as f64 / rank as f64).min(1.0);
        current_min = adjustment.min(current_min);
        adjusted_p_values[orig_idx] = current_min;
    }

    Ok(adjusted_p_values)
}

/// Adjust a row-wise p-value map.
///
/// Missing p-values stay missing and are not counted as tests. A map without any
/// observed p-value is returned unchanged.
pub fn adjust_p_values(p_values: &RowPValues, method: Correction) -> Result<RowPValues> {
    let observed: Vec<(usize, f64)> = p_values
        .values()
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.map(|p| (i, p)))
        .collect();

    if observed.is_empty() {
        return Ok(p_values.clone());
    }

    let raw: Vec<f64> = observed.iter().map(|&(_, p)| p).collect();
    let adjusted = match method {
        Correction::Bonferroni => bonferroni_correction(&raw)?,
        Correction::BenjaminiHochberg => benjamini_hochberg_correction(&raw)?,
    };

    let mut values = vec![None; p_values.len()];
    for (&(i, _), q) in observed.iter().zip(adjusted) {
        values[i] = Some(q);
    }
    crate::matrix::FeatureMap::from_parts(p_values.features().to_vec(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FeatureMap;
    use approx::assert_relative_eq;

    fn assert_vec_relative_eq(a: &[f64], b: &[f64], epsilon: f64) {
        assert_eq!(a.len(), b.len(), "Vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            if (x - y).abs() > epsilon {
                panic!("Vectors differ at index {}: {} != {}", i, x, y);
            }
        }
    }

    #[test]
    fn test_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03, 0.1, 0.2];
        let expected = vec![0.05, 0.1, 0.15, 0.5, 1.0];
        let adjusted = bonferroni_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_empty_input() {
        let result = benjamini_hochberg_correction(&[]);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Empty p-value array");
    }

    #[test]
    fn test_benjamini_hochberg_invalid_pvalues() {
        let result = benjamini_hochberg_correction(&[0.01, 1.5, 0.03]);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid p-value at index 1")
        );
    }

    #[test]
    fn test_benjamini_hochberg_known_values() {
        let p_values = vec![0.01, 0.04, 0.03, 0.005];
        let adjusted = benjamini_hochberg_correction(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.02, 0.04, 0.04, 0.02], 1e-12);
    }

    #[test]
    fn missing_rows_are_not_counted() {
        let p_values = FeatureMap::from_parts(
            vec!["g1".to_string(), "g2".to_string(), "g3".to_string()],
            vec![Some(0.01), None, Some(0.2)],
        )
        .unwrap();

        let adjusted = adjust_p_values(&p_values, Correction::Bonferroni).unwrap();
        assert_relative_eq!(adjusted.get("g1").unwrap().unwrap(), 0.02, epsilon = 1e-12);
        assert_eq!(adjusted.get("g2"), Some(&None));
        assert_relative_eq!(adjusted.get("g3").unwrap().unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn all_missing_is_passed_through() {
        let p_values: RowPValues = vec![("g1".to_string(), None)].into_iter().collect();
        let adjusted = adjust_p_values(&p_values, Correction::BenjaminiHochberg).unwrap();
        assert_eq!(adjusted, p_values);
    }
}
