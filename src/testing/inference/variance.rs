//! Equality-of-variance tests across two or more groups.

use anyhow::{anyhow, bail};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};

use crate::testing::utils::{finite_values, median, nan_mean, nan_std};
use crate::testing::{TestResult, VarianceTest};

fn observed_groups(groups: &[Vec<f64>]) -> anyhow::Result<Vec<Vec<f64>>> {
    if groups.len() < 2 {
        bail!("At least two groups are required, got {}", groups.len());
    }
    let observed: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| finite_values(g.iter().copied()))
        .collect();
    if let Some((i, g)) = observed.iter().enumerate().find(|(_, g)| g.len() < 2) {
        bail!("Group {} has {} observed values, need at least 2", i, g.len());
    }
    Ok(observed)
}

/// Bartlett's test for homogeneity of variances.
pub fn bartlett_test(groups: &[Vec<f64>]) -> anyhow::Result<TestResult> {
    let groups = observed_groups(groups)?;
    let k = groups.len() as f64;

    let sizes: Vec<f64> = groups.iter().map(|g| g.len() as f64).collect();
    let variances: Vec<f64> = groups
        .iter()
        .map(|g| {
            let sd = nan_std(g.iter().copied());
            sd * sd
        })
        .collect();

    if variances.iter().any(|v| !(*v > 0.0)) {
        bail!("Zero variance in at least one group");
    }

    let n_total: f64 = sizes.iter().sum();
    let nk = n_total - k;

    let pooled = sizes
        .iter()
        .zip(&variances)
        .map(|(n, v)| (n - 1.0) * v)
        .sum::<f64>()
        / nk;

    let numerator = nk * pooled.ln()
        - sizes
            .iter()
            .zip(&variances)
            .map(|(n, v)| (n - 1.0) * v.ln())
            .sum::<f64>();

    let sum_recip: f64 = sizes.iter().map(|n| 1.0 / (n - 1.0)).sum();
    let c = 1.0 + (sum_recip - 1.0 / nk) / (3.0 * (k - 1.0));
    let statistic = numerator / c;

    let df = k - 1.0;
    let chi2 = ChiSquared::new(df).map_err(|e| anyhow!("{:?}", e))?;
    let p_value = chi2.sf(statistic).clamp(0.0, 1.0);

    Ok(TestResult::new(statistic, p_value).with_degrees_of_freedom(df, None))
}

/// Location estimate used to centre each group in Levene's test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Center {
    /// Brown-Forsythe variant
    #[default]
    Median,
    Mean,
}

/// Levene's test for homogeneity of variances (one-way ANOVA on absolute deviations).
pub fn levene_test(groups: &[Vec<f64>], center: Center) -> anyhow::Result<TestResult> {
    let groups = observed_groups(groups)?;
    let k = groups.len() as f64;

    let deviations: Vec<Vec<f64>> = groups
        .iter()
        .map(|g| {
            let c = match center {
                Center::Median => median(g).unwrap_or(f64::NAN),
                Center::Mean => nan_mean(g.iter().copied()),
            };
            g.iter().map(|x| (x - c).abs()).collect()
        })
        .collect();

    let n_total: f64 = deviations.iter().map(|g| g.len() as f64).sum();
    let grand_mean = nan_mean(deviations.iter().flatten().copied());
    let group_means: Vec<f64> = deviations
        .iter()
        .map(|g| nan_mean(g.iter().copied()))
        .collect();

    let between: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(g, m)| g.len() as f64 * (m - grand_mean).powi(2))
        .sum();
    let within: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(g, m)| g.iter().map(|z| (z - m).powi(2)).sum::<f64>())
        .sum();

    if !(within > 0.0) {
        bail!("Zero within-group dispersion");
    }

    let df1 = k - 1.0;
    let df2 = n_total - k;
    let statistic = (df2 / df1) * between / within;

    let f_dist = FisherSnedecor::new(df1, df2).map_err(|e| anyhow!("{:?}", e))?;
    let p_value = f_dist.sf(statistic).clamp(0.0, 1.0);

    Ok(TestResult::new(statistic, p_value).with_degrees_of_freedom(df1, Some(df2)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Bartlett;

impl VarianceTest for Bartlett {
    fn p_value(&self, groups: &[Vec<f64>]) -> anyhow::Result<f64> {
        Ok(bartlett_test(groups)?.p_value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Levene {
    pub center: Center,
}

impl VarianceTest for Levene {
    fn p_value(&self, groups: &[Vec<f64>]) -> anyhow::Result<f64> {
        Ok(levene_test(groups, self.center)?.p_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bartlett_equal_spread() {
        let groups = vec![vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![6.0, 7.0, 8.0, 9.0, 10.0]];
        let result = bartlett_test(&groups).unwrap();
        assert_relative_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn bartlett_unequal_spread() {
        let groups = vec![
            vec![4.9, 5.0, 5.1, 5.0, 4.95, 5.05],
            vec![0.0, 3.0, 6.0, 9.0, 12.0, 15.0],
        ];
        assert!(bartlett_test(&groups).unwrap().p_value < 0.001);
    }

    #[test]
    fn extreme_spread_keeps_a_positive_p_value() {
        let tight: Vec<f64> = (0..50).map(|i| 5.0 + 0.001 * (i % 5) as f64).collect();
        let wide: Vec<f64> = (0..50).map(|i| 100.0 * (i % 5) as f64).collect();
        let groups = vec![tight, wide];

        let bartlett = bartlett_test(&groups).unwrap();
        assert!(bartlett.statistic > 500.0);
        assert!(bartlett.p_value > 0.0);
        assert!(bartlett.p_value < 1e-100);

        let levene = levene_test(&groups, Center::Mean).unwrap();
        assert!(levene.p_value > 0.0);
        assert!(levene.p_value < 1e-10);
    }

    #[test]
    fn bartlett_rejects_constant_group() {
        let groups = vec![vec![2.0, 2.0, 2.0], vec![1.0, 2.0, 3.0]];
        assert!(bartlett_test(&groups).is_err());
        assert!(bartlett_test(&[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn levene_equal_spread() {
        let groups = vec![vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![6.0, 7.0, 8.0, 9.0, 10.0]];
        let result = levene_test(&groups, Center::Median).unwrap();
        assert_relative_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_eq!(result.degrees_of_freedom, Some((1.0, Some(8.0))));
    }

    #[test]
    fn levene_unequal_spread() {
        let groups = vec![vec![4.5, 4.8, 5.0, 5.2, 5.5], vec![0.0, 2.0, 5.0, 8.0, 10.0]];
        assert!(levene_test(&groups, Center::Median).unwrap().p_value < 0.05);
        assert!(levene_test(&groups, Center::Mean).unwrap().p_value < 0.05);
    }

    #[test]
    fn levene_ignores_missing_values() {
        let with_nan = vec![vec![1.0, 2.0, f64::NAN, 3.0], vec![2.0, 4.0, 6.0]];
        let without = vec![vec![1.0, 2.0, 3.0], vec![2.0, 4.0, 6.0]];
        assert_relative_eq!(
            Levene::default().p_value(&with_nan).unwrap(),
            Levene::default().p_value(&without).unwrap()
        );
    }
}
