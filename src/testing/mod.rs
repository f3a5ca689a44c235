use crate::matrix::FeatureMap;

pub mod correction;
pub mod inference;

pub mod utils;

/// Per-feature p-values; `None` marks a row whose test could not be computed.
pub type RowPValues = FeatureMap<Option<f64>>;

#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    /// The test statistic value (e.g. U, V, Bartlett's K², Levene's W)
    pub statistic: f64,
    /// The p-value of the test
    pub p_value: f64,
    /// Degrees of freedom, where the reference distribution has them
    pub degrees_of_freedom: Option<(f64, Option<f64>)>,
    /// Standardised statistic for normal approximations
    pub z_score: Option<f64>,
}

impl TestResult {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        TestResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
            z_score: None,
        }
    }

    pub fn with_degrees_of_freedom(mut self, df1: f64, df2: Option<f64>) -> Self {
        self.degrees_of_freedom = Some((df1, df2));
        self
    }

    pub fn with_z_score(mut self, z: f64) -> Self {
        self.z_score = Some(z);
        self
    }
}

/// A two-sample location test applied to one row at a time.
///
/// Returning `Err` marks the row as not testable; the row runners turn it into a
/// missing p-value and keep going.
pub trait TwoSampleTest: Sync {
    fn p_value(&self, x: &[f64], y: &[f64], paired: bool) -> anyhow::Result<f64>;
}

/// A k-sample test for equality of variances applied to one row at a time.
pub trait VarianceTest: Sync {
    fn p_value(&self, groups: &[Vec<f64>]) -> anyhow::Result<f64>;
}

impl<F> TwoSampleTest for F
where
    F: Fn(&[f64], &[f64], bool) -> anyhow::Result<f64> + Sync,
{
    fn p_value(&self, x: &[f64], y: &[f64], paired: bool) -> anyhow::Result<f64> {
        self(x, y, paired)
    }
}
