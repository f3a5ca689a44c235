use std::hash::Hash;

use crate::matrix::LabeledMatrix;
use crate::testing::RowPValues;

pub mod nonparametric;

pub mod variance;

pub mod rowwise;

pub use nonparametric::Wilcoxon;
pub use rowwise::GroupAssignment;
pub use variance::{Bartlett, Center, Levene};

/// Row-wise tests on a labeled matrix using the crate's default test implementations.
///
/// Every method returns one entry per tested feature; rows whose test fails are `None`.
pub trait MatrixRowTests {
    /// Wilcoxon test of each shared feature between `self` and `other`.
    fn pairwise_test(&self, other: &LabeledMatrix, paired: bool) -> anyhow::Result<RowPValues>;

    /// Wilcoxon test of each feature between two column groups of `self`.
    fn wilcox(&self, groups: &GroupAssignment) -> anyhow::Result<RowPValues>;

    fn bartlett<L: Eq + Hash + Clone>(&self, labels: &[L]) -> anyhow::Result<RowPValues>;

    fn levene<L: Eq + Hash + Clone>(
        &self,
        labels: &[L],
        center: Center,
    ) -> anyhow::Result<RowPValues>;
}

impl MatrixRowTests for LabeledMatrix {
    fn pairwise_test(&self, other: &LabeledMatrix, paired: bool) -> anyhow::Result<RowPValues> {
        rowwise::pairwise_test(self, other, paired, &Wilcoxon)
    }

    fn wilcox(&self, groups: &GroupAssignment) -> anyhow::Result<RowPValues> {
        rowwise::wilcox_by_groups(self, groups, &Wilcoxon)
    }

    fn bartlett<L: Eq + Hash + Clone>(&self, labels: &[L]) -> anyhow::Result<RowPValues> {
        rowwise::bartlett_by_labels(self, labels)
    }

    fn levene<L: Eq + Hash + Clone>(
        &self,
        labels: &[L],
        center: Center,
    ) -> anyhow::Result<RowPValues> {
        rowwise::levene_by_labels(self, labels, center)
    }
}
