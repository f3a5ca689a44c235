//! # omics-compare
//!
//! Feature-wise comparison utilities for omics data matrices (features × samples), used to
//! flag genes or other features as expressed, or as differentially affected between tumor
//! and normal sample groups.
//!
//! Matrices are dense and labeled: every row is a feature identifier and every column a
//! sample identifier. All alignment between inputs happens through those labels, and
//! missing values are `NaN`.
//!
//! ## Core Features
//!
//! - **Affected-sample counting**: how many tumor samples deviate from the normal baseline
//!   by more than `k` standard deviations, paired or unpaired
//! - **Row-wise testing**: Wilcoxon, Bartlett and Levene tests applied to every row, with a
//!   failing row reported as missing instead of aborting the run
//! - **Expression calls**: fraction of samples above a threshold, per feature
//! - **Multiple testing correction** for row-wise p-values
//!
//! ## Quick Start
//!
//! ```rust
//! use omics_compare::affected::{count_affected, CountAffectedOptions, Regulation};
//! use omics_compare::matrix::LabeledMatrix;
//!
//! let tumors =
//!     LabeledMatrix::from_rows(vec![vec![5.0, 1.0]], vec!["g1"], vec!["t1", "t2"]).unwrap();
//! let normals = LabeledMatrix::from_rows(
//!     vec![vec![1.0, 1.0, 1.0]],
//!     vec!["g1"],
//!     vec!["n1", "n2", "n3"],
//! )
//! .unwrap();
//!
//! let options = CountAffectedOptions::new(Regulation::Up, 1.0, false);
//! let result = count_affected(&["g1", "g2"], &tumors, &normals, &options).unwrap();
//!
//! assert_eq!(result.get("g1").unwrap().absolute, Some(1));
//! assert!(result.get("g2").unwrap().is_missing());
//! ```
//!
//! ## Module Organization
//!
//! - **[`matrix`]**: labeled matrices, single-feature vectors and ordered feature maps
//! - **[`align`]**: intersections and differences of feature and sample identifiers
//! - **[`affected`]**: the affected-sample counter
//! - **[`expression`]**: expressed / not-expressed calls
//! - **[`testing`]**: row-wise tests and multiple testing correction
//! - **[`impute`]**: missing-value handling ahead of testing
//! - **[`union`]**: unions of named sample sets

pub mod affected;
pub mod align;
pub mod expression;
pub mod impute;
pub mod matrix;
pub mod testing;
pub mod union;

pub use affected::{AffectedCounts, CountAffectedOptions, Regulation, count_affected};
pub use matrix::{FeatureMap, LabeledMatrix, LabeledVector};
pub use testing::inference::MatrixRowTests;
