//! Labeled dense matrices (features × samples) and ordered feature maps.
//!
//! Missing values are stored as `f64::NAN`. Row and column labels must be unique;
//! every lookup in the crate goes through the labels, never through raw positions
//! supplied by the caller.

use std::borrow::Cow;
use std::collections::HashMap;

use anyhow::{anyhow, bail};
use ndarray::{Array1, Array2, ArrayView1, Axis};

fn index_labels(labels: &[String], kind: &str) -> anyhow::Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), i).is_some() {
            bail!("Duplicate {} identifier: {}", kind, label);
        }
    }
    Ok(index)
}

/// A dense numeric matrix with unique feature (row) and sample (column) identifiers.
#[derive(Debug, Clone)]
pub struct LabeledMatrix {
    data: Array2<f64>,
    features: Vec<String>,
    samples: Vec<String>,
    feature_index: HashMap<String, usize>,
    sample_index: HashMap<String, usize>,
}

impl LabeledMatrix {
    /// Wrap an existing array.
    ///
    /// # Errors
    ///
    /// Fails if the label counts do not match the array shape or if any label is duplicated.
    pub fn new<F, S>(data: Array2<f64>, features: Vec<F>, samples: Vec<S>) -> anyhow::Result<Self>
    where
        F: Into<String>,
        S: Into<String>,
    {
        let features: Vec<String> = features.into_iter().map(Into::into).collect();
        let samples: Vec<String> = samples.into_iter().map(Into::into).collect();

        if data.nrows() != features.len() {
            bail!(
                "Feature labels ({}) do not match matrix rows ({})",
                features.len(),
                data.nrows()
            );
        }
        if data.ncols() != samples.len() {
            bail!(
                "Sample labels ({}) do not match matrix columns ({})",
                samples.len(),
                data.ncols()
            );
        }

        let feature_index = index_labels(&features, "feature")?;
        let sample_index = index_labels(&samples, "sample")?;

        Ok(LabeledMatrix {
            data,
            features,
            samples,
            feature_index,
            sample_index,
        })
    }

    /// Build a matrix from row vectors, one per feature.
    pub fn from_rows<F, S>(
        rows: Vec<Vec<f64>>,
        features: Vec<F>,
        samples: Vec<S>,
    ) -> anyhow::Result<Self>
    where
        F: Into<String>,
        S: Into<String>,
    {
        let ncols = samples.len();
        let nrows = rows.len();
        let mut flat = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                bail!("Row {} has {} values, expected {}", i, row.len(), ncols);
            }
            flat.extend(row);
        }
        let data = Array2::from_shape_vec((nrows, ncols), flat)?;
        Self::new(data, features, samples)
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn feature_position(&self, feature: &str) -> Option<usize> {
        self.feature_index.get(feature).copied()
    }

    pub fn sample_position(&self, sample: &str) -> Option<usize> {
        self.sample_index.get(sample).copied()
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.feature_index.contains_key(feature)
    }

    /// Values of one feature across all samples, in column order.
    pub fn row(&self, feature: &str) -> Option<ArrayView1<'_, f64>> {
        self.feature_position(feature).map(|i| self.data.row(i))
    }

    pub fn value(&self, feature: &str, sample: &str) -> Option<f64> {
        let row = self.feature_position(feature)?;
        let col = self.sample_position(sample)?;
        Some(self.data[[row, col]])
    }

    /// Positions of the given sample identifiers, in the requested order.
    pub fn sample_positions<S: AsRef<str>>(&self, samples: &[S]) -> anyhow::Result<Vec<usize>> {
        samples
            .iter()
            .map(|s| {
                self.sample_position(s.as_ref())
                    .ok_or_else(|| anyhow!("Unknown sample identifier: {}", s.as_ref()))
            })
            .collect()
    }

    /// Positions of the given feature identifiers, in the requested order.
    pub fn feature_positions<S: AsRef<str>>(&self, features: &[S]) -> anyhow::Result<Vec<usize>> {
        features
            .iter()
            .map(|f| {
                self.feature_position(f.as_ref())
                    .ok_or_else(|| anyhow!("Unknown feature identifier: {}", f.as_ref()))
            })
            .collect()
    }

    /// Restrict to the given features and samples, reordered as requested.
    ///
    /// # Errors
    ///
    /// Fails if any identifier is not present in the matrix.
    pub fn select<F, S>(&self, features: &[F], samples: &[S]) -> anyhow::Result<LabeledMatrix>
    where
        F: AsRef<str>,
        S: AsRef<str>,
    {
        let rows = self.feature_positions(features)?;
        let cols = self.sample_positions(samples)?;
        let data = self.data.select(Axis(0), &rows).select(Axis(1), &cols);
        LabeledMatrix::new(
            data,
            features.iter().map(|f| f.as_ref().to_string()).collect::<Vec<String>>(),
            samples.iter().map(|s| s.as_ref().to_string()).collect::<Vec<String>>(),
        )
    }

    /// Restrict to the given features, keeping every sample.
    pub fn select_features<F: AsRef<str>>(&self, features: &[F]) -> anyhow::Result<LabeledMatrix> {
        let samples = self.samples.clone();
        self.select(features, &samples)
    }

    /// Number of missing values in each row.
    pub fn missing_per_row(&self) -> Vec<usize> {
        self.data
            .rows()
            .into_iter()
            .map(|row| row.iter().filter(|v| v.is_nan()).count())
            .collect()
    }
}

/// Values of a single feature keyed by sample identifier.
#[derive(Debug, Clone)]
pub struct LabeledVector {
    values: Array1<f64>,
    samples: Vec<String>,
}

impl LabeledVector {
    pub fn new<S: Into<String>>(values: Vec<f64>, samples: Vec<S>) -> anyhow::Result<Self> {
        let samples: Vec<String> = samples.into_iter().map(Into::into).collect();
        if values.len() != samples.len() {
            bail!(
                "Vector has {} values but {} sample labels",
                values.len(),
                samples.len()
            );
        }
        index_labels(&samples, "sample")?;
        Ok(LabeledVector {
            values: Array1::from(values),
            samples,
        })
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Promote to a one-row matrix labeled with `feature`.
    pub fn into_matrix(self, feature: &str) -> anyhow::Result<LabeledMatrix> {
        let n = self.values.len();
        let data = Array2::from_shape_vec((1, n), self.values.to_vec())?;
        LabeledMatrix::new(data, vec![feature.to_string()], self.samples)
    }
}

/// Borrowed input accepted by the comparison entry points.
#[derive(Debug, Clone, Copy)]
pub enum MatrixInput<'a> {
    Matrix(&'a LabeledMatrix),
    Vector(&'a LabeledVector),
}

impl<'a> From<&'a LabeledMatrix> for MatrixInput<'a> {
    fn from(matrix: &'a LabeledMatrix) -> Self {
        MatrixInput::Matrix(matrix)
    }
}

impl<'a> From<&'a LabeledVector> for MatrixInput<'a> {
    fn from(vector: &'a LabeledVector) -> Self {
        MatrixInput::Vector(vector)
    }
}

impl<'a> MatrixInput<'a> {
    /// Normalise to a matrix. A bare vector is only meaningful for a single requested feature.
    pub fn into_matrix<F: AsRef<str>>(
        self,
        features: &[F],
    ) -> anyhow::Result<Cow<'a, LabeledMatrix>> {
        match self {
            MatrixInput::Matrix(matrix) => Ok(Cow::Borrowed(matrix)),
            MatrixInput::Vector(vector) => {
                if features.len() != 1 {
                    bail!(
                        "A single-feature vector was supplied but {} features were requested",
                        features.len()
                    );
                }
                Ok(Cow::Owned(vector.clone().into_matrix(features[0].as_ref())?))
            }
        }
    }
}

/// Feature identifier to value mapping that keeps insertion order.
///
/// A repeated identifier keeps its position and all its values, but lookups return the
/// first one.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap<V> {
    features: Vec<String>,
    values: Vec<V>,
    index: HashMap<String, usize>,
}

impl<V> Default for FeatureMap<V> {
    fn default() -> Self {
        FeatureMap {
            features: Vec::new(),
            values: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> FeatureMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FeatureMap {
            features: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Pair up features and values of equal length.
    pub fn from_parts(features: Vec<String>, values: Vec<V>) -> anyhow::Result<Self> {
        if features.len() != values.len() {
            bail!(
                "Feature count ({}) does not match value count ({})",
                features.len(),
                values.len()
            );
        }
        let mut index = HashMap::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            index.entry(feature.clone()).or_insert(i);
        }
        Ok(FeatureMap {
            features,
            values,
            index,
        })
    }

    pub fn push(&mut self, feature: impl Into<String>, value: V) {
        let feature = feature.into();
        self.index
            .entry(feature.clone())
            .or_insert(self.features.len());
        self.features.push(feature);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// First value recorded for `feature`.
    pub fn get(&self, feature: &str) -> Option<&V> {
        self.index.get(feature).map(|&i| &self.values[i])
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.features
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl<V> FromIterator<(String, V)> for FeatureMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = FeatureMap::new();
        for (feature, value) in iter {
            map.push(feature, value);
        }
        map
    }
}
