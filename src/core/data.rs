// src/core/data.rs
use crate::core::{ExplainError, Result};
use ndarray::{Array1, Array2, Array3, ArrayD, ArrayView2, Axis, Ix2, Ix3};

/// Represents a dataset (multiple instances, e.g. evaluation examples).
pub type Dataset = Array2<f64>;

/// Attribution scores produced by one explain call.
///
/// The feature axis is always the last one and indexes *engineered* features,
/// i.e. the columns the model actually consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAttribution {
    /// Shape `(n_instances, n_engineered_features)`.
    Instances(Array2<f64>),
    /// Shape `(n_classes, n_instances, n_engineered_features)`.
    PerClass(Array3<f64>),
}

impl RawAttribution {
    /// Wraps an array of unknown dimensionality, accepting exactly two or three axes.
    pub fn from_dyn(values: ArrayD<f64>) -> Result<Self> {
        match values.ndim() {
            2 => Ok(RawAttribution::Instances(values.into_dimensionality::<Ix2>()?)),
            3 => Ok(RawAttribution::PerClass(values.into_dimensionality::<Ix3>()?)),
            n => Err(ExplainError::shape(
                "attribution axes (a third, leading axis is allowed for classes)",
                2,
                n,
            )),
        }
    }

    /// Builds a two-axis attribution from row-major values.
    pub fn from_rows(n_instances: usize, n_features: usize, values: Vec<f64>) -> Result<Self> {
        Ok(RawAttribution::Instances(Array2::from_shape_vec(
            (n_instances, n_features),
            values,
        )?))
    }

    pub fn n_instances(&self) -> usize {
        match self {
            RawAttribution::Instances(a) => a.nrows(),
            RawAttribution::PerClass(a) => a.len_of(Axis(1)),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            RawAttribution::Instances(a) => a.ncols(),
            RawAttribution::PerClass(a) => a.len_of(Axis(2)),
        }
    }

    /// Number of classes, or `None` when the source collapsed the class axis.
    pub fn n_classes(&self) -> Option<usize> {
        match self {
            RawAttribution::Instances(_) => None,
            RawAttribution::PerClass(a) => Some(a.len_of(Axis(0))),
        }
    }

    /// One `(n_instances, n_features)` view per class; a single view when
    /// there is no class axis.
    pub fn class_views(&self) -> Vec<ArrayView2<'_, f64>> {
        match self {
            RawAttribution::Instances(a) => vec![a.view()],
            RawAttribution::PerClass(a) => a.outer_iter().collect(),
        }
    }

    /// Fails on the first NaN or infinite value.
    pub fn check_finite(&self) -> Result<()> {
        let position = match self {
            RawAttribution::Instances(a) => a
                .indexed_iter()
                .find(|(_, v)| !v.is_finite())
                .map(|((i, f), v)| format!("instance {}, feature {} is {}", i, f, v)),
            RawAttribution::PerClass(a) => a
                .indexed_iter()
                .find(|(_, v)| !v.is_finite())
                .map(|((c, i, f), v)| format!("class {}, instance {}, feature {} is {}", c, i, f, v)),
        };
        match position {
            Some(msg) => Err(ExplainError::InvalidAttribution(msg)),
            None => Ok(()),
        }
    }
}

impl From<Array2<f64>> for RawAttribution {
    fn from(values: Array2<f64>) -> Self {
        RawAttribution::Instances(values)
    }
}

impl From<Array3<f64>> for RawAttribution {
    fn from(values: Array3<f64>) -> Self {
        RawAttribution::PerClass(values)
    }
}

/// Everything an attribution source hands back from one call.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionOutput {
    pub attributions: RawAttribution,
    /// Per-instance approximation error reported by integral-style methods.
    pub convergence_delta: Option<Array1<f64>>,
    /// Base values, one per class (or a single value for regression).
    pub expected_values: Option<Vec<f64>>,
}

impl AttributionOutput {
    pub fn new(attributions: impl Into<RawAttribution>) -> Self {
        AttributionOutput {
            attributions: attributions.into(),
            convergence_delta: None,
            expected_values: None,
        }
    }

    pub fn with_convergence_delta(mut self, delta: Array1<f64>) -> Self {
        self.convergence_delta = Some(delta);
        self
    }

    pub fn with_expected_values(mut self, expected: Vec<f64>) -> Self {
        self.expected_values = Some(expected);
        self
    }
}
