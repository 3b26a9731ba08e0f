// src/feature_map/transforms.rs

use crate::core::{ExplainError, Result};
use serde::{Deserialize, Serialize};

/// A fitted preprocessing step, reduced to the metadata needed to replay its
/// output layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedTransform {
    /// Column forwarded untouched.
    Passthrough,
    StandardScaler,
    MinMaxScaler,
    Imputer,
    /// One list of learned categories per input column, in fit order.
    OneHotEncoder { categories: Vec<Vec<String>> },
}

impl FittedTransform {
    /// One-hot encoder fitted on a single column.
    pub fn one_hot<S: Into<String>>(categories: impl IntoIterator<Item = S>) -> Self {
        FittedTransform::OneHotEncoder {
            categories: vec![categories.into_iter().map(Into::into).collect()],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FittedTransform::Passthrough => "passthrough",
            FittedTransform::StandardScaler => "standard_scaler",
            FittedTransform::MinMaxScaler => "min_max_scaler",
            FittedTransform::Imputer => "imputer",
            FittedTransform::OneHotEncoder { .. } => "one_hot_encoder",
        }
    }

    /// Engineered column names this transform emits for each of `columns`,
    /// in output order.
    pub(crate) fn output_names(&self, columns: &[String]) -> Result<Vec<Vec<String>>> {
        match self {
            FittedTransform::Passthrough
            | FittedTransform::StandardScaler
            | FittedTransform::MinMaxScaler
            | FittedTransform::Imputer => Ok(columns.iter().map(|c| vec![c.clone()]).collect()),
            FittedTransform::OneHotEncoder { categories } => {
                if categories.len() != columns.len() {
                    return Err(ExplainError::Configuration(format!(
                        "one_hot_encoder over {:?} carries {} category lists for {} columns",
                        columns,
                        categories.len(),
                        columns.len()
                    )));
                }
                let mut outputs = Vec::with_capacity(columns.len());
                for (column, cats) in columns.iter().zip(categories) {
                    if cats.is_empty() {
                        return Err(ExplainError::Configuration(format!(
                            "one_hot_encoder learned no categories for '{}'",
                            column
                        )));
                    }
                    outputs.push(cats.iter().map(|cat| format!("{}_{}", column, cat)).collect());
                }
                Ok(outputs)
            }
        }
    }
}

/// A fitted transform applied to one or more raw columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransform {
    pub columns: Vec<String>,
    pub transform: FittedTransform,
}

impl ColumnTransform {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, transform: FittedTransform) -> Self {
        ColumnTransform {
            columns: columns.into_iter().map(Into::into).collect(),
            transform,
        }
    }
}

/// How the engineered columns were produced from the raw ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSpec {
    /// Column-transformer style: blocks emit their outputs in order, each
    /// block emitting column by column.
    Composite(Vec<ColumnTransform>),
    /// Explicit `(raw feature, fitted transform)` pairs, replayed in order.
    PerFeature(Vec<(String, FittedTransform)>),
}

impl TransformSpec {
    /// The blocks to replay, in output order.
    pub(crate) fn blocks(&self) -> Vec<ColumnTransform> {
        match self {
            TransformSpec::Composite(blocks) => blocks.clone(),
            TransformSpec::PerFeature(pairs) => pairs
                .iter()
                .map(|(name, transform)| ColumnTransform::new([name.clone()], transform.clone()))
                .collect(),
        }
    }
}
