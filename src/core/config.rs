// src/core/config.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the explained model predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTask {
    Classification,
    Regression,
    #[default]
    Unknown,
}

impl fmt::Display for ModelTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelTask::Classification => "classification",
            ModelTask::Regression => "regression",
            ModelTask::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Options attached to an explanation when it is built.
///
/// None of these change the aggregation arithmetic; they decide which
/// components are kept and which metadata travels with the explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplanationConfig {
    /// Name of the attribution method that produced the values, e.g.
    /// `"integrated_gradients"` or `"permutation"`.
    pub method: String,
    pub model_task: ModelTask,
    /// Class labels; when set its length must equal the class axis length.
    pub classes: Option<Vec<String>>,
    /// Base values, one per class or a single value.
    pub expected_values: Option<Vec<f64>>,
    /// Keep per-instance importances on global explanations.
    pub include_local: bool,
    /// Keep a copy of the evaluation examples for dashboard consumers.
    pub retain_evaluation_examples: bool,
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        ExplanationConfig {
            method: "unknown".to_string(),
            model_task: ModelTask::Unknown,
            classes: None,
            expected_values: None,
            include_local: true,
            retain_evaluation_examples: false,
        }
    }
}

impl ExplanationConfig {
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_model_task(mut self, task: ModelTask) -> Self {
        self.model_task = task;
        self
    }

    pub fn with_classes<S: Into<String>>(mut self, classes: impl IntoIterator<Item = S>) -> Self {
        self.classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_expected_values(mut self, expected: Vec<f64>) -> Self {
        self.expected_values = Some(expected);
        self
    }

    pub fn with_include_local(mut self, include: bool) -> Self {
        self.include_local = include;
        self
    }

    pub fn with_retained_evaluation_examples(mut self, retain: bool) -> Self {
        self.retain_evaluation_examples = retain;
        self
    }
}
