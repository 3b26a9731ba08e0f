// src/explanation/mod.rs

//! Read-only explanation objects built from attribution arrays.
//!
//! An [`Explanation`] aggregates engineered-feature attributions to raw
//! features through a [`FeatureMap`]. Aggregation always takes absolute
//! values first, so positive and negative contributions of the columns of a
//! one-hot group add up instead of cancelling:
//!
//! ```text
//! local[i, g]  = sum over e in group g of |a[i, e]|
//! global[g]    = mean over i of local[i, g]
//! ```
//!
//! With a class axis the same is done per class, and the overall global
//! importance is the unweighted mean of the per-class global importances.
//!
//! Every shape check happens in [`Explanation::create_global`] and
//! [`Explanation::create_local`]; queries never fail on shapes, only on
//! components the explanation does not carry.

mod ranking;
mod summary;

pub use ranking::PerInstance;
pub use summary::ExplanationSummary;

use crate::core::{Dataset, ExplainError, ExplanationConfig, ModelTask, RawAttribution, Result};
use crate::feature_map::FeatureMap;
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use static_assertions::assert_impl_all;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Per-instance importances per raw feature.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalImportance {
    /// Shape `(n_instances, n_raw_features)`.
    Instances(Array2<f64>),
    /// Shape `(n_classes, n_instances, n_raw_features)`.
    PerClass(Array3<f64>),
}

impl LocalImportance {
    pub fn n_instances(&self) -> usize {
        match self {
            LocalImportance::Instances(a) => a.nrows(),
            LocalImportance::PerClass(a) => a.len_of(Axis(1)),
        }
    }
}

#[derive(Debug)]
pub struct Explanation {
    features: Vec<String>,
    global: Option<Array1<f64>>,
    // (n_classes, n_features)
    per_class: Option<Array2<f64>>,
    local: Option<LocalImportance>,
    num_examples: usize,
    num_classes: Option<usize>,
    classes: Option<Vec<String>>,
    expected_values: Option<Vec<f64>>,
    method: String,
    model_task: ModelTask,
    evaluation_examples: Option<Dataset>,
    global_order: OnceLock<Vec<usize>>,
    per_class_order: OnceLock<Vec<Vec<usize>>>,
}

assert_impl_all!(Explanation: Send, Sync);

impl Explanation {
    /// Builds an explanation with global importances (and per-class ones when
    /// `raw` has a class axis).
    ///
    /// Local importances are kept as well unless `config.include_local` is
    /// off. When `evaluation_examples` is given its row count must equal the
    /// number of attributed instances.
    pub fn create_global(
        raw: &RawAttribution,
        feature_map: &FeatureMap,
        evaluation_examples: Option<&Dataset>,
        config: Option<ExplanationConfig>,
    ) -> Result<Self> {
        let config = config.unwrap_or_default();
        validate(raw, feature_map, &config)?;

        let n_instances = raw.n_instances();
        if n_instances == 0 {
            return Err(ExplainError::shape("attributed instances (at least one)", 1, 0));
        }
        if let Some(examples) = evaluation_examples {
            if examples.nrows() != n_instances {
                return Err(ExplainError::shape(
                    "evaluation example rows",
                    n_instances,
                    examples.nrows(),
                ));
            }
        }

        let (local, per_class_local) = aggregate(raw, feature_map)?;
        let mut class_globals = Vec::with_capacity(per_class_local.len());
        for grouped in &per_class_local {
            class_globals.push(mean_over_rows(grouped)?);
        }

        let (global, per_class) = match raw.n_classes() {
            None => (class_globals.swap_remove(0), None),
            Some(_) => {
                let views: Vec<ArrayView1<'_, f64>> = class_globals.iter().map(|g| g.view()).collect();
                let per_class = ndarray::stack(Axis(0), &views)?;
                let global = mean_over_rows(&per_class)?;
                (global, Some(per_class))
            }
        };

        if global.iter().all(|&v| v == 0.0) && !global.is_empty() {
            warn!(method = %config.method, "every global importance is zero");
        }
        debug!(
            method = %config.method,
            instances = n_instances,
            raw_features = feature_map.len(),
            classes = ?raw.n_classes(),
            "created global explanation"
        );

        Ok(Explanation {
            features: owned_names(feature_map),
            global: Some(global),
            per_class,
            local: config.include_local.then_some(local),
            num_examples: n_instances,
            num_classes: raw.n_classes(),
            evaluation_examples: evaluation_examples
                .filter(|_| config.retain_evaluation_examples)
                .cloned(),
            classes: config.classes,
            expected_values: config.expected_values,
            method: config.method,
            model_task: config.model_task,
            global_order: OnceLock::new(),
            per_class_order: OnceLock::new(),
        })
    }

    /// Builds an explanation carrying only per-instance importances.
    pub fn create_local(
        raw: &RawAttribution,
        feature_map: &FeatureMap,
        config: Option<ExplanationConfig>,
    ) -> Result<Self> {
        let config = config.unwrap_or_default();
        validate(raw, feature_map, &config)?;

        let (local, _) = aggregate(raw, feature_map)?;
        debug!(
            method = %config.method,
            instances = raw.n_instances(),
            raw_features = feature_map.len(),
            "created local explanation"
        );

        Ok(Explanation {
            features: owned_names(feature_map),
            global: None,
            per_class: None,
            local: Some(local),
            num_examples: raw.n_instances(),
            num_classes: raw.n_classes(),
            evaluation_examples: None,
            classes: config.classes,
            expected_values: config.expected_values,
            method: config.method,
            model_task: config.model_task,
            global_order: OnceLock::new(),
            per_class_order: OnceLock::new(),
        })
    }

    /// Raw feature names in original input order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn num_examples(&self) -> usize {
        self.num_examples
    }

    pub fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    pub fn classes(&self) -> Option<&[String]> {
        self.classes.as_deref()
    }

    pub fn expected_values(&self) -> Option<&[f64]> {
        self.expected_values.as_deref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn model_task(&self) -> ModelTask {
        self.model_task
    }

    pub fn evaluation_examples(&self) -> Option<&Dataset> {
        self.evaluation_examples.as_ref()
    }

    pub fn is_global(&self) -> bool {
        self.global.is_some()
    }

    pub fn is_local(&self) -> bool {
        self.local.is_some()
    }

    /// Global importance per raw feature, in original input order.
    pub fn global_importance_values(&self) -> Result<&Array1<f64>> {
        self.global.as_ref().ok_or_else(|| no_global("global importance values"))
    }

    /// `(n_classes, n_features)` global importances, in original input order.
    pub fn per_class_values(&self) -> Result<&Array2<f64>> {
        match (&self.per_class, &self.global) {
            (Some(per_class), _) => Ok(per_class),
            (None, Some(_)) => Err(ExplainError::UnsupportedOperation(
                "per-class values need attributions with a class axis".to_string(),
            )),
            (None, None) => Err(no_global("per-class values")),
        }
    }

    pub fn local_importance_values(&self) -> Result<&LocalImportance> {
        self.local.as_ref().ok_or_else(|| {
            ExplainError::UnsupportedOperation(
                "local importance values are not available on this explanation".to_string(),
            )
        })
    }
}

fn no_global(what: &str) -> ExplainError {
    ExplainError::UnsupportedOperation(format!(
        "{} are not available on a local-only explanation",
        what
    ))
}

fn owned_names(feature_map: &FeatureMap) -> Vec<String> {
    feature_map.raw_names().into_iter().map(str::to_string).collect()
}

fn validate(raw: &RawAttribution, feature_map: &FeatureMap, config: &ExplanationConfig) -> Result<()> {
    if raw.n_features() != feature_map.total_width() {
        return Err(ExplainError::shape(
            "attribution feature dimension",
            feature_map.total_width(),
            raw.n_features(),
        ));
    }
    if raw.n_classes() == Some(0) {
        return Err(ExplainError::shape("class axis (at least one class)", 1, 0));
    }
    raw.check_finite()?;

    if let (Some(classes), Some(n_classes)) = (&config.classes, raw.n_classes()) {
        if classes.len() != n_classes {
            return Err(ExplainError::Configuration(format!(
                "{} class labels given for {} attributed classes",
                classes.len(),
                n_classes
            )));
        }
    }
    if let Some(expected) = &config.expected_values {
        let n_outputs = raw.n_classes().unwrap_or(1);
        if expected.len() != 1 && expected.len() != n_outputs {
            return Err(ExplainError::shape("expected values", n_outputs, expected.len()));
        }
    }
    Ok(())
}

/// Grouped local importances, plus the same split into one
/// `(n_instances, n_raw)` array per class (a single array without a class axis).
fn aggregate(raw: &RawAttribution, feature_map: &FeatureMap) -> Result<(LocalImportance, Vec<Array2<f64>>)> {
    let mut per_class = Vec::new();
    for view in raw.class_views() {
        per_class.push(feature_map.aggregate_abs(view)?);
    }
    let local = match raw.n_classes() {
        None => LocalImportance::Instances(per_class[0].clone()),
        Some(_) => {
            let views: Vec<_> = per_class.iter().map(|a| a.view()).collect();
            LocalImportance::PerClass(ndarray::stack(Axis(0), &views)?)
        }
    };
    Ok((local, per_class))
}

fn mean_over_rows(grouped: &Array2<f64>) -> Result<Array1<f64>> {
    grouped
        .mean_axis(Axis(0))
        .ok_or_else(|| ExplainError::shape("rows to average (at least one)", 1, 0))
}
