// src/sources.rs

//! Helpers that run an attribution source and adapt its output in one step.

use crate::core::{Dataset, ExplainError, ExplanationConfig, Result};
use crate::explanation::Explanation;
use crate::feature_map::FeatureMap;
use crate::traits::{Attributor, GlobalAttributionSource, PredictModel};
use ndarray::Array1;
use tracing::{debug, info};

/// Explains `dataset` globally with `source`, using `dataset` as the
/// evaluation examples of the resulting explanation.
///
/// Expected values reported by the source are used unless `config` already
/// carries some.
pub fn explain_global_with<S: GlobalAttributionSource + ?Sized>(
    source: &S,
    dataset: &Dataset,
    true_labels: Option<&Array1<f64>>,
    feature_map: &FeatureMap,
    config: Option<ExplanationConfig>,
) -> Result<Explanation> {
    if let Some(labels) = true_labels {
        if labels.len() != dataset.nrows() {
            return Err(ExplainError::shape("true label count", dataset.nrows(), labels.len()));
        }
    }

    let output = source.explain_global(dataset, true_labels)?;
    let mut config = config.unwrap_or_default();
    if config.expected_values.is_none() {
        config.expected_values = output.expected_values;
    }
    info!(
        method = %config.method,
        rows = dataset.nrows(),
        "explaining evaluation set"
    );
    Explanation::create_global(&output.attributions, feature_map, Some(dataset), Some(config))
}

/// Explains selected `instances` with `source`.
pub fn explain_local_with<S: GlobalAttributionSource + ?Sized>(
    source: &S,
    instances: &Dataset,
    feature_map: &FeatureMap,
    config: Option<ExplanationConfig>,
) -> Result<Explanation> {
    let output = source.explain_local(instances)?;
    if output.attributions.n_instances() != instances.nrows() {
        return Err(ExplainError::shape(
            "attributed instances",
            instances.nrows(),
            output.attributions.n_instances(),
        ));
    }
    let mut config = config.unwrap_or_default();
    if config.expected_values.is_none() {
        config.expected_values = output.expected_values;
    }
    Explanation::create_local(&output.attributions, feature_map, Some(config))
}

/// Runs a gradient-style attributor and adapts its output into a local
/// explanation. The convergence delta, if the method reports one, is handed
/// back alongside.
pub fn attribute_with<M, A>(
    attributor: &A,
    model: &M,
    inputs: &Dataset,
    baseline: Option<&Dataset>,
    target: Option<usize>,
    feature_map: &FeatureMap,
    config: Option<ExplanationConfig>,
) -> Result<(Explanation, Option<Array1<f64>>)>
where
    M: PredictModel + ?Sized,
    A: Attributor<M> + ?Sized,
{
    if inputs.ncols() != model.num_features() {
        return Err(ExplainError::shape("model input width", model.num_features(), inputs.ncols()));
    }
    if let Some(baseline) = baseline {
        if baseline.ncols() != inputs.ncols() {
            return Err(ExplainError::shape("baseline width", inputs.ncols(), baseline.ncols()));
        }
        if baseline.nrows() != 1 && baseline.nrows() != inputs.nrows() {
            return Err(ExplainError::shape("baseline rows", inputs.nrows(), baseline.nrows()));
        }
    }

    let output = attributor.attribute(model, inputs, baseline, target)?;
    if output.attributions.n_instances() != inputs.nrows() {
        return Err(ExplainError::shape(
            "attributed instances",
            inputs.nrows(),
            output.attributions.n_instances(),
        ));
    }
    if let Some(delta) = &output.convergence_delta {
        if delta.len() != inputs.nrows() {
            return Err(ExplainError::shape("convergence delta length", inputs.nrows(), delta.len()));
        }
        let worst = delta.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()));
        debug!(max_abs_delta = worst, "attribution convergence");
    }

    let mut config = config.unwrap_or_default();
    if config.expected_values.is_none() {
        config.expected_values = output.expected_values;
    }
    let explanation = Explanation::create_local(&output.attributions, feature_map, Some(config))?;
    Ok((explanation, output.convergence_delta))
}
