// src/traits.rs

//! Seams to the external collaborators: models, attribution methods and
//! dashboards. Nothing in this crate implements them; callers wrap their
//! library of choice.

use crate::core::{AttributionOutput, Dataset, Result};
use crate::explanation::Explanation;
use ndarray::Array1;

/// A trained model that can score a batch of instances.
pub trait PredictModel {
    /// One prediction per row of `instances`.
    fn predict(&self, instances: &Dataset) -> Result<Array1<f64>>;

    /// Width of the rows the model consumes (engineered features).
    fn num_features(&self) -> usize;
}

/// Gradient-style attribution: explains `inputs` relative to an optional
/// `baseline`, optionally for a single output `target`.
pub trait Attributor<M: PredictModel + ?Sized> {
    fn attribute(
        &self,
        model: &M,
        inputs: &Dataset,
        baseline: Option<&Dataset>,
        target: Option<usize>,
    ) -> Result<AttributionOutput>;
}

/// Model-agnostic explainer that produces attributions over a whole
/// evaluation set or over selected instances.
pub trait GlobalAttributionSource {
    fn explain_global(&self, dataset: &Dataset, true_labels: Option<&Array1<f64>>) -> Result<AttributionOutput>;

    fn explain_local(&self, instances: &Dataset) -> Result<AttributionOutput>;
}

/// Anything that renders an explanation next to the model and data it
/// describes.
pub trait DashboardConsumer {
    fn render(
        &mut self,
        explanation: &Explanation,
        model: &dyn PredictModel,
        dataset: &Dataset,
        true_labels: Option<&Array1<f64>>,
    ) -> Result<()>;
}
