//! Walkthrough: attribute a linear model over one-hot encoded inputs, fold the
//! attributions back onto raw features and print the rankings.
//!
//! Run with `RUST_LOG=debug cargo run --example walkthrough` to see the
//! adapter's log lines.

use interpret_rs::{
    attribute_with, explain_global_with, AttributionOutput, Attributor, ColumnTransform, DashboardConsumer, Dataset,
    ExplainError, Explanation, ExplanationConfig, FeatureMap, FittedTransform, GlobalAttributionSource, ModelTask,
    PredictModel, Result, TransformSpec,
};
use ndarray::{array, Array1, Axis};
use tracing::info;

struct LinearModel {
    weights: Array1<f64>,
    bias: f64,
}

impl PredictModel for LinearModel {
    fn predict(&self, instances: &Dataset) -> Result<Array1<f64>> {
        Ok(instances.dot(&self.weights) + self.bias)
    }

    fn num_features(&self) -> usize {
        self.weights.len()
    }
}

/// `w_j * (x_j - baseline_j)`, exact for linear models.
struct InputTimesWeight;

impl Attributor<LinearModel> for InputTimesWeight {
    fn attribute(
        &self,
        model: &LinearModel,
        inputs: &Dataset,
        baseline: Option<&Dataset>,
        _target: Option<usize>,
    ) -> Result<AttributionOutput> {
        let base = match baseline {
            Some(b) => b.row(0).to_owned(),
            None => Array1::zeros(inputs.ncols()),
        };
        let attributions = (inputs - &base.view().insert_axis(Axis(0))) * &model.weights;
        let reference = model.predict(&base.clone().insert_axis(Axis(0)))?;
        let delta = attributions.sum_axis(Axis(1)) + reference[0] - model.predict(inputs)?;
        Ok(AttributionOutput::new(attributions)
            .with_convergence_delta(delta)
            .with_expected_values(vec![reference[0]]))
    }
}

/// Global source that reuses the attributor against a mean baseline.
struct MeanBaselineSource<'a> {
    model: &'a LinearModel,
}

impl GlobalAttributionSource for MeanBaselineSource<'_> {
    fn explain_global(&self, dataset: &Dataset, _true_labels: Option<&Array1<f64>>) -> Result<AttributionOutput> {
        let mean = dataset
            .mean_axis(Axis(0))
            .ok_or_else(|| ExplainError::Source("empty dataset".to_string()))?;
        InputTimesWeight.attribute(self.model, dataset, Some(&mean.insert_axis(Axis(0))), None)
    }

    fn explain_local(&self, instances: &Dataset) -> Result<AttributionOutput> {
        InputTimesWeight.attribute(self.model, instances, None, None)
    }
}

/// Prints what a dashboard would show.
struct TextDashboard;

impl DashboardConsumer for TextDashboard {
    fn render(
        &mut self,
        explanation: &Explanation,
        model: &dyn PredictModel,
        dataset: &Dataset,
        _true_labels: Option<&Array1<f64>>,
    ) -> Result<()> {
        println!("{}", explanation);
        let predictions = model.predict(dataset)?;
        for (row, prediction) in predictions.iter().enumerate() {
            let top = explanation.top_local_features(row, None, 2)?;
            println!("  row {} -> {:.3} driven by {:?}", row, prediction, top);
        }
        Ok(())
    }
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    setup_logging();

    let spec = TransformSpec::Composite(vec![
        ColumnTransform::new(["age", "fare"], FittedTransform::StandardScaler),
        ColumnTransform::new(["pclass"], FittedTransform::Passthrough),
        ColumnTransform::new(["embarked"], FittedTransform::one_hot(["C", "Q", "S"])),
    ]);
    let map = FeatureMap::build(&["age", "pclass", "fare", "embarked"], &spec)?;
    info!(raw = map.len(), engineered = map.total_width(), "feature map ready");

    // age, fare, pclass, embarked_C, embarked_Q, embarked_S
    let model = LinearModel {
        weights: array![-0.4, 0.8, -0.6, 0.3, 0.0, -0.2],
        bias: 0.1,
    };
    let data: Dataset = array![
        [1.2, -0.3, 3.0, 0.0, 0.0, 1.0],
        [-0.7, 1.9, 1.0, 1.0, 0.0, 0.0],
        [0.1, -0.5, 2.0, 0.0, 1.0, 0.0],
        [-0.6, -1.1, 3.0, 0.0, 0.0, 1.0],
    ];

    let (local, delta) = attribute_with(
        &InputTimesWeight,
        &model,
        &data,
        None,
        None,
        &map,
        Some(ExplanationConfig::default().with_method("input_x_weight")),
    )?;
    if let Some(delta) = delta {
        info!(max_abs_delta = delta.iter().fold(0.0_f64, |m, d| m.max(d.abs())), "completeness check");
    }
    println!("local ranking: {:?}", local.ranked_local_names(Some(2))?);

    let config = ExplanationConfig::default()
        .with_method("input_x_weight")
        .with_model_task(ModelTask::Regression)
        .with_retained_evaluation_examples(true);
    let source = MeanBaselineSource { model: &model };
    let global = explain_global_with(&source, &data, None, &map, Some(config))?;

    TextDashboard.render(&global, &model, &data, None)?;
    println!("{}", global.to_json()?);
    Ok(())
}
