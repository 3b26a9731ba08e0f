// src/explanation/summary.rs

use super::{Explanation, LocalImportance, PerInstance};
use crate::core::{ModelTask, Result};
use ndarray::Axis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plain-data snapshot of an [`Explanation`], in original feature order.
///
/// This is the payload handed to dashboards and written out as JSON; absent
/// components serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationSummary {
    pub method: String,
    pub model_task: ModelTask,
    pub features: Vec<String>,
    pub num_examples: usize,
    pub classes: Option<Vec<String>>,
    pub expected_values: Option<Vec<f64>>,
    pub global_importance_values: Option<Vec<f64>>,
    pub global_importance_rank: Option<Vec<usize>>,
    pub per_class_values: Option<Vec<Vec<f64>>>,
    pub local_importance_values: Option<PerInstance<f64>>,
}

impl Explanation {
    pub fn summary(&self) -> ExplanationSummary {
        ExplanationSummary {
            method: self.method.clone(),
            model_task: self.model_task,
            features: self.features.clone(),
            num_examples: self.num_examples,
            classes: self.classes.clone(),
            expected_values: self.expected_values.clone(),
            global_importance_values: self.global.as_ref().map(|g| g.to_vec()),
            global_importance_rank: self.global_importance_rank().ok(),
            per_class_values: self
                .per_class
                .as_ref()
                .map(|p| p.outer_iter().map(|row| row.to_vec()).collect()),
            local_importance_values: self.local.as_ref().map(|local| match local {
                LocalImportance::Instances(a) => {
                    PerInstance::Instances(a.outer_iter().map(|row| row.to_vec()).collect())
                }
                LocalImportance::PerClass(a) => PerInstance::PerClass(
                    a.axis_iter(Axis(0))
                        .map(|class_rows| class_rows.outer_iter().map(|row| row.to_vec()).collect())
                        .collect(),
                ),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Explanation ({}, {}):", self.method, self.model_task)?;
        writeln!(f, "  Examples: {}", self.num_examples)?;
        if let Some(classes) = &self.classes {
            writeln!(f, "  Classes:  {}", classes.join(", "))?;
        }
        if let Ok(ranked) = self.feature_importance_dict() {
            writeln!(f, "  Global importance (ranked):")?;
            for (name, value) in ranked.iter().take(10) {
                writeln!(f, "    {:<16} {:.4}", name, value)?;
            }
            if ranked.len() > 10 {
                writeln!(f, "    ...")?;
            }
        }
        if let Some(local) = &self.local {
            writeln!(f, "  Local importance: {} instances", local.n_instances())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExplanationConfig, RawAttribution};
    use crate::feature_map::FeatureMap;
    use ndarray::{array, Array3};

    fn scenario(config: Option<ExplanationConfig>) -> Explanation {
        let map = FeatureMap::identity(&["A", "B", "C"]).unwrap();
        let raw = RawAttribution::from(array![[1.0, -2.0, 3.0], [0.0, 4.0, -1.0]]);
        Explanation::create_global(&raw, &map, None, config).unwrap()
    }

    #[test]
    fn summary_keeps_original_feature_order() {
        let summary = scenario(None).summary();
        assert_eq!(summary.features, vec!["A", "B", "C"]);
        assert_eq!(summary.global_importance_values, Some(vec![0.5, 3.0, 2.0]));
        assert_eq!(summary.global_importance_rank, Some(vec![3, 1, 2]));
        assert_eq!(summary.per_class_values, None);
        assert_eq!(
            summary.local_importance_values,
            Some(PerInstance::Instances(vec![vec![1.0, 2.0, 3.0], vec![0.0, 4.0, 1.0]]))
        );
    }

    #[test]
    fn json_round_trips_through_summary() -> Result<()> {
        let explanation = scenario(Some(ExplanationConfig::default().with_method("integrated_gradients")));
        let json = explanation.to_json()?;
        let parsed: ExplanationSummary = serde_json::from_str(&json)?;
        assert_eq!(parsed, explanation.summary());
        assert!(json.contains("\"method\": \"integrated_gradients\""));
        Ok(())
    }

    #[test]
    fn json_keeps_every_float_bit() -> Result<()> {
        let map = FeatureMap::identity(&["A", "B", "C"]).unwrap();
        let raw = RawAttribution::from(array![
            [0.07049, 2.5086897290395798, -0.1 - 0.2],
            [1.0 / 3.0, -2.0 / 7.0, 0.1 + 0.7],
        ]);
        let explanation = Explanation::create_global(&raw, &map, None, None)?;
        let parsed: ExplanationSummary = serde_json::from_str(&explanation.to_json()?)?;

        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        let before = explanation.global_importance_values()?.to_vec();
        let after = parsed.global_importance_values.clone().unwrap();
        assert_eq!(bits(&after), bits(&before));
        assert_eq!(parsed, explanation.summary());
        Ok(())
    }

    #[test]
    fn empty_per_class_local_keeps_its_variant() -> Result<()> {
        let map = FeatureMap::identity(&["A", "B", "C"]).unwrap();
        let raw = RawAttribution::from(Array3::<f64>::zeros((2, 0, 3)));
        let explanation = Explanation::create_local(&raw, &map, None)?;
        let parsed: ExplanationSummary = serde_json::from_str(&explanation.to_json()?)?;
        assert_eq!(
            parsed.local_importance_values,
            Some(PerInstance::PerClass(vec![vec![], vec![]]))
        );
        Ok(())
    }

    #[test]
    fn display_lists_ranked_features() {
        let text = scenario(Some(ExplanationConfig::default().with_method("permutation"))).to_string();
        assert!(text.starts_with("Explanation (permutation, unknown):"));
        let b = text.find("B ").unwrap();
        let a = text.find("A ").unwrap();
        assert!(b < a);
        assert!(text.contains("Local importance: 2 instances"));
    }
}
