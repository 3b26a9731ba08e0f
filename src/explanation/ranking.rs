// src/explanation/ranking.rs

use super::{Explanation, LocalImportance};
use crate::core::{ExplainError, Result};
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Per-instance results, with an outer class axis when the attributions had one.
///
/// Serialized externally tagged (`{"per_class": [...]}`) so that empty
/// components keep their variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerInstance<T> {
    /// `[instance][feature]`
    Instances(Vec<Vec<T>>),
    /// `[class][instance][feature]`
    PerClass(Vec<Vec<Vec<T>>>),
}

/// Positions of `values` ordered by descending magnitude. Equal magnitudes
/// keep their original relative order.
fn descending_order(values: ArrayView1<'_, f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable
    order.sort_by(|&a, &b| values[b].abs().total_cmp(&values[a].abs()));
    order
}

/// 1-based rank of each position, given the ranked order of positions.
fn ranks_from_order(order: &[usize]) -> Vec<usize> {
    let mut ranks = vec![0; order.len()];
    for (rank, &position) in order.iter().enumerate() {
        ranks[position] = rank + 1;
    }
    ranks
}

fn truncate(order: &[usize], top_k: Option<usize>) -> &[usize] {
    match top_k {
        Some(k) if k < order.len() => &order[..k],
        _ => order,
    }
}

fn rank_rows<T>(
    rows: ArrayView2<'_, f64>,
    top_k: Option<usize>,
    pick: &impl Fn(ArrayView1<'_, f64>, usize) -> T,
) -> Vec<Vec<T>> {
    rows.outer_iter()
        .map(|row| {
            let order = descending_order(row);
            truncate(&order, top_k).iter().map(|&i| pick(row, i)).collect()
        })
        .collect()
}

impl Explanation {
    fn global_positions(&self) -> Result<&[usize]> {
        let global = self.global_importance_values()?;
        let order = self.global_order.get_or_init(|| {
            trace!(features = global.len(), "ranking global importances");
            descending_order(global.view())
        });
        Ok(order.as_slice())
    }

    fn per_class_positions(&self) -> Result<&[Vec<usize>]> {
        let per_class = self.per_class_values()?;
        let orders = self.per_class_order.get_or_init(|| {
            trace!(classes = per_class.nrows(), "ranking per-class importances");
            per_class.outer_iter().map(descending_order).collect()
        });
        Ok(orders.as_slice())
    }

    /// Global importances, highest first. Ties keep raw feature order.
    pub fn ranked_global_values(&self, top_k: Option<usize>) -> Result<Vec<f64>> {
        let global = self.global_importance_values()?;
        let order = self.global_positions()?;
        Ok(truncate(order, top_k).iter().map(|&i| global[i]).collect())
    }

    /// Raw feature names in the order of [`Explanation::ranked_global_values`].
    pub fn ranked_global_names(&self, top_k: Option<usize>) -> Result<Vec<String>> {
        let order = self.global_positions()?;
        Ok(truncate(order, top_k)
            .iter()
            .map(|&i| self.features[i].clone())
            .collect())
    }

    /// Global importances ranked independently for each class.
    pub fn ranked_per_class_values(&self, top_k: Option<usize>) -> Result<Vec<Vec<f64>>> {
        let per_class = self.per_class_values()?;
        let orders = self.per_class_positions()?;
        Ok(orders
            .iter()
            .zip(per_class.outer_iter())
            .map(|(order, values)| truncate(order, top_k).iter().map(|&i| values[i]).collect())
            .collect())
    }

    pub fn ranked_per_class_names(&self, top_k: Option<usize>) -> Result<Vec<Vec<String>>> {
        let orders = self.per_class_positions()?;
        Ok(orders
            .iter()
            .map(|order| {
                truncate(order, top_k)
                    .iter()
                    .map(|&i| self.features[i].clone())
                    .collect()
            })
            .collect())
    }

    /// Each instance's importances, highest first.
    pub fn ranked_local_values(&self, top_k: Option<usize>) -> Result<PerInstance<f64>> {
        self.rank_local(top_k, |row, i| row[i])
    }

    /// Raw feature names in the order of [`Explanation::ranked_local_values`].
    pub fn ranked_local_names(&self, top_k: Option<usize>) -> Result<PerInstance<String>> {
        self.rank_local(top_k, |_, i| self.features[i].clone())
    }

    fn rank_local<T>(
        &self,
        top_k: Option<usize>,
        pick: impl Fn(ArrayView1<'_, f64>, usize) -> T,
    ) -> Result<PerInstance<T>> {
        Ok(match self.local_importance_values()? {
            LocalImportance::Instances(local) => PerInstance::Instances(rank_rows(local.view(), top_k, &pick)),
            LocalImportance::PerClass(local) => PerInstance::PerClass(
                local
                    .axis_iter(Axis(0))
                    .map(|class_rows| rank_rows(class_rows, top_k, &pick))
                    .collect(),
            ),
        })
    }

    /// Raw feature name to global importance, highest importance first.
    pub fn feature_importance_dict(&self) -> Result<Vec<(String, f64)>> {
        let names = self.ranked_global_names(None)?;
        let values = self.ranked_global_values(None)?;
        Ok(names.into_iter().zip(values).collect())
    }

    /// For each raw feature in original input order, its 1-based rank by
    /// global importance. Always a permutation of `1..=num_features()`.
    pub fn global_importance_rank(&self) -> Result<Vec<usize>> {
        Ok(ranks_from_order(self.global_positions()?))
    }

    /// The `k` most important raw features for one instance (and class, when
    /// there is a class axis).
    pub fn top_local_features(&self, instance: usize, class: Option<usize>, k: usize) -> Result<Vec<(String, f64)>> {
        let local = self.local_importance_values()?;
        let rows = match (local, class) {
            (LocalImportance::Instances(a), None) => a.view(),
            (LocalImportance::PerClass(a), Some(c)) if c < a.len_of(Axis(0)) => a.index_axis(Axis(0), c),
            (LocalImportance::PerClass(a), Some(c)) => {
                return Err(ExplainError::shape("class index bound", a.len_of(Axis(0)), c))
            }
            (LocalImportance::Instances(_), Some(_)) => {
                return Err(ExplainError::UnsupportedOperation(
                    "class index given but the attributions have no class axis".to_string(),
                ))
            }
            (LocalImportance::PerClass(_), None) => {
                return Err(ExplainError::UnsupportedOperation(
                    "a class index is required when attributions have a class axis".to_string(),
                ))
            }
        };
        if instance >= rows.nrows() {
            return Err(ExplainError::shape("instance index bound", rows.nrows(), instance));
        }
        let row = rows.row(instance);
        Ok(truncate(&descending_order(row), Some(k))
            .iter()
            .map(|&i| (self.features[i].clone(), row[i]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExplanationConfig, RawAttribution};
    use crate::feature_map::FeatureMap;
    use ndarray::{array, Array3};
    use pretty_assertions::assert_eq;

    fn abc() -> FeatureMap {
        FeatureMap::identity(&["A", "B", "C"]).unwrap()
    }

    fn scenario() -> Explanation {
        let raw = RawAttribution::from(array![[1.0, -2.0, 3.0], [0.0, 4.0, -1.0]]);
        Explanation::create_global(&raw, &abc(), None, None).unwrap()
    }

    #[test]
    fn ranked_global_matches_worked_example() -> Result<()> {
        let explanation = scenario();
        assert_eq!(explanation.ranked_global_values(None)?, vec![3.0, 2.0, 0.5]);
        assert_eq!(explanation.ranked_global_names(None)?, vec!["B", "C", "A"]);
        Ok(())
    }

    #[test]
    fn importance_dict_iterates_in_ranked_order() -> Result<()> {
        let dict = scenario().feature_importance_dict()?;
        assert_eq!(
            dict,
            vec![("B".to_string(), 3.0), ("C".to_string(), 2.0), ("A".to_string(), 0.5)]
        );
        Ok(())
    }

    #[test]
    fn global_rank_is_in_original_order() -> Result<()> {
        assert_eq!(scenario().global_importance_rank()?, vec![3, 1, 2]);
        Ok(())
    }

    #[test]
    fn ties_keep_input_order() -> Result<()> {
        let map = FeatureMap::identity(&["w", "x", "y", "z"])?;
        let raw = RawAttribution::from(array![[1.0, -2.0, 2.0, 1.0]]);
        let explanation = Explanation::create_global(&raw, &map, None, None)?;
        assert_eq!(explanation.ranked_global_names(None)?, vec!["x", "y", "w", "z"]);
        assert_eq!(explanation.global_importance_rank()?, vec![3, 1, 2, 4]);
        Ok(())
    }

    #[test]
    fn top_k_truncates_and_saturates() -> Result<()> {
        let explanation = scenario();
        assert_eq!(explanation.ranked_global_names(Some(2))?, vec!["B", "C"]);
        assert_eq!(explanation.ranked_global_values(Some(10))?.len(), 3);
        assert!(explanation.ranked_global_values(Some(0))?.is_empty());
        Ok(())
    }

    #[test]
    fn repeated_queries_are_identical() -> Result<()> {
        let explanation = scenario();
        let first = explanation.ranked_global_values(None)?;
        let second = explanation.ranked_global_values(None)?;
        assert_eq!(
            first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        Ok(())
    }

    #[test]
    fn per_class_ranking_needs_a_class_axis() {
        let explanation = scenario();
        assert!(matches!(
            explanation.ranked_per_class_values(None),
            Err(ExplainError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            explanation.ranked_per_class_names(None),
            Err(ExplainError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn per_class_ranking_is_independent_per_class() -> Result<()> {
        let raw = RawAttribution::from(Array3::from_shape_vec(
            (2, 1, 3),
            vec![0.1, 0.5, -0.3, 2.0, 0.0, -1.0],
        )?);
        let explanation = Explanation::create_global(&raw, &abc(), None, None)?;
        assert_eq!(
            explanation.ranked_per_class_names(None)?,
            vec![vec!["B", "C", "A"], vec!["A", "C", "B"]]
        );
        assert_eq!(
            explanation.ranked_per_class_values(Some(1))?,
            vec![vec![0.5], vec![2.0]]
        );
        Ok(())
    }

    #[test]
    fn local_ranking_per_instance() -> Result<()> {
        let explanation = scenario();
        assert_eq!(
            explanation.ranked_local_names(None)?,
            PerInstance::Instances(vec![
                vec!["C".to_string(), "B".to_string(), "A".to_string()],
                vec!["B".to_string(), "C".to_string(), "A".to_string()],
            ])
        );
        assert_eq!(
            explanation.ranked_local_values(Some(1))?,
            PerInstance::Instances(vec![vec![3.0], vec![4.0]])
        );
        Ok(())
    }

    #[test]
    fn local_ranking_per_class_and_instance() -> Result<()> {
        let raw = RawAttribution::from(Array3::from_shape_vec(
            (2, 1, 3),
            vec![0.1, 0.5, -0.3, 2.0, 0.0, -1.0],
        )?);
        let explanation = Explanation::create_local(&raw, &abc(), None)?;
        assert_eq!(
            explanation.ranked_local_values(None)?,
            PerInstance::PerClass(vec![vec![vec![0.5, 0.3, 0.1]], vec![vec![2.0, 1.0, 0.0]]])
        );
        Ok(())
    }

    #[test]
    fn local_queries_fail_without_local_component() {
        let raw = RawAttribution::from(array![[1.0, 2.0, 3.0]]);
        let config = ExplanationConfig::default().with_include_local(false);
        let explanation = Explanation::create_global(&raw, &abc(), None, Some(config)).unwrap();
        assert!(matches!(
            explanation.ranked_local_values(None),
            Err(ExplainError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            explanation.ranked_local_names(None),
            Err(ExplainError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn global_queries_fail_on_local_only() {
        let raw = RawAttribution::from(array![[1.0, 2.0, 3.0]]);
        let explanation = Explanation::create_local(&raw, &abc(), None).unwrap();
        assert!(matches!(
            explanation.ranked_global_values(None),
            Err(ExplainError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            explanation.feature_importance_dict(),
            Err(ExplainError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            explanation.global_importance_rank(),
            Err(ExplainError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn top_local_features_checks_bounds() -> Result<()> {
        let explanation = scenario();
        assert_eq!(
            explanation.top_local_features(1, None, 2)?,
            vec![("B".to_string(), 4.0), ("C".to_string(), 1.0)]
        );
        assert!(matches!(
            explanation.top_local_features(2, None, 2),
            Err(ExplainError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            explanation.top_local_features(0, Some(0), 2),
            Err(ExplainError::UnsupportedOperation(_))
        ));
        Ok(())
    }
}
