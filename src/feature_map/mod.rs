// src/feature_map/mod.rs

//! Mapping from raw input features to the engineered columns a preprocessing
//! pipeline produced from them.
//!
//! A [`FeatureMap`] is a partition of the engineered index range
//! `0..total_width`: every engineered column belongs to exactly one raw
//! feature's [`FeatureGroup`]. Scalers and imputers give groups of width one,
//! a one-hot encoder gives a group per encoded column with one index per
//! learned category.

pub mod transforms;

pub use transforms::{ColumnTransform, FittedTransform, TransformSpec};

use crate::core::{ExplainError, Result};
use ndarray::{Array2, ArrayView2};
use std::collections::HashMap;
use tracing::debug;

/// The engineered columns owned by one raw feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGroup {
    name: String,
    indices: Vec<usize>,
    engineered_names: Vec<String>,
}

impl FeatureGroup {
    /// A group over explicit engineered indices. Engineered columns are named
    /// after the raw feature, suffixed with their position when there are
    /// several.
    pub fn new(name: impl Into<String>, indices: Vec<usize>) -> Self {
        let name = name.into();
        let engineered_names = if indices.len() == 1 {
            vec![name.clone()]
        } else {
            (0..indices.len()).map(|j| format!("{}_{}", name, j)).collect()
        };
        FeatureGroup {
            name,
            indices,
            engineered_names,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn engineered_names(&self) -> &[String] {
        &self.engineered_names
    }

    pub fn width(&self) -> usize {
        self.indices.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    groups: Vec<FeatureGroup>,
    // engineered index -> position in `groups`
    owner: Vec<usize>,
}

impl FeatureMap {
    /// Replays the fitted output layout of `spec` over `raw_names`.
    ///
    /// Groups come back in `raw_names` order; engineered indices follow the
    /// transform replay order.
    pub fn build<S: AsRef<str>>(raw_names: &[S], spec: &TransformSpec) -> Result<Self> {
        let mut position: HashMap<&str, usize> = HashMap::with_capacity(raw_names.len());
        for (i, name) in raw_names.iter().enumerate() {
            if position.insert(name.as_ref(), i).is_some() {
                return Err(ExplainError::Configuration(format!(
                    "raw feature '{}' is declared more than once",
                    name.as_ref()
                )));
            }
        }

        let mut slots: Vec<Option<FeatureGroup>> = vec![None; raw_names.len()];
        let mut cursor = 0usize;

        for block in spec.blocks() {
            let outputs = block.transform.output_names(&block.columns)?;
            for (column, names) in block.columns.iter().zip(outputs) {
                let &raw_idx = position.get(column.as_str()).ok_or_else(|| {
                    ExplainError::Configuration(format!(
                        "{} refers to unknown raw feature '{}'",
                        block.transform.name(),
                        column
                    ))
                })?;
                if slots[raw_idx].is_some() {
                    return Err(ExplainError::Configuration(format!(
                        "raw feature '{}' is consumed by more than one transform",
                        column
                    )));
                }
                let width = names.len();
                slots[raw_idx] = Some(FeatureGroup {
                    name: column.clone(),
                    indices: (cursor..cursor + width).collect(),
                    engineered_names: names,
                });
                cursor += width;
            }
        }

        let missing: Vec<&str> = raw_names
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| name.as_ref())
            .collect();
        if !missing.is_empty() {
            return Err(ExplainError::Configuration(format!(
                "raw features not accounted for by any transform: {:?}",
                missing
            )));
        }

        let groups: Vec<FeatureGroup> = slots.into_iter().flatten().collect();
        debug!(
            raw_features = groups.len(),
            engineered_width = cursor,
            "built feature map from transform replay"
        );
        Self::from_groups(groups)
    }

    /// One width-one group per raw feature, in order.
    pub fn identity<S: AsRef<str>>(raw_names: &[S]) -> Result<Self> {
        let spec = TransformSpec::PerFeature(
            raw_names
                .iter()
                .map(|n| (n.as_ref().to_string(), FittedTransform::Passthrough))
                .collect(),
        );
        Self::build(raw_names, &spec)
    }

    /// Explicit groups, checked to partition `0..total_width`.
    pub fn from_groups(groups: Vec<FeatureGroup>) -> Result<Self> {
        let total: usize = groups.iter().map(FeatureGroup::width).sum();
        let mut owner: Vec<Option<usize>> = vec![None; total];
        let mut seen_names: HashMap<&str, usize> = HashMap::with_capacity(groups.len());

        for (g, group) in groups.iter().enumerate() {
            if group.indices.is_empty() {
                return Err(ExplainError::Configuration(format!(
                    "raw feature '{}' owns no engineered columns",
                    group.name
                )));
            }
            if seen_names.insert(group.name.as_str(), g).is_some() {
                return Err(ExplainError::Configuration(format!(
                    "raw feature '{}' appears in more than one group",
                    group.name
                )));
            }
            for &e in &group.indices {
                let slot = owner.get_mut(e).ok_or_else(|| {
                    ExplainError::Configuration(format!(
                        "engineered index {} of '{}' lies outside 0..{}",
                        e, group.name, total
                    ))
                })?;
                if let Some(prev) = slot.replace(g) {
                    return Err(ExplainError::Configuration(format!(
                        "engineered index {} is claimed by both '{}' and '{}'",
                        e, groups[prev].name, group.name
                    )));
                }
            }
        }

        // Widths sum to `total` and no index repeats, so every slot is filled.
        let owner = owner.into_iter().flatten().collect();
        Ok(FeatureMap { groups, owner })
    }

    /// Fails unless the map covers exactly `width` engineered columns.
    pub fn validate_width(&self, width: usize) -> Result<()> {
        if width != self.total_width() {
            return Err(ExplainError::Configuration(format!(
                "feature map covers {} engineered columns but the attribution has {}",
                self.total_width(),
                width
            )));
        }
        Ok(())
    }

    pub fn groups(&self) -> &[FeatureGroup] {
        &self.groups
    }

    pub fn raw_names(&self) -> Vec<&str> {
        self.groups.iter().map(FeatureGroup::name).collect()
    }

    /// Number of raw features.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_width(&self) -> usize {
        self.owner.len()
    }

    /// The group owning engineered column `index`.
    pub fn group_of(&self, index: usize) -> Option<&FeatureGroup> {
        self.owner.get(index).map(|&g| &self.groups[g])
    }

    /// Engineered column names in engineered index order.
    pub fn engineered_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.total_width()];
        for group in &self.groups {
            for (&e, name) in group.indices.iter().zip(&group.engineered_names) {
                names[e] = name.as_str();
            }
        }
        names
    }

    /// `(n_raw, total_width)` membership matrix; row `g` has a one in every
    /// column owned by group `g`.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.len(), self.total_width()));
        for (e, &g) in self.owner.iter().enumerate() {
            dense[[g, e]] = 1.0;
        }
        dense
    }

    /// Sums `|value|` over each group's columns, row by row.
    ///
    /// `values` is `(n_rows, total_width)`; the result is `(n_rows, len())`.
    pub fn aggregate_abs(&self, values: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if values.ncols() != self.total_width() {
            return Err(ExplainError::shape(
                "engineered feature dimension",
                self.total_width(),
                values.ncols(),
            ));
        }
        let mut out = Array2::zeros((values.nrows(), self.len()));
        for (g, group) in self.groups.iter().enumerate() {
            let mut column = out.column_mut(g);
            for &e in &group.indices {
                column.zip_mut_with(&values.column(e), |acc, &v| *acc += v.abs());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn titanic_spec() -> TransformSpec {
        TransformSpec::Composite(vec![
            ColumnTransform::new(["age", "fare"], FittedTransform::StandardScaler),
            ColumnTransform::new(
                ["sex", "embarked"],
                FittedTransform::OneHotEncoder {
                    categories: vec![
                        vec!["female".into(), "male".into()],
                        vec!["C".into(), "Q".into(), "S".into()],
                    ],
                },
            ),
            ColumnTransform::new(["pclass"], FittedTransform::Passthrough),
        ])
    }

    #[test]
    fn composite_replay_assigns_contiguous_blocks() -> Result<()> {
        let map = FeatureMap::build(&["pclass", "sex", "age", "fare", "embarked"], &titanic_spec())?;

        assert_eq!(map.raw_names(), vec!["pclass", "sex", "age", "fare", "embarked"]);
        assert_eq!(map.total_width(), 8);
        assert_eq!(map.groups()[0].indices(), &[7]);
        assert_eq!(map.groups()[1].indices(), &[2, 3]);
        assert_eq!(map.groups()[2].indices(), &[0]);
        assert_eq!(map.groups()[3].indices(), &[1]);
        assert_eq!(map.groups()[4].indices(), &[4, 5, 6]);
        assert_eq!(
            map.engineered_names(),
            vec!["age", "fare", "sex_female", "sex_male", "embarked_C", "embarked_Q", "embarked_S", "pclass"]
        );
        Ok(())
    }

    #[test]
    fn unaccounted_raw_feature_is_a_configuration_error() {
        let err = FeatureMap::build(&["pclass", "sex", "age", "fare", "embarked", "cabin"], &titanic_spec())
            .unwrap_err();
        assert!(matches!(err, ExplainError::Configuration(ref msg) if msg.contains("cabin")));
    }

    #[test]
    fn unknown_column_in_transform_is_rejected() {
        let spec = TransformSpec::PerFeature(vec![("height".to_string(), FittedTransform::Imputer)]);
        let err = FeatureMap::build(&["age"], &spec).unwrap_err();
        assert!(err.to_string().contains("unknown raw feature 'height'"));
    }

    #[test]
    fn column_consumed_twice_is_rejected() {
        let spec = TransformSpec::PerFeature(vec![
            ("age".to_string(), FittedTransform::Imputer),
            ("age".to_string(), FittedTransform::StandardScaler),
        ]);
        let err = FeatureMap::build(&["age"], &spec).unwrap_err();
        assert!(err.to_string().contains("more than one transform"));
    }

    #[test]
    fn duplicate_raw_names_are_rejected() {
        let err = FeatureMap::identity(&["a", "a"]).unwrap_err();
        assert!(matches!(err, ExplainError::Configuration(_)));
    }

    #[test]
    fn from_groups_rejects_gaps_and_overlaps() {
        let gap = FeatureMap::from_groups(vec![FeatureGroup::new("a", vec![0]), FeatureGroup::new("b", vec![2])]);
        assert!(gap.is_err());

        let overlap = FeatureMap::from_groups(vec![
            FeatureGroup::new("a", vec![0, 1]),
            FeatureGroup::new("b", vec![1, 2]),
        ]);
        assert!(overlap.is_err());

        let empty = FeatureMap::from_groups(vec![FeatureGroup::new("a", vec![])]);
        assert!(empty.is_err());
    }

    #[test]
    fn from_groups_accepts_interleaved_indices() -> Result<()> {
        let map = FeatureMap::from_groups(vec![
            FeatureGroup::new("color", vec![0, 2]),
            FeatureGroup::new("size", vec![1]),
        ])?;
        assert_eq!(map.group_of(2).map(FeatureGroup::name), Some("color"));
        assert_eq!(map.group_of(1).map(FeatureGroup::name), Some("size"));
        assert!(map.group_of(3).is_none());
        assert_eq!(map.engineered_names(), vec!["color_0", "size", "color_1"]);
        Ok(())
    }

    #[test]
    fn validate_width_reports_both_widths() -> Result<()> {
        let map = FeatureMap::identity(&["a", "b", "c", "d"])?;
        assert!(map.validate_width(4).is_ok());
        let err = map.validate_width(5).unwrap_err();
        assert!(err.to_string().contains("covers 4 engineered columns but the attribution has 5"));
        Ok(())
    }

    #[test]
    fn dense_matrix_sums_engineered_to_raw() -> Result<()> {
        let map = FeatureMap::build(&["pclass", "sex", "age", "fare", "embarked"], &titanic_spec())?;
        let dense = map.to_dense();
        assert_eq!(dense.dim(), (5, 8));
        // every engineered column belongs to exactly one raw feature
        for col in dense.columns() {
            assert_abs_diff_eq!(col.sum(), 1.0);
        }
        let engineered = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let raw = dense.dot(&engineered);
        assert_eq!(raw, array![8.0, 7.0, 1.0, 2.0, 18.0]);
        Ok(())
    }

    #[test]
    fn aggregate_abs_sums_group_magnitudes() -> Result<()> {
        let map = FeatureMap::from_groups(vec![
            FeatureGroup::new("num", vec![0]),
            FeatureGroup::new("cat", vec![1, 2, 3]),
        ])?;
        let values = array![[-1.5, 0.5, -0.25, 0.25], [2.0, -1.0, 1.0, 0.0]];
        let grouped = map.aggregate_abs(values.view())?;
        assert_eq!(grouped, array![[1.5, 1.0], [2.0, 2.0]]);

        let err = map.aggregate_abs(array![[1.0, 2.0]].view()).unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch { expected: 4, actual: 2, .. }));
        Ok(())
    }
}
