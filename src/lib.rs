// src/lib.rs

//! `interpret_rs` turns feature attributions computed by external explainers
//! into typed, read-only explanation objects.
//!
//! Attribution methods (gradients, SHAP estimators, permutation schemes) live
//! outside this crate behind the traits in [`traits`]. What this crate owns:
//!
//! - [`FeatureMap`]: which engineered columns each raw input feature became
//!   after preprocessing (scaling keeps one column, one-hot encoding fans out
//!   to one column per category).
//! - [`Explanation`]: attributions aggregated back to raw features, with
//!   deterministic ranked queries over global, per-class and per-instance
//!   importances.
//!
//! ```
//! use interpret_rs::{ColumnTransform, Explanation, FeatureMap, FittedTransform, RawAttribution, TransformSpec};
//! use ndarray::array;
//!
//! let spec = TransformSpec::Composite(vec![
//!     ColumnTransform::new(["age"], FittedTransform::StandardScaler),
//!     ColumnTransform::new(["port"], FittedTransform::one_hot(["C", "Q", "S"])),
//! ]);
//! let map = FeatureMap::build(&["age", "port"], &spec)?;
//!
//! // two instances, four engineered columns: age, port_C, port_Q, port_S
//! let raw = RawAttribution::from(array![[0.5, 0.25, -0.25, 0.0], [-1.5, 0.0, 0.5, -0.5]]);
//! let explanation = Explanation::create_global(&raw, &map, None, None)?;
//!
//! assert_eq!(explanation.ranked_global_names(None)?, vec!["age", "port"]);
//! assert_eq!(explanation.ranked_global_values(None)?, vec![1.0, 0.75]);
//! # Ok::<(), interpret_rs::ExplainError>(())
//! ```

// Declare the main modules of the crate
pub mod core;
pub mod explanation;
pub mod feature_map;
pub mod sources;
pub mod traits;

// Re-export key components for easier use by library consumers
pub use crate::core::{
    AttributionOutput, Dataset, ExplainError, ExplanationConfig, ModelTask, RawAttribution, Result,
};
pub use crate::explanation::{Explanation, ExplanationSummary, LocalImportance, PerInstance};
pub use crate::feature_map::{ColumnTransform, FeatureGroup, FeatureMap, FittedTransform, TransformSpec};
pub use crate::sources::{attribute_with, explain_global_with, explain_local_with};
pub use crate::traits::{Attributor, DashboardConsumer, GlobalAttributionSource, PredictModel};
