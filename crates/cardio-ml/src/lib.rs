//! # cardio-ml
//!
//! Heart-disease classification workflow in Rust.
//!
//! ## Modules
//!
//! - **core**: tensors, errors, hyperparameter values, `Estimator` / `Transformer`
//! - **data**: `DataFrame` with numeric and text columns
//! - **preprocessing**: scalers, encoders, `ColumnTransformer`, `PreprocessorSpec`
//! - **pipeline**: preprocessing + estimator chains with `<step>__<param>` addressing
//! - **linear**, **tree**, **svm**, **dummy**: the candidate classifiers
//! - **metrics**: accuracy, precision, recall, F-beta and scorers
//! - **model_selection**: folds, cross-validation, randomized search, `tune`, `select_best`
//! - **io**: CSV and JSON files of the workflow
//! - **eda**: summary statistics, correlations, Vega-Lite charts

/// Core tensor engine and traits.
pub use cardio_ml_core as core;

/// Tabular data.
pub use cardio_ml_data as data;

/// Data preprocessing.
pub use cardio_ml_preprocessing as preprocessing;

/// Pipeline API.
pub use cardio_ml_pipeline as pipeline;

/// Logistic regression.
pub use cardio_ml_linear as linear;

/// Decision trees.
pub use cardio_ml_tree as tree;

/// Support vector machines.
pub use cardio_ml_svm as svm;

/// Baseline classifiers.
pub use cardio_ml_dummy as dummy;

/// Evaluation metrics.
pub use cardio_ml_metrics as metrics;

/// Cross-validation, search and selection.
pub use cardio_ml_model_selection as model_selection;

/// I/O utilities.
pub use cardio_ml_io as io;

/// Exploratory data analysis.
pub use cardio_ml_eda as eda;

pub mod models;
pub mod workflow;

pub use models::get_models;
