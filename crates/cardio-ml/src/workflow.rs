//! The workflow steps behind the command-line subcommands.

use std::collections::BTreeMap;

use cardio_ml_core::{MlError, MlResult, Tensor, Transformer};
use cardio_ml_data::DataFrame;
use cardio_ml_metrics::FBetaScorer;
use cardio_ml_model_selection::{
    mean_std_cross_val_scores, select_best, tune_with, CandidateEntry, Candidates, CvStrategy,
    ParamDistribution, SearchOptions, SelectionResult,
};
use cardio_ml_pipeline::make_pipeline;
use cardio_ml_preprocessing::{LabelEncoder, PreprocessorSpec};
use tracing::info;

use crate::models::get_models;

/// Training features and string labels.
pub struct TrainingSet {
    pub feature_names: Vec<String>,
    pub x: Tensor<f64>,
    pub y: Vec<String>,
}

impl TrainingSet {
    /// Split `frame` into the numeric feature matrix and the target labels.
    pub fn from_frame(frame: &DataFrame, target: &str) -> MlResult<Self> {
        let (features, y) = frame.split_target(target)?;
        Ok(TrainingSet {
            feature_names: features.column_names().to_vec(),
            x: features.to_matrix()?,
            y,
        })
    }

    fn preprocessor(&self, spec: &PreprocessorSpec) -> MlResult<Box<dyn Transformer>> {
        Ok(Box::new(spec.build(&self.feature_names)?))
    }
}

/// Score settings shared by the baseline evaluation and the tuning step.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSettings {
    pub pos_label: String,
    pub beta: f64,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        ScoreSettings {
            pos_label: "Heart Disease".to_string(),
            beta: 2.0,
        }
    }
}

/// Cross-validate every catalog model with default hyperparameters.
///
/// Returns one `(model name, metric -> "mean (+/- std)")` entry per model,
/// in catalog order.
pub fn evaluate_defaults(
    data: &TrainingSet,
    spec: &PreprocessorSpec,
    score: &ScoreSettings,
    random_state: u64,
    n_splits: usize,
) -> MlResult<Vec<(String, BTreeMap<String, String>)>> {
    let mut encoder = LabelEncoder::new();
    let y = encoder.fit_transform(&data.y)?;
    let scorer = FBetaScorer::new(encoder.index_of(&score.pos_label)?, score.beta)?;
    let cv = CvStrategy::stratified(n_splits);

    get_models(random_state)
        .into_iter()
        .map(|(name, model)| {
            let pipeline = make_pipeline(vec![data.preprocessor(spec)?], model);
            let summary = mean_std_cross_val_scores(&pipeline, &data.x, &y, &cv, &scorer, true)?;
            info!(
                model = name,
                test_score = summary.get("test_score").map(String::as_str).unwrap_or(""),
                "cross-validated default model"
            );
            Ok((name.to_string(), summary))
        })
        .collect()
}

/// Tune every catalog model named in `distributions`, then pick the best.
///
/// Models are tuned in catalog order. A distribution naming a model outside
/// the catalog is rejected before anything is fit.
pub fn tune_models(
    data: &TrainingSet,
    spec: &PreprocessorSpec,
    distributions: &BTreeMap<String, ParamDistribution>,
    score: &ScoreSettings,
    options: SearchOptions,
) -> MlResult<(Candidates, SelectionResult)> {
    let models = get_models(options.seed);
    if let Some(unknown) = distributions
        .keys()
        .find(|k| !models.iter().any(|(name, _)| *name == k.as_str()))
    {
        return Err(MlError::InvalidArgument(format!(
            "no model named '{}' in the catalog",
            unknown
        )));
    }

    let mut candidates = Candidates::new();
    for (name, model) in models {
        let Some(dist) = distributions.get(name) else {
            continue;
        };
        let search = tune_with(
            &data.x,
            &data.y,
            model,
            data.preprocessor(spec)?,
            dist,
            &score.pos_label,
            score.beta,
            options,
        )?;
        candidates.insert(name, CandidateEntry::from_search(search));
    }
    let selection = select_best(&candidates)?;
    Ok((candidates, selection))
}
