use std::time::Instant;

use cardio_ml_core::estimator::check_finite;
use cardio_ml_core::{Estimator, MlError, MlResult, ParamSet, Tensor, Transformer};
use cardio_ml_metrics::{FBetaScorer, Scorer};
use cardio_ml_pipeline::{make_pipeline, Pipeline};
use cardio_ml_preprocessing::LabelEncoder;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::distribution::ParamDistribution;
use crate::split::CvStrategy;
use crate::validation::evaluate_folds;

/// One evaluated configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CvResultRow {
    pub params: ParamSet,
    pub split_test_scores: Vec<f64>,
    pub split_train_scores: Option<Vec<f64>>,
    pub mean_test_score: f64,
    pub std_test_score: f64,
    pub mean_train_score: Option<f64>,
    pub std_train_score: Option<f64>,
    pub mean_fit_time: f64,
    pub std_fit_time: f64,
    pub mean_score_time: f64,
    pub rank_test_score: usize,
}

/// Outcome of a hyperparameter search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best configuration refit on all data; `None` when refit is disabled.
    pub best_pipeline: Option<Pipeline>,
    pub best_score: f64,
    pub best_params: ParamSet,
    pub best_index: usize,
    pub cv_results: Vec<CvResultRow>,
    /// Original labels, indexed by encoded class.
    pub classes: Vec<String>,
    pub refit_time: Option<f64>,
}

impl SearchResult {
    /// The final estimator step of the refit best pipeline.
    pub fn best_estimator(&self) -> Option<&dyn Estimator> {
        self.best_pipeline.as_ref()?.estimator().ok()
    }

    /// Predict original string labels with the refit best pipeline.
    pub fn predict_labels(&self, x: &Tensor<f64>) -> MlResult<Vec<String>> {
        let pipeline = self.best_pipeline.as_ref().ok_or(MlError::NotFitted)?;
        pipeline
            .predict(x)?
            .data()
            .iter()
            .map(|v| {
                let idx = v.round().max(0.0) as usize;
                self.classes.get(idx).cloned().ok_or(MlError::IndexOutOfBounds {
                    index: idx,
                    axis: 0,
                    size: self.classes.len(),
                })
            })
            .collect()
    }
}

/// Population mean and standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// "min" ranking on descending scores: ties share the best rank.
fn rank_min(scores: &[f64]) -> Vec<usize> {
    scores
        .iter()
        .map(|s| 1 + scores.iter().filter(|other| *other > s).count())
        .collect()
}

/// Randomized search over a [`ParamDistribution`] with cross-validation.
pub struct RandomizedSearch {
    pipeline: Pipeline,
    distribution: ParamDistribution,
    scorer: Box<dyn Scorer>,
    n_iter: usize,
    cv: CvStrategy,
    seed: Option<u64>,
    return_train_score: bool,
    refit: bool,
    parallel: bool,
}

impl RandomizedSearch {
    pub fn new(pipeline: Pipeline, distribution: ParamDistribution, scorer: Box<dyn Scorer>) -> Self {
        RandomizedSearch {
            pipeline,
            distribution,
            scorer,
            n_iter: 10,
            cv: CvStrategy::default(),
            seed: None,
            return_train_score: true,
            refit: true,
            parallel: true,
        }
    }

    pub fn n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn cv(mut self, cv: CvStrategy) -> Self {
        self.cv = cv;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn return_train_score(mut self, yes: bool) -> Self {
        self.return_train_score = yes;
        self
    }

    pub fn refit(mut self, yes: bool) -> Self {
        self.refit = yes;
        self
    }

    pub fn parallel(mut self, yes: bool) -> Self {
        self.parallel = yes;
        self
    }

    /// Run the search on `x` and encoded labels `y`.
    pub fn fit(&self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<SearchResult> {
        self.distribution.validate()?;
        if self.n_iter == 0 {
            return Err(MlError::InvalidArgument("n_iter must be at least 1".to_string()));
        }
        let n = x.nrows()?;
        if n != y.numel() {
            return Err(MlError::InvalidArgument(format!(
                "x has {} rows but y has {} labels",
                n,
                y.numel()
            )));
        }
        check_finite(x)?;
        let folds = self.cv.split(y)?;

        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let configs = self.distribution.sample(self.n_iter, &mut rng)?;

        let mut rows = Vec::with_capacity(configs.len());
        for params in configs {
            let mut candidate = self.pipeline.clone();
            candidate.set_params(&params)?;
            let scores = evaluate_folds(
                &candidate,
                x,
                y,
                &folds,
                self.scorer.as_ref(),
                self.return_train_score,
                self.parallel,
            )?;

            let (mean_test_score, std_test_score) = mean_std(&scores.test_score);
            let (mean_fit_time, std_fit_time) = mean_std(&scores.fit_time);
            let (mean_score_time, _) = mean_std(&scores.score_time);
            let train = scores.train_score.as_deref().map(mean_std);
            debug!(params = %params, mean_test_score, "evaluated configuration");

            rows.push(CvResultRow {
                params,
                mean_test_score,
                std_test_score,
                mean_train_score: train.map(|t| t.0),
                std_train_score: train.map(|t| t.1),
                mean_fit_time,
                std_fit_time,
                mean_score_time,
                split_test_scores: scores.test_score,
                split_train_scores: scores.train_score,
                rank_test_score: 0,
            });
        }

        let means: Vec<f64> = rows.iter().map(|r| r.mean_test_score).collect();
        for (row, rank) in rows.iter_mut().zip(rank_min(&means)) {
            row.rank_test_score = rank;
        }
        let best_index = rows
            .iter()
            .position(|r| r.rank_test_score == 1)
            .ok_or_else(|| MlError::InvalidOperation("no configuration ranked first".to_string()))?;
        let best_params = rows[best_index].params.clone();
        let best_score = rows[best_index].mean_test_score;

        let (best_pipeline, refit_time) = if self.refit {
            let mut best = self.pipeline.clone();
            best.set_params(&best_params)?;
            let start = Instant::now();
            best.fit(x, y)?;
            (Some(best), Some(start.elapsed().as_secs_f64()))
        } else {
            (None, None)
        };

        info!(
            scorer = %self.scorer.name(),
            n_candidates = rows.len(),
            best_score,
            best_params = %best_params,
            "randomized search finished"
        );

        Ok(SearchResult {
            best_pipeline,
            best_score,
            best_params,
            best_index,
            cv_results: rows,
            classes: Vec::new(),
            refit_time,
        })
    }
}

/// Search settings used by [`tune_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub n_iter: usize,
    pub cv: CvStrategy,
    pub seed: u64,
}

impl SearchOptions {
    /// Ten configurations over five stratified folds.
    pub fn new(seed: u64) -> Self {
        SearchOptions {
            n_iter: 10,
            cv: CvStrategy::default(),
            seed,
        }
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_cv(mut self, cv: CvStrategy) -> Self {
        self.cv = cv;
        self
    }
}

/// Tune `estimator` behind `preprocessor` with a randomized search scored by
/// F-beta on `positive_label`.
///
/// The pipeline steps are named `<preprocessor name>` and `<estimator name>`,
/// so the distribution addresses hyperparameters as e.g.
/// `logisticregression__C`. Arguments are validated before anything is fit.
#[allow(clippy::too_many_arguments)]
pub fn tune(
    x: &Tensor<f64>,
    y: &[String],
    estimator: Box<dyn Estimator>,
    preprocessor: Box<dyn Transformer>,
    distribution: &ParamDistribution,
    positive_label: &str,
    beta: f64,
    seed: u64,
) -> MlResult<SearchResult> {
    tune_with(
        x,
        y,
        estimator,
        preprocessor,
        distribution,
        positive_label,
        beta,
        SearchOptions::new(seed),
    )
}

/// [`tune`] with explicit iteration count and fold strategy.
#[allow(clippy::too_many_arguments)]
pub fn tune_with(
    x: &Tensor<f64>,
    y: &[String],
    estimator: Box<dyn Estimator>,
    preprocessor: Box<dyn Transformer>,
    distribution: &ParamDistribution,
    positive_label: &str,
    beta: f64,
    options: SearchOptions,
) -> MlResult<SearchResult> {
    distribution.validate()?;
    let mut encoder = LabelEncoder::new();
    encoder.fit(y);
    let pos_class = encoder.index_of(positive_label)?;
    let scorer = FBetaScorer::new(pos_class, beta)?;
    let y_encoded = encoder.transform(y)?;

    let pipeline = make_pipeline(vec![preprocessor], estimator);
    let mut result = RandomizedSearch::new(pipeline, distribution.clone(), Box::new(scorer))
        .n_iter(options.n_iter)
        .cv(options.cv)
        .seed(options.seed)
        .fit(x, &y_encoded)?;
    result.classes = encoder.classes;
    Ok(result)
}
