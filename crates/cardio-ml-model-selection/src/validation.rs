use std::collections::BTreeMap;
use std::time::Instant;

use cardio_ml_core::estimator::check_xy;
use cardio_ml_core::{MlResult, Tensor};
use cardio_ml_metrics::Scorer;
use cardio_ml_pipeline::Pipeline;
use rayon::prelude::*;
use serde::Serialize;

use crate::split::{CvStrategy, Fold};

/// Per-fold results of [`cross_validate`]; times are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CvScores {
    pub fit_time: Vec<f64>,
    pub score_time: Vec<f64>,
    pub test_score: Vec<f64>,
    pub train_score: Option<Vec<f64>>,
}

struct FoldResult {
    fit_time: f64,
    score_time: f64,
    test_score: f64,
    train_score: Option<f64>,
}

fn fit_and_score(
    template: &Pipeline,
    x: &Tensor<f64>,
    y: &Tensor<f64>,
    fold: &Fold,
    scorer: &dyn Scorer,
    return_train_score: bool,
) -> MlResult<FoldResult> {
    let mut pipeline = template.clone();
    let x_train = x.select_rows(&fold.train)?;
    let y_train = y.select_rows(&fold.train)?;
    let x_test = x.select_rows(&fold.test)?;
    let y_test = y.select_rows(&fold.test)?;

    let start = Instant::now();
    pipeline.fit(&x_train, &y_train)?;
    let fit_time = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let test_score = scorer.score_predictions(&y_test, &pipeline.predict(&x_test)?)?;
    let score_time = start.elapsed().as_secs_f64();

    let train_score = if return_train_score {
        Some(scorer.score_predictions(&y_train, &pipeline.predict(&x_train)?)?)
    } else {
        None
    };

    Ok(FoldResult {
        fit_time,
        score_time,
        test_score,
        train_score,
    })
}

/// Evaluate a pipeline on precomputed folds, each on a fresh clone.
/// Results come back in fold order whether or not `parallel` is set.
pub(crate) fn evaluate_folds(
    template: &Pipeline,
    x: &Tensor<f64>,
    y: &Tensor<f64>,
    folds: &[Fold],
    scorer: &dyn Scorer,
    return_train_score: bool,
    parallel: bool,
) -> MlResult<CvScores> {
    let results: Vec<FoldResult> = if parallel {
        folds
            .par_iter()
            .map(|f| fit_and_score(template, x, y, f, scorer, return_train_score))
            .collect::<MlResult<Vec<FoldResult>>>()?
    } else {
        folds
            .iter()
            .map(|f| fit_and_score(template, x, y, f, scorer, return_train_score))
            .collect::<MlResult<Vec<FoldResult>>>()?
    };

    Ok(CvScores {
        fit_time: results.iter().map(|r| r.fit_time).collect(),
        score_time: results.iter().map(|r| r.score_time).collect(),
        test_score: results.iter().map(|r| r.test_score).collect(),
        train_score: return_train_score
            .then(|| results.iter().filter_map(|r| r.train_score).collect()),
    })
}

/// Cross-validate `pipeline` on `x`/`y` (encoded labels).
pub fn cross_validate(
    pipeline: &Pipeline,
    x: &Tensor<f64>,
    y: &Tensor<f64>,
    cv: &CvStrategy,
    scorer: &dyn Scorer,
    return_train_score: bool,
) -> MlResult<CvScores> {
    check_xy(x, y)?;
    let folds = cv.split(y)?;
    evaluate_folds(pipeline, x, y, &folds, scorer, return_train_score, true)
}

/// Sample mean and standard deviation (ddof = 1).
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

fn format_mean_std(values: &[f64]) -> String {
    let (mean, std) = mean_std(values);
    format!("{:.3} (+/- {:.3})", mean, std)
}

/// Cross-validate and summarize every metric as `"<mean> (+/- <std>)"`.
///
/// Keys are `fit_time`, `score_time`, `test_score` and, when requested,
/// `train_score`.
pub fn mean_std_cross_val_scores(
    pipeline: &Pipeline,
    x: &Tensor<f64>,
    y: &Tensor<f64>,
    cv: &CvStrategy,
    scorer: &dyn Scorer,
    return_train_score: bool,
) -> MlResult<BTreeMap<String, String>> {
    let scores = cross_validate(pipeline, x, y, cv, scorer, return_train_score)?;
    let mut summary = BTreeMap::new();
    summary.insert("fit_time".to_string(), format_mean_std(&scores.fit_time));
    summary.insert("score_time".to_string(), format_mean_std(&scores.score_time));
    summary.insert("test_score".to_string(), format_mean_std(&scores.test_score));
    if let Some(train) = &scores.train_score {
        summary.insert("train_score".to_string(), format_mean_std(train));
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardio_ml_linear::LogisticRegression;
    use cardio_ml_metrics::FBetaScorer;
    use cardio_ml_pipeline::make_pipeline;
    use cardio_ml_preprocessing::{LabelEncoder, StandardScaler};

    fn patients() -> (Tensor<f64>, Tensor<f64>) {
        let x = Tensor::from_vec2d(&[
            vec![20.0, 180.0],
            vec![30.0, 200.0],
            vec![40.0, 190.0],
            vec![50.0, 210.0],
            vec![60.0, 220.0],
        ])
        .unwrap();
        let labels: Vec<String> = [
            "No Heart Disease",
            "Heart Disease",
            "No Heart Disease",
            "Heart Disease",
            "No Heart Disease",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let y = LabelEncoder::new().fit_transform(&labels).unwrap();
        (x, y)
    }

    fn lr_pipeline() -> Pipeline {
        make_pipeline(
            vec![Box::new(StandardScaler::new())],
            Box::new(LogisticRegression::new()),
        )
    }

    #[test]
    fn test_mean_std_cross_val_scores() {
        let (x, y) = patients();
        // "Heart Disease" sorts first, so it is class 0
        let scorer = FBetaScorer::new(0, 2.0).unwrap();
        let scores =
            mean_std_cross_val_scores(&lr_pipeline(), &x, &y, &CvStrategy::stratified(3), &scorer, true)
                .unwrap();

        let keys: Vec<&str> = scores.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["fit_time", "score_time", "test_score", "train_score"]);
        let train = &scores["train_score"];
        assert!(train.contains('('));
        assert!(train.contains("+/-"));
    }

    #[test]
    fn test_cross_validate_without_train_score() {
        let (x, y) = patients();
        let scorer = FBetaScorer::new(0, 1.0).unwrap();
        let cv = CvStrategy::stratified(2);
        let scores = cross_validate(&lr_pipeline(), &x, &y, &cv, &scorer, false).unwrap();
        assert_eq!(scores.test_score.len(), 2);
        assert_eq!(scores.fit_time.len(), 2);
        assert!(scores.train_score.is_none());
        assert!(scores.test_score.iter().all(|s| (0.0..=1.0).contains(s)));

        let summary =
            mean_std_cross_val_scores(&lr_pipeline(), &x, &y, &cv, &scorer, false).unwrap();
        assert!(!summary.contains_key("train_score"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (x, y) = patients();
        let scorer = FBetaScorer::new(0, 2.0).unwrap();
        let folds = CvStrategy::stratified(2).split(&y).unwrap();
        let par = evaluate_folds(&lr_pipeline(), &x, &y, &folds, &scorer, true, true).unwrap();
        let seq = evaluate_folds(&lr_pipeline(), &x, &y, &folds, &scorer, true, false).unwrap();
        assert_eq!(par.test_score, seq.test_score);
        assert_eq!(par.train_score, seq.train_score);
    }

    #[test]
    fn test_format_mean_std() {
        assert_eq!(format_mean_std(&[1.0, 2.0, 3.0]), "2.000 (+/- 1.000)");
    }
}
