use std::fmt;

use cardio_ml_core::{MlResult, Tensor};

use crate::classification::{accuracy, fbeta_score, validate_beta};

/// Maps true and predicted labels to a score where higher is better.
pub trait Scorer: Send + Sync + fmt::Debug {
    fn name(&self) -> String;

    fn score_predictions(&self, y_true: &Tensor<f64>, y_pred: &Tensor<f64>) -> MlResult<f64>;
}

/// F-beta on one encoded positive class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FBetaScorer {
    pos_class: usize,
    beta: f64,
}

impl FBetaScorer {
    pub fn new(pos_class: usize, beta: f64) -> MlResult<Self> {
        validate_beta(beta)?;
        Ok(Self { pos_class, beta })
    }

    pub fn pos_class(&self) -> usize {
        self.pos_class
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl Scorer for FBetaScorer {
    fn name(&self) -> String {
        format!("f{}", self.beta)
    }

    fn score_predictions(&self, y_true: &Tensor<f64>, y_pred: &Tensor<f64>) -> MlResult<f64> {
        fbeta_score(y_true, y_pred, self.pos_class, self.beta)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccuracyScorer;

impl Scorer for AccuracyScorer {
    fn name(&self) -> String {
        "accuracy".to_string()
    }

    fn score_predictions(&self, y_true: &Tensor<f64>, y_pred: &Tensor<f64>) -> MlResult<f64> {
        accuracy(y_true, y_pred)
    }
}
