use std::fmt;

use cardio_ml_core::estimator::{check_xy, class_count};
use cardio_ml_core::{Estimator, MlError, MlResult, ParamSet, ParamValue, Tensor};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How a [`DummyClassifier`] makes its predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Always the most frequent training class.
    #[default]
    MostFrequent,
    /// Same predictions as `MostFrequent`.
    Prior,
    /// Random classes drawn with the training class frequencies.
    Stratified,
    /// Random classes drawn uniformly.
    Uniform,
    /// Always the `constant` class.
    Constant,
}

impl Strategy {
    pub fn parse(name: &str) -> MlResult<Self> {
        match name {
            "most_frequent" => Ok(Strategy::MostFrequent),
            "prior" => Ok(Strategy::Prior),
            "stratified" => Ok(Strategy::Stratified),
            "uniform" => Ok(Strategy::Uniform),
            "constant" => Ok(Strategy::Constant),
            other => Err(MlError::invalid_param(
                "strategy",
                format!("unknown strategy '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::MostFrequent => "most_frequent",
            Strategy::Prior => "prior",
            Strategy::Stratified => "stratified",
            Strategy::Uniform => "uniform",
            Strategy::Constant => "constant",
        };
        write!(f, "{}", s)
    }
}

/// Classifier that ignores the features. Useful as a baseline.
#[derive(Debug, Clone, Default)]
pub struct DummyClassifier {
    pub strategy: Strategy,
    /// Encoded class predicted by `Strategy::Constant`.
    pub constant: Option<usize>,
    pub random_state: Option<u64>,
    class_prior: Option<Vec<f64>>,
}

impl DummyClassifier {
    pub fn new(strategy: Strategy) -> Self {
        DummyClassifier {
            strategy,
            ..Default::default()
        }
    }

    pub fn with_constant(mut self, class: usize) -> Self {
        self.constant = Some(class);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Training class frequencies, indexed by encoded class.
    pub fn class_prior(&self) -> Option<&[f64]> {
        self.class_prior.as_deref()
    }
}

impl Estimator for DummyClassifier {
    fn name(&self) -> &'static str {
        "dummyclassifier"
    }

    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        check_xy(x, y)?;
        let k = class_count(y);
        if self.strategy == Strategy::Constant {
            match self.constant {
                Some(c) if c < k => {}
                Some(c) => {
                    return Err(MlError::InvalidArgument(format!(
                        "constant class {} is not present in the training labels",
                        c
                    )))
                }
                None => {
                    return Err(MlError::InvalidArgument(
                        "the constant strategy requires a constant class".to_string(),
                    ))
                }
            }
        }
        let mut counts = vec![0.0; k];
        for v in y.data() {
            counts[v.round().max(0.0) as usize] += 1.0;
        }
        let n = y.numel() as f64;
        self.class_prior = Some(counts.into_iter().map(|c| c / n).collect());
        Ok(())
    }

    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let prior = self.class_prior.as_ref().ok_or(MlError::NotFitted)?;
        let n = x.nrows()?;
        let mut rng = match self.random_state {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let predictions: Vec<f64> = match self.strategy {
            Strategy::MostFrequent | Strategy::Prior => {
                let max = prior.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mode = prior.iter().position(|&p| p == max).unwrap_or(0);
                vec![mode as f64; n]
            }
            Strategy::Constant => vec![self.constant.unwrap_or(0) as f64; n],
            Strategy::Uniform => (0..n)
                .map(|_| rng.gen_range(0..prior.len()) as f64)
                .collect(),
            Strategy::Stratified => {
                let dist = WeightedIndex::new(prior)
                    .map_err(|e| MlError::InvalidOperation(e.to_string()))?;
                (0..n).map(|_| dist.sample(&mut rng) as f64).collect()
            }
        };
        Ok(Tensor::from_slice(&predictions))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> MlResult<()> {
        match name {
            "strategy" => self.strategy = Strategy::parse(value.expect_str(name)?)?,
            "constant" => self.constant = value.expect_optional_usize(name)?,
            "random_state" => {
                self.random_state = value.expect_optional_usize(name)?.map(|s| s as u64)
            }
            _ => {
                return Err(MlError::invalid_param(
                    name,
                    "unknown parameter for DummyClassifier",
                ))
            }
        }
        Ok(())
    }

    fn params(&self) -> ParamSet {
        ParamSet::new()
            .with("strategy", self.strategy.to_string().as_str())
            .with("constant", self.constant)
            .with("random_state", self.random_state.map(|s| s as usize))
    }

    fn is_fitted(&self) -> bool {
        self.class_prior.is_some()
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (Tensor<f64>, Tensor<f64>) {
        let x = Tensor::zeros(vec![5, 2]);
        let y = Tensor::from_slice(&[1.0, 0.0, 1.0, 1.0, 0.0]);
        (x, y)
    }

    #[test]
    fn test_most_frequent() {
        let (x, y) = data();
        let mut clf = DummyClassifier::new(Strategy::MostFrequent);
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.predict(&x).unwrap().data(), &[1.0; 5]);
        assert_eq!(clf.class_prior().unwrap(), &[0.4, 0.6]);
    }

    #[test]
    fn test_constant() {
        let (x, y) = data();
        let mut clf = DummyClassifier::new(Strategy::Constant).with_constant(0);
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.predict(&x).unwrap().data(), &[0.0; 5]);

        let mut missing = DummyClassifier::new(Strategy::Constant);
        assert!(missing.fit(&x, &y).unwrap_err().is_invalid_argument());
        let mut unseen = DummyClassifier::new(Strategy::Constant).with_constant(3);
        assert!(unseen.fit(&x, &y).is_err());
    }

    #[test]
    fn test_random_strategies_are_seeded() {
        let (x, y) = data();
        for strategy in [Strategy::Stratified, Strategy::Uniform] {
            let mut clf = DummyClassifier::new(strategy).with_random_state(123);
            clf.fit(&x, &y).unwrap();
            let a = clf.predict(&x).unwrap();
            let b = clf.predict(&x).unwrap();
            assert_eq!(a, b);
            assert!(a.data().iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn test_params() {
        let mut clf = DummyClassifier::default();
        assert_eq!(clf.predict(&Tensor::zeros(vec![1, 1])), Err(MlError::NotFitted));
        clf.set_param("strategy", &ParamValue::Str("uniform".into())).unwrap();
        assert_eq!(clf.strategy, Strategy::Uniform);
        assert_eq!(clf.params().get("strategy"), Some(&ParamValue::Str("uniform".into())));
        assert!(clf.set_param("strategy", &ParamValue::Str("best".into())).is_err());
    }
}
