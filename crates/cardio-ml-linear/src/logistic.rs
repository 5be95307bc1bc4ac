use cardio_ml_core::estimator::{check_binary, check_xy};
use cardio_ml_core::{Estimator, MlError, MlResult, ParamSet, ParamValue, Tensor};

/// Logistic Regression: binary classification via batch gradient descent
/// on the L2-penalized log loss.
///
/// The penalty has strength `1 / C`, so smaller `C` means stronger
/// regularization.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tol: f64,
    weights: Option<Vec<f64>>,
    bias: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        LogisticRegression {
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
            weights: None,
            bias: 0.0,
        }
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    fn decision(w: &[f64], b: f64, row: &[f64]) -> f64 {
        b + w.iter().zip(row).map(|(wj, xj)| wj * xj).sum::<f64>()
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Probability of class 1 per row.
    pub fn predict_proba(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let w = self.weights.as_ref().ok_or(MlError::NotFitted)?;
        let n = x.nrows()?;
        let p = x.ncols()?;
        if p != w.len() {
            return Err(MlError::ShapeMismatch {
                expected: vec![w.len()],
                got: vec![p],
            });
        }
        let proba = (0..n)
            .map(|i| Ok(Self::sigmoid(Self::decision(w, self.bias, x.row(i)?))))
            .collect::<MlResult<Vec<f64>>>()?;
        Ok(Tensor::from_slice(&proba))
    }
}

impl Estimator for LogisticRegression {
    fn name(&self) -> &'static str {
        "logisticregression"
    }

    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        check_xy(x, y)?;
        check_binary("LogisticRegression", y)?;
        let n = x.nrows()?;
        let p = x.ncols()?;
        let n_f = n as f64;
        let l2 = 1.0 / (self.c * n_f);

        let mut w = vec![0.0; p];
        let mut b = 0.0;

        for _ in 0..self.max_iter {
            let mut dw = vec![0.0; p];
            let mut db = 0.0;

            for i in 0..n {
                let row = x.row(i)?;
                let error = Self::sigmoid(Self::decision(&w, b, row)) - y.data()[i];
                for (g, xj) in dw.iter_mut().zip(row) {
                    *g += error * xj;
                }
                db += error;
            }

            let mut max_grad: f64 = 0.0;
            for (wj, g) in w.iter_mut().zip(&dw) {
                let grad = g / n_f + l2 * *wj;
                *wj -= self.learning_rate * grad;
                max_grad = max_grad.max(grad.abs());
            }
            let grad_b = db / n_f;
            b -= self.learning_rate * grad_b;

            if max_grad.max(grad_b.abs()) < self.tol {
                break;
            }
        }

        self.weights = Some(w);
        self.bias = b;
        Ok(())
    }

    /// Class labels (threshold = 0.5).
    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        Ok(self
            .predict_proba(x)?
            .apply(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> MlResult<()> {
        match name {
            "C" => self.c = value.expect_positive_f64(name)?,
            "learning_rate" => self.learning_rate = value.expect_positive_f64(name)?,
            "max_iter" => self.max_iter = value.expect_usize(name)?,
            "tol" => self.tol = value.expect_positive_f64(name)?,
            _ => {
                return Err(MlError::invalid_param(
                    name,
                    "unknown parameter for LogisticRegression",
                ))
            }
        }
        Ok(())
    }

    fn params(&self) -> ParamSet {
        ParamSet::new()
            .with("C", self.c)
            .with("learning_rate", self.learning_rate)
            .with("max_iter", self.max_iter)
            .with("tol", self.tol)
    }

    fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Tensor<f64>, Tensor<f64>) {
        let x = Tensor::from_vec2d(&[
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![1.0, 1.0],
            vec![5.0, 5.0],
            vec![5.5, 5.5],
            vec![6.0, 6.0],
        ])
        .unwrap();
        let y = Tensor::from_slice(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        (x, y)
    }

    #[test]
    fn test_logistic_regression() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        assert_eq!(pred.data(), y.data());
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.data()[0] < 0.5 && proba.data()[5] > 0.5);
    }

    #[test]
    fn test_stronger_penalty_shrinks_weights() {
        let (x, y) = separable();
        let mut loose = LogisticRegression::new().with_c(100.0);
        let mut tight = LogisticRegression::new().with_c(0.1);
        loose.fit(&x, &y).unwrap();
        tight.fit(&x, &y).unwrap();
        let norm = |m: &LogisticRegression| m.weights().unwrap().iter().map(|w| w * w).sum::<f64>();
        assert!(norm(&tight) < norm(&loose));
    }

    #[test]
    fn test_params_and_errors() {
        let mut model = LogisticRegression::new();
        assert_eq!(model.predict(&Tensor::zeros(vec![1, 2])), Err(MlError::NotFitted));

        model.set_param("C", &ParamValue::Float(10.0)).unwrap();
        model.set_param("max_iter", &ParamValue::Int(50)).unwrap();
        assert_eq!(model.params().get("C"), Some(&ParamValue::Float(10.0)));
        assert_eq!(model.max_iter, 50);
        assert!(model.set_param("C", &ParamValue::Float(-1.0)).is_err());
        assert!(model.set_param("penalty", &ParamValue::Str("l1".into())).is_err());

        let x: Tensor<f64> = Tensor::zeros(vec![3, 1]);
        let y = Tensor::from_slice(&[0.0, 1.0, 2.0]);
        assert!(model.fit(&x, &y).unwrap_err().is_invalid_argument());
    }
}
