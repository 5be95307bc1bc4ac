use std::fmt;

use cardio_ml_core::estimator::{check_binary, check_xy};
use cardio_ml_core::{Estimator, MlError, MlResult, ParamSet, ParamValue, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Kernel type for SVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Linear,
    Rbf,
    Poly,
}

impl Kernel {
    fn parse(name: &str) -> MlResult<Self> {
        match name {
            "linear" => Ok(Kernel::Linear),
            "rbf" => Ok(Kernel::Rbf),
            "poly" => Ok(Kernel::Poly),
            other => Err(MlError::invalid_param(
                "kernel",
                format!("expected 'linear', 'rbf' or 'poly', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kernel::Linear => "linear",
            Kernel::Rbf => "rbf",
            Kernel::Poly => "poly",
        };
        write!(f, "{}", s)
    }
}

/// Kernel coefficient for `rbf` and `poly`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma {
    /// `1 / (n_features * X.var())`
    Scale,
    /// `1 / n_features`
    Auto,
    Value(f64),
}

impl Gamma {
    fn resolve(self, x: &Tensor<f64>) -> MlResult<f64> {
        let d = x.ncols()? as f64;
        Ok(match self {
            Gamma::Value(g) => g,
            Gamma::Auto => 1.0 / d,
            Gamma::Scale => {
                let data = x.data();
                let n = data.len() as f64;
                let mean = data.iter().sum::<f64>() / n;
                let var = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                if var > 0.0 {
                    1.0 / (d * var)
                } else {
                    1.0
                }
            }
        })
    }

    fn to_param(self) -> ParamValue {
        match self {
            Gamma::Scale => ParamValue::from("scale"),
            Gamma::Auto => ParamValue::from("auto"),
            Gamma::Value(g) => ParamValue::Float(g),
        }
    }
}

#[derive(Debug, Clone)]
struct SvcModel {
    support: Tensor<f64>,
    /// `alpha_i * y_i` for each support vector.
    dual_coef: Vec<f64>,
    bias: f64,
    gamma: f64,
}

/// Support Vector Classifier using simplified SMO.
///
/// Binary only; class 1 is the positive side of the decision function.
/// The second multiplier of each SMO step is drawn from `random_state`.
#[derive(Debug, Clone)]
pub struct SVC {
    pub c: f64,
    pub kernel: Kernel,
    pub gamma: Gamma,
    pub degree: usize,
    pub coef0: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub random_state: Option<u64>,
    model: Option<SvcModel>,
}

impl Default for SVC {
    fn default() -> Self {
        SVC {
            c: 1.0,
            kernel: Kernel::Rbf,
            gamma: Gamma::Scale,
            degree: 3,
            coef0: 0.0,
            max_iter: 100,
            tol: 1e-3,
            random_state: None,
            model: None,
        }
    }
}

impl SVC {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Number of support vectors of the fitted model.
    pub fn n_support(&self) -> Option<usize> {
        self.model.as_ref().map(|m| m.dual_coef.len())
    }

    fn kernel_eval(&self, gamma: f64, a: &[f64], b: &[f64]) -> f64 {
        match self.kernel {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf => {
                let sq_dist: f64 = a.iter().zip(b).map(|(u, v)| (u - v) * (u - v)).sum();
                (-gamma * sq_dist).exp()
            }
            Kernel::Poly => (gamma * dot(a, b) + self.coef0).powi(self.degree as i32),
        }
    }

    /// Signed distance-like score per row; positive means class 1.
    pub fn decision_function(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let model = self.model.as_ref().ok_or(MlError::NotFitted)?;
        let n = x.nrows()?;
        let d = x.ncols()?;
        let expected = model.support.ncols()?;
        if d != expected {
            return Err(MlError::ShapeMismatch {
                expected: vec![expected],
                got: vec![d],
            });
        }
        let mut scores = Vec::with_capacity(n);
        for i in 0..n {
            let row = x.row(i)?;
            let mut f = model.bias;
            for (s, coef) in model.dual_coef.iter().enumerate() {
                f += coef * self.kernel_eval(model.gamma, model.support.row(s)?, row);
            }
            scores.push(f);
        }
        Ok(Tensor::from_slice(&scores))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(u, v)| u * v).sum()
}

impl Estimator for SVC {
    fn name(&self) -> &'static str {
        "svc"
    }

    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        check_xy(x, y)?;
        check_binary("SVC", y)?;
        let n = x.nrows()?;
        let gamma = self.gamma.resolve(x)?;

        // Convert labels to +1/-1
        let labels: Vec<f64> = y
            .data()
            .iter()
            .map(|&v| if v.round() == 1.0 { 1.0 } else { -1.0 })
            .collect();

        if labels.iter().all(|&l| l == labels[0]) {
            self.model = Some(SvcModel {
                support: Tensor::zeros(vec![0, x.ncols()?]),
                dual_coef: Vec::new(),
                bias: labels[0],
                gamma,
            });
            return Ok(());
        }

        let mut kernel = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                let k = self.kernel_eval(gamma, x.row(i)?, x.row(j)?);
                kernel[i * n + j] = k;
                kernel[j * n + i] = k;
            }
        }
        let k = |i: usize, j: usize| kernel[i * n + j];

        let mut rng = match self.random_state {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut alphas = vec![0.0; n];
        let mut b = 0.0;
        let f = |alphas: &[f64], b: f64, i: usize| -> f64 {
            b + (0..n)
                .filter(|&j| alphas[j] != 0.0)
                .map(|j| alphas[j] * labels[j] * k(j, i))
                .sum::<f64>()
        };

        for _pass in 0..self.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let yi = labels[i];
                let ei = f(&alphas, b, i) - yi;
                if !((yi * ei < -self.tol && alphas[i] < self.c)
                    || (yi * ei > self.tol && alphas[i] > 0.0))
                {
                    continue;
                }

                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let yj = labels[j];
                let ej = f(&alphas, b, j) - yj;

                let ai_old = alphas[i];
                let aj_old = alphas[j];

                let (lo, hi) = if yi != yj {
                    ((aj_old - ai_old).max(0.0), self.c.min(self.c + aj_old - ai_old))
                } else {
                    ((ai_old + aj_old - self.c).max(0.0), self.c.min(ai_old + aj_old))
                };
                if (lo - hi).abs() < f64::EPSILON {
                    continue;
                }

                let eta = 2.0 * k(i, j) - k(i, i) - k(j, j);
                if eta >= 0.0 {
                    continue;
                }

                alphas[j] = (aj_old - yj * (ei - ej) / eta).max(lo).min(hi);
                if (alphas[j] - aj_old).abs() < 1e-5 {
                    continue;
                }
                alphas[i] = ai_old + yi * yj * (aj_old - alphas[j]);

                let di = yi * (alphas[i] - ai_old);
                let dj = yj * (alphas[j] - aj_old);
                let b1 = b - ei - di * k(i, i) - dj * k(i, j);
                let b2 = b - ej - di * k(i, j) - dj * k(j, j);

                b = if alphas[i] > 0.0 && alphas[i] < self.c {
                    b1
                } else if alphas[j] > 0.0 && alphas[j] < self.c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                num_changed += 1;
            }

            if num_changed == 0 {
                break;
            }
        }

        let support_idx: Vec<usize> = (0..n).filter(|&i| alphas[i] > f64::EPSILON).collect();
        self.model = Some(SvcModel {
            support: x.select_rows(&support_idx)?,
            dual_coef: support_idx.iter().map(|&i| alphas[i] * labels[i]).collect(),
            bias: b,
            gamma,
        });
        Ok(())
    }

    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        Ok(self
            .decision_function(x)?
            .apply(|f| if f >= 0.0 { 1.0 } else { 0.0 }))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> MlResult<()> {
        match name {
            "C" => self.c = value.expect_positive_f64(name)?,
            "kernel" => self.kernel = Kernel::parse(value.expect_str(name)?)?,
            "gamma" => {
                self.gamma = match value {
                    ParamValue::Str(s) if s == "scale" => Gamma::Scale,
                    ParamValue::Str(s) if s == "auto" => Gamma::Auto,
                    _ => Gamma::Value(value.expect_positive_f64(name)?),
                }
            }
            "degree" => self.degree = value.expect_usize(name)?,
            "coef0" => {
                self.coef0 = value
                    .as_f64()
                    .ok_or_else(|| MlError::invalid_param(name, "expected a number"))?
            }
            "max_iter" => self.max_iter = value.expect_usize(name)?,
            "tol" => self.tol = value.expect_positive_f64(name)?,
            "random_state" => {
                self.random_state = value.expect_optional_usize(name)?.map(|s| s as u64)
            }
            _ => return Err(MlError::invalid_param(name, "unknown parameter for SVC")),
        }
        Ok(())
    }

    fn params(&self) -> ParamSet {
        ParamSet::new()
            .with("C", self.c)
            .with("kernel", self.kernel.to_string().as_str())
            .with("gamma", self.gamma.to_param())
            .with("degree", self.degree)
            .with("coef0", self.coef0)
            .with("max_iter", self.max_iter)
            .with("tol", self.tol)
            .with("random_state", self.random_state.map(|s| s as usize))
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
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
            vec![0.0, 0.0], vec![0.5, 0.5], vec![1.0, 1.0],
            vec![5.0, 5.0], vec![5.5, 5.5], vec![6.0, 6.0],
        ]).unwrap();
        let y = Tensor::from_slice(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        (x, y)
    }

    fn n_correct(pred: &Tensor<f64>, y: &Tensor<f64>) -> usize {
        pred.data().iter().zip(y.data()).filter(|(p, t)| (*p - *t).abs() < 0.5).count()
    }

    #[test]
    fn test_svc_linear() {
        let (x, y) = separable();
        let mut svc = SVC::new().with_kernel(Kernel::Linear).with_random_state(0);
        svc.fit(&x, &y).unwrap();
        let pred = svc.predict(&x).unwrap();
        let correct = n_correct(&pred, &y);
        assert!(correct >= 5, "SVM classified {} out of 6", correct);
        assert!(svc.n_support().unwrap() > 0);
    }

    #[test]
    fn test_svc_rbf_default() {
        let (x, y) = separable();
        let mut svc = SVC::new().with_random_state(1);
        svc.fit(&x, &y).unwrap();
        let correct = n_correct(&svc.predict(&x).unwrap(), &y);
        assert!(correct >= 5, "SVM classified {} out of 6", correct);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = separable();
        let mut a = SVC::new().with_random_state(3);
        let mut b = SVC::new().with_random_state(3);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.decision_function(&x).unwrap(), b.decision_function(&x).unwrap());
    }

    #[test]
    fn test_single_class_training_set() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[vec![1.0], vec![2.0]]).unwrap();
        let mut svc = SVC::new();
        svc.fit(&x, &Tensor::from_slice(&[0.0, 0.0])).unwrap();
        assert_eq!(svc.predict(&x).unwrap().data(), &[0.0, 0.0]);
        svc.fit(&x, &Tensor::from_slice(&[1.0, 1.0])).unwrap();
        assert_eq!(svc.predict(&x).unwrap().data(), &[1.0, 1.0]);
    }

    #[test]
    fn test_gamma_scale() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[vec![0.0, 2.0], vec![2.0, 0.0]]).unwrap();
        // var of [0, 2, 2, 0] is 1, two features
        assert!((Gamma::Scale.resolve(&x).unwrap() - 0.5).abs() < 1e-12);
        assert!((Gamma::Auto.resolve(&x).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_params() {
        let mut svc = SVC::new();
        assert_eq!(svc.predict(&Tensor::zeros(vec![1, 1])), Err(MlError::NotFitted));
        svc.set_param("gamma", &ParamValue::Float(0.1)).unwrap();
        svc.set_param("kernel", &ParamValue::Str("linear".into())).unwrap();
        assert_eq!(svc.gamma, Gamma::Value(0.1));
        assert_eq!(svc.params().get("kernel"), Some(&ParamValue::Str("linear".into())));
        svc.set_param("gamma", &ParamValue::Str("auto".into())).unwrap();
        assert_eq!(svc.params().get("gamma"), Some(&ParamValue::Str("auto".into())));
        assert!(svc.set_param("kernel", &ParamValue::Str("sigmoid".into())).is_err());
        assert!(svc.set_param("gamma", &ParamValue::Str("huge".into())).is_err());
    }
}
