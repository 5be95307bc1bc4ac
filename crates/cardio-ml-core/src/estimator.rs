use std::fmt;

use crate::error::{MlError, MlResult};
use crate::params::{ParamSet, ParamValue};
use crate::tensor::Tensor;

/// Unsupervised feature transform (scalers, encoders, column transformers).
pub trait Transformer: Send + Sync {
    /// Lowercase type name, used as the pipeline step name.
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: &Tensor<f64>) -> MlResult<()>;

    fn transform(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>>;

    fn fit_transform(&mut self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    fn set_param(&mut self, name: &str, _value: &ParamValue) -> MlResult<()> {
        Err(MlError::invalid_param(
            name,
            format!("{} has no tunable parameters", self.name()),
        ))
    }

    fn clone_box(&self) -> Box<dyn Transformer>;
}

/// Supervised classifier. Labels are encoded class indices stored as `f64`.
pub trait Estimator: Send + Sync {
    /// Lowercase type name, used as the pipeline step name.
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()>;

    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>>;

    /// Set one hyperparameter by its bare name (no step prefix).
    fn set_param(&mut self, name: &str, value: &ParamValue) -> MlResult<()>;

    /// Current hyperparameters.
    fn params(&self) -> ParamSet;

    fn is_fitted(&self) -> bool;

    fn clone_box(&self) -> Box<dyn Estimator>;
}

impl Clone for Box<dyn Transformer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl Clone for Box<dyn Estimator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl fmt::Debug for dyn Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name())
    }
}

impl fmt::Debug for dyn Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.params())
    }
}

/// Number of classes implied by encoded labels (`max + 1`).
pub fn class_count(y: &Tensor<f64>) -> usize {
    y.data()
        .iter()
        .map(|v| v.round().max(0.0) as usize + 1)
        .max()
        .unwrap_or(0)
}

/// Reject feature matrices holding `NaN` or infinite values.
pub fn check_finite(x: &Tensor<f64>) -> MlResult<()> {
    let cols = x.ncols()?;
    if let Some(k) = x.data().iter().position(|v| !v.is_finite()) {
        return Err(MlError::InvalidArgument(format!(
            "input contains NaN or infinity (row {}, column {})",
            k / cols.max(1),
            k % cols.max(1)
        )));
    }
    Ok(())
}

/// Check that `x` has one row per label and only finite values.
pub fn check_xy(x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
    let n = x.nrows()?;
    if n != y.numel() {
        return Err(MlError::ShapeMismatch {
            expected: vec![n],
            got: vec![y.numel()],
        });
    }
    if n == 0 {
        return Err(MlError::EmptyTensor);
    }
    check_finite(x)
}

/// Reject label sets a binary-only classifier cannot learn.
pub fn check_binary(estimator: &str, y: &Tensor<f64>) -> MlResult<()> {
    let k = class_count(y);
    if k > 2 {
        return Err(MlError::InvalidArgument(format!(
            "{} supports binary targets only, got {} classes",
            estimator, k
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_count() {
        assert_eq!(class_count(&Tensor::from_slice(&[0.0, 2.0, 1.0])), 3);
        assert_eq!(class_count(&Tensor::from_slice(&[])), 0);
    }

    #[test]
    fn test_check_xy_and_binary() {
        let x: Tensor<f64> = Tensor::zeros(vec![3, 2]);
        assert!(check_xy(&x, &Tensor::from_slice(&[0.0, 1.0, 0.0])).is_ok());
        assert!(check_xy(&x, &Tensor::from_slice(&[0.0, 1.0])).is_err());
        assert!(check_binary("svc", &Tensor::from_slice(&[0.0, 1.0])).is_ok());
        assert!(check_binary("svc", &Tensor::from_slice(&[0.0, 2.0])).is_err());
    }

    #[test]
    fn test_non_finite_features_rejected() {
        let y = Tensor::from_slice(&[0.0, 1.0]);
        let x: Tensor<f64> = Tensor::from_vec2d(&[vec![1.0, 2.0], vec![f64::NAN, 3.0]]).unwrap();
        let err = check_xy(&x, &y).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("row 1, column 0"));
        let inf: Tensor<f64> = Tensor::from_vec2d(&[vec![f64::INFINITY], vec![0.0]]).unwrap();
        assert!(check_finite(&inf).is_err());
    }
}
