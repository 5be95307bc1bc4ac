use cardio_ml_core::{MlError, MlResult, Tensor, Transformer};

fn check_width(expected: usize, x: &Tensor<f64>) -> MlResult<()> {
    let got = x.ncols()?;
    if got != expected {
        return Err(MlError::ShapeMismatch {
            expected: vec![expected],
            got: vec![got],
        });
    }
    Ok(())
}

/// Standardize features by removing the mean and scaling to unit variance.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    pub mean: Option<Vec<f64>>,
    pub scale: Option<Vec<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for StandardScaler {
    fn name(&self) -> &'static str {
        "standardscaler"
    }

    /// Compute mean and std from training data (2D: [samples, features]).
    fn fit(&mut self, x: &Tensor<f64>) -> MlResult<()> {
        let mean = x.mean_axis0()?.into_data();
        // Constant columns keep their centered values.
        let scale = x
            .std_axis0()?
            .into_data()
            .into_iter()
            .map(|s| if s.abs() < f64::EPSILON { 1.0 } else { s })
            .collect();
        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    fn transform(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(MlError::NotFitted);
        };
        check_width(mean.len(), x)?;
        let cols = mean.len();
        let mut out = x.clone();
        for (k, v) in out.data_mut().iter_mut().enumerate() {
            let j = k % cols;
            *v = (*v - mean[j]) / scale[j];
        }
        Ok(out)
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

/// Scale features to the [0, 1] range.
#[derive(Debug, Clone, Default)]
pub struct MinMaxScaler {
    pub min: Option<Vec<f64>>,
    pub max: Option<Vec<f64>>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for MinMaxScaler {
    fn name(&self) -> &'static str {
        "minmaxscaler"
    }

    fn fit(&mut self, x: &Tensor<f64>) -> MlResult<()> {
        let rows = x.nrows()?;
        let cols = x.ncols()?;
        if rows == 0 {
            return Err(MlError::EmptyTensor);
        }
        let mut min_vals = vec![f64::INFINITY; cols];
        let mut max_vals = vec![f64::NEG_INFINITY; cols];
        for i in 0..rows {
            for (j, &v) in x.row(i)?.iter().enumerate() {
                min_vals[j] = min_vals[j].min(v);
                max_vals[j] = max_vals[j].max(v);
            }
        }
        self.min = Some(min_vals);
        self.max = Some(max_vals);
        Ok(())
    }

    fn transform(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let (Some(min), Some(max)) = (&self.min, &self.max) else {
            return Err(MlError::NotFitted);
        };
        check_width(min.len(), x)?;
        let cols = min.len();
        let mut out = x.clone();
        for (k, v) in out.data_mut().iter_mut().enumerate() {
            let j = k % cols;
            let range = max[j] - min[j];
            let range = if range.abs() < f64::EPSILON { 1.0 } else { range };
            *v = (*v - min[j]) / range;
        }
        Ok(out)
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
        ]).unwrap();

        let mut scaler = StandardScaler::new();
        let transformed = scaler.fit_transform(&x).unwrap();

        let mean = transformed.mean_axis0().unwrap();
        assert!(mean.data()[0].abs() < 1e-10);
        assert!(mean.data()[1].abs() < 1e-10);
        let std = transformed.std_axis0().unwrap();
        assert!((std.data()[0] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_standard_scaler_constant_column() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[vec![7.0], vec![7.0]]).unwrap();
        let out = StandardScaler::new().fit_transform(&x).unwrap();
        assert_eq!(out.data(), &[0.0, 0.0]);
    }

    #[test]
    fn test_unfitted_and_width_errors() {
        let x: Tensor<f64> = Tensor::zeros(vec![2, 2]);
        assert_eq!(StandardScaler::new().transform(&x), Err(MlError::NotFitted));

        let mut scaler = MinMaxScaler::new();
        scaler.fit(&x).unwrap();
        assert!(scaler.transform(&Tensor::zeros(vec![2, 3])).is_err());
    }

    #[test]
    fn test_minmax_scaler() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[
            vec![1.0, 10.0],
            vec![5.0, 20.0],
            vec![3.0, 30.0],
        ]).unwrap();

        let mut scaler = MinMaxScaler::new();
        let transformed = scaler.fit_transform(&x).unwrap();

        for j in 0..2 {
            let col = Tensor::from_slice(&transformed.col(j).unwrap());
            assert!(col.min_all().unwrap().abs() < 1e-10);
            assert!((col.max_all().unwrap() - 1.0).abs() < 1e-10);
        }
    }
}
