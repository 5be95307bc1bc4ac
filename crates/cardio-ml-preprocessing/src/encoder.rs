use cardio_ml_core::{MlError, MlResult, Tensor, Transformer};
use std::collections::HashMap;

/// Encode string class labels as integer indices (classes sorted).
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
    pub class_to_idx: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder on string labels.
    pub fn fit(&mut self, labels: &[String]) {
        let mut unique: Vec<String> = labels.to_vec();
        unique.sort();
        unique.dedup();
        self.class_to_idx = unique
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        self.classes = unique;
    }

    /// Fit and encode in one step.
    pub fn fit_transform(&mut self, labels: &[String]) -> MlResult<Tensor<f64>> {
        self.fit(labels);
        self.transform(labels)
    }

    /// Transform string labels to an index tensor.
    pub fn transform(&self, labels: &[String]) -> MlResult<Tensor<f64>> {
        let data = labels
            .iter()
            .map(|l| self.index_of(l).map(|i| i as f64))
            .collect::<MlResult<Vec<f64>>>()?;
        Ok(Tensor::from_slice(&data))
    }

    /// Index of a class, or `UnknownLabel`.
    pub fn index_of(&self, label: &str) -> MlResult<usize> {
        self.class_to_idx
            .get(label)
            .copied()
            .ok_or_else(|| MlError::UnknownLabel {
                label: label.to_string(),
                classes: self.classes.clone(),
            })
    }

    /// Inverse transform: index → class name.
    pub fn inverse_transform(&self, encoded: &Tensor<f64>) -> MlResult<Vec<String>> {
        encoded
            .data()
            .iter()
            .map(|v| {
                let idx = v.round() as usize;
                self.classes
                    .get(idx)
                    .cloned()
                    .ok_or(MlError::IndexOutOfBounds {
                        index: idx,
                        axis: 0,
                        size: self.classes.len(),
                    })
            })
            .collect()
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

/// One-hot encode numerically coded categorical columns.
///
/// Categories are learned per column during `fit`; values unseen at fit
/// time encode as all zeros.
#[derive(Debug, Clone, Default)]
pub struct OneHotEncoder {
    pub categories: Option<Vec<Vec<f64>>>,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width of the encoded output.
    pub fn n_output_features(&self) -> usize {
        self.categories
            .as_ref()
            .map(|c| c.iter().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

impl Transformer for OneHotEncoder {
    fn name(&self) -> &'static str {
        "onehotencoder"
    }

    fn fit(&mut self, x: &Tensor<f64>) -> MlResult<()> {
        let cols = x.ncols()?;
        let mut categories = Vec::with_capacity(cols);
        for j in 0..cols {
            let mut values = x.col(j)?;
            if values.iter().any(|v| v.is_nan()) {
                return Err(MlError::InvalidArgument(format!(
                    "column {} contains NaN, which cannot be one-hot encoded",
                    j
                )));
            }
            values.sort_by(f64::total_cmp);
            values.dedup();
            categories.push(values);
        }
        self.categories = Some(categories);
        Ok(())
    }

    fn transform(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let categories = self.categories.as_ref().ok_or(MlError::NotFitted)?;
        let rows = x.nrows()?;
        let cols = x.ncols()?;
        if cols != categories.len() {
            return Err(MlError::ShapeMismatch {
                expected: vec![categories.len()],
                got: vec![cols],
            });
        }
        let width = self.n_output_features();
        let mut data = Vec::with_capacity(rows * width);
        for i in 0..rows {
            for (v, cats) in x.row(i)?.iter().zip(categories) {
                data.extend(cats.iter().map(|c| if c == v { 1.0 } else { 0.0 }));
            }
        }
        Tensor::new(data, vec![rows, width])
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}
