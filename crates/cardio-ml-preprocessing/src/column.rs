use cardio_ml_core::{MlError, MlResult, Tensor, Transformer};
use serde::{Deserialize, Serialize};

use crate::{MinMaxScaler, OneHotEncoder, StandardScaler};

/// What happens to columns no block claims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Remainder {
    #[default]
    Drop,
    Passthrough,
}

/// One group of columns and the transform applied to it.
/// `transformer: None` passes the columns through unchanged.
#[derive(Clone)]
pub struct ColumnBlock {
    pub name: String,
    pub transformer: Option<Box<dyn Transformer>>,
    pub columns: Vec<usize>,
}

/// Applies a transform per column group and concatenates the results
/// in block order, followed by remainder columns when passed through.
#[derive(Clone, Default)]
pub struct ColumnTransformer {
    blocks: Vec<ColumnBlock>,
    remainder: Remainder,
    n_features_in: Option<usize>,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transformed block.
    pub fn add(mut self, name: &str, transformer: Box<dyn Transformer>, columns: Vec<usize>) -> Self {
        self.blocks.push(ColumnBlock {
            name: name.to_string(),
            transformer: Some(transformer),
            columns,
        });
        self
    }

    /// Add a block that is copied unchanged.
    pub fn passthrough(mut self, name: &str, columns: Vec<usize>) -> Self {
        self.blocks.push(ColumnBlock {
            name: name.to_string(),
            transformer: None,
            columns,
        });
        self
    }

    pub fn remainder(mut self, remainder: Remainder) -> Self {
        self.remainder = remainder;
        self
    }

    pub fn blocks(&self) -> &[ColumnBlock] {
        &self.blocks
    }

    fn remainder_columns(&self, n_features: usize) -> Vec<usize> {
        match self.remainder {
            Remainder::Drop => Vec::new(),
            Remainder::Passthrough => (0..n_features)
                .filter(|j| !self.blocks.iter().any(|b| b.columns.contains(j)))
                .collect(),
        }
    }
}

impl Transformer for ColumnTransformer {
    fn name(&self) -> &'static str {
        "columntransformer"
    }

    fn fit(&mut self, x: &Tensor<f64>) -> MlResult<()> {
        let n_features = x.ncols()?;
        if self.blocks.iter().all(|b| b.columns.is_empty())
            && self.remainder_columns(n_features).is_empty()
        {
            return Err(MlError::InvalidArgument(
                "column transformer selects no columns".to_string(),
            ));
        }
        for block in &mut self.blocks {
            if block.columns.is_empty() {
                continue;
            }
            let part = x.select_cols(&block.columns)?;
            if let Some(t) = block.transformer.as_mut() {
                t.fit(&part)?;
            }
        }
        self.n_features_in = Some(n_features);
        Ok(())
    }

    fn transform(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let n_features = self.n_features_in.ok_or(MlError::NotFitted)?;
        let got = x.ncols()?;
        if got != n_features {
            return Err(MlError::ShapeMismatch {
                expected: vec![n_features],
                got: vec![got],
            });
        }
        let mut parts = Vec::with_capacity(self.blocks.len() + 1);
        for block in &self.blocks {
            if block.columns.is_empty() {
                continue;
            }
            let part = x.select_cols(&block.columns)?;
            parts.push(match &block.transformer {
                Some(t) => t.transform(&part)?,
                None => part,
            });
        }
        let rest = self.remainder_columns(n_features);
        if !rest.is_empty() {
            parts.push(x.select_cols(&rest)?);
        }
        let refs: Vec<&Tensor<f64>> = parts.iter().collect();
        Tensor::hstack(&refs)
    }

    fn clone_box(&self) -> Box<dyn Transformer> {
        Box::new(self.clone())
    }
}

/// Scaler applied to numeric columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalerKind {
    #[default]
    Standard,
    MinMax,
}

/// Serializable description of the preprocessing stage, by column name.
///
/// ```json
/// {"numeric": ["age"], "categorical": ["chest_pain"], "passthrough": [], "remainder": "drop"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorSpec {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub passthrough: Vec<String>,
    pub remainder: Remainder,
    pub scaler: ScalerKind,
}

impl PreprocessorSpec {
    /// Resolve column names against `feature_names` into an unfitted transformer.
    pub fn build(&self, feature_names: &[String]) -> MlResult<ColumnTransformer> {
        let resolve = |names: &[String]| -> MlResult<Vec<usize>> {
            names
                .iter()
                .map(|n| {
                    feature_names.iter().position(|f| f == n).ok_or_else(|| {
                        MlError::InvalidArgument(format!("unknown feature column '{}'", n))
                    })
                })
                .collect()
        };
        let scaler: Box<dyn Transformer> = match self.scaler {
            ScalerKind::Standard => Box::new(StandardScaler::new()),
            ScalerKind::MinMax => Box::new(MinMaxScaler::new()),
        };
        Ok(ColumnTransformer::new()
            .add("numeric", scaler, resolve(&self.numeric)?)
            .add("categorical", Box::new(OneHotEncoder::new()), resolve(&self.categorical)?)
            .passthrough("passthrough", resolve(&self.passthrough)?)
            .remainder(self.remainder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Tensor<f64> {
        Tensor::from_vec2d(&[
            vec![20.0, 0.0, 5.0],
            vec![40.0, 1.0, 6.0],
            vec![60.0, 1.0, 7.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_column_transformer_blocks_and_drop() {
        let mut ct = ColumnTransformer::new()
            .add("num", Box::new(StandardScaler::new()), vec![0])
            .add("cat", Box::new(OneHotEncoder::new()), vec![1]);
        let out = ct.fit_transform(&frame()).unwrap();
        assert_eq!(out.shape_vec(), vec![3, 3]);
        assert!(out.get(&[1, 0]).unwrap().abs() < 1e-12);
        assert_eq!(&out.row(0).unwrap()[1..], &[1.0, 0.0]);
    }

    #[test]
    fn test_column_transformer_remainder_passthrough() {
        let mut ct = ColumnTransformer::new()
            .add("cat", Box::new(OneHotEncoder::new()), vec![1])
            .remainder(Remainder::Passthrough);
        let out = ct.fit_transform(&frame()).unwrap();
        assert_eq!(out.row(2).unwrap(), &[0.0, 1.0, 60.0, 7.0]);
    }

    #[test]
    fn test_column_transformer_requires_fit_and_columns() {
        let ct = ColumnTransformer::new().passthrough("p", vec![0]);
        assert_eq!(ct.transform(&frame()), Err(MlError::NotFitted));

        let mut empty = ColumnTransformer::new();
        assert!(empty.fit(&frame()).is_err());
    }

    #[test]
    fn test_spec_from_json() {
        let spec: PreprocessorSpec = serde_json::from_str(
            r#"{"numeric": ["age"], "categorical": ["gender"], "passthrough": ["slope"]}"#,
        )
        .unwrap();
        assert_eq!(spec.remainder, Remainder::Drop);
        let names: Vec<String> = ["age", "gender", "slope"].iter().map(|s| s.to_string()).collect();
        let mut ct = spec.build(&names).unwrap();
        let out = ct.fit_transform(&frame()).unwrap();
        assert_eq!(out.shape_vec(), vec![3, 4]);
        assert_eq!(out.get(&[0, 3]).unwrap(), 5.0);

        let bad = PreprocessorSpec {
            numeric: vec!["cholesterol".into()],
            ..Default::default()
        };
        assert!(bad.build(&names).is_err());
    }
}
