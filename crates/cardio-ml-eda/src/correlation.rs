use cardio_ml_core::MlResult;
use cardio_ml_data::{Column, DataFrame};
use serde::Serialize;

/// Square Pearson correlation table over named columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }

    /// Long form `(feature_x, feature_y, correlation)`, row-major.
    pub fn to_long(&self) -> Vec<(String, String, f64)> {
        let mut out = Vec::with_capacity(self.names.len() * self.names.len());
        for (i, x) in self.names.iter().enumerate() {
            for (j, y) in self.names.iter().enumerate() {
                out.push((x.clone(), y.clone(), self.values[i][j]));
            }
        }
        out
    }
}

/// Pearson correlation over pairs where both values are present.
/// `NaN` when fewer than two pairs remain or either side is constant.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .collect();
    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Correlation of the given columns. Text columns (typically the target)
/// are mapped to 1 where the value equals `pos_label` and 0 elsewhere.
pub fn correlation_matrix(
    frame: &DataFrame,
    columns: &[String],
    pos_label: &str,
) -> MlResult<CorrelationMatrix> {
    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| {
            Ok(match frame.column(name)? {
                Column::Numeric(v) => v.clone(),
                Column::Text(v) => v
                    .iter()
                    .map(|s| if s == pos_label { 1.0 } else { 0.0 })
                    .collect(),
            })
        })
        .collect::<MlResult<_>>()?;

    let k = series.len();
    let mut values = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Ok(CorrelationMatrix {
        names: columns.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            ("age".to_string(), Column::Numeric(vec![40.0, 50.0, 60.0, 70.0])),
            ("max_heart_rate".to_string(), Column::Numeric(vec![180.0, 170.0, 150.0, 120.0])),
            (
                "target".to_string(),
                Column::Text(
                    ["No Heart Disease", "No Heart Disease", "Heart Disease", "Heart Disease"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            ),
        ])
        .unwrap()
    }

    fn names() -> Vec<String> {
        ["age", "max_heart_rate", "target"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_self_correlation_is_one() {
        let m = correlation_matrix(&frame(), &names(), "Heart Disease").unwrap();
        for n in names() {
            assert!((m.get(&n, &n).unwrap() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_signs_and_symmetry() {
        let m = correlation_matrix(&frame(), &names(), "Heart Disease").unwrap();
        assert!(m.get("age", "target").unwrap() > 0.8);
        assert!(m.get("max_heart_rate", "target").unwrap() < -0.8);
        assert_eq!(m.get("age", "target"), m.get("target", "age"));
        assert_eq!(m.to_long().len(), 9);
    }

    #[test]
    fn test_pearson_edge_cases() {
        assert!((pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!((pearson(&[1.0, f64::NAN, 3.0, 4.0], &[2.0, 9.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!(pearson(&[1.0], &[2.0]).is_nan());
    }

    #[test]
    fn test_unknown_column() {
        let cols = vec!["cholesterol".to_string()];
        assert!(correlation_matrix(&frame(), &cols, "Heart Disease").is_err());
    }
}
