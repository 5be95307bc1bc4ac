use cardio_ml_core::{MlError, MlResult, Tensor};
use serde::{Deserialize, Serialize};

/// A typed column. Missing numeric values are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Column::Text(v) => Some(v),
            Column::Numeric(_) => None,
        }
    }

    /// Values as strings; numbers keep their shortest form (`1` not `1.0`).
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Column::Text(v) => v.clone(),
            Column::Numeric(v) => v.iter().map(|x| x.to_string()).collect(),
        }
    }

    /// Infer a column from raw fields: numeric when every non-empty field
    /// parses as a number and at least one does.
    pub fn infer(fields: Vec<String>) -> Column {
        let parsed: Option<Vec<f64>> = fields
            .iter()
            .map(|f| {
                let f = f.trim();
                if f.is_empty() {
                    Some(f64::NAN)
                } else {
                    f.parse::<f64>().ok()
                }
            })
            .collect();
        match parsed {
            Some(values) if values.iter().any(|v| !v.is_nan()) => Column::Numeric(values),
            _ => Column::Text(fields),
        }
    }

    fn select(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&i| v[i]).collect()),
            Column::Text(v) => Column::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

/// Ordered, named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl DataFrame {
    pub fn new(columns: Vec<(String, Column)>) -> MlResult<Self> {
        let mut frame = DataFrame::default();
        for (name, column) in columns {
            frame.push(name, column)?;
        }
        Ok(frame)
    }

    /// Build from a header and row-major string records, inferring types.
    pub fn from_records(header: Vec<String>, records: Vec<Vec<String>>) -> MlResult<Self> {
        let width = header.len();
        if let Some((i, r)) = records.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(MlError::InvalidArgument(format!(
                "record {} has {} fields, expected {}",
                i + 1,
                r.len(),
                width
            )));
        }
        let mut fields: Vec<Vec<String>> = vec![Vec::with_capacity(records.len()); width];
        for record in records {
            for (j, value) in record.into_iter().enumerate() {
                fields[j].push(value);
            }
        }
        DataFrame::new(
            header
                .into_iter()
                .zip(fields)
                .map(|(name, f)| (name, Column::infer(f)))
                .collect(),
        )
    }

    pub fn push(&mut self, name: impl Into<String>, column: Column) -> MlResult<()> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(MlError::InvalidArgument(format!("duplicate column '{}'", name)));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(MlError::ShapeMismatch {
                expected: vec![self.n_rows()],
                got: vec![column.len()],
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn column(&self, name: &str) -> MlResult<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| MlError::InvalidArgument(format!("no column named '{}'", name)))
    }

    /// Names of the numeric columns, in order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, c)| c.is_numeric())
            .map(|(n, _)| n.to_string())
            .collect()
    }

    /// A copy without the named column.
    pub fn drop(&self, name: &str) -> MlResult<DataFrame> {
        self.column(name)?;
        Ok(DataFrame {
            names: self.names.iter().filter(|n| *n != name).cloned().collect(),
            columns: self
                .iter()
                .filter(|(n, _)| *n != name)
                .map(|(_, c)| c.clone())
                .collect(),
        })
    }

    /// A copy with only the given rows.
    pub fn select_rows(&self, rows: &[usize]) -> MlResult<DataFrame> {
        let n = self.n_rows();
        if let Some(&bad) = rows.iter().find(|&&i| i >= n) {
            return Err(MlError::IndexOutOfBounds {
                index: bad,
                axis: 0,
                size: n,
            });
        }
        Ok(DataFrame {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
        })
    }

    /// Separate the target column, returned as string labels.
    /// A blank or `NaN` label is an error.
    pub fn split_target(&self, target: &str) -> MlResult<(DataFrame, Vec<String>)> {
        let column = self.column(target)?;
        let missing = match column {
            Column::Numeric(v) => v.iter().position(|x| x.is_nan()),
            Column::Text(v) => v.iter().position(|s| s.trim().is_empty()),
        };
        if let Some(row) = missing {
            return Err(MlError::InvalidArgument(format!(
                "target column '{}' has a missing label in row {}",
                target, row
            )));
        }
        Ok((self.drop(target)?, column.to_strings()))
    }

    /// All columns as a `[rows, cols]` matrix. Every column must be numeric
    /// with no missing values.
    pub fn to_matrix(&self) -> MlResult<Tensor<f64>> {
        let columns = self
            .iter()
            .map(|(name, c)| {
                let values = c.as_numeric().ok_or_else(|| {
                    MlError::InvalidArgument(format!(
                        "column '{}' is not numeric; encode it before modelling",
                        name
                    ))
                })?;
                if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                    return Err(MlError::InvalidArgument(format!(
                        "column '{}' has a missing or non-finite value in row {}",
                        name, row
                    )));
                }
                Ok(values.to_vec())
            })
            .collect::<MlResult<Vec<Vec<f64>>>>()?;
        Tensor::from_columns(&columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heart() -> DataFrame {
        let header = vec!["age".to_string(), "chest_pain".to_string(), "target".to_string()];
        let records = vec![
            vec!["63", "3", "Heart Disease"],
            vec!["37", "2", "No Heart Disease"],
            vec!["41", "", "Heart Disease"],
        ]
        .into_iter()
        .map(|r| r.into_iter().map(String::from).collect())
        .collect();
        DataFrame::from_records(header, records).unwrap()
    }

    #[test]
    fn test_type_inference() {
        let df = heart();
        assert_eq!(df.n_rows(), 3);
        assert_eq!(df.n_cols(), 3);
        assert!(df.column("age").unwrap().is_numeric());
        assert!(df.column("chest_pain").unwrap().as_numeric().unwrap()[2].is_nan());
        assert!(!df.column("target").unwrap().is_numeric());
        assert_eq!(df.numeric_columns(), vec!["age", "chest_pain"]);
    }

    #[test]
    fn test_split_target_and_matrix() {
        let (features, labels) = heart().split_target("target").unwrap();
        assert_eq!(labels[1], "No Heart Disease");
        assert_eq!(features.column_names(), &["age".to_string(), "chest_pain".to_string()]);
        let x = features.select_rows(&[0, 1]).unwrap().to_matrix().unwrap();
        assert_eq!(x.shape_vec(), vec![2, 2]);
        assert_eq!(x.row(0).unwrap(), &[63.0, 3.0]);

        assert!(heart().to_matrix().is_err());
        assert!(heart().split_target("outcome").is_err());
    }

    #[test]
    fn test_missing_values_rejected() {
        let (features, _) = heart().split_target("target").unwrap();
        let err = features.to_matrix().unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("chest_pain"));

        let blank_label = DataFrame::from_records(
            vec!["age".to_string(), "target".to_string()],
            vec![
                vec!["63".to_string(), "Heart Disease".to_string()],
                vec!["37".to_string(), "".to_string()],
            ],
        )
        .unwrap();
        assert!(blank_label.split_target("target").unwrap_err().is_invalid_argument());

        let nan_label = DataFrame::new(vec![
            ("x".to_string(), Column::Numeric(vec![1.0, 2.0])),
            ("target".to_string(), Column::Numeric(vec![1.0, f64::NAN])),
        ])
        .unwrap();
        assert!(nan_label.split_target("target").is_err());
    }

    #[test]
    fn test_numeric_target_as_strings() {
        let df = DataFrame::new(vec![
            ("x".to_string(), Column::Numeric(vec![1.5, 2.5])),
            ("target".to_string(), Column::Numeric(vec![0.0, 1.0])),
        ])
        .unwrap();
        let (_, labels) = df.split_target("target").unwrap();
        assert_eq!(labels, vec!["0", "1"]);
    }

    #[test]
    fn test_shape_checks() {
        let mut df = DataFrame::default();
        df.push("a", Column::Numeric(vec![1.0, 2.0])).unwrap();
        assert!(df.push("b", Column::Numeric(vec![1.0])).is_err());
        assert!(df.push("a", Column::Numeric(vec![1.0, 2.0])).is_err());

        let ragged = DataFrame::from_records(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["1".to_string()]],
        );
        assert!(ragged.is_err());
    }

    #[test]
    fn test_select_rows() {
        let df = heart().select_rows(&[2, 0]).unwrap();
        assert_eq!(df.column("age").unwrap().as_numeric().unwrap(), &[41.0, 63.0]);
        assert!(heart().select_rows(&[3]).is_err());
    }
}
