use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MlError, MlResult};

/// A single hyperparameter value.
///
/// Serialized untagged so JSON files read naturally: `0.1`, `3`, `true`,
/// `"rbf"`, `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ParamValue::None)
    }

    /// Read a strictly positive float, e.g. a regularization strength.
    pub fn expect_positive_f64(&self, name: &str) -> MlResult<f64> {
        match self.as_f64() {
            Some(v) if v > 0.0 && v.is_finite() => Ok(v),
            _ => Err(MlError::invalid_param(
                name,
                format!("expected a positive number, got {}", self),
            )),
        }
    }

    /// Read a non-negative integer.
    pub fn expect_usize(&self, name: &str) -> MlResult<usize> {
        match self.as_i64() {
            Some(v) if v >= 0 => Ok(v as usize),
            _ => Err(MlError::invalid_param(
                name,
                format!("expected a non-negative integer, got {}", self),
            )),
        }
    }

    /// Read an optional non-negative integer, where `null` means "unbounded".
    pub fn expect_optional_usize(&self, name: &str) -> MlResult<Option<usize>> {
        if self.is_none() {
            return Ok(None);
        }
        self.expect_usize(name).map(Some)
    }

    /// Read a string option.
    pub fn expect_str(&self, name: &str) -> MlResult<&str> {
        self.as_str().ok_or_else(|| {
            MlError::invalid_param(name, format!("expected a string, got {}", self))
        })
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::None => write!(f, "None"),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Str(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<Option<usize>> for ParamValue {
    fn from(v: Option<usize>) -> Self {
        v.map(ParamValue::from).unwrap_or(ParamValue::None)
    }
}

/// Hyperparameter assignment, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    params: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(name.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }

    /// Prefix every name with `<step>__`, the pipeline addressing scheme.
    pub fn prefixed(&self, step: &str) -> ParamSet {
        ParamSet {
            params: self
                .params
                .iter()
                .map(|(k, v)| (format!("{}__{}", step, k), v.clone()))
                .collect(),
        }
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}': {}", k, v)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, ParamValue)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        ParamSet {
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_values() {
        let values: Vec<ParamValue> =
            serde_json::from_str(r#"[null, true, 3, 0.5, "rbf"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParamValue::None,
                ParamValue::Bool(true),
                ParamValue::Int(3),
                ParamValue::Float(0.5),
                ParamValue::Str("rbf".into()),
            ]
        );
    }

    #[test]
    fn test_typed_readers() {
        assert_eq!(ParamValue::Int(2).expect_positive_f64("C").unwrap(), 2.0);
        assert!(ParamValue::Float(0.0).expect_positive_f64("C").is_err());
        assert_eq!(ParamValue::Float(4.0).expect_usize("max_depth").unwrap(), 4);
        assert!(ParamValue::Int(-1).expect_usize("max_depth").is_err());
        assert_eq!(ParamValue::None.expect_optional_usize("max_depth").unwrap(), None);
        assert!(ParamValue::Int(1).expect_str("kernel").is_err());
    }

    #[test]
    fn test_param_set_display_and_prefix() {
        let p = ParamSet::new().with("C", 1.0).with("kernel", "rbf");
        assert_eq!(p.to_string(), "{'C': 1.0, 'kernel': 'rbf'}");
        let q = p.prefixed("svc");
        assert_eq!(q.get("svc__C"), Some(&ParamValue::Float(1.0)));
        assert_eq!(serde_json::to_string(&q).unwrap(), r#"{"svc__C":1.0,"svc__kernel":"rbf"}"#);
    }
}
