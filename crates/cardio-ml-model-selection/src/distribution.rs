use std::collections::BTreeMap;

use cardio_ml_core::{MlError, MlResult, ParamSet, ParamValue};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Candidate values per step-addressed hyperparameter.
///
/// Configurations are points of the Cartesian product of the lists, in
/// grid order: names sorted, the last name varying fastest.
///
/// ```json
/// {"logisticregression__C": [0.1, 1.0, 10.0]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamDistribution(BTreeMap<String, Vec<ParamValue>>);

impl ParamDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<ParamValue>) {
        self.0.insert(name.into(), values);
    }

    pub fn with<V: Into<ParamValue>>(mut self, name: impl Into<String>, values: Vec<V>) -> Self {
        self.insert(name, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ParamValue>)> {
        self.0.iter()
    }

    /// Reject an empty distribution or an empty candidate list.
    pub fn validate(&self) -> MlResult<()> {
        if self.0.is_empty() {
            return Err(MlError::InvalidArgument(
                "parameter distribution is empty".to_string(),
            ));
        }
        if let Some((name, _)) = self.0.iter().find(|(_, v)| v.is_empty()) {
            return Err(MlError::InvalidArgument(format!(
                "parameter '{}' has no candidate values",
                name
            )));
        }
        Ok(())
    }

    /// Number of configurations in the grid.
    pub fn grid_size(&self) -> MlResult<usize> {
        self.0.values().try_fold(1usize, |acc, v| {
            acc.checked_mul(v.len()).ok_or_else(|| {
                MlError::InvalidArgument("parameter grid is too large".to_string())
            })
        })
    }

    /// The configuration at position `index` of the grid.
    pub fn config_at(&self, mut index: usize) -> ParamSet {
        let mut picked: Vec<(&String, &ParamValue)> = Vec::with_capacity(self.0.len());
        for (name, values) in self.0.iter().rev() {
            picked.push((name, &values[index % values.len()]));
            index /= values.len();
        }
        picked
            .into_iter()
            .map(|(n, v)| (n.clone(), v.clone()))
            .collect()
    }

    /// Choose up to `n_iter` distinct configurations.
    ///
    /// The whole grid, in order, when it has at most `n_iter` points;
    /// otherwise `n_iter` grid positions drawn without replacement.
    pub fn sample<R: Rng + ?Sized>(&self, n_iter: usize, rng: &mut R) -> MlResult<Vec<ParamSet>> {
        self.validate()?;
        let size = self.grid_size()?;
        let positions: Vec<usize> = if size <= n_iter {
            (0..size).collect()
        } else {
            index::sample(rng, size, n_iter).into_vec()
        };
        Ok(positions.into_iter().map(|i| self.config_at(i)).collect())
    }
}

impl FromIterator<(String, Vec<ParamValue>)> for ParamDistribution {
    fn from_iter<I: IntoIterator<Item = (String, Vec<ParamValue>)>>(iter: I) -> Self {
        ParamDistribution(iter.into_iter().collect())
    }
}
