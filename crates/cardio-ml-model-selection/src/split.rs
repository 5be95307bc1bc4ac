use std::collections::BTreeMap;

use cardio_ml_core::{MlError, MlResult, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::warn;

/// A single train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn check_splits(n_samples: usize, n_splits: usize) -> MlResult<()> {
    if n_splits < 2 {
        return Err(MlError::InvalidArgument(format!(
            "n_splits must be at least 2, got {}",
            n_splits
        )));
    }
    if n_samples < n_splits {
        return Err(MlError::InvalidArgument(format!(
            "cannot have n_splits={} greater than the number of samples: {}",
            n_splits, n_samples
        )));
    }
    Ok(())
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Turn per-fold test sets into complete folds.
fn folds_from_tests(n_samples: usize, mut tests: Vec<Vec<usize>>) -> Vec<Fold> {
    let mut fold_of = vec![0usize; n_samples];
    for (k, test) in tests.iter_mut().enumerate() {
        test.sort_unstable();
        for &i in test.iter() {
            fold_of[i] = k;
        }
    }
    tests
        .into_iter()
        .enumerate()
        .map(|(k, test)| Fold {
            train: (0..n_samples).filter(|&i| fold_of[i] != k).collect(),
            test,
        })
        .collect()
}

/// K-Fold: consecutive blocks of samples, the first `n % k` folds one
/// sample larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: Option<u64>,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        KFold {
            n_splits,
            shuffle: false,
            seed: None,
        }
    }

    pub fn shuffled(mut self, seed: Option<u64>) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    pub fn split(&self, n_samples: usize) -> MlResult<Vec<Fold>> {
        check_splits(n_samples, self.n_splits)?;
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            indices.shuffle(&mut rng_for(self.seed));
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;
        let mut tests = Vec::with_capacity(self.n_splits);
        let mut current = 0;
        for k in 0..self.n_splits {
            let size = if k < remainder { base + 1 } else { base };
            tests.push(indices[current..current + size].to_vec());
            current += size;
        }
        Ok(folds_from_tests(n_samples, tests))
    }
}

/// Stratified K-Fold: every fold keeps roughly the class proportions of
/// the whole set.
///
/// Classes are visited in sorted order and their samples dealt round-robin
/// over the folds, continuing where the previous class stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        StratifiedKFold {
            n_splits,
            shuffle: false,
            seed: None,
        }
    }

    pub fn shuffled(mut self, seed: Option<u64>) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    pub fn split(&self, y: &Tensor<f64>) -> MlResult<Vec<Fold>> {
        let n_samples = y.numel();
        check_splits(n_samples, self.n_splits)?;

        let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, v) in y.data().iter().enumerate() {
            by_class.entry(v.round() as i64).or_default().push(i);
        }

        let smallest = by_class.values().map(Vec::len).min().unwrap_or(0);
        if smallest < self.n_splits {
            warn!(
                least_populated = smallest,
                n_splits = self.n_splits,
                "The least populated class has fewer members than n_splits"
            );
        }

        let mut rng = rng_for(self.seed);
        let mut tests: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut next = 0;
        for members in by_class.values_mut() {
            if self.shuffle {
                members.shuffle(&mut rng);
            }
            for &i in members.iter() {
                tests[next].push(i);
                next = (next + 1) % self.n_splits;
            }
        }

        if tests.iter().any(Vec::is_empty) {
            return Err(MlError::InvalidArgument(format!(
                "stratified split into {} folds leaves a fold without test samples",
                self.n_splits
            )));
        }
        Ok(folds_from_tests(n_samples, tests))
    }
}

/// Splitting strategy used by cross-validation and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvStrategy {
    KFold(KFold),
    Stratified(StratifiedKFold),
}

impl CvStrategy {
    /// Stratified folds without shuffling.
    pub fn stratified(n_splits: usize) -> Self {
        CvStrategy::Stratified(StratifiedKFold::new(n_splits))
    }

    pub fn n_splits(&self) -> usize {
        match self {
            CvStrategy::KFold(k) => k.n_splits,
            CvStrategy::Stratified(s) => s.n_splits,
        }
    }

    pub fn split(&self, y: &Tensor<f64>) -> MlResult<Vec<Fold>> {
        match self {
            CvStrategy::KFold(k) => k.split(y.numel()),
            CvStrategy::Stratified(s) => s.split(y),
        }
    }
}

impl Default for CvStrategy {
    fn default() -> Self {
        CvStrategy::Stratified(StratifiedKFold::new(5))
    }
}

impl From<usize> for CvStrategy {
    /// An integer fold count means stratified folds, as for classifiers.
    fn from(n_splits: usize) -> Self {
        CvStrategy::Stratified(StratifiedKFold::new(n_splits))
    }
}

impl From<KFold> for CvStrategy {
    fn from(k: KFold) -> Self {
        CvStrategy::KFold(k)
    }
}

impl From<StratifiedKFold> for CvStrategy {
    fn from(s: StratifiedKFold) -> Self {
        CvStrategy::Stratified(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(folds: &[Fold], n: usize) {
        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.iter().copied()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
        for f in folds {
            assert_eq!(f.train.len() + f.test.len(), n);
            assert!(f.test.iter().all(|i| !f.train.contains(i)));
        }
    }

    #[test]
    fn test_kfold_sizes() {
        let folds = KFold::new(3).split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(folds[0].test, vec![0, 1, 2, 3]);
        assert_partition(&folds, 10);
    }

    #[test]
    fn test_kfold_shuffle_is_seeded() {
        let a = KFold::new(4).shuffled(Some(9)).split(12).unwrap();
        let b = KFold::new(4).shuffled(Some(9)).split(12).unwrap();
        assert_eq!(a, b);
        assert_partition(&a, 12);
    }

    #[test]
    fn test_stratified_preserves_proportions() {
        let y: Tensor<f64> = Tensor::from_slice(&[
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
        ]);
        let folds = StratifiedKFold::new(3).split(&y).unwrap();
        assert_partition(&folds, 12);
        for f in &folds {
            let ones = f.test.iter().filter(|&&i| y.data()[i] == 1.0).count();
            assert_eq!(f.test.len(), 4);
            assert_eq!(ones, 2);
        }
    }

    #[test]
    fn test_stratified_small_class_still_splits() {
        // "Heart Disease" has two members for three folds
        let y: Tensor<f64> = Tensor::from_slice(&[1.0, 0.0, 1.0, 0.0, 1.0]);
        let folds = StratifiedKFold::new(3).split(&y).unwrap();
        assert_partition(&folds, 5);
    }

    #[test]
    fn test_invalid_split_counts() {
        assert!(KFold::new(1).split(10).unwrap_err().is_invalid_argument());
        assert!(KFold::new(5).split(3).unwrap_err().is_invalid_argument());
        let y: Tensor<f64> = Tensor::from_slice(&[0.0, 1.0]);
        assert!(CvStrategy::stratified(3).split(&y).is_err());
    }
}
