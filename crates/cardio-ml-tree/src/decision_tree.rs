use cardio_ml_core::estimator::{check_xy, class_count};
use cardio_ml_core::{Estimator, MlError, MlResult, ParamSet, ParamValue, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A node in the decision tree.
#[derive(Debug, Clone)]
enum TreeNode {
    /// Internal node: splits on feature `feature_idx` at `threshold`.
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf { class: usize },
}

/// Decision Tree Classifier using CART (Gini impurity).
///
/// Features are visited in an order drawn from `random_state`; among
/// equally good splits the first one visited wins.
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: Option<u64>,
    tree: Option<TreeNode>,
    n_classes: usize,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        DecisionTreeClassifier {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: None,
            tree: None,
            n_classes: 0,
        }
    }
}

struct BestSplit {
    gini: f64,
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Depth of the fitted tree (a single leaf has depth 0).
    pub fn depth(&self) -> Option<usize> {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.tree.as_ref().map(walk)
    }

    fn build_tree(
        &self,
        x: &Tensor<f64>,
        y: &[usize],
        indices: &[usize],
        features: &[usize],
        depth: usize,
    ) -> MlResult<TreeNode> {
        let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || indices.len() < self.min_samples_split.max(2) {
            return Ok(TreeNode::Leaf {
                class: self.majority_class(y, indices),
            });
        }

        let first = y[indices[0]];
        if indices.iter().all(|&i| y[i] == first) {
            return Ok(TreeNode::Leaf { class: first });
        }

        let parent_gini = self.gini_impurity(y, indices);
        let mut best: Option<BestSplit> = None;

        for &feature in features {
            let mut values = indices
                .iter()
                .map(|&i| x.get(&[i, feature]))
                .collect::<MlResult<Vec<f64>>>()?;
            values.sort_by(f64::total_cmp);
            values.dedup();

            for w in values.windows(2) {
                let threshold = (w[0] + w[1]) / 2.0;

                let mut left = Vec::new();
                let mut right = Vec::new();
                for &i in indices {
                    if x.get(&[i, feature])? <= threshold {
                        left.push(i);
                    } else {
                        right.push(i);
                    }
                }

                if left.len() < self.min_samples_leaf || right.len() < self.min_samples_leaf {
                    continue;
                }

                let gini = self.weighted_gini(y, &left, &right, indices.len());
                if best.as_ref().map_or(true, |b| gini < b.gini) {
                    best = Some(BestSplit {
                        gini,
                        feature,
                        threshold,
                        left,
                        right,
                    });
                }
            }
        }

        match best {
            Some(split) if split.gini < parent_gini => {
                let left = self.build_tree(x, y, &split.left, features, depth + 1)?;
                let right = self.build_tree(x, y, &split.right, features, depth + 1)?;
                Ok(TreeNode::Split {
                    feature_idx: split.feature,
                    threshold: split.threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            _ => Ok(TreeNode::Leaf {
                class: self.majority_class(y, indices),
            }),
        }
    }

    fn gini_impurity(&self, y: &[usize], indices: &[usize]) -> f64 {
        if indices.is_empty() {
            return 0.0;
        }
        let n = indices.len() as f64;
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        1.0 - counts
            .iter()
            .map(|&c| {
                let p = c as f64 / n;
                p * p
            })
            .sum::<f64>()
    }

    fn weighted_gini(&self, y: &[usize], left: &[usize], right: &[usize], total: usize) -> f64 {
        let total = total as f64;
        let left_weight = left.len() as f64 / total;
        let right_weight = right.len() as f64 / total;
        left_weight * self.gini_impurity(y, left) + right_weight * self.gini_impurity(y, right)
    }

    /// Most frequent class; the smallest index wins ties.
    fn majority_class(&self, y: &[usize], indices: &[usize]) -> usize {
        let mut counts = vec![0usize; self.n_classes.max(1)];
        for &i in indices {
            counts[y[i]] += 1;
        }
        let max = counts.iter().copied().max().unwrap_or(0);
        counts.iter().position(|&c| c == max).unwrap_or(0)
    }

    fn traverse(node: &TreeNode, row: &[f64]) -> usize {
        match node {
            TreeNode::Leaf { class } => *class,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                if row[*feature_idx] <= *threshold {
                    Self::traverse(left, row)
                } else {
                    Self::traverse(right, row)
                }
            }
        }
    }
}

impl Estimator for DecisionTreeClassifier {
    fn name(&self) -> &'static str {
        "decisiontreeclassifier"
    }

    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        check_xy(x, y)?;
        let n = x.nrows()?;
        let p = x.ncols()?;
        self.n_classes = class_count(y);
        let labels: Vec<usize> = y.data().iter().map(|v| v.round().max(0.0) as usize).collect();

        let mut rng = match self.random_state {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut features: Vec<usize> = (0..p).collect();
        features.shuffle(&mut rng);

        let indices: Vec<usize> = (0..n).collect();
        self.tree = Some(self.build_tree(x, &labels, &indices, &features, 0)?);
        Ok(())
    }

    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        let tree = self.tree.as_ref().ok_or(MlError::NotFitted)?;
        let n = x.nrows()?;
        let mut predictions = Vec::with_capacity(n);
        for i in 0..n {
            predictions.push(Self::traverse(tree, x.row(i)?) as f64);
        }
        Ok(Tensor::from_slice(&predictions))
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> MlResult<()> {
        match name {
            "max_depth" => self.max_depth = value.expect_optional_usize(name)?,
            "min_samples_split" => {
                let v = value.expect_usize(name)?;
                if v < 2 {
                    return Err(MlError::invalid_param(name, "must be at least 2"));
                }
                self.min_samples_split = v;
            }
            "min_samples_leaf" => {
                let v = value.expect_usize(name)?;
                if v < 1 {
                    return Err(MlError::invalid_param(name, "must be at least 1"));
                }
                self.min_samples_leaf = v;
            }
            "random_state" => {
                self.random_state = value.expect_optional_usize(name)?.map(|s| s as u64)
            }
            _ => {
                return Err(MlError::invalid_param(
                    name,
                    "unknown parameter for DecisionTreeClassifier",
                ))
            }
        }
        Ok(())
    }

    fn params(&self) -> ParamSet {
        ParamSet::new()
            .with("max_depth", self.max_depth)
            .with("min_samples_split", self.min_samples_split)
            .with("min_samples_leaf", self.min_samples_leaf)
            .with("random_state", self.random_state.map(|s| s as usize))
    }

    fn is_fitted(&self) -> bool {
        self.tree.is_some()
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}
