//! CART regression tree with variance impurity.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::dataset::Dataset;
use super::utility::{mean, variance};

/// Decision tree configuration
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        n_samples: usize,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

/// Best split found at a node.
struct Candidate {
    feature_idx: usize,
    threshold: f64,
    /// Total squared-error reduction; drives feature importance.
    decrease: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    feature_importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    /// Trains on every row of `dataset`.
    pub fn fit(&mut self, dataset: &Dataset) {
        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        self.fit_indices(dataset, &indices);
    }

    /// Trains on the rows named by `indices`. Repeated indices count as
    /// repeated samples, which is how bootstrap resamples are fed in.
    pub fn fit_indices(&mut self, dataset: &Dataset, indices: &[usize]) {
        self.feature_importances = vec![0.0; dataset.n_features()];
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        self.root = if indices.is_empty() {
            None
        } else {
            Some(self.build(dataset, indices, 0, &mut rng))
        };

        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }
    }

    fn build(
        &mut self,
        dataset: &Dataset,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let targets: Vec<f64> = indices.iter().map(|&i| dataset.targets[i]).collect();
        let value = mean(&targets);
        let impurity = variance(&targets, value);

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || n < self.config.min_samples_split || impurity <= 1e-12 {
            return TreeNode::Leaf {
                value,
                n_samples: n,
            };
        }

        match self.best_split(dataset, indices, rng) {
            Some(split) => {
                self.feature_importances[split.feature_idx] += split.decrease;

                let left = self.build(dataset, &split.left, depth + 1, rng);
                let right = self.build(dataset, &split.right, depth + 1, rng);

                TreeNode::Split {
                    feature_idx: split.feature_idx,
                    threshold: split.threshold,
                    n_samples: n,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => TreeNode::Leaf {
                value,
                n_samples: n,
            },
        }
    }

    /// Sweeps every candidate feature in sorted order, keeping running sums so
    /// each threshold is scored in constant time.
    fn best_split(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<Candidate> {
        let n_features = dataset.n_features();
        let max_features = self.config.max_features.unwrap_or(n_features).min(n_features);
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut feature_order: Vec<usize> = (0..n_features).collect();
        feature_order.shuffle(rng);
        feature_order.truncate(max_features);

        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| dataset.targets[i]).sum();
        let total_sq: f64 = indices.iter().map(|&i| dataset.targets[i].powi(2)).sum();
        let parent_sse = sse(total_sum, total_sq, n);

        let mut best: Option<(usize, usize, f64, f64, Vec<usize>)> = None;

        for &feature_idx in &feature_order {
            let value_of = |i: usize| dataset.features[i][feature_idx];

            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| value_of(a).total_cmp(&value_of(b)));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 1..n {
                let y = dataset.targets[sorted[k - 1]];
                left_sum += y;
                left_sq += y * y;

                let lo = value_of(sorted[k - 1]);
                let hi = value_of(sorted[k]);
                if lo == hi || k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let decrease = parent_sse
                    - sse(left_sum, left_sq, k)
                    - sse(total_sum - left_sum, total_sq - left_sq, n - k);

                if decrease > best.as_ref().map_or(1e-12, |b| b.2) {
                    let mid = (lo + hi) / 2.0;
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some((feature_idx, k, decrease, threshold, sorted.clone()));
                }
            }
        }

        best.map(|(feature_idx, k, decrease, threshold, sorted)| {
            let (left, right) = sorted.split_at(k);
            Candidate {
                feature_idx,
                threshold,
                decrease,
                left: left.to_vec(),
                right: right.to_vec(),
            }
        })
    }

    pub fn predict_one(&self, features: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(root) => root,
            None => return 0.0,
        };

        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if features[*feature_idx] <= *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    pub fn predict(&self, dataset: &Dataset) -> Vec<f64> {
        dataset.features.iter().map(|f| self.predict_one(f)).collect()
    }

    /// Normalized impurity decrease per feature; all zeros for a single-leaf tree.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }
}

/// Sum of squared errors around the mean, from running sums.
fn sse(sum: f64, sum_sq: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (sum_sq - sum * sum / n as f64).max(0.0)
}
