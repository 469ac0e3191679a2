//! Bagged ensemble of regression trees.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::debug;

use super::dataset::Dataset;
use super::decision_tree::{DecisionTree, TreeConfig};
use super::utility::r2_score;

/// Random Forest configuration
#[derive(Debug, Clone)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree (None = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            feature_names: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    /// Fits `n_trees` trees one after the other. Tree `i` draws its bootstrap
    /// sample and split order from `seed + i`, so a fixed seed reproduces the
    /// whole forest.
    #[tracing::instrument(
        skip_all,
        fields(n_samples = dataset.n_samples(), n_trees = self.config.n_trees)
    )]
    pub fn fit(&mut self, dataset: &Dataset) {
        self.feature_names = dataset.feature_names.clone();
        let n_samples = dataset.n_samples();
        let n_features = dataset.n_features();

        self.trees = (0..self.config.n_trees)
            .map(|i| {
                let seed = self.config.seed.wrapping_add(i as u64);
                let mut tree = DecisionTree::new(TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: self.config.max_features,
                    seed,
                });

                if self.config.bootstrap {
                    tree.fit_indices(dataset, &bootstrap_indices(n_samples, seed));
                } else {
                    tree.fit(dataset);
                }
                tree
            })
            .collect();

        // Aggregate feature importances
        self.feature_importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (total, imp) in self
                .feature_importances
                .iter_mut()
                .zip(tree.feature_importances())
            {
                *total += imp;
            }
        }

        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }

        debug!(importances = ?self.feature_importances, "Forest fitted");
    }

    /// Mean of the per-tree predictions.
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_one(features)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict(&self, dataset: &Dataset) -> Vec<f64> {
        dataset.features.iter().map(|f| self.predict_one(f)).collect()
    }

    /// R² of the forest's predictions on `dataset`.
    pub fn score(&self, dataset: &Dataset) -> f64 {
        r2_score(&dataset.targets, &self.predict(dataset))
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Importances keyed by feature name.
    pub fn feature_importance_map(&self) -> BTreeMap<String, f64> {
        self.feature_names
            .iter()
            .cloned()
            .zip(self.feature_importances.iter().copied())
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// `n` row indices drawn with replacement.
fn bootstrap_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_dataset() -> Dataset {
        let features = (0..200)
            .map(|i| {
                let x1 = i as f64 / 20.0;
                let x2 = ((i * 7) % 13) as f64;
                vec![x1, x2]
            })
            .collect();
        let targets = (0..200).map(|i| 3.0 * (i as f64 / 20.0) + 1.0).collect();
        Dataset::new(&["signal", "noise"], features, targets).unwrap()
    }

    fn small_forest(seed: u64) -> RandomForest {
        RandomForest::new(ForestConfig {
            n_trees: 10,
            seed,
            ..Default::default()
        })
    }

    #[test]
    fn test_random_forest_regression() {
        let data = linear_dataset();
        let mut forest = small_forest(42);
        forest.fit(&data);

        assert_eq!(forest.n_trees(), 10);
        assert!(forest.score(&data) > 0.95);
    }

    #[test]
    fn test_importances_are_normalized_and_ranked() {
        let data = linear_dataset();
        let mut forest = small_forest(42);
        forest.fit(&data);

        let importances = forest.feature_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);

        let named = forest.feature_importance_map();
        assert_eq!(named.len(), 2);
        assert!(named.contains_key("signal"));
    }

    #[test]
    fn test_same_seed_same_forest() {
        let data = linear_dataset();
        let mut a = small_forest(7);
        let mut b = small_forest(7);
        a.fit(&data);
        b.fit(&data);

        assert_eq!(a.predict(&data), b.predict(&data));
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_bootstrap_indices_in_range() {
        let indices = bootstrap_indices(50, 3);
        assert_eq!(indices.len(), 50);
        assert!(indices.iter().all(|&i| i < 50));
        assert_eq!(indices, bootstrap_indices(50, 3));
    }

    #[test]
    fn test_without_bootstrap_single_tree_fits_exactly() {
        let data = linear_dataset();
        let mut forest = RandomForest::new(ForestConfig {
            n_trees: 1,
            bootstrap: false,
            ..Default::default()
        });
        forest.fit(&data);

        assert_eq!(forest.score(&data), 1.0);
    }

    #[test]
    fn test_unfitted_forest_predicts_zero() {
        assert_eq!(small_forest(1).predict_one(&[1.0, 2.0]), 0.0);
    }
}
