//! Feature matrix container and the shuffled train/test split.

use anyhow::{Result, ensure};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Row-major feature matrix with one target per row.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub feature_names: Vec<String>,
}

/// Train/test split result
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    pub fn new(feature_names: &[&str], features: Vec<Vec<f64>>, targets: Vec<f64>) -> Result<Self> {
        ensure!(
            features.len() == targets.len(),
            "{} feature rows but {} targets",
            features.len(),
            targets.len()
        );
        ensure!(
            features.iter().all(|row| row.len() == feature_names.len()),
            "every row must have {} features",
            feature_names.len()
        );

        Ok(Self {
            features,
            targets,
            feature_names: feature_names.iter().map(|n| n.to_string()).collect(),
        })
    }

    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Column `idx` as a vector.
    pub fn column(&self, idx: usize) -> Vec<f64> {
        self.features.iter().map(|row| row[idx]).collect()
    }

    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Shuffles row indices with `seed` and holds out `ceil(test_fraction * n)`
    /// rows for testing. Both sides must end up non-empty.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<Split> {
        let n = self.n_samples();
        let n_test = (test_fraction * n as f64).ceil() as usize;
        ensure!(
            n_test > 0 && n_test < n,
            "cannot split {n} samples with test fraction {test_fraction}"
        );

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (test_idx, train_idx) = indices.split_at(n_test);
        Ok(Split {
            train: self.subset(train_idx),
            test: self.subset(test_idx),
        })
    }
}
