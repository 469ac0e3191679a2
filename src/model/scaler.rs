//! Per-column standardization fitted on training rows.

use super::dataset::Dataset;
use super::utility::{mean, stddev};

/// Zero-mean, unit-variance scaling learned from a training set.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learns column means and population standard deviations.
    /// Constant columns get a scale of 1 so they map to zero instead of NaN.
    pub fn fit(dataset: &Dataset) -> Self {
        let (means, scales) = (0..dataset.n_features())
            .map(|idx| {
                let column = dataset.column(idx);
                let m = mean(&column);
                let sd = stddev(&column, m);
                (m, if sd == 0.0 { 1.0 } else { sd })
            })
            .unzip();

        Self { means, scales }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    /// Returns a scaled copy of `dataset`; targets are untouched.
    pub fn transform(&self, dataset: &Dataset) -> Dataset {
        Dataset {
            features: dataset
                .features
                .iter()
                .map(|row| self.transform_row(row))
                .collect(),
            targets: dataset.targets.clone(),
            feature_names: dataset.feature_names.clone(),
        }
    }
}
