//! Regression model used to score the synthetic risk target.
//!
//! A small random-forest stack: dataset container with a seeded split,
//! standard scaling, CART regression trees and the bagged forest on top.

pub mod dataset;
pub mod decision_tree;
pub mod random_forest;
pub mod scaler;
pub mod utility;

pub use dataset::{Dataset, Split};
pub use random_forest::{ForestConfig, RandomForest};
pub use scaler::StandardScaler;
