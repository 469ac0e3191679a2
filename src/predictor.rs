//! Predictor pipeline: engineered features, synthetic target, forest fit and
//! the district projections, assembled into `model-predictions.json`.

use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::districts::{DistrictPrediction, generate_district_predictions};
use crate::features::{FEATURE_NAMES, REFERENCE_YEAR, derive_features, synthesize_risk_scores};
use crate::model::{Dataset, ForestConfig, RandomForest, StandardScaler};
use crate::stats::DateRange;
use crate::survey::SurveyRecord;

/// Held-out share of the records.
pub const TEST_FRACTION: f64 = 0.2;

/// Knobs for one predictor run. Defaults reproduce the published output.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub seed: u64,
    pub reference_year: i32,
    pub n_trees: usize,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            reference_year: REFERENCE_YEAR,
            n_trees: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetrics {
    pub train_r2: f64,
    pub test_r2: f64,
    pub feature_importance: BTreeMap<String, f64>,
    pub n_train: usize,
    pub n_test: usize,
    pub n_trees: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    pub total_surveys: usize,
    pub date_range: String,
}

#[derive(Debug, Serialize)]
pub struct ModelOutput {
    pub generated_at: DateTime<Utc>,
    pub model_metrics: ModelMetrics,
    pub district_predictions: Vec<DistrictPrediction>,
    pub data_source: DataSource,
}

/// Builds the training table: three engineered features per record and a
/// noisy synthetic risk target drawn from `rng`.
pub fn build_dataset(
    records: &[SurveyRecord],
    config: &PredictConfig,
    rng: &mut ChaCha8Rng,
) -> Result<Dataset> {
    let features = derive_features(records, config.reference_year);
    let targets = synthesize_risk_scores(&features, rng)?;
    Dataset::new(
        &FEATURE_NAMES,
        features.iter().map(|f| f.to_vec()).collect(),
        targets,
    )
}

/// Splits, scales and fits the forest, returning its metrics.
#[tracing::instrument(skip_all, fields(n_samples = dataset.n_samples()))]
pub fn train_model(dataset: &Dataset, config: &PredictConfig) -> Result<ModelMetrics> {
    ensure!(config.n_trees > 0, "the forest needs at least one tree");

    let split = dataset
        .train_test_split(TEST_FRACTION, config.seed)
        .context("not enough survey records to train on")?;

    let scaler = StandardScaler::fit(&split.train);
    let train = scaler.transform(&split.train);
    let test = scaler.transform(&split.test);

    let mut forest = RandomForest::new(ForestConfig {
        n_trees: config.n_trees,
        seed: config.seed,
        ..Default::default()
    });
    forest.fit(&train);

    let metrics = ModelMetrics {
        train_r2: forest.score(&train),
        test_r2: forest.score(&test),
        feature_importance: forest.feature_importance_map(),
        n_train: train.n_samples(),
        n_test: test.n_samples(),
        n_trees: forest.n_trees(),
    };

    info!(
        train_r2 = metrics.train_r2,
        test_r2 = metrics.test_r2,
        "Model trained"
    );
    info!(importance = ?metrics.feature_importance, "Feature importance");

    Ok(metrics)
}

/// Runs the whole predictor over an already merged table.
pub fn predict(records: &[SurveyRecord], config: &PredictConfig) -> Result<ModelOutput> {
    let date_range = DateRange::of(records).context("no survey records to model")?;
    info!(records = records.len(), "Building predictive model for malnutrition risk");

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let dataset = build_dataset(records, config, &mut rng)?;
    let model_metrics = train_model(&dataset, config)?;

    // independent of the fitted forest
    let district_predictions = generate_district_predictions(config.seed);
    info!(districts = district_predictions.len(), "Generated district predictions");

    Ok(ModelOutput {
        generated_at: Utc::now(),
        model_metrics,
        district_predictions,
        data_source: DataSource {
            total_surveys: records.len(),
            date_range: date_range.label(),
        },
    })
}
