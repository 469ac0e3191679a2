//! Engineered features and the synthetic risk target.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::stats::surveys_by_year;
use crate::survey::SurveyRecord;

/// Year survey age is measured from.
pub const REFERENCE_YEAR: i32 = 2025;

/// Column names, in the order [`DerivedFeatures::to_vec`] emits them.
pub const FEATURE_NAMES: [&str; 3] = ["survey_age", "survey_duration", "surveys_in_year"];

const BASE_RISK: f64 = 30.0;
const AGE_WEIGHT: f64 = 0.5;
const YEAR_COUNT_WEIGHT: f64 = 2.0;
const NOISE_STD: f64 = 10.0;

/// Per-record values derived from a [`SurveyRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub survey_age: f64,
    pub survey_duration: f64,
    pub surveys_in_year: f64,
}

impl DerivedFeatures {
    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.survey_age, self.survey_duration, self.surveys_in_year]
    }
}

/// Computes age, duration and same-start-year count for every record.
pub fn derive_features(records: &[SurveyRecord], reference_year: i32) -> Vec<DerivedFeatures> {
    let per_year = surveys_by_year(records);

    records
        .iter()
        .map(|r| DerivedFeatures {
            survey_age: f64::from(reference_year - r.data_coll_start),
            survey_duration: f64::from(r.data_coll_end - r.data_coll_start),
            surveys_in_year: per_year.get(&r.data_coll_start).copied().unwrap_or(0) as f64,
        })
        .collect()
}

/// `30 + 0.5 * age + 2 * surveys_in_year` before noise.
pub fn base_risk(features: &DerivedFeatures) -> f64 {
    BASE_RISK + AGE_WEIGHT * features.survey_age + YEAR_COUNT_WEIGHT * features.surveys_in_year
}

/// Synthetic risk target: [`base_risk`] plus N(0, 10) noise, clipped to [0, 100].
pub fn synthesize_risk_scores<R: Rng>(
    features: &[DerivedFeatures],
    rng: &mut R,
) -> anyhow::Result<Vec<f64>> {
    let noise = Normal::new(0.0, NOISE_STD)?;

    Ok(features
        .iter()
        .map(|f| (base_risk(f) + noise.sample(rng)).clamp(0.0, 100.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn records() -> Vec<SurveyRecord> {
        vec![
            SurveyRecord::new(1, "a", 2015, 2016, "NISR"),
            SurveyRecord::new(2, "b", 2015, 2015, "NISR"),
            SurveyRecord::new(3, "c", 2020, 2023, "WFP"),
        ]
    }

    #[test]
    fn test_derive_features() {
        let features = derive_features(&records(), REFERENCE_YEAR);

        assert_eq!(
            features[0],
            DerivedFeatures {
                survey_age: 10.0,
                survey_duration: 1.0,
                surveys_in_year: 2.0,
            }
        );
        assert_eq!(features[1].survey_duration, 0.0);
        assert_eq!(features[2].survey_age, 5.0);
        assert_eq!(features[2].survey_duration, 3.0);
        assert_eq!(features[2].surveys_in_year, 1.0);
    }

    #[test]
    fn test_feature_vector_order_matches_names() {
        let f = DerivedFeatures {
            survey_age: 1.0,
            survey_duration: 2.0,
            surveys_in_year: 3.0,
        };
        assert_eq!(f.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(FEATURE_NAMES[2], "surveys_in_year");
    }

    #[test]
    fn test_base_risk_formula() {
        let f = DerivedFeatures {
            survey_age: 10.0,
            survey_duration: 0.0,
            surveys_in_year: 4.0,
        };
        assert_eq!(base_risk(&f), 30.0 + 5.0 + 8.0);
    }

    #[test]
    fn test_risk_scores_are_clipped() {
        // extreme ages push the base far outside [0, 100] in both directions
        let features: Vec<DerivedFeatures> = (0..500)
            .map(|i| DerivedFeatures {
                survey_age: if i % 2 == 0 { 400.0 } else { -400.0 },
                survey_duration: 0.0,
                surveys_in_year: (i % 7) as f64,
            })
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let scores = synthesize_risk_scores(&features, &mut rng).unwrap();

        assert!(scores.iter().all(|s| (0.0..=100.0).contains(s)));
        assert!(scores.contains(&0.0));
        assert!(scores.contains(&100.0));
    }

    #[test]
    fn test_risk_scores_are_seeded() {
        let features = derive_features(&records(), REFERENCE_YEAR);

        let a = synthesize_risk_scores(&features, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let b = synthesize_risk_scores(&features, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();

        assert_eq!(a, b);
    }
}
