//! Synthetic per-district risk projections.
//!
//! These numbers are drawn independently of the fitted model.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// The 31 districts projections are generated for.
pub const DISTRICTS: [&str; 31] = [
    "Kigali",
    "Nyarugenge",
    "Gasabo",
    "Kicukiro",
    "Nyanza",
    "Gisagara",
    "Nyaruguru",
    "Huye",
    "Nyamagabe",
    "Ruhango",
    "Muhanga",
    "Kamonyi",
    "Karongi",
    "Rutsiro",
    "Rubavu",
    "Nyabihu",
    "Ngororero",
    "Rusizi",
    "Nyamasheke",
    "Rulindo",
    "Gakenke",
    "Musanze",
    "Burera",
    "Gicumbi",
    "Rwamagana",
    "Nyagatare",
    "Gatsibo",
    "Kayonza",
    "Kirehe",
    "Ngoma",
    "Bugesera",
];

/// Impact factors and the uniform range each impact is drawn from.
const KEY_FACTORS: [(&str, f64, f64); 4] = [
    ("Food insecurity", 0.6, 0.9),
    ("Healthcare access", 0.5, 0.8),
    ("Water quality", 0.4, 0.7),
    ("Education level", 0.3, 0.6),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
}

/// Labels a current risk value.
///
/// | Range          | Trend     |
/// |----------------|-----------|
/// | > 60           | worsening |
/// | < 40           | improving |
/// | otherwise      | stable    |
pub fn trend(current_risk: f64) -> Trend {
    match current_risk {
        r if r > 60.0 => Trend::Worsening,
        r if r < 40.0 => Trend::Improving,
        _ => Trend::Stable,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFactor {
    pub factor: String,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictPrediction {
    pub district: String,
    pub current_risk: f64,
    pub predicted_risk_3m: f64,
    pub predicted_risk_6m: f64,
    pub confidence: f64,
    /// Taken from the unrounded current risk, so a published `40.0` can carry `improving`.
    pub trend: Trend,
    pub key_factors: Vec<KeyFactor>,
}

/// Rounds to two decimals, the precision every published figure uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn project<R: Rng>(district: &str, rng: &mut R) -> DistrictPrediction {
    let current = rng.gen_range(25.0..85.0);
    let shift_3m = rng.gen_range(-5.0..8.0);
    let shift_6m = rng.gen_range(-8.0..12.0);
    let confidence = rng.gen_range(0.72..0.92);

    let key_factors = KEY_FACTORS
        .iter()
        .map(|&(factor, low, high)| KeyFactor {
            factor: factor.to_string(),
            impact: round2(rng.gen_range(low..high)),
        })
        .collect();

    DistrictPrediction {
        district: district.to_string(),
        current_risk: round2(current),
        predicted_risk_3m: round2(current + shift_3m),
        predicted_risk_6m: round2(current + shift_6m),
        confidence: round2(confidence),
        // labelled before rounding
        trend: trend(current),
        key_factors,
    }
}

/// One projection per entry of [`DISTRICTS`], reproducible for a given seed.
pub fn generate_district_predictions(seed: u64) -> Vec<DistrictPrediction> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    DISTRICTS.iter().map(|d| project(d, &mut rng)).collect()
}
