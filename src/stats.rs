use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::survey::SurveyRecord;

/// Inclusive collection-year span of a survey table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: i32,
    pub end: i32,
}

impl DateRange {
    /// Earliest `data_coll_start` and latest `data_coll_end` across `records`.
    /// `None` for an empty table.
    pub fn of(records: &[SurveyRecord]) -> Option<Self> {
        let start = records.iter().map(|r| r.data_coll_start).min()?;
        let end = records.iter().map(|r| r.data_coll_end).max()?;
        Some(Self { start, end })
    }

    /// `"start-end"`, the form used in the predictor's data-source block.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Loader output written to `survey-data-processed.json`.
#[derive(Debug, Serialize)]
pub struct SurveySummary {
    pub generated_at: DateTime<Utc>,
    pub total_surveys: usize,
    pub unique_survey_ids: usize,
    pub date_range: DateRange,

    // start year -> rows
    pub surveys_by_year: BTreeMap<i32, usize>,
    pub authorities: Vec<String>,
    pub surveys: Vec<SurveyRecord>,
}

impl SurveySummary {
    /// Summarizes a merged, deduplicated table. Takes ownership because the
    /// full record list is embedded in the output.
    pub fn from_records(records: Vec<SurveyRecord>) -> Result<Self> {
        let Some(date_range) = DateRange::of(&records) else {
            bail!("no survey records to summarize");
        };

        let unique_survey_ids = records
            .iter()
            .map(|r| r.surveyid.as_str())
            .collect::<HashSet<_>>()
            .len();

        Ok(Self {
            generated_at: Utc::now(),
            total_surveys: records.len(),
            unique_survey_ids,
            date_range,
            surveys_by_year: surveys_by_year(&records),
            authorities: distinct_authorities(&records),
            surveys: records,
        })
    }
}

/// Row count per `data_coll_start` year.
pub fn surveys_by_year(records: &[SurveyRecord]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for r in records {
        *counts.entry(r.data_coll_start).or_insert(0) += 1;
    }
    counts
}

/// Distinct authority names in first-seen order.
pub fn distinct_authorities(records: &[SurveyRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.authenty.as_str()))
        .map(|r| r.authenty.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, surveyid: &str, start: i32, end: i32, authority: &str) -> SurveyRecord {
        SurveyRecord::new(id, surveyid, start, end, authority)
    }

    fn sample() -> Vec<SurveyRecord> {
        vec![
            record(1, "DHS-2010", 2010, 2011, "NISR"),
            record(2, "CFSVA-2012", 2012, 2012, "WFP"),
            record(3, "DHS-2014", 2014, 2015, "NISR"),
            record(4, "DHS-2014", 2014, 2019, "MoH"),
        ]
    }

    #[test]
    fn test_date_range_spans_both_columns() {
        let range = DateRange::of(&sample()).unwrap();
        assert_eq!(range, DateRange { start: 2010, end: 2019 });
        assert_eq!(range.label(), "2010-2019");
    }

    #[test]
    fn test_date_range_empty() {
        assert_eq!(DateRange::of(&[]), None);
    }

    #[test]
    fn test_surveys_by_year_counts_start_years() {
        let counts = surveys_by_year(&sample());
        assert_eq!(counts.get(&2010), Some(&1));
        assert_eq!(counts.get(&2012), Some(&1));
        assert_eq!(counts.get(&2014), Some(&2));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_distinct_authorities_first_seen_order() {
        assert_eq!(distinct_authorities(&sample()), vec!["NISR", "WFP", "MoH"]);
    }

    #[test]
    fn test_summary_from_records() {
        let summary = SurveySummary::from_records(sample()).unwrap();

        assert_eq!(summary.total_surveys, 4);
        assert_eq!(summary.unique_survey_ids, 3);
        assert_eq!(summary.surveys.len(), 4);
        assert_eq!(summary.date_range.start, 2010);
    }

    #[test]
    fn test_summary_rejects_empty_table() {
        assert!(SurveySummary::from_records(Vec::new()).is_err());
    }

    #[test]
    fn test_summary_json_uses_string_year_keys() {
        let summary = SurveySummary::from_records(sample()).unwrap();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["surveys_by_year"]["2014"], 2);
        assert_eq!(json["date_range"]["end"], 2019);
        assert_eq!(json["total_surveys"], 4);
    }
}
