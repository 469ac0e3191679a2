//! Survey metadata records and the merge/dedup step shared by both pipelines.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// One row of survey metadata.
///
/// Columns other than the five the pipelines read are carried through as
/// strings so the loader can echo the full row back out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyRecord {
    pub id: i64,
    pub surveyid: String,
    pub data_coll_start: i32,
    pub data_coll_end: i32,
    pub authenty: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl SurveyRecord {
    pub fn new(
        id: i64,
        surveyid: &str,
        data_coll_start: i32,
        data_coll_end: i32,
        authenty: &str,
    ) -> Self {
        Self {
            id,
            surveyid: surveyid.to_string(),
            data_coll_start,
            data_coll_end,
            authenty: authenty.to_string(),
            extra: BTreeMap::new(),
        }
    }
}

/// Concatenates `tables` in order and drops repeated ids, keeping the first
/// occurrence. Surviving rows keep their relative order.
pub fn merge_surveys(tables: Vec<Vec<SurveyRecord>>) -> Vec<SurveyRecord> {
    let total: usize = tables.iter().map(Vec::len).sum();
    let mut seen = HashSet::with_capacity(total);

    let merged: Vec<SurveyRecord> = tables
        .into_iter()
        .flatten()
        .filter(|record| seen.insert(record.id))
        .collect();

    debug!(
        input_rows = total,
        merged_rows = merged.len(),
        dropped = total - merged.len(),
        "Merged survey tables"
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, surveyid: &str) -> SurveyRecord {
        SurveyRecord::new(id, surveyid, 2015, 2016, "NISR")
    }

    #[test]
    fn test_merge_drops_overlapping_ids() {
        let first = vec![record(1, "a"), record(2, "b"), record(3, "c")];
        let second = vec![record(3, "c-dup"), record(4, "d")];

        let merged = merge_surveys(vec![first, second]);

        let ids: Vec<i64> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let first = vec![record(7, "original")];
        let second = vec![record(7, "later")];

        let merged = merge_surveys(vec![first, second]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].surveyid, "original");
    }

    #[test]
    fn test_merge_dedups_within_a_single_table() {
        let table = vec![record(5, "x"), record(6, "y"), record(5, "z")];

        let merged = merge_surveys(vec![table]);

        let ids: Vec<i64> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn test_merge_empty_tables() {
        assert!(merge_surveys(vec![Vec::new(), Vec::new()]).is_empty());
    }

    #[test]
    fn test_extra_columns_flatten_into_json() {
        let mut r = record(1, "RWA-1");
        r.extra.insert("nation".to_string(), "Rwanda".to_string());

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["nation"], "Rwanda");
        assert_eq!(json["data_coll_start"], 2015);
    }
}
