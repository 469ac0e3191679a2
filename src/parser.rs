//! CSV parser for survey metadata exports.

use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;

use crate::survey::SurveyRecord;

const REQUIRED_COLUMNS: [&str; 5] = [
    "id",
    "surveyid",
    "data_coll_start",
    "data_coll_end",
    "authenty",
];

/// Positions of the required columns within a header row.
struct Columns {
    id: usize,
    surveyid: usize,
    start: usize,
    end: usize,
    authenty: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| anyhow!("missing required column `{name}`"))
        };

        Ok(Self {
            id: find("id")?,
            surveyid: find("surveyid")?,
            start: find("data_coll_start")?,
            end: find("data_coll_end")?,
            authenty: find("authenty")?,
        })
    }
}

/// Decodes a CSV payload into [`SurveyRecord`]s.
///
/// The first row must be a header containing `id`, `surveyid`,
/// `data_coll_start`, `data_coll_end` and `authenty`. Every other column is
/// kept verbatim in [`SurveyRecord::extra`].
///
/// # Errors
///
/// Returns an error if the payload is not valid CSV, a required column is
/// missing, or an id or year cell is not an integer.
pub fn parse_surveys(bytes: &[u8]) -> Result<Vec<SurveyRecord>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = rdr.headers().context("failed to read CSV header")?.clone();
    let columns = Columns::locate(&headers)?;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        // header is line 1
        let line = row + 2;
        let raw = result.with_context(|| format!("malformed CSV at line {line}"))?;

        let cell = |idx: usize| raw.get(idx).unwrap_or("").trim();

        let mut extra = BTreeMap::new();
        for (idx, name) in headers.iter().enumerate() {
            let name = name.trim();
            if REQUIRED_COLUMNS.contains(&name) {
                continue;
            }
            extra.insert(name.to_string(), cell(idx).to_string());
        }

        records.push(SurveyRecord {
            id: parse_int(cell(columns.id), "id", line)?,
            surveyid: cell(columns.surveyid).to_string(),
            data_coll_start: parse_year(cell(columns.start), "data_coll_start", line)?,
            data_coll_end: parse_year(cell(columns.end), "data_coll_end", line)?,
            authenty: cell(columns.authenty).to_string(),
            extra,
        });
    }

    Ok(records)
}

/// Parses an integer cell, also accepting integral floats such as `2019.0`.
fn parse_int(value: &str, column: &str, line: usize) -> Result<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    let in_range = |v: f64| v >= i64::MIN as f64 && v < i64::MAX as f64;
    match value.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && in_range(v) => Ok(v as i64),
        _ => bail!("column `{column}` at line {line}: expected an integer, got {value:?}"),
    }
}

fn parse_year(value: &str, column: &str, line: usize) -> Result<i32> {
    let v = parse_int(value, column, line)?;
    i32::try_from(v)
        .with_context(|| format!("column `{column}` at line {line}: {v} is out of range"))
}
