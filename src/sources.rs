//! Default survey sources and the shared fetch/parse/merge step.

use anyhow::{Context, Result};
use tracing::info;

use crate::fetch::{HttpClient, load_source};
use crate::parser::parse_surveys;
use crate::survey::{SurveyRecord, merge_surveys};

/// Survey catalogue exports both pipelines read by default.
pub const DEFAULT_SOURCES: [&str; 2] = [
    "https://hebbkx1anhila5yf.public.blob.vercel-storage.com/search-10-07-25-044925-toTDHZ17SCaSZH6EcMdcIe8ci7jy0p.csv",
    "https://hebbkx1anhila5yf.public.blob.vercel-storage.com/search-10-07-25-044744-a1cQMagROWWVQynl8xJSxdoG1GjdXl.csv",
];

pub fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}

/// Loads every source in order, parses it, and merges the tables keeping the
/// first row seen for each id. Any failure aborts the whole load.
#[tracing::instrument(skip_all, fields(sources = sources.len()))]
pub async fn load_surveys<C: HttpClient>(
    client: &C,
    sources: &[String],
) -> Result<Vec<SurveyRecord>> {
    let mut tables = Vec::with_capacity(sources.len());

    for (n, source) in sources.iter().enumerate() {
        let bytes = load_source(client, source).await?;
        let table = parse_surveys(&bytes).with_context(|| format!("failed to parse {source}"))?;
        info!(dataset = n + 1, rows = table.len(), "Dataset loaded");
        tables.push(table);
    }

    let merged = merge_surveys(tables);
    info!(rows = merged.len(), "Combined dataset");
    Ok(merged)
}
