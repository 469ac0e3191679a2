//! CLI entry point for the survey risk pipelines.
//!
//! `analyze` merges the survey catalogue exports and writes a summary;
//! `predict` trains the risk model and writes district projections.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use survey_risk::{
    fetch::BasicClient,
    output::{print_json, write_json},
    predictor::{PredictConfig, predict},
    sources::{default_sources, load_surveys},
    stats::SurveySummary,
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "survey_risk")]
#[command(about = "Summarize nutrition survey metadata and model malnutrition risk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the survey CSVs and write summary statistics
    Analyze {
        /// CSV URL or file path; repeat to read several (defaults to the published exports)
        #[arg(short, long = "source", value_name = "FILE_OR_URL")]
        sources: Vec<String>,

        /// JSON file to write the summary to
        #[arg(short, long, default_value = "survey-data-processed.json")]
        output: PathBuf,
    },
    /// Train the risk model and write district predictions
    Predict {
        /// CSV URL or file path; repeat to read several (defaults to the published exports)
        #[arg(short, long = "source", value_name = "FILE_OR_URL")]
        sources: Vec<String>,

        /// JSON file to write the model output to
        #[arg(short, long, default_value = "model-predictions.json")]
        output: PathBuf,

        /// Seed for the noise, split, forest and district draws
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Year survey age is measured from
        #[arg(long, default_value_t = survey_risk::features::REFERENCE_YEAR)]
        reference_year: i32,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u16).range(1..))]
        trees: u16,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/survey_risk.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("survey_risk.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let client = BasicClient::new()?;

    match cli.command {
        Commands::Analyze { sources, output } => {
            let records = load_surveys(&client, &or_defaults(sources)).await?;
            let summary = SurveySummary::from_records(records)?;

            info!(
                total_surveys = summary.total_surveys,
                unique_survey_ids = summary.unique_survey_ids,
                start = summary.date_range.start,
                end = summary.date_range.end,
                authorities = summary.authorities.len(),
                "Survey summary"
            );
            for (year, count) in &summary.surveys_by_year {
                info!(year, count, "Surveys by year");
            }

            write_json(&output, &summary)?;
        }
        Commands::Predict {
            sources,
            output,
            seed,
            reference_year,
            trees,
        } => {
            let records = load_surveys(&client, &or_defaults(sources)).await?;
            let config = PredictConfig {
                seed,
                reference_year,
                n_trees: usize::from(trees),
            };

            let model_output = predict(&records, &config)?;
            print_json(&model_output.model_metrics)?;

            write_json(&output, &model_output)?;
        }
    }

    Ok(())
}

fn or_defaults(sources: Vec<String>) -> Vec<String> {
    if sources.is_empty() {
        default_sources()
    } else {
        sources
    }
}
