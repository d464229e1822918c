// LavandeRio Analytics - CLI
// Every command prints pretty JSON to stdout; logs go to stderr

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lavanderio_analytics::config::{DATA_DIR_ENV, DEFAULT_DATA_DIR};
use lavanderio_analytics::{
    detect_chartable_content, generate_chart_data, rag_context, AnalysisType, CollectionAnalyzer,
    DataConfig, Datasets,
};

#[derive(Parser, Debug)]
#[command(name = "lavanderio")]
#[command(about = "Collections analytics for the LavandeRio portfolio")]
#[command(version)]
struct Cli {
    /// Directory holding the CSV tables and the company context
    #[arg(long, global = true, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one portfolio analysis
    Analyze {
        /// summary | priority | strategies | insights
        #[arg(long = "type", default_value = "summary")]
        analysis_type: String,

        /// Portfolio CSV (defaults to the one in the data directory)
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Generate chart-ready series
    Chart {
        /// line | area | pie | bar
        #[arg(long = "type")]
        chart_type: String,

        #[arg(long, default_value = "")]
        query: String,
    },

    /// Keyword lookup over the knowledge base
    Context {
        #[arg(long)]
        query: String,
    },

    /// Decide whether an answer is worth a chart
    Detect {
        #[arg(long)]
        content: String,

        #[arg(long, default_value = "")]
        query: String,
    },
}

#[derive(Serialize)]
struct CliError {
    error: String,
    timestamp: String,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lavanderio_analytics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let report = CliError {
            error: format!("{:#}", e),
            timestamp: Local::now().to_rfc3339(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = DataConfig::new(cli.data_dir);

    let output = match cli.command {
        Command::Analyze {
            analysis_type,
            data,
        } => {
            let analysis: AnalysisType = analysis_type.parse()?;
            let path = data.unwrap_or_else(|| config.portfolio_path());
            info!(analysis = %analysis, path = %path.display(), "Running analysis");

            let analyzer = CollectionAnalyzer::from_path(&path)?;
            serde_json::to_value(analyzer.run(analysis)?)?
        }
        Command::Chart { chart_type, query } => {
            let chart_data = generate_chart_data(&chart_type, &query, &config)
                .context("Failed to generate chart")?;
            serde_json::json!({ "chartData": chart_data })
        }
        Command::Context { query } => {
            let context = rag_context(&query, || Datasets::load(&config));
            serde_json::json!({ "context": context })
        }
        Command::Detect { content, query } => {
            serde_json::to_value(detect_chartable_content(&content, &query)?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
