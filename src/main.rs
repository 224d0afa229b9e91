// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use company_enrich::utils::logging::{format_error, format_success, format_warning};
use company_enrich::{
    format_summary, read_csv, AliasTable, Config, JobStatus, JsonExporter, LinkedInFetcher,
    Orchestrator, ProgressTracker, SchemaNormalizer,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "company_enrich")]
#[command(version = "0.1.0")]
#[command(about = "Bulk company record enrichment from LinkedIn pages", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: ingest, enrich, merge, export
    Run {
        /// CSV file with company rows
        input: PathBuf,

        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,

        #[arg(long, value_name = "NUM")]
        limit: Option<usize>,
    },

    /// Normalize only and report how rows would be treated
    Check {
        /// CSV file with company rows
        input: PathBuf,
    },

    /// Print the effective header alias table
    Aliases,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    company_enrich::utils::logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Run {
            input,
            output,
            pretty,
            limit,
        } => {
            cmd_run(&config, input, output, pretty, limit, cli.color).await?;
        }
        Commands::Check { input } => {
            cmd_check(&config, input)?;
        }
        Commands::Aliases => {
            cmd_aliases(&config)?;
        }
    }

    Ok(())
}

async fn cmd_run(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
    pretty: bool,
    limit: Option<usize>,
    color: bool,
) -> Result<()> {
    info!("Starting enrichment pipeline for {}", input.display());

    let mut dataset = read_csv(&input).context("Failed to read CSV input")?;
    if let Some(limit) = limit {
        dataset.rows.truncate(limit);
    }

    let fetcher =
        Arc::new(LinkedInFetcher::new(&config.scraper).context("Failed to build HTTP client")?);
    let orchestrator = Orchestrator::new(config, fetcher)?;

    let job_id = orchestrator.submit(&dataset)?;
    info!("Submitted job {}", job_id);

    let initial = orchestrator.status(job_id)?;
    if initial.rejected > 0 {
        warn!(
            "{} rows rejected before enrichment (missing required fields)",
            initial.rejected
        );
    }

    let tracker = ProgressTracker::with_color(initial.total, color);
    let mut poll = tokio::time::interval(Duration::from_millis(200));
    let state = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupt received, cancelling job (in-flight fetches will drain)");
                orchestrator.cancel(job_id)?;
            }
            _ = poll.tick() => {
                let state = orchestrator.status(job_id)?;
                tracker.update(&state);
                if state.is_terminal() {
                    break state;
                }
            }
        }
    };
    tracker.finish();

    let results = orchestrator.results(job_id)?;
    let output_dir = output.unwrap_or_else(|| config.export.output_dir.clone());
    let exporter = JsonExporter::new(&output_dir).context("Failed to prepare output directory")?;
    let manifest = exporter.export_job(
        job_id,
        &results,
        &state,
        pretty || config.export.pretty,
    )?;

    info!("Exported {} files to {}", manifest.files.len() + 1, output_dir.display());
    for line in format_summary(&tracker.stats(&state)) {
        info!("{}", line);
    }

    match state.status {
        JobStatus::Completed if state.completed == state.total => {
            println!("{}", format_success(&format!("Job {} completed", job_id)));
        }
        JobStatus::Completed => {
            println!(
                "{}",
                format_warning(&format!(
                    "Job {} completed with {} unenriched records",
                    job_id,
                    state.total - state.completed
                ))
            );
        }
        _ => {
            println!("{}", format_error(&format!("Job {} failed", job_id)));
            anyhow::bail!("job failed: no records could be processed");
        }
    }

    Ok(())
}

fn cmd_check(config: &Config, input: PathBuf) -> Result<()> {
    let dataset = read_csv(&input).context("Failed to read CSV input")?;
    let normalizer = SchemaNormalizer::new(AliasTable::from_config(config)?);
    let normalized = normalizer.normalize(&dataset)?;

    info!(
        "{} rows: {} enrichable, {} rejected",
        dataset.rows.len(),
        normalized.records.len(),
        normalized.rejected.len()
    );

    for rejected in &normalized.rejected {
        warn!(
            "row {}: {:?} ({} source columns kept)",
            rejected.row_index,
            rejected.reason,
            rejected.source_fields.len()
        );
    }

    Ok(())
}

fn cmd_aliases(config: &Config) -> Result<()> {
    let table = AliasTable::from_config(config)?;
    let mut current = None;
    for (field, alias) in table.entries() {
        if current != Some(field) {
            println!("{}", field);
            current = Some(field);
        }
        println!("  {}", alias);
    }
    Ok(())
}
