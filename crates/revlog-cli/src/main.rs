//! revlog - train FSRS parameters from a review log.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use revlog_core::scheduler::round_interval;
use revlog_core::{
    default_config_path, format_parameters, read_revlog_file, FsrsEngine, Grade, MemoryState,
    ParameterFile, Pipeline, PipelineConfig, RevlogError, Scheduler,
};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "revlog")]
#[command(about = "Train FSRS parameters from a review log", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML, JSON or YAML). Defaults to ~/.revlog/config.toml if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit parameters to a review-log CSV
    Train {
        /// Review log with card_id,review_time,review_rating,review_state columns
        csv: PathBuf,

        /// Write fitted parameters to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Timezone offset from UTC in hours
        #[arg(long, allow_hyphen_values = true)]
        utc_offset: Option<i32>,

        /// Hour of the local day at which a new review day starts
        #[arg(long)]
        rollover: Option<u32>,

        /// Expand timelines on a single thread
        #[arg(long)]
        sequential: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the candidate states after the next review
    NextStates {
        /// Current stability (omit for a new card)
        #[arg(long, requires = "difficulty")]
        stability: Option<f32>,

        /// Current difficulty (omit for a new card)
        #[arg(long, requires = "stability")]
        difficulty: Option<f32>,

        /// Days since the last review
        #[arg(long, default_value = "0")]
        elapsed: u32,

        /// Desired retention (defaults to the configured value)
        #[arg(long)]
        retention: Option<f32>,

        /// Parameter file written by `train`; defaults to the published parameters
        #[arg(long)]
        parameters: Option<PathBuf>,
    },
}

fn init_tracing(log_level: &str) {
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries results, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                debug!(path = %default_path.display(), "Using default config file");
                PipelineConfig::from_file(&default_path)?
            } else {
                PipelineConfig::default()
            }
        }
    };
    Ok(config.with_env_overrides()?)
}

async fn train(
    mut config: PipelineConfig,
    csv: &Path,
    output: Option<&Path>,
    utc_offset: Option<i32>,
    rollover: Option<u32>,
    sequential: bool,
    json: bool,
) -> Result<()> {
    if let Some(offset) = utc_offset {
        config.day_boundary.utc_offset_hours = offset;
    }
    if let Some(rollover) = rollover {
        config.day_boundary.rollover_hours = rollover;
    }
    if sequential {
        config.parallel = false;
    }
    config.validate()?;

    let log = read_revlog_file(csv, &config)
        .await
        .with_context(|| format!("failed to read {}", csv.display()))?;

    // Parameter fitting is CPU-bound and runs on this worker thread.
    let report = tokio::task::block_in_place(|| {
        let mut engine = FsrsEngine::from_config(&[], &config)?;
        Pipeline::new(config).run(log, &mut engine)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_parameters(&report.parameters));
    }

    if let Some(path) = output {
        ParameterFile::new(report.parameters, report.summary.sequences)
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Saved parameters");
    }
    Ok(())
}

fn next_states(
    config: &PipelineConfig,
    memory: Option<MemoryState>,
    elapsed: u32,
    retention: Option<f32>,
    parameters: Option<&Path>,
) -> Result<()> {
    let engine = match parameters {
        Some(path) => {
            let file = ParameterFile::load(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            FsrsEngine::new(&file.parameters)?
        }
        None => FsrsEngine::with_default_parameters()?,
    };

    let scheduler = Scheduler::new(&engine, retention.unwrap_or(config.desired_retention));
    let next = scheduler.preview(memory, elapsed)?;

    for grade in Grade::ALL {
        let state = next.for_grade(grade);
        println!(
            "{:<6} interval {:>4}d  stability {:>9.4}  difficulty {:>7.4}",
            grade.to_string(),
            round_interval(state.interval),
            state.memory.stability,
            state.memory.difficulty
        );
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Train {
            csv,
            output,
            utc_offset,
            rollover,
            sequential,
            json,
        } => {
            train(
                config,
                &csv,
                output.as_deref(),
                utc_offset,
                rollover,
                sequential,
                json,
            )
            .await
        }
        Commands::NextStates {
            stability,
            difficulty,
            elapsed,
            retention,
            parameters,
        } => {
            let memory = stability
                .zip(difficulty)
                .map(|(s, d)| MemoryState::new(s, d));
            next_states(&config, memory, elapsed, retention, parameters.as_deref())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(hint) = err.downcast_ref::<RevlogError>().and_then(RevlogError::suggestion) {
                eprintln!("Hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}
