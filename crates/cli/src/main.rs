//! # wayguard
//!
//! Command-line interface for the tourist anomaly scoring engine.
//!
//! Every command reads a JSON request file and prints a JSON response.

use anomaly::{
    read_bundle, AnomalyEngine, DropoffRequest, EngineConfig, InactivityRequest,
    ModelPathRequest, OperationStatus, RouteDeviationRequest, ScoringMode, TrainRequest,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = std::result::Result<T, String>;

#[derive(Parser)]
#[command(name = "wayguard")]
#[command(about = "Tourist GPS anomaly scoring CLI", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Refit on the request window (default)
    Window,
    /// Score with the trained models
    Trained,
}

impl From<Mode> for ScoringMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Window => ScoringMode::WindowRefit,
            Mode::Trained => ScoringMode::Trained,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score the latest movement step for signal loss or sudden stoppage
    Dropoff {
        /// Request file with `location_data`
        #[arg(short, long)]
        input: PathBuf,

        /// Model bundle to load first
        #[arg(short, long)]
        models: Option<PathBuf>,

        /// Scoring mode (overrides the configured one)
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the longest gap between fixes against a threshold
    Inactivity {
        /// Request file with `location_data` and optional `threshold_minutes`
        #[arg(short, long)]
        input: PathBuf,

        /// Threshold in minutes (overrides the request)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Model bundle to load first
        #[arg(short, long)]
        models: Option<PathBuf>,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare a travelled path with the planned itinerary
    Route {
        /// Request file with `current_path` and `planned_itinerary`
        #[arg(short, long)]
        input: PathBuf,

        /// Model bundle to load first
        #[arg(short, long)]
        models: Option<PathBuf>,

        /// Output file (optional)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Train detector models from historical sequences
    Train {
        /// Request file with `training_data`
        #[arg(short, long)]
        input: PathBuf,

        /// Save the trained bundle here (default path when given without a value)
        #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
        save: Option<String>,
    },

    /// Report engine status
    Health {
        /// Model bundle to load first
        #[arg(short, long)]
        models: Option<PathBuf>,
    },
}

/// Load a JSON document
fn load_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Write a JSON response to file or stdout
fn write_response<T: Serialize>(response: &T, output: Option<&PathBuf>) -> CliResult<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| format!("Failed to serialize response: {}", e))?;

    if let Some(path) = output {
        std::fs::write(path, json).map_err(|e| format!("Failed to write output: {}", e))?;
        eprintln!("Response written to {:?}", path);
    } else {
        println!("{}", json);
    }
    Ok(())
}

/// Build the engine from `--config`, then replace it with a saved bundle if
/// one is given. A bundle carries its own configuration.
fn build_engine(
    config: Option<&Path>,
    models: Option<&Path>,
    mode: Option<Mode>,
) -> CliResult<AnomalyEngine> {
    let engine = match models {
        Some(path) => {
            let mut bundle = read_bundle(path).map_err(|e| e.to_string())?;
            if let Some(mode) = mode {
                bundle.config.scoring_mode = mode.into();
            }
            AnomalyEngine::from_bundle(bundle).map_err(|e| e.to_string())?
        }
        None => {
            let mut config: EngineConfig = match config {
                Some(path) => load_json(path)?,
                None => EngineConfig::default(),
            };
            if let Some(mode) = mode {
                config.scoring_mode = mode.into();
            }
            AnomalyEngine::new(config).map_err(|e| e.to_string())?
        }
    };
    debug!(trained = engine.is_trained(), "Engine ready");
    Ok(engine)
}

fn run_dropoff(
    engine: &AnomalyEngine,
    input: &Path,
    output: Option<&PathBuf>,
) -> CliResult<()> {
    let request: DropoffRequest = load_json(input)?;
    request.validate().map_err(|e| e.to_string())?;

    let result = engine
        .detect_location_dropoff(&request.location_data)
        .map_err(|e| e.to_string())?;
    write_response(&result, output)
}

fn run_inactivity(
    engine: &AnomalyEngine,
    input: &Path,
    threshold: Option<f64>,
    output: Option<&PathBuf>,
) -> CliResult<()> {
    let request: InactivityRequest = load_json(input)?;
    request.validate().map_err(|e| e.to_string())?;

    let result = engine
        .detect_prolonged_inactivity(
            &request.location_data,
            threshold.or(request.threshold_minutes),
        )
        .map_err(|e| e.to_string())?;
    write_response(&result, output)
}

fn run_route(engine: &AnomalyEngine, input: &Path, output: Option<&PathBuf>) -> CliResult<()> {
    let request: RouteDeviationRequest = load_json(input)?;
    request.validate().map_err(|e| e.to_string())?;

    let result = engine
        .detect_route_deviation(&request.current_path, &request.planned_itinerary)
        .map_err(|e| e.to_string())?;
    write_response(&result, output)
}

/// `--save` without a value uses the default bundle path; otherwise the value
/// is the bundle path itself.
fn resolve_save_path(save: &str) -> PathBuf {
    if save.is_empty() {
        PathBuf::from(ModelPathRequest::default().filepath)
    } else {
        PathBuf::from(save)
    }
}

fn run_train(mut engine: AnomalyEngine, input: &Path, save: Option<String>) -> CliResult<()> {
    let request: TrainRequest = load_json(input)?;

    let status = OperationStatus::from_result(
        engine.train(&request.training_data),
        "Failed to train models",
    );
    write_response(&status, None)?;
    if !status.is_success() {
        return Err(status.message);
    }

    if let Some(save) = save {
        let path = resolve_save_path(&save);
        let status =
            OperationStatus::from_result(engine.save_models(&path), "Failed to save models");
        write_response(&status, None)?;
        if !status.is_success() {
            return Err(status.message);
        }
    }
    Ok(())
}

fn main() {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the JSON response
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayguard=info,anomaly_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Dropoff {
            input,
            models,
            mode,
            output,
        } => build_engine(config, models.as_deref(), mode)
            .and_then(|engine| run_dropoff(&engine, &input, output.as_ref())),

        Commands::Inactivity {
            input,
            threshold,
            models,
            output,
        } => build_engine(config, models.as_deref(), None)
            .and_then(|engine| run_inactivity(&engine, &input, threshold, output.as_ref())),

        Commands::Route {
            input,
            models,
            output,
        } => build_engine(config, models.as_deref(), None)
            .and_then(|engine| run_route(&engine, &input, output.as_ref())),

        Commands::Train { input, save } => {
            build_engine(config, None, None).and_then(|engine| run_train(engine, &input, save))
        }

        Commands::Health { models } => build_engine(config, models.as_deref(), None)
            .and_then(|engine| write_response(&engine.health(), None)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
