//! causal-lab CLI.
//!
//! Generates synthetic datasets from graph files and answers causal queries
//! against CSV data. Results go to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use causal_lab::config::Settings;
use causal_lab::engine::{load_model, QueryEngine};
use causal_lab::graph;
use causal_lab::logging::init_logging;
use causal_lab::model::validate_dataset;
use causal_lab::query::{
    AnomalyAttributionQuery, EffectEstimationQuery, InterventionQuery, Query, QueryResult,
};
use causal_lab::synth::{SimulationParameters, SyntheticGenerator};
use causal_lab::table::DataTable;

/// Causal graph data generation and query tool.
#[derive(Parser)]
#[command(name = "causal-lab", version)]
#[command(about = "Generate synthetic causal data and answer causal queries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

/// Simulation overrides shared by the generation commands.
#[derive(clap::Args)]
struct SimulationArgs {
    /// Rows per dataset
    #[arg(short = 'n', long = "samples")]
    samples: Option<usize>,

    /// Treatment to outcome coefficient
    #[arg(short = 'e', long = "effect")]
    effect: Option<f64>,

    /// Standard deviation of additive noise
    #[arg(long)]
    noise: Option<f64>,

    /// Coefficient on confounder edges
    #[arg(long)]
    confounder_strength: Option<f64>,

    /// Generator seed
    #[arg(long)]
    seed: Option<u64>,
}

/// Graph and data inputs shared by the query commands.
#[derive(clap::Args)]
struct ModelArgs {
    /// Graph configuration (JSON)
    #[arg(long)]
    graph: PathBuf,

    /// Data file (CSV)
    #[arg(long)]
    data: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one dataset from a graph
    Generate {
        /// Graph configuration (JSON)
        graph: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        simulation: SimulationArgs,

        /// Print a summary of the generated table
        #[arg(long)]
        summary: bool,
    },
    /// Generate several datasets with a manifest
    GenerateBatch {
        /// Graph configuration (JSON)
        graph: PathBuf,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Number of datasets
        #[arg(long, default_value_t = 10)]
        datasets: usize,

        /// Treatment effect per dataset, comma separated
        #[arg(long, value_delimiter = ',')]
        effects: Option<Vec<f64>>,

        #[command(flatten)]
        simulation: SimulationArgs,
    },
    /// Answer a query read from a JSON file
    Query {
        /// Query file (JSON)
        #[arg(long)]
        query_file: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Estimate the effect of a treatment on an outcome
    Analyze {
        #[arg(long)]
        treatment: String,

        #[arg(long)]
        outcome: String,

        /// Extra common causes, comma separated
        #[arg(long, value_delimiter = ',')]
        confounders: Vec<String>,

        #[arg(long)]
        treatment_value: Option<f64>,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Attribute outcome values above a threshold
    Anomaly {
        #[arg(long)]
        outcome: String,

        #[arg(long)]
        threshold: f64,

        /// Candidate causes, comma separated
        #[arg(long, value_delimiter = ',')]
        causes: Vec<String>,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Predict outcome means after setting a variable
    Intervention {
        #[arg(long)]
        variable: String,

        #[arg(long)]
        value: f64,

        /// Outcomes to report, comma separated
        #[arg(long, value_delimiter = ',')]
        outcomes: Vec<String>,

        #[command(flatten)]
        model: ModelArgs,
    },
    /// Check a dataset against a graph before estimation
    Validate {
        #[command(flatten)]
        model: ModelArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    };
    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(2);
    }

    match run(cli.command, &settings) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(level) = &cli.log_level {
        settings.logging.level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        settings.logging.format.clone_from(format);
    }
    settings.logging.validate()?;
    Ok(settings)
}

/// Runs one command; `Ok(false)` means a query result reported failure.
fn run(command: Commands, settings: &Settings) -> Result<bool> {
    match command {
        Commands::Generate {
            graph: graph_path,
            output,
            simulation,
            summary,
        } => {
            let graph = graph::load(&graph_path)?;
            let (params, seed) = simulation.resolve(settings)?;
            let table = SyntheticGenerator::new(&graph, seed).generate(&params)?;
            table.write_csv(&output)?;
            info!(path = %output.display(), rows = table.n_rows(), "wrote dataset");
            if summary {
                print_json(&table.summary())?;
            }
            Ok(true)
        }
        Commands::GenerateBatch {
            graph: graph_path,
            out_dir,
            datasets,
            effects,
            simulation,
        } => {
            let graph = graph::load(&graph_path)?;
            let (params, seed) = simulation.resolve(settings)?;
            let generator = SyntheticGenerator::new(&graph, seed);
            let generated = generator.generate_multiple_datasets(datasets, effects.as_deref(), &params)?;
            let manifest = generator.save_datasets(&out_dir, &generated)?;
            print_json(&manifest)?;
            Ok(true)
        }
        Commands::Query { query_file, model } => {
            let text = std::fs::read_to_string(&query_file)
                .with_context(|| format!("reading {}", query_file.display()))?;
            let query: serde_json::Value =
                serde_json::from_str(&text).with_context(|| format!("parsing {}", query_file.display()))?;
            let engine = QueryEngine::new(settings.estimation.clone())?;
            report(&engine.dispatch_files(&query, &model.graph, &model.data))
        }
        Commands::Analyze {
            treatment,
            outcome,
            confounders,
            treatment_value,
            model,
        } => answer(
            &Query::EffectEstimation(EffectEstimationQuery {
                treatment_variable: treatment,
                outcome_variable: outcome,
                confounders,
                treatment_value,
            }),
            &model,
            settings,
        ),
        Commands::Anomaly {
            outcome,
            threshold,
            causes,
            model,
        } => answer(
            &Query::AnomalyAttribution(AnomalyAttributionQuery {
                outcome_variable: outcome,
                anomaly_threshold: threshold,
                potential_causes: causes,
                time_window: None,
            }),
            &model,
            settings,
        ),
        Commands::Intervention {
            variable,
            value,
            outcomes,
            model,
        } => answer(
            &Query::Intervention(InterventionQuery {
                intervention_variable: variable,
                intervention_value: value,
                outcome_variables: outcomes,
                constraints: None,
            }),
            &model,
            settings,
        ),
        Commands::Validate { model } => {
            let graph = graph::load(&model.graph)?;
            let (Some(treatment), Some(outcome)) = (graph.treatment(), graph.outcome()) else {
                bail!("graph must declare treatment_variable and outcome_variable");
            };
            let table = DataTable::read_csv(&model.data)?;
            let report = validate_dataset(&table, treatment, outcome, graph.confounders());
            print_json(&report)?;
            Ok(report.valid)
        }
    }
}

impl SimulationArgs {
    fn resolve(&self, settings: &Settings) -> Result<(SimulationParameters, u64)> {
        let mut params = settings.simulation;
        if let Some(n) = self.samples {
            params = params.with_samples(n);
        }
        if let Some(effect) = self.effect {
            params = params.with_treatment_effect(effect);
        }
        if let Some(noise) = self.noise {
            params = params.with_noise_std(noise);
        }
        if let Some(strength) = self.confounder_strength {
            params = params.with_confounder_strength(strength);
        }
        params.validate()?;
        Ok((params, self.seed.unwrap_or(settings.seed)))
    }
}

fn answer(query: &Query, model: &ModelArgs, settings: &Settings) -> Result<bool> {
    let engine = QueryEngine::new(settings.estimation.clone())?;
    let result = match load_model(&model.graph, &model.data) {
        Ok(loaded) => engine.dispatch(query, &loaded),
        Err(e) => QueryResult::failure(query.kind().as_str(), e.to_string()),
    };
    report(&result)
}

fn report(result: &QueryResult) -> Result<bool> {
    println!("{}", result.to_json_pretty());
    Ok(result.success)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
