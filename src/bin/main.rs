//! joinpath CLI - find join paths between tables of a schema snapshot
//!
//! Usage:
//!   joinpath solve <snapshot.json> --table <T> --table <T> [--config <F>] [--exact] [--slack <N>]
//!   joinpath components <snapshot.json> --table <T> ...
//!
//! Examples:
//!   joinpath solve schema.json -t sales.orders -t hr.employees
//!   joinpath solve schema.json -t sales.orders -t sales.regions --exact --format json

use clap::{Parser, Subcommand, ValueEnum};
use joinpath::config::{Settings, SettingsError};
use joinpath::graph::JoinGraph;
use joinpath::schema::SchemaSnapshot;
use joinpath::solver::report::render_results;
use joinpath::solver::{JoinSolver, SolveOutcome, SolverEvent};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "joinpath")]
#[command(about = "joinpath - connect required tables through foreign keys")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find join paths connecting the required tables
    Solve {
        /// Path to the schema snapshot (JSON)
        snapshot: PathBuf,

        /// Required table as schema.table (repeatable)
        #[arg(short, long = "table", required = true)]
        tables: Vec<String>,

        /// Settings file (default lookup when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Exhaustive Steiner search and shortest paths only
        #[arg(long)]
        exact: bool,

        /// Extra cost allowed per super-edge path
        #[arg(long)]
        slack: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show how the required tables are connected
    Components {
        /// Path to the schema snapshot (JSON)
        snapshot: PathBuf,

        /// Required table as schema.table (repeatable)
        #[arg(short, long = "table", required = true)]
        tables: Vec<String>,

        /// Settings file (default lookup when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human readable listing
    Text,
    /// JSON array of solutions
    Json,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            snapshot,
            tables,
            config,
            exact,
            slack,
            format,
        } => cmd_solve(snapshot, tables, config, exact, slack, format),
        Commands::Components {
            snapshot,
            tables,
            config,
        } => cmd_components(snapshot, tables, config),
    }
}

fn load_settings(config: Option<&Path>) -> Result<Settings, SettingsError> {
    match config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

/// Load snapshot and settings, then build the graph.
fn prepare(
    snapshot_path: &Path,
    tables: &[String],
    settings: &Settings,
) -> Result<(SchemaSnapshot, JoinGraph), ExitCode> {
    let snapshot = match SchemaSnapshot::from_json_file(snapshot_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading snapshot: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    match JoinGraph::build(&snapshot, tables, settings) {
        Ok(graph) => Ok((snapshot, graph)),
        Err(e) => {
            eprintln!("Error building join graph: {}", e);
            Err(ExitCode::FAILURE)
        }
    }
}

fn cmd_solve(
    snapshot_path: PathBuf,
    tables: Vec<String>,
    config: Option<PathBuf>,
    exact: bool,
    slack: Option<u32>,
    format: OutputFormat,
) -> ExitCode {
    let mut settings = match load_settings(config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if exact {
        settings.solver.exact = true;
        settings.solver.exact_paths = Some(true);
    }
    if let Some(slack) = slack {
        settings.solver.path_slack = slack;
    }

    let (snapshot, graph) = match prepare(&snapshot_path, &tables, &settings) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    for table in graph.disconnected() {
        eprintln!("warning: {} is not connected to the other tables", table);
    }

    let handle = match JoinSolver::new(graph, settings).spawn() {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error starting solver: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = handle.wait_with(|event| match event {
        SolverEvent::Progress(progress) => log::debug!("{:?}", progress),
        SolverEvent::Touched { phase, tables } => {
            log::debug!("{:?}: {}", phase, tables.join(", "))
        }
        SolverEvent::Finished(_) | SolverEvent::Stopped => {}
    });

    let results = match outcome {
        SolveOutcome::Found(results) => results,
        SolveOutcome::Stopped => {
            eprintln!("Solve stopped before completion");
            return ExitCode::FAILURE;
        }
        SolveOutcome::Failed(message) => {
            eprintln!("Solver failed: {}", message);
            return ExitCode::FAILURE;
        }
    };

    match format {
        OutputFormat::Text => {
            print!("{}", render_results(&results, &snapshot));
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&results.into_vec()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing results: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn cmd_components(snapshot_path: PathBuf, tables: Vec<String>, config: Option<PathBuf>) -> ExitCode {
    let settings = match load_settings(config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (_, graph) = match prepare(&snapshot_path, &tables, &settings) {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    println!("File: {}", snapshot_path.display());
    println!();

    println!("Tables ({}):", graph.vertex_count());
    for vertex in 0..graph.vertex_count() {
        let marker = if graph.is_terminal(vertex) { " *" } else { "" };
        println!("  [{}] {}{}", vertex, graph.table_name(vertex), marker);
    }
    println!();

    println!("Joins: {}", graph.edge_count());
    println!();

    if !graph.disconnected().is_empty() {
        println!("Disconnected ({}):", graph.disconnected().len());
        for table in graph.disconnected() {
            println!("  - {}", table);
        }
        println!();
    }

    if !graph.advisories().is_empty() {
        println!("Advisories ({}):", graph.advisories().len());
        for advisory in graph.advisories() {
            println!("  - {}", advisory);
        }
    }

    ExitCode::SUCCESS
}
