use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use staffing_engine::config::Config;
use staffing_engine::db::Database;
use staffing_engine::engine::{
    OccupancyAnalyzer, SystemClock, TaskAssignmentAssistant, WorkloadRecommender,
};
use staffing_engine::store::StaffingStore;

#[derive(Parser)]
#[command(name = "staffing")]
#[command(about = "Workload balancing and task assignment recommendations")]
struct Cli {
    /// SQLite database (overrides STAFFING_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Classify every active contributor by occupancy
    Analyze {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Generate ranked rebalancing recommendations
    Recommend {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Only keep the N highest-priority recommendations
        #[arg(long)]
        top: Option<usize>,
    },
    /// Apply a recommendation read from a JSON file
    Apply {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Suggest contributors for a project's unstaffed tasks
    Suggest {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// Print occupancy thresholds
    Thresholds,
}

/// Initialize tracing with output to stderr so stdout carries only JSON
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(config.tracing_filter());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(&config);

    let db = match cli.database.or(config.database_path) {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let clock = SystemClock;

    match cli.command {
        Commands::Migrate => {
            tracing::info!("Database is up to date");
        }
        Commands::Analyze { start, end } => {
            let report = OccupancyAnalyzer::new(&db, &clock).analyze_all_contributors(start, end)?;
            print_json(&report)?;
        }
        Commands::Recommend { start, end, top } => {
            let mut report =
                WorkloadRecommender::new(&db, &clock).generate_recommendations(start, end)?;
            if let Some(top) = top {
                report.recommendations.truncate(top);
            }
            print_json(&report)?;
        }
        Commands::Apply { file, start, end } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let outcome =
                WorkloadRecommender::new(&db, &clock).apply_recommendation_json(&raw, start, end);
            print_json(&outcome)?;
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Commands::Suggest { project, start } => {
            let project = db
                .find_project(project)?
                .with_context(|| format!("Project {project} not found"))?;
            let report = TaskAssignmentAssistant::new(&db, &clock).generate_suggestions(&project, start)?;
            print_json(&report)?;
        }
        Commands::Thresholds => {
            print_json(&OccupancyAnalyzer::new(&db, &clock).thresholds())?;
        }
    }

    Ok(())
}
