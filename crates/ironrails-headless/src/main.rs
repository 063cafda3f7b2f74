use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ironrails_core::data::{create_default_data_files, DataLoader};
use ironrails_core::economy::CatalogAnalyzer;
use ironrails_core::{Catalog, SimulationApp, TimeDate, YearFinancialResult};
use serde::Serialize;
use std::time::Instant;

/// Log lines copied into the JSON report
const REPORT_LOG_LINES: usize = 50;

#[derive(Parser)]
#[command(name = "ironrails-headless")]
#[command(about = "Iron Rails headless simulation driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo scenario for a number of days
    Run {
        /// Number of days to simulate
        #[arg(long, default_value = "365")]
        days: u64,

        /// Data directory with catalog TOML files (built-in catalog if omitted)
        #[arg(long)]
        data_dir: Option<String>,

        /// Write a RON save when the run ends
        #[arg(long)]
        save: Option<String>,

        /// Write a JSON summary of the run
        #[arg(long)]
        report: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Continue a saved game
    Resume {
        /// Save file to load
        save_file: String,

        /// Number of days to simulate
        #[arg(long, default_value = "365")]
        days: u64,

        /// Data directory with catalog TOML files (built-in catalog if omitted)
        #[arg(long)]
        data_dir: Option<String>,

        /// Write a RON save when the run ends
        #[arg(long)]
        save: Option<String>,

        /// Write a JSON summary of the run
        #[arg(long)]
        report: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate game data files
    ValidateData {
        /// Data directory to validate
        #[arg(long, default_value = "assets/data")]
        data_dir: String,
    },

    /// Write the built-in catalog as TOML files
    InitData {
        /// Directory to create the files in
        #[arg(long, default_value = "assets/data")]
        data_dir: String,
    },
}

struct RunOptions<'a> {
    days: u64,
    save: Option<&'a str>,
    report: Option<&'a str>,
}

#[derive(Serialize)]
struct RunReport {
    start_date: String,
    end_date: String,
    days: u64,
    money: i64,
    financial_results: Vec<YearFinancialResult>,
    deliveries: usize,
    routes: Vec<RouteSummary>,
    recent_log: Vec<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct RouteSummary {
    name: String,
    active: bool,
    station: String,
    next_event: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            days,
            data_dir,
            save,
            report,
            verbose,
        } => {
            init_logging(*verbose);
            let mut sim = SimulationApp::new(load_catalog(data_dir.as_deref())?)?;
            sim.initialize_demo()?;
            run_simulation(
                sim,
                RunOptions {
                    days: *days,
                    save: save.as_deref(),
                    report: report.as_deref(),
                },
            )
        }
        Commands::Resume {
            save_file,
            days,
            data_dir,
            save,
            report,
            verbose,
        } => {
            init_logging(*verbose);
            let mut sim = SimulationApp::new(load_catalog(data_dir.as_deref())?)?;
            sim.load_state(save_file)?;
            run_simulation(
                sim,
                RunOptions {
                    days: *days,
                    save: save.as_deref(),
                    report: report.as_deref(),
                },
            )
        }
        Commands::ValidateData { data_dir } => {
            init_logging(true);
            validate_data(data_dir)
        }
        Commands::InitData { data_dir } => {
            init_logging(false);
            create_default_data_files(data_dir)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn load_catalog(data_dir: Option<&str>) -> Result<Catalog> {
    match data_dir {
        Some(dir) => DataLoader::load_from_directory(dir)
            .with_context(|| format!("loading catalog from {}", dir)),
        None => Ok(Catalog::default()),
    }
}

fn run_simulation(mut sim: SimulationApp, options: RunOptions) -> Result<()> {
    let start_date = sim.current_date();
    log::info!("Starting simulation on {} for {} days", start_date, options.days);

    let start_time = Instant::now();
    let mut failure = None;

    for day in 0..options.days {
        if let Err(err) = sim.tick() {
            log::error!("Simulation stopped on {}: {}", sim.current_date(), err);
            failure = Some(err);
            break;
        }

        if day > 0 && day % 365 == 0 {
            log::info!(
                "Progress: {} - money {} ({:.1}s elapsed)",
                sim.current_date(),
                sim.money(),
                start_time.elapsed().as_secs_f32()
            );
        }
    }

    let total_time = start_time.elapsed();
    log::info!(
        "Simulation reached {} in {:.2}s with {} money",
        sim.current_date(),
        total_time.as_secs_f32(),
        sim.money()
    );
    for result in &sim.simulation().financial_results {
        log::info!(
            "  {}: earned {}, fuel {}, balance {}",
            result.year,
            result.earning,
            result.fuel_cost,
            result.balance()
        );
    }

    if let Some(filename) = options.save {
        sim.save_state(filename)?;
    }

    if let Some(filename) = options.report {
        let report = build_report(&sim, start_date, failure.as_ref().map(|e| e.to_string()));
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(filename, json).with_context(|| format!("writing report {}", filename))?;
        log::info!("Report written to {}", filename);
    }

    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn build_report(sim: &SimulationApp, start_date: TimeDate, error: Option<String>) -> RunReport {
    let scenario = sim.scenario();
    let routes = sim
        .scheduler()
        .route_events()
        .map(|event| RouteSummary {
            name: event.route.name.clone(),
            active: event.route.is_running(),
            station: event
                .route
                .points
                .get(event.route.position)
                .and_then(|point| scenario.stations.get(&point.station))
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            next_event: TimeDate::from_total_days(event.header.next_generation_date)
                .to_string(),
        })
        .collect();

    let entries = &sim.event_log().entries;
    let recent_log = entries
        .iter()
        .skip(entries.len().saturating_sub(REPORT_LOG_LINES))
        .map(|e| e.line.clone())
        .collect();

    RunReport {
        start_date: start_date.to_string(),
        end_date: sim.current_date().to_string(),
        days: sim.current_day().saturating_sub(start_date.total_days()),
        money: sim.money(),
        financial_results: sim.simulation().financial_results.clone(),
        deliveries: sim.simulation().unload_cargo_logs().len(),
        routes,
        recent_log,
        error,
    }
}

fn validate_data(data_dir: &str) -> Result<()> {
    log::info!("Validating data files in {}", data_dir);

    match DataLoader::load_from_directory(data_dir) {
        Ok(catalog) => {
            log::info!("✓ Data validation passed");
            log::info!("  Resource types: {}", catalog.resources.len());
            log::info!("  Industries: {}", catalog.industries.len());
            log::info!("  Locomotives: {}", catalog.locomotives.len());
            log::info!("  Carriages: {}", catalog.carriages.len());
            log::info!("  Historical events: {}", catalog.history.len());

            let analysis = CatalogAnalyzer::new(&catalog).analyze();
            log::info!("  Resource sources: {}", analysis.sources.join(", "));
            log::info!("  Resource sinks: {}", analysis.sinks.join(", "));
        }
        Err(e) => {
            log::error!("✗ Data validation failed: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
