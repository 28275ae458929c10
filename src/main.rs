//! Pitwall - season dashboards over motorsport race results
//!
//! A CLI tool that loads a season's race results, aggregates them into
//! standings, head-to-heads and championship progression, and renders the
//! simple or extensive dashboard as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (arguments, config, unreadable input, missing column)

mod analysis;
mod cli;
mod config;
mod data;
mod models;
mod report;

use analysis::DashboardOptions;
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, ConfigSource, CONFIG_FILE};
use data::DataError;
use models::{Dashboard, DashboardBody, OutputFormat, RaceEntry};
use report::palette::TeamPalette;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging, the file can raise verbosity
    let (mut config, source) = match Config::resolve(args.config.as_deref(), Path::new(".")) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("Pitwall v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    log_config_source(&source);

    match run_dashboard(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            match e.downcast_ref::<DataError>() {
                Some(DataError::MissingColumn { .. }) => {
                    eprintln!("\n❌ Input error: {}", e);
                }
                _ => eprintln!("\n❌ Error: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .pitwall.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set input files, view, format and team colors.");
    Ok(())
}

/// Initialize logging at the given level.
///
/// Logs go to stderr so a dashboard printed to stdout stays clean.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the load, aggregate, render workflow. Returns the exit code.
fn run_dashboard(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Load the season
    let season = data::load_season(&config.data.results, Some(&config.data.roster))?;

    if args.list {
        return handle_list(&season.entries);
    }

    let races = args.selected_races();
    let teams = args.selected_teams();
    warn_unknown_selection(&season.entries, &races, &teams);

    // Step 2: Aggregate
    let options = DashboardOptions {
        view: config.report.view,
        title: config.report.title.clone(),
        source: config.data.results.display().to_string(),
        races,
        teams,
        race: args.race.clone(),
        h2h_team: args.h2h_team.clone(),
        abbreviations: season.roster.abbreviations().clone(),
    };

    let palette = TeamPalette::new(&config.colors);
    let dashboard = analysis::build_dashboard(&season.entries, &options, &palette);

    if dashboard.metadata.entries == 0 {
        warn!("No entries left after filtering, the dashboard will be empty");
    }

    // Step 3: Render
    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    let Some(ref path) = config.general.output else {
        print!("{}", output);
        return Ok(0);
    };

    std::fs::write(path, &output)
        .with_context(|| format!("Failed to write dashboard to {}", path.display()))?;

    if !args.quiet {
        print_summary(&dashboard);
        println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Dashboard saved to: {}", path.display());
    }

    Ok(0)
}

/// Print a short summary after writing the dashboard to a file.
fn print_summary(dashboard: &Dashboard) {
    let meta = &dashboard.metadata;

    println!("\n📊 {} ({} view)", meta.title, dashboard.view());
    println!(
        "   Races: {} | Drivers: {} | Entries: {}",
        meta.races, meta.drivers, meta.entries
    );

    let leader = match &dashboard.body {
        DashboardBody::Simple(simple) => simple.driver_points.first().cloned(),
        DashboardBody::Extensive(extensive) => {
            extensive.driver_stats.highlights.most_points.clone()
        }
    };
    if let Some(leader) = leader {
        println!("   🏆 Points leader: {} ({})", leader.name, leader.value);
    }
}

/// Handle --list: print the available selections and exit.
fn handle_list(entries: &[RaceEntry]) -> Result<i32> {
    let races = analysis::distinct_races(entries);
    let teams = analysis::distinct_teams(entries);
    let comparable = analysis::teams_with_multiple_drivers(entries);

    println!("\n🏁 Races ({}):", races.len());
    for race in &races {
        println!("     {}", race);
    }

    println!("\n🏎️  Teams ({}):", teams.len());
    for team in &teams {
        println!("     {}", team);
    }

    println!("\n🤝 Teams with teammate comparison ({}):", comparable.len());
    for team in &comparable {
        println!("     {}", team);
    }

    Ok(0)
}

/// Warn about selected races or teams that are not in the data.
fn warn_unknown_selection(entries: &[RaceEntry], races: &[String], teams: &[String]) {
    let known_races: HashSet<&str> = entries.iter().map(|e| e.race.as_str()).collect();
    let known_teams: HashSet<&str> = entries.iter().map(|e| e.team.as_str()).collect();

    for race in races.iter().filter(|r| !known_races.contains(r.as_str())) {
        warn!("Selected race '{}' does not appear in the results", race);
    }
    for team in teams.iter().filter(|t| !known_teams.contains(t.as_str())) {
        warn!("Selected team '{}' does not appear in the results", team);
    }
}

/// Report where the configuration came from.
fn log_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::Discovered(path) => info!("Loaded default config from {}", path.display()),
        ConfigSource::Defaults => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(e) => warn!("Failed to load config, using defaults: {:#}", e),
    }
}
