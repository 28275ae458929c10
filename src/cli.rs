//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{OutputFormat, View};
use clap::Parser;
use std::path::PathBuf;

/// Pitwall - season dashboards over motorsport race results
///
/// Reads a race results CSV (and optionally a driver roster), computes
/// standings, wins, podiums, teammate head-to-heads and championship
/// progression, and renders them as Markdown or JSON.
///
/// Examples:
///   pitwall --results f1_race_results_2025.csv
///   pitwall --view simple --output dashboard.md
///   pitwall --races Bahrain,Jeddah --teams McLaren --format json
///   pitwall --race Monaco --h2h-team Ferrari
///   pitwall --list
///   pitwall --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Race results CSV
    ///
    /// Needs Race, Driver, Position and Points columns; Team is optional.
    /// Defaults to the [data] section of .pitwall.toml.
    #[arg(short, long, value_name = "FILE", env = "PITWALL_RESULTS")]
    pub results: Option<PathBuf>,

    /// Driver roster CSV (FullName, Team, Abbreviation)
    ///
    /// Used to resolve teams when the results table has no Team column.
    /// A missing file is not an error.
    #[arg(long, value_name = "FILE", env = "PITWALL_ROSTER")]
    pub roster: Option<PathBuf>,

    /// Dashboard view
    #[arg(long, value_name = "VIEW")]
    pub view: Option<View>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file path for the dashboard
    ///
    /// Prints to stdout when not set here or in the config file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Dashboard title
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Races to include (comma-separated, all when omitted)
    ///
    /// Example: --races "Bahrain,Saudi Arabia"
    #[arg(long, value_name = "RACES", value_delimiter = ',')]
    pub races: Vec<String>,

    /// Teams to include (comma-separated, all when omitted)
    ///
    /// Example: --teams "McLaren,Ferrari"
    #[arg(long, value_name = "TEAMS", value_delimiter = ',')]
    pub teams: Vec<String>,

    /// Race to break down in the race analysis section
    ///
    /// Every selected race is shown when omitted
    #[arg(long, value_name = "RACE")]
    pub race: Option<String>,

    /// Team for the teammate comparison
    ///
    /// Every team with more than one driver is shown when omitted
    #[arg(long, value_name = "TEAM")]
    pub h2h_team: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pitwall.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List available races and teams, then exit
    #[arg(long)]
    pub list: bool,

    /// Generate a default .pitwall.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref results) = self.results {
            if !results.exists() {
                return Err(format!(
                    "Results file does not exist: {}",
                    results.display()
                ));
            }
            if !results.is_file() {
                return Err(format!(
                    "Results path is not a file: {}",
                    results.display()
                ));
            }
        }

        if self.races.iter().any(|r| r.trim().is_empty()) {
            return Err("Race names in --races must not be empty".to_string());
        }
        if self.teams.iter().any(|t| t.trim().is_empty()) {
            return Err("Team names in --teams must not be empty".to_string());
        }

        Ok(())
    }

    /// Race selection with surrounding whitespace removed.
    pub fn selected_races(&self) -> Vec<String> {
        self.races.iter().map(|r| r.trim().to_string()).collect()
    }

    /// Team selection with surrounding whitespace removed.
    pub fn selected_teams(&self) -> Vec<String> {
        self.teams.iter().map(|t| t.trim().to_string()).collect()
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_default` comes from the config file; `--quiet` beats it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            results: None,
            roster: None,
            view: None,
            format: None,
            output: None,
            title: None,
            races: Vec::new(),
            teams: Vec::new(),
            race: None,
            h2h_team: None,
            config: None,
            verbose: false,
            quiet: false,
            list: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_selection_lists() {
        let args = Args::try_parse_from([
            "pitwall",
            "--races",
            "Bahrain, Saudi Arabia",
            "--teams",
            "McLaren",
            "--view",
            "simple",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.selected_races(), vec!["Bahrain", "Saudi Arabia"]);
        assert_eq!(args.selected_teams(), vec!["McLaren"]);
        assert_eq!(args.view, Some(View::Simple));
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_validation_missing_results_file() {
        let mut args = make_args();
        args.results = Some(PathBuf::from("/definitely/not/here.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_selection() {
        let mut args = make_args();
        args.races = vec!["Bahrain".to_string(), " ".to_string()];
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
