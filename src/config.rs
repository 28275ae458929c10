//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.pitwall.toml` files.

use crate::models::{OutputFormat, View};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".pitwall.toml";

/// Where the effective configuration came from.
#[derive(Debug)]
pub enum ConfigSource {
    /// File given with `--config`.
    Explicit(PathBuf),
    /// `.pitwall.toml` found in the working directory.
    Discovered(PathBuf),
    /// No file, built-in defaults.
    Defaults,
    /// The discovered file could not be loaded; built-in defaults are used.
    Fallback(anyhow::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input table locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Team color overrides (`team = "#rrggbb"`).
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Input table locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Race results CSV.
    #[serde(default = "default_results")]
    pub results: PathBuf,

    /// Driver roster CSV (optional at runtime).
    #[serde(default = "default_roster")]
    pub roster: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            results: default_results(),
            roster: default_roster(),
        }
    }
}

fn default_results() -> PathBuf {
    PathBuf::from("f1_race_results_2025.csv")
}

fn default_roster() -> PathBuf {
    PathBuf::from("f1_drivers_list_2025.csv")
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Dashboard flavor.
    #[serde(default)]
    pub view: View,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Dashboard title.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            view: View::default(),
            format: OutputFormat::default(),
            title: default_title(),
        }
    }
}

fn default_title() -> String {
    "F1 2025 Season Dashboard".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `.pitwall.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must load. Otherwise `.pitwall.toml` in `dir` is
    /// used when present, and a file that fails to load falls back to the
    /// defaults. Nothing is logged here since logging depends on the result.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
        }

        match Self::load_from_dir(dir) {
            Ok(Some(config)) => Ok((config, ConfigSource::Discovered(dir.join(CONFIG_FILE)))),
            Ok(None) => Ok((Self::default(), ConfigSource::Defaults)),
            Err(e) => Ok((Self::default(), ConfigSource::Fallback(e))),
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref results) = args.results {
            self.data.results = results.clone();
        }
        if let Some(ref roster) = args.roster {
            self.data.roster = roster.clone();
        }

        if let Some(view) = args.view {
            self.report.view = view;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref title) = args.title {
            self.report.title = title.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config {
            colors: crate::report::palette::default_team_colors(),
            ..Config::default()
        };
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
