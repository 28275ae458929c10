//! Data models for the season dashboards.
//!
//! This module contains the core data structures used throughout
//! the application: raw and normalized race entries, the derived
//! leaderboard/progression rows, and the dashboard documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Team name used when neither the results table nor the roster knows it.
pub const UNKNOWN_TEAM: &str = "Unknown";

/// One row of the results table before normalization.
///
/// `position` and `points` hold the untouched cell text so that the
/// coercion rules live in one place (`analysis::normalize`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub race: String,
    pub driver: String,
    pub team: Option<String>,
    pub position: Option<String>,
    pub points: Option<String>,
}

/// A single driver's result in a single race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEntry {
    /// Event name.
    pub race: String,
    /// Full driver name.
    pub driver: String,
    /// Constructor name.
    pub team: String,
    /// Finishing rank; `None` for a non-classified finish.
    pub position: Option<u32>,
    /// Points awarded for the result.
    pub points: f64,
    /// Whether the entry won the race.
    pub win: bool,
    /// Whether the entry finished in the top three.
    pub podium: bool,
    /// Round number, once assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

impl RaceEntry {
    /// Creates an entry with its win/podium flags derived from `position`.
    #[cfg(test)]
    pub fn new(
        race: impl Into<String>,
        driver: impl Into<String>,
        team: impl Into<String>,
        position: Option<u32>,
        points: f64,
    ) -> Self {
        let mut entry = Self {
            race: race.into(),
            driver: driver.into(),
            team: team.into(),
            position,
            points,
            win: false,
            podium: false,
            round: None,
        };
        entry.refresh_flags();
        entry
    }

    /// Re-derives `win` and `podium` from `position`.
    pub fn refresh_flags(&mut self) {
        self.win = self.position == Some(1);
        self.podium = matches!(self.position, Some(p) if p <= 3);
    }

    /// Whether the entry has a finishing position.
    pub fn is_classified(&self) -> bool {
        self.position.is_some()
    }

    /// Position for display, `DNF` when not classified.
    pub fn position_label(&self) -> String {
        match self.position {
            Some(p) => p.to_string(),
            None => "DNF".to_string(),
        }
    }
}

/// Column an aggregation groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    Driver,
    Team,
}

impl GroupKey {
    /// Returns the grouping value of an entry.
    pub fn of<'a>(&self, entry: &'a RaceEntry) -> &'a str {
        match self {
            GroupKey::Driver => &entry.driver,
            GroupKey::Team => &entry.team,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Driver => write!(f, "Driver"),
            GroupKey::Team => write!(f, "Team"),
        }
    }
}

/// Reduction applied by a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Sum of points.
    Points,
    /// Number of wins.
    Wins,
    /// Number of podiums.
    Podiums,
    /// Mean finishing position over classified finishes.
    MeanPosition,
}

impl Metric {
    /// Lower values rank first only for the mean position.
    pub fn ascending(&self) -> bool {
        matches!(self, Metric::MeanPosition)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Points => write!(f, "Points"),
            Metric::Wins => write!(f, "Wins"),
            Metric::Podiums => write!(f, "Podiums"),
            Metric::MeanPosition => write!(f, "Average Position"),
        }
    }
}

/// One ranked row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// Driver or team name.
    pub name: String,
    /// Reduced metric value.
    pub value: f64,
    /// Number of entries that contributed to the value.
    pub entries: usize,
}

/// Cumulative points of one group as of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionRow {
    pub name: String,
    pub round: u32,
    pub race: String,
    pub cumulative_points: f64,
}

/// Outcome of one teammate duel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHeadRace {
    pub race: String,
    pub winner: String,
    pub loser: String,
    /// Difference between the two finishing positions.
    pub gap: u32,
}

/// Leaders of the headline driver metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonHighlights {
    pub most_points: Option<LeaderboardRow>,
    pub most_wins: Option<LeaderboardRow>,
    pub most_podiums: Option<LeaderboardRow>,
    pub best_average_position: Option<LeaderboardRow>,
}

/// Dashboard flavor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Points, wins and average team finish
    Simple,
    /// Driver, team, race and progression sections (default)
    #[default]
    Extensive,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Simple => write!(f, "simple"),
            View::Extensive => write!(f, "extensive"),
        }
    }
}

/// Output format for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// A driver's points total annotated with team and abbreviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStanding {
    pub driver: String,
    pub team: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    pub points: f64,
}

/// Head-to-head record of one team's drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeammateComparison {
    pub team: String,
    /// Team drivers in order of first appearance.
    pub drivers: Vec<String>,
    /// Per-race duels that counted.
    pub races: Vec<HeadToHeadRace>,
    /// Duel wins per driver, most first.
    pub wins: Vec<LeaderboardRow>,
}

/// One race's classification and podium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceAnalysis {
    pub race: String,
    pub round: u32,
    pub results: Vec<RaceEntry>,
    pub podium: Vec<RaceEntry>,
}

/// Points, wins and average team finish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleDashboard {
    pub driver_points: Vec<LeaderboardRow>,
    pub driver_wins: Vec<LeaderboardRow>,
    pub team_average_finish: Vec<LeaderboardRow>,
}

/// "Driver Stats" section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverStats {
    pub highlights: SeasonHighlights,
    pub points: Vec<DriverStanding>,
    pub wins: Vec<LeaderboardRow>,
    pub podiums: Vec<LeaderboardRow>,
}

/// "Team Performance" section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPerformance {
    pub constructor_points: Vec<LeaderboardRow>,
    pub average_finish: Vec<LeaderboardRow>,
    pub head_to_head: Vec<TeammateComparison>,
}

/// "Season Progress" section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonProgress {
    pub drivers: Vec<ProgressionRow>,
    pub constructors: Vec<ProgressionRow>,
}

/// The four-section dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensiveDashboard {
    pub driver_stats: DriverStats,
    pub team_performance: TeamPerformance,
    pub race_analysis: Vec<RaceAnalysis>,
    pub season_progress: SeasonProgress,
}

/// Body of a dashboard, one variant per view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum DashboardBody {
    Simple(SimpleDashboard),
    Extensive(ExtensiveDashboard),
}

/// Metadata about the rendered dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetadata {
    /// Page title.
    pub title: String,
    /// Path of the results table.
    pub source: String,
    /// When the dashboard was generated.
    pub generated_at: DateTime<Utc>,
    /// Race filter in effect (empty means all races).
    pub selected_races: Vec<String>,
    /// Team filter in effect (empty means all teams).
    pub selected_teams: Vec<String>,
    /// Entries left after filtering.
    pub entries: usize,
    /// Distinct races after filtering.
    pub races: usize,
    /// Distinct drivers after filtering.
    pub drivers: usize,
}

/// A complete dashboard document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    /// Presentation color per driver.
    pub driver_colors: BTreeMap<String, String>,
    #[serde(flatten)]
    pub body: DashboardBody,
}

impl Dashboard {
    /// Returns the view this dashboard was built for.
    pub fn view(&self) -> View {
        match self.body {
            DashboardBody::Simple(_) => View::Simple,
            DashboardBody::Extensive(_) => View::Extensive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_entry_flags() {
        let winner = RaceEntry::new("Bahrain", "A", "X", Some(1), 25.0);
        assert!(winner.win);
        assert!(winner.podium);

        let third = RaceEntry::new("Bahrain", "B", "X", Some(3), 15.0);
        assert!(!third.win);
        assert!(third.podium);

        let fourth = RaceEntry::new("Bahrain", "C", "Y", Some(4), 12.0);
        assert!(!fourth.podium);

        let dnf = RaceEntry::new("Bahrain", "D", "Y", None, 0.0);
        assert!(!dnf.win);
        assert!(!dnf.podium);
        assert!(!dnf.is_classified());
    }

    #[test]
    fn test_position_label() {
        assert_eq!(RaceEntry::new("R", "A", "X", Some(7), 6.0).position_label(), "7");
        assert_eq!(RaceEntry::new("R", "A", "X", None, 0.0).position_label(), "DNF");
    }

    #[test]
    fn test_group_key_of() {
        let entry = RaceEntry::new("Monaco", "Lando Norris", "McLaren", Some(1), 25.0);
        assert_eq!(GroupKey::Driver.of(&entry), "Lando Norris");
        assert_eq!(GroupKey::Team.of(&entry), "McLaren");
    }

    #[test]
    fn test_metric_ordering_direction() {
        assert!(Metric::MeanPosition.ascending());
        assert!(!Metric::Points.ascending());
        assert!(!Metric::Wins.ascending());
        assert!(!Metric::Podiums.ascending());
    }

    #[test]
    fn test_view_serde_lowercase() {
        let json = serde_json::to_string(&View::Simple).unwrap();
        assert_eq!(json, "\"simple\"");
        let view: View = serde_json::from_str("\"extensive\"").unwrap();
        assert_eq!(view, View::Extensive);
    }
}
