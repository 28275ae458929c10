//! Dashboard assembly.
//!
//! Turns a season's entries into the simple or extensive dashboard by
//! filtering once and computing every view from the filtered slice.

use super::aggregator::{
    assign_rounds, cumulative_by_round, filter_entries, head_to_head, head_to_head_races,
    leaderboard, podium, race_results, races_in_order, season_highlights, team_drivers,
    teams_with_multiple_drivers,
};
use crate::models::{
    Dashboard, DashboardBody, DashboardMetadata, DriverStanding, DriverStats, ExtensiveDashboard,
    GroupKey, LeaderboardRow, Metric, RaceAnalysis, RaceEntry, SeasonProgress, SimpleDashboard,
    TeamPerformance, TeammateComparison, View,
};
use crate::report::palette::{driver_colors, ColorResolver};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// What to build and from which subset.
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub view: View,
    pub title: String,
    /// Where the entries came from, for the metadata block.
    pub source: String,
    /// Races to keep (empty keeps all).
    pub races: Vec<String>,
    /// Teams to keep (empty keeps all).
    pub teams: Vec<String>,
    /// Race to analyze; every race when unset.
    pub race: Option<String>,
    /// Team for the teammate comparison; every eligible team when unset.
    pub h2h_team: Option<String>,
    /// Driver abbreviations from the roster.
    pub abbreviations: HashMap<String, String>,
}

/// Build a dashboard from the full, unfiltered entry list.
///
/// Driver colors are resolved over the unfiltered entries so they do not
/// shift when the selection changes.
pub fn build_dashboard(
    entries: &[RaceEntry],
    options: &DashboardOptions,
    colors: &dyn ColorResolver,
) -> Dashboard {
    let filtered = filter_entries(entries, &options.races, &options.teams);
    debug!(
        "{} of {} entries left after filtering",
        filtered.len(),
        entries.len()
    );

    let drivers: HashSet<&str> = filtered.iter().map(|e| e.driver.as_str()).collect();
    let metadata = DashboardMetadata {
        title: options.title.clone(),
        source: options.source.clone(),
        generated_at: Utc::now(),
        selected_races: options.races.clone(),
        selected_teams: options.teams.clone(),
        entries: filtered.len(),
        races: races_in_order(&filtered).len(),
        drivers: drivers.len(),
    };

    let body = match options.view {
        View::Simple => DashboardBody::Simple(build_simple(&filtered)),
        View::Extensive => DashboardBody::Extensive(build_extensive(&filtered, options)),
    };

    Dashboard {
        metadata,
        driver_colors: driver_colors(entries, colors),
        body,
    }
}

fn build_simple(entries: &[RaceEntry]) -> SimpleDashboard {
    SimpleDashboard {
        driver_points: leaderboard(entries, GroupKey::Driver, Metric::Points),
        driver_wins: leaderboard(entries, GroupKey::Driver, Metric::Wins),
        team_average_finish: leaderboard(entries, GroupKey::Team, Metric::MeanPosition),
    }
}

fn build_extensive(entries: &[RaceEntry], options: &DashboardOptions) -> ExtensiveDashboard {
    ExtensiveDashboard {
        driver_stats: driver_stats(entries, &options.abbreviations),
        team_performance: team_performance(entries, options.h2h_team.as_deref()),
        race_analysis: race_analysis(entries, options.race.as_deref()),
        season_progress: SeasonProgress {
            drivers: cumulative_by_round(entries, GroupKey::Driver),
            constructors: cumulative_by_round(entries, GroupKey::Team),
        },
    }
}

fn nonzero(rows: Vec<LeaderboardRow>) -> Vec<LeaderboardRow> {
    rows.into_iter().filter(|r| r.value > 0.0).collect()
}

fn driver_stats(entries: &[RaceEntry], abbreviations: &HashMap<String, String>) -> DriverStats {
    let mut first_team: HashMap<&str, &str> = HashMap::new();
    for entry in entries {
        first_team
            .entry(entry.driver.as_str())
            .or_insert(entry.team.as_str());
    }

    let points = leaderboard(entries, GroupKey::Driver, Metric::Points)
        .into_iter()
        .map(|row| DriverStanding {
            team: first_team
                .get(row.name.as_str())
                .copied()
                .unwrap_or_default()
                .to_string(),
            abbreviation: abbreviations.get(&row.name).cloned(),
            driver: row.name,
            points: row.value,
        })
        .collect();

    DriverStats {
        highlights: season_highlights(entries),
        points,
        wins: nonzero(leaderboard(entries, GroupKey::Driver, Metric::Wins)),
        podiums: nonzero(leaderboard(entries, GroupKey::Driver, Metric::Podiums)),
    }
}

fn team_performance(entries: &[RaceEntry], h2h_team: Option<&str>) -> TeamPerformance {
    let teams = match h2h_team {
        Some(team) => vec![team.to_string()],
        None => teams_with_multiple_drivers(entries),
    };

    TeamPerformance {
        constructor_points: leaderboard(entries, GroupKey::Team, Metric::Points),
        average_finish: leaderboard(entries, GroupKey::Team, Metric::MeanPosition),
        head_to_head: teams
            .iter()
            .map(|team| teammate_comparison(entries, team))
            .collect(),
    }
}

fn teammate_comparison(entries: &[RaceEntry], team: &str) -> TeammateComparison {
    let drivers = team_drivers(entries, team);
    let counts = head_to_head(entries, team);

    let mut wins: Vec<LeaderboardRow> = drivers
        .iter()
        .filter_map(|driver| {
            counts.get(driver).map(|count| LeaderboardRow {
                name: driver.clone(),
                value: f64::from(*count),
                entries: *count as usize,
            })
        })
        .collect();
    wins.sort_by(|a, b| b.value.total_cmp(&a.value));

    TeammateComparison {
        team: team.to_string(),
        drivers,
        races: head_to_head_races(entries, team),
        wins,
    }
}

fn race_analysis(entries: &[RaceEntry], race: Option<&str>) -> Vec<RaceAnalysis> {
    let rounded = assign_rounds(entries);
    let order = races_in_order(&rounded);

    let selected: Vec<String> = match race {
        Some(race) if order.iter().any(|r| r == race) => vec![race.to_string()],
        Some(race) => {
            warn!("Race '{}' is not in the selected data", race);
            Vec::new()
        }
        None => order.clone(),
    };

    selected
        .into_iter()
        .map(|race| {
            let round = order.iter().position(|r| *r == race).unwrap_or_default() as u32 + 1;
            RaceAnalysis {
                results: race_results(&rounded, &race),
                podium: podium(&rounded, &race),
                round,
                race,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::palette::TeamPalette;

    fn season() -> Vec<RaceEntry> {
        vec![
            RaceEntry::new("Bahrain", "Max Verstappen", "Red Bull Racing", Some(1), 25.0),
            RaceEntry::new("Bahrain", "Lando Norris", "McLaren", Some(2), 18.0),
            RaceEntry::new("Bahrain", "Oscar Piastri", "McLaren", Some(3), 15.0),
            RaceEntry::new("Bahrain", "Alex Albon", "Williams", None, 0.0),
            RaceEntry::new("Jeddah", "Oscar Piastri", "McLaren", Some(1), 25.0),
            RaceEntry::new("Jeddah", "Lando Norris", "McLaren", Some(2), 18.0),
            RaceEntry::new("Jeddah", "Max Verstappen", "Red Bull Racing", Some(3), 15.0),
            RaceEntry::new("Jeddah", "Alex Albon", "Williams", Some(9), 2.0),
        ]
    }

    fn options(view: View) -> DashboardOptions {
        DashboardOptions {
            view,
            title: "Test Dashboard".to_string(),
            source: "results.csv".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_simple_dashboard() {
        let dashboard = build_dashboard(&season(), &options(View::Simple), &TeamPalette::default());

        assert_eq!(dashboard.view(), View::Simple);
        assert_eq!(dashboard.metadata.entries, 8);
        assert_eq!(dashboard.metadata.races, 2);
        assert_eq!(dashboard.metadata.drivers, 4);

        let DashboardBody::Simple(simple) = &dashboard.body else {
            panic!("expected simple body");
        };
        // Verstappen and Piastri tie on 40, Verstappen appears first
        assert_eq!(simple.driver_points[0].name, "Max Verstappen");
        assert_eq!(simple.driver_points[1].name, "Oscar Piastri");
        assert_eq!(simple.driver_wins.len(), 4);
        assert_eq!(simple.team_average_finish[0].name, "Red Bull Racing");
    }

    #[test]
    fn test_build_extensive_dashboard() {
        let mut opts = options(View::Extensive);
        opts.abbreviations
            .insert("Lando Norris".to_string(), "NOR".to_string());

        let dashboard = build_dashboard(&season(), &opts, &TeamPalette::default());
        let DashboardBody::Extensive(body) = &dashboard.body else {
            panic!("expected extensive body");
        };

        let stats = &body.driver_stats;
        assert_eq!(stats.highlights.most_points.as_ref().unwrap().name, "Max Verstappen");
        let norris = stats.points.iter().find(|s| s.driver == "Lando Norris").unwrap();
        assert_eq!(norris.team, "McLaren");
        assert_eq!(norris.abbreviation.as_deref(), Some("NOR"));
        // only drivers with a win are listed
        assert_eq!(stats.wins.len(), 2);
        assert!(stats.podiums.iter().all(|r| r.value > 0.0));

        let teams = &body.team_performance;
        assert_eq!(teams.constructor_points[0].name, "McLaren");
        assert_eq!(teams.head_to_head.len(), 1);
        assert_eq!(teams.head_to_head[0].team, "McLaren");
        assert_eq!(teams.head_to_head[0].races.len(), 2);
        assert_eq!(teams.head_to_head[0].wins[0].value, 1.0);

        assert_eq!(body.race_analysis.len(), 2);
        assert_eq!(body.race_analysis[1].race, "Jeddah");
        assert_eq!(body.race_analysis[1].round, 2);
        assert_eq!(body.race_analysis[0].podium.len(), 3);
        assert_eq!(body.race_analysis[0].results[3].position_label(), "DNF");

        assert_eq!(body.season_progress.drivers.len(), 8);
        assert_eq!(body.season_progress.constructors.len(), 6);
    }

    #[test]
    fn test_filters_apply_before_views() {
        let mut opts = options(View::Extensive);
        opts.races = vec!["Jeddah".to_string()];
        opts.teams = vec!["McLaren".to_string()];

        let dashboard = build_dashboard(&season(), &opts, &TeamPalette::default());
        assert_eq!(dashboard.metadata.entries, 2);

        let DashboardBody::Extensive(body) = &dashboard.body else {
            panic!("expected extensive body");
        };
        assert_eq!(body.race_analysis.len(), 1);
        assert_eq!(body.race_analysis[0].round, 1);
        assert_eq!(body.team_performance.constructor_points.len(), 1);

        // colors come from the unfiltered season
        assert_eq!(dashboard.driver_colors.len(), 4);
        assert_eq!(dashboard.driver_colors["Oscar Piastri"], "#ffa200");
    }

    #[test]
    fn test_selected_race_and_team() {
        let mut opts = options(View::Extensive);
        opts.race = Some("Bahrain".to_string());
        opts.h2h_team = Some("Williams".to_string());

        let dashboard = build_dashboard(&season(), &opts, &TeamPalette::default());
        let DashboardBody::Extensive(body) = &dashboard.body else {
            panic!("expected extensive body");
        };

        assert_eq!(body.race_analysis.len(), 1);
        assert_eq!(body.race_analysis[0].race, "Bahrain");

        let williams = &body.team_performance.head_to_head[0];
        assert_eq!(williams.drivers, vec!["Alex Albon"]);
        assert!(williams.races.is_empty());
        assert!(williams.wins.is_empty());
    }

    #[test]
    fn test_unknown_race_selection_is_empty() {
        let mut opts = options(View::Extensive);
        opts.race = Some("Monaco".to_string());

        let dashboard = build_dashboard(&season(), &opts, &TeamPalette::default());
        let DashboardBody::Extensive(body) = &dashboard.body else {
            panic!("expected extensive body");
        };
        assert!(body.race_analysis.is_empty());
    }

    #[test]
    fn test_empty_season() {
        let dashboard = build_dashboard(&[], &options(View::Extensive), &TeamPalette::default());

        assert_eq!(dashboard.metadata.entries, 0);
        assert!(dashboard.driver_colors.is_empty());
        let DashboardBody::Extensive(body) = &dashboard.body else {
            panic!("expected extensive body");
        };
        assert!(body.driver_stats.points.is_empty());
        assert!(body.team_performance.head_to_head.is_empty());
        assert!(body.race_analysis.is_empty());
        assert!(body.season_progress.drivers.is_empty());
    }
}
