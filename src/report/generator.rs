//! Markdown and JSON dashboard rendering.
//!
//! This module turns a [`Dashboard`] into a Markdown document with one
//! section per dashboard panel, or into pretty-printed JSON.

use crate::models::{
    Dashboard, DashboardBody, DashboardMetadata, DriverStats, ExtensiveDashboard, LeaderboardRow,
    ProgressionRow, RaceAnalysis, SeasonHighlights, SeasonProgress, SimpleDashboard,
    TeamPerformance, TeammateComparison,
};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", dashboard.metadata.title));

    output.push_str(&generate_metadata_section(&dashboard.metadata));

    match &dashboard.body {
        DashboardBody::Simple(simple) => {
            output.push_str(&generate_simple_sections(simple));
        }
        DashboardBody::Extensive(extensive) => {
            output.push_str(&generate_table_of_contents(extensive));
            output.push_str(&generate_driver_stats_section(
                &extensive.driver_stats,
                &dashboard.driver_colors,
            ));
            output.push_str(&generate_team_section(&extensive.team_performance));
            output.push_str(&generate_race_section(&extensive.race_analysis));
            output.push_str(&generate_progress_section(&extensive.season_progress));
        }
    }

    output.push_str(&generate_footer());

    output
}

/// Format points without a trailing `.0` for whole numbers.
fn fmt_points(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn fmt_average(value: f64) -> String {
    format!("{:.1}", value)
}

/// Escape text placed in a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Races:** {}\n", metadata.races));
    section.push_str(&format!("- **Drivers:** {}\n", metadata.drivers));
    section.push_str(&format!("- **Entries:** {}\n", metadata.entries));
    if !metadata.selected_races.is_empty() {
        section.push_str(&format!(
            "- **Race Filter:** {}\n",
            metadata.selected_races.join(", ")
        ));
    }
    if !metadata.selected_teams.is_empty() {
        section.push_str(&format!(
            "- **Team Filter:** {}\n",
            metadata.selected_teams.join(", ")
        ));
    }
    section.push('\n');

    section
}

/// Generate the table of contents for the extensive view.
fn generate_table_of_contents(dashboard: &ExtensiveDashboard) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Driver Stats](#driver-stats)\n");
    toc.push_str("- [Team Performance](#team-performance)\n");
    toc.push_str("- [Race Analysis](#race-analysis)\n");

    for analysis in &dashboard.race_analysis {
        let anchor = format!("round-{}-{}", analysis.round, analysis.race)
            .replace(['/', '.', ' '], "-")
            .to_lowercase();
        toc.push_str(&format!("  - [{}](#{})\n", analysis.race, anchor));
    }

    toc.push_str("- [Season Progress](#season-progress)\n");
    toc.push('\n');

    toc
}

/// Render a ranked table with a position column.
fn leaderboard_table(
    rows: &[LeaderboardRow],
    name_header: &str,
    value_header: &str,
    fmt: fn(f64) -> String,
) -> String {
    let mut table = String::new();

    table.push_str(&format!("| # | {} | {} |\n", name_header, value_header));
    table.push_str("|:---:|:---|:---:|\n");
    for (i, row) in rows.iter().enumerate() {
        table.push_str(&format!("| {} | {} | {} |\n", i + 1, cell(&row.name), fmt(row.value)));
    }
    table.push('\n');

    table
}

/// Generate the three panels of the simple view.
fn generate_simple_sections(simple: &SimpleDashboard) -> String {
    let mut section = String::new();

    section.push_str("## Total Points by Driver\n\n");
    if simple.driver_points.is_empty() {
        section.push_str("No results available.\n\n");
    } else {
        section.push_str(&leaderboard_table(
            &simple.driver_points,
            "Driver",
            "Points",
            fmt_points,
        ));
    }

    section.push_str("## Wins by Driver\n\n");
    if simple.driver_wins.is_empty() {
        section.push_str("No results available.\n\n");
    } else {
        section.push_str(&leaderboard_table(
            &simple.driver_wins,
            "Driver",
            "Wins",
            fmt_points,
        ));
    }

    section.push_str("## Average Finish by Team\n\n");
    if simple.team_average_finish.is_empty() {
        section.push_str("No classified finishes available.\n\n");
    } else {
        section.push_str(&leaderboard_table(
            &simple.team_average_finish,
            "Team",
            "Average Position",
            fmt_average,
        ));
    }

    section
}

fn highlight_cell(row: &Option<LeaderboardRow>, fmt: fn(f64) -> String) -> String {
    match row {
        Some(row) => format!("{} ({})", cell(&row.name), fmt(row.value)),
        None => "-".to_string(),
    }
}

fn generate_highlights(highlights: &SeasonHighlights) -> String {
    let mut block = String::new();

    block.push_str("| Most Points | Most Wins | Most Podiums | Best Avg Position |\n");
    block.push_str("|:---:|:---:|:---:|:---:|\n");
    block.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        highlight_cell(&highlights.most_points, fmt_points),
        highlight_cell(&highlights.most_wins, fmt_points),
        highlight_cell(&highlights.most_podiums, fmt_points),
        highlight_cell(&highlights.best_average_position, fmt_average),
    ));

    block
}

/// Generate the "Driver Stats" section.
fn generate_driver_stats_section(stats: &DriverStats, colors: &BTreeMap<String, String>) -> String {
    let mut section = String::new();

    section.push_str("## Driver Stats\n\n");
    section.push_str(&generate_highlights(&stats.highlights));

    section.push_str("### Total Points by Driver\n\n");
    if stats.points.is_empty() {
        section.push_str("No results available.\n\n");
    } else {
        section.push_str("| # | Driver | Team | Points | Color |\n");
        section.push_str("|:---:|:---|:---|:---:|:---:|\n");
        for (i, standing) in stats.points.iter().enumerate() {
            let driver = match &standing.abbreviation {
                Some(abbr) => format!("{} ({})", cell(&standing.driver), cell(abbr)),
                None => cell(&standing.driver),
            };
            let color = colors
                .get(&standing.driver)
                .map(|c| format!("`{}`", c))
                .unwrap_or_default();
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                i + 1,
                driver,
                cell(&standing.team),
                fmt_points(standing.points),
                color
            ));
        }
        section.push('\n');
    }

    section.push_str("### Wins by Driver\n\n");
    if stats.wins.is_empty() {
        section.push_str("No wins data available.\n\n");
    } else {
        section.push_str(&leaderboard_table(&stats.wins, "Driver", "Wins", fmt_points));
    }

    section.push_str("### Podiums by Driver\n\n");
    if stats.podiums.is_empty() {
        section.push_str("No podium data available.\n\n");
    } else {
        section.push_str(&leaderboard_table(
            &stats.podiums,
            "Driver",
            "Podiums",
            fmt_points,
        ));
    }

    section
}

/// Generate the "Team Performance" section.
fn generate_team_section(teams: &TeamPerformance) -> String {
    let mut section = String::new();

    section.push_str("## Team Performance\n\n");

    section.push_str("### Constructor Championship Points\n\n");
    if teams.constructor_points.is_empty() {
        section.push_str("No results available.\n\n");
    } else {
        section.push_str(&leaderboard_table(
            &teams.constructor_points,
            "Team",
            "Points",
            fmt_points,
        ));
    }

    section.push_str("### Average Finish Position by Team\n\n");
    if teams.average_finish.is_empty() {
        section.push_str("No classified finishes available.\n\n");
    } else {
        section.push_str("*Lower is better.*\n\n");
        section.push_str(&leaderboard_table(
            &teams.average_finish,
            "Team",
            "Average Position",
            fmt_average,
        ));
    }

    section.push_str("### Teammate Comparison\n\n");
    if teams.head_to_head.is_empty() {
        section.push_str("No team fielded more than one driver.\n\n");
    }
    for comparison in &teams.head_to_head {
        section.push_str(&generate_comparison_block(comparison));
    }

    section
}

/// Generate the head-to-head block for one team.
fn generate_comparison_block(comparison: &TeammateComparison) -> String {
    let mut block = String::new();

    block.push_str(&format!("#### {} Head-to-Head\n\n", comparison.team));

    if comparison.races.is_empty() {
        block.push_str("Not enough data for head-to-head comparison.\n\n");
        return block;
    }

    block.push_str(&format!(
        "*Comparison between {}*\n\n",
        comparison.drivers.join(" and ")
    ));
    block.push_str("| Driver | Races Finished Ahead |\n");
    block.push_str("|:---|:---:|\n");
    for row in &comparison.wins {
        block.push_str(&format!("| {} | {} |\n", cell(&row.name), fmt_points(row.value)));
    }
    block.push('\n');

    block.push_str("| Race | Ahead | Behind | Gap |\n");
    block.push_str("|:---|:---|:---|:---:|\n");
    for duel in &comparison.races {
        block.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&duel.race),
            cell(&duel.winner),
            cell(&duel.loser),
            duel.gap
        ));
    }
    block.push('\n');

    block
}

/// Generate the "Race Analysis" section.
fn generate_race_section(races: &[RaceAnalysis]) -> String {
    let mut section = String::new();

    section.push_str("## Race Analysis\n\n");

    if races.is_empty() {
        section.push_str("No race data available.\n\n");
        return section;
    }

    for analysis in races {
        section.push_str(&generate_race_block(analysis));
    }

    section
}

/// Generate the classification and podium of one race.
fn generate_race_block(analysis: &RaceAnalysis) -> String {
    let mut block = String::new();

    block.push_str(&format!("### Round {}: {}\n\n", analysis.round, analysis.race));

    block.push_str("| Position | Driver | Team | Points |\n");
    block.push_str("|:---:|:---|:---|:---:|\n");
    for entry in &analysis.results {
        block.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            entry.position_label(),
            cell(&entry.driver),
            cell(&entry.team),
            fmt_points(entry.points)
        ));
    }
    block.push('\n');

    if !analysis.podium.is_empty() {
        block.push_str("**Podium:**\n\n");
        for entry in &analysis.podium {
            block.push_str(&format!(
                "{}. {} ({})\n",
                entry.position_label(),
                entry.driver,
                entry.team
            ));
        }
        block.push('\n');
    }

    block
}

/// Pivot progression rows into one line per group and one column per round.
fn progression_table(rows: &[ProgressionRow], name_header: &str) -> String {
    let mut rounds: BTreeMap<u32, &str> = BTreeMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut cells: HashMap<(&str, u32), f64> = HashMap::new();

    for row in rows {
        rounds.entry(row.round).or_insert(row.race.as_str());
        if !order.contains(&row.name.as_str()) {
            order.push(row.name.as_str());
        }
        cells.insert((row.name.as_str(), row.round), row.cumulative_points);
    }

    let mut table = String::new();

    table.push_str(&format!("| {} |", name_header));
    for (round, race) in &rounds {
        table.push_str(&format!(" R{} {} |", round, cell(race)));
    }
    table.push('\n');

    table.push_str("|:---|");
    table.push_str(&":---:|".repeat(rounds.len()));
    table.push('\n');

    for name in order {
        table.push_str(&format!("| {} |", cell(name)));
        for round in rounds.keys() {
            match cells.get(&(name, *round)) {
                Some(points) => table.push_str(&format!(" {} |", fmt_points(*points))),
                None => table.push_str("  |"),
            }
        }
        table.push('\n');
    }
    table.push('\n');

    table
}

/// Generate the "Season Progress" section.
fn generate_progress_section(progress: &SeasonProgress) -> String {
    let mut section = String::new();

    section.push_str("## Season Progress\n\n");

    if progress.drivers.is_empty() {
        section.push_str("No progression data available.\n\n");
        return section;
    }

    section.push_str("### Driver Championship Progress\n\n");
    section.push_str(&progression_table(&progress.drivers, "Driver"));

    section.push_str("### Constructor Championship Progress\n\n");
    section.push_str(&progression_table(&progress.constructors, "Team"));

    section
}

/// Generate the dashboard footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Dashboard generated by pitwall v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_dashboard, DashboardOptions};
    use crate::models::{RaceEntry, View};
    use crate::report::palette::TeamPalette;

    fn season() -> Vec<RaceEntry> {
        vec![
            RaceEntry::new("Bahrain", "Max Verstappen", "Red Bull Racing", Some(1), 25.0),
            RaceEntry::new("Bahrain", "Lando Norris", "McLaren", Some(2), 18.0),
            RaceEntry::new("Bahrain", "Oscar Piastri", "McLaren", None, 0.0),
            RaceEntry::new("Jeddah", "Oscar Piastri", "McLaren", Some(1), 25.0),
            RaceEntry::new("Jeddah", "Lando Norris", "McLaren", Some(3), 15.0),
            RaceEntry::new("Miami", "Lando Norris", "McLaren", Some(1), 25.0),
            RaceEntry::new("Miami", "Oscar Piastri", "McLaren", Some(2), 18.5),
        ]
    }

    fn dashboard(view: View) -> Dashboard {
        let options = DashboardOptions {
            view,
            title: "F1 2025 Season Dashboard".to_string(),
            source: "f1_race_results_2025.csv".to_string(),
            abbreviations: [("Lando Norris".to_string(), "NOR".to_string())]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        build_dashboard(&season(), &options, &TeamPalette::default())
    }

    #[test]
    fn test_fmt_points() {
        assert_eq!(fmt_points(25.0), "25");
        assert_eq!(fmt_points(18.5), "18.5");
        assert_eq!(fmt_average(5.0 / 3.0), "1.7");
    }

    #[test]
    fn test_generate_extensive_markdown() {
        let markdown = generate_markdown_report(&dashboard(View::Extensive));

        assert!(markdown.contains("# F1 2025 Season Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Driver Stats"));
        assert!(markdown.contains("## Team Performance"));
        assert!(markdown.contains("## Race Analysis"));
        assert!(markdown.contains("## Season Progress"));
        assert!(markdown.contains("Lando Norris (NOR)"));
        assert!(markdown.contains("#### McLaren Head-to-Head"));
        assert!(markdown.contains("### Round 3: Miami"));
        assert!(markdown.contains("| DNF | Oscar Piastri | McLaren | 0 |"));
        assert!(markdown.contains("`#FF8700`"));
    }

    #[test]
    fn test_generate_simple_markdown() {
        let markdown = generate_markdown_report(&dashboard(View::Simple));

        assert!(markdown.contains("## Total Points by Driver"));
        assert!(markdown.contains("## Wins by Driver"));
        assert!(markdown.contains("## Average Finish by Team"));
        assert!(!markdown.contains("## Season Progress"));
        assert!(markdown.contains("| 1 | Lando Norris | 58 |"));
    }

    #[test]
    fn test_progression_table_leaves_missing_rounds_blank() {
        let rows = vec![
            ProgressionRow {
                name: "A".to_string(),
                round: 1,
                race: "R1".to_string(),
                cumulative_points: 25.0,
            },
            ProgressionRow {
                name: "B".to_string(),
                round: 2,
                race: "R2".to_string(),
                cumulative_points: 18.0,
            },
        ];

        let table = progression_table(&rows, "Driver");

        assert!(table.contains("| Driver | R1 R1 | R2 R2 |"));
        assert!(table.contains("| A | 25 |  |"));
        assert!(table.contains("| B |  | 18 |"));
    }

    #[test]
    fn test_table_cells_escape_pipes() {
        let rows = vec![LeaderboardRow {
            name: "Red|Bull".to_string(),
            value: 25.0,
            entries: 1,
        }];
        let table = leaderboard_table(&rows, "Team", "Points", fmt_points);
        assert!(table.contains("| 1 | Red\\|Bull | 25 |"));

        let analysis = RaceAnalysis {
            race: "Monaco".to_string(),
            round: 1,
            results: vec![RaceEntry::new("Monaco", "A|B", "X|Y", Some(1), 25.0)],
            podium: Vec::new(),
        };
        let block = generate_race_block(&analysis);
        assert!(block.contains("| 1 | A\\|B | X\\|Y | 25 |"));
    }

    #[test]
    fn test_comparison_without_duels() {
        let comparison = TeammateComparison {
            team: "Williams".to_string(),
            drivers: vec!["Alex Albon".to_string()],
            races: Vec::new(),
            wins: Vec::new(),
        };

        let block = generate_comparison_block(&comparison);
        assert!(block.contains("Not enough data"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&dashboard(View::Extensive)).unwrap();

        assert!(json.contains("\"view\": \"extensive\""));
        assert!(json.contains("\"driver_stats\""));
        assert!(json.contains("\"season_progress\""));
        assert!(json.contains("\"driver_colors\""));

        let parsed: Dashboard = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.view(), View::Extensive);
    }
}
