//! Results aggregation and derived metrics.
//!
//! Every function in this module is a pure transformation: it borrows an
//! entry slice and returns a new value. Filtering and each derived view are
//! independent steps over the same immutable collection.

use crate::models::{
    GroupKey, HeadToHeadRace, LeaderboardRow, Metric, ProgressionRow, RaceEntry, RawEntry,
    SeasonHighlights, UNKNOWN_TEAM,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Normalize raw table rows into race entries.
///
/// Never fails: unparseable positions become DNFs, unparseable points
/// become 0, and every row is kept.
pub fn normalize(raw: &[RawEntry]) -> Vec<RaceEntry> {
    compute_win_podium_flags(raw.iter().map(normalize_entry).collect())
}

fn normalize_entry(raw: &RawEntry) -> RaceEntry {
    let team = raw
        .team
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_TEAM);

    let position = raw.position.as_deref().and_then(parse_position);
    let points = raw.points.as_deref().map(parse_points).unwrap_or(0.0);

    RaceEntry {
        race: raw.race.trim().to_string(),
        driver: raw.driver.trim().to_string(),
        team: team.to_string(),
        position,
        points,
        win: false,
        podium: false,
        round: None,
    }
}

/// Parse a position cell. Anything but a whole number >= 1 is a DNF.
fn parse_position(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    let parsed = cell
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 1.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32);

    if parsed.is_none() {
        debug!("Position {:?} treated as not classified", cell);
    }
    parsed
}

/// Parse a points cell. Blank, non-numeric and negative values count as 0.
fn parse_points(cell: &str) -> f64 {
    let cell = cell.trim();
    if cell.is_empty() {
        return 0.0;
    }

    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            debug!("Points {:?} treated as 0", cell);
            0.0
        }
    }
}

/// Re-derive win and podium flags from each entry's position.
pub fn compute_win_podium_flags(mut entries: Vec<RaceEntry>) -> Vec<RaceEntry> {
    for entry in &mut entries {
        entry.refresh_flags();
    }
    entries
}

/// Group entries and rank the groups by a reduced metric.
///
/// Sums rank highest first, the mean position lowest first. Ties keep the
/// order in which groups first appear in `entries`. Groups without a single
/// contributing entry (no classified finish for a mean) are left out.
pub fn leaderboard(entries: &[RaceEntry], group_key: GroupKey, metric: Metric) -> Vec<LeaderboardRow> {
    // (name, total, contributing entries) in first-appearance order
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let key = group_key.of(entry);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, 0.0, 0));
            groups.len() - 1
        });

        let contribution = match metric {
            Metric::Points => Some(entry.points),
            Metric::Wins => Some(if entry.win { 1.0 } else { 0.0 }),
            Metric::Podiums => Some(if entry.podium { 1.0 } else { 0.0 }),
            Metric::MeanPosition => entry.position.map(f64::from),
        };

        if let Some(value) = contribution {
            groups[slot].1 += value;
            groups[slot].2 += 1;
        }
    }

    let mut rows: Vec<LeaderboardRow> = groups
        .into_iter()
        .filter(|(_, _, count)| *count > 0)
        .map(|(name, total, count)| LeaderboardRow {
            name: name.to_string(),
            value: match metric {
                Metric::MeanPosition => total / count as f64,
                _ => total,
            },
            entries: count,
        })
        .collect();

    // sort_by is stable, which preserves first appearance among ties
    rows.sort_by(|a, b| {
        let ord = a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal);
        if metric.ascending() {
            ord
        } else {
            ord.reverse()
        }
    });

    debug!("{} by {}: {} groups", metric, group_key, rows.len());
    rows
}

/// Distinct race names in order of first appearance.
pub fn races_in_order(entries: &[RaceEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert(e.race.as_str()))
        .map(|e| e.race.clone())
        .collect()
}

/// Number each distinct race by its first appearance (1-based).
pub fn assign_rounds(entries: &[RaceEntry]) -> Vec<RaceEntry> {
    let mut rounds: HashMap<&str, u32> = HashMap::new();
    for entry in entries {
        let next = rounds.len() as u32 + 1;
        rounds.entry(entry.race.as_str()).or_insert(next);
    }

    entries
        .iter()
        .map(|entry| RaceEntry {
            round: rounds.get(entry.race.as_str()).copied(),
            ..entry.clone()
        })
        .collect()
}

/// Running points total per group, one row per (group, round).
///
/// Rounds are numbered from `entries` itself. A team's round total is the
/// sum of its drivers' points in that round. Rounds where a group has no
/// entry produce no row.
pub fn cumulative_by_round(entries: &[RaceEntry], group_key: GroupKey) -> Vec<ProgressionRow> {
    let rounded = assign_rounds(entries);

    let mut groups: Vec<(&str, BTreeMap<u32, (&str, f64)>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in &rounded {
        let Some(round) = entry.round else {
            continue;
        };

        let key = group_key.of(entry);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, BTreeMap::new()));
            groups.len() - 1
        });

        groups[slot]
            .1
            .entry(round)
            .or_insert((entry.race.as_str(), 0.0))
            .1 += entry.points;
    }

    let mut rows = Vec::new();
    for (name, per_round) in groups {
        let mut total = 0.0;
        for (round, (race, points)) in per_round {
            total += points;
            rows.push(ProgressionRow {
                name: name.to_string(),
                round,
                race: race.to_string(),
                cumulative_points: total,
            });
        }
    }

    rows
}

/// Per-race duels between a team's two drivers.
///
/// Only races where the team has exactly two entries, both classified on
/// different positions, are included.
pub fn head_to_head_races(entries: &[RaceEntry], team: &str) -> Vec<HeadToHeadRace> {
    let mut by_race: HashMap<&str, Vec<&RaceEntry>> = HashMap::new();
    for entry in entries.iter().filter(|e| e.team == team) {
        by_race.entry(entry.race.as_str()).or_default().push(entry);
    }

    let mut duels = Vec::new();
    for race in races_in_order(entries) {
        let Some(pair) = by_race.get(race.as_str()) else {
            continue;
        };

        let [a, b] = pair.as_slice() else {
            debug!("{}: {} entries for {}, skipping duel", race, pair.len(), team);
            continue;
        };

        let (Some(pa), Some(pb)) = (a.position, b.position) else {
            continue;
        };
        if pa == pb || a.driver == b.driver {
            continue;
        }

        let (winner, loser) = if pa < pb { (a, b) } else { (b, a) };
        duels.push(HeadToHeadRace {
            race,
            winner: winner.driver.clone(),
            loser: loser.driver.clone(),
            gap: pa.abs_diff(pb),
        });
    }

    duels
}

/// Races won against the teammate, per driver.
pub fn head_to_head(entries: &[RaceEntry], team: &str) -> HashMap<String, u32> {
    let mut wins: HashMap<String, u32> = HashMap::new();
    for duel in head_to_head_races(entries, team) {
        *wins.entry(duel.winner).or_insert(0) += 1;
    }
    wins
}

/// Keep entries in the selected races and teams.
///
/// An empty selection leaves that dimension unfiltered.
pub fn filter_entries(entries: &[RaceEntry], races: &[String], teams: &[String]) -> Vec<RaceEntry> {
    let races: HashSet<&str> = races.iter().map(String::as_str).collect();
    let teams: HashSet<&str> = teams.iter().map(String::as_str).collect();

    entries
        .iter()
        .filter(|e| races.is_empty() || races.contains(e.race.as_str()))
        .filter(|e| teams.is_empty() || teams.contains(e.team.as_str()))
        .cloned()
        .collect()
}

/// Sorted distinct race names.
pub fn distinct_races(entries: &[RaceEntry]) -> Vec<String> {
    let set: BTreeSet<&str> = entries.iter().map(|e| e.race.as_str()).collect();
    set.into_iter().map(String::from).collect()
}

/// Sorted distinct team names.
pub fn distinct_teams(entries: &[RaceEntry]) -> Vec<String> {
    let set: BTreeSet<&str> = entries.iter().map(|e| e.team.as_str()).collect();
    set.into_iter().map(String::from).collect()
}

/// A team's drivers in order of first appearance.
pub fn team_drivers(entries: &[RaceEntry], team: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| e.team == team && seen.insert(e.driver.as_str()))
        .map(|e| e.driver.clone())
        .collect()
}

/// Sorted teams that fielded more than one driver.
pub fn teams_with_multiple_drivers(entries: &[RaceEntry]) -> Vec<String> {
    let mut drivers: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for entry in entries {
        drivers
            .entry(entry.team.as_str())
            .or_default()
            .insert(entry.driver.as_str());
    }

    drivers
        .into_iter()
        .filter(|(_, d)| d.len() > 1)
        .map(|(team, _)| team.to_string())
        .collect()
}

/// One race's entries by finishing position, DNFs last.
pub fn race_results(entries: &[RaceEntry], race: &str) -> Vec<RaceEntry> {
    let mut results: Vec<RaceEntry> = entries.iter().filter(|e| e.race == race).cloned().collect();
    results.sort_by_key(|e| (!e.is_classified(), e.position));
    results
}

/// The classified top three of a race.
pub fn podium(entries: &[RaceEntry], race: &str) -> Vec<RaceEntry> {
    race_results(entries, race)
        .into_iter()
        .filter(|e| e.podium)
        .take(3)
        .collect()
}

/// Leaders of the headline driver metrics.
pub fn season_highlights(entries: &[RaceEntry]) -> SeasonHighlights {
    let leader = |metric| leaderboard(entries, GroupKey::Driver, metric).into_iter().next();

    SeasonHighlights {
        most_points: leader(Metric::Points),
        most_wins: leader(Metric::Wins),
        most_podiums: leader(Metric::Podiums),
        best_average_position: leader(Metric::MeanPosition),
    }
}
