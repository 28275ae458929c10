//! Team and driver colors.
//!
//! Colors are a presentation concern: the aggregator never asks for them.
//! The dashboard builder resolves one color per driver through a
//! [`ColorResolver`] so that renderers can pick their own palette.

use crate::models::RaceEntry;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Color used for teams the palette does not know.
pub const DEFAULT_COLOR: &str = "#888888";

/// Factor applied to each channel for a team's second and later drivers.
const TEAMMATE_BRIGHTEN: f64 = 1.2;

/// Maps a driver slot within a team to a `#rrggbb` color.
pub trait ColorResolver {
    /// Color of the `index`-th driver (0-based, first appearance) of `team`.
    fn color(&self, team: &str, index: usize) -> String;
}

/// 2025 constructor colors.
pub fn default_team_colors() -> BTreeMap<String, String> {
    [
        ("Ferrari", "#DC0000"),
        ("Mercedes", "#00D2BE"),
        ("Red Bull Racing", "#0600EF"),
        ("McLaren", "#FF8700"),
        ("Aston Martin", "#006F62"),
        ("Alpine", "#0090FF"),
        ("Williams", "#005AFF"),
        ("Haas F1 Team", "#F0F0F0"),
        ("Kick Sauber", "#52E252"),
        ("VCARB", "#4E7C9B"),
    ]
    .into_iter()
    .map(|(team, color)| (team.to_string(), color.to_string()))
    .collect()
}

/// Team base colors, brightened for every driver after the first.
#[derive(Debug, Clone)]
pub struct TeamPalette {
    colors: HashMap<String, String>,
}

impl Default for TeamPalette {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl TeamPalette {
    /// Default colors with `overrides` layered on top.
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        let mut colors: HashMap<String, String> = default_team_colors().into_iter().collect();
        colors.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { colors }
    }

    /// Base color of a team.
    pub fn base_color(&self, team: &str) -> &str {
        self.colors.get(team).map(String::as_str).unwrap_or(DEFAULT_COLOR)
    }
}

impl ColorResolver for TeamPalette {
    fn color(&self, team: &str, index: usize) -> String {
        let base = self.base_color(team);
        if index == 0 {
            base.to_string()
        } else {
            brighten(base, TEAMMATE_BRIGHTEN)
        }
    }
}

/// Multiply each channel of a `#rrggbb` color, clamping at 255.
///
/// Strings that are not `#rrggbb` are returned unchanged.
pub fn brighten(hex: &str, factor: f64) -> String {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
    };

    match (hex.len(), hex.starts_with('#'), channel(1..3), channel(3..5), channel(5..7)) {
        (7, true, Some(r), Some(g), Some(b)) => {
            let scale = |c: u8| (f64::from(c) * factor).min(255.0) as u8;
            format!("#{:02x}{:02x}{:02x}", scale(r), scale(g), scale(b))
        }
        _ => hex.to_string(),
    }
}

/// One color per driver, keyed by driver name.
///
/// A driver belongs to the team of their first entry; the index within
/// the team follows first appearance.
pub fn driver_colors(entries: &[RaceEntry], resolver: &dyn ColorResolver) -> BTreeMap<String, String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut per_team: HashMap<&str, usize> = HashMap::new();
    let mut colors = BTreeMap::new();

    for entry in entries {
        if !seen.insert(entry.driver.as_str()) {
            continue;
        }

        let index = per_team.entry(entry.team.as_str()).or_insert(0);
        colors.insert(entry.driver.clone(), resolver.color(&entry.team, *index));
        *index += 1;
    }

    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl ColorResolver for Fixed {
        fn color(&self, team: &str, index: usize) -> String {
            format!("{team}/{index}")
        }
    }

    #[test]
    fn test_brighten() {
        assert_eq!(brighten("#FF8700", 1.2), "#ffa200");
        assert_eq!(brighten("#F0F0F0", 1.2), "#ffffff");
        assert_eq!(brighten("#000000", 1.2), "#000000");
        assert_eq!(brighten("red", 1.2), "red");
        assert_eq!(brighten("#12345", 1.2), "#12345");
    }

    #[test]
    fn test_team_palette() {
        let palette = TeamPalette::default();

        assert_eq!(palette.color("McLaren", 0), "#FF8700");
        assert_eq!(palette.color("McLaren", 1), "#ffa200");
        assert_eq!(palette.color("Nobody", 0), DEFAULT_COLOR);
    }

    #[test]
    fn test_team_palette_overrides() {
        let overrides: BTreeMap<String, String> =
            [("McLaren".to_string(), "#000080".to_string())].into_iter().collect();
        let palette = TeamPalette::new(&overrides);

        assert_eq!(palette.base_color("McLaren"), "#000080");
        assert_eq!(palette.base_color("Ferrari"), "#DC0000");
    }

    #[test]
    fn test_driver_colors_index_within_team() {
        let entries = vec![
            RaceEntry::new("R1", "Lando Norris", "McLaren", Some(1), 25.0),
            RaceEntry::new("R1", "Charles Leclerc", "Ferrari", Some(2), 18.0),
            RaceEntry::new("R1", "Oscar Piastri", "McLaren", Some(3), 15.0),
            RaceEntry::new("R2", "Lando Norris", "McLaren", Some(1), 25.0),
        ];

        let colors = driver_colors(&entries, &Fixed);

        assert_eq!(colors.len(), 3);
        assert_eq!(colors["Lando Norris"], "McLaren/0");
        assert_eq!(colors["Oscar Piastri"], "McLaren/1");
        assert_eq!(colors["Charles Leclerc"], "Ferrari/0");
    }
}
