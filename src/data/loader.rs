//! CSV loading for the race results and driver roster tables.
//!
//! Header names of the results table are trimmed and title-cased before
//! the required columns are looked up, so `" position "` and `POSITION`
//! both resolve to `Position`.

use crate::analysis::normalize;
use crate::models::{RaceEntry, RawEntry};
use csv::ByteRecord;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Error raised while loading input tables.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("missing required column '{column}' in {path}")]
    MissingColumn { path: String, column: String },
}

/// Driver lookups from the roster table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    teams: HashMap<String, String>,
    abbreviations: HashMap<String, String>,
}

impl Roster {
    /// Team of a driver, if the roster lists one.
    pub fn team_of(&self, driver: &str) -> Option<&str> {
        self.teams.get(driver).map(String::as_str)
    }

    /// Driver -> abbreviation map.
    pub fn abbreviations(&self) -> &HashMap<String, String> {
        &self.abbreviations
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

/// Normalized entries plus the roster they were resolved against.
#[derive(Debug, Clone, Default)]
pub struct Season {
    pub entries: Vec<RaceEntry>,
    pub roster: Roster,
}

/// Trim a header and title-case it: letters after a non-letter are
/// upper-cased, the others lower-cased.
pub fn title_case(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut prev_alpha = false;

    for c in header.trim_start_matches('\u{feff}').trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}

/// Position of `name` among the headers, ignoring ASCII case.
fn column_index(headers: &[String], name: &str, path: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| DataError::MissingColumn {
            path: path.to_string(),
            column: name.to_string(),
        })
}

/// Decode one cell, replacing bytes that are not UTF-8.
fn cell(record: &ByteRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

fn read_headers<R: Read>(
    reader: &mut csv::Reader<R>,
    path: &str,
) -> Result<Vec<String>, DataError> {
    let headers = reader.byte_headers().map_err(|e| DataError::Csv {
        path: path.to_string(),
        source: e,
    })?;

    Ok(headers
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect())
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn read_results<R: Read>(rdr: R, path: &str, roster: &Roster) -> Result<Vec<RawEntry>, DataError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);

    let headers: Vec<String> = read_headers(&mut reader, path)?
        .iter()
        .map(|h| title_case(h))
        .collect();
    debug!("Result columns: {:?}", headers);

    // Team is optional, the roster fills it in
    let race = column_index(&headers, "Race", path)?;
    let driver = column_index(&headers, "Driver", path)?;
    let position = column_index(&headers, "Position", path)?;
    let points = column_index(&headers, "Points", path)?;
    let team = headers.iter().position(|h| h == "Team");

    if team.is_none() {
        info!(
            "No Team column in {}, resolving teams from the roster ({} drivers)",
            path,
            roster.len()
        );
    }

    // Byte records keep rows whose cells are not valid UTF-8
    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable row in {}: {}", path, e);
                continue;
            }
        };

        let driver_name = cell(&record, driver).unwrap_or_default();
        let team_name = match team {
            Some(index) => cell(&record, index),
            None => roster.team_of(driver_name.trim()).map(String::from),
        };

        rows.push(RawEntry {
            race: cell(&record, race).unwrap_or_default(),
            driver: driver_name,
            team: team_name,
            position: cell(&record, position),
            points: cell(&record, points),
        });
    }

    Ok(rows)
}

fn read_roster<R: Read>(rdr: R, path: &str) -> Result<Roster, DataError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);

    let headers: Vec<String> = read_headers(&mut reader, path)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let full_name = column_index(&headers, "FullName", path)?;
    let team = column_index(&headers, "Team", path)?;
    let abbreviation = column_index(&headers, "Abbreviation", path).ok();

    let mut roster = Roster::default();
    for result in reader.byte_records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable roster row in {}: {}", path, e);
                continue;
            }
        };

        let trimmed = |index: usize| {
            cell(&record, index)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
        };

        let Some(name) = trimmed(full_name) else {
            continue;
        };

        if let Some(team_name) = trimmed(team) {
            if roster.teams.contains_key(&name) {
                warn!("Duplicate roster entry for '{}', using latest team", name);
            }
            roster.teams.insert(name.clone(), team_name);
        }

        if let Some(abbr) = abbreviation.and_then(trimmed) {
            roster.abbreviations.insert(name, abbr);
        }
    }

    Ok(roster)
}

// ---------------------------------------------------------------------------
// Path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, DataError> {
    std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load raw result rows from a CSV file.
pub fn load_results(path: &Path, roster: &Roster) -> Result<Vec<RawEntry>, DataError> {
    let file = open(path)?;
    read_results(file, &path.display().to_string(), roster)
}

/// Load the roster from a CSV file.
pub fn load_roster(path: &Path) -> Result<Roster, DataError> {
    let file = open(path)?;
    read_roster(file, &path.display().to_string())
}

/// Load the roster, falling back to an empty one when the file is missing.
pub fn load_roster_or_default(path: &Path) -> Result<Roster, DataError> {
    match load_roster(path) {
        Ok(roster) => Ok(roster),
        Err(DataError::Io { ref source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            warn!("Roster file not found at {}, continuing without it", path.display());
            Ok(Roster::default())
        }
        Err(e) => Err(e),
    }
}

/// Load and normalize a season from the results table and optional roster.
pub fn load_season(results: &Path, roster: Option<&Path>) -> Result<Season, DataError> {
    let roster = match roster {
        Some(path) => load_roster_or_default(path)?,
        None => Roster::default(),
    };

    if roster.is_empty() {
        debug!("No roster drivers loaded, teams come from the results table only");
    }

    let raw = load_results(results, &roster)?;
    let entries = normalize(&raw);
    info!(
        "Loaded {} entries from {} ({} roster drivers)",
        entries.len(),
        results.display(),
        roster.len()
    );

    Ok(Season { entries, roster })
}
