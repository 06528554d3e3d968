// Roster metadata and identity resolution between roster names and the
// abbreviated names used on stat sheets.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::DatasetError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub number: Option<u32>,
    pub grade: Option<String>,
}

impl RosterEntry {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// Stat-sheet form of the name: first initial plus the rest, e.g.
    /// "Jordan Carter" becomes "J Carter". `None` for single-word names.
    pub fn abbreviation(&self) -> Option<String> {
        let mut words = self.name.split_whitespace();
        let first = words.next()?;
        let rest: Vec<&str> = words.collect();
        if rest.is_empty() {
            return None;
        }
        let initial = first.chars().next()?;
        Some(format!("{} {}", initial, rest.join(" ")))
    }
}

/// How a stat-sheet name matched the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Exact(&'a RosterEntry),
    Abbreviated(&'a RosterEntry),
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn entry(&self) -> Option<&'a RosterEntry> {
        match self {
            Resolution::Exact(e) | Resolution::Abbreviated(e) => Some(e),
            Resolution::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
}

/// Case-folded, dot-free, single-spaced form used for comparisons.
fn normalize(name: &str) -> String {
    name.replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Roster {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match a stat-sheet name: exact full name first, then the "F Last"
    /// abbreviation. An abbreviation shared by several roster players does
    /// not resolve.
    pub fn resolve(&self, stat_name: &str) -> Resolution<'_> {
        let wanted = normalize(stat_name);
        if wanted.is_empty() {
            return Resolution::Unresolved;
        }
        if let Some(e) = self.entries.iter().find(|e| normalize(&e.name) == wanted) {
            return Resolution::Exact(e);
        }
        let mut abbreviated = self.entries.iter().filter(|e| {
            e.abbreviation()
                .map(|a| normalize(&a) == wanted)
                .unwrap_or(false)
        });
        match (abbreviated.next(), abbreviated.next()) {
            (Some(e), None) => Resolution::Abbreviated(e),
            _ => Resolution::Unresolved,
        }
    }

    /// Display first name for a stat-sheet name, falling back to its first
    /// word when the roster has no match.
    pub fn first_name<'a>(&'a self, stat_name: &'a str) -> &'a str {
        match self.resolve(stat_name).entry() {
            Some(e) => e.first_name(),
            None => stat_name.split_whitespace().next().unwrap_or(stat_name),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRosterFile {
    #[serde(default)]
    roster: Vec<RawRosterEntry>,
}

#[derive(Debug, Deserialize)]
struct RawRosterEntry {
    name: String,
    #[serde(default)]
    number: Option<serde_json::Value>,
    #[serde(default)]
    grade: Option<serde_json::Value>,
}

fn value_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_roster(bytes: &[u8], origin: &str) -> Result<Roster, DatasetError> {
    let raw: RawRosterFile = serde_json::from_slice(bytes).map_err(|e| DatasetError::Json {
        path: origin.to_string(),
        source: e,
    })?;
    let mut entries = Vec::with_capacity(raw.roster.len());
    for r in raw.roster {
        let name = r.name.trim().to_string();
        if name.is_empty() {
            warn!("skipping roster entry without a name");
            continue;
        }
        entries.push(RosterEntry {
            name,
            number: r
                .number
                .as_ref()
                .and_then(value_text)
                .and_then(|s| s.parse().ok()),
            grade: r.grade.as_ref().and_then(value_text),
        });
    }
    Ok(Roster { entries })
}

/// Load the roster file. A missing file is an empty roster.
pub fn load_roster(path: &Path) -> Result<Roster, DatasetError> {
    if !path.exists() {
        info!("no roster at {}, continuing without one", path.display());
        return Ok(Roster::default());
    }
    let bytes = std::fs::read(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let roster = parse_roster(&bytes, &path.display().to_string())?;
    info!("loaded {} roster entries", roster.entries.len());
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        parse_roster(
            br#"{"roster": [
                {"name": "Jordan Carter", "number": 4, "grade": 12},
                {"name": "Miguel Lopez", "number": "11", "grade": "Jr"},
                {"name": "Tam Nguyen"},
                {"name": "Tran Nguyen"}
            ]}"#,
            "inline",
        )
        .unwrap()
    }

    #[test]
    fn parses_loose_number_and_grade() {
        let r = roster();
        assert_eq!(r.entries.len(), 4);
        assert_eq!(r.entries[0].number, Some(4));
        assert_eq!(r.entries[0].grade.as_deref(), Some("12"));
        assert_eq!(r.entries[1].number, Some(11));
        assert_eq!(r.entries[2].number, None);
    }

    #[test]
    fn exact_match_wins() {
        let r = roster();
        assert!(matches!(r.resolve("Jordan Carter"), Resolution::Exact(e) if e.number == Some(4)));
        assert!(matches!(r.resolve("jordan  carter"), Resolution::Exact(_)));
    }

    #[test]
    fn abbreviated_match() {
        let r = roster();
        assert!(matches!(r.resolve("J Carter"), Resolution::Abbreviated(e) if e.name == "Jordan Carter"));
        assert!(matches!(r.resolve("M. Lopez"), Resolution::Abbreviated(_)));
    }

    #[test]
    fn ambiguous_abbreviation_is_unresolved() {
        let r = roster();
        assert_eq!(r.resolve("T Nguyen"), Resolution::Unresolved);
        assert_eq!(r.resolve("Nobody Here"), Resolution::Unresolved);
        assert_eq!(r.resolve(""), Resolution::Unresolved);
    }

    #[test]
    fn first_name_falls_back_to_stat_name() {
        let r = roster();
        assert_eq!(r.first_name("J Carter"), "Jordan");
        assert_eq!(r.first_name("T Nguyen"), "T");
    }

    #[test]
    fn missing_roster_file_is_empty() {
        let r = load_roster(Path::new("/nonexistent/roster.json")).unwrap();
        assert!(r.is_empty());
    }
}
