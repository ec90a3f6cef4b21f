//! Normalized player observations.
//!
//! Converts raw `players/updates` records into `PlayerSnapshot`s. Older
//! records predate several fields, so absence is kept as an explicit
//! sentinel instead of a default value.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::chronicler::RawPlayerUpdate;
use crate::error::HistoryError;

/// The four attribute lists a player record may carry.
pub const MODIFIER_CATEGORIES: &[&str] = &["gameAttr", "permAttr", "seasAttr", "weekAttr"];

/// A field that may not exist yet in older records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tracked<T> {
    Tracked(T),
    Untracked,
}

impl<T: std::ops::Deref> Tracked<T> {
    pub fn as_deref(&self) -> Tracked<&T::Target> {
        match self {
            Tracked::Tracked(v) => Tracked::Tracked(&**v),
            Tracked::Untracked => Tracked::Untracked,
        }
    }
}

/// Observed Fate value.
///
/// `NotYetTracked` means the record predates the field; `NoneRecorded` means
/// the field was present but empty. The player almost certainly had a Fate in
/// both cases, so neither may take part in change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fate {
    Value(i64),
    NotYetTracked,
    NoneRecorded,
}

impl Fate {
    pub fn value(self) -> Option<i64> {
        match self {
            Fate::Value(v) => Some(v),
            Fate::NotYetTracked | Fate::NoneRecorded => None,
        }
    }
}

/// One historical observation of a player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub entity_id: String,
    pub name: String,
    pub observed_at: DateTime<Utc>,
    /// `Tracked(None)` when the player was on no team (e.g. deceased).
    pub team_affiliation: Tracked<Option<String>>,
    pub pregame_ritual: Tracked<String>,
    pub fate: Fate,
    pub modifiers: BTreeSet<String>,
}

impl PlayerSnapshot {
    /// Normalize one raw record. `index` is its position in the flattened
    /// history and only feeds error messages.
    pub fn from_raw(raw: &RawPlayerUpdate, index: usize) -> Result<Self, HistoryError> {
        let malformed = |reason: String| HistoryError::MalformedRecord { index, reason };

        let entity_id = raw
            .player_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| malformed("missing playerId".to_string()))?
            .to_string();

        let last_seen = raw
            .last_seen
            .as_deref()
            .ok_or_else(|| malformed("missing lastSeen".to_string()))?;
        let observed_at = DateTime::parse_from_rfc3339(last_seen)
            .map_err(|e| malformed(format!("unparsable lastSeen '{}': {}", last_seen, e)))?
            .with_timezone(&Utc);

        let data = raw
            .data
            .as_ref()
            .ok_or_else(|| malformed("missing data".to_string()))?;

        let name = data
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing data.name".to_string()))?
            .to_string();

        let team_affiliation = match data.get("leagueTeamId") {
            None => Tracked::Untracked,
            Some(Value::Null) => Tracked::Tracked(None),
            Some(Value::String(team)) => Tracked::Tracked(Some(team.clone())),
            Some(other) => return Err(malformed(format!("leagueTeamId is not a string: {}", other))),
        };

        let pregame_ritual = match data.get("ritual") {
            None => Tracked::Untracked,
            Some(Value::Null) => Tracked::Tracked(String::new()),
            Some(Value::String(ritual)) => Tracked::Tracked(ritual.clone()),
            Some(other) => return Err(malformed(format!("ritual is not a string: {}", other))),
        };

        let fate = parse_fate(data.get("fate")).map_err(malformed)?;
        let modifiers = collect_modifiers(data).map_err(malformed)?;

        Ok(Self {
            entity_id,
            name,
            observed_at,
            team_affiliation,
            pregame_ritual,
            fate,
            modifiers,
        })
    }

    pub fn has_modifier(&self, tag: &str) -> bool {
        self.modifiers.contains(tag)
    }

    /// Observation date as `YYYY-MM-DD`.
    pub fn date(&self) -> String {
        self.observed_at.format("%Y-%m-%d").to_string()
    }

    /// Observation time of day as `HH:MM:SS`.
    pub fn time(&self) -> String {
        self.observed_at.format("%H:%M:%S").to_string()
    }
}

fn parse_fate(raw: Option<&Value>) -> Result<Fate, String> {
    let value = match raw {
        None => return Ok(Fate::NotYetTracked),
        Some(Value::Null) => return Ok(Fate::NoneRecorded),
        Some(value) => value,
    };

    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(Fate::Value(v));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Fate::Value(f as i64))
                }
                _ => Err(format!("fate is not an integer: {}", n)),
            }
        }
        Value::String(s) if s.trim().is_empty() => Ok(Fate::NoneRecorded),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Fate::Value)
            .map_err(|_| format!("fate is not an integer: '{}'", s)),
        other => Err(format!("fate has unexpected type: {}", other)),
    }
}

fn collect_modifiers(data: &Map<String, Value>) -> Result<BTreeSet<String>, String> {
    let mut modifiers = BTreeSet::new();
    for key in MODIFIER_CATEGORIES {
        match data.get(*key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let tag = item
                        .as_str()
                        .ok_or_else(|| format!("{} contains a non-string entry: {}", key, item))?;
                    modifiers.insert(tag.to_string());
                }
            }
            Some(other) => return Err(format!("{} is not a list: {}", key, other)),
        }
    }
    Ok(modifiers)
}
