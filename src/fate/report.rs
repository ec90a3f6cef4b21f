//! Plain-text rendering of a Fate history.

use std::fmt;

use super::classify::FateTransition;
use super::snapshot::{Fate, Tracked};

impl fmt::Display for Fate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fate::Value(v) => write!(f, "{}", v),
            Fate::NotYetTracked => f.write_str("not yet tracked by Chronicler"),
            Fate::NoneRecorded => f.write_str(
                "none, according to the API (likely present but not captured by Chronicler)",
            ),
        }
    }
}

fn tracked_or_note(value: Tracked<&str>, empty: &str) -> String {
    match value {
        Tracked::Tracked("") => empty.to_string(),
        Tracked::Tracked(v) => v.to_string(),
        Tracked::Untracked => "NOT YET TRACKED".to_string(),
    }
}

impl fmt::Display for FateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        let team = match &s.team_affiliation {
            Tracked::Tracked(team) => Tracked::Tracked(team.as_deref().unwrap_or("")),
            Tracked::Untracked => Tracked::Untracked,
        };
        let ritual = s.pregame_ritual.as_deref();
        let modifiers: Vec<&str> = s.modifiers.iter().map(String::as_str).collect();
        let reason = self.cause.map(|c| c.description()).unwrap_or("n/a");

        writeln!(f, "{}   ({} at {})", s.name, s.date(), s.time())?;
        writeln!(f, "    ID: {}", s.entity_id)?;
        writeln!(f, "    Team ID: {}", tracked_or_note(team, "none"))?;
        writeln!(f, "    Pregame ritual: {}", tracked_or_note(ritual, "none"))?;
        writeln!(f, "    Modifications: [{}]", modifiers.join(", "))?;
        writeln!(f, "    Fate: {}", s.fate)?;
        write!(f, "    Reason for change to Fate: {}", reason)
    }
}

/// Render a classified history, debut first, one block per record.
pub fn render(transitions: &[FateTransition]) -> String {
    let Some(debut) = transitions.first() else {
        return String::new();
    };

    let changes = transitions.iter().filter(|t| t.cause.is_some()).count();
    let mut out = format!(
        "Fate history for {} ({} change{})\n",
        debut.snapshot.name,
        changes,
        if changes == 1 { "" } else { "s" }
    );
    for transition in transitions {
        out.push('\n');
        out.push_str(&transition.to_string());
        out.push('\n');
    }
    out
}
