//! Fate change detection and cause attribution.
//!
//! Classification priority (first match wins):
//!   1. Alternate: the ALTERNATE modifier appeared with the change
//!   2. Team field: `leagueTeamId` differs between the two observations
//!   3. Roster feed: roster entries either side of the change differ
//!   4. Known exceptions: configured players whose swaps Chronicler lost
//!   5. Unexplained
//!
//! Steps 1 and 2 read the records themselves. Step 3 costs two extra
//! requests, so it only runs when the records are silent.

use serde::Serialize;

use crate::chronicler::roster::roster_changed_around;
use crate::chronicler::RosterFeed;
use crate::error::{FetchError, HistoryError};

use super::snapshot::{Fate, PlayerSnapshot};
use super::ClassifierConfig;

/// Modifier tag carried by players moved to the shadows.
pub const ALTERNATE_MODIFIER: &str = "ALTERNATE";

/// Why a Fate change was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseKind {
    BecameAlternate,
    RosterSwap,
    Unexplained,
}

impl CauseKind {
    pub fn description(self) -> &'static str {
        match self {
            CauseKind::BecameAlternate => "due to becoming an Alternate.",
            CauseKind::RosterSwap => "due to a Feedback swap.",
            CauseKind::Unexplained => "due to... some other cause.",
        }
    }
}

/// A snapshot on either side of a Fate change.
///
/// `cause` is set on the snapshot that carries the new value. The debut and
/// the snapshots closing an old value have none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FateTransition {
    #[serde(flatten)]
    pub snapshot: PlayerSnapshot,
    pub cause: Option<CauseKind>,
}

impl FateTransition {
    fn boundary(snapshot: &PlayerSnapshot) -> Self {
        Self {
            snapshot: snapshot.clone(),
            cause: None,
        }
    }
}

pub struct FateClassifier<'a> {
    roster: &'a dyn RosterFeed,
    known_swap_exceptions: &'a [String],
}

impl<'a> FateClassifier<'a> {
    pub fn new(roster: &'a dyn RosterFeed, config: &'a ClassifierConfig) -> Self {
        Self {
            roster,
            known_swap_exceptions: &config.known_swap_exceptions,
        }
    }

    /// Reduce an ordered history to its Fate changes.
    ///
    /// The first element is the debut and is renamed to the player's most
    /// recent name, since names drift over a career.
    pub fn classify(
        &self,
        snapshots: &[PlayerSnapshot],
    ) -> Result<Vec<FateTransition>, HistoryError> {
        let mut retained = snapshots
            .iter()
            .filter(|s| s.fate != Fate::NotYetTracked);

        let Some(debut) = retained.next() else {
            return Err(HistoryError::EmptyHistory {
                player_id: snapshots
                    .first()
                    .map(|s| s.entity_id.clone())
                    .unwrap_or_default(),
            });
        };

        let mut output = vec![FateTransition::boundary(debut)];
        let mut previous = debut;

        for current in retained {
            // A baseline without a recorded value has nothing to compare against.
            if previous.fate == Fate::NoneRecorded {
                previous = current;
                continue;
            }
            // Gaps in the record neither open nor close a change.
            if current.fate == Fate::NoneRecorded {
                continue;
            }

            if current.fate != previous.fate {
                let already_closed = output.last().is_some_and(|t| {
                    t.snapshot.observed_at == previous.observed_at
                        && t.snapshot.fate == previous.fate
                });
                if !already_closed {
                    output.push(FateTransition::boundary(previous));
                }

                let cause = self.cause_for(previous, current)?;
                log::debug!(
                    "Fate change for {} at {}: {:?} -> {:?} ({:?})",
                    current.entity_id,
                    current.observed_at,
                    previous.fate,
                    current.fate,
                    cause
                );
                output.push(FateTransition {
                    snapshot: current.clone(),
                    cause: Some(cause),
                });
            }

            previous = current;
        }

        if let (Some(first), Some(latest)) = (output.first_mut(), snapshots.last()) {
            first.snapshot.name = latest.name.clone();
        }

        Ok(output)
    }

    fn cause_for(
        &self,
        previous: &PlayerSnapshot,
        current: &PlayerSnapshot,
    ) -> Result<CauseKind, FetchError> {
        // ---- Step 1: Alternate ----
        if current.has_modifier(ALTERNATE_MODIFIER) && !previous.has_modifier(ALTERNATE_MODIFIER) {
            return Ok(CauseKind::BecameAlternate);
        }

        // ---- Step 2: Team field ----
        if current.team_affiliation != previous.team_affiliation {
            return Ok(CauseKind::RosterSwap);
        }

        // ---- Step 3: Roster feed ----
        if roster_changed_around(self.roster, &current.entity_id, current.observed_at)? {
            return Ok(CauseKind::RosterSwap);
        }

        // ---- Step 4: Known exceptions ----
        if self
            .known_swap_exceptions
            .iter()
            .any(|name| name == &current.name)
        {
            return Ok(CauseKind::RosterSwap);
        }

        Ok(CauseKind::Unexplained)
    }
}
