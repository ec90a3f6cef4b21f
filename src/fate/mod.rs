//! Fate history reconstruction.
//!
//! Pipeline: `history::assemble` pulls and normalizes every update for a
//! player, `classify::FateClassifier` reduces it to the observed Fate changes
//! and attributes a cause to each.

pub mod classify;
pub mod history;
pub mod report;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::chronicler::{ChroniclerClient, HistoryFeed, RosterFeed};
use crate::config::Config;
use crate::error::HistoryError;

pub use classify::{CauseKind, FateClassifier, FateTransition, ALTERNATE_MODIFIER};
pub use snapshot::{Fate, PlayerSnapshot, Tracked};

/// Classification policy stored in ~/.fatetrace/config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Players whose Fate changes were verified by hand to coincide with a
    /// Feedback swap that Chronicler has no roster record of.
    #[serde(default = "default_known_swap_exceptions")]
    pub known_swap_exceptions: Vec<String>,
}

fn default_known_swap_exceptions() -> Vec<String> {
    ["Axel Trololol", "Lachlan Shelton", "Antonio Wallace", "Hobbs Cain"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            known_swap_exceptions: default_known_swap_exceptions(),
        }
    }
}

/// Fetch a player's full history and explain every Fate change in it.
pub fn classify_history(
    history: &dyn HistoryFeed,
    roster: &dyn RosterFeed,
    config: &Config,
    player_id: &str,
) -> Result<Vec<FateTransition>, HistoryError> {
    let snapshots = history::assemble(history, player_id, config.chronicler.max_pages)?;
    if snapshots.is_empty() {
        return Err(HistoryError::EmptyHistory {
            player_id: player_id.to_string(),
        });
    }

    let transitions = FateClassifier::new(roster, &config.classifier).classify(&snapshots)?;

    log::info!(
        "Fate history for {}: {} updates, {} transition records",
        player_id,
        snapshots.len(),
        transitions.len()
    );

    Ok(transitions)
}

/// `classify_history` against the live Chronicler feeds named in `config`.
///
/// Client construction failures surface as `HistoryError::Fetch` like any
/// other feed failure.
pub fn trace_player(
    config: &Config,
    player_id: &str,
) -> Result<Vec<FateTransition>, HistoryError> {
    let client = ChroniclerClient::new(&config.chronicler)?;
    classify_history(&client, &client, config, player_id)
}
