//! Roster cross-reference.
//!
//! Early seasons of the player feed do not carry `leagueTeamId`, but the
//! roster feed still recorded every move. Comparing the roster entries on
//! either side of a Fate change recovers swaps the player record missed.

use chrono::{DateTime, Utc};

use super::client::{RosterDirection, RosterFeed};
use crate::error::FetchError;

/// True when the nearest roster entries before and after `pivot` place the
/// player on different teams. A missing entry on either side is not a swap.
pub fn roster_changed_around(
    feed: &dyn RosterFeed,
    player_id: &str,
    pivot: DateTime<Utc>,
) -> Result<bool, FetchError> {
    let before = feed.nearest_roster_entry(player_id, pivot, RosterDirection::Before)?;
    let after = feed.nearest_roster_entry(player_id, pivot, RosterDirection::After)?;

    let changed = match (&before, &after) {
        (Some(b), Some(a)) => b.team_id != a.team_id,
        _ => false,
    };

    log::debug!(
        "Roster cross-reference for {} at {}: before={:?} after={:?} changed={}",
        player_id,
        pivot,
        before.as_ref().and_then(|e| e.team_id.as_deref()),
        after.as_ref().and_then(|e| e.team_id.as_deref()),
        changed
    );

    Ok(changed)
}
