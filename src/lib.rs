//! fatetrace: reconstructs a player's Fate history from the Chronicler
//! archive and explains each change.
//!
//! Entry points are [`fate::classify_history`], which takes any feed, and
//! [`fate::trace_player`], which talks to Chronicler. The `fatetrace` binary
//! is a thin wrapper around the latter.

pub mod chronicler;
pub mod config;
pub mod error;
pub mod fate;

pub use chronicler::ChroniclerClient;
pub use config::{load_config, Config};
pub use error::{ErrorPayload, FetchError, HistoryError};
pub use fate::{classify_history, trace_player, CauseKind, Fate, FateTransition, PlayerSnapshot};
