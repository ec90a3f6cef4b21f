//! Chronicler feed integration.
//!
//! Reads the SIBR Chronicler archive: the paginated `players/updates` feed
//! that carries every historical player record, and the `roster/updates`
//! feed used to cross-check team changes the player records did not track.

pub mod client;
pub mod roster;

use serde::{Deserialize, Serialize};

pub use client::{
    ChroniclerClient, HistoryFeed, PlayerUpdatesPage, RawPlayerUpdate, RosterDirection,
    RosterEntry, RosterFeed,
};

/// Chronicler connection settings stored in ~/.fatetrace/config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChroniclerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Hard stop for pagination against a misbehaving upstream.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://api.sibr.dev/chronicler".to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_max_pages() -> usize {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("fatetrace/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ChroniclerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}
