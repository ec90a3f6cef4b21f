//! Full-history assembly.
//!
//! Walks the `players/updates` cursor to the end, flattens the pages in
//! arrival order and normalizes each record.

use crate::chronicler::HistoryFeed;
use crate::error::{FetchError, HistoryError};

use super::snapshot::PlayerSnapshot;

/// Fetch every page of a player's history and normalize it.
///
/// Stops when the feed returns no next token or repeats the token it was just
/// given. The page carrying the terminating token is not kept; Chronicler
/// always returns an empty page there. Gives up after `max_pages` fetches.
pub fn assemble(
    feed: &dyn HistoryFeed,
    player_id: &str,
    max_pages: usize,
) -> Result<Vec<PlayerSnapshot>, HistoryError> {
    let mut records = Vec::new();
    let mut page_token: Option<String> = None;
    let mut fetched = 0usize;

    loop {
        if fetched >= max_pages {
            log::warn!(
                "History for {}: still paginating after {} pages, giving up",
                player_id,
                fetched
            );
            return Err(FetchError::PageLimitExceeded { limit: max_pages }.into());
        }

        let page = feed.fetch_page(player_id, page_token.as_deref())?;
        fetched += 1;

        match page.next_page {
            None => {
                log::debug!("History for {}: end of stream after {} pages", player_id, fetched);
                break;
            }
            Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                log::debug!(
                    "History for {}: token {} did not advance, done after {} pages",
                    player_id,
                    next,
                    fetched
                );
                break;
            }
            Some(next) => {
                log::debug!(
                    "History for {}: page {} has {} records, next {}",
                    player_id,
                    fetched,
                    page.data.len(),
                    next
                );
                records.extend(page.data);
                page_token = Some(next);
            }
        }
    }

    records
        .iter()
        .enumerate()
        .map(|(index, raw)| PlayerSnapshot::from_raw(raw, index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronicler::{PlayerUpdatesPage, RawPlayerUpdate};
    use std::cell::RefCell;

    /// Serves pages in order and records the token of every request.
    struct ScriptedFeed {
        pages: Vec<PlayerUpdatesPage>,
        requests: RefCell<Vec<Option<String>>>,
    }

    impl ScriptedFeed {
        fn new(pages: Vec<PlayerUpdatesPage>) -> Self {
            Self {
                pages,
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl HistoryFeed for ScriptedFeed {
        fn fetch_page(
            &self,
            _player_id: &str,
            page_token: Option<&str>,
        ) -> Result<PlayerUpdatesPage, FetchError> {
            let mut requests = self.requests.borrow_mut();
            let n = requests.len();
            requests.push(page_token.map(str::to_string));
            let last = self.pages.len() - 1;
            Ok(self.pages[n.min(last)].clone())
        }
    }

    struct FailingFeed;

    impl HistoryFeed for FailingFeed {
        fn fetch_page(
            &self,
            _player_id: &str,
            _page_token: Option<&str>,
        ) -> Result<PlayerUpdatesPage, FetchError> {
            Err(FetchError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    fn record(seconds: u32, fate: i64) -> RawPlayerUpdate {
        RawPlayerUpdate {
            player_id: Some("p".to_string()),
            last_seen: Some(format!("2020-08-01T00:00:{:02}Z", seconds)),
            data: serde_json::json!({ "name": "A", "fate": fate })
                .as_object()
                .cloned(),
        }
    }

    fn page(records: Vec<RawPlayerUpdate>, next: Option<&str>) -> PlayerUpdatesPage {
        PlayerUpdatesPage {
            data: records,
            next_page: next.map(str::to_string),
        }
    }

    #[test]
    fn test_pages_flatten_in_order() {
        let feed = ScriptedFeed::new(vec![
            page(vec![record(1, 5), record(2, 5)], Some("a")),
            page(vec![record(3, 6)], Some("b")),
            page(vec![], Some("b")),
        ]);

        let snapshots = assemble(&feed, "p", 10).unwrap();
        let seconds: Vec<String> = snapshots.iter().map(|s| s.time()).collect();
        assert_eq!(seconds, vec!["00:00:01", "00:00:02", "00:00:03"]);
        assert_eq!(
            *feed.requests.borrow(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn test_repeated_token_terminates() {
        // Keeps answering "same" forever; only the equality check stops it.
        let feed = ScriptedFeed::new(vec![page(vec![record(1, 5)], Some("same"))]);

        let snapshots = assemble(&feed, "p", 100).unwrap();
        assert_eq!(feed.requests.borrow().len(), 2);
        assert_eq!(snapshots.len(), 1);
    }

    #[test]
    fn test_null_token_terminates() {
        let feed = ScriptedFeed::new(vec![
            page(vec![record(1, 5)], Some("a")),
            page(vec![], None),
        ]);
        let snapshots = assemble(&feed, "p", 10).unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(feed.requests.borrow().len(), 2);
    }

    #[test]
    fn test_ever_advancing_feed_hits_page_limit() {
        struct Endless;
        impl HistoryFeed for Endless {
            fn fetch_page(
                &self,
                _player_id: &str,
                page_token: Option<&str>,
            ) -> Result<PlayerUpdatesPage, FetchError> {
                let next = format!("{}x", page_token.unwrap_or(""));
                Ok(PlayerUpdatesPage {
                    data: Vec::new(),
                    next_page: Some(next),
                })
            }
        }

        let err = assemble(&Endless, "p", 4).unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Fetch(FetchError::PageLimitExceeded { limit: 4 })
        ));
    }

    #[test]
    fn test_fetch_failure_is_not_end_of_stream() {
        let err = assemble(&FailingFeed, "p", 10).unwrap_err();
        assert!(matches!(
            err,
            HistoryError::Fetch(FetchError::Api { status: 503, .. })
        ));
    }

    #[test]
    fn test_malformed_record_aborts_assembly() {
        let mut broken = record(2, 5);
        broken.player_id = None;
        let feed = ScriptedFeed::new(vec![
            page(vec![record(1, 5), broken, record(3, 5)], Some("a")),
            page(vec![], Some("a")),
        ]);

        let err = assemble(&feed, "p", 10).unwrap_err();
        assert!(matches!(err, HistoryError::MalformedRecord { index: 1, .. }));
    }
}
