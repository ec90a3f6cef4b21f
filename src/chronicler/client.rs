//! Blocking HTTP client for the Chronicler v1 API.
//!
//! All requests target `{base_url}/v1/...`. Pages are fetched one at a time
//! and every call completes before the next one is issued.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ChroniclerConfig;
use crate::error::FetchError;

// ============================================================================
// Wire types
// ============================================================================

/// One entry of the `players/updates` feed.
///
/// Everything is optional here: the player schema grew over the seasons, and
/// deciding which missing field is fatal belongs to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayerUpdate {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

/// One page of the `players/updates` feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdatesPage {
    #[serde(default)]
    pub data: Vec<RawPlayerUpdate>,
    /// `None` marks the end of the stream.
    #[serde(default)]
    pub next_page: Option<String>,
}

/// One entry of the `roster/updates` feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RosterUpdatesResponse {
    #[serde(default)]
    data: Vec<RosterEntry>,
}

/// Which side of the pivot timestamp a roster lookup searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterDirection {
    Before,
    After,
}

impl RosterDirection {
    fn query_key(self) -> &'static str {
        match self {
            RosterDirection::Before => "before",
            RosterDirection::After => "after",
        }
    }
}

// ============================================================================
// Feed seams
// ============================================================================

/// Source of paginated player history.
pub trait HistoryFeed {
    /// Fetch one page of updates. `page_token` is `None` for the first page.
    fn fetch_page(
        &self,
        player_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlayerUpdatesPage, FetchError>;
}

/// Source of roster-affiliation history, independent of player records.
pub trait RosterFeed {
    /// The single roster entry nearest to `pivot` on the given side, if any.
    fn nearest_roster_entry(
        &self,
        player_id: &str,
        pivot: DateTime<Utc>,
        direction: RosterDirection,
    ) -> Result<Option<RosterEntry>, FetchError>;
}

// ============================================================================
// Client
// ============================================================================

pub struct ChroniclerClient {
    client: reqwest::blocking::Client,
    base_url: Url,
    page_size: u32,
}

impl ChroniclerClient {
    pub fn new(config: &ChroniclerConfig) -> Result<Self, FetchError> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url,
            page_size: config.page_size,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let resp = self.client.get(url).query(query).send()?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text()?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl HistoryFeed for ChroniclerClient {
    fn fetch_page(
        &self,
        player_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlayerUpdatesPage, FetchError> {
        let url = self.endpoint("v1/players/updates")?;
        let mut query = vec![
            ("player", player_id.to_string()),
            ("count", self.page_size.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("page", token.to_string()));
        }

        self.get_json(url, &query)
    }
}

impl RosterFeed for ChroniclerClient {
    fn nearest_roster_entry(
        &self,
        player_id: &str,
        pivot: DateTime<Utc>,
        direction: RosterDirection,
    ) -> Result<Option<RosterEntry>, FetchError> {
        let url = self.endpoint("v1/roster/updates")?;
        let query = [
            ("player", player_id.to_string()),
            ("count", "1".to_string()),
            (direction.query_key(), format_pivot(pivot)),
        ];

        let resp: RosterUpdatesResponse = self.get_json(url, &query)?;
        Ok(resp.data.into_iter().next())
    }
}

/// Parse the configured base URL so relative endpoint joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(raw).map_err(|e| FetchError::InvalidBaseUrl(format!("{}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(FetchError::InvalidBaseUrl(raw.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn format_pivot(pivot: DateTime<Utc>) -> String {
    pivot.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one canned response on loopback and hand back the request line.
    fn serve_once(status: &str, body: &str) -> (ChroniclerClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buffer = [0u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buffer).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            let request = String::from_utf8_lossy(&request);
            request.lines().next().unwrap_or_default().to_string()
        });

        let config = ChroniclerConfig {
            base_url: format!("http://{}/chron", addr),
            ..ChroniclerConfig::default()
        };
        (ChroniclerClient::new(&config).unwrap(), handle)
    }

    #[test]
    fn test_fetch_page_sends_player_count_and_page() {
        let (client, server) = serve_once(
            "200 OK",
            r#"{"nextPage": "tok2", "data": [{"playerId": "p1", "lastSeen": "2020-08-02T12:30:00.000Z", "data": {"name": "A"}}]}"#,
        );

        let page = client.fetch_page("p1", Some("tok")).unwrap();
        assert_eq!(page.next_page.as_deref(), Some("tok2"));
        assert_eq!(page.data.len(), 1);
        assert_eq!(
            server.join().unwrap(),
            "GET /chron/v1/players/updates?player=p1&count=1000&page=tok HTTP/1.1"
        );
    }

    #[test]
    fn test_first_page_has_no_page_param() {
        let (client, server) = serve_once("200 OK", r#"{"nextPage": null, "data": []}"#);

        client.fetch_page("p1", None).unwrap();
        assert_eq!(
            server.join().unwrap(),
            "GET /chron/v1/players/updates?player=p1&count=1000 HTTP/1.1"
        );
    }

    #[test]
    fn test_error_status_maps_to_api_error() {
        let (client, server) = serve_once("503 Service Unavailable", "busy");

        let err = client.fetch_page("p1", Some("tok")).unwrap_err();
        server.join().unwrap();
        match err {
            FetchError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "busy");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_body_maps_to_decode_error() {
        let (client, server) = serve_once("200 OK", "not json");

        let err = client.fetch_page("p1", None).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_roster_lookup_query() {
        let (client, server) = serve_once(
            "200 OK",
            r#"{"data": [{"playerId": "p1", "teamId": "t1"}]}"#,
        );
        let pivot = Utc.with_ymd_and_hms(2020, 9, 6, 17, 4, 5).unwrap();

        let entry = client
            .nearest_roster_entry("p1", pivot, RosterDirection::Before)
            .unwrap();
        assert_eq!(entry.and_then(|e| e.team_id).as_deref(), Some("t1"));
        assert_eq!(
            server.join().unwrap(),
            "GET /chron/v1/roster/updates?player=p1&count=1&before=2020-09-06T17%3A04%3A05.000Z HTTP/1.1"
        );
    }

    #[test]
    fn test_roster_lookup_without_entries() {
        let (client, server) = serve_once("200 OK", r#"{"data": []}"#);
        let pivot = Utc.with_ymd_and_hms(2020, 9, 6, 17, 4, 5).unwrap();

        let entry = client
            .nearest_roster_entry("p1", pivot, RosterDirection::After)
            .unwrap();
        assert!(entry.is_none());
        assert!(server.join().unwrap().contains("&after=2020-09-06T17%3A04%3A05.000Z "));
    }

    #[test]
    fn test_player_updates_page_deserialization() {
        let json = r#"{
            "nextPage": "MjAyMC0wOC0wMVQwMDowMDowMFo=",
            "data": [
                {
                    "updateId": "u1",
                    "playerId": "p1",
                    "firstSeen": "2020-08-01T00:00:00.000Z",
                    "lastSeen": "2020-08-02T12:30:00.000Z",
                    "hash": "abc",
                    "data": {"name": "Jessica Telephone", "fate": 42}
                }
            ]
        }"#;

        let page: PlayerUpdatesPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page.as_deref(), Some("MjAyMC0wOC0wMVQwMDowMDowMFo="));
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].player_id.as_deref(), Some("p1"));
        assert_eq!(
            page.data[0].last_seen.as_deref(),
            Some("2020-08-02T12:30:00.000Z")
        );
        let data = page.data[0].data.as_ref().unwrap();
        assert_eq!(data["fate"], 42);
    }

    #[test]
    fn test_last_page_has_no_token() {
        let page: PlayerUpdatesPage =
            serde_json::from_str(r#"{"nextPage": null, "data": []}"#).unwrap();
        assert!(page.next_page.is_none());
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_roster_response_deserialization() {
        let json = r#"{
            "data": [
                {"updateId": "r1", "playerId": "p1", "teamId": "t1",
                 "position": "lineup", "rosterIndex": 3,
                 "firstSeen": "2020-08-01T00:00:00Z", "lastSeen": "2020-08-03T00:00:00Z"}
            ]
        }"#;
        let resp: RosterUpdatesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].team_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = ChroniclerClient::new(&ChroniclerConfig::default()).unwrap();
        let url = client.endpoint("v1/players/updates").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.sibr.dev/chronicler/v1/players/updates"
        );
    }

    #[test]
    fn test_base_url_with_trailing_slash() {
        let url = parse_base_url("http://localhost:8080/chron/").unwrap();
        assert_eq!(
            url.join("v1/roster/updates").unwrap().as_str(),
            "http://localhost:8080/chron/v1/roster/updates"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ChroniclerConfig {
            base_url: "not a url".to_string(),
            ..ChroniclerConfig::default()
        };
        assert!(matches!(
            ChroniclerClient::new(&config),
            Err(FetchError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_pivot_format() {
        let pivot = Utc.with_ymd_and_hms(2020, 9, 6, 17, 4, 5).unwrap();
        assert_eq!(format_pivot(pivot), "2020-09-06T17:04:05.000Z");
    }
}
