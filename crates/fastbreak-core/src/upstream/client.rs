//! HTTP client for the statistics provider's endpoints.

use crate::{
    config::UpstreamConfig,
    types::RecordSet,
    upstream::UpstreamError,
};
use reqwest::{header, Client, ClientBuilder};
use serde::Deserialize;
use tracing::debug;

/// The provider's response envelope: one or more named result sets.
#[derive(Debug, Deserialize)]
struct StatsEnvelope {
    #[serde(rename = "resultSets")]
    result_sets: Vec<RawResultSet>,
}

#[derive(Debug, Deserialize)]
struct RawResultSet {
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<serde_json::Value>>,
}

/// Raw HTTP client for the provider's stats endpoints.
///
/// Knows nothing about budgets, retries, or caching; every call here is a
/// single request. All access goes through
/// [`RetryingClient`](crate::upstream::RetryingClient) in production.
///
/// The base URL is configurable so tests can point it at a local mock.
pub struct StatsClient {
    client: Client,
    base_url: String,
}

impl StatsClient {
    /// Builds the client with the provider-required headers and timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        // The provider rejects requests without browser-like headers.
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(header::REFERER, header::HeaderValue::from_static("https://www.nba.com/"));
        headers.insert("x-nba-stats-origin", header::HeaderValue::from_static("stats"));
        headers.insert("x-nba-stats-token", header::HeaderValue::from_static("true"));

        let client = ClientBuilder::new()
            .default_headers(headers)
            .user_agent(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/124.0 Safari/537.36",
            )
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.timeout())
            .use_rustls_tls()
            .build()
            .map_err(|e| UpstreamError::ConnectionFailed(format!("HTTP client build failed: {e}")))?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    /// Full index of players, past and present (`commonallplayers`).
    pub async fn player_index(&self, season: &str) -> Result<RecordSet, UpstreamError> {
        self.fetch(
            "commonallplayers",
            &[
                ("LeagueID", "00".to_string()),
                ("Season", season.to_string()),
                ("IsOnlyCurrentSeason", "0".to_string()),
            ],
        )
        .await
    }

    /// Franchise index with city and nickname per team (`franchisehistory`).
    pub async fn franchise_index(&self) -> Result<RecordSet, UpstreamError> {
        self.fetch("franchisehistory", &[("LeagueID", "00".to_string())]).await
    }

    /// Per-season career totals for one player (`playercareerstats`).
    pub async fn player_career(&self, player_id: i64) -> Result<RecordSet, UpstreamError> {
        self.fetch(
            "playercareerstats",
            &[("PlayerID", player_id.to_string()), ("PerMode", "PerGame".to_string())],
        )
        .await
    }

    /// Shot locations for one player and season (`shotchartdetail`).
    pub async fn shot_chart(&self, player_id: i64, season: &str) -> Result<RecordSet, UpstreamError> {
        self.fetch(
            "shotchartdetail",
            &[
                ("PlayerID", player_id.to_string()),
                ("TeamID", "0".to_string()),
                ("SeasonNullable", season.to_string()),
                ("ContextMeasure", "FGA".to_string()),
            ],
        )
        .await
    }

    /// League-wide team statistics for one season (`leaguedashteamstats`).
    pub async fn team_stats(&self, season: &str) -> Result<RecordSet, UpstreamError> {
        self.fetch(
            "leaguedashteamstats",
            &[
                ("Season", season.to_string()),
                ("SeasonType", "Regular Season".to_string()),
                ("MeasureType", "Base".to_string()),
            ],
        )
        .await
    }

    /// Issues one GET and decodes the first result set of the envelope.
    async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<RecordSet, UpstreamError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(endpoint, "upstream request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(UpstreamError::HttpError(status.as_u16(), truncate_body(&raw)));
        }

        let envelope: StatsEnvelope = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("{endpoint}: {e}")))?;

        let first = envelope.result_sets.into_iter().next().ok_or_else(|| {
            UpstreamError::InvalidResponse(format!("{endpoint}: no result sets in envelope"))
        })?;

        Ok(RecordSet { headers: first.headers, rows: first.row_set })
    }
}

/// Error-body excerpt cap, in bytes.
const MAX_ERROR_BODY_BYTES: usize = 256;

/// Truncates an error body for logging, backing off to the nearest char
/// boundary so multibyte UTF-8 never splits.
fn truncate_body(raw: &str) -> String {
    if raw.len() <= MAX_ERROR_BODY_BYTES {
        return raw.to_string();
    }
    let mut cut = MAX_ERROR_BODY_BYTES;
    while cut > 0 && !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &raw[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> UpstreamConfig {
        UpstreamConfig {
            base_url,
            timeout_seconds: 5,
            rate_limit_calls: 30,
            rate_limit_period_seconds: 60,
            max_retries: 3,
            backoff_base_ms: 10,
        }
    }

    const CAREER_BODY: &str = r#"{
        "resource": "playercareerstats",
        "resultSets": [{
            "name": "SeasonTotalsRegularSeason",
            "headers": ["SEASON_ID", "PTS", "AST"],
            "rowSet": [["2023-24", 25.7, 8.3], ["2024-25", 24.4, 8.2]]
        }]
    }"#;

    #[tokio::test]
    async fn test_decodes_first_result_set() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/playercareerstats")
            .match_query(mockito::Matcher::UrlEncoded("PlayerID".into(), "2544".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CAREER_BODY)
            .create_async()
            .await;

        let client = StatsClient::new(&test_config(server.url())).unwrap();
        let rs = client.player_career(2544).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rs.len(), 2);
        assert_eq!(rs.str_at(0, "SEASON_ID"), Some("2023-24"));
        assert_eq!(rs.f64_at(1, "PTS"), Some(24.4));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(503)
            .with_body("upstream melting")
            .create_async()
            .await;

        let client = StatsClient::new(&test_config(server.url())).unwrap();
        let err = client.team_stats("2023-24").await.unwrap_err();

        match err {
            UpstreamError::HttpError(503, body) => assert!(body.contains("melting")),
            other => panic!("expected HttpError(503), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multibyte_error_body_truncates_at_char_boundary() {
        // 255 ASCII bytes followed by a three-byte char: the byte cap
        // lands inside the char and must back off, not panic
        let body = format!("{}€", "a".repeat(255));
        assert!(body.len() > 256);

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(503)
            .with_body(&body)
            .create_async()
            .await;

        let client = StatsClient::new(&test_config(server.url())).unwrap();
        let err = client.franchise_index().await.unwrap_err();

        match err {
            UpstreamError::HttpError(503, excerpt) => {
                assert!(excerpt.starts_with("aaa"));
                assert!(excerpt.ends_with("..."));
                assert!(!excerpt.contains('€'));
            }
            other => panic!("expected HttpError(503), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body("{\"not\": \"the envelope\"}")
            .create_async()
            .await;

        let client = StatsClient::new(&test_config(server.url())).unwrap();
        let err = client.franchise_index().await.unwrap_err();

        assert!(matches!(err, UpstreamError::InvalidResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_empty_result_sets_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body("{\"resultSets\": []}")
            .create_async()
            .await;

        let client = StatsClient::new(&test_config(server.url())).unwrap();
        let err = client.shot_chart(2544, "2023-24").await.unwrap_err();

        assert!(matches!(err, UpstreamError::InvalidResponse(_)), "{err:?}");
    }

    #[test]
    fn test_truncate_body_respects_byte_cap() {
        assert_eq!(truncate_body("short"), "short");

        let exact = "a".repeat(256);
        assert_eq!(truncate_body(&exact), exact);

        let long = "a".repeat(300);
        assert_eq!(truncate_body(&long), format!("{}...", "a".repeat(256)));
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_connection_failed() {
        let client = StatsClient::new(&test_config("http://127.0.0.1:1".to_string())).unwrap();
        let err = client.franchise_index().await.unwrap_err();

        assert!(
            matches!(err, UpstreamError::ConnectionFailed(_) | UpstreamError::Timeout),
            "{err:?}"
        );
    }
}
