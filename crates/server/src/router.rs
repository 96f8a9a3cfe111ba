//! HTTP route handlers and error mapping.
//!
//! Handlers are thin: parse and validate the query, call the façade,
//! marshal the result through [`schemas`]. The façade's two failure
//! conditions map onto HTTP: not-found answers 404, an unreachable
//! provider answers 503. Query validation failures answer 400 before
//! any upstream work happens.

use crate::schemas::{
    self, PlayerComparisonRequest, PlayerComparisonResponse, PlayerEvolutionResponse,
    ShotChartResponse, StandingsResponse, TeamStats, TeamStatsResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fastbreak_core::{
    analytics::{detect_career_milestones, with_advanced_stats},
    cache::CacheStore,
    service::StatsService,
    types::current_season,
    upstream::StatsError,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

const MAX_SEARCH_RESULTS: usize = 50;
const DEFAULT_SEARCH_RESULTS: usize = 10;

/// Shared handler state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<StatsService>,
    pub cache: Arc<CacheStore>,
}

/// Failure shape of every handler.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Unavailable(String),
    BadRequest(String),
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        match e {
            StatsError::NotFound(_) => Self::NotFound(e.to_string()),
            StatsError::Unavailable { .. } => {
                error!(error = %e, "provider unavailable");
                Self::Unavailable(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            Self::Unavailable(detail) => (StatusCode::SERVICE_UNAVAILABLE, detail),
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

fn validate_season(season: &str) -> Result<(), ApiError> {
    let valid = season.len() == 7
        && season.as_bytes()[4] == b'-'
        && season.chars().enumerate().all(|(i, c)| i == 4 || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid season '{season}', expected e.g. '2023-24'")))
    }
}

pub async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "cache_backend": state.cache.backend_name(),
    }))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub limit: Option<usize>,
}

pub async fn handle_player_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if params.query.trim().len() < 2 {
        return Err(ApiError::BadRequest(
            "query must be at least 2 characters".to_string(),
        ));
    }
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_RESULTS).clamp(1, MAX_SEARCH_RESULTS);

    // total_found counts every match; limit only caps the returned page
    let mut results = state.service.search_players(params.query.trim()).await?;
    let total_found = results.len();
    results.truncate(limit);

    Ok(Json(json!({
        "query": params.query.trim(),
        "total_found": total_found,
        "results": results,
    })))
}

#[derive(Deserialize)]
pub struct EvolutionParams {
    /// Accepted for interface stability but currently inert: the career
    /// endpoint's result set carries regular season lines only, so there
    /// are no playoff rows to include.
    #[serde(default)]
    pub include_playoffs: bool,
}

pub async fn handle_player_evolution(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<EvolutionParams>,
) -> Result<Json<PlayerEvolutionResponse>, ApiError> {
    let player_id = state.service.get_player_id(&name).await?;
    let career = state.service.get_player_career(player_id).await?;

    let career =
        if params.include_playoffs { career } else { schemas::regular_season_only(&career) };
    if career.is_empty() {
        return Err(ApiError::NotFound(format!("no regular season data for '{name}'")));
    }

    let career = with_advanced_stats(&career);
    let milestones = detect_career_milestones(&career);
    Ok(Json(PlayerEvolutionResponse::build(&name, &career, milestones)))
}

#[derive(Deserialize)]
pub struct ShotChartParams {
    pub season: Option<String>,
}

pub async fn handle_player_shot_chart(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ShotChartParams>,
) -> Result<Json<ShotChartResponse>, ApiError> {
    let season = params.season.unwrap_or_else(current_season);
    validate_season(&season)?;

    let player_id = state.service.get_player_id(&name).await?;
    let shots = state.service.get_shot_chart(player_id, &season).await?;

    Ok(Json(ShotChartResponse::build(&name, &season, &shots)))
}

pub async fn handle_team_lookup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let team_id = state.service.get_team_id(&name).await?;
    Ok(Json(json!({ "team": name, "team_id": team_id })))
}

#[derive(Deserialize)]
pub struct TeamStatsParams {
    pub season: Option<String>,
    pub sort_by: Option<String>,
    #[serde(default)]
    pub ascending: bool,
}

pub async fn handle_team_stats(
    State(state): State<AppState>,
    Query(params): Query<TeamStatsParams>,
) -> Result<Json<TeamStatsResponse>, ApiError> {
    let season = params.season.unwrap_or_else(current_season);
    validate_season(&season)?;

    let table = state.service.get_team_stats(&season).await?;

    let mut teams: Vec<TeamStats> =
        (0..table.len()).map(|row| TeamStats::from_row(&table, row)).collect();
    if let Some(sort_by) = &params.sort_by {
        schemas::sort_teams(&mut teams, sort_by, params.ascending);
    }

    Ok(Json(TeamStatsResponse { season, teams }))
}

#[derive(Deserialize)]
pub struct StandingsParams {
    pub season: Option<String>,
    pub conference: Option<String>,
}

pub async fn handle_team_standings(
    State(state): State<AppState>,
    Query(params): Query<StandingsParams>,
) -> Result<Json<StandingsResponse>, ApiError> {
    let season = params.season.unwrap_or_else(current_season);
    validate_season(&season)?;

    if let Some(conference) = &params.conference {
        if !conference.eq_ignore_ascii_case("east") && !conference.eq_ignore_ascii_case("west") {
            return Err(ApiError::BadRequest(format!(
                "invalid conference '{conference}', expected 'East' or 'West'"
            )));
        }
    }

    let table = state.service.get_team_stats(&season).await?;
    let standings = schemas::build_standings(&table, params.conference.as_deref());

    Ok(Json(StandingsResponse {
        season,
        conference: params.conference.unwrap_or_else(|| "All".to_string()),
        standings,
    }))
}

const MAX_COMPARISON_PLAYERS: usize = 10;

pub async fn handle_compare_players(
    State(state): State<AppState>,
    Json(request): Json<PlayerComparisonRequest>,
) -> Result<Json<PlayerComparisonResponse>, ApiError> {
    if request.players.len() < 2 {
        return Err(ApiError::BadRequest(
            "at least 2 players required for comparison".to_string(),
        ));
    }
    if request.players.len() > MAX_COMPARISON_PLAYERS {
        return Err(ApiError::BadRequest(format!(
            "at most {MAX_COMPARISON_PLAYERS} players can be compared"
        )));
    }
    if request.season != "career" {
        validate_season(&request.season)?;
    }

    let mut lines = Vec::with_capacity(request.players.len());
    for name in &request.players {
        let player_id = state.service.get_player_id(name).await?;
        let career = state.service.get_player_career(player_id).await?;
        let career = with_advanced_stats(&career);

        let line = schemas::comparison_line(&career, &request.season, &request.stats)
            .ok_or_else(|| {
                ApiError::NotFound(format!("no data for '{name}' in {}", request.season))
            })?;
        lines.push((name.clone(), line));
    }

    Ok(Json(PlayerComparisonResponse::build(&request.season, &request.stats, &lines)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastbreak_core::upstream::UpstreamError;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = StatsError::NotFound("player 'nobody'".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let err: ApiError = StatsError::Unavailable {
            attempts: 3,
            source: UpstreamError::Timeout,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = ApiError::BadRequest("query too short".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_season_validation() {
        assert!(validate_season("2023-24").is_ok());
        assert!(validate_season("1996-97").is_ok());

        assert!(validate_season("2023").is_err());
        assert!(validate_season("2023/24").is_err());
        assert!(validate_season("season").is_err());
        assert!(validate_season("23-2024").is_err());
    }

    use fastbreak_core::{
        cache::CacheTtls,
        config::{CacheConfig, UpstreamConfig},
        upstream::{CallGovernor, RetryingClient, StatsClient},
    };

    fn test_state(base_url: String) -> AppState {
        let upstream = UpstreamConfig {
            base_url,
            timeout_seconds: 5,
            rate_limit_calls: 100,
            rate_limit_period_seconds: 60,
            max_retries: 3,
            backoff_base_ms: 5,
        };
        let cache_config = CacheConfig {
            enabled: true,
            redis_url: String::new(),
            redis_enabled: false,
            player_id_ttl_minutes: 24 * 60,
            team_id_ttl_minutes: 24 * 60,
            player_career_ttl_minutes: 60,
            shot_chart_ttl_minutes: 24 * 60,
            team_stats_ttl_minutes: 30,
        };

        let governor =
            Arc::new(CallGovernor::new(upstream.rate_limit_calls, upstream.rate_limit_period()));
        let retry = RetryingClient::new(governor, upstream.max_retries, upstream.backoff_base());
        let client = Arc::new(StatsClient::new(&upstream).expect("client builds"));
        let cache = Arc::new(CacheStore::in_memory());

        AppState {
            service: Arc::new(StatsService::new(
                cache.clone(),
                client,
                retry,
                CacheTtls::from_config(&cache_config),
            )),
            cache,
        }
    }

    const PLAYER_INDEX_BODY: &str = r#"{
        "resultSets": [{
            "name": "CommonAllPlayers",
            "headers": ["PERSON_ID", "DISPLAY_FIRST_LAST"],
            "rowSet": [
                [2544, "LeBron James"],
                [201939, "Stephen Curry"],
                [1629029, "Luka Doncic"]
            ]
        }]
    }"#;

    #[tokio::test]
    async fn test_search_total_found_counts_matches_beyond_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/commonallplayers")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(PLAYER_INDEX_BODY)
            .create_async()
            .await;

        let params = SearchParams { query: "a".to_string(), limit: Some(1) };
        let Json(body) =
            handle_player_search(State(test_state(server.url())), Query(params)).await.unwrap();

        // "LeBron James" and "Luka Doncic" both match; one is displayed
        assert_eq!(body["total_found"], 2);
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_compare_players_requires_two_names() {
        let state = test_state("http://127.0.0.1:1".to_string());
        let request = PlayerComparisonRequest {
            players: vec!["LeBron James".to_string()],
            season: "career".to_string(),
            stats: vec!["PTS".to_string()],
        };

        let err = handle_compare_players(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_standings_rejects_unknown_conference() {
        let state = test_state("http://127.0.0.1:1".to_string());
        let params = StandingsParams {
            season: Some("2023-24".to_string()),
            conference: Some("North".to_string()),
        };

        let err = handle_team_standings(State(state), Query(params)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_standings_built_from_league_table() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/leaguedashteamstats")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "resultSets": [{
                        "name": "LeagueDashTeamStats",
                        "headers": ["TEAM_NAME", "TEAM_ID", "GP", "W", "L", "W_PCT"],
                        "rowSet": [
                            ["Denver Nuggets", 2, 82, 57, 25, 0.695],
                            ["Boston Celtics", 1, 82, 64, 18, 0.780]
                        ]
                    }]
                }"#,
            )
            .create_async()
            .await;

        let params = StandingsParams {
            season: Some("2023-24".to_string()),
            conference: Some("East".to_string()),
        };
        let Json(body) =
            handle_team_standings(State(test_state(server.url())), Query(params)).await.unwrap();

        assert_eq!(body.conference, "East");
        assert_eq!(body.standings.len(), 1);
        assert_eq!(body.standings[0].team, "Boston Celtics");
        assert_eq!(body.standings[0].wins, 64);
    }
}
