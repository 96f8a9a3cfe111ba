//! Data access façade: the only component callers use.
//!
//! One operation per logical resource kind. Every operation follows the
//! same path: compute the case-folded cache key, read the cache (hit
//! returns immediately with no governor interaction), on miss drive the
//! retrying client, classify the outcome, and populate the cache with the
//! resource's TTL.
//!
//! Classification: an empty result set from a successful call means the
//! resource does not exist — [`StatsError::NotFound`], never cached
//! (no negative caching). Exhausted retries surface as
//! [`StatsError::Unavailable`]. Nothing else crosses this boundary; cache
//! trouble is logged and served as a miss.
//!
//! Concurrent misses on the same key are not coalesced: both callers make
//! governed upstream calls and both write the key, last write wins. An
//! accepted inefficiency, not a correctness bug.

use crate::{
    cache::{keys, CacheStore, CacheTtls},
    types::{current_season, RecordSet},
    upstream::{RetryingClient, StatsClient, StatsError},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// One row of a player search result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerSummary {
    pub id: i64,
    pub full_name: String,
}

/// The data access façade over cache, governor, and upstream client.
///
/// Constructed once at startup and shared via `Arc`; holds no per-request
/// state.
pub struct StatsService {
    cache: Arc<CacheStore>,
    client: Arc<StatsClient>,
    retry: RetryingClient,
    ttls: CacheTtls,
}

impl StatsService {
    #[must_use]
    pub fn new(
        cache: Arc<CacheStore>,
        client: Arc<StatsClient>,
        retry: RetryingClient,
        ttls: CacheTtls,
    ) -> Self {
        Self { cache, client, retry, ttls }
    }

    /// Resolves a player name to the provider's player id.
    ///
    /// Matching is case-folded substring over the provider's player index,
    /// first match wins.
    ///
    /// # Errors
    ///
    /// [`StatsError::NotFound`] if no player matches;
    /// [`StatsError::Unavailable`] if the provider stays unreachable.
    pub async fn get_player_id(&self, name: &str) -> Result<i64, StatsError> {
        let key = keys::player_id(name);
        if let Some(cached) = self.cache.get(&key).await {
            if let Some(id) = cached.as_i64() {
                debug!(key, "cache hit");
                return Ok(id);
            }
            warn!(key, "cached value has unexpected shape, refetching");
        }

        let season = current_season();
        let index =
            self.retry.execute("player_index", || self.client.player_index(&season)).await?;

        let needle = name.to_lowercase();
        let id = find_player(&index, &needle)
            .ok_or_else(|| StatsError::NotFound(format!("player '{name}'")))?;

        self.cache.set(&key, &serde_json::json!(id), self.ttls.player_id).await;
        Ok(id)
    }

    /// Resolves a team name to the provider's team id.
    ///
    /// Matching is case-folded substring over `"{city} {nickname}"` in the
    /// franchise index.
    ///
    /// # Errors
    ///
    /// [`StatsError::NotFound`] / [`StatsError::Unavailable`] as above.
    pub async fn get_team_id(&self, name: &str) -> Result<i64, StatsError> {
        let key = keys::team_id(name);
        if let Some(cached) = self.cache.get(&key).await {
            if let Some(id) = cached.as_i64() {
                debug!(key, "cache hit");
                return Ok(id);
            }
            warn!(key, "cached value has unexpected shape, refetching");
        }

        let index =
            self.retry.execute("franchise_index", || self.client.franchise_index()).await?;

        let needle = name.to_lowercase();
        let id = find_team(&index, &needle)
            .ok_or_else(|| StatsError::NotFound(format!("team '{name}'")))?;

        self.cache.set(&key, &serde_json::json!(id), self.ttls.team_id).await;
        Ok(id)
    }

    /// Per-season career stats for one player.
    ///
    /// # Errors
    ///
    /// [`StatsError::NotFound`] if the provider has no career rows for the
    /// id; [`StatsError::Unavailable`] on exhausted retries.
    pub async fn get_player_career(&self, player_id: i64) -> Result<RecordSet, StatsError> {
        let key = keys::player_career(player_id);
        if let Some(rs) = self.cached_record_set(&key).await {
            return Ok(rs);
        }

        let rs =
            self.retry.execute("player_career", || self.client.player_career(player_id)).await?;
        if rs.is_empty() {
            return Err(StatsError::NotFound(format!("career data for player id {player_id}")));
        }

        self.store_record_set(&key, &rs, self.ttls.player_career).await;
        Ok(rs)
    }

    /// Shot locations for one player and season.
    ///
    /// # Errors
    ///
    /// [`StatsError::NotFound`] if the player took no shots that season;
    /// [`StatsError::Unavailable`] on exhausted retries.
    pub async fn get_shot_chart(
        &self,
        player_id: i64,
        season: &str,
    ) -> Result<RecordSet, StatsError> {
        let key = keys::shot_chart(player_id, season);
        if let Some(rs) = self.cached_record_set(&key).await {
            return Ok(rs);
        }

        let rs = self
            .retry
            .execute("shot_chart", || self.client.shot_chart(player_id, season))
            .await?;
        if rs.is_empty() {
            return Err(StatsError::NotFound(format!(
                "shot chart for player id {player_id} in {season}"
            )));
        }

        self.store_record_set(&key, &rs, self.ttls.shot_chart).await;
        Ok(rs)
    }

    /// League-wide team statistics for one season.
    ///
    /// # Errors
    ///
    /// [`StatsError::NotFound`] if the season has no data;
    /// [`StatsError::Unavailable`] on exhausted retries.
    pub async fn get_team_stats(&self, season: &str) -> Result<RecordSet, StatsError> {
        let key = keys::team_stats(season);
        if let Some(rs) = self.cached_record_set(&key).await {
            return Ok(rs);
        }

        let rs = self.retry.execute("team_stats", || self.client.team_stats(season)).await?;
        if rs.is_empty() {
            return Err(StatsError::NotFound(format!("team stats for season {season}")));
        }

        self.store_record_set(&key, &rs, self.ttls.team_stats).await;
        Ok(rs)
    }

    /// Case-folded substring search over the player index.
    ///
    /// Returns every match so callers can report the true match count
    /// before applying their own display limit. Uncached by design: the
    /// search surface is already throttled by the inbound limiter and the
    /// governed index fetch.
    ///
    /// # Errors
    ///
    /// [`StatsError::Unavailable`] if the provider stays unreachable. An
    /// empty match list is a successful, empty result, not an error.
    pub async fn search_players(&self, query: &str) -> Result<Vec<PlayerSummary>, StatsError> {
        let season = current_season();
        let index =
            self.retry.execute("player_index", || self.client.player_index(&season)).await?;

        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        for row in 0..index.len() {
            let Some(full_name) = index.str_at(row, "DISPLAY_FIRST_LAST") else { continue };
            if !full_name.to_lowercase().contains(&needle) {
                continue;
            }
            let Some(id) = index.i64_at(row, "PERSON_ID") else { continue };
            matches.push(PlayerSummary { id, full_name: full_name.to_string() });
        }
        Ok(matches)
    }

    async fn cached_record_set(&self, key: &str) -> Option<RecordSet> {
        let cached = self.cache.get(key).await?;
        match serde_json::from_value::<RecordSet>(cached) {
            Ok(rs) => {
                debug!(key, rows = rs.len(), "cache hit");
                Some(rs)
            }
            Err(e) => {
                // treated as a miss; the entry will be overwritten
                warn!(key, error = %e, "cached record set failed to decode");
                None
            }
        }
    }

    async fn store_record_set(&self, key: &str, rs: &RecordSet, ttl: std::time::Duration) {
        match serde_json::to_value(rs) {
            Ok(value) => {
                self.cache.set(key, &value, ttl).await;
            }
            Err(e) => {
                warn!(key, error = %e, "record set failed to encode, skipping cache write");
            }
        }
    }
}

fn find_player(index: &RecordSet, needle: &str) -> Option<i64> {
    for row in 0..index.len() {
        let Some(full_name) = index.str_at(row, "DISPLAY_FIRST_LAST") else { continue };
        if full_name.to_lowercase().contains(needle) {
            return index.i64_at(row, "PERSON_ID");
        }
    }
    None
}

fn find_team(index: &RecordSet, needle: &str) -> Option<i64> {
    for row in 0..index.len() {
        let (Some(city), Some(nickname)) =
            (index.str_at(row, "TEAM_CITY"), index.str_at(row, "TEAM_NAME"))
        else {
            continue;
        };
        let full = format!("{city} {nickname}").to_lowercase();
        if full.contains(needle) {
            return index.i64_at(row, "TEAM_ID");
        }
    }
    None
}
