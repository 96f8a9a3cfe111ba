//! Cache key taxonomy and per-resource TTLs.
//!
//! Keys are composites of a resource kind prefix and the identifying
//! arguments. Name-based keys are case-folded so `"LeBron James"` and
//! `"lebron james"` address the same entry.

use crate::config::CacheConfig;
use std::time::Duration;

/// Key for a player name → id lookup.
#[must_use]
pub fn player_id(name: &str) -> String {
    format!("player_id:{}", name.to_lowercase())
}

/// Key for a team name → id lookup.
#[must_use]
pub fn team_id(name: &str) -> String {
    format!("team_id:{}", name.to_lowercase())
}

/// Key for a player's career record set.
#[must_use]
pub fn player_career(player_id: i64) -> String {
    format!("player_career:{player_id}")
}

/// Key for a player's shot chart in one season.
#[must_use]
pub fn shot_chart(player_id: i64, season: &str) -> String {
    format!("shot_chart:{player_id}:{season}")
}

/// Key for the league-wide team stats of one season.
#[must_use]
pub fn team_stats(season: &str) -> String {
    format!("team_stats:{season}")
}

/// Per-resource TTLs, resolved once from configuration.
///
/// Callers never pick a TTL; the façade applies the one configured for the
/// resource kind it is writing.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub player_id: Duration,
    pub team_id: Duration,
    pub player_career: Duration,
    pub shot_chart: Duration,
    pub team_stats: Duration,
}

impl CacheTtls {
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            player_id: Duration::from_secs(config.player_id_ttl_minutes * 60),
            team_id: Duration::from_secs(config.team_id_ttl_minutes * 60),
            player_career: Duration::from_secs(config.player_career_ttl_minutes * 60),
            shot_chart: Duration::from_secs(config.shot_chart_ttl_minutes * 60),
            team_stats: Duration::from_secs(config.team_stats_ttl_minutes * 60),
        }
    }
}
