//! Response payloads for the HTTP surface.
//!
//! Each struct maps one provider row into a stable JSON shape so the
//! API contract is independent of the provider's column ordering.

use fastbreak_core::{
    analytics::{column_mean, determine_archetype, safe_f64, safe_i64, Archetype},
    types::RecordSet,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// One regular season line for a player.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonStats {
    pub season: String,
    pub age: i64,
    pub team: String,
    pub games: i64,
    pub minutes: f64,
    pub pts: f64,
    pub ast: f64,
    pub reb: f64,
    pub stl: f64,
    pub blk: f64,
    pub fg_pct: f64,
    pub fg3_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub usage_pct: Option<f64>,
    pub per: Option<f64>,
    pub ts_pct: Option<f64>,
}

impl SeasonStats {
    #[must_use]
    pub fn from_row(rs: &RecordSet, row: usize) -> Self {
        Self {
            season: rs.str_at(row, "SEASON_ID").unwrap_or("Unknown").to_string(),
            age: safe_i64(rs.value(row, "PLAYER_AGE"), 25),
            team: rs.str_at(row, "TEAM_ABBREVIATION").unwrap_or("UNK").to_string(),
            games: safe_i64(rs.value(row, "GP"), 0),
            minutes: round1(safe_f64(rs.value(row, "MIN"), 0.0)),
            pts: round1(safe_f64(rs.value(row, "PTS"), 0.0)),
            ast: round1(safe_f64(rs.value(row, "AST"), 0.0)),
            reb: round1(safe_f64(rs.value(row, "REB"), 0.0)),
            stl: round1(safe_f64(rs.value(row, "STL"), 0.0)),
            blk: round1(safe_f64(rs.value(row, "BLK"), 0.0)),
            fg_pct: round3(safe_f64(rs.value(row, "FG_PCT"), 0.0)),
            fg3_pct: rs.f64_at(row, "FG3_PCT").map(round3),
            ft_pct: rs.f64_at(row, "FT_PCT").map(round3),
            usage_pct: rs.f64_at(row, "USG_PCT").map(round1),
            per: rs.f64_at(row, "PER").map(round1),
            ts_pct: rs.f64_at(row, "TS_PCT").map(round3),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CareerSummary {
    pub total_seasons: usize,
    pub career_ppg: f64,
    pub career_apg: f64,
    pub career_rpg: f64,
}

#[derive(Debug, Serialize)]
pub struct PlayerEvolutionResponse {
    pub player_name: String,
    pub seasons: Vec<SeasonStats>,
    pub archetype: Archetype,
    pub milestones: Vec<String>,
    pub career_summary: CareerSummary,
}

impl PlayerEvolutionResponse {
    /// Assembles the full evolution payload from an advanced-stats
    /// career table.
    #[must_use]
    pub fn build(player_name: &str, career: &RecordSet, milestones: Vec<String>) -> Self {
        let seasons = (0..career.len()).map(|row| SeasonStats::from_row(career, row)).collect();

        Self {
            player_name: player_name.to_string(),
            seasons,
            archetype: determine_archetype(career),
            milestones,
            career_summary: CareerSummary {
                total_seasons: career.len(),
                career_ppg: round1(column_mean(career, "PTS")),
                career_apg: round1(column_mean(career, "AST")),
                career_rpg: round1(column_mean(career, "REB")),
            },
        }
    }
}

/// Drops playoff rows when the table distinguishes season types.
#[must_use]
pub fn regular_season_only(rs: &RecordSet) -> RecordSet {
    if rs.column("SEASON_TYPE").is_none() {
        return rs.clone();
    }
    let mut out = RecordSet { headers: rs.headers.clone(), rows: Vec::new() };
    for (row, values) in rs.rows.iter().enumerate() {
        if rs.str_at(row, "SEASON_TYPE") == Some("Regular Season") {
            out.rows.push(values.clone());
        }
    }
    out
}

/// One shot attempt with court coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct ShotData {
    pub x: f64,
    pub y: f64,
    pub made: bool,
    pub distance: i64,
    pub zone: String,
    pub action: String,
}

impl ShotData {
    #[must_use]
    pub fn from_row(rs: &RecordSet, row: usize) -> Self {
        Self {
            x: safe_f64(rs.value(row, "LOC_X"), 0.0),
            y: safe_f64(rs.value(row, "LOC_Y"), 0.0),
            made: safe_i64(rs.value(row, "SHOT_MADE_FLAG"), 0) == 1,
            distance: safe_i64(rs.value(row, "SHOT_DISTANCE"), 0),
            zone: rs.str_at(row, "SHOT_ZONE_BASIC").unwrap_or("Unknown").to_string(),
            action: rs.str_at(row, "ACTION_TYPE").unwrap_or("Unknown").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShotChartSummary {
    pub total_shots: usize,
    pub makes: usize,
    pub fg_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct ShotChartResponse {
    pub player_name: String,
    pub season: String,
    pub shots: Vec<ShotData>,
    pub summary: ShotChartSummary,
}

impl ShotChartResponse {
    #[must_use]
    pub fn build(player_name: &str, season: &str, rs: &RecordSet) -> Self {
        let shots: Vec<ShotData> = (0..rs.len()).map(|row| ShotData::from_row(rs, row)).collect();

        let total_shots = shots.len();
        let makes = shots.iter().filter(|s| s.made).count();
        let fg_pct =
            if total_shots > 0 { round3(makes as f64 / total_shots as f64) } else { 0.0 };

        Self {
            player_name: player_name.to_string(),
            season: season.to_string(),
            shots,
            summary: ShotChartSummary { total_shots, makes, fg_pct },
        }
    }
}

/// One team's season line from the league table.
#[derive(Debug, Clone, Serialize)]
pub struct TeamStats {
    pub team: String,
    pub team_id: i64,
    pub games: i64,
    pub wins: i64,
    pub losses: i64,
    pub win_pct: f64,
    pub pts: f64,
    pub opp_pts: f64,
    pub pace: f64,
    pub off_rating: f64,
    pub def_rating: f64,
    pub net_rating: f64,
}

impl TeamStats {
    #[must_use]
    pub fn from_row(rs: &RecordSet, row: usize) -> Self {
        Self {
            team: rs.str_at(row, "TEAM_NAME").unwrap_or("Unknown").to_string(),
            team_id: safe_i64(rs.value(row, "TEAM_ID"), 0),
            games: safe_i64(rs.value(row, "GP"), 0),
            wins: safe_i64(rs.value(row, "W"), 0),
            losses: safe_i64(rs.value(row, "L"), 0),
            win_pct: safe_f64(rs.value(row, "W_PCT"), 0.0),
            pts: safe_f64(rs.value(row, "PTS"), 0.0),
            opp_pts: safe_f64(rs.value(row, "OPP_PTS"), 0.0),
            pace: safe_f64(rs.value(row, "PACE"), 100.0),
            off_rating: safe_f64(rs.value(row, "OFF_RATING"), 110.0),
            def_rating: safe_f64(rs.value(row, "DEF_RATING"), 110.0),
            net_rating: safe_f64(rs.value(row, "NET_RATING"), 0.0),
        }
    }

    fn sort_key(&self, field: &str) -> Option<f64> {
        match field {
            "team_id" => Some(self.team_id as f64),
            "games" => Some(self.games as f64),
            "wins" => Some(self.wins as f64),
            "losses" => Some(self.losses as f64),
            "win_pct" => Some(self.win_pct),
            "pts" => Some(self.pts),
            "opp_pts" => Some(self.opp_pts),
            "pace" => Some(self.pace),
            "off_rating" => Some(self.off_rating),
            "def_rating" => Some(self.def_rating),
            "net_rating" => Some(self.net_rating),
            _ => None,
        }
    }
}

/// Sorts the league table in place by a stat name such as `WIN_PCT` or
/// `net_rating`. Unknown fields leave the provider order untouched.
pub fn sort_teams(teams: &mut [TeamStats], sort_by: &str, ascending: bool) {
    let field = sort_by.to_lowercase();
    if teams.first().is_some_and(|t| t.sort_key(&field).is_none()) {
        return;
    }

    teams.sort_by(|a, b| {
        let ka = a.sort_key(&field).unwrap_or(0.0);
        let kb = b.sort_key(&field).unwrap_or(0.0);
        if ascending {
            ka.total_cmp(&kb)
        } else {
            kb.total_cmp(&ka)
        }
    });
}

#[derive(Debug, Serialize)]
pub struct TeamStatsResponse {
    pub season: String,
    pub teams: Vec<TeamStats>,
}

/// Eastern Conference nicknames; everything else counts as West.
const EASTERN_NICKNAMES: &[&str] = &[
    "Celtics", "Nets", "Knicks", "76ers", "Raptors", "Bulls", "Cavaliers", "Pistons", "Pacers",
    "Bucks", "Hawks", "Hornets", "Heat", "Magic", "Wizards",
];

/// Coarse conference lookup from a full team name.
#[must_use]
pub fn team_conference(team_name: &str) -> &'static str {
    if EASTERN_NICKNAMES.iter().any(|nickname| team_name.contains(nickname)) {
        "East"
    } else {
        "West"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingsEntry {
    pub team: String,
    pub conference: &'static str,
    pub wins: i64,
    pub losses: i64,
    pub win_pct: f64,
    pub games_played: i64,
}

#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub season: String,
    pub conference: String,
    pub standings: Vec<StandingsEntry>,
}

/// Reduces the league table to a win/loss standings list, optionally
/// filtered to one conference, ordered by win percentage.
#[must_use]
pub fn build_standings(table: &RecordSet, conference: Option<&str>) -> Vec<StandingsEntry> {
    let mut standings: Vec<StandingsEntry> = (0..table.len())
        .map(|row| {
            let team = table.str_at(row, "TEAM_NAME").unwrap_or("Unknown").to_string();
            StandingsEntry {
                conference: team_conference(&team),
                team,
                wins: safe_i64(table.value(row, "W"), 0),
                losses: safe_i64(table.value(row, "L"), 0),
                win_pct: safe_f64(table.value(row, "W_PCT"), 0.0),
                games_played: safe_i64(table.value(row, "GP"), 0),
            }
        })
        .filter(|entry| {
            conference.is_none_or(|wanted| entry.conference.eq_ignore_ascii_case(wanted))
        })
        .collect();

    standings.sort_by(|a, b| b.win_pct.total_cmp(&a.win_pct));
    standings
}

fn default_comparison_season() -> String {
    "career".to_string()
}

fn default_comparison_stats() -> Vec<String> {
    ["PTS", "AST", "REB", "PER", "TS_PCT"].iter().map(|s| (*s).to_string()).collect()
}

/// Request body for the player comparison endpoint.
#[derive(Debug, Deserialize)]
pub struct PlayerComparisonRequest {
    pub players: Vec<String>,
    #[serde(default = "default_comparison_season")]
    pub season: String,
    #[serde(default = "default_comparison_stats")]
    pub stats: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatRanking {
    pub player: String,
    pub value: f64,
    pub rank: usize,
}

#[derive(Debug, Serialize)]
pub struct PlayerComparisonResponse {
    pub comparison_type: String,
    pub season: String,
    pub players: Vec<String>,
    pub stats: BTreeMap<String, BTreeMap<String, f64>>,
    pub rankings: BTreeMap<String, Vec<StatRanking>>,
    pub insights: Vec<String>,
}

/// Extracts one player's values for the requested stat columns:
/// career averages for `"career"`, otherwise the player's last line in
/// the named season. `None` means the player has no line for that season.
#[must_use]
pub fn comparison_line(career: &RecordSet, season: &str, stats: &[String]) -> Option<Vec<f64>> {
    if season == "career" {
        return Some(stats.iter().map(|stat| column_mean(career, stat)).collect());
    }
    let row = (0..career.len()).rev().find(|r| career.str_at(*r, "SEASON_ID") == Some(season))?;
    Some(stats.iter().map(|stat| safe_f64(career.value(row, stat), 0.0)).collect())
}

impl PlayerComparisonResponse {
    /// Assembles per-stat values, dense rankings, and one leader insight
    /// per stat from the extracted lines.
    #[must_use]
    pub fn build(season: &str, stats: &[String], lines: &[(String, Vec<f64>)]) -> Self {
        let mut stat_map = BTreeMap::new();
        let mut rankings = BTreeMap::new();
        let mut insights = Vec::new();

        for (i, stat) in stats.iter().enumerate() {
            let values: BTreeMap<String, f64> =
                lines.iter().map(|(player, line)| (player.clone(), line[i])).collect();

            let mut sorted: Vec<(String, f64)> =
                lines.iter().map(|(player, line)| (player.clone(), line[i])).collect();
            sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

            if let Some((leader, value)) = sorted.first() {
                insights.push(format!("{leader} leads in {stat} with {value:.1}"));
            }

            rankings.insert(
                stat.clone(),
                sorted
                    .into_iter()
                    .enumerate()
                    .map(|(rank, (player, value))| StatRanking { player, value, rank: rank + 1 })
                    .collect(),
            );
            stat_map.insert(stat.clone(), values);
        }

        Self {
            comparison_type: if season == "career" { "career" } else { "season" }.to_string(),
            season: season.to_string(),
            players: lines.iter().map(|(player, _)| player.clone()).collect(),
            stats: stat_map,
            rankings,
            insights,
        }
    }
}
