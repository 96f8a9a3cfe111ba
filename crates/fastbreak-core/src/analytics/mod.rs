//! Statistical derivation helpers.
//!
//! Deterministic pure functions over [`RecordSet`]s: no concurrency, no
//! failure semantics. Missing or null inputs coerce to zero rather than
//! erroring, because the provider's tables are full of holes for early
//! seasons and two-way contracts.

use crate::types::RecordSet;
use serde::Serialize;
use serde_json::{json, Value};

/// Player archetype classification derived from career averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Archetype {
    #[serde(rename = "Versatile Superstar")]
    VersatileSuperstar,
    #[serde(rename = "Elite Scorer")]
    EliteScorer,
    #[serde(rename = "Dominant Scorer")]
    DominantScorer,
    #[serde(rename = "Floor General")]
    FloorGeneral,
    #[serde(rename = "Paint Presence")]
    PaintPresence,
    #[serde(rename = "Role Player")]
    RolePlayer,
    #[serde(rename = "Developing Player")]
    DevelopingPlayer,
}

/// Coerces a JSON value to `f64`, mapping null/non-numeric to `default`.
#[must_use]
pub fn safe_f64(value: Option<&Value>, default: f64) -> f64 {
    value.and_then(Value::as_f64).filter(|f| f.is_finite()).unwrap_or(default)
}

/// Coerces a JSON value to `i64`, accepting whole floats.
#[must_use]
pub fn safe_i64(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(default),
        None => default,
    }
}

fn column_f64(rs: &RecordSet, row: usize, name: &str) -> f64 {
    safe_f64(rs.value(row, name), 0.0)
}

fn has_columns(rs: &RecordSet, names: &[&str]) -> bool {
    names.iter().all(|n| rs.column(n).is_some())
}

/// Returns a copy of `rs` with advanced stat columns appended.
///
/// Each derived column is only added when its inputs are present:
///
/// - `USG_PCT` — simplified usage rate from FGA, FTA, TOV, MIN
/// - `TS_PCT`  — true shooting: `PTS / (2 * (FGA + 0.44 * FTA))`
/// - `PER`     — simplified per-36 efficiency rating
#[must_use]
pub fn with_advanced_stats(rs: &RecordSet) -> RecordSet {
    let mut out = rs.clone();

    if has_columns(rs, &["FGA", "FTA", "TOV", "MIN"]) {
        out.headers.push("USG_PCT".to_string());
        for row in 0..rs.len() {
            let minutes = column_f64(rs, row, "MIN");
            let usage = if minutes > 0.0 {
                let fga = column_f64(rs, row, "FGA");
                let fta = column_f64(rs, row, "FTA");
                let tov = column_f64(rs, row, "TOV");
                ((fga + 0.44 * fta + tov) * 40.0 * 5.0) / (minutes * 2.0)
            } else {
                0.0
            };
            out.rows[row].push(json!(usage));
        }
    }

    if has_columns(rs, &["PTS", "FGA", "FTA"]) {
        out.headers.push("TS_PCT".to_string());
        for row in 0..rs.len() {
            let denominator =
                2.0 * (column_f64(rs, row, "FGA") + 0.44 * column_f64(rs, row, "FTA"));
            let ts = if denominator > 0.0 { column_f64(rs, row, "PTS") / denominator } else { 0.0 };
            out.rows[row].push(json!(ts));
        }
    }

    let per_inputs =
        ["PTS", "REB", "AST", "STL", "BLK", "FGM", "FGA", "FTM", "FTA", "TOV", "MIN"];
    if has_columns(rs, &per_inputs) {
        out.headers.push("PER".to_string());
        for row in 0..rs.len() {
            let minutes = column_f64(rs, row, "MIN");
            let per = if minutes > 0.0 {
                let positive = column_f64(rs, row, "PTS") +
                    column_f64(rs, row, "REB") +
                    column_f64(rs, row, "AST") +
                    column_f64(rs, row, "STL") +
                    column_f64(rs, row, "BLK");
                let missed_fg = column_f64(rs, row, "FGA") - column_f64(rs, row, "FGM");
                let missed_ft = column_f64(rs, row, "FTA") - column_f64(rs, row, "FTM");
                (positive - missed_fg - missed_ft - column_f64(rs, row, "TOV")) / minutes * 36.0
            } else {
                0.0
            };
            out.rows[row].push(json!(per));
        }
    }

    out
}

/// Mean of a numeric column, zero when the column is missing or empty.
#[must_use]
pub fn column_mean(rs: &RecordSet, name: &str) -> f64 {
    if rs.is_empty() || rs.column(name).is_none() {
        return 0.0;
    }
    let sum: f64 = (0..rs.len()).map(|row| column_f64(rs, row, name)).sum();
    sum / rs.len() as f64
}

/// Classifies a player from career per-game averages over their seasons.
#[must_use]
pub fn determine_archetype(career: &RecordSet) -> Archetype {
    if career.is_empty() {
        return Archetype::DevelopingPlayer;
    }

    let ppg = column_mean(career, "PTS");
    let apg = column_mean(career, "AST");
    let rpg = column_mean(career, "REB");

    if ppg >= 25.0 && apg >= 6.0 && rpg >= 6.0 {
        Archetype::VersatileSuperstar
    } else if ppg >= 25.0 && apg >= 7.0 {
        Archetype::EliteScorer
    } else if ppg >= 20.0 {
        Archetype::DominantScorer
    } else if apg >= 7.0 {
        Archetype::FloorGeneral
    } else if rpg >= 10.0 {
        Archetype::PaintPresence
    } else if career.len() <= 3 {
        Archetype::DevelopingPlayer
    } else {
        Archetype::RolePlayer
    }
}

/// Detects significant career milestones from a per-season career table.
#[must_use]
pub fn detect_career_milestones(career: &RecordSet) -> Vec<String> {
    let mut milestones = Vec::new();
    if career.is_empty() {
        return milestones;
    }

    let peak_row = (0..career.len())
        .max_by(|a, b| column_f64(career, *a, "PTS").total_cmp(&column_f64(career, *b, "PTS")));

    if career.column("PTS").is_some() {
        if let Some(row) = peak_row {
            let season = career.str_at(row, "SEASON_ID").unwrap_or("Unknown");
            let pts = column_f64(career, row, "PTS");
            milestones.push(format!("{season}: Career-high {pts:.1} PPG"));
        }
    }

    if career.column("PLAYER_AGE").is_some() && career.column("PTS").is_some() {
        if let Some(row) = peak_row {
            let peak_age = safe_i64(career.value(row, "PLAYER_AGE"), 0);
            if peak_age >= 30 {
                milestones.push(format!("Age {peak_age}: Late-career scoring peak"));
            }
        }
    }

    if career.len() >= 15 {
        milestones.push(format!("Career longevity: {} seasons played", career.len()));
    }

    milestones
}

#[cfg(test)]
mod tests {
    use super::*;

    fn career(rows: Vec<Vec<Value>>) -> RecordSet {
        RecordSet {
            headers: vec![
                "SEASON_ID".to_string(),
                "PLAYER_AGE".to_string(),
                "PTS".to_string(),
                "AST".to_string(),
                "REB".to_string(),
            ],
            rows,
        }
    }

    #[test]
    fn test_true_shooting_formula() {
        let rs = RecordSet {
            headers: vec!["PTS".to_string(), "FGA".to_string(), "FTA".to_string()],
            rows: vec![vec![json!(30.0), json!(20.0), json!(10.0)]],
        };
        let out = with_advanced_stats(&rs);

        // 30 / (2 * (20 + 0.44 * 10)) = 30 / 48.8
        let ts = out.f64_at(0, "TS_PCT").unwrap();
        assert!((ts - 30.0 / 48.8).abs() < 1e-9);
    }

    #[test]
    fn test_zero_attempts_yield_zero_ts() {
        let rs = RecordSet {
            headers: vec!["PTS".to_string(), "FGA".to_string(), "FTA".to_string()],
            rows: vec![vec![json!(0.0), json!(0.0), json!(0.0)]],
        };
        let out = with_advanced_stats(&rs);
        assert_eq!(out.f64_at(0, "TS_PCT"), Some(0.0));
    }

    #[test]
    fn test_derived_columns_skipped_when_inputs_missing() {
        let rs = RecordSet {
            headers: vec!["PTS".to_string()],
            rows: vec![vec![json!(25.0)]],
        };
        let out = with_advanced_stats(&rs);
        assert!(out.column("TS_PCT").is_none());
        assert!(out.column("USG_PCT").is_none());
        assert!(out.column("PER").is_none());
    }

    #[test]
    fn test_null_inputs_coerce_to_zero() {
        let rs = RecordSet {
            headers: vec!["PTS".to_string(), "FGA".to_string(), "FTA".to_string()],
            rows: vec![vec![json!(10.0), json!(5.0), Value::Null]],
        };
        let out = with_advanced_stats(&rs);
        let ts = out.f64_at(0, "TS_PCT").unwrap();
        assert!((ts - 10.0 / 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_archetype_thresholds() {
        let superstar = career(vec![vec![json!("2023-24"), json!(38), json!(27.0), json!(8.0), json!(7.5)]]);
        assert_eq!(determine_archetype(&superstar), Archetype::VersatileSuperstar);

        let scorer = career(vec![vec![json!("2023-24"), json!(26), json!(22.0), json!(3.0), json!(4.0)]]);
        assert_eq!(determine_archetype(&scorer), Archetype::DominantScorer);

        let general = career(vec![vec![json!("2023-24"), json!(30), json!(12.0), json!(9.5), json!(3.0)]]);
        assert_eq!(determine_archetype(&general), Archetype::FloorGeneral);

        let rookie = career(vec![vec![json!("2023-24"), json!(20), json!(8.0), json!(2.0), json!(3.0)]]);
        assert_eq!(determine_archetype(&rookie), Archetype::DevelopingPlayer);

        assert_eq!(determine_archetype(&career(vec![])), Archetype::DevelopingPlayer);
    }

    #[test]
    fn test_role_player_needs_four_seasons() {
        let rows: Vec<Vec<Value>> = (0..4)
            .map(|i| vec![json!(format!("20{:02}-{:02}", 10 + i, 11 + i)), json!(24 + i), json!(9.0), json!(2.0), json!(3.0)])
            .collect();
        assert_eq!(determine_archetype(&career(rows)), Archetype::RolePlayer);
    }

    #[test]
    fn test_milestones_career_high_and_longevity() {
        let mut rows: Vec<Vec<Value>> = (0..15)
            .map(|i| {
                vec![
                    json!(format!("20{:02}-{:02}", i, i + 1)),
                    json!(19 + i),
                    json!(15.0 + f64::from(i)),
                    json!(5.0),
                    json!(5.0),
                ]
            })
            .collect();
        // peak season is the last one, age 33
        rows[14][2] = json!(31.2);

        let milestones = detect_career_milestones(&career(rows));
        assert!(milestones.iter().any(|m| m.contains("Career-high 31.2 PPG")), "{milestones:?}");
        assert!(milestones.iter().any(|m| m.contains("Age 33")), "{milestones:?}");
        assert!(milestones.iter().any(|m| m.contains("15 seasons")), "{milestones:?}");
    }

    #[test]
    fn test_no_milestones_for_empty_career() {
        assert!(detect_career_milestones(&career(vec![])).is_empty());
    }

    #[test]
    fn test_archetype_serializes_to_display_names() {
        let encoded = serde_json::to_value(Archetype::VersatileSuperstar).unwrap();
        assert_eq!(encoded, json!("Versatile Superstar"));
    }
}
