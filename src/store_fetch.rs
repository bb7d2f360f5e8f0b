use std::collections::{HashMap, HashSet};
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::state::{LeagueAverage, MatchRecord, StatCategory};

const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Raw `team_stats` row as the store returns it. Absent statistic columns
/// deserialize to zero so they never poison downstream arithmetic.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamStatsRow {
    pub team: String,
    #[serde(default)]
    pub opponent: String,
    #[serde(default)]
    pub match_date: String,
    #[serde(default)]
    pub is_home: bool,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub shots_for: u32,
    #[serde(default)]
    pub shots_against: u32,
    #[serde(default)]
    pub shots_on_target_for: u32,
    #[serde(default)]
    pub shots_on_target_against: u32,
    #[serde(default)]
    pub corners_for: u32,
    #[serde(default)]
    pub corners_against: u32,
    #[serde(default)]
    pub goals_for: u32,
    #[serde(default)]
    pub goals_against: u32,
    #[serde(default)]
    pub yellow_for: u32,
    #[serde(default)]
    pub yellow_against: u32,
    #[serde(default)]
    pub red_for: u32,
    #[serde(default)]
    pub red_against: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueAverageRow {
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub season: String,
    pub stat_type: String,
    #[serde(default)]
    pub home_average: f64,
    #[serde(default)]
    pub away_average: f64,
    #[serde(default)]
    pub league_average: f64,
    #[serde(default)]
    pub matches_counted: u32,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AveragesAgainstRow {
    team: String,
    #[serde(default)]
    avg_against: f64,
}

/// Store dates arrive either as plain dates or as full timestamps; only the
/// date part matters here.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let (core, _) = raw.split_once('T').unwrap_or((raw, ""));
    NaiveDate::parse_from_str(core.trim(), "%Y-%m-%d").ok()
}

/// Rows with unparseable dates are dropped; everything else maps through.
pub fn rows_to_matches(rows: Vec<TeamStatsRow>) -> Vec<MatchRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let match_date = parse_match_date(&row.match_date)?;
            Some(MatchRecord {
                team: row.team,
                opponent: row.opponent,
                match_date,
                is_home: row.is_home,
                season: row.season,
                shots_for: row.shots_for,
                shots_against: row.shots_against,
                shots_on_target_for: row.shots_on_target_for,
                shots_on_target_against: row.shots_on_target_against,
                corners_for: row.corners_for,
                corners_against: row.corners_against,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                yellow_for: row.yellow_for,
                yellow_against: row.yellow_against,
                red_for: row.red_for,
                red_against: row.red_against,
            })
        })
        .collect()
}

/// Rows with an unknown statistic key are skipped.
pub fn rows_to_league_averages(rows: Vec<LeagueAverageRow>) -> Vec<LeagueAverage> {
    rows.into_iter()
        .filter_map(|row| {
            let stat_type = StatCategory::from_key(&row.stat_type)?;
            Some(LeagueAverage {
                league: row.league,
                season: row.season,
                stat_type,
                home_average: row.home_average,
                away_average: row.away_average,
                league_average: row.league_average,
                matches_counted: row.matches_counted,
                updated_at: row.updated_at,
            })
        })
        .collect()
}

/// PostgREST `in.(...)` literal for a set of team names.
fn in_list(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "")))
        .collect();
    format!("in.({})", quoted.join(","))
}

fn push_season(query: &mut Vec<(&'static str, String)>, season: &str) {
    if !season.is_empty() && season != crate::state::ALL_SEASONS {
        query.push(("season", format!("eq.{season}")));
    }
}

/// PostgREST-style reads against the hosted match database.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let url = env::var("STATLINE_DB_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;
        let key = env::var("STATLINE_DB_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;
        Some(Self::new(url, key))
    }

    fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        let client = http_client()?;
        let resp = client
            .get(&url)
            .query(query)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(USER_AGENT, "statline-terminal/0.1")
            .send()
            .with_context(|| format!("{table} request failed"))?;
        let status = resp.status();
        let body = resp
            .text()
            .with_context(|| format!("failed reading {table} body"))?;
        if !status.is_success() {
            let snippet = body
                .trim()
                .replace(['\n', '\r'], " ")
                .chars()
                .take(220)
                .collect::<String>();
            return Err(anyhow::anyhow!("{table} http {status}: {snippet}"));
        }
        serde_json::from_str(&body).with_context(|| format!("invalid {table} json"))
    }

    /// Distinct seasons for a league, newest first.
    pub fn seasons(&self, league: &str) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct SeasonRow {
            #[serde(default)]
            season: String,
        }

        let rows: Vec<SeasonRow> = self.get_rows(
            "team_stats",
            &[
                ("select", "season".to_string()),
                ("league", format!("eq.{league}")),
            ],
        )?;

        let mut seen = HashSet::new();
        let mut seasons: Vec<String> = rows
            .into_iter()
            .map(|r| r.season)
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect();
        seasons.sort();
        seasons.reverse();
        Ok(seasons)
    }

    /// Distinct team names for a league and season, alphabetical.
    pub fn teams(&self, league: &str, season: &str) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct TeamRow {
            #[serde(default)]
            team: String,
        }

        let mut query = vec![
            ("select", "team".to_string()),
            ("league", format!("eq.{league}")),
        ];
        push_season(&mut query, season);
        let rows: Vec<TeamRow> = self.get_rows("team_stats", &query)?;

        let mut seen = HashSet::new();
        let mut teams: Vec<String> = rows
            .into_iter()
            .map(|r| r.team)
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        teams.sort();
        Ok(teams)
    }

    pub fn league_averages(&self, league: &str, season: &str) -> Result<Vec<LeagueAverage>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("league", format!("eq.{league}")),
        ];
        push_season(&mut query, season);
        let rows: Vec<LeagueAverageRow> = self.get_rows("league_averages", &query)?;
        Ok(rows_to_league_averages(rows))
    }

    /// A team's rows, newest first, capped at the fetch limit.
    pub fn team_matches(&self, team: &str, season: &str) -> Result<Vec<MatchRecord>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("team", format!("eq.{team}")),
        ];
        push_season(&mut query, season);
        query.push(("order", "match_date.desc".to_string()));
        query.push(("limit", crate::state::MATCH_FETCH_LIMIT.to_string()));
        let rows: Vec<TeamStatsRow> = self.get_rows("team_stats", &query)?;
        Ok(rows_to_matches(rows))
    }

    /// Average conceded per opponent, resolved through the fallback chain:
    /// precomputed `team_averages_against` row, then a mean derived from that
    /// opponent's raw rows, then the league-wide baseline.
    pub fn averages_against(
        &self,
        category: StatCategory,
        opponents: &[String],
        season: &str,
        league_fallback: f64,
    ) -> Result<HashMap<String, f64>> {
        if opponents.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = vec![
            ("select", "team,avg_against".to_string()),
            ("stat_type", format!("eq.{}", category.key())),
            ("team", in_list(opponents)),
        ];
        push_season(&mut query, season);
        let rows: Vec<AveragesAgainstRow> = self.get_rows("team_averages_against", &query)?;

        let mut lookup: HashMap<String, f64> = HashMap::new();
        for row in rows {
            lookup.insert(row.team, row.avg_against);
        }

        // A zero entry counts as missing, same as no entry at all.
        let missing: Vec<String> = opponents
            .iter()
            .filter(|o| lookup.get(*o).is_none_or(|v| *v == 0.0))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(lookup);
        }

        let against_field = format!("{}_against", category.key());
        let mut stats_query = vec![
            ("select", format!("team,{against_field}")),
            ("team", in_list(&missing)),
        ];
        push_season(&mut stats_query, season);
        let stat_rows: std::result::Result<Vec<serde_json::Map<String, serde_json::Value>>, _> =
            self.get_rows("team_stats", &stats_query);

        match stat_rows {
            Ok(rows) if !rows.is_empty() => {
                for opponent in &missing {
                    let values: Vec<f64> = rows
                        .iter()
                        .filter(|r| r.get("team").and_then(|v| v.as_str()) == Some(opponent))
                        .map(|r| r.get(&against_field).and_then(|v| v.as_f64()).unwrap_or(0.0))
                        .collect();
                    // Opponents with no raw rows stay unresolved here.
                    if !values.is_empty() {
                        let avg = values.iter().sum::<f64>() / values.len() as f64;
                        lookup.insert(opponent.clone(), round1(avg));
                    }
                }
            }
            _ => {
                for opponent in &missing {
                    if lookup.get(opponent).is_none_or(|v| *v == 0.0) {
                        lookup.insert(opponent.clone(), league_fallback);
                    }
                }
            }
        }

        Ok(lookup)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
