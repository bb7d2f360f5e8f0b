use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::types::ToSql;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::state::{ALL_SEASONS, LeagueAverage, MATCH_FETCH_LIMIT, MatchRecord, StatCategory};
use crate::store_fetch::{LeagueAverageRow, TeamStatsRow, rows_to_league_averages, rows_to_matches};

/// Seed entry for the precomputed conceded-average table.
#[derive(Debug, Clone, Deserialize)]
pub struct AverageAgainstSeed {
    pub team: String,
    #[serde(default)]
    pub season: String,
    pub stat_type: String,
    #[serde(default)]
    pub avg_against: f64,
}

/// On-disk seed format consumed by the seeding binary.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub matches: Vec<TeamStatsRow>,
    #[serde(default)]
    pub league_averages: Vec<LeagueAverageRow>,
    #[serde(default)]
    pub averages_against: Vec<AverageAgainstSeed>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeedCounts {
    pub matches: usize,
    pub league_averages: usize,
    pub averages_against: usize,
}

const DB_DIR: &str = "statline";
const DB_FILE: &str = "statline.sqlite";

/// Snapshot location: `STATLINE_DB_PATH` override, else the XDG cache
/// directory, else the working directory.
pub fn default_db_path() -> PathBuf {
    if let Some(path) = env::var("STATLINE_DB_PATH")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        return PathBuf::from(path);
    }
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return PathBuf::from(base).join(DB_DIR).join(DB_FILE);
    }
    if let Ok(home) = env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home).join(".cache").join(DB_DIR).join(DB_FILE);
    }
    PathBuf::from(DB_FILE)
}

/// Local sqlite mirror of the hosted store. Query semantics match the remote
/// side so the rest of the app cannot tell them apart.
pub struct MatchDb {
    conn: Connection,
}

impl MatchDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn seed(&mut self, seed: &SeedFile) -> Result<SeedCounts> {
        Ok(SeedCounts {
            matches: self.upsert_matches(&seed.matches)?,
            league_averages: self.upsert_league_averages(&seed.league_averages)?,
            averages_against: self.upsert_averages_against(&seed.averages_against)?,
        })
    }

    pub fn upsert_matches(&mut self, rows: &[TeamStatsRow]) -> Result<usize> {
        let tx = self.conn.transaction().context("begin matches transaction")?;
        for row in rows {
            tx.execute(
                r#"
                INSERT INTO team_stats (
                    team, opponent, match_date, is_home, season, league,
                    shots_for, shots_against, shots_on_target_for, shots_on_target_against,
                    corners_for, corners_against, goals_for, goals_against,
                    yellow_for, yellow_against, red_for, red_against
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6,
                    ?7, ?8, ?9, ?10,
                    ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18
                )
                ON CONFLICT(team, match_date, opponent) DO UPDATE SET
                    is_home = excluded.is_home,
                    season = excluded.season,
                    league = excluded.league,
                    shots_for = excluded.shots_for,
                    shots_against = excluded.shots_against,
                    shots_on_target_for = excluded.shots_on_target_for,
                    shots_on_target_against = excluded.shots_on_target_against,
                    corners_for = excluded.corners_for,
                    corners_against = excluded.corners_against,
                    goals_for = excluded.goals_for,
                    goals_against = excluded.goals_against,
                    yellow_for = excluded.yellow_for,
                    yellow_against = excluded.yellow_against,
                    red_for = excluded.red_for,
                    red_against = excluded.red_against
                "#,
                params![
                    row.team,
                    row.opponent,
                    row.match_date,
                    bool_to_i64(row.is_home),
                    row.season,
                    row.league,
                    row.shots_for,
                    row.shots_against,
                    row.shots_on_target_for,
                    row.shots_on_target_against,
                    row.corners_for,
                    row.corners_against,
                    row.goals_for,
                    row.goals_against,
                    row.yellow_for,
                    row.yellow_against,
                    row.red_for,
                    row.red_against,
                ],
            )
            .context("upsert team stats row")?;
        }
        tx.commit().context("commit matches transaction")?;
        Ok(rows.len())
    }

    pub fn upsert_league_averages(&mut self, rows: &[LeagueAverageRow]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .context("begin league averages transaction")?;
        for row in rows {
            tx.execute(
                r#"
                INSERT INTO league_averages (
                    league, season, stat_type,
                    home_average, away_average, league_average, matches_counted, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(league, season, stat_type) DO UPDATE SET
                    home_average = excluded.home_average,
                    away_average = excluded.away_average,
                    league_average = excluded.league_average,
                    matches_counted = excluded.matches_counted,
                    updated_at = excluded.updated_at
                "#,
                params![
                    row.league,
                    row.season,
                    row.stat_type,
                    row.home_average,
                    row.away_average,
                    row.league_average,
                    row.matches_counted,
                    row.updated_at,
                ],
            )
            .context("upsert league average row")?;
        }
        tx.commit().context("commit league averages transaction")?;
        Ok(rows.len())
    }

    pub fn upsert_averages_against(&mut self, rows: &[AverageAgainstSeed]) -> Result<usize> {
        let tx = self
            .conn
            .transaction()
            .context("begin averages-against transaction")?;
        for row in rows {
            tx.execute(
                r#"
                INSERT INTO team_averages_against (team, season, stat_type, avg_against)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(team, season, stat_type) DO UPDATE SET
                    avg_against = excluded.avg_against
                "#,
                params![row.team, row.season, row.stat_type, row.avg_against],
            )
            .context("upsert average-against row")?;
        }
        tx.commit().context("commit averages-against transaction")?;
        Ok(rows.len())
    }

    /// Distinct seasons for a league, newest first.
    pub fn seasons(&self, league: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT season FROM team_stats
                 WHERE league = ?1 AND season != ''
                 ORDER BY season DESC",
            )
            .context("prepare seasons query")?;
        let rows = stmt
            .query_map(params![league], |row| row.get::<_, String>(0))
            .context("query seasons")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode season row")?);
        }
        Ok(out)
    }

    /// Distinct team names for a league and season, alphabetical.
    pub fn teams(&self, league: &str, season: &str) -> Result<Vec<String>> {
        let mut sql = String::from(
            "SELECT DISTINCT team FROM team_stats WHERE league = ?1 AND team != ''",
        );
        let mut binds: Vec<&dyn ToSql> = vec![&league];
        if has_season(season) {
            sql.push_str(" AND season = ?2");
            binds.push(&season);
        }
        sql.push_str(" ORDER BY team ASC");

        let mut stmt = self.conn.prepare(&sql).context("prepare teams query")?;
        let rows = stmt
            .query_map(&binds[..], |row| row.get::<_, String>(0))
            .context("query teams")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode team row")?);
        }
        Ok(out)
    }

    pub fn league_averages(&self, league: &str, season: &str) -> Result<Vec<LeagueAverage>> {
        let mut sql = String::from(
            "SELECT league, season, stat_type,
                    home_average, away_average, league_average, matches_counted, updated_at
             FROM league_averages WHERE league = ?1",
        );
        let mut binds: Vec<&dyn ToSql> = vec![&league];
        if has_season(season) {
            sql.push_str(" AND season = ?2");
            binds.push(&season);
        }

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare league averages query")?;
        let rows = stmt
            .query_map(&binds[..], |row| {
                Ok(LeagueAverageRow {
                    league: row.get(0)?,
                    season: row.get(1)?,
                    stat_type: row.get(2)?,
                    home_average: row.get(3)?,
                    away_average: row.get(4)?,
                    league_average: row.get(5)?,
                    matches_counted: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })
            .context("query league averages")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode league average row")?);
        }
        Ok(rows_to_league_averages(out))
    }

    /// A team's rows, newest first, capped at the fetch limit.
    pub fn team_matches(&self, team: &str, season: &str) -> Result<Vec<MatchRecord>> {
        let mut sql = String::from(
            "SELECT team, opponent, match_date, is_home, season, league,
                    shots_for, shots_against, shots_on_target_for, shots_on_target_against,
                    corners_for, corners_against, goals_for, goals_against,
                    yellow_for, yellow_against, red_for, red_against
             FROM team_stats WHERE team = ?1",
        );
        let mut binds: Vec<&dyn ToSql> = vec![&team];
        if has_season(season) {
            sql.push_str(" AND season = ?2");
            binds.push(&season);
        }
        sql.push_str(" ORDER BY match_date DESC LIMIT ");
        sql.push_str(&MATCH_FETCH_LIMIT.to_string());

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare team matches query")?;
        let rows = stmt
            .query_map(&binds[..], |row| {
                Ok(TeamStatsRow {
                    team: row.get(0)?,
                    opponent: row.get(1)?,
                    match_date: row.get(2)?,
                    is_home: row.get::<_, i64>(3)? != 0,
                    season: row.get(4)?,
                    league: row.get(5)?,
                    shots_for: row.get(6)?,
                    shots_against: row.get(7)?,
                    shots_on_target_for: row.get(8)?,
                    shots_on_target_against: row.get(9)?,
                    corners_for: row.get(10)?,
                    corners_against: row.get(11)?,
                    goals_for: row.get(12)?,
                    goals_against: row.get(13)?,
                    yellow_for: row.get(14)?,
                    yellow_against: row.get(15)?,
                    red_for: row.get(16)?,
                    red_against: row.get(17)?,
                })
            })
            .context("query team matches")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode match row")?);
        }
        Ok(rows_to_matches(out))
    }

    /// Average conceded per opponent, with the same fallback chain as the
    /// remote store: precomputed row, then a mean over that opponent's raw
    /// rows, then the league-wide baseline when nothing derived at all.
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

        let mut lookup: HashMap<String, f64> = HashMap::new();
        let key = category.key();
        for opponent in opponents {
            let mut sql = String::from(
                "SELECT avg_against FROM team_averages_against
                 WHERE team = ?1 AND stat_type = ?2",
            );
            let mut binds: Vec<&dyn ToSql> = vec![opponent, &key];
            if has_season(season) {
                sql.push_str(" AND season = ?3");
                binds.push(&season);
            }
            let mut stmt = self
                .conn
                .prepare(&sql)
                .context("prepare average-against query")?;
            let mut rows = stmt
                .query_map(&binds[..], |row| row.get::<_, f64>(0))
                .context("query average-against")?;
            if let Some(row) = rows.next() {
                lookup.insert(
                    opponent.clone(),
                    row.context("decode average-against row")?,
                );
            }
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

        let against_column = format!("{key}_against");
        let mut derived_any = false;
        for opponent in &missing {
            let mut sql = format!(
                "SELECT {against_column} FROM team_stats WHERE team = ?1"
            );
            let mut binds: Vec<&dyn ToSql> = vec![opponent];
            if has_season(season) {
                sql.push_str(" AND season = ?2");
                binds.push(&season);
            }
            let mut stmt = self
                .conn
                .prepare(&sql)
                .context("prepare derived average query")?;
            let rows = stmt
                .query_map(&binds[..], |row| row.get::<_, f64>(0))
                .context("query derived average")?;
            let mut values = Vec::new();
            for row in rows {
                values.push(row.context("decode derived average row")?);
            }
            if !values.is_empty() {
                derived_any = true;
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                lookup.insert(opponent.clone(), round1(avg));
            }
        }

        if !derived_any {
            for opponent in &missing {
                if lookup.get(opponent).is_none_or(|v| *v == 0.0) {
                    lookup.insert(opponent.clone(), league_fallback);
                }
            }
        }

        Ok(lookup)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS team_stats (
            team TEXT NOT NULL,
            opponent TEXT NOT NULL,
            match_date TEXT NOT NULL,
            is_home INTEGER NOT NULL,
            season TEXT NOT NULL,
            league TEXT NOT NULL,
            shots_for INTEGER NOT NULL DEFAULT 0,
            shots_against INTEGER NOT NULL DEFAULT 0,
            shots_on_target_for INTEGER NOT NULL DEFAULT 0,
            shots_on_target_against INTEGER NOT NULL DEFAULT 0,
            corners_for INTEGER NOT NULL DEFAULT 0,
            corners_against INTEGER NOT NULL DEFAULT 0,
            goals_for INTEGER NOT NULL DEFAULT 0,
            goals_against INTEGER NOT NULL DEFAULT 0,
            yellow_for INTEGER NOT NULL DEFAULT 0,
            yellow_against INTEGER NOT NULL DEFAULT 0,
            red_for INTEGER NOT NULL DEFAULT 0,
            red_against INTEGER NOT NULL DEFAULT 0,
            UNIQUE(team, match_date, opponent)
        );
        CREATE INDEX IF NOT EXISTS idx_team_stats_league ON team_stats(league);
        CREATE INDEX IF NOT EXISTS idx_team_stats_team ON team_stats(team);
        CREATE INDEX IF NOT EXISTS idx_team_stats_date ON team_stats(match_date);

        CREATE TABLE IF NOT EXISTS league_averages (
            league TEXT NOT NULL,
            season TEXT NOT NULL,
            stat_type TEXT NOT NULL,
            home_average REAL NOT NULL DEFAULT 0,
            away_average REAL NOT NULL DEFAULT 0,
            league_average REAL NOT NULL DEFAULT 0,
            matches_counted INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NULL,
            UNIQUE(league, season, stat_type)
        );

        CREATE TABLE IF NOT EXISTS team_averages_against (
            team TEXT NOT NULL,
            season TEXT NOT NULL,
            stat_type TEXT NOT NULL,
            avg_against REAL NOT NULL DEFAULT 0,
            UNIQUE(team, season, stat_type)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn has_season(season: &str) -> bool {
    !season.is_empty() && season != ALL_SEASONS
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
