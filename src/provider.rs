use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::demo_feed::DemoStore;
use crate::match_db::MatchDb;
use crate::state::{Delta, LeagueAverage, MatchRecord, ProviderCommand, StatCategory};
use crate::store_fetch::RemoteStore;

/// Simulated round-trip for the generated dataset so the loading states are
/// visible in demo mode too.
const DEMO_LATENCY_MS: u64 = 120;

pub enum DataSource {
    Demo(DemoStore),
    Remote(RemoteStore),
    Sqlite(MatchDb),
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Demo(_) => "demo",
            DataSource::Remote(_) => "remote",
            DataSource::Sqlite(_) => "sqlite",
        }
    }

    pub fn seasons(&self, league: &str) -> Result<Vec<String>> {
        match self {
            DataSource::Demo(store) => Ok(store.seasons(league)),
            DataSource::Remote(store) => store.seasons(league),
            DataSource::Sqlite(db) => db.seasons(league),
        }
    }

    pub fn teams(&self, league: &str, season: &str) -> Result<Vec<String>> {
        match self {
            DataSource::Demo(store) => Ok(store.teams(league, season)),
            DataSource::Remote(store) => store.teams(league, season),
            DataSource::Sqlite(db) => db.teams(league, season),
        }
    }

    pub fn league_averages(&self, league: &str, season: &str) -> Result<Vec<LeagueAverage>> {
        match self {
            DataSource::Demo(store) => Ok(store.league_averages(league, season)),
            DataSource::Remote(store) => store.league_averages(league, season),
            DataSource::Sqlite(db) => db.league_averages(league, season),
        }
    }

    pub fn team_matches(&self, team: &str, season: &str) -> Result<Vec<MatchRecord>> {
        match self {
            DataSource::Demo(store) => Ok(store.team_matches(team, season)),
            DataSource::Remote(store) => store.team_matches(team, season),
            DataSource::Sqlite(db) => db.team_matches(team, season),
        }
    }

    pub fn averages_against(
        &self,
        category: StatCategory,
        opponents: &[String],
        season: &str,
        league_fallback: f64,
    ) -> Result<HashMap<String, f64>> {
        match self {
            DataSource::Demo(store) => {
                Ok(store.averages_against(category, opponents, season, league_fallback))
            }
            DataSource::Remote(store) => {
                store.averages_against(category, opponents, season, league_fallback)
            }
            DataSource::Sqlite(db) => {
                db.averages_against(category, opponents, season, league_fallback)
            }
        }
    }
}

pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, source: DataSource) {
    thread::spawn(move || run_provider(tx, cmd_rx, source));
}

fn run_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, source: DataSource) {
    while let Ok(cmd) = cmd_rx.recv() {
        if matches!(source, DataSource::Demo(_)) {
            thread::sleep(Duration::from_millis(DEMO_LATENCY_MS));
        }

        match cmd {
            ProviderCommand::FetchSeasons { generation, league } => {
                match source.seasons(&league) {
                    Ok(seasons) => {
                        let _ = tx.send(Delta::Seasons { generation, seasons });
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Seasons fetch failed: {err}")));
                    }
                }
            }
            ProviderCommand::FetchRoster {
                generation,
                league,
                season,
            } => {
                let teams = match source.teams(&league, &season) {
                    Ok(teams) => teams,
                    Err(err) => {
                        let _ =
                            tx.send(Delta::Log(format!("[WARN] Team list fetch failed: {err}")));
                        Vec::new()
                    }
                };
                let averages = match source.league_averages(&league, &season) {
                    Ok(averages) => averages,
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!(
                            "[WARN] League averages fetch failed: {err}"
                        )));
                        Vec::new()
                    }
                };
                let _ = tx.send(Delta::Roster {
                    generation,
                    teams,
                    averages,
                });
            }
            ProviderCommand::FetchMatches {
                generation,
                team_a,
                team_b,
                season,
            } => {
                // Both sides land in one delta; a failure on either empties both.
                let (res_a, res_b) = fetch_match_pair(&source, &team_a, &team_b, &season);
                let (a, b) = match (res_a, res_b) {
                    (Ok(a), Ok(b)) => (a, b),
                    (Err(err), _) | (_, Err(err)) => {
                        let _ = tx.send(Delta::Log(format!("[WARN] Match fetch failed: {err}")));
                        (Vec::new(), Vec::new())
                    }
                };
                let _ = tx.send(Delta::Matches {
                    generation,
                    team_a: a,
                    team_b: b,
                });
            }
            ProviderCommand::FetchOpponentAverages {
                generation,
                category,
                opponents,
                season,
                league_fallback,
            } => {
                let averages =
                    match source.averages_against(category, &opponents, &season, league_fallback) {
                        Ok(averages) => averages,
                        Err(err) => {
                            let _ = tx.send(Delta::Log(format!(
                                "[WARN] Opponent averages fetch failed: {err}"
                            )));
                            HashMap::new()
                        }
                    };
                let _ = tx.send(Delta::OpponentAverages {
                    generation,
                    averages,
                });
            }
        }
    }
}

type MatchPair = (Result<Vec<MatchRecord>>, Result<Vec<MatchRecord>>);

fn fetch_match_pair(source: &DataSource, team_a: &str, team_b: &str, season: &str) -> MatchPair {
    if team_a == team_b {
        let res = source.team_matches(team_a, season);
        return match res {
            Ok(rows) => (Ok(rows.clone()), Ok(rows)),
            Err(err) => (Err(err), Ok(Vec::new())),
        };
    }

    // The hosted store takes real round-trips, so the two fetches run side by
    // side there. The sqlite handle is single-threaded.
    if let DataSource::Remote(store) = source {
        return thread::scope(|scope| {
            let handle = scope.spawn(|| store.team_matches(team_b, season));
            let res_a = store.team_matches(team_a, season);
            let res_b = handle
                .join()
                .map_err(|_| anyhow::anyhow!("match fetch worker panicked"))
                .and_then(|res| res);
            (res_a, res_b)
        });
    }

    (
        source.team_matches(team_a, season),
        source.team_matches(team_b, season),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LEAGUES;
    use std::sync::mpsc;
    use std::time::Duration;

    fn demo_provider() -> (mpsc::Sender<ProviderCommand>, mpsc::Receiver<Delta>) {
        let (delta_tx, delta_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        spawn_provider(delta_tx, cmd_rx, DataSource::Demo(DemoStore::generate()));
        (cmd_tx, delta_rx)
    }

    fn recv(rx: &mpsc::Receiver<Delta>) -> Delta {
        rx.recv_timeout(Duration::from_secs(5)).expect("provider reply")
    }

    #[test]
    fn seasons_come_back_with_the_request_generation() {
        let (cmd_tx, delta_rx) = demo_provider();
        cmd_tx
            .send(ProviderCommand::FetchSeasons {
                generation: 7,
                league: LEAGUES[0].to_string(),
            })
            .unwrap();

        match recv(&delta_rx) {
            Delta::Seasons { generation, seasons } => {
                assert_eq!(generation, 7);
                assert!(!seasons.is_empty());
            }
            other => panic!("unexpected delta: {other:?}"),
        }
    }

    #[test]
    fn roster_bundles_teams_and_averages() {
        let (cmd_tx, delta_rx) = demo_provider();
        cmd_tx
            .send(ProviderCommand::FetchRoster {
                generation: 1,
                league: "La Liga".to_string(),
                season: "all".to_string(),
            })
            .unwrap();

        match recv(&delta_rx) {
            Delta::Roster {
                generation,
                teams,
                averages,
            } => {
                assert_eq!(generation, 1);
                assert_eq!(teams.len(), 10);
                assert!(!averages.is_empty());
            }
            other => panic!("unexpected delta: {other:?}"),
        }
    }

    #[test]
    fn matches_arrive_as_one_joined_delta() {
        let (cmd_tx, delta_rx) = demo_provider();
        cmd_tx
            .send(ProviderCommand::FetchRoster {
                generation: 1,
                league: "Premier League".to_string(),
                season: "all".to_string(),
            })
            .unwrap();
        let roster = match recv(&delta_rx) {
            Delta::Roster { teams, .. } => teams,
            other => panic!("unexpected delta: {other:?}"),
        };

        cmd_tx
            .send(ProviderCommand::FetchMatches {
                generation: 2,
                team_a: roster[0].clone(),
                team_b: roster[1].clone(),
                season: "all".to_string(),
            })
            .unwrap();

        match recv(&delta_rx) {
            Delta::Matches {
                generation,
                team_a,
                team_b,
            } => {
                assert_eq!(generation, 2);
                assert!(!team_a.is_empty());
                assert!(!team_b.is_empty());
                assert!(team_a.iter().all(|m| m.team == roster[0]));
                assert!(team_b.iter().all(|m| m.team == roster[1]));
            }
            other => panic!("unexpected delta: {other:?}"),
        }
    }

    #[test]
    fn unknown_team_yields_an_empty_side_without_error() {
        let (cmd_tx, delta_rx) = demo_provider();
        cmd_tx
            .send(ProviderCommand::FetchMatches {
                generation: 3,
                team_a: "Nowhere FC".to_string(),
                team_b: "Nowhere FC".to_string(),
                season: "all".to_string(),
            })
            .unwrap();

        match recv(&delta_rx) {
            Delta::Matches {
                generation,
                team_a,
                team_b,
            } => {
                assert_eq!(generation, 3);
                assert!(team_a.is_empty());
                assert!(team_b.is_empty());
            }
            other => panic!("unexpected delta: {other:?}"),
        }
    }

    #[test]
    fn opponent_averages_cover_every_requested_name() {
        let (cmd_tx, delta_rx) = demo_provider();
        cmd_tx
            .send(ProviderCommand::FetchRoster {
                generation: 1,
                league: "Serie A".to_string(),
                season: "all".to_string(),
            })
            .unwrap();
        let roster = match recv(&delta_rx) {
            Delta::Roster { teams, .. } => teams,
            other => panic!("unexpected delta: {other:?}"),
        };

        let wanted = vec![roster[0].clone(), roster[1].clone()];
        cmd_tx
            .send(ProviderCommand::FetchOpponentAverages {
                generation: 4,
                category: StatCategory::Corners,
                opponents: wanted.clone(),
                season: "all".to_string(),
                league_fallback: 10.0,
            })
            .unwrap();

        match recv(&delta_rx) {
            Delta::OpponentAverages {
                generation,
                averages,
            } => {
                assert_eq!(generation, 4);
                for name in &wanted {
                    assert!(averages.contains_key(name), "{name}");
                }
            }
            other => panic!("unexpected delta: {other:?}"),
        }
    }
}
