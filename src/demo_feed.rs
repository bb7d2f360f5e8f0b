use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::Rng;

use crate::state::{
    ALL_SEASONS, LeagueAverage, MATCH_FETCH_LIMIT, MatchRecord, StatCategory,
};

const DEMO_SEASONS: [&str; 2] = ["2025-26", "2024-25"];
const MATCHES_PER_SEASON: usize = 19;

const DEMO_TEAMS: [(&str, [&str; 10]); 5] = [
    (
        "Premier League",
        [
            "Ashvale United",
            "Brockton Athletic",
            "Calder Rovers",
            "Danesfort City",
            "Eastmere Town",
            "Farrow Wanderers",
            "Gilden Park",
            "Harrowgate",
            "Kestrel Heath",
            "Loxley Albion",
        ],
    ),
    (
        "La Liga",
        [
            "Alcores CF",
            "Atletico Brisa",
            "CD Miravalle",
            "Deportivo Rosal",
            "Estrella Vega",
            "Laguna FC",
            "Montesol",
            "Penaclara",
            "UD Solara",
            "Valmonte CF",
        ],
    ),
    (
        "Serie A",
        [
            "AC Torvano",
            "Aurora Calcio",
            "Bellarosa",
            "Corvina 1921",
            "Falco Adriatico",
            "Lunezia",
            "Monteverdi",
            "Portanova",
            "San Vittore",
            "Tregara",
        ],
    ),
    (
        "Bundesliga",
        [
            "FC Adlerhorst",
            "SV Falkenberg",
            "Blauweiss Kessel",
            "Hansa Norden",
            "Eisenwald 04",
            "SC Lindenau",
            "Turbine Ostfeld",
            "VfB Steinbach",
            "Westfalia Bruck",
            "FC Zinnberg",
        ],
    ),
    (
        "Championship",
        [
            "Barrowcliff",
            "Coalbrook Town",
            "Dunmore Rangers",
            "Elsworth FC",
            "Fenwick Borough",
            "Grayling United",
            "Hollowmoor",
            "Ivybridge Vale",
            "Netherby",
            "Quarry Lane",
        ],
    ),
];

/// Generated stand-in for the hosted store. The query surface matches the
/// remote and sqlite stores so the provider treats all three alike.
pub struct DemoStore {
    matches: Vec<MatchRecord>,
    averages: Vec<LeagueAverage>,
    league_teams: HashMap<String, Vec<String>>,
}

impl DemoStore {
    pub fn generate() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    fn with_rng(rng: &mut impl Rng) -> Self {
        let mut matches = Vec::new();
        let mut league_teams = HashMap::new();

        for (league, teams) in DEMO_TEAMS {
            league_teams.insert(
                league.to_string(),
                teams.iter().map(|t| t.to_string()).collect(),
            );
            for team in teams {
                let profile = TeamProfile::roll(rng);
                for season in DEMO_SEASONS {
                    generate_team_season(rng, &mut matches, team, &teams, season, &profile);
                }
            }
        }

        let averages = compute_league_averages(&matches, &league_teams);
        Self {
            matches,
            averages,
            league_teams,
        }
    }

    /// Seasons for a league, newest first.
    pub fn seasons(&self, league: &str) -> Vec<String> {
        if self.league_teams.contains_key(league) {
            DEMO_SEASONS.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        }
    }

    pub fn teams(&self, league: &str, _season: &str) -> Vec<String> {
        self.league_teams.get(league).cloned().unwrap_or_default()
    }

    pub fn league_averages(&self, league: &str, season: &str) -> Vec<LeagueAverage> {
        self.averages
            .iter()
            .filter(|a| a.league == league && (!has_season(season) || a.season == season))
            .cloned()
            .collect()
    }

    /// A team's rows, newest first, capped at the fetch limit.
    pub fn team_matches(&self, team: &str, season: &str) -> Vec<MatchRecord> {
        let mut rows: Vec<MatchRecord> = self
            .matches
            .iter()
            .filter(|m| m.team == team && (!has_season(season) || m.season == season))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.match_date.cmp(&a.match_date));
        rows.truncate(MATCH_FETCH_LIMIT);
        rows
    }

    /// Average conceded per opponent, derived from each opponent's own rows.
    /// Opponents absent from the dataset get the league baseline.
    pub fn averages_against(
        &self,
        category: StatCategory,
        opponents: &[String],
        season: &str,
        league_fallback: f64,
    ) -> HashMap<String, f64> {
        let mut lookup = HashMap::new();
        for opponent in opponents {
            let values: Vec<f64> = self
                .matches
                .iter()
                .filter(|m| m.team == *opponent && (!has_season(season) || m.season == season))
                .map(|m| m.stat_against(category) as f64)
                .collect();
            if values.is_empty() {
                lookup.insert(opponent.clone(), league_fallback);
            } else {
                let avg = values.iter().sum::<f64>() / values.len() as f64;
                lookup.insert(opponent.clone(), round1(avg));
            }
        }
        lookup
    }
}

struct TeamProfile {
    shots_base: u32,
    corners_base: u32,
    cards_base: u32,
    attack: f64,
}

impl TeamProfile {
    fn roll(rng: &mut impl Rng) -> Self {
        Self {
            shots_base: rng.gen_range(9..=16),
            corners_base: rng.gen_range(4..=7),
            cards_base: rng.gen_range(1..=3),
            attack: rng.gen_range(0.9..1.6),
        }
    }
}

fn generate_team_season(
    rng: &mut impl Rng,
    out: &mut Vec<MatchRecord>,
    team: &str,
    league_teams: &[&str],
    season: &str,
    profile: &TeamProfile,
) {
    let mut date = season_end(season);
    for i in 0..MATCHES_PER_SEASON {
        let opponent = loop {
            let pick = league_teams[rng.gen_range(0..league_teams.len())];
            if pick != team {
                break pick;
            }
        };

        let mut shots_for = jitter(rng, profile.shots_base, 4);
        // Occasional blowout so smoothing has something to catch.
        if rng.gen_bool(0.06) {
            shots_for += rng.gen_range(10..18);
        }
        let shots_against = jitter(rng, 11, 4);

        out.push(MatchRecord {
            team: team.to_string(),
            opponent: opponent.to_string(),
            match_date: date,
            is_home: i % 2 == 0,
            season: season.to_string(),
            shots_for,
            shots_against,
            shots_on_target_for: shots_for / 3 + rng.gen_range(0..=2),
            shots_on_target_against: shots_against / 3 + rng.gen_range(0..=2),
            corners_for: jitter(rng, profile.corners_base, 3),
            corners_against: jitter(rng, 5, 3),
            goals_for: goals(rng, profile.attack),
            goals_against: goals(rng, 1.1),
            yellow_for: jitter(rng, profile.cards_base, 2),
            yellow_against: jitter(rng, 2, 2),
            red_for: if rng.gen_bool(0.04) { 1 } else { 0 },
            red_against: if rng.gen_bool(0.04) { 1 } else { 0 },
        });

        date = date
            .checked_sub_signed(ChronoDuration::days(rng.gen_range(5..=9)))
            .unwrap_or(date);
    }
}

fn compute_league_averages(
    matches: &[MatchRecord],
    league_teams: &HashMap<String, Vec<String>>,
) -> Vec<LeagueAverage> {
    let mut out = Vec::new();
    for (league, teams) in league_teams {
        for season in DEMO_SEASONS {
            let rows: Vec<&MatchRecord> = matches
                .iter()
                .filter(|m| m.season == season && teams.contains(&m.team))
                .collect();
            if rows.is_empty() {
                continue;
            }
            for category in StatCategory::ALL {
                let home: Vec<f64> = rows
                    .iter()
                    .filter(|m| m.is_home)
                    .map(|m| m.stat_for(category) as f64)
                    .collect();
                let away: Vec<f64> = rows
                    .iter()
                    .filter(|m| !m.is_home)
                    .map(|m| m.stat_for(category) as f64)
                    .collect();
                let all: Vec<f64> = rows.iter().map(|m| m.stat_for(category) as f64).collect();
                out.push(LeagueAverage {
                    league: league.clone(),
                    season: season.to_string(),
                    stat_type: category,
                    home_average: round1(mean(&home)),
                    away_average: round1(mean(&away)),
                    league_average: round1(mean(&all)),
                    matches_counted: rows.len() as u32,
                    updated_at: None,
                });
            }
        }
    }
    out
}

fn season_end(season: &str) -> NaiveDate {
    let start_year: i32 = season
        .get(..4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2025);
    NaiveDate::from_ymd_opt(start_year + 1, 5, 17).unwrap_or_default()
}

fn jitter(rng: &mut impl Rng, base: u32, spread: u32) -> u32 {
    let low = base.saturating_sub(spread);
    rng.gen_range(low..=base + spread)
}

fn goals(rng: &mut impl Rng, attack: f64) -> u32 {
    let roll: f64 = rng.gen_range(0.0..1.0) * attack;
    if roll < 0.35 {
        0
    } else if roll < 0.75 {
        1
    } else if roll < 1.05 {
        2
    } else if roll < 1.35 {
        3
    } else {
        4
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn has_season(season: &str) -> bool {
    !season.is_empty() && season != ALL_SEASONS
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LEAGUES;

    #[test]
    fn every_league_has_a_roster_and_seasons() {
        let store = DemoStore::generate();
        for league in LEAGUES {
            assert_eq!(store.teams(league, "all").len(), 10, "{league}");
            assert_eq!(store.seasons(league), vec!["2025-26", "2024-25"]);
        }
        assert!(store.teams("Unknown League", "all").is_empty());
    }

    #[test]
    fn team_matches_are_newest_first_and_capped() {
        let store = DemoStore::generate();
        let team = &store.teams("Premier League", "all")[0];

        let rows = store.team_matches(team, "all");
        assert!(!rows.is_empty());
        assert!(rows.len() <= MATCH_FETCH_LIMIT);
        for pair in rows.windows(2) {
            assert!(pair[0].match_date >= pair[1].match_date);
        }

        let season_rows = store.team_matches(team, "2024-25");
        assert!(season_rows.iter().all(|m| m.season == "2024-25"));
    }

    #[test]
    fn league_averages_cover_every_category() {
        let store = DemoStore::generate();
        let averages = store.league_averages("Serie A", "2025-26");
        assert_eq!(averages.len(), StatCategory::ALL.len());
        let shots = averages
            .iter()
            .find(|a| a.stat_type == StatCategory::Shots)
            .unwrap();
        assert!(shots.league_average > 0.0);
        assert!(shots.home_average > 0.0);
    }

    #[test]
    fn unknown_opponents_get_the_league_fallback() {
        let store = DemoStore::generate();
        let roster = store.teams("Bundesliga", "all");
        let lookup = store.averages_against(
            StatCategory::Shots,
            &[roster[0].clone(), "Nowhere FC".to_string()],
            "all",
            24.6,
        );
        assert!(*lookup.get(&roster[0]).unwrap() > 0.0);
        assert_eq!(lookup.get("Nowhere FC"), Some(&24.6));
    }
}
