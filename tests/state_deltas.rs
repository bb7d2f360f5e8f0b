use chrono::NaiveDate;
use statline_terminal::state::{
    ALL_SEASONS, AppState, Delta, LeagueAverage, MatchRecord, StatCategory, apply_delta,
};

fn record(team: &str, opponent: &str, date: &str) -> MatchRecord {
    MatchRecord {
        team: team.to_string(),
        opponent: opponent.to_string(),
        match_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
        is_home: true,
        season: "2025-26".to_string(),
        shots_for: 12,
        shots_against: 9,
        shots_on_target_for: 5,
        shots_on_target_against: 3,
        corners_for: 6,
        corners_against: 4,
        goals_for: 2,
        goals_against: 1,
        yellow_for: 2,
        yellow_against: 1,
        red_for: 0,
        red_against: 0,
    }
}

fn shots_average(league: &str) -> LeagueAverage {
    LeagueAverage {
        league: league.to_string(),
        season: "2025-26".to_string(),
        stat_type: StatCategory::Shots,
        home_average: 13.0,
        away_average: 11.0,
        league_average: 12.0,
        matches_counted: 380,
        updated_at: None,
    }
}

#[test]
fn stale_seasons_response_is_discarded() {
    let mut state = AppState::new();
    let first = state.next_seasons_generation();
    let second = state.next_seasons_generation();

    apply_delta(
        &mut state,
        Delta::Seasons {
            generation: first,
            seasons: vec!["2019-20".to_string()],
        },
    );
    assert!(state.seasons.is_empty());

    apply_delta(
        &mut state,
        Delta::Seasons {
            generation: second,
            seasons: vec!["2025-26".to_string(), "2024-25".to_string()],
        },
    );
    assert_eq!(state.seasons, vec!["2025-26", "2024-25"]);
}

#[test]
fn season_selection_falls_back_to_all_when_missing_from_new_list() {
    let mut state = AppState::new();
    state.config.season = "2019-20".to_string();
    state.dirty = false;
    let generation = state.next_seasons_generation();

    apply_delta(
        &mut state,
        Delta::Seasons {
            generation,
            seasons: vec!["2025-26".to_string(), "2024-25".to_string()],
        },
    );

    assert_eq!(state.config.season, ALL_SEASONS);
    assert!(state.dirty);
}

#[test]
fn season_selection_survives_when_still_listed() {
    let mut state = AppState::new();
    state.config.season = "2024-25".to_string();
    state.dirty = false;
    let generation = state.next_seasons_generation();

    apply_delta(
        &mut state,
        Delta::Seasons {
            generation,
            seasons: vec!["2025-26".to_string(), "2024-25".to_string()],
        },
    );

    assert_eq!(state.config.season, "2024-25");
    assert!(!state.dirty);
}

#[test]
fn roster_clears_vanished_selection_with_its_matches() {
    let mut state = AppState::new();
    state.config.team_a = Some("Relegated FC".to_string());
    state.config.team_b = Some("Ashvale United".to_string());
    state.team_a_matches = vec![record("Relegated FC", "Ashvale United", "2026-05-10")];
    state.team_b_matches = vec![record("Ashvale United", "Relegated FC", "2026-05-10")];
    state.roster_loading = true;
    let generation = state.next_roster_generation();

    apply_delta(
        &mut state,
        Delta::Roster {
            generation,
            teams: vec!["Ashvale United".to_string(), "Calder Rovers".to_string()],
            averages: vec![shots_average("Premier League")],
        },
    );

    assert_eq!(state.config.team_a, None);
    assert!(state.team_a_matches.is_empty());
    assert_eq!(state.config.team_b.as_deref(), Some("Ashvale United"));
    assert_eq!(state.team_b_matches.len(), 1);
    assert!(!state.roster_loading);
    assert_eq!(state.league_averages.len(), 1);
}

#[test]
fn stale_roster_response_keeps_current_listing() {
    let mut state = AppState::new();
    state.teams = vec!["Ashvale United".to_string()];
    state.roster_loading = true;
    let stale = state.next_roster_generation();
    let _current = state.next_roster_generation();

    apply_delta(
        &mut state,
        Delta::Roster {
            generation: stale,
            teams: vec!["Montesol".to_string()],
            averages: Vec::new(),
        },
    );

    assert_eq!(state.teams, vec!["Ashvale United"]);
    assert!(state.roster_loading);
}

#[test]
fn matches_delta_replaces_both_sides_at_once() {
    let mut state = AppState::new();
    state.team_a_matches = vec![record("Old A", "X", "2026-01-01")];
    state.team_b_matches = vec![record("Old B", "Y", "2026-01-01")];
    state.matches_loading = true;
    state.dirty = false;
    let generation = state.next_matches_generation();

    apply_delta(
        &mut state,
        Delta::Matches {
            generation,
            team_a: vec![
                record("Ashvale United", "Calder Rovers", "2026-05-10"),
                record("Ashvale United", "Gilden Park", "2026-05-03"),
            ],
            team_b: vec![record("Calder Rovers", "Ashvale United", "2026-05-10")],
        },
    );

    assert_eq!(state.team_a_matches.len(), 2);
    assert_eq!(state.team_a_matches[0].team, "Ashvale United");
    assert_eq!(state.team_b_matches.len(), 1);
    assert!(!state.matches_loading);
    assert!(state.dirty);
}

#[test]
fn stale_matches_response_is_ignored_entirely() {
    let mut state = AppState::new();
    state.matches_loading = true;
    let stale = state.next_matches_generation();
    let _current = state.next_matches_generation();

    apply_delta(
        &mut state,
        Delta::Matches {
            generation: stale,
            team_a: vec![record("Ashvale United", "Calder Rovers", "2026-05-10")],
            team_b: Vec::new(),
        },
    );

    assert!(state.team_a_matches.is_empty());
    assert!(state.matches_loading);
}

#[test]
fn opponent_averages_apply_only_for_current_generation() {
    let mut state = AppState::new();
    let stale = state.next_opponents_generation();
    let current = state.next_opponents_generation();

    apply_delta(
        &mut state,
        Delta::OpponentAverages {
            generation: stale,
            averages: [("Calder Rovers".to_string(), 9.9)].into_iter().collect(),
        },
    );
    assert!(state.opponent_averages.is_empty());

    apply_delta(
        &mut state,
        Delta::OpponentAverages {
            generation: current,
            averages: [("Calder Rovers".to_string(), 11.4)].into_iter().collect(),
        },
    );
    assert_eq!(state.opponent_averages.get("Calder Rovers"), Some(&11.4));
}

#[test]
fn log_ring_keeps_only_the_newest_two_hundred() {
    let mut state = AppState::new();
    for i in 0..205 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] entry {i}")));
    }

    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] entry 5"));
    assert_eq!(
        state.logs.back().map(String::as_str),
        Some("[INFO] entry 204")
    );
}
