use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use statline_terminal::analysis::compute_snapshot;
use statline_terminal::insights::{ConsistencyLevel, FormStatus};
use statline_terminal::state::{
    AppState, DisplayOption, LeagueAverage, MatchRecord, StatCategory, VenueFilter,
};
use statline_terminal::store_fetch::{TeamStatsRow, rows_to_matches};
use statline_terminal::true_odds::Factorials;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_matches() -> Vec<MatchRecord> {
    let raw = read_fixture("matches.json");
    let rows: Vec<TeamStatsRow> = serde_json::from_str(&raw).expect("fixture should parse");
    rows_to_matches(rows)
}

fn ashvale_state() -> AppState {
    let mut state = AppState::new();
    state.config.team_a = Some("Ashvale United".to_string());
    state.config.sample_size = 6;
    state.config.smoothing = true;
    state.config.smoothing_strength = 2;
    state.config.line = 12.5;
    state.team_a_matches = fixture_matches();
    state
}

fn rovers_match(date: &str, is_home: bool, shots_against: u32) -> MatchRecord {
    MatchRecord {
        team: "Calder Rovers".to_string(),
        opponent: "Someone".to_string(),
        match_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
        is_home,
        season: "2025-26".to_string(),
        shots_for: 11,
        shots_against,
        shots_on_target_for: 4,
        shots_on_target_against: 4,
        corners_for: 5,
        corners_against: 5,
        goals_for: 1,
        goals_against: 1,
        yellow_for: 1,
        yellow_against: 1,
        red_for: 0,
        red_against: 0,
    }
}

fn shots_baseline(value: f64) -> LeagueAverage {
    LeagueAverage {
        league: "Premier League".to_string(),
        season: "2025-26".to_string(),
        stat_type: StatCategory::Shots,
        home_average: value + 1.0,
        away_average: value - 1.0,
        league_average: value,
        matches_counted: 380,
        updated_at: None,
    }
}

#[test]
fn fixture_rows_parse_and_drop_bad_dates() {
    let matches = fixture_matches();
    // Nine raw rows; the postponed one has no parseable date.
    assert_eq!(matches.len(), 8);
    assert!(matches.iter().all(|m| m.opponent != "Phantom FC"));

    // The timestamped date keeps only its date part.
    let newest = matches
        .iter()
        .max_by_key(|m| m.match_date)
        .expect("fixture has rows");
    assert_eq!(newest.opponent, "Calder Rovers");
    assert_eq!(
        newest.match_date,
        NaiveDate::from_ymd_opt(2026, 5, 10).expect("valid date")
    );

    // Absent stat columns deserialize to zero.
    let kestrel = matches
        .iter()
        .find(|m| m.opponent == "Kestrel Heath")
        .expect("row present");
    assert_eq!(kestrel.red_for, 0);
    assert_eq!(kestrel.red_against, 0);
}

#[test]
fn chart_pipeline_matches_hand_computation() {
    let mut state = ashvale_state();
    state.opponent_averages = [
        ("Calder Rovers".to_string(), 11.4),
        ("Gilden Park".to_string(), 9.0),
    ]
    .into_iter()
    .collect();

    let mut factorials = Factorials::new();
    let snapshot = compute_snapshot(&state, &mut factorials);

    assert_eq!(snapshot.chart_title, "Ashvale United - Shots Analysis");
    assert_eq!(snapshot.points.len(), 6);

    // Oldest of the six-window first.
    assert_eq!(snapshot.points[0].opponent, "Brockton Athletic");
    assert_eq!(snapshot.points[0].value, 10.0);
    assert_eq!(snapshot.points[5].opponent, "Calder Rovers");
    assert_eq!(snapshot.points[5].value, 14.0);

    // The 31-shot spike sits past the medium threshold (mean 14.67, sd 7.50)
    // and is pulled to the midpoint.
    let spike = &snapshot.points[3];
    assert_eq!(spike.opponent, "Harrowgate");
    assert!(spike.smoothed);
    assert_eq!(spike.original_value, 31.0);
    assert_eq!(spike.value, 22.8);
    assert!(snapshot.points.iter().filter(|p| p.smoothed).count() == 1);

    // Trailing five-point averages over the dampened series.
    assert_eq!(snapshot.points[0].moving_average, 10.0);
    assert_eq!(snapshot.points[1].moving_average, 11.5);
    assert_eq!(snapshot.points[3].moving_average, 14.2);
    assert_eq!(snapshot.points[5].moving_average, 14.0);

    // Conceded overlay reads the lookup per opponent, zero when absent.
    assert_eq!(snapshot.points[5].average_against, 11.4);
    assert_eq!(snapshot.points[4].average_against, 9.0);
    assert_eq!(snapshot.points[2].average_against, 0.0);

    assert_eq!(snapshot.series_average, 13.3);
    assert_eq!(snapshot.hit_rate_5, 60.0);
    assert_eq!(snapshot.hit_rate_10, 50.0);
    assert_eq!(snapshot.hit_rate_15, 50.0);

    // Form and consistency run on the raw values, spike included.
    assert_eq!(snapshot.form.status, FormStatus::Neutral);
    assert_eq!(snapshot.form.difference, 0.9);
    assert_eq!(snapshot.form.recent5_avg, 15.6);
    assert_eq!(snapshot.form.overall_avg, 14.7);

    assert_eq!(snapshot.consistency.level, ConsistencyLevel::Low);
    assert_eq!(snapshot.consistency.coefficient, 51.1);
    assert_eq!(snapshot.consistency.std_dev, 7.5);
    assert_eq!(snapshot.consistency.mean, 14.7);

    // Splits cover the full fetch, not the chart window.
    assert_eq!(snapshot.conceded.home, 10.0);
    assert_eq!(snapshot.conceded.away, 12.0);

    // No opponent selected, so no price.
    assert!(!snapshot.odds.is_available());
}

#[test]
fn short_history_pads_the_oldest_end_and_dilutes_rates() {
    let mut state = ashvale_state();
    state.config.sample_size = 10;
    state.config.smoothing = false;

    let mut factorials = Factorials::new();
    let snapshot = compute_snapshot(&state, &mut factorials);

    assert_eq!(snapshot.points.len(), 10);
    assert!(snapshot.points[0].is_padding());
    assert!(snapshot.points[1].is_padding());
    assert!(!snapshot.points[2].is_padding());
    assert_eq!(snapshot.points[2].opponent, "Eastmere Town");

    // Padding zeroes join the window averages and rate denominators.
    assert_eq!(snapshot.series_average, 10.8);
    assert_eq!(snapshot.hit_rate_5, 60.0);
    assert_eq!(snapshot.hit_rate_10, 30.0);
}

#[test]
fn venue_filter_narrows_the_window_before_padding() {
    let mut state = ashvale_state();
    state.config.venue = VenueFilter::Home;
    state.config.smoothing = false;

    let mut factorials = Factorials::new();
    let snapshot = compute_snapshot(&state, &mut factorials);

    // Four home fixtures, two padding points on the oldest end.
    assert_eq!(snapshot.points.len(), 6);
    assert!(snapshot.points[0].is_padding());
    assert!(snapshot.points[1].is_padding());
    assert_eq!(snapshot.points[2].opponent, "Danesfort City");
    assert_eq!(snapshot.points[5].opponent, "Calder Rovers");
}

#[test]
fn combined_display_charts_totals_without_overlay() {
    let mut state = ashvale_state();
    state.config.display = DisplayOption::Combined;
    state.config.sample_size = 3;
    state.config.smoothing = false;
    state.opponent_averages = [("Calder Rovers".to_string(), 11.4)].into_iter().collect();

    let mut factorials = Factorials::new();
    let snapshot = compute_snapshot(&state, &mut factorials);

    assert_eq!(
        snapshot.chart_title,
        "Ashvale United - Total Shots per Match"
    );
    assert_eq!(snapshot.points[0].value, 41.0);
    assert_eq!(snapshot.points[1].value, 24.0);
    assert_eq!(snapshot.points[2].value, 22.0);
    assert!(snapshot.points.iter().all(|p| p.average_against == 0.0));
}

#[test]
fn conceded_display_tracks_its_own_trailing_average() {
    let mut state = ashvale_state();
    state.config.display = DisplayOption::AgainstA;
    state.config.sample_size = 4;
    state.config.smoothing = false;

    let mut factorials = Factorials::new();
    let snapshot = compute_snapshot(&state, &mut factorials);

    assert_eq!(
        snapshot.chart_title,
        "Ashvale United - Shots Conceded Analysis"
    );
    // Newest four conceded counts, oldest first: 11, 10, 15, 8.
    assert_eq!(snapshot.points[0].value, 11.0);
    assert_eq!(snapshot.points[3].value, 8.0);
    // The overlay follows the series itself rather than a lookup.
    assert_eq!(snapshot.points[0].average_against, 11.0);
    assert_eq!(snapshot.points[3].average_against, 11.0);
}

#[test]
fn odds_come_alive_with_an_opponent_and_a_baseline() {
    let mut state = ashvale_state();
    state.config.team_b = Some("Calder Rovers".to_string());
    state.league_averages = vec![shots_baseline(12.0)];
    state.team_b_matches = vec![
        rovers_match("2026-05-09", true, 10),
        rovers_match("2026-05-02", false, 12),
        rovers_match("2026-04-25", true, 11),
        rovers_match("2026-04-18", false, 15),
    ];

    let mut factorials = Factorials::new();
    let snapshot = compute_snapshot(&state, &mut factorials);

    // Dampened attack 13.3056, opposition concedes 12.0, baseline 12.0.
    assert!(snapshot.odds.is_available());
    assert_eq!(snapshot.odds.expected_value, 13.31);
    // A rate above the line prices the over below the under.
    assert!(snapshot.odds.over_odds > 1.0);
    assert!(snapshot.odds.under_odds > 1.0);
    assert!(snapshot.odds.over_odds < snapshot.odds.under_odds);
    assert!(snapshot.odds.over_implied_pct() > snapshot.odds.under_implied_pct());
}

#[test]
fn empty_team_a_fetch_yields_an_empty_chart() {
    let mut state = ashvale_state();
    state.team_a_matches.clear();

    let mut factorials = Factorials::new();
    let snapshot = compute_snapshot(&state, &mut factorials);

    assert!(snapshot.points.is_empty());
    assert_eq!(snapshot.series_average, 0.0);
    assert_eq!(snapshot.hit_rate_5, 0.0);
    assert_eq!(snapshot.form.status, FormStatus::Neutral);
    assert_eq!(snapshot.consistency.level, ConsistencyLevel::Neutral);
}
