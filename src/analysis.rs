use crate::insights::{self, ConcededSplit, ConsistencyReport, FormReport};
use crate::series::{self, HIT_RATE_WINDOWS};
use crate::state::{AnalysisConfig, AppState, ChartPoint, DisplayOption};
use crate::true_odds::{self, Factorials, OddsEstimate};

/// Everything one pipeline run derives from the current inputs.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSnapshot {
    pub points: Vec<ChartPoint>,
    pub series_average: f64,
    pub hit_rate_5: f64,
    pub hit_rate_10: f64,
    pub hit_rate_15: f64,
    pub form: FormReport,
    pub consistency: ConsistencyReport,
    pub conceded: ConcededSplit,
    pub odds: OddsEstimate,
    pub chart_title: String,
}

pub fn chart_title(config: &AnalysisConfig) -> String {
    let stat = config.category.label();
    match (&config.team_a, config.display) {
        (Some(team), DisplayOption::ForA) => format!("{team} - {stat} Analysis"),
        (Some(team), DisplayOption::AgainstA) => format!("{team} - {stat} Conceded Analysis"),
        (Some(team), DisplayOption::Combined) => format!("{team} - Total {stat} per Match"),
        (None, _) => format!("{stat} Analysis"),
    }
}

/// Runs the full pipeline against the current inputs. Pure apart from the
/// factorial memo, which only grows.
pub fn compute_snapshot(state: &AppState, factorials: &mut Factorials) -> AnalysisSnapshot {
    let config = &state.config;

    // No matches at all means an empty chart, not a full window of padding.
    let mut points: Vec<ChartPoint> = if state.team_a_matches.is_empty() {
        Vec::new()
    } else {
        series::build_series(
            &state.team_a_matches,
            config.category,
            config.display,
            config.venue,
            config.sample_size,
        )
    };
    series::apply_smoothing(&mut points, config.smoothing, config.smoothing_strength);
    series::apply_moving_average(&mut points);
    series::apply_average_against(&mut points, config.display, &state.opponent_averages);

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let [hit_rate_5, hit_rate_10, hit_rate_15] =
        HIT_RATE_WINDOWS.map(|window| series::hit_rate(&values, config.line, window));

    AnalysisSnapshot {
        series_average: series::series_average(&points),
        hit_rate_5,
        hit_rate_10,
        hit_rate_15,
        form: insights::form_report(
            &state.team_a_matches,
            config.category,
            config.display,
            config.venue,
            config.sample_size,
        ),
        consistency: insights::consistency_report(
            &state.team_a_matches,
            config.category,
            config.display,
            config.venue,
            config.sample_size,
        ),
        conceded: insights::conceded_split(&state.team_a_matches, config.category),
        odds: true_odds::estimate(
            &state.team_a_matches,
            &state.team_b_matches,
            &state.league_averages,
            config,
            factorials,
        ),
        chart_title: chart_title(config),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StatCategory;

    #[test]
    fn empty_state_yields_neutral_snapshot() {
        let state = AppState::new();
        let mut factorials = Factorials::new();
        let snapshot = compute_snapshot(&state, &mut factorials);
        assert!(snapshot.points.is_empty());
        assert_eq!(snapshot.series_average, 0.0);
        assert_eq!(snapshot.hit_rate_10, 0.0);
        assert!(!snapshot.odds.is_available());
        assert_eq!(snapshot.chart_title, "Shots Analysis");
    }

    #[test]
    fn chart_title_tracks_display_option() {
        let mut config = AnalysisConfig::default();
        config.team_a = Some("Alpha".to_string());
        config.category = StatCategory::Corners;
        assert_eq!(chart_title(&config), "Alpha - Corners Analysis");
        config.display = DisplayOption::AgainstA;
        assert_eq!(chart_title(&config), "Alpha - Corners Conceded Analysis");
        config.display = DisplayOption::Combined;
        assert_eq!(chart_title(&config), "Alpha - Total Corners per Match");
    }
}
