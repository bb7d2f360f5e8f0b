use std::collections::HashMap;

use crate::smoothing;
use crate::state::{ChartPoint, DisplayOption, MatchRecord, StatCategory, VenueFilter};

/// Trailing window for the moving-average line and the conceded overlay.
pub const MOVING_WINDOW: usize = 5;

pub const HIT_RATE_WINDOWS: [usize; 3] = [5, 10, 15];

/// Venue-filtered matches, newest first, at most `n`.
pub fn windowed_matches<'a>(
    matches: &'a [MatchRecord],
    venue: VenueFilter,
    n: usize,
) -> Vec<&'a MatchRecord> {
    let mut rows: Vec<&MatchRecord> = matches
        .iter()
        .filter(|m| venue.admits(m.is_home))
        .collect();
    rows.sort_by(|a, b| b.match_date.cmp(&a.match_date));
    rows.truncate(n);
    rows
}

pub fn display_value(m: &MatchRecord, category: StatCategory, display: DisplayOption) -> f64 {
    match display {
        DisplayOption::ForA => f64::from(m.stat_for(category)),
        DisplayOption::AgainstA => f64::from(m.stat_against(category)),
        DisplayOption::Combined => f64::from(m.stat_total(category)),
    }
}

/// Projects team A's matches into a chronologically ascending series of
/// exactly `n` points. Short histories are padded with zero-valued,
/// label-less points at the oldest end.
pub fn build_series(
    matches: &[MatchRecord],
    category: StatCategory,
    display: DisplayOption,
    venue: VenueFilter,
    n: usize,
) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = windowed_matches(matches, venue, n)
        .into_iter()
        .map(|m| ChartPoint {
            match_date: Some(m.match_date),
            opponent: if m.opponent.is_empty() {
                "Unknown".to_string()
            } else {
                m.opponent.clone()
            },
            value: display_value(m, category, display),
            ..ChartPoint::default()
        })
        .collect();

    while points.len() < n {
        points.push(ChartPoint::default());
    }
    points.reverse();
    points
}

pub fn apply_smoothing(points: &mut [ChartPoint], enabled: bool, strength: u8) {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let smoothed = smoothing::smooth_series(&values, enabled, strength);
    for (point, s) in points.iter_mut().zip(smoothed) {
        point.value = s.value;
        point.original_value = s.original;
        point.smoothed = s.smoothed;
    }
}

/// Trailing five-point average per bar, one decimal.
pub fn apply_moving_average(points: &mut [ChartPoint]) {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    for (i, point) in points.iter_mut().enumerate() {
        let start = i.saturating_sub(MOVING_WINDOW - 1);
        let window = &values[start..=i];
        point.moving_average = round1(window.iter().sum::<f64>() / window.len() as f64);
    }
}

/// Conceded overlay per display option: ForA reads the fetched per-opponent
/// averages (0 when the lookup has no entry), AgainstA tracks the trailing
/// five-point average of the series itself, Combined carries none.
pub fn apply_average_against(
    points: &mut [ChartPoint],
    display: DisplayOption,
    lookup: &HashMap<String, f64>,
) {
    match display {
        DisplayOption::AgainstA => {
            let values: Vec<f64> = points.iter().map(|p| p.value).collect();
            for (i, point) in points.iter_mut().enumerate() {
                let start = i.saturating_sub(MOVING_WINDOW - 1);
                let window = &values[start..=i];
                point.average_against = round1(window.iter().sum::<f64>() / window.len() as f64);
            }
        }
        DisplayOption::ForA => {
            for point in points.iter_mut() {
                point.average_against = if point.opponent.is_empty() {
                    0.0
                } else {
                    lookup.get(&point.opponent).copied().unwrap_or(0.0)
                };
            }
        }
        DisplayOption::Combined => {}
    }
}

/// Mean of the windowed chart values, one decimal.
pub fn series_average(points: &[ChartPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    round1(points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64)
}

/// Share of the trailing `window` values strictly above the line, in percent.
/// Shorter series use every available value as the denominator.
pub fn hit_rate(values: &[f64], line: f64, window: usize) -> f64 {
    if values.is_empty() || window == 0 {
        return 0.0;
    }
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    let hits = tail.iter().filter(|&&v| v > line).count();
    hits as f64 / tail.len() as f64 * 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
