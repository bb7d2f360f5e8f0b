use crate::series::{display_value, windowed_matches};
use crate::smoothing::{mean, population_std_dev};
use crate::state::{DisplayOption, MatchRecord, StatCategory, VenueFilter};

/// Matches in the recent-form window.
const RECENT_WINDOW: usize = 5;
/// Absolute difference between recent and overall average that flips form
/// away from neutral.
const FORM_THRESHOLD: f64 = 2.5;

/// Minimum points before a coefficient of variation is worth reporting.
const CONSISTENCY_MIN_POINTS: usize = 3;
const CV_HIGH_BELOW: f64 = 25.0;
const CV_MEDIUM_BELOW: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStatus {
    Strong,
    Weak,
    #[default]
    Neutral,
}

impl FormStatus {
    pub fn label(self) -> &'static str {
        match self {
            FormStatus::Strong => "Strong",
            FormStatus::Weak => "Weak",
            FormStatus::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormReport {
    pub status: FormStatus,
    pub difference: f64,
    pub recent5_avg: f64,
    pub overall_avg: f64,
}

/// Recent-five average against the whole windowed sample, on raw values.
/// Smoothing never feeds this; form should see the spikes.
pub fn form_report(
    matches: &[MatchRecord],
    category: StatCategory,
    display: DisplayOption,
    venue: VenueFilter,
    n: usize,
) -> FormReport {
    let all: Vec<f64> = windowed_matches(matches, venue, n)
        .into_iter()
        .map(|m| display_value(m, category, display))
        .collect();
    let recent = &all[..all.len().min(RECENT_WINDOW)];

    if recent.is_empty() || all.is_empty() {
        return FormReport::default();
    }

    let recent5_avg = mean(recent);
    let overall_avg = mean(&all);
    let difference = recent5_avg - overall_avg;

    let status = if difference > FORM_THRESHOLD {
        FormStatus::Strong
    } else if difference < -FORM_THRESHOLD {
        FormStatus::Weak
    } else {
        FormStatus::Neutral
    };

    FormReport {
        status,
        difference: round1(difference),
        recent5_avg: round1(recent5_avg),
        overall_avg: round1(overall_avg),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyLevel {
    High,
    Medium,
    Low,
    #[default]
    Neutral,
}

impl ConsistencyLevel {
    pub fn label(self) -> &'static str {
        match self {
            ConsistencyLevel::High => "High",
            ConsistencyLevel::Medium => "Medium",
            ConsistencyLevel::Low => "Low",
            ConsistencyLevel::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConsistencyReport {
    pub level: ConsistencyLevel,
    /// Standard deviation as a percentage of the mean.
    pub coefficient: f64,
    pub std_dev: f64,
    pub mean: f64,
}

pub fn consistency_report(
    matches: &[MatchRecord],
    category: StatCategory,
    display: DisplayOption,
    venue: VenueFilter,
    n: usize,
) -> ConsistencyReport {
    let all: Vec<f64> = windowed_matches(matches, venue, n)
        .into_iter()
        .map(|m| display_value(m, category, display))
        .collect();

    if all.len() < CONSISTENCY_MIN_POINTS {
        return ConsistencyReport::default();
    }

    let m = mean(&all);
    let sd = population_std_dev(&all);
    let coefficient = if m > 0.0 { sd / m * 100.0 } else { 0.0 };

    let level = if coefficient < CV_HIGH_BELOW {
        ConsistencyLevel::High
    } else if coefficient < CV_MEDIUM_BELOW {
        ConsistencyLevel::Medium
    } else {
        ConsistencyLevel::Low
    };

    ConsistencyReport {
        level,
        coefficient: round1(coefficient),
        std_dev: round1(sd),
        mean: round1(m),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConcededSplit {
    pub home: f64,
    pub away: f64,
}

/// Average conceded per venue over every fetched match. Ignores the venue
/// filter and the sample window; both splits are always reported.
pub fn conceded_split(matches: &[MatchRecord], category: StatCategory) -> ConcededSplit {
    let home: Vec<f64> = matches
        .iter()
        .filter(|m| m.is_home)
        .map(|m| f64::from(m.stat_against(category)))
        .collect();
    let away: Vec<f64> = matches
        .iter()
        .filter(|m| !m.is_home)
        .map(|m| f64::from(m.stat_against(category)))
        .collect();

    ConcededSplit {
        home: round1(mean(&home)),
        away: round1(mean(&away)),
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
