use crate::series::windowed_matches;
use crate::smoothing::{mean, smooth_raw};
use crate::state::{
    AnalysisConfig, DisplayOption, LeagueAverage, MatchRecord, StatCategory, league_baseline,
};

/// Price returned when the exceedance probability collapses below one in a
/// thousand.
pub const ODDS_CAP: f64 = 999.0;
const MIN_PROBABILITY: f64 = 0.001;

/// Grow-only factorial memo. Thresholds are bounded by the line sliders, so
/// the cache stays tiny and every value is computed once.
#[derive(Debug, Clone)]
pub struct Factorials {
    cache: Vec<f64>,
}

impl Default for Factorials {
    fn default() -> Self {
        Self::new()
    }
}

impl Factorials {
    pub fn new() -> Self {
        Self {
            cache: vec![1.0, 1.0],
        }
    }

    pub fn get(&mut self, n: usize) -> f64 {
        while self.cache.len() <= n {
            let next = self.cache[self.cache.len() - 1] * self.cache.len() as f64;
            self.cache.push(next);
        }
        self.cache[n]
    }
}

pub fn poisson_pmf(lambda: f64, k: usize, factorials: &mut Factorials) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    lambda.powi(k as i32) * (-lambda).exp() / factorials.get(k)
}

/// P(X > threshold) for X ~ Poisson(lambda), clamped into [0, 1].
pub fn poisson_over_probability(lambda: f64, threshold: f64, factorials: &mut Factorials) -> f64 {
    if lambda <= 0.0 {
        return 0.0;
    }
    if threshold < 0.0 {
        return 1.0;
    }

    let mut cumulative = 0.0;
    for k in 0..=threshold.floor() as usize {
        cumulative += poisson_pmf(lambda, k, factorials);
    }
    (1.0 - cumulative).clamp(0.0, 1.0)
}

/// Decimal odds for a probability: capped at 999.00 below the minimum, 1.00
/// at certainty, otherwise 1/p rounded to two decimals.
pub fn probability_to_odds(probability: f64) -> f64 {
    if probability < MIN_PROBABILITY {
        return ODDS_CAP;
    }
    if probability >= 1.0 {
        return 1.0;
    }
    round2(1.0 / probability)
}

/// Over/under prices plus the Poisson rate behind them. All-zero means the
/// inputs could not support an estimate; callers must not read zeros as a
/// legitimate price.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OddsEstimate {
    pub over_odds: f64,
    pub under_odds: f64,
    pub expected_value: f64,
}

impl OddsEstimate {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.over_odds > 0.0
    }

    /// Implied probability of the over price, in percent.
    pub fn over_implied_pct(&self) -> f64 {
        if self.over_odds > 0.0 {
            100.0 / self.over_odds
        } else {
            0.0
        }
    }

    pub fn under_implied_pct(&self) -> f64 {
        if self.under_odds > 0.0 {
            100.0 / self.under_odds
        } else {
            0.0
        }
    }
}

fn smoothed_values(
    rows: &[&MatchRecord],
    category: StatCategory,
    against: bool,
    enabled: bool,
    strength: u8,
) -> Vec<f64> {
    let raw: Vec<f64> = rows
        .iter()
        .map(|m| {
            if against {
                f64::from(m.stat_against(category))
            } else {
                f64::from(m.stat_for(category))
            }
        })
        .collect();
    smooth_raw(&raw, enabled, strength)
}

/// Estimates the exceedance odds for the current selection. Team A uses the
/// global sample window, Team B its override when one is set; both sides see
/// the venue filter and, when enabled, outlier smoothing on the raw values.
pub fn estimate(
    team_a: &[MatchRecord],
    team_b: &[MatchRecord],
    averages: &[LeagueAverage],
    config: &AnalysisConfig,
    factorials: &mut Factorials,
) -> OddsEstimate {
    if config.team_a.is_none()
        || config.team_b.is_none()
        || averages.is_empty()
        || team_a.is_empty()
        || team_b.is_empty()
    {
        return OddsEstimate::unavailable();
    }

    let rows_a = windowed_matches(team_a, config.venue, config.sample_size);
    let rows_b = windowed_matches(team_b, config.venue, config.effective_team_b_sample());
    if rows_a.is_empty() || rows_b.is_empty() {
        return OddsEstimate::unavailable();
    }

    let category = config.category;
    let smoothing = config.smoothing;
    let strength = config.smoothing_strength;

    let baseline = league_baseline(averages, category);
    if baseline <= 0.0 {
        return OddsEstimate::unavailable();
    }

    let lambda = match config.display {
        DisplayOption::ForA => {
            let a_avg = mean(&smoothed_values(&rows_a, category, false, smoothing, strength));
            let b_avg = mean(&smoothed_values(&rows_b, category, true, smoothing, strength));
            a_avg * b_avg / baseline
        }
        DisplayOption::AgainstA => {
            let a_avg = mean(&smoothed_values(&rows_a, category, true, smoothing, strength));
            let b_avg = mean(&smoothed_values(&rows_b, category, false, smoothing, strength));
            a_avg * b_avg / baseline
        }
        DisplayOption::Combined => {
            let a_total = mean(&smoothed_values(&rows_a, category, false, smoothing, strength))
                + mean(&smoothed_values(&rows_a, category, true, smoothing, strength));
            let b_total = mean(&smoothed_values(&rows_b, category, false, smoothing, strength))
                + mean(&smoothed_values(&rows_b, category, true, smoothing, strength));
            a_total * b_total / (2.0 * baseline)
        }
    };

    let over_probability = poisson_over_probability(lambda, config.line, factorials);

    OddsEstimate {
        over_odds: probability_to_odds(over_probability),
        under_odds: probability_to_odds(1.0 - over_probability),
        expected_value: round2(lambda),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorials_grow_incrementally() {
        let mut f = Factorials::new();
        assert_eq!(f.get(0), 1.0);
        assert_eq!(f.get(1), 1.0);
        assert_eq!(f.get(5), 120.0);
        assert_eq!(f.get(3), 6.0);
        assert_eq!(f.get(10), 3_628_800.0);
    }

    #[test]
    fn pmf_matches_closed_form() {
        let mut f = Factorials::new();
        // P(X = 2) for lambda 1.44 is 1.44^2 e^-1.44 / 2.
        let expected = 1.44f64.powi(2) * (-1.44f64).exp() / 2.0;
        assert!((poisson_pmf(1.44, 2, &mut f) - expected).abs() < 1e-12);
        assert_eq!(poisson_pmf(0.0, 2, &mut f), 0.0);
    }

    #[test]
    fn over_probability_non_increasing_in_threshold() {
        let mut f = Factorials::new();
        let mut last = 1.0;
        for t in [0.5, 1.5, 2.5, 5.5, 10.5] {
            let p = poisson_over_probability(2.3, t, &mut f);
            assert!(p <= last + 1e-12);
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
    }

    #[test]
    fn over_probability_degenerate_rates() {
        let mut f = Factorials::new();
        assert_eq!(poisson_over_probability(0.0, 2.5, &mut f), 0.0);
        assert_eq!(poisson_over_probability(-1.0, 2.5, &mut f), 0.0);
        assert_eq!(poisson_over_probability(1.0, -0.5, &mut f), 1.0);
    }

    #[test]
    fn odds_conversion_caps_and_rounds() {
        assert_eq!(probability_to_odds(0.0), ODDS_CAP);
        assert_eq!(probability_to_odds(0.0009), ODDS_CAP);
        assert_eq!(probability_to_odds(1.0), 1.0);
        assert_eq!(probability_to_odds(1.7), 1.0);
        assert_eq!(probability_to_odds(0.5), 2.0);
        assert_eq!(probability_to_odds(0.3), 3.33);
    }

    #[test]
    fn odds_inverse_roundtrip_within_rounding() {
        for p in [0.01, 0.2, 0.4, 0.65, 0.9, 0.999] {
            let odds = probability_to_odds(p);
            assert!((odds * p - 1.0).abs() < 0.01, "p={p} odds={odds}");
        }
    }

    #[test]
    fn unavailable_state_reads_as_not_available() {
        let odds = OddsEstimate::unavailable();
        assert!(!odds.is_available());
        assert_eq!(odds.over_implied_pct(), 0.0);
        assert_eq!(odds.under_implied_pct(), 0.0);
    }
}
