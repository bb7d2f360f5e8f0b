/// Dampening factor per strength level. Unknown levels fall back to medium.
pub fn smoothing_factor(strength: u8) -> f64 {
    match strength {
        1 => 3.0,
        3 => 1.5,
        _ => 2.0,
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n, not n-1).
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedValue {
    pub value: f64,
    pub original: f64,
    pub smoothed: bool,
}

/// Chart-facing variant: an outlier is pulled to the midpoint between itself
/// and the series mean, rounded to one decimal. A deviation exactly at the
/// threshold passes through untouched.
pub fn smooth_series(values: &[f64], enabled: bool, strength: u8) -> Vec<SmoothedValue> {
    if !enabled || values.is_empty() {
        return values
            .iter()
            .map(|&v| SmoothedValue {
                value: v,
                original: v,
                smoothed: false,
            })
            .collect();
    }

    let m = mean(values);
    let threshold = smoothing_factor(strength) * population_std_dev(values);

    values
        .iter()
        .map(|&v| {
            if (v - m).abs() > threshold {
                SmoothedValue {
                    value: round1((v + m) / 2.0),
                    original: v,
                    smoothed: true,
                }
            } else {
                SmoothedValue {
                    value: v,
                    original: v,
                    smoothed: false,
                }
            }
        })
        .collect()
}

/// Model-facing variant: same threshold rule, but midpoints stay unrounded so
/// downstream averages keep full precision.
pub fn smooth_raw(values: &[f64], enabled: bool, strength: u8) -> Vec<f64> {
    if !enabled || values.is_empty() {
        return values.to_vec();
    }

    let m = mean(values);
    let threshold = smoothing_factor(strength) * population_std_dev(values);

    values
        .iter()
        .map(|&v| {
            if (v - m).abs() > threshold {
                (v + m) / 2.0
            } else {
                v
            }
        })
        .collect()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_levels() {
        assert_eq!(smoothing_factor(1), 3.0);
        assert_eq!(smoothing_factor(2), 2.0);
        assert_eq!(smoothing_factor(3), 1.5);
        assert_eq!(smoothing_factor(0), 2.0);
    }

    #[test]
    fn disabled_is_identity_with_flags_cleared() {
        let out = smooth_series(&[2.0, 3.0, 50.0], false, 3);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|s| !s.smoothed));
        assert_eq!(out[2].value, 50.0);
        assert_eq!(out[2].original, 50.0);
    }

    #[test]
    fn empty_series_yields_empty() {
        assert!(smooth_series(&[], true, 2).is_empty());
        assert!(smooth_raw(&[], true, 2).is_empty());
    }

    #[test]
    fn strong_strength_dampens_spike_to_midpoint() {
        // mean 12, population sd ~19.005, strong threshold ~28.51; the 50
        // deviates by 38 and gets pulled to (50 + 12) / 2.
        let out = smooth_series(&[2.0, 3.0, 2.0, 50.0, 3.0], true, 3);
        assert!(out[3].smoothed);
        assert_eq!(out[3].value, 31.0);
        assert_eq!(out[3].original, 50.0);
        assert!(out.iter().take(3).all(|s| !s.smoothed));
    }

    #[test]
    fn deviation_at_exactly_threshold_is_not_smoothed() {
        // Medium threshold is 2 * 19.005 = 38.01; the spike's deviation of 38
        // falls just inside and must survive untouched.
        let out = smooth_series(&[2.0, 3.0, 2.0, 50.0, 3.0], true, 2);
        assert!(out.iter().all(|s| !s.smoothed));
        assert_eq!(out[3].value, 50.0);
    }

    #[test]
    fn constant_series_never_smooths() {
        // Zero variance means zero threshold, and zero deviation is not
        // strictly greater than it.
        let out = smooth_series(&[7.0, 7.0, 7.0, 7.0], true, 3);
        assert!(out.iter().all(|s| !s.smoothed));
    }

    #[test]
    fn smoothing_is_not_idempotent() {
        // Pass one shrinks the spread, so its output recomputes to a tighter
        // threshold and the dampened spike can be caught again: 50 -> 31 ->
        // 19.6 at strong strength.
        let once = smooth_series(&[2.0, 3.0, 2.0, 50.0, 3.0], true, 3);
        let values: Vec<f64> = once.iter().map(|s| s.value).collect();
        let twice = smooth_series(&values, true, 3);
        assert!(twice[3].smoothed);
        assert_eq!(twice[3].value, 19.6);
    }

    #[test]
    fn raw_variant_keeps_unrounded_midpoint() {
        // mean 2.25, sd ~3.897, strong threshold ~5.846; 9 deviates by 6.75.
        let raw = smooth_raw(&[0.0, 0.0, 0.0, 9.0], true, 3);
        assert!((raw[3] - 5.625).abs() < 1e-12);

        let chart = smooth_series(&[0.0, 0.0, 0.0, 9.0], true, 3);
        assert_eq!(chart[3].value, 5.6);
    }

    #[test]
    fn population_std_dev_matches_hand_computation() {
        let sd = population_std_dev(&[2.0, 3.0, 2.0, 50.0, 3.0]);
        assert!((sd - 361.2f64.sqrt()).abs() < 1e-9);
    }
}
