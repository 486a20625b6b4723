//! e1RM estimation (Brzycki) and trend classification (linfa)

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use crate::model::{E1rmSample, E1rmTrend};

/// Reps at or above 37 make Brzycki blow up; clamp to this
pub const MAX_BRZYCKI_REPS: u32 = 36;

/// Minimum data points required for a trend
const MIN_DATA_POINTS: usize = 3;

/// Samples kept in the regression window
const MAX_FIT_POINTS: usize = 8;

/// Samples averaged into the rolling estimate
const ROLLING_WINDOW: usize = 3;

/// Relative change that counts as signal rather than noise
const NOISE_THRESHOLD: f64 = 0.02;

/// Brzycki one-rep-max estimate; 0 for empty or degenerate sets
pub fn brzycki(weight: f64, reps: u32) -> f64 {
    if !weight.is_finite() || weight <= 0.0 || reps == 0 {
        return 0.0;
    }
    let reps = reps.min(MAX_BRZYCKI_REPS) as f64;
    weight * 36.0 / (37.0 - reps)
}

/// Best estimate across (weight, reps) observations, most recent last
pub fn best_e1rm(observations: &[(f64, u32)]) -> Option<f64> {
    observations
        .iter()
        .map(|(w, r)| brzycki(*w, *r))
        .filter(|e| e.is_finite() && *e > 0.0)
        .max_by(|a, b| a.total_cmp(b))
}

/// Mean of the newest few session estimates
pub fn rolling_e1rm(history: &[E1rmSample]) -> Option<f64> {
    let recent: Vec<f64> = history
        .iter()
        .rev()
        .take(ROLLING_WINDOW)
        .map(|s| s.e1rm)
        .filter(|e| e.is_finite() && *e > 0.0)
        .collect();

    if recent.is_empty() {
        None
    } else {
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }
}

/// Fitted trend details, kept for insights and debugging
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFit {
    pub trend: E1rmTrend,
    /// Recent-window mean relative to the older baseline window
    pub relative_change: f64,
    /// Regression slope in e1RM units per week, when a fit was possible
    pub slope_per_week: Option<f64>,
    pub data_points: usize,
}

/// Classify a multi-session e1RM history (oldest first)
pub fn classify_trend(history: &[E1rmSample]) -> TrendFit {
    let samples: Vec<&E1rmSample> = history
        .iter()
        .filter(|s| s.e1rm.is_finite() && s.e1rm > 0.0)
        .collect();
    let samples = &samples[samples.len().saturating_sub(MAX_FIT_POINTS)..];

    if samples.len() < MIN_DATA_POINTS {
        return TrendFit {
            trend: E1rmTrend::Insufficient,
            relative_change: 0.0,
            slope_per_week: None,
            data_points: samples.len(),
        };
    }

    let recent_len = (samples.len() / 2).clamp(1, ROLLING_WINDOW);
    let (baseline, recent) = samples.split_at(samples.len() - recent_len);
    let mean = |xs: &[&E1rmSample]| xs.iter().map(|s| s.e1rm).sum::<f64>() / xs.len() as f64;
    let baseline_mean = mean(baseline);
    let relative_change = (mean(recent) - baseline_mean) / baseline_mean;

    let slope_per_week = fit_slope(samples).map(|per_day| per_day * 7.0);

    let trend = if relative_change > NOISE_THRESHOLD && slope_per_week.is_none_or(|s| s > 0.0) {
        E1rmTrend::Improving
    } else if relative_change < -NOISE_THRESHOLD && slope_per_week.is_none_or(|s| s < 0.0) {
        E1rmTrend::Declining
    } else {
        E1rmTrend::Stable
    };

    TrendFit {
        trend,
        relative_change,
        slope_per_week,
        data_points: samples.len(),
    }
}

/// Least-squares slope (e1RM per day) via linfa; None when x is degenerate
fn fit_slope(samples: &[&E1rmSample]) -> Option<f64> {
    let first = samples.first()?.at;
    let x_data: Vec<f64> = samples
        .iter()
        .map(|s| (s.at - first).num_seconds() as f64 / 86_400.0)
        .collect();

    let spread = x_data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        - x_data.iter().cloned().fold(f64::INFINITY, f64::min);
    if spread < 1e-6 {
        return None;
    }

    let y_data: Vec<f64> = samples.iter().map(|s| s.e1rm).collect();
    let records = Array2::from_shape_vec((x_data.len(), 1), x_data).ok()?;
    let targets = Array1::from_vec(y_data);
    let dataset = Dataset::new(records, targets);

    let model = LinearRegression::default().fit(&dataset).ok()?;
    let slope = model.params()[0];
    slope.is_finite().then_some(slope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: &[f64]) -> Vec<E1rmSample> {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| E1rmSample {
                at: start + Duration::days(3 * i as i64),
                e1rm: *v,
            })
            .collect()
    }

    #[test]
    fn test_brzycki_single_rep_is_weight() {
        assert!((brzycki(200.0, 1) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_brzycki_known_value() {
        // 100 x 10 => 100 * 36 / 27
        assert!((brzycki(100.0, 10) - 133.333_333).abs() < 1e-3);
    }

    #[test]
    fn test_brzycki_clamps_high_reps() {
        let at_ceiling = brzycki(50.0, 36);
        assert_eq!(brzycki(50.0, 37), at_ceiling);
        assert_eq!(brzycki(50.0, 500), at_ceiling);
        assert!(at_ceiling.is_finite() && at_ceiling > 0.0);
    }

    #[test]
    fn test_brzycki_degenerate_inputs() {
        assert_eq!(brzycki(0.0, 5), 0.0);
        assert_eq!(brzycki(-10.0, 5), 0.0);
        assert_eq!(brzycki(f64::NAN, 5), 0.0);
        assert_eq!(brzycki(100.0, 0), 0.0);
    }

    #[test]
    fn test_best_e1rm() {
        assert!(best_e1rm(&[]).is_none());
        let best = best_e1rm(&[(100.0, 10), (120.0, 5), (0.0, 3)]).unwrap();
        assert!((best - 120.0 * 36.0 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_e1rm_uses_newest() {
        let history = series(&[100.0, 200.0, 210.0, 220.0]);
        assert_eq!(rolling_e1rm(&history), Some(210.0));
        assert_eq!(rolling_e1rm(&[]), None);
    }

    #[test]
    fn test_trend_insufficient() {
        assert_eq!(classify_trend(&series(&[100.0, 105.0])).trend, E1rmTrend::Insufficient);
        assert_eq!(classify_trend(&[]).trend, E1rmTrend::Insufficient);
    }

    #[test]
    fn test_trend_improving() {
        let fit = classify_trend(&series(&[100.0, 103.0, 106.0, 109.0, 112.0, 115.0]));
        assert_eq!(fit.trend, E1rmTrend::Improving);
        assert!(fit.slope_per_week.unwrap() > 0.0);
    }

    #[test]
    fn test_trend_declining() {
        let fit = classify_trend(&series(&[120.0, 117.0, 114.0, 110.0, 107.0]));
        assert_eq!(fit.trend, E1rmTrend::Declining);
    }

    #[test]
    fn test_trend_stable_within_noise() {
        let fit = classify_trend(&series(&[150.0, 151.0, 149.5, 150.5, 150.0, 149.8]));
        assert_eq!(fit.trend, E1rmTrend::Stable);
    }

    #[test]
    fn test_trend_same_timestamp_falls_back_to_windows() {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap();
        let history: Vec<E1rmSample> = [100.0, 100.0, 120.0]
            .iter()
            .map(|v| E1rmSample { at, e1rm: *v })
            .collect();
        let fit = classify_trend(&history);
        assert!(fit.slope_per_week.is_none());
        assert_eq!(fit.trend, E1rmTrend::Improving);
    }
}
