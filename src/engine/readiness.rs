//! Readiness score from a trailing biometrics window
//!
//! Each metric is scored against the athlete's own recent baseline
//! (z-score over the preceding days in the window), the z-scores are
//! combined with fixed weights, and the result is mapped onto 0-100.
//! Metrics without a usable baseline are dropped; with none left the
//! score is `None` and callers fall back to the neutral default.

use chrono::{Duration, NaiveDate};

use crate::config::ReadinessConfig;
use crate::model::DailyBiometrics;

/// Bound on a single metric's contribution, in standard deviations
const MAX_Z: f64 = 3.0;

/// Floor on the baseline spread, as a fraction of the baseline mean
const MIN_RELATIVE_SD: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Sleep,
    RestingHeartRate,
    Hrv,
}

impl Metric {
    const ALL: [Metric; 3] = [Metric::Sleep, Metric::RestingHeartRate, Metric::Hrv];

    fn value(&self, day: &DailyBiometrics) -> Option<f64> {
        let v = match self {
            Metric::Sleep => day.sleep_minutes,
            Metric::RestingHeartRate => day.resting_heart_rate,
            Metric::Hrv => day.hrv_ms,
        }?;
        (v.is_finite() && v > 0.0).then_some(v)
    }

    /// Lower resting heart rate is better; everything else higher is better
    fn polarity(&self) -> f64 {
        match self {
            Metric::RestingHeartRate => -1.0,
            _ => 1.0,
        }
    }

    fn weight(&self, config: &ReadinessConfig) -> f64 {
        match self {
            Metric::Sleep => config.sleep_weight,
            Metric::RestingHeartRate => config.resting_hr_weight,
            Metric::Hrv => config.hrv_weight,
        }
    }
}

/// Pure readiness calculator
#[derive(Debug, Clone)]
pub struct ReadinessCalculator {
    config: ReadinessConfig,
}

impl ReadinessCalculator {
    pub fn new(config: &ReadinessConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    /// Score for `reference`, or None when no metric is usable
    pub fn score(&self, window: &[DailyBiometrics], reference: NaiveDate) -> Option<u8> {
        let earliest = reference - Duration::days(self.config.window_days);
        let in_window: Vec<&DailyBiometrics> = window
            .iter()
            .filter(|d| d.date > earliest && d.date <= reference)
            .collect();

        let today = in_window.iter().filter(|d| d.date == reference).last()?;
        let baseline: Vec<&DailyBiometrics> = in_window
            .iter()
            .copied()
            .filter(|d| d.date < reference)
            .collect();

        let mut weighted = 0.0;
        let mut total_weight = 0.0;

        for metric in Metric::ALL {
            let weight = metric.weight(&self.config);
            if weight <= 0.0 {
                continue;
            }
            let Some(value) = metric.value(today) else {
                continue;
            };
            let history: Vec<f64> = baseline.iter().filter_map(|d| metric.value(d)).collect();
            if history.len() < self.config.min_baseline_samples {
                continue;
            }

            let mean = history.iter().sum::<f64>() / history.len() as f64;
            let variance = history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / history.len() as f64;
            let sd = variance.sqrt().max(mean * MIN_RELATIVE_SD);
            let z = ((value - mean) / sd * metric.polarity()).clamp(-MAX_Z, MAX_Z);

            weighted += weight * z;
            total_weight += weight;
        }

        if total_weight <= 0.0 {
            return None;
        }

        let combined = weighted / total_weight;
        let score = self.config.baseline_score + self.config.points_per_sd * combined;
        Some(score.round().clamp(0.0, 100.0) as u8)
    }

    /// Score or the configured neutral default, plus whether it was measured
    pub fn score_or_default(&self, window: &[DailyBiometrics], reference: NaiveDate) -> (u8, bool) {
        match self.score(window, reference) {
            Some(score) => (score, true),
            None => (self.config.neutral_default, false),
        }
    }

    /// Measured scores for the `days` days before `reference`, oldest first
    pub fn recent_scores(&self, window: &[DailyBiometrics], reference: NaiveDate, days: i64) -> Vec<u8> {
        (1..=days)
            .rev()
            .filter_map(|back| self.score(window, reference - Duration::days(back)))
            .collect()
    }
}
