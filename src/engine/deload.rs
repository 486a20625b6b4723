//! Deload and safety rules layered over double progression
//!
//! - failure threshold: repeated misses cut the stored working weight
//! - planned deload week: session-only cut, same factor
//! - training break: one-time cut on the first exposure after a long gap
//! - readiness cut: small session-only cut on a low-readiness day
//!
//! Every weight leaving this module is finite and non-negative.

use serde::{Deserialize, Serialize};

use crate::config::DeloadConfig;
use crate::model::ProgressionRules;

/// Why a load was reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeloadReason {
    FailureThreshold,
    PlannedWeek,
    TrainingBreak,
    LowReadiness,
}

impl DeloadReason {
    pub fn label(&self) -> &'static str {
        match self {
            DeloadReason::FailureThreshold => "failure_threshold",
            DeloadReason::PlannedWeek => "planned_week",
            DeloadReason::TrainingBreak => "training_break",
            DeloadReason::LowReadiness => "low_readiness",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DeloadReason::FailureThreshold => "repeated misses at this weight",
            DeloadReason::PlannedWeek => "scheduled deload week",
            DeloadReason::TrainingBreak => "returning after a long break",
            DeloadReason::LowReadiness => "low readiness today",
        }
    }
}

/// Clamp any computed weight into the storable domain
pub fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 { weight } else { 0.0 }
}

/// Result of registering one failed exposure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureAccounting {
    pub next_weight: f64,
    pub failures_count: u32,
    pub deloaded: bool,
}

/// Count a failure; deload and reset once the threshold is reached
pub fn register_failure(weight: f64, failures_count: u32, rules: &ProgressionRules) -> FailureAccounting {
    let weight = sanitize_weight(weight);
    let threshold = rules.failure_threshold.max(1);
    let failures = failures_count.saturating_add(1);

    if failures >= threshold {
        FailureAccounting {
            next_weight: sanitize_weight(weight * rules.deload_factor.clamp(0.0, 1.0)),
            failures_count: 0,
            deloaded: true,
        }
    } else {
        FailureAccounting {
            next_weight: weight,
            failures_count: failures,
            deloaded: false,
        }
    }
}

/// Conditions known before a session starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConditions {
    pub planned_deload: bool,
    /// Session-level deload for a critical readiness day
    pub critical_readiness: bool,
    pub days_since_last_exposure: Option<i64>,
    pub readiness: u8,
    pub readiness_measured: bool,
}

/// Load multipliers for one planned exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadAdjustment {
    /// Persisted: the break reset becomes the new working weight
    pub base_multiplier: f64,
    /// Today only: deload week and readiness cuts
    pub session_multiplier: f64,
    pub reasons: Vec<DeloadReason>,
    pub deload_in_effect: bool,
}

impl LoadAdjustment {
    pub fn none() -> Self {
        Self {
            base_multiplier: 1.0,
            session_multiplier: 1.0,
            reasons: Vec::new(),
            deload_in_effect: false,
        }
    }

    pub fn is_reduced(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Pre-session adjustment engine
#[derive(Debug, Clone)]
pub struct DeloadEngine {
    config: DeloadConfig,
}

impl DeloadEngine {
    pub fn new(config: &DeloadConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &DeloadConfig {
        &self.config
    }

    pub fn is_break(&self, days_since_last_exposure: Option<i64>) -> bool {
        days_since_last_exposure.is_some_and(|days| days > self.config.break_threshold_days)
    }

    pub fn is_low_readiness(&self, readiness: u8, measured: bool) -> bool {
        measured && readiness < self.config.low_readiness_threshold
    }

    pub fn is_critical_readiness(&self, readiness: u8, measured: bool) -> bool {
        measured && readiness < self.config.critical_readiness_threshold
    }

    /// Combine all pre-session rules for one exercise
    pub fn plan(&self, rules: &ProgressionRules, conditions: &SessionConditions) -> LoadAdjustment {
        let mut adjustment = LoadAdjustment::none();
        let deload_factor = rules.deload_factor.clamp(0.0, 1.0);

        if self.is_break(conditions.days_since_last_exposure) {
            adjustment.base_multiplier = 1.0 - self.config.break_reduction;
            adjustment.reasons.push(DeloadReason::TrainingBreak);
        }

        if conditions.planned_deload {
            adjustment.session_multiplier = deload_factor;
            adjustment.deload_in_effect = true;
            adjustment.reasons.push(DeloadReason::PlannedWeek);
        } else if conditions.critical_readiness {
            adjustment.session_multiplier = deload_factor;
            adjustment.deload_in_effect = true;
            adjustment.reasons.push(DeloadReason::LowReadiness);
        }

        if self.is_low_readiness(conditions.readiness, conditions.readiness_measured) {
            let cut = 1.0 - self.config.readiness_cut;
            if adjustment.deload_in_effect {
                // Larger of the two reductions, never both
                adjustment.session_multiplier = adjustment.session_multiplier.min(cut);
            } else {
                adjustment.session_multiplier *= cut;
            }
            if !adjustment.reasons.contains(&DeloadReason::LowReadiness) {
                adjustment.reasons.push(DeloadReason::LowReadiness);
            }
        }

        adjustment
    }

    /// Apply an adjustment; returns (persisted base weight, session load)
    pub fn apply(&self, weight: f64, adjustment: &LoadAdjustment) -> (f64, f64) {
        let base = sanitize_weight(sanitize_weight(weight) * adjustment.base_multiplier);
        let load = sanitize_weight(base * adjustment.session_multiplier);
        (base, load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepRange;

    fn rules(deload_factor: f64, threshold: i32) -> ProgressionRules {
        ProgressionRules::new(RepRange::new(8, 12), 5.0, deload_factor, threshold)
    }

    fn conditions() -> SessionConditions {
        SessionConditions {
            planned_deload: false,
            critical_readiness: false,
            days_since_last_exposure: Some(3),
            readiness: 75,
            readiness_measured: true,
        }
    }

    fn engine() -> DeloadEngine {
        DeloadEngine::new(&DeloadConfig::default())
    }

    #[test]
    fn test_threshold_two_holds_then_deloads() {
        let r = rules(0.9, 2);
        let first = register_failure(200.0, 0, &r);
        assert_eq!(first.next_weight, 200.0);
        assert_eq!(first.failures_count, 1);
        assert!(!first.deloaded);

        let second = register_failure(first.next_weight, first.failures_count, &r);
        assert!((second.next_weight - 180.0).abs() < 1e-9);
        assert_eq!(second.failures_count, 0);
        assert!(second.deloaded);
    }

    #[test]
    fn test_threshold_zero_behaves_as_one() {
        let r = rules(0.9, 0);
        let first = register_failure(100.0, 0, &r);
        assert!(first.deloaded);
        assert!((first.next_weight - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_deload_factor_never_negative() {
        let r = rules(-0.5, 1);
        let out = register_failure(100.0, 0, &r);
        assert!(out.next_weight >= 0.0);
        assert!(out.next_weight.is_finite());
    }

    #[test]
    fn test_deload_factor_above_one_clamped() {
        let r = rules(1.5, 1);
        assert_eq!(register_failure(100.0, 0, &r).next_weight, 100.0);
    }

    #[test]
    fn test_failure_on_degenerate_weight() {
        let r = rules(0.9, 1);
        assert_eq!(register_failure(f64::NAN, 0, &r).next_weight, 0.0);
        assert_eq!(register_failure(f64::INFINITY, 0, &r).next_weight, 0.0);
        assert_eq!(register_failure(-50.0, 0, &r).next_weight, 0.0);
    }

    #[test]
    fn test_failure_counter_saturates() {
        let r = rules(0.9, i32::MAX);
        let out = register_failure(100.0, u32::MAX, &r);
        assert!(out.deloaded);
    }

    #[test]
    fn test_no_adjustment_normally() {
        let adj = engine().plan(&rules(0.9, 2), &conditions());
        assert_eq!(adj, LoadAdjustment::none());
        assert_eq!(engine().apply(200.0, &adj), (200.0, 200.0));
    }

    #[test]
    fn test_break_reduces_base() {
        let mut c = conditions();
        c.days_since_last_exposure = Some(15);
        let adj = engine().plan(&rules(0.9, 2), &c);
        assert_eq!(adj.reasons, vec![DeloadReason::TrainingBreak]);
        let (base, load) = engine().apply(200.0, &adj);
        assert!((base - 180.0).abs() < 1e-9);
        assert!((load - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_break_threshold_is_exclusive() {
        let mut c = conditions();
        c.days_since_last_exposure = Some(14);
        assert!(!engine().plan(&rules(0.9, 2), &c).is_reduced());
    }

    #[test]
    fn test_planned_deload_is_session_only() {
        let mut c = conditions();
        c.planned_deload = true;
        let adj = engine().plan(&rules(0.8, 2), &c);
        assert!(adj.deload_in_effect);
        let (base, load) = engine().apply(200.0, &adj);
        assert_eq!(base, 200.0);
        assert!((load - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_readiness_cut_layers_on_break() {
        let mut c = conditions();
        c.days_since_last_exposure = Some(30);
        c.readiness = 50;
        let adj = engine().plan(&rules(0.9, 2), &c);
        let (base, load) = engine().apply(200.0, &adj);
        assert!((base - 180.0).abs() < 1e-9);
        assert!((load - 171.0).abs() < 1e-9);
        assert_eq!(adj.reasons, vec![DeloadReason::TrainingBreak, DeloadReason::LowReadiness]);
    }

    #[test]
    fn test_readiness_cut_does_not_stack_with_deload() {
        let mut c = conditions();
        c.planned_deload = true;
        c.readiness = 50;
        let adj = engine().plan(&rules(0.9, 2), &c);
        assert!((adj.session_multiplier - 0.9).abs() < 1e-9);

        // A shallow deload factor loses to the readiness cut
        let adj = engine().plan(&rules(0.98, 2), &c);
        assert!((adj.session_multiplier - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_unmeasured_readiness_never_cuts() {
        let mut c = conditions();
        c.readiness = 10;
        c.readiness_measured = false;
        assert!(!engine().plan(&rules(0.9, 2), &c).is_reduced());
    }

    #[test]
    fn test_critical_readiness_is_session_deload() {
        let mut c = conditions();
        c.readiness = 20;
        c.critical_readiness = true;
        let adj = engine().plan(&rules(0.9, 2), &c);
        assert!(adj.deload_in_effect);
        assert_eq!(adj.reasons, vec![DeloadReason::LowReadiness]);
        assert!((adj.session_multiplier - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_application_stays_bounded() {
        let mut c = conditions();
        c.days_since_last_exposure = Some(100);
        c.readiness = 0;
        c.planned_deload = true;
        let r = rules(-3.0, 1);
        let adj = engine().plan(&r, &c);
        let mut weight = 500.0;
        for _ in 0..1000 {
            let (base, load) = engine().apply(weight, &adj);
            assert!(base.is_finite() && base >= 0.0);
            assert!(load.is_finite() && load >= 0.0);
            weight = base;
        }
    }
}
