//! Double progression: add reps within the range, then add load
//!
//! Evaluation is pessimistic. The worst completed working set decides,
//! so a single set below the range minimum is a failure even when the
//! others succeeded.

use serde::{Deserialize, Serialize};

use crate::config::ProgressionConfig;
use crate::model::{ExercisePerformance, ProgressionRules, SetResult};

/// Why a session held instead of progressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoldReason {
    NoCompletedSets,
    /// Top of the range reached, but harder than the target effort
    EffortAboveTarget,
}

impl HoldReason {
    pub fn describe(&self) -> &'static str {
        match self {
            HoldReason::NoCompletedSets => "no working sets were completed",
            HoldReason::EffortAboveTarget => "top of the range reached but effort was above target",
        }
    }
}

/// Outcome of evaluating one exercise against its rep range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProgressionDecision {
    IncreaseLoad { next_weight: f64, next_target_reps: u32 },
    IncreaseReps { next_target_reps: u32 },
    Hold { reason: HoldReason },
    /// A working set fell below the range minimum; deload accounting decides the weight
    Failure { worst_reps: u32 },
}

impl ProgressionDecision {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ProgressionDecision::IncreaseLoad { .. } | ProgressionDecision::IncreaseReps { .. }
        )
    }
}

/// Effort thresholds for calling a set a grinder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffortRule {
    pub grinder_max_rir: f64,
    pub grinder_min_rpe: f64,
}

impl EffortRule {
    pub fn from_config(config: &ProgressionConfig) -> Self {
        Self {
            grinder_max_rir: config.grinder_max_rir,
            grinder_min_rpe: config.grinder_min_rpe,
        }
    }

    pub fn is_grinder(&self, set: &SetResult) -> bool {
        let by_rir = set.rir.is_some_and(|rir| rir.is_finite() && rir <= self.grinder_max_rir);
        let by_rpe = set.rpe.is_some_and(|rpe| rpe.is_finite() && rpe >= self.grinder_min_rpe);
        by_rir || by_rpe
    }

    /// Effort is on target unless a set ground out or missed the RIR goal by more than one rep
    pub fn on_target(&self, set: &SetResult, target_rir: Option<f64>) -> bool {
        if self.is_grinder(set) {
            return false;
        }
        match (target_rir, set.observed_rir()) {
            (Some(target), Some(observed)) => observed >= target - 1.0,
            _ => true,
        }
    }
}

impl Default for EffortRule {
    fn default() -> Self {
        Self::from_config(&ProgressionConfig::default())
    }
}

/// Evaluate a logged exercise at `working_weight`
pub fn evaluate(
    performance: &ExercisePerformance,
    rules: &ProgressionRules,
    target_rir: Option<f64>,
    working_weight: f64,
    effort: &EffortRule,
) -> ProgressionDecision {
    let range = rules.rep_range;
    let sets: Vec<&SetResult> = performance.working_sets().collect();

    let Some(worst) = sets.iter().map(|s| s.reps).min() else {
        return ProgressionDecision::Hold {
            reason: HoldReason::NoCompletedSets,
        };
    };
    let best = sets.iter().map(|s| s.reps).max().unwrap_or(worst);

    if worst < range.min {
        return ProgressionDecision::Failure { worst_reps: worst };
    }

    if worst >= range.max {
        if sets.iter().all(|s| effort.on_target(s, target_rir)) {
            let base = if working_weight.is_finite() { working_weight.max(0.0) } else { 0.0 };
            return ProgressionDecision::IncreaseLoad {
                next_weight: base + rules.increment,
                next_target_reps: range.min,
            };
        }
        return ProgressionDecision::Hold {
            reason: HoldReason::EffortAboveTarget,
        };
    }

    ProgressionDecision::IncreaseReps {
        next_target_reps: best.saturating_add(1).clamp(range.min, range.max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExecutionContext, RepRange};
    use chrono::Utc;

    fn rules(min: u32, max: u32) -> ProgressionRules {
        ProgressionRules::new(RepRange::new(min, max), 5.0, 0.9, 2)
    }

    fn perf(reps: &[u32], load: f64) -> ExercisePerformance {
        ExercisePerformance {
            exercise_id: "bench".to_string(),
            sets: reps.iter().map(|r| SetResult::working(*r, load)).collect(),
            execution_context: ExecutionContext::Normal,
            performed_at: Utc::now(),
        }
    }

    #[test]
    fn test_all_sets_at_top_increase_load() {
        let d = evaluate(&perf(&[12, 12, 12], 100.0), &rules(8, 12), None, 100.0, &EffortRule::default());
        assert_eq!(
            d,
            ProgressionDecision::IncreaseLoad {
                next_weight: 105.0,
                next_target_reps: 8
            }
        );
    }

    #[test]
    fn test_within_range_increase_reps() {
        let d = evaluate(&perf(&[10, 9, 8], 100.0), &rules(8, 12), None, 100.0, &EffortRule::default());
        assert_eq!(d, ProgressionDecision::IncreaseReps { next_target_reps: 11 });
    }

    #[test]
    fn test_increase_reps_capped_at_max() {
        let d = evaluate(&perf(&[12, 11], 100.0), &rules(8, 12), None, 100.0, &EffortRule::default());
        assert_eq!(d, ProgressionDecision::IncreaseReps { next_target_reps: 12 });
    }

    #[test]
    fn test_single_bad_set_is_failure() {
        let d = evaluate(&perf(&[12, 12, 6], 100.0), &rules(8, 12), None, 100.0, &EffortRule::default());
        assert_eq!(d, ProgressionDecision::Failure { worst_reps: 6 });
    }

    #[test]
    fn test_no_sets_hold() {
        let d = evaluate(&perf(&[], 100.0), &rules(8, 12), None, 100.0, &EffortRule::default());
        assert_eq!(
            d,
            ProgressionDecision::Hold {
                reason: HoldReason::NoCompletedSets
            }
        );
    }

    #[test]
    fn test_grinder_at_top_holds() {
        let mut p = perf(&[12, 12], 100.0);
        p.sets[1] = p.sets[1].with_rpe(10.0);
        let d = evaluate(&p, &rules(8, 12), None, 100.0, &EffortRule::default());
        assert_eq!(
            d,
            ProgressionDecision::Hold {
                reason: HoldReason::EffortAboveTarget
            }
        );
    }

    #[test]
    fn test_effort_below_target_rir_holds() {
        let mut p = perf(&[12, 12], 100.0);
        p.sets[0] = p.sets[0].with_rir(0.5);
        p.sets[1] = p.sets[1].with_rir(2.0);
        let effort = EffortRule {
            grinder_max_rir: 0.0,
            grinder_min_rpe: 9.5,
        };
        let d = evaluate(&p, &rules(8, 12), Some(2.0), 100.0, &effort);
        assert!(matches!(d, ProgressionDecision::Hold { .. }));

        p.sets[0] = p.sets[0].with_rir(1.0);
        let d = evaluate(&p, &rules(8, 12), Some(2.0), 100.0, &effort);
        assert!(matches!(d, ProgressionDecision::IncreaseLoad { .. }));
    }

    #[test]
    fn test_inverted_range_still_decides() {
        let inverted = ProgressionRules::new(RepRange::new(12, 8), 5.0, 0.9, 2);
        let d = evaluate(&perf(&[10, 10], 100.0), &inverted, None, 100.0, &EffortRule::default());
        assert_eq!(d, ProgressionDecision::IncreaseReps { next_target_reps: 11 });
    }

    #[test]
    fn test_degenerate_weight_never_propagates() {
        let d = evaluate(&perf(&[12, 12], 100.0), &rules(8, 12), None, f64::NAN, &EffortRule::default());
        match d {
            ProgressionDecision::IncreaseLoad { next_weight, .. } => assert_eq!(next_weight, 5.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_warmups_ignored() {
        let mut p = perf(&[12, 12], 100.0);
        let mut warmup = SetResult::working(3, 45.0);
        warmup.is_warmup = true;
        p.sets.insert(0, warmup);
        let d = evaluate(&p, &rules(8, 12), None, 100.0, &EffortRule::default());
        assert!(matches!(d, ProgressionDecision::IncreaseLoad { .. }));
    }
}
