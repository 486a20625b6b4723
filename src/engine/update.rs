//! Apply one logged exposure to an exercise's durable state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deload::{DeloadReason, register_failure, sanitize_weight};
use super::e1rm::{classify_trend, rolling_e1rm};
use super::progression::{EffortRule, ProgressionDecision, evaluate};
use crate::config::ProgressionConfig;
use crate::model::{
    E1rmSample, ExercisePerformance, ExerciseState, ExposureRecord, ExposureResult, OutcomeRecord,
    ProgressionRules, SetOutcome,
};

/// What the plan decided before the session, needed to score it afterwards.
/// Logged with the decision so a later process can close it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposurePlan {
    /// Working weight after any persisted adjustment (break reset)
    pub base_weight: f64,
    /// Rules actually in effect, including arm modifications
    pub rules: ProgressionRules,
    pub target_rir: Option<f64>,
    /// Session-level deload: failures are not counted and load does not progress
    pub deload_in_effect: bool,
    pub adjustments: Vec<DeloadReason>,
    /// The baseline policy was executed (control, shadow, or the baseline arm)
    #[serde(default)]
    pub baseline: bool,
}

/// Next-session recommendation for immediate display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPrescriptionSnapshot {
    pub exercise_id: String,
    pub next_weight: f64,
    pub next_target_reps: u32,
    pub reason: String,
    pub decision: ProgressionDecision,
    pub deload_reason: Option<DeloadReason>,
    /// Clamped rules the decision was made with
    pub rules: ProgressionRules,
    pub failures_count: u32,
}

/// Everything produced by one update
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub state: ExerciseState,
    pub snapshot: NextPrescriptionSnapshot,
    pub exposure: ExposureRecord,
    pub outcome: OutcomeRecord,
}

pub struct StateUpdater {
    effort: EffortRule,
    history_len: usize,
}

impl StateUpdater {
    pub fn new(config: &ProgressionConfig) -> Self {
        let config = config.sanitized();
        Self {
            effort: EffortRule::from_config(&config),
            history_len: config.e1rm_history_len,
        }
    }

    pub fn effort(&self) -> &EffortRule {
        &self.effort
    }

    /// Evaluate `performance` and fold it into `prior` (or a cold-start state)
    pub fn apply(
        &self,
        prior: Option<&ExerciseState>,
        performance: &ExercisePerformance,
        plan: &ExposurePlan,
        now: DateTime<Utc>,
    ) -> StateUpdate {
        let rules = plan.rules;
        let mut weight = sanitize_weight(plan.base_weight);
        if prior.is_none() && weight == 0.0 {
            // Cold start: the first logged working set becomes the working weight
            weight = performance
                .working_sets()
                .map(|s| sanitize_weight(s.load))
                .find(|w| *w > 0.0)
                .unwrap_or(0.0);
        }

        let mut state = prior
            .cloned()
            .unwrap_or_else(|| ExerciseState::seeded(&performance.exercise_id, weight, now));
        state.current_working_weight = weight;

        let decision = evaluate(performance, &rules, plan.target_rir, weight, &self.effort);
        let was_grinder = performance.working_sets().any(|s| self.effort.is_grinder(s));
        let mut deload_reason = plan.adjustments.first().copied();

        let result = if plan.deload_in_effect {
            state.last_deload_at = Some(now);
            ExposureResult::Deload
        } else {
            match decision {
                ProgressionDecision::IncreaseLoad {
                    next_weight,
                    next_target_reps,
                } => {
                    state.current_working_weight = sanitize_weight(next_weight);
                    state.failures_count = 0;
                    state.record_success(plan.baseline);
                    state.next_target_reps = Some(next_target_reps);
                    ExposureResult::Success
                }
                ProgressionDecision::IncreaseReps { next_target_reps } => {
                    state.failures_count = 0;
                    state.record_success(plan.baseline);
                    state.next_target_reps = Some(next_target_reps);
                    ExposureResult::Success
                }
                ProgressionDecision::Hold { .. } => ExposureResult::Hold,
                ProgressionDecision::Failure { .. } => {
                    let accounting = register_failure(weight, state.failures_count, &rules);
                    state.current_working_weight = accounting.next_weight;
                    state.failures_count = accounting.failures_count;
                    if accounting.deloaded {
                        tracing::info!(
                            "Failure deload for {}: {:.1} -> {:.1}",
                            state.exercise_id,
                            weight,
                            accounting.next_weight
                        );
                        state.last_deload_at = Some(now);
                        state.next_target_reps = Some(rules.rep_range.min);
                        deload_reason = Some(DeloadReason::FailureThreshold);
                    }
                    ExposureResult::Failure
                }
            }
        };

        let best = performance.best_set_for_e1rm();
        if !plan.deload_in_effect {
            if let Some((_, e1rm)) = best {
                state.push_e1rm(E1rmSample { at: now, e1rm }, self.history_len);
            }
        }
        state.rolling_e1rm = rolling_e1rm(&state.e1rm_history);
        state.e1rm_trend = classify_trend(&state.e1rm_history).trend;
        state.updated_at = now;

        let next_target_reps = state
            .next_target_reps
            .unwrap_or(rules.rep_range.min)
            .clamp(rules.rep_range.min, rules.rep_range.max);

        let snapshot = NextPrescriptionSnapshot {
            exercise_id: state.exercise_id.clone(),
            next_weight: state.current_working_weight,
            next_target_reps,
            reason: describe(&decision, plan.deload_in_effect, deload_reason, &rules),
            decision,
            deload_reason,
            rules,
            failures_count: state.failures_count,
        };

        let exposure = ExposureRecord {
            exercise_id: state.exercise_id.clone(),
            performed_at: now,
            result,
            high_effort: was_grinder,
        };

        let outcome = OutcomeRecord {
            sets: performance
                .sets
                .iter()
                .filter(|s| !s.is_warmup)
                .map(|s| SetOutcome {
                    reps: s.reps,
                    load: sanitize_weight(s.load),
                    rir: s.observed_rir(),
                    completed: s.completed,
                })
                .collect(),
            total_volume: performance.total_volume(),
            session_e1rm: best.map(|(_, e)| e),
            was_success: decision.is_success(),
            was_failure: matches!(decision, ProgressionDecision::Failure { .. }),
            was_grinder,
            execution_context: performance.execution_context,
            recorded_at: now,
        };

        StateUpdate {
            state,
            snapshot,
            exposure,
            outcome,
        }
    }
}

fn describe(
    decision: &ProgressionDecision,
    deload_session: bool,
    deload_reason: Option<DeloadReason>,
    rules: &ProgressionRules,
) -> String {
    if deload_session {
        return format!(
            "Deload session ({}); working weight kept for next time",
            deload_reason.map(|r| r.describe()).unwrap_or("deload")
        );
    }
    match decision {
        ProgressionDecision::IncreaseLoad { next_weight, .. } => format!(
            "All sets reached {} reps at target effort; add {} to {:.1}",
            rules.rep_range.max, rules.increment, next_weight
        ),
        ProgressionDecision::IncreaseReps { next_target_reps } => {
            format!("Keep the weight and aim for {} reps", next_target_reps)
        }
        ProgressionDecision::Hold { reason } => format!("Hold: {}", reason.describe()),
        ProgressionDecision::Failure { worst_reps } => match deload_reason {
            Some(DeloadReason::FailureThreshold) => format!(
                "Missed the range again ({} reps); deload to {:.0}% of the working weight",
                worst_reps,
                rules.deload_factor * 100.0
            ),
            _ => format!(
                "A set fell below {} reps ({}); hold the weight and retry",
                rules.rep_range.min, worst_reps
            ),
        },
    }
}
