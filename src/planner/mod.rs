//! Session plan builder
//!
//! Turns a workout template into an ordered plan and, once the session is
//! logged, folds the results back into exercise state and the bandit.
//! The builder owns no state: every call receives the athlete's stores.

pub mod insights;
pub mod substitution;
pub mod view;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use insights::{CoachingInsight, InsightTopic};
pub use substitution::EquipmentAvailability;
pub use view::{ExerciseCard, SessionModel};

use crate::config::EngineConfig;
use crate::engine::deload::sanitize_weight;
use crate::engine::signals::{ReadinessReading, assemble};
use crate::engine::{
    DeloadEngine, DeloadReason, ExposurePlan, LoadAdjustment, NextPrescriptionSnapshot, ReadinessCalculator,
    SessionConditions, StateUpdater,
};
use crate::error::StoreError;
use crate::model::{
    AthleteProfile, DailyBiometrics, DecisionAction, DecisionLogEntry, Direction, ExercisePerformance,
    ExerciseTemplate, LoadStrategy, MAX_SETS, PolicySelection, ProgressionRules, RepRange, SessionIntent,
    SetPrescription, VariationContext, WorkoutTemplate,
};
use crate::policy::{PolicyArm, PolicySelector, Selector, reward};
use crate::store::AthleteStore;

/// Days of prior readiness carried into each snapshot
pub const RECENT_READINESS_DAYS: i64 = 7;

/// Everything known about today before the first set
#[derive(Debug, Clone, Default)]
pub struct SessionInputs {
    pub now: DateTime<Utc>,
    /// Trailing window; today's entry, if present, is scored against the rest
    pub biometrics: Vec<DailyBiometrics>,
    /// Externally supplied readiness, used instead of the biometrics
    pub readiness_override: Option<u8>,
    pub planned_deload_week: bool,
    pub availability: EquipmentAvailability,
    pub profile: AthleteProfile,
}

/// One exercise of a plan and the decision behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
    pub decision_id: Uuid,
    pub variation: VariationContext,
    pub prescription: SetPrescription,
    /// Rules after the selected arm's changes
    pub rules: ProgressionRules,
    /// Working weight the result is judged against
    pub base_weight: f64,
    pub adjustment: LoadAdjustment,
    pub selection: PolicySelection,
    pub action: DecisionAction,
}

impl PlannedExercise {
    pub fn exercise_id(&self) -> &str {
        &self.variation.performed_exercise_id
    }

    pub fn exposure_plan(&self) -> ExposurePlan {
        ExposurePlan {
            base_weight: self.base_weight,
            rules: self.rules,
            target_rir: self.prescription.target_rir,
            deload_in_effect: self.adjustment.deload_in_effect,
            adjustments: self.adjustment.reasons.clone(),
            baseline: self.selection.executed_policy_id == PolicyArm::Baseline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    pub user_id: String,
    pub template_id: String,
    pub template_name: String,
    pub created_at: DateTime<Utc>,
    pub readiness: u8,
    pub readiness_measured: bool,
    pub deload: bool,
    pub deload_reason: Option<DeloadReason>,
    pub exercises: Vec<PlannedExercise>,
    pub insights: Vec<CoachingInsight>,
}

#[derive(Debug, Error, PartialEq)]
pub enum CompletionError {
    #[error("{0} was not part of this plan")]
    NotPlanned(String),

    #[error("no pending decision for {0}")]
    NoPendingDecision(String),

    #[error("decision {0} was logged without an exposure plan")]
    MissingExposurePlan(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of feeding a logged session back
#[derive(Debug, Default)]
pub struct SessionCompletion {
    pub snapshots: Vec<NextPrescriptionSnapshot>,
    /// Rewards applied to bandit priors, by decision
    pub rewards: Vec<(Uuid, f64)>,
    pub errors: Vec<CompletionError>,
}

pub struct SessionPlanBuilder {
    config: EngineConfig,
}

impl SessionPlanBuilder {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Plan every template exercise in order and log one decision per exercise
    pub fn build(&self, athlete: &mut AthleteStore, template: &WorkoutTemplate, inputs: &SessionInputs) -> SessionPlan {
        let user_id = athlete.user_id().to_string();
        let readiness = self.readiness(inputs);
        let deload = DeloadEngine::new(&self.config.deload);

        let critical = deload.is_critical_readiness(readiness.today, readiness.measured);
        let session_deload = inputs.planned_deload_week || critical;
        let deload_reason = if inputs.planned_deload_week {
            Some(DeloadReason::PlannedWeek)
        } else if critical {
            Some(DeloadReason::LowReadiness)
        } else {
            None
        };
        let intent = if session_deload {
            SessionIntent::Deload
        } else {
            SessionIntent::Train
        };

        let mut insights = insights::session_insights(
            readiness.today,
            readiness.measured,
            deload.config().low_readiness_threshold,
            inputs.planned_deload_week,
        );
        let mut exercises = Vec::with_capacity(template.exercises.len());

        for exercise in &template.exercises {
            let variation = substitution::resolve(
                &exercise.exercise_id,
                &inputs.availability,
                self.config.bandit.substitution_coefficient,
            );
            let performed = variation.performed_exercise_id.clone();
            let state = athlete.states.get(&performed);
            let signals = assemble(
                &performed,
                state,
                &athlete.history,
                &readiness,
                &inputs.profile,
                intent,
                inputs.now,
            );

            let rules = exercise.rules();
            let adjustment = deload.plan(&rules, &SessionConditions {
                planned_deload: inputs.planned_deload_week,
                critical_readiness: critical,
                days_since_last_exposure: signals.days_since_last_exposure,
                readiness: readiness.today,
                readiness_measured: readiness.measured,
            });

            let selection = Selector::from_config(&self.config.bandit, &mut athlete.priors, &mut athlete.rng)
                .select_policy(&signals, &variation, &user_id);
            let effect = selection
                .executed_policy_id
                .effect(&signals, rules.increment, adjustment.deload_in_effect);

            let prior_weight = match state {
                Some(s) => s.current_working_weight,
                // Starting weights describe the planned lift, not its substitute
                None if !variation.is_substitution => exercise.starting_weight.unwrap_or(0.0),
                None => 0.0,
            };
            let (base, _) = deload.apply(prior_weight, &adjustment);
            let base_weight = sanitize_weight(base + effect.load_delta);
            let working = match (exercise.load_strategy.sanitized(), signals.rolling_e1rm) {
                (LoadStrategy::PercentOfE1rm { percent }, Some(e1rm)) => {
                    sanitize_weight(e1rm * percent / 100.0 + effect.load_delta)
                }
                _ => base_weight,
            };
            let load = round_to_step(
                sanitize_weight(working * adjustment.session_multiplier),
                self.config.progression.load_rounding_step,
            );

            let rules = ProgressionRules {
                rep_range: RepRange::new(rules.rep_range.min, rules.rep_range.max.saturating_add(effect.rep_max_delta)),
                ..rules
            };
            let set_count =
                (i64::from(exercise.working_sets()) + i64::from(effect.sets_delta)).clamp(1, i64::from(MAX_SETS)) as u32;
            let target_reps = state
                .and_then(|s| s.next_target_reps)
                .unwrap_or(rules.rep_range.min)
                .clamp(rules.rep_range.min, rules.rep_range.max);

            let prescription = SetPrescription {
                set_count,
                target_reps_range: rules.rep_range,
                target_rir: exercise.target_rir,
                tempo: exercise.tempo.clone(),
                rest_seconds: exercise.rest_seconds,
                load_strategy: exercise.load_strategy.sanitized(),
                increment: rules.increment,
                load,
                target_reps,
            };
            let action = decision_action(
                prior_weight,
                &prescription,
                exercise,
                effect.rep_max_delta,
                &adjustment,
                effect.explanation,
                &selection,
            );

            let last_result = athlete.history.for_exercise(&performed).next().map(|r| r.result);
            insights.extend(insights::exercise_insights(
                &signals,
                state,
                last_result,
                &variation,
                &selection,
                &adjustment.reasons,
            ));

            let decision_id = next_decision_id(&mut athlete.rng);
            let planned = PlannedExercise {
                decision_id,
                variation,
                prescription,
                rules,
                base_weight,
                adjustment,
                selection,
                action,
            };
            athlete.log.append(DecisionLogEntry {
                id: decision_id,
                user_id: user_id.clone(),
                created_at: inputs.now,
                signals,
                variation: planned.variation.clone(),
                constraints: rules,
                action: planned.action.clone(),
                selection: planned.selection.clone(),
                exposure: Some(planned.exposure_plan()),
                outcome: None,
                reward: None,
            });

            tracing::debug!(
                "Planned {} for {}: {}x{} @ {:.1} ({})",
                performed,
                user_id,
                set_count,
                target_reps,
                load,
                planned.selection.executed_policy_id
            );

            exercises.push(planned);
        }

        if let Some(reason) = deload_reason {
            tracing::info!("Session deload for {}: {}", user_id, reason.describe());
        }

        SessionPlan {
            user_id,
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            created_at: inputs.now,
            readiness: readiness.today,
            readiness_measured: readiness.measured,
            deload: session_deload,
            deload_reason,
            exercises,
            insights,
        }
    }

    /// Apply logged results: update states, attach outcomes, feed the bandit
    pub fn complete(
        &self,
        athlete: &mut AthleteStore,
        plan: &SessionPlan,
        performances: &[ExercisePerformance],
    ) -> SessionCompletion {
        let mut completion = SessionCompletion::default();

        for performance in performances {
            let pending = |p: &&PlannedExercise| {
                p.exercise_id() == performance.exercise_id
                    && athlete.log.get(&p.decision_id).is_some_and(|e| !e.has_outcome())
            };
            let Some(planned) = plan
                .exercises
                .iter()
                .find(pending)
                .or_else(|| plan.exercises.iter().find(|p| p.exercise_id() == performance.exercise_id))
            else {
                tracing::warn!("{} logged {} outside the plan", athlete.user_id(), performance.exercise_id);
                completion
                    .errors
                    .push(CompletionError::NotPlanned(performance.exercise_id.clone()));
                continue;
            };

            self.close(athlete, planned.decision_id, &planned.exposure_plan(), performance, &mut completion);
        }

        completion
    }

    /// Apply results to the newest pending decision for each exercise.
    ///
    /// Works from the decision log alone, so a plan made by an earlier
    /// process can be closed after the stores are reloaded.
    pub fn complete_pending(&self, athlete: &mut AthleteStore, performances: &[ExercisePerformance]) -> SessionCompletion {
        let mut completion = SessionCompletion::default();

        for performance in performances {
            let found = athlete
                .log
                .latest_pending(&performance.exercise_id)
                .map(|entry| (entry.id, entry.exposure.clone()));
            match found {
                None => {
                    tracing::warn!("{} has no pending decision for {}", athlete.user_id(), performance.exercise_id);
                    completion
                        .errors
                        .push(CompletionError::NoPendingDecision(performance.exercise_id.clone()));
                }
                Some((id, None)) => completion.errors.push(CompletionError::MissingExposurePlan(id)),
                Some((id, Some(exposure))) => self.close(athlete, id, &exposure, performance, &mut completion),
            }
        }

        completion
    }

    fn close(
        &self,
        athlete: &mut AthleteStore,
        decision_id: Uuid,
        exposure: &ExposurePlan,
        performance: &ExercisePerformance,
        completion: &mut SessionCompletion,
    ) {
        let user_id = athlete.user_id().to_string();

        match athlete.log.get(&decision_id) {
            None => {
                completion.errors.push(StoreError::UnknownDecision(decision_id).into());
                return;
            }
            Some(entry) if entry.has_outcome() => {
                completion
                    .errors
                    .push(StoreError::OutcomeAlreadyAttached(decision_id).into());
                return;
            }
            Some(_) => {}
        }

        let update = StateUpdater::new(&self.config.progression).apply(
            athlete.states.get(&performance.exercise_id),
            performance,
            exposure,
            performance.performed_at,
        );
        if let Err(e) = athlete.states.upsert(update.state) {
            completion.errors.push(e.into());
            return;
        }
        athlete.history.push(update.exposure);

        let value = reward(&update.outcome);
        match athlete.log.attach_outcome(decision_id, &user_id, update.outcome, value) {
            Ok(entry) => {
                let mut selector = Selector::from_config(&self.config.bandit, &mut athlete.priors, &mut athlete.rng);
                if let Some(applied) = selector.record_outcome(entry, &user_id) {
                    completion.rewards.push((entry.id, applied));
                }
            }
            Err(e) => {
                tracing::warn!("Outcome for {} not attached: {}", decision_id, e);
                completion.errors.push(e.into());
            }
        }

        completion.snapshots.push(update.snapshot);
    }

    fn readiness(&self, inputs: &SessionInputs) -> ReadinessReading {
        let calculator = ReadinessCalculator::new(&self.config.readiness);
        let today = inputs.now.date_naive();
        let recent = calculator.recent_scores(&inputs.biometrics, today, RECENT_READINESS_DAYS);

        match inputs.readiness_override {
            Some(score) => ReadinessReading {
                today: score.min(100),
                measured: true,
                recent,
            },
            None => {
                let (score, measured) = calculator.score_or_default(&inputs.biometrics, today);
                ReadinessReading {
                    today: score,
                    measured,
                    recent,
                }
            }
        }
    }
}

/// Round to the nearest plate step; a non-positive step leaves the value alone
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return sanitize_weight(value);
    }
    sanitize_weight((value / step).round() * step)
}

fn decision_action(
    prior_weight: f64,
    prescription: &SetPrescription,
    exercise: &ExerciseTemplate,
    rep_max_delta: u32,
    adjustment: &LoadAdjustment,
    arm_explanation: &str,
    selection: &PolicySelection,
) -> DecisionAction {
    let prior = sanitize_weight(prior_weight);
    let weight_delta = prescription.load - prior;
    let direction = if prior == 0.0 || weight_delta.abs() < 1e-9 {
        Direction::Hold
    } else if weight_delta > 0.0 {
        Direction::Increase
    } else {
        Direction::Decrease
    };

    let mut explanation = arm_explanation.to_string();
    if adjustment.is_reduced() {
        let reasons: Vec<&str> = adjustment.reasons.iter().map(|r| r.describe()).collect();
        explanation = format!("{}; reduced for {}", explanation, reasons.join(", "));
    }

    DecisionAction {
        direction,
        prescribed_load: prescription.load,
        weight_delta,
        reps_delta: rep_max_delta as i32,
        sets_delta: (i64::from(prescription.set_count) - i64::from(exercise.working_sets()))
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        explanation,
        confidence: selection.executed_action_probability,
    }
}

/// Decision ids come from the athlete's seeded stream so replays reproduce them
fn next_decision_id(rng: &mut impl RngCore) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}
