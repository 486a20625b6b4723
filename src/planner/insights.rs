//! Coaching insights attached to a session plan

use serde::{Deserialize, Serialize};

use crate::engine::DeloadReason;
use crate::model::{
    E1rmTrend, ExerciseState, ExplorationMode, ExposureResult, LiftSignalsSnapshot, PolicySelection, VariationContext,
};
use crate::policy::PolicyArm;

/// e1RM samples needed before a flat trend counts as a plateau
pub const PLATEAU_MIN_SAMPLES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightTopic {
    Plateau,
    DecliningTrend,
    LowReadiness,
    ReturningFromBreak,
    DeloadWeek,
    FailureDeload,
    Substitution,
    Exploration,
}

impl InsightTopic {
    pub fn emoji(&self) -> &'static str {
        match self {
            InsightTopic::Plateau => "📊",
            InsightTopic::DecliningTrend => "📉",
            InsightTopic::LowReadiness => "😴",
            InsightTopic::ReturningFromBreak => "👋",
            InsightTopic::DeloadWeek => "🧘",
            InsightTopic::FailureDeload => "🔁",
            InsightTopic::Substitution => "🔄",
            InsightTopic::Exploration => "🧪",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            InsightTopic::Plateau => "plateau",
            InsightTopic::DecliningTrend => "declining_trend",
            InsightTopic::LowReadiness => "low_readiness",
            InsightTopic::ReturningFromBreak => "returning_from_break",
            InsightTopic::DeloadWeek => "deload_week",
            InsightTopic::FailureDeload => "failure_deload",
            InsightTopic::Substitution => "substitution",
            InsightTopic::Exploration => "exploration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingInsight {
    pub topic: InsightTopic,
    pub exercise_id: Option<String>,
    pub message: String,
}

impl CoachingInsight {
    fn for_exercise(topic: InsightTopic, exercise_id: &str, message: String) -> Self {
        Self {
            topic,
            exercise_id: Some(exercise_id.to_string()),
            message,
        }
    }

    fn session(topic: InsightTopic, message: String) -> Self {
        Self {
            topic,
            exercise_id: None,
            message,
        }
    }
}

/// Session-wide insights (readiness, deload week)
pub fn session_insights(readiness: u8, readiness_measured: bool, low_threshold: u8, deload_week: bool) -> Vec<CoachingInsight> {
    let mut insights = Vec::new();
    if deload_week {
        insights.push(CoachingInsight::session(
            InsightTopic::DeloadWeek,
            "Deload week: lighter loads, same movements. Recovery is part of the plan.".to_string(),
        ));
    }
    if readiness_measured && readiness < low_threshold {
        insights.push(CoachingInsight::session(
            InsightTopic::LowReadiness,
            format!("Readiness is {} today; loads are trimmed slightly.", readiness),
        ));
    }
    insights
}

/// Per-exercise insights from the signals and what the plan decided
pub fn exercise_insights(
    signals: &LiftSignalsSnapshot,
    state: Option<&ExerciseState>,
    last_result: Option<ExposureResult>,
    variation: &VariationContext,
    selection: &PolicySelection,
    adjustments: &[DeloadReason],
) -> Vec<CoachingInsight> {
    let id = variation.performed_exercise_id.as_str();
    let mut insights = Vec::new();

    if let Some(state) = state {
        let flat = state.e1rm_trend == E1rmTrend::Stable && state.e1rm_history.len() >= PLATEAU_MIN_SAMPLES;
        if flat && last_result != Some(ExposureResult::Success) {
            insights.push(CoachingInsight::for_exercise(
                InsightTopic::Plateau,
                id,
                format!(
                    "{} has held steady over the last {} sessions. Consider a variation or a new rep range.",
                    id,
                    state.e1rm_history.len()
                ),
            ));
        }
        if state.e1rm_trend == E1rmTrend::Declining {
            insights.push(CoachingInsight::for_exercise(
                InsightTopic::DecliningTrend,
                id,
                format!("{} estimated max is trending down. Watch sleep and recovery.", id),
            ));
        }
        let deloaded_last_time = last_result == Some(ExposureResult::Failure)
            && state.failures_count == 0
            && state.last_deload_at == Some(state.updated_at);
        if deloaded_last_time {
            insights.push(CoachingInsight::for_exercise(
                InsightTopic::FailureDeload,
                id,
                format!(
                    "{} was deloaded to {:.1} after repeated misses. Rebuild from here.",
                    id, state.current_working_weight
                ),
            ));
        }
    }

    if adjustments.contains(&DeloadReason::TrainingBreak) {
        insights.push(CoachingInsight::for_exercise(
            InsightTopic::ReturningFromBreak,
            id,
            format!(
                "{} days since the last {} session; starting a little lighter.",
                signals.days_since_last_exposure.unwrap_or_default(),
                id
            ),
        ));
    }

    if variation.is_substitution {
        insights.push(CoachingInsight::for_exercise(
            InsightTopic::Substitution,
            id,
            format!("{} replaces {} today.", variation.performed_exercise_id, variation.planned_exercise_id),
        ));
    }

    if selection.exploration_mode == ExplorationMode::Explore && selection.executed_policy_id != PolicyArm::Baseline {
        insights.push(CoachingInsight::for_exercise(
            InsightTopic::Exploration,
            id,
            format!("Trying the {} variant on {} today.", selection.executed_policy_id, id),
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{E1rmSample, ExperienceLevel, SessionIntent};
    use chrono::{Duration, TimeZone, Utc};

    fn signals() -> LiftSignalsSnapshot {
        LiftSignalsSnapshot {
            exercise_id: "squat".to_string(),
            last_working_weight: Some(100.0),
            rolling_e1rm: Some(130.0),
            failures_count: 0,
            fail_streak: 0,
            success_streak: 1,
            high_rpe_streak: 0,
            successful_exposures: 4,
            days_since_last_exposure: Some(20),
            days_since_last_deload: None,
            trend: E1rmTrend::Stable,
            readiness_today: 75,
            readiness_measured: false,
            readiness_recent: Vec::new(),
            bodyweight: None,
            experience_level: ExperienceLevel::Intermediate,
            session_intent: SessionIntent::Train,
        }
    }

    fn flat_state(samples: usize) -> ExerciseState {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).unwrap();
        let mut state = ExerciseState::seeded("squat", 100.0, start);
        for i in 0..samples {
            state.push_e1rm(
                E1rmSample {
                    at: start + Duration::days(i as i64 * 2),
                    e1rm: 130.0,
                },
                24,
            );
        }
        state.e1rm_trend = E1rmTrend::Stable;
        state
    }

    fn topics(insights: &[CoachingInsight]) -> Vec<InsightTopic> {
        insights.iter().map(|i| i.topic).collect()
    }

    #[test]
    fn test_session_insights() {
        assert!(session_insights(80, true, 60, false).is_empty());
        assert_eq!(topics(&session_insights(40, true, 60, true)), vec![
            InsightTopic::DeloadWeek,
            InsightTopic::LowReadiness
        ]);
        // Unmeasured readiness never warns
        assert!(session_insights(40, false, 60, false).is_empty());
    }

    #[test]
    fn test_plateau_needs_enough_samples() {
        let ctx = VariationContext::primary("squat");
        let control = PolicySelection::control();
        let short = exercise_insights(&signals(), Some(&flat_state(3)), None, &ctx, &control, &[]);
        assert!(!topics(&short).contains(&InsightTopic::Plateau));
        let long = exercise_insights(&signals(), Some(&flat_state(8)), None, &ctx, &control, &[]);
        assert!(topics(&long).contains(&InsightTopic::Plateau));
        // Still progressing: no plateau yet
        let progressing = exercise_insights(
            &signals(),
            Some(&flat_state(8)),
            Some(ExposureResult::Success),
            &ctx,
            &control,
            &[],
        );
        assert!(!topics(&progressing).contains(&InsightTopic::Plateau));
    }

    #[test]
    fn test_failure_deload_flagged() {
        let mut state = flat_state(2);
        state.last_deload_at = Some(state.updated_at);
        let insights = exercise_insights(
            &signals(),
            Some(&state),
            Some(ExposureResult::Failure),
            &VariationContext::primary("squat"),
            &PolicySelection::control(),
            &[],
        );
        assert!(topics(&insights).contains(&InsightTopic::FailureDeload));
    }

    #[test]
    fn test_break_substitution_and_exploration() {
        let selection = PolicySelection {
            executed_policy_id: PolicyArm::LoadPush,
            exploration_mode: ExplorationMode::Explore,
            executed_action_probability: 0.4,
            shadow_policy_id: None,
            shadow_action_probability: None,
        };
        let ctx = VariationContext::substitution("squat", "leg_press", 0.5);
        let insights = exercise_insights(&signals(), None, None, &ctx, &selection, &[DeloadReason::TrainingBreak]);
        assert_eq!(topics(&insights), vec![
            InsightTopic::ReturningFromBreak,
            InsightTopic::Substitution,
            InsightTopic::Exploration
        ]);
        assert!(insights[0].message.starts_with("20 days"));
        assert_eq!(insights[1].exercise_id.as_deref(), Some("leg_press"));
    }

    #[test]
    fn test_topic_keys_unique() {
        let all = [
            InsightTopic::Plateau,
            InsightTopic::DecliningTrend,
            InsightTopic::LowReadiness,
            InsightTopic::ReturningFromBreak,
            InsightTopic::DeloadWeek,
            InsightTopic::FailureDeload,
            InsightTopic::Substitution,
            InsightTopic::Exploration,
        ];
        let keys: std::collections::BTreeSet<&str> = all.iter().map(|t| t.key()).collect();
        assert_eq!(keys.len(), all.len());
    }
}
