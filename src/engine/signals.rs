//! Assemble the read-only snapshot policy selection looks at

use chrono::{DateTime, Utc};

use crate::model::{
    AthleteProfile, E1rmTrend, ExerciseState, LiftSignalsSnapshot, SessionIntent, TrainingHistory,
};

/// Today's readiness plus the days before it
#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessReading {
    pub today: u8,
    pub measured: bool,
    /// Oldest first
    pub recent: Vec<u8>,
}

impl ReadinessReading {
    pub fn unmeasured(neutral: u8) -> Self {
        Self {
            today: neutral,
            measured: false,
            recent: Vec::new(),
        }
    }
}

/// Snapshot for one exercise, reproducible from state + history + readiness
pub fn assemble(
    exercise_id: &str,
    state: Option<&ExerciseState>,
    history: &TrainingHistory,
    readiness: &ReadinessReading,
    profile: &AthleteProfile,
    intent: SessionIntent,
    now: DateTime<Utc>,
) -> LiftSignalsSnapshot {
    // Stores loaded without history still know when the state last changed
    let last_exposure = history
        .last_exposure(exercise_id)
        .or_else(|| state.map(|s| s.updated_at));

    LiftSignalsSnapshot {
        exercise_id: exercise_id.to_string(),
        last_working_weight: state.map(|s| s.current_working_weight),
        rolling_e1rm: state.and_then(|s| s.rolling_e1rm),
        failures_count: state.map(|s| s.failures_count).unwrap_or(0),
        fail_streak: history.fail_streak(exercise_id),
        success_streak: history.success_streak(exercise_id),
        high_rpe_streak: history.high_effort_streak(exercise_id),
        successful_exposures: state.map(|s| s.successful_baseline_count).unwrap_or(0),
        days_since_last_exposure: last_exposure.map(|at| (now - at).num_days().max(0)),
        days_since_last_deload: state.and_then(|s| s.days_since_deload(now)),
        trend: state.map(|s| s.e1rm_trend).unwrap_or(E1rmTrend::Insufficient),
        readiness_today: readiness.today,
        readiness_measured: readiness.measured,
        readiness_recent: readiness.recent.clone(),
        bodyweight: profile.bodyweight.filter(|w| w.is_finite() && *w > 0.0),
        experience_level: profile.experience_level,
        session_intent: intent,
    }
}
