//! Read-only decision inputs: signals snapshot and variation context

use serde::{Deserialize, Serialize};

use super::state::E1rmTrend;
use crate::catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExperienceLevel {
    Novice,
    #[default]
    Intermediate,
    Advanced,
}

/// Slow-changing athlete attributes supplied by the profile owner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteProfile {
    pub bodyweight: Option<f64>,
    pub experience_level: ExperienceLevel,
}

/// What the session is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionIntent {
    #[default]
    Train,
    /// Session-level deload (planned week or critical readiness)
    Deload,
}

/// Everything policy selection may look at; assembled, never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftSignalsSnapshot {
    pub exercise_id: String,
    /// None until the first logged set
    pub last_working_weight: Option<f64>,
    pub rolling_e1rm: Option<f64>,
    pub failures_count: u32,
    pub fail_streak: u32,
    pub success_streak: u32,
    pub high_rpe_streak: u32,
    pub successful_exposures: u32,
    pub days_since_last_exposure: Option<i64>,
    pub days_since_last_deload: Option<i64>,
    pub trend: E1rmTrend,
    /// Today's readiness, neutral default when unmeasured
    pub readiness_today: u8,
    pub readiness_measured: bool,
    /// Readiness of the preceding days, oldest first
    pub readiness_recent: Vec<u8>,
    pub bodyweight: Option<f64>,
    pub experience_level: ExperienceLevel,
    pub session_intent: SessionIntent,
}

/// Planned vs. performed exercise, and the family it learns with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationContext {
    pub planned_exercise_id: String,
    pub performed_exercise_id: String,
    pub is_substitution: bool,
    /// Canonical family, the key bandit priors are stored under
    pub family_key: String,
    /// Family of the exercise actually performed
    pub performed_family_key: String,
    /// Weight of evidence shared with the canonical family (1.0 for primaries)
    pub sharing_coefficient: f64,
}

impl VariationContext {
    pub fn primary(exercise_id: &str) -> Self {
        let family = catalog::family_for(exercise_id);
        Self {
            planned_exercise_id: exercise_id.to_string(),
            performed_exercise_id: exercise_id.to_string(),
            is_substitution: false,
            family_key: family.clone(),
            performed_family_key: family,
            sharing_coefficient: 1.0,
        }
    }

    pub fn substitution(planned: &str, performed: &str, coefficient: f64) -> Self {
        Self {
            planned_exercise_id: planned.to_string(),
            performed_exercise_id: performed.to_string(),
            is_substitution: true,
            family_key: catalog::family_for(planned),
            performed_family_key: catalog::family_for(performed),
            sharing_coefficient: crate::config::clamp_factor(coefficient),
        }
    }
}
