//! Per-exercise progression state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Multi-session e1RM trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum E1rmTrend {
    Improving,
    Stable,
    Declining,
    #[default]
    Insufficient,
}

impl E1rmTrend {
    pub fn label(&self) -> &'static str {
        match self {
            E1rmTrend::Improving => "improving",
            E1rmTrend::Stable => "stable",
            E1rmTrend::Declining => "declining",
            E1rmTrend::Insufficient => "insufficient data",
        }
    }
}

/// One session's best-set e1RM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct E1rmSample {
    pub at: DateTime<Utc>,
    pub e1rm: f64,
}

/// Durable state for one exercise; created on first completed set, never deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseState {
    pub exercise_id: String,
    pub current_working_weight: f64,
    #[serde(default)]
    pub failures_count: u32,
    #[serde(default)]
    pub rolling_e1rm: Option<f64>,
    #[serde(default)]
    pub e1rm_trend: E1rmTrend,
    #[serde(default)]
    pub e1rm_history: Vec<E1rmSample>,
    #[serde(default)]
    pub last_deload_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub successful_sessions_count: u32,
    /// Successes under the baseline policy; what the exploration gate counts
    #[serde(default)]
    pub successful_baseline_count: u32,
    /// Rep goal for the next exposure; None until the first evaluation
    #[serde(default)]
    pub next_target_reps: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl ExerciseState {
    /// Cold-start state seeded from the user's entered weight
    pub fn seeded(exercise_id: &str, entered_weight: f64, now: DateTime<Utc>) -> Self {
        let weight = if entered_weight.is_finite() && entered_weight > 0.0 {
            entered_weight
        } else {
            0.0
        };

        Self {
            exercise_id: exercise_id.to_string(),
            current_working_weight: weight,
            failures_count: 0,
            rolling_e1rm: None,
            e1rm_trend: E1rmTrend::Insufficient,
            e1rm_history: Vec::new(),
            last_deload_at: None,
            successful_sessions_count: 0,
            successful_baseline_count: 0,
            next_target_reps: None,
            updated_at: now,
        }
    }

    pub fn record_success(&mut self, baseline: bool) {
        self.successful_sessions_count = self.successful_sessions_count.saturating_add(1);
        if baseline {
            self.successful_baseline_count = self.successful_baseline_count.saturating_add(1);
        }
    }

    /// Append a session estimate, keeping at most `max_len` newest samples
    pub fn push_e1rm(&mut self, sample: E1rmSample, max_len: usize) {
        if !sample.e1rm.is_finite() || sample.e1rm <= 0.0 {
            return;
        }
        self.e1rm_history.push(sample);
        self.e1rm_history.sort_by_key(|s| s.at);
        if self.e1rm_history.len() > max_len {
            let excess = self.e1rm_history.len() - max_len;
            self.e1rm_history.drain(..excess);
        }
    }

    pub fn days_since_deload(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_deload_at.map(|at| (now - at).num_days().max(0))
    }

    /// Reject values that must never reach persisted state
    pub fn validate(&self) -> Result<(), StoreError> {
        let weight = self.current_working_weight;
        if !weight.is_finite() || weight < 0.0 {
            return Err(StoreError::InvalidWeight {
                exercise_id: self.exercise_id.clone(),
                weight,
            });
        }
        if let Some(value) = self.rolling_e1rm {
            if !value.is_finite() || value <= 0.0 {
                return Err(StoreError::InvalidEstimate {
                    exercise_id: self.exercise_id.clone(),
                    value,
                });
            }
        }
        if let Some(bad) = self
            .e1rm_history
            .iter()
            .find(|s| !s.e1rm.is_finite() || s.e1rm <= 0.0)
        {
            return Err(StoreError::InvalidEstimate {
                exercise_id: self.exercise_id.clone(),
                value: bad.e1rm,
            });
        }
        Ok(())
    }
}
