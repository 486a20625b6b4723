//! Logged performance: sets, exercises and bounded training history

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::e1rm::brzycki;

/// Circumstances an exercise was performed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionContext {
    #[default]
    Normal,
    InjuryDiscomfort,
    EquipmentUnavailable,
    TimeConstrained,
    Interrupted,
}

/// One logged set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResult {
    pub reps: u32,
    pub load: f64,
    pub completed: bool,
    #[serde(default)]
    pub rir: Option<f64>,
    #[serde(default)]
    pub rpe: Option<f64>,
    #[serde(default)]
    pub is_warmup: bool,
}

impl SetResult {
    pub fn working(reps: u32, load: f64) -> Self {
        Self {
            reps,
            load,
            completed: true,
            rir: None,
            rpe: None,
            is_warmup: false,
        }
    }

    pub fn with_rir(mut self, rir: f64) -> Self {
        self.rir = Some(rir);
        self
    }

    pub fn with_rpe(mut self, rpe: f64) -> Self {
        self.rpe = Some(rpe);
        self
    }

    /// Effort proxy: RIR if logged, otherwise derived from RPE (RIR = 10 - RPE)
    pub fn observed_rir(&self) -> Option<f64> {
        self.rir
            .or_else(|| self.rpe.map(|rpe| 10.0 - rpe))
            .filter(|v| v.is_finite())
    }
}

/// An exercise as it was actually performed in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePerformance {
    pub exercise_id: String,
    pub sets: Vec<SetResult>,
    #[serde(default)]
    pub execution_context: ExecutionContext,
    pub performed_at: DateTime<Utc>,
}

impl ExercisePerformance {
    /// Completed non-warmup sets, in logged order
    pub fn working_sets(&self) -> impl Iterator<Item = &SetResult> {
        self.sets.iter().filter(|s| s.completed && !s.is_warmup)
    }

    pub fn any_working_set_completed(&self) -> bool {
        self.working_sets().next().is_some()
    }

    /// Set with the highest Brzycki estimate, with that estimate
    pub fn best_set_for_e1rm(&self) -> Option<(SetResult, f64)> {
        self.working_sets()
            .filter(|s| s.reps > 0 && s.load.is_finite() && s.load > 0.0)
            .map(|s| (*s, brzycki(s.load, s.reps)))
            .filter(|(_, e)| e.is_finite() && *e > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn total_volume(&self) -> f64 {
        self.working_sets()
            .filter(|s| s.load.is_finite() && s.load >= 0.0)
            .map(|s| s.load * s.reps as f64)
            .sum()
    }
}

/// How one exercise exposure ended, for streak bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExposureResult {
    Success,
    Failure,
    Hold,
    Deload,
}

/// Summary of one exercise exposure kept in the training history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureRecord {
    pub exercise_id: String,
    pub performed_at: DateTime<Utc>,
    pub result: ExposureResult,
    pub high_effort: bool,
}

/// Bounded, oldest-first record of recent exposures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: VecDeque<ExposureRecord>,
    capacity: usize,
}

impl Default for TrainingHistory {
    fn default() -> Self {
        Self::with_capacity(TrainingHistory::DEFAULT_CAPACITY)
    }
}

impl TrainingHistory {
    pub const DEFAULT_CAPACITY: usize = 720;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, record: ExposureRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exposures of one exercise, newest first
    pub fn for_exercise<'a>(&'a self, exercise_id: &'a str) -> impl Iterator<Item = &'a ExposureRecord> + 'a {
        self.records.iter().rev().filter(move |r| r.exercise_id == exercise_id)
    }

    pub fn last_exposure(&self, exercise_id: &str) -> Option<DateTime<Utc>> {
        self.for_exercise(exercise_id).map(|r| r.performed_at).next()
    }

    /// Most recent session of any exercise
    pub fn last_session_at(&self) -> Option<DateTime<Utc>> {
        self.records.iter().map(|r| r.performed_at).max()
    }

    pub fn fail_streak(&self, exercise_id: &str) -> u32 {
        self.streak(exercise_id, |r| r.result == ExposureResult::Failure)
    }

    pub fn success_streak(&self, exercise_id: &str) -> u32 {
        self.streak(exercise_id, |r| r.result == ExposureResult::Success)
    }

    pub fn high_effort_streak(&self, exercise_id: &str) -> u32 {
        self.streak(exercise_id, |r| r.high_effort)
    }

    fn streak(&self, exercise_id: &str, pred: impl Fn(&ExposureRecord) -> bool) -> u32 {
        self.for_exercise(exercise_id).take_while(|r| pred(*r)).count() as u32
    }
}
