//! Decision log records: what was recommended, by which policy, and what happened

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::performance::ExecutionContext;
use super::prescription::ProgressionRules;
use super::signals::{LiftSignalsSnapshot, VariationContext};
use crate::engine::ExposurePlan;
use crate::policy::PolicyArm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExplorationMode {
    Control,
    Explore,
    Shadow,
}

impl ExplorationMode {
    pub fn label(&self) -> &'static str {
        match self {
            ExplorationMode::Control => "control",
            ExplorationMode::Explore => "explore",
            ExplorationMode::Shadow => "shadow",
        }
    }
}

/// Which policy acted, and how likely that choice was
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySelection {
    pub executed_policy_id: PolicyArm,
    pub exploration_mode: ExplorationMode,
    /// In (0, 1]
    pub executed_action_probability: f64,
    #[serde(default)]
    pub shadow_policy_id: Option<PolicyArm>,
    #[serde(default)]
    pub shadow_action_probability: Option<f64>,
}

impl PolicySelection {
    pub fn control() -> Self {
        Self {
            executed_policy_id: PolicyArm::Baseline,
            exploration_mode: ExplorationMode::Control,
            executed_action_probability: 1.0,
            shadow_policy_id: None,
            shadow_action_probability: None,
        }
    }

    pub fn is_control(&self) -> bool {
        self.exploration_mode == ExplorationMode::Control
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Increase,
    Hold,
    Decrease,
}

/// The prescription change relative to the stored working state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionAction {
    pub direction: Direction,
    pub prescribed_load: f64,
    pub weight_delta: f64,
    pub reps_delta: i32,
    pub sets_delta: i32,
    pub explanation: String,
    /// In [0, 1]
    pub confidence: f64,
}

/// One set as it was logged against a decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOutcome {
    pub reps: u32,
    pub load: f64,
    pub rir: Option<f64>,
    pub completed: bool,
}

/// What actually happened after a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub sets: Vec<SetOutcome>,
    pub total_volume: f64,
    pub session_e1rm: Option<f64>,
    pub was_success: bool,
    pub was_failure: bool,
    pub was_grinder: bool,
    pub execution_context: ExecutionContext,
    pub recorded_at: DateTime<Utc>,
}

impl OutcomeRecord {
    /// No completed working set means nothing to learn from
    pub fn has_completed_sets(&self) -> bool {
        self.sets.iter().any(|s| s.completed)
    }
}

/// Append-only audit record of one recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub signals: LiftSignalsSnapshot,
    pub variation: VariationContext,
    /// Clamped parameters actually used
    pub constraints: ProgressionRules,
    pub action: DecisionAction,
    pub selection: PolicySelection,
    /// What the result will be judged against; absent on entries logged before it was recorded
    #[serde(default)]
    pub exposure: Option<ExposurePlan>,
    #[serde(default)]
    pub outcome: Option<OutcomeRecord>,
    #[serde(default)]
    pub reward: Option<f64>,
}

impl DecisionLogEntry {
    pub fn exercise_id(&self) -> &str {
        &self.variation.performed_exercise_id
    }

    pub fn has_outcome(&self) -> bool {
        self.outcome.is_some()
    }
}
