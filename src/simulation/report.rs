//! Aggregate statistics of a simulated training block

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{DeloadReason, NextPrescriptionSnapshot, ProgressionDecision};
use crate::planner::{SessionCompletion, SessionPlan};
use crate::store::AthleteStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationReport {
    pub archetype: String,
    pub scenario: String,
    pub workouts: u32,
    pub seed: u64,
    pub exercises_planned: u32,
    pub load_increases: u32,
    pub rep_increases: u32,
    pub holds: u32,
    pub failures: u32,
    /// Failure deloads that cut the stored working weight
    pub load_decreases: u32,
    pub deloads_by_reason: BTreeMap<String, u32>,
    pub insights_by_topic: BTreeMap<String, u32>,
    pub modes: BTreeMap<String, u32>,
    /// Arms executed in explore mode
    pub arm_histogram: BTreeMap<String, u32>,
    /// Arms that would have run in shadow mode
    pub shadow_histogram: BTreeMap<String, u32>,
    pub rewards_applied: u32,
    pub mean_reward: Option<f64>,
    pub completion_errors: u32,
    pub final_weights: BTreeMap<String, f64>,
    pub final_e1rm: BTreeMap<String, f64>,
    pub true_maxes: BTreeMap<String, f64>,
    /// Posterior mean per family and arm
    pub arm_means: BTreeMap<String, BTreeMap<String, f64>>,
}

fn bump(map: &mut BTreeMap<String, u32>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

impl SimulationReport {
    pub fn new(archetype: &str, scenario: &str, workouts: u32, seed: u64) -> Self {
        Self {
            archetype: archetype.to_string(),
            scenario: scenario.to_string(),
            workouts,
            seed,
            ..Default::default()
        }
    }

    /// Count what the planner decided
    pub fn record_plan(&mut self, plan: &SessionPlan) {
        for exercise in &plan.exercises {
            self.exercises_planned += 1;
            for reason in &exercise.adjustment.reasons {
                bump(&mut self.deloads_by_reason, reason.label());
            }
            let selection = &exercise.selection;
            bump(&mut self.modes, selection.exploration_mode.label());
            if selection.exploration_mode == crate::model::ExplorationMode::Explore {
                bump(&mut self.arm_histogram, selection.executed_policy_id.id());
            }
            if let Some(shadow) = selection.shadow_policy_id {
                bump(&mut self.shadow_histogram, shadow.id());
            }
        }
        for insight in &plan.insights {
            bump(&mut self.insights_by_topic, insight.topic.key());
        }
    }

    /// Count what the session's results did to state and priors
    pub fn record_completion(&mut self, completion: &SessionCompletion) {
        for snapshot in &completion.snapshots {
            self.record_snapshot(snapshot);
        }
        let total = self.mean_reward.unwrap_or(0.0) * f64::from(self.rewards_applied)
            + completion.rewards.iter().map(|(_, r)| r).sum::<f64>();
        self.rewards_applied += completion.rewards.len() as u32;
        if self.rewards_applied > 0 {
            self.mean_reward = Some(total / f64::from(self.rewards_applied));
        }
        self.completion_errors += completion.errors.len() as u32;
    }

    fn record_snapshot(&mut self, snapshot: &NextPrescriptionSnapshot) {
        match snapshot.decision {
            ProgressionDecision::IncreaseLoad { .. } => self.load_increases += 1,
            ProgressionDecision::IncreaseReps { .. } => self.rep_increases += 1,
            ProgressionDecision::Hold { .. } => self.holds += 1,
            ProgressionDecision::Failure { .. } => self.failures += 1,
        }
        if snapshot.deload_reason == Some(DeloadReason::FailureThreshold) {
            self.load_decreases += 1;
            bump(&mut self.deloads_by_reason, DeloadReason::FailureThreshold.label());
        }
    }

    /// Final state, truth and posteriors
    pub fn finish(&mut self, store: &AthleteStore, true_maxes: &BTreeMap<String, f64>) {
        for state in store.states.iter() {
            self.final_weights
                .insert(state.exercise_id.clone(), state.current_working_weight);
            if let Some(e1rm) = state.rolling_e1rm {
                self.final_e1rm.insert(state.exercise_id.clone(), e1rm);
            }
        }
        self.true_maxes = true_maxes
            .iter()
            .filter(|(id, _)| self.final_weights.contains_key(*id))
            .map(|(id, max)| (id.clone(), *max))
            .collect();
        for entry in store.priors.entries() {
            self.arm_means
                .entry(entry.family_key)
                .or_default()
                .insert(entry.arm.id().to_string(), entry.prior.mean());
        }
    }
}
