//! Everything mutable about one athlete, locked as a unit

use anyhow::Result;

use super::bandit::BanditStore;
use super::decision_log::DecisionLog;
use super::repository::Repository;
use super::state_store::StateStore;
use crate::error::SkippedRecord;
use crate::model::{DecisionLogEntry, ExposureRecord, ExposureResult, SessionIntent, TrainingHistory};
use crate::rng::SplitMix64;

/// Exposure implied by a completed decision; pending decisions have none
fn exposure_from(entry: &DecisionLogEntry) -> Option<ExposureRecord> {
    let outcome = entry.outcome.as_ref()?;
    let result = if entry.signals.session_intent == SessionIntent::Deload {
        ExposureResult::Deload
    } else if outcome.was_success {
        ExposureResult::Success
    } else if outcome.was_failure {
        ExposureResult::Failure
    } else {
        ExposureResult::Hold
    };
    Some(ExposureRecord {
        exercise_id: entry.exercise_id().to_string(),
        performed_at: outcome.recorded_at,
        result,
        high_effort: outcome.was_grinder,
    })
}

/// Per-user stream, offset by decisions already logged so a restart does not replay old draws
fn stream(seed: u64, user_id: &str, resume_at: usize) -> SplitMix64 {
    crate::rng::derive(seed, &format!("{}#{}", user_id, resume_at))
}

pub struct AthleteStore {
    user_id: String,
    pub states: StateStore,
    pub priors: BanditStore,
    pub log: DecisionLog,
    pub history: TrainingHistory,
    /// Source for bandit draws and decision ids
    pub rng: SplitMix64,
}

impl AthleteStore {
    pub fn new(user_id: &str, seed: u64) -> Self {
        Self {
            user_id: user_id.to_string(),
            states: StateStore::new(),
            priors: BanditStore::new(),
            log: DecisionLog::new(),
            history: TrainingHistory::default(),
            rng: stream(seed, user_id, 0),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Load a user's persisted stores; corrupt rows are skipped and returned
    pub fn load(repo: &dyn Repository, user_id: &str, seed: u64) -> Result<(Self, Vec<SkippedRecord>)> {
        let mut store = Self::new(user_id, seed);
        let mut skipped = Vec::new();

        let states = repo.load_states(user_id)?;
        skipped.extend(states.skipped);
        for state in states.records {
            let key = state.exercise_id.clone();
            if let Err(e) = store.states.upsert(state) {
                skipped.push(SkippedRecord {
                    key,
                    reason: e.to_string(),
                });
            }
        }

        let priors = repo.load_priors(user_id)?;
        skipped.extend(priors.skipped);
        for entry in priors.records {
            let key = format!("{}/{}", entry.family_key, entry.arm);
            if let Err(e) = store.priors.insert(entry) {
                tracing::warn!("Skipping prior {}: {}", key, e);
                skipped.push(SkippedRecord {
                    key,
                    reason: e.to_string(),
                });
            }
        }

        let decisions = repo.load_decisions(user_id)?;
        skipped.extend(decisions.skipped);
        for entry in decisions.records {
            if let Some(exposure) = exposure_from(&entry) {
                store.history.push(exposure);
            }
            store.log.append(entry);
        }

        store.rng = stream(seed, user_id, store.log.len());

        tracing::info!(
            "Loaded {}: {} states, {} priors, {} decisions, {} skipped",
            user_id,
            store.states.len(),
            store.priors.len(),
            store.log.len(),
            skipped.len()
        );
        Ok((store, skipped))
    }

    /// Write every state, prior and decision back
    pub fn persist(&self, repo: &dyn Repository) -> Result<()> {
        for state in self.states.iter() {
            repo.save_state(&self.user_id, state)?;
        }
        for entry in self.priors.entries() {
            repo.save_prior(&entry)?;
        }
        for entry in self.log.iter() {
            repo.save_decision(entry)?;
        }
        Ok(())
    }
}
