//! Per-exercise state for one athlete

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::model::ExerciseState;

#[derive(Debug, Clone, Default)]
pub struct StateStore {
    states: BTreeMap<String, ExerciseState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, exercise_id: &str) -> Option<&ExerciseState> {
        self.states.get(exercise_id)
    }

    /// Write a state, rejecting anything that fails validation
    pub fn upsert(&mut self, state: ExerciseState) -> Result<(), StoreError> {
        if let Err(e) = state.validate() {
            tracing::warn!("Rejected state write: {}", e);
            return Err(e);
        }
        self.states.insert(state.exercise_id.clone(), state);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseState> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
