//! Append-only decision log with one-shot outcome attachment

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{DecisionLogEntry, OutcomeRecord};

#[derive(Debug, Clone, Default)]
pub struct DecisionLog {
    entries: Vec<DecisionLogEntry>,
    index: HashMap<Uuid, usize>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; a repeated id keeps the original
    pub fn append(&mut self, entry: DecisionLogEntry) -> Uuid {
        let id = entry.id;
        if self.index.contains_key(&id) {
            tracing::warn!("Decision {} already logged, keeping the original", id);
            return id;
        }
        self.index.insert(id, self.entries.len());
        self.entries.push(entry);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&DecisionLogEntry> {
        self.index.get(id).map(|i| &self.entries[*i])
    }

    /// Attach the outcome and reward; an entry is immutable afterwards
    pub fn attach_outcome(
        &mut self,
        id: Uuid,
        user_id: &str,
        outcome: OutcomeRecord,
        reward: f64,
    ) -> Result<&DecisionLogEntry, StoreError> {
        let index = *self.index.get(&id).ok_or(StoreError::UnknownDecision(id))?;
        let entry = &mut self.entries[index];
        if entry.user_id != user_id {
            return Err(StoreError::WrongUser {
                id,
                owner: entry.user_id.clone(),
                requested: user_id.to_string(),
            });
        }
        if entry.outcome.is_some() {
            return Err(StoreError::OutcomeAlreadyAttached(id));
        }
        entry.outcome = Some(outcome);
        entry.reward = Some(reward);
        Ok(&*entry)
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn pending(&self) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries.iter().filter(|e| !e.has_outcome())
    }

    /// Newest decision for an exercise still waiting for its outcome
    pub fn latest_pending(&self, exercise_id: &str) -> Option<&DecisionLogEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| !e.has_outcome() && e.exercise_id() == exercise_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionLogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DecisionAction, Direction, E1rmTrend, ExecutionContext, ExperienceLevel, LiftSignalsSnapshot,
        PolicySelection, ProgressionRules, RepRange, SessionIntent, VariationContext,
    };
    use chrono::Utc;

    fn entry(user: &str, n: u128) -> DecisionLogEntry {
        DecisionLogEntry {
            id: Uuid::from_u128(n),
            user_id: user.to_string(),
            created_at: Utc::now(),
            signals: LiftSignalsSnapshot {
                exercise_id: "bench".to_string(),
                last_working_weight: None,
                rolling_e1rm: None,
                failures_count: 0,
                fail_streak: 0,
                success_streak: 0,
                high_rpe_streak: 0,
                successful_exposures: 0,
                days_since_last_exposure: None,
                days_since_last_deload: None,
                trend: E1rmTrend::Insufficient,
                readiness_today: 75,
                readiness_measured: false,
                readiness_recent: Vec::new(),
                bodyweight: None,
                experience_level: ExperienceLevel::Novice,
                session_intent: SessionIntent::Train,
            },
            variation: VariationContext::primary("bench"),
            constraints: ProgressionRules::new(RepRange::new(8, 12), 5.0, 0.9, 2),
            action: DecisionAction {
                direction: Direction::Hold,
                prescribed_load: 60.0,
                weight_delta: 0.0,
                reps_delta: 0,
                sets_delta: 0,
                explanation: "first session".to_string(),
                confidence: 0.5,
            },
            selection: PolicySelection::control(),
            exposure: None,
            outcome: None,
            reward: None,
        }
    }

    fn outcome() -> OutcomeRecord {
        OutcomeRecord {
            sets: Vec::new(),
            total_volume: 0.0,
            session_e1rm: None,
            was_success: true,
            was_failure: false,
            was_grinder: false,
            execution_context: ExecutionContext::Normal,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_attach_once() {
        let mut log = DecisionLog::new();
        let id = log.append(entry("u1", 1));
        assert_eq!(log.pending().count(), 1);

        let attached = log.attach_outcome(id, "u1", outcome(), 1.0).unwrap();
        assert_eq!(attached.reward, Some(1.0));
        assert_eq!(log.pending().count(), 0);

        assert_eq!(
            log.attach_outcome(id, "u1", outcome(), 0.0).unwrap_err(),
            StoreError::OutcomeAlreadyAttached(id)
        );
        assert_eq!(log.get(&id).unwrap().reward, Some(1.0));
    }

    #[test]
    fn test_attach_errors() {
        let mut log = DecisionLog::new();
        let id = log.append(entry("u1", 1));
        assert!(matches!(
            log.attach_outcome(id, "u2", outcome(), 1.0),
            Err(StoreError::WrongUser { .. })
        ));
        let missing = Uuid::from_u128(99);
        assert_eq!(
            log.attach_outcome(missing, "u1", outcome(), 1.0).unwrap_err(),
            StoreError::UnknownDecision(missing)
        );
    }

    #[test]
    fn test_duplicate_append_keeps_original() {
        let mut log = DecisionLog::new();
        log.append(entry("u1", 7));
        let mut dup = entry("u1", 7);
        dup.action.explanation = "changed".to_string();
        log.append(dup);
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(&Uuid::from_u128(7)).unwrap().action.explanation, "first session");
    }

    #[test]
    fn test_recent_newest_first() {
        let mut log = DecisionLog::new();
        for n in 1..=5 {
            log.append(entry("u1", n));
        }
        let ids: Vec<u128> = log.recent(2).map(|e| e.id.as_u128()).collect();
        assert_eq!(ids, vec![5, 4]);
    }
}
