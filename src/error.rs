//! Store-level error types

use thiserror::Error;
use uuid::Uuid;

/// Rejections raised when writing or reading persisted engine state
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("refusing to store non-finite or negative weight {weight} for {exercise_id}")]
    InvalidWeight { exercise_id: String, weight: f64 },

    #[error("refusing to store invalid e1RM {value} for {exercise_id}")]
    InvalidEstimate { exercise_id: String, value: f64 },

    #[error("refusing to store invalid beta prior ({alpha}, {beta}) for {family_key}/{arm_id}")]
    InvalidPrior {
        family_key: String,
        arm_id: String,
        alpha: f64,
        beta: f64,
    },

    #[error("decision {0} not found")]
    UnknownDecision(Uuid),

    #[error("decision {0} already has an outcome")]
    OutcomeAlreadyAttached(Uuid),

    #[error("decision {id} belongs to {owner}, not {requested}")]
    WrongUser {
        id: Uuid,
        owner: String,
        requested: String,
    },

    #[error("corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
}

/// Result of loading a collection where bad rows are skipped, not fatal
#[derive(Debug, Clone)]
pub struct LoadReport<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Default for LoadReport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> LoadReport<T> {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// One row that could not be decoded
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: String,
}

impl From<SkippedRecord> for StoreError {
    fn from(record: SkippedRecord) -> Self {
        StoreError::CorruptRecord {
            key: record.key,
            reason: record.reason,
        }
    }
}
