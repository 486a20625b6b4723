//! Persistence seam; the engine never talks to storage directly

use anyhow::Result;

use super::bandit::PriorEntry;
use crate::error::LoadReport;
use crate::model::{DecisionLogEntry, ExerciseState};

pub trait Repository {
    fn load_states(&self, user_id: &str) -> Result<LoadReport<ExerciseState>>;

    /// Rejects non-finite or negative weights
    fn save_state(&self, user_id: &str, state: &ExerciseState) -> Result<()>;

    fn load_priors(&self, user_id: &str) -> Result<LoadReport<PriorEntry>>;

    fn save_prior(&self, entry: &PriorEntry) -> Result<()>;

    /// Drop priors for one family, or every family when `family_key` is None
    fn reset_priors(&self, user_id: &str, family_key: Option<&str>) -> Result<usize>;

    /// Insert a decision, or attach its outcome if one was stored without
    fn save_decision(&self, entry: &DecisionLogEntry) -> Result<()>;

    /// Oldest first
    fn load_decisions(&self, user_id: &str) -> Result<LoadReport<DecisionLogEntry>>;

    /// Newest first
    fn recent_decisions(&self, user_id: &str, limit: usize) -> Result<LoadReport<DecisionLogEntry>>;
}
