//! Reward shaping for bandit updates

use crate::model::{ExecutionContext, OutcomeRecord};

/// 1.0 for a clean success, 0.0 for anything else
pub fn reward(outcome: &OutcomeRecord) -> f64 {
    let clean = outcome.was_success
        && !outcome.was_failure
        && !outcome.was_grinder
        && outcome.execution_context != ExecutionContext::InjuryDiscomfort;
    if clean { 1.0 } else { 0.0 }
}
