//! Beta priors per (user, family, arm)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::clamp_factor;
use crate::error::StoreError;
use crate::policy::PolicyArm;

/// Belief that an arm succeeds, as Beta(alpha, beta)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPrior {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for BetaPrior {
    fn default() -> Self {
        Self::uniform()
    }
}

impl BetaPrior {
    pub fn uniform() -> Self {
        Self { alpha: 1.0, beta: 1.0 }
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Observations absorbed beyond the uniform start
    pub fn evidence(&self) -> f64 {
        self.alpha + self.beta - 2.0
    }

    /// alpha += w·r, beta += w·(1 - r); both inputs clamped to [0, 1]
    pub fn update(&mut self, reward: f64, weight: f64) {
        let reward = clamp_factor(reward);
        let weight = clamp_factor(weight);
        self.alpha += weight * reward;
        self.beta += weight * (1.0 - reward);
    }

    /// Evidence scaled by `coefficient`, for substitutions borrowing a family's prior
    pub fn shared(&self, coefficient: f64) -> BetaPrior {
        let c = clamp_factor(coefficient);
        BetaPrior {
            alpha: 1.0 + c * (self.alpha - 1.0),
            beta: 1.0 + c * (self.beta - 1.0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.alpha.is_finite() && self.beta.is_finite() && self.alpha >= 1.0 && self.beta >= 1.0
    }
}

/// One persisted prior row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorEntry {
    pub user_id: String,
    pub family_key: String,
    pub arm: PolicyArm,
    pub prior: BetaPrior,
}

type PriorKey = (String, String, PolicyArm);

/// Bandit state store; unseen keys read as Beta(1, 1)
#[derive(Debug, Clone, Default)]
pub struct BanditStore {
    priors: BTreeMap<PriorKey, BetaPrior>,
}

impl BanditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(user_id: &str, family_key: &str, arm: PolicyArm) -> PriorKey {
        (user_id.to_string(), family_key.to_string(), arm)
    }

    pub fn get(&self, user_id: &str, family_key: &str, arm: PolicyArm) -> BetaPrior {
        self.priors
            .get(&Self::key(user_id, family_key, arm))
            .copied()
            .unwrap_or_default()
    }

    /// Apply one weighted reward and return the new prior
    pub fn update(&mut self, user_id: &str, family_key: &str, arm: PolicyArm, reward: f64, weight: f64) -> BetaPrior {
        let prior = self.priors.entry(Self::key(user_id, family_key, arm)).or_default();
        prior.update(reward, weight);
        *prior
    }

    /// Insert a prior loaded from storage
    pub fn insert(&mut self, entry: PriorEntry) -> Result<(), StoreError> {
        if !entry.prior.is_valid() {
            return Err(StoreError::InvalidPrior {
                family_key: entry.family_key,
                arm_id: entry.arm.id().to_string(),
                alpha: entry.prior.alpha,
                beta: entry.prior.beta,
            });
        }
        self.priors
            .insert(Self::key(&entry.user_id, &entry.family_key, entry.arm), entry.prior);
        Ok(())
    }

    /// Forget one family's priors for a user; returns how many were dropped
    pub fn reset_family(&mut self, user_id: &str, family_key: &str) -> usize {
        let before = self.priors.len();
        self.priors
            .retain(|(user, family, _), _| !(user == user_id && family == family_key));
        before - self.priors.len()
    }

    /// Forget every prior for a user
    pub fn reset_user(&mut self, user_id: &str) -> usize {
        let before = self.priors.len();
        self.priors.retain(|(user, _, _), _| user != user_id);
        before - self.priors.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = PriorEntry> + '_ {
        self.priors.iter().map(|((user, family, arm), prior)| PriorEntry {
            user_id: user.clone(),
            family_key: family.clone(),
            arm: *arm,
            prior: *prior,
        })
    }

    pub fn len(&self) -> usize {
        self.priors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }
}
