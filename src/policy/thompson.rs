//! Thompson sampling over progression arms, one Beta prior per family
//!
//! Selection draws one sample per arm from Beta(alpha, beta) and keeps the
//! highest. The executed arm's probability is estimated by re-running the
//! draw from the same seeded source, so logged probabilities replay too.

use rand::Rng;
use rand_distr::{Beta, Distribution};

use super::gate::SafetyGate;
use super::reward::reward;
use super::{PolicyArm, PolicySelector};
use crate::config::{BanditConfig, BanditMode};
use crate::model::{DecisionLogEntry, ExplorationMode, LiftSignalsSnapshot, PolicySelection, VariationContext};
use crate::store::{BanditStore, BetaPrior};

/// One Beta draw; falls back to the mean for parameters rand_distr rejects
pub fn sample_beta<R: Rng + ?Sized>(prior: &BetaPrior, rng: &mut R) -> f64 {
    let alpha = if prior.alpha.is_finite() { prior.alpha.max(f64::MIN_POSITIVE) } else { 1.0 };
    let beta = if prior.beta.is_finite() { prior.beta.max(f64::MIN_POSITIVE) } else { 1.0 };
    match Beta::new(alpha, beta) {
        Ok(dist) => {
            let x = dist.sample(rng);
            if x.is_finite() { x } else { alpha / (alpha + beta) }
        }
        Err(_) => alpha / (alpha + beta),
    }
}

/// Index of the largest value; ties go to the earliest
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

pub struct ThompsonSelector<'a, R: Rng> {
    config: BanditConfig,
    store: &'a mut BanditStore,
    rng: &'a mut R,
}

impl<'a, R: Rng> ThompsonSelector<'a, R> {
    pub fn new(config: &BanditConfig, store: &'a mut BanditStore, rng: &'a mut R) -> Self {
        Self {
            config: config.sanitized(),
            store,
            rng,
        }
    }

    /// Priors in arm order, scaled down for substitutions
    fn priors(&self, variation: &VariationContext, user_id: &str) -> Vec<BetaPrior> {
        self.config
            .arms
            .iter()
            .map(|arm| {
                let prior = self.store.get(user_id, &variation.family_key, *arm);
                if variation.is_substitution {
                    prior.shared(variation.sharing_coefficient)
                } else {
                    prior
                }
            })
            .collect()
    }

    fn draw(&mut self, priors: &[BetaPrior]) -> usize {
        let samples: Vec<f64> = priors.iter().map(|p| sample_beta(p, &mut *self.rng)).collect();
        argmax(&samples)
    }

    /// Share of re-draws won by `chosen`, kept inside (0, 1]
    fn estimate_probability(&mut self, priors: &[BetaPrior], chosen: usize) -> f64 {
        let draws = self.config.probability_draws.max(1);
        let wins = (0..draws).filter(|_| self.draw(priors) == chosen).count() as f64;
        let floor = 1.0 / (f64::from(draws) + 1.0);
        (wins / f64::from(draws)).max(floor).min(1.0)
    }
}

impl<R: Rng> PolicySelector for ThompsonSelector<'_, R> {
    fn select_policy(
        &mut self,
        signals: &LiftSignalsSnapshot,
        variation: &VariationContext,
        user_id: &str,
    ) -> PolicySelection {
        if let Err(block) = SafetyGate::new(&self.config).check(signals) {
            tracing::debug!("Exploration gated for {} ({}): {}", user_id, signals.exercise_id, block);
            return PolicySelection::control();
        }

        let priors = self.priors(variation, user_id);
        let chosen = self.draw(&priors);
        let probability = self.estimate_probability(&priors, chosen);
        let arm = self.config.arms.get(chosen).copied().unwrap_or(PolicyArm::Baseline);

        match self.config.mode {
            BanditMode::Explore => PolicySelection {
                executed_policy_id: arm,
                exploration_mode: ExplorationMode::Explore,
                executed_action_probability: probability,
                shadow_policy_id: None,
                shadow_action_probability: None,
            },
            BanditMode::Shadow => PolicySelection {
                executed_policy_id: PolicyArm::Baseline,
                exploration_mode: ExplorationMode::Shadow,
                executed_action_probability: 1.0,
                shadow_policy_id: Some(arm),
                shadow_action_probability: Some(probability),
            },
        }
    }

    fn record_outcome(&mut self, entry: &DecisionLogEntry, user_id: &str) -> Option<f64> {
        if entry.user_id != user_id {
            tracing::warn!("Decision {} belongs to {}, not {}", entry.id, entry.user_id, user_id);
            return None;
        }
        if entry.selection.exploration_mode != ExplorationMode::Explore {
            return None;
        }
        let outcome = entry.outcome.as_ref()?;
        if !outcome.has_completed_sets() {
            return None;
        }

        let value = entry.reward.unwrap_or_else(|| reward(outcome));
        let weight = if entry.variation.is_substitution {
            entry.variation.sharing_coefficient
        } else {
            1.0
        };
        let updated = self.store.update(
            user_id,
            &entry.variation.family_key,
            entry.selection.executed_policy_id,
            value,
            weight,
        );
        tracing::debug!(
            "Prior {}/{} -> Beta({:.2}, {:.2})",
            entry.variation.family_key,
            entry.selection.executed_policy_id,
            updated.alpha,
            updated.beta
        );
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DecisionAction, Direction, E1rmTrend, ExecutionContext, ExperienceLevel, OutcomeRecord, ProgressionRules,
        RepRange, SessionIntent, SetOutcome,
    };
    use crate::rng::SplitMix64;
    use rand::SeedableRng;
    use chrono::Utc;
    use uuid::Uuid;

    const FAMILY: &str = "squat:barbell";

    fn signals() -> LiftSignalsSnapshot {
        LiftSignalsSnapshot {
            exercise_id: "squat".to_string(),
            last_working_weight: Some(140.0),
            rolling_e1rm: Some(180.0),
            failures_count: 0,
            fail_streak: 0,
            success_streak: 2,
            high_rpe_streak: 0,
            successful_exposures: 6,
            days_since_last_exposure: Some(3),
            days_since_last_deload: None,
            trend: E1rmTrend::Improving,
            readiness_today: 80,
            readiness_measured: true,
            readiness_recent: Vec::new(),
            bodyweight: None,
            experience_level: ExperienceLevel::Intermediate,
            session_intent: SessionIntent::Train,
        }
    }

    fn entry(selection: PolicySelection, variation: VariationContext, success: bool) -> DecisionLogEntry {
        DecisionLogEntry {
            id: Uuid::from_u128(1),
            user_id: "u1".to_string(),
            created_at: Utc::now(),
            signals: signals(),
            variation,
            constraints: ProgressionRules::new(RepRange::new(8, 12), 5.0, 0.9, 2),
            action: DecisionAction {
                direction: Direction::Increase,
                prescribed_load: 145.0,
                weight_delta: 5.0,
                reps_delta: 0,
                sets_delta: 0,
                explanation: String::new(),
                confidence: 0.5,
            },
            selection,
            exposure: None,
            outcome: Some(OutcomeRecord {
                sets: vec![SetOutcome {
                    reps: 8,
                    load: 145.0,
                    rir: Some(2.0),
                    completed: true,
                }],
                total_volume: 1160.0,
                session_e1rm: None,
                was_success: success,
                was_failure: !success,
                was_grinder: false,
                execution_context: ExecutionContext::Normal,
                recorded_at: Utc::now(),
            }),
            reward: None,
        }
    }

    fn explore(arm: PolicyArm) -> PolicySelection {
        PolicySelection {
            executed_policy_id: arm,
            exploration_mode: ExplorationMode::Explore,
            executed_action_probability: 0.4,
            shadow_policy_id: None,
            shadow_action_probability: None,
        }
    }

    #[test]
    fn test_gate_falls_back_to_control() {
        let config = BanditConfig::default();
        let mut store = BanditStore::new();
        let mut rng = SplitMix64::seed_from_u64(1);
        let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);

        let mut s = signals();
        s.successful_exposures = 0;
        assert_eq!(
            selector.select_policy(&s, &VariationContext::primary("squat"), "u1"),
            PolicySelection::control()
        );

        let mut s = signals();
        s.readiness_today = 30;
        assert_eq!(
            selector.select_policy(&s, &VariationContext::primary("squat"), "u1"),
            PolicySelection::control()
        );

        let mut s = signals();
        s.fail_streak = config.max_fail_streak + 1;
        assert_eq!(
            selector.select_policy(&s, &VariationContext::primary("squat"), "u1"),
            PolicySelection::control()
        );

        let mut s = signals();
        s.session_intent = SessionIntent::Deload;
        assert_eq!(
            selector.select_policy(&s, &VariationContext::primary("squat"), "u1"),
            PolicySelection::control()
        );
    }

    #[test]
    fn test_deload_exploration_when_allowed() {
        let config = BanditConfig {
            explore_during_deload: true,
            ..Default::default()
        };
        let mut store = BanditStore::new();
        let mut rng = SplitMix64::seed_from_u64(1);
        let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
        let mut s = signals();
        s.session_intent = SessionIntent::Deload;
        let selection = selector.select_policy(&s, &VariationContext::primary("squat"), "u1");
        assert_eq!(selection.exploration_mode, ExplorationMode::Explore);
    }

    #[test]
    fn test_explore_selection_is_reproducible() {
        let config = BanditConfig::default();
        let pick = |seed: u64| {
            let mut store = BanditStore::new();
            let mut rng = SplitMix64::seed_from_u64(seed);
            let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
            (0..20)
                .map(|_| selector.select_policy(&signals(), &VariationContext::primary("squat"), "u1"))
                .collect::<Vec<_>>()
        };
        let a = pick(42);
        assert_eq!(a, pick(42));
        for selection in &a {
            assert_eq!(selection.exploration_mode, ExplorationMode::Explore);
            let p = selection.executed_action_probability;
            assert!(p > 0.0 && p <= 1.0);
        }
    }

    #[test]
    fn test_strong_prior_dominates() {
        let config = BanditConfig::default();
        let mut store = BanditStore::new();
        for _ in 0..200 {
            store.update("u1", FAMILY, PolicyArm::MicroLoad, 1.0, 1.0);
        }
        for arm in [PolicyArm::Baseline, PolicyArm::LoadPush, PolicyArm::RepExtension, PolicyArm::VolumeTrim] {
            for _ in 0..200 {
                store.update("u1", FAMILY, arm, 0.0, 1.0);
            }
        }
        let mut rng = SplitMix64::seed_from_u64(5);
        let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
        let selection = selector.select_policy(&signals(), &VariationContext::primary("squat"), "u1");
        assert_eq!(selection.executed_policy_id, PolicyArm::MicroLoad);
        assert!(selection.executed_action_probability > 0.9);
    }

    #[test]
    fn test_shadow_executes_baseline() {
        let config = BanditConfig {
            mode: BanditMode::Shadow,
            ..Default::default()
        };
        let mut store = BanditStore::new();
        let mut rng = SplitMix64::seed_from_u64(9);
        let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
        let selection = selector.select_policy(&signals(), &VariationContext::primary("squat"), "u1");
        assert_eq!(selection.executed_policy_id, PolicyArm::Baseline);
        assert_eq!(selection.exploration_mode, ExplorationMode::Shadow);
        assert_eq!(selection.executed_action_probability, 1.0);
        assert!(selection.shadow_policy_id.is_some());
        assert!(selection.shadow_action_probability.is_some());
    }

    #[test]
    fn test_only_explore_entries_update_priors() {
        let config = BanditConfig::default();
        let mut store = BanditStore::new();
        let mut rng = SplitMix64::seed_from_u64(3);
        let variation = VariationContext::primary("squat");

        {
            let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
            assert_eq!(
                selector.record_outcome(&entry(PolicySelection::control(), variation.clone(), true), "u1"),
                None
            );
            let shadow = PolicySelection {
                executed_policy_id: PolicyArm::Baseline,
                exploration_mode: ExplorationMode::Shadow,
                executed_action_probability: 1.0,
                shadow_policy_id: Some(PolicyArm::LoadPush),
                shadow_action_probability: Some(0.3),
            };
            assert_eq!(selector.record_outcome(&entry(shadow, variation.clone(), true), "u1"), None);
        }
        assert!(store.is_empty());

        {
            let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
            let applied = selector.record_outcome(&entry(explore(PolicyArm::LoadPush), variation.clone(), true), "u1");
            assert_eq!(applied, Some(1.0));
        }
        assert_eq!(store.get("u1", FAMILY, PolicyArm::LoadPush), BetaPrior { alpha: 2.0, beta: 1.0 });
    }

    #[test]
    fn test_substitution_updates_canonical_family_weighted() {
        let config = BanditConfig::default();
        let mut store = BanditStore::new();
        let mut rng = SplitMix64::seed_from_u64(3);
        let variation = VariationContext::substitution("squat", "goblet_squat", 0.5);
        {
            let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
            selector.record_outcome(&entry(explore(PolicyArm::Baseline), variation, false), "u1");
        }
        assert_eq!(store.get("u1", FAMILY, PolicyArm::Baseline), BetaPrior { alpha: 1.0, beta: 1.5 });
    }

    #[test]
    fn test_wrong_user_or_empty_outcome_ignored() {
        let config = BanditConfig::default();
        let mut store = BanditStore::new();
        let mut rng = SplitMix64::seed_from_u64(3);
        let variation = VariationContext::primary("squat");
        {
            let mut selector = ThompsonSelector::new(&config, &mut store, &mut rng);
            let e = entry(explore(PolicyArm::LoadPush), variation.clone(), true);
            assert_eq!(selector.record_outcome(&e, "someone_else"), None);

            let mut empty = entry(explore(PolicyArm::LoadPush), variation, true);
            if let Some(outcome) = empty.outcome.as_mut() {
                outcome.sets.clear();
            }
            assert_eq!(selector.record_outcome(&empty, "u1"), None);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_argmax_ties_go_first() {
        assert_eq!(argmax(&[0.5, 0.5, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
    }

    #[test]
    fn test_sample_beta_in_unit_interval() {
        let mut rng = SplitMix64::seed_from_u64(11);
        for prior in [
            BetaPrior::uniform(),
            BetaPrior { alpha: 50.0, beta: 2.0 },
            BetaPrior { alpha: f64::NAN, beta: 3.0 },
        ] {
            for _ in 0..200 {
                let x = sample_beta(&prior, &mut rng);
                assert!((0.0..=1.0).contains(&x));
            }
        }
    }
}
