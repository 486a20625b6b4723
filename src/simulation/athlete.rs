//! Synthetic athlete: performs prescriptions and produces biometrics

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::archetype::AthleteTraits;
use crate::engine::e1rm::MAX_BRZYCKI_REPS;
use crate::model::{DailyBiometrics, ExecutionContext, ExercisePerformance, SetResult};
use crate::planner::{PlannedExercise, round_to_step};
use crate::rng::SplitMix64;

/// Reps lost per additional set from fatigue
const SET_FATIGUE: f64 = 0.4;
/// Fraction of true 1RM picked when no load is prescribed
const SELF_SELECTED_INTENSITY: f64 = 0.6;
/// Strength lost per day beyond two weeks off
const DETRAINING_PER_DAY: f64 = 0.002;

fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    Normal::new(mean, sd.max(0.0)).map(|d| d.sample(rng)).unwrap_or(mean)
}

/// Reps possible at `load` for a given 1RM (inverse Brzycki)
pub fn reps_at(load: f64, one_rm: f64) -> f64 {
    if !load.is_finite() || load <= 0.0 {
        return f64::from(MAX_BRZYCKI_REPS);
    }
    if !one_rm.is_finite() || one_rm <= 0.0 {
        return 0.0;
    }
    (37.0 - 36.0 * load / one_rm).clamp(0.0, f64::from(MAX_BRZYCKI_REPS))
}

pub struct SyntheticAthlete {
    traits: AthleteTraits,
    maxes: BTreeMap<String, f64>,
    exposures: BTreeMap<String, u32>,
    rng: SplitMix64,
}

impl SyntheticAthlete {
    pub fn new(traits: AthleteTraits, maxes: BTreeMap<String, f64>, rng: SplitMix64) -> Self {
        Self {
            traits,
            maxes,
            exposures: BTreeMap::new(),
            rng,
        }
    }

    pub fn traits(&self) -> &AthleteTraits {
        &self.traits
    }

    pub fn true_maxes(&self) -> &BTreeMap<String, f64> {
        &self.maxes
    }

    pub fn true_max(&self, exercise_id: &str) -> f64 {
        self.maxes.get(exercise_id).copied().unwrap_or(50.0)
    }

    /// 2 or 3 days until the next session
    pub fn usual_gap(&mut self) -> i64 {
        self.rng.gen_range(2..=3)
    }

    /// One day of biometrics; poor recovery shifts every metric the wrong way
    pub fn biometrics(&mut self, date: NaiveDate, poor_recovery: bool) -> DailyBiometrics {
        let spread = self.traits.recovery_noise;
        let (sleep, rhr, hrv) = if poor_recovery {
            (300.0, 67.0, 42.0)
        } else {
            (450.0, 58.0, 62.0)
        };
        DailyBiometrics::new(date)
            .with_sleep(gaussian(&mut self.rng, sleep, 25.0 * spread).max(0.0))
            .with_resting_hr(gaussian(&mut self.rng, rhr, 2.0 * spread).max(30.0))
            .with_hrv(gaussian(&mut self.rng, hrv, 5.0 * spread).max(5.0))
    }

    /// Perform a planned exercise: as many reps as possible up to the top of the range
    pub fn perform(
        &mut self,
        planned: &PlannedExercise,
        readiness: u8,
        strength_factor: f64,
        at: DateTime<Utc>,
    ) -> ExercisePerformance {
        let id = planned.exercise_id().to_string();
        let prescription = &planned.prescription;
        let one_rm = self.true_max(&id) * strength_factor * (1.0 + (f64::from(readiness) - 75.0) / 500.0);
        let load = if prescription.load > 0.0 {
            prescription.load
        } else {
            round_to_step(self.true_max(&id) * SELF_SELECTED_INTENSITY, 2.5)
        };

        let top = prescription.target_reps_range.max;
        let sets = (0..prescription.set_count)
            .map(|index| {
                let capable = reps_at(load, one_rm) - SET_FATIGUE * f64::from(index)
                    + gaussian(&mut self.rng, 0.0, self.traits.rep_noise);
                let capable = capable.max(0.0).floor() as u32;
                let reps = capable.min(top);
                let rir = f64::from(capable - reps).min(5.0);
                SetResult {
                    reps,
                    load,
                    completed: reps > 0,
                    rir: Some(rir),
                    rpe: None,
                    is_warmup: false,
                }
            })
            .collect();

        ExercisePerformance {
            exercise_id: id,
            sets,
            execution_context: ExecutionContext::Normal,
            performed_at: at,
        }
    }

    /// Adapt to a training exposure
    pub fn adapt(&mut self, exercise_id: &str) {
        let count = self.exposures.entry(exercise_id.to_string()).or_insert(0);
        *count += 1;
        let gaining = self.traits.gain_cutoff.is_none_or(|cutoff| *count <= cutoff);
        if gaining {
            if let Some(max) = self.maxes.get_mut(exercise_id) {
                *max *= 1.0 + self.traits.gain_per_session;
            }
        }
    }

    /// Lose strength after a long gap
    pub fn detrain(&mut self, days_off: i64) {
        let excess = (days_off - 14).max(0) as f64;
        if excess > 0.0 {
            let factor = (1.0 - DETRAINING_PER_DAY * excess).max(0.5);
            for max in self.maxes.values_mut() {
                *max *= factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LoadStrategy, PolicySelection, RepRange, SetPrescription, VariationContext};
    use crate::engine::{LoadAdjustment, e1rm::brzycki};
    use crate::simulation::archetype::Archetype;
    use chrono::TimeZone;
    use rand::SeedableRng;

    fn planned(load: f64, sets: u32) -> PlannedExercise {
        PlannedExercise {
            decision_id: uuid::Uuid::nil(),
            variation: VariationContext::primary("squat"),
            prescription: SetPrescription {
                set_count: sets,
                target_reps_range: RepRange::new(5, 8),
                target_rir: Some(2.0),
                tempo: "2-0-1-0".to_string(),
                rest_seconds: 180,
                load_strategy: LoadStrategy::Absolute,
                increment: 5.0,
                load,
                target_reps: 5,
            },
            rules: crate::model::ExerciseTemplate::new("squat", sets, 5, 8, 5.0).rules(),
            base_weight: load,
            adjustment: LoadAdjustment::none(),
            selection: PolicySelection::control(),
            action: crate::model::DecisionAction {
                direction: crate::model::Direction::Hold,
                prescribed_load: load,
                weight_delta: 0.0,
                reps_delta: 0,
                sets_delta: 0,
                explanation: String::new(),
                confidence: 1.0,
            },
        }
    }

    fn athlete(seed: u64) -> SyntheticAthlete {
        let archetype = Archetype::Intermediate;
        SyntheticAthlete::new(archetype.traits(), archetype.true_maxes(), SplitMix64::seed_from_u64(seed))
    }

    #[test]
    fn test_reps_at_inverts_brzycki() {
        let one_rm = brzycki(100.0, 8);
        assert!((reps_at(100.0, one_rm) - 8.0).abs() < 1e-9);
        assert_eq!(reps_at(0.0, 100.0), 36.0);
        assert_eq!(reps_at(200.0, 100.0), 0.0);
        assert_eq!(reps_at(50.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_light_load_caps_at_range_top() {
        let mut a = athlete(3);
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let performance = a.perform(&planned(40.0, 3), 75, 1.0, at);
        assert_eq!(performance.sets.len(), 3);
        assert!(performance.sets.iter().all(|s| s.reps == 8));
        assert!(performance.sets.iter().all(|s| s.rir.unwrap() > 0.0));
    }

    #[test]
    fn test_zero_load_self_selects() {
        let mut a = athlete(3);
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let performance = a.perform(&planned(0.0, 1), 75, 1.0, at);
        assert_eq!(performance.sets[0].load, 72.5);
    }

    #[test]
    fn test_same_seed_same_performance() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let first = athlete(11).perform(&planned(100.0, 3), 70, 1.0, at);
        let second = athlete(11).perform(&planned(100.0, 3), 70, 1.0, at);
        assert_eq!(first, second);
    }

    #[test]
    fn test_adapt_and_detrain() {
        let mut a = athlete(1);
        a.adapt("squat");
        assert!((a.true_max("squat") - 120.0 * 1.004).abs() < 1e-9);
        a.detrain(10);
        assert!((a.true_max("squat") - 120.0 * 1.004).abs() < 1e-9);
        a.detrain(24);
        assert!(a.true_max("squat") < 120.0);
    }
}
