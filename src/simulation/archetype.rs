//! Synthetic athlete archetypes and legacy scenarios

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Serialize;

use crate::catalog::{self, Equipment};
use crate::model::ExperienceLevel;
use crate::planner::EquipmentAvailability;

/// Intermediate-level true 1RMs (kg) the archetypes scale
const BASE_MAXES: &[(&str, f64)] = &[
    ("squat", 120.0),
    ("bench", 90.0),
    ("barbell_row", 80.0),
    ("deadlift", 150.0),
    ("ohp", 55.0),
    ("lat_pulldown", 75.0),
];

/// Share of the canonical lift a substitute moves
const SUBSTITUTE_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Novice,
    Intermediate,
    Advanced,
    /// Adapts early, then stops gaining
    Plateau,
    /// Noisy recovery and noisy performance
    Erratic,
}

/// Physiology knobs behind an archetype
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteTraits {
    pub strength_scale: f64,
    /// Fractional 1RM gain per exposure
    pub gain_per_session: f64,
    /// Exposures after which gains stop (plateau)
    pub gain_cutoff: Option<u32>,
    /// Standard deviation of achieved reps
    pub rep_noise: f64,
    /// Multiplier on biometric day-to-day spread
    pub recovery_noise: f64,
    pub experience_level: ExperienceLevel,
    pub bodyweight: f64,
}

impl Archetype {
    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Novice => "novice",
            Archetype::Intermediate => "intermediate",
            Archetype::Advanced => "advanced",
            Archetype::Plateau => "plateau",
            Archetype::Erratic => "erratic",
        }
    }

    pub fn traits(&self) -> AthleteTraits {
        match self {
            Archetype::Novice => AthleteTraits {
                strength_scale: 0.65,
                gain_per_session: 0.010,
                gain_cutoff: None,
                rep_noise: 0.8,
                recovery_noise: 1.0,
                experience_level: ExperienceLevel::Novice,
                bodyweight: 72.0,
            },
            Archetype::Intermediate => AthleteTraits {
                strength_scale: 1.0,
                gain_per_session: 0.004,
                gain_cutoff: None,
                rep_noise: 0.6,
                recovery_noise: 1.0,
                experience_level: ExperienceLevel::Intermediate,
                bodyweight: 80.0,
            },
            Archetype::Advanced => AthleteTraits {
                strength_scale: 1.35,
                gain_per_session: 0.0015,
                gain_cutoff: None,
                rep_noise: 0.5,
                recovery_noise: 0.8,
                experience_level: ExperienceLevel::Advanced,
                bodyweight: 88.0,
            },
            Archetype::Plateau => AthleteTraits {
                strength_scale: 1.0,
                gain_per_session: 0.004,
                gain_cutoff: Some(12),
                rep_noise: 0.6,
                recovery_noise: 1.0,
                experience_level: ExperienceLevel::Intermediate,
                bodyweight: 80.0,
            },
            Archetype::Erratic => AthleteTraits {
                strength_scale: 0.9,
                gain_per_session: 0.004,
                gain_cutoff: None,
                rep_noise: 1.6,
                recovery_noise: 2.5,
                experience_level: ExperienceLevel::Intermediate,
                bodyweight: 76.0,
            },
        }
    }

    /// True 1RM for every lift the simulated templates can touch
    pub fn true_maxes(&self) -> BTreeMap<String, f64> {
        let scale = self.traits().strength_scale;
        let mut maxes = BTreeMap::new();
        for (id, base) in BASE_MAXES {
            let max = base * scale;
            maxes.insert(id.to_string(), max);
            if let Some(exercise) = catalog::find_exercise(id) {
                for sub in exercise.substitutes {
                    maxes.entry(sub.to_string()).or_insert(max * SUBSTITUTE_RATIO);
                }
            }
        }
        maxes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Baseline,
    /// A stretch of sessions at reduced strength
    #[value(name = "failure_streak")]
    FailureStreak,
    /// Three weeks off halfway through
    #[value(name = "long_break")]
    LongBreak,
    /// Every fourth week is a planned deload
    #[value(name = "deload_week")]
    DeloadWeek,
    /// A run of poor sleep and elevated resting heart rate
    #[value(name = "low_readiness")]
    LowReadiness,
    /// No barbell for a stretch of sessions
    #[value(name = "equipment_outage")]
    EquipmentOutage,
}

/// Length of the disrupted stretch, in workouts
pub const DISRUPTION_WORKOUTS: u32 = 6;
pub const LONG_BREAK_DAYS: i64 = 21;

impl Scenario {
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Baseline => "baseline",
            Scenario::FailureStreak => "failure_streak",
            Scenario::LongBreak => "long_break",
            Scenario::DeloadWeek => "deload_week",
            Scenario::LowReadiness => "low_readiness",
            Scenario::EquipmentOutage => "equipment_outage",
        }
    }

    fn disrupted(&self, workout: u32, total: u32) -> bool {
        let start = total / 3;
        workout >= start && workout < start + DISRUPTION_WORKOUTS
    }

    /// Days since the previous workout, given the athlete's usual gap
    pub fn gap_days(&self, workout: u32, total: u32, usual: i64) -> i64 {
        match self {
            Scenario::LongBreak if workout > 0 && workout == total / 2 => LONG_BREAK_DAYS,
            _ => usual,
        }
    }

    /// Multiplier on true strength for this workout
    pub fn strength_factor(&self, workout: u32, total: u32) -> f64 {
        match self {
            Scenario::FailureStreak if self.disrupted(workout, total) => 0.85,
            _ => 1.0,
        }
    }

    pub fn planned_deload(&self, day: i64) -> bool {
        matches!(self, Scenario::DeloadWeek) && (day / 7) % 4 == 3
    }

    pub fn poor_recovery(&self, workout: u32, total: u32) -> bool {
        matches!(self, Scenario::LowReadiness) && self.disrupted(workout, total)
    }

    pub fn availability(&self, workout: u32, total: u32) -> EquipmentAvailability {
        match self {
            Scenario::EquipmentOutage if self.disrupted(workout, total) => {
                EquipmentAvailability::all().without_equipment(Equipment::Barbell)
            }
            _ => EquipmentAvailability::all(),
        }
    }
}
