//! Long-horizon simulation harness
//!
//! Runs a synthetic athlete through N sessions of the full pipeline
//! (plan, perform, complete) and aggregates what the engine did. All
//! randomness flows from one seed, so a seed and argument set always
//! reproduce the same report.

pub mod archetype;
pub mod athlete;
pub mod report;

use chrono::{DateTime, Duration, TimeZone, Utc};

pub use archetype::{Archetype, Scenario};
pub use athlete::SyntheticAthlete;
pub use report::SimulationReport;

use crate::config::EngineConfig;
use crate::model::{AthleteProfile, DailyBiometrics, ExerciseTemplate, WorkoutTemplate};
use crate::planner::{SessionInputs, SessionPlanBuilder, round_to_step};
use crate::rng::SplitMix64;
use crate::store::AthleteStore;

pub const DEFAULT_SEED: u64 = 42;
/// Days of biometrics kept for the readiness calculator
const BIOMETRICS_WINDOW: usize = 60;
/// Starting weight as a share of true 1RM
const STARTING_INTENSITY: f64 = 0.65;

/// Monday 2026-01-05, 07:00 UTC
pub fn simulation_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).single().unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub archetype: Archetype,
    pub scenario: Scenario,
    pub workouts: u32,
    pub seed: u64,
}

impl SimulationConfig {
    pub fn user_id(&self) -> String {
        format!("sim-{}-{}", self.archetype.name(), self.scenario.name())
    }
}

/// Alternating A/B full-body templates with starting weights from the athlete's maxes
pub fn templates(athlete: &SyntheticAthlete) -> [WorkoutTemplate; 2] {
    let start = |id: &str| round_to_step(athlete.true_max(id) * STARTING_INTENSITY, 2.5);
    [
        WorkoutTemplate {
            id: "full_body_a".to_string(),
            name: "Full Body A".to_string(),
            exercises: vec![
                ExerciseTemplate::new("squat", 3, 5, 8, 5.0).with_starting_weight(start("squat")),
                ExerciseTemplate::new("bench", 3, 6, 10, 2.5).with_starting_weight(start("bench")),
                ExerciseTemplate::new("barbell_row", 3, 8, 12, 2.5).with_starting_weight(start("barbell_row")),
            ],
        },
        WorkoutTemplate {
            id: "full_body_b".to_string(),
            name: "Full Body B".to_string(),
            exercises: vec![
                ExerciseTemplate::new("deadlift", 2, 3, 6, 5.0).with_starting_weight(start("deadlift")),
                ExerciseTemplate::new("ohp", 3, 6, 10, 2.5).with_starting_weight(start("ohp")),
                ExerciseTemplate::new("lat_pulldown", 3, 8, 12, 2.5).with_starting_weight(start("lat_pulldown")),
            ],
        },
    ]
}

pub struct Simulator {
    builder: SessionPlanBuilder,
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(engine: &EngineConfig, config: SimulationConfig) -> Self {
        Self {
            builder: SessionPlanBuilder::new(engine),
            config,
        }
    }

    /// Run the block on a fresh store
    pub fn run(&self) -> (SimulationReport, AthleteStore) {
        let store = AthleteStore::new(&self.config.user_id(), self.config.seed);
        self.run_with(store)
    }

    /// Run the block on an existing store (e.g. one loaded from the database)
    pub fn run_with(&self, mut store: AthleteStore) -> (SimulationReport, AthleteStore) {
        let cfg = &self.config;
        let archetype = cfg.archetype;
        let scenario = cfg.scenario;
        let mut athlete = SyntheticAthlete::new(
            archetype.traits(),
            archetype.true_maxes(),
            crate::rng::derive(cfg.seed, "synthetic-athlete"),
        );
        let templates = templates(&athlete);
        let profile = AthleteProfile {
            bodyweight: Some(athlete.traits().bodyweight),
            experience_level: athlete.traits().experience_level,
        };

        let mut report = SimulationReport::new(archetype.name(), scenario.name(), cfg.workouts, cfg.seed);
        let mut biometrics: Vec<DailyBiometrics> = Vec::new();
        let start = simulation_start();
        let mut day: i64 = 0;
        let mut last_biometrics_day: i64 = -1;

        tracing::info!(
            "Simulating {} workouts: {} / {} (seed {})",
            cfg.workouts,
            archetype.name(),
            scenario.name(),
            cfg.seed
        );

        for workout in 0..cfg.workouts {
            if workout > 0 {
                let usual = athlete.usual_gap();
                let gap = scenario.gap_days(workout, cfg.workouts, usual);
                athlete.detrain(gap);
                day += gap;
            }

            let poor = scenario.poor_recovery(workout, cfg.workouts);
            while last_biometrics_day < day {
                last_biometrics_day += 1;
                let date = (start + Duration::days(last_biometrics_day)).date_naive();
                biometrics.push(athlete.biometrics(date, poor));
            }
            if biometrics.len() > BIOMETRICS_WINDOW {
                let excess = biometrics.len() - BIOMETRICS_WINDOW;
                biometrics.drain(..excess);
            }

            let now = start + Duration::days(day);
            let inputs = SessionInputs {
                now,
                biometrics: biometrics.clone(),
                readiness_override: None,
                planned_deload_week: scenario.planned_deload(day),
                availability: scenario.availability(workout, cfg.workouts),
                profile,
            };
            let template = &templates[workout as usize % templates.len()];
            let plan = self.builder.build(&mut store, template, &inputs);
            report.record_plan(&plan);

            let strength = scenario.strength_factor(workout, cfg.workouts);
            let performed_at = now + Duration::hours(1);
            let performances: Vec<_> = plan
                .exercises
                .iter()
                .map(|planned| athlete.perform(planned, plan.readiness, strength, performed_at))
                .collect();

            let completion = self.builder.complete(&mut store, &plan, &performances);
            report.record_completion(&completion);

            for performance in &performances {
                athlete.adapt(&performance.exercise_id);
            }
        }

        report.finish(&store, athlete.true_maxes());
        (report, store)
    }
}
