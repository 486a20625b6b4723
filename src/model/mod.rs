//! Data model shared by the engine, policy layer and stores

pub mod biometrics;
pub mod decision;
pub mod performance;
pub mod prescription;
pub mod signals;
pub mod state;

pub use biometrics::DailyBiometrics;
pub use decision::{
    DecisionAction, DecisionLogEntry, Direction, ExplorationMode, OutcomeRecord, PolicySelection, SetOutcome,
};
pub use performance::{
    ExecutionContext, ExercisePerformance, ExposureRecord, ExposureResult, SetResult, TrainingHistory,
};
pub use prescription::{
    ExerciseTemplate, LoadStrategy, MAX_SETS, ProgressionRules, RepRange, SetPrescription, WorkoutTemplate,
    decode_templates,
};
pub use signals::{AthleteProfile, ExperienceLevel, LiftSignalsSnapshot, SessionIntent, VariationContext};
pub use state::{E1rmSample, E1rmTrend, ExerciseState};
