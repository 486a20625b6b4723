//! Deterministic progression engine
//!
//! Pure functions over snapshots: nothing here touches a store or a clock.

pub mod deload;
pub mod e1rm;
pub mod progression;
pub mod readiness;
pub mod signals;
pub mod update;

pub use deload::{DeloadEngine, DeloadReason, LoadAdjustment, SessionConditions};
pub use progression::{EffortRule, HoldReason, ProgressionDecision};
pub use readiness::ReadinessCalculator;
pub use signals::ReadinessReading;
pub use update::{ExposurePlan, NextPrescriptionSnapshot, StateUpdate, StateUpdater};
