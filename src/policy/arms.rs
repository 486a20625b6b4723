//! Named progression variants competing in the bandit

use serde::{Deserialize, Serialize};

use crate::model::LiftSignalsSnapshot;

/// Rep-range top extension applied by `RepExtension`
pub const REP_EXTENSION: u32 = 2;

/// Fraction of the increment `MicroLoad` adds
pub const MICRO_LOAD_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyArm {
    Baseline,
    MicroLoad,
    LoadPush,
    RepExtension,
    VolumeTrim,
}

/// Change an arm makes to the baseline prescription
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmEffect {
    pub load_delta: f64,
    pub sets_delta: i32,
    pub rep_max_delta: u32,
    pub explanation: &'static str,
}

impl ArmEffect {
    fn none(explanation: &'static str) -> Self {
        Self {
            load_delta: 0.0,
            sets_delta: 0,
            rep_max_delta: 0,
            explanation,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.load_delta == 0.0 && self.sets_delta == 0 && self.rep_max_delta == 0
    }
}

impl PolicyArm {
    pub const ALL: [PolicyArm; 5] = [
        PolicyArm::Baseline,
        PolicyArm::MicroLoad,
        PolicyArm::LoadPush,
        PolicyArm::RepExtension,
        PolicyArm::VolumeTrim,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PolicyArm::Baseline => "baseline",
            PolicyArm::MicroLoad => "micro_load",
            PolicyArm::LoadPush => "load_push",
            PolicyArm::RepExtension => "rep_extension",
            PolicyArm::VolumeTrim => "volume_trim",
        }
    }

    pub fn from_id(id: &str) -> Option<PolicyArm> {
        PolicyArm::ALL.into_iter().find(|arm| arm.id() == id)
    }

    /// Effect on today's prescription; arms are inert while a deload is in effect
    pub fn effect(&self, signals: &LiftSignalsSnapshot, increment: f64, deload_in_effect: bool) -> ArmEffect {
        if deload_in_effect {
            return ArmEffect::none("deload in effect");
        }
        let increment = if increment.is_finite() { increment.max(0.0) } else { 0.0 };
        let clean_last_session = signals.success_streak > 0 && signals.high_rpe_streak == 0;

        match self {
            PolicyArm::Baseline => ArmEffect::none("standard double progression"),
            PolicyArm::MicroLoad if clean_last_session => ArmEffect {
                load_delta: increment * MICRO_LOAD_FRACTION,
                explanation: "clean last session: small load bump",
                ..ArmEffect::none("")
            },
            PolicyArm::LoadPush if clean_last_session => ArmEffect {
                load_delta: increment,
                explanation: "clean last session: full increment now",
                ..ArmEffect::none("")
            },
            PolicyArm::MicroLoad | PolicyArm::LoadPush => {
                ArmEffect::none("last session was not clean; load unchanged")
            }
            PolicyArm::RepExtension => ArmEffect {
                rep_max_delta: REP_EXTENSION,
                explanation: "extend the rep range before the next load jump",
                ..ArmEffect::none("")
            },
            PolicyArm::VolumeTrim => ArmEffect {
                sets_delta: -1,
                explanation: "one fewer working set at the same load",
                ..ArmEffect::none("")
            },
        }
    }
}

impl std::fmt::Display for PolicyArm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
