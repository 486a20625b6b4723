//! Safety gate evaluated before any exploration

use crate::config::BanditConfig;
use crate::model::{LiftSignalsSnapshot, SessionIntent};

/// Why exploration was refused for a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateBlock {
    TooFewExposures { have: u32, need: u32 },
    FailStreak { streak: u32, max: u32 },
    LowReadiness { readiness: u8, min: u8 },
    DeloadActive,
}

impl std::fmt::Display for GateBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateBlock::TooFewExposures { have, need } => {
                write!(f, "{} successful exposures, {} required", have, need)
            }
            GateBlock::FailStreak { streak, max } => write!(f, "fail streak {} exceeds {}", streak, max),
            GateBlock::LowReadiness { readiness, min } => write!(f, "readiness {} below {}", readiness, min),
            GateBlock::DeloadActive => f.write_str("session deload active"),
        }
    }
}

pub struct SafetyGate<'a> {
    config: &'a BanditConfig,
}

impl<'a> SafetyGate<'a> {
    pub fn new(config: &'a BanditConfig) -> Self {
        Self { config }
    }

    /// First failing check, or Ok when exploration is allowed
    pub fn check(&self, signals: &LiftSignalsSnapshot) -> Result<(), GateBlock> {
        let c = self.config;
        if signals.successful_exposures < c.min_successful_exposures {
            return Err(GateBlock::TooFewExposures {
                have: signals.successful_exposures,
                need: c.min_successful_exposures,
            });
        }
        if signals.fail_streak > c.max_fail_streak {
            return Err(GateBlock::FailStreak {
                streak: signals.fail_streak,
                max: c.max_fail_streak,
            });
        }
        if signals.readiness_today < c.min_readiness {
            return Err(GateBlock::LowReadiness {
                readiness: signals.readiness_today,
                min: c.min_readiness,
            });
        }
        if signals.session_intent == SessionIntent::Deload && !c.explore_during_deload {
            return Err(GateBlock::DeloadActive);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{E1rmTrend, ExperienceLevel};

    fn ready() -> LiftSignalsSnapshot {
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
            readiness_recent: vec![78, 82],
            bodyweight: Some(82.0),
            experience_level: ExperienceLevel::Intermediate,
            session_intent: SessionIntent::Train,
        }
    }

    #[test]
    fn test_passes_when_everything_is_fine() {
        let config = BanditConfig::default();
        assert_eq!(SafetyGate::new(&config).check(&ready()), Ok(()));
    }

    #[test]
    fn test_each_condition_blocks() {
        let config = BanditConfig::default();
        let gate = SafetyGate::new(&config);

        let mut s = ready();
        s.successful_exposures = 2;
        assert!(matches!(gate.check(&s), Err(GateBlock::TooFewExposures { .. })));

        let mut s = ready();
        s.fail_streak = 2;
        assert!(matches!(gate.check(&s), Err(GateBlock::FailStreak { .. })));

        let mut s = ready();
        s.readiness_today = 59;
        assert!(matches!(gate.check(&s), Err(GateBlock::LowReadiness { .. })));

        let mut s = ready();
        s.session_intent = SessionIntent::Deload;
        assert_eq!(gate.check(&s), Err(GateBlock::DeloadActive));
    }

    #[test]
    fn test_boundaries_are_allowed() {
        let config = BanditConfig::default();
        let mut s = ready();
        s.successful_exposures = 3;
        s.fail_streak = 1;
        s.readiness_today = 60;
        assert_eq!(SafetyGate::new(&config).check(&s), Ok(()));
    }

    #[test]
    fn test_deload_exploration_opt_in() {
        let config = BanditConfig {
            explore_during_deload: true,
            ..Default::default()
        };
        let mut s = ready();
        s.session_intent = SessionIntent::Deload;
        assert_eq!(SafetyGate::new(&config).check(&s), Ok(()));
    }
}
