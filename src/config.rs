//! Engine configuration with documented defaults
//!
//! Every field defaults, so partial JSON files (or none at all) load.
//! Nothing here is ever rejected: `sanitized()` clamps to the values the
//! engine actually uses and those values are echoed back in snapshots.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::policy::PolicyArm;

pub const DEFAULT_INCREMENT: f64 = 5.0;
pub const DEFAULT_DELOAD_FACTOR: f64 = 0.9;
pub const DEFAULT_FAILURE_THRESHOLD: i32 = 2;
pub const NEUTRAL_READINESS: u8 = 75;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub progression: ProgressionConfig,
    pub deload: DeloadConfig,
    pub readiness: ReadinessConfig,
    pub bandit: BanditConfig,
}

impl EngineConfig {
    /// Load from a JSON file; unknown fields are ignored
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Clamp every knob into its safe range
    pub fn sanitized(&self) -> Self {
        Self {
            progression: self.progression.sanitized(),
            deload: self.deload.sanitized(),
            readiness: self.readiness.sanitized(),
            bandit: self.bandit.sanitized(),
        }
    }
}

/// Double progression defaults, used when a template leaves them out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub default_increment: f64,
    pub default_deload_factor: f64,
    pub default_failure_threshold: i32,
    /// Plan loads are rounded to this step (0 disables rounding)
    pub load_rounding_step: f64,
    /// A set with observed RIR at or below this is a grinder
    pub grinder_max_rir: f64,
    /// A set with observed RPE at or above this is a grinder
    pub grinder_min_rpe: f64,
    /// Number of session e1RM samples kept per exercise
    pub e1rm_history_len: usize,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            default_increment: DEFAULT_INCREMENT,
            default_deload_factor: DEFAULT_DELOAD_FACTOR,
            default_failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            load_rounding_step: 2.5,
            grinder_max_rir: 0.0,
            grinder_min_rpe: 9.5,
            e1rm_history_len: 24,
        }
    }
}

impl ProgressionConfig {
    pub fn sanitized(&self) -> Self {
        Self {
            default_increment: finite_or(self.default_increment, DEFAULT_INCREMENT).max(0.0),
            default_deload_factor: clamp_factor(self.default_deload_factor),
            default_failure_threshold: self.default_failure_threshold.max(1),
            load_rounding_step: finite_or(self.load_rounding_step, 0.0).max(0.0),
            grinder_max_rir: finite_or(self.grinder_max_rir, 0.0),
            grinder_min_rpe: finite_or(self.grinder_min_rpe, 9.5),
            e1rm_history_len: self.e1rm_history_len.max(3),
        }
    }
}

/// Break, readiness and planned deload knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeloadConfig {
    /// Gap (days) after which the next exposure is reduced
    pub break_threshold_days: i64,
    /// Fractional reduction on return from a break
    pub break_reduction: f64,
    /// Fractional reduction on a low-readiness day
    pub readiness_cut: f64,
    /// Readiness strictly below this triggers the readiness cut
    pub low_readiness_threshold: u8,
    /// Readiness strictly below this flags the whole session as a deload
    pub critical_readiness_threshold: u8,
}

impl Default for DeloadConfig {
    fn default() -> Self {
        Self {
            break_threshold_days: 14,
            break_reduction: 0.10,
            readiness_cut: 0.05,
            low_readiness_threshold: 60,
            critical_readiness_threshold: 35,
        }
    }
}

impl DeloadConfig {
    pub fn sanitized(&self) -> Self {
        Self {
            break_threshold_days: self.break_threshold_days.max(1),
            break_reduction: clamp_factor(self.break_reduction),
            readiness_cut: clamp_factor(self.readiness_cut),
            low_readiness_threshold: self.low_readiness_threshold.min(100),
            critical_readiness_threshold: self.critical_readiness_threshold.min(100),
        }
    }
}

/// Readiness score calculator weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub window_days: i64,
    pub min_baseline_samples: usize,
    pub sleep_weight: f64,
    pub resting_hr_weight: f64,
    pub hrv_weight: f64,
    /// Score of a day exactly at the athlete's own baseline
    pub baseline_score: f64,
    /// Points per combined standard deviation away from baseline
    pub points_per_sd: f64,
    pub neutral_default: u8,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            window_days: 60,
            min_baseline_samples: 3,
            sleep_weight: 0.35,
            resting_hr_weight: 0.30,
            hrv_weight: 0.35,
            baseline_score: 75.0,
            points_per_sd: 15.0,
            neutral_default: NEUTRAL_READINESS,
        }
    }
}

impl ReadinessConfig {
    pub fn sanitized(&self) -> Self {
        Self {
            window_days: self.window_days.clamp(1, 60),
            min_baseline_samples: self.min_baseline_samples.max(2),
            sleep_weight: finite_or(self.sleep_weight, 0.0).max(0.0),
            resting_hr_weight: finite_or(self.resting_hr_weight, 0.0).max(0.0),
            hrv_weight: finite_or(self.hrv_weight, 0.0).max(0.0),
            baseline_score: finite_or(self.baseline_score, 75.0).clamp(0.0, 100.0),
            points_per_sd: finite_or(self.points_per_sd, 15.0).max(0.0),
            neutral_default: self.neutral_default.min(100),
        }
    }
}

/// Whether explored arms act or are only logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BanditMode {
    #[default]
    Explore,
    Shadow,
}

/// Policy-selection layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BanditConfig {
    /// When false the control selector is used for everyone
    pub enabled: bool,
    pub mode: BanditMode,
    pub min_successful_exposures: u32,
    pub max_fail_streak: u32,
    pub min_readiness: u8,
    pub explore_during_deload: bool,
    /// Monte-Carlo redraws used to estimate the executed arm's probability
    pub probability_draws: u32,
    /// Weight substitutions carry when sharing their canonical family's priors
    pub substitution_coefficient: f64,
    pub arms: Vec<PolicyArm>,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: BanditMode::Explore,
            min_successful_exposures: 3,
            max_fail_streak: 1,
            min_readiness: 60,
            explore_during_deload: false,
            probability_draws: 256,
            substitution_coefficient: 0.5,
            arms: PolicyArm::ALL.to_vec(),
        }
    }
}

impl BanditConfig {
    pub fn sanitized(&self) -> Self {
        let mut arms: Vec<PolicyArm> = Vec::with_capacity(self.arms.len() + 1);
        // Baseline always competes, and always first
        arms.push(PolicyArm::Baseline);
        for arm in &self.arms {
            if !arms.contains(arm) {
                arms.push(*arm);
            }
        }

        Self {
            enabled: self.enabled,
            mode: self.mode,
            min_successful_exposures: self.min_successful_exposures,
            max_fail_streak: self.max_fail_streak,
            min_readiness: self.min_readiness.min(100),
            explore_during_deload: self.explore_during_deload,
            probability_draws: self.probability_draws.clamp(1, 10_000),
            substitution_coefficient: clamp_factor(self.substitution_coefficient),
            arms,
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Clamp a multiplicative factor or fractional reduction into [0, 1]
pub fn clamp_factor(value: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_already_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn test_failure_threshold_clamped_to_one() {
        let config = ProgressionConfig {
            default_failure_threshold: 0,
            ..Default::default()
        };
        assert_eq!(config.sanitized().default_failure_threshold, 1);

        let config = ProgressionConfig {
            default_failure_threshold: -4,
            ..Default::default()
        };
        assert_eq!(config.sanitized().default_failure_threshold, 1);
    }

    #[test]
    fn test_deload_factor_clamped() {
        let negative = ProgressionConfig {
            default_deload_factor: -0.5,
            ..Default::default()
        };
        assert_eq!(negative.sanitized().default_deload_factor, 0.0);

        let too_big = ProgressionConfig {
            default_deload_factor: 1.7,
            ..Default::default()
        };
        assert_eq!(too_big.sanitized().default_deload_factor, 1.0);

        let nan = ProgressionConfig {
            default_deload_factor: f64::NAN,
            ..Default::default()
        };
        assert_eq!(nan.sanitized().default_deload_factor, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "deload": { "break_threshold_days": 21 }, "bogus": 1 }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.deload.break_threshold_days, 21);
        assert_eq!(config.deload.readiness_cut, 0.05);
        assert_eq!(config.progression.default_failure_threshold, 2);
        assert!(config.bandit.enabled);
    }

    #[test]
    fn test_bandit_arms_always_include_baseline_first() {
        let config = BanditConfig {
            arms: vec![PolicyArm::LoadPush, PolicyArm::LoadPush],
            ..Default::default()
        };
        let arms = config.sanitized().arms;
        assert_eq!(arms, vec![PolicyArm::Baseline, PolicyArm::LoadPush]);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "bandit": { "mode": "shadow" } }"#).unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.bandit.mode, BanditMode::Shadow);
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EngineConfig::from_file(&dir.path().join("nope.json")).is_err());
    }
}
