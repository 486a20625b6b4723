//! Prescriptions and workout templates, including legacy record decoding
//!
//! Two persisted shapes exist for a template exercise:
//! - current: `setsTarget`, `repRangeMin`, `repRangeMax`
//! - legacy: `sets` or `plannedSets`, `repRange` (a closed range)
//!
//! Both decode into [`ExerciseTemplate`]. Old data must never fail to load,
//! so every field except the exercise id has a default.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_DELOAD_FACTOR, DEFAULT_FAILURE_THRESHOLD, DEFAULT_INCREMENT, clamp_factor};
use crate::error::{LoadReport, SkippedRecord};

pub const DEFAULT_SETS: u32 = 3;
pub const DEFAULT_REP_MIN: u32 = 8;
pub const DEFAULT_REP_MAX: u32 = 12;
pub const DEFAULT_REST_SECONDS: u32 = 120;
pub const DEFAULT_TEMPO: &str = "2-0-1-0";
/// Upper bound on working sets for one exercise
pub const MAX_SETS: u32 = 20;

/// Inclusive rep target range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepRange {
    pub min: u32,
    pub max: u32,
}

impl RepRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Ordered copy plus whether the input was inverted
    pub fn normalized(&self) -> (RepRange, bool) {
        if self.min > self.max {
            (RepRange::new(self.max, self.min), true)
        } else {
            (*self, false)
        }
    }

    pub fn contains(&self, reps: u32) -> bool {
        reps >= self.min && reps <= self.max
    }
}

/// How the load of a prescription is derived
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LoadStrategy {
    /// Use the tracked working weight
    #[default]
    Absolute,
    /// Percent (0-100) of the rolling e1RM; falls back to the working weight when unknown
    PercentOfE1rm { percent: f64 },
}

impl LoadStrategy {
    /// Percent clamped to 0-100; a non-finite percent falls back to the working weight
    pub fn sanitized(self) -> Self {
        match self {
            LoadStrategy::PercentOfE1rm { percent } if percent.is_finite() => LoadStrategy::PercentOfE1rm {
                percent: percent.clamp(0.0, 100.0),
            },
            LoadStrategy::PercentOfE1rm { .. } => LoadStrategy::Absolute,
            LoadStrategy::Absolute => LoadStrategy::Absolute,
        }
    }
}

/// Per-set prescription handed to the athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPrescription {
    pub set_count: u32,
    pub target_reps_range: RepRange,
    pub target_rir: Option<f64>,
    pub tempo: String,
    pub rest_seconds: u32,
    pub load_strategy: LoadStrategy,
    pub increment: f64,
    /// Load to use for every working set
    pub load: f64,
    /// Rep goal for this session (range min after a load jump, best + 1 otherwise)
    pub target_reps: u32,
}

/// One exercise slot in a workout template (current shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawExerciseTemplate")]
pub struct ExerciseTemplate {
    pub exercise_id: String,
    pub sets_target: u32,
    pub rep_range_min: u32,
    pub rep_range_max: u32,
    pub increment: f64,
    pub deload_factor: f64,
    pub failure_threshold: i32,
    pub target_rir: Option<f64>,
    pub tempo: String,
    pub rest_seconds: u32,
    pub load_strategy: LoadStrategy,
    /// Weight the user entered before any history exists
    pub starting_weight: Option<f64>,
}

impl ExerciseTemplate {
    pub fn new(exercise_id: &str, sets: u32, rep_min: u32, rep_max: u32, increment: f64) -> Self {
        Self {
            exercise_id: exercise_id.to_string(),
            sets_target: sets,
            rep_range_min: rep_min,
            rep_range_max: rep_max,
            increment,
            deload_factor: DEFAULT_DELOAD_FACTOR,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            target_rir: Some(2.0),
            tempo: DEFAULT_TEMPO.to_string(),
            rest_seconds: DEFAULT_REST_SECONDS,
            load_strategy: LoadStrategy::Absolute,
            starting_weight: None,
        }
    }

    pub fn with_starting_weight(mut self, weight: f64) -> Self {
        self.starting_weight = Some(weight);
        self
    }

    /// Working sets actually prescribed, between 1 and [`MAX_SETS`]
    pub fn working_sets(&self) -> u32 {
        self.sets_target.clamp(1, MAX_SETS)
    }

    pub fn rep_range(&self) -> RepRange {
        RepRange::new(self.rep_range_min, self.rep_range_max)
    }

    /// The values the engine will actually use
    pub fn rules(&self) -> ProgressionRules {
        ProgressionRules::new(
            self.rep_range(),
            self.increment,
            self.deload_factor,
            self.failure_threshold,
        )
    }
}

/// Clamped progression parameters for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRules {
    pub rep_range: RepRange,
    pub rep_range_was_inverted: bool,
    pub increment: f64,
    pub deload_factor: f64,
    pub failure_threshold: u32,
}

impl ProgressionRules {
    pub fn new(rep_range: RepRange, increment: f64, deload_factor: f64, failure_threshold: i32) -> Self {
        let (rep_range, rep_range_was_inverted) = rep_range.normalized();
        let increment = if increment.is_finite() && increment >= 0.0 {
            increment
        } else {
            0.0
        };

        Self {
            rep_range,
            rep_range_was_inverted,
            increment,
            deload_factor: clamp_factor(deload_factor),
            failure_threshold: failure_threshold.max(1) as u32,
        }
    }
}

/// Ordered list of exercises making up a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub exercises: Vec<ExerciseTemplate>,
}

/// Closed range as older clients wrote it
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LegacyRange {
    /// `[8, 12]`
    Pair(Vec<i64>),
    /// `{"lowerBound": 8, "upperBound": 12}`
    #[serde(rename_all = "camelCase")]
    Bounds { lower_bound: i64, upper_bound: i64 },
    /// `"8...12"` or `"8-12"`
    Text(String),
}

impl LegacyRange {
    fn bounds(&self) -> Option<(i64, i64)> {
        match self {
            LegacyRange::Pair(values) => match values.as_slice() {
                [lo, hi] => Some((*lo, *hi)),
                [single] => Some((*single, *single)),
                _ => None,
            },
            LegacyRange::Bounds { lower_bound, upper_bound } => Some((*lower_bound, *upper_bound)),
            LegacyRange::Text(text) => {
                let (lo, hi) = text
                    .split_once("...")
                    .or_else(|| text.split_once("..<"))
                    .or_else(|| text.split_once('-'))?;
                Some((lo.trim().parse().ok()?, hi.trim().parse().ok()?))
            }
        }
    }
}

/// Every field either shape may carry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExerciseTemplate {
    #[serde(alias = "exercise", alias = "exerciseID")]
    exercise_id: String,
    sets_target: Option<i64>,
    sets: Option<i64>,
    planned_sets: Option<i64>,
    rep_range_min: Option<i64>,
    rep_range_max: Option<i64>,
    rep_range: Option<LegacyRange>,
    increment: Option<f64>,
    deload_factor: Option<f64>,
    failure_threshold: Option<i32>,
    target_rir: Option<f64>,
    tempo: Option<String>,
    rest_seconds: Option<i64>,
    load_strategy: Option<LoadStrategy>,
    starting_weight: Option<f64>,
}

fn to_count(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

impl TryFrom<RawExerciseTemplate> for ExerciseTemplate {
    type Error = String;

    fn try_from(raw: RawExerciseTemplate) -> Result<Self, Self::Error> {
        if raw.exercise_id.trim().is_empty() {
            return Err("empty exercise id".to_string());
        }

        let sets = raw
            .sets_target
            .or(raw.sets)
            .or(raw.planned_sets)
            .map(|s| to_count(s).clamp(1, MAX_SETS))
            .unwrap_or(DEFAULT_SETS);

        let legacy = raw.rep_range.as_ref().and_then(LegacyRange::bounds);
        let rep_min = raw
            .rep_range_min
            .or(legacy.map(|(lo, _)| lo))
            .map(to_count)
            .unwrap_or(DEFAULT_REP_MIN);
        let rep_max = raw
            .rep_range_max
            .or(legacy.map(|(_, hi)| hi))
            .map(to_count)
            .unwrap_or(DEFAULT_REP_MAX);

        Ok(Self {
            exercise_id: raw.exercise_id,
            sets_target: sets,
            rep_range_min: rep_min,
            rep_range_max: rep_max,
            increment: raw
                .increment
                .filter(|v| v.is_finite())
                .unwrap_or(DEFAULT_INCREMENT),
            deload_factor: raw
                .deload_factor
                .filter(|v| v.is_finite())
                .unwrap_or(DEFAULT_DELOAD_FACTOR),
            failure_threshold: raw.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
            target_rir: raw.target_rir.filter(|v| v.is_finite()),
            tempo: raw.tempo.unwrap_or_else(|| DEFAULT_TEMPO.to_string()),
            rest_seconds: raw.rest_seconds.map(to_count).unwrap_or(DEFAULT_REST_SECONDS),
            load_strategy: raw.load_strategy.unwrap_or_default().sanitized(),
            starting_weight: raw.starting_weight.filter(|v| v.is_finite() && *v >= 0.0),
        })
    }
}

/// Decode a JSON array of templates, skipping (and reporting) corrupt entries
pub fn decode_templates(json: &str) -> LoadReport<WorkoutTemplate> {
    let mut report = LoadReport::default();

    let values: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(values) => values,
        Err(e) => {
            report.skipped.push(SkippedRecord {
                key: "<document>".to_string(),
                reason: e.to_string(),
            });
            return report;
        }
    };

    for (index, value) in values.into_iter().enumerate() {
        let key = value
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", index));

        match serde_json::from_value::<WorkoutTemplate>(value) {
            Ok(template) => report.records.push(template),
            Err(e) => {
                tracing::warn!("Skipping corrupt template {}: {}", key, e);
                report.skipped.push(SkippedRecord {
                    key,
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}
