//! Display model for a session plan

use serde::Serialize;

use super::{PlannedExercise, SessionPlan};
use crate::catalog;
use crate::model::ExplorationMode;
use crate::policy::PolicyArm;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCard {
    pub title: String,
    /// "3 × 8-12 @ 100.0"
    pub scheme: String,
    pub tempo: String,
    pub rest: String,
    pub badges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionModel {
    pub title: String,
    pub readiness: String,
    pub cards: Vec<ExerciseCard>,
    pub insights: Vec<String>,
}

impl SessionPlan {
    pub fn to_session_model(&self) -> SessionModel {
        let readiness = if self.readiness_measured {
            format!("Readiness {}/100", self.readiness)
        } else {
            format!("Readiness {}/100 (no biometrics)", self.readiness)
        };

        SessionModel {
            title: self.template_name.clone(),
            readiness,
            cards: self.exercises.iter().map(card).collect(),
            insights: self
                .insights
                .iter()
                .map(|i| format!("{} {}", i.topic.emoji(), i.message))
                .collect(),
        }
    }
}

fn card(exercise: &PlannedExercise) -> ExerciseCard {
    let p = &exercise.prescription;
    let id = exercise.exercise_id();
    let title = catalog::find_exercise(id)
        .map(|e| e.name.to_string())
        .unwrap_or_else(|| id.to_string());

    let range = if p.target_reps_range.min == p.target_reps_range.max {
        p.target_reps_range.min.to_string()
    } else {
        format!("{}-{}", p.target_reps_range.min, p.target_reps_range.max)
    };
    let scheme = if p.load > 0.0 {
        format!("{} × {} @ {:.1}", p.set_count, range, p.load)
    } else {
        format!("{} × {} @ choose a starting weight", p.set_count, range)
    };

    let mut badges = Vec::new();
    if exercise.adjustment.deload_in_effect {
        badges.push("deload".to_string());
    }
    if exercise.variation.is_substitution {
        badges.push(format!("sub for {}", exercise.variation.planned_exercise_id));
    }
    if exercise.selection.exploration_mode == ExplorationMode::Explore
        && exercise.selection.executed_policy_id != PolicyArm::Baseline
    {
        badges.push(format!("experiment: {}", exercise.selection.executed_policy_id));
    }

    ExerciseCard {
        title,
        scheme,
        tempo: p.tempo.clone(),
        rest: format_rest(p.rest_seconds),
        badges,
    }
}

fn format_rest(seconds: u32) -> String {
    match (seconds / 60, seconds % 60) {
        (0, s) => format!("{}s", s),
        (m, 0) => format!("{}m", m),
        (m, s) => format!("{}m {}s", m, s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BanditConfig, EngineConfig};
    use crate::model::{ExerciseTemplate, WorkoutTemplate};
    use crate::planner::{EquipmentAvailability, SessionInputs, SessionPlanBuilder};
    use crate::catalog::Equipment;
    use crate::store::AthleteStore;
    use chrono::{TimeZone, Utc};

    fn plan(inputs: SessionInputs) -> SessionPlan {
        let config = EngineConfig {
            bandit: BanditConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let template = WorkoutTemplate {
            id: "upper".to_string(),
            name: "Upper A".to_string(),
            exercises: vec![ExerciseTemplate::new("bench", 3, 8, 12, 2.5).with_starting_weight(60.0)],
        };
        let mut athlete = AthleteStore::new("u1", 1);
        SessionPlanBuilder::new(&config).build(&mut athlete, &template, &inputs)
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).unwrap()
    }

    #[test]
    fn test_card_scheme() {
        let model = plan(SessionInputs {
            now: now(),
            ..Default::default()
        })
        .to_session_model();
        assert_eq!(model.title, "Upper A");
        assert_eq!(model.readiness, "Readiness 75/100 (no biometrics)");
        let card = &model.cards[0];
        assert_eq!(card.title, "Bench Press");
        assert_eq!(card.scheme, "3 × 8-12 @ 60.0");
        assert_eq!(card.rest, "2m");
        assert!(card.badges.is_empty());
    }

    #[test]
    fn test_badges_and_insights() {
        let model = plan(SessionInputs {
            now: now(),
            planned_deload_week: true,
            availability: EquipmentAvailability::all().without_equipment(Equipment::Barbell),
            ..Default::default()
        })
        .to_session_model();
        let card = &model.cards[0];
        assert_eq!(card.title, "Dumbbell Bench Press");
        assert_eq!(card.badges, vec!["deload".to_string(), "sub for bench".to_string()]);
        assert!(card.scheme.ends_with("choose a starting weight"));
        assert!(model.insights.iter().any(|i| i.starts_with("🧘")));
    }

    #[test]
    fn test_format_rest() {
        assert_eq!(format_rest(45), "45s");
        assert_eq!(format_rest(180), "3m");
        assert_eq!(format_rest(90), "1m 30s");
    }
}
