//! Exercise catalog - movement patterns, equipment and substitutions

use serde::{Deserialize, Serialize};

/// Movement patterns used to group bandit statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MovementPattern {
    Squat,
    Hinge,
    HorizontalPush,
    VerticalPush,
    HorizontalPull,
    VerticalPull,
    Lunge,
    Isolation,
}

impl MovementPattern {
    pub fn key(&self) -> &'static str {
        match self {
            MovementPattern::Squat => "squat",
            MovementPattern::Hinge => "hinge",
            MovementPattern::HorizontalPush => "horizontal_push",
            MovementPattern::VerticalPush => "vertical_push",
            MovementPattern::HorizontalPull => "horizontal_pull",
            MovementPattern::VerticalPull => "vertical_pull",
            MovementPattern::Lunge => "lunge",
            MovementPattern::Isolation => "isolation",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Bodyweight,
    Kettlebell,
}

impl Equipment {
    pub fn key(&self) -> &'static str {
        match self {
            Equipment::Barbell => "barbell",
            Equipment::Dumbbell => "dumbbell",
            Equipment::Machine => "machine",
            Equipment::Cable => "cable",
            Equipment::Bodyweight => "bodyweight",
            Equipment::Kettlebell => "kettlebell",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: &'static str,
    pub name: &'static str,
    pub pattern: MovementPattern,
    pub equipment: Equipment,
    /// Substitutes in preference order
    pub substitutes: &'static [&'static str],
    /// Main competition lifts get a larger default increment
    pub is_main_lift: bool,
}

impl Exercise {
    /// Movement pattern + equipment, the unit bandit priors are shared over
    pub fn family_key(&self) -> String {
        family_key(self.pattern, self.equipment)
    }
}

pub fn family_key(pattern: MovementPattern, equipment: Equipment) -> String {
    format!("{}:{}", pattern.key(), equipment.key())
}

pub const EXERCISES: &[Exercise] = &[
    // Main lifts
    Exercise {
        id: "squat",
        name: "Back Squat",
        pattern: MovementPattern::Squat,
        equipment: Equipment::Barbell,
        substitutes: &["goblet_squat", "leg_press"],
        is_main_lift: true,
    },
    Exercise {
        id: "bench",
        name: "Bench Press",
        pattern: MovementPattern::HorizontalPush,
        equipment: Equipment::Barbell,
        substitutes: &["db_bench", "machine_chest_press"],
        is_main_lift: true,
    },
    Exercise {
        id: "deadlift",
        name: "Deadlift",
        pattern: MovementPattern::Hinge,
        equipment: Equipment::Barbell,
        substitutes: &["kb_deadlift", "db_rdl"],
        is_main_lift: true,
    },
    Exercise {
        id: "ohp",
        name: "Overhead Press",
        pattern: MovementPattern::VerticalPush,
        equipment: Equipment::Barbell,
        substitutes: &["db_shoulder_press"],
        is_main_lift: true,
    },
    // Accessories and substitutes
    Exercise {
        id: "barbell_row",
        name: "Barbell Row",
        pattern: MovementPattern::HorizontalPull,
        equipment: Equipment::Barbell,
        substitutes: &["db_row", "cable_row"],
        is_main_lift: false,
    },
    Exercise {
        id: "pullup",
        name: "Pull-up",
        pattern: MovementPattern::VerticalPull,
        equipment: Equipment::Bodyweight,
        substitutes: &["lat_pulldown"],
        is_main_lift: false,
    },
    Exercise {
        id: "goblet_squat",
        name: "Goblet Squat",
        pattern: MovementPattern::Squat,
        equipment: Equipment::Dumbbell,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "leg_press",
        name: "Leg Press",
        pattern: MovementPattern::Squat,
        equipment: Equipment::Machine,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "db_bench",
        name: "Dumbbell Bench Press",
        pattern: MovementPattern::HorizontalPush,
        equipment: Equipment::Dumbbell,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "machine_chest_press",
        name: "Machine Chest Press",
        pattern: MovementPattern::HorizontalPush,
        equipment: Equipment::Machine,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "kb_deadlift",
        name: "Kettlebell Deadlift",
        pattern: MovementPattern::Hinge,
        equipment: Equipment::Kettlebell,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "db_rdl",
        name: "Dumbbell Romanian Deadlift",
        pattern: MovementPattern::Hinge,
        equipment: Equipment::Dumbbell,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "db_shoulder_press",
        name: "Dumbbell Shoulder Press",
        pattern: MovementPattern::VerticalPush,
        equipment: Equipment::Dumbbell,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "db_row",
        name: "Dumbbell Row",
        pattern: MovementPattern::HorizontalPull,
        equipment: Equipment::Dumbbell,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "cable_row",
        name: "Seated Cable Row",
        pattern: MovementPattern::HorizontalPull,
        equipment: Equipment::Cable,
        substitutes: &[],
        is_main_lift: false,
    },
    Exercise {
        id: "lat_pulldown",
        name: "Lat Pulldown",
        pattern: MovementPattern::VerticalPull,
        equipment: Equipment::Cable,
        substitutes: &[],
        is_main_lift: false,
    },
];

pub fn get_all_exercises() -> &'static [Exercise] {
    EXERCISES
}

pub fn find_exercise(id: &str) -> Option<&'static Exercise> {
    EXERCISES.iter().find(|e| e.id == id)
}

/// Family key for an exercise id; unknown exercises form their own family
pub fn family_for(exercise_id: &str) -> String {
    find_exercise(exercise_id)
        .map(|e| e.family_key())
        .unwrap_or_else(|| format!("custom:{}", exercise_id))
}
