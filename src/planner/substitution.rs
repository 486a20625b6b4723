//! Equipment availability and substitution resolution

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, Equipment};
use crate::model::VariationContext;

/// What the athlete can use today
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentAvailability {
    #[serde(default)]
    pub unavailable_equipment: BTreeSet<Equipment>,
    #[serde(default)]
    pub unavailable_exercises: BTreeSet<String>,
}

impl EquipmentAvailability {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn without_equipment(mut self, equipment: Equipment) -> Self {
        self.unavailable_equipment.insert(equipment);
        self
    }

    pub fn without_exercise(mut self, exercise_id: &str) -> Self {
        self.unavailable_exercises.insert(exercise_id.to_string());
        self
    }

    /// Unknown exercises are assumed available unless named explicitly
    pub fn is_available(&self, exercise_id: &str) -> bool {
        if self.unavailable_exercises.contains(exercise_id) {
            return false;
        }
        catalog::find_exercise(exercise_id)
            .is_none_or(|e| !self.unavailable_equipment.contains(&e.equipment))
    }
}

/// Planned exercise, or its first available substitute
pub fn resolve(planned: &str, availability: &EquipmentAvailability, sharing_coefficient: f64) -> VariationContext {
    if availability.is_available(planned) {
        return VariationContext::primary(planned);
    }

    let substitute = catalog::find_exercise(planned)
        .into_iter()
        .flat_map(|e| e.substitutes.iter())
        .find(|id| availability.is_available(id));

    match substitute {
        Some(id) => {
            tracing::debug!("Substituting {} for unavailable {}", id, planned);
            VariationContext::substitution(planned, id, sharing_coefficient)
        }
        None => {
            tracing::warn!("No available substitute for {}; keeping it in the plan", planned);
            VariationContext::primary(planned)
        }
    }
}
