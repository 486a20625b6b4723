//! Policy selection: which progression variant acts on a decision
//!
//! Two selectors implement [`PolicySelector`]:
//! - [`ControlSelector`] always returns the baseline and never reads priors
//! - [`ThompsonSelector`] samples arms per family behind a safety gate
//!
//! [`Selector`] picks one of them at construction time from config.

pub mod arms;
pub mod gate;
pub mod reward;
pub mod thompson;

use rand::Rng;

pub use arms::{ArmEffect, PolicyArm};
pub use gate::{GateBlock, SafetyGate};
pub use reward::reward;
pub use thompson::ThompsonSelector;

use crate::config::BanditConfig;
use crate::model::{DecisionLogEntry, LiftSignalsSnapshot, PolicySelection, VariationContext};
use crate::store::BanditStore;

pub trait PolicySelector {
    fn select_policy(
        &mut self,
        signals: &LiftSignalsSnapshot,
        variation: &VariationContext,
        user_id: &str,
    ) -> PolicySelection;

    /// Feed a completed decision back; returns the reward applied to priors, if any
    fn record_outcome(&mut self, entry: &DecisionLogEntry, user_id: &str) -> Option<f64>;
}

/// Baseline for everyone
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlSelector;

impl PolicySelector for ControlSelector {
    fn select_policy(&mut self, _: &LiftSignalsSnapshot, _: &VariationContext, _: &str) -> PolicySelection {
        PolicySelection::control()
    }

    fn record_outcome(&mut self, _: &DecisionLogEntry, _: &str) -> Option<f64> {
        None
    }
}

pub enum Selector<'a, R: Rng> {
    Control(ControlSelector),
    Thompson(ThompsonSelector<'a, R>),
}

impl<'a, R: Rng> Selector<'a, R> {
    pub fn from_config(config: &BanditConfig, store: &'a mut BanditStore, rng: &'a mut R) -> Self {
        if config.enabled {
            Selector::Thompson(ThompsonSelector::new(config, store, rng))
        } else {
            Selector::Control(ControlSelector)
        }
    }
}

impl<R: Rng> PolicySelector for Selector<'_, R> {
    fn select_policy(
        &mut self,
        signals: &LiftSignalsSnapshot,
        variation: &VariationContext,
        user_id: &str,
    ) -> PolicySelection {
        match self {
            Selector::Control(s) => s.select_policy(signals, variation, user_id),
            Selector::Thompson(s) => s.select_policy(signals, variation, user_id),
        }
    }

    fn record_outcome(&mut self, entry: &DecisionLogEntry, user_id: &str) -> Option<f64> {
        match self {
            Selector::Control(s) => s.record_outcome(entry, user_id),
            Selector::Thompson(s) => s.record_outcome(entry, user_id),
        }
    }
}
