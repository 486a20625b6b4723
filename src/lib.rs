//! ironlog - adaptive strength training progression engine
//!
//! Double progression with deload and readiness rules, an e1RM trend
//! tracker, and a Thompson-sampling layer that tests alternative
//! progression variants against the baseline behind a safety gate.

pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod planner;
pub mod policy;
pub mod rng;
pub mod simulation;
pub mod store;

pub use config::EngineConfig;
pub use db::Database;
pub use planner::{SessionPlan, SessionPlanBuilder};
pub use store::{AthleteStore, StoreRegistry};
