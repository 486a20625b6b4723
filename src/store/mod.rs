//! In-memory stores and the repository seam they persist through

pub mod athlete;
pub mod bandit;
pub mod decision_log;
pub mod registry;
pub mod repository;
pub mod state_store;

pub use athlete::AthleteStore;
pub use bandit::{BanditStore, BetaPrior, PriorEntry};
pub use decision_log::DecisionLog;
pub use registry::{SharedAthlete, StoreRegistry};
pub use repository::Repository;
pub use state_store::StateStore;
