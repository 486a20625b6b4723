//! Per-user locking: one writer per athlete, athletes in parallel

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::athlete::AthleteStore;

pub type SharedAthlete = Arc<Mutex<AthleteStore>>;

pub struct StoreRegistry {
    seed: u64,
    stores: Mutex<HashMap<String, SharedAthlete>>,
}

impl StoreRegistry {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Register a store loaded elsewhere, replacing any previous one
    pub fn insert(&self, store: AthleteStore) -> SharedAthlete {
        let user_id = store.user_id().to_string();
        let shared = Arc::new(Mutex::new(store));
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, Arc::clone(&shared));
        shared
    }

    /// Handle for a user, creating an empty store on first use
    pub fn handle(&self, user_id: &str) -> SharedAthlete {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            stores
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(AthleteStore::new(user_id, self.seed)))),
        )
    }

    /// Run `f` with exclusive access to one user's store
    pub fn with_user<T>(&self, user_id: &str, f: impl FnOnce(&mut AthleteStore) -> T) -> T {
        let handle = self.handle(user_id);
        let mut store = handle.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut store)
    }

    pub fn users(&self) -> Vec<String> {
        let stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let mut users: Vec<String> = stores.keys().cloned().collect();
        users.sort();
        users
    }
}
