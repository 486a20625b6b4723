//! Database module - SQLite storage for engine state

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{LoadReport, SkippedRecord};
use crate::model::{DecisionLogEntry, ExerciseState, OutcomeRecord};
use crate::policy::PolicyArm;
use crate::store::{BetaPrior, PriorEntry, Repository};

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exercise_states (
                user_id TEXT NOT NULL,
                exercise_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, exercise_id)
            );
            CREATE TABLE IF NOT EXISTS bandit_priors (
                user_id TEXT NOT NULL,
                family_key TEXT NOT NULL,
                arm_id TEXT NOT NULL,
                alpha REAL NOT NULL,
                beta REAL NOT NULL,
                PRIMARY KEY (user_id, family_key, arm_id)
            );
            CREATE TABLE IF NOT EXISTS decision_log (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                entry TEXT NOT NULL,
                outcome TEXT
            );",
        )?;

        // Migration: reward column arrived after the first release
        let has_reward: bool = self.conn
            .prepare("SELECT reward FROM decision_log LIMIT 1")
            .is_ok();
        if !has_reward {
            let _ = self.conn.execute("ALTER TABLE decision_log ADD COLUMN reward REAL", []);
        }

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_decision_user ON decision_log (user_id, created_at)",
            [],
        )?;

        Ok(())
    }

    /// Raw stored payload, for inspection from the CLI
    pub fn state_payload(&self, user_id: &str, exercise_id: &str) -> Result<Option<String>> {
        let payload = self.conn
            .query_row(
                "SELECT payload FROM exercise_states WHERE user_id = ?1 AND exercise_id = ?2",
                params![user_id, exercise_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn decode_decisions(&self, sql: &str, user_id: &str, limit: i64) -> Result<LoadReport<DecisionLogEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![user_id, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = LoadReport::default();
        for (id, entry_json, outcome_json, reward) in rows {
            match decode_decision(&entry_json, outcome_json.as_deref(), reward) {
                Ok(entry) => report.records.push(entry),
                Err(reason) => {
                    tracing::warn!("Skipping corrupt decision {}: {}", id, reason);
                    report.skipped.push(SkippedRecord { key: id, reason });
                }
            }
        }
        Ok(report)
    }
}

fn decode_decision(entry_json: &str, outcome_json: Option<&str>, reward: Option<f64>) -> Result<DecisionLogEntry, String> {
    let mut entry: DecisionLogEntry = serde_json::from_str(entry_json).map_err(|e| e.to_string())?;
    if let Some(raw) = outcome_json {
        let outcome: OutcomeRecord = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        entry.outcome = Some(outcome);
        entry.reward = reward;
    }
    Ok(entry)
}

impl Repository for Database {
    fn load_states(&self, user_id: &str) -> Result<LoadReport<ExerciseState>> {
        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, payload FROM exercise_states WHERE user_id = ?1 ORDER BY exercise_id",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = LoadReport::default();
        for (exercise_id, payload) in rows {
            let decoded = serde_json::from_str::<ExerciseState>(&payload)
                .map_err(|e| e.to_string())
                .and_then(|state| state.validate().map(|_| state).map_err(|e| e.to_string()));
            match decoded {
                Ok(state) => report.records.push(state),
                Err(reason) => {
                    tracing::warn!("Skipping corrupt state {}/{}: {}", user_id, exercise_id, reason);
                    report.skipped.push(SkippedRecord {
                        key: exercise_id,
                        reason,
                    });
                }
            }
        }
        Ok(report)
    }

    fn save_state(&self, user_id: &str, state: &ExerciseState) -> Result<()> {
        state.validate()?;
        self.conn.execute(
            "INSERT INTO exercise_states (user_id, exercise_id, payload, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, exercise_id) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
            params![
                user_id,
                state.exercise_id,
                serde_json::to_string(state)?,
                state.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load_priors(&self, user_id: &str) -> Result<LoadReport<PriorEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT family_key, arm_id, alpha, beta FROM bandit_priors WHERE user_id = ?1 ORDER BY family_key, arm_id",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = LoadReport::default();
        for (family_key, arm_id, alpha, beta) in rows {
            let key = format!("{}/{}", family_key, arm_id);
            let prior = BetaPrior { alpha, beta };
            match PolicyArm::from_id(&arm_id) {
                Some(arm) if prior.is_valid() => report.records.push(PriorEntry {
                    user_id: user_id.to_string(),
                    family_key,
                    arm,
                    prior,
                }),
                Some(_) => {
                    tracing::warn!("Skipping invalid prior {}: ({}, {})", key, alpha, beta);
                    report.skipped.push(SkippedRecord {
                        key,
                        reason: format!("invalid beta parameters ({}, {})", alpha, beta),
                    });
                }
                None => {
                    tracing::warn!("Skipping prior for unknown arm {}", key);
                    report.skipped.push(SkippedRecord {
                        key,
                        reason: format!("unknown arm {}", arm_id),
                    });
                }
            }
        }
        Ok(report)
    }

    fn save_prior(&self, entry: &PriorEntry) -> Result<()> {
        if !entry.prior.is_valid() {
            anyhow::bail!(
                "refusing to store invalid prior ({}, {}) for {}/{}",
                entry.prior.alpha,
                entry.prior.beta,
                entry.family_key,
                entry.arm
            );
        }
        self.conn.execute(
            "INSERT INTO bandit_priors (user_id, family_key, arm_id, alpha, beta) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, family_key, arm_id) DO UPDATE SET alpha = excluded.alpha, beta = excluded.beta",
            params![
                entry.user_id,
                entry.family_key,
                entry.arm.id(),
                entry.prior.alpha,
                entry.prior.beta,
            ],
        )?;
        Ok(())
    }

    fn reset_priors(&self, user_id: &str, family_key: Option<&str>) -> Result<usize> {
        let removed = match family_key {
            Some(family) => self.conn.execute(
                "DELETE FROM bandit_priors WHERE user_id = ?1 AND family_key = ?2",
                params![user_id, family],
            )?,
            None => self
                .conn
                .execute("DELETE FROM bandit_priors WHERE user_id = ?1", params![user_id])?,
        };
        Ok(removed)
    }

    fn save_decision(&self, entry: &DecisionLogEntry) -> Result<()> {
        // Entry body is stored without its outcome; the outcome column is write-once
        let mut body = entry.clone();
        body.outcome = None;
        body.reward = None;
        let outcome = entry.outcome.as_ref().map(serde_json::to_string).transpose()?;

        self.conn.execute(
            "INSERT INTO decision_log (id, user_id, created_at, entry, outcome, reward) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (id) DO UPDATE SET outcome = excluded.outcome, reward = excluded.reward
             WHERE decision_log.outcome IS NULL",
            params![
                entry.id.to_string(),
                entry.user_id,
                entry.created_at.to_rfc3339(),
                serde_json::to_string(&body)?,
                outcome,
                entry.reward,
            ],
        )?;
        Ok(())
    }

    fn load_decisions(&self, user_id: &str) -> Result<LoadReport<DecisionLogEntry>> {
        self.decode_decisions(
            "SELECT id, entry, outcome, reward FROM decision_log WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC LIMIT ?2",
            user_id,
            -1,
        )
    }

    fn recent_decisions(&self, user_id: &str, limit: usize) -> Result<LoadReport<DecisionLogEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.decode_decisions(
            "SELECT id, entry, outcome, reward FROM decision_log WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            user_id,
            limit,
        )
    }
}
