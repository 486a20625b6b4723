//! Daily biometric samples supplied by the health-data importer

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of recovery biometrics; any metric may be missing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBiometrics {
    pub date: NaiveDate,
    #[serde(default)]
    pub sleep_minutes: Option<f64>,
    #[serde(default)]
    pub resting_heart_rate: Option<f64>,
    #[serde(default)]
    pub hrv_ms: Option<f64>,
}

impl DailyBiometrics {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sleep_minutes: None,
            resting_heart_rate: None,
            hrv_ms: None,
        }
    }

    pub fn with_sleep(mut self, minutes: f64) -> Self {
        self.sleep_minutes = Some(minutes);
        self
    }

    pub fn with_resting_hr(mut self, bpm: f64) -> Self {
        self.resting_heart_rate = Some(bpm);
        self
    }

    pub fn with_hrv(mut self, ms: f64) -> Self {
        self.hrv_ms = Some(ms);
        self
    }
}
