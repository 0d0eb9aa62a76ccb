//! Action model - something the user did, optionally measured.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::ActionId;
use crate::Time;

/// An action is a logged occurrence of something done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier
    pub id: ActionId,

    /// Short title, also searched by actionability keywords
    pub title: String,

    /// Longer description
    #[serde(default)]
    pub description: Option<String>,

    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,

    /// When the action was logged
    pub log_time: Time,

    /// When the action started, if tracked separately
    #[serde(default)]
    pub start_time: Option<Time>,

    /// How long it took
    #[serde(default)]
    pub duration_minutes: Option<f64>,

    /// Measurement unit name to amount, e.g. `{"km": 5.0}`
    #[serde(default)]
    pub measurements: BTreeMap<String, f64>,
}

impl Action {
    /// Create a new action logged now.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(),
            title: title.into(),
            description: None,
            notes: None,
            log_time: chrono::Utc::now(),
            start_time: None,
            duration_minutes: None,
            measurements: BTreeMap::new(),
        }
    }

    /// Set the log time.
    pub fn logged_at(mut self, time: Time) -> Self {
        self.log_time = time;
        self
    }

    /// Add a measurement.
    pub fn with_measurement(mut self, unit: impl Into<String>, amount: f64) -> Self {
        self.measurements.insert(unit.into(), amount);
        self
    }

    /// When the action actually happened: start time if known, else log time.
    pub fn occurred_at(&self) -> Time {
        self.start_time.unwrap_or(self.log_time)
    }

    /// Measurements that can contribute to a goal.
    ///
    /// Non-positive and non-finite amounts are skipped.
    pub fn valid_measurements(&self) -> impl Iterator<Item = (&str, f64)> {
        self.measurements
            .iter()
            .filter(|(_, amount)| amount.is_finite() && **amount > 0.0)
            .map(|(unit, amount)| (unit.as_str(), *amount))
    }

    /// Check the action before it is stored.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("action title is empty"));
        }
        for (unit, amount) in &self.measurements {
            if !amount.is_finite() || *amount <= 0.0 {
                return Err(CoreError::validation(format!(
                    "measurement '{unit}' must be positive, got {amount}"
                )));
            }
        }
        if self.start_time.is_some() && self.duration_minutes.is_none() {
            return Err(CoreError::validation("start time set without a duration"));
        }
        Ok(())
    }
}
