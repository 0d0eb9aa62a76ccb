//! Goal model - a measurable or qualitative objective over a date window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::{GoalId, ValueId};
use crate::Time;

/// A goal the user is working toward.
///
/// The fields shared by every kind of goal live here; kind-specific fields
/// live in [`GoalKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: GoalId,

    /// Goal title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: Option<String>,

    /// Unit the target is measured in, e.g. "km"
    #[serde(default)]
    pub measurement_unit: Option<String>,

    /// Numeric target in `measurement_unit`
    #[serde(default)]
    pub measurement_target: Option<f64>,

    /// First day of the window (inclusive)
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the window (inclusive)
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Hints narrowing which actions count
    #[serde(default)]
    pub actionability: Option<Actionability>,

    /// Values this goal serves
    #[serde(default)]
    pub value_ids: Vec<ValueId>,

    /// Kind-specific data
    #[serde(default)]
    pub kind: GoalKind,

    /// When created
    pub created_at: Time,
}

/// The kind of a goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalKind {
    /// Plain goal, possibly loose
    #[default]
    Goal,

    /// Checkpoint reached on a given date
    Milestone {
        /// Date the milestone should be reached by
        target_date: NaiveDate,
    },

    /// Specific, measurable, achievable, relevant, time-bound goal
    SmartGoal {
        /// Why this goal matters
        relevance: String,
    },

    /// Commitment owed to someone else
    Obligation {
        /// Hard deadline
        deadline: NaiveDate,
        /// Who asked for it
        #[serde(default)]
        requested_by: Option<String>,
    },
}

impl GoalKind {
    /// Short name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Goal => "goal",
            GoalKind::Milestone { .. } => "milestone",
            GoalKind::SmartGoal { .. } => "smart",
            GoalKind::Obligation { .. } => "obligation",
        }
    }
}

impl Goal {
    /// Create a new loose goal.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: GoalId::new(),
            title: title.into(),
            description: None,
            measurement_unit: None,
            measurement_target: None,
            start_date: None,
            end_date: None,
            actionability: None,
            value_ids: Vec::new(),
            kind: GoalKind::Goal,
            created_at: chrono::Utc::now(),
        }
    }

    /// Set unit and target.
    pub fn with_target(mut self, target: f64, unit: impl Into<String>) -> Self {
        self.measurement_target = Some(target);
        self.measurement_unit = Some(unit.into());
        self
    }

    /// Set the date window.
    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Set actionability hints.
    pub fn with_actionability(mut self, hints: Actionability) -> Self {
        self.actionability = Some(hints);
        self
    }

    /// Whether the goal has both a unit and a target.
    pub fn is_measurable(&self) -> bool {
        self.measurement_unit.is_some() && self.measurement_target.is_some()
    }

    /// Whether the goal has both a start and an end date.
    pub fn is_time_bound(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }

    /// Whether `date` falls in the window. A missing side is unbounded.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| start <= date)
            && self.end_date.map_or(true, |end| date <= end)
    }

    /// Push the end date back by `days`.
    pub fn extend_deadline(&mut self, days: i64) -> Result<()> {
        let end = self.end_date.ok_or(CoreError::NoDeadline)?;
        let extended = chrono::Duration::try_days(days)
            .and_then(|d| end.checked_add_signed(d))
            .ok_or_else(|| CoreError::DateOutOfRange(format!("{end} + {days} days")))?;
        self.end_date = Some(extended);
        Ok(())
    }

    /// Check the goal before it is stored.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::validation("goal title is empty"));
        }
        if self.measurement_target.is_some() && self.measurement_unit.is_none() {
            return Err(CoreError::validation("target set without a measurement unit"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(CoreError::validation("start date is after end date"));
            }
        }

        match &self.kind {
            GoalKind::Goal | GoalKind::Milestone { .. } | GoalKind::Obligation { .. } => Ok(()),
            GoalKind::SmartGoal { relevance } => self.validate_smart(relevance),
        }
    }

    fn validate_smart(&self, relevance: &str) -> Result<()> {
        let unit_ok = self
            .measurement_unit
            .as_deref()
            .is_some_and(|u| !u.trim().is_empty());
        if !unit_ok {
            return Err(CoreError::validation("SMART goal needs a measurement unit"));
        }
        match self.measurement_target {
            Some(target) if target > 0.0 => {}
            _ => return Err(CoreError::validation("SMART goal needs a positive target")),
        }
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start < end => {}
            _ => {
                return Err(CoreError::validation(
                    "SMART goal needs a start date before its end date",
                ))
            }
        }
        if relevance.trim().is_empty() {
            return Err(CoreError::validation("SMART goal needs a relevance statement"));
        }
        if !self.actionability.as_ref().is_some_and(Actionability::is_usable) {
            return Err(CoreError::validation("SMART goal needs actionability hints"));
        }
        Ok(())
    }
}

/// Lowercase and join words with underscores: `"Distance km"` -> `"distance_km"`.
pub fn normalize_unit(unit: &str) -> String {
    unit.trim().to_lowercase().replace(' ', "_")
}

/// Structured hints describing which actions advance a goal.
///
/// Units are stored normalized, keywords lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actionability {
    /// Measurement units accepted
    #[serde(default)]
    pub units: Vec<String>,

    /// Keywords, one of which must appear in the action title
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Actionability {
    /// Build hints, normalising each entry.
    pub fn new<U, K>(units: U, keywords: K) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let units = units
            .into_iter()
            .map(|u| normalize_unit(u.as_ref()))
            .filter(|u| !u.is_empty())
            .collect();
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().replace('*', "").trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { units, keywords }
    }

    /// Parse `{"units": [...], "keywords": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Actionability = serde_json::from_str(json)?;
        Ok(Self::new(raw.units, raw.keywords))
    }

    /// Hints only narrow matching when both lists are non-empty.
    pub fn is_usable(&self) -> bool {
        !self.units.is_empty() && !self.keywords.is_empty()
    }

    /// Whether `unit` is one of the accepted units.
    pub fn accepts_unit(&self, unit: &str) -> bool {
        let unit = normalize_unit(unit);
        self.units.iter().any(|u| normalize_unit(u) == unit)
    }

    /// Whether any keyword appears in `text`.
    pub fn mentions_keyword(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn smart_goal() -> Goal {
        let mut goal = Goal::new("Run 120km")
            .with_target(120.0, "km")
            .with_window(Some(date(2025, 4, 12)), Some(date(2025, 6, 21)))
            .with_actionability(Actionability::new(["km"], ["run"]));
        goal.kind = GoalKind::SmartGoal {
            relevance: "Fitness".into(),
        };
        goal
    }

    #[test]
    fn test_contains_date_open_ended() {
        let goal = Goal::new("Read").with_window(Some(date(2025, 1, 1)), None);
        assert!(!goal.contains_date(date(2024, 12, 31)));
        assert!(goal.contains_date(date(2025, 1, 1)));
        assert!(goal.contains_date(date(2030, 1, 1)));

        let loose = Goal::new("Loose");
        assert!(loose.contains_date(date(1999, 1, 1)));
    }

    #[test]
    fn test_contains_date_inclusive_end() {
        let goal = smart_goal();
        assert!(goal.contains_date(date(2025, 6, 21)));
        assert!(!goal.contains_date(date(2025, 6, 22)));
    }

    #[test]
    fn test_extend_deadline() {
        let mut goal = smart_goal();
        goal.extend_deadline(7).unwrap();
        assert_eq!(goal.end_date, Some(date(2025, 6, 28)));

        let mut loose = Goal::new("Loose");
        assert!(matches!(loose.extend_deadline(7), Err(CoreError::NoDeadline)));
    }

    #[test]
    fn test_extend_deadline_past_calendar_end() {
        let mut goal = Goal::new("Forever").with_window(None, Some(NaiveDate::MAX));
        assert!(matches!(goal.extend_deadline(1), Err(CoreError::DateOutOfRange(_))));
        assert_eq!(goal.end_date, Some(NaiveDate::MAX));

        let mut goal = smart_goal();
        assert!(matches!(goal.extend_deadline(i64::MAX), Err(CoreError::DateOutOfRange(_))));
    }

    #[test]
    fn test_hinted_units_normalized() {
        let hints = Actionability::new(["Distance km"], ["run"]);
        assert_eq!(hints.units, vec!["distance_km"]);
        assert!(hints.accepts_unit("distance_km"));
        assert!(hints.accepts_unit(" Distance KM "));

        // records written by hand may carry raw units
        let raw = Actionability {
            units: vec!["distance_km".into()],
            keywords: vec!["run".into()],
        };
        assert!(raw.accepts_unit("Distance km"));
        assert!(!raw.accepts_unit("km"));
    }

    #[test]
    fn test_smart_goal_validation() {
        assert!(smart_goal().validate().is_ok());

        let mut no_target = smart_goal();
        no_target.measurement_target = Some(0.0);
        assert!(no_target.validate().is_err());

        let mut reversed = smart_goal();
        reversed.start_date = Some(date(2025, 7, 1));
        assert!(reversed.validate().is_err());

        let mut no_hints = smart_goal();
        no_hints.actionability = None;
        assert!(no_hints.validate().is_err());
    }

    #[test]
    fn test_target_requires_unit() {
        let mut goal = Goal::new("Half-specified");
        goal.measurement_target = Some(10.0);
        assert!(goal.validate().is_err());
    }

    #[test]
    fn test_actionability_from_json() {
        let hints =
            Actionability::from_json(r#"{"units": ["KM", " miles "], "keywords": ["Run*", " "]}"#)
                .unwrap();
        assert_eq!(hints.units, vec!["km", "miles"]);
        assert_eq!(hints.keywords, vec!["run"]);
        assert!(hints.is_usable());
        assert!(hints.accepts_unit("Miles"));
        assert!(hints.mentions_keyword("Morning RUN by the river"));

        assert!(Actionability::from_json("not json").is_err());
    }

    #[test]
    fn test_goal_kind_serde_tag() {
        let goal = smart_goal();
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["kind"]["type"], "smart_goal");

        let back: Goal = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind.as_str(), "smart");
    }
}
