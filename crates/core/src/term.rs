//! Term model - a bounded planning period goals are committed to.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::{GoalId, TermId};

/// Default term length.
pub const TERM_LENGTH_DAYS: i64 = 70;

/// Where a term stands relative to a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    /// Not started yet
    Upcoming,
    /// In progress
    Active,
    /// Ended
    Complete,
}

impl TermStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TermStatus::Upcoming => "upcoming",
            TermStatus::Active => "active",
            TermStatus::Complete => "complete",
        }
    }
}

/// A planning period, ten weeks unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Unique identifier
    pub id: TermId,

    /// Sequential number (Term 1, Term 2, ...)
    pub number: u32,

    /// First day
    pub start_date: NaiveDate,

    /// Last day
    pub end_date: NaiveDate,

    /// Focus area
    #[serde(default)]
    pub theme: Option<String>,

    /// Goals explicitly committed to this term
    #[serde(default)]
    pub goal_ids: Vec<GoalId>,

    /// Post-term reflection
    #[serde(default)]
    pub reflection: Option<String>,
}

impl Term {
    /// Create a term; `end_date` defaults to 70 days after `start_date`.
    pub fn new(number: u32, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Result<Self> {
        let end_date = match end_date {
            Some(end) => end,
            None => start_date
                .checked_add_signed(chrono::Duration::days(TERM_LENGTH_DAYS))
                .ok_or_else(|| {
                    CoreError::DateOutOfRange(format!("{start_date} + {TERM_LENGTH_DAYS} days"))
                })?,
        };
        if end_date < start_date {
            return Err(CoreError::validation("term ends before it starts"));
        }

        Ok(Self {
            id: TermId::new(),
            number,
            start_date,
            end_date,
            theme: None,
            goal_ids: Vec::new(),
            reflection: None,
        })
    }

    /// Whether `date` falls within the term.
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether the term starts after `date`.
    pub fn is_upcoming(&self, date: NaiveDate) -> bool {
        date < self.start_date
    }

    /// Whether the term ended before `date`.
    pub fn is_complete(&self, date: NaiveDate) -> bool {
        date > self.end_date
    }

    /// Status on `date`.
    pub fn status(&self, date: NaiveDate) -> TermStatus {
        if self.is_upcoming(date) {
            TermStatus::Upcoming
        } else if self.is_active(date) {
            TermStatus::Active
        } else {
            TermStatus::Complete
        }
    }

    /// Length in days.
    pub fn length_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Days since the start; 0 before the term starts.
    pub fn days_elapsed(&self, date: NaiveDate) -> i64 {
        (date - self.start_date).num_days().max(0)
    }

    /// Days left from `date`; 0 once the term is over.
    pub fn days_remaining(&self, date: NaiveDate) -> i64 {
        if date > self.end_date {
            return 0;
        }
        (self.end_date - date).num_days()
    }

    /// Fraction of the term elapsed at `date`, clamped to 0..=1.
    pub fn elapsed_fraction(&self, date: NaiveDate) -> f64 {
        let total = (self.end_date - self.start_date).num_days();
        let elapsed = (date - self.start_date).num_days();
        if total <= 0 {
            return if elapsed >= 0 { 1.0 } else { 0.0 };
        }
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Whether `[start, end]` overlaps the term.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end_date && end >= self.start_date
    }

    /// Whether the goal was committed to this term.
    pub fn is_committed(&self, goal_id: GoalId) -> bool {
        self.goal_ids.contains(&goal_id)
    }
}
