//! tenweek core data models.
//!
//! Actions, goals, terms and values, plus the links between actions and
//! goals that progress is computed from.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;

// Things done and things wanted
mod action;
mod goal;
mod contribution;

// Planning context
mod term;
mod value;

// Re-exports
pub use id::*;
pub use error::{CoreError, Result};

pub use action::Action;
pub use goal::{normalize_unit, Actionability, Goal, GoalKind};
pub use contribution::{Contribution, Match, MatchMethod};

pub use term::{Term, TermStatus, TERM_LENGTH_DAYS};
pub use value::{Priority, Value, ValueKind};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
