//! Progress Tracking
//!
//! Action-to-goal matching, goal progress aggregation, and term rollups.

#![warn(missing_docs)]

pub mod matching;
pub mod aggregation;
pub mod term;
pub mod tracker;

pub use matching::{
    infer_matches, filter_ambiguous, create_manual_match, confirm_match,
    matches_on_period, matches_on_unit, matches_with_actionability, credits_goal,
    normalize_unit, UnitMatch, DEFAULT_CONFIDENCE_THRESHOLD,
};
pub use aggregation::{
    aggregate_goal_progress, aggregate_all_goals, get_progress_summary,
    GoalProgress, ProgressStatus, ProgressSummary,
};
pub use term::{
    active_term, terms_by_status, committed_goals, overlapping_goals, unassigned_goals,
    validate_goal_term_assignment, actions_in_term, term_progress, TermProgress,
};
pub use tracker::{
    ProgressTracker, BasicProgressTracker, ProgressSnapshot, InferenceSession, TrackerOptions,
};
