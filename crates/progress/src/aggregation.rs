//! Progress aggregation - goal completion metrics from matches.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tenweek_core::{Goal, GoalId, Match};

use crate::matching::credits_goal;

/// Aggregated progress for one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// The goal measured
    pub goal_id: GoalId,

    /// Goal title, for display
    pub title: String,

    /// Unit of `total_progress` and `target`
    pub unit: Option<String>,

    /// Target, if the goal has one
    pub target: Option<f64>,

    /// Sum of matched amounts in the goal's unit, saturating at `f64::MAX`
    pub total_progress: f64,

    /// Distinct actions credited to the goal
    pub matching_actions_count: usize,
}

/// Where a goal stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressStatus {
    /// No positive target to measure against
    NoTarget,
    /// Nothing counted yet
    NotStarted,
    /// Some progress, target not reached
    InProgress,
    /// Target reached exactly or passed
    Complete,
    /// Target passed
    Overachieved,
}

impl ProgressStatus {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NoTarget => "no target",
            ProgressStatus::NotStarted => "not started",
            ProgressStatus::InProgress => "in progress",
            ProgressStatus::Complete => "complete",
            ProgressStatus::Overachieved => "overachieved",
        }
    }
}

impl GoalProgress {
    fn positive_target(&self) -> Option<f64> {
        self.target.filter(|t| t.is_finite() && *t > 0.0)
    }

    /// Percent of target reached; `None` without a positive target.
    ///
    /// May exceed 100. Always finite.
    pub fn percent(&self) -> Option<f64> {
        self.positive_target()
            .map(|target| saturate(self.total_progress / target * 100.0))
    }

    /// Amount still needed, never negative; `None` without a positive target.
    pub fn remaining(&self) -> Option<f64> {
        self.positive_target()
            .map(|target| (target - self.total_progress).max(0.0))
    }

    /// Whether the target has been reached.
    pub fn is_complete(&self) -> bool {
        self.positive_target()
            .is_some_and(|target| self.total_progress >= target)
    }

    /// Whether the target has been passed.
    pub fn is_overachieved(&self) -> bool {
        self.positive_target()
            .is_some_and(|target| self.total_progress > target)
    }

    /// Whether the goal has neither unit nor target; only the action count
    /// means anything.
    pub fn is_qualitative(&self) -> bool {
        self.unit.is_none() && self.target.is_none()
    }

    /// Current status.
    pub fn status(&self) -> ProgressStatus {
        if self.positive_target().is_none() {
            ProgressStatus::NoTarget
        } else if self.is_overachieved() {
            ProgressStatus::Overachieved
        } else if self.is_complete() {
            ProgressStatus::Complete
        } else if self.matching_actions_count == 0 && self.total_progress == 0.0 {
            ProgressStatus::NotStarted
        } else {
            ProgressStatus::InProgress
        }
    }
}

/// Summary across many goals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Goals considered
    pub total_goals: usize,
    /// Goals whose target is reached
    pub complete_goals: usize,
    /// All other goals
    pub in_progress_goals: usize,
    /// Mean percent over goals that have a target
    pub avg_completion_percent: f64,
    /// Matched actions summed over goals
    pub total_actions_matched: usize,
}

/// Clamp overflowed or undefined values to the largest finite `f64`.
fn saturate(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        f64::MAX
    }
}

/// Whether a match counts toward the goal.
///
/// Explicit matches always do. Inferred matches count when the goal has no
/// unit, or when their unit credits the goal; unconfirmed fuzzy keys do not.
fn counts_toward(m: &Match, goal: &Goal) -> bool {
    if m.is_explicit() {
        return true;
    }
    match (&goal.measurement_unit, &m.unit) {
        (None, _) => true,
        (Some(_), Some(unit)) => credits_goal(unit, goal),
        (Some(_), None) => false,
    }
}

/// Progress for one goal from the matches given.
///
/// Matches naming other goals are ignored. For goals with a unit, only
/// explicit matches and amounts in that unit are summed.
pub fn aggregate_goal_progress<'a>(
    goal: &Goal,
    matches: impl IntoIterator<Item = &'a Match>,
) -> GoalProgress {
    let mut total: f64 = 0.0;
    let mut actions = HashSet::new();

    for m in matches.into_iter().filter(|m| m.goal_id == goal.id) {
        if !counts_toward(m, goal) {
            continue;
        }
        actions.insert(m.action_id);
        if m.amount.is_finite() && m.amount > 0.0 {
            total = saturate(total + m.amount);
        }
    }

    GoalProgress {
        goal_id: goal.id,
        title: goal.title.clone(),
        unit: goal.measurement_unit.clone(),
        target: goal.measurement_target,
        total_progress: total,
        matching_actions_count: actions.len(),
    }
}

/// Progress for every goal, in input order, including goals with no matches.
pub fn aggregate_all_goals(goals: &[Goal], matches: &[Match]) -> Vec<GoalProgress> {
    let mut by_goal: HashMap<GoalId, Vec<&Match>> = HashMap::new();
    for m in matches {
        by_goal.entry(m.goal_id).or_default().push(m);
    }

    goals
        .iter()
        .map(|goal| {
            let goal_matches = by_goal.get(&goal.id).map(Vec::as_slice).unwrap_or(&[]);
            aggregate_goal_progress(goal, goal_matches.iter().copied())
        })
        .collect()
}

/// Count complete and in-progress goals.
pub fn get_progress_summary(progress: &[GoalProgress]) -> ProgressSummary {
    let complete_goals = progress.iter().filter(|p| p.is_complete()).count();
    let percents: Vec<f64> = progress.iter().filter_map(GoalProgress::percent).collect();
    let avg_completion_percent = if percents.is_empty() {
        0.0
    } else {
        let n = percents.len() as f64;
        saturate(percents.iter().map(|p| p / n).sum())
    };

    ProgressSummary {
        total_goals: progress.len(),
        complete_goals,
        in_progress_goals: progress.len() - complete_goals,
        avg_completion_percent,
        total_actions_matched: progress.iter().map(|p| p.matching_actions_count).sum(),
    }
}
