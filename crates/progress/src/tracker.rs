//! Progress tracking service.
//!
//! Loads a consistent snapshot from storage and runs the matcher and
//! aggregator over it.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tenweek_core::{Action, Contribution, Goal, GoalId, Match};
use tenweek_storage::{Result, Storage};
use tracing::{debug, info};

use crate::aggregation::{
    aggregate_all_goals, aggregate_goal_progress, get_progress_summary, GoalProgress,
    ProgressSummary,
};
use crate::matching::{filter_ambiguous, infer_matches, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::term::{term_progress, TermProgress};

/// Knobs for a progress computation.
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Only count actions inside a goal's date window
    pub require_period_match: bool,

    /// Inferred matches below this need review
    pub confidence_threshold: f32,

    /// Date used for term elapsed fractions
    pub as_of: NaiveDate,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            require_period_match: true,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            as_of: Utc::now().date_naive(),
        }
    }
}

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Progress for every goal.
    async fn snapshot(&self, options: &TrackerOptions) -> Result<ProgressSnapshot>;

    /// Progress for one goal.
    async fn goal_progress(
        &self,
        goal_id: GoalId,
        options: &TrackerOptions,
    ) -> Result<Option<GoalProgress>>;

    /// Progress for the term with the given number.
    async fn term_progress(
        &self,
        number: u32,
        options: &TrackerOptions,
    ) -> Result<Option<TermProgress>>;

    /// Inferred matches the user has not confirmed, split by confidence.
    async fn suggest(&self, options: &TrackerOptions) -> Result<InferenceSession>;
}

/// A snapshot of progress at a point in time.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Progress per goal, in storage order
    pub goals: Vec<GoalProgress>,

    /// Rollup over `goals`
    pub summary: ProgressSummary,

    /// Matches the progress was computed from
    pub matches: Vec<Match>,
}

/// Results of one inference run, for review.
#[derive(Debug, Clone)]
pub struct InferenceSession {
    /// Actions considered
    pub actions_analyzed: usize,

    /// Goals considered
    pub goals_analyzed: usize,

    /// Inferred matches at or above the threshold
    pub confident: Vec<Match>,

    /// Inferred matches below the threshold
    pub ambiguous: Vec<Match>,

    /// Actions that matched nothing
    pub unmatched_actions: Vec<Action>,

    /// When the run happened
    pub run_at: DateTime<Utc>,
}

/// Basic progress tracker implementation.
pub struct BasicProgressTracker<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Create a tracker over storage shared with other services.
    pub fn with_shared(storage: Arc<S>) -> Self {
        Self { storage }
    }

    async fn load(&self) -> Result<(Vec<Action>, Vec<Goal>, Vec<Contribution>)> {
        let actions = self.storage.list_actions().await?;
        let goals = self.storage.list_goals().await?;
        let contributions = self.storage.list_contributions().await?;
        debug!(
            actions = actions.len(),
            goals = goals.len(),
            contributions = contributions.len(),
            "loaded progress inputs"
        );
        Ok((actions, goals, contributions))
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn snapshot(&self, options: &TrackerOptions) -> Result<ProgressSnapshot> {
        let (actions, goals, contributions) = self.load().await?;

        let matches = infer_matches(&actions, &goals, &contributions, options.require_period_match);
        let progress = aggregate_all_goals(&goals, &matches);
        let summary = get_progress_summary(&progress);

        info!(
            goals = summary.total_goals,
            complete = summary.complete_goals,
            matches = matches.len(),
            "computed progress snapshot"
        );

        Ok(ProgressSnapshot {
            timestamp: Utc::now(),
            goals: progress,
            summary,
            matches,
        })
    }

    async fn goal_progress(
        &self,
        goal_id: GoalId,
        options: &TrackerOptions,
    ) -> Result<Option<GoalProgress>> {
        let Some(goal) = self.storage.load_goal(goal_id).await? else {
            debug!(%goal_id, "goal not found");
            return Ok(None);
        };
        let actions = self.storage.list_actions().await?;
        let contributions = self.storage.list_contributions().await?;

        let goals = std::slice::from_ref(&goal);
        let matches = infer_matches(&actions, goals, &contributions, options.require_period_match);
        Ok(Some(aggregate_goal_progress(&goal, &matches)))
    }

    async fn term_progress(
        &self,
        number: u32,
        options: &TrackerOptions,
    ) -> Result<Option<TermProgress>> {
        let terms = self.storage.list_terms().await?;
        let Some(term) = terms.into_iter().find(|t| t.number == number) else {
            debug!(number, "term not found");
            return Ok(None);
        };
        let (actions, goals, contributions) = self.load().await?;

        Ok(Some(term_progress(
            &term,
            &goals,
            &actions,
            &contributions,
            options.require_period_match,
            options.as_of,
        )))
    }

    async fn suggest(&self, options: &TrackerOptions) -> Result<InferenceSession> {
        let (actions, goals, contributions) = self.load().await?;

        let matches = infer_matches(&actions, &goals, &contributions, options.require_period_match);
        let matched: HashSet<_> = matches.iter().map(|m| m.action_id).collect();
        let inferred: Vec<Match> = matches.into_iter().filter(|m| !m.is_explicit()).collect();
        let (confident, ambiguous) = filter_ambiguous(inferred, options.confidence_threshold);

        let unmatched_actions: Vec<Action> = actions
            .iter()
            .filter(|a| !matched.contains(&a.id))
            .cloned()
            .collect();

        info!(
            confident = confident.len(),
            ambiguous = ambiguous.len(),
            unmatched = unmatched_actions.len(),
            "inference run finished"
        );

        Ok(InferenceSession {
            actions_analyzed: actions.len(),
            goals_analyzed: goals.len(),
            confident,
            ambiguous,
            unmatched_actions,
            run_at: Utc::now(),
        })
    }
}
