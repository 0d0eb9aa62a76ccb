//! Storage trait abstraction.

use async_trait::async_trait;
use tenweek_core::{
    Action, ActionId, Contribution, ContributionId, Goal, GoalId, Term, TermId, Value, ValueId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for tenweek data.
///
/// Progress computation only needs the `list_*` methods; the rest exist for
/// callers that record data.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Action operations ===

    /// Save an action (create or update).
    async fn save_action(&mut self, action: &Action) -> Result<()>;

    /// Load an action by ID.
    async fn load_action(&self, id: ActionId) -> Result<Option<Action>>;

    /// List all actions, oldest first.
    async fn list_actions(&self) -> Result<Vec<Action>>;

    /// Delete an action and any contributions naming it.
    async fn delete_action(&mut self, id: ActionId) -> Result<()>;

    // === Goal operations ===

    /// Save a goal (create or update).
    async fn save_goal(&mut self, goal: &Goal) -> Result<()>;

    /// Load a goal by ID.
    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>>;

    /// List all goals, oldest first.
    async fn list_goals(&self) -> Result<Vec<Goal>>;

    /// Delete a goal and any contributions naming it.
    async fn delete_goal(&mut self, id: GoalId) -> Result<()>;

    // === Term operations ===

    /// Save a term.
    async fn save_term(&mut self, term: &Term) -> Result<()>;

    /// Load a term by ID.
    async fn load_term(&self, id: TermId) -> Result<Option<Term>>;

    /// List all terms ordered by number.
    async fn list_terms(&self) -> Result<Vec<Term>>;

    // === Value operations ===

    /// Save a value.
    async fn save_value(&mut self, value: &Value) -> Result<()>;

    /// Load a value by ID.
    async fn load_value(&self, id: ValueId) -> Result<Option<Value>>;

    /// List all values, highest priority first.
    async fn list_values(&self) -> Result<Vec<Value>>;

    // === Contribution operations ===

    /// Save an explicit action-goal link.
    async fn save_contribution(&mut self, contribution: &Contribution) -> Result<()>;

    /// List all explicit links.
    async fn list_contributions(&self) -> Result<Vec<Contribution>>;

    /// Delete an explicit link.
    async fn delete_contribution(&mut self, id: ContributionId) -> Result<()>;
}

pub(crate) fn sort_actions(actions: &mut [Action]) {
    actions.sort_by(|a, b| a.log_time.cmp(&b.log_time).then(a.id.cmp(&b.id)));
}

pub(crate) fn sort_goals(goals: &mut [Goal]) {
    goals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

pub(crate) fn sort_terms(terms: &mut [Term]) {
    terms.sort_by_key(|t| (t.number, t.start_date));
}

pub(crate) fn sort_values(values: &mut [Value]) {
    values.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
}
