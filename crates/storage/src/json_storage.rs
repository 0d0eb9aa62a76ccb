//! JSON file storage implementation.
//!
//! Stores one JSON file per record under the data directory:
//! `actions/`, `goals/`, `terms/`, `values/` and `contributions/`.

use std::path::{Path, PathBuf};

use tenweek_core::{
    Action, ActionId, Contribution, ContributionId, Goal, GoalId, Term, TermId, Value, ValueId,
};
use tokio::fs;
use tracing::{debug, warn};

use super::trait_::{sort_actions, sort_goals, sort_terms, sort_values};
use super::{Result, Storage};

const KINDS: [&str; 5] = ["actions", "goals", "terms", "values", "contributions"];

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Open storage at `root`, creating the record directories if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in KINDS {
            fs::create_dir_all(root.join(kind)).await?;
        }
        debug!(root = %root.display(), "opened json storage");
        Ok(Self { root })
    }

    /// Data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, kind: &str, id: impl std::fmt::Display) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    async fn write_record<T: serde::Serialize>(
        &self,
        kind: &str,
        id: impl std::fmt::Display,
        record: &T,
    ) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.record_path(kind, id), json.as_bytes()).await?;
        Ok(())
    }

    async fn remove_record(&self, kind: &str, id: impl std::fmt::Display) -> Result<()> {
        fs::remove_file(self.record_path(kind, id)).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
        })?;
        Ok(())
    }

    async fn remove_contributions_where(&self, pred: impl Fn(&Contribution) -> bool) -> Result<()> {
        for c in self.list_contributions().await? {
            if pred(&c) {
                self.remove_record("contributions", c.id).await?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_action(&mut self, action: &Action) -> Result<()> {
        self.write_record("actions", action.id, action).await
    }

    async fn load_action(&self, id: ActionId) -> Result<Option<Action>> {
        read_json(&self.record_path("actions", id)).await
    }

    async fn list_actions(&self) -> Result<Vec<Action>> {
        let mut actions = list_dir(&self.root.join("actions")).await?;
        sort_actions(&mut actions);
        Ok(actions)
    }

    async fn delete_action(&mut self, id: ActionId) -> Result<()> {
        self.remove_record("actions", id).await?;
        self.remove_contributions_where(|c| c.action_id == id).await
    }

    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        self.write_record("goals", goal.id, goal).await
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        read_json(&self.record_path("goals", id)).await
    }

    async fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut goals = list_dir(&self.root.join("goals")).await?;
        sort_goals(&mut goals);
        Ok(goals)
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<()> {
        self.remove_record("goals", id).await?;
        self.remove_contributions_where(|c| c.goal_id == id).await
    }

    async fn save_term(&mut self, term: &Term) -> Result<()> {
        self.write_record("terms", term.id, term).await
    }

    async fn load_term(&self, id: TermId) -> Result<Option<Term>> {
        read_json(&self.record_path("terms", id)).await
    }

    async fn list_terms(&self) -> Result<Vec<Term>> {
        let mut terms = list_dir(&self.root.join("terms")).await?;
        sort_terms(&mut terms);
        Ok(terms)
    }

    async fn save_value(&mut self, value: &Value) -> Result<()> {
        self.write_record("values", value.id, value).await
    }

    async fn load_value(&self, id: ValueId) -> Result<Option<Value>> {
        read_json(&self.record_path("values", id)).await
    }

    async fn list_values(&self) -> Result<Vec<Value>> {
        let mut values = list_dir(&self.root.join("values")).await?;
        sort_values(&mut values);
        Ok(values)
    }

    async fn save_contribution(&mut self, contribution: &Contribution) -> Result<()> {
        self.write_record("contributions", contribution.id, contribution).await
    }

    async fn list_contributions(&self) -> Result<Vec<Contribution>> {
        let mut contributions: Vec<Contribution> =
            list_dir(&self.root.join("contributions")).await?;
        contributions.sort_by_key(|c| c.created_at);
        Ok(contributions)
    }

    async fn delete_contribution(&mut self, id: ContributionId) -> Result<()> {
        self.remove_record("contributions", id).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read every `.json` record in `dir`. Unreadable records are skipped with a
/// warning so one corrupt file does not hide the rest.
async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&path).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
        }
    }
    Ok(items)
}
