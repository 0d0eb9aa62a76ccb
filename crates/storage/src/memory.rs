//! In-memory storage, for tests and callers that assemble data themselves.

use std::collections::HashMap;

use async_trait::async_trait;
use tenweek_core::{
    Action, ActionId, Contribution, ContributionId, Goal, GoalId, Term, TermId, Value, ValueId,
};

use super::trait_::{sort_actions, sort_goals, sort_terms, sort_values};
use super::{Result, Storage};

/// Storage backed by hash maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    actions: HashMap<ActionId, Action>,
    goals: HashMap<GoalId, Goal>,
    terms: HashMap<TermId, Term>,
    values: HashMap<ValueId, Value>,
    contributions: HashMap<ContributionId, Contribution>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_action(&mut self, action: &Action) -> Result<()> {
        self.actions.insert(action.id, action.clone());
        Ok(())
    }

    async fn load_action(&self, id: ActionId) -> Result<Option<Action>> {
        Ok(self.actions.get(&id).cloned())
    }

    async fn list_actions(&self) -> Result<Vec<Action>> {
        let mut actions: Vec<_> = self.actions.values().cloned().collect();
        sort_actions(&mut actions);
        Ok(actions)
    }

    async fn delete_action(&mut self, id: ActionId) -> Result<()> {
        self.actions.remove(&id);
        self.contributions.retain(|_, c| c.action_id != id);
        Ok(())
    }

    async fn save_goal(&mut self, goal: &Goal) -> Result<()> {
        self.goals.insert(goal.id, goal.clone());
        Ok(())
    }

    async fn load_goal(&self, id: GoalId) -> Result<Option<Goal>> {
        Ok(self.goals.get(&id).cloned())
    }

    async fn list_goals(&self) -> Result<Vec<Goal>> {
        let mut goals: Vec<_> = self.goals.values().cloned().collect();
        sort_goals(&mut goals);
        Ok(goals)
    }

    async fn delete_goal(&mut self, id: GoalId) -> Result<()> {
        self.goals.remove(&id);
        self.contributions.retain(|_, c| c.goal_id != id);
        Ok(())
    }

    async fn save_term(&mut self, term: &Term) -> Result<()> {
        self.terms.insert(term.id, term.clone());
        Ok(())
    }

    async fn load_term(&self, id: TermId) -> Result<Option<Term>> {
        Ok(self.terms.get(&id).cloned())
    }

    async fn list_terms(&self) -> Result<Vec<Term>> {
        let mut terms: Vec<_> = self.terms.values().cloned().collect();
        sort_terms(&mut terms);
        Ok(terms)
    }

    async fn save_value(&mut self, value: &Value) -> Result<()> {
        self.values.insert(value.id, value.clone());
        Ok(())
    }

    async fn load_value(&self, id: ValueId) -> Result<Option<Value>> {
        Ok(self.values.get(&id).cloned())
    }

    async fn list_values(&self) -> Result<Vec<Value>> {
        let mut values: Vec<_> = self.values.values().cloned().collect();
        sort_values(&mut values);
        Ok(values)
    }

    async fn save_contribution(&mut self, contribution: &Contribution) -> Result<()> {
        self.contributions.insert(contribution.id, contribution.clone());
        Ok(())
    }

    async fn list_contributions(&self) -> Result<Vec<Contribution>> {
        let mut contributions: Vec<_> = self.contributions.values().cloned().collect();
        contributions.sort_by_key(|c| c.created_at);
        Ok(contributions)
    }

    async fn delete_contribution(&mut self, id: ContributionId) -> Result<()> {
        self.contributions.remove(&id);
        Ok(())
    }
}
