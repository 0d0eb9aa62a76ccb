//! Links between actions and goals.
//!
//! A [`Contribution`] is a persisted, user-made link. A [`Match`] is the
//! derived statement "this action counts this much toward that goal".

use serde::{Deserialize, Serialize};

use crate::id::{ActionId, ContributionId, GoalId};
use crate::Time;

/// How a match came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Inferred from units and dates
    AutoInferred,
    /// Inferred, then accepted by the user
    UserConfirmed,
    /// Created by the user
    Manual,
}

impl MatchMethod {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::AutoInferred => "auto_inferred",
            MatchMethod::UserConfirmed => "user_confirmed",
            MatchMethod::Manual => "manual",
        }
    }

    /// Whether the user stands behind this match.
    pub fn is_explicit(&self) -> bool {
        matches!(self, MatchMethod::UserConfirmed | MatchMethod::Manual)
    }
}

/// A user-made link from an action to a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Unique identifier
    pub id: ContributionId,

    /// The contributing action
    pub action_id: ActionId,

    /// The goal credited
    pub goal_id: GoalId,

    /// Recorded amount; inferred from the action's measurements when absent
    #[serde(default)]
    pub amount: Option<f64>,

    /// Manual or confirmed
    pub method: MatchMethod,

    /// When created
    pub created_at: Time,
}

impl Contribution {
    /// Create a manual link.
    pub fn manual(action_id: ActionId, goal_id: GoalId, amount: Option<f64>) -> Self {
        Self {
            id: ContributionId::new(),
            action_id,
            goal_id,
            amount,
            method: MatchMethod::Manual,
            created_at: chrono::Utc::now(),
        }
    }

    /// Persist an accepted match.
    pub fn from_match(m: &Match) -> Self {
        let method = if m.method == MatchMethod::Manual {
            MatchMethod::Manual
        } else {
            MatchMethod::UserConfirmed
        };
        Self {
            id: ContributionId::new(),
            action_id: m.action_id,
            goal_id: m.goal_id,
            amount: Some(m.amount),
            method,
            created_at: chrono::Utc::now(),
        }
    }
}

/// One action contributing some amount of one unit to one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// The contributing action
    pub action_id: ActionId,

    /// The goal credited
    pub goal_id: GoalId,

    /// Unit of `amount`; `None` for qualitative credit
    pub unit: Option<String>,

    /// Amount contributed
    pub amount: f64,

    /// How the match was made
    pub method: MatchMethod,

    /// Confidence in the match (0.0-1.0)
    pub confidence: f32,
}

impl Match {
    /// Whether the user stands behind this match.
    pub fn is_explicit(&self) -> bool {
        self.method.is_explicit()
    }
}
