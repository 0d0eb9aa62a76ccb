//! Value model - personal priorities goals can be tagged with.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::id::ValueId;

/// Priority from 1 (highest) to 100 (lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    /// Highest priority.
    pub const HIGHEST: Priority = Priority(1);

    /// Create a priority, rejecting values outside 1..=100.
    pub fn new(level: u8) -> Result<Self> {
        if (1..=100).contains(&level) {
            Ok(Self(level))
        } else {
            Err(CoreError::InvalidPriority(level))
        }
    }

    /// Numeric level.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<u8> for Priority {
    type Error = CoreError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.0
    }
}

/// What sort of value this is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueKind {
    /// Affirmed but not tracked closely
    #[default]
    General,
    /// Actionable value goals should reflect
    Major {
        /// How this value shows up in actions and goals
        #[serde(default)]
        alignment_guidance: Option<String>,
    },
    /// Abstract, rarely actionable
    HighestOrder,
    /// Domain of life that motivates without being a value
    LifeArea,
}

impl ValueKind {
    /// Short name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::General => "general",
            ValueKind::Major { .. } => "major",
            ValueKind::HighestOrder => "highest_order",
            ValueKind::LifeArea => "life_area",
        }
    }
}

/// A personal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    /// Unique identifier
    pub id: ValueId,

    /// Short name
    pub name: String,

    /// What it means
    pub description: String,

    /// Priority
    #[serde(default)]
    pub priority: Priority,

    /// Life domain, e.g. Health
    #[serde(default = "default_life_domain")]
    pub life_domain: String,

    /// Kind of value
    #[serde(default)]
    pub kind: ValueKind,
}

fn default_life_domain() -> String {
    "General".to_string()
}

impl Value {
    /// Create a general value.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ValueId::new(),
            name: name.into(),
            description: description.into(),
            priority: Priority::default(),
            life_domain: default_life_domain(),
            kind: ValueKind::General,
        }
    }
}
