//! Unique identifiers for tenweek entities.
//!
//! Every entity has exactly one canonical identifier: a ULID newtype.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Generate a new identifier.
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

entity_id!(
    /// Unique identifier for an Action
    ActionId
);

entity_id!(
    /// Unique identifier for a Goal
    GoalId
);

entity_id!(
    /// Unique identifier for a Term
    TermId
);

entity_id!(
    /// Unique identifier for a Value
    ValueId
);

entity_id!(
    /// Unique identifier for a persisted Contribution
    ContributionId
);
