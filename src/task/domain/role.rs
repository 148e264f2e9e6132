//! Requester roles and their normalization.
//!
//! The source application compared role strings ad hoc and in several
//! spellings. Here the role is a closed enum with a single normalization
//! point; callers that receive an unknown or missing role string fall back
//! to the most restrictive tier.

use super::ParseRoleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role tier controlling task visibility breadth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Application administrator.
    Administrator,
    /// Director with cross-team oversight via memberships.
    Director,
    /// Team coordinator; sees the full task list of their team.
    Coordinator,
    /// Ordinary participant; sees only work that concerns them.
    Participant,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Director => "director",
            Self::Coordinator => "coordinator",
            Self::Participant => "participant",
        }
    }

    /// Returns whether this role may review (approve or reject) submitted
    /// work.
    #[must_use]
    pub const fn is_reviewer(self) -> bool {
        !matches!(self, Self::Participant)
    }

    /// Normalizes an optional role string, treating unknown or absent
    /// values as the most restrictive role.
    #[must_use]
    pub fn normalize_or_restrictive(value: Option<&str>) -> Self {
        value
            .and_then(|raw| Self::try_from(raw).ok())
            .unwrap_or(Self::Participant)
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        // Accepts the legacy Polish spellings alongside the canonical ones.
        match normalized.as_str() {
            "administrator" | "admin" => Ok(Self::Administrator),
            "director" | "dyrektor" => Ok(Self::Director),
            "coordinator" | "koordynator" => Ok(Self::Coordinator),
            "participant" | "uczestnik" => Ok(Self::Participant),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
