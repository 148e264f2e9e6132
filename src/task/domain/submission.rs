//! Append-only submission log entries.

use super::{SubmissionId, SubmissionText, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One immutable record of submitted work text.
///
/// Submissions are only ever inserted; the current review status lives on
/// the execution, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmission {
    id: SubmissionId,
    user_id: UserId,
    user_name: String,
    text: SubmissionText,
    corrected: bool,
    submitted_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSubmissionData {
    /// Persisted submission identifier.
    pub id: SubmissionId,
    /// Persisted submitting user.
    pub user_id: UserId,
    /// Persisted user display-name snapshot.
    pub user_name: String,
    /// Persisted work text.
    pub text: SubmissionText,
    /// Persisted corrected flag.
    pub corrected: bool,
    /// Persisted submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl TaskSubmission {
    /// Creates a new submission record.
    #[must_use]
    pub fn new(
        user_id: UserId,
        user_name: impl Into<String>,
        text: SubmissionText,
        corrected: bool,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            user_id,
            user_name: user_name.into(),
            text,
            corrected,
            submitted_at: clock.utc(),
        }
    }

    /// Reconstructs a submission from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSubmissionData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            user_name: data.user_name,
            text: data.text,
            corrected: data.corrected,
            submitted_at: data.submitted_at,
        }
    }

    /// Returns the submission identifier.
    #[must_use]
    pub const fn id(&self) -> SubmissionId {
        self.id
    }

    /// Returns the submitting user's identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the user display-name snapshot.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Returns the submitted work text.
    #[must_use]
    pub const fn text(&self) -> &SubmissionText {
        &self.text
    }

    /// Returns whether this submission was a correction after rejection.
    #[must_use]
    pub const fn corrected(&self) -> bool {
        self.corrected
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}
