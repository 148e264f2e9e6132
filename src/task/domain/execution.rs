//! Per-user task execution records and their status state machine.

use super::{FolderId, ParseExecutionStatusError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Note stored when a reviewer rejects work without providing one.
pub const DEFAULT_REJECTION_NOTE: &str = "Submitted work requires corrections";

/// Execution status of one user's work on one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Assigned, work not yet submitted.
    Active,
    /// Submitted, awaiting review.
    Pending,
    /// Accepted by a reviewer.
    Accepted,
    /// Rejected by a reviewer, awaiting correction.
    Rejected,
    /// Soft-deleted marker preserved for archival history.
    Removed,
}

impl ExecutionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Removed => "removed",
        }
    }

    /// Returns whether the status permits a transition to `to`.
    ///
    /// Submission moves `Active` (first submission), `Rejected`
    /// (correction) and `Pending` (overwriting resubmission) to `Pending`.
    /// Review settles `Pending` either way. `Removed` is reachable only
    /// from a settled status, via archive-aware removal.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Active | Self::Pending | Self::Rejected, Self::Pending)
                | (Self::Pending, Self::Accepted | Self::Rejected)
                | (Self::Accepted | Self::Rejected, Self::Removed)
        )
    }

    /// Returns whether the status is settled by review (accepted or
    /// rejected) and therefore eligible for archiving.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Returns whether the status permits no further transition at all.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Removed)
    }
}

impl TryFrom<&str> for ExecutionStatus {
    type Error = ParseExecutionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "removed" => Ok(Self::Removed),
            _ => Err(ParseExecutionStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive placement of an execution.
///
/// Replaces the source's nullable folder id plus boolean flag with one
/// exhaustive variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Archival {
    /// Not placed in any archive folder.
    None,
    /// Linked to an archive folder.
    InFolder {
        /// The containing folder.
        folder_id: FolderId,
    },
}

impl Archival {
    /// Returns whether the execution sits in an archive folder.
    #[must_use]
    pub const fn is_archived(self) -> bool {
        matches!(self, Self::InFolder { .. })
    }

    /// Returns the containing folder, if any.
    #[must_use]
    pub const fn folder_id(self) -> Option<FolderId> {
        match self {
            Self::None => None,
            Self::InFolder { folder_id } => Some(folder_id),
        }
    }
}

/// A status change refused by the state machine.
///
/// The owning [`super::Task`] wraps this with task and user identifiers
/// into [`super::TaskDomainError::InvalidExecutionTransition`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("refused execution transition: {from} -> {to}")]
pub struct RefusedTransition {
    /// Status the execution currently holds.
    pub from: ExecutionStatus,
    /// Status the transition requested.
    pub to: ExecutionStatus,
}

/// Outcome of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The execution moved from `Pending` to `Accepted`.
    Approved,
    /// The execution was already `Accepted`; nothing changed.
    AlreadyAccepted,
}

/// One user's progress record against one task.
///
/// At most one execution exists per (task, user) pair; the pair is the
/// composite key both in memory and in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExecution {
    user_id: UserId,
    user_name: String,
    status: ExecutionStatus,
    rejection_note: Option<String>,
    correction_deadline: Option<DateTime<Utc>>,
    corrected: bool,
    marked_at: DateTime<Utc>,
    archival: Archival,
}

/// Parameter object for reconstructing a persisted execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedExecutionData {
    /// Persisted user identifier.
    pub user_id: UserId,
    /// Persisted user display-name snapshot.
    pub user_name: String,
    /// Persisted status.
    pub status: ExecutionStatus,
    /// Persisted rejection note, if any.
    pub rejection_note: Option<String>,
    /// Persisted correction deadline, if any.
    pub correction_deadline: Option<DateTime<Utc>>,
    /// Persisted corrected flag.
    pub corrected: bool,
    /// Persisted last status-change timestamp.
    pub marked_at: DateTime<Utc>,
    /// Persisted archive placement.
    pub archival: Archival,
}

impl TaskExecution {
    /// Creates a freshly assigned execution in `Active` status.
    #[must_use]
    pub fn assigned(user_id: UserId, user_name: impl Into<String>, clock: &impl Clock) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            status: ExecutionStatus::Active,
            rejection_note: None,
            correction_deadline: None,
            corrected: false,
            marked_at: clock.utc(),
            archival: Archival::None,
        }
    }

    /// Reconstructs an execution from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedExecutionData) -> Self {
        Self {
            user_id: data.user_id,
            user_name: data.user_name,
            status: data.status,
            rejection_note: data.rejection_note,
            correction_deadline: data.correction_deadline,
            corrected: data.corrected,
            marked_at: data.marked_at,
            archival: data.archival,
        }
    }

    /// Returns the executing user's identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display-name snapshot taken at assignment time.
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Returns the current execution status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Returns the most recent rejection note, if any.
    ///
    /// Retained across a correcting resubmission for audit display until a
    /// later review overwrites it.
    #[must_use]
    pub fn rejection_note(&self) -> Option<&str> {
        self.rejection_note.as_deref()
    }

    /// Returns the reviewer-set correction deadline, if any.
    #[must_use]
    pub const fn correction_deadline(&self) -> Option<DateTime<Utc>> {
        self.correction_deadline
    }

    /// Returns whether the work has been resubmitted after a rejection at
    /// least once.
    #[must_use]
    pub const fn corrected(&self) -> bool {
        self.corrected
    }

    /// Returns the timestamp of the last status change.
    #[must_use]
    pub const fn marked_at(&self) -> DateTime<Utc> {
        self.marked_at
    }

    /// Returns the archive placement.
    #[must_use]
    pub const fn archival(&self) -> Archival {
        self.archival
    }

    /// Marks work as submitted, moving the execution to `Pending`.
    ///
    /// A resubmission after rejection sets the `corrected` flag; the flag
    /// is sticky across later cycles. The rejection note is retained until
    /// the next review overwrites it.
    ///
    /// # Errors
    ///
    /// Returns the refused transition when the execution is `Accepted` or
    /// `Removed`.
    pub fn submit(&mut self, clock: &impl Clock) -> Result<(), RefusedTransition> {
        self.check_transition(ExecutionStatus::Pending)?;
        if self.status == ExecutionStatus::Rejected {
            self.corrected = true;
        }
        self.status = ExecutionStatus::Pending;
        self.marked_at = clock.utc();
        Ok(())
    }

    /// Approves submitted work.
    ///
    /// Approving an already-`Accepted` execution is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns the refused transition when the execution is not `Pending`
    /// or already `Accepted`.
    pub fn approve(&mut self, clock: &impl Clock) -> Result<ReviewOutcome, RefusedTransition> {
        if self.status == ExecutionStatus::Accepted {
            return Ok(ReviewOutcome::AlreadyAccepted);
        }
        self.check_transition(ExecutionStatus::Accepted)?;
        self.status = ExecutionStatus::Accepted;
        self.marked_at = clock.utc();
        Ok(ReviewOutcome::Approved)
    }

    /// Rejects submitted work with a note and an optional correction
    /// deadline.
    ///
    /// A blank note is replaced by [`DEFAULT_REJECTION_NOTE`]. The note
    /// overwrites any earlier one.
    ///
    /// # Errors
    ///
    /// Returns the refused transition when the execution is not `Pending`.
    pub fn reject(
        &mut self,
        note: &str,
        correction_deadline: Option<DateTime<Utc>>,
        clock: &impl Clock,
    ) -> Result<(), RefusedTransition> {
        self.check_transition(ExecutionStatus::Rejected)?;
        let trimmed = note.trim();
        self.rejection_note = Some(if trimmed.is_empty() {
            DEFAULT_REJECTION_NOTE.to_owned()
        } else {
            trimmed.to_owned()
        });
        self.correction_deadline = correction_deadline;
        self.status = ExecutionStatus::Rejected;
        self.marked_at = clock.utc();
        Ok(())
    }

    /// Soft-deletes the execution, keeping the archive link intact.
    pub(crate) fn soft_remove(&mut self, clock: &impl Clock) {
        self.status = ExecutionStatus::Removed;
        self.marked_at = clock.utc();
    }

    /// Sets the archive placement. Status guards live on the owning task.
    pub(crate) fn set_archival(&mut self, archival: Archival) {
        self.archival = archival;
    }

    const fn check_transition(&self, to: ExecutionStatus) -> Result<(), RefusedTransition> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(RefusedTransition {
                from: self.status,
                to,
            })
        }
    }
}
