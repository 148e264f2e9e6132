//! Domain model for archive folders and their shares.

use crate::task::domain::{FolderId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned while constructing or mutating archive folder values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArchiveDomainError {
    /// The folder name is empty after trimming.
    #[error("archive folder name must not be empty")]
    EmptyFolderName,

    /// The user already holds a share of the folder.
    #[error("user {user_id} is already invited to folder {folder_id}")]
    AlreadyShared {
        /// Folder the invitation targeted.
        folder_id: FolderId,
        /// User the invitation targeted.
        user_id: UserId,
    },

    /// No share of the folder exists for the user.
    #[error("user {user_id} holds no share of folder {folder_id}")]
    ShareNotFound {
        /// Folder the operation targeted.
        folder_id: FolderId,
        /// User the operation targeted.
        user_id: UserId,
    },
}

/// Error returned while parsing share statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown share status: {0}")]
pub struct ParseShareStatusError(pub String);

/// Acceptance state of one user's share of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    /// Invited, not yet accepted; folder contents are hidden.
    Pending,
    /// Accepted; folder contents are visible.
    Accepted,
}

impl ShareStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

impl TryFrom<&str> for ShareStatus {
    type Error = ParseShareStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            _ => Err(ParseShareStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated, trimmed, non-empty folder name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderName(String);

impl FolderName {
    /// Creates a validated folder name.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveDomainError::EmptyFolderName`] if the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ArchiveDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ArchiveDomainError::EmptyFolderName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the folder name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user's share of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderShare {
    user_id: UserId,
    status: ShareStatus,
}

impl FolderShare {
    /// Reconstructs a share from persisted storage.
    #[must_use]
    pub const fn from_persisted(user_id: UserId, status: ShareStatus) -> Self {
        Self { user_id, status }
    }

    /// Returns the sharing user.
    #[must_use]
    pub const fn user_id(self) -> UserId {
        self.user_id
    }

    /// Returns the acceptance state.
    #[must_use]
    pub const fn status(self) -> ShareStatus {
        self.status
    }
}

/// A named, shareable container for finished executions.
///
/// Folder membership is invitation-based: the creator's share is accepted
/// automatically, everyone else starts `Pending` and must accept before
/// viewing contents. The folder stores only its shares; execution links
/// live on the executions themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveFolder {
    id: FolderId,
    name: FolderName,
    owner_id: UserId,
    shares: Vec<FolderShare>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFolderData {
    /// Persisted folder identifier.
    pub id: FolderId,
    /// Persisted name.
    pub name: FolderName,
    /// Persisted owner.
    pub owner_id: UserId,
    /// Persisted shares.
    pub shares: Vec<FolderShare>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ArchiveFolder {
    /// Creates a folder owned by the given user, whose share is accepted
    /// automatically.
    #[must_use]
    pub fn new(name: FolderName, owner_id: UserId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: FolderId::new(),
            name,
            owner_id,
            shares: vec![FolderShare {
                user_id: owner_id,
                status: ShareStatus::Accepted,
            }],
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a folder from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedFolderData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            owner_id: data.owner_id,
            shares: data.shares,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the folder identifier.
    #[must_use]
    pub const fn id(&self) -> FolderId {
        self.id
    }

    /// Returns the folder name.
    #[must_use]
    pub const fn name(&self) -> &FolderName {
        &self.name
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns all shares, the owner's included.
    #[must_use]
    pub fn shares(&self) -> &[FolderShare] {
        &self.shares
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the user owns the folder.
    #[must_use]
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Returns whether the user holds any share, accepted or pending.
    #[must_use]
    pub fn is_shared_with(&self, user_id: UserId) -> bool {
        self.share(user_id).is_some()
    }

    /// Returns whether the user may view folder contents: their share
    /// exists and has been accepted.
    #[must_use]
    pub fn can_view(&self, user_id: UserId) -> bool {
        self.share(user_id)
            .is_some_and(|share| share.status == ShareStatus::Accepted)
    }

    /// Invites a user, creating a pending share.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveDomainError::AlreadyShared`] when the user already
    /// holds a share.
    pub fn invite(&mut self, user_id: UserId, clock: &impl Clock) -> Result<(), ArchiveDomainError> {
        if self.is_shared_with(user_id) {
            return Err(ArchiveDomainError::AlreadyShared {
                folder_id: self.id,
                user_id,
            });
        }
        self.shares.push(FolderShare {
            user_id,
            status: ShareStatus::Pending,
        });
        self.touch(clock);
        Ok(())
    }

    /// Accepts the user's pending invitation. Accepting an
    /// already-accepted share is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveDomainError::ShareNotFound`] when the user holds
    /// no share.
    pub fn accept_invitation(
        &mut self,
        user_id: UserId,
        clock: &impl Clock,
    ) -> Result<(), ArchiveDomainError> {
        let folder_id = self.id;
        let share = self
            .shares
            .iter_mut()
            .find(|share| share.user_id == user_id)
            .ok_or(ArchiveDomainError::ShareNotFound { folder_id, user_id })?;
        if share.status == ShareStatus::Pending {
            share.status = ShareStatus::Accepted;
            self.touch(clock);
        }
        Ok(())
    }

    /// Renames the folder.
    pub fn rename(&mut self, name: FolderName, clock: &impl Clock) {
        self.name = name;
        self.touch(clock);
    }

    fn share(&self, user_id: UserId) -> Option<&FolderShare> {
        self.shares.iter().find(|share| share.user_id == user_id)
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
