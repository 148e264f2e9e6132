//! `PostgreSQL` repository implementation for archive folder storage.
//!
//! A folder and its shares are persisted across the `archive_folders` and
//! `archive_folder_shares` tables; mutations rewrite the share set inside
//! one transaction.

use crate::archive::domain::{
    ArchiveFolder, FolderName, FolderShare, PersistedFolderData, ShareStatus,
};
use crate::archive::ports::{
    ArchiveFolderRepository, ArchiveRepositoryError, ArchiveRepositoryResult,
};
use crate::task::domain::{FolderId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;

diesel::table! {
    /// Archive folder records.
    archive_folders (id) {
        /// Folder identifier.
        id -> Uuid,
        /// Folder name.
        #[max_length = 255]
        name -> Varchar,
        /// Owning user.
        owner_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last change timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user folder shares; the pair is the composite key.
    archive_folder_shares (folder_id, user_id) {
        /// Owning folder.
        folder_id -> Uuid,
        /// Sharing user.
        user_id -> Uuid,
        /// Acceptance state.
        #[max_length = 50]
        status -> Varchar,
    }
}

diesel::joinable!(archive_folder_shares -> archive_folders (folder_id));
diesel::allow_tables_to_appear_in_same_query!(archive_folders, archive_folder_shares);

/// Query result row for folder records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = archive_folders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct FolderRow {
    /// Folder identifier.
    id: uuid::Uuid,
    /// Folder name.
    name: String,
    /// Owning user.
    owner_id: uuid::Uuid,
    /// Creation timestamp.
    created_at: DateTime<Utc>,
    /// Last change timestamp.
    updated_at: DateTime<Utc>,
}

/// Insert model for folder records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = archive_folders)]
struct NewFolderRow {
    id: uuid::Uuid,
    name: String,
    owner_id: uuid::Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Query result and insert model for share records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = archive_folder_shares)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ShareRow {
    folder_id: uuid::Uuid,
    user_id: uuid::Uuid,
    status: String,
}

/// `PostgreSQL` connection pool type used by archive adapters.
pub type ArchivePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed archive folder repository.
#[derive(Debug, Clone)]
pub struct PostgresArchiveFolderRepository {
    pool: ArchivePgPool,
}

impl From<DieselError> for ArchiveRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresArchiveFolderRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ArchivePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ArchiveRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ArchiveRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ArchiveRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ArchiveRepositoryError::persistence)?
    }
}

#[async_trait]
impl ArchiveFolderRepository for PostgresArchiveFolderRepository {
    async fn store(&self, folder: &ArchiveFolder) -> ArchiveRepositoryResult<()> {
        let folder_id = folder.id();
        let (folder_row, share_rows) = to_rows(folder);

        self.run_blocking(move |connection| {
            connection.transaction::<(), ArchiveRepositoryError, _>(|inner| {
                diesel::insert_into(archive_folders::table)
                    .values(&folder_row)
                    .execute(inner)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            ArchiveRepositoryError::DuplicateFolder(folder_id)
                        }
                        _ => ArchiveRepositoryError::persistence(err),
                    })?;
                diesel::insert_into(archive_folder_shares::table)
                    .values(&share_rows)
                    .execute(inner)?;
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, folder: &ArchiveFolder) -> ArchiveRepositoryResult<()> {
        let folder_id = folder.id();
        let (folder_row, share_rows) = to_rows(folder);

        self.run_blocking(move |connection| {
            connection.transaction::<(), ArchiveRepositoryError, _>(|inner| {
                delete_shares(inner, folder_id)?;
                let deleted =
                    diesel::delete(archive_folders::table.find(folder_id.into_inner()))
                        .execute(inner)?;
                if deleted == 0 {
                    return Err(ArchiveRepositoryError::NotFound(folder_id));
                }
                diesel::insert_into(archive_folders::table)
                    .values(&folder_row)
                    .execute(inner)?;
                diesel::insert_into(archive_folder_shares::table)
                    .values(&share_rows)
                    .execute(inner)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: FolderId) -> ArchiveRepositoryResult<Option<ArchiveFolder>> {
        self.run_blocking(move |connection| {
            let row = archive_folders::table
                .filter(archive_folders::id.eq(id.into_inner()))
                .select(FolderRow::as_select())
                .first::<FolderRow>(connection)
                .optional()
                .map_err(ArchiveRepositoryError::persistence)?;
            row.map(|folder_row| {
                let mut hydrated = hydrate_many(connection, vec![folder_row])?;
                hydrated
                    .pop()
                    .ok_or_else(|| ArchiveRepositoryError::persistence(DieselError::NotFound))
            })
            .transpose()
        })
        .await
    }

    async fn list_for_user(&self, user_id: UserId) -> ArchiveRepositoryResult<Vec<ArchiveFolder>> {
        self.run_blocking(move |connection| {
            let folder_ids: Vec<uuid::Uuid> = archive_folder_shares::table
                .filter(archive_folder_shares::user_id.eq(user_id.into_inner()))
                .select(archive_folder_shares::folder_id)
                .load(connection)
                .map_err(ArchiveRepositoryError::persistence)?;
            let rows = archive_folders::table
                .filter(archive_folders::id.eq_any(folder_ids))
                .order(archive_folders::created_at.desc())
                .select(FolderRow::as_select())
                .load::<FolderRow>(connection)
                .map_err(ArchiveRepositoryError::persistence)?;
            hydrate_many(connection, rows)
        })
        .await
    }

    async fn delete(&self, id: FolderId) -> ArchiveRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<(), ArchiveRepositoryError, _>(|inner| {
                delete_shares(inner, id)?;
                let deleted = diesel::delete(archive_folders::table.find(id.into_inner()))
                    .execute(inner)?;
                if deleted == 0 {
                    return Err(ArchiveRepositoryError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }
}

fn to_rows(folder: &ArchiveFolder) -> (NewFolderRow, Vec<ShareRow>) {
    let folder_uuid = folder.id().into_inner();
    let folder_row = NewFolderRow {
        id: folder_uuid,
        name: folder.name().as_str().to_owned(),
        owner_id: folder.owner_id().into_inner(),
        created_at: folder.created_at(),
        updated_at: folder.updated_at(),
    };
    let share_rows = folder
        .shares()
        .iter()
        .map(|share| ShareRow {
            folder_id: folder_uuid,
            user_id: share.user_id().into_inner(),
            status: share.status().as_str().to_owned(),
        })
        .collect();
    (folder_row, share_rows)
}

fn delete_shares(connection: &mut PgConnection, folder_id: FolderId) -> ArchiveRepositoryResult<()> {
    diesel::delete(
        archive_folder_shares::table
            .filter(archive_folder_shares::folder_id.eq(folder_id.into_inner())),
    )
    .execute(connection)?;
    Ok(())
}

fn hydrate_many(
    connection: &mut PgConnection,
    rows: Vec<FolderRow>,
) -> ArchiveRepositoryResult<Vec<ArchiveFolder>> {
    let folder_ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();
    let share_rows: Vec<ShareRow> = archive_folder_shares::table
        .filter(archive_folder_shares::folder_id.eq_any(folder_ids.iter().copied()))
        .select(ShareRow::as_select())
        .load(connection)?;

    let mut shares_by_folder: HashMap<uuid::Uuid, Vec<ShareRow>> = HashMap::new();
    for share_row in share_rows {
        shares_by_folder
            .entry(share_row.folder_id)
            .or_default()
            .push(share_row);
    }

    rows.into_iter()
        .map(|row| {
            let shares = shares_by_folder.remove(&row.id).unwrap_or_default();
            row_to_folder(row, shares)
        })
        .collect()
}

fn row_to_folder(row: FolderRow, share_rows: Vec<ShareRow>) -> ArchiveRepositoryResult<ArchiveFolder> {
    let name = FolderName::new(row.name).map_err(ArchiveRepositoryError::persistence)?;
    let shares = share_rows
        .into_iter()
        .map(|share_row| {
            let status = ShareStatus::try_from(share_row.status.as_str())
                .map_err(ArchiveRepositoryError::persistence)?;
            Ok(FolderShare::from_persisted(
                UserId::from_uuid(share_row.user_id),
                status,
            ))
        })
        .collect::<ArchiveRepositoryResult<Vec<FolderShare>>>()?;

    Ok(ArchiveFolder::from_persisted(PersistedFolderData {
        id: FolderId::from_uuid(row.id),
        name,
        owner_id: UserId::from_uuid(row.owner_id),
        shares,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
