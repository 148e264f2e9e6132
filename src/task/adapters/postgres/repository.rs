//! `PostgreSQL` repository implementation for task workflow storage.

use super::{
    models::{
        AssignmentRow, ExecutionRow, NewExecutionRow, NewSubmissionRow, NewTaskRow, SubmissionRow,
        TaskRow,
    },
    schema::{task_assignments, task_executions, task_submissions, tasks},
};
use crate::task::{
    domain::{
        Archival, AssignmentMode, Attachment, ExecutionStatus, FolderId, PersistedExecutionData,
        PersistedSubmissionData, PersistedTaskData, Priority, SubmissionId, SubmissionText, Task,
        TaskExecution, TaskFilter, TaskId, TaskLifecycle, TaskScope, TaskSubmission, TaskTitle,
        TeamId, UserId, is_task_visible,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Aggregates are persisted across the `tasks`, `task_executions`,
/// `task_submissions`, and `task_assignments` tables; every mutation runs
/// in a single transaction so a status transition and its submission log
/// entry can never be split.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let rows = to_rows(task)?;

        self.run_blocking(move |connection| {
            connection.transaction::<(), TaskRepositoryError, _>(|inner| {
                diesel::insert_into(tasks::table)
                    .values(&rows.task)
                    .execute(inner)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::DuplicateTask(task_id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                insert_children(inner, &rows)?;
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let rows = to_rows(task)?;

        self.run_blocking(move |connection| {
            connection.transaction::<(), TaskRepositoryError, _>(|inner| {
                // Rewrite semantics: the aggregate replaces its previous
                // rows wholesale inside one transaction.
                delete_children(inner, task_id)?;
                let deleted = diesel::delete(tasks::table.find(task_id.into_inner()))
                    .execute(inner)?;
                if deleted == 0 {
                    return Err(TaskRepositoryError::NotFound(task_id));
                }
                diesel::insert_into(tasks::table)
                    .values(&rows.task)
                    .execute(inner)?;
                insert_children(inner, &rows)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(|task_row| hydrate_one(connection, task_row))
                .transpose()
        })
        .await
    }

    async fn query(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let query_filter = filter.clone();
        self.run_blocking(move |connection| {
            let rows = visibility_rows(connection, &query_filter)?;
            let mut found = hydrate_many(connection, rows)?;

            debug_assert!(
                {
                    let unrestricted = TaskFilter {
                        lifecycle: None,
                        ..query_filter.clone()
                    };
                    found
                        .iter()
                        .all(|task| is_task_visible(task, &unrestricted))
                },
                "SQL visibility predicate diverged from the domain rules"
            );

            if let Some(lifecycle) = query_filter.lifecycle {
                found.retain(|task| task.lifecycle() == lifecycle);
            }
            Ok(found)
        })
        .await
    }

    async fn find_by_folder(&self, folder_id: FolderId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let task_ids: Vec<uuid::Uuid> = task_executions::table
                .filter(task_executions::archive_folder_id.eq(folder_id.into_inner()))
                .select(task_executions::task_id)
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let rows = tasks::table
                .filter(tasks::id.eq_any(task_ids))
                .order(tasks::created_at.desc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            hydrate_many(connection, rows)
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<(), TaskRepositoryError, _>(|inner| {
                delete_children(inner, id)?;
                let deleted = diesel::delete(tasks::table.find(id.into_inner())).execute(inner)?;
                if deleted == 0 {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }
}

/// All insert rows making up one aggregate.
struct AggregateRows {
    task: NewTaskRow,
    executions: Vec<NewExecutionRow>,
    submissions: Vec<NewSubmissionRow>,
    assignments: Vec<AssignmentRow>,
}

fn to_rows(task: &Task) -> TaskRepositoryResult<AggregateRows> {
    let attachments =
        serde_json::to_value(task.attachments()).map_err(TaskRepositoryError::persistence)?;
    let task_uuid = task.id().into_inner();

    let task_row = NewTaskRow {
        id: task_uuid,
        team_id: task.scope().team_id().map(TeamId::into_inner),
        assignment_mode: task.assignment().kind_str().to_owned(),
        include_coordinators: matches!(
            task.assignment(),
            AssignmentMode::WholeTeam {
                include_coordinators: true
            }
        ),
        title: task.title().as_str().to_owned(),
        description: task.description().to_owned(),
        deadline: task.deadline(),
        priority: task.priority().as_str().to_owned(),
        creator_id: task.creator_id().into_inner(),
        creator_name: task.creator_name().to_owned(),
        lifecycle: task.lifecycle().as_str().to_owned(),
        visible_to_admin: task.visible_to_admin(),
        attachments,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    };

    let executions = task
        .executions()
        .iter()
        .map(|execution| NewExecutionRow {
            task_id: task_uuid,
            user_id: execution.user_id().into_inner(),
            user_name: execution.user_name().to_owned(),
            status: execution.status().as_str().to_owned(),
            rejection_note: execution.rejection_note().map(str::to_owned),
            correction_deadline: execution.correction_deadline(),
            corrected: execution.corrected(),
            marked_at: execution.marked_at(),
            archive_folder_id: execution.archival().folder_id().map(FolderId::into_inner),
        })
        .collect();

    let submissions = task
        .submissions()
        .iter()
        .map(|submission| NewSubmissionRow {
            id: submission.id().into_inner(),
            task_id: task_uuid,
            user_id: submission.user_id().into_inner(),
            user_name: submission.user_name().to_owned(),
            body: submission.text().as_str().to_owned(),
            corrected: submission.corrected(),
            submitted_at: submission.submitted_at(),
        })
        .collect();

    let assignments = task
        .assignments()
        .iter()
        .map(|user_id| AssignmentRow {
            task_id: task_uuid,
            user_id: user_id.into_inner(),
        })
        .collect();

    Ok(AggregateRows {
        task: task_row,
        executions,
        submissions,
        assignments,
    })
}

fn insert_children(
    connection: &mut PgConnection,
    rows: &AggregateRows,
) -> TaskRepositoryResult<()> {
    diesel::insert_into(task_executions::table)
        .values(&rows.executions)
        .execute(connection)?;
    diesel::insert_into(task_submissions::table)
        .values(&rows.submissions)
        .execute(connection)?;
    diesel::insert_into(task_assignments::table)
        .values(&rows.assignments)
        .execute(connection)?;
    Ok(())
}

fn delete_children(connection: &mut PgConnection, task_id: TaskId) -> TaskRepositoryResult<()> {
    let task_uuid = task_id.into_inner();
    diesel::delete(task_executions::table.filter(task_executions::task_id.eq(task_uuid)))
        .execute(connection)?;
    diesel::delete(task_submissions::table.filter(task_submissions::task_id.eq(task_uuid)))
        .execute(connection)?;
    diesel::delete(task_assignments::table.filter(task_assignments::task_id.eq(task_uuid)))
        .execute(connection)?;
    Ok(())
}

const SELECT_TASKS: &str = concat!(
    "SELECT t.id, t.team_id, t.assignment_mode, t.include_coordinators, t.title, ",
    "t.description, t.deadline, t.priority, t.creator_id, t.creator_name, t.lifecycle, ",
    "t.visible_to_admin, t.attachments, t.created_at, t.updated_at FROM tasks t",
);

/// Requester involvement: authored, explicitly assigned, or executing.
const INVOLVEMENT: &str = concat!(
    "(t.creator_id = $1 ",
    "OR EXISTS (SELECT 1 FROM task_assignments a WHERE a.task_id = t.id AND a.user_id = $1) ",
    "OR EXISTS (SELECT 1 FROM task_executions e WHERE e.task_id = t.id AND e.user_id = $1))",
);

const ORDER_NEWEST: &str = " ORDER BY t.created_at DESC";

/// Runs the role-branched visibility query.
///
/// Each branch renders the same rules as the pure domain predicate; the
/// caller cross-checks the result against it in debug builds.
fn visibility_rows(
    connection: &mut PgConnection,
    filter: &TaskFilter,
) -> TaskRepositoryResult<Vec<TaskRow>> {
    use crate::task::domain::Role;
    use diesel::sql_types::{Array, Uuid as SqlUuid};

    let requester = &filter.requester;
    let user_uuid = requester.user_id.into_inner();
    let membership_uuids: Vec<uuid::Uuid> = requester
        .memberships
        .iter()
        .copied()
        .map(TeamId::into_inner)
        .collect();

    let rows = match (requester.role, filter.team) {
        (Role::Administrator, None) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE ({INVOLVEMENT} OR t.visible_to_admin){ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .get_results::<TaskRow>(connection)?,
        (Role::Administrator, Some(team_id)) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE ({INVOLVEMENT} OR t.visible_to_admin) \
             AND (t.team_id IS NULL OR t.team_id = $2){ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .bind::<SqlUuid, _>(team_id.into_inner())
        .get_results::<TaskRow>(connection)?,
        (Role::Director, None) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE (t.team_id = ANY($2) OR {INVOLVEMENT}){ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .bind::<Array<SqlUuid>, _>(membership_uuids)
        .get_results::<TaskRow>(connection)?,
        (Role::Director, Some(team_id)) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE (t.team_id IS NULL OR t.team_id = $2) \
             AND (t.creator_id = $1 OR $2 = ANY($3)){ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .bind::<SqlUuid, _>(team_id.into_inner())
        .bind::<Array<SqlUuid>, _>(membership_uuids)
        .get_results::<TaskRow>(connection)?,
        (Role::Coordinator, None) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE (t.team_id IS NULL OR {INVOLVEMENT}){ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .get_results::<TaskRow>(connection)?,
        (Role::Coordinator, Some(team_id)) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE (t.team_id IS NULL OR t.team_id = $2 OR {INVOLVEMENT})\
             {ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .bind::<SqlUuid, _>(team_id.into_inner())
        .get_results::<TaskRow>(connection)?,
        (Role::Participant, None) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE {INVOLVEMENT}{ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .get_results::<TaskRow>(connection)?,
        (Role::Participant, Some(team_id)) => diesel::sql_query(format!(
            "{SELECT_TASKS} WHERE (((t.team_id IS NULL OR t.team_id = $2) \
             AND t.assignment_mode = 'whole_team') OR {INVOLVEMENT}){ORDER_NEWEST}"
        ))
        .bind::<SqlUuid, _>(user_uuid)
        .bind::<SqlUuid, _>(team_id.into_inner())
        .get_results::<TaskRow>(connection)?,
    };

    Ok(rows)
}

fn hydrate_one(connection: &mut PgConnection, row: TaskRow) -> TaskRepositoryResult<Task> {
    let mut hydrated = hydrate_many(connection, vec![row])?;
    hydrated
        .pop()
        .ok_or_else(|| TaskRepositoryError::persistence(DieselError::NotFound))
}

fn hydrate_many(
    connection: &mut PgConnection,
    rows: Vec<TaskRow>,
) -> TaskRepositoryResult<Vec<Task>> {
    let task_ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();

    let execution_rows: Vec<ExecutionRow> = task_executions::table
        .filter(task_executions::task_id.eq_any(task_ids.iter().copied()))
        .select(ExecutionRow::as_select())
        .load(connection)?;
    let submission_rows: Vec<SubmissionRow> = task_submissions::table
        .filter(task_submissions::task_id.eq_any(task_ids.iter().copied()))
        .order(task_submissions::submitted_at.desc())
        .select(SubmissionRow::as_select())
        .load(connection)?;
    let assignment_rows: Vec<AssignmentRow> = task_assignments::table
        .filter(task_assignments::task_id.eq_any(task_ids.iter().copied()))
        .select(AssignmentRow::as_select())
        .load(connection)?;

    let mut executions_by_task: HashMap<uuid::Uuid, Vec<ExecutionRow>> = HashMap::new();
    for execution_row in execution_rows {
        executions_by_task
            .entry(execution_row.task_id)
            .or_default()
            .push(execution_row);
    }
    let mut submissions_by_task: HashMap<uuid::Uuid, Vec<SubmissionRow>> = HashMap::new();
    for submission_row in submission_rows {
        submissions_by_task
            .entry(submission_row.task_id)
            .or_default()
            .push(submission_row);
    }
    let mut assignments_by_task: HashMap<uuid::Uuid, Vec<AssignmentRow>> = HashMap::new();
    for assignment_row in assignment_rows {
        assignments_by_task
            .entry(assignment_row.task_id)
            .or_default()
            .push(assignment_row);
    }

    rows.into_iter()
        .map(|row| {
            let executions = executions_by_task.remove(&row.id).unwrap_or_default();
            let submissions = submissions_by_task.remove(&row.id).unwrap_or_default();
            let assignments = assignments_by_task.remove(&row.id).unwrap_or_default();
            row_to_task(row, executions, submissions, assignments)
        })
        .collect()
}

fn row_to_task(
    row: TaskRow,
    execution_rows: Vec<ExecutionRow>,
    submission_rows: Vec<SubmissionRow>,
    assignment_rows: Vec<AssignmentRow>,
) -> TaskRepositoryResult<Task> {
    let scope = row.team_id.map_or(TaskScope::Global, |team_uuid| {
        TaskScope::Team {
            team_id: TeamId::from_uuid(team_uuid),
        }
    });
    let assignment = AssignmentMode::from_storage(&row.assignment_mode, row.include_coordinators)
        .map_err(TaskRepositoryError::persistence)?;
    let title = TaskTitle::new(row.title).map_err(TaskRepositoryError::persistence)?;
    let priority =
        Priority::try_from(row.priority.as_str()).map_err(TaskRepositoryError::persistence)?;
    let lifecycle = TaskLifecycle::try_from(row.lifecycle.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    let attachments: Vec<Attachment> =
        serde_json::from_value(row.attachments).map_err(TaskRepositoryError::persistence)?;

    let executions = execution_rows
        .into_iter()
        .map(row_to_execution)
        .collect::<TaskRepositoryResult<Vec<TaskExecution>>>()?;
    let submissions = submission_rows
        .into_iter()
        .map(row_to_submission)
        .collect::<TaskRepositoryResult<Vec<TaskSubmission>>>()?;
    let assignments = assignment_rows
        .into_iter()
        .map(|assignment_row| UserId::from_uuid(assignment_row.user_id))
        .collect();

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        scope,
        assignment,
        title,
        description: row.description,
        deadline: row.deadline,
        priority,
        creator_id: UserId::from_uuid(row.creator_id),
        creator_name: row.creator_name,
        lifecycle,
        visible_to_admin: row.visible_to_admin,
        attachments,
        executions,
        submissions,
        assignments,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_execution(row: ExecutionRow) -> TaskRepositoryResult<TaskExecution> {
    let status =
        ExecutionStatus::try_from(row.status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let archival = row.archive_folder_id.map_or(Archival::None, |folder_uuid| {
        Archival::InFolder {
            folder_id: FolderId::from_uuid(folder_uuid),
        }
    });

    Ok(TaskExecution::from_persisted(PersistedExecutionData {
        user_id: UserId::from_uuid(row.user_id),
        user_name: row.user_name,
        status,
        rejection_note: row.rejection_note,
        correction_deadline: row.correction_deadline,
        corrected: row.corrected,
        marked_at: row.marked_at,
        archival,
    }))
}

fn row_to_submission(row: SubmissionRow) -> TaskRepositoryResult<TaskSubmission> {
    let text = SubmissionText::new(row.body).map_err(TaskRepositoryError::persistence)?;

    Ok(TaskSubmission::from_persisted(PersistedSubmissionData {
        id: SubmissionId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        user_name: row.user_name,
        text,
        corrected: row.corrected,
        submitted_at: row.submitted_at,
    }))
}
