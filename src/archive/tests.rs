//! Unit tests for archive folder sharing and execution filing.

use std::sync::Arc;

use crate::archive::adapters::memory::InMemoryArchiveFolderRepository;
use crate::archive::domain::{ArchiveDomainError, ShareStatus};
use crate::archive::services::{ArchiveError, ArchiveService};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{ExecutionStatus, Requester, Role, TeamMember, UserId},
    services::{CreateTaskRequest, TaskWorkflowService},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestWorkflow = TaskWorkflowService<InMemoryTaskRepository, DefaultClock>;
type TestArchive = ArchiveService<InMemoryArchiveFolderRepository, TestWorkflow, DefaultClock>;

struct Services {
    workflow: Arc<TestWorkflow>,
    archive: TestArchive,
}

#[fixture]
fn services() -> Services {
    let clock = Arc::new(DefaultClock);
    let workflow = Arc::new(TaskWorkflowService::new(
        Arc::new(InMemoryTaskRepository::new()),
        Arc::clone(&clock),
    ));
    let archive = ArchiveService::new(
        Arc::new(InMemoryArchiveFolderRepository::new()),
        Arc::clone(&workflow),
        clock,
    );
    Services { workflow, archive }
}

async fn settled_execution(workflow: &TestWorkflow, worker: UserId) -> crate::task::domain::TaskId {
    let request =
        CreateTaskRequest::new("Settled work", UserId::new(), "Creator").with_roster(vec![
            TeamMember {
                user_id: worker,
                name: "Worker".to_owned(),
                role: Role::Participant,
            },
        ]);
    let task = workflow.create_task(request).await.expect("task creation");
    workflow
        .submit_work(task.id(), worker, "Worker", "Finished")
        .await
        .expect("submission");
    workflow
        .approve_work(
            task.id(),
            worker,
            &Requester::new(UserId::new(), Role::Coordinator),
        )
        .await
        .expect("approval");
    task.id()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creating_a_folder_accepts_the_owner_share(services: Services) {
    let owner = UserId::new();

    let folder = services
        .archive
        .create_folder("2026 reviews", owner)
        .await
        .expect("folder creation");

    assert!(folder.is_owner(owner));
    assert!(folder.can_view(owner));
    assert_eq!(folder.shares().len(), 1);
    assert_eq!(folder.shares()[0].status(), ShareStatus::Accepted);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_folder_names_are_rejected(services: Services) {
    let result = services.archive.create_folder("   ", UserId::new()).await;

    assert!(matches!(
        result,
        Err(ArchiveError::Domain(ArchiveDomainError::EmptyFolderName))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invitees_view_contents_only_after_accepting(services: Services) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let folder = services
        .archive
        .create_folder("Shared", owner)
        .await
        .expect("folder creation");

    services
        .archive
        .invite(folder.id(), owner, invitee)
        .await
        .expect("invitation");

    let pending = services.archive.folder_contents(folder.id(), invitee).await;
    assert!(matches!(pending, Err(ArchiveError::Forbidden { .. })));

    services
        .archive
        .accept_invitation(folder.id(), invitee)
        .await
        .expect("acceptance");

    services
        .archive
        .folder_contents(folder.id(), invitee)
        .await
        .expect("contents after acceptance");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_the_owner_may_invite_rename_or_delete(services: Services) {
    let owner = UserId::new();
    let stranger = UserId::new();
    let folder = services
        .archive
        .create_folder("Private", owner)
        .await
        .expect("folder creation");

    let invite = services
        .archive
        .invite(folder.id(), stranger, UserId::new())
        .await;
    let rename = services
        .archive
        .rename_folder(folder.id(), stranger, "Hijacked")
        .await;
    let delete = services.archive.delete_folder(folder.id(), stranger).await;

    assert!(matches!(invite, Err(ArchiveError::Forbidden { .. })));
    assert!(matches!(rename, Err(ArchiveError::Forbidden { .. })));
    assert!(matches!(delete, Err(ArchiveError::Forbidden { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_invitations_are_refused(services: Services) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let folder = services
        .archive
        .create_folder("Shared", owner)
        .await
        .expect("folder creation");
    services
        .archive
        .invite(folder.id(), owner, invitee)
        .await
        .expect("invitation");

    let repeated = services.archive.invite(folder.id(), owner, invitee).await;

    assert!(matches!(
        repeated,
        Err(ArchiveError::Domain(ArchiveDomainError::AlreadyShared { .. }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn folders_for_user_lists_pending_invitations(services: Services) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let folder = services
        .archive
        .create_folder("Shared", owner)
        .await
        .expect("folder creation");
    services
        .archive
        .invite(folder.id(), owner, invitee)
        .await
        .expect("invitation");

    let listed = services
        .archive
        .folders_for_user(invitee)
        .await
        .expect("listing");

    assert_eq!(listed.len(), 1);
    assert!(!listed[0].can_view(invitee));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archived_executions_appear_in_folder_contents(services: Services) {
    let owner = UserId::new();
    let worker = UserId::new();
    let folder = services
        .archive
        .create_folder("Finished", owner)
        .await
        .expect("folder creation");
    let task_id = settled_execution(&services.workflow, worker).await;

    services
        .archive
        .archive_execution(folder.id(), owner, task_id, worker)
        .await
        .expect("archiving");

    let contents = services
        .archive
        .folder_contents(folder.id(), owner)
        .await
        .expect("contents");

    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].id(), task_id);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archiving_requires_an_accepted_share(services: Services) {
    let owner = UserId::new();
    let outsider = UserId::new();
    let worker = UserId::new();
    let folder = services
        .archive
        .create_folder("Finished", owner)
        .await
        .expect("folder creation");
    let task_id = settled_execution(&services.workflow, worker).await;

    let result = services
        .archive
        .archive_execution(folder.id(), outsider, task_id, worker)
        .await;

    assert!(matches!(result, Err(ArchiveError::Forbidden { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_folder_unlinks_executions_but_keeps_them(services: Services) {
    let owner = UserId::new();
    let worker = UserId::new();
    let folder = services
        .archive
        .create_folder("Short lived", owner)
        .await
        .expect("folder creation");
    let task_id = settled_execution(&services.workflow, worker).await;
    services
        .archive
        .archive_execution(folder.id(), owner, task_id, worker)
        .await
        .expect("archiving");

    services
        .archive
        .delete_folder(folder.id(), owner)
        .await
        .expect("deletion");

    let listed = services
        .archive
        .folders_for_user(owner)
        .await
        .expect("listing");
    assert!(listed.is_empty());

    let task = services
        .workflow
        .find_task(task_id)
        .await
        .expect("lookup")
        .expect("task persists");
    let execution = task.execution(worker).expect("execution persists");
    assert_eq!(execution.status(), ExecutionStatus::Accepted);
    assert!(!execution.archival().is_archived());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepting_without_an_invitation_fails(services: Services) {
    let owner = UserId::new();
    let stranger = UserId::new();
    let folder = services
        .archive
        .create_folder("Private", owner)
        .await
        .expect("folder creation");

    let result = services
        .archive
        .accept_invitation(folder.id(), stranger)
        .await;

    assert!(matches!(
        result,
        Err(ArchiveError::Domain(ArchiveDomainError::ShareNotFound { .. }))
    ));
}
