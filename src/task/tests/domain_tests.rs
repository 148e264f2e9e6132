//! Domain-focused tests for task creation, assignment materialization,
//! and archive-aware removal.

use crate::task::domain::{
    Archival, Assignee, AssignmentMode, ExecutionStatus, FolderId, Priority, RemovalOutcome, Role,
    SubmissionText, Task, TaskDomainError, TaskDraft, TaskEdits, TaskLifecycle, TaskScope,
    TaskTitle, TeamId, TeamMember, UserId,
};
use chrono::{Duration, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

fn draft(creator_id: UserId, assignment: AssignmentMode) -> TaskDraft {
    TaskDraft {
        scope: TaskScope::Team {
            team_id: TeamId::new(),
        },
        assignment,
        title: TaskTitle::new("Quarterly report").expect("valid title"),
        description: String::new(),
        deadline: None,
        priority: Priority::Normal,
        creator_id,
        creator_name: "Grace Hopper".to_owned(),
        visible_to_admin: false,
        attachments: Vec::new(),
    }
}

fn member(role: Role) -> TeamMember {
    TeamMember {
        user_id: UserId::new(),
        name: "Team member".to_owned(),
        role,
    }
}

#[rstest]
fn task_title_rejects_blank_input() {
    assert_eq!(TaskTitle::new("   "), Err(TaskDomainError::EmptyTitle));
}

#[rstest]
fn submission_text_rejects_blank_input() {
    assert_eq!(
        SubmissionText::new("\n\t "),
        Err(TaskDomainError::EmptySubmissionText)
    );
}

#[rstest]
#[case("administrator", Role::Administrator)]
#[case("Admin", Role::Administrator)]
#[case("dyrektor", Role::Director)]
#[case("KOORDYNATOR", Role::Coordinator)]
#[case("uczestnik", Role::Participant)]
fn role_parsing_accepts_legacy_spellings(#[case] raw: &str, #[case] expected: Role) {
    assert_eq!(Role::try_from(raw), Ok(expected));
}

#[rstest]
#[case(None)]
#[case(Some("manager"))]
#[case(Some(""))]
fn unknown_roles_normalize_to_participant(#[case] raw: Option<&str>) {
    assert_eq!(Role::normalize_or_restrictive(raw), Role::Participant);
}

#[rstest]
fn whole_team_creation_materializes_participant_executions(clock: DefaultClock) {
    let participant = member(Role::Participant);
    let coordinator = member(Role::Coordinator);
    let director = member(Role::Director);
    let roster = vec![participant.clone(), coordinator, director];

    let task = Task::create(
        draft(
            UserId::new(),
            AssignmentMode::WholeTeam {
                include_coordinators: false,
            },
        ),
        &roster,
        &[],
        &clock,
    )
    .expect("task creation");

    assert_eq!(task.executions().len(), 1);
    assert_eq!(task.executions()[0].user_id(), participant.user_id);
    assert_eq!(task.executions()[0].status(), ExecutionStatus::Active);
    assert!(task.assignments().is_empty());
    assert_eq!(task.lifecycle(), TaskLifecycle::Active);
}

#[rstest]
fn whole_team_creation_can_include_coordinators(clock: DefaultClock) {
    let roster = vec![
        member(Role::Participant),
        member(Role::Coordinator),
        member(Role::Director),
    ];

    let task = Task::create(
        draft(
            UserId::new(),
            AssignmentMode::WholeTeam {
                include_coordinators: true,
            },
        ),
        &roster,
        &[],
        &clock,
    )
    .expect("task creation");

    assert_eq!(task.executions().len(), 2);
}

#[rstest]
fn specific_people_creation_requires_assignees(clock: DefaultClock) {
    let result = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[],
        &clock,
    );

    assert_eq!(result.err(), Some(TaskDomainError::NoAssignees));
}

#[rstest]
fn specific_people_creation_deduplicates_assignees(clock: DefaultClock) {
    let user_id = UserId::new();
    let assignee = Assignee {
        user_id,
        name: "Ada".to_owned(),
    };

    let task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[assignee.clone(), assignee],
        &clock,
    )
    .expect("task creation");

    assert_eq!(task.executions().len(), 1);
    assert_eq!(task.assignments(), [user_id]);
    assert!(task.is_assigned(user_id));
}

#[rstest]
fn assign_user_is_idempotent(clock: DefaultClock) {
    let assignee = Assignee {
        user_id: UserId::new(),
        name: "Ada".to_owned(),
    };
    let mut task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[assignee.clone()],
        &clock,
    )
    .expect("task creation");

    task.assign_user(&assignee, &clock);

    assert_eq!(task.executions().len(), 1);
    assert_eq!(task.assignments().len(), 1);
}

#[rstest]
fn submit_work_upserts_execution_for_unlisted_user(clock: DefaultClock) {
    let roster = vec![member(Role::Participant)];
    let mut task = Task::create(
        draft(
            UserId::new(),
            AssignmentMode::WholeTeam {
                include_coordinators: false,
            },
        ),
        &roster,
        &[],
        &clock,
    )
    .expect("task creation");
    let newcomer = UserId::new();

    task.submit_work(
        newcomer,
        "Newcomer",
        SubmissionText::new("done early").expect("valid text"),
        &clock,
    )
    .expect("submission");

    assert_eq!(task.executions().len(), 2);
    let execution = task.execution(newcomer).expect("upserted execution");
    assert_eq!(execution.status(), ExecutionStatus::Pending);
    assert_eq!(task.submissions().len(), 1);
    assert_eq!(task.submissions()[0].user_id(), newcomer);
}

#[rstest]
fn submissions_are_ordered_newest_first(clock: DefaultClock) {
    let user_id = UserId::new();
    let mut task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");

    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("first draft").expect("valid text"),
        &clock,
    )
    .expect("first submission");
    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("second draft").expect("valid text"),
        &clock,
    )
    .expect("second submission");

    // One execution row regardless of how many submissions exist.
    assert_eq!(task.executions().len(), 1);
    assert_eq!(task.submissions().len(), 2);
    assert_eq!(task.submissions()[0].text().as_str(), "second draft");
    assert_eq!(task.submissions()[1].text().as_str(), "first draft");
}

#[rstest]
fn correction_submission_is_flagged(clock: DefaultClock) {
    let user_id = UserId::new();
    let mut task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");

    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("first draft").expect("valid text"),
        &clock,
    )
    .expect("submission");
    task.reject_work(user_id, "redo", None, &clock).expect("rejection");
    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("corrected draft").expect("valid text"),
        &clock,
    )
    .expect("correction");

    assert!(task.submissions()[0].corrected());
    assert!(!task.submissions()[1].corrected());
}

#[rstest]
fn operative_deadline_prefers_correction_deadline(clock: DefaultClock) {
    let user_id = UserId::new();
    let task_deadline = Utc::now() + Duration::days(7);
    let correction_deadline = Utc::now() + Duration::days(2);
    let mut base = draft(UserId::new(), AssignmentMode::SpecificPeople);
    base.deadline = Some(task_deadline);
    let mut task = Task::create(
        base,
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");

    assert_eq!(task.operative_deadline(user_id), Some(task_deadline));

    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("draft").expect("valid text"),
        &clock,
    )
    .expect("submission");
    task.reject_work(user_id, "redo", Some(correction_deadline), &clock)
        .expect("rejection");

    assert_eq!(task.operative_deadline(user_id), Some(correction_deadline));
}

#[rstest]
fn is_overdue_only_while_awaiting_work(clock: DefaultClock) {
    let user_id = UserId::new();
    let mut base = draft(UserId::new(), AssignmentMode::SpecificPeople);
    base.deadline = Some(Utc::now() - Duration::hours(1));
    let mut task = Task::create(
        base,
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");
    let now = Utc::now();

    assert!(task.is_overdue(user_id, now));

    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("draft").expect("valid text"),
        &clock,
    )
    .expect("submission");

    // Pending work is no longer counted as overdue.
    assert!(!task.is_overdue(user_id, now));
}

#[rstest]
fn edit_applies_partial_updates_and_clears_deadline(clock: DefaultClock) {
    let mut base = draft(UserId::new(), AssignmentMode::SpecificPeople);
    base.deadline = Some(Utc::now() + Duration::days(1));
    let mut task = Task::create(
        base,
        &[],
        &[Assignee {
            user_id: UserId::new(),
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");

    task.edit(
        TaskEdits {
            title: None,
            description: Some("Updated brief".to_owned()),
            deadline: Some(None),
            priority: Some(Priority::High),
        },
        &clock,
    );

    assert_eq!(task.title().as_str(), "Quarterly report");
    assert_eq!(task.description(), "Updated brief");
    assert_eq!(task.deadline(), None);
    assert_eq!(task.priority(), Priority::High);
}

#[rstest]
fn close_is_idempotent_and_leaves_executions_alone(clock: DefaultClock) {
    let user_id = UserId::new();
    let mut task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");

    task.close(&clock);
    task.close(&clock);

    assert_eq!(task.lifecycle(), TaskLifecycle::Closed);
    assert_eq!(
        task.execution(user_id).map(|execution| execution.status()),
        Some(ExecutionStatus::Active)
    );
}

#[rstest]
fn archive_requires_a_settled_execution(clock: DefaultClock) {
    let user_id = UserId::new();
    let task_creator = UserId::new();
    let mut task = Task::create(
        draft(task_creator, AssignmentMode::SpecificPeople),
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");
    let folder_id = FolderId::new();

    let result = task.archive_execution(user_id, folder_id, &clock);
    assert_eq!(
        result,
        Err(TaskDomainError::NotArchivable {
            task_id: task.id(),
            user_id,
            status: ExecutionStatus::Active,
        })
    );

    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("draft").expect("valid text"),
        &clock,
    )
    .expect("submission");
    task.approve_work(user_id, &clock).expect("approval");
    task.archive_execution(user_id, folder_id, &clock)
        .expect("archiving settled work");

    assert_eq!(
        task.execution(user_id).map(|execution| execution.archival()),
        Some(Archival::InFolder { folder_id })
    );
}

#[rstest]
fn removing_an_archived_execution_soft_deletes(clock: DefaultClock) {
    let user_id = UserId::new();
    let mut task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");
    let folder_id = FolderId::new();
    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("draft").expect("valid text"),
        &clock,
    )
    .expect("submission");
    task.approve_work(user_id, &clock).expect("approval");
    task.archive_execution(user_id, folder_id, &clock)
        .expect("archiving");

    let outcome = task.remove_execution(user_id, &clock).expect("removal");

    assert_eq!(outcome, RemovalOutcome::SoftRemoved);
    let execution = task.execution(user_id).expect("soft-removed row persists");
    assert_eq!(execution.status(), ExecutionStatus::Removed);
    assert_eq!(execution.archival(), Archival::InFolder { folder_id });
    assert_eq!(task.submissions().len(), 1);
}

#[rstest]
fn removing_an_unarchived_execution_hard_deletes(clock: DefaultClock) {
    let user_id = UserId::new();
    let mut task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[Assignee {
            user_id,
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");
    task.submit_work(
        user_id,
        "Ada",
        SubmissionText::new("draft").expect("valid text"),
        &clock,
    )
    .expect("submission");

    let outcome = task.remove_execution(user_id, &clock).expect("removal");

    assert_eq!(outcome, RemovalOutcome::HardRemoved);
    assert!(task.execution(user_id).is_none());
    assert!(task.submissions().is_empty());
    assert!(!task.is_assigned(user_id));
}

#[rstest]
fn removing_a_missing_execution_fails(clock: DefaultClock) {
    let mut task = Task::create(
        draft(UserId::new(), AssignmentMode::SpecificPeople),
        &[],
        &[Assignee {
            user_id: UserId::new(),
            name: "Ada".to_owned(),
        }],
        &clock,
    )
    .expect("task creation");
    let stranger = UserId::new();

    let result = task.remove_execution(stranger, &clock);

    assert_eq!(
        result,
        Err(TaskDomainError::ExecutionNotFound {
            task_id: task.id(),
            user_id: stranger,
        })
    );
}
