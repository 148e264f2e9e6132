//! Unit tests for the execution status state machine.

use crate::task::domain::{
    DEFAULT_REJECTION_NOTE, ExecutionStatus, ReviewOutcome, TaskExecution, UserId,
};
use chrono::{Duration, Utc};
use eyre::{OptionExt, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[fixture]
fn execution(clock: DefaultClock) -> TaskExecution {
    TaskExecution::assigned(UserId::new(), "Ada Lovelace", &clock)
}

#[rstest]
#[case(ExecutionStatus::Active, ExecutionStatus::Active, false)]
#[case(ExecutionStatus::Active, ExecutionStatus::Pending, true)]
#[case(ExecutionStatus::Active, ExecutionStatus::Accepted, false)]
#[case(ExecutionStatus::Active, ExecutionStatus::Rejected, false)]
#[case(ExecutionStatus::Active, ExecutionStatus::Removed, false)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Active, false)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Pending, true)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Accepted, true)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Rejected, true)]
#[case(ExecutionStatus::Pending, ExecutionStatus::Removed, false)]
#[case(ExecutionStatus::Accepted, ExecutionStatus::Active, false)]
#[case(ExecutionStatus::Accepted, ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Accepted, ExecutionStatus::Accepted, false)]
#[case(ExecutionStatus::Accepted, ExecutionStatus::Rejected, false)]
#[case(ExecutionStatus::Accepted, ExecutionStatus::Removed, true)]
#[case(ExecutionStatus::Rejected, ExecutionStatus::Active, false)]
#[case(ExecutionStatus::Rejected, ExecutionStatus::Pending, true)]
#[case(ExecutionStatus::Rejected, ExecutionStatus::Accepted, false)]
#[case(ExecutionStatus::Rejected, ExecutionStatus::Rejected, false)]
#[case(ExecutionStatus::Rejected, ExecutionStatus::Removed, true)]
#[case(ExecutionStatus::Removed, ExecutionStatus::Active, false)]
#[case(ExecutionStatus::Removed, ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Removed, ExecutionStatus::Accepted, false)]
#[case(ExecutionStatus::Removed, ExecutionStatus::Rejected, false)]
#[case(ExecutionStatus::Removed, ExecutionStatus::Removed, false)]
fn can_transition_to_returns_expected(
    #[case] from: ExecutionStatus,
    #[case] to: ExecutionStatus,
    #[case] expected: bool,
) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[rstest]
#[case(ExecutionStatus::Active, false)]
#[case(ExecutionStatus::Pending, false)]
#[case(ExecutionStatus::Accepted, true)]
#[case(ExecutionStatus::Rejected, true)]
#[case(ExecutionStatus::Removed, false)]
fn is_settled_covers_review_outcomes(#[case] status: ExecutionStatus, #[case] expected: bool) {
    assert_eq!(status.is_settled(), expected);
}

#[rstest]
fn removed_is_the_only_terminal_status() {
    assert!(ExecutionStatus::Removed.is_terminal());
    assert!(!ExecutionStatus::Accepted.is_terminal());
    assert!(!ExecutionStatus::Rejected.is_terminal());
}

#[rstest]
fn submit_moves_active_to_pending(clock: DefaultClock, mut execution: TaskExecution) {
    execution.submit(&clock).expect("first submission");

    assert_eq!(execution.status(), ExecutionStatus::Pending);
    assert!(!execution.corrected());
}

#[rstest]
fn resubmission_while_pending_is_permitted(clock: DefaultClock, mut execution: TaskExecution) {
    execution.submit(&clock).expect("first submission");
    execution.submit(&clock).expect("overwriting resubmission");

    assert_eq!(execution.status(), ExecutionStatus::Pending);
    assert!(!execution.corrected());
}

#[rstest]
fn approve_settles_pending_work(clock: DefaultClock, mut execution: TaskExecution) {
    execution.submit(&clock).expect("submission");
    let outcome = execution.approve(&clock).expect("approval");

    assert_eq!(outcome, ReviewOutcome::Approved);
    assert_eq!(execution.status(), ExecutionStatus::Accepted);
}

#[rstest]
fn approve_is_idempotent_on_accepted_work(clock: DefaultClock, mut execution: TaskExecution) {
    execution.submit(&clock).expect("submission");
    execution.approve(&clock).expect("approval");
    let marked_at = execution.marked_at();

    let outcome = execution.approve(&clock).expect("repeated approval");

    assert_eq!(outcome, ReviewOutcome::AlreadyAccepted);
    assert_eq!(execution.status(), ExecutionStatus::Accepted);
    assert_eq!(execution.marked_at(), marked_at);
}

#[rstest]
fn approve_refuses_unsubmitted_work(clock: DefaultClock, mut execution: TaskExecution) {
    let refused = execution
        .approve(&clock)
        .expect_err("approving unsubmitted work");

    assert_eq!(refused.from, ExecutionStatus::Active);
    assert_eq!(refused.to, ExecutionStatus::Accepted);
}

#[rstest]
fn refused_transitions_convert_into_error_reports(
    clock: DefaultClock,
    mut execution: TaskExecution,
) -> eyre::Result<()> {
    let refused = execution
        .approve(&clock)
        .expect_err("approving unsubmitted work");

    ensure!(refused.to_string() == "refused execution transition: active -> accepted");
    // The refusal propagates through `?` in fallible test signatures.
    let report = eyre::Report::from(refused);
    ensure!(report.to_string().contains("active -> accepted"));
    Ok(())
}

#[rstest]
fn reject_records_note_and_deadline(
    clock: DefaultClock,
    mut execution: TaskExecution,
) -> eyre::Result<()> {
    let deadline = Utc::now() + Duration::days(3);
    execution.submit(&clock)?;
    execution.reject("Missing the summary section", Some(deadline), &clock)?;

    ensure!(execution.status() == ExecutionStatus::Rejected);
    let note = execution.rejection_note().ok_or_eyre("note should be set")?;
    ensure!(note == "Missing the summary section");
    ensure!(execution.correction_deadline() == Some(deadline));
    Ok(())
}

#[rstest]
fn reject_substitutes_default_note_for_blank_input(
    clock: DefaultClock,
    mut execution: TaskExecution,
) {
    execution.submit(&clock).expect("submission");
    execution.reject("   ", None, &clock).expect("rejection");

    assert_eq!(execution.rejection_note(), Some(DEFAULT_REJECTION_NOTE));
}

#[rstest]
fn correction_resubmission_sets_sticky_corrected_flag(
    clock: DefaultClock,
    mut execution: TaskExecution,
) {
    execution.submit(&clock).expect("submission");
    execution.reject("Needs work", None, &clock).expect("rejection");
    execution.submit(&clock).expect("correcting resubmission");

    assert!(execution.corrected());
    // The note survives until the next review overwrites it.
    assert_eq!(execution.rejection_note(), Some("Needs work"));

    execution.approve(&clock).expect("approval after correction");
    assert!(execution.corrected());
}

#[rstest]
fn reject_refuses_settled_work(clock: DefaultClock, mut execution: TaskExecution) {
    execution.submit(&clock).expect("submission");
    execution.approve(&clock).expect("approval");

    let refused = execution
        .reject("too late", None, &clock)
        .expect_err("rejecting accepted work");

    assert_eq!(refused.from, ExecutionStatus::Accepted);
    assert_eq!(refused.to, ExecutionStatus::Rejected);
}

#[rstest]
fn submit_refuses_accepted_work(clock: DefaultClock, mut execution: TaskExecution) {
    execution.submit(&clock).expect("submission");
    execution.approve(&clock).expect("approval");

    let refused = execution
        .submit(&clock)
        .expect_err("submitting over accepted work");

    assert_eq!(refused.from, ExecutionStatus::Accepted);
    assert_eq!(refused.to, ExecutionStatus::Pending);
}
