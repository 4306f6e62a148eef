//! Service tests for recording and querying task history.

use crate::error::ErrorKind;
use crate::history::{
    domain::HistoryAction,
    ports::HistoryRepositoryError,
    services::{HistoryServiceError, RecordHistoryRequest},
};
use crate::membership::domain::Actor;
use crate::task::domain::{TaskId, TaskStatus};
use crate::test_support::{Harness, harness};
use crate::user::domain::UserId;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn record_copies_the_project_from_the_task(harness: Harness) {
    let alice = harness.user("alice").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;

    let entry = harness
        .history
        .record(
            RecordHistoryRequest::new("PRIORITY_CHANGED")
                .with_task(task.id())
                .with_user(alice.id())
                .with_old_value("MEDIUM")
                .with_new_value("HIGH"),
        )
        .await
        .expect("recording should succeed");

    assert_eq!(entry.project_id(), Some(project.id()));
    assert_eq!(entry.action(), HistoryAction::PriorityChanged);
    assert_eq!(entry.old_value(), Some("MEDIUM"));
    let fetched = harness.history.by_id(entry.id()).await.expect("lookup");
    assert_eq!(fetched, entry);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn record_rejects_unknown_action_and_references(harness: Harness) {
    let ghost_task = TaskId::new();
    let ghost_user = UserId::new();

    let bad_action = harness
        .history
        .record(RecordHistoryRequest::new("RENAMED"))
        .await
        .expect_err("unknown action should fail");
    let bad_task = harness
        .history
        .record(RecordHistoryRequest::new("CREATED").with_task(ghost_task))
        .await
        .expect_err("unknown task should fail");
    let bad_user = harness
        .history
        .record(RecordHistoryRequest::new("CREATED").with_user(ghost_user))
        .await
        .expect_err("unknown user should fail");

    assert_eq!(bad_action.kind(), ErrorKind::ValidationFailed);
    assert!(matches!(bad_task, HistoryServiceError::TaskNotFound(id) if id == ghost_task));
    assert!(matches!(bad_user, HistoryServiceError::UserNotFound(id) if id == ghost_user));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recent_entries_come_newest_first(harness: Harness) {
    let alice = harness.user("alice").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;
    let actor = Actor::User(alice.id());
    for status in [TaskStatus::InProgress, TaskStatus::Review, TaskStatus::Done] {
        harness
            .tasks
            .update_status(actor, task.id(), status)
            .await
            .expect("status update should succeed");
    }

    let all = harness.history.recent_by_task(task.id()).await.expect("history");
    let latest_two = harness
        .history
        .recent_by_task_limited(task.id(), 2)
        .await
        .expect("history");

    assert_eq!(all.len(), 4);
    assert_eq!(all.last().map(|entry| entry.action()), Some(HistoryAction::Created));
    let newest: Vec<Option<&str>> = latest_two.iter().map(|entry| entry.new_value()).collect();
    assert_eq!(newest, vec![Some("DONE"), Some("REVIEW")]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn entries_can_be_filtered_by_user_and_action(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let project = harness.project(&alice, "Apollo").await;
    harness.enroll(&project, &bob, "DEVELOPER").await;
    harness.task(&alice, &project, "Design").await;
    harness.task(&bob, &project, "Build").await;

    let by_bob = harness.history.by_user(bob.id()).await.expect("history");
    let created = harness.history.by_action("CREATED").await.expect("history");
    let unknown = harness.history.by_action("BOGUS").await;

    assert_eq!(by_bob.len(), 1);
    assert_eq!(created.len(), 2);
    assert!(matches!(unknown, Err(HistoryServiceError::Domain(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn authored_entries_survive_user_removal(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;
    harness
        .history
        .record(
            RecordHistoryRequest::new("DESCRIPTION_CHANGED")
                .with_task(task.id())
                .with_user(bob.id()),
        )
        .await
        .expect("recording should succeed");

    harness.users.delete(bob.id()).await.expect("bob has no dependents");

    let by_bob = harness.history.by_user(bob.id()).await.expect("history");
    assert_eq!(by_bob.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn entries_can_be_deleted_singly_or_per_task(harness: Harness) {
    let alice = harness.user("alice").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;
    let extra = harness
        .history
        .record(RecordHistoryRequest::new("TITLE_CHANGED").with_task(task.id()))
        .await
        .expect("recording should succeed");

    harness.history.delete(extra.id()).await.expect("delete");
    let missing = harness.history.delete(extra.id()).await;
    let removed = harness
        .history
        .delete_by_task(task.id())
        .await
        .expect("bulk delete");

    assert!(matches!(
        missing,
        Err(HistoryServiceError::Repository(HistoryRepositoryError::NotFound(_)))
    ));
    assert_eq!(removed, 1);
    assert!(harness.history.by_task(task.id()).await.expect("history").is_empty());
}
