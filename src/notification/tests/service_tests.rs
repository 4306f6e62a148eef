//! Service tests for emitting, reading and deleting notifications.

use crate::error::ErrorKind;
use crate::membership::domain::Actor;
use crate::notification::{
    domain::{NotificationId, RelatedEntity},
    ports::NotificationRepositoryError,
    services::{NotificationServiceError, NotifyRequest},
};
use crate::task::domain::{TaskId, TaskStatus};
use crate::test_support::{Harness, harness};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notify_with_related_task_sets_project_context(harness: Harness) {
    let alice = harness.user("alice").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;

    let notification = harness
        .notifications
        .notify(
            NotifyRequest::new(alice.id(), "Reminder", "Design review tomorrow", "REMINDER")
                .with_related(RelatedEntity::Task(task.id())),
        )
        .await
        .expect("notification should be stored");

    assert_eq!(notification.project_id(), Some(project.id()));
    assert_eq!(notification.related(), Some(RelatedEntity::Task(task.id())));
    let for_task = harness.notifications.for_task(task.id()).await.expect("list");
    assert_eq!(for_task.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notify_rejects_bad_input(harness: Harness) {
    let alice = harness.user("alice").await;
    let ghost_task = TaskId::new();

    let bad_type = harness
        .notifications
        .notify(NotifyRequest::new(alice.id(), "Hi", "There", "reminder"))
        .await
        .expect_err("lowercase tag should fail");
    let bad_task = harness
        .notifications
        .notify(
            NotifyRequest::new(alice.id(), "Hi", "There", "REMINDER")
                .with_related(RelatedEntity::Task(ghost_task)),
        )
        .await
        .expect_err("unknown task should fail");

    assert_eq!(bad_type.kind(), ErrorKind::ValidationFailed);
    assert!(matches!(bad_task, NotificationServiceError::TaskNotFound(id) if id == ghost_task));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_events_build_typed_notices(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let project = harness.project(&alice, "Apollo").await;
    let task = harness.task(&alice, &project, "Design").await;

    let assigned = harness
        .notifications
        .task_assigned(bob.id(), task.id())
        .await
        .expect("assignment notice");
    let moved = harness
        .notifications
        .task_status_changed(bob.id(), task.id(), TaskStatus::Review)
        .await
        .expect("status notice");
    let added = harness
        .notifications
        .project_member_added(bob.id(), project.id())
        .await
        .expect("enrollment notice");

    assert_eq!(assigned.notification_type().as_str(), "TASK_ASSIGNED");
    assert!(assigned.message().contains("Design"));
    assert!(moved.message().ends_with("REVIEW"));
    assert_eq!(added.related(), Some(RelatedEntity::Project(project.id())));
    let for_project = harness
        .notifications
        .for_project(project.id())
        .await
        .expect("list");
    assert_eq!(for_project.len(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inbox_is_newest_first_and_tracks_read_state(harness: Harness) {
    let alice = harness.user("alice").await;
    let first = harness
        .notifications
        .notify(NotifyRequest::new(alice.id(), "One", "First", "REMINDER"))
        .await
        .expect("stored");
    let second = harness
        .notifications
        .notify(NotifyRequest::new(alice.id(), "Two", "Second", "REMINDER"))
        .await
        .expect("stored");
    harness
        .notifications
        .notify(NotifyRequest::new(alice.id(), "Three", "Third", "DIGEST"))
        .await
        .expect("stored");

    let marked = harness.notifications.mark_read(first.id()).await.expect("mark");
    let inbox = harness.notifications.for_user(alice.id()).await.expect("list");
    let unread = harness
        .notifications
        .unread_for_user(alice.id())
        .await
        .expect("list");
    let reminders = harness
        .notifications
        .for_user_and_type(alice.id(), "REMINDER")
        .await
        .expect("list");

    assert!(marked.is_read());
    let titles: Vec<&str> = inbox.iter().map(|n| n.title()).collect();
    assert_eq!(titles, vec!["Three", "Two", "One"]);
    assert_eq!(unread.len(), 2);
    assert_eq!(
        reminders.iter().map(|n| n.id()).collect::<Vec<_>>(),
        vec![second.id(), first.id()]
    );
    assert_eq!(harness.notifications.unread_count(alice.id()).await.expect("count"), 2);

    let changed = harness
        .notifications
        .mark_all_read(alice.id())
        .await
        .expect("mark all");
    assert_eq!(changed, 2);
    assert_eq!(harness.notifications.unread_count(alice.id()).await.expect("count"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifications_can_be_deleted(harness: Harness) {
    let alice = harness.user("alice").await;
    let note = harness
        .notifications
        .notify(NotifyRequest::new(alice.id(), "One", "First", "REMINDER"))
        .await
        .expect("stored");
    harness
        .notifications
        .notify(NotifyRequest::new(alice.id(), "Two", "Second", "REMINDER"))
        .await
        .expect("stored");
    harness
        .notifications
        .notify(NotifyRequest::new(alice.id(), "Three", "Third", "REMINDER"))
        .await
        .expect("stored");

    harness.notifications.delete(note.id()).await.expect("delete");
    let missing = harness.notifications.get(note.id()).await;
    let removed = harness
        .notifications
        .delete_for_user(alice.id())
        .await
        .expect("bulk delete");
    let unknown = harness.notifications.mark_read(NotificationId::new()).await;

    assert!(matches!(
        missing,
        Err(NotificationServiceError::Repository(NotificationRepositoryError::NotFound(_)))
    ));
    assert_eq!(removed, 2);
    assert!(matches!(
        unknown,
        Err(NotificationServiceError::Repository(NotificationRepositoryError::NotFound(_)))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notices_survive_task_deletion(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let project = harness.project(&alice, "Apollo").await;
    harness.enroll(&project, &bob, "MEMBER").await;
    let task = harness.task(&alice, &project, "Design").await;
    harness
        .tasks
        .assign_task(Actor::User(alice.id()), task.id(), bob.id())
        .await
        .expect("assignment should succeed");

    harness
        .tasks
        .delete_task(Actor::User(alice.id()), task.id())
        .await
        .expect("deletion should succeed");

    let inbox = harness.notifications.for_user(bob.id()).await.expect("list");
    assert_eq!(inbox.len(), 2);
}
