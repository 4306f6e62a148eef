//! Deletion cascades and the guards that protect referenced records.

use super::helpers::{MemoryServices, create_project, register, services};
use pmt::error::ErrorKind;
use pmt::history::services::RecordHistoryRequest;
use pmt::membership::domain::Actor;
use pmt::notification::{domain::RelatedEntity, services::NotifyRequest};
use pmt::task::services::CreateTaskRequest;
use pmt::user::services::UserServiceError;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn project_deletion_keeps_notifications_and_other_projects(
    services: MemoryServices,
) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let bob = register(&services, "bob").await?;
    let doomed = create_project(&services, &alice, "Doomed").await?;
    let survivor = create_project(&services, &alice, "Survivor").await?;
    services
        .members
        .add_member(Actor::User(alice.id()), doomed.id(), bob.id(), "MEMBER")
        .await?;
    let doomed_task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(doomed.id(), "Gone soon").with_assignee(bob.id()),
        )
        .await?;
    let kept_task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(survivor.id(), "Still here"),
        )
        .await?;

    services
        .projects
        .delete(Actor::User(alice.id()), doomed.id())
        .await?;

    eyre::ensure!(
        services.history.by_task(doomed_task.id()).await?.is_empty(),
        "history of deleted project tasks should be gone"
    );
    eyre::ensure!(
        services.history.by_task(kept_task.id()).await?.len() == 1,
        "other project history should be untouched"
    );
    eyre::ensure!(
        services.notifications.for_user(bob.id()).await?.len() == 2,
        "notifications outlive the project they mention"
    );
    eyre::ensure!(
        services.projects.list().await?.len() == 1,
        "only the surviving project should remain"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn user_deletion_waits_for_dependents(services: MemoryServices) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let bob = register(&services, "bob").await?;
    let project = create_project(&services, &alice, "Apollo").await?;
    services
        .members
        .add_member(Actor::User(alice.id()), project.id(), bob.id(), "MEMBER")
        .await?;
    let task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Pair review").with_assignee(bob.id()),
        )
        .await?;

    let refused = services.users.delete(bob.id()).await;
    let Err(UserServiceError::HasDependents { dependents, .. }) = &refused else {
        eyre::bail!("expected HasDependents, got {refused:?}");
    };
    eyre::ensure!(dependents.assigned_tasks == 1, "assignment should count");
    eyre::ensure!(dependents.memberships == 1, "membership should count");
    eyre::ensure!(
        refused.as_ref().err().map(UserServiceError::kind) == Some(ErrorKind::Conflict),
        "refusal should classify as a conflict"
    );

    services
        .tasks
        .delete_task(Actor::User(alice.id()), task.id())
        .await?;
    services
        .members
        .remove_member(Actor::User(alice.id()), project.id(), bob.id())
        .await?;
    services.users.delete(bob.id()).await?;

    eyre::ensure!(
        services.users.find_by_username("bob").await?.is_none(),
        "bob should be gone"
    );
    eyre::ensure!(
        services.notifications.for_user(bob.id()).await?.is_empty(),
        "bob's notifications should be deleted with him"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_deletion_preserves_related_notifications(
    services: MemoryServices,
) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let project = create_project(&services, &alice, "Apollo").await?;
    let task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Ephemeral"),
        )
        .await?;
    services
        .notifications
        .notify(
            NotifyRequest::new(alice.id(), "Heads up", "Ephemeral is due", "REMINDER")
                .with_related(RelatedEntity::Task(task.id())),
        )
        .await?;
    services
        .history
        .record(
            RecordHistoryRequest::new("DESCRIPTION_CHANGED")
                .with_task(task.id())
                .with_user(alice.id()),
        )
        .await?;

    services
        .tasks
        .delete_task(Actor::User(alice.id()), task.id())
        .await?;

    eyre::ensure!(
        services.notifications.for_task(task.id()).await?.len() == 1,
        "notification should still point at the deleted task"
    );
    let trail = services.history.by_project(project.id()).await?;
    eyre::ensure!(
        trail.len() == 1,
        "only the deletion marker should remain, got {}",
        trail.len()
    );
    Ok(())
}
