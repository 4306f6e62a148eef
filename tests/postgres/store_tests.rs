//! Round trips, constraints and cascades against `PostgreSQL`.

use super::helpers::{pg_services, register, unique_name};
use pmt::error::ErrorKind;
use pmt::history::domain::HistoryAction;
use pmt::membership::domain::Actor;
use pmt::patch::FieldUpdate;
use pmt::project::services::{CreateProjectRequest, UpdateProjectRequest};
use pmt::task::{
    domain::TaskStatus,
    services::{CreateTaskRequest, UpdateTaskRequest},
};
use pmt::user::services::{RegisterUserRequest, UserServiceError};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn users_round_trip_and_reject_duplicates() -> Result<(), eyre::Report> {
    let Some(services) = pg_services()? else {
        return Ok(());
    };
    let alice = register(&services, "alice").await?;

    let by_email = services
        .users
        .find_by_email(&alice.email().as_str().to_uppercase())
        .await?;
    eyre::ensure!(
        by_email.as_ref().map(|user| user.id()) == Some(alice.id()),
        "email lookup should ignore case"
    );

    let duplicate = services
        .users
        .register(RegisterUserRequest::new(
            alice.username().as_str(),
            format!("{}@example.org", unique_name("other")),
            "$argon2id$v=19$stub",
        ))
        .await;
    eyre::ensure!(
        duplicate.as_ref().err().map(UserServiceError::kind) == Some(ErrorKind::AlreadyExists),
        "duplicate username should be rejected, got {duplicate:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn project_creation_enrolls_the_creator() -> Result<(), eyre::Report> {
    let Some(services) = pg_services()? else {
        return Ok(());
    };
    let alice = register(&services, "alice").await?;
    let name = unique_name("Apollo");
    let overview = services
        .projects
        .create(
            CreateProjectRequest::new(name.as_str()).with_description("Moonshot"),
            alice.id(),
        )
        .await?;
    let project_id = overview.project.id();

    eyre::ensure!(overview.member_count == 1, "creator should be the only member");
    eyre::ensure!(
        services
            .members
            .has_role(project_id, alice.id(), "ADMIN")
            .await?,
        "creator should hold ADMIN"
    );

    let updated = services
        .projects
        .update(
            Actor::User(alice.id()),
            project_id,
            UpdateProjectRequest::new().with_description(FieldUpdate::Clear),
        )
        .await?;
    let reloaded = services.projects.get(project_id).await?;
    eyre::ensure!(updated.description().is_none(), "description should be cleared");
    eyre::ensure!(
        reloaded.project.description().is_none() && reloaded.project.name().as_str() == name,
        "update should persist without touching the name"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_changes_are_recorded_in_order() -> Result<(), eyre::Report> {
    let Some(services) = pg_services()? else {
        return Ok(());
    };
    let alice = register(&services, "alice").await?;
    let project = services
        .projects
        .create(CreateProjectRequest::new(unique_name("Gemini")), alice.id())
        .await?
        .project;
    let task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Hatch seal test"),
        )
        .await?;
    services
        .tasks
        .update_status(Actor::User(alice.id()), task.id(), TaskStatus::InProgress)
        .await?;
    services
        .tasks
        .update_task(
            Actor::User(alice.id()),
            task.id(),
            UpdateTaskRequest::new().with_title("Hatch seal retest"),
        )
        .await?;

    let actions: Vec<HistoryAction> = services
        .history
        .by_task(task.id())
        .await?
        .iter()
        .map(|entry| entry.action())
        .collect();
    eyre::ensure!(
        actions
            == vec![
                HistoryAction::Created,
                HistoryAction::StatusChanged,
                HistoryAction::TitleChanged,
            ],
        "unexpected history {actions:?}"
    );
    let reloaded = services.tasks.get_task(task.id()).await?;
    eyre::ensure!(
        reloaded.status() == TaskStatus::InProgress
            && reloaded.title().as_str() == "Hatch seal retest",
        "task should persist both changes"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifications_are_marked_read_in_bulk() -> Result<(), eyre::Report> {
    let Some(services) = pg_services()? else {
        return Ok(());
    };
    let alice = register(&services, "alice").await?;
    let bob = register(&services, "bob").await?;
    let project = services
        .projects
        .create(CreateProjectRequest::new(unique_name("Mercury")), alice.id())
        .await?
        .project;
    services
        .members
        .add_member(Actor::User(alice.id()), project.id(), bob.id(), "MEMBER")
        .await?;
    services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Capsule checks").with_assignee(bob.id()),
        )
        .await?;

    eyre::ensure!(
        services.notifications.unread_count(bob.id()).await? == 2,
        "bob should have two unread notices"
    );
    let marked = services.notifications.mark_all_read(bob.id()).await?;
    eyre::ensure!(marked == 2, "expected two notices marked, got {marked}");
    eyre::ensure!(
        services.notifications.unread_for_user(bob.id()).await?.is_empty(),
        "nothing should remain unread"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_project_cascades_to_tasks_and_members() -> Result<(), eyre::Report> {
    let Some(services) = pg_services()? else {
        return Ok(());
    };
    let alice = register(&services, "alice").await?;
    let bob = register(&services, "bob").await?;
    let project = services
        .projects
        .create(CreateProjectRequest::new(unique_name("Skylab")), alice.id())
        .await?
        .project;
    services
        .members
        .add_member(Actor::User(alice.id()), project.id(), bob.id(), "DEVELOPER")
        .await?;
    let task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Solar array").with_assignee(bob.id()),
        )
        .await?;

    let refused = services.users.delete(bob.id()).await;
    eyre::ensure!(
        refused.as_ref().err().map(UserServiceError::kind) == Some(ErrorKind::Conflict),
        "bob is still referenced, got {refused:?}"
    );

    services
        .projects
        .delete(Actor::User(alice.id()), project.id())
        .await?;

    eyre::ensure!(
        services.tasks.list_by_project(project.id()).await?.is_empty(),
        "tasks should go with the project"
    );
    eyre::ensure!(
        services.history.by_task(task.id()).await?.is_empty(),
        "task history should go with the project"
    );
    eyre::ensure!(
        services.members.memberships_of_user(bob.id()).await?.is_empty(),
        "memberships should go with the project"
    );
    eyre::ensure!(
        services.notifications.for_user(bob.id()).await?.len() == 2,
        "notifications should outlive the project"
    );
    services.users.delete(bob.id()).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_admin_demotions_keep_one_admin() -> Result<(), eyre::Report> {
    let Some(services) = pg_services()? else {
        return Ok(());
    };
    let alice = register(&services, "alice").await?;
    let bob = register(&services, "bob").await?;
    let project = services
        .projects
        .create(CreateProjectRequest::new(unique_name("Voyager")), alice.id())
        .await?
        .project;
    services
        .members
        .add_member(Actor::User(alice.id()), project.id(), bob.id(), "ADMIN")
        .await?;
    let shared = Arc::new(services);

    let mut handles = Vec::new();
    for user_id in [alice.id(), bob.id()] {
        let worker = Arc::clone(&shared);
        let project_id = project.id();
        handles.push(tokio::spawn(async move {
            worker
                .members
                .change_role(Actor::User(user_id), project_id, user_id, "MEMBER")
                .await
        }));
    }
    let mut refused = 0_usize;
    for handle in handles {
        if let Err(err) = handle.await? {
            eyre::ensure!(
                err.kind() == ErrorKind::ValidationFailed,
                "the losing demotion should be refused as a validation failure, got {err:?}"
            );
            refused += 1;
        }
    }

    eyre::ensure!(refused == 1, "exactly one demotion should be refused, got {refused}");
    let mut remaining = 0_usize;
    for user_id in [alice.id(), bob.id()] {
        if shared.members.has_role(project.id(), user_id, "ADMIN").await? {
            remaining += 1;
        }
    }
    eyre::ensure!(remaining == 1, "one admin should remain, got {remaining}");
    Ok(())
}
