//! End-to-end workflows across projects, members, tasks and notifications.

use super::helpers::{MemoryServices, create_project, register, services};
use chrono::NaiveDate;
use pmt::history::domain::HistoryAction;
use pmt::membership::domain::Actor;
use pmt::patch::FieldUpdate;
use pmt::task::{
    domain::{TaskPriority, TaskStatus},
    services::{CreateTaskRequest, UpdateTaskRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_delivers_a_task_end_to_end(services: MemoryServices) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let bob = register(&services, "bob").await?;
    let project = create_project(&services, &alice, "Apollo").await?;
    services
        .projects
        .add_member(Actor::User(alice.id()), project.id(), bob.id(), "DEVELOPER")
        .await?;

    let task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Telemetry parser")
                .with_priority(TaskPriority::High)
                .with_assignee(bob.id()),
        )
        .await?;
    for status in ["IN_PROGRESS", "REVIEW"] {
        services
            .tasks
            .update_status_by_name(Actor::User(bob.id()), task.id(), status)
            .await?;
    }
    services
        .tasks
        .update_status(Actor::User(alice.id()), task.id(), TaskStatus::Done)
        .await?;

    let overview = services.projects.get(project.id()).await?;
    eyre::ensure!(overview.member_count == 2, "expected two members");
    eyre::ensure!(
        overview.tasks_by_status.get(&TaskStatus::Done) == Some(&1),
        "expected one done task, got {:?}",
        overview.tasks_by_status
    );

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
                HistoryAction::StatusChanged,
                HistoryAction::StatusChanged,
            ],
        "unexpected history {actions:?}"
    );

    let inbox = services.notifications.for_user(bob.id()).await?;
    let kinds: Vec<&str> = inbox
        .iter()
        .map(|notification| notification.notification_type().as_str())
        .collect();
    eyre::ensure!(
        kinds == vec!["TASK_STATUS_CHANGED", "TASK_ASSIGNED", "PROJECT_MEMBER_ADDED"],
        "unexpected inbox {kinds:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reassignment_records_usernames(services: MemoryServices) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let bob = register(&services, "bob").await?;
    let carol = register(&services, "carol").await?;
    let project = create_project(&services, &alice, "Apollo").await?;
    for user in [&bob, &carol] {
        services
            .members
            .add_member(Actor::User(alice.id()), project.id(), user.id(), "MEMBER")
            .await?;
    }
    let task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Docking checklist").with_assignee(bob.id()),
        )
        .await?;

    services
        .tasks
        .update_task(
            Actor::User(carol.id()),
            task.id(),
            UpdateTaskRequest::new().with_assignee(FieldUpdate::Set(carol.id())),
        )
        .await?;
    services
        .tasks
        .update_task(
            Actor::User(carol.id()),
            task.id(),
            UpdateTaskRequest::new().with_assignee(FieldUpdate::Clear),
        )
        .await?;

    let assignments = services
        .history
        .by_task_and_action(task.id(), "ASSIGNED")
        .await?;
    let values: Vec<(Option<&str>, Option<&str>)> = assignments
        .iter()
        .map(|entry| (entry.old_value(), entry.new_value()))
        .collect();
    eyre::ensure!(
        values == vec![(Some("bob"), Some("carol")), (Some("carol"), None)],
        "unexpected assignment trail {values:?}"
    );
    let reloaded = services.tasks.get_task(task.id()).await?;
    eyre::ensure!(reloaded.assignee_id().is_none(), "task should be unassigned");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn due_date_queries_follow_status_changes(
    services: MemoryServices,
) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let project = create_project(&services, &alice, "Apollo").await?;
    let due = NaiveDate::from_ymd_opt(2026, 3, 5).ok_or_else(|| eyre::eyre!("bad date"))?;
    let today = NaiveDate::from_ymd_opt(2026, 3, 9).ok_or_else(|| eyre::eyre!("bad date"))?;
    let task = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Launch review")
                .with_due_date(due)
                .with_assignee(alice.id()),
        )
        .await?;

    let before = services.tasks.list_overdue_for_user(alice.id(), today).await?;
    services
        .tasks
        .update_status(Actor::User(alice.id()), task.id(), TaskStatus::Cancelled)
        .await?;
    let after = services.tasks.list_overdue_for_user(alice.id(), today).await?;

    eyre::ensure!(before.len() == 1, "open past-due task should be overdue");
    eyre::ensure!(after.is_empty(), "cancelled task should not be overdue");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn alpha_task_is_created_finished_and_deleted(
    services: MemoryServices,
) -> Result<(), eyre::Report> {
    let first = register(&services, "user1").await?;
    let second = register(&services, "user2").await?;
    let project = create_project(&services, &first, "Alpha").await?;
    services
        .projects
        .add_member(Actor::User(first.id()), project.id(), second.id(), "DEVELOPER")
        .await?;

    let task = services
        .tasks
        .create_task(
            Actor::User(first.id()),
            CreateTaskRequest::new(project.id(), "Fix bug"),
        )
        .await?;
    eyre::ensure!(task.status() == TaskStatus::Todo, "new tasks start as TODO");
    eyre::ensure!(
        task.priority() == TaskPriority::Medium,
        "new tasks default to MEDIUM"
    );
    eyre::ensure!(task.assignee_id().is_none(), "no assignee was given");

    let assigned = services
        .tasks
        .assign_task(Actor::User(first.id()), task.id(), second.id())
        .await?;
    eyre::ensure!(
        assigned.assignee_id() == Some(second.id()),
        "task should be assigned to user2"
    );

    let finished = services
        .tasks
        .update_status_by_name(Actor::User(first.id()), task.id(), "DONE")
        .await?;
    eyre::ensure!(finished.status() == TaskStatus::Done, "task should be DONE");

    let before = services.projects.get(project.id()).await?.task_count;
    services
        .tasks
        .delete_task(Actor::User(first.id()), task.id())
        .await?;
    let after = services.projects.get(project.id()).await?.task_count;

    eyre::ensure!(
        services.history.by_task(task.id()).await?.is_empty(),
        "task history should be removed with the task"
    );
    eyre::ensure!(
        after + 1 == before,
        "task count should drop by one, went from {before} to {after}"
    );
    Ok(())
}
