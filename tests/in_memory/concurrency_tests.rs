//! Parallel mutations against one shared in-memory store.

use super::helpers::{MemoryServices, create_project, register, services};
use pmt::history::domain::HistoryAction;
use pmt::membership::domain::Actor;
use pmt::task::{
    domain::TaskPriority,
    services::{CreateTaskRequest, UpdateTaskRequest},
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_task_creation_keeps_counts_consistent(
    services: MemoryServices,
) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let project = create_project(&services, &alice, "Apollo").await?;
    let shared = Arc::new(services);

    let mut handles = Vec::new();
    for index in 0..16 {
        let worker = Arc::clone(&shared);
        let actor = Actor::User(alice.id());
        let project_id = project.id();
        handles.push(tokio::spawn(async move {
            worker
                .tasks
                .create_task(
                    actor,
                    CreateTaskRequest::new(project_id, format!("Task {index}")),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let overview = shared.projects.get(project.id()).await?;
    eyre::ensure!(overview.task_count == 16, "expected 16 tasks");
    eyre::ensure!(
        shared.history.by_project(project.id()).await?.len() == 16,
        "every creation should be recorded once"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_admits_one_username(
    services: MemoryServices,
) -> Result<(), eyre::Report> {
    let shared = Arc::new(services);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let worker = Arc::clone(&shared);
        handles.push(tokio::spawn(async move { register(&worker, "racer").await }));
    }
    let mut admitted = 0_usize;
    for handle in handles {
        if handle.await?.is_ok() {
            admitted += 1;
        }
    }

    eyre::ensure!(admitted == 1, "exactly one registration should win, got {admitted}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_field_updates_both_succeed(
    services: MemoryServices,
) -> Result<(), eyre::Report> {
    let alice = register(&services, "alice").await?;
    let project = create_project(&services, &alice, "Apollo").await?;
    let task_id = services
        .tasks
        .create_task(
            Actor::User(alice.id()),
            CreateTaskRequest::new(project.id(), "Design"),
        )
        .await?
        .id();
    let shared = Arc::new(services);
    let actor = Actor::User(alice.id());

    let retitle = {
        let worker = Arc::clone(&shared);
        tokio::spawn(async move {
            worker
                .tasks
                .update_task(
                    actor,
                    task_id,
                    UpdateTaskRequest::new().with_title("Design lander"),
                )
                .await
        })
    };
    let escalate = {
        let worker = Arc::clone(&shared);
        tokio::spawn(async move {
            worker
                .tasks
                .update_task(
                    actor,
                    task_id,
                    UpdateTaskRequest::new().with_priority(TaskPriority::Urgent),
                )
                .await
        })
    };
    retitle.await??;
    escalate.await??;

    let current = shared.tasks.get_task(task_id).await?;
    eyre::ensure!(
        current.title().as_str() == "Design lander" || current.priority() == TaskPriority::Urgent,
        "the later write should be visible, got {current:?}"
    );
    let actions: Vec<HistoryAction> = shared
        .history
        .by_task(task_id)
        .await?
        .iter()
        .map(|entry| entry.action())
        .collect();
    eyre::ensure!(
        actions.contains(&HistoryAction::TitleChanged)
            && actions.contains(&HistoryAction::PriorityChanged),
        "both updates should be recorded, got {actions:?}"
    );
    Ok(())
}
