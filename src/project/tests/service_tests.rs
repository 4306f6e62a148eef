//! Service tests for project creation, updates, listing and deletion.

use crate::error::ErrorKind;
use crate::history::services::RecordHistoryRequest;
use crate::membership::{
    domain::{Actor, RoleName},
    services::AccessError,
};
use crate::patch::FieldUpdate;
use crate::project::{
    ports::ProjectRepositoryError,
    services::{CreateProjectRequest, ProjectServiceError, UpdateProjectRequest},
};
use crate::task::domain::TaskStatus;
use crate::test_support::{Harness, harness};
use crate::user::domain::UserId;
use chrono::{NaiveDate, TimeDelta};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_enrolls_creator_as_admin(harness: Harness) {
    let alice = harness.user("alice").await;
    let start = NaiveDate::from_ymd_opt(2026, 4, 1).expect("valid date");

    let overview = harness
        .projects
        .create(
            CreateProjectRequest::new("  Apollo ")
                .with_description("Moon shot")
                .with_start_date(start),
            alice.id(),
        )
        .await
        .expect("creation should succeed");

    assert_eq!(overview.project.name().as_str(), "Apollo");
    assert_eq!(overview.project.description(), Some("Moon shot"));
    assert_eq!(overview.project.start_date(), Some(start));
    assert_eq!(overview.project.created_by(), alice.id());
    assert_eq!(overview.member_count, 1);
    assert_eq!(overview.task_count, 0);
    assert!(overview.tasks_by_status.is_empty());
    let owner = overview.members.first().expect("creator should be enrolled");
    assert_eq!(owner.user_id(), alice.id());
    assert_eq!(owner.role(), RoleName::Admin);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_unknown_creator_and_blank_name(harness: Harness) {
    let alice = harness.user("alice").await;
    let ghost = UserId::new();

    let unknown = harness
        .projects
        .create(CreateProjectRequest::new("Apollo"), ghost)
        .await
        .expect_err("unknown creator should fail");
    let blank = harness
        .projects
        .create(CreateProjectRequest::new("   "), alice.id())
        .await
        .expect_err("blank name should fail");

    assert!(matches!(unknown, ProjectServiceError::UserNotFound(id) if id == ghost));
    assert_eq!(blank.kind(), ErrorKind::ValidationFailed);
    assert!(harness.projects.list().await.expect("list").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overview_counts_tasks_by_status(harness: Harness) {
    let alice = harness.user("alice").await;
    let project = harness.project(&alice, "Apollo").await;
    harness.task(&alice, &project, "Design").await;
    let build = harness.task(&alice, &project, "Build").await;
    harness
        .tasks
        .update_status(Actor::User(alice.id()), build.id(), TaskStatus::Done)
        .await
        .expect("status update should succeed");

    let overview = harness
        .projects
        .get(project.id())
        .await
        .expect("overview should load");

    assert_eq!(overview.task_count, 2);
    assert_eq!(overview.tasks_by_status.get(&TaskStatus::Todo), Some(&1));
    assert_eq!(overview.tasks_by_status.get(&TaskStatus::Done), Some(&1));
    assert_eq!(overview.tasks_by_status.get(&TaskStatus::Review), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_applies_partial_changes(harness: Harness) {
    let alice = harness.user("alice").await;
    let overview = harness
        .projects
        .create(
            CreateProjectRequest::new("Apollo").with_description("Moon shot"),
            alice.id(),
        )
        .await
        .expect("creation should succeed");
    let project_id = overview.project.id();

    let updated = harness
        .projects
        .update(
            Actor::User(alice.id()),
            project_id,
            UpdateProjectRequest::new()
                .with_name("Artemis")
                .with_description(FieldUpdate::Clear),
        )
        .await
        .expect("update should succeed");

    assert_eq!(updated.name().as_str(), "Artemis");
    assert_eq!(updated.description(), None);
    assert!(updated.updated_at() > overview.project.updated_at());
    let reloaded = harness.projects.get(project_id).await.expect("reload");
    assert_eq!(reloaded.project, updated);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_is_forbidden_for_plain_members(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let project = harness.project(&alice, "Apollo").await;
    harness.enroll(&project, &bob, "MEMBER").await;

    let err = harness
        .projects
        .update(
            Actor::User(bob.id()),
            project.id(),
            UpdateProjectRequest::new().with_name("Hijacked"),
        )
        .await
        .expect_err("member edits should be rejected");

    assert!(matches!(
        err,
        ProjectServiceError::Access(AccessError::Denied { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let reloaded = harness.projects.get(project.id()).await.expect("reload");
    assert_eq!(reloaded.project.name().as_str(), "Apollo");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_cascades_to_members_tasks_and_history(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let project = harness.project(&alice, "Apollo").await;
    harness.enroll(&project, &bob, "MEMBER").await;
    let task = harness.task(&alice, &project, "Design").await;
    harness
        .history
        .record(RecordHistoryRequest::new("STATUS_CHANGED").with_task(task.id()))
        .await
        .expect("history should record");

    harness
        .projects
        .delete(Actor::User(alice.id()), project.id())
        .await
        .expect("deletion should succeed");

    let missing = harness.projects.get(project.id()).await;
    assert!(matches!(
        missing,
        Err(ProjectServiceError::Repository(ProjectRepositoryError::NotFound(_)))
    ));
    assert!(
        harness
            .members
            .memberships_of_user(bob.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert!(
        harness
            .tasks
            .list_by_project(project.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert!(
        harness
            .history
            .by_task(task.id())
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_recent_uses_the_injected_clock(harness: Harness) {
    let alice = harness.user("alice").await;
    let old = harness.project(&alice, "Old").await;
    harness.clock.advance(TimeDelta::days(10));
    let fresh = harness.project(&alice, "Fresh").await;
    let newest = harness.project(&alice, "Newest").await;

    let recent = harness
        .projects
        .list_recent(7)
        .await
        .expect("listing should succeed");

    let ids: Vec<_> = recent.iter().map(|project| project.id()).collect();
    assert_eq!(ids, vec![newest.id(), fresh.id()]);
    assert!(!ids.contains(&old.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn member_listings_respect_roles(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let apollo = harness.project(&alice, "Apollo").await;
    let gemini = harness.project(&alice, "Gemini").await;
    let mercury = harness.project(&bob, "Mercury").await;
    harness.enroll(&apollo, &bob, "OBSERVER").await;
    harness.enroll(&gemini, &bob, "DEVELOPER").await;

    let joined = harness
        .projects
        .list_for_member(bob.id())
        .await
        .expect("listing should succeed");
    let observing = harness
        .projects
        .list_for_member_with_role(bob.id(), "OBSERVER")
        .await
        .expect("listing should succeed");
    let administering = harness
        .projects
        .list_for_member_with_role(bob.id(), "ADMIN")
        .await
        .expect("listing should succeed");
    let unknown = harness
        .projects
        .list_for_member_with_role(bob.id(), "OWNER")
        .await;

    assert_eq!(joined.len(), 3);
    assert_eq!(
        observing.iter().map(|p| p.id()).collect::<Vec<_>>(),
        vec![apollo.id()]
    );
    assert_eq!(
        administering.iter().map(|p| p.id()).collect::<Vec<_>>(),
        vec![mercury.id()]
    );
    assert!(matches!(unknown, Err(ProjectServiceError::Role(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_and_creator_listings(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    harness.project(&alice, "Apollo Guidance").await;
    harness.project(&bob, "apollo telemetry").await;
    harness.project(&bob, "Gemini").await;

    let matches = harness
        .projects
        .search_by_name("APOLLO")
        .await
        .expect("search should succeed");
    let by_bob = harness
        .projects
        .list_created_by(bob.id())
        .await
        .expect("listing should succeed");

    assert_eq!(matches.len(), 2);
    assert_eq!(by_bob.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn membership_changes_delegate_to_the_registry(harness: Harness) {
    let alice = harness.user("alice").await;
    let bob = harness.user("bob").await;
    let project = harness.project(&alice, "Apollo").await;
    let actor = Actor::User(alice.id());

    harness
        .projects
        .add_member(actor, project.id(), bob.id(), "MEMBER")
        .await
        .expect("add should succeed");
    let promoted = harness
        .projects
        .change_member_role(actor, project.id(), bob.id(), "ADMIN")
        .await
        .expect("promotion should succeed");
    harness
        .projects
        .remove_member(actor, project.id(), alice.id())
        .await
        .expect("former sole admin may leave once bob is admin");

    assert_eq!(promoted.role(), RoleName::Admin);
    let overview = harness.projects.get(project.id()).await.expect("reload");
    assert_eq!(overview.member_count, 1);
}
