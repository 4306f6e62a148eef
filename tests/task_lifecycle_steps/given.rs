//! Given steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use eyre::WrapErr;
use pmt::membership::domain::Actor;
use pmt::project::services::CreateProjectRequest;
use pmt::task::services::CreateTaskRequest;
use rstest_bdd_macros::given;

#[given(r#"a project "{name}" owned by "{owner}""#)]
fn project_owned_by(
    world: &mut TaskLifecycleWorld,
    name: String,
    owner: String,
) -> Result<(), eyre::Report> {
    let creator = world.person(&owner)?;
    let overview = run_async(
        world
            .projects
            .create(CreateProjectRequest::new(name), creator.id()),
    )
    .wrap_err("create project for scenario")?;
    world.project = Some(overview.project);
    Ok(())
}

#[given(r#""{username}" has joined the project as "{role}""#)]
fn user_joined_project(
    world: &mut TaskLifecycleWorld,
    username: String,
    role: String,
) -> Result<(), eyre::Report> {
    let user = world.person(&username)?;
    let project = world.current_project()?;
    run_async(world.projects.add_member(
        Actor::User(project.created_by()),
        project.id(),
        user.id(),
        &role,
    ))
    .wrap_err("add member for scenario")?;
    Ok(())
}

#[given(r#""{actor}" has created the task "{title}" assigned to "{assignee}""#)]
fn task_already_created(
    world: &mut TaskLifecycleWorld,
    actor: String,
    title: String,
    assignee: String,
) -> Result<(), eyre::Report> {
    let creator = world.person(&actor)?;
    let owner = world.person(&assignee)?;
    let project_id = world.current_project()?.id();
    let task = run_async(world.tasks.create_task(
        Actor::User(creator.id()),
        CreateTaskRequest::new(project_id, title).with_assignee(owner.id()),
    ))
    .wrap_err("create task for scenario")?;
    world.task = Some(task);
    Ok(())
}
