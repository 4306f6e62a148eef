//! When steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use pmt::membership::domain::Actor;
use pmt::task::services::CreateTaskRequest;
use rstest_bdd_macros::when;

#[when(r#""{actor}" creates the task "{title}" assigned to "{assignee}""#)]
fn create_task(
    world: &mut TaskLifecycleWorld,
    actor: String,
    title: String,
    assignee: String,
) -> Result<(), eyre::Report> {
    let creator = world.person(&actor)?;
    let owner = world.person(&assignee)?;
    let project_id = world.current_project()?.id();
    let result = run_async(world.tasks.create_task(
        Actor::User(creator.id()),
        CreateTaskRequest::new(project_id, title).with_assignee(owner.id()),
    ));
    if let Ok(ref task) = result {
        world.task = Some(task.clone());
    }
    world.last_result = Some(result);
    Ok(())
}

#[when(r#""{actor}" moves the task to "{status}""#)]
fn move_task(
    world: &mut TaskLifecycleWorld,
    actor: String,
    status: String,
) -> Result<(), eyre::Report> {
    let mover = world.person(&actor)?;
    let task_id = world.current_task()?.id();
    let result = run_async(world.tasks.update_status_by_name(
        Actor::User(mover.id()),
        task_id,
        &status,
    ));
    if let Ok(ref task) = result {
        world.task = Some(task.clone());
    }
    world.last_result = Some(result);
    Ok(())
}
