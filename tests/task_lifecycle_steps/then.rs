//! Then steps for task lifecycle BDD scenarios.

use super::world::{TaskLifecycleWorld, run_async};
use pmt::task::services::TaskLifecycleError;
use rstest_bdd_macros::then;

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskLifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id();
    let stored = run_async(world.tasks.get_task(task_id))?;

    if stored.status().as_str() != status {
        return Err(eyre::eyre!(
            "expected status {status}, found {}",
            stored.status().as_str()
        ));
    }

    Ok(())
}

#[then(r#""{username}" has {count:u64} unread "{kind}" notification"#)]
fn unread_notifications_of_kind(
    world: &TaskLifecycleWorld,
    username: String,
    count: u64,
    kind: String,
) -> Result<(), eyre::Report> {
    let user = world
        .people
        .get(&username)
        .ok_or_else(|| eyre::eyre!("unknown scenario user {username}"))?;
    let notices = run_async(world.notifications.for_user_and_type(user.id(), &kind))?;
    let unread = notices.iter().filter(|notice| !notice.is_read()).count();

    if u64::try_from(unread)? != count {
        return Err(eyre::eyre!(
            "expected {count} unread {kind} notifications for {username}, found {unread}"
        ));
    }

    Ok(())
}

#[then(r#"the task history reads "{actions}""#)]
fn task_history_reads(world: &TaskLifecycleWorld, actions: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id();
    let trail = run_async(world.history.by_task(task_id))?;
    let recorded: Vec<&str> = trail.iter().map(|entry| entry.action().as_str()).collect();
    let expected: Vec<&str> = actions.split(", ").collect();

    if recorded != expected {
        return Err(eyre::eyre!("expected history {expected:?}, found {recorded:?}"));
    }

    Ok(())
}

#[then(r#"the request is refused as "{kind}""#)]
fn request_refused_as(world: &TaskLifecycleWorld, kind: String) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing request result"))?;

    let Err(err) = result else {
        return Err(eyre::eyre!("expected a {kind} refusal, got {result:?}"));
    };
    if TaskLifecycleError::kind(err).as_str() != kind {
        return Err(eyre::eyre!("expected a {kind} refusal, got {err:?}"));
    }

    Ok(())
}
