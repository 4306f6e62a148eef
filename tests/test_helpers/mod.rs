//! Shared fixtures for integration tests.

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use pmt::history::services::HistoryLedgerService;
use pmt::membership::services::MembershipRegistryService;
use pmt::notification::services::NotificationEmitterService;
use pmt::project::services::ProjectManagementService;
use pmt::store::Store;
use pmt::task::services::TaskLifecycleService;
use pmt::user::services::UserDirectoryService;
use std::env;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Clock that advances by one second on every reading.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    /// Starts the clock at 2026-03-02 09:00 UTC.
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self {
            next: Mutex::new(start),
        }
    }

    /// Moves the clock by `delta` without producing a reading.
    pub fn advance(&self, delta: TimeDelta) {
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        *next += delta;
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap_or_else(PoisonError::into_inner);
        let reading = *next;
        *next += TimeDelta::seconds(1);
        reading
    }
}

/// Every application service wired to one store and one clock.
pub struct Services<S: Store> {
    pub clock: Arc<SteppingClock>,
    pub users: UserDirectoryService<S, SteppingClock>,
    pub projects: ProjectManagementService<S, SteppingClock>,
    pub members: MembershipRegistryService<S, SteppingClock>,
    pub tasks: TaskLifecycleService<S, SteppingClock>,
    pub history: HistoryLedgerService<S, SteppingClock>,
    pub notifications: NotificationEmitterService<S, SteppingClock>,
}

impl<S: Store> Services<S> {
    /// Wires the services to `store`.
    pub fn over(store: Arc<S>) -> Self {
        let clock = Arc::new(SteppingClock::new());
        Self {
            users: UserDirectoryService::new(Arc::clone(&store), Arc::clone(&clock)),
            projects: ProjectManagementService::new(Arc::clone(&store), Arc::clone(&clock)),
            members: MembershipRegistryService::new(Arc::clone(&store), Arc::clone(&clock)),
            tasks: TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&clock)),
            history: HistoryLedgerService::new(Arc::clone(&store), Arc::clone(&clock)),
            notifications: NotificationEmitterService::new(store, Arc::clone(&clock)),
            clock,
        }
    }
}

/// Guard that applies scoped environment variable changes.
///
/// A process-wide mutex serializes guards, and the previous values are
/// restored on drop.
pub struct EnvVarGuard {
    previous: Vec<(String, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Sets (`Some`) or removes (`None`) each variable for the guard lifetime.
    pub fn set_many(changes: &[(&str, Option<&str>)]) -> Self {
        let lock = env_lock();
        let mut previous = Vec::with_capacity(changes.len());

        for (key, value) in changes {
            previous.push(((*key).to_owned(), env::var(key).ok()));
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                match value {
                    Some(new_value) => env::set_var(key, new_value),
                    None => env::remove_var(key),
                }
            }
        }

        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                match value {
                    Some(previous) => env::set_var(&key, previous),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
