use {
    crate::{
        sync::{Condvar, MutexGuard},
        EventError,
    },
    std::time::{Duration, Instant},
};

mod composite;
mod notifier;

pub use composite::{wait_all, wait_any};

pub(crate) use notifier::Notifier;

/// Result of waiting on a single waitable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WaitableResult {
    /// The waitable was signaled.
    Signaled,
    /// The timeout duration elapsed before the waitable was signaled.
    Timeout,
}

impl WaitableResult {
    pub fn is_signaled(self) -> bool {
        self == WaitableResult::Signaled
    }
}

impl From<bool> for WaitableResult {
    fn from(signaled: bool) -> Self {
        if signaled {
            WaitableResult::Signaled
        } else {
            WaitableResult::Timeout
        }
    }
}

/// Waitable object trait.
pub trait Waitable {
    /// Blocks the thread until the waitable is signaled or the duration `d` expires.
    fn wait(&self, d: Duration) -> Result<WaitableResult, EventError>;

    /// Blocks the thread until the waitable is signaled.
    fn wait_infinite(&self) -> Result<(), EventError>;
}

/// `None` if `timeout` is `None` or too far in the future to be represented.
pub(crate) fn deadline_after(timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|timeout| Instant::now().checked_add(timeout))
}

/// Blocks on `condvar` while `pending` holds for the guarded value, recomputing
/// the remaining time after every wake.
///
/// Returns `true` once `pending` no longer holds, `false` if `deadline` passed first.
/// `pending` is always evaluated at least once, so a past deadline is a single poll.
pub(crate) fn wait_while<T, F>(
    condvar: &Condvar,
    mut guard: MutexGuard<'_, T>,
    deadline: Option<Instant>,
    mut pending: F,
) -> Result<bool, EventError>
where
    F: FnMut(&T) -> bool,
{
    loop {
        if !pending(&*guard) {
            return Ok(true);
        }

        match deadline {
            None => guard = condvar.wait(guard)?,
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(false);
                }
                guard = condvar.wait_timeout(guard, deadline - now)?.0;
            }
        }
    }
}
