use {
    crate::{
        sync::{Arc, Condvar, Mutex},
        waitable::{deadline_after, wait_while, Notifier},
        EventError, Waitable, WaitableResult,
    },
    std::{
        fmt::{self, Debug, Formatter},
        sync::PoisonError,
        time::Duration,
    },
};

struct State {
    signaled: bool,
    /// Bumped on every unsignaled -> signaled transition.
    generation: u64,
    next_token: u64,
    /// Composite waits currently registered with this event.
    waiters: Vec<(u64, Arc<Notifier>)>,
}

/// Manual reset event.
///
/// Stays set / signaled when [`set`] is called, releasing all current and future waiters,
/// until [`reset`] is called on it.
///
/// A thread already blocked in [`wait_one`] when the event is [`set`] is always released,
/// even if the event is [`reset`] again before that thread gets to run.
///
/// The event may be shared between threads by reference or through an `Arc`.
/// It must not be dropped while other threads are waiting on it, which the borrow checker
/// enforces for all safe code.
///
/// [`set`]: #method.set
/// [`reset`]: #method.reset
/// [`wait_one`]: #method.wait_one
pub struct Event {
    state: Mutex<State>,
    condvar: Condvar,
}

impl Event {
    /// Creates a new manual reset event.
    ///
    /// `set` - gives the initial state of the event.
    pub fn new(set: bool) -> Event {
        Event {
            state: Mutex::new(State {
                signaled: set,
                generation: 0,
                next_token: 0,
                waiters: Vec::new(),
            }),
            condvar: Condvar::new(),
        }
    }

    /// Sets / signals the event.
    ///
    /// Wakes up every thread blocked in [`wait_one`] and every composite wait registered
    /// with the event. The event stays signaled until it is [`reset`].
    /// Setting an already signaled event does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the event state was poisoned.
    ///
    /// [`wait_one`]: #method.wait_one
    /// [`reset`]: #method.reset
    pub fn set(&self) -> Result<(), EventError> {
        let mut state = self.state.lock()?;

        if state.signaled {
            return Ok(());
        }

        state.signaled = true;
        state.generation = state.generation.wrapping_add(1);

        self.condvar.notify_all();

        for (_, notifier) in state.waiters.iter() {
            notifier.notify();
        }

        Ok(())
    }

    /// Resets the event. Never wakes anyone up.
    ///
    /// # Errors
    ///
    /// Returns an error if the event state was poisoned.
    pub fn reset(&self) -> Result<(), EventError> {
        self.state.lock()?.signaled = false;
        Ok(())
    }

    /// Returns the current state of the event without blocking.
    pub fn is_set(&self) -> Result<bool, EventError> {
        Ok(self.state.lock()?.signaled)
    }

    /// Blocks the thread until the event is [`set`] or `timeout` expires.
    ///
    /// `None` waits indefinitely, `Some(Duration::ZERO)` polls once without blocking.
    ///
    /// Returns `Ok(true)` if the event was observed signaled, `Ok(false)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the event state was poisoned.
    ///
    /// [`set`]: #method.set
    pub fn wait_one(&self, timeout: Option<Duration>) -> Result<bool, EventError> {
        let deadline = deadline_after(timeout);
        let state = self.state.lock()?;

        if state.signaled {
            return Ok(true);
        }

        let generation = state.generation;

        let signaled = wait_while(&self.condvar, state, deadline, |state| {
            !state.signaled && state.generation == generation
        })?;

        if !signaled {
            log::trace!("event wait timed out after {:?}", timeout);
        }

        Ok(signaled)
    }

    /// Adds `notifier` to the set of composite waiters woken up by [`set`].
    ///
    /// The returned registration remembers the generation at registration time,
    /// so a `set` followed by a `reset` after this call is still observed.
    ///
    /// [`set`]: #method.set
    pub(crate) fn register(
        &self,
        notifier: &Arc<Notifier>,
    ) -> Result<Registration<'_>, EventError> {
        let mut state = self.state.lock()?;

        let token = state.next_token;
        state.next_token = state.next_token.wrapping_add(1);
        state.waiters.push((token, notifier.clone()));

        Ok(Registration {
            event: self,
            token,
            generation: state.generation,
        })
    }

    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        self.state.lock().unwrap().waiters.len()
    }
}

impl Default for Event {
    fn default() -> Self {
        Event::new(false)
    }
}

impl Debug for Event {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut s = f.debug_struct("Event");

        match self.state.lock() {
            Ok(state) => s
                .field("signaled", &state.signaled)
                .field("generation", &state.generation)
                .field("waiters", &state.waiters.len()),
            Err(_) => s.field("state", &"<poisoned>"),
        };

        s.finish()
    }
}

impl Waitable for Event {
    /// Blocks the thread until the event is [`set`] or the duration `d` expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the event state was poisoned.
    ///
    /// [`set`]: struct.Event.html#method.set
    fn wait(&self, d: Duration) -> Result<WaitableResult, EventError> {
        self.wait_one(Some(d)).map(WaitableResult::from)
    }

    /// Blocks the thread until the event is [`set`].
    ///
    /// # Errors
    ///
    /// Returns an error if the event state was poisoned.
    ///
    /// [`set`]: struct.Event.html#method.set
    fn wait_infinite(&self) -> Result<(), EventError> {
        self.wait_one(None).map(|_| ())
    }
}

/// A composite wait's membership in one event's waiter set.
/// Detaches from the event when dropped.
pub(crate) struct Registration<'e> {
    event: &'e Event,
    token: u64,
    generation: u64,
}

impl Registration<'_> {
    /// Whether the event is signaled, or has been set at any point since registration.
    pub(crate) fn observe(&self) -> Result<bool, EventError> {
        let state = self.event.state.lock()?;
        Ok(state.signaled || state.generation != self.generation)
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut state = self
            .event
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(idx) = state
            .waiters
            .iter()
            .position(|(token, _)| *token == self.token)
        {
            state.waiters.swap_remove(idx);
        }
    }
}
