use {
    super::{deadline_after, Notifier},
    crate::{event::Registration, sync::Arc, Event, EventError},
    std::{
        borrow::Borrow,
        time::{Duration, Instant},
    },
};

/// Blocks the thread until every event in `events` has been observed signaled,
/// or until `timeout` expires.
///
/// Each event only needs to be observed signaled once during the call: an event that is
/// [`reset`] after being observed still counts. `None` waits indefinitely, `Some(Duration::ZERO)`
/// polls once.
///
/// Returns `Ok(true)` if all events were observed signaled, `Ok(false)` on timeout.
/// An empty `events` slice is trivially satisfied.
///
/// # Errors
///
/// Returns [`EventError::Poisoned`] if the state of one of the events was poisoned.
///
/// [`reset`]: struct.Event.html#method.reset
pub fn wait_all<E: Borrow<Event>>(
    events: &[E],
    timeout: Option<Duration>,
) -> Result<bool, EventError> {
    if events.is_empty() {
        return Ok(true);
    }

    let mut observed = vec![false; events.len()];

    let result = wait_composite(events, timeout, |registrations| {
        for (registration, observed) in registrations.iter().zip(observed.iter_mut()) {
            if !*observed {
                *observed = registration.observe()?;
            }
        }

        Ok(observed.iter().all(|observed| *observed).then_some(()))
    })?;

    Ok(result.is_some())
}

/// Blocks the thread until at least one event in `events` is observed signaled,
/// or until `timeout` expires.
///
/// `None` waits indefinitely, `Some(Duration::ZERO)` polls once.
///
/// Returns the lowest index among the events observed signaled in the same pass,
/// or `Ok(None)` on timeout.
///
/// # Errors
///
/// Returns [`EventError::InvalidArgument`] if `events` is empty.
/// Returns [`EventError::Poisoned`] if the state of one of the events was poisoned.
pub fn wait_any<E: Borrow<Event>>(
    events: &[E],
    timeout: Option<Duration>,
) -> Result<Option<usize>, EventError> {
    if events.is_empty() {
        log::debug!("wait_any called with no events");
        return Err(EventError::InvalidArgument);
    }

    wait_composite(events, timeout, |registrations| {
        for (idx, registration) in registrations.iter().enumerate() {
            if registration.observe()? {
                return Ok(Some(idx));
            }
        }

        Ok(None)
    })
}

/// Registers one notifier with every event, then alternates between `scan` and
/// blocking on the notifier until `scan` is satisfied or the deadline passes.
///
/// The epoch is read before each scan, so a `set` landing after the scan wakes the
/// notifier wait immediately. Once the deadline has passed no further scan is made, so a
/// zero timeout is exactly one pass. Registrations are dropped, and thus detached from
/// their events, on every return path.
fn wait_composite<E, T, F>(
    events: &[E],
    timeout: Option<Duration>,
    mut scan: F,
) -> Result<Option<T>, EventError>
where
    E: Borrow<Event>,
    F: FnMut(&[Registration<'_>]) -> Result<Option<T>, EventError>,
{
    let deadline = deadline_after(timeout);
    let notifier = Arc::new(Notifier::new());

    let registrations = events
        .iter()
        .map(|event| event.borrow().register(&notifier))
        .collect::<Result<Vec<_>, _>>()?;

    log::trace!("composite wait registered with {} events", registrations.len());

    loop {
        let seen = notifier.epoch()?;

        if let Some(result) = scan(&registrations)? {
            log::trace!(
                "composite wait satisfied, detaching from {} events",
                registrations.len()
            );
            return Ok(Some(result));
        }

        let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);

        if expired || !notifier.wait(seen, deadline)? {
            log::trace!(
                "composite wait on {} events timed out",
                registrations.len()
            );
            return Ok(None);
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use {
        super::*,
        std::{
            thread,
            time::{Duration, Instant},
        },
    };

    const TIMEOUT: Duration = Duration::from_secs(10);

    /// Spins until `count` composite waits are registered with `event`.
    fn wait_for_waiters(event: &Event, count: usize) {
        let deadline = Instant::now() + TIMEOUT;
        while event.waiter_count() < count {
            assert!(Instant::now() < deadline, "waiters never registered");
            thread::yield_now();
        }
    }

    fn unsignaled(count: usize) -> Arc<Vec<Event>> {
        Arc::new((0..count).map(|_| Event::new(false)).collect())
    }

    #[test]
    fn wait_all_sets_in_order() {
        let events = unsignaled(10);
        let events_clone = events.clone();

        let t = thread::spawn(move || wait_all(&events_clone, None).unwrap());

        for event in events.iter() {
            assert!(!t.is_finished());
            event.set().unwrap();
        }

        assert!(t.join().unwrap());
        assert!(wait_all(&events, Some(Duration::ZERO)).unwrap());

        for event in events.iter() {
            assert_eq!(event.waiter_count(), 0);
        }
    }

    #[test]
    fn wait_any_reports_signaled_index() {
        let events = unsignaled(10);
        let events_clone = events.clone();

        let t = thread::spawn(move || wait_any(&events_clone, None).unwrap());

        events[5].set().unwrap();

        assert_eq!(t.join().unwrap(), Some(5));
        assert_eq!(wait_any(&events, Some(Duration::ZERO)).unwrap(), Some(5));

        for event in events.iter() {
            assert_eq!(event.waiter_count(), 0);
        }
    }

    #[test]
    fn wait_any_prefers_lowest_index() {
        let events = unsignaled(4);
        events[3].set().unwrap();
        events[1].set().unwrap();

        assert_eq!(wait_any(&events, Some(Duration::ZERO)).unwrap(), Some(1));
        assert_eq!(wait_any(&events, None).unwrap(), Some(1));
    }

    #[test]
    fn empty_sets() {
        let events: [Event; 0] = [];

        assert!(wait_all(&events, None).unwrap());
        assert!(wait_all(&events, Some(Duration::ZERO)).unwrap());
        assert_eq!(
            wait_any(&events, Some(Duration::ZERO)),
            Err(EventError::InvalidArgument)
        );
        assert_eq!(wait_any(&events, None), Err(EventError::InvalidArgument));
    }

    #[test]
    fn zero_timeout_polls_once() {
        let e0 = Event::new(true);
        let e1 = Event::new(false);
        let w = [&e0, &e1];

        assert!(!wait_all(&w, Some(Duration::ZERO)).unwrap());
        assert_eq!(wait_any(&w, Some(Duration::ZERO)).unwrap(), Some(0));

        e0.reset().unwrap();
        assert_eq!(wait_any(&w, Some(Duration::ZERO)).unwrap(), None);

        e1.set().unwrap();
        assert_eq!(wait_any(&w, Some(Duration::ZERO)).unwrap(), Some(1));

        e0.set().unwrap();
        assert!(wait_all(&w, Some(Duration::ZERO)).unwrap());

        assert_eq!(e0.waiter_count(), 0);
        assert_eq!(e1.waiter_count(), 0);
    }

    #[test]
    fn zero_timeout_scans_once_despite_concurrent_set() {
        let events = unsignaled(2);
        let mut passes = 0;

        let result = wait_composite(&events, Some(Duration::ZERO), |registrations| {
            passes += 1;
            // Lands after the epoch was read, as a set racing the scan would.
            events[1].set()?;
            Ok(registrations[0].observe()?.then_some(()))
        })
        .unwrap();

        assert_eq!(result, None);
        assert_eq!(passes, 1);
        assert_eq!(events[1].waiter_count(), 0);
    }

    #[test]
    fn timeouts_detach_from_events() {
        let events = unsignaled(3);
        events[0].set().unwrap();

        let now = Instant::now();
        assert!(!wait_all(&events, Some(Duration::from_millis(50))).unwrap());
        assert!(now.elapsed() >= Duration::from_millis(50));

        events[0].reset().unwrap();

        let now = Instant::now();
        assert_eq!(
            wait_any(&events, Some(Duration::from_millis(50))).unwrap(),
            None
        );
        assert!(now.elapsed() >= Duration::from_millis(50));

        for event in events.iter() {
            assert_eq!(event.waiter_count(), 0);
        }
    }

    #[test]
    fn wait_all_tolerates_reset_after_observation() {
        let events = unsignaled(2);
        let events_clone = events.clone();

        let t = thread::spawn(move || wait_all(&events_clone, Some(TIMEOUT)).unwrap());

        wait_for_waiters(&events[1], 1);

        events[0].set().unwrap();
        events[0].reset().unwrap();
        events[1].set().unwrap();

        assert!(t.join().unwrap());
    }

    #[test]
    fn set_then_reset_releases_registered_wait_any() {
        let events = unsignaled(3);
        let events_clone = events.clone();

        let t = thread::spawn(move || wait_any(&events_clone, Some(TIMEOUT)).unwrap());

        wait_for_waiters(&events[2], 1);

        events[2].set().unwrap();
        events[2].reset().unwrap();

        assert_eq!(t.join().unwrap(), Some(2));
        assert_eq!(wait_any(&events, Some(Duration::ZERO)).unwrap(), None);
    }

    #[test]
    fn set_then_reset_releases_registered_wait_all() {
        let events = unsignaled(3);
        events[0].set().unwrap();
        events[1].set().unwrap();
        let events_clone = events.clone();

        let t = thread::spawn(move || wait_all(&events_clone, Some(TIMEOUT)).unwrap());

        wait_for_waiters(&events[2], 1);

        events[2].set().unwrap();
        events[2].reset().unwrap();

        assert!(t.join().unwrap());
        assert!(!wait_all(&events, Some(Duration::ZERO)).unwrap());
    }

    #[test]
    fn overlapping_composite_waits() {
        let events = unsignaled(3);

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let events = events.clone();
                thread::spawn(move || {
                    let any = wait_any(&events[1..], Some(TIMEOUT)).unwrap();
                    let all = wait_all(&events, Some(TIMEOUT)).unwrap();
                    (any, all)
                })
            })
            .collect();

        wait_for_waiters(&events[2], 4);

        events[2].set().unwrap();
        events[0].set().unwrap();
        events[1].set().unwrap();

        for waiter in waiters {
            let (any, all) = waiter.join().unwrap();
            assert!(any == Some(0) || any == Some(1));
            assert!(all);
        }

        for event in events.iter() {
            assert_eq!(event.waiter_count(), 0);
        }
    }

    #[test]
    fn accepts_shared_events() {
        let events: Vec<Arc<Event>> = (0..3).map(|_| Arc::new(Event::new(false))).collect();
        let event = events[2].clone();

        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            event.set().unwrap();
        });

        assert_eq!(wait_any(&events, None).unwrap(), Some(2));
        t.join().unwrap();
    }
}
