use {
    super::wait_while,
    crate::{
        sync::{Condvar, Mutex},
        EventError,
    },
    std::{sync::PoisonError, time::Instant},
};

/// Wake-up target shared by every event a composite wait is registered with.
///
/// Each notification bumps the epoch, so a waiter that read the epoch before
/// scanning its events cannot miss a notification delivered after the scan.
pub(crate) struct Notifier {
    epoch: Mutex<u64>,
    condvar: Condvar,
}

impl Notifier {
    pub(crate) fn new() -> Notifier {
        Notifier {
            epoch: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn epoch(&self) -> Result<u64, EventError> {
        Ok(*self.epoch.lock()?)
    }

    /// Called by a signaling event while it holds its own state lock.
    ///
    /// A poisoned epoch belongs to the waiting thread, which reports it itself;
    /// the signaling thread must not fail because of it.
    pub(crate) fn notify(&self) {
        let mut epoch = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        *epoch = epoch.wrapping_add(1);
        self.condvar.notify_all();
    }

    /// Blocks until the epoch moves past `seen` or `deadline` passes.
    /// Returns `false` on timeout.
    pub(crate) fn wait(&self, seen: u64, deadline: Option<Instant>) -> Result<bool, EventError> {
        let epoch = self.epoch.lock()?;
        wait_while(&self.condvar, epoch, deadline, |epoch| *epoch == seen)
    }
}
