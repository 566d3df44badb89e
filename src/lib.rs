//! Portable manual-reset events and composite waits over several of them.
//!
//! An [`Event`] is a waitable boolean: [`set`] releases every waiting thread and keeps
//! the event signaled until [`reset`] is called.
//! [`wait_all`] / [`wait_any`] block the thread until all / one of a set of events
//! is signaled, the way [`Wait Functions`](https://docs.microsoft.com/en-us/windows/win32/sync/wait-functions)
//! do on Windows, without any limit on the number of events.
//!
//! Implemented on top of a mutex and condition variable, so it works on every platform `std` does.
//! Build with `RUSTFLAGS="--cfg loom"` to run the model checked tests.
//!
//! [`set`]: struct.Event.html#method.set
//! [`reset`]: struct.Event.html#method.reset

mod sync;

pub mod event;
pub mod waitable;

pub use crate::event::{Event, EventError};

pub use crate::waitable::{wait_all, wait_any, Waitable, WaitableResult};
