use std::{
    error::Error,
    fmt::{Display, Formatter},
    sync::PoisonError,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventError {
    /// An empty set of events was passed where at least one is required.
    InvalidArgument,
    /// An internal lock was poisoned by a panic inside a critical section.
    Poisoned,
}

impl Error for EventError {}

impl Display for EventError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        use EventError::*;

        match self {
            InvalidArgument => "at least one event is required to wait on".fmt(f),
            Poisoned => "the event state was poisoned by a panicked thread".fmt(f),
        }
    }
}

impl<T> From<PoisonError<T>> for EventError {
    fn from(_: PoisonError<T>) -> Self {
        log::error!("event guard poisoned");
        EventError::Poisoned
    }
}
