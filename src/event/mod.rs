mod condvar;
mod error;

pub use condvar::Event;
pub use error::EventError;

pub(crate) use condvar::Registration;
