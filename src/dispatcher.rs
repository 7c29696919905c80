//! Synchronous action broadcast with explicit ordering between handlers.
//!
//! Every dispatched payload reaches every registered handler exactly once.
//! A handler may call [`Dispatcher::wait_for`] to run other handlers first,
//! which is how stores that derive state from each other stay consistent.

mod broadcast;
mod error;
mod token;

pub use broadcast::Dispatcher;
pub use error::DispatchError;
pub use token::DispatchToken;
