use thiserror::Error;

use super::token::DispatchToken;

/// Misuse of the dispatcher. These are programming errors: the offending call
/// is aborted and the error is handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("cannot dispatch in the middle of a dispatch")]
    ReentrantDispatch,
    #[error("`{0}` does not map to a registered handler")]
    UnknownToken(DispatchToken),
    #[error("circular dependency detected while waiting for `{0}`")]
    CircularWait(DispatchToken),
    #[error("wait_for must be invoked while dispatching")]
    NotDispatching,
    /// A handler failed for its own reasons.
    #[error("handler failed: {0}")]
    Handler(String),
}
