use std::fmt;

/// Opaque handle returned by [`Dispatcher::register`](super::Dispatcher::register).
///
/// Only meaningful as a key into the dispatcher that issued it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DispatchToken(u64);

impl DispatchToken {
    pub(super) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}
