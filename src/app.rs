//! UI-side state: the latest store snapshot plus cursor, filter and prompt.
//!
//! Nothing here mutates the playlist; key handling turns intent into
//! actions and the store answers with a fresh snapshot.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
