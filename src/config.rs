//! Configuration loader and schema types.
//!
//! Settings come from an optional TOML file plus `MIXTAPE__` environment
//! overrides; anything not given keeps its default.

mod load;
mod schema;

pub use load::{default_config_path, default_state_dir, resolve_config_path};
pub use schema::*;

#[cfg(test)]
mod tests;
