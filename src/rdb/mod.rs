//! Minimal RDB snapshot support: a reader sufficient to preload
//! string-typed keys (with optional expiry) at startup, and the
//! empty-snapshot payload a master ships during a full resync.

mod length;
mod reader;

pub use reader::{empty_snapshot, load_snapshot, parse_snapshot, RdbError};
