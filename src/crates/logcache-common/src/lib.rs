//! Common types and utilities shared across the log cache crates.
//!
//! This crate provides the foundational vocabulary used by the registry, the
//! per-file cache and the query engine: timestamps, log classes and the
//! collection aliases, so that none of the higher crates depend on each
//! other just to agree on a type.

pub mod class;
pub mod collections;
pub mod time;

pub use class::{ClassMask, LogClass, ParseClassError};
pub use time::Seconds;

// Re-export collection types for convenience
pub use collections::HashSet;
