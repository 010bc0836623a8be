//! Collection type aliases.
//!
//! We use `rustc_hash::FxHashSet` for hash-based collections; keys are paths
//! and small integers, never attacker controlled.

pub type HashSet<T> = rustc_hash::FxHashSet<T>;
