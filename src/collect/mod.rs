//! Device status collection modules.
//!
//! Collectors read kernel-exposed attribute files (sysfs) and assemble typed
//! snapshot records. Every collector is synchronous and side-effect free.

pub mod mdraid;
