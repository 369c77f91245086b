//! Cache module
//!
//! In-process TTL cache used for bearer token validation results.

pub mod in_memory;

pub use self::in_memory::TtlCache;
