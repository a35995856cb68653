//! Separate-chaining hash table whose bucket count walks a fixed ladder
//! of capacities as the load factor crosses configured thresholds.

#[cfg(test)]
#[macro_use]
mod macros;

pub mod chain;
pub mod hashmap;

pub use chain::{Chain, Entry, InsertOutcome};
pub use hashmap::{
    CapacityLadder, ChainedHashMap, ConfigError, DefaultBuildHasher, TableConfig, bucket_index,
};
