use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher, Hash};

use thiserror::Error;

mod hash_table;
mod ladder;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Capacity must be greater than zero")]
    ZeroCapacity,
    #[error("Capacity ladder has no steps")]
    EmptyLadder,
    #[error("The {which} load factor must be in (0, 1), got: {value}")]
    LoadFactorOutOfRange { which: &'static str, value: f32 },
    #[error("Upper load factor ({upper}) must be greater than the lower one ({lower})")]
    InvertedLoadFactors { upper: f32, lower: f32 },
    #[error("Initial capacity {initial} is not a step of the capacity ladder")]
    InitialCapacityNotInLadder { initial: usize },
}

/// The hasher a [`ChainedHashMap`] uses unless told otherwise.
///
/// Deterministic across runs, so bucket indices can be predicted
/// from outside the table with [`bucket_index`].
pub type DefaultBuildHasher = BuildHasherDefault<DefaultHasher>;

/// Maps `key` to a bucket of a table with `capacity` buckets.
///
/// This is the exact function every [`ChainedHashMap`] uses to place its
/// entries, `hash(key) mod capacity`.
///
/// # Panics
///
/// Panics if `capacity` is zero
pub fn bucket_index<Q, S>(hasher: &S, key: &Q, capacity: usize) -> usize
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    (hasher.hash_one(key) % capacity as u64) as usize
}

pub use hash_table::{ChainedHashMap, Iter, Keys};
pub use ladder::{CapacityLadder, TableConfig};
