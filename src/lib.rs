//! bdz_table — static key/value table over a BDZ minimal perfect hash
//! (3-hypergraph peeling).
//!
//! - Build once on a set of **unique** keys with a sentinel `invalid_key`.
//! - O(1) lookups: three hashes, three g-values, one key comparison.
//! - `m = 3·m3 ≈ 1.23n` slots; no probing, no false positives.
//! - Hash providers are plain values ([`KeyHasher`], or any `Fn(&K) -> u64`);
//!   seeded XXH3/wyhash/aHash providers are the default.
//! - Bounded: the size search and re-seeding give up with an [`MphError`]
//!   instead of looping.
//!
//! ```
//! use bdz_table::MphTable;
//!
//! let table = MphTable::build([(1u64, "a"), (2, "b"), (3, "c")], 0)?;
//! assert_eq!(table.get(&2), Some(&"b"));
//! assert_eq!(table.get(&99), None);
//! # Ok::<(), bdz_table::MphError>(())
//! ```

mod assign;
mod bdz;
mod graph;
mod hash;
mod probe;

pub use bdz::{BuildConfig, Builder, MphError, MphTable};
pub use hash::{
    AKeyHasher, KeyHasher, SeededHasher, Triple, TripleHash, TripleHasher, WyKeyHasher,
    Xxh3KeyHasher,
};
