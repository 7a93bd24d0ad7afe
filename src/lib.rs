//! # Shardtrie: Sharded Double-Array Trie with Tail Compression
//!
//! This crate provides a compact, mutable trie for large vocabularies plus a
//! layer that shards the vocabulary across N independent trie instances for
//! parallel bulk construction and bounded per-shard size.
//!
//! ## Key Features
//!
//! - **Double-array core**: O(1) transitions via `base`/`check` arithmetic
//!   inside a tagged-slot cell arena with an explicit free list
//! - **Tail compression**: unbranching word endings stored as literal
//!   suffixes instead of one state per symbol
//! - **Full mutability**: deletion prunes and re-compresses; insertion
//!   splits stored suffixes on divergence and relocates on collisions
//! - **Prefix queries**: iterative (explicit-stack) enumeration of words
//!   under a prefix, prefix-of lookups, and sub-word extraction
//! - **Sharding**: one-pass histogram planning, greedy load balancing,
//!   first-symbol routing, and thread-per-shard bulk loading over bounded
//!   queues
//! - **Snapshots**: opaque serialized form restoring query-identical state
//!
//! ## Quick Start
//!
//! ```rust
//! use shardtrie::{DoubleArrayTrie, PrefixSearch, Trie};
//!
//! let mut trie = DoubleArrayTrie::new();
//! trie.insert("he").unwrap();
//! trie.insert("she").unwrap();
//! trie.insert("hers").unwrap();
//!
//! assert!(trie.contains("she"));
//! assert_eq!(trie.prefixes_of("hers"), vec!["he", "hers"]);
//!
//! let sub = trie.sub_words("ushers");
//! assert!(sub.contains("she"));
//! ```
//!
//! Sharded construction routes by first symbol:
//!
//! ```rust
//! use shardtrie::{ShardPlanner, ShardedIndex, SymbolHistogram, Trie};
//!
//! let words = ["apple", "banana", "cherry"];
//! let hist = SymbolHistogram::from_words(words);
//! let plan = ShardPlanner::new(2).plan(&hist).unwrap();
//!
//! let mut index: ShardedIndex = ShardedIndex::from_plan(plan);
//! let records = words.iter().map(|w| Ok(w.to_string()));
//! index.load_parallel(records).unwrap();
//! assert!(index.contains("banana"));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod fsa;
pub mod index;

// Re-export core types
pub use error::{Result, ShardtrieError};
pub use fsa::{
    DoubleArrayTrie, DoubleArrayTrieConfig, PrefixIter, PrefixSearch, StatisticsProvider, Symbol,
    Trie, TrieStats,
};
pub use index::{
    LineSource, LineSourceConfig, LoadStats, ShardPlan, ShardPlanner, ShardPlannerConfig,
    ShardedIndex, ShardedIndexConfig, SymbolHistogram,
};

/// State identifier type: an index into a trie's cell arena
pub type StateId = u32;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library (currently no-op, for future use)
pub fn init() {
    log::debug!("Initializing shardtrie v{}", VERSION);
}
