//! Sharding layer: planning, bulk sources and the sharded index
//!
//! A vocabulary is partitioned by first symbol across N independent trie
//! engines. The planner balances symbol groups across shards from a one-pass
//! histogram; the sharded index routes inserts and queries and drives the
//! parallel bulk load.

pub mod planner;
pub mod sharded;
pub mod source;

// Re-export core types
pub use planner::{ShardPlan, ShardPlanner, ShardPlannerConfig, SymbolHistogram};
pub use sharded::{LoadStats, ShardedIndex, ShardedIndexConfig};
pub use source::{LineSource, LineSourceConfig};
