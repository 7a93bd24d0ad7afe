//! Sharded index: routing plus parallel bulk load
//!
//! The index owns N independent trie engines and the shard plan that says
//! which engine(s) may hold words starting with each symbol. During bulk
//! load one worker thread drains a private bounded queue into each engine
//! while a single reader routes records; a full queue blocks the reader
//! (backpressure) and a closed queue is drained to the last item before its
//! worker exits, so nothing is lost on shutdown. No engine is shared between
//! threads, so the engines themselves need no synchronization; once loading
//! finishes the whole index is read-only and safe for concurrent queries.

use std::borrow::Cow;
use std::thread;

use ahash::AHashMap;
use crossbeam_channel::bounded;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardtrieError};
use crate::fsa::symbol::{self, Symbol};
use crate::fsa::{DoubleArrayTrie, PrefixSearch, StatisticsProvider, Trie, TrieStats};
use crate::index::planner::ShardPlan;

/// Configuration for [`ShardedIndex`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardedIndexConfig {
    /// Bounded queue capacity per shard during parallel load
    pub queue_capacity: usize,
}

impl Default for ShardedIndexConfig {
    fn default() -> Self {
        Self { queue_capacity: 1024 }
    }
}

/// Counters from one bulk load
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoadStats {
    /// Records routed to a shard queue
    pub routed: u64,
    /// Words newly inserted
    pub inserted: u64,
    /// Records that were already present in their shard
    pub duplicates: u64,
    /// Records whose insert failed (logged, load continued)
    pub insert_failures: u64,
    /// Unreadable records skipped by the reader (logged)
    pub read_errors: u64,
}

/// Rolling position within a symbol's assigned shard list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct RouteCursor {
    position: usize,
    routed: u64,
}

/// N independent trie engines behind first-symbol routing
#[derive(Debug, Serialize, Deserialize)]
pub struct ShardedIndex<T = DoubleArrayTrie> {
    shards: Vec<T>,
    plan: ShardPlan,
    cursors: AHashMap<Symbol, RouteCursor>,
    config: ShardedIndexConfig,
}

impl<T: Trie + PrefixSearch> ShardedIndex<T> {
    /// Build an index over engines produced by `factory`, one per planned
    /// shard. The factory receives the shard id.
    pub fn from_plan_with<F>(plan: ShardPlan, config: ShardedIndexConfig, factory: F) -> Self
    where
        F: FnMut(usize) -> T,
    {
        let shards = (0..plan.num_shards()).map(factory).collect();
        Self {
            shards,
            plan,
            cursors: AHashMap::new(),
            config,
        }
    }

    /// Build an index of default-constructed engines
    pub fn from_plan(plan: ShardPlan) -> Self
    where
        T: Default,
    {
        Self::from_plan_with(plan, ShardedIndexConfig::default(), |_| T::default())
    }

    /// Number of shards
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// The shard plan in force
    pub fn plan(&self) -> &ShardPlan {
        &self.plan
    }

    /// Borrow one shard engine
    pub fn shard(&self, id: usize) -> Option<&T> {
        self.shards.get(id)
    }

    /// Word count per shard
    pub fn shard_sizes(&self) -> Vec<usize> {
        self.shards.iter().map(|s| s.len()).collect()
    }

    /// Shards that may hold words starting with `sym`
    fn query_shards(&self, sym: Symbol) -> Cow<'_, [usize]> {
        match self.plan.shards_for(sym) {
            Some(ids) if !ids.is_empty() => Cow::Borrowed(ids),
            _ => Cow::Owned(vec![self.plan.fallback_shard(sym)]),
        }
    }

    /// Pick the shard the next entry starting with `sym` should land on,
    /// advancing the symbol's rolling cursor once a full span has been
    /// routed to the current shard.
    fn route_next(
        plan: &ShardPlan,
        cursors: &mut AHashMap<Symbol, RouteCursor>,
        sym: Symbol,
    ) -> usize {
        match plan.shards_for(sym) {
            Some(ids) if !ids.is_empty() => {
                if ids.len() == 1 {
                    return ids[0];
                }
                let cursor = cursors.entry(sym).or_default();
                let id = ids[cursor.position % ids.len()];
                cursor.routed += 1;
                if cursor.routed >= plan.avg_size() {
                    cursor.routed = 0;
                    cursor.position = (cursor.position + 1) % ids.len();
                }
                id
            }
            _ => plan.fallback_shard(sym),
        }
    }

    /// Load a record stream sequentially (single thread, same routing as
    /// the parallel path)
    pub fn load<I>(&mut self, records: I) -> Result<LoadStats>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let mut stats = LoadStats::default();
        for item in records {
            match item {
                Ok(word) => {
                    stats.routed += 1;
                    match self.insert(&word) {
                        Ok(true) => stats.inserted += 1,
                        Ok(false) => stats.duplicates += 1,
                        Err(e) => {
                            log::error!("failed to insert {:?}: {}", word, e);
                            stats.insert_failures += 1;
                        }
                    }
                }
                Err(e) => {
                    log::warn!("skipping unreadable record: {}", e);
                    stats.read_errors += 1;
                }
            }
        }
        Ok(stats)
    }
}

impl<T: Trie + PrefixSearch + Send> ShardedIndex<T> {
    /// Load a record stream with one worker thread per shard.
    ///
    /// The reader routes each record onto its shard's bounded queue and
    /// blocks while that queue is full. When the stream ends the queues are
    /// closed; every worker drains what remains before exiting. Per-record
    /// failures are logged and counted without stopping the other shards.
    /// If a worker panics the error propagates and the index is left empty.
    pub fn load_parallel<I>(&mut self, records: I) -> Result<LoadStats>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let num_shards = self.shards.len();
        let capacity = self.config.queue_capacity.max(1);
        let mut senders = Vec::with_capacity(num_shards);
        let mut receivers = Vec::with_capacity(num_shards);
        for _ in 0..num_shards {
            let (tx, rx) = bounded::<String>(capacity);
            senders.push(tx);
            receivers.push(rx);
        }

        let shards = std::mem::take(&mut self.shards);
        let plan = &self.plan;
        let cursors = &mut self.cursors;
        let mut stats = LoadStats::default();

        let loaded: Result<Vec<T>> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(num_shards);
            for (worker_id, (mut trie, rx)) in
                shards.into_iter().zip(receivers).enumerate()
            {
                handles.push(scope.spawn(move || {
                    let mut inserted = 0u64;
                    let mut duplicates = 0u64;
                    let mut failures = 0u64;
                    // recv keeps yielding queued items after the channel
                    // closes; the worker exits only once its queue is dry
                    while let Ok(word) = rx.recv() {
                        match trie.insert(&word) {
                            Ok(true) => inserted += 1,
                            Ok(false) => duplicates += 1,
                            Err(e) => {
                                log::error!(
                                    "shard {}: failed to insert {:?}: {}",
                                    worker_id,
                                    word,
                                    e
                                );
                                failures += 1;
                            }
                        }
                    }
                    (trie, inserted, duplicates, failures)
                }));
            }

            for item in records {
                match item {
                    Ok(word) => {
                        let shard = match symbol::first_symbol(&word) {
                            Some(sym) => Self::route_next(plan, cursors, sym),
                            None => 0,
                        };
                        stats.routed += 1;
                        if senders[shard].send(word).is_err() {
                            log::error!("shard {}: worker stopped accepting input", shard);
                            stats.insert_failures += 1;
                        }
                    }
                    Err(e) => {
                        log::warn!("skipping unreadable record: {}", e);
                        stats.read_errors += 1;
                    }
                }
            }
            drop(senders);

            let mut done = Vec::with_capacity(num_shards);
            for handle in handles {
                match handle.join() {
                    Ok((trie, inserted, duplicates, failures)) => {
                        stats.inserted += inserted;
                        stats.duplicates += duplicates;
                        stats.insert_failures += failures;
                        done.push(trie);
                    }
                    Err(_) => {
                        return Err(ShardtrieError::worker(
                            "shard worker panicked during bulk load",
                        ))
                    }
                }
            }
            Ok(done)
        });

        self.shards = loaded?;
        Ok(stats)
    }
}

impl<T: Trie + PrefixSearch> Trie for ShardedIndex<T> {
    fn insert(&mut self, word: &str) -> Result<bool> {
        let shard = match symbol::first_symbol(word) {
            Some(sym) => Self::route_next(&self.plan, &mut self.cursors, sym),
            None => 0,
        };
        self.shards[shard].insert(word)
    }

    fn remove(&mut self, word: &str) -> bool {
        let ids: Vec<usize> = match symbol::first_symbol(word) {
            Some(sym) => self.query_shards(sym).into_owned(),
            None => vec![0],
        };
        let mut removed = false;
        for id in ids {
            removed |= self.shards[id].remove(word);
        }
        removed
    }

    fn contains(&self, word: &str) -> bool {
        match symbol::first_symbol(word) {
            Some(sym) => self
                .query_shards(sym)
                .iter()
                .any(|&id| self.shards[id].contains(word)),
            None => self.shards[0].contains(word),
        }
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|s| s.len()).sum()
    }
}

impl<T: Trie + PrefixSearch> PrefixSearch for ShardedIndex<T> {
    fn match_prefix(&self, prefix: &str) -> Vec<String> {
        match symbol::first_symbol(prefix) {
            Some(sym) => {
                let mut out = Vec::new();
                for &id in self.query_shards(sym).iter() {
                    out.extend(self.shards[id].match_prefix(prefix));
                }
                out
            }
            None => {
                // the empty prefix matches every word in every shard
                let mut out = Vec::new();
                for shard in &self.shards {
                    out.extend(shard.match_prefix(prefix));
                }
                out
            }
        }
    }

    fn prefixes_of(&self, word: &str) -> Vec<String> {
        match symbol::first_symbol(word) {
            Some(sym) => {
                let ids = self.query_shards(sym);
                let mut out = Vec::new();
                // the empty word always lives in shard 0
                if !ids.contains(&0) && self.shards[0].contains("") {
                    out.push(String::new());
                }
                for &id in ids.iter() {
                    out.extend(self.shards[id].prefixes_of(word));
                }
                out
            }
            None => {
                if self.shards[0].contains("") {
                    vec![String::new()]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

impl<T: StatisticsProvider> StatisticsProvider for ShardedIndex<T> {
    fn stats(&self) -> TrieStats {
        let mut total = TrieStats::new();
        for shard in &self.shards {
            total.merge(&shard.stats());
        }
        total
    }
}

impl<T: Serialize> ShardedIndex<T> {
    /// Serialize the whole index into an opaque snapshot
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ShardtrieError::snapshot(format!("encode failed: {}", e)))
    }
}

impl<T: DeserializeOwned> ShardedIndex<T> {
    /// Restore an index from a snapshot produced by [`Self::to_bytes`]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| ShardtrieError::snapshot(format!("decode failed: {}", e)))
    }
}
