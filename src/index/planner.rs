//! Shard planning: first-symbol histogram + greedy load-balanced assignment
//!
//! One pass over the (coalesced) bulk source counts how many distinct
//! entries start with each symbol. Symbols are then processed in descending
//! frequency order and cut into spans of roughly `ceil(total / N)` entries;
//! each span goes to the currently least-loaded shard. Hot first symbols
//! therefore split across several shards while cold ones pack together, and
//! no shard ends up more than one symbol group above the average.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardtrieError};
use crate::fsa::symbol::{self, Symbol};

/// Configuration for [`ShardPlanner`]
#[derive(Debug, Clone)]
pub struct ShardPlannerConfig {
    /// Number of shards to plan for
    pub num_shards: usize,
    /// A symbol group's remainder above a whole number of average-sized
    /// spans becomes its own span when it exceeds this many entries;
    /// otherwise it folds into the last span. `None` means half the
    /// average span size.
    pub residue_threshold: Option<u64>,
}

impl Default for ShardPlannerConfig {
    fn default() -> Self {
        Self {
            num_shards: num_cpus::get().max(1),
            residue_threshold: None,
        }
    }
}

/// Frequency of each first symbol across distinct entries
#[derive(Debug, Clone, Default)]
pub struct SymbolHistogram {
    counts: AHashMap<Symbol, u64>,
    total: u64,
}

impl SymbolHistogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one entry (empty entries carry no first symbol and are ignored)
    pub fn record(&mut self, word: &str) {
        if let Some(sym) = symbol::first_symbol(word) {
            *self.counts.entry(sym).or_insert(0) += 1;
            self.total += 1;
        }
    }

    /// Build a histogram from an in-memory sequence, coalescing consecutive
    /// duplicates the way the line source does
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hist = Self::new();
        let mut last: Option<String> = None;
        for word in words {
            let word = word.as_ref();
            if last.as_deref() == Some(word) {
                continue;
            }
            hist.record(word);
            last = Some(word.to_string());
        }
        hist
    }

    /// Total counted entries
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct first symbols seen
    pub fn distinct_symbols(&self) -> usize {
        self.counts.len()
    }

    /// Count for one symbol
    pub fn count(&self, sym: Symbol) -> u64 {
        self.counts.get(&sym).copied().unwrap_or(0)
    }

    fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }
}

/// Mapping from first symbol to the ordered shards that may own entries
/// starting with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardPlan {
    num_shards: usize,
    avg_size: u64,
    assignments: AHashMap<Symbol, Vec<usize>>,
}

impl ShardPlan {
    /// Number of shards this plan targets
    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    /// Planned span size: `ceil(total / num_shards)`
    pub fn avg_size(&self) -> u64 {
        self.avg_size
    }

    /// Ordered shard list for a planned symbol
    pub fn shards_for(&self, sym: Symbol) -> Option<&[usize]> {
        self.assignments.get(&sym).map(|v| v.as_slice())
    }

    /// Deterministic shard for a symbol the histogram never saw
    pub fn fallback_shard(&self, sym: Symbol) -> usize {
        log::warn!(
            "symbol {:#06x} missing from shard plan, routing by modulo",
            sym
        );
        sym as usize % self.num_shards
    }

    /// Build a trivial plan assigning every symbol by modulo. Useful when no
    /// bulk pass is available.
    pub fn modulo(num_shards: usize) -> Result<Self> {
        if num_shards == 0 {
            return Err(ShardtrieError::configuration("shard count must be at least 1"));
        }
        Ok(Self {
            num_shards,
            avg_size: 1,
            assignments: AHashMap::new(),
        })
    }
}

/// Builds [`ShardPlan`]s from histograms or record streams
#[derive(Debug, Clone, Default)]
pub struct ShardPlanner {
    config: ShardPlannerConfig,
}

impl ShardPlanner {
    /// Create a planner with the given configuration
    pub fn with_config(config: ShardPlannerConfig) -> Self {
        Self { config }
    }

    /// Create a planner targeting `num_shards` shards
    pub fn new(num_shards: usize) -> Self {
        Self::with_config(ShardPlannerConfig {
            num_shards,
            ..ShardPlannerConfig::default()
        })
    }

    /// Plan shard assignments from a finished histogram
    pub fn plan(&self, hist: &SymbolHistogram) -> Result<ShardPlan> {
        let n = self.config.num_shards;
        if n == 0 {
            return Err(ShardtrieError::configuration("shard count must be at least 1"));
        }
        let total = hist.total();
        let avg = if total == 0 { 1 } else { total.div_ceil(n as u64) };
        let threshold = self.config.residue_threshold.unwrap_or(avg / 2);

        // hottest symbols first; symbol code breaks ties so plans are stable
        let mut symbols: Vec<(Symbol, u64)> = hist.iter().collect();
        symbols.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut heap: BinaryHeap<Reverse<(u64, usize)>> =
            (0..n).map(|id| Reverse((0, id))).collect();
        let mut assignments: AHashMap<Symbol, Vec<usize>> =
            AHashMap::with_capacity(symbols.len());

        for (sym, count) in symbols {
            let full = count / avg;
            let rem = count % avg;
            let spans = if full == 0 {
                1
            } else if rem > threshold {
                full + 1
            } else {
                full
            };
            let span_count = spans as usize;

            let mut ids = Vec::with_capacity(span_count);
            for span in 0..span_count {
                let size = if span + 1 < span_count {
                    avg
                } else {
                    count - avg * (span_count as u64 - 1)
                };
                if let Some(Reverse((load, id))) = heap.pop() {
                    ids.push(id);
                    heap.push(Reverse((load + size, id)));
                }
            }
            assignments.insert(sym, ids);
        }

        Ok(ShardPlan {
            num_shards: n,
            avg_size: avg,
            assignments,
        })
    }

    /// Histogram a record stream (already coalesced by the source) and plan
    /// from it. Unreadable records are logged and skipped.
    pub fn plan_records<I>(&self, records: I) -> Result<ShardPlan>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let mut hist = SymbolHistogram::new();
        for item in records {
            match item {
                Ok(word) => hist.record(&word),
                Err(e) => log::warn!("skipping unreadable record during planning: {}", e),
            }
        }
        self.plan(&hist)
    }
}
