//! Core trie traits and abstractions
//!
//! The seams here let the sharding layer stay generic over the engine: a
//! shard is anything that implements [`Trie`] + [`PrefixSearch`], supplied
//! through an explicit factory rather than runtime type lookup.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Core membership operations of a word dictionary
pub trait Trie {
    /// Insert a word. Returns `true` if the word was not present before;
    /// re-inserting an existing word is a no-op.
    fn insert(&mut self, word: &str) -> Result<bool>;

    /// Remove a word. Returns `true` if the word was present; removing an
    /// absent word is a no-op.
    fn remove(&mut self, word: &str) -> bool;

    /// Check if a word is present
    fn contains(&self, word: &str) -> bool;

    /// Number of words stored
    fn len(&self) -> usize;

    /// Check if no words are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prefix-oriented queries over a word dictionary
pub trait PrefixSearch: Trie {
    /// All stored words that start with `prefix`
    fn match_prefix(&self, prefix: &str) -> Vec<String>;

    /// All stored words that are a prefix of `word`, including `word`
    /// itself when present
    fn prefixes_of(&self, word: &str) -> Vec<String>;

    /// Every stored word starting at some offset of `word`: the union of
    /// [`Self::prefixes_of`] over all suffixes of `word`
    fn sub_words(&self, word: &str) -> HashSet<String> {
        let mut out = HashSet::new();
        for (i, _) in word.char_indices() {
            for hit in self.prefixes_of(&word[i..]) {
                out.insert(hit);
            }
        }
        out
    }
}

/// Structure and memory statistics for a trie engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrieStats {
    /// Number of live states
    pub num_states: usize,
    /// Number of words stored
    pub num_words: usize,
    /// Total number of edges
    pub num_transitions: usize,
    /// Number of states holding a stored suffix
    pub num_tails: usize,
    /// Total symbols held in stored suffixes
    pub tail_symbols: usize,
    /// Approximate memory usage in bytes
    pub memory_usage: usize,
    /// Space efficiency (bits per word)
    pub bits_per_word: f64,
}

impl TrieStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive bits-per-word from memory usage and word count
    pub fn calculate_bits_per_word(&mut self) {
        if self.num_words > 0 {
            self.bits_per_word = (self.memory_usage * 8) as f64 / self.num_words as f64;
        }
    }

    /// Fold another stats record into this one (used for shard aggregates)
    pub fn merge(&mut self, other: &TrieStats) {
        self.num_states += other.num_states;
        self.num_words += other.num_words;
        self.num_transitions += other.num_transitions;
        self.num_tails += other.num_tails;
        self.tail_symbols += other.tail_symbols;
        self.memory_usage += other.memory_usage;
        self.calculate_bits_per_word();
    }
}

/// Trait for structures that provide performance statistics
pub trait StatisticsProvider {
    /// Get detailed statistics
    fn stats(&self) -> TrieStats;

    /// Get memory usage in bytes
    fn memory_usage(&self) -> usize {
        self.stats().memory_usage
    }
}
