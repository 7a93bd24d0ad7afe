//! Mutable double-array trie with tail compression
//!
//! Two logical arrays drive transitions: for a state `s` and symbol `c`, the
//! child lives at `base[s] + c` and is valid when `check[base[s] + c] == s`.
//! Both live in the tagged-slot [`CellArena`], together with each state's
//! sorted child index (so enumerating edges never scans the alphabet) and an
//! optional stored suffix ("tail").
//!
//! Tail compression keeps unbranching word endings out of the state space: a
//! word's unshared remainder is stored verbatim on its last allocated state.
//! `Some(empty)` marks a word ending exactly on a branch state. A state with
//! a non-empty tail never has children; insertion splits the tail into
//! branch states the moment a second word diverges inside it.
//!
//! Deletion reverses insertion: clear the tail, prune childless tail-less
//! states up toward the root, then fold any now-unbranching chain below the
//! prune point back into a single stored suffix.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardtrieError};
use crate::fsa::cell_arena::{CellArena, Slot, HEAD, ROOT};
use crate::fsa::symbol::{self, Symbol};
use crate::fsa::traits::{PrefixSearch, StatisticsProvider, Trie, TrieStats};
use crate::StateId;

/// Configuration for a [`DoubleArrayTrie`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubleArrayTrieConfig {
    /// Initial arena capacity in cells
    pub initial_capacity: usize,
}

impl Default for DoubleArrayTrieConfig {
    fn default() -> Self {
        Self { initial_capacity: 256 }
    }
}

/// Mutable double-array trie over a bounded symbol space
#[derive(Clone, Serialize, Deserialize)]
pub struct DoubleArrayTrie {
    arena: CellArena,
    num_words: usize,
    config: DoubleArrayTrieConfig,
}

impl DoubleArrayTrie {
    /// Create an empty trie with default configuration
    pub fn new() -> Self {
        Self::with_config(DoubleArrayTrieConfig::default())
    }

    /// Create an empty trie with the given configuration
    pub fn with_config(config: DoubleArrayTrieConfig) -> Self {
        let mut arena = CellArena::with_capacity(config.initial_capacity.max(2));
        // the root is always live; its check points at itself
        if arena.allocate_at(ROOT).is_ok() {
            arena.cell_at_mut(ROOT).check = ROOT;
        }
        Self { arena, num_words: 0, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &DoubleArrayTrieConfig {
        &self.config
    }

    /// Current arena length in cells
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Follow the edge for `c` out of `state`, if one exists
    fn transition(&self, state: StateId, c: Symbol) -> Option<StateId> {
        let cell = self.arena.cell(state)?;
        if cell.base == 0 {
            return None;
        }
        let target = cell.base + c as StateId;
        match self.arena.cell(target) {
            Some(child) if child.check == state => Some(target),
            _ => None,
        }
    }

    /// Consume symbols from the root while live transitions exist.
    /// Returns the deepest state reached and how many symbols it consumed.
    fn walk(&self, syms: &[Symbol]) -> (StateId, usize) {
        let mut state = ROOT;
        let mut consumed = 0;
        while consumed < syms.len() {
            match self.transition(state, syms[consumed]) {
                Some(next) => {
                    state = next;
                    consumed += 1;
                }
                None => break,
            }
        }
        (state, consumed)
    }

    /// Ensure `state` has an edge for `c`, allocating (and relocating the
    /// sibling edges if the computed offset is taken) as needed.
    fn insert_branch(&mut self, state: StateId, c: Symbol) -> Result<StateId> {
        if let Some(existing) = self.transition(state, c) {
            return Ok(existing);
        }

        let (base, has_children) = {
            let cell = self.arena.cell_at(state);
            (cell.base, !cell.children.is_empty())
        };

        let child = if !has_children {
            let new_base = self.arena.search_slot(&[c])?;
            self.arena.cell_at_mut(state).base = new_base;
            let target = new_base + c as StateId;
            self.arena.allocate_at(target)?;
            target
        } else {
            let target = base + c as StateId;
            if (target as usize) >= self.arena.len() {
                self.arena.grow_to(target as usize + 1)?;
                self.arena.allocate_at(target)?;
                target
            } else if self.arena.is_free(target) {
                self.arena.allocate_at(target)?;
                target
            } else {
                // the computed cell belongs to another state: move every
                // edge of `state` to a base where the new symbol also fits
                let mut codes = self.arena.cell_at(state).children.clone();
                if let Err(pos) = codes.binary_search(&c) {
                    codes.insert(pos, c);
                }
                let new_base = self.arena.search_slot(&codes)?;
                self.arena.relocate(state, new_base)?;
                let target = new_base + c as StateId;
                self.arena.allocate_at(target)?;
                target
            }
        };

        self.arena.cell_at_mut(child).check = state;
        let cell = self.arena.cell_at_mut(state);
        if let Err(pos) = cell.children.binary_search(&c) {
            cell.children.insert(pos, c);
        }
        Ok(child)
    }

    /// Attach the remainder of a word below `state` as one edge plus a tail
    fn attach_leaf(&mut self, state: StateId, rest: &[Symbol]) -> Result<()> {
        let child = self.insert_branch(state, rest[0])?;
        self.arena.cell_at_mut(child).tail = Some(rest[1..].to_vec());
        Ok(())
    }

    /// Push a stored tail down into branch states until the new word and the
    /// old tail diverge, then terminate both sides.
    ///
    /// `rest` may be empty (the new word ends exactly at `state`); `old_tail`
    /// is non-empty and differs from `rest`.
    fn split_tail(&mut self, state: StateId, old_tail: &[Symbol], rest: &[Symbol]) -> Result<()> {
        self.arena.cell_at_mut(state).tail = None;
        let lcp = old_tail
            .iter()
            .zip(rest.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let mut cur = state;
        for &c in &old_tail[..lcp] {
            cur = self.insert_branch(cur, c)?;
        }
        let old_rest = &old_tail[lcp..];
        let new_rest = &rest[lcp..];
        if old_rest.is_empty() {
            self.arena.cell_at_mut(cur).tail = Some(Vec::new());
        } else {
            self.attach_leaf(cur, old_rest)?;
        }
        if new_rest.is_empty() {
            self.arena.cell_at_mut(cur).tail = Some(Vec::new());
        } else {
            self.attach_leaf(cur, new_rest)?;
        }
        Ok(())
    }

    /// Fold a single-child, tail-less chain below `top` back into one stored
    /// suffix on `top`, releasing the chain. No-op unless the chain bottoms
    /// out at a childless state; a branch point or a mid-path word end keeps
    /// its states.
    fn collapse(&mut self, top: StateId) {
        {
            let cell = self.arena.cell_at(top);
            if cell.tail.is_some() || cell.children.len() != 1 {
                return;
            }
        }
        let mut acc: Vec<Symbol> = Vec::new();
        let mut chain: Vec<StateId> = Vec::new();
        let mut walk = top;
        loop {
            let cell = self.arena.cell_at(walk);
            let c = cell.children[0];
            let child = cell.base + c as StateId;
            acc.push(c);
            chain.push(child);
            walk = child;
            let next = self.arena.cell_at(walk);
            if next.tail.is_some() || next.children.len() != 1 {
                break;
            }
        }
        {
            let stop = self.arena.cell_at(walk);
            if !stop.children.is_empty() {
                return;
            }
            if let Some(suffix) = &stop.tail {
                acc.extend_from_slice(suffix);
            }
        }
        for id in chain {
            self.arena.release(id);
        }
        let cell = self.arena.cell_at_mut(top);
        cell.children.clear();
        cell.base = 0;
        cell.tail = Some(acc);
    }

    /// Lazy iterator over every stored word starting with `prefix`
    pub fn iter_prefix(&self, prefix: &str) -> PrefixIter<'_> {
        PrefixIter::new(self, prefix)
    }

    /// Serialize the trie into an opaque snapshot
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ShardtrieError::snapshot(format!("encode failed: {}", e)))
    }

    /// Restore a trie from a snapshot produced by [`Self::to_bytes`]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| ShardtrieError::snapshot(format!("decode failed: {}", e)))
    }

    /// Verify structural soundness: every occupied state reachable from the
    /// root exactly once through the child indexes, check pointers matching,
    /// tail/children exclusivity, and the free list partitioning the arena
    /// with no overlap or leak.
    pub fn check_integrity(&self) -> Result<()> {
        let mut reached = vec![false; self.arena.len()];
        let mut queue = std::collections::VecDeque::new();
        reached[ROOT as usize] = true;
        queue.push_back(ROOT);
        let mut occupied_reached = 1usize;

        while let Some(state) = queue.pop_front() {
            let cell = self
                .arena
                .cell(state)
                .ok_or_else(|| ShardtrieError::trie(format!("state {} is not occupied", state)))?;
            if !cell.children.is_empty() && cell.base == 0 {
                return Err(ShardtrieError::trie(format!(
                    "state {} has children but no base",
                    state
                )));
            }
            if cell.children.is_empty() && cell.tail.is_none() && state != ROOT {
                return Err(ShardtrieError::trie(format!(
                    "state {} is neither a branch nor a word end",
                    state
                )));
            }
            if cell.tail.as_ref().is_some_and(|t| !t.is_empty()) && !cell.children.is_empty() {
                return Err(ShardtrieError::trie(format!(
                    "state {} holds a compressed suffix but also branches",
                    state
                )));
            }
            if cell.children.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ShardtrieError::trie(format!(
                    "state {} has an unsorted child index",
                    state
                )));
            }
            for &c in &cell.children {
                let child = cell.base + c as StateId;
                let child_cell = self.arena.cell(child).ok_or_else(|| {
                    ShardtrieError::trie(format!("edge {}+{} leads to a dead cell", state, c))
                })?;
                if child_cell.check != state {
                    return Err(ShardtrieError::trie(format!(
                        "cell {} is owned by {} but referenced from {}",
                        child, child_cell.check, state
                    )));
                }
                if reached[child as usize] {
                    return Err(ShardtrieError::trie(format!(
                        "state {} is reachable twice",
                        child
                    )));
                }
                reached[child as usize] = true;
                occupied_reached += 1;
                queue.push_back(child);
            }
        }

        let free = self.arena.free_list_ids()?;
        for &f in &free {
            if reached[f as usize] {
                return Err(ShardtrieError::trie(format!(
                    "cell {} is both reachable and on the free list",
                    f
                )));
            }
        }
        let occupied_total = self
            .arena
            .iter()
            .filter(|(id, slot)| *id != HEAD && matches!(slot, Slot::Occupied(_)))
            .count();
        if occupied_total != occupied_reached {
            return Err(ShardtrieError::trie(format!(
                "{} occupied cells but only {} reachable from the root",
                occupied_total, occupied_reached
            )));
        }
        if 1 + free.len() + occupied_total != self.arena.len() {
            return Err(ShardtrieError::trie("slot accounting mismatch"));
        }
        Ok(())
    }
}

impl Default for DoubleArrayTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DoubleArrayTrie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleArrayTrie")
            .field("num_words", &self.num_words)
            .field("capacity", &self.arena.len())
            .finish()
    }
}

impl Trie for DoubleArrayTrie {
    fn insert(&mut self, word: &str) -> Result<bool> {
        let syms = symbol::encode(word);
        let (state, consumed) = self.walk(&syms);
        let rest = &syms[consumed..];
        let tail = self.arena.cell_at(state).tail.clone();
        let inserted = match tail {
            Some(t) if !t.is_empty() => {
                if t.as_slice() == rest {
                    false
                } else {
                    self.split_tail(state, &t, rest)?;
                    true
                }
            }
            Some(_) => {
                if rest.is_empty() {
                    false
                } else {
                    self.attach_leaf(state, rest)?;
                    true
                }
            }
            None => {
                if rest.is_empty() {
                    self.arena.cell_at_mut(state).tail = Some(Vec::new());
                } else {
                    self.attach_leaf(state, rest)?;
                }
                true
            }
        };
        if inserted {
            self.num_words += 1;
        }
        Ok(inserted)
    }

    fn remove(&mut self, word: &str) -> bool {
        let syms = symbol::encode(word);
        let (state, consumed) = self.walk(&syms);
        let matched = match &self.arena.cell_at(state).tail {
            Some(t) => t.as_slice() == &syms[consumed..],
            None => false,
        };
        if !matched {
            return false;
        }
        self.arena.cell_at_mut(state).tail = None;
        self.num_words -= 1;

        // prune childless word-less states up toward the root
        let mut cur = state;
        while cur != ROOT {
            let (parent, sym) = {
                let cell = self.arena.cell_at(cur);
                if !cell.children.is_empty() || cell.tail.is_some() {
                    break;
                }
                let parent = cell.check;
                (parent, (cur - self.arena.cell_at(parent).base) as Symbol)
            };
            self.arena.release(cur);
            let pcell = self.arena.cell_at_mut(parent);
            if let Ok(pos) = pcell.children.binary_search(&sym) {
                pcell.children.remove(pos);
            }
            if pcell.children.is_empty() {
                pcell.base = 0;
            }
            cur = parent;
        }

        self.collapse(cur);
        true
    }

    fn contains(&self, word: &str) -> bool {
        let syms = symbol::encode(word);
        let (state, consumed) = self.walk(&syms);
        match &self.arena.cell_at(state).tail {
            Some(t) => t.as_slice() == &syms[consumed..],
            None => false,
        }
    }

    fn len(&self) -> usize {
        self.num_words
    }
}

impl PrefixSearch for DoubleArrayTrie {
    fn match_prefix(&self, prefix: &str) -> Vec<String> {
        self.iter_prefix(prefix).collect()
    }

    fn prefixes_of(&self, word: &str) -> Vec<String> {
        let syms = symbol::encode(word);
        let mut out = Vec::new();
        if matches!(&self.arena.cell_at(ROOT).tail, Some(t) if t.is_empty()) {
            out.push(String::new());
        }
        let mut state = ROOT;
        let mut consumed = 0;
        while consumed < syms.len() {
            match self.transition(state, syms[consumed]) {
                Some(next) => {
                    state = next;
                    consumed += 1;
                    if matches!(&self.arena.cell_at(state).tail, Some(t) if t.is_empty()) {
                        out.push(symbol::decode(&syms[..consumed]));
                    }
                }
                None => break,
            }
        }
        // a stored suffix only counts when the whole of it prefixes the
        // remaining probe; partial overlaps are not matches
        if let Some(t) = &self.arena.cell_at(state).tail {
            if !t.is_empty() && syms[consumed..].starts_with(t) {
                out.push(symbol::decode(&syms[..consumed + t.len()]));
            }
        }
        out
    }
}

impl StatisticsProvider for DoubleArrayTrie {
    fn stats(&self) -> TrieStats {
        let mut stats = TrieStats::new();
        stats.num_words = self.num_words;
        for (id, slot) in self.arena.iter() {
            if id == HEAD {
                continue;
            }
            if let Slot::Occupied(cell) = slot {
                stats.num_states += 1;
                stats.num_transitions += cell.children.len();
                if let Some(t) = &cell.tail {
                    stats.num_tails += 1;
                    stats.tail_symbols += t.len();
                }
            }
        }
        stats.memory_usage = self.arena.memory_usage();
        stats.calculate_bits_per_word();
        stats
    }
}

/// Iterator over all stored words with a given prefix.
///
/// Traversal is an explicit-stack depth-first walk; each frame holds the
/// state plus the symbols accumulated from the root, so no recursion is
/// involved and words materialize lazily on demand.
#[derive(Debug)]
pub struct PrefixIter<'a> {
    trie: &'a DoubleArrayTrie,
    stack: Vec<(StateId, Vec<Symbol>)>,
    pending: Option<String>,
}

impl<'a> PrefixIter<'a> {
    fn new(trie: &'a DoubleArrayTrie, prefix: &str) -> Self {
        let syms = symbol::encode(prefix);
        let (state, consumed) = trie.walk(&syms);
        let mut stack = Vec::new();
        let mut pending = None;
        if consumed == syms.len() {
            stack.push((state, syms));
        } else if let Some(t) = &trie.arena.cell_at(state).tail {
            // the prefix dives into a stored suffix: at most one word matches
            if t.starts_with(&syms[consumed..]) {
                let mut word = syms[..consumed].to_vec();
                word.extend_from_slice(t);
                pending = Some(symbol::decode(&word));
            }
        }
        Self { trie, stack, pending }
    }
}

impl Iterator for PrefixIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if let Some(word) = self.pending.take() {
            return Some(word);
        }
        while let Some((state, path)) = self.stack.pop() {
            let cell = self.trie.arena.cell_at(state);
            for &c in cell.children.iter().rev() {
                let mut child_path = path.clone();
                child_path.push(c);
                self.stack.push((cell.base + c as StateId, child_path));
            }
            if let Some(t) = &cell.tail {
                let mut word = path;
                word.extend_from_slice(t);
                return Some(symbol::decode(&word));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie_with(words: &[&str]) -> DoubleArrayTrie {
        let mut trie = DoubleArrayTrie::new();
        for w in words {
            trie.insert(w).unwrap();
        }
        trie.check_integrity().unwrap();
        trie
    }

    #[test]
    fn test_creation() {
        let trie = DoubleArrayTrie::new();
        assert_eq!(trie.len(), 0);
        assert!(trie.is_empty());
        trie.check_integrity().unwrap();
    }

    #[test]
    fn test_insert_and_contains() {
        let trie = trie_with(&["hello", "world", "help"]);
        assert_eq!(trie.len(), 3);
        assert!(trie.contains("hello"));
        assert!(trie.contains("world"));
        assert!(trie.contains("help"));
        assert!(!trie.contains("he"));
        assert!(!trie.contains("helper"));
        assert!(!trie.contains(""));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut trie = trie_with(&["duplicate"]);
        assert!(!trie.insert("duplicate").unwrap());
        assert_eq!(trie.len(), 1);
        assert!(trie.contains("duplicate"));
        trie.check_integrity().unwrap();
    }

    #[test]
    fn test_prefix_words_are_distinct() {
        let trie = trie_with(&["app", "apple", "application"]);
        assert!(trie.contains("app"));
        assert!(trie.contains("apple"));
        assert!(trie.contains("application"));
        assert!(!trie.contains("ap"));
        assert!(!trie.contains("appl"));
    }

    #[test]
    fn test_insert_shorter_after_longer() {
        let trie = trie_with(&["abc", "ab", "a"]);
        assert!(trie.contains("a"));
        assert!(trie.contains("ab"));
        assert!(trie.contains("abc"));
        assert!(!trie.contains("abcd"));
    }

    #[test]
    fn test_empty_word() {
        let mut trie = DoubleArrayTrie::new();
        assert!(trie.insert("").unwrap());
        assert!(trie.contains(""));
        assert_eq!(trie.len(), 1);
        assert!(trie.remove(""));
        assert!(!trie.contains(""));
        trie.check_integrity().unwrap();
    }

    #[test]
    fn test_remove_restores_empty_root() {
        let mut trie = trie_with(&["apple"]);
        assert!(trie.remove("apple"));
        assert!(!trie.contains("apple"));
        assert_eq!(trie.len(), 0);
        // no leaked states: everything but the root is back on the free list
        let stats = trie.stats();
        assert_eq!(stats.num_states, 1);
        assert_eq!(stats.num_transitions, 0);
        trie.check_integrity().unwrap();
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut trie = trie_with(&["cat", "car"]);
        assert!(!trie.remove("ca"));
        assert!(!trie.remove("cart"));
        assert!(!trie.remove("dog"));
        assert_eq!(trie.len(), 2);
        assert!(trie.contains("cat"));
        assert!(trie.contains("car"));
        trie.check_integrity().unwrap();
    }

    #[test]
    fn test_remove_collapses_unbranched_chain() {
        let mut trie = trie_with(&["cat", "car", "card"]);
        assert!(trie.remove("cat"));
        trie.check_integrity().unwrap();
        assert!(trie.contains("car"));
        assert!(trie.contains("card"));
        assert!(!trie.contains("cat"));

        assert!(trie.remove("card"));
        trie.check_integrity().unwrap();
        assert!(trie.contains("car"));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_remove_keeps_mid_path_word() {
        let mut trie = trie_with(&["go", "going"]);
        assert!(trie.remove("going"));
        trie.check_integrity().unwrap();
        assert!(trie.contains("go"));
        assert!(!trie.contains("going"));

        let mut trie = trie_with(&["go", "going"]);
        assert!(trie.remove("go"));
        trie.check_integrity().unwrap();
        assert!(trie.contains("going"));
        assert!(!trie.contains("go"));
    }

    #[test]
    fn test_match_prefix() {
        let trie = trie_with(&["cat", "car", "card"]);
        let mut hits = trie.match_prefix("car");
        hits.sort();
        assert_eq!(hits, vec!["car", "card"]);
        assert!(trie.match_prefix("cat").len() == 1);
        assert!(trie.match_prefix("x").is_empty());
        assert!(!trie.contains("ca"));
    }

    #[test]
    fn test_match_prefix_inside_tail() {
        let trie = trie_with(&["refrigerator"]);
        assert_eq!(trie.match_prefix("refrig"), vec!["refrigerator"]);
        assert!(trie.match_prefix("refrix").is_empty());
    }

    #[test]
    fn test_match_prefix_empty_lists_all() {
        let words = ["he", "she", "his", "hers"];
        let trie = trie_with(&words);
        let mut all = trie.match_prefix("");
        all.sort();
        let mut expected: Vec<String> = words.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_prefixes_of() {
        let trie = trie_with(&["go", "going"]);
        assert_eq!(trie.prefixes_of("going"), vec!["go", "going"]);
        assert_eq!(trie.prefixes_of("go"), vec!["go"]);
        assert_eq!(trie.prefixes_of("gone"), vec!["go"]);
        assert!(trie.prefixes_of("g").is_empty());
    }

    #[test]
    fn test_prefixes_of_requires_whole_tail() {
        // "she" is stored as s + tail "he"; a probe that only covers part of
        // the stored suffix is not a match
        let trie = trie_with(&["she"]);
        assert!(trie.prefixes_of("sh").is_empty());
        assert_eq!(trie.prefixes_of("shed"), vec!["she"]);
    }

    #[test]
    fn test_sub_words() {
        let trie = trie_with(&["he", "she", "his", "hers"]);
        let found = trie.sub_words("ushers");
        let expected: std::collections::HashSet<String> =
            ["he", "she", "hers"].iter().map(|s| s.to_string()).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_unicode_words() {
        let words = ["caf\u{e9}", "cafeteria", "\u{4e2d}\u{6587}", "\u{4e2d}", "a\u{1f600}"];
        let mut trie = DoubleArrayTrie::new();
        for w in &words {
            trie.insert(w).unwrap();
        }
        trie.check_integrity().unwrap();
        for w in &words {
            assert!(trie.contains(w), "missing {}", w);
        }
        assert_eq!(
            trie.prefixes_of("\u{4e2d}\u{6587}\u{7ae0}"),
            vec!["\u{4e2d}", "\u{4e2d}\u{6587}"]
        );
    }

    #[test]
    fn test_dense_sibling_allocation_relocates() {
        // many words fanning out of one state force base collisions
        let words: Vec<String> = (b'a'..=b'z').map(|c| format!("{}tail", c as char)).collect();
        let mut trie = DoubleArrayTrie::with_config(DoubleArrayTrieConfig { initial_capacity: 4 });
        for w in &words {
            trie.insert(w).unwrap();
        }
        trie.check_integrity().unwrap();
        assert_eq!(trie.len(), words.len());
        for w in &words {
            assert!(trie.contains(w));
        }
    }

    #[test]
    fn test_large_dataset() {
        let mut trie = DoubleArrayTrie::new();
        for i in 0..1000 {
            trie.insert(&format!("key_{:06}", i)).unwrap();
        }
        assert_eq!(trie.len(), 1000);
        trie.check_integrity().unwrap();
        for i in 0..1000 {
            assert!(trie.contains(&format!("key_{:06}", i)));
        }
        assert!(!trie.contains("key_1000000"));
        assert_eq!(trie.match_prefix("key_0009").len(), 100);
    }

    #[test]
    fn test_delete_all_then_reuse() {
        let words = ["alpha", "beta", "gamma", "alphabet", "al"];
        let mut trie = trie_with(&words);
        for w in &words {
            assert!(trie.remove(w), "failed to remove {}", w);
        }
        assert!(trie.is_empty());
        trie.check_integrity().unwrap();
        for w in &words {
            assert!(trie.insert(w).unwrap());
        }
        assert_eq!(trie.len(), words.len());
        trie.check_integrity().unwrap();
        for w in &words {
            assert!(trie.contains(w));
        }
    }

    #[test]
    fn test_snapshot_round_trip() {
        let trie = trie_with(&["he", "she", "his", "hers", "going"]);
        let bytes = trie.to_bytes().unwrap();
        let restored = DoubleArrayTrie::from_bytes(&bytes).unwrap();
        restored.check_integrity().unwrap();
        assert_eq!(restored.len(), trie.len());
        for w in ["he", "she", "his", "hers", "going", "absent", ""] {
            assert_eq!(restored.contains(w), trie.contains(w));
        }
        let mut a = restored.match_prefix("h");
        let mut b = trie.match_prefix("h");
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        assert!(DoubleArrayTrie::from_bytes(&[0xde, 0xad, 0xbe]).is_err());
    }

    #[test]
    fn test_stats() {
        let trie = trie_with(&["hello", "help"]);
        let stats = trie.stats();
        assert_eq!(stats.num_words, 2);
        assert!(stats.num_states >= 1);
        assert_eq!(stats.num_tails, 2);
        assert!(stats.memory_usage > 0);
        assert!(stats.bits_per_word > 0.0);
    }
}
