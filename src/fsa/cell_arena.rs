//! Cell arena backing the double-array trie
//!
//! The arena is a single `Vec` of tagged slots. Occupied slots carry the
//! `base`/`check` pair plus the stored tail and the sorted child-symbol
//! index; free slots carry their position in a circular doubly-linked free
//! list anchored at the reserved slot [`HEAD`]. The tag replaces the
//! negated-integer link encoding of classic double-array layouts: a link can
//! never be read as a base and a base can never be walked as a link.
//!
//! Allocation never fails short of storage exhaustion. A collision on a
//! computed offset is resolved by the caller via [`CellArena::search_slot`]
//! and [`CellArena::relocate`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardtrieError};
use crate::fsa::symbol::{Symbol, ALPHABET_SIZE};
use crate::StateId;

/// Reserved index anchoring the circular free list
pub const HEAD: StateId = 0;

/// Index of the root state; allocated when an engine is created
pub const ROOT: StateId = 1;

/// Hard cap on arena length, leaving headroom so `base + code` fits in u32
const MAX_CELLS: usize = u32::MAX as usize - ALPHABET_SIZE;

/// One arena slot: either a live trie state or a member of the free list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Slot {
    /// Unused cell, linked into the circular free list
    Free {
        /// Previous free cell (or [`HEAD`])
        prev: StateId,
        /// Next free cell (or [`HEAD`])
        next: StateId,
    },
    /// Live trie state
    Occupied(Cell),
}

/// Payload of an occupied slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Child offset: the child for symbol `c` lives at `base + c`.
    /// Meaningful only while `children` is non-empty; `0` means unset.
    pub base: StateId,
    /// Parent state index
    pub check: StateId,
    /// Stored suffix: `None` = not a word end here, `Some(empty)` = a word
    /// ends exactly here, `Some(suffix)` = compressed remainder of a word
    pub tail: Option<Vec<Symbol>>,
    /// Sorted symbols with a live edge out of this state
    pub children: Vec<Symbol>,
}

/// Slot storage plus the free-list discipline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellArena {
    slots: Vec<Slot>,
}

impl CellArena {
    /// Create an arena with `capacity` cells, all free except the anchor
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.clamp(2, MAX_CELLS);
        let mut slots = Vec::with_capacity(cap);
        slots.push(Slot::Free {
            prev: (cap - 1) as StateId,
            next: 1,
        });
        for i in 1..cap {
            let prev = (i - 1) as StateId;
            let next = if i + 1 < cap { (i + 1) as StateId } else { HEAD };
            slots.push(Slot::Free { prev, next });
        }
        Self { slots }
    }

    /// Number of cells (occupied + free + anchor)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena holds only the anchor
    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    /// Slot by index, if in range
    pub fn slot(&self, id: StateId) -> Option<&Slot> {
        self.slots.get(id as usize)
    }

    /// Occupied cell by index, if in range and live
    pub fn cell(&self, id: StateId) -> Option<&Cell> {
        match self.slots.get(id as usize) {
            Some(Slot::Occupied(cell)) => Some(cell),
            _ => None,
        }
    }

    /// Whether `id` is an allocatable free cell (the anchor is not)
    pub fn is_free(&self, id: StateId) -> bool {
        id != HEAD && matches!(self.slots.get(id as usize), Some(Slot::Free { .. }))
    }

    pub(crate) fn cell_at(&self, id: StateId) -> &Cell {
        match &self.slots[id as usize] {
            Slot::Occupied(cell) => cell,
            Slot::Free { .. } => unreachable!("state {} is on the free list", id),
        }
    }

    pub(crate) fn cell_at_mut(&mut self, id: StateId) -> &mut Cell {
        match &mut self.slots[id as usize] {
            Slot::Occupied(cell) => cell,
            Slot::Free { .. } => unreachable!("state {} is on the free list", id),
        }
    }

    fn free_next(&self, id: StateId) -> StateId {
        match &self.slots[id as usize] {
            Slot::Free { next, .. } => *next,
            Slot::Occupied(_) => unreachable!("state {} is not on the free list", id),
        }
    }

    fn free_prev(&self, id: StateId) -> StateId {
        match &self.slots[id as usize] {
            Slot::Free { prev, .. } => *prev,
            Slot::Occupied(_) => unreachable!("state {} is not on the free list", id),
        }
    }

    fn set_free_next(&mut self, id: StateId, value: StateId) {
        match &mut self.slots[id as usize] {
            Slot::Free { next, .. } => *next = value,
            Slot::Occupied(_) => unreachable!("state {} is not on the free list", id),
        }
    }

    fn set_free_prev(&mut self, id: StateId, value: StateId) {
        match &mut self.slots[id as usize] {
            Slot::Free { prev, .. } => *prev = value,
            Slot::Occupied(_) => unreachable!("state {} is not on the free list", id),
        }
    }

    /// Remove a specific free cell from the list and mark it occupied.
    ///
    /// The target offset has already been determined by arithmetic; this
    /// only unlinks the cell from its neighbors, in O(1).
    pub fn allocate_at(&mut self, pos: StateId) -> Result<()> {
        if !self.is_free(pos) {
            return Err(ShardtrieError::trie(format!(
                "cell {} is not free for allocation",
                pos
            )));
        }
        let prev = self.free_prev(pos);
        let next = self.free_next(pos);
        self.set_free_next(prev, next);
        self.set_free_prev(next, prev);
        self.slots[pos as usize] = Slot::Occupied(Cell::default());
        Ok(())
    }

    /// Return an occupied cell to the free list (linked at the tail)
    pub fn release(&mut self, pos: StateId) {
        debug_assert!(matches!(self.slots[pos as usize], Slot::Occupied(_)));
        let tail = self.free_prev(HEAD);
        self.slots[pos as usize] = Slot::Free { prev: tail, next: HEAD };
        self.set_free_next(tail, pos);
        self.set_free_prev(HEAD, pos);
    }

    /// Find a base `b >= 1` such that every `b + code` cell is free or past
    /// the current end, scanning candidate bases via the free list. Grows
    /// the arena so every target is in range. Does not allocate.
    ///
    /// `codes` must be sorted ascending and non-empty.
    pub fn search_slot(&mut self, codes: &[Symbol]) -> Result<StateId> {
        debug_assert!(!codes.is_empty());
        debug_assert!(codes.windows(2).all(|w| w[0] < w[1]));
        let c0 = codes[0] as usize;
        let last_code = codes[codes.len() - 1] as usize;

        let mut f = self.free_next(HEAD);
        while f != HEAD {
            let fi = f as usize;
            if fi > c0 {
                let base = fi - c0;
                if self.base_fits(base, codes) {
                    self.grow_to(base + last_code + 1)?;
                    return Ok(base as StateId);
                }
            }
            f = self.free_next(f);
        }

        // No fit before the boundary: place the whole span in fresh cells.
        let len = self.slots.len();
        let base = if len > c0 { len - c0 } else { 1 };
        self.grow_to(base + last_code + 1)?;
        Ok(base as StateId)
    }

    fn base_fits(&self, base: usize, codes: &[Symbol]) -> bool {
        codes.iter().all(|&c| {
            let target = base + c as usize;
            target >= self.slots.len() || matches!(self.slots[target], Slot::Free { .. })
        })
    }

    /// Grow the backing storage to at least `min_len` cells, chaining the
    /// new region onto the free-list tail. Doubles to amortize.
    pub fn grow_to(&mut self, min_len: usize) -> Result<()> {
        let old_len = self.slots.len();
        if min_len <= old_len {
            return Ok(());
        }
        if min_len > MAX_CELLS {
            return Err(ShardtrieError::out_of_memory(min_len));
        }
        let new_len = (old_len * 2).max(min_len).min(MAX_CELLS);
        let tail = self.free_prev(HEAD);
        self.slots.reserve(new_len - old_len);
        for i in old_len..new_len {
            let prev = if i == old_len { tail } else { (i - 1) as StateId };
            let next = if i + 1 < new_len { (i + 1) as StateId } else { HEAD };
            self.slots.push(Slot::Free { prev, next });
        }
        self.set_free_next(tail, old_len as StateId);
        self.set_free_prev(HEAD, (new_len - 1) as StateId);
        Ok(())
    }

    /// Move every edge of `state` from its current base to `new_base`,
    /// fixing each child's `check` back-pointer and each grandchild's parent
    /// reference, then free the old cells. Every `new_base + child` cell
    /// must be free (the caller obtains `new_base` from [`Self::search_slot`]).
    pub fn relocate(&mut self, state: StateId, new_base: StateId) -> Result<()> {
        let (old_base, children) = {
            let cell = self.cell_at(state);
            (cell.base, cell.children.clone())
        };
        for &sym in &children {
            let old = old_base + sym as StateId;
            let new = new_base + sym as StateId;
            self.allocate_at(new)?;
            let moved = match &mut self.slots[old as usize] {
                Slot::Occupied(cell) => std::mem::take(cell),
                Slot::Free { .. } => unreachable!("child {} vanished during relocation", old),
            };
            if moved.base != 0 {
                for &grand in &moved.children {
                    self.cell_at_mut(moved.base + grand as StateId).check = new;
                }
            }
            self.slots[new as usize] = Slot::Occupied(Cell { check: state, ..moved });
            self.release(old);
        }
        self.cell_at_mut(state).base = new_base;
        Ok(())
    }

    /// Walk the free list and return every member, erroring on a cycle that
    /// is not the single anchored ring or on a dangling link.
    pub fn free_list_ids(&self) -> Result<Vec<StateId>> {
        let mut ids = Vec::new();
        let mut cur = self.free_next(HEAD);
        while cur != HEAD {
            if ids.len() > self.slots.len() {
                return Err(ShardtrieError::trie("free list does not terminate"));
            }
            match self.slots.get(cur as usize) {
                Some(Slot::Free { prev, next }) => {
                    let expected_prev = ids.last().copied().unwrap_or(HEAD);
                    if *prev != expected_prev {
                        return Err(ShardtrieError::trie(format!(
                            "free cell {} has prev {}, expected {}",
                            cur, prev, expected_prev
                        )));
                    }
                    ids.push(cur);
                    cur = *next;
                }
                _ => {
                    return Err(ShardtrieError::trie(format!(
                        "free list links to non-free cell {}",
                        cur
                    )));
                }
            }
        }
        if self.free_prev(HEAD) != ids.last().copied().unwrap_or(HEAD) {
            return Err(ShardtrieError::trie("free list tail link is inconsistent"));
        }
        Ok(ids)
    }

    /// Iterate all slots with their indices
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (i as StateId, slot))
    }

    /// Approximate heap footprint in bytes
    pub fn memory_usage(&self) -> usize {
        let slot_bytes = self.slots.len() * std::mem::size_of::<Slot>();
        let heap_bytes: usize = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Occupied(cell) => {
                    let tail = cell.tail.as_ref().map_or(0, |t| t.len() * 2);
                    tail + cell.children.len() * 2
                }
                Slot::Free { .. } => 0,
            })
            .sum();
        slot_bytes + heap_bytes
    }
}
