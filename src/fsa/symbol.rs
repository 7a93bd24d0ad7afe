//! Symbol codec: words to edge codes and back
//!
//! Edge codes are UTF-16 code units, which keeps the symbol space bounded at
//! `0..65536` so a code can be used directly as an array offset in the cell
//! arena. Surrogate pairs round-trip as long as their units stay adjacent,
//! which trie paths and tails preserve.

/// Integer edge code used as an array offset within the arena
pub type Symbol = u16;

/// Number of distinct symbol codes
pub const ALPHABET_SIZE: usize = 1 << 16;

/// Encode a word into its symbol codes
#[inline]
pub fn encode(word: &str) -> Vec<Symbol> {
    word.encode_utf16().collect()
}

/// Decode symbol codes back into a word
#[inline]
pub fn decode(symbols: &[Symbol]) -> String {
    String::from_utf16_lossy(symbols)
}

/// First symbol of a word, if any
#[inline]
pub fn first_symbol(word: &str) -> Option<Symbol> {
    word.encode_utf16().next()
}
