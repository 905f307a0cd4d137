//! Selector hashing
//!
//! A selector part `tag.a.b:c` hashes to one 64-bit value that does not
//! depend on qualifier order. The rule key stores a depth index in the top
//! four bits so one multimap serves every ancestor level.

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

/// Maximum number of parts in a selector clause
pub const MAX_SELECTOR_DEPTH: usize = 8;

/// Maximum number of class/pseudo-class qualifiers per part
pub const MAX_RULE_CLASSES: usize = 8;

const DEPTH_SHIFT: u32 = 60;
const HASH_MASK: u64 = (1 << DEPTH_SHIFT) - 1;

/// Hash of a tag name or `*`
#[inline]
pub fn tag_hash(tag: &str) -> u64 {
    xxh3_64(tag.as_bytes())
}

/// Hash of a class (`.`) or pseudo-class (`:`) qualifier
#[inline]
pub fn qualifier_hash(prefix: char, name: &str) -> u64 {
    xxh3_64_with_seed(name.as_bytes(), prefix as u64)
}

#[inline]
pub fn class_hash(name: &str) -> u64 {
    qualifier_hash('.', name)
}

#[inline]
pub fn pseudo_class_hash(name: &str) -> u64 {
    qualifier_hash(':', name)
}

/// Order-independent hash of a part. `qualifiers` is sorted in place.
pub fn part_hash(tag: u64, qualifiers: &mut [u64]) -> u64 {
    qualifiers.sort_unstable();
    let mut bytes = Vec::with_capacity(8 * (qualifiers.len() + 1));
    bytes.extend_from_slice(&tag.to_le_bytes());
    for q in qualifiers.iter() {
        bytes.extend_from_slice(&q.to_le_bytes());
    }
    xxh3_64(&bytes)
}

/// Combine a part hash with its depth in the clause
#[inline]
pub fn rule_key(hash: u64, depth: usize) -> u64 {
    debug_assert!(depth < MAX_SELECTOR_DEPTH);
    ((depth as u64) << DEPTH_SHIFT) | (hash & HASH_MASK)
}

/// Depth index stored in a rule key
#[inline]
pub fn key_depth(key: u64) -> usize {
    (key >> DEPTH_SHIFT) as usize
}
