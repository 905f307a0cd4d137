//! Node Rule Keys
//!
//! A node is looked up in the rule table under every part hash it could
//! satisfy: its tag and `*`, each combined with every subset of its classes
//! and interaction pseudo-class.

use crate::hash::{MAX_RULE_CLASSES, class_hash, part_hash, pseudo_class_hash, tag_hash};

/// Maximum keys generated for one node
pub const MAX_NODE_RULE_KEYS: usize = 512;

/// Pointer interaction state exposed to selectors as a pseudo-class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InteractionState {
    #[default]
    None,
    /// Under the pointer (`:highlighted`)
    Highlighted,
    /// Being pressed (`:active`)
    Active,
}

impl InteractionState {
    pub fn pseudo_class(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Highlighted => Some("highlighted"),
            Self::Active => Some("active"),
        }
    }
}

/// Rule keys (depth-free part hashes) for a node
pub fn node_rule_keys<'a, I>(tag: &str, classes: I, state: InteractionState) -> Vec<u64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut qualifiers: Vec<u64> = Vec::new();
    for class in classes {
        let h = class_hash(class);
        if !qualifiers.contains(&h) {
            qualifiers.push(h);
        }
        if qualifiers.len() == MAX_RULE_CLASSES {
            break;
        }
    }
    if let Some(pseudo) = state.pseudo_class() {
        qualifiers.push(pseudo_class_hash(pseudo));
    }

    let tags = if tag == "*" {
        vec![tag_hash("*")]
    } else {
        vec![tag_hash(tag), tag_hash("*")]
    };

    let subsets = 1usize << qualifiers.len();
    let mut keys = Vec::with_capacity((subsets * tags.len()).min(MAX_NODE_RULE_KEYS));
    let mut subset = Vec::with_capacity(qualifiers.len());
    'outer: for mask in 0..subsets {
        subset.clear();
        subset.extend(
            qualifiers
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, &q)| q),
        );
        for &t in &tags {
            if keys.len() == MAX_NODE_RULE_KEYS {
                tracing::warn!(tag, "node rule keys truncated");
                break 'outer;
            }
            keys.push(part_hash(t, &mut subset));
        }
    }
    keys.sort_unstable();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector;
    use crate::hash::rule_key;

    #[test]
    fn test_power_set_size() {
        let keys = node_rule_keys("p", ["x", "y"], InteractionState::None);
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn test_keys_cover_selectors() {
        let keys = node_rule_keys("p", ["x", "y"], InteractionState::None);
        for sel in ["*", "*.x", "*.y", "*.x.y", "p", "p.x", "p.y", "p.y.x", ".x"] {
            let key = parse_selector(sel).unwrap().keys()[0];
            assert!(keys.iter().any(|&k| rule_key(k, 0) == key), "{sel}");
        }
        let miss = parse_selector("p.z").unwrap().keys()[0];
        assert!(!keys.iter().any(|&k| rule_key(k, 0) == miss));
    }

    #[test]
    fn test_pseudo_class() {
        let keys = node_rule_keys("a", std::iter::empty(), InteractionState::Highlighted);
        assert_eq!(keys.len(), 4);
        let hover = parse_selector("a:highlighted").unwrap().keys()[0];
        assert!(keys.iter().any(|&k| rule_key(k, 0) == hover));
    }

    #[test]
    fn test_key_cap() {
        let classes = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        let keys = node_rule_keys("div", classes, InteractionState::Active);
        assert!(keys.len() <= MAX_NODE_RULE_KEYS);
    }
}
