//! Stacker Rules
//!
//! Selector-based style rules:
//! - Selector parsing into per-depth 64-bit rule keys
//! - Rule tables (slot arena + hash multimap)
//! - Node rule keys (power set of classes)
//! - Parent-chain rule matching

mod error;
pub mod hash;
pub mod keys;
pub mod matcher;
mod rule;
pub mod selector;
mod table;

pub use error::{RuleError, RuleResult, SelectorError};
pub use hash::{MAX_RULE_CLASSES, MAX_SELECTOR_DEPTH, rule_key};
pub use keys::{InteractionState, MAX_NODE_RULE_KEYS, node_rule_keys};
pub use matcher::{RuleMatcher, selector_matches};
pub use rule::{PRIORITY_DEFAULT, PRIORITY_OVERRIDE, Rule, RuleFlags, RuleId, RuleScope};
pub use selector::{ParsedSelector, parse_selector};
pub use table::{RuleTable, SelectorRef};
