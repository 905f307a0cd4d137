//! Rule Matcher
//!
//! Walks a node's parent chain level by level. At depth `d` every clause
//! indexed under one of the ancestor's keys (combined with `d`) is a
//! candidate; candidates must survive every level from 0 up to their clause
//! length, at which point their rule matches.

use std::cmp::Reverse;

use crate::hash::{MAX_SELECTOR_DEPTH, rule_key};
use crate::rule::{Rule, RuleId};
use crate::selector::ParsedSelector;
use crate::table::{RuleTable, SelectorRef};

/// Elements present in both sorted, deduplicated slices
pub fn sorted_intersection<T: Ord + Copy>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn resolve<'t>(tables: &[&'t RuleTable], id: RuleId) -> Option<&'t Rule> {
    tables.iter().copied().find(|t| t.owns(id)).and_then(|t| t.get(id))
}

/// Rule matcher over one or more rule tables
pub struct RuleMatcher<'t> {
    tables: Vec<&'t RuleTable>,
    scratch: Vec<SelectorRef>,
}

impl<'t> RuleMatcher<'t> {
    pub fn new(tables: &[&'t RuleTable]) -> Self {
        Self {
            tables: tables.to_vec(),
            scratch: Vec::new(),
        }
    }

    /// Enabled rules whose selectors match, given the rule keys of the node
    /// and then of each ancestor in turn.
    ///
    /// The result is in application order: weakest first, so the strongest
    /// rule comes last. At most `max` rules are returned, dropping the
    /// weakest.
    pub fn match_rules<'k, I>(&mut self, ancestry: I, max: usize) -> Vec<RuleId>
    where
        I: IntoIterator<Item = &'k [u64]>,
    {
        let mut candidates: Vec<SelectorRef> = Vec::new();
        let mut found: Vec<RuleId> = Vec::new();

        for (depth, keys) in ancestry.into_iter().take(MAX_SELECTOR_DEPTH).enumerate() {
            self.scratch.clear();
            for &hash in keys {
                let key = rule_key(hash, depth);
                for table in &self.tables {
                    self.scratch.extend_from_slice(table.lookup(key));
                }
            }
            self.scratch.sort_unstable();
            self.scratch.dedup();

            candidates = if depth == 0 {
                std::mem::take(&mut self.scratch)
            } else {
                sorted_intersection(&self.scratch, &candidates)
            };
            candidates.retain(|s| {
                if s.num_keys as usize == depth + 1 {
                    found.push(s.rule);
                    false
                } else {
                    true
                }
            });
            if candidates.is_empty() {
                break;
            }
        }

        found.sort_unstable();
        found.dedup();
        let mut ranked: Vec<(i32, u64, RuleId)> = found
            .into_iter()
            .filter_map(|id| {
                let rule = resolve(&self.tables, id)?;
                rule.is_enabled().then_some((rule.priority, rule.order, id))
            })
            .collect();
        ranked.sort_by_key(|&(priority, order, _)| (Reverse(priority), order));

        if ranked.len() > max {
            tracing::warn!(matched = ranked.len(), max, "matched rule slots overflow, dropping weakest rules");
            ranked.drain(..ranked.len() - max);
        }
        tracing::trace!(matched = ranked.len(), "rules matched");
        ranked.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Look up a matched rule
    pub fn rule(&self, id: RuleId) -> Option<&'t Rule> {
        resolve(&self.tables, id)
    }
}

/// Whether any clause of `selector` matches a node, given the rule keys of
/// the node and then of each ancestor in turn
pub fn selector_matches<'k, I>(selector: &ParsedSelector, ancestry: I) -> bool
where
    I: IntoIterator<Item = &'k [u64]>,
{
    let levels: Vec<&[u64]> = ancestry.into_iter().take(MAX_SELECTOR_DEPTH).collect();
    selector.clauses().any(|clause| {
        clause.len() <= levels.len()
            && clause
                .iter()
                .zip(&levels)
                .enumerate()
                .all(|(depth, (&key, keys))| keys.iter().any(|&h| rule_key(h, depth) == key))
    })
}
