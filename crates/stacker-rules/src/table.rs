//! Rule Table
//!
//! Owns rules in a generational slot arena and indexes every selector clause
//! by its per-depth rule keys. One multimap serves all ancestor levels: a
//! clause with three parts is entered under three keys, each carrying its
//! depth in the top bits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{RuleError, RuleResult};
use crate::rule::{Rule, RuleFlags, RuleId, RuleScope};

/// One clause of one rule, as seen from a single multimap entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectorRef {
    pub rule: RuleId,
    pub clause: u16,
    /// Parts in the clause; the clause matches once this many levels agree
    pub num_keys: u8,
}

/// Generational slot arena
#[derive(Debug, Default)]
struct Slots {
    items: Vec<Option<Rule>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl Slots {
    fn insert(&mut self, rule: Rule) -> (u32, u32) {
        if let Some(index) = self.free_list.pop() {
            self.items[index as usize] = Some(rule);
            (index, self.generations[index as usize])
        } else {
            let index = self.items.len() as u32;
            self.items.push(Some(rule));
            self.generations.push(0);
            (index, 0)
        }
    }

    fn live(&self, index: u32, generation: u32) -> bool {
        self.generations.get(index as usize) == Some(&generation)
            && self.items.get(index as usize).is_some_and(Option::is_some)
    }

    fn get(&self, index: u32, generation: u32) -> Option<&Rule> {
        if !self.live(index, generation) {
            return None;
        }
        self.items[index as usize].as_ref()
    }

    fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut Rule> {
        if !self.live(index, generation) {
            return None;
        }
        self.items[index as usize].as_mut()
    }

    fn remove(&mut self, index: u32, generation: u32) -> Option<Rule> {
        if !self.live(index, generation) {
            return None;
        }
        let rule = self.items[index as usize].take();
        self.generations[index as usize] = generation.wrapping_add(1);
        self.free_list.push(index);
        rule
    }

    fn clear(&mut self) {
        for (index, slot) in self.items.iter_mut().enumerate() {
            if slot.take().is_some() {
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
    }
}

/// Unique table identity
static TABLE_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

fn next_table_id() -> u32 {
    TABLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Hash multimap from rule key to selector clauses
#[derive(Debug)]
pub struct RuleTable {
    id: u32,
    scope: RuleScope,
    slots: Slots,
    map: HashMap<u64, Vec<SelectorRef>>,
    count: usize,
}

impl RuleTable {
    pub fn new(scope: RuleScope) -> Self {
        Self {
            id: next_table_id(),
            scope,
            slots: Slots::default(),
            map: HashMap::new(),
            count: 0,
        }
    }

    pub fn scope(&self) -> RuleScope {
        self.scope
    }

    /// Whether `id` was issued by this table
    pub fn owns(&self, id: RuleId) -> bool {
        id.table == self.id && id.scope == self.scope
    }

    /// Number of live rules
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Take ownership of a rule and index its selector
    pub fn insert(&mut self, mut rule: Rule) -> RuleId {
        rule.flags -= RuleFlags::IN_DOCUMENT_TABLE | RuleFlags::IN_SYSTEM_TABLE;
        rule.flags |= match self.scope {
            RuleScope::System => RuleFlags::IN_SYSTEM_TABLE | RuleFlags::GLOBAL,
            RuleScope::Document => RuleFlags::IN_DOCUMENT_TABLE,
        };
        let selector = rule.selector.clone();
        let (index, generation) = self.slots.insert(rule);
        let id = RuleId {
            table: self.id,
            scope: self.scope,
            index,
            generation,
        };
        for (clause, keys) in selector.clauses().enumerate() {
            let entry = SelectorRef {
                rule: id,
                clause: clause as u16,
                num_keys: keys.len() as u8,
            };
            for &key in keys {
                self.map.entry(key).or_default().push(entry);
            }
        }
        self.count += 1;
        id
    }

    /// Remove a rule and all of its multimap entries
    pub fn remove(&mut self, id: RuleId) -> RuleResult<Rule> {
        if !self.owns(id) {
            return Err(RuleError::NoSuchRule);
        }
        let rule = self.slots.remove(id.index, id.generation).ok_or(RuleError::NoSuchRule)?;
        for &key in rule.selector.keys() {
            if let Some(entries) = self.map.get_mut(&key) {
                entries.retain(|e| e.rule != id);
                if entries.is_empty() {
                    self.map.remove(&key);
                }
            }
        }
        self.count -= 1;
        Ok(rule)
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        if !self.owns(id) {
            return None;
        }
        self.slots.get(id.index, id.generation)
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        if !self.owns(id) {
            return None;
        }
        self.slots.get_mut(id.index, id.generation)
    }

    pub fn contains(&self, id: RuleId) -> bool {
        self.get(id).is_some()
    }

    /// Clauses indexed under a rule key
    pub fn lookup(&self, key: u64) -> &[SelectorRef] {
        self.map.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Live rules with their handles
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> + '_ {
        let (table, scope) = (self.id, self.scope);
        self.slots
            .items
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_ref().map(|rule| {
                    let id = RuleId {
                        table,
                        scope,
                        index: index as u32,
                        generation: self.slots.generations[index],
                    };
                    (id, rule)
                })
            })
    }

    /// Destroy every rule. Outstanding handles stop resolving.
    pub fn clear(&mut self) {
        tracing::debug!(scope = ?self.scope, rules = self.count, "clearing rule table");
        self.slots.clear();
        self.map.clear();
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::key_depth;

    fn rule(selector: &str) -> Rule {
        Rule::new(selector, &[], RuleFlags::ENABLED, 10).unwrap()
    }

    #[test]
    fn test_insert_indexes_every_level() {
        let mut table = RuleTable::new(RuleScope::Document);
        let id = table.insert(rule("div p, span"));
        let inserted = table.get(id).unwrap();
        assert!(inserted.flags.contains(RuleFlags::IN_DOCUMENT_TABLE));
        for &key in inserted.selector.keys() {
            assert!(table.lookup(key).iter().any(|e| e.rule == id));
        }
        let clause0 = inserted.selector.clause(0);
        let entry = table.lookup(clause0[1])[0];
        assert_eq!(entry.num_keys, 2);
        assert_eq!(key_depth(clause0[1]), 1);
    }

    #[test]
    fn test_remove_clears_entries() {
        let mut table = RuleTable::new(RuleScope::Document);
        let id = table.insert(rule("p"));
        let key = table.get(id).unwrap().selector.keys()[0];
        table.remove(id).unwrap();
        assert!(table.lookup(key).is_empty());
        assert!(table.get(id).is_none());
        assert_eq!(table.remove(id).unwrap_err(), RuleError::NoSuchRule);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut table = RuleTable::new(RuleScope::Document);
        let old = table.insert(rule("p"));
        table.remove(old).unwrap();
        let new = table.insert(rule("span"));
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(table.get(old).is_none());
        assert!(table.get(new).is_some());
    }

    #[test]
    fn test_clear() {
        let mut table = RuleTable::new(RuleScope::System);
        let a = table.insert(rule("p"));
        table.insert(rule("a b"));
        assert!(table.get(a).unwrap().flags.contains(RuleFlags::GLOBAL));
        table.clear();
        assert!(table.is_empty());
        assert!(table.get(a).is_none());
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_scope_mismatch() {
        let mut system = RuleTable::new(RuleScope::System);
        let doc = RuleTable::new(RuleScope::Document);
        let id = system.insert(rule("p"));
        assert!(doc.get(id).is_none());
    }

    #[test]
    fn test_handles_do_not_cross_tables() {
        let mut a = RuleTable::new(RuleScope::Document);
        let mut b = RuleTable::new(RuleScope::Document);
        let ra = a.insert(rule("p"));
        let rb = b.insert(rule("span"));
        assert_eq!((ra.index, ra.generation), (rb.index, rb.generation));
        assert_ne!(ra, rb);
        assert!(b.get(ra).is_none());
        assert_eq!(b.remove(ra).unwrap_err(), RuleError::NoSuchRule);
        assert!(b.contains(rb));
        assert_eq!(b.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![rb]);
    }
}
