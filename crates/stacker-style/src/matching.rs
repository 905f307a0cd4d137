//! Matched-rule update
//!
//! Rules may change a node's `class`, which changes its rule keys, which
//! changes which rules match. The update iterates to a fixpoint: the first
//! pass keys the node on its own class, later passes on the class its
//! matched rules produce. Class-modifying rules seen so far are tracked;
//! a cycle (one of them reappearing or dropping out) keeps the last
//! consistent result.

use std::borrow::Cow;

use stacker_attr::{AttributeData, AttributeName};
use stacker_dom::{DomTree, Node, NodeFlags, NodeId, RuleSlot, TreeLinks};
use stacker_rules::{ParsedSelector, RuleId, RuleMatcher, node_rule_keys, selector_matches};

use crate::folder::{Resolver, RuleSource};
use crate::font::FontMetrics;
use crate::{Config, StyleResult};

/// What a rematch changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MatchOutcome {
    pub slots_changed: bool,
    pub keys_changed: bool,
    pub iterations: usize,
}

/// Effective classes of a node, with or without its matched rules
fn classes(tree: &DomTree, rules: Option<RuleSource<'_>>, config: &Config, id: NodeId) -> Vec<String> {
    let resolver = Resolver {
        tree,
        rules,
        config,
        metrics: FontMetrics::default(),
    };
    resolver
        .resolve(id, AttributeName::Class)
        .map(|r| r.record.string_set().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

fn keys_for(node: &Node, classes: &[String]) -> Vec<u64> {
    if node.is_text() {
        return Vec::new();
    }
    node_rule_keys(node.tag(), classes.iter().map(String::as_str), node.interaction)
}

/// Rule keys of a node as matching should see them: stored keys, or keys
/// from the node's own class when the stored ones are stale
fn current_keys<'t>(tree: &'t DomTree, config: &Config, id: NodeId) -> Cow<'t, [u64]> {
    let Some(node) = tree.get(id) else {
        return Cow::Borrowed(&[]);
    };
    if node.rule_keys.is_empty() || node.flags.contains(NodeFlags::UPDATE_RULE_KEYS) {
        Cow::Owned(keys_for(node, &classes(tree, None, config, id)))
    } else {
        Cow::Borrowed(&node.rule_keys)
    }
}

/// Keys of each strict ancestor of `id`, nearest first
fn ancestor_keys<'t>(tree: &'t DomTree, id: NodeId) -> Vec<&'t [u64]> {
    tree.ancestors(id)
        .skip(1)
        .map(|a| tree.get(a).map(|n| n.rule_keys.as_slice()).unwrap_or(&[]))
        .collect()
}

fn match_slots(tree: &DomTree, rules: RuleSource<'_>, config: &Config, id: NodeId, keys: &[u64]) -> Vec<RuleSlot> {
    let ancestry = std::iter::once(keys).chain(ancestor_keys(tree, id));
    let tables = rules.tables();
    let matched = RuleMatcher::new(&tables).match_rules(ancestry, config.max_matched_rules);
    matched
        .into_iter()
        .filter_map(|rule| {
            rules.get(rule).map(|r| RuleSlot {
                rule,
                revision: r.revision,
            })
        })
        .collect()
}

fn contains_rule(slots: &[RuleSlot], rule: RuleId) -> bool {
    slots.iter().any(|s| s.rule == rule)
}

/// Rematch the rules of one node, iterating over class changes. Ancestors
/// must have current rule keys.
pub(crate) fn update_matched_rules(
    tree: &mut DomTree,
    rules: RuleSource<'_>,
    config: &Config,
    id: NodeId,
) -> StyleResult<MatchOutcome> {
    let node = tree.node(id)?;
    let original_slots = node.rule_slots.clone();
    let original_keys = node.rule_keys.clone();

    let mut class = classes(tree, None, config, id);
    let mut visited: Vec<RuleId> = Vec::new();
    let mut previous: Option<Vec<RuleSlot>> = None;
    let mut iterations = 0;
    let mut cycle = false;

    loop {
        iterations += 1;
        let keys = keys_for(tree.node(id)?, &class);
        let slots = match_slots(tree, rules, config, id, &keys);
        let prev_slots = previous.as_deref().unwrap_or(&[]);
        if previous.is_some() && slots == prev_slots {
            tree.node_mut(id)?.rule_keys = keys;
            break;
        }

        let fresh: Vec<RuleId> = slots
            .iter()
            .map(|s| s.rule)
            .filter(|&r| rules.get(r).is_some_and(|rule| rule.modifies_class()))
            .filter(|&r| !contains_rule(prev_slots, r))
            .collect();
        let reappeared = fresh.iter().any(|r| visited.contains(r));
        let dropped = visited
            .iter()
            .any(|&r| contains_rule(prev_slots, r) && !contains_rule(&slots, r));
        if reappeared || dropped {
            cycle = true;
            break;
        }

        let node = tree.node_mut(id)?;
        node.rule_keys = keys;
        node.rule_slots = slots.clone();
        previous = Some(slots);

        if fresh.is_empty() {
            break;
        }
        visited.extend(fresh);
        if visited.len() >= config.max_visited_class_rules {
            tracing::warn!(node = %id, visited = visited.len(), "class fixpoint visit budget exhausted");
            break;
        }
        class = classes(tree, Some(rules), config, id);
    }

    let node = tree.node_mut(id)?;
    node.flags -= NodeFlags::UPDATE_RULE_KEYS | NodeFlags::UPDATE_MATCHED_RULES;
    let outcome = MatchOutcome {
        slots_changed: node.rule_slots != original_slots,
        keys_changed: node.rule_keys != original_keys,
        iterations,
    };
    if iterations > 1 || cycle {
        tracing::debug!(node = %id, iterations, cycle, "class fixpoint settled");
    }
    tracing::trace!(node = %id, matched = node.rule_slots.len(), "rules rematched");
    Ok(outcome)
}

/// Whether a node's stored slots still describe its matched rules
pub(crate) fn slots_current(rules: RuleSource<'_>, node: &Node) -> bool {
    node.rule_slots.iter().all(|slot| {
        rules
            .get(slot.rule)
            .is_some_and(|r| r.is_enabled() && r.revision == slot.revision)
    })
}

/// Elements under `root`, in document order, matched by `selector`
pub(crate) fn match_nodes(
    tree: &DomTree,
    config: &Config,
    root: NodeId,
    selector: &ParsedSelector,
    max: usize,
) -> Vec<NodeId> {
    let mut found = Vec::new();
    for id in tree.pre_order(root) {
        if found.len() >= max {
            break;
        }
        if !tree.get(id).is_some_and(Node::is_element) {
            continue;
        }
        let levels: Vec<Cow<'_, [u64]>> = tree.ancestors(id).map(|a| current_keys(tree, config, a)).collect();
        if selector_matches(selector, levels.iter().map(|k| k.as_ref())) {
            found.push(id);
        }
    }
    tracing::trace!(root = %root, matched = found.len(), "selector matched nodes");
    found
}
