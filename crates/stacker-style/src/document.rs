//! Document
//!
//! Owns the node tree, the document rule table and the change clock. Tree
//! and attribute mutations go through here so dirty flags and the clock stay
//! in step.

use stacker_attr::{
    Attribute, AttributeAssignment, AttributeData, AttributeName, Operator, Shorthand, StorageType, ValueSemantic,
    Variant, mode,
};
use stacker_dom::{DomTree, Node, NodeFlags, NodeId};
use stacker_rules::{InteractionState, RuleScope, RuleTable, parse_selector};

use crate::folder::{Resolution, Resolver, RuleSource};
use crate::{Config, StyleResult, System, matching};

/// Selection colours, taken from the root node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionStyle {
    pub color: u32,
    pub fill_color: u32,
}

impl SelectionStyle {
    pub fn from_config(config: &Config) -> Self {
        Self {
            color: config.default_selection_color,
            fill_color: config.default_selection_fill_color,
        }
    }
}

pub struct Document {
    pub(crate) tree: DomTree,
    pub(crate) root: NodeId,
    pub(crate) rules: RuleTable,
    pub(crate) config: Config,
    /// Bumped whenever the set of matchable document rules changes
    pub(crate) table_revision: u64,
    pub(crate) seen_table_revision: u64,
    pub(crate) seen_system_revision: u64,
    pub(crate) change_clock: u64,
    pub(crate) selection: SelectionStyle,
}

impl Document {
    /// Create an empty document with a root element
    pub fn new(system: &System) -> Self {
        let mut tree = DomTree::new();
        let root = tree.create_element("document");
        let config = system.config.clone();
        Self {
            tree,
            root,
            rules: RuleTable::new(RuleScope::Document),
            selection: SelectionStyle::from_config(&config),
            config,
            table_revision: 0,
            seen_table_revision: 0,
            seen_system_revision: 0,
            change_clock: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// The document rule table
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn node(&self, id: NodeId) -> StyleResult<&Node> {
        Ok(self.tree.node(id)?)
    }

    /// Incremented by every mutation
    pub fn change_clock(&self) -> u64 {
        self.change_clock
    }

    pub fn selection(&self) -> SelectionStyle {
        self.selection
    }

    fn touch(&mut self) {
        self.change_clock += 1;
    }

    fn mark(&mut self, id: NodeId, flags: NodeFlags) -> StyleResult<()> {
        self.tree.node_mut(id)?.mark(flags);
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.touch();
        self.tree.create_element(tag)
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.touch();
        self.tree.create_text(text)
    }

    /// Destroy a node and its subtree. The root cannot be destroyed.
    pub fn destroy_node(&mut self, id: NodeId) -> StyleResult<usize> {
        if id == self.root {
            return Err(stacker_dom::DomError::HierarchyRequest.into());
        }
        self.touch();
        Ok(self.tree.destroy(id)?)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> StyleResult<()> {
        self.touch();
        Ok(self.tree.append_child(parent, child)?)
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> StyleResult<()> {
        self.touch();
        Ok(self.tree.prepend_child(parent, child)?)
    }

    pub fn insert_child_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> StyleResult<()> {
        self.touch();
        Ok(self.tree.insert_child_before(parent, child, before)?)
    }

    pub fn remove_from_parent(&mut self, child: NodeId) -> StyleResult<()> {
        self.touch();
        Ok(self.tree.remove_from_parent(child)?)
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, text: &str) -> StyleResult<bool> {
        let changed = self.tree.node_mut(id)?.set_text(text);
        if changed {
            self.touch();
        }
        Ok(changed)
    }

    /// Change the pseudo-class state used for rule keys
    pub fn set_interaction_state(&mut self, id: NodeId, state: InteractionState) -> StyleResult<bool> {
        let node = self.tree.node_mut(id)?;
        if node.interaction == state {
            return Ok(false);
        }
        node.interaction = state;
        self.mark(id, NodeFlags::UPDATE_RULE_KEYS | NodeFlags::UPDATE_MATCHED_RULES)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    fn attribute_changed(&mut self, id: NodeId, name: AttributeName) -> StyleResult<()> {
        let touches_class = match name.shorthand() {
            Some(Shorthand::Sides(sides)) => sides.contains(&AttributeName::Class),
            Some(Shorthand::EdgeFlag(target, _)) => target == AttributeName::Class,
            None => name == AttributeName::Class,
        };
        let mut flags = NodeFlags::FOLD_ATTRIBUTES;
        if touches_class {
            flags |= NodeFlags::UPDATE_RULE_KEYS | NodeFlags::UPDATE_MATCHED_RULES;
        }
        self.mark(id, flags)
    }

    fn store(
        &mut self,
        id: NodeId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: &Variant,
        op: Operator,
        fold: bool,
    ) -> StyleResult<bool> {
        let changed = self.tree.node_mut(id)?.attributes.set(name, value, semantic, op, fold)?;
        if changed {
            self.attribute_changed(id, name)?;
        }
        Ok(changed)
    }

    /// Store a parsed assignment as a separate record
    pub fn apply_assignment(&mut self, id: NodeId, assignment: &AttributeAssignment) -> StyleResult<bool> {
        self.store(id, assignment.name, assignment.semantic, &assignment.value, assignment.op, false)
    }

    pub fn set_integer_attribute(
        &mut self,
        id: NodeId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: i32,
        op: Operator,
    ) -> StyleResult<bool> {
        self.store(id, name, semantic, &Variant::Integer(value), op, false)
    }

    pub fn set_float_attribute(
        &mut self,
        id: NodeId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: f32,
        op: Operator,
    ) -> StyleResult<bool> {
        self.store(id, name, semantic, &Variant::Float(value), op, false)
    }

    pub fn set_string_attribute(
        &mut self,
        id: NodeId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: &str,
        op: Operator,
    ) -> StyleResult<bool> {
        self.store(id, name, semantic, &Variant::from(value), op, false)
    }

    /// Like [`set_integer_attribute`](Self::set_integer_attribute), but a
    /// modifier is folded into the node's latest record for the name
    pub fn fold_integer_attribute(
        &mut self,
        id: NodeId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: i32,
        op: Operator,
    ) -> StyleResult<bool> {
        self.store(id, name, semantic, &Variant::Integer(value), op, true)
    }

    pub fn fold_float_attribute(
        &mut self,
        id: NodeId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: f32,
        op: Operator,
    ) -> StyleResult<bool> {
        self.store(id, name, semantic, &Variant::Float(value), op, true)
    }

    pub fn fold_string_attribute(
        &mut self,
        id: NodeId,
        name: AttributeName,
        semantic: ValueSemantic,
        value: &str,
        op: Operator,
    ) -> StyleResult<bool> {
        self.store(id, name, semantic, &Variant::from(value), op, true)
    }

    /// Drop the node's own records for a name. The folded prefix is left
    /// for the next fold. Returns whether any record went.
    pub fn remove_attribute(&mut self, id: NodeId, name: AttributeName) -> StyleResult<bool> {
        let targets: Vec<AttributeName> = match name.shorthand() {
            Some(Shorthand::Sides(sides)) => sides.to_vec(),
            Some(Shorthand::EdgeFlag(target, _)) => vec![target],
            None => vec![name],
        };
        let attributes = &mut self.tree.node_mut(id)?.attributes;
        let offsets: Vec<usize> = attributes
            .unfolded()
            .filter(|r| targets.contains(&r.name()))
            .map(|r| r.offset)
            .collect();
        for &offset in offsets.iter().rev() {
            attributes.remove_at(offset)?;
        }
        if offsets.is_empty() {
            return Ok(false);
        }
        self.attribute_changed(id, name)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    fn resolver<'a>(&'a self, system: &'a System, node: &Node, rules: bool) -> Resolver<'a> {
        Resolver {
            tree: &self.tree,
            rules: rules.then_some(RuleSource {
                system: &system.rules,
                document: &self.rules,
            }),
            config: &self.config,
            metrics: system.fonts.metrics(node.style.font_id),
        }
    }

    fn resolve(&self, system: &System, id: NodeId, name: AttributeName, rules: bool) -> Option<Resolution> {
        let node = self.tree.get(id)?;
        self.resolver(system, node, rules).resolve(id, name)
    }

    /// Effective value of an attribute: own records and matched rules, and
    /// for inheritable attributes the parent chain
    pub fn find_attribute(&self, system: &System, id: NodeId, name: AttributeName) -> Option<Attribute> {
        self.resolve(system, id, name, true).map(|r| r.record)
    }

    /// Like [`find_attribute`](Self::find_attribute), ignoring rules
    pub fn find_attribute_no_rules(&self, system: &System, id: NodeId, name: AttributeName) -> Option<Attribute> {
        self.resolve(system, id, name, false).map(|r| r.record)
    }

    /// Effective value and the node whose assignment it is based on
    pub fn find_inherited_attribute(
        &self,
        system: &System,
        id: NodeId,
        name: AttributeName,
    ) -> Option<(Attribute, NodeId)> {
        self.resolve(system, id, name, true).map(|r| (r.record, r.owner))
    }

    /// Effective integer value, or `default` when unset or unresolved
    pub fn read_as_integer(&self, system: &System, id: NodeId, name: AttributeName, default: i32) -> i32 {
        match self.find_attribute(system, id, name) {
            Some(a) if a.storage().is_numeric() && !a.op().is_modifier() => a.read_int(),
            _ => default,
        }
    }

    /// Effective float value; fractional values read as a fraction of one
    pub fn read_as_float(&self, system: &System, id: NodeId, name: AttributeName, default: f32) -> f32 {
        match self.find_attribute(system, id, name) {
            Some(a) if a.storage().is_numeric() && !a.op().is_modifier() => a.read_float(),
            _ => default,
        }
    }

    /// Effective string value; string sets are comma-joined
    pub fn read_as_string(&self, system: &System, id: NodeId, name: AttributeName, default: &str) -> String {
        match self.find_attribute(system, id, name) {
            Some(a) if a.storage() == StorageType::String => a.read_string(),
            _ => default.to_string(),
        }
    }

    /// Effective URL of a URL-valued attribute, including `background`
    pub fn read_as_url(&self, system: &System, id: NodeId, name: AttributeName, default: &str) -> String {
        match self.find_attribute(system, id, name) {
            Some(a) if a.storage() == StorageType::String && a.mode() != mode::UNDEFINED => {
                a.read_str().to_string()
            }
            _ => default.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------

    /// Nodes in the subtree at `root` matched by `selector`, in document
    /// order, at most `max`
    pub fn match_nodes(&self, root: NodeId, selector: &str, max: usize) -> StyleResult<Vec<NodeId>> {
        self.tree.node(root)?;
        let selector = parse_selector(selector)?;
        Ok(matching::match_nodes(&self.tree, &self.config, root, &selector, max))
    }

    /// Rematch rules for one node now instead of in the next update pass.
    /// Returns whether the matched set changed.
    pub fn update_matched_rules(&mut self, system: &System, id: NodeId) -> StyleResult<bool> {
        let rules = RuleSource {
            system: &system.rules,
            document: &self.rules,
        };
        let outcome = matching::update_matched_rules(&mut self.tree, rules, &self.config, id)?;
        if outcome.slots_changed {
            self.tree.node_mut(id)?.mark(NodeFlags::FOLD_ATTRIBUTES);
        }
        if outcome.keys_changed {
            self.tree.node_mut(id)?.mark(NodeFlags::UPDATE_CHILD_RULES);
        }
        Ok(outcome.slots_changed)
    }

    /// Memory used by the tree and rule storage
    pub fn memory_usage(&self) -> usize {
        self.tree.memory_usage()
            + self
                .rules
                .iter()
                .map(|(_, r)| r.attributes.memory_usage() + r.selector_text.capacity())
                .sum::<usize>()
    }
}
