//! Node
//!
//! Tree links are `Option<NodeId>`; everything else is the state the style
//! engine reads and writes between passes.

use stacker_attr::AttributeBuffer;
use stacker_rules::{InteractionState, RuleId};

use crate::{BackgroundLayer, BoxId, LayoutMode, NodeFlags, NodeId, NodeStyle};

/// Node-specific data
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element { tag: String },
    Text(String),
}

/// A matched rule and the revision it had when matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSlot {
    pub rule: RuleId,
    pub revision: u64,
}

/// Box kept while a node is laid out as `none`, so switching back does not
/// rebuild it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenLayout {
    pub counterpart: Option<BoxId>,
    pub mode: LayoutMode,
}

#[derive(Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub data: NodeData,
    /// Own attributes; the folded prefix caches this node's fold results
    pub attributes: AttributeBuffer,
    /// Matched rules in application order, weakest first
    pub rule_slots: Vec<RuleSlot>,
    /// Depth-free part hashes this node can match
    pub rule_keys: Vec<u64>,
    pub style: NodeStyle,
    pub flags: NodeFlags,
    pub interaction: InteractionState,
    /// Mode asked for by the `layout` attribute
    pub requested_layout: LayoutMode,
    /// Mode after applying the parent chain
    pub layout: LayoutMode,
    /// Matching object in the box tree
    pub counterpart: Option<BoxId>,
    pub hidden_layout: Option<HiddenLayout>,
    pub background: Option<BackgroundLayer>,
    /// Document change clock at the last fold
    pub fold_clock: u64,
}

impl Node {
    fn with_data(data: NodeData, layout: LayoutMode) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
            attributes: AttributeBuffer::new(),
            rule_slots: Vec::new(),
            rule_keys: Vec::new(),
            style: NodeStyle::default(),
            flags: NodeFlags::NEW_NODE,
            interaction: InteractionState::None,
            requested_layout: layout,
            layout,
            counterpart: None,
            hidden_layout: None,
            background: None,
            fold_clock: 0,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(
            NodeData::Element {
                tag: tag.to_ascii_lowercase(),
            },
            LayoutMode::Block,
        )
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        let mut node = Self::with_data(NodeData::Text(content.to_string()), LayoutMode::Inline);
        node.flags |= NodeFlags::RECONSTRUCT_PARAGRAPH;
        node
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[inline]
    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    #[inline]
    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    #[inline]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Tag name; empty for text nodes
    pub fn tag(&self) -> &str {
        match &self.data {
            NodeData::Element { tag } => tag,
            NodeData::Text(_) => "",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Replace the content of a text node. Returns whether it changed.
    pub fn set_text(&mut self, content: &str) -> bool {
        match &mut self.data {
            NodeData::Text(t) if t != content => {
                content.clone_into(t);
                self.flags |= NodeFlags::RECONSTRUCT_PARAGRAPH;
                true
            }
            _ => false,
        }
    }

    /// Add dirty flags
    #[inline]
    pub fn mark(&mut self, flags: NodeFlags) {
        self.flags |= flags;
    }

    /// Memory used by the node's owned buffers
    pub fn memory_usage(&self) -> usize {
        let text = match &self.data {
            NodeData::Element { tag } => tag.capacity(),
            NodeData::Text(t) => t.capacity(),
        };
        std::mem::size_of::<Self>()
            + text
            + self.attributes.memory_usage()
            + self.rule_slots.capacity() * std::mem::size_of::<RuleSlot>()
            + self.rule_keys.capacity() * std::mem::size_of::<u64>()
    }
}
