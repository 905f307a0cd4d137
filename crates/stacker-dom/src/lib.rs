//! Stacker DOM
//!
//! Arena-allocated node tree for the style engine:
//! - Nodes with parent/sibling/child links addressed by [`NodeId`]
//! - Per-node attribute buffer, rule slots, rule keys and computed style
//! - Dirty flags consumed by the two-phase update pass
//! - Generic pre-order and post-order traversal

mod background;
mod error;
mod flags;
mod node;
pub mod style;
mod traverse;
mod tree;

pub use background::{BackgroundFill, BackgroundLayer, BackgroundSize, BoundingBox};
pub use error::{DomError, DomResult};
pub use flags::NodeFlags;
pub use node::{HiddenLayout, Node, NodeData, RuleSlot};
pub use style::{Cursor, FontId, Justification, LayoutMode, NodeStyle, StyleFlags, WhiteSpace, WrapMode};
pub use traverse::{PostOrder, PreOrder, TreeLinks};
pub use tree::{Ancestors, Children, DomTree};

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle of a node's box in the host's layout tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxId(pub u32);
