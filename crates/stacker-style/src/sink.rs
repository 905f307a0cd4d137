//! Layout sink
//!
//! The post-order pass reports what the external layout engine must redo.
//! Every method has a no-op default.

use stacker_dom::{BoxId, LayoutMode, NodeId};

pub trait LayoutSink {
    /// The node's box must be rebuilt for a new layout mode. Returns the new
    /// box, if the host built one.
    fn rebuild_box(&mut self, _node: NodeId, _mode: LayoutMode) -> Option<BoxId> {
        None
    }

    /// The node's child boxes changed order or membership
    fn recompose_child_boxes(&mut self, _node: NodeId) {}

    /// The inline container must re-tokenize its paragraph
    fn reconstruct_paragraph(&mut self, _node: NodeId) {}

    /// The inline container must re-measure its paragraph
    fn remeasure_paragraph(&mut self, _node: NodeId) {}

    /// The node's size constraints changed along one or both axes
    fn expand(&mut self, _node: NodeId, _width: bool, _height: bool) {}
}

/// Sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LayoutSink for NullSink {}
