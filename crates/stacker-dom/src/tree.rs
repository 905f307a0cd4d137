//! DOM Tree (arena-based allocation)
//!
//! Destroyed nodes leave an empty slot; ids are never handed out twice, so a
//! stale `NodeId` resolves to `NotFound` rather than to a different node.

use crate::{DomError, DomResult, Node, NodeFlags, NodeId, TreeLinks};

/// Arena-based node tree
#[derive(Debug, Default)]
pub struct DomTree {
    nodes: Vec<Option<Node>>,
    live: usize,
}

impl DomTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        self.live += 1;
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Get a node, or `NotFound`
    pub fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound)
    }

    pub fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Child IDs of a node, first to last
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(|n| n.first_child),
        }
    }

    /// The node itself, then each ancestor up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// Is `ancestor` equal to `node` or above it
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Distance to the root
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count().saturating_sub(1)
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let p = self.node(parent)?;
        self.node(child)?;
        if !p.is_element() || self.is_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId, prev: Option<NodeId>, next: Option<NodeId>) -> DomResult<()> {
        {
            let c = self.node_mut(child)?;
            c.parent = Some(parent);
            c.prev_sibling = prev;
            c.next_sibling = next;
            c.mark(
                NodeFlags::UPDATE_MATCHED_RULES
                    | NodeFlags::UPDATE_CHILD_RULES
                    | NodeFlags::FOLD_ATTRIBUTES
                    | NodeFlags::REBUILD_BOX,
            );
        }
        match prev {
            Some(p) => self.node_mut(p)?.next_sibling = Some(child),
            None => self.node_mut(parent)?.first_child = Some(child),
        }
        match next {
            Some(n) => self.node_mut(n)?.prev_sibling = Some(child),
            None => self.node_mut(parent)?.last_child = Some(child),
        }
        self.node_mut(parent)?.mark(NodeFlags::RECOMPOSE_CHILD_BOXES);
        Ok(())
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.remove_from_parent(child)?;
        let last = self.node(parent)?.last_child;
        self.link(parent, child, last, None)
    }

    /// Insert `child` as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.remove_from_parent(child)?;
        let first = self.node(parent)?.first_child;
        self.link(parent, child, None, first)
    }

    /// Insert `child` before `before`, or append when `before` is `None`
    pub fn insert_child_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) -> DomResult<()> {
        let Some(before) = before else {
            return self.append_child(parent, child);
        };
        if before == child {
            return Ok(());
        }
        self.check_insert(parent, child)?;
        if self.node(before)?.parent != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.remove_from_parent(child)?;
        let prev = self.node(before)?.prev_sibling;
        self.link(parent, child, prev, Some(before))
    }

    /// Detach a node from its parent. A detached node is left as is.
    pub fn remove_from_parent(&mut self, child: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let c = self.node_mut(child)?;
            let Some(parent) = c.parent.take() else {
                return Ok(());
            };
            (parent, c.prev_sibling.take(), c.next_sibling.take())
        };
        match prev {
            Some(p) => self.node_mut(p)?.next_sibling = next,
            None => self.node_mut(parent)?.first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n)?.prev_sibling = prev,
            None => self.node_mut(parent)?.last_child = prev,
        }
        self.node_mut(parent)?.mark(NodeFlags::RECOMPOSE_CHILD_BOXES);
        Ok(())
    }

    /// Detach and free a node and its whole subtree. Returns the number of
    /// nodes freed.
    pub fn destroy(&mut self, id: NodeId) -> DomResult<usize> {
        self.remove_from_parent(id)?;
        let doomed: Vec<NodeId> = self.pre_order(id).collect();
        for &n in &doomed {
            self.nodes[n.index()] = None;
        }
        self.live -= doomed.len();
        tracing::trace!(node = %id, freed = doomed.len(), "destroyed subtree");
        Ok(doomed.len())
    }

    /// Iterate over all live nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i as u32), n)))
    }

    /// Memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Option<Node>>()
            + self.iter().map(|(_, n)| n.memory_usage() - std::mem::size_of::<Node>()).sum::<usize>()
    }
}

impl TreeLinks for DomTree {
    type Id = NodeId;

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    fn first_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.first_child
    }

    fn next_sibling_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next_sibling
    }
}

/// Iterator over child IDs
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator up the parent chain, starting at the node itself
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|n| n.parent);
        Some(current)
    }
}
