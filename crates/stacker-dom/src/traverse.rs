//! Generic traversal
//!
//! Anything with parent/child/sibling links can be walked the same way. The
//! node tree implements [`TreeLinks`]; a host box tree can too.

/// Parent/child/sibling links of a tree
pub trait TreeLinks {
    type Id: Copy + Eq;

    fn parent_of(&self, id: Self::Id) -> Option<Self::Id>;
    fn first_child_of(&self, id: Self::Id) -> Option<Self::Id>;
    fn next_sibling_of(&self, id: Self::Id) -> Option<Self::Id>;

    /// Next node in pre-order within the subtree at `root`
    fn tree_next(&self, root: Self::Id, node: Self::Id) -> Option<Self::Id> {
        self.first_child_of(node).or_else(|| self.tree_next_up(root, node))
    }

    /// Next node in pre-order skipping the children of `node`
    fn tree_next_up(&self, root: Self::Id, node: Self::Id) -> Option<Self::Id> {
        let mut current = node;
        loop {
            if current == root {
                return None;
            }
            if let Some(next) = self.next_sibling_of(current) {
                return Some(next);
            }
            current = self.parent_of(current)?;
        }
    }

    fn pre_order(&self, root: Self::Id) -> PreOrder<'_, Self>
    where
        Self: Sized,
    {
        PreOrder {
            tree: self,
            root,
            next: Some(root),
        }
    }

    fn post_order(&self, root: Self::Id) -> PostOrder<'_, Self>
    where
        Self: Sized,
    {
        PostOrder {
            tree: self,
            root,
            next: Some(deepest_first(self, root)),
        }
    }
}

fn deepest_first<T: TreeLinks>(tree: &T, mut node: T::Id) -> T::Id {
    while let Some(child) = tree.first_child_of(node) {
        node = child;
    }
    node
}

/// Pre-order iterator, parents before children
pub struct PreOrder<'a, T: TreeLinks> {
    tree: &'a T,
    root: T::Id,
    next: Option<T::Id>,
}

impl<T: TreeLinks> Iterator for PreOrder<'_, T> {
    type Item = T::Id;

    fn next(&mut self) -> Option<T::Id> {
        let current = self.next?;
        self.next = self.tree.tree_next(self.root, current);
        Some(current)
    }
}

/// Post-order iterator, children before parents
pub struct PostOrder<'a, T: TreeLinks> {
    tree: &'a T,
    root: T::Id,
    next: Option<T::Id>,
}

impl<T: TreeLinks> Iterator for PostOrder<'_, T> {
    type Item = T::Id;

    fn next(&mut self) -> Option<T::Id> {
        let current = self.next?;
        self.next = if current == self.root {
            None
        } else if let Some(sibling) = self.tree.next_sibling_of(current) {
            Some(deepest_first(self.tree, sibling))
        } else {
            self.tree.parent_of(current)
        };
        Some(current)
    }
}
