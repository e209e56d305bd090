//! Tree nodes.

use std::fmt;

use crate::bounds::Quadrant;

/// A cell of the quadtree.
///
/// A node is a leaf exactly when it has no children. Leaves carry zero or
/// one point. An internal node can still carry one point: the anchor of a
/// cluster of coincident points, whose other members live further down.
pub struct Node {
    leaf: bool,
    point: Option<usize>,
    children: [Option<Box<Node>>; 4],
}

impl Node {
    pub(crate) fn new() -> Self {
        Self {
            leaf: true,
            point: None,
            children: Default::default(),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Handle of the point attached directly to this node.
    #[inline]
    pub fn point(&self) -> Option<usize> {
        self.point
    }

    /// Child in a one-based slot (1..=4). Any other slot yields `None`.
    pub fn child(&self, slot: usize) -> Option<&Node> {
        Quadrant::from_slot(slot).and_then(|q| self.get(q))
    }

    /// Child covering the given quadrant.
    #[inline]
    pub fn get(&self, quadrant: Quadrant) -> Option<&Node> {
        self.children[quadrant.index()].as_deref()
    }

    /// Existing children in slot order.
    pub fn children(&self) -> impl Iterator<Item = (Quadrant, &Node)> {
        Quadrant::ALL
            .into_iter()
            .filter_map(|q| self.get(q).map(|child| (q, child)))
    }

    pub(crate) fn attach(&mut self, index: usize) {
        debug_assert!(self.point.is_none());
        self.point = Some(index);
    }

    pub(crate) fn detach(&mut self) -> Option<usize> {
        self.point.take()
    }

    /// Child slot for `quadrant`, filled from `acquire` when empty.
    ///
    /// Descending always turns this node into an internal node.
    pub(crate) fn child_or_insert_with(
        &mut self,
        quadrant: Quadrant,
        acquire: impl FnOnce() -> Box<Node>,
    ) -> &mut Node {
        self.leaf = false;
        self.children[quadrant.index()].get_or_insert_with(acquire)
    }

    pub(crate) fn take_children(&mut self) -> [Option<Box<Node>>; 4] {
        std::mem::take(&mut self.children)
    }

    /// Back to a fresh leaf. Children must already have been taken.
    pub(crate) fn reset(&mut self) {
        debug_assert!(self.children.iter().all(Option::is_none));
        self.leaf = true;
        self.point = None;
    }

    pub(crate) fn is_reset(&self) -> bool {
        self.leaf && self.point.is_none() && self.children.iter().all(Option::is_none)
    }
}

// Shallow: coincident chains can be deeper than the stack allows to recurse.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots: Vec<usize> = self.children().map(|(q, _)| q.slot()).collect();
        f.debug_struct("Node")
            .field("leaf", &self.leaf)
            .field("point", &self.point)
            .field("children", &slots)
            .finish()
    }
}
