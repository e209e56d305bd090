//! Node recycling across tree rebuilds.
//!
//! A simulation rebuilds its tree every step. Disposing a tree hands every
//! node back to the pool, and the next build draws from the pool before
//! touching the allocator.

use std::fmt;

use tracing::trace;

use crate::config::PoolConfig;
use crate::node::Node;

/// Running counters for a [`NodePool`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Nodes freshly allocated because the pool was empty.
    pub allocated: u64,
    /// Nodes handed out from the free stack.
    pub reused: u64,
    /// Nodes returned through tree disposal.
    pub released: u64,
    /// Released nodes freed instead of pooled because the pool was full.
    pub dropped: u64,
}

/// Free stack of reset nodes.
///
/// Owned by whoever builds trees; build one pool per thread rather than
/// sharing it. Nodes come back only through [`QuadTree::dispose`], which
/// releases a whole tree at once.
///
/// [`QuadTree::dispose`]: crate::QuadTree::dispose
pub struct NodePool {
    free: Vec<Box<Node>>,
    capacity: Option<usize>,
    stats: PoolStats,
}

impl NodePool {
    /// Unbounded pool.
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            capacity: None,
            stats: PoolStats::default(),
        }
    }

    /// Pool that keeps at most `capacity` idle nodes.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        match config.capacity {
            Some(capacity) => Self::with_capacity_limit(capacity),
            None => Self::new(),
        }
    }

    /// Pre-allocate idle nodes so the first build does not hit the allocator.
    pub fn reserve(&mut self, additional: usize) {
        let room = match self.capacity {
            Some(capacity) => capacity.saturating_sub(self.free.len()).min(additional),
            None => additional,
        };
        self.free.reserve(room);
        for _ in 0..room {
            self.free.push(Box::new(Node::new()));
            self.stats.allocated += 1;
        }
    }

    /// Take a fresh leaf, reusing an idle node when one is available.
    ///
    /// Trees call this for every node they create. A node taken out directly
    /// is simply freed when dropped.
    pub fn acquire(&mut self) -> Box<Node> {
        match self.free.pop() {
            Some(node) => {
                debug_assert!(node.is_reset(), "pooled node was not reset");
                self.stats.reused += 1;
                node
            }
            None => {
                self.stats.allocated += 1;
                Box::new(Node::new())
            }
        }
    }

    /// Return a node and its whole subtree, children before their parent.
    ///
    /// Uses an explicit stack since coincident chains can be very deep.
    pub(crate) fn release(&mut self, root: Box<Node>) {
        let mut pending = vec![root];
        while let Some(mut node) = pending.pop() {
            let children = node.take_children();
            if children.iter().any(Option::is_some) {
                pending.push(node);
                pending.extend(children.into_iter().flatten());
                continue;
            }
            self.recycle(node);
        }
    }

    fn recycle(&mut self, mut node: Box<Node>) {
        node.reset();
        self.stats.released += 1;

        if self.capacity.is_some_and(|capacity| self.free.len() >= capacity) {
            self.stats.dropped += 1;
            return;
        }
        self.free.push(node);
    }

    /// Number of idle nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    #[inline]
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Free every idle node. Counters are kept.
    pub fn clear(&mut self) {
        trace!(idle = self.free.len(), "Clearing node pool");
        self.free.clear();
        self.free.shrink_to_fit();
    }
}

impl Default for NodePool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePool")
            .field("idle", &self.free.len())
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish()
    }
}
