//! Pool-owning tree builder for repeated rebuilds.

use tracing::debug;

use crate::config::TreeConfig;
use crate::point::Point;
use crate::pool::NodePool;
use crate::quadtree::QuadTree;

/// Builds trees from one private [`NodePool`].
///
/// Keep one builder per subsystem or per thread. Every tree it hands out
/// should come back through [`dispose`](Self::dispose) or
/// [`rebuild`](Self::rebuild) so its nodes are reused.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    config: TreeConfig,
    pool: NodePool,
}

impl TreeBuilder {
    pub fn new(config: TreeConfig) -> Self {
        let pool = NodePool::from_config(&config.pool);
        debug!(
            tolerance = config.tree.coincidence_tolerance,
            pool_capacity = ?config.pool.capacity,
            "Created quadtree builder"
        );
        Self { config, pool }
    }

    pub fn build<P: Point>(&mut self, points: &[P]) -> QuadTree {
        QuadTree::build(&mut self.pool, &self.config, points)
    }

    pub fn dispose(&mut self, tree: QuadTree) {
        tree.dispose(&mut self.pool);
    }

    /// Dispose `previous` and build over `points` from the recycled nodes.
    pub fn rebuild<P: Point>(&mut self, previous: QuadTree, points: &[P]) -> QuadTree {
        self.dispose(previous);
        self.build(points)
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    #[inline]
    pub fn pool_mut(&mut self) -> &mut NodePool {
        &mut self.pool
    }
}
