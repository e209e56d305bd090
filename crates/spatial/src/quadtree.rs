//! Region quadtree over an ordered point slice.
//!
//! The tree is built once per snapshot. Its square region comes from the
//! points themselves, each point is pushed down until it owns a cell, and the
//! finished tree is handed back to a [`NodePool`] when the snapshot is done.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::bounds::{Bounds, Quadrant};
use crate::config::TreeConfig;
use crate::error::InsertError;
use crate::node::Node;
use crate::point::Point;
use crate::pool::NodePool;

/// A node seen during traversal, with the region it covers.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub node: &'a Node,
    pub bounds: Bounds,
    pub depth: usize,
}

/// Whether [`QuadTree::walk`] should visit a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Descend,
    Skip,
}

/// Region quadtree.
///
/// Nodes hold handles (indices into the slice the tree was built from), never
/// the points themselves.
pub struct QuadTree {
    root: Option<Box<Node>>,
    bounds: Bounds,
    tolerance: f64,
    rejected: Vec<InsertError>,
}

impl QuadTree {
    /// Build a tree over `points`, drawing nodes from `pool`.
    ///
    /// Points that cannot be inserted are dropped and listed in
    /// [`rejected`](Self::rejected). With no finite point at all the tree is
    /// empty: no root and [`Bounds::ZERO`].
    pub fn build<P: Point>(pool: &mut NodePool, config: &TreeConfig, points: &[P]) -> Self {
        let Some(bounds) = Bounds::enclosing(points) else {
            let mut tree = Self::with_bounds(config, Bounds::ZERO);
            for (index, point) in points.iter().enumerate() {
                tree.reject(InsertError::InvalidCoordinate {
                    index,
                    x: point.x(),
                    y: point.y(),
                });
            }
            debug!(points = points.len(), "No finite points, quadtree is empty");
            return tree;
        };

        let mut tree = Self::with_bounds(config, bounds.squarify());
        for index in 0..points.len() {
            if let Err(err) = tree.insert(pool, points, index) {
                tree.reject(err);
            }
        }

        trace!(
            points = points.len(),
            rejected = tree.rejected.len(),
            side = tree.bounds.width(),
            "Built quadtree"
        );
        tree
    }

    /// Empty tree covering `bounds`, filled point by point with
    /// [`insert`](Self::insert).
    pub fn with_bounds(config: &TreeConfig, bounds: Bounds) -> Self {
        Self {
            root: None,
            bounds,
            tolerance: config.tree.coincidence_tolerance,
            rejected: Vec::new(),
        }
    }

    /// Insert the point with handle `index`.
    ///
    /// `points` must be the slice every earlier insertion used, since handles
    /// already in the tree are resolved against it.
    pub fn insert<P: Point>(
        &mut self,
        pool: &mut NodePool,
        points: &[P],
        index: usize,
    ) -> Result<(), InsertError> {
        let point = points.get(index).ok_or(InsertError::UnknownPoint {
            index,
            len: points.len(),
        })?;
        let (x, y) = (point.x(), point.y());

        if !point.is_finite() {
            return Err(InsertError::InvalidCoordinate { index, x, y });
        }
        if !self.bounds.contains(x, y) {
            return Err(InsertError::OutOfBounds { index, x, y });
        }

        let root = self.root.get_or_insert_with(|| pool.acquire());
        let mut inserter = Inserter {
            pool,
            points,
            tolerance: self.tolerance,
        };
        inserter.insert(root, self.bounds, index)
    }

    /// Hand every node back to `pool`, children before parents.
    pub fn dispose(mut self, pool: &mut NodePool) {
        if let Some(root) = self.root.take() {
            pool.release(root);
        }
        trace!(idle = pool.len(), "Disposed quadtree");
    }

    #[inline]
    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    /// Square region the root covers.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Points dropped while building, in input order.
    #[inline]
    pub fn rejected(&self) -> &[InsertError] {
        &self.rejected
    }

    #[inline]
    pub fn coincidence_tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Depth-first, pre-order, children in slot order.
    pub fn iter(&self) -> Iter<'_> {
        let stack = self
            .root()
            .map(|node| NodeRef {
                node,
                bounds: self.bounds,
                depth: 0,
            })
            .into_iter()
            .collect();
        Iter { stack }
    }

    /// Depth-first visit that lets `visit` prune whole subtrees.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(NodeRef<'a>) -> Walk) {
        let mut stack: Vec<NodeRef<'a>> = self.iter().stack;
        while let Some(current) = stack.pop() {
            if visit(current) == Walk::Skip {
                continue;
            }
            push_children(&mut stack, current);
        }
    }

    /// Follow the quadrant decisions for the point with handle `index` down
    /// to the node it is attached to.
    pub fn locate<P: Point>(&self, points: &[P], index: usize) -> Option<&Node> {
        let point = points.get(index)?;
        let (x, y) = (point.x(), point.y());
        if !point.is_finite() {
            return None;
        }

        let mut node = self.root()?;
        let mut bounds = self.bounds;
        loop {
            if node.point() == Some(index) {
                return Some(node);
            }
            let quadrant = bounds.quadrant(x, y);
            node = node.get(quadrant)?;
            bounds = bounds.child(quadrant);
        }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of points held by the tree.
    pub fn point_count(&self) -> usize {
        self.iter().filter(|r| r.node.point().is_some()).count()
    }

    /// Depth of the deepest node; 0 for a lone root or an empty tree.
    pub fn depth(&self) -> usize {
        self.iter().map(|r| r.depth).max().unwrap_or(0)
    }

    fn reject(&mut self, err: InsertError) {
        warn!(%err, "Dropping point from quadtree");
        self.rejected.push(err);
    }
}

impl fmt::Debug for QuadTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadTree")
            .field("nodes", &self.node_count())
            .field("bounds", &self.bounds)
            .field("rejected", &self.rejected.len())
            .finish()
    }
}

impl Drop for QuadTree {
    // Undisposed trees are torn down without recursion, same as the pool does.
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> = self.root.take().into_iter().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.take_children().into_iter().flatten());
        }
    }
}

/// Pre-order iterator returned by [`QuadTree::iter`].
pub struct Iter<'a> {
    stack: Vec<NodeRef<'a>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        push_children(&mut self.stack, current);
        Some(current)
    }
}

/// Push in reverse so slot 1 is popped first.
fn push_children<'a>(stack: &mut Vec<NodeRef<'a>>, parent: NodeRef<'a>) {
    for quadrant in Quadrant::ALL.into_iter().rev() {
        if let Some(node) = parent.node.get(quadrant) {
            stack.push(NodeRef {
                node,
                bounds: parent.bounds.child(quadrant),
                depth: parent.depth + 1,
            });
        }
    }
}

/// State for one insertion.
struct Inserter<'a, P> {
    pool: &'a mut NodePool,
    points: &'a [P],
    tolerance: f64,
}

impl<P: Point> Inserter<'_, P> {
    fn coords(&self, index: usize) -> Result<(f64, f64), InsertError> {
        self.points
            .get(index)
            .map(|p| (p.x(), p.y()))
            .ok_or(InsertError::UnknownPoint {
                index,
                len: self.points.len(),
            })
    }

    /// Walk down from `root` until the point finds a free leaf.
    ///
    /// Iterative rather than recursive: a cluster of coincident points forms
    /// a chain one level per point, which can get arbitrarily long.
    fn insert(&mut self, root: &mut Node, bounds: Bounds, index: usize) -> Result<(), InsertError> {
        let (x, y) = self.coords(index)?;
        let mut node = root;
        let mut bounds = bounds;

        loop {
            if node.is_leaf() {
                let Some(anchor) = node.point() else {
                    node.attach(index);
                    return Ok(());
                };

                let (ax, ay) = self.coords(anchor)?;
                let coincident = (ax - x).abs() + (ay - y).abs() < self.tolerance;
                if !coincident {
                    // Split: the anchor moves into a fresh child, then the
                    // newcomer carries on from this now-internal node.
                    let quadrant = bounds.quadrant(ax, ay);
                    if quadrant == bounds.quadrant(x, y) && bounds.child(quadrant) == bounds {
                        // Both land in a cell that no longer shrinks.
                        return Err(InsertError::Unseparable { index, anchor });
                    }
                    node.detach();
                    node.child_or_insert_with(quadrant, || self.pool.acquire())
                        .attach(anchor);
                    continue;
                }
                // Coincident: the anchor stays, only the newcomer moves down.
            }

            let quadrant = bounds.quadrant(x, y);
            node = node.child_or_insert_with(quadrant, || self.pool.acquire());
            bounds = bounds.child(quadrant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeSettings;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn build(points: &[(f64, f64)]) -> (QuadTree, NodePool) {
        let mut pool = NodePool::new();
        let tree = QuadTree::build(&mut pool, &TreeConfig::default(), points);
        (tree, pool)
    }

    fn random_points(seed: u64, count: usize, extent: f64) -> Vec<(f64, f64)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| (rng.random_range(-extent..extent), rng.random_range(-extent..extent)))
            .collect()
    }

    fn nearly_square(b: Bounds) -> bool {
        (b.width() - b.height()).abs() <= 1e-9 * b.width().max(1.0)
    }

    /// Layout of a tree with point handles mapped through `map`.
    fn shape(tree: &QuadTree, map: impl Fn(usize) -> usize) -> Vec<(usize, bool, Option<usize>, Bounds)> {
        tree.iter()
            .map(|r| (r.depth, r.node.is_leaf(), r.node.point().map(&map), r.bounds))
            .collect()
    }

    #[test]
    fn test_four_corners() {
        let points = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)];
        let (tree, _pool) = build(&points);

        assert_eq!(tree.bounds(), Bounds::new(0.0, 0.0, 10.0, 10.0));
        let root = tree.root().unwrap();
        assert!(!root.is_leaf());
        assert!(root.point().is_none());
        for slot in 1..=4 {
            let child = root.child(slot).unwrap();
            assert!(child.is_leaf());
            assert_eq!(child.point(), Some(slot - 1));
        }
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.depth(), 1);
        assert!(tree.rejected().is_empty());
    }

    #[test]
    fn test_coincident_pair_keeps_anchor_on_internal_root() {
        let points = [(5.0, 5.0), (5.005, 5.005)];
        let (tree, _pool) = build(&points);

        let root = tree.root().unwrap();
        assert!(!root.is_leaf());
        assert_eq!(root.point(), Some(0));
        assert_eq!(root.children().count(), 1);

        let child = root.child(4).unwrap();
        assert!(child.is_leaf());
        assert_eq!(child.point(), Some(1));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_anchor_survives_later_non_coincident_points() {
        let points = [(5.0, 5.0), (5.004, 5.004), (9.0, 1.0)];
        let (tree, _pool) = build(&points);

        // Root is internal with its own anchor, so the third point just descends.
        let root = tree.root().unwrap();
        assert_eq!(root.point(), Some(0));
        for index in 0..points.len() {
            assert_eq!(tree.locate(&points, index).and_then(Node::point), Some(index));
        }
        assert_eq!(tree.point_count(), 3);
    }

    #[test]
    fn test_single_point() {
        let (tree, _pool) = build(&[(3.0, -4.0)]);
        let root = tree.root().unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.point(), Some(0));
        assert_eq!(tree.bounds(), Bounds::new(3.0, -4.0, 3.0, -4.0));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_empty_input() {
        let (tree, pool) = build(&[]);
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert_eq!(tree.bounds(), Bounds::ZERO);
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.depth(), 0);
        assert!(tree.rejected().is_empty());
        assert_eq!(pool.stats().allocated, 0);
    }

    #[test]
    fn test_all_points_invalid() {
        let points = [(f64::NAN, 1.0), (2.0, f64::NAN)];
        let (tree, _pool) = build(&points);
        assert!(tree.is_empty());
        assert_eq!(tree.bounds(), Bounds::ZERO);
        assert_eq!(tree.rejected().len(), 2);
        assert_eq!(tree.rejected()[1].index(), 1);
    }

    #[test]
    fn test_nan_rejection_leaves_structure_unchanged() {
        let clean = random_points(7, 200, 50.0);
        let nan_at = 57;
        let mut dirty = clean.clone();
        dirty.insert(nan_at, (f64::NAN, 3.0));
        dirty.push((1.0, f64::NAN));

        let (clean_tree, _) = build(&clean);
        let (dirty_tree, _) = build(&dirty);

        let unshift = |i: usize| if i > nan_at { i - 1 } else { i };
        assert_eq!(shape(&dirty_tree, unshift), shape(&clean_tree, |i| i));
        assert_eq!(dirty_tree.node_count(), clean_tree.node_count());

        let rejected: Vec<usize> = dirty_tree.rejected().iter().map(InsertError::index).collect();
        assert_eq!(rejected, vec![nan_at, dirty.len() - 1]);
        assert!(matches!(
            dirty_tree.rejected()[0],
            InsertError::InvalidCoordinate { index: 57, .. }
        ));
    }

    #[test]
    fn test_infinite_coordinate_rejected() {
        let points = [(0.0, 0.0), (f64::INFINITY, 1.0), (4.0, 4.0)];
        let (tree, _pool) = build(&points);
        assert_eq!(tree.bounds(), Bounds::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(tree.point_count(), 2);
        assert_eq!(tree.rejected()[0].index(), 1);
    }

    #[test]
    fn test_square_invariant() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let w = rng.random_range(0.1..1000.0);
            let h = rng.random_range(0.1..1000.0);
            let points: Vec<(f64, f64)> = (0..50)
                .map(|_| (rng.random_range(0.0..w), rng.random_range(0.0..h)))
                .collect();
            let (tree, _pool) = build(&points);
            let bounds = tree.bounds();
            assert!(nearly_square(bounds), "seed {seed}: {bounds:?}");
            assert!(tree.iter().all(|r| nearly_square(r.bounds)));
            assert!(tree.rejected().is_empty());
        }
    }

    #[test]
    fn test_containment_and_non_leaf_invariant() {
        let mut points = random_points(42, 500, 1000.0);
        // Duplicates and near-duplicates on top of the random spread.
        points.extend_from_slice(&[(1.0, 1.0), (1.0, 1.0), (1.003, 1.002), (1.02, 1.0)]);
        let (tree, _pool) = build(&points);

        assert!(tree.rejected().is_empty());
        assert_eq!(tree.point_count(), points.len());
        for index in 0..points.len() {
            let node = tree.locate(&points, index).expect("point reachable");
            assert_eq!(node.point(), Some(index));
        }
        for r in tree.iter() {
            assert_eq!(r.node.is_leaf(), r.node.children().count() == 0);
            if let Some(index) = r.node.point() {
                let (x, y) = points[index];
                assert!(r.bounds.contains(x, y));
            }
        }
    }

    #[test]
    fn test_walk_prunes_subtrees() {
        let points = random_points(3, 300, 100.0);
        let (tree, _pool) = build(&points);

        let mut visited = 0;
        tree.walk(|r| {
            visited += 1;
            if r.bounds.center_x() < tree.bounds().center_x() && r.depth >= 1 {
                Walk::Skip
            } else {
                Walk::Descend
            }
        });
        assert!(visited < tree.node_count());

        let mut all = 0;
        tree.walk(|_| {
            all += 1;
            Walk::Descend
        });
        assert_eq!(all, tree.node_count());
    }

    #[test]
    fn test_coincident_cluster_terminates() {
        let n = 64;
        let mut points = vec![(2.0, 2.0); n];
        points.extend((0..n).map(|i| (7.0 + i as f64 * 1e-5, 7.0)));
        let (tree, pool) = build(&points);

        assert_eq!(tree.point_count(), points.len());
        assert!(tree.node_count() <= 4 * points.len());
        assert_eq!(pool.stats().allocated as usize, tree.node_count());
        for index in 0..points.len() {
            assert!(tree.locate(&points, index).is_some());
        }
    }

    #[test]
    fn test_long_duplicate_chain() {
        let n = 1000;
        let points = vec![(1.0, 1.0); n];
        let (tree, mut pool) = build(&points);

        assert!(tree.rejected().is_empty());
        assert_eq!(tree.node_count(), n);
        assert_eq!(tree.depth(), n - 1);
        assert_eq!(tree.locate(&points, n - 1).and_then(Node::point), Some(n - 1));

        tree.dispose(&mut pool);
        assert_eq!(pool.len(), n);
    }

    #[test]
    fn test_pool_round_trip() {
        let points = random_points(11, 120, 10.0);
        let mut pool = NodePool::new();
        let config = TreeConfig::default();
        let tree = QuadTree::build(&mut pool, &config, &points);

        let mut before: Vec<usize> = tree.iter().map(|r| r.node as *const Node as usize).collect();
        let k = before.len();
        tree.dispose(&mut pool);
        assert_eq!(pool.len(), k);
        assert_eq!(pool.stats().released as usize, k);

        let nodes: Vec<Box<Node>> = (0..k).map(|_| pool.acquire()).collect();
        let mut after: Vec<usize> = nodes.iter().map(|n| &**n as *const Node as usize).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
        assert!(nodes.iter().all(|n| n.is_reset()));
        assert_eq!(pool.stats().allocated as usize, k);
    }

    #[test]
    fn test_rebuild_reuses_nodes() {
        let points = random_points(5, 80, 10.0);
        let mut pool = NodePool::new();
        let config = TreeConfig::default();

        let first = QuadTree::build(&mut pool, &config, &points);
        let k = first.node_count() as u64;
        first.dispose(&mut pool);

        let second = QuadTree::build(&mut pool, &config, &points);
        assert_eq!(second.node_count() as u64, k);
        assert_eq!(pool.stats().allocated, k);
        assert_eq!(pool.stats().reused, k);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_incremental_insert() {
        let points = [(1.0, 1.0), (3.0, 3.0), (20.0, 1.0), (f64::NAN, 0.0)];
        let mut pool = NodePool::new();
        let mut tree =
            QuadTree::with_bounds(&TreeConfig::default(), Bounds::new(0.0, 0.0, 4.0, 4.0));
        assert!(tree.is_empty());

        tree.insert(&mut pool, &points, 0).unwrap();
        tree.insert(&mut pool, &points, 1).unwrap();
        assert!(matches!(
            tree.insert(&mut pool, &points, 2),
            Err(InsertError::OutOfBounds { index: 2, .. })
        ));
        assert!(matches!(
            tree.insert(&mut pool, &points, 3),
            Err(InsertError::InvalidCoordinate { index: 3, .. })
        ));
        assert_eq!(
            tree.insert(&mut pool, &points, 9),
            Err(InsertError::UnknownPoint { index: 9, len: 4 })
        );
        assert_eq!(tree.point_count(), 2);
        // Incremental failures are returned, not recorded.
        assert!(tree.rejected().is_empty());
    }

    #[test]
    fn test_wide_range_keeps_every_separated_point() {
        // Far more than 128 halvings separate (0,0) from (1,1) inside this square.
        let points = [(0.0, 0.0), (1.0, 1.0), (1e40, 1e40)];
        let (tree, _pool) = build(&points);

        assert!(tree.rejected().is_empty());
        assert_eq!(tree.point_count(), 3);
        assert!(tree.depth() > 128);
        for index in 0..points.len() {
            assert_eq!(tree.locate(&points, index).and_then(Node::point), Some(index));
        }
    }

    #[test]
    fn test_tolerance_is_absolute() {
        // Same relative spacing, different scale: only the small pair is coincident.
        let small = [(0.0, 0.0), (0.004, 0.0)];
        let large = [(0.0, 0.0), (400.0, 0.0)];

        let (tree, _) = build(&small);
        assert_eq!(tree.root().unwrap().point(), Some(0));

        let (tree, _) = build(&large);
        assert_eq!(tree.root().unwrap().point(), None);
    }

    #[test]
    fn test_zero_tolerance_disables_coincidence() {
        let config = TreeConfig {
            tree: TreeSettings {
                coincidence_tolerance: 0.0,
            },
            ..TreeConfig::default()
        };
        let points = [(0.0, 0.0), (1.0, 1.0), (1.0, 1.0)];
        let mut pool = NodePool::new();
        let tree = QuadTree::build(&mut pool, &config, &points);

        assert_eq!(tree.coincidence_tolerance(), 0.0);
        // Identical points are refused once their cell stops shrinking.
        assert_eq!(
            tree.rejected(),
            &[InsertError::Unseparable { index: 2, anchor: 1 }]
        );
        assert_eq!(tree.locate(&points, 1).and_then(Node::point), Some(1));
        assert_eq!(tree.point_count(), 2);
    }

    #[test]
    fn test_glam_points() {
        let points = [glam::DVec2::new(0.0, 0.0), glam::DVec2::new(2.0, 1.0)];
        let mut pool = NodePool::new();
        let tree = QuadTree::build(&mut pool, &TreeConfig::default(), &points);
        assert_eq!(tree.bounds(), Bounds::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(tree.point_count(), 2);
    }
}
