//! Pooled region quadtree.
//!
//! Partitions a snapshot of 2-D points into square cells for force
//! aggregation and neighbour queries done by the caller. Trees are rebuilt
//! every simulation step, so nodes are recycled through a [`NodePool`].

pub mod bounds;
pub mod builder;
pub mod config;
pub mod error;
pub mod node;
pub mod point;
pub mod pool;
pub mod quadtree;

// Re-export commonly used types
pub use bounds::{Bounds, Quadrant};
pub use builder::TreeBuilder;
pub use config::{PoolConfig, TreeConfig, TreeSettings};
pub use error::{ConfigError, InsertError};
pub use node::Node;
pub use point::Point;
pub use pool::{NodePool, PoolStats};
pub use quadtree::{Iter, NodeRef, QuadTree, Walk};
