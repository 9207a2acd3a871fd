//! Adaptive octree sampling of the density field.

mod node;
mod split_policy;

pub use node::{children_dimensions, OctreeNode};
pub use split_policy::{OctreeNodeSplitPolicy, SplitDecision};
