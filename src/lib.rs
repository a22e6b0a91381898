//! A crate which exports axis-aligned bounding boxes and a binary bounding volume
//! hierarchy over keyed boxes.
//!
//! ## About
//!
//! A BVH (Bounding Volume Hierarchy) is a binary tree in which every node's box bounds all
//! boxes below it. Spatial queries walk the tree and skip every subtree whose box cannot
//! match, which reduces the cost of a query from O(n) to roughly O(log2(n)) at the cost of
//! building the tree once in advance.
//!
//! [`BvhTree`](bvh::BvhTree) is built top-down from `(key, box)` pairs: each level splits
//! its entries at the median centroid along the longest axis of their joint box. The tree
//! is immutable once built. Queries use [`BvhTree::traverse`](bvh::BvhTree::traverse), a
//! pre-order, left-first walk in which a visitor decides whether to descend into each node.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//!
//! use bvh_tree::aabb::Aabb;
//! use bvh_tree::bvh::BvhTree;
//! use nalgebra::Point3;
//!
//! let mut boxes = HashMap::new();
//! boxes.insert("A", Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)));
//! boxes.insert("B", Aabb::with_bounds(Point3::new(-3.0, -3.0, -3.0), Point3::new(-2.0, -2.0, -2.0)));
//! boxes.insert("C", Aabb::with_bounds(Point3::new(4.0, 4.0, 4.0), Point3::new(5.0, 5.0, 5.0)));
//!
//! let tree = BvhTree::build(boxes);
//!
//! // Visit every leaf, left to right.
//! let mut order = Vec::new();
//! tree.traverse(|_, key| {
//!     if let Some(key) = key {
//!         order.push(*key);
//!     }
//!     true
//! });
//! assert_eq!(order, vec!["B", "A", "C"]);
//!
//! // Only descend into boxes that contain the point.
//! let point = Point3::new(0.5, 0.5, 0.5);
//! let mut hits = Vec::new();
//! tree.traverse(|aabb, key| {
//!     if !aabb.contains(&point) {
//!         return false;
//!     }
//!     hits.extend(key.copied());
//!     true
//! });
//! assert_eq!(hits, vec!["A"]);
//! ```
//!
//! ## Features
//!
//! - `serde` (default **disabled**) - adds `Serialize` and `Deserialize` implementations for
//!   [`Aabb`](aabb::Aabb), [`BvhNode`](bvh::BvhNode) and [`BvhTree`](bvh::BvhTree)
//!
//! ## Logging
//!
//! Building emits [`tracing`] events: one `debug` event per tree and one `trace` event per
//! split. Install a subscriber to see them.
//!

#![deny(missing_docs)]

pub mod aabb;
pub mod bounding_hierarchy;
pub mod bvh;
pub mod error;
mod utils;

#[cfg(test)]
mod testbase;
