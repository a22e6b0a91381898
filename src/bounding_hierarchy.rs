//! This module defines the [`BoundingHierarchy`] trait and the [`BHValue`] scalar bound.

use std::fmt::Display;

use nalgebra::Scalar;
use num_traits::{Float, FromPrimitive, ToPrimitive};

use crate::aabb::{Aabb, Bounded};

/// Encapsulates the required traits for the value type used in the hierarchy.
///
/// Implemented for every float scalar nalgebra can store, e.g. `f32` and `f64`.
pub trait BHValue: Scalar + Copy + Float + FromPrimitive + ToPrimitive + Display {}

impl<T> BHValue for T where T: Scalar + Copy + Float + FromPrimitive + ToPrimitive + Display {}

/// This trait defines an acceleration structure with space partitioning.
/// It is built once from keyed boxes and queried through a pruning walk.
pub trait BoundingHierarchy<K, T: BHValue, const D: usize> {
    /// Creates a new [`BoundingHierarchy`] from `(key, shape)` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use bvh_tree::bounding_hierarchy::BoundingHierarchy;
    /// use bvh_tree::bvh::BvhTree;
    /// use nalgebra::Point3;
    ///
    /// let boxes = vec![
    ///     ("a", Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))),
    ///     ("b", Aabb::with_bounds(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0))),
    /// ];
    /// let tree = <BvhTree<&str, f64, 3> as BoundingHierarchy<_, _, 3>>::build(boxes);
    /// assert_eq!(tree.len(), 2);
    /// ```
    fn build<B, I>(entries: I) -> Self
    where
        B: Bounded<T, D>,
        I: IntoIterator<Item = (K, B)>;

    /// Walks the [`BoundingHierarchy`] in pre-order, left child first.
    ///
    /// `visitor` receives the node's [`Aabb`] and, for leaves, the key. Returning `false`
    /// skips the children of the visited node.
    fn traverse<F>(&self, visitor: F)
    where
        F: FnMut(&Aabb<T, D>, Option<&K>) -> bool;

    /// Prints the [`BoundingHierarchy`] in a tree-like visualization.
    fn pretty_print(&self) {}
}
