use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point;

use crate::bounding_hierarchy::BHValue;
use crate::bvh::{BvhNode, BvhTree};

/// A node waiting in the best-first heap, keyed by its squared distance to the query point.
#[derive(Debug, Clone, Copy)]
pub struct BestFirstCandidate<T: BHValue> {
    /// Squared distance from the query point to the node's box
    pub distance_squared: T,
    /// Node to test next
    pub node_index: usize,
}

impl<T: BHValue> BestFirstCandidate<T> {
    /// Create new instance of [`BestFirstCandidate`]
    pub fn new(node_index: usize, distance_squared: T) -> Self {
        Self {
            distance_squared,
            node_index,
        }
    }
}

// `BinaryHeap` is a max-heap; order reversed so the closest, then leftmost, node pops first.
impl<T: BHValue> Ord for BestFirstCandidate<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared
            .partial_cmp(&other.distance_squared)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.node_index.cmp(&other.node_index))
            .reverse()
    }
}

impl<T: BHValue> PartialOrd for BestFirstCandidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: BHValue> PartialEq for BestFirstCandidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: BHValue> Eq for BestFirstCandidate<T> {}

impl<K, T: BHValue, const D: usize> BvhTree<K, T, D> {
    /// Returns the key whose box is closest to `point`, together with the squared distance
    /// (zero if a box contains the point), or [`None`] for an empty tree.
    ///
    /// Subtrees are explored closest first and abandoned as soon as their box is no closer
    /// than the best leaf found so far. On equal distances the leftmost leaf wins.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use bvh_tree::bvh::BvhTree;
    /// use nalgebra::Point3;
    ///
    /// let tree = BvhTree::build(vec![
    ///     ("near", Aabb::with_bounds(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0))),
    ///     ("far", Aabb::with_bounds(Point3::new(8.0, 0.0, 0.0), Point3::new(9.0, 1.0, 1.0))),
    /// ]);
    /// assert_eq!(tree.nearest_to(&Point3::new(0.0, 0.5, 0.5)), Some((&"near", 1.0)));
    /// ```
    pub fn nearest_to(&self, point: &Point<T, D>) -> Option<(&K, T)> {
        let mut heap = BinaryHeap::new();
        self.nearest_to_with_heap(point, &mut heap)
    }

    /// Same as [`BvhTree::nearest_to`] but reuses the allocation of `heap`.
    pub fn nearest_to_with_heap(
        &self,
        point: &Point<T, D>,
        heap: &mut BinaryHeap<BestFirstCandidate<T>>,
    ) -> Option<(&K, T)> {
        heap.clear();
        let root_aabb = self.root_aabb()?;
        heap.push(BestFirstCandidate::new(0, root_aabb.distance_squared(point)));

        let mut best: Option<(usize, T)> = None;
        while let Some(next) = heap.pop() {
            if let Some((_, best_distance)) = best {
                // Everything left is at least as far and further right.
                if next.distance_squared >= best_distance {
                    break;
                }
            }

            match self.nodes()[next.node_index] {
                BvhNode::Leaf { .. } => {
                    best = Some((next.node_index, next.distance_squared));
                }
                BvhNode::Node {
                    child_l_index,
                    child_r_index,
                    ..
                } => {
                    for child_index in [child_l_index, child_r_index] {
                        let distance_squared = self.nodes()[child_index].aabb().distance_squared(point);
                        heap.push(BestFirstCandidate::new(child_index, distance_squared));
                    }
                }
            }
        }

        let (node_index, distance_squared) = best?;
        self.leaf_entry(node_index)
            .map(|entry| (&entry.key, distance_squared))
    }
}
