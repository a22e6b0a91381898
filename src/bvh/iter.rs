use crate::aabb::{Aabb, IntersectsAabb};
use crate::bounding_hierarchy::BHValue;
use crate::bvh::{BvhNode, BvhTree};

/// Iterator over every leaf of a [`BvhTree`], in left-to-right order.
pub type BvhLeafIter<'bvh, K, T, const D: usize> = BvhTraverseIterator<'bvh, K, T, D, Aabb<T, D>>;

/// Iterator to traverse a [`BvhTree`] without recursion.
///
/// Visits nodes in the same order as [`BvhTree::traverse`] and prunes every subtree whose
/// [`Aabb`] does not intersect the query. Yields the key and box of each reached leaf that
/// intersects the query.
pub struct BvhTraverseIterator<'bvh, K, T: BHValue, const D: usize, Query: IntersectsAabb<T, D>> {
    /// Reference to the [`BvhTree`] to traverse
    bvh: &'bvh BvhTree<K, T, D>,
    /// The input query
    query: Query,
    /// Nodes still to be visited; the next one is on top.
    stack: Vec<usize>,
}

impl<'bvh, K, T: BHValue, const D: usize, Query: IntersectsAabb<T, D>>
    BvhTraverseIterator<'bvh, K, T, D, Query>
{
    /// Creates a new [`BvhTraverseIterator`]
    pub fn new(bvh: &'bvh BvhTree<K, T, D>, query: Query) -> Self {
        let mut stack = Vec::with_capacity(bvh.depth() + 2);
        if !bvh.is_empty() {
            stack.push(0);
        }
        BvhTraverseIterator { bvh, query, stack }
    }
}

impl<'bvh, K, T: BHValue, const D: usize, Query: IntersectsAabb<T, D>> Iterator
    for BvhTraverseIterator<'bvh, K, T, D, Query>
{
    type Item = (&'bvh K, &'bvh Aabb<T, D>);

    fn next(&mut self) -> Option<(&'bvh K, &'bvh Aabb<T, D>)> {
        let bvh = self.bvh;
        while let Some(node_index) = self.stack.pop() {
            let node = &bvh.nodes()[node_index];
            if !self.query.intersects_aabb(node.aabb()) {
                continue;
            }
            match *node {
                BvhNode::Node {
                    child_l_index,
                    child_r_index,
                    ..
                } => {
                    // Right goes first so that the left subtree is popped first.
                    self.stack.push(child_r_index);
                    self.stack.push(child_l_index);
                }
                BvhNode::Leaf {
                    ref aabb,
                    entry_index,
                    ..
                } => {
                    return Some((&bvh.entries()[entry_index].key, aabb));
                }
            }
        }
        None
    }
}
