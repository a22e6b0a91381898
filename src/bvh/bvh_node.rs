use tracing::trace;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;
use crate::bvh::Entry;
use crate::utils::{centroid_order, joint_aabb_of_entries};

/// The [`BvhNode`] enum that describes a node in a [`BvhTree`].
/// It's either a leaf node and references an entry (by holding its index)
/// or a regular node that has two child nodes.
/// Both variants store their own [`Aabb`]; for inner nodes it is the union
/// of the children's boxes.
///
/// [`BvhTree`]: struct.BvhTree.html
///
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BvhNode<T: BHValue, const D: usize> {
    /// Leaf node.
    Leaf {
        /// The node's parent. The root is its own parent.
        parent_index: usize,

        /// The box of the entry, unmodified.
        aabb: Aabb<T, D>,

        /// The entry contained in this leaf.
        entry_index: usize,
    },
    /// Inner node.
    Node {
        /// The node's parent. The root is its own parent.
        parent_index: usize,

        /// The union of both children's [`Aabb`]s.
        aabb: Aabb<T, D>,

        /// Index of the left subtree's root node.
        child_l_index: usize,

        /// Index of the right subtree's root node.
        child_r_index: usize,
    },
}

impl<T: BHValue, const D: usize> BvhNode<T, D> {
    /// Returns the index of the parent node.
    pub fn parent(&self) -> usize {
        match *self {
            BvhNode::Node { parent_index, .. } | BvhNode::Leaf { parent_index, .. } => parent_index,
        }
    }

    /// Returns the node's [`Aabb`].
    pub fn aabb(&self) -> &Aabb<T, D> {
        match self {
            BvhNode::Node { aabb, .. } | BvhNode::Leaf { aabb, .. } => aabb,
        }
    }

    /// Returns the indices of the left and right child,
    /// or [`None`] if this is a leaf.
    pub fn children(&self) -> Option<(usize, usize)> {
        match *self {
            BvhNode::Node {
                child_l_index,
                child_r_index,
                ..
            } => Some((child_l_index, child_r_index)),
            BvhNode::Leaf { .. } => None,
        }
    }

    /// Returns the index of the entry contained within the node if is a leaf,
    /// or [`None`] if it is an interior node.
    pub fn entry_index(&self) -> Option<usize> {
        match *self {
            BvhNode::Leaf { entry_index, .. } => Some(entry_index),
            BvhNode::Node { .. } => None,
        }
    }

    /// Returns true if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    /// The build function adds inner nodes before their children exist.
    /// A dummy created by this function is replaced once both children are built.
    fn create_dummy() -> BvhNode<T, D> {
        BvhNode::Leaf {
            parent_index: 0,
            aabb: Aabb::empty(),
            entry_index: 0,
        }
    }

    /// Builds a [`BvhNode`] recursively by splitting `indices` at the median centroid
    /// along the longest axis of their joint [`Aabb`].
    ///
    /// Nodes are appended to `nodes` in pre-order, so every subtree occupies a contiguous
    /// range and a left subtree always precedes its right sibling.
    /// `max_depth` is raised to the depth of the deepest leaf created.
    /// Returns the index of the new node in `nodes`.
    ///
    /// `indices` must not be empty.
    pub(crate) fn build<K: Ord>(
        entries: &[Entry<K, T, D>],
        indices: &mut [usize],
        nodes: &mut Vec<BvhNode<T, D>>,
        parent_index: usize,
        depth: usize,
        max_depth: &mut usize,
    ) -> usize {
        let node_index = nodes.len();

        // If there is only one element left, don't split anymore.
        if indices.len() == 1 {
            *max_depth = (*max_depth).max(depth);
            let entry_index = indices[0];
            nodes.push(BvhNode::Leaf {
                parent_index,
                aabb: entries[entry_index].aabb,
                entry_index,
            });
            return node_index;
        }

        let aabb_bounds = joint_aabb_of_entries(indices, entries);
        let split_axis = aabb_bounds.largest_axis();
        indices.sort_by(|&a, &b| centroid_order(&entries[a], &entries[b], split_axis));

        let (child_l_indices, child_r_indices) = indices.split_at_mut(indices.len() / 2);
        trace!(
            depth,
            split_axis,
            left = child_l_indices.len(),
            right = child_r_indices.len(),
            "splitting bvh node"
        );

        // The children must know their parent, so reserve its slot first.
        nodes.push(BvhNode::create_dummy());
        let child_l_index = BvhNode::build(
            entries,
            child_l_indices,
            nodes,
            node_index,
            depth + 1,
            max_depth,
        );
        let child_r_index = BvhNode::build(
            entries,
            child_r_indices,
            nodes,
            node_index,
            depth + 1,
            max_depth,
        );

        let aabb = nodes[child_l_index].aabb().join(nodes[child_r_index].aabb());
        nodes[node_index] = BvhNode::Node {
            parent_index,
            aabb,
            child_l_index,
            child_r_index,
        };
        node_index
    }

    /// Walks the subtree rooted at `node_index` in pre-order, left child first.
    /// The children of a node are only visited if `visitor` returned `true` for it.
    pub(crate) fn traverse_recursive<'a, K, F>(
        nodes: &'a [BvhNode<T, D>],
        entries: &'a [Entry<K, T, D>],
        node_index: usize,
        visitor: &mut F,
    ) where
        F: FnMut(&'a Aabb<T, D>, Option<&'a K>) -> bool,
    {
        match nodes[node_index] {
            BvhNode::Node {
                ref aabb,
                child_l_index,
                child_r_index,
                ..
            } => {
                if visitor(aabb, None) {
                    BvhNode::traverse_recursive(nodes, entries, child_l_index, visitor);
                    BvhNode::traverse_recursive(nodes, entries, child_r_index, visitor);
                }
            }
            BvhNode::Leaf {
                ref aabb,
                entry_index,
                ..
            } => {
                visitor(aabb, Some(&entries[entry_index].key));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::Aabb;
    use crate::bvh::{BvhNode, Entry};
    use crate::testbase::Point3;

    fn unit_entry(key: u32, x: f64) -> Entry<u32, f64, 3> {
        Entry {
            key,
            aabb: Aabb::with_bounds(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0)),
        }
    }

    #[test]
    fn test_build_lays_out_nodes_in_pre_order() {
        let entries: Vec<_> = (0..4).map(|i| unit_entry(i, f64::from(i) * 2.0)).collect();
        let mut indices = vec![3, 1, 0, 2];
        let mut nodes = Vec::new();
        let mut max_depth = 0;
        let root = BvhNode::build(&entries, &mut indices, &mut nodes, 0, 0, &mut max_depth);

        assert_eq!(root, 0);
        assert_eq!(nodes.len(), 7);
        // root -> (1 -> (2, 3), 4 -> (5, 6))
        assert_eq!(nodes[0].children(), Some((1, 4)));
        assert_eq!(nodes[1].children(), Some((2, 3)));
        assert_eq!(nodes[4].children(), Some((5, 6)));
        let leaves: Vec<_> = [2, 3, 5, 6]
            .iter()
            .map(|&i| nodes[i].entry_index())
            .collect();
        assert_eq!(leaves, vec![Some(0), Some(1), Some(2), Some(3)]);
        for child in 1..7 {
            let parent = nodes[child].parent();
            let (l, r) = nodes[parent].children().unwrap();
            assert!(l == child || r == child);
        }
    }

    #[test]
    fn test_inner_boxes_are_unions() {
        let entries: Vec<_> = (0..3).map(|i| unit_entry(i, f64::from(i) * 3.0)).collect();
        let mut indices = vec![0, 1, 2];
        let mut nodes = Vec::new();
        BvhNode::build(&entries, &mut indices, &mut nodes, 0, 0, &mut 0);

        for node in &nodes {
            if let Some((l, r)) = node.children() {
                assert_eq!(*node.aabb(), nodes[l].aabb().join(nodes[r].aabb()));
            }
        }
        assert_eq!(nodes[0].aabb().min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(nodes[0].aabb().max, Point3::new(7.0, 1.0, 1.0));
    }

    #[test]
    fn test_build_reports_deepest_leaf() {
        let entries: Vec<_> = (0..5).map(|i| unit_entry(i, f64::from(i))).collect();
        let mut indices: Vec<usize> = (0..5).collect();
        let mut nodes = Vec::new();
        let mut max_depth = 0;
        BvhNode::build(&entries, &mut indices, &mut nodes, 0, 0, &mut max_depth);
        // 5 -> (2, 3) -> 3 -> (1, 2)
        assert_eq!(max_depth, 3);

        let mut single = vec![0];
        let mut max_depth = 0;
        BvhNode::build(&entries, &mut single, &mut Vec::new(), 0, 0, &mut max_depth);
        assert_eq!(max_depth, 0);
    }
}
