//! This module defines [`BvhTree`] and its building and traversal procedures.
//!
//! [`BvhTree`]: struct.BvhTree.html
//!

use std::fmt::Debug;
use std::iter::repeat;

use nalgebra::Point;
use tracing::debug;

use crate::aabb::{Aabb, Bounded, IntersectsAabb};
use crate::bounding_hierarchy::{BHValue, BoundingHierarchy};
use crate::bvh::iter::{BvhLeafIter, BvhTraverseIterator};
use crate::bvh::BvhNode;
#[cfg(feature = "serde")]
use crate::error::BvhError;

/// A caller-supplied key paired with the [`Aabb`] it was inserted with.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry<K, T: BHValue, const D: usize> {
    /// The caller's identifier.
    pub key: K,

    /// The box the key was inserted with.
    pub aabb: Aabb<T, D>,
}

/// The [`BvhTree`] data structure. Contains the list of [`BvhNode`]s and the entries
/// they refer to.
///
/// The tree is built once and immutable afterwards. The root node is stored at index `0`
/// and nodes are laid out in pre-order. An empty tree has no nodes.
///
/// With the `serde` feature a deserialized tree is checked with
/// [`BvhTree::is_consistent`] and rejected if the check fails.
///
/// [`BvhTree`]: struct.BvhTree.html
///
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BvhTree<K, T: BHValue, const D: usize> {
    entries: Vec<Entry<K, T, D>>,
    nodes: Vec<BvhNode<T, D>>,
    /// Edges on the longest root-to-leaf path, recomputed on deserialization.
    #[cfg_attr(feature = "serde", serde(skip))]
    depth: usize,
}

impl<K, T: BHValue, const D: usize> BvhTree<K, T, D> {
    /// Creates a new [`BvhTree`] from `(key, shape)` pairs.
    ///
    /// Keys are expected to be unique, as in a map. The resulting tree does not depend on the
    /// order in which the pairs are supplied: entries whose centroids tie on the split axis
    /// are ordered by key. This is why keys must be [`Ord`] rather than only hashable; wrap
    /// hash-only keys in a type with a total order (e.g. an index into a side table) first.
    ///
    /// Boxes are not validated; a box with `min > max` on some axis gives an unspecified
    /// (but memory-safe) tree.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashMap;
    ///
    /// use bvh_tree::aabb::Aabb;
    /// use bvh_tree::bvh::BvhTree;
    /// use nalgebra::Point3;
    ///
    /// let mut boxes = HashMap::new();
    /// boxes.insert("a", Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)));
    /// boxes.insert("b", Aabb::with_bounds(Point3::new(4.0, 4.0, 4.0), Point3::new(5.0, 5.0, 5.0)));
    ///
    /// let tree = BvhTree::build(boxes);
    /// assert_eq!(tree.len(), 2);
    /// assert_eq!(tree.node_count(), 3);
    /// ```
    pub fn build<B, I>(entries: I) -> BvhTree<K, T, D>
    where
        K: Ord,
        B: Bounded<T, D>,
        I: IntoIterator<Item = (K, B)>,
    {
        let entries: Vec<Entry<K, T, D>> = entries
            .into_iter()
            .map(|(key, shape)| Entry {
                aabb: shape.aabb(),
                key,
            })
            .collect();

        let expected_node_count = (entries.len() * 2).saturating_sub(1);
        let mut nodes = Vec::with_capacity(expected_node_count);
        let mut depth = 0;
        if !entries.is_empty() {
            let mut indices = (0..entries.len()).collect::<Vec<usize>>();
            BvhNode::build(&entries, &mut indices, &mut nodes, 0, 0, &mut depth);
        }

        debug!(
            entries = entries.len(),
            nodes = nodes.len(),
            depth,
            "built bvh"
        );
        BvhTree {
            entries,
            nodes,
            depth,
        }
    }

    /// Traverses the [`BvhTree`] in pre-order, left subtree before right subtree.
    ///
    /// `visitor` is called once per reached node with the node's [`Aabb`] and, for leaves,
    /// the entry's key. Its return value controls descent: `true` visits the node's children,
    /// `false` skips them. Siblings that were already due are still visited, so returning
    /// `false` never ends the walk early. On an empty tree `visitor` is never called.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use bvh_tree::bvh::BvhTree;
    /// use nalgebra::Point3;
    ///
    /// let tree = BvhTree::build(vec![
    ///     ("a", Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))),
    ///     ("b", Aabb::with_bounds(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0))),
    ///     ("c", Aabb::with_bounds(Point3::new(4.0, 4.0, 4.0), Point3::new(5.0, 5.0, 5.0))),
    /// ]);
    ///
    /// let query = Point3::new(0.5, 0.5, 0.5);
    /// let mut found = Vec::new();
    /// tree.traverse(|aabb, key| {
    ///     if !aabb.contains(&query) {
    ///         return false;
    ///     }
    ///     if let Some(key) = key {
    ///         found.push(*key);
    ///     }
    ///     true
    /// });
    /// assert_eq!(found, vec!["a"]);
    /// ```
    pub fn traverse<'a, F>(&'a self, mut visitor: F)
    where
        F: FnMut(&'a Aabb<T, D>, Option<&'a K>) -> bool,
    {
        if self.nodes.is_empty() {
            return;
        }
        BvhNode::traverse_recursive(&self.nodes, &self.entries, 0, &mut visitor);
    }

    /// Returns the keys of all leaves whose [`Aabb`], and every ancestor's [`Aabb`],
    /// intersect `query`. Keys are returned in left-to-right order.
    pub fn find<'a, Q>(&'a self, query: &Q) -> Vec<&'a K>
    where
        Q: IntersectsAabb<T, D>,
    {
        let mut keys = Vec::new();
        self.traverse(|aabb, key| {
            if !query.intersects_aabb(aabb) {
                return false;
            }
            if let Some(key) = key {
                keys.push(key);
            }
            true
        });
        keys
    }

    /// Returns the keys of all leaves whose [`Aabb`] contains `point`, pruning every
    /// subtree whose box does not contain it.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use bvh_tree::bvh::BvhTree;
    /// use nalgebra::Point3;
    ///
    /// let tree = BvhTree::build(vec![
    ///     (1, Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0))),
    ///     (2, Aabb::with_bounds(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0))),
    ///     (3, Aabb::with_bounds(Point3::new(5.0, 5.0, 5.0), Point3::new(6.0, 6.0, 6.0))),
    /// ]);
    /// assert_eq!(tree.find_containing(&Point3::new(1.5, 1.5, 1.5)), vec![&1, &2]);
    /// ```
    pub fn find_containing(&self, point: &Point<T, D>) -> Vec<&K> {
        self.find(point)
    }

    /// Creates a [`BvhTraverseIterator`] which yields, in left-to-right order, every leaf
    /// whose [`Aabb`] and ancestors' [`Aabb`]s intersect `query`.
    ///
    /// `query` may be a reference, so a query can be reused across iterations.
    pub fn traverse_iterator<Q>(&self, query: Q) -> BvhTraverseIterator<'_, K, T, D, Q>
    where
        Q: IntersectsAabb<T, D>,
    {
        BvhTraverseIterator::new(self, query)
    }

    /// Returns an iterator over all leaves as `(key, aabb)` pairs, in left-to-right order.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use bvh_tree::bvh::BvhTree;
    /// use nalgebra::Point3;
    ///
    /// let tree = BvhTree::build(vec![
    ///     ("right", Aabb::with_bounds(Point3::new(4.0, 0.0, 0.0), Point3::new(5.0, 1.0, 1.0))),
    ///     ("left", Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))),
    /// ]);
    /// let keys: Vec<_> = tree.iter().map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec!["left", "right"]);
    /// ```
    pub fn iter(&self) -> BvhLeafIter<'_, K, T, D> {
        BvhTraverseIterator::new(self, Aabb::infinite())
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of nodes, `2 * len() - 1` for a non-empty tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges on the longest root-to-leaf path.
    /// Both an empty tree and a single leaf have depth `0`. Computed once while building.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the [`Aabb`] of the root node, which bounds every entry,
    /// or [`None`] for an empty tree.
    pub fn root_aabb(&self) -> Option<&Aabb<T, D>> {
        self.nodes.first().map(BvhNode::aabb)
    }

    /// Returns the node arena. The root is at index `0`.
    pub fn nodes(&self) -> &[BvhNode<T, D>] {
        &self.nodes
    }

    /// Returns the entries in the order they were supplied to [`BvhTree::build`].
    pub fn entries(&self) -> &[Entry<K, T, D>] {
        &self.entries
    }

    /// Returns the entry referenced by the leaf at `node_index`.
    pub(crate) fn leaf_entry(&self, node_index: usize) -> Option<&Entry<K, T, D>> {
        self.nodes
            .get(node_index)
            .and_then(BvhNode::entry_index)
            .map(|entry_index| &self.entries[entry_index])
    }

    /// Prints the [`BvhTree`] in a tree-like visualization.
    pub fn pretty_print(&self)
    where
        K: Debug,
    {
        if !self.nodes.is_empty() {
            self.print_node(0, 0);
        }
    }

    fn print_node(&self, node_index: usize, depth: usize)
    where
        K: Debug,
    {
        let padding: String = repeat(" ").take(depth).collect();
        match self.nodes[node_index] {
            BvhNode::Node {
                ref aabb,
                child_l_index,
                child_r_index,
                ..
            } => {
                println!("{}node={} {}", padding, node_index, aabb);
                self.print_node(child_l_index, depth + 1);
                self.print_node(child_r_index, depth + 1);
            }
            BvhNode::Leaf {
                ref aabb,
                entry_index,
                ..
            } => {
                println!(
                    "{}leaf={} key={:?} {}",
                    padding, node_index, self.entries[entry_index].key, aabb
                );
            }
        }
    }

    /// Verifies that the node at `node_index` has the parent `expected_parent_index`,
    /// that its box is exactly the union of its children's boxes (or the entry's box for
    /// leaves), and counts the visited nodes and entries.
    ///
    /// Gives up once more nodes were visited than exist, so cyclic child links terminate.
    fn is_consistent_subtree(
        &self,
        node_index: usize,
        expected_parent_index: usize,
        depth: usize,
        stats: &mut SubtreeStats,
        entry_seen: &mut [bool],
    ) -> bool {
        let Some(node) = self.nodes.get(node_index) else {
            return false;
        };
        stats.node_count += 1;
        if stats.node_count > self.nodes.len() {
            return false;
        }
        let correct_parent_index = node.parent() == expected_parent_index;

        match *node {
            BvhNode::Node {
                ref aabb,
                child_l_index,
                child_r_index,
                ..
            } => {
                let (Some(child_l), Some(child_r)) =
                    (self.nodes.get(child_l_index), self.nodes.get(child_r_index))
                else {
                    return false;
                };
                let tight = *aabb == child_l.aabb().join(child_r.aabb());
                correct_parent_index
                    && tight
                    && self.is_consistent_subtree(
                        child_l_index,
                        node_index,
                        depth + 1,
                        stats,
                        entry_seen,
                    )
                    && self.is_consistent_subtree(
                        child_r_index,
                        node_index,
                        depth + 1,
                        stats,
                        entry_seen,
                    )
            }
            BvhNode::Leaf {
                ref aabb,
                entry_index,
                ..
            } => {
                let Some(entry) = self.entries.get(entry_index) else {
                    return false;
                };
                stats.max_depth = stats.max_depth.max(depth);
                let first_visit = !std::mem::replace(&mut entry_seen[entry_index], true);
                correct_parent_index && first_visit && *aabb == entry.aabb
            }
        }
    }

    /// Checks that all nodes have the correct parent index, that every inner box is the
    /// exact union of its children's boxes, that every leaf carries its entry's box, and that
    /// every node and entry is reachable from the root exactly once.
    pub fn is_consistent(&self) -> bool {
        self.checked_depth().is_some()
    }

    /// Returns the depth of the tree if it is consistent.
    fn checked_depth(&self) -> Option<usize> {
        if self.nodes.is_empty() {
            return self.entries.is_empty().then_some(0);
        }

        let mut stats = SubtreeStats::default();
        let mut entry_seen = vec![false; self.entries.len()];
        let subtree_consistent = self.is_consistent_subtree(0, 0, 0, &mut stats, &mut entry_seen);

        // If not every node was counted from the root, there is a detached subtree.
        let is_connected = stats.node_count == self.nodes.len();
        let all_entries = entry_seen.iter().all(|seen| *seen);
        (subtree_consistent && is_connected && all_entries).then_some(stats.max_depth)
    }

    /// Assert version of [`BvhTree::is_consistent`] which reports the first violation.
    pub fn assert_consistent(&self) {
        if self.nodes.is_empty() {
            assert!(self.entries.is_empty(), "Entries without nodes");
            return;
        }
        assert_eq!(
            self.nodes.len(),
            self.entries.len() * 2 - 1,
            "Wrong node count for {} entries",
            self.entries.len()
        );

        let mut entry_seen = vec![false; self.entries.len()];
        let mut stack = vec![(0, 0)];
        let mut node_count = 0;
        while let Some((node_index, expected_parent_index)) = stack.pop() {
            node_count += 1;
            let node = &self.nodes[node_index];
            assert_eq!(
                expected_parent_index,
                node.parent(),
                "Wrong parent index for node {}. Expected: {}; Actual: {}",
                node_index,
                expected_parent_index,
                node.parent()
            );
            match *node {
                BvhNode::Node {
                    ref aabb,
                    child_l_index,
                    child_r_index,
                    ..
                } => {
                    let joint = self.nodes[child_l_index]
                        .aabb()
                        .join(self.nodes[child_r_index].aabb());
                    assert_eq!(
                        *aabb, joint,
                        "Node {} is not the union of its children.\n\tStored: {}\n\tUnion: {}",
                        node_index, aabb, joint
                    );
                    stack.push((child_r_index, node_index));
                    stack.push((child_l_index, node_index));
                }
                BvhNode::Leaf {
                    ref aabb,
                    entry_index,
                    ..
                } => {
                    assert!(
                        !entry_seen[entry_index],
                        "Entry {} is referenced twice",
                        entry_index
                    );
                    entry_seen[entry_index] = true;
                    assert_eq!(
                        *aabb, self.entries[entry_index].aabb,
                        "Leaf {} does not carry its entry's box",
                        node_index
                    );
                }
            }
        }
        assert_eq!(node_count, self.nodes.len(), "Detached subtree");
        assert!(entry_seen.iter().all(|seen| *seen), "Unreachable entry");
    }
}

/// Running totals of [`BvhTree::is_consistent_subtree`].
#[derive(Default)]
struct SubtreeStats {
    node_count: usize,
    max_depth: usize,
}

/// Field layout of a serialized [`BvhTree`], checked before it becomes one.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SerializedBvhTree<K, T: BHValue, const D: usize> {
    entries: Vec<Entry<K, T, D>>,
    nodes: Vec<BvhNode<T, D>>,
}

#[cfg(feature = "serde")]
impl<'de, K, T, const D: usize> serde::Deserialize<'de> for BvhTree<K, T, D>
where
    K: serde::Deserialize<'de>,
    T: BHValue + serde::Deserialize<'de>,
{
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: serde::Deserializer<'de>,
    {
        let SerializedBvhTree { entries, nodes } = SerializedBvhTree::deserialize(deserializer)?;
        let mut tree = BvhTree {
            entries,
            nodes,
            depth: 0,
        };
        tree.depth = tree
            .checked_depth()
            .ok_or_else(|| serde::de::Error::custom(BvhError::InconsistentTree))?;
        Ok(tree)
    }
}

impl<K: Ord + Debug, T: BHValue, const D: usize> BoundingHierarchy<K, T, D> for BvhTree<K, T, D> {
    fn build<B, I>(entries: I) -> BvhTree<K, T, D>
    where
        B: Bounded<T, D>,
        I: IntoIterator<Item = (K, B)>,
    {
        BvhTree::build(entries)
    }

    fn traverse<F>(&self, visitor: F)
    where
        F: FnMut(&Aabb<T, D>, Option<&K>) -> bool,
    {
        self.traverse(visitor);
    }

    fn pretty_print(&self) {
        self.pretty_print();
    }
}
