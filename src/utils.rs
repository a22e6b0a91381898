//! Utilities module.

use std::cmp::Ordering;

use crate::aabb::Aabb;
use crate::bounding_hierarchy::BHValue;
use crate::bvh::Entry;

/// Returns the joint [`Aabb`] of the entries addressed by `indices`.
pub fn joint_aabb_of_entries<K, T: BHValue, const D: usize>(
    indices: &[usize],
    entries: &[Entry<K, T, D>],
) -> Aabb<T, D> {
    let mut aabb = Aabb::empty();
    for index in indices {
        aabb.join_mut(&entries[*index].aabb);
    }
    aabb
}

/// Orders two entries by their centroid on `axis`, falling back to the key.
///
/// The key fallback makes the order total for unique keys, so sorting with it gives the
/// same sequence whatever order the entries were supplied in.
pub fn centroid_order<K: Ord, T: BHValue, const D: usize>(
    a: &Entry<K, T, D>,
    b: &Entry<K, T, D>,
    axis: usize,
) -> Ordering {
    let a_center = a.aabb.center()[axis];
    let b_center = b.aabb.center()[axis];
    // NaN centroids sort after every number.
    a_center
        .partial_cmp(&b_center)
        .unwrap_or_else(|| a_center.is_nan().cmp(&b_center.is_nan()))
        .then_with(|| a.key.cmp(&b.key))
}
