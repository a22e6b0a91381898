//! Common utilities shared by unit tests.
#![cfg(test)]

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::aabb::{Aabb, Bounded};
use crate::bvh::BvhTree;

/// Point type used throughout the tests.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector represented as a tuple
pub type TupleVec = (f64, f64, f64);

/// Generate a [`TupleVec`] for [`proptest::strategy::Strategy`] from -10e10 to 10e10
/// A small enough range to keep sums and squares of coordinates exact enough for the tests.
pub fn tuplevec_small_strategy() -> impl Strategy<Value = TupleVec> {
    (
        -10e10_f64..10e10_f64,
        -10e10_f64..10e10_f64,
        -10e10_f64..10e10_f64,
    )
}

/// Generate a well-formed box with corners in a moderate range.
pub fn aabb_strategy() -> impl Strategy<Value = Aabb<f64, 3>> {
    (
        (-100.0_f64..100.0, -100.0_f64..100.0, -100.0_f64..100.0),
        (0.0_f64..20.0, 0.0_f64..20.0, 0.0_f64..20.0),
    )
        .prop_map(|(min, size)| {
            Aabb::with_bounds(
                Point3::new(min.0, min.1, min.2),
                Point3::new(min.0 + size.0, min.1 + size.1, min.2 + size.2),
            )
        })
}

/// Generate up to `max_len` boxes keyed by their position in the list.
pub fn keyed_aabbs_strategy(max_len: usize) -> impl Strategy<Value = Vec<(u32, Aabb<f64, 3>)>> {
    prop::collection::vec(aabb_strategy(), 0..max_len).prop_map(|aabbs| {
        aabbs
            .into_iter()
            .enumerate()
            .map(|(i, aabb)| (i as u32, aabb))
            .collect()
    })
}

/// Convert a [`TupleVec`] to a [`Point3`].
pub fn tuple_to_point(tpl: &TupleVec) -> Point3 {
    Point3::new(tpl.0, tpl.1, tpl.2)
}

/// Define some [`Bounded`] structure.
pub struct UnitBox {
    pub id: i32,
    pub pos: Point3,
}

impl UnitBox {
    pub fn new(id: i32, pos: Point3) -> UnitBox {
        UnitBox { id, pos }
    }
}

/// [`UnitBox`]'s [`Aabb`]s are unit [`Aabb`]s centered on the box's position.
impl Bounded<f64, 3> for UnitBox {
    fn aabb(&self) -> Aabb<f64, 3> {
        let min = Point3::new(self.pos.x - 0.5, self.pos.y - 0.5, self.pos.z - 0.5);
        let max = Point3::new(self.pos.x + 0.5, self.pos.y + 0.5, self.pos.z + 0.5);
        Aabb::with_bounds(min, max)
    }
}

/// Generate `n` [`UnitBox`]es along the diagonal, with ids `0..n` at `(id, id, id)`.
pub fn generate_unit_boxes(n: i32) -> Vec<UnitBox> {
    (0..n)
        .map(|id| UnitBox::new(id, Point3::new(f64::from(id), f64::from(id), f64::from(id))))
        .collect()
}

/// Builds a [`BvhTree`] over [`generate_unit_boxes`], keyed by id.
pub fn build_unit_box_tree(n: i32) -> BvhTree<i32, f64, 3> {
    BvhTree::build(generate_unit_boxes(n).into_iter().map(|b| (b.id, b)))
}

/// The three boxes of the reference scenario: `A` near the origin, `B` on the negative
/// diagonal (with its corners given upper-first) and `C` further out on the positive diagonal.
pub fn scenario_boxes() -> Vec<(&'static str, Aabb<f64, 3>)> {
    vec![
        (
            "A",
            Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
        ),
        (
            "B",
            Aabb::with_bounds(Point3::new(-2.0, -2.0, -2.0), Point3::new(-3.0, -3.0, -3.0)),
        ),
        (
            "C",
            Aabb::with_bounds(Point3::new(4.0, 4.0, 4.0), Point3::new(5.0, 5.0, 5.0)),
        ),
    ]
}

/// Returns a copy of `items` shuffled with a fixed seed.
pub fn shuffled<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut items = items.to_vec();
    items.shuffle(&mut rng);
    items
}

/// Collects the keys of all leaves in visiting order.
pub fn leaf_order<K: Clone, const D: usize>(tree: &BvhTree<K, f64, D>) -> Vec<K> {
    let mut keys = Vec::new();
    tree.traverse(|_, key| {
        if let Some(key) = key {
            keys.push(key.clone());
        }
        true
    });
    keys
}
