#![no_main]
use std::collections::BTreeSet;
use std::fmt::{self, Debug, Formatter};

use arbitrary::Arbitrary;
use bvh_tree::aabb::{Aabb, Bounded, IntersectsAabb};
use bvh_tree::bvh::BvhTree;
use libfuzzer_sys::fuzz_target;
use nalgebra::Point;
use ordered_float::NotNan;

type Float = f32;
const LIMIT: Float = 1_000_000.0;

fuzz_target!(|workload: Workload<3>| {
    workload.fuzz();
});

#[derive(Arbitrary)]
struct ArbitraryPoint<const D: usize> {
    coordinates: [NotNan<Float>; D],
}

impl<const D: usize> ArbitraryPoint<D> {
    fn point(&self) -> Point<Float, D> {
        Point::<_, D>::from_slice(&self.coordinates).map(|f| f.into_inner().clamp(-LIMIT, LIMIT))
    }
}

#[derive(Arbitrary)]
struct ArbitraryShape<const D: usize> {
    a: ArbitraryPoint<D>,
    b: ArbitraryPoint<D>,
}

impl<const D: usize> Debug for ArbitraryShape<D> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.aabb(), f)
    }
}

impl<const D: usize> Bounded<Float, D> for ArbitraryShape<D> {
    fn aabb(&self) -> Aabb<Float, D> {
        let a = self.a.point();
        let b = self.b.point();
        Aabb::with_bounds(a.inf(&b), a.sup(&b))
    }
}

#[derive(Debug, Arbitrary)]
struct Workload<const D: usize> {
    shapes: Vec<ArbitraryShape<D>>,
    point: ArbitraryPoint<D>,
    query: ArbitraryShape<D>,
}

impl<const D: usize> Debug for ArbitraryPoint<D> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&self.point(), f)
    }
}

impl<const D: usize> Workload<D> {
    fn fuzz(self) {
        let tree = BvhTree::build(self.shapes.iter().enumerate());
        tree.assert_consistent();

        // Every entry is reached exactly once by an unconditional walk.
        let mut visited = Vec::new();
        tree.traverse(|_, key| {
            if let Some(key) = key {
                visited.push(*key);
            }
            true
        });
        visited.sort_unstable();
        assert_eq!(visited, (0..self.shapes.len()).collect::<Vec<_>>());

        // Parents bound their children, so pruning must agree with a linear scan.
        let point = self.point.point();
        let query = self.query.aabb();
        let brute_force = |test: &dyn Fn(&Aabb<Float, D>) -> bool| {
            self.shapes
                .iter()
                .enumerate()
                .filter(|(_, shape)| test(&shape.aabb()))
                .map(|(i, _)| i)
                .collect::<BTreeSet<_>>()
        };
        let found: BTreeSet<usize> = tree.find(&point).into_iter().copied().collect();
        assert_eq!(found, brute_force(&|aabb| aabb.contains(&point)));
        let found: BTreeSet<usize> = tree.find(&query).into_iter().copied().collect();
        assert_eq!(found, brute_force(&|aabb| query.intersects_aabb(aabb)));

        // Best-first search finds the closest box.
        let nearest = tree.nearest_to(&point).map(|(_, distance)| distance);
        let expected = self
            .shapes
            .iter()
            .map(|shape| shape.aabb().distance_squared(&point))
            .reduce(Float::min);
        assert_eq!(nearest, expected);

        // Building from a reversed input gives the same tree.
        let reversed = BvhTree::build(self.shapes.iter().enumerate().rev());
        let leaf_order = |tree: &BvhTree<usize, Float, D>| {
            tree.iter().map(|(key, aabb)| (*key, *aabb)).collect::<Vec<_>>()
        };
        assert_eq!(leaf_order(&reversed), leaf_order(&tree));
    }
}
