use bvh_tree::aabb::{Aabb, Bounded};
use bvh_tree::bvh::BvhTree;
use nalgebra::{Point, SVector};
use tracing::Level;

#[derive(Debug)]
struct Sphere {
    position: Point<f32, 3>,
    radius: f32,
}

impl Bounded<f32, 3> for Sphere {
    fn aabb(&self) -> Aabb<f32, 3> {
        let half_size = SVector::<f32, 3>::new(self.radius, self.radius, self.radius);
        let min = self.position - half_size;
        let max = self.position + half_size;
        Aabb::with_bounds(min, max)
    }
}

pub fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .init();

    let spheres = (0..100_000u32).map(|i| {
        let position = Point::<f32, 3>::new(i as f32, i as f32, i as f32);
        let radius = (i % 10) as f32 + 1.0;
        (i, Sphere { position, radius })
    });
    let tree = BvhTree::build(spheres);

    let origin = Point::<f32, 3>::new(0.0, 0.0, 0.0);
    let hit_spheres = tree.find_containing(&origin);
    dbg!(hit_spheres);

    let far = Point::<f32, 3>::new(-50.0, 20.0, 3.0);
    dbg!(tree.nearest_to(&far));
}
