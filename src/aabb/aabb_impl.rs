//! Axis Aligned Bounding Boxes.

use std::fmt;

use nalgebra::{Point, SVector};

use crate::bounding_hierarchy::BHValue;
use crate::error::BvhError;

/// [`Aabb`] struct.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb<T: BHValue, const D: usize> {
    /// Minimum coordinates
    pub min: Point<T, D>,

    /// Maximum coordinates
    pub max: Point<T, D>,
}

impl<T: BHValue, const D: usize> fmt::Display for Aabb<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Min bound: {}; Max bound: {}", self.min, self.max)
    }
}

/// A trait implemented by things which can be bounded by an [`Aabb`].
pub trait Bounded<T: BHValue, const D: usize> {
    /// Returns the geometric bounds of this object in the form of an [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::{Aabb, Bounded};
    /// use nalgebra::Point3;
    ///
    /// struct Something;
    ///
    /// impl Bounded<f32, 3> for Something {
    ///     fn aabb(&self) -> Aabb<f32, 3> {
    ///         let point1 = Point3::new(0.0, 0.0, 0.0);
    ///         let point2 = Point3::new(1.0, 1.0, 1.0);
    ///         Aabb::with_bounds(point1, point2)
    ///     }
    /// }
    ///
    /// let something = Something;
    /// let aabb = something.aabb();
    ///
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
    /// ```
    fn aabb(&self) -> Aabb<T, D>;
}

impl<T: BHValue, const D: usize, B: Bounded<T, D>> Bounded<T, D> for &B {
    fn aabb(&self) -> Aabb<T, D> {
        B::aabb(self)
    }
}

impl<T: BHValue, const D: usize> Aabb<T, D> {
    /// Creates a new [`Aabb`] with the given bounds.
    ///
    /// The bounds are taken as they are; `min <= max` is the caller's responsibility.
    /// Use [`Aabb::try_with_bounds`] to have them checked.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.min.x, -1.0);
    /// assert_eq!(aabb.max.z, 1.0);
    /// ```
    pub fn with_bounds(min: Point<T, D>, max: Point<T, D>) -> Aabb<T, D> {
        Aabb { min, max }
    }

    /// Creates a new [`Aabb`] after checking that no coordinate is NaN and that
    /// `min[i] <= max[i]` holds on every axis.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use bvh_tree::error::BvhError;
    /// use nalgebra::Point3;
    ///
    /// let ok = Aabb::try_with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
    /// assert!(ok.is_ok());
    ///
    /// let inverted = Aabb::try_with_bounds(Point3::new(0.0, 5.0, 0.0), Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(
    ///     inverted,
    ///     Err(BvhError::InvertedAxis { axis: 1, min: 5.0, max: 2.0 })
    /// );
    /// ```
    pub fn try_with_bounds(min: Point<T, D>, max: Point<T, D>) -> Result<Aabb<T, D>, BvhError> {
        for axis in 0..D {
            if min[axis].is_nan() || max[axis].is_nan() {
                return Err(BvhError::NanBound { axis });
            }
            if min[axis] > max[axis] {
                return Err(BvhError::InvertedAxis {
                    axis,
                    min: min[axis].to_f64().unwrap_or(f64::NAN),
                    max: max[axis].to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        Ok(Aabb { min, max })
    }

    /// Creates a new empty [`Aabb`].
    ///
    /// Joining anything with the empty box yields that thing's box.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::<f32, 3>::empty();
    /// assert!(!aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// ```
    pub fn empty() -> Aabb<T, D> {
        Aabb {
            min: Point::from(SVector::repeat(T::infinity())),
            max: Point::from(SVector::repeat(T::neg_infinity())),
        }
    }

    /// Creates a new infinite [`Aabb`] which contains every point.
    pub fn infinite() -> Aabb<T, D> {
        Aabb {
            min: Point::from(SVector::repeat(T::neg_infinity())),
            max: Point::from(SVector::repeat(T::infinity())),
        }
    }

    /// Returns true if the [`Point`] is inside the [`Aabb`]. Bounds are inclusive.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
    /// assert!(aabb.contains(&Point3::new(1.0, -1.0, 1.0)));
    /// assert!(!aabb.contains(&Point3::new(1.5, 0.0, 0.0)));
    /// ```
    pub fn contains(&self, p: &Point<T, D>) -> bool {
        (0..D).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Returns true if the [`Point`] is approximately inside the [`Aabb`]
    /// with respect to some `epsilon`.
    pub fn approx_contains_eps(&self, p: &Point<T, D>, epsilon: T) -> bool {
        (0..D).all(|i| (p[i] - self.min[i]) > -epsilon && (p[i] - self.max[i]) < epsilon)
    }

    /// Returns true if `other` lies completely inside this [`Aabb`].
    pub fn contains_aabb(&self, other: &Aabb<T, D>) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    /// Returns true if both corners of the two [`Aabb`]s are equal
    /// up to `epsilon` on every axis.
    pub fn relative_eq(&self, other: &Aabb<T, D>, epsilon: T) -> bool {
        (0..D).all(|i| {
            (self.min[i] - other.min[i]).abs() < epsilon
                && (self.max[i] - other.max[i]).abs() < epsilon
        })
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and `other`.
    /// The result is the component-wise minimum of the lower corners and maximum of the
    /// upper corners.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb1 = Aabb::with_bounds(Point3::new(-101.0, 0.0, 0.0), Point3::new(-100.0, 1.0, 1.0));
    /// let aabb2 = Aabb::with_bounds(Point3::new(100.0, 0.0, 0.0), Point3::new(101.0, 1.0, 1.0));
    /// let joint = aabb1.join(&aabb2);
    ///
    /// assert_eq!(joint.min, Point3::new(-101.0, 0.0, 0.0));
    /// assert_eq!(joint.max, Point3::new(101.0, 1.0, 1.0));
    /// ```
    pub fn join(&self, other: &Aabb<T, D>) -> Aabb<T, D> {
        let mut joint = *self;
        joint.join_mut(other);
        joint
    }

    /// Mutable version of [`Aabb::join`].
    pub fn join_mut(&mut self, other: &Aabb<T, D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    /// Returns a new minimal [`Aabb`] which contains both this [`Aabb`] and the [`Point`] `other`.
    pub fn grow(&self, other: &Point<T, D>) -> Aabb<T, D> {
        let mut grown = *self;
        grown.grow_mut(other);
        grown
    }

    /// Mutable version of [`Aabb::grow`].
    pub fn grow_mut(&mut self, other: &Point<T, D>) {
        for i in 0..D {
            self.min[i] = self.min[i].min(other[i]);
            self.max[i] = self.max[i].max(other[i]);
        }
    }

    /// Returns the extent of this [`Aabb`] along `axis`.
    ///
    /// # Panics
    /// Panics if `axis >= D`.
    pub fn extent(&self, axis: usize) -> T {
        self.max[axis] - self.min[axis]
    }

    /// Returns the size of this [`Aabb`] in all dimensions.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(aabb.size(), Vector3::new(2.0, 3.0, 4.0));
    /// ```
    pub fn size(&self) -> SVector<T, D> {
        SVector::from_fn(|i, _| self.extent(i))
    }

    /// Returns the center [`Point`] of the [`Aabb`].
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(-1.0, -5.0, 0.0), Point3::new(1.0, -3.0, 4.0));
    /// assert_eq!(aabb.center(), Point3::new(0.0, -4.0, 2.0));
    /// ```
    pub fn center(&self) -> Point<T, D> {
        let two = T::one() + T::one();
        let mut center = self.min;
        for i in 0..D {
            center[i] = (self.min[i] + self.max[i]) / two;
        }
        center
    }

    /// Returns the axis along which the [`Aabb`] is stretched the most.
    /// On equal extents the lowest axis index wins.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 7.0, 7.0));
    /// assert_eq!(aabb.largest_axis(), 1);
    /// ```
    pub fn largest_axis(&self) -> usize {
        let mut largest = 0;
        for axis in 1..D {
            if self.extent(axis) > self.extent(largest) {
                largest = axis;
            }
        }
        largest
    }

    /// Returns the squared distance from `point` to the closest point of this [`Aabb`].
    /// Points inside the box have distance zero.
    ///
    /// # Examples
    /// ```
    /// use bvh_tree::aabb::Aabb;
    /// use nalgebra::Point3;
    ///
    /// let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.distance_squared(&Point3::new(0.5, 0.5, 0.5)), 0.0);
    /// assert_eq!(aabb.distance_squared(&Point3::new(3.0, 0.5, -2.0)), 8.0);
    /// ```
    pub fn distance_squared(&self, point: &Point<T, D>) -> T {
        let mut distance_squared = T::zero();
        for i in 0..D {
            let below = self.min[i] - point[i];
            let above = point[i] - self.max[i];
            let gap = below.max(above).max(T::zero());
            distance_squared = distance_squared + gap * gap;
        }
        distance_squared
    }

    /// Returns true if this [`Aabb`] has no volume, i.e. `min > max` on some axis.
    pub fn is_empty(&self) -> bool {
        (0..D).any(|i| self.min[i] > self.max[i])
    }
}

impl<T: BHValue, const D: usize> Default for Aabb<T, D> {
    fn default() -> Aabb<T, D> {
        Aabb::empty()
    }
}

impl<T: BHValue, const D: usize> Bounded<T, D> for Aabb<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        *self
    }
}

/// Implementation of [`Bounded`] for single points.
impl<T: BHValue, const D: usize> Bounded<T, D> for Point<T, D> {
    fn aabb(&self) -> Aabb<T, D> {
        Aabb::with_bounds(*self, *self)
    }
}

#[cfg(test)]
mod tests {
    use crate::aabb::{Aabb, Bounded};
    use crate::error::BvhError;
    use crate::testbase::{tuple_to_point, tuplevec_small_strategy, Point3};

    use float_eq::assert_float_eq;
    use proptest::array::uniform5;
    use proptest::prelude::*;

    #[test]
    fn test_largest_axis_prefers_x() {
        let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 2.0, 1.0));
        assert_eq!(aabb.largest_axis(), 0);
    }

    #[test]
    fn test_largest_axis_cube_is_x() {
        let aabb = Aabb::with_bounds(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(aabb.largest_axis(), 0);
    }

    #[test]
    fn test_largest_axis_tie_between_y_and_z() {
        let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 3.0, 3.0));
        assert_eq!(aabb.largest_axis(), 1);
        let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.largest_axis(), 2);
    }

    #[test]
    fn test_extent_and_center() {
        let aabb = Aabb::with_bounds(Point3::new(1.0, -2.0, 0.5), Point3::new(4.0, 2.0, 1.0));
        assert_float_eq!(aabb.extent(0), 3.0, abs <= 1e-12);
        assert_float_eq!(aabb.extent(1), 4.0, abs <= 1e-12);
        assert_float_eq!(aabb.extent(2), 0.5, abs <= 1e-12);
        let center = aabb.center();
        assert_float_eq!(center.x, 2.5, abs <= 1e-12);
        assert_float_eq!(center.y, 0.0, abs <= 1e-12);
        assert_float_eq!(center.z, 0.75, abs <= 1e-12);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let aabb = Aabb::with_bounds(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(aabb.contains(&Point3::new(0.0, 0.0, 0.0)));
        assert!(aabb.contains(&Point3::new(1.0, 1.0, 1.0)));
        assert!(aabb.contains(&Point3::new(0.0, 1.0, 0.5)));
        assert!(!aabb.contains(&Point3::new(1.0, 1.0, 1.000001)));
        assert!(!aabb.contains(&Point3::new(-0.000001, 0.5, 0.5)));
    }

    #[test]
    fn test_join_is_componentwise() {
        let a = Aabb::with_bounds(Point3::new(0.0, 5.0, -1.0), Point3::new(1.0, 6.0, 0.0));
        let b = Aabb::with_bounds(Point3::new(-2.0, 4.0, 3.0), Point3::new(-1.0, 7.0, 4.0));
        let joint = a.join(&b);
        assert_eq!(joint.min, Point3::new(-2.0, 4.0, -1.0));
        assert_eq!(joint.max, Point3::new(1.0, 7.0, 4.0));
        assert_eq!(joint, b.join(&a));
    }

    #[test]
    fn test_empty_is_join_identity() {
        let a = Aabb::with_bounds(Point3::new(0.0, 5.0, -1.0), Point3::new(1.0, 6.0, 0.0));
        assert_eq!(Aabb::empty().join(&a), a);
        assert!(Aabb::<f64, 3>::empty().is_empty());
        assert!(!a.is_empty());
    }

    #[test]
    fn test_try_with_bounds_rejects_nan() {
        let result = Aabb::try_with_bounds(
            Point3::new(0.0, 0.0, f64::NAN),
            Point3::new(1.0, 1.0, 1.0),
        );
        assert_eq!(result, Err(BvhError::NanBound { axis: 2 }));
    }

    #[test]
    fn test_try_with_bounds_rejects_inverted_axis() {
        let result = Aabb::try_with_bounds(
            Point3::new(-2.0, -2.0, -2.0),
            Point3::new(-3.0, -3.0, -3.0),
        );
        assert_eq!(
            result,
            Err(BvhError::InvertedAxis {
                axis: 0,
                min: -2.0,
                max: -3.0
            })
        );
    }

    #[test]
    fn test_point_is_degenerate_box() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let aabb = p.aabb();
        assert_eq!(aabb.min, p);
        assert_eq!(aabb.max, p);
        assert!(aabb.contains(&p));
    }

    proptest! {
        // Test whether an empty `Aabb` does not contain anything.
        #[test]
        fn test_empty_contains_nothing(tpl in tuplevec_small_strategy()) {
            let p = tuple_to_point(&tpl);
            let aabb = Aabb::empty();
            assert!(!aabb.contains(&p));
        }

        // Test whether an `Aabb` always contains its center.
        #[test]
        fn test_aabb_contains_center(a in tuplevec_small_strategy(), b in tuplevec_small_strategy()) {
            let aabb = Aabb::empty().grow(&tuple_to_point(&a)).grow(&tuple_to_point(&b));
            assert!(aabb.contains(&aabb.center()));
        }

        // Test whether the joint of two point-sets contains all the points.
        #[test]
        fn test_join_two_aabbs(
            a in uniform5(tuplevec_small_strategy()),
            b in uniform5(tuplevec_small_strategy()),
        ) {
            let points_a = a.iter().map(tuple_to_point).collect::<Vec<_>>();
            let points_b = b.iter().map(tuple_to_point).collect::<Vec<_>>();
            let aabb1 = points_a.iter().fold(Aabb::empty(), |aabb, point| aabb.grow(point));
            let aabb2 = points_b.iter().fold(Aabb::empty(), |aabb, point| aabb.grow(point));
            let joint = aabb1.join(&aabb2);

            assert!(points_a.iter().all(|p| aabb1.contains(p)));
            assert!(points_b.iter().all(|p| aabb2.contains(p)));
            assert!(points_a.iter().chain(points_b.iter()).all(|p| joint.contains(p)));
            assert!(joint.contains_aabb(&aabb1) && joint.contains_aabb(&aabb2));
        }

        // The largest axis has an extent no smaller than any other axis.
        #[test]
        fn test_largest_axis_is_maximal(a in tuplevec_small_strategy(), b in tuplevec_small_strategy()) {
            let aabb = Aabb::empty().grow(&tuple_to_point(&a)).grow(&tuple_to_point(&b));
            let axis = aabb.largest_axis();
            for other in 0..3 {
                assert!(aabb.extent(axis) >= aabb.extent(other));
                if other < axis {
                    assert!(aabb.extent(other) < aabb.extent(axis));
                }
            }
        }

        // A point is at distance zero exactly when the box contains it.
        #[test]
        fn test_distance_zero_iff_contained(
            a in tuplevec_small_strategy(),
            b in tuplevec_small_strategy(),
            p in tuplevec_small_strategy(),
        ) {
            let aabb = Aabb::empty().grow(&tuple_to_point(&a)).grow(&tuple_to_point(&b));
            let p = tuple_to_point(&p);
            assert_eq!(aabb.distance_squared(&p) == 0.0, aabb.contains(&p));
        }
    }
}
