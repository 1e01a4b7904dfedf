//! Axis-aligned bounding boxes used by the broad phase

use crate::foundation::math::Vec3;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB containing every point (empty input gives a zero box at the origin)
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::new(Vec3::zeros(), Vec3::zeros());
        };
        iter.fold(Self::new(*first, *first), |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        })
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies entirely inside this AABB
    pub fn contains_aabb(&self, other: &AABB) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Smallest AABB containing both boxes
    pub fn merged(&self, other: &AABB) -> AABB {
        AABB::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f32) -> AABB {
        let m = Vec3::new(margin, margin, margin);
        AABB::new(self.min - m, self.max + m)
    }

    /// Overlap extent on each axis (negative when separated on that axis)
    pub fn overlap(&self, other: &AABB) -> Vec3 {
        self.max.inf(&other.max) - self.min.sup(&other.min)
    }

    /// True when both corners are finite and ordered
    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }

    /// Test ray intersection with this AABB using slab method
    /// Returns the distance to the entry point if the ray intersects, None otherwise
    /// Based on "An Efficient and Robust Ray–Box Intersection Algorithm"
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        self.intersect_segment(ray_origin, ray_dir, f32::INFINITY)
    }

    /// Slab test limited to `[0, max_distance]` along the ray
    pub fn intersect_segment(&self, ray_origin: Vec3, ray_dir: Vec3, max_distance: f32) -> Option<f32> {
        let mut tmin = 0.0f32;
        let mut tmax = max_distance;

        for axis in 0..3 {
            let origin = ray_origin[axis];
            let dir = ray_dir[axis];
            if dir == 0.0 {
                // Parallel to the slab: must already be inside it
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let t1 = (self.min[axis] - origin) * inv;
            let t2 = (self.max[axis] - origin) * inv;
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
            if tmax < tmin {
                return None;
            }
        }

        Some(tmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_ray_entry_distance() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let t = aabb.intersect_ray(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(t, Some(9.0));

        // Origin inside reports zero
        assert_eq!(aabb.intersect_ray(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)), Some(0.0));

        // Pointing away misses
        assert!(aabb.intersect_ray(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn test_intersect_segment_respects_max_distance() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let origin = Vec3::new(0.0, 0.0, -10.0);
        let dir = Vec3::new(0.0, 0.0, 1.0);
        assert!(aabb.intersect_segment(origin, dir, 8.0).is_none());
        assert_eq!(aabb.intersect_segment(origin, dir, 9.5), Some(9.0));
    }

    #[test]
    fn test_overlap_and_merge() {
        let a = AABB::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0));
        let b = AABB::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(3.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert_eq!(a.overlap(&b), Vec3::new(0.5, 1.0, 1.0));
        assert_eq!(a.merged(&b), AABB::new(Vec3::zeros(), Vec3::new(3.0, 2.0, 2.0)));
        assert!(a.expanded(1.0).contains_aabb(&a));
    }
}
