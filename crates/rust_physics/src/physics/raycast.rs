//! Raycast engine
//!
//! Nearest-hit and all-hits ray queries against registered components.
//! Candidates come from the spatial index and are then filtered by
//! interactivity, exclusion list and validity before the exact shape test.

use crate::foundation::math::{utils, Vec3};
use crate::physics::collision::Ray;
use crate::physics::component::{ComponentHandle, ComponentId, OwnerRef};
use crate::physics::error::{PhysicsError, PhysicsResult};
use crate::physics::interactivity::Interactivity;
use crate::physics::narrow_phase::NarrowPhase;
use crate::physics::registry::ComponentRegistry;

/// Result of a raycast; always returned, `hit` tells whether anything was struck
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// True when the ray struck a component
    pub hit: bool,
    /// The point of intersection in world space
    pub point: Vec3,
    /// The surface normal at the intersection point
    pub normal: Vec3,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The component that was hit
    pub component: Option<ComponentId>,
    /// Registry handle of the component that was hit
    pub handle: Option<ComponentHandle>,
    /// Owner of the component that was hit
    pub owner: Option<OwnerRef>,
}

impl RayHit {
    /// The no-hit value
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::zeros(),
            normal: Vec3::zeros(),
            distance: f32::INFINITY,
            component: None,
            handle: None,
            owner: None,
        }
    }
}

impl Default for RayHit {
    fn default() -> Self {
        Self::miss()
    }
}

/// Segment of the most recent ray, kept for debug drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPath {
    /// Ray origin
    pub origin: Vec3,
    /// Where the ray stopped (hit point or max distance)
    pub end: Vec3,
    /// Hit point when something was struck
    pub hit: Option<Vec3>,
}

/// Validate origin and direction, normalizing the direction
pub fn make_ray(origin: Vec3, direction: Vec3) -> PhysicsResult<Ray> {
    let invalid = PhysicsError::InvalidRay { origin, direction };
    if !origin.iter().all(|v| v.is_finite()) {
        return Err(invalid);
    }
    let direction = utils::try_normalize(direction).ok_or(invalid)?;
    Ok(Ray { origin, direction })
}

/// Every hit within `max_distance`, sorted by distance then handle
pub fn cast_ray_all<N: NarrowPhase>(
    registry: &ComponentRegistry,
    narrow: &N,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    filter: Interactivity,
    ignore: &[ComponentId],
) -> PhysicsResult<Vec<RayHit>> {
    let ray = make_ray(origin, direction)?;
    if max_distance.is_nan() || max_distance <= 0.0 {
        return Ok(Vec::new());
    }

    let mut candidates = registry.index().query_ray(ray.origin, ray.direction, max_distance);
    candidates.sort_unstable();

    let mut hits: Vec<RayHit> = candidates
        .into_iter()
        .filter_map(|handle| {
            let component = registry.component_by_handle(handle)?;
            if ignore.contains(&component.id)
                || !component.interactivity.matches(filter)
                || !component.is_valid()
            {
                return None;
            }
            let intersection = narrow.intersect_ray(&component.world_shape(), &ray)?;
            if intersection.distance > max_distance {
                return None;
            }
            Some(RayHit {
                hit: true,
                point: intersection.point,
                normal: intersection.normal,
                distance: intersection.distance,
                component: Some(component.id),
                handle: Some(handle),
                owner: component.owner,
            })
        })
        .collect();

    // Stable sort keeps handle order between equal distances
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(hits)
}

/// Nearest hit within `max_distance`, or [`RayHit::miss`]
pub fn cast_ray<N: NarrowPhase>(
    registry: &ComponentRegistry,
    narrow: &N,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    filter: Interactivity,
    ignore: &[ComponentId],
) -> PhysicsResult<RayHit> {
    let hits = cast_ray_all(registry, narrow, origin, direction, max_distance, filter, ignore)?;
    Ok(hits.into_iter().next().unwrap_or_else(RayHit::miss))
}
