//! Abstract spatial index interface for broad-phase collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2:
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding."
//!
//! This abstraction allows swapping different spatial partitioning schemes
//! (octree, grid, ...) without changing the registry or the stepper.

use std::collections::HashMap;

use crate::config::{BroadPhaseKind, PhysicsConfig};
use crate::foundation::math::Vec3;
use crate::physics::ComponentHandle;
use crate::spatial::{Octree, UniformGrid, AABB};

/// Abstract interface for spatial partitioning used by the broad phase
///
/// Entries are keyed by registry handle and carry the component's current
/// world-space AABB. Implementations hold no simulation logic.
pub trait SpatialIndex: Send + Sync {
    /// Insert a component's bounds
    fn insert(&mut self, handle: ComponentHandle, aabb: AABB);

    /// Remove a component; returns false if it was not present
    fn remove(&mut self, handle: ComponentHandle) -> bool;

    /// Move a component to new bounds
    fn update(&mut self, handle: ComponentHandle, aabb: AABB);

    /// Stored bounds of a component
    fn get_aabb(&self, handle: ComponentHandle) -> Option<AABB>;

    /// True when the component is present
    fn contains(&self, handle: ComponentHandle) -> bool {
        self.get_aabb(handle).is_some()
    }

    /// Every stored handle (unordered)
    fn handles(&self) -> Vec<ComponentHandle>;

    /// Components whose bounds intersect `aabb`
    fn query_aabb(&self, aabb: &AABB) -> Vec<ComponentHandle>;

    /// Components whose bounds the ray touches within `[0, max_distance]`
    fn query_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<ComponentHandle>;

    /// Every unordered pair of overlapping bounds, once, sorted by handle
    fn overlapping_pairs(&self) -> Vec<(ComponentHandle, ComponentHandle)> {
        let mut handles = self.handles();
        handles.sort_unstable();

        let mut pairs = Vec::new();
        for a in handles {
            let Some(aabb) = self.get_aabb(a) else { continue };
            pairs.extend(
                self.query_aabb(&aabb)
                    .into_iter()
                    .filter(|b| a < *b)
                    .map(|b| (a, b)),
            );
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Node / cell boxes for debug visualization
    fn debug_bounds(&self) -> Vec<AABB>;

    /// Clear all entries from the spatial structure
    fn clear(&mut self);

    /// Get the number of entries in the structure
    fn len(&self) -> usize;

    /// True when the structure is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the spatial index selected by `config.broad_phase`
pub fn create_spatial_index(config: &PhysicsConfig) -> Box<dyn SpatialIndex> {
    match config.broad_phase {
        BroadPhaseKind::Octree => Box::new(OctreeSpatialQuery::new(Octree::new(
            config.world_bounds(),
            config.octree.clone(),
        ))),
        BroadPhaseKind::UniformGrid => Box::new(GridSpatialQuery::new(UniformGrid::new(&config.grid))),
    }
}

/// Octree-based implementation of SpatialIndex
///
/// Wraps the Octree to provide the SpatialIndex interface
pub struct OctreeSpatialQuery {
    octree: Octree,
    /// Cache of entry bounds for quick lookups and hinted removal
    entry_cache: HashMap<ComponentHandle, AABB>,
}

impl OctreeSpatialQuery {
    /// Create a new octree-based spatial query system
    pub fn new(octree: Octree) -> Self {
        Self {
            octree,
            entry_cache: HashMap::new(),
        }
    }

    /// Get a reference to the underlying octree (for visualization, etc.)
    pub fn octree(&self) -> &Octree {
        &self.octree
    }
}

impl SpatialIndex for OctreeSpatialQuery {
    fn insert(&mut self, handle: ComponentHandle, aabb: AABB) {
        if self.entry_cache.contains_key(&handle) {
            self.update(handle, aabb);
            return;
        }
        self.octree.insert(handle, aabb);
        self.entry_cache.insert(handle, aabb);
    }

    fn remove(&mut self, handle: ComponentHandle) -> bool {
        match self.entry_cache.remove(&handle) {
            Some(old) => self.octree.remove_with_hint(handle, &old),
            None => false,
        }
    }

    fn update(&mut self, handle: ComponentHandle, aabb: AABB) {
        // Octree requires remove + re-insert for updates
        if let Some(old) = self.entry_cache.get(&handle).copied() {
            if old == aabb {
                return;
            }
            self.octree.remove_with_hint(handle, &old);
        }
        self.octree.insert(handle, aabb);
        self.entry_cache.insert(handle, aabb);
    }

    fn get_aabb(&self, handle: ComponentHandle) -> Option<AABB> {
        self.entry_cache.get(&handle).copied()
    }

    fn handles(&self) -> Vec<ComponentHandle> {
        self.entry_cache.keys().copied().collect()
    }

    fn query_aabb(&self, aabb: &AABB) -> Vec<ComponentHandle> {
        self.octree.query_aabb(aabb).into_iter().map(|e| e.handle).collect()
    }

    fn query_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<ComponentHandle> {
        self.octree
            .query_ray(origin, direction, max_distance)
            .into_iter()
            .map(|e| e.handle)
            .collect()
    }

    fn debug_bounds(&self) -> Vec<AABB> {
        self.octree.get_all_leaves().into_iter().map(|node| node.bounds).collect()
    }

    fn clear(&mut self) {
        self.octree.clear();
        self.entry_cache.clear();
    }

    fn len(&self) -> usize {
        self.entry_cache.len()
    }
}

/// Uniform-grid implementation of SpatialIndex
pub struct GridSpatialQuery {
    grid: UniformGrid,
}

impl GridSpatialQuery {
    /// Wrap a grid
    pub fn new(grid: UniformGrid) -> Self {
        Self { grid }
    }

    /// Underlying grid
    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }
}

impl SpatialIndex for GridSpatialQuery {
    fn insert(&mut self, handle: ComponentHandle, aabb: AABB) {
        self.grid.insert(handle, aabb);
    }

    fn remove(&mut self, handle: ComponentHandle) -> bool {
        self.grid.remove(handle)
    }

    fn update(&mut self, handle: ComponentHandle, aabb: AABB) {
        if self.grid.get_aabb(handle) != Some(aabb) {
            self.grid.insert(handle, aabb);
        }
    }

    fn get_aabb(&self, handle: ComponentHandle) -> Option<AABB> {
        self.grid.get_aabb(handle)
    }

    fn handles(&self) -> Vec<ComponentHandle> {
        self.grid.handles()
    }

    fn query_aabb(&self, aabb: &AABB) -> Vec<ComponentHandle> {
        self.grid.query_aabb(aabb)
    }

    fn query_ray(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Vec<ComponentHandle> {
        self.grid.query_ray(origin, direction, max_distance)
    }

    fn debug_bounds(&self) -> Vec<AABB> {
        self.grid.occupied_cells()
    }

    fn clear(&mut self) {
        self.grid.clear();
    }

    fn len(&self) -> usize {
        self.grid.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{GridConfig, OctreeConfig};
    use slotmap::SlotMap;

    fn both_backends() -> Vec<Box<dyn SpatialIndex>> {
        let config = PhysicsConfig::default();
        vec![
            create_spatial_index(&config),
            create_spatial_index(&config.clone().with_broad_phase(BroadPhaseKind::UniformGrid)),
        ]
    }

    fn cube(center: Vec3, half: f32) -> AABB {
        AABB::from_center_extents(center, Vec3::new(half, half, half))
    }

    #[test]
    fn test_spatial_query_insert_remove() {
        let mut arena: SlotMap<ComponentHandle, ()> = SlotMap::with_key();
        let handle = arena.insert(());

        for mut spatial in both_backends() {
            spatial.insert(handle, cube(Vec3::zeros(), 5.0));
            assert_eq!(spatial.len(), 1);
            assert!(spatial.contains(handle));

            assert!(spatial.remove(handle));
            assert!(!spatial.remove(handle));
            assert_eq!(spatial.len(), 0);
        }
    }

    #[test]
    fn test_debug_bounds_follow_backend_structure() {
        let mut arena: SlotMap<ComponentHandle, ()> = SlotMap::with_key();
        let handle = arena.insert(());

        let mut octree = OctreeSpatialQuery::new(Octree::new(cube(Vec3::zeros(), 64.0), OctreeConfig::default()));
        octree.insert(handle, cube(Vec3::new(10.0, 10.0, 10.0), 1.0));
        assert_eq!(octree.debug_bounds().len(), octree.octree().get_all_leaves().len());

        let mut grid = GridSpatialQuery::new(UniformGrid::new(&GridConfig::default()));
        grid.insert(handle, cube(Vec3::new(1.0, 1.0, 1.0), 0.5));
        assert_eq!(grid.debug_bounds(), grid.grid().occupied_cells());
        assert_eq!(grid.grid().occupied_cells().len(), 1);
    }

    #[test]
    fn test_backends_agree_on_pairs_and_rays() {
        let mut arena: SlotMap<ComponentHandle, ()> = SlotMap::with_key();
        let h: Vec<ComponentHandle> = (0..4).map(|_| arena.insert(())).collect();

        let mut results = Vec::new();
        for mut spatial in both_backends() {
            spatial.insert(h[0], cube(Vec3::new(0.0, 0.0, 0.0), 1.0));
            spatial.insert(h[1], cube(Vec3::new(1.5, 0.0, 0.0), 1.0));
            spatial.insert(h[2], cube(Vec3::new(20.0, 0.0, 0.0), 1.0));
            spatial.insert(h[3], cube(Vec3::new(20.0, 0.0, 30.0), 1.0));

            // Move h[3] next to h[2]
            spatial.update(h[3], cube(Vec3::new(21.0, 0.0, 0.0), 1.0));

            let pairs = spatial.overlapping_pairs();
            let mut ray = spatial.query_ray(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 35.0);
            ray.sort();
            // Ends at x = 15, short of the far pair
            let mut short = spatial.query_ray(Vec3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 25.0);
            short.sort();
            results.push((pairs, ray, short));
        }

        assert_eq!(results[0], results[1]);
        let (pairs, ray, short) = &results[0];
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&(h[0].min(h[1]), h[0].max(h[1]))));
        assert_eq!(ray.len(), 4);
        let mut near = vec![h[0], h[1]];
        near.sort();
        assert_eq!(short, &near);
    }
}
