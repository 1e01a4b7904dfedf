//! Octree spatial partitioning structure
//!
//! Efficiently divides 3D space into hierarchical regions for fast
//! spatial queries. Each node subdivides into 8 octants when entry
//! density exceeds a threshold.
//!
//! Insertion is "loose": an entry lives in the deepest node whose bounds
//! fully contain its AABB, so a node's bounds always enclose every entry
//! stored beneath it and queries can prune whole subtrees. Entries that do
//! not fit inside the world bounds go to an overflow list on the tree.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::physics::ComponentHandle;
use crate::spatial::AABB;

/// Configuration for octree behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum entries per node before subdivision
    pub max_entries_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node size (prevents excessive subdivision)
    pub min_node_size: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_entries_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

/// Component bounds stored in the octree
#[derive(Debug, Clone, Copy)]
pub struct OctreeEntry {
    /// Registry handle of the component
    pub handle: ComponentHandle,
    /// World-space bounds of the component
    pub aabb: AABB,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// World-space bounds of this node
    pub bounds: AABB,

    /// Entries stored at this node (fully contained in `bounds`, but not in any child)
    pub entries: Vec<OctreeEntry>,

    /// Child nodes (8 octants), None if this is a leaf
    pub children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Bounds of octant `index` (0-7)
    ///
    /// Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
    fn octant_bounds(&self, octant: usize) -> AABB {
        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let x_sign = if octant & 1 != 0 { 1.0 } else { -1.0 };
        let y_sign = if octant & 2 != 0 { 1.0 } else { -1.0 };
        let z_sign = if octant & 4 != 0 { 1.0 } else { -1.0 };

        let child_center = Vec3::new(
            center.x + quarter_extents.x * x_sign,
            center.y + quarter_extents.y * y_sign,
            center.z + quarter_extents.z * z_sign,
        );
        AABB::from_center_extents(child_center, quarter_extents)
    }

    /// Index of the child that fully contains `aabb`, if any
    fn child_for(&self, aabb: &AABB) -> Option<usize> {
        let children = self.children.as_ref()?;
        children.iter().position(|child| child.bounds.contains_aabb(aabb))
    }

    /// Subdivide this node into 8 children and push down entries that fit
    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let children: [OctreeNode; 8] =
            std::array::from_fn(|octant| OctreeNode::new(self.octant_bounds(octant), self.depth + 1));
        self.children = Some(Box::new(children));

        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            match self.child_for(&entry.aabb) {
                Some(index) => {
                    if let Some(children) = self.children.as_mut() {
                        children[index].entries.push(entry);
                    }
                }
                None => self.entries.push(entry),
            }
        }
    }

    /// Insert an entry into this node. Returns false if it does not fit the node bounds.
    pub fn insert(&mut self, entry: OctreeEntry, config: &OctreeConfig) -> bool {
        if !self.bounds.contains_aabb(&entry.aabb) {
            return false;
        }

        if self.is_leaf() {
            let should_subdivide = self.entries.len() >= config.max_entries_per_node
                && self.depth < config.max_depth
                && self.bounds.extents().x > config.min_node_size;

            if !should_subdivide {
                self.entries.push(entry);
                return true;
            }
            self.subdivide();
        }

        if let Some(index) = self.child_for(&entry.aabb) {
            if let Some(children) = self.children.as_mut() {
                return children[index].insert(entry, config);
            }
        }

        // Straddles a split plane: keep it here
        self.entries.push(entry);
        true
    }

    /// Remove an entry from this node or its children
    pub fn remove(&mut self, handle: ComponentHandle) -> bool {
        if let Some(index) = self.entries.iter().position(|e| e.handle == handle) {
            self.entries.swap_remove(index);
            return true;
        }

        if let Some(ref mut children) = self.children {
            for child in children.iter_mut() {
                if child.remove(handle) {
                    return true;
                }
            }
        }

        false
    }

    /// Remove an entry whose last known bounds were `aabb` (descends only into the owning octant)
    pub fn remove_with_hint(&mut self, handle: ComponentHandle, aabb: &AABB) -> bool {
        if let Some(index) = self.entries.iter().position(|e| e.handle == handle) {
            self.entries.swap_remove(index);
            return true;
        }
        match self.child_for(aabb) {
            Some(index) => match self.children.as_mut() {
                Some(children) => children[index].remove_with_hint(handle, aabb),
                None => false,
            },
            None => false,
        }
    }

    /// Collect entries whose bounds intersect `query`
    pub fn query_aabb(&self, query: &AABB, results: &mut Vec<OctreeEntry>) {
        if !self.bounds.intersects(query) {
            return;
        }

        results.extend(self.entries.iter().filter(|e| e.aabb.intersects(query)));

        if let Some(ref children) = self.children {
            for child in children.iter() {
                child.query_aabb(query, results);
            }
        }
    }

    /// Collect entries whose bounds the ray touches within `[0, max_distance]`
    pub fn query_ray(
        &self,
        ray_origin: Vec3,
        ray_dir: Vec3,
        max_distance: f32,
        results: &mut Vec<OctreeEntry>,
    ) {
        // Whole subtree is skipped when the ray misses this node
        if self.bounds.intersect_segment(ray_origin, ray_dir, max_distance).is_none() {
            return;
        }

        results.extend(
            self.entries
                .iter()
                .filter(|e| e.aabb.intersect_segment(ray_origin, ray_dir, max_distance).is_some()),
        );

        if let Some(ref children) = self.children {
            for child in children.iter() {
                child.query_ray(ray_origin, ray_dir, max_distance, results);
            }
        }
    }

    /// Get all leaf nodes (for visualization)
    pub fn get_all_leaves<'a>(&'a self, leaves: &mut Vec<&'a OctreeNode>) {
        if self.is_leaf() {
            leaves.push(self);
        } else if let Some(ref children) = self.children {
            for child in children.iter() {
                child.get_all_leaves(leaves);
            }
        }
    }

    /// Count total entries in this node and all children
    pub fn count_entries(&self) -> usize {
        let mut count = self.entries.len();

        if let Some(ref children) = self.children {
            for child in children.iter() {
                count += child.count_entries();
            }
        }

        count
    }
}

/// Octree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct Octree {
    /// Root node containing the entire world space
    pub root: OctreeNode,

    /// Entries that do not fit inside the root bounds
    overflow: Vec<OctreeEntry>,

    /// Configuration
    config: OctreeConfig,
}

impl Octree {
    /// Create a new octree with given world bounds
    pub fn new(world_bounds: AABB, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(world_bounds, 0),
            overflow: Vec::new(),
            config,
        }
    }

    /// Insert an entry; out-of-bounds entries land in the overflow list
    pub fn insert(&mut self, handle: ComponentHandle, aabb: AABB) {
        let entry = OctreeEntry { handle, aabb };
        if !self.root.insert(entry, &self.config) {
            self.overflow.push(entry);
        }
    }

    /// Remove an entry from the octree
    pub fn remove(&mut self, handle: ComponentHandle) -> bool {
        if let Some(index) = self.overflow.iter().position(|e| e.handle == handle) {
            self.overflow.swap_remove(index);
            return true;
        }
        self.root.remove(handle)
    }

    /// Remove using the entry's last known bounds to avoid a full traversal
    pub fn remove_with_hint(&mut self, handle: ComponentHandle, aabb: &AABB) -> bool {
        if let Some(index) = self.overflow.iter().position(|e| e.handle == handle) {
            self.overflow.swap_remove(index);
            return true;
        }
        self.root.remove_with_hint(handle, aabb) || self.root.remove(handle)
    }

    /// Query all entries whose bounds intersect `query`
    pub fn query_aabb(&self, query: &AABB) -> Vec<OctreeEntry> {
        let mut results: Vec<OctreeEntry> = self
            .overflow
            .iter()
            .filter(|e| e.aabb.intersects(query))
            .copied()
            .collect();
        self.root.query_aabb(query, &mut results);
        results
    }

    /// Query all entries whose bounds the ray touches within `max_distance`
    pub fn query_ray(&self, ray_origin: Vec3, ray_dir: Vec3, max_distance: f32) -> Vec<OctreeEntry> {
        let mut results: Vec<OctreeEntry> = self
            .overflow
            .iter()
            .filter(|e| e.aabb.intersect_segment(ray_origin, ray_dir, max_distance).is_some())
            .copied()
            .collect();
        self.root.query_ray(ray_origin, ray_dir, max_distance, &mut results);
        results
    }

    /// Get all leaf nodes (for visualization)
    pub fn get_all_leaves(&self) -> Vec<&OctreeNode> {
        let mut leaves = Vec::new();
        self.root.get_all_leaves(&mut leaves);
        leaves
    }

    /// Number of entries outside the world bounds
    pub fn overflow_count(&self) -> usize {
        self.overflow.len()
    }

    /// Get total entry count
    pub fn entry_count(&self) -> usize {
        self.root.count_entries() + self.overflow.len()
    }

    /// Clear the octree
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.root.bounds, 0);
        self.overflow.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn handles(n: usize) -> Vec<ComponentHandle> {
        let mut arena: SlotMap<ComponentHandle, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    fn world_bounds() -> AABB {
        AABB::new(Vec3::new(-100.0, -100.0, -100.0), Vec3::new(100.0, 100.0, 100.0))
    }

    fn cube(center: Vec3, half: f32) -> AABB {
        AABB::from_center_extents(center, Vec3::new(half, half, half))
    }

    #[test]
    fn test_octree_basic_insertion() {
        let mut octree = Octree::new(world_bounds(), OctreeConfig::default());
        let h = handles(1);

        octree.insert(h[0], cube(Vec3::zeros(), 1.0));
        assert_eq!(octree.entry_count(), 1);
        assert!(octree.remove(h[0]));
        assert_eq!(octree.entry_count(), 0);
    }

    #[test]
    fn test_octree_subdivision() {
        let config = OctreeConfig {
            max_entries_per_node: 4,
            max_depth: 3,
            min_node_size: 1.0,
        };
        let mut octree = Octree::new(world_bounds(), config);

        // Small boxes spread over the positive octant force a split
        for (i, h) in handles(10).into_iter().enumerate() {
            octree.insert(h, cube(Vec3::new(10.0 + i as f32 * 3.0, 10.0, 10.0), 0.5));
        }

        assert_eq!(octree.entry_count(), 10);
        assert!(octree.root.children.is_some());
    }

    #[test]
    fn test_octree_aabb_query() {
        let mut octree = Octree::new(world_bounds(), OctreeConfig::default());
        let h = handles(3);

        octree.insert(h[0], cube(Vec3::new(0.0, 0.0, 0.0), 1.0));
        octree.insert(h[1], cube(Vec3::new(5.0, 0.0, 0.0), 1.0));
        octree.insert(h[2], cube(Vec3::new(50.0, 0.0, 0.0), 1.0));

        let results = octree.query_aabb(&cube(Vec3::zeros(), 10.0));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_out_of_bounds_entries_are_still_found() {
        let mut octree = Octree::new(world_bounds(), OctreeConfig::default());
        let h = handles(1);
        octree.insert(h[0], cube(Vec3::new(500.0, 0.0, 0.0), 1.0));

        assert_eq!(octree.overflow_count(), 1);
        let hits = octree.query_ray(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1000.0);
        assert_eq!(hits.len(), 1);
        assert!(octree.remove(h[0]));
    }

    #[test]
    fn test_ray_query_prunes_by_distance() {
        let mut octree = Octree::new(world_bounds(), OctreeConfig::default());
        let h = handles(2);
        octree.insert(h[0], cube(Vec3::new(0.0, 0.0, 10.0), 1.0));
        octree.insert(h[1], cube(Vec3::new(0.0, 0.0, 40.0), 1.0));

        let near = octree.query_ray(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), 20.0);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].handle, h[0]);
    }
}
