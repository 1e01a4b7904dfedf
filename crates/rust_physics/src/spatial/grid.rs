//! Hashed uniform grid
//!
//! Every entry is binned into each cell its AABB overlaps. Entries covering
//! more than `max_cells_per_entry` cells are kept in an overflow list that is
//! tested against every query instead.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::physics::ComponentHandle;
use crate::spatial::AABB;

type Cell = (i32, i32, i32);

/// Uniform grid tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of a cell in world units
    pub cell_size: f32,
    /// Entries spanning more cells than this go to the overflow list
    pub max_cells_per_entry: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            max_cells_per_entry: 512,
        }
    }
}

#[derive(Debug, Clone)]
struct GridEntry {
    aabb: AABB,
    /// Inclusive cell range, None when stored in the overflow list
    cells: Option<(Cell, Cell)>,
}

/// Uniform grid keyed by integer cell coordinates
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f32,
    max_cells_per_entry: usize,
    cells: HashMap<Cell, Vec<ComponentHandle>>,
    entries: HashMap<ComponentHandle, GridEntry>,
    overflow: Vec<ComponentHandle>,
}

impl UniformGrid {
    /// Create an empty grid
    pub fn new(config: &GridConfig) -> Self {
        Self {
            cell_size: if config.cell_size.is_finite() { config.cell_size.max(1e-3) } else { 1.0 },
            max_cells_per_entry: config.max_cells_per_entry.max(1),
            cells: HashMap::new(),
            entries: HashMap::new(),
            overflow: Vec::new(),
        }
    }

    /// Edge length of a cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn world_to_cell(&self, p: Vec3) -> Cell {
        let cs = self.cell_size;
        let clamp = |v: f32| (v / cs).floor().clamp(i32::MIN as f32, i32::MAX as f32) as i32;
        (clamp(p.x), clamp(p.y), clamp(p.z))
    }

    fn cell_range(&self, aabb: &AABB) -> Option<(Cell, Cell)> {
        if !aabb.is_finite() {
            return None;
        }
        let lo = self.world_to_cell(aabb.min);
        let hi = self.world_to_cell(aabb.max);
        let span = |a: i32, b: i32| (i64::from(b) - i64::from(a) + 1) as u128;
        let count = span(lo.0, hi.0) * span(lo.1, hi.1) * span(lo.2, hi.2);
        if count > self.max_cells_per_entry as u128 {
            None
        } else {
            Some((lo, hi))
        }
    }

    fn for_each_cell(range: (Cell, Cell), mut f: impl FnMut(Cell)) {
        let (lo, hi) = range;
        for z in lo.2..=hi.2 {
            for y in lo.1..=hi.1 {
                for x in lo.0..=hi.0 {
                    f((x, y, z));
                }
            }
        }
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, handle: ComponentHandle, aabb: AABB) {
        self.remove(handle);
        let cells = self.cell_range(&aabb);
        match cells {
            Some(range) => {
                let grid = &mut self.cells;
                Self::for_each_cell(range, |cell| grid.entry(cell).or_default().push(handle));
            }
            None => self.overflow.push(handle),
        }
        self.entries.insert(handle, GridEntry { aabb, cells });
    }

    /// Remove an entry
    pub fn remove(&mut self, handle: ComponentHandle) -> bool {
        let Some(entry) = self.entries.remove(&handle) else {
            return false;
        };
        match entry.cells {
            Some(range) => {
                let grid = &mut self.cells;
                Self::for_each_cell(range, |cell| {
                    if let Some(bucket) = grid.get_mut(&cell) {
                        bucket.retain(|h| *h != handle);
                        if bucket.is_empty() {
                            grid.remove(&cell);
                        }
                    }
                });
            }
            None => self.overflow.retain(|h| *h != handle),
        }
        true
    }

    /// Stored bounds of an entry
    pub fn get_aabb(&self, handle: ComponentHandle) -> Option<AABB> {
        self.entries.get(&handle).map(|e| e.aabb)
    }

    /// Handles of every stored entry
    pub fn handles(&self) -> Vec<ComponentHandle> {
        self.entries.keys().copied().collect()
    }

    /// Entries whose bounds intersect `query` (deduplicated)
    pub fn query_aabb(&self, query: &AABB) -> Vec<ComponentHandle> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        let mut consider = |handle: ComponentHandle| {
            if seen.insert(handle) {
                if let Some(entry) = self.entries.get(&handle) {
                    if entry.aabb.intersects(query) {
                        results.push(handle);
                    }
                }
            }
        };

        match self.cell_range(query) {
            Some(range) => Self::for_each_cell(range, |cell| {
                if let Some(bucket) = self.cells.get(&cell) {
                    bucket.iter().for_each(|h| consider(*h));
                }
            }),
            // Query too large for the grid: scan everything
            None => self.entries.keys().for_each(|h| consider(*h)),
        }
        self.overflow.iter().for_each(|h| consider(*h));
        results
    }

    /// Entries whose bounds the ray touches within `[0, max_distance]`
    ///
    /// Walks the cells along the ray with a 3D DDA; unbounded rays scan all entries.
    pub fn query_ray(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Vec<ComponentHandle> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        let mut consider = |handle: ComponentHandle| {
            if seen.insert(handle) {
                if let Some(entry) = self.entries.get(&handle) {
                    if entry.aabb.intersect_segment(origin, dir, max_distance).is_some() {
                        results.push(handle);
                    }
                }
            }
        };

        let steps_needed = max_distance / self.cell_size * 3.0 + 3.0;
        if !max_distance.is_finite() || steps_needed > (self.entries.len() as f32).max(64.0) * 8.0 {
            self.entries.keys().for_each(|h| consider(*h));
            return results;
        }

        let cs = self.cell_size;
        let mut cell = self.world_to_cell(origin);
        let mut step = [0i32; 3];
        let mut t_max = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];
        for axis in 0..3 {
            let d = dir[axis];
            let c = [cell.0, cell.1, cell.2][axis] as f32;
            if d > 0.0 {
                step[axis] = 1;
                t_max[axis] = ((c + 1.0) * cs - origin[axis]) / d;
                t_delta[axis] = cs / d;
            } else if d < 0.0 {
                step[axis] = -1;
                t_max[axis] = (c * cs - origin[axis]) / d;
                t_delta[axis] = -cs / d;
            }
        }

        let max_steps = steps_needed as usize;
        for _ in 0..=max_steps {
            if let Some(bucket) = self.cells.get(&cell) {
                bucket.iter().for_each(|h| consider(*h));
            }
            let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
                0
            } else if t_max[1] <= t_max[2] {
                1
            } else {
                2
            };
            if t_max[axis] > max_distance {
                break;
            }
            match axis {
                0 => cell.0 += step[0],
                1 => cell.1 += step[1],
                _ => cell.2 += step[2],
            }
            t_max[axis] += t_delta[axis];
        }

        self.overflow.iter().for_each(|h| consider(*h));
        results
    }

    /// Bounds of every occupied cell (for visualization)
    pub fn occupied_cells(&self) -> Vec<AABB> {
        let cs = self.cell_size;
        self.cells
            .keys()
            .map(|&(x, y, z)| {
                let min = Vec3::new(x as f32 * cs, y as f32 * cs, z as f32 * cs);
                AABB::new(min, min + Vec3::new(cs, cs, cs))
            })
            .collect()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
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

    fn cube(center: Vec3, half: f32) -> AABB {
        AABB::from_center_extents(center, Vec3::new(half, half, half))
    }

    #[test]
    fn test_insert_query_remove() {
        let mut grid = UniformGrid::new(&GridConfig::default());
        let h = handles(2);
        grid.insert(h[0], cube(Vec3::zeros(), 1.0));
        grid.insert(h[1], cube(Vec3::new(30.0, 0.0, 0.0), 1.0));

        let found = grid.query_aabb(&cube(Vec3::new(0.5, 0.0, 0.0), 1.0));
        assert_eq!(found, vec![h[0]]);

        assert!(grid.remove(h[0]));
        assert!(!grid.remove(h[0]));
        assert!(grid.query_aabb(&cube(Vec3::zeros(), 1.0)).is_empty());
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_ray_walk_finds_entries_in_order_of_cells() {
        let mut grid = UniformGrid::new(&GridConfig { cell_size: 2.0, max_cells_per_entry: 64 });
        let h = handles(3);
        grid.insert(h[0], cube(Vec3::new(0.0, 0.0, 5.0), 0.5));
        grid.insert(h[1], cube(Vec3::new(0.0, 0.0, 25.0), 0.5));
        grid.insert(h[2], cube(Vec3::new(3.0, 0.0, 5.0), 0.5));

        let mut found = grid.query_ray(Vec3::new(0.0, 0.0, -10.0), Vec3::new(0.0, 0.0, 1.0), 20.0);
        found.sort();
        assert_eq!(found, vec![h[0]]);

        let negative = grid.query_ray(Vec3::new(0.0, 0.0, 40.0), Vec3::new(0.0, 0.0, -1.0), 100.0);
        assert_eq!(negative.len(), 2);
    }

    #[test]
    fn test_huge_entries_use_overflow() {
        let mut grid = UniformGrid::new(&GridConfig { cell_size: 1.0, max_cells_per_entry: 8 });
        let h = handles(2);
        grid.insert(h[0], cube(Vec3::zeros(), 50.0));
        grid.insert(h[1], cube(Vec3::new(10.0, 10.0, 10.0), 0.25));

        let found = grid.query_aabb(&cube(Vec3::new(10.0, 10.0, 10.0), 0.5));
        assert_eq!(found.len(), 2);
        assert!(grid.remove(h[0]));
        assert_eq!(grid.query_aabb(&cube(Vec3::zeros(), 1.0)).len(), 0);
    }
}
