//! Hierarchical culling over a uniform spatial grid
//!
//! Partitions tracked objects into 2D (x, z) cells so whole cells
//! outside an approximate frustum footprint can be rejected without
//! per-object testing. Only objects in overlapping cells get the full
//! ordered tests.
//!
//! The footprint is evaluated at a fixed maximum depth and can falsely
//! reject valid cells near frustum edges. That is a documented
//! approximation of this path, validated against the flat path in
//! tests, not silently corrected.

use std::collections::HashMap;

use crate::config::CullingConfig;
use crate::foundation::math::Vec3;
use crate::scene::{Camera, ObjectId, SceneNode};

use super::culler::{CullReason, CullResult, CullingManager};

/// Counters for the most recent hierarchical pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Occupied cells
    pub cells: usize,
    /// Objects tracked in the grid
    pub tracked: usize,
    /// Occupied cells overlapping the footprint in the last pass
    pub cells_in_footprint: usize,
    /// Objects coarse-rejected without per-object testing in the last pass
    pub coarse_rejected: usize,
    /// Objects given the full ordered tests in the last pass
    pub fine_tested: usize,
}

/// Uniform 2D grid over tracked object positions
pub struct SpatialGrid {
    cell_size: f32,
    footprint_depth: f32,
    cells: HashMap<(i32, i32), Vec<ObjectId>>,
    locations: HashMap<ObjectId, (i32, i32)>,
    stats: GridStats,
}

impl SpatialGrid {
    /// Create a grid from culling configuration
    pub fn new(config: &CullingConfig) -> Self {
        Self {
            cell_size: config.cell_size,
            footprint_depth: config.footprint_depth,
            cells: HashMap::new(),
            locations: HashMap::new(),
            stats: GridStats::default(),
        }
    }

    /// The cell coordinate containing a world position
    pub fn cell_of(&self, position: Vec3) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }

    /// Start tracking an object at a world position
    pub fn insert(&mut self, id: ObjectId, position: Vec3) {
        let cell = self.cell_of(position);
        if let Some(previous) = self.locations.insert(id, cell) {
            if previous == cell {
                return;
            }
            self.detach(id, previous);
        }
        self.cells.entry(cell).or_default().push(id);
    }

    /// Relocate an object after it moved
    ///
    /// Callers own this responsibility: the grid does not watch
    /// transforms, so a moved object stays in its old cell until this
    /// is called.
    pub fn update_position(&mut self, id: ObjectId, position: Vec3) {
        self.insert(id, position);
    }

    /// Stop tracking an object
    pub fn remove(&mut self, id: ObjectId) {
        if let Some(cell) = self.locations.remove(&id) {
            self.detach(id, cell);
        }
    }

    /// Whether an object is tracked
    pub fn contains(&self, id: ObjectId) -> bool {
        self.locations.contains_key(&id)
    }

    /// Number of tracked objects
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the grid is empty
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Counters for the most recent pass
    pub fn stats(&self) -> GridStats {
        self.stats
    }

    /// Hierarchically cull all tracked objects
    ///
    /// Objects in cells outside the approximate frustum footprint are
    /// rejected wholesale (reported as frustum-culled with no distance
    /// computed); objects in overlapping cells get the full ordered
    /// tests from the flat culling manager. Results and statistics land
    /// in `culler`, as for a flat pass.
    pub fn cull<'a>(
        &mut self,
        culler: &'a mut CullingManager,
        nodes: &HashMap<ObjectId, SceneNode>,
    ) -> &'a [CullResult] {
        culler.reset_pass();
        self.stats = GridStats {
            cells: self.cells.len(),
            tracked: self.locations.len(),
            ..GridStats::default()
        };

        let footprint = culler.camera().and_then(|camera| self.footprint(camera));

        for (&cell, ids) in &self.cells {
            let overlaps = match footprint {
                Some(((min_x, min_z), (max_x, max_z))) => {
                    cell.0 >= min_x && cell.0 <= max_x && cell.1 >= min_z && cell.1 <= max_z
                }
                // No camera or degenerate orientation: test everything
                None => true,
            };

            if overlaps {
                self.stats.cells_in_footprint += 1;
                for id in ids {
                    let Some(node) = nodes.get(id) else {
                        log::warn!("grid tracks object {id} with no scene node; skipping");
                        continue;
                    };
                    let result = culler.classify(node);
                    culler.record(result);
                    self.stats.fine_tested += 1;
                }
            } else {
                for &id in ids {
                    culler.record(CullResult::culled(id, CullReason::Frustum, 0.0));
                    self.stats.coarse_rejected += 1;
                }
            }
        }

        culler.results()
    }

    /// Approximate frustum footprint on the (x, z) plane as an
    /// inclusive cell range, evaluated at the configured maximum depth
    fn footprint(&self, camera: &Camera) -> Option<((i32, i32), (i32, i32))> {
        let forward = camera.target - camera.position;
        if forward.magnitude() <= f32::EPSILON {
            return None;
        }
        let forward = forward.normalize();
        let right = forward.cross(&camera.up);
        if right.magnitude() <= f32::EPSILON {
            return None;
        }
        let right = right.normalize();
        let up = right.cross(&forward);

        let depth = self.footprint_depth;
        let half_h = (camera.fov * 0.5).tan() * depth;
        let half_w = half_h * camera.aspect;
        let far_center = camera.position + forward * depth;

        let corners = [
            camera.position,
            far_center + right * half_w + up * half_h,
            far_center + right * half_w - up * half_h,
            far_center - right * half_w + up * half_h,
            far_center - right * half_w - up * half_h,
        ];

        let mut min = (i32::MAX, i32::MAX);
        let mut max = (i32::MIN, i32::MIN);
        for corner in corners {
            let cell = self.cell_of(corner);
            min = (min.0.min(cell.0), min.1.min(cell.1));
            max = (max.0.max(cell.0), max.1.max(cell.1));
        }
        Some((min, max))
    }

    fn detach(&mut self, id: ObjectId, cell: (i32, i32)) {
        if let Some(ids) = self.cells.get_mut(&cell) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }
}
