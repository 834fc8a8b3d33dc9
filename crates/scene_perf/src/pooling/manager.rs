//! Pool manager facade
//!
//! Coordinates the typed pools the render path draws from: keyed
//! geometry pools, material slots, full render entities, and math
//! scratch values. Release misuse is reported as a typed error and
//! logged, then swallowed here, so the render loop keeps going.

use crate::config::PoolConfig;
use crate::foundation::math::Vec3;

use super::keyed::{GeometryKey, KeyedPoolGroup, KeyedPoolStats};
use super::pool::{Pool, PoolStats, PooledKey, ReleaseError};
use super::resources::{Geometry, MaterialSlot, RenderEntity};

/// Handle to a pooled geometry: the dimension pool plus the slot in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHandle {
    /// Which dimension pool the geometry lives in
    pub key: GeometryKey,
    /// Slot within that pool
    pub slot: PooledKey,
}

/// Snapshot of one typed pool's occupancy and lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Values currently held active
    pub active: usize,
    /// Values currently retained on the free stack
    pub retained: usize,
    /// Lifetime counters
    pub stats: PoolStats,
}

impl PoolReport {
    fn of<T>(pool: &Pool<T>) -> Self {
        Self {
            active: pool.active_count(),
            retained: pool.retained_count(),
            stats: pool.stats(),
        }
    }
}

/// Aggregated statistics across all managed pools
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolManagerStats {
    /// Keyed geometry pools
    pub geometry: KeyedPoolStats,
    /// Material slot pool
    pub materials: PoolReport,
    /// Render entity pool
    pub entities: PoolReport,
    /// Math scratch pool
    pub scratch: PoolReport,
}

impl PoolManagerStats {
    /// Values currently active across every pool
    pub fn total_active(&self) -> usize {
        self.geometry.active + self.materials.active + self.entities.active + self.scratch.active
    }

    /// Values currently retained across every pool
    pub fn total_retained(&self) -> usize {
        self.geometry.retained
            + self.materials.retained
            + self.entities.retained
            + self.scratch.retained
    }

    /// Fraction of acquisitions served from free stacks, across every pool
    pub fn reuse_ratio(&self) -> f32 {
        let created = self.geometry.totals.created
            + self.materials.stats.created
            + self.entities.stats.created
            + self.scratch.stats.created;
        let reused = self.geometry.totals.reused
            + self.materials.stats.reused
            + self.entities.stats.reused
            + self.scratch.stats.reused;
        let acquisitions = created + reused;
        if acquisitions == 0 {
            0.0
        } else {
            reused as f32 / acquisitions as f32
        }
    }
}

/// Typed object pools with bounded retention and reset-on-release
pub struct PoolManager {
    geometry: KeyedPoolGroup,
    materials: Pool<MaterialSlot>,
    entities: Pool<RenderEntity>,
    scratch: Pool<Vec3>,
}

impl PoolManager {
    /// Create the manager from pool configuration
    pub fn new(config: &PoolConfig) -> Self {
        log::info!(
            "creating pool manager (max_retained={}, dimension_step={})",
            config.max_retained,
            config.dimension_step
        );
        Self {
            geometry: KeyedPoolGroup::new(config.dimension_step, config.max_retained),
            materials: Pool::new(
                "materials",
                config.max_retained,
                MaterialSlot::default,
                MaterialSlot::reset,
            ),
            entities: Pool::new(
                "entities",
                config.max_retained,
                RenderEntity::default,
                RenderEntity::reset,
            ),
            scratch: Pool::new("scratch", config.max_retained, Vec3::zeros, |v| {
                *v = Vec3::zeros();
            }),
        }
    }

    /// Acquire a geometry with dimensions snapped to the configured step
    pub fn acquire_geometry(&mut self, width: f32, height: f32, depth: f32) -> GeometryHandle {
        let (key, slot) = self.geometry.acquire(width, height, depth);
        GeometryHandle { key, slot }
    }

    /// Release a pooled geometry; misuse is logged and swallowed
    pub fn release_geometry(&mut self, handle: GeometryHandle) -> Result<(), ReleaseError> {
        self.geometry.release(handle.key, handle.slot)
    }

    /// Access an active pooled geometry
    pub fn geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometry.get(handle.key, handle.slot)
    }

    /// Acquire a material slot
    pub fn acquire_material(&mut self) -> PooledKey {
        self.materials.acquire()
    }

    /// Release a material slot
    pub fn release_material(&mut self, key: PooledKey) -> Result<(), ReleaseError> {
        self.materials.release(key)
    }

    /// Access an active material slot
    pub fn material(&self, key: PooledKey) -> Option<&MaterialSlot> {
        self.materials.get(key)
    }

    /// Mutably access an active material slot
    pub fn material_mut(&mut self, key: PooledKey) -> Option<&mut MaterialSlot> {
        self.materials.get_mut(key)
    }

    /// Acquire a render entity
    pub fn acquire_entity(&mut self) -> PooledKey {
        self.entities.acquire()
    }

    /// Release a render entity
    pub fn release_entity(&mut self, key: PooledKey) -> Result<(), ReleaseError> {
        self.entities.release(key)
    }

    /// Access an active render entity
    pub fn entity(&self, key: PooledKey) -> Option<&RenderEntity> {
        self.entities.get(key)
    }

    /// Mutably access an active render entity
    pub fn entity_mut(&mut self, key: PooledKey) -> Option<&mut RenderEntity> {
        self.entities.get_mut(key)
    }

    /// Run a callback with a pooled math scratch value, releasing it on
    /// every exit path
    pub fn with_scratch<R>(&mut self, f: impl FnOnce(&mut Vec3) -> R) -> R {
        self.scratch.scoped(f)
    }

    /// Discard every pool's free stack and active membership
    pub fn clear_all(&mut self) {
        log::debug!("clearing all pools");
        self.geometry.clear();
        self.materials.clear();
        self.entities.clear();
        self.scratch.clear();
    }

    /// Aggregate statistics across all pools
    pub fn stats(&self) -> PoolManagerStats {
        PoolManagerStats {
            geometry: self.geometry.stats(),
            materials: PoolReport::of(&self.materials),
            entities: PoolReport::of(&self.entities),
            scratch: PoolReport::of(&self.scratch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PoolManager {
        PoolManager::new(&PoolConfig::default())
    }

    #[test]
    fn test_geometry_round_trip() {
        let mut pools = manager();
        let handle = pools.acquire_geometry(2.0, 1.0, 3.0);
        assert!(pools.geometry(handle).is_some());
        pools.release_geometry(handle).unwrap();
        assert!(pools.geometry(handle).is_none());
    }

    #[test]
    fn test_material_reset_between_users() {
        let mut pools = manager();

        let key = pools.acquire_material();
        pools.material_mut(key).unwrap().color = [0.2, 0.4, 0.6];
        pools.release_material(key).unwrap();

        let key = pools.acquire_material();
        assert_eq!(pools.material(key).unwrap(), &MaterialSlot::default());
    }

    #[test]
    fn test_entity_release_misuse_is_typed() {
        let mut pools = manager();
        let key = pools.acquire_entity();
        pools.release_entity(key).unwrap();
        assert_eq!(pools.release_entity(key), Err(ReleaseError::NotActive));
    }

    #[test]
    fn test_scratch_is_zeroed() {
        let mut pools = manager();
        pools.with_scratch(|v| *v = Vec3::new(1.0, 2.0, 3.0));
        pools.with_scratch(|v| assert_eq!(*v, Vec3::zeros()));
    }

    #[test]
    fn test_stats_aggregate() {
        let mut pools = manager();
        let g = pools.acquire_geometry(1.0, 1.0, 1.0);
        let m = pools.acquire_material();
        let _e = pools.acquire_entity();

        let stats = pools.stats();
        assert_eq!(stats.total_active(), 3);

        pools.release_geometry(g).unwrap();
        pools.release_material(m).unwrap();
        let stats = pools.stats();
        assert_eq!(stats.total_active(), 1);
        assert_eq!(stats.total_retained(), 2);
    }

    #[test]
    fn test_clear_all() {
        let mut pools = manager();
        pools.acquire_entity();
        pools.acquire_geometry(1.0, 1.0, 1.0);
        pools.clear_all();
        assert_eq!(pools.stats().total_active(), 0);
        assert_eq!(pools.stats().total_retained(), 0);
    }
}
