//! Geometry pools grouped by quantized dimensions
//!
//! Exact-dimension pooling would almost never hit: every drag handle
//! produces a slightly different box. Quantizing dimensions to a fixed
//! step trades minor visual distortion for reuse density, so nearby
//! sizes share one pool.

use std::collections::HashMap;

use super::pool::{Pool, PoolStats, PooledKey, ReleaseError};
use super::resources::Geometry;

/// Quantized dimension key identifying one geometry pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryKey {
    width: u32,
    height: u32,
    depth: u32,
}

impl GeometryKey {
    /// Quantize raw dimensions to the given step
    ///
    /// Each dimension is rounded to the nearest step, with a floor of
    /// one step so degenerate sizes still get a valid pool.
    pub fn quantize(width: f32, height: f32, depth: f32, step: f32) -> Self {
        let snap = |v: f32| ((v / step).round().max(1.0)) as u32;
        Self {
            width: snap(width),
            height: snap(height),
            depth: snap(depth),
        }
    }

    /// The quantized dimensions in world units
    pub fn dimensions(&self, step: f32) -> (f32, f32, f32) {
        (
            self.width as f32 * step,
            self.height as f32 * step,
            self.depth as f32 * step,
        )
    }
}

/// Aggregate counters across all pools in a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyedPoolStats {
    /// Number of distinct dimension pools
    pub pools: usize,
    /// Values currently active across all pools
    pub active: usize,
    /// Values currently retained across all pools
    pub retained: usize,
    /// Summed lifetime counters
    pub totals: PoolStats,
}

/// Mapping from quantized dimension keys to geometry pools
pub struct KeyedPoolGroup {
    step: f32,
    max_retained: usize,
    pools: HashMap<GeometryKey, Pool<Geometry>>,
}

impl KeyedPoolGroup {
    /// Create a group quantizing to `step`, with per-pool retention
    /// bounded by `max_retained`
    pub fn new(step: f32, max_retained: usize) -> Self {
        Self {
            step,
            max_retained,
            pools: HashMap::new(),
        }
    }

    /// Acquire a geometry whose dimensions are snapped to the group's
    /// quantization step
    pub fn acquire(&mut self, width: f32, height: f32, depth: f32) -> (GeometryKey, PooledKey) {
        let key = GeometryKey::quantize(width, height, depth, self.step);
        let step = self.step;
        let max_retained = self.max_retained;
        let pool = self.pools.entry(key).or_insert_with(|| {
            let (w, h, d) = key.dimensions(step);
            log::debug!("creating geometry pool for {w:.2}x{h:.2}x{d:.2}");
            Pool::new(
                "geometry",
                max_retained,
                move || Geometry::new(w, h, d),
                |_| {},
            )
        });
        (key, pool.acquire())
    }

    /// Release a geometry back to its dimension pool
    pub fn release(&mut self, key: GeometryKey, slot: PooledKey) -> Result<(), ReleaseError> {
        match self.pools.get_mut(&key) {
            Some(pool) => pool.release(slot),
            None => {
                log::warn!("geometry release for a dimension pool that does not exist");
                Err(ReleaseError::NotActive)
            }
        }
    }

    /// Access an active geometry
    pub fn get(&self, key: GeometryKey, slot: PooledKey) -> Option<&Geometry> {
        self.pools.get(&key).and_then(|pool| pool.get(slot))
    }

    /// Quantization step in world units
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Discard all pools' free stacks and active membership
    pub fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
    }

    /// Aggregate counters across all dimension pools
    pub fn stats(&self) -> KeyedPoolStats {
        let mut stats = KeyedPoolStats {
            pools: self.pools.len(),
            ..KeyedPoolStats::default()
        };
        for pool in self.pools.values() {
            stats.active += pool.active_count();
            stats.retained += pool.retained_count();
            let s = pool.stats();
            stats.totals.created += s.created;
            stats.totals.reused += s.reused;
            stats.totals.released += s.released;
            stats.totals.dropped += s.dropped;
        }
        stats
    }
}
