//! Sample shapes and bounded history

use std::collections::VecDeque;
use std::time::Instant;

use crate::culling::CullStats;
use crate::lod::LodStats;
use crate::materials::CacheStats;
use crate::pooling::PoolManagerStats;
use crate::scene::RenderCounters;

/// Estimated memory footprint at sample time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryBreakdown {
    /// Geometries resident on the renderer
    pub geometries: u32,
    /// Textures resident on the renderer
    pub textures: u32,
    /// Cumulative cached texture bytes
    pub texture_bytes: u64,
    /// Rough total estimate in megabytes
    pub estimated_mb: f32,
}

/// Statistics gathered from the other managers at sample time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubsystemStats {
    /// Pool manager occupancy and reuse counters
    pub pools: PoolManagerStats,
    /// LOD tracking and swap counters
    pub lod: LodStats,
    /// Culling counters from the most recent pass
    pub culling: CullStats,
    /// Material and texture cache counters
    pub cache: CacheStats,
}

/// One periodic snapshot of runtime performance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    /// When the sample was taken
    pub timestamp: Instant,
    /// Frames displayed since the previous sample, divided by the
    /// elapsed time (throughput, not inverse frame cost)
    pub fps: f32,
    /// Rolling average frame time in milliseconds
    pub frame_time_ms: f32,
    /// Estimated memory footprint
    pub memory: MemoryBreakdown,
    /// Renderer counters for the last displayed frame
    pub counters: RenderCounters,
    /// Statistics from the other managers
    pub subsystems: SubsystemStats,
}

/// Bounded sample history; pushing beyond capacity evicts the oldest
#[derive(Debug)]
pub struct SampleHistory {
    samples: VecDeque<PerformanceSample>,
    capacity: usize,
}

impl SampleHistory {
    /// Create an empty history holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest at capacity
    pub fn push(&mut self, sample: PerformanceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// The most recent sample
    pub fn latest(&self) -> Option<&PerformanceSample> {
        self.samples.back()
    }

    /// The most recent `n` samples, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &PerformanceSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip)
    }

    /// Samples retained
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are retained
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fps: f32) -> PerformanceSample {
        PerformanceSample {
            timestamp: Instant::now(),
            fps,
            frame_time_ms: 1000.0 / fps,
            memory: MemoryBreakdown::default(),
            counters: RenderCounters::default(),
            subsystems: SubsystemStats::default(),
        }
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = SampleHistory::new(3);
        for fps in [10.0, 20.0, 30.0, 40.0] {
            history.push(sample(fps));
        }
        assert_eq!(history.len(), 3);
        let fps: Vec<f32> = history.recent(3).map(|s| s.fps).collect();
        assert_eq!(fps, vec![20.0, 30.0, 40.0]);
        assert_eq!(history.latest().unwrap().fps, 40.0);
    }

    #[test]
    fn test_recent_clamps_to_available() {
        let mut history = SampleHistory::new(10);
        history.push(sample(60.0));
        assert_eq!(history.recent(5).count(), 1);
    }
}
