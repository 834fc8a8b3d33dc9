//! Performance context
//!
//! Owns one instance of every manager and wires them into a per-frame
//! pipeline. Hosts wanting a different composition can construct the
//! managers directly; nothing here is global state.

use std::time::Duration;

use crate::config::PerfConfig;
use crate::culling::{CullResult, CullingManager, SpatialGrid};
use crate::lod::LodManager;
use crate::materials::MaterialOptimizer;
use crate::monitor::{PerformanceMonitor, PerformanceSample, SubsystemStats};
use crate::pooling::PoolManager;
use crate::scene::{Camera, RenderDevice, SceneNode};

/// All five managers under one owner, driven by [`tick`](Self::tick)
pub struct PerfContext {
    config: PerfConfig,
    pools: PoolManager,
    lod: LodManager,
    culling: CullingManager,
    grid: SpatialGrid,
    materials: MaterialOptimizer,
    monitor: PerformanceMonitor,
}

impl Default for PerfContext {
    fn default() -> Self {
        Self::new(PerfConfig::default())
    }
}

impl PerfContext {
    /// Build a context from configuration
    pub fn new(config: PerfConfig) -> Self {
        log::info!("creating performance context");
        Self {
            pools: PoolManager::new(&config.pooling),
            lod: LodManager::new(&config.lod),
            culling: CullingManager::new(config.culling.clone()),
            grid: SpatialGrid::new(&config.culling),
            materials: MaterialOptimizer::new(),
            monitor: PerformanceMonitor::new(&config.monitor),
            config,
        }
    }

    /// Run one frame's worth of optimization work
    ///
    /// LOD selection runs first so culling sees the frame's final
    /// representations, then the scene is culled, then the monitor is
    /// fed the frame duration and, when a sample interval has elapsed,
    /// a snapshot of every manager's statistics.
    ///
    /// Returns the performance sample if one was taken this tick.
    /// Culling decisions for the pass are available from
    /// [`culling_results`](Self::culling_results).
    pub fn tick(
        &mut self,
        root: &SceneNode,
        camera: &Camera,
        renderer: &impl RenderDevice,
        frame_time: Duration,
    ) -> Option<PerformanceSample> {
        self.lod.set_camera(camera);
        self.lod.update();

        self.culling.set_camera(camera.clone());
        self.culling.set_viewport_height(renderer.output_height());
        self.culling.cull_scene(root);

        self.monitor.on_frame(frame_time);
        let subsystems = self.subsystem_stats();
        self.monitor.tick(renderer.counters(), subsystems)
    }

    /// Culling decisions from the most recent pass
    pub fn culling_results(&self) -> &[CullResult] {
        self.culling.results()
    }

    /// Snapshot of every manager's statistics
    pub fn subsystem_stats(&self) -> SubsystemStats {
        SubsystemStats {
            pools: self.pools.stats(),
            lod: self.lod.stats(),
            culling: self.culling.stats(),
            cache: self.materials.cache_stats(),
        }
    }

    /// The configuration this context was built from
    pub fn config(&self) -> &PerfConfig {
        &self.config
    }

    /// Object pools
    pub fn pools(&self) -> &PoolManager {
        &self.pools
    }

    /// Object pools, mutably
    pub fn pools_mut(&mut self) -> &mut PoolManager {
        &mut self.pools
    }

    /// LOD manager
    pub fn lod(&self) -> &LodManager {
        &self.lod
    }

    /// LOD manager, mutably
    pub fn lod_mut(&mut self) -> &mut LodManager {
        &mut self.lod
    }

    /// Culling manager
    pub fn culling(&self) -> &CullingManager {
        &self.culling
    }

    /// Culling manager, mutably
    pub fn culling_mut(&mut self) -> &mut CullingManager {
        &mut self.culling
    }

    /// Spatial grid for hierarchical culling
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Spatial grid, mutably; pair with
    /// [`culling_mut`](Self::culling_mut) to run a hierarchical pass
    pub fn grid_mut(&mut self) -> &mut SpatialGrid {
        &mut self.grid
    }

    /// Run a hierarchical culling pass over grid-tracked objects
    /// instead of a tree traversal
    pub fn cull_with_grid(
        &mut self,
        nodes: &std::collections::HashMap<crate::scene::ObjectId, SceneNode>,
    ) -> &[CullResult] {
        self.grid.cull(&mut self.culling, nodes)
    }

    /// Material and texture cache
    pub fn materials(&self) -> &MaterialOptimizer {
        &self.materials
    }

    /// Material and texture cache, mutably
    pub fn materials_mut(&mut self) -> &mut MaterialOptimizer {
        &mut self.materials
    }

    /// Performance monitor
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Performance monitor, mutably
    pub fn monitor_mut(&mut self) -> &mut PerformanceMonitor {
        &mut self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::lod::{LodChain, Representation};
    use crate::scene::{RenderCounters, StubRenderer};

    fn scene() -> SceneNode {
        let mut root = SceneNode::unit_box(1, "root", Vec3::new(0.0, 0.0, -20.0));
        root.add_child(SceneNode::unit_box(2, "near", Vec3::new(2.0, 0.0, -15.0)));
        root.add_child(SceneNode::unit_box(3, "behind", Vec3::new(0.0, 0.0, 50.0)));
        root
    }

    fn camera() -> Camera {
        let mut camera = Camera::perspective(Vec3::zeros(), 60.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.look_at(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0));
        camera
    }

    #[test]
    fn test_tick_runs_lod_and_culling() {
        let mut context = PerfContext::default();
        let chain = LodChain::new(
            vec![10.0, 30.0],
            vec![
                Representation::named("high"),
                Representation::named("medium"),
                Representation::named("low"),
            ],
        )
        .unwrap();
        let key = context.lod_mut().add_object(Vec3::new(0.0, 0.0, -20.0), chain);

        let mut renderer = StubRenderer::new(1920, 1080);
        renderer.set_counters(RenderCounters {
            draw_calls: 3,
            ..RenderCounters::default()
        });

        context.tick(&scene(), &camera(), &renderer, Duration::from_millis(16));

        // Distance 20 lands in the second band
        assert_eq!(context.lod().active_level(key), Some(1));

        let stats = context.culling().stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.visible, 2);
        assert_eq!(stats.culled_frustum, 1);
        assert_eq!(context.culling_results().len(), 3);
    }

    #[test]
    fn test_tick_samples_when_monitoring() {
        let mut context = PerfContext::default();
        context.monitor_mut().start_monitoring();

        let renderer = StubRenderer::new(1920, 1080);
        let sample = context.tick(&scene(), &camera(), &renderer, Duration::from_millis(16));

        let sample = sample.expect("first due tick should sample");
        assert!((sample.frame_time_ms - 16.0).abs() < 0.1);
        assert_eq!(sample.subsystems.culling.total, 3);
        assert_eq!(context.monitor().get_history(10).len(), 1);
    }

    #[test]
    fn test_idle_monitor_ticks_quietly() {
        let mut context = PerfContext::default();
        let renderer = StubRenderer::new(1920, 1080);
        let sample = context.tick(&scene(), &camera(), &renderer, Duration::from_millis(16));
        assert!(sample.is_none());
    }

    #[test]
    fn test_grid_path_through_context() {
        use std::collections::HashMap;

        let mut context = PerfContext::default();
        context.culling_mut().set_camera(camera());

        let node = SceneNode::unit_box(7, "tracked", Vec3::new(0.0, 0.0, -25.0));
        context.grid_mut().insert(7, node.world_position());
        let nodes: HashMap<_, _> = [(7, node)].into();

        let results = context.cull_with_grid(&nodes);
        assert_eq!(results.len(), 1);
        assert!(results[0].visible);
    }

    #[test]
    fn test_pools_and_materials_feed_stats() {
        let mut context = PerfContext::default();
        let _entity = context.pools_mut().acquire_entity();
        let desc = crate::materials::MaterialDesc::default();
        let _a = context.materials_mut().get_material(&desc);
        let _b = context.materials_mut().get_material(&desc);

        let stats = context.subsystem_stats();
        assert_eq!(stats.pools.total_active(), 1);
        assert_eq!(stats.cache.material_hits, 1);
    }
}
