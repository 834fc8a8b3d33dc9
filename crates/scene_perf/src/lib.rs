//! # Scene Perf
//!
//! Runtime performance core for an interactive 3D scene editor:
//! object pooling, distance-based level of detail, visibility culling,
//! material and texture deduplication, and periodic performance
//! monitoring with threshold alerts.
//!
//! Everything hangs off explicit contexts; there are no globals. Most
//! hosts construct a [`PerfContext`] and drive it once per frame:
//!
//! ```rust,no_run
//! use scene_perf::prelude::*;
//! use std::time::Duration;
//!
//! let mut perf = PerfContext::new(PerfConfig::default());
//! perf.monitor_mut().start_monitoring();
//!
//! let scene = SceneNode::unit_box(1, "crate", Vec3::new(0.0, 0.0, -20.0));
//! let mut camera = Camera::perspective(Vec3::zeros(), 60.0, 16.0 / 9.0, 0.1, 1000.0);
//! camera.look_at(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0));
//! let renderer = StubRenderer::new(1920, 1080);
//!
//! loop {
//!     let sample = perf.tick(&scene, &camera, &renderer, Duration::from_millis(16));
//!     if let Some(sample) = sample {
//!         println!("{:.1} fps", sample.fps);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod culling;
pub mod foundation;
pub mod lod;
pub mod materials;
pub mod monitor;
pub mod pooling;
pub mod scene;

mod context;

pub use context::PerfContext;

/// Common imports for performance core users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, PerfConfig},
        culling::{CullReason, CullResult, CullingManager, SpatialGrid},
        foundation::{
            math::{Aabb, Mat4, Vec3},
            time::Timer,
        },
        lod::{LodChain, LodManager, Representation},
        materials::{MaterialDesc, MaterialOptimizer},
        monitor::{AlertLevel, PerformanceMonitor, PerformanceSample},
        pooling::PoolManager,
        scene::{Camera, ObjectId, RenderDevice, SceneNode, StubRenderer},
        PerfContext,
    };
}
