//! Synthetic workload probe
//!
//! Builds a grid of boxes around the origin, attaches LOD chains and
//! interned materials, then orbits a camera through a few hundred
//! frames while the monitor samples. Prints the summary at the end.
//!
//! Run with `RUST_LOG=info cargo run -p perf_probe` for progress logs.

use std::time::{Duration, Instant};

use rand::Rng;
use scene_perf::materials::MaterialDesc;
use scene_perf::monitor::PerformanceSummary;
use scene_perf::prelude::*;
use scene_perf::scene::RenderCounters;

const GRID_EXTENT: i32 = 6;
const GRID_SPACING: f32 = 12.0;
const FRAMES: usize = 300;

struct Probe {
    perf: PerfContext,
    scene: SceneNode,
    camera: Camera,
    renderer: StubRenderer,
}

impl Probe {
    fn new() -> Self {
        let mut config = PerfConfig::default();
        config.monitor.sample_interval_ms = 250;
        let mut perf = PerfContext::new(config);

        let mut rng = rand::thread_rng();
        let mut scene = SceneNode::unit_box(0, "root", Vec3::zeros());
        let mut next_id: ObjectId = 1;

        // A handful of looks, re-requested across the whole grid so the
        // material cache gets real hit traffic
        let palette: Vec<MaterialDesc> = (0..4)
            .map(|i| MaterialDesc {
                color: [0.2 + 0.2 * i as f32, 0.5, 0.8 - 0.15 * i as f32],
                roughness: 0.3 + 0.1 * i as f32,
                ..MaterialDesc::default()
            })
            .collect();

        for gx in -GRID_EXTENT..=GRID_EXTENT {
            for gz in -GRID_EXTENT..=GRID_EXTENT {
                let jitter_x: f32 = rng.gen_range(-2.0..2.0);
                let jitter_z: f32 = rng.gen_range(-2.0..2.0);
                let position = Vec3::new(
                    gx as f32 * GRID_SPACING + jitter_x,
                    0.0,
                    gz as f32 * GRID_SPACING + jitter_z,
                );

                let id = next_id;
                next_id += 1;
                scene.add_child(SceneNode::unit_box(id, format!("box-{id}"), position));

                let chain = LodChain::new(
                    vec![25.0, 60.0],
                    vec![
                        Representation::pooled(
                            "high",
                            perf.pools_mut().acquire_geometry(1.0, 1.0, 1.0),
                        ),
                        Representation::pooled(
                            "medium",
                            perf.pools_mut().acquire_geometry(1.0, 1.0, 1.0),
                        ),
                        Representation::named("billboard"),
                    ],
                )
                .expect("static chain is well formed");
                perf.lod_mut().add_object(position, chain);

                let look = &palette[(id as usize) % palette.len()];
                let _material = perf.materials_mut().get_material(look);
                let _texture = perf.materials_mut().get_texture("crate_albedo.png", 512, 512);
            }
        }

        log::info!("probe scene: {} objects", scene.subtree_len() - 1);

        let mut camera = Camera::perspective(Vec3::new(0.0, 8.0, 40.0), 60.0, 16.0 / 9.0, 0.1, 500.0);
        camera.look_at(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));

        let renderer = StubRenderer::new(1920, 1080);

        Self {
            perf,
            scene,
            camera,
            renderer,
        }
    }

    fn run(&mut self) -> Option<PerformanceSummary> {
        self.perf.monitor_mut().start_monitoring();
        let mut timer = Timer::new();

        for frame in 0..FRAMES {
            // Orbit at radius 40, bobbing between wide and close views
            let angle = frame as f32 * 0.02;
            let radius = 40.0 + 15.0 * (frame as f32 * 0.01).sin();
            self.camera.set_position(Vec3::new(
                radius * angle.cos(),
                8.0,
                radius * angle.sin(),
            ));
            self.camera.look_at(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));

            timer.update();
            let frame_start = Instant::now();

            let sample = self.perf.tick(
                &self.scene,
                &self.camera,
                &self.renderer,
                timer.delta_time(),
            );
            let stats = self.perf.culling().stats();
            self.renderer.set_counters(RenderCounters {
                draw_calls: stats.visible as u32,
                triangles: stats.visible as u64 * 12,
                textures: 1,
                geometries: stats.visible as u32,
            });

            if let Some(sample) = sample {
                log::info!(
                    "frame {frame}: {:.1} fps, {}/{} visible, reuse {:.0}%",
                    sample.fps,
                    stats.visible,
                    stats.total,
                    sample.subsystems.pools.reuse_ratio() * 100.0
                );
            }

            // Pace the loop so frame durations are non-trivial
            let elapsed = frame_start.elapsed();
            if elapsed < Duration::from_millis(4) {
                std::thread::sleep(Duration::from_millis(4) - elapsed);
            }
        }

        self.perf.monitor_mut().stop_monitoring();
        self.perf.monitor().performance_summary(60)
    }
}

fn main() {
    env_logger::init();

    let mut probe = Probe::new();
    match probe.run() {
        Some(summary) => {
            println!("frames sampled:     {}", summary.samples);
            println!("average fps:        {:.1}", summary.average_fps);
            println!("average frame time: {:.2} ms", summary.average_frame_time_ms);
            println!("peak memory:        {:.1} MB", summary.peak_memory_mb);
            println!("effectiveness:      {:.0}%", summary.effectiveness * 100.0);
            println!(
                "alerts:             {} warning, {} critical",
                summary.warnings, summary.criticals
            );
        }
        None => println!("no samples taken"),
    }

    let cache = probe.perf.materials().cache_stats();
    println!(
        "material cache:     {} shared, {:.0}% hit rate",
        cache.material_total,
        cache.material_hit_rate() * 100.0
    );
}
