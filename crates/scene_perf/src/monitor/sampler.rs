//! Sampling loop driver

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::MonitorConfig;
use crate::scene::RenderCounters;

use super::alert::{Alert, AlertEngine};
use super::sample::{MemoryBreakdown, PerformanceSample, SampleHistory, SubsystemStats};

/// Shortest supported sample interval
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Rough resident size of one renderer geometry, in megabytes
const GEOMETRY_MB_ESTIMATE: f32 = 0.25;

/// Whether the monitor is currently sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not sampling; frame hooks and ticks are ignored
    Idle,
    /// Sampling on the configured interval
    Monitoring,
}

/// Aggregate view over recent samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    /// Samples the averages cover
    pub samples: usize,
    /// Average FPS over the window
    pub average_fps: f32,
    /// Average frame time over the window, in milliseconds
    pub average_frame_time_ms: f32,
    /// Highest estimated memory footprint in the window, in megabytes
    pub peak_memory_mb: f32,
    /// Optimization effectiveness score in 0..=1: the mean of the
    /// culling ratio, LOD reduction ratio, and cache hit rates from the
    /// latest sample
    pub effectiveness: f32,
    /// Retained warning alerts
    pub warnings: usize,
    /// Retained critical alerts
    pub criticals: usize,
}

/// Interval-driven performance sampler
///
/// The frame loop reports each frame via [`on_frame`](Self::on_frame)
/// and calls [`tick`](Self::tick) once per frame; a sample is taken
/// only when the configured interval has elapsed, so sampling cost
/// stays off the common frame path.
///
/// FPS is throughput: frames counted since the previous sample divided
/// by the elapsed time, so an editor rendering sparsely reports low
/// fps even when each frame is cheap. The frame-duration ring feeds
/// the average frame time only.
pub struct PerformanceMonitor {
    state: MonitorState,
    interval: Duration,
    frame_ring_len: usize,
    last_sample: Option<Instant>,
    period_start: Instant,
    frames_since_sample: u32,
    frame_times: VecDeque<Duration>,
    history: SampleHistory,
    alerts: AlertEngine,
}

impl PerformanceMonitor {
    /// Create a monitor in the idle state
    pub fn new(config: &MonitorConfig) -> Self {
        let requested = Duration::from_millis(config.sample_interval_ms);
        let interval = requested.max(MIN_INTERVAL);
        if interval != requested {
            log::warn!(
                "sample interval {}ms below minimum, clamped to {}ms",
                requested.as_millis(),
                interval.as_millis()
            );
        }
        Self {
            state: MonitorState::Idle,
            interval,
            frame_ring_len: config.frame_ring_len.max(1),
            last_sample: None,
            period_start: Instant::now(),
            frames_since_sample: 0,
            frame_times: VecDeque::with_capacity(config.frame_ring_len),
            history: SampleHistory::new(config.history_len.max(1)),
            alerts: AlertEngine::new(
                config.thresholds.clone(),
                Duration::from_millis(config.cooldown_ms),
                Duration::from_millis(config.retention_ms),
            ),
        }
    }

    /// Begin sampling; a no-op when already monitoring
    pub fn start_monitoring(&mut self) {
        if self.state == MonitorState::Monitoring {
            return;
        }
        log::info!(
            "performance monitoring started (interval {}ms)",
            self.interval.as_millis()
        );
        self.state = MonitorState::Monitoring;
        self.last_sample = None;
        self.period_start = Instant::now();
        self.frames_since_sample = 0;
        self.frame_times.clear();
    }

    /// Stop sampling, keeping history and alerts for inspection; a
    /// no-op when already idle
    pub fn stop_monitoring(&mut self) {
        if self.state == MonitorState::Idle {
            return;
        }
        log::info!("performance monitoring stopped");
        self.state = MonitorState::Idle;
    }

    /// Whether the monitor is sampling
    pub fn is_monitoring(&self) -> bool {
        self.state == MonitorState::Monitoring
    }

    /// Current state
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Effective sample interval after clamping
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record one displayed frame; ignored while idle
    ///
    /// Counts the frame toward the next sample's fps and keeps its
    /// duration in the ring for the average frame time.
    pub fn on_frame(&mut self, duration: Duration) {
        if self.state == MonitorState::Idle {
            return;
        }
        self.frames_since_sample = self.frames_since_sample.saturating_add(1);
        if self.frame_times.len() == self.frame_ring_len {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(duration);
    }

    /// Take a sample if the interval has elapsed since the last one
    ///
    /// Returns the new sample when one was taken. Idle monitors and
    /// monitors that have seen no frames yet never sample.
    pub fn tick(
        &mut self,
        counters: RenderCounters,
        subsystems: SubsystemStats,
    ) -> Option<PerformanceSample> {
        if self.state == MonitorState::Idle || self.frame_times.is_empty() {
            return None;
        }
        let now = Instant::now();
        let due = self
            .last_sample
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if !due {
            return None;
        }
        Some(self.sample_at(now, counters, subsystems))
    }

    /// Take a sample unconditionally at an explicit time
    ///
    /// [`tick`](Self::tick) calls this when due; callers that drive
    /// time themselves can call it directly.
    pub fn sample_at(
        &mut self,
        now: Instant,
        counters: RenderCounters,
        subsystems: SubsystemStats,
    ) -> PerformanceSample {
        let frame_time_ms = if self.frame_times.is_empty() {
            0.0
        } else {
            let total: Duration = self.frame_times.iter().sum();
            total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32
        };

        // Throughput, not inverse frame cost: frames counted this
        // period over the elapsed period
        let elapsed = now.saturating_duration_since(self.period_start).as_secs_f32();
        let fps = if elapsed > f32::EPSILON {
            self.frames_since_sample as f32 / elapsed
        } else {
            0.0
        };

        let texture_bytes = subsystems.cache.texture_bytes;
        let memory = MemoryBreakdown {
            geometries: counters.geometries,
            textures: counters.textures,
            texture_bytes,
            estimated_mb: texture_bytes as f32 / (1024.0 * 1024.0)
                + counters.geometries as f32 * GEOMETRY_MB_ESTIMATE,
        };

        let sample = PerformanceSample {
            timestamp: now,
            fps,
            frame_time_ms,
            memory,
            counters,
            subsystems,
        };
        log::debug!(
            "sample: {fps:.1} fps, {frame_time_ms:.2} ms, {} draw calls",
            counters.draw_calls
        );

        self.alerts.evaluate(&sample, now);
        self.history.push(sample);
        self.last_sample = Some(now);
        self.period_start = now;
        self.frames_since_sample = 0;
        sample
    }

    /// The most recent sample
    pub fn current_metrics(&self) -> Option<&PerformanceSample> {
        self.history.latest()
    }

    /// The most recent `max_entries` samples, oldest first
    pub fn get_history(&self, max_entries: usize) -> Vec<PerformanceSample> {
        self.history.recent(max_entries).copied().collect()
    }

    /// Retained alerts no older than `max_age_ms`
    pub fn get_alerts(&self, max_age_ms: u64) -> Vec<Alert> {
        self.alerts
            .alerts(Duration::from_millis(max_age_ms), Instant::now())
    }

    /// Averages over the most recent `window` samples, with the
    /// effectiveness score from the latest one
    pub fn performance_summary(&self, window: usize) -> Option<PerformanceSummary> {
        let latest = self.history.latest()?;

        let mut samples = 0;
        let mut fps_sum = 0.0;
        let mut frame_time_sum = 0.0;
        let mut peak_memory_mb: f32 = 0.0;
        for sample in self.history.recent(window) {
            samples += 1;
            fps_sum += sample.fps;
            frame_time_sum += sample.frame_time_ms;
            peak_memory_mb = peak_memory_mb.max(sample.memory.estimated_mb);
        }

        let subsystems = &latest.subsystems;
        let effectiveness = (subsystems.culling.culling_ratio()
            + subsystems.lod.reduction_ratio()
            + subsystems.cache.material_hit_rate()
            + subsystems.cache.texture_hit_rate())
            / 4.0;

        let (warnings, criticals) = self.alerts.counts();
        Some(PerformanceSummary {
            samples,
            average_fps: fps_sum / samples as f32,
            average_frame_time_ms: frame_time_sum / samples as f32,
            peak_memory_mb,
            effectiveness,
            warnings,
            criticals,
        })
    }
}
