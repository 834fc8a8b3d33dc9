//! Threshold alerts with deduplication and retention

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::AlertThresholds;

use super::sample::PerformanceSample;

/// Alert severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertLevel {
    /// Degraded but usable
    Warning,
    /// Severely degraded
    Critical,
}

/// Which metric crossed its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertMetric {
    /// Frames per second (lower is worse)
    Fps,
    /// Average frame time (higher is worse)
    FrameTime,
    /// Estimated memory footprint (higher is worse)
    MemoryUsage,
    /// Draw calls per frame (higher is worse)
    DrawCalls,
}

/// One raised alert
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Metric that crossed its threshold
    pub metric: AlertMetric,
    /// Severity at the time of evaluation
    pub level: AlertLevel,
    /// Human-readable description for logs and panels
    pub message: String,
    /// Observed metric value
    pub value: f32,
    /// Threshold that was crossed
    pub threshold: f32,
    /// When the alert was raised
    pub raised_at: Instant,
}

/// Evaluates samples against thresholds, deduplicating repeats
///
/// Per metric only the most severe crossed level is raised, and a
/// (metric, level) pair inside its cooldown window is skipped so a
/// sustained problem does not flood the alert list. Alerts older than
/// the retention window are purged on every evaluation.
pub struct AlertEngine {
    thresholds: AlertThresholds,
    cooldown: Duration,
    retention: Duration,
    alerts: Vec<Alert>,
    last_raised: HashMap<(AlertMetric, AlertLevel), Instant>,
}

impl AlertEngine {
    /// Create an engine with the given bounds and windows
    pub fn new(thresholds: AlertThresholds, cooldown: Duration, retention: Duration) -> Self {
        Self {
            thresholds,
            cooldown,
            retention,
            alerts: Vec::new(),
            last_raised: HashMap::new(),
        }
    }

    /// Evaluate one sample at the given time, returning how many new
    /// alerts were raised
    pub fn evaluate(&mut self, sample: &PerformanceSample, now: Instant) -> usize {
        self.purge(now);

        let t = &self.thresholds;
        let mut candidates: Vec<(AlertMetric, AlertLevel, String, f32, f32)> = Vec::new();

        // FPS is lower-is-worse; the rest are higher-is-worse. Only the
        // most severe crossed level per metric becomes a candidate.
        if sample.fps <= t.fps_critical {
            candidates.push((
                AlertMetric::Fps,
                AlertLevel::Critical,
                format!("FPS critically low: {:.1}", sample.fps),
                sample.fps,
                t.fps_critical,
            ));
        } else if sample.fps <= t.fps_warning {
            candidates.push((
                AlertMetric::Fps,
                AlertLevel::Warning,
                format!("FPS low: {:.1}", sample.fps),
                sample.fps,
                t.fps_warning,
            ));
        }

        if sample.frame_time_ms >= t.frame_time_critical_ms {
            candidates.push((
                AlertMetric::FrameTime,
                AlertLevel::Critical,
                format!("frame time critically high: {:.1} ms", sample.frame_time_ms),
                sample.frame_time_ms,
                t.frame_time_critical_ms,
            ));
        } else if sample.frame_time_ms >= t.frame_time_warning_ms {
            candidates.push((
                AlertMetric::FrameTime,
                AlertLevel::Warning,
                format!("frame time high: {:.1} ms", sample.frame_time_ms),
                sample.frame_time_ms,
                t.frame_time_warning_ms,
            ));
        }

        let memory_mb = sample.memory.estimated_mb;
        if memory_mb >= t.memory_critical_mb {
            candidates.push((
                AlertMetric::MemoryUsage,
                AlertLevel::Critical,
                format!("estimated memory critically high: {memory_mb:.0} MB"),
                memory_mb,
                t.memory_critical_mb,
            ));
        } else if memory_mb >= t.memory_warning_mb {
            candidates.push((
                AlertMetric::MemoryUsage,
                AlertLevel::Warning,
                format!("estimated memory high: {memory_mb:.0} MB"),
                memory_mb,
                t.memory_warning_mb,
            ));
        }

        let draw_calls = sample.counters.draw_calls;
        if draw_calls >= t.draw_calls_critical {
            candidates.push((
                AlertMetric::DrawCalls,
                AlertLevel::Critical,
                format!("draw calls critically high: {draw_calls}"),
                draw_calls as f32,
                t.draw_calls_critical as f32,
            ));
        } else if draw_calls >= t.draw_calls_warning {
            candidates.push((
                AlertMetric::DrawCalls,
                AlertLevel::Warning,
                format!("draw calls high: {draw_calls}"),
                draw_calls as f32,
                t.draw_calls_warning as f32,
            ));
        }

        let mut raised = 0;
        for (metric, level, message, value, threshold) in candidates {
            if let Some(&last) = self.last_raised.get(&(metric, level)) {
                if now.duration_since(last) < self.cooldown {
                    continue;
                }
            }
            match level {
                AlertLevel::Warning => log::warn!("{message}"),
                AlertLevel::Critical => log::error!("{message}"),
            }
            self.last_raised.insert((metric, level), now);
            self.alerts.push(Alert {
                metric,
                level,
                message,
                value,
                threshold,
                raised_at: now,
            });
            raised += 1;
        }
        raised
    }

    /// Retained alerts no older than `max_age` as of `now`, oldest first
    pub fn alerts(&self, max_age: Duration, now: Instant) -> Vec<Alert> {
        self.alerts
            .iter()
            .filter(|alert| now.duration_since(alert.raised_at) <= max_age)
            .cloned()
            .collect()
    }

    /// Retained (warning, critical) counts
    pub fn counts(&self) -> (usize, usize) {
        let warnings = self
            .alerts
            .iter()
            .filter(|a| a.level == AlertLevel::Warning)
            .count();
        (warnings, self.alerts.len() - warnings)
    }

    /// Drop all retained alerts and dedup state
    pub fn clear(&mut self) {
        self.alerts.clear();
        self.last_raised.clear();
    }

    fn purge(&mut self, now: Instant) {
        let retention = self.retention;
        self.alerts
            .retain(|alert| now.duration_since(alert.raised_at) <= retention);
    }
}
