//! Performance monitoring
//!
//! Periodic sampling of frame pacing, renderer counters, and subsystem
//! statistics into a bounded history, with threshold alerts. Sampling
//! is driven from the frame loop itself: the monitor checks elapsed
//! time on each tick instead of owning a timer, so an idle editor
//! produces no samples.

mod alert;
mod sample;
mod sampler;

pub use alert::{Alert, AlertEngine, AlertLevel, AlertMetric};
pub use sample::{MemoryBreakdown, PerformanceSample, SampleHistory, SubsystemStats};
pub use sampler::{MonitorState, PerformanceMonitor, PerformanceSummary};
