//! Configuration system
//!
//! Every tunable of the performance core lives here so editor settings
//! panels can persist them. Files are loaded by extension: `.toml` or
//! `.ron`.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Pool manager tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum values retained on a pool's free stack; releases beyond
    /// this are dropped instead of retained
    pub max_retained: usize,
    /// Quantization step for keyed geometry pools, in world units
    pub dimension_step: f32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_retained: 100,
            dimension_step: 0.25,
        }
    }
}

/// LOD manager tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    /// Default distance thresholds for objects added without an
    /// explicit chain (strictly increasing)
    pub default_thresholds: Vec<f32>,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            default_thresholds: vec![10.0, 30.0],
        }
    }
}

/// Culling manager tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CullingConfig {
    /// Objects whose bounding-box center is further than this from the
    /// camera are culled
    pub max_distance: f32,
    /// Objects whose projected bounding-sphere diameter is below this
    /// many pixels are culled
    pub min_screen_size: f32,
    /// Whether the occlusion test runs (conservative stub)
    pub occlusion_enabled: bool,
    /// Cell edge length for the hierarchical spatial grid
    pub cell_size: f32,
    /// Depth at which the hierarchical frustum footprint is evaluated
    pub footprint_depth: f32,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            max_distance: 200.0,
            min_screen_size: 1.0,
            occlusion_enabled: false,
            cell_size: 10.0,
            footprint_depth: 100.0,
        }
    }
}

/// Alert thresholds evaluated by the performance monitor
///
/// FPS is lower-is-worse; the rest are higher-is-worse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// FPS below this raises a warning
    pub fps_warning: f32,
    /// FPS below this raises a critical alert
    pub fps_critical: f32,
    /// Average frame time above this (ms) raises a warning
    pub frame_time_warning_ms: f32,
    /// Average frame time above this (ms) raises a critical alert
    pub frame_time_critical_ms: f32,
    /// Estimated memory above this (MB) raises a warning
    pub memory_warning_mb: f32,
    /// Estimated memory above this (MB) raises a critical alert
    pub memory_critical_mb: f32,
    /// Draw calls above this raise a warning
    pub draw_calls_warning: u32,
    /// Draw calls above this raise a critical alert
    pub draw_calls_critical: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            fps_warning: 30.0,
            fps_critical: 15.0,
            frame_time_warning_ms: 33.3,
            frame_time_critical_ms: 66.6,
            memory_warning_mb: 512.0,
            memory_critical_mb: 1024.0,
            draw_calls_warning: 1000,
            draw_calls_critical: 3000,
        }
    }
}

/// Performance monitor tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Snapshot interval in milliseconds (clamped to at least 100)
    pub sample_interval_ms: u64,
    /// Number of samples kept in history (oldest evicted)
    pub history_len: usize,
    /// Number of instantaneous frame durations kept for the rolling
    /// average frame time
    pub frame_ring_len: usize,
    /// Per-(metric, level) alert dedup window in milliseconds
    pub cooldown_ms: u64,
    /// Alerts older than this (milliseconds) are purged
    pub retention_ms: u64,
    /// Warning/critical bounds
    pub thresholds: AlertThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            history_len: 60,
            frame_ring_len: 120,
            cooldown_ms: 5000,
            retention_ms: 60_000,
            thresholds: AlertThresholds::default(),
        }
    }
}

/// Root configuration for the whole performance core
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerfConfig {
    /// Pool manager settings
    pub pooling: PoolConfig,
    /// LOD manager settings
    pub lod: LodConfig,
    /// Culling manager settings
    pub culling: CullingConfig,
    /// Performance monitor settings
    pub monitor: MonitorConfig,
}

impl Config for PerfConfig {}
