//! Level-of-detail management
//!
//! Tracks editor objects with discrete detail representations swapped
//! by camera distance. Each tracked object owns an ordered chain of
//! distance thresholds and representations; exactly one representation
//! is attached to the render scene at any time, and a swap detaches
//! the old one and attaches the new one within the same tick.
//!
//! There is no hysteresis band: an object oscillating across a
//! threshold re-swaps every tick. That matches the editor's observed
//! behavior and is covered by a test rather than smoothed over.

use slotmap::SlotMap;

use crate::config::LodConfig;
use crate::foundation::math::Vec3;
use crate::pooling::{GeometryHandle, PoolManager};
use crate::scene::Camera;

slotmap::new_key_type! {
    /// Handle to an object tracked by the [`LodManager`]
    pub struct LodKey;
}

/// Errors raised when registering or removing tracked objects
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LodError {
    /// Distance thresholds must be strictly increasing
    #[error("distance thresholds must be strictly increasing")]
    NonIncreasingThresholds,
    /// A chain needs exactly one more representation than thresholds
    #[error("expected {expected} representations for {thresholds} thresholds, got {got}")]
    LevelCountMismatch {
        /// Representations required by the threshold count
        expected: usize,
        /// Thresholds supplied
        thresholds: usize,
        /// Representations supplied
        got: usize,
    },
    /// The handle does not refer to a tracked object
    #[error("object is not tracked (already removed or never added)")]
    UnknownObject,
}

/// One detail representation of a tracked object
///
/// The core treats the representation as an opaque render resource; it
/// may carry pooled geometry, which is released back to the pool
/// manager when the object is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    /// Display label ("high", "medium", ...)
    pub label: String,
    /// Pooled geometry backing this representation, if any
    pub geometry: Option<GeometryHandle>,
}

impl Representation {
    /// Representation without pooled backing
    pub fn named(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            geometry: None,
        }
    }

    /// Representation backed by pooled geometry
    pub fn pooled(label: impl Into<String>, geometry: GeometryHandle) -> Self {
        Self {
            label: label.into(),
            geometry: Some(geometry),
        }
    }
}

/// Ordered detail chain: `thresholds[i]` is the far edge of
/// `representations[i]`; the final representation covers everything
/// beyond the last threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct LodChain {
    /// Strictly increasing distance thresholds
    pub thresholds: Vec<f32>,
    /// Representations, from highest to lowest detail; one more than
    /// thresholds
    pub representations: Vec<Representation>,
}

impl LodChain {
    /// Build a chain, validating threshold ordering and level count
    pub fn new(
        thresholds: Vec<f32>,
        representations: Vec<Representation>,
    ) -> Result<Self, LodError> {
        if thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(LodError::NonIncreasingThresholds);
        }
        if representations.len() != thresholds.len() + 1 {
            return Err(LodError::LevelCountMismatch {
                expected: thresholds.len() + 1,
                thresholds: thresholds.len(),
                got: representations.len(),
            });
        }
        Ok(Self {
            thresholds,
            representations,
        })
    }

    /// Number of detail levels
    pub fn level_count(&self) -> usize {
        self.representations.len()
    }

    /// Select the highest-detail level whose threshold covers the
    /// distance, scanning thresholds in increasing order
    fn select_level(&self, distance: f32) -> usize {
        self.thresholds
            .iter()
            .position(|&threshold| distance <= threshold)
            .unwrap_or(self.thresholds.len())
    }
}

/// A tracked object: anchor point, detail chain, and which level is
/// currently attached
#[derive(Debug)]
struct LodEntry {
    anchor: Vec3,
    chain: LodChain,
    active_level: usize,
}

/// Counters exposed to the performance monitor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LodStats {
    /// Objects currently tracked
    pub tracked: usize,
    /// Representation swaps performed since creation
    pub swaps: u64,
    /// Objects currently at a reduced-detail level (level > 0)
    pub at_reduced_detail: usize,
}

impl LodStats {
    /// Fraction of tracked objects rendered at reduced detail
    pub fn reduction_ratio(&self) -> f32 {
        if self.tracked == 0 {
            0.0
        } else {
            self.at_reduced_detail as f32 / self.tracked as f32
        }
    }
}

/// Per-object discrete detail representations swapped by camera distance
pub struct LodManager {
    camera_position: Option<Vec3>,
    default_thresholds: Vec<f32>,
    entries: SlotMap<LodKey, LodEntry>,
    stats: LodStats,
}

impl Default for LodManager {
    fn default() -> Self {
        Self::new(&LodConfig::default())
    }
}

impl LodManager {
    /// Create an empty manager with no camera bound
    pub fn new(config: &LodConfig) -> Self {
        Self {
            camera_position: None,
            default_thresholds: config.default_thresholds.clone(),
            entries: SlotMap::with_key(),
            stats: LodStats::default(),
        }
    }

    /// Rebind the distance reference
    ///
    /// Selection uses only the most recent bound camera as of the next
    /// [`update`](Self::update).
    pub fn set_camera(&mut self, camera: &Camera) {
        self.camera_position = Some(camera.position);
    }

    /// Track an object, attaching its highest-detail representation
    pub fn add_object(&mut self, anchor: Vec3, chain: LodChain) -> LodKey {
        let key = self.entries.insert(LodEntry {
            anchor,
            chain,
            active_level: 0,
        });
        self.stats.tracked = self.entries.len();
        key
    }

    /// Track an object with a chain built from the configured default
    /// thresholds, one named representation per level
    ///
    /// Objects added by the editor without an explicit chain get the
    /// config's distance bands. Fails if the configured thresholds are
    /// not strictly increasing.
    pub fn add_object_with_defaults(&mut self, anchor: Vec3) -> Result<LodKey, LodError> {
        let thresholds = self.default_thresholds.clone();
        let representations = (0..=thresholds.len())
            .map(|level| Representation::named(format!("level-{level}")))
            .collect();
        let chain = LodChain::new(thresholds, representations)?;
        Ok(self.add_object(anchor, chain))
    }

    /// Run one selection pass over every tracked object
    ///
    /// For each object, computes the distance from the bound camera to
    /// the anchor and selects the matching level; on change, the old
    /// representation is detached and the new one attached within this
    /// tick. With no camera bound this is a no-op (rendering
    /// continuity over failure).
    ///
    /// Selection is a pure function of the current camera and anchor
    /// positions; with no hysteresis or time-based smoothing there is
    /// nothing for a frame delta to feed, so this takes no time input.
    ///
    /// Returns the number of swaps performed.
    pub fn update(&mut self) -> usize {
        let Some(camera) = self.camera_position else {
            return 0;
        };

        let mut swaps = 0;
        let mut at_reduced = 0;
        for entry in self.entries.values_mut() {
            let distance = (entry.anchor - camera).magnitude();
            let level = entry.chain.select_level(distance);
            if level != entry.active_level {
                // Detach old, attach new: a single assignment keeps the
                // exactly-one-attached invariant within the tick.
                log::trace!(
                    "lod swap {} -> {} at distance {distance:.1}",
                    entry.chain.representations[entry.active_level].label,
                    entry.chain.representations[level].label,
                );
                entry.active_level = level;
                swaps += 1;
            }
            if entry.active_level > 0 {
                at_reduced += 1;
            }
        }

        self.stats.swaps += swaps;
        self.stats.at_reduced_detail = at_reduced;
        self.stats.tracked = self.entries.len();
        swaps as usize
    }

    /// Move a tracked object's anchor point
    pub fn set_anchor(&mut self, key: LodKey, anchor: Vec3) -> Result<(), LodError> {
        let entry = self.entries.get_mut(key).ok_or(LodError::UnknownObject)?;
        entry.anchor = anchor;
        Ok(())
    }

    /// The representation currently attached for a tracked object
    pub fn active_representation(&self, key: LodKey) -> Option<&Representation> {
        let entry = self.entries.get(key)?;
        Some(&entry.chain.representations[entry.active_level])
    }

    /// The currently attached level index (0 = highest detail)
    pub fn active_level(&self, key: LodKey) -> Option<usize> {
        self.entries.get(key).map(|entry| entry.active_level)
    }

    /// Stop tracking an object, detaching its representation and
    /// releasing any pooled geometry the chain holds
    pub fn remove_object(&mut self, key: LodKey, pools: &mut PoolManager) -> Result<(), LodError> {
        let entry = self.entries.remove(key).ok_or(LodError::UnknownObject)?;
        for representation in &entry.chain.representations {
            if let Some(geometry) = representation.geometry {
                // Fail-soft: a representation sharing already-released
                // geometry must not abort removal of the rest.
                let _ = pools.release_geometry(geometry);
            }
        }
        self.stats.tracked = self.entries.len();
        Ok(())
    }

    /// Number of tracked objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no objects are tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counters for the performance monitor
    pub fn stats(&self) -> LodStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    fn three_level_chain() -> LodChain {
        LodChain::new(
            vec![10.0, 30.0],
            vec![
                Representation::named("high"),
                Representation::named("medium"),
                Representation::named("low"),
            ],
        )
        .unwrap()
    }

    fn camera_at(position: Vec3) -> Camera {
        let mut camera = Camera::perspective(position, 60.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.look_at(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        camera
    }

    #[test]
    fn test_chain_rejects_non_increasing_thresholds() {
        let reps = vec![
            Representation::named("a"),
            Representation::named("b"),
            Representation::named("c"),
        ];
        assert_eq!(
            LodChain::new(vec![30.0, 10.0], reps.clone()).unwrap_err(),
            LodError::NonIncreasingThresholds
        );
        assert_eq!(
            LodChain::new(vec![10.0, 10.0], reps).unwrap_err(),
            LodError::NonIncreasingThresholds
        );
    }

    #[test]
    fn test_chain_rejects_level_count_mismatch() {
        let err = LodChain::new(vec![10.0, 30.0], vec![Representation::named("only")])
            .unwrap_err();
        assert_eq!(
            err,
            LodError::LevelCountMismatch {
                expected: 3,
                thresholds: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_selection_by_distance() {
        // Thresholds [10, 30] -> levels [high, medium, low]:
        // distance 5 -> high, 15 -> medium, 50 -> low
        let mut lod = LodManager::default();
        let key = lod.add_object(Vec3::zeros(), three_level_chain());

        lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 5.0)));
        lod.update();
        assert_eq!(lod.active_representation(key).unwrap().label, "high");

        lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 15.0)));
        lod.update();
        assert_eq!(lod.active_representation(key).unwrap().label, "medium");

        lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 50.0)));
        lod.update();
        assert_eq!(lod.active_representation(key).unwrap().label, "low");
    }

    #[test]
    fn test_default_thresholds_build_the_chain() {
        // Objects added without an explicit chain get the configured
        // distance bands, one representation per level
        let config = LodConfig {
            default_thresholds: vec![10.0, 30.0],
        };
        let mut lod = LodManager::new(&config);
        let key = lod.add_object_with_defaults(Vec3::zeros()).unwrap();

        assert_eq!(lod.active_representation(key).unwrap().label, "level-0");

        lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 15.0)));
        lod.update();
        assert_eq!(lod.active_level(key), Some(1));

        lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 50.0)));
        lod.update();
        assert_eq!(lod.active_representation(key).unwrap().label, "level-2");
    }

    #[test]
    fn test_default_thresholds_are_validated() {
        let config = LodConfig {
            default_thresholds: vec![30.0, 10.0],
        };
        let mut lod = LodManager::new(&config);
        assert_eq!(
            lod.add_object_with_defaults(Vec3::zeros()).unwrap_err(),
            LodError::NonIncreasingThresholds
        );
        assert!(lod.is_empty());
    }

    #[test]
    fn test_detail_monotonically_non_increasing_with_distance() {
        let mut lod = LodManager::default();
        let key = lod.add_object(Vec3::zeros(), three_level_chain());

        let mut last_level = 0;
        for distance in [1.0_f32, 8.0, 10.0, 12.0, 29.0, 31.0, 100.0] {
            lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, distance)));
            lod.update();
            let level = lod.active_level(key).unwrap();
            assert!(level >= last_level, "detail increased as distance grew");
            last_level = level;
        }
    }

    #[test]
    fn test_no_camera_is_noop() {
        let mut lod = LodManager::default();
        let key = lod.add_object(Vec3::zeros(), three_level_chain());
        assert_eq!(lod.update(), 0);
        assert_eq!(lod.active_level(key), Some(0));
    }

    #[test]
    fn test_oscillation_swaps_every_tick() {
        // Documented behavior: no hysteresis band, so crossing the
        // threshold back and forth swaps on every update.
        let mut lod = LodManager::default();
        lod.add_object(Vec3::zeros(), three_level_chain());

        for _ in 0..3 {
            lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 9.9)));
            assert_eq!(lod.update(), if lod.stats().swaps == 0 { 0 } else { 1 });
            lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 10.1)));
            assert_eq!(lod.update(), 1);
        }
        assert!(lod.stats().swaps >= 5);
    }

    #[test]
    fn test_remove_releases_pooled_geometry() {
        let mut pools = PoolManager::new(&PoolConfig::default());
        let mut lod = LodManager::default();

        let high = pools.acquire_geometry(1.0, 1.0, 1.0);
        let low = pools.acquire_geometry(0.5, 0.5, 0.5);
        let chain = LodChain::new(
            vec![20.0],
            vec![
                Representation::pooled("high", high),
                Representation::pooled("low", low),
            ],
        )
        .unwrap();

        let key = lod.add_object(Vec3::zeros(), chain);
        assert_eq!(pools.stats().geometry.active, 2);

        lod.remove_object(key, &mut pools).unwrap();
        assert_eq!(pools.stats().geometry.active, 0);
        assert_eq!(lod.remove_object(key, &mut pools), Err(LodError::UnknownObject));
    }

    #[test]
    fn test_reduction_ratio() {
        let mut lod = LodManager::default();
        lod.add_object(Vec3::zeros(), three_level_chain());
        lod.add_object(Vec3::new(0.0, 0.0, -40.0), three_level_chain());

        lod.set_camera(&camera_at(Vec3::new(0.0, 0.0, 5.0)));
        lod.update();
        // First object is near (high detail); second is 45 away (low)
        let stats = lod.stats();
        assert_eq!(stats.tracked, 2);
        assert_eq!(stats.at_reduced_detail, 1);
        assert!((stats.reduction_ratio() - 0.5).abs() < f32::EPSILON);
    }
}
