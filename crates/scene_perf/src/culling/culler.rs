//! Per-object culling tests and scene traversal

use crate::config::CullingConfig;
use crate::foundation::math::Frustum;
use crate::scene::{Camera, ObjectId, SceneNode};

/// Why an object was excluded from rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullReason {
    /// Bounding box entirely outside the view frustum
    Frustum,
    /// Bounding-box center beyond the configured maximum distance
    Distance,
    /// Projected bounding-sphere diameter below the minimum pixel size
    ScreenSize,
    /// Hidden behind other geometry (optional test)
    Occlusion,
}

/// Advisory visibility decision for one object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullResult {
    /// The object this decision is for
    pub id: ObjectId,
    /// Whether the renderer should draw the object
    pub visible: bool,
    /// Why the object was culled, when it was
    pub reason: Option<CullReason>,
    /// Distance from the camera to the bounding-box center
    pub distance: f32,
}

impl CullResult {
    pub(crate) fn visible(id: ObjectId, distance: f32) -> Self {
        Self {
            id,
            visible: true,
            reason: None,
            distance,
        }
    }

    pub(crate) fn culled(id: ObjectId, reason: CullReason, distance: f32) -> Self {
        Self {
            id,
            visible: false,
            reason: Some(reason),
            distance,
        }
    }
}

/// Per-call culling statistics, reset at the start of each scene pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Objects tested
    pub total: usize,
    /// Objects left visible
    pub visible: usize,
    /// Culled by the frustum test
    pub culled_frustum: usize,
    /// Culled by the distance test
    pub culled_distance: usize,
    /// Culled by the screen-size test
    pub culled_screen_size: usize,
    /// Culled by the occlusion test
    pub culled_occlusion: usize,
}

impl CullStats {
    /// Total objects culled by any test
    pub fn culled(&self) -> usize {
        self.culled_frustum + self.culled_distance + self.culled_screen_size + self.culled_occlusion
    }

    /// Fraction of tested objects excluded from rendering
    pub fn culling_ratio(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.culled() as f32 / self.total as f32
        }
    }
}

/// Per-object visibility decisions via frustum, distance, and
/// screen-size tests
pub struct CullingManager {
    config: CullingConfig,
    camera: Option<Camera>,
    viewport_height: u32,
    stats: CullStats,
    results: Vec<CullResult>,
}

impl CullingManager {
    /// Create a manager from culling configuration
    pub fn new(config: CullingConfig) -> Self {
        Self {
            config,
            camera: None,
            viewport_height: 1080,
            stats: CullStats::default(),
            results: Vec::new(),
        }
    }

    /// Bind the camera used for subsequent tests
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    /// The currently bound camera, if any
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Set the output height in physical pixels for the screen-size test
    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height;
    }

    /// Current configuration
    pub fn config(&self) -> &CullingConfig {
        &self.config
    }

    /// Enable or disable the occlusion test
    pub fn set_occlusion_enabled(&mut self, enabled: bool) {
        self.config.occlusion_enabled = enabled;
    }

    /// Run the ordered, short-circuiting tests for a single object
    ///
    /// The frustum is recomputed from the camera's projection and view
    /// matrices on every call rather than cached, so camera motion
    /// mid-traversal cannot test against a stale volume. With no camera
    /// bound the object is reported visible (rendering continuity over
    /// strict failure).
    pub fn cull_object(&mut self, node: &SceneNode) -> CullResult {
        let result = self.classify(node);
        self.record(result);
        result
    }

    /// Cull every object in a scene tree, depth-first
    ///
    /// Every child is visited regardless of its parent's outcome:
    /// visibility is per-object, not inherited. Statistics accumulate
    /// per call and are reset at the start.
    pub fn cull_scene(&mut self, root: &SceneNode) -> &[CullResult] {
        self.stats = CullStats::default();
        self.results.clear();
        self.visit(root);
        &self.results
    }

    /// Decisions from the most recent scene pass
    pub fn results(&self) -> &[CullResult] {
        &self.results
    }

    /// Statistics accumulated since the last scene pass began
    pub fn stats(&self) -> CullStats {
        self.stats
    }

    pub(crate) fn reset_pass(&mut self) {
        self.stats = CullStats::default();
        self.results.clear();
    }

    pub(crate) fn record(&mut self, result: CullResult) {
        self.stats.total += 1;
        match result.reason {
            None => self.stats.visible += 1,
            Some(CullReason::Frustum) => self.stats.culled_frustum += 1,
            Some(CullReason::Distance) => self.stats.culled_distance += 1,
            Some(CullReason::ScreenSize) => self.stats.culled_screen_size += 1,
            Some(CullReason::Occlusion) => self.stats.culled_occlusion += 1,
        }
        self.results.push(result);
    }

    fn visit(&mut self, node: &SceneNode) {
        let result = self.classify(node);
        self.record(result);
        for child in &node.children {
            self.visit(child);
        }
    }

    pub(crate) fn classify(&self, node: &SceneNode) -> CullResult {
        let Some(camera) = &self.camera else {
            // No camera bound yet: permissive default
            return CullResult::visible(node.id, 0.0);
        };

        let bounds = node.world_bounds();

        // (1) Frustum, recomputed from projection x view each call
        let frustum = Frustum::from_matrix(&camera.view_projection());
        if !frustum.intersects_aabb(&bounds) {
            let distance = (bounds.center() - camera.position).magnitude();
            return CullResult::culled(node.id, CullReason::Frustum, distance);
        }

        // (2) Distance from bounding-box center
        let distance = (bounds.center() - camera.position).magnitude();
        if distance > self.config.max_distance {
            return CullResult::culled(node.id, CullReason::Distance, distance);
        }

        // (3) Projected bounding-sphere diameter in pixels
        let pixels = self.projected_diameter_px(&bounds, camera, distance);
        if pixels < self.config.min_screen_size {
            return CullResult::culled(node.id, CullReason::ScreenSize, distance);
        }

        // (4) Optional occlusion test
        if self.config.occlusion_enabled && Self::occluded(node) {
            return CullResult::culled(node.id, CullReason::Occlusion, distance);
        }

        CullResult::visible(node.id, distance)
    }

    /// Approximate the projected bounding-sphere diameter in pixels
    /// from field of view and viewport height
    fn projected_diameter_px(
        &self,
        bounds: &crate::foundation::math::Aabb,
        camera: &Camera,
        distance: f32,
    ) -> f32 {
        if distance <= f32::EPSILON {
            // Camera is inside the bounds; treat as covering the screen
            return f32::MAX;
        }
        let sphere = bounds.bounding_sphere();
        let half_fov_tan = (camera.fov * 0.5).tan();
        (2.0 * sphere.radius / distance) * (self.viewport_height as f32 / (2.0 * half_fov_tan))
    }

    /// Conservative occlusion stub: never reports an object occluded
    fn occluded(_node: &SceneNode) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Aabb, Mat4, Vec3};

    fn forward_camera() -> Camera {
        // At origin, looking down -Z
        let mut camera = Camera::perspective(Vec3::zeros(), 60.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.look_at(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0));
        camera
    }

    fn box_at(id: ObjectId, position: Vec3, half_extent: f32) -> SceneNode {
        SceneNode::new(
            id,
            format!("box-{id}"),
            Mat4::new_translation(&position),
            Aabb::from_center_extents(Vec3::zeros(), Vec3::repeat(half_extent)),
        )
    }

    fn culler() -> CullingManager {
        let mut manager = CullingManager::new(CullingConfig::default());
        manager.set_camera(forward_camera());
        manager.set_viewport_height(1080);
        manager
    }

    #[test]
    fn test_no_camera_is_permissive() {
        let mut manager = CullingManager::new(CullingConfig::default());
        let result = manager.cull_object(&box_at(1, Vec3::new(0.0, 0.0, 999.0), 1.0));
        assert!(result.visible);
        assert_eq!(result.reason, None);
    }

    #[test]
    fn test_outside_frustum_is_culled() {
        let mut manager = culler();
        // Behind the camera
        let result = manager.cull_object(&box_at(1, Vec3::new(0.0, 0.0, 50.0), 1.0));
        assert!(!result.visible);
        assert_eq!(result.reason, Some(CullReason::Frustum));
    }

    #[test]
    fn test_in_view_within_distance_and_size_is_visible() {
        let mut manager = culler();
        let result = manager.cull_object(&box_at(1, Vec3::new(0.0, 0.0, -20.0), 1.0));
        assert!(result.visible);
        assert_eq!(result.reason, None);
    }

    #[test]
    fn test_distance_cull_reports_distance() {
        let mut config = CullingConfig::default();
        config.max_distance = 200.0;
        let mut manager = CullingManager::new(config);
        let mut camera = forward_camera();
        camera.far = 10_000.0;
        manager.set_camera(camera);

        // Center at distance 250, still inside the (deep) frustum
        let result = manager.cull_object(&box_at(1, Vec3::new(0.0, 0.0, -250.0), 5.0));
        assert!(!result.visible);
        assert_eq!(result.reason, Some(CullReason::Distance));
        assert!((result.distance - 250.0).abs() < 0.5);
    }

    #[test]
    fn test_screen_size_cull() {
        let mut config = CullingConfig::default();
        config.min_screen_size = 4.0;
        let mut manager = CullingManager::new(config);
        manager.set_camera(forward_camera());
        manager.set_viewport_height(1080);

        // Tiny box far away projects below 4 px
        let result = manager.cull_object(&box_at(1, Vec3::new(0.0, 0.0, -190.0), 0.05));
        assert!(!result.visible);
        assert_eq!(result.reason, Some(CullReason::ScreenSize));

        // Same box up close is comfortably visible
        let result = manager.cull_object(&box_at(2, Vec3::new(0.0, 0.0, -2.0), 0.05));
        assert!(result.visible);
    }

    #[test]
    fn test_occlusion_stub_is_conservative() {
        let mut manager = culler();
        manager.set_occlusion_enabled(true);
        let result = manager.cull_object(&box_at(1, Vec3::new(0.0, 0.0, -20.0), 1.0));
        assert!(result.visible);
    }

    #[test]
    fn test_scene_pass_visits_children_of_culled_parents() {
        let mut manager = culler();

        // Parent behind the camera, child in front: per-object
        // visibility, not inherited
        let mut parent = box_at(1, Vec3::new(0.0, 0.0, 50.0), 1.0);
        parent.add_child(box_at(2, Vec3::new(0.0, 0.0, -20.0), 1.0));

        let results = manager.cull_scene(&parent);
        assert_eq!(results.len(), 2);
        assert!(!results[0].visible);
        assert!(results[1].visible);

        let stats = manager.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.visible, 1);
        assert_eq!(stats.culled_frustum, 1);
    }

    #[test]
    fn test_stats_reset_per_pass() {
        let mut manager = culler();
        let root = box_at(1, Vec3::new(0.0, 0.0, -20.0), 1.0);
        manager.cull_scene(&root);
        manager.cull_scene(&root);
        assert_eq!(manager.stats().total, 1);
    }

    #[test]
    fn test_culling_ratio() {
        let mut manager = culler();
        let mut root = box_at(1, Vec3::new(0.0, 0.0, -20.0), 1.0);
        root.add_child(box_at(2, Vec3::new(0.0, 0.0, 50.0), 1.0));
        root.add_child(box_at(3, Vec3::new(0.0, 0.0, 60.0), 1.0));
        root.add_child(box_at(4, Vec3::new(0.0, 0.0, 70.0), 1.0));
        manager.cull_scene(&root);
        assert!((manager.stats().culling_ratio() - 0.75).abs() < f32::EPSILON);
    }
}
