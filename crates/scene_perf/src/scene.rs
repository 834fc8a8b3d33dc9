//! Consumed external interfaces
//!
//! The performance core does not own the editor's scene model or its
//! renderer. This module defines the minimal shapes it consumes: a tree
//! of renderable objects with world transforms and bounds, a perspective
//! camera, and a renderer exposing draw counters and an output size.

use crate::foundation::math::{utils, Aabb, Mat4, Point3, Vec3};

/// Stable identity of a renderable scene object
pub type ObjectId = u64;

/// A renderable object as seen by this core: identity, world transform,
/// local bounds, and children for depth-first traversal.
///
/// Visibility decisions produced here are advisory; the scene model
/// remains authoritative.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Stable object identity
    pub id: ObjectId,
    /// Human-readable name for logs and displays
    pub name: String,
    /// World transform
    pub transform: Mat4,
    /// Bounding box in local space
    pub bounds: Aabb,
    /// Child objects
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a node with the given identity, transform, and local bounds
    pub fn new(id: ObjectId, name: impl Into<String>, transform: Mat4, bounds: Aabb) -> Self {
        Self {
            id,
            name: name.into(),
            transform,
            bounds,
            children: Vec::new(),
        }
    }

    /// Create a unit-box node at a world position
    pub fn unit_box(id: ObjectId, name: impl Into<String>, position: Vec3) -> Self {
        Self::new(
            id,
            name,
            Mat4::new_translation(&position),
            Aabb::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5)),
        )
    }

    /// World-space position (translation part of the transform)
    pub fn world_position(&self) -> Vec3 {
        Vec3::new(self.transform.m14, self.transform.m24, self.transform.m34)
    }

    /// Bounds transformed into world space
    pub fn world_bounds(&self) -> Aabb {
        self.bounds.transformed(&self.transform)
    }

    /// Attach a child object
    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Number of objects in this subtree, including this node
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SceneNode::subtree_len).sum::<usize>()
    }
}

/// Perspective camera consumed for LOD and culling decisions
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera is looking at in world space
    pub target: Vec3,
    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,
    /// Field of view angle in radians
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Distance to near clipping plane
    pub near: f32,
    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera with standard Y-up orientation
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Field of view in degrees (converted to radians internally)
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Point the camera at a target with the given up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
    }

    /// Compute the view matrix (world to view space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        )
    }

    /// Compute the perspective projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Combined projection * view matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Renderer counters sampled by the performance monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderCounters {
    /// Draw calls issued for the last displayed frame
    pub draw_calls: u32,
    /// Triangles submitted for the last displayed frame
    pub triangles: u64,
    /// Textures resident on the renderer
    pub textures: u32,
    /// Geometries resident on the renderer
    pub geometries: u32,
}

/// Renderer surface consumed by this core
///
/// The real editor renderer implements this; tests and the probe binary
/// use [`StubRenderer`].
pub trait RenderDevice {
    /// Current frame counters
    fn counters(&self) -> RenderCounters;

    /// Set the output size and pixel ratio
    fn set_output_size(&mut self, width: u32, height: u32, pixel_ratio: f32);

    /// Output height in physical pixels (used for screen-size culling)
    fn output_height(&self) -> u32;
}

/// In-memory renderer stand-in with settable counters
#[derive(Debug, Clone, Default)]
pub struct StubRenderer {
    counters: RenderCounters,
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl StubRenderer {
    /// Create a stub with a given output size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            counters: RenderCounters::default(),
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    /// Replace the counters reported by this stub
    pub fn set_counters(&mut self, counters: RenderCounters) {
        self.counters = counters;
    }

    /// Output width in physical pixels
    pub fn output_width(&self) -> u32 {
        (self.width as f32 * self.pixel_ratio) as u32
    }
}

impl RenderDevice for StubRenderer {
    fn counters(&self) -> RenderCounters {
        self.counters
    }

    fn set_output_size(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        self.width = width;
        self.height = height;
        self.pixel_ratio = pixel_ratio;
    }

    fn output_height(&self) -> u32 {
        (self.height as f32 * self.pixel_ratio) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_world_bounds_follow_transform() {
        let node = SceneNode::unit_box(1, "box", Vec3::new(5.0, 0.0, -3.0));
        let bounds = node.world_bounds();
        assert_relative_eq!(bounds.center(), Vec3::new(5.0, 0.0, -3.0));
        assert_relative_eq!(bounds.extents(), Vec3::repeat(0.5));
    }

    #[test]
    fn test_subtree_len_counts_children() {
        let mut root = SceneNode::unit_box(1, "root", Vec3::zeros());
        let mut child = SceneNode::unit_box(2, "child", Vec3::new(1.0, 0.0, 0.0));
        child.add_child(SceneNode::unit_box(3, "leaf", Vec3::new(2.0, 0.0, 0.0)));
        root.add_child(child);
        assert_eq!(root.subtree_len(), 3);
    }

    #[test]
    fn test_camera_view_projection_is_finite() {
        let mut camera = Camera::perspective(Vec3::new(0.0, 2.0, 10.0), 60.0, 16.0 / 9.0, 0.1, 100.0);
        camera.look_at(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        let vp = camera.view_projection();
        assert!(vp.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_stub_renderer_output_size() {
        let mut renderer = StubRenderer::new(800, 600);
        assert_eq!(renderer.output_height(), 600);
        renderer.set_output_size(1920, 1080, 2.0);
        assert_eq!(renderer.output_height(), 2160);
        assert_eq!(renderer.output_width(), 3840);
    }
}
