//! Pooled resource value types
//!
//! These are the opaque transient resources the editor's render path
//! churns through. The core never interprets them beyond pooling,
//! swapping, or hiding; their reset hooks scrub the state a previous
//! user may have left behind.

use crate::foundation::math::{Mat4, Vec3};

/// Pooled geometry buffer with quantized allocation dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Allocation width in world units (quantized)
    pub width: f32,
    /// Allocation height in world units (quantized)
    pub height: f32,
    /// Allocation depth in world units (quantized)
    pub depth: f32,
}

impl Geometry {
    /// Create a geometry with the given quantized dimensions
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

/// Pooled material slot
///
/// Reset restores the neutral appearance so a reused slot never leaks
/// the previous object's look.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSlot {
    /// Base color (linear RGB)
    pub color: [f32; 3],
    /// Surface roughness factor
    pub roughness: f32,
    /// Metalness factor
    pub metalness: f32,
    /// Alpha transparency
    pub opacity: f32,
}

impl Default for MaterialSlot {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            roughness: 0.5,
            metalness: 0.0,
            opacity: 1.0,
        }
    }
}

impl MaterialSlot {
    /// Restore the neutral appearance
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Pooled full render object: transform plus attachment state
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEntity {
    /// World transform
    pub transform: Mat4,
    /// Whether the entity is currently attached to the render scene
    pub attached: bool,
    /// Advisory visibility flag set by culling consumers
    pub visible: bool,
}

impl Default for RenderEntity {
    fn default() -> Self {
        Self {
            transform: Mat4::identity(),
            attached: false,
            visible: true,
        }
    }
}

impl RenderEntity {
    /// Scrub transient state back to defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Math scratch value pooled for short-lived intermediate results
pub type Scratch = Vec3;
