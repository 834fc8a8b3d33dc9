//! Visibility culling
//!
//! Decides, per object, whether rendering can skip it: frustum test,
//! distance test, screen-space size test, and an optional occlusion
//! test, in that order with short-circuiting. Decisions are advisory
//! output for the renderer; the scene model's own visibility flags
//! remain authoritative.

mod culler;
mod grid;

pub use culler::{CullReason, CullResult, CullStats, CullingManager};
pub use grid::{GridStats, SpatialGrid};
