//! Typed object pools for transient render resources
//!
//! The render loop churns through geometry buffers, material slots,
//! whole render entities, and math scratch values every frame. The
//! pools here reuse those values by identity instead of reallocating:
//! acquisition never blocks and never fails (the factory runs when the
//! free stack is empty), and releasing resets a value's transient
//! state before retaining it, up to a bounded retention count.
//!
//! Capacity bounds retention only, never creation, so the render loop
//! is never starved; the performance monitor is responsible for
//! surfacing unbounded growth as memory alerts.

mod keyed;
mod manager;
mod pool;
mod resources;

pub use keyed::{GeometryKey, KeyedPoolGroup, KeyedPoolStats};
pub use manager::{GeometryHandle, PoolManager, PoolManagerStats, PoolReport};
pub use pool::{Pool, PoolStats, PooledKey, ReleaseError};
pub use resources::{Geometry, MaterialSlot, RenderEntity, Scratch};
