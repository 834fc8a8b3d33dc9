//! Material and texture deduplication
//!
//! Interning caches keyed by canonical property fingerprints so objects
//! with the same look share one material handle, and repeated texture
//! sources share one upload. Shared handles are immutable by contract:
//! a caller needing a variant requests a new fingerprint instead of
//! mutating a shared instance.

mod optimizer;

pub use optimizer::{
    CacheStats, MaterialDesc, MaterialFingerprint, MaterialOptimizer, SharedMaterial,
    SharedTexture,
};
