//! Fingerprint-interned material and texture caches

use std::collections::HashMap;
use std::sync::Arc;

/// Material properties as authored in the editor
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    /// Base color (linear RGB, 0..=1)
    pub color: [f32; 3],
    /// Surface roughness factor (0..=1)
    pub roughness: f32,
    /// Metalness factor (0..=1)
    pub metalness: f32,
    /// Color map source identifier, if textured
    pub map: Option<String>,
    /// Normal map source identifier, if any
    pub normal_map: Option<String>,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            roughness: 0.5,
            metalness: 0.0,
            map: None,
            normal_map: None,
        }
    }
}

/// Canonical cache key derived from normalized material properties
///
/// Color channels are quantized to 1/255 steps and scalar factors to
/// three decimals, stored as integers so the key is `Eq + Hash`
/// without float comparison pitfalls. Two descriptions that render
/// identically fingerprint identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialFingerprint {
    color: [u8; 3],
    roughness: u16,
    metalness: u16,
    map: Option<String>,
    normal_map: Option<String>,
}

impl MaterialFingerprint {
    /// Compute the canonical fingerprint of a description
    pub fn of(desc: &MaterialDesc) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let factor = |v: f32| (v.clamp(0.0, 1.0) * 1000.0).round() as u16;
        Self {
            color: [
                channel(desc.color[0]),
                channel(desc.color[1]),
                channel(desc.color[2]),
            ],
            roughness: factor(desc.roughness),
            metalness: factor(desc.metalness),
            map: desc.map.clone(),
            normal_map: desc.normal_map.clone(),
        }
    }
}

/// Shared material handle
///
/// Immutable once shared: no mutable access is handed out.
#[derive(Debug, PartialEq)]
pub struct SharedMaterial {
    desc: MaterialDesc,
}

impl SharedMaterial {
    /// The properties this material was constructed with
    pub fn desc(&self) -> &MaterialDesc {
        &self.desc
    }
}

/// Shared texture handle, keyed by source identity
#[derive(Debug, PartialEq, Eq)]
pub struct SharedTexture {
    source: String,
    size_bytes: u64,
}

impl SharedTexture {
    /// Source identifier this texture was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Estimated GPU size in bytes (RGBA8)
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

struct MaterialCacheEntry {
    handle: Arc<SharedMaterial>,
    hits: u64,
}

struct TextureCacheEntry {
    handle: Arc<SharedTexture>,
    hits: u64,
}

/// Hit/miss counters and occupancy for both caches
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    /// Distinct materials stored
    pub material_total: usize,
    /// Materials currently shared by at least one caller
    pub material_active: usize,
    /// Material lookups that found an existing handle
    pub material_hits: u64,
    /// Material lookups that constructed a new handle
    pub material_misses: u64,
    /// Distinct textures stored
    pub texture_total: usize,
    /// Textures currently shared by at least one caller
    pub texture_active: usize,
    /// Texture lookups that found an existing handle
    pub texture_hits: u64,
    /// Texture lookups that constructed a new handle
    pub texture_misses: u64,
    /// Cumulative estimated texture bytes stored
    pub texture_bytes: u64,
}

impl CacheStats {
    /// Material hit rate: hits / (hits + misses)
    pub fn material_hit_rate(&self) -> f32 {
        hit_rate(self.material_hits, self.material_misses)
    }

    /// Texture hit rate: hits / (hits + misses)
    pub fn texture_hit_rate(&self) -> f32 {
        hit_rate(self.texture_hits, self.texture_misses)
    }
}

fn hit_rate(hits: u64, misses: u64) -> f32 {
    let lookups = hits + misses;
    if lookups == 0 {
        0.0
    } else {
        hits as f32 / lookups as f32
    }
}

/// Interning cache for materials and textures
pub struct MaterialOptimizer {
    materials: HashMap<MaterialFingerprint, MaterialCacheEntry>,
    textures: HashMap<String, TextureCacheEntry>,
    material_hits: u64,
    material_misses: u64,
    texture_hits: u64,
    texture_misses: u64,
    texture_bytes: u64,
}

impl Default for MaterialOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialOptimizer {
    /// Create an empty optimizer
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
            textures: HashMap::new(),
            material_hits: 0,
            material_misses: 0,
            texture_hits: 0,
            texture_misses: 0,
            texture_bytes: 0,
        }
    }

    /// Get the shared material for a property set, constructing it on
    /// the first request
    pub fn get_material(&mut self, desc: &MaterialDesc) -> Arc<SharedMaterial> {
        let fingerprint = MaterialFingerprint::of(desc);
        if let Some(entry) = self.materials.get_mut(&fingerprint) {
            entry.hits += 1;
            self.material_hits += 1;
            return Arc::clone(&entry.handle);
        }

        self.material_misses += 1;
        let handle = Arc::new(SharedMaterial { desc: desc.clone() });
        log::debug!("interning new material ({} cached)", self.materials.len() + 1);
        self.materials.insert(
            fingerprint,
            MaterialCacheEntry {
                handle: Arc::clone(&handle),
                hits: 0,
            },
        );
        handle
    }

    /// Get the shared texture for a source, constructing it on the
    /// first request with an RGBA8 size estimate
    pub fn get_texture(&mut self, source: &str, width: u32, height: u32) -> Arc<SharedTexture> {
        if let Some(entry) = self.textures.get_mut(source) {
            entry.hits += 1;
            self.texture_hits += 1;
            return Arc::clone(&entry.handle);
        }

        self.texture_misses += 1;
        let size_bytes = u64::from(width) * u64::from(height) * 4;
        self.texture_bytes += size_bytes;
        let handle = Arc::new(SharedTexture {
            source: source.to_string(),
            size_bytes,
        });
        self.textures.insert(
            source.to_string(),
            TextureCacheEntry {
                handle: Arc::clone(&handle),
                hits: 0,
            },
        );
        handle
    }

    /// How often a specific material fingerprint has been re-requested
    pub fn material_hits_for(&self, fingerprint: &MaterialFingerprint) -> Option<u64> {
        self.materials.get(fingerprint).map(|entry| entry.hits)
    }

    /// Occupancy and hit/miss counters for both caches
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            material_total: self.materials.len(),
            material_active: self
                .materials
                .values()
                .filter(|entry| Arc::strong_count(&entry.handle) > 1)
                .count(),
            material_hits: self.material_hits,
            material_misses: self.material_misses,
            texture_total: self.textures.len(),
            texture_active: self
                .textures
                .values()
                .filter(|entry| Arc::strong_count(&entry.handle) > 1)
                .count(),
            texture_hits: self.texture_hits,
            texture_misses: self.texture_misses,
            texture_bytes: self.texture_bytes,
        }
    }

    /// Drop all cached entries and counters
    pub fn clear(&mut self) {
        self.materials.clear();
        self.textures.clear();
        self.material_hits = 0;
        self.material_misses = 0;
        self.texture_hits = 0;
        self.texture_misses = 0;
        self.texture_bytes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_descriptions_share_a_handle() {
        let mut optimizer = MaterialOptimizer::new();
        let desc = MaterialDesc {
            color: [0.8, 0.2, 0.2],
            roughness: 0.4,
            metalness: 0.1,
            map: Some("wood.png".to_string()),
            normal_map: None,
        };

        let first = optimizer.get_material(&desc);
        let second = optimizer.get_material(&desc);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = optimizer.cache_stats();
        assert_eq!(stats.material_misses, 1);
        assert_eq!(stats.material_hits, 1);
        assert_eq!(stats.material_total, 1);
    }

    #[test]
    fn test_fingerprint_normalizes_float_noise() {
        // Differences below quantization resolution share a fingerprint
        let a = MaterialDesc {
            color: [0.5, 0.5, 0.5],
            roughness: 0.5000001,
            ..MaterialDesc::default()
        };
        let b = MaterialDesc {
            color: [0.5000002, 0.5, 0.5],
            roughness: 0.5,
            ..MaterialDesc::default()
        };
        assert_eq!(MaterialFingerprint::of(&a), MaterialFingerprint::of(&b));
    }

    #[test]
    fn test_distinct_maps_do_not_share() {
        let mut optimizer = MaterialOptimizer::new();
        let plain = MaterialDesc::default();
        let textured = MaterialDesc {
            map: Some("bricks.png".to_string()),
            ..MaterialDesc::default()
        };

        let a = optimizer.get_material(&plain);
        let b = optimizer.get_material(&textured);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(optimizer.cache_stats().material_total, 2);
    }

    #[test]
    fn test_texture_dedup_and_size_estimate() {
        let mut optimizer = MaterialOptimizer::new();
        let a = optimizer.get_texture("bricks.png", 256, 256);
        let b = optimizer.get_texture("bricks.png", 256, 256);
        assert!(Arc::ptr_eq(&a, &b));

        let stats = optimizer.cache_stats();
        assert_eq!(stats.texture_total, 1);
        assert_eq!(stats.texture_hits, 1);
        assert_eq!(stats.texture_bytes, 256 * 256 * 4);
    }

    #[test]
    fn test_hit_rate() {
        let mut optimizer = MaterialOptimizer::new();
        let desc = MaterialDesc::default();
        optimizer.get_material(&desc);
        optimizer.get_material(&desc);
        optimizer.get_material(&desc);
        let stats = optimizer.cache_stats();
        assert!((stats.material_hit_rate() - 2.0 / 3.0).abs() < 1e-6);
        // No texture lookups yet: rate reports zero, not NaN
        assert_eq!(stats.texture_hit_rate(), 0.0);
    }

    #[test]
    fn test_active_counts_track_outstanding_handles() {
        let mut optimizer = MaterialOptimizer::new();
        let held = optimizer.get_material(&MaterialDesc::default());
        {
            let dropped = optimizer.get_material(&MaterialDesc {
                color: [0.0, 0.0, 0.0],
                ..MaterialDesc::default()
            });
            assert_eq!(optimizer.cache_stats().material_active, 2);
            drop(dropped);
        }
        let stats = optimizer.cache_stats();
        assert_eq!(stats.material_total, 2);
        assert_eq!(stats.material_active, 1);
        drop(held);
    }

    #[test]
    fn test_per_entry_hit_counter() {
        let mut optimizer = MaterialOptimizer::new();
        let desc = MaterialDesc::default();
        let fingerprint = MaterialFingerprint::of(&desc);
        optimizer.get_material(&desc);
        assert_eq!(optimizer.material_hits_for(&fingerprint), Some(0));
        optimizer.get_material(&desc);
        optimizer.get_material(&desc);
        assert_eq!(optimizer.material_hits_for(&fingerprint), Some(2));
    }

    #[test]
    fn test_clear() {
        let mut optimizer = MaterialOptimizer::new();
        optimizer.get_material(&MaterialDesc::default());
        optimizer.get_texture("a.png", 16, 16);
        optimizer.clear();
        let stats = optimizer.cache_stats();
        assert_eq!(stats.material_total, 0);
        assert_eq!(stats.texture_bytes, 0);
    }
}
