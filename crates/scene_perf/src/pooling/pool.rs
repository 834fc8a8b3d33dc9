//! Generic bounded-retention object pool

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Non-owning handle to a value currently held active by a [`Pool`].
    ///
    /// Validity ends at release; stale handles fail key lookups instead
    /// of aliasing a reused value.
    pub struct PooledKey;
}

/// Error returned when releasing a value the pool does not hold active
///
/// This guards against double-release corruption: the operation is a
/// logged no-op, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReleaseError {
    /// The handle was never acquired from this pool, or was already
    /// released
    #[error("value is not active in this pool (stale or double release)")]
    NotActive,
}

/// Lifetime counters for one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values constructed by the factory
    pub created: u64,
    /// Acquisitions served from the free stack
    pub reused: u64,
    /// Successful releases
    pub released: u64,
    /// Releases dropped because the free stack was at `max_retained`
    pub dropped: u64,
}

impl PoolStats {
    /// Fraction of acquisitions served without constructing a value
    pub fn reuse_ratio(&self) -> f32 {
        let acquisitions = self.created + self.reused;
        if acquisitions == 0 {
            0.0
        } else {
            self.reused as f32 / acquisitions as f32
        }
    }
}

/// Pool of values of one resource type
///
/// Holds a free stack and an active arena. Every active value
/// originated from this pool's factory; callers hold [`PooledKey`]
/// handles while the pool owns storage.
pub struct Pool<T> {
    label: &'static str,
    factory: Box<dyn Fn() -> T>,
    reset: Box<dyn Fn(&mut T)>,
    free: Vec<T>,
    active: SlotMap<PooledKey, T>,
    max_retained: usize,
    stats: PoolStats,
}

impl<T> Pool<T> {
    /// Create a pool with a value factory and a reset hook that scrubs
    /// transient state on release
    pub fn new(
        label: &'static str,
        max_retained: usize,
        factory: impl Fn() -> T + 'static,
        reset: impl Fn(&mut T) + 'static,
    ) -> Self {
        Self {
            label,
            factory: Box::new(factory),
            reset: Box::new(reset),
            free: Vec::new(),
            active: SlotMap::with_key(),
            max_retained,
            stats: PoolStats::default(),
        }
    }

    /// Acquire a value: pop from the free stack if non-empty, else
    /// construct via the factory. Never blocks, never fails.
    pub fn acquire(&mut self) -> PooledKey {
        let value = match self.free.pop() {
            Some(value) => {
                self.stats.reused += 1;
                value
            }
            None => {
                self.stats.created += 1;
                (self.factory)()
            }
        };
        self.active.insert(value)
    }

    /// Access an active value
    pub fn get(&self, key: PooledKey) -> Option<&T> {
        self.active.get(key)
    }

    /// Mutably access an active value
    pub fn get_mut(&mut self, key: PooledKey) -> Option<&mut T> {
        self.active.get_mut(key)
    }

    /// Release a value back to the pool
    ///
    /// Runs the reset hook, then retains the value on the free stack
    /// only if below `max_retained`, otherwise drops it. Releasing a
    /// stale or foreign handle is a logged no-op returning
    /// [`ReleaseError::NotActive`].
    pub fn release(&mut self, key: PooledKey) -> Result<(), ReleaseError> {
        let Some(mut value) = self.active.remove(key) else {
            log::warn!(
                "pool '{}': release of a value that is not active (stale or double release)",
                self.label
            );
            return Err(ReleaseError::NotActive);
        };

        (self.reset)(&mut value);
        self.stats.released += 1;
        if self.free.len() < self.max_retained {
            self.free.push(value);
        } else {
            self.stats.dropped += 1;
        }
        Ok(())
    }

    /// Acquire a value, run the callback, and release on every exit
    /// path, including panics
    ///
    /// Intended for short-lived math scratch values.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let value = match self.free.pop() {
            Some(value) => {
                self.stats.reused += 1;
                value
            }
            None => {
                self.stats.created += 1;
                (self.factory)()
            }
        };

        let mut guard = ScopedValue {
            pool: self,
            value: Some(value),
        };
        // value is Some from construction until drop
        let slot = guard.value.get_or_insert_with(|| (guard.pool.factory)());
        f(slot)
    }

    /// Discard the free stack and active membership
    pub fn clear(&mut self) {
        self.free.clear();
        self.active.clear();
    }

    /// Number of values currently held active
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of values currently retained on the free stack
    pub fn retained_count(&self) -> usize {
        self.free.len()
    }

    /// Retention bound
    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    /// Lifetime counters
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

/// Drop guard returning a scoped value to its pool
struct ScopedValue<'a, T> {
    pool: &'a mut Pool<T>,
    value: Option<T>,
}

impl<T> Drop for ScopedValue<'_, T> {
    fn drop(&mut self) {
        if let Some(mut value) = self.value.take() {
            (self.pool.reset)(&mut value);
            self.pool.stats.released += 1;
            if self.pool.free.len() < self.pool.max_retained {
                self.pool.free.push(value);
            } else {
                self.pool.stats.dropped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_pool(max_retained: usize) -> Pool<Vec<u32>> {
        Pool::new("test", max_retained, Vec::new, Vec::clear)
    }

    #[test]
    fn test_acquire_constructs_then_reuses() {
        let mut pool = counter_pool(4);

        let a = pool.acquire();
        assert_eq!(pool.stats().created, 1);
        pool.release(a).unwrap();

        let b = pool.acquire();
        assert_eq!(pool.stats().created, 1);
        assert_eq!(pool.stats().reused, 1);
        pool.release(b).unwrap();
    }

    #[test]
    fn test_release_resets_transient_state() {
        let mut pool = counter_pool(4);

        let key = pool.acquire();
        pool.get_mut(key).unwrap().extend([1, 2, 3]);
        pool.release(key).unwrap();

        // The reacquired value is the retained one, scrubbed
        let key = pool.acquire();
        assert!(pool.get(key).unwrap().is_empty());
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn test_retention_never_exceeds_bound() {
        let mut pool = counter_pool(2);

        // Acquire 3 (creates 3), release all 3: only 2 retained
        let keys: Vec<_> = (0..3).map(|_| pool.acquire()).collect();
        assert_eq!(pool.stats().created, 3);
        for key in keys {
            pool.release(key).unwrap();
        }
        assert_eq!(pool.retained_count(), 2);
        assert_eq!(pool.stats().dropped, 1);

        // Next acquire reuses a retained value before constructing
        pool.acquire();
        assert_eq!(pool.stats().created, 3);
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn test_double_release_is_typed_noop() {
        let mut pool = counter_pool(4);

        let key = pool.acquire();
        assert_eq!(pool.release(key), Ok(()));
        assert_eq!(pool.release(key), Err(ReleaseError::NotActive));
        // Value was not double-retained
        assert_eq!(pool.retained_count(), 1);
    }

    #[test]
    fn test_stale_handle_after_clear() {
        let mut pool = counter_pool(4);
        let key = pool.acquire();
        pool.clear();
        assert!(pool.get(key).is_none());
        assert_eq!(pool.release(key), Err(ReleaseError::NotActive));
    }

    #[test]
    fn test_scoped_releases_on_success() {
        let mut pool = counter_pool(4);
        let len = pool.scoped(|v| {
            v.push(7);
            v.len()
        });
        assert_eq!(len, 1);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.retained_count(), 1);

        // The retained scratch value comes back scrubbed
        pool.scoped(|v| assert!(v.is_empty()));
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn test_scoped_releases_on_panic() {
        let mut pool = counter_pool(4);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pool.scoped(|v: &mut Vec<u32>| {
                v.push(1);
                panic!("scratch user failed");
            })
        }));
        assert!(result.is_err());
        assert_eq!(pool.retained_count(), 1);
        pool.scoped(|v| assert!(v.is_empty()));
    }

    #[test]
    fn test_reuse_ratio() {
        let mut pool = counter_pool(4);
        let a = pool.acquire();
        pool.release(a).unwrap();
        pool.acquire();
        assert!((pool.stats().reuse_ratio() - 0.5).abs() < f32::EPSILON);
    }
}
