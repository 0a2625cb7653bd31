//! Shared name-keyed cache with a compute-once guarantee per key.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::schema::CachePolicy;

/// Per-key slot. Holding its lock while computing keeps a second caller
/// for the same key waiting for the first result instead of decoding again.
type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

struct CacheState<V> {
    slots: HashMap<String, Slot<V>>,
    /// Keys from least to most recently used.
    lru: VecDeque<String>,
}

/// Cache of decoded assets keyed by (already normalised) name.
///
/// Values are handed out as `Arc`s, so an evicted entry stays valid for
/// whoever still holds it; the next lookup simply decodes it again.
pub struct Cache<V> {
    policy: CachePolicy,
    state: Mutex<CacheState<V>>,
}

impl<V> Cache<V> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(CacheState {
                slots: HashMap::new(),
                lru: VecDeque::new(),
            }),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CacheState<V>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached value, without computing anything.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let slot = {
            let mut state = self.lock_state();
            let slot = state.slots.get(key)?.clone();
            self.touch(&mut state.lru, key);
            slot
        };
        slot.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Cached value, or the result of `init` stored for later lookups.
    ///
    /// `init` runs at most once at a time per key; concurrent callers for
    /// the same key wait and share its result. Errors are not cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let slot = {
            let mut state = self.lock_state();
            let slot = state.slots.entry(key.to_string()).or_default().clone();
            self.touch(&mut state.lru, key);
            slot
        };

        let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(value) = guard.as_ref() {
            log::trace!("Cache hit for {}", key);
            return Ok(value.clone());
        }

        match init() {
            Ok(value) => {
                let value = Arc::new(value);
                *guard = Some(value.clone());
                drop(guard);
                self.evict();
                Ok(value)
            }
            Err(e) => {
                drop(guard);
                self.forget_empty(key, &slot);
                Err(e)
            }
        }
    }

    /// Store a value directly, replacing any previous entry.
    pub fn insert(&self, key: &str, value: Arc<V>) {
        {
            let mut state = self.lock_state();
            state
                .slots
                .insert(key.to_string(), Arc::new(Mutex::new(Some(value))));
            self.touch(&mut state.lru, key);
        }
        self.evict();
    }

    /// Drop one entry.
    pub fn remove(&self, key: &str) -> bool {
        let mut state = self.lock_state();
        state.lru.retain(|k| k != key);
        state.slots.remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.slots.clear();
        state.lru.clear();
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.lock_state().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop least recently used entries beyond the capacity.
    ///
    /// Only filled slots are dropped. A slot still being computed, or just
    /// created and not yet locked by its caller, stays; the cache may run
    /// over capacity until those finish and evict in turn.
    fn evict(&self) {
        let Some(capacity) = self.policy.capacity() else {
            return;
        };
        let mut state = self.lock_state();
        let mut position = 0;
        while state.slots.len() > capacity && position < state.lru.len() {
            let filled = state
                .slots
                .get(&state.lru[position])
                .map(|slot| slot.try_lock().is_ok_and(|value| value.is_some()));
            if filled == Some(false) {
                position += 1;
                continue;
            }
            if let Some(old) = state.lru.remove(position) {
                log::trace!("Evicting {}", old);
                state.slots.remove(&old);
            }
        }
    }

    /// Mark `key` as most recently used. Unbounded caches keep no order.
    fn touch(&self, lru: &mut VecDeque<String>, key: &str) {
        if self.policy.capacity().is_none() {
            return;
        }
        if let Some(pos) = lru.iter().position(|k| k == key) {
            lru.remove(pos);
        }
        lru.push_back(key.to_string());
    }

    /// Remove a slot left empty by a failed computation, unless another
    /// caller has replaced or filled it meanwhile.
    fn forget_empty(&self, key: &str, slot: &Slot<V>) {
        let mut state = self.lock_state();
        let same = state.slots.get(key).is_some_and(|s| Arc::ptr_eq(s, slot));
        if same && slot.try_lock().is_ok_and(|v| v.is_none()) {
            state.slots.remove(key);
            state.lru.retain(|k| k != key);
        }
    }
}
