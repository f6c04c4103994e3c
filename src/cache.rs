//! Per-instance service caches.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::ThreadId;

use crate::key::ServiceKey;
use crate::value::Value;

/// Instance-side storage for one service, shaped by its caching policy.
///
/// Owned exclusively by the container instance and dropped with it. A
/// definition replaced under a different policy gets a fresh shape on its
/// next resolution; cached values under the old shape are discarded.
pub(crate) enum InstanceCache {
    /// Singleton slot
    Slot(Option<Value>),
    /// Multiton result per argument key
    Keyed(HashMap<ServiceKey, Value>),
    /// One result per resolving thread
    PerThread(HashMap<ThreadId, Value>),
    /// Deferred proxy plus the resolved value once forced
    Deferred {
        proxy: Option<Value>,
        resolved: Option<Value>,
    },
}

impl InstanceCache {
    pub(crate) fn slot() -> Self {
        InstanceCache::Slot(None)
    }

    pub(crate) fn keyed() -> Self {
        InstanceCache::Keyed(HashMap::new())
    }

    pub(crate) fn per_thread() -> Self {
        InstanceCache::PerThread(HashMap::new())
    }

    pub(crate) fn deferred() -> Self {
        InstanceCache::Deferred {
            proxy: None,
            resolved: None,
        }
    }
}

/// Returns the cache entry for `name`, re-shaping it if the service was
/// redeclared under a different policy since the entry was created.
pub(crate) fn entry_for<'a>(
    caches: &'a mut HashMap<Arc<str>, InstanceCache>,
    name: &Arc<str>,
    make: fn() -> InstanceCache,
    fits: fn(&InstanceCache) -> bool,
) -> &'a mut InstanceCache {
    let entry = caches.entry(name.clone()).or_insert_with(make);
    if !fits(entry) {
        *entry = make();
    }
    entry
}
