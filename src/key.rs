//! By-value argument keys for multiton caches.

use std::any::{Any, TypeId};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type-erased cache key compared by value.
///
/// Multiton caches partition results by the value of their arguments, not
/// by identity: two invocations with the integer `3` must hit the same
/// cache slot regardless of call site. `ArgKey` erases the argument type
/// while keeping value equality and hashing intact, so keys of different
/// concrete types never collide.
///
/// Implemented automatically for every `Eq + Hash + Send + Sync + 'static`
/// type; arguments gain the key capability through [`Value::key`].
///
/// [`Value::key`]: crate::Value::key
pub trait ArgKey: Send + Sync {
    /// Value equality against another erased key.
    fn eq_key(&self, other: &dyn ArgKey) -> bool;
    /// Feeds the key (including its type identity) into `state`.
    fn hash_key(&self, state: &mut dyn Hasher);
    /// The key as `Any`, for same-type comparison.
    fn as_any(&self) -> &dyn Any;
}

impl<T> ArgKey for T
where
    T: Eq + Hash + Send + Sync + 'static,
{
    fn eq_key(&self, other: &dyn ArgKey) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn hash_key(&self, mut state: &mut dyn Hasher) {
        // Distinct types hash apart even when their bytes agree.
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Composite key over an invocation's argument tuple.
#[derive(Clone)]
pub(crate) struct ServiceKey(Vec<Arc<dyn ArgKey>>);

impl ServiceKey {
    pub(crate) fn new(parts: Vec<Arc<dyn ArgKey>>) -> Self {
        Self(parts)
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.eq_key(b.as_ref()))
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for part in &self.0 {
            part.hash_key(state);
        }
    }
}

impl std::fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServiceKey({} parts)", self.0.len())
    }
}
