//! Caching policy definitions.

/// Per-service memoization policies controlling instance caching behavior
///
/// Determines how the results of a service's implementation closure are
/// memoized per container instance. Every policy is resolved against the
/// instance's own cache; nothing is shared across instances unless the
/// implementation closure itself captures shared state.
///
/// # Policy Characteristics
///
/// - **Singleton**: one value per instance, highest reuse
/// - **Multiton / MultikeyMultiton**: one value per distinct argument key
/// - **Threaded**: one value per (instance, thread) pair
/// - **Deferred**: like Singleton, but nothing runs until the value is used
/// - **Generic**: no caching at all, a pure pass-through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always invoke the implementation; no instance state is consulted
    /// or written. Use when the caller manages caching manually.
    Generic,
    /// Invoke the implementation at most once per instance and return the
    /// identical cached value on every subsequent request.
    Singleton,
    /// Invoke the implementation at most once per distinct single-argument
    /// key. Keys are compared by value, not identity.
    Multiton,
    /// Like [`Multiton`](CachePolicy::Multiton), but keyed by the whole
    /// argument tuple; any arity, including zero, is accepted.
    MultikeyMultiton,
    /// Invoke the implementation at most once per resolving thread.
    Threaded,
    /// Return a lazy proxy immediately; the implementation runs only when
    /// a method is first invoked on the proxied value.
    Deferred,
}

/// Declared argument shape of a dynamically defined service.
///
/// Policy inference follows the declared arity rather than introspecting
/// the closure, so the mapping is explicit and checked at registration:
/// no arguments makes a singleton, one key argument a multiton, and
/// anything else (including variadic) a multikey multiton.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Arity, CachePolicy};
///
/// assert_eq!(Arity::None.policy(), CachePolicy::Singleton);
/// assert_eq!(Arity::One.policy(), CachePolicy::Multiton);
/// assert_eq!(Arity::Many.policy(), CachePolicy::MultikeyMultiton);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// The implementation takes no arguments
    None,
    /// The implementation takes exactly one key argument
    One,
    /// The implementation takes any number of key arguments
    Many,
}

impl Arity {
    /// The caching policy inferred for this argument shape.
    pub fn policy(self) -> CachePolicy {
        match self {
            Arity::None => CachePolicy::Singleton,
            Arity::One => CachePolicy::Multiton,
            Arity::Many => CachePolicy::MultikeyMultiton,
        }
    }
}
