//! The dynamic value currency passed between containers and services.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::inject::ServiceObject;
use crate::key::ArgKey;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// A type-erased service value or invocation argument.
///
/// Every value a container produces or consumes travels as a `Value`: a
/// shared, type-erased allocation plus up to two capability facets fixed
/// at construction time.
///
/// - [`Value::new`] wraps a plain value. Plain values have no dynamic
///   method surface and categorically refuse container injection (the
///   container skips them with a warning and returns them unmodified).
/// - [`Value::key`] additionally records a by-value hash key so the value
///   can partition a multiton cache.
/// - [`Value::object`] wraps a [`ServiceObject`], giving the value a
///   dynamic method surface ([`Value::call`]) and making it injectable.
///
/// Cloning a `Value` shares the underlying allocation; cache hits are
/// clones of the stored value, so identity comparisons with
/// [`Value::ptr_eq`] observe caching behavior directly.
///
/// # Examples
///
/// ```rust
/// use lattice_di::Value;
///
/// let plain = Value::new("Hello, world".to_string());
/// assert_eq!(plain.downcast_ref::<String>().unwrap(), "Hello, world");
///
/// let copy = plain.clone();
/// assert!(Value::ptr_eq(&plain, &copy));
/// ```
#[derive(Clone)]
pub struct Value {
    inner: AnyArc,
    type_name: &'static str,
    object: Option<Arc<dyn ServiceObject>>,
    key: Option<Arc<dyn ArgKey>>,
}

impl Value {
    /// Wraps a plain value with no dynamic surface.
    pub fn new<T>(value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
            object: None,
            key: None,
        }
    }

    /// Wraps a hashable value usable as a multiton cache key.
    ///
    /// Key equality is by value: `Value::key(3)` from two different call
    /// sites selects the same cache slot. Keys of different concrete types
    /// never collide.
    pub fn key<T>(value: T) -> Self
    where
        T: Eq + std::hash::Hash + Send + Sync + 'static,
    {
        let arc = Arc::new(value);
        let key: Arc<dyn ArgKey> = arc.clone();
        Self {
            inner: arc,
            type_name: std::any::type_name::<T>(),
            object: None,
            key: Some(key),
        }
    }

    /// Wraps a service object that can receive dynamic calls and be
    /// injected by a container.
    pub fn object<T>(value: T) -> Self
    where
        T: ServiceObject,
    {
        let arc = Arc::new(value);
        let object: Arc<dyn ServiceObject> = arc.clone();
        Self {
            inner: arc,
            type_name: std::any::type_name::<T>(),
            object: Some(object),
            key: None,
        }
    }

    /// Borrows the underlying value as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Shares the underlying value as `Arc<T>`.
    pub fn downcast_arc<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Whether the underlying value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Type name of the underlying value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether two values share the same underlying allocation.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Invokes `method` dynamically on this value.
    ///
    /// Resolution order matches the delegation fallback contract: the
    /// object's own [`dispatch`](ServiceObject::dispatch) is consulted
    /// first; an unhandled method falls through to the container linked by
    /// injection; if neither answers, the original "method not understood"
    /// condition surfaces as [`DiError::MethodNotUnderstood`].
    pub fn call(&self, method: &str, args: &[Value]) -> DiResult<Value> {
        if let Some(object) = &self.object {
            if let Some(result) = object.dispatch(method, args) {
                return result;
            }
            if let Some(result) = object.injection_link().delegate(method, args) {
                return result;
            }
        }
        Err(DiError::MethodNotUnderstood {
            receiver: self.type_name,
            method: method.to_string(),
        })
    }

    /// The service-object facet, if this value carries one.
    pub(crate) fn object_facet(&self) -> Option<&Arc<dyn ServiceObject>> {
        self.object.as_ref()
    }

    /// The cache-key facet, if this value carries one.
    pub(crate) fn key_facet(&self) -> Option<&Arc<dyn ArgKey>> {
        self.key.as_ref()
    }
}

// Keeps injected values printable without dumping the whole container graph.
impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name)
            .field("object", &self.object.is_some())
            .field("key", &self.key.is_some())
            .finish()
    }
}
