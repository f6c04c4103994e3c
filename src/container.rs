//! Container instances and the service-resolution engine.
//!
//! A [`Container`] pairs a shared [`Registry`] (the container class) with
//! per-instance caches. Resolution dispatches on the declared
//! [`CachePolicy`]: cache hits return the stored value, misses run the
//! implementation closure outside any lock and then publish the result.
//! Under concurrent first access an implementation may therefore run more
//! than once, with the last writer's value winning the slot; this mirrors
//! the engine's documented non-guarantee rather than imposing exactly-once
//! semantics.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, Thread};

use crate::cache::{entry_for, InstanceCache};
use crate::deferred::DeferredProxy;
use crate::definition::ServiceDefinition;
use crate::error::{DiError, DiResult};
use crate::inject::{InjectionLink, Resolvable, ServiceObject};
use crate::internal::sync::Mutex;
use crate::key::{ArgKey, ServiceKey};
use crate::policy::{Arity, CachePolicy};
use crate::registry::Registry;
use crate::value::Value;

/// A container instance: a shared registry plus this instance's service
/// caches.
///
/// Cloning a `Container` shares the instance (both clones see the same
/// caches); to get an independent instance of the same class, call
/// [`Container::new`] again with the same registry.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Container, Registry, Value};
///
/// let mut builder = Registry::builder();
/// builder.singleton("greeting", |_, _| Ok(Value::new("Hello, world".to_string())));
/// builder.multikey_multiton("pair", |_, args| {
///     let x = *args[0].downcast_ref::<i32>().unwrap();
///     let y = *args[1].downcast_ref::<i32>().unwrap();
///     Ok(Value::new(vec![x, y]))
/// });
/// let registry = builder.build();
///
/// let container = Container::new(registry);
/// let greeting = container.invoke("greeting", &[]).unwrap();
/// let again = container.invoke("greeting", &[]).unwrap();
/// assert!(Value::ptr_eq(&greeting, &again)); // Same instance
///
/// let pair = container.invoke("pair", &[Value::key(100), Value::key(200)]).unwrap();
/// assert_eq!(&*pair.downcast_arc::<Vec<i32>>().unwrap(), &vec![100, 200]);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerShared>,
}

pub(crate) struct ContainerShared {
    registry: Arc<Registry>,
    caches: Mutex<HashMap<Arc<str>, InstanceCache>>,
    /// Link used when this container is itself injected into another one.
    link: InjectionLink,
    self_weak: Weak<ContainerShared>,
}

impl Container {
    /// Creates a fresh instance of the container class `registry`
    /// describes, with empty caches.
    pub fn new(registry: Arc<Registry>) -> Self {
        let inner = Arc::new_cyclic(|self_weak| ContainerShared {
            registry,
            caches: Mutex::new(HashMap::new()),
            link: InjectionLink::new(),
            self_weak: self_weak.clone(),
        });
        Self { inner }
    }

    /// The registry this instance was built from.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Resolves `name` under its declared caching policy.
    ///
    /// # Errors
    ///
    /// [`DiError::UnknownService`] when the name is not declared anywhere
    /// in the registry chain; [`DiError::ArityMismatch`] or
    /// [`DiError::UnkeyableArgument`] when `args` do not fit the policy;
    /// any error from the implementation closure, propagated verbatim and
    /// never cached.
    pub fn invoke(&self, name: &str, args: &[Value]) -> DiResult<Value> {
        self.inner.invoke(self, name, args)
    }

    /// Resolves `name` with no arguments and downcasts the result.
    pub fn get<T>(&self, name: &str) -> DiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_with(name, &[])
    }

    /// Resolves `name` with `args` and downcasts the result.
    pub fn get_with<T>(&self, name: &str, args: &[Value]) -> DiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let value = self.invoke(name, args)?;
        let actual = value.type_name();
        value
            .downcast_arc::<T>()
            .ok_or_else(|| DiError::TypeMismatch {
                service: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual,
            })
    }

    /// Resolves `name` locally, then through the container this instance
    /// was injected into.
    ///
    /// This is the instance-level delegation fallback: a container nested
    /// inside another (injected) container answers its own services first
    /// and forwards anything else outward, exactly like any other injected
    /// service object.
    pub fn call(&self, name: &str, args: &[Value]) -> DiResult<Value> {
        if let Some(result) = self.inner.try_invoke(name, args) {
            return result;
        }
        if let Some(result) = self.inner.link.delegate(name, args) {
            return result;
        }
        Err(DiError::UnknownService(name.to_string()))
    }

    /// Declares a new service on the shared registry, visible to every
    /// instance of this container class, current and future.
    ///
    /// The policy is inferred from `arity`
    /// (see [`Arity::policy`]); the registry's injection mode at build
    /// time applies.
    pub fn define<F>(&self, name: &str, arity: Arity, implementation: F)
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.inner.registry.define(name, arity, implementation);
    }

    /// Injects this container into `target` (manual injection).
    ///
    /// After linking, methods missing on `target` resolve against this
    /// container's services. Linking the same container twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`DiError::NonUniqueContainer`] if `target` is already linked to a
    /// different container.
    pub fn inject_into(&self, target: &dyn ServiceObject) -> DiResult<()> {
        target.injection_link().attach(&self.inner.me())
    }

    /// The canonical [`Resolvable`] handle for this instance.
    ///
    /// Injection identity is this allocation: links attached through this
    /// handle and links attached by the engine during instantiation always
    /// agree on whether they refer to the same container.
    pub fn as_resolvable(&self) -> Arc<dyn Resolvable> {
        self.inner.clone()
    }
}

impl ContainerShared {
    fn invoke(&self, host: &Container, name: &str, args: &[Value]) -> DiResult<Value> {
        let definition = self
            .registry
            .resolve(name)
            .ok_or_else(|| DiError::UnknownService(name.to_string()))?;
        match definition.policy {
            CachePolicy::Generic => self.instantiate(host, &definition, args),
            CachePolicy::Singleton => self.resolve_singleton(host, &definition, args),
            CachePolicy::Multiton => self.resolve_keyed(host, &definition, args, true),
            CachePolicy::MultikeyMultiton => self.resolve_keyed(host, &definition, args, false),
            CachePolicy::Threaded => self.resolve_threaded(host, &definition, args),
            CachePolicy::Deferred => self.resolve_deferred(&definition, args),
        }
    }

    fn resolve_singleton(
        &self,
        host: &Container,
        definition: &ServiceDefinition,
        args: &[Value],
    ) -> DiResult<Value> {
        if !args.is_empty() {
            return Err(DiError::ArityMismatch {
                service: definition.name().to_string(),
                expected: "no arguments",
                got: args.len(),
            });
        }
        if let Some(cached) = self.cached_slot(definition.name()) {
            return Ok(cached);
        }
        let value = self.instantiate(host, definition, &[])?;
        let mut caches = self.caches.lock();
        let entry = entry_for(
            &mut caches,
            &definition.name_arc(),
            InstanceCache::slot,
            |cache| matches!(cache, InstanceCache::Slot(_)),
        );
        if let InstanceCache::Slot(slot) = entry {
            *slot = Some(value.clone());
        }
        Ok(value)
    }

    fn cached_slot(&self, name: &str) -> Option<Value> {
        match self.caches.lock().get(name) {
            Some(InstanceCache::Slot(slot)) => slot.clone(),
            _ => None,
        }
    }

    fn resolve_keyed(
        &self,
        host: &Container,
        definition: &ServiceDefinition,
        args: &[Value],
        single_key: bool,
    ) -> DiResult<Value> {
        if single_key && args.len() != 1 {
            return Err(DiError::ArityMismatch {
                service: definition.name().to_string(),
                expected: "exactly one key argument",
                got: args.len(),
            });
        }
        let key = Self::key_of(definition, args)?;
        if let Some(cached) = self.cached_keyed(definition.name(), &key) {
            return Ok(cached);
        }
        let value = self.instantiate(host, definition, args)?;
        let mut caches = self.caches.lock();
        let entry = entry_for(
            &mut caches,
            &definition.name_arc(),
            InstanceCache::keyed,
            |cache| matches!(cache, InstanceCache::Keyed(_)),
        );
        if let InstanceCache::Keyed(map) = entry {
            map.insert(key, value.clone());
        }
        Ok(value)
    }

    fn key_of(definition: &ServiceDefinition, args: &[Value]) -> DiResult<ServiceKey> {
        let mut parts: Vec<Arc<dyn ArgKey>> = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            match arg.key_facet() {
                Some(key) => parts.push(key.clone()),
                None => {
                    return Err(DiError::UnkeyableArgument {
                        service: definition.name().to_string(),
                        index,
                    })
                }
            }
        }
        Ok(ServiceKey::new(parts))
    }

    fn cached_keyed(&self, name: &str, key: &ServiceKey) -> Option<Value> {
        match self.caches.lock().get(name) {
            Some(InstanceCache::Keyed(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    fn resolve_threaded(
        &self,
        host: &Container,
        definition: &ServiceDefinition,
        args: &[Value],
    ) -> DiResult<Value> {
        let target = match args {
            [] => thread::current(),
            [handle] => match handle.downcast_ref::<Thread>() {
                Some(thread) => thread.clone(),
                None => {
                    return Err(DiError::ArityMismatch {
                        service: definition.name().to_string(),
                        expected: "no arguments or one thread handle",
                        got: 1,
                    })
                }
            },
            _ => {
                return Err(DiError::ArityMismatch {
                    service: definition.name().to_string(),
                    expected: "no arguments or one thread handle",
                    got: args.len(),
                })
            }
        };
        let thread_id = target.id();
        if let Some(cached) = self.cached_thread(definition.name(), thread_id) {
            return Ok(cached);
        }
        let handle_args;
        let implementation_args: &[Value] = if definition.thread_handle {
            handle_args = [Value::new(target)];
            &handle_args
        } else {
            &[]
        };
        let value = self.instantiate(host, definition, implementation_args)?;
        let mut caches = self.caches.lock();
        let entry = entry_for(
            &mut caches,
            &definition.name_arc(),
            InstanceCache::per_thread,
            |cache| matches!(cache, InstanceCache::PerThread(_)),
        );
        if let InstanceCache::PerThread(map) = entry {
            map.insert(thread_id, value.clone());
        }
        Ok(value)
    }

    fn cached_thread(&self, name: &str, thread_id: std::thread::ThreadId) -> Option<Value> {
        match self.caches.lock().get(name) {
            Some(InstanceCache::PerThread(map)) => map.get(&thread_id).cloned(),
            _ => None,
        }
    }

    fn resolve_deferred(&self, definition: &ServiceDefinition, args: &[Value]) -> DiResult<Value> {
        if !args.is_empty() {
            return Err(DiError::ArityMismatch {
                service: definition.name().to_string(),
                expected: "no arguments",
                got: args.len(),
            });
        }
        let mut caches = self.caches.lock();
        let entry = entry_for(
            &mut caches,
            &definition.name_arc(),
            InstanceCache::deferred,
            |cache| matches!(cache, InstanceCache::Deferred { .. }),
        );
        let InstanceCache::Deferred { proxy, resolved } = entry else {
            unreachable!("deferred cache entry re-shaped by entry_for");
        };
        if let Some(value) = resolved {
            return Ok(value.clone());
        }
        if let Some(existing) = proxy {
            return Ok(existing.clone());
        }
        let fresh = Value::object(DeferredProxy::new(
            self.self_weak.clone(),
            definition.name_arc(),
        ));
        *proxy = Some(fresh.clone());
        Ok(fresh)
    }

    /// Runs a deferred service's implementation and publishes the result
    /// in the instance slot. Called by the proxy on first use.
    pub(crate) fn force_deferred(&self, name: &str) -> DiResult<Value> {
        let definition = self
            .registry
            .resolve(name)
            .ok_or_else(|| DiError::UnknownService(name.to_string()))?;
        if let Some(cached) = self.cached_deferred(name) {
            return Ok(cached);
        }
        let host = self.host();
        let value = self.instantiate(&host, &definition, &[])?;
        let mut caches = self.caches.lock();
        let entry = entry_for(
            &mut caches,
            &definition.name_arc(),
            InstanceCache::deferred,
            |cache| matches!(cache, InstanceCache::Deferred { .. }),
        );
        if let InstanceCache::Deferred { resolved, .. } = entry {
            *resolved = Some(value.clone());
        }
        Ok(value)
    }

    fn cached_deferred(&self, name: &str) -> Option<Value> {
        match self.caches.lock().get(name) {
            Some(InstanceCache::Deferred { resolved, .. }) => resolved.clone(),
            _ => None,
        }
    }

    /// Runs the implementation closure outside any cache lock and applies
    /// the definition's injection mode to the produced value.
    fn instantiate(
        &self,
        host: &Container,
        definition: &ServiceDefinition,
        args: &[Value],
    ) -> DiResult<Value> {
        tracing::trace!(service = %definition.name(), "instantiating service");
        let value = (definition.implementation)(host, args)?;
        if definition.inject {
            self.inject_value(definition.name(), &value)?;
        }
        Ok(value)
    }

    fn inject_value(&self, service: &str, value: &Value) -> DiResult<()> {
        match value.object_facet() {
            Some(object) => object.injection_link().attach(&self.me()),
            None => {
                tracing::warn!(
                    service,
                    target = value.type_name(),
                    "value cannot be injected into; returning it unmodified"
                );
                Ok(())
            }
        }
    }

    fn me(&self) -> Arc<dyn Resolvable> {
        self.host().inner
    }

    fn host(&self) -> Container {
        // self_weak always upgrades while a strong handle is calling in.
        Container {
            inner: self.self_weak.upgrade().expect("container instance alive"),
        }
    }
}

impl Resolvable for ContainerShared {
    fn try_invoke(&self, name: &str, args: &[Value]) -> Option<DiResult<Value>> {
        // Absence is a resolution probe, not an error.
        self.registry.resolve(name)?;
        Some(self.invoke(&self.host(), name, args))
    }
}

impl Resolvable for Container {
    fn try_invoke(&self, name: &str, args: &[Value]) -> Option<DiResult<Value>> {
        self.inner.try_invoke(name, args)
    }
}

/// A container is itself a service object: nested inside another
/// (injected) container it answers its own services through `dispatch`
/// and forwards unknown names outward through its link.
impl ServiceObject for Container {
    fn dispatch(&self, method: &str, args: &[Value]) -> Option<DiResult<Value>> {
        self.inner.try_invoke(method, args)
    }

    fn injection_link(&self) -> &InjectionLink {
        &self.inner.link
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registry", &self.inner.registry)
            .finish()
    }
}
