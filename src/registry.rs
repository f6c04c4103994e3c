//! Name-keyed service registry shared by container instances.
//!
//! A registry is the container-class half of the system: it owns the
//! [`ServiceDefinition`]s, while each [`Container`] built from it owns only
//! its instance caches. Registries form a parent chain standing in for
//! class inheritance; lookups walk most-derived first, and a redeclaration
//! in a derived registry shadows the parent without disturbing it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::container::Container;
use crate::definition::ServiceDefinition;
use crate::error::DiResult;
use crate::internal::sync::RwLock;
use crate::policy::{Arity, CachePolicy};
use crate::value::Value;

/// Shared, name-keyed table of service definitions.
///
/// Built with [`Registry::builder`] (or [`Registry::derive`] for an
/// inheriting registry) and then shared by any number of container
/// instances. The table stays interior-mutable after build so services can
/// be declared dynamically while instances already exist; existing
/// instances resolve a newly declared name on their next call.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Container, Registry, Value};
///
/// let mut builder = Registry::builder();
/// builder.singleton("greeting", |_, _| Ok(Value::new("Hello, world".to_string())));
/// let registry = builder.build();
///
/// let container = Container::new(registry);
/// let greeting = container.get::<String>("greeting").unwrap();
/// assert_eq!(&*greeting, "Hello, world");
/// ```
pub struct Registry {
    parent: Option<Arc<Registry>>,
    services: RwLock<HashMap<Arc<str>, ServiceDefinition>>,
    /// Injection mode applied to services declared after build.
    inject_default: bool,
}

impl Registry {
    /// Starts an empty registry builder. Injection is enabled until
    /// [`uninjected`](RegistryBuilder::uninjected) is called.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new(None)
    }

    /// Starts a derived registry: lookups fall back to `parent`, and
    /// redeclarations shadow it for containers of the derived registry
    /// only.
    ///
    /// ```rust
    /// use lattice_di::{Container, Registry, Value};
    ///
    /// let mut base = Registry::builder();
    /// base.singleton("port", |_, _| Ok(Value::new(8080u16)));
    /// let base = base.build();
    ///
    /// let mut test = Registry::derive(&base);
    /// test.singleton("port", |_, _| Ok(Value::new(0u16)));
    /// let test = test.build();
    ///
    /// assert_eq!(*Container::new(base).get::<u16>("port").unwrap(), 8080);
    /// assert_eq!(*Container::new(test).get::<u16>("port").unwrap(), 0);
    /// ```
    pub fn derive(parent: &Arc<Registry>) -> RegistryBuilder {
        RegistryBuilder::new(Some(parent.clone()))
    }

    /// First matching definition for `name`, most-derived registry first.
    pub(crate) fn resolve(&self, name: &str) -> Option<ServiceDefinition> {
        if let Some(definition) = self.services.read().get(name).cloned() {
            return Some(definition);
        }
        self.parent.as_ref().and_then(|parent| parent.resolve(name))
    }

    /// Whether `name` resolves anywhere in the registry chain.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// The definition `name` currently resolves to, if any.
    pub fn definition(&self, name: &str) -> Option<ServiceDefinition> {
        self.resolve(name)
    }

    /// Records (or overwrites) a definition. Last write wins; instance
    /// caches for other services are untouched, and instances that already
    /// cached a value under the old definition keep it.
    pub(crate) fn declare(&self, definition: ServiceDefinition) {
        tracing::debug!(
            service = %definition.name(),
            policy = ?definition.policy(),
            inject = definition.injection_enabled(),
            "declaring service"
        );
        self.services
            .write()
            .insert(definition.name_arc(), definition);
    }

    /// Declares `name` with the policy inferred from `arity` and the
    /// registry's current injection mode.
    pub fn define<F>(&self, name: &str, arity: Arity, implementation: F)
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.declare(ServiceDefinition::new(
            name,
            arity.policy(),
            self.inject_default,
            Arc::new(implementation),
        ));
    }

    /// Names declared in this registry and its ancestors, shadowed names
    /// reported once.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        self.collect_names(&mut names);
        names.sort();
        names.dedup();
        names
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        out.extend(self.services.read().keys().map(|name| name.to_string()));
        if let Some(parent) = &self.parent {
            parent.collect_names(out);
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("services", &self.services.read().len())
            .field("derived", &self.parent.is_some())
            .finish()
    }
}

/// Declarative surface for building a [`Registry`].
///
/// Declarations are evaluated in order; the [`injected`]/[`uninjected`]
/// directives flip the mode recorded into every subsequent declaration, so
/// one class body can mix injected and uninjected services. The mode in
/// effect at [`build`](RegistryBuilder::build) carries over to services
/// declared dynamically on the built registry.
///
/// [`injected`]: RegistryBuilder::injected
/// [`uninjected`]: RegistryBuilder::uninjected
pub struct RegistryBuilder {
    parent: Option<Arc<Registry>>,
    services: HashMap<Arc<str>, ServiceDefinition>,
    inject: bool,
}

impl RegistryBuilder {
    fn new(parent: Option<Arc<Registry>>) -> Self {
        Self {
            parent,
            services: HashMap::new(),
            inject: true,
        }
    }

    /// Subsequently declared services get the container injected into
    /// their values on instantiation. This is the default mode.
    pub fn injected(&mut self) -> &mut Self {
        self.inject = true;
        self
    }

    /// Subsequently declared services are left uninjected.
    pub fn uninjected(&mut self) -> &mut Self {
        self.inject = false;
        self
    }

    /// Declares a generic (pass-through) service: every invocation runs
    /// the implementation, nothing is cached.
    pub fn generic<F>(&mut self, name: &str, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, CachePolicy::Generic, implementation)
    }

    /// Declares a singleton service: the implementation runs at most once
    /// per container instance.
    pub fn singleton<F>(&mut self, name: &str, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, CachePolicy::Singleton, implementation)
    }

    /// Declares a multiton service: one cached value per distinct key
    /// argument, compared by value.
    pub fn multiton<F>(&mut self, name: &str, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, CachePolicy::Multiton, implementation)
    }

    /// Declares a multiton service keyed by the whole argument tuple.
    /// Variadic argument lists are permitted.
    pub fn multikey_multiton<F>(&mut self, name: &str, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, CachePolicy::MultikeyMultiton, implementation)
    }

    /// Declares a per-thread service: the implementation runs at most once
    /// per resolving thread, and receives no arguments.
    pub fn threaded<F>(&mut self, name: &str, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, CachePolicy::Threaded, implementation)
    }

    /// Like [`threaded`](RegistryBuilder::threaded), but the
    /// implementation receives the resolving thread's
    /// [`Thread`](std::thread::Thread) handle as its single argument.
    pub fn threaded_with_handle<F>(&mut self, name: &str, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, CachePolicy::Threaded, implementation);
        if let Some(definition) = self.services.get_mut(name) {
            definition.thread_handle = true;
        }
        self
    }

    /// Declares a deferred singleton: requesting the service returns a
    /// proxy immediately, and the implementation runs only when a method
    /// is first invoked on that proxy.
    pub fn deferred<F>(&mut self, name: &str, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, CachePolicy::Deferred, implementation)
    }

    /// Shortcut declaration: the policy is inferred from the declared
    /// argument shape (see [`Arity::policy`]).
    pub fn service<F>(&mut self, name: &str, arity: Arity, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        self.push(name, arity.policy(), implementation)
    }

    fn push<F>(&mut self, name: &str, policy: CachePolicy, implementation: F) -> &mut Self
    where
        F: Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync + 'static,
    {
        let definition =
            ServiceDefinition::new(name, policy, self.inject, Arc::new(implementation));
        self.services.insert(definition.name_arc(), definition);
        self
    }

    /// Finishes the class body and produces the shared registry.
    pub fn build(&mut self) -> Arc<Registry> {
        Arc::new(Registry {
            parent: self.parent.take(),
            services: RwLock::new(std::mem::take(&mut self.services)),
            inject_default: self.inject,
        })
    }
}
