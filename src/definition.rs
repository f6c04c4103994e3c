//! Service definitions recorded by the registry.

use std::sync::Arc;

use crate::container::Container;
use crate::error::DiResult;
use crate::policy::CachePolicy;
use crate::value::Value;

/// Implementation closure for a service.
///
/// Receives the resolving container instance (for sibling lookups) and the
/// invocation arguments. Errors propagate unchanged to the caller and are
/// never cached.
pub type ServiceFn = Arc<dyn Fn(&Container, &[Value]) -> DiResult<Value> + Send + Sync>;

/// A declared service: name, caching policy, injection mode, and
/// implementation closure.
///
/// Definitions are owned by the [`Registry`](crate::Registry) a container
/// class was built from and are shared by every instance of that class.
/// Redeclaring a name replaces the definition without touching any
/// instance-level cache.
#[derive(Clone)]
pub struct ServiceDefinition {
    pub(crate) name: Arc<str>,
    pub(crate) policy: CachePolicy,
    pub(crate) inject: bool,
    /// Threaded only: pass the resolving thread's handle to the
    /// implementation.
    pub(crate) thread_handle: bool,
    pub(crate) implementation: ServiceFn,
}

impl ServiceDefinition {
    pub(crate) fn new(
        name: &str,
        policy: CachePolicy,
        inject: bool,
        implementation: ServiceFn,
    ) -> Self {
        Self {
            name: Arc::from(name),
            policy,
            inject,
            thread_handle: false,
            implementation,
        }
    }

    /// The service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The caching policy resolved for this service.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Whether instantiated values get the container injected into them.
    pub fn injection_enabled(&self) -> bool {
        self.inject
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        self.name.clone()
    }
}

impl std::fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("inject", &self.inject)
            .finish()
    }
}
